//! Property tests for the system info parser

use proptest::prelude::*;
use sshsentry_core::SystemInfoParser;

proptest! {
    /// Property: the parser is total; arbitrary input yields a snapshot,
    /// never a panic
    #[test]
    fn parser_is_total(input in "[ -~\n\t]{0,300}") {
        let snapshot = SystemInfoParser::parse_system_info(&input);
        // Used memory always carries the GB suffix, even for defaults.
        prop_assert!(snapshot.used_memory.ends_with(" GB"));
    }

    /// Property: MemTotal scaling picks the unit by magnitude
    #[test]
    fn memtotal_scaling_unit(kb in 1u64..20_000_000) {
        let raw = format!("MemTotal: {kb} kB\nMemAvailable: 0 kB\n");
        let snapshot = SystemInfoParser::parse_system_info(&raw);

        let expected_unit = if kb >= 1_048_576 {
            "GB"
        } else if kb >= 1024 {
            "MB"
        } else {
            "kB"
        };
        prop_assert!(
            snapshot.total_memory.ends_with(expected_unit),
            "{} kB scaled to {}", kb, snapshot.total_memory
        );
    }

    /// Property: used memory is (MemTotal - MemAvailable) in GB with two
    /// decimals
    #[test]
    fn used_memory_formula(
        total_kb in 0u64..20_000_000,
        avail_kb in 0u64..20_000_000,
    ) {
        let raw = format!("MemTotal: {total_kb} kB\nMemAvailable: {avail_kb} kB\n");
        let snapshot = SystemInfoParser::parse_system_info(&raw);

        let used_gb = (total_kb.saturating_sub(avail_kb)) as f64 / 1_048_576.0;
        prop_assert_eq!(snapshot.used_memory, format!("{used_gb:.2} GB"));
    }

    /// Property: the loadavg line round-trips into the snapshot fields
    #[test]
    fn loadavg_fields_extracted(
        one in 0.0f64..100.0,
        five in 0.0f64..100.0,
        fifteen in 0.0f64..100.0,
        running in 0u32..999,
        total in 1u32..99_999,
        pid in 1u32..4_194_304,
    ) {
        let raw = format!("{one:.2} {five:.2} {fifteen:.2} {running}/{total} {pid}");
        let snapshot = SystemInfoParser::parse_system_info(&raw);

        prop_assert!((snapshot.load_average.one - one).abs() < 0.005);
        prop_assert!((snapshot.load_average.five - five).abs() < 0.005);
        prop_assert!((snapshot.load_average.fifteen - fifteen).abs() < 0.005);
        prop_assert_eq!(snapshot.running_procs, running);
        prop_assert_eq!(snapshot.total_procs, total);
        prop_assert_eq!(snapshot.last_pid, pid);
    }

    /// Property: the service status parser is total
    #[test]
    fn service_status_is_total(
        service in "[a-z][a-z0-9-]{0,20}",
        raw in "[ -~\n]{0,200}",
    ) {
        let status = SystemInfoParser::parse_service_status(&service, &raw);
        prop_assert_eq!(status.service, service);
        if !status.is_active {
            prop_assert_eq!(status.active_since, "N/A");
        }
    }

    /// Property: only a leading `active` verdict marks a service active
    #[test]
    fn is_active_requires_active_verdict(raw in "[a-z]{1,10}") {
        let status = SystemInfoParser::parse_service_status("svc", &raw);
        prop_assert_eq!(status.is_active, raw == "active");
    }
}
