//! Parser for remote status command output
//!
//! Turns the combined `/proc/uptime; /proc/meminfo; /proc/loadavg` output
//! and the `systemctl` probes into snapshots. The parsers are total:
//! malformed input yields default values for whatever could not be found,
//! never an error.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

use super::snapshot::{LoadAverage, ServiceStatus, SystemSnapshot};

/// Combined command read on every system poll tick
pub const SYSTEM_STATUS_COMMAND: &str = "cat /proc/uptime; cat /proc/meminfo; cat /proc/loadavg";

/// Builds the per-tick probe for one service's state
#[must_use]
pub fn service_status_command(service: &str) -> String {
    format!(
        "systemctl is-active {service}; systemctl show {service} --property=ActiveEnterTimestamp"
    )
}

/// kB per MB / MB per GB divisor
const KIB_PER_MIB: f64 = 1024.0;
/// kB per GB divisor
const KIB_PER_GIB: f64 = 1_048_576.0;

/// `Key:   12345 kB` lines from `/proc/meminfo`
fn meminfo_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([\w()/]+):\s+([\d.]+)\s*(kB)?").expect("meminfo_re: invalid regex")
    })
}

/// The `/proc/loadavg` shape: three decimals, a running/total ratio, a PID
fn loadavg_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([\d.]+)\s+([\d.]+)\s+([\d.]+)\s+(\d+)/(\d+)\s+(\d+)$")
            .expect("loadavg_re: invalid regex")
    })
}

/// The `/proc/uptime` shape: exactly two float tokens
fn uptime_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([\d.]+)\s+[\d.]+$").expect("uptime_re: invalid regex"))
}

/// Stateless parser for remote status output
pub struct SystemInfoParser;

impl SystemInfoParser {
    /// Parses the output of [`SYSTEM_STATUS_COMMAND`] into a snapshot.
    ///
    /// Total function: any line that matches none of the expected shapes
    /// is skipped, and missing keys leave their snapshot field at its
    /// zero/`"0 GB"` default.
    #[must_use]
    pub fn parse_system_info(raw: &str) -> SystemSnapshot {
        let mut snapshot = SystemSnapshot::default();
        let mut total_kb: Option<f64> = None;
        let mut available_kb: Option<f64> = None;

        for line in raw.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            if let Some(caps) = meminfo_re().captures(line) {
                // Only kB-annotated entries carry memory figures we use.
                if caps.get(3).is_none() {
                    continue;
                }
                let Ok(value) = caps[2].parse::<f64>() else {
                    continue;
                };
                match &caps[1] {
                    "MemTotal" => total_kb = Some(value),
                    "MemAvailable" => available_kb = Some(value),
                    _ => {}
                }
            } else if let Some(caps) = loadavg_re().captures(line) {
                snapshot.load_average = LoadAverage {
                    one: caps[1].parse().unwrap_or(0.0),
                    five: caps[2].parse().unwrap_or(0.0),
                    fifteen: caps[3].parse().unwrap_or(0.0),
                };
                snapshot.running_procs = caps[4].parse().unwrap_or(0);
                snapshot.total_procs = caps[5].parse().unwrap_or(0);
                snapshot.last_pid = caps[6].parse().unwrap_or(0);
            } else if let Some(caps) = uptime_re().captures(line) {
                snapshot.uptime_secs = caps[1].parse::<f64>().map(|v| v as u64).unwrap_or(0);
            }
        }

        if let Some(kb) = total_kb {
            snapshot.total_memory = scale_kb(kb);
        }
        if let Some(kb) = available_kb {
            snapshot.free_memory = scale_kb(kb);
        }
        let used_kb = (total_kb.unwrap_or(0.0) - available_kb.unwrap_or(0.0)).max(0.0);
        snapshot.used_memory = format!("{:.2} GB", used_kb / KIB_PER_GIB);

        snapshot.captured_at = Utc::now();
        snapshot
    }

    /// Parses the output of [`service_status_command`] for `service`.
    ///
    /// The first line is the `is-active` verdict; an
    /// `ActiveEnterTimestamp=` property line supplies the uptime
    /// timestamp. Total function: anything unparseable degrades to
    /// inactive / `"N/A"`.
    #[must_use]
    pub fn parse_service_status(service: &str, raw: &str) -> ServiceStatus {
        let mut lines = raw.lines().map(str::trim).filter(|l| !l.is_empty());
        let is_active = lines.next() == Some("active");

        let timestamp = raw
            .lines()
            .find_map(|l| l.trim().strip_prefix("ActiveEnterTimestamp="))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        let active_since = if is_active {
            timestamp
                .map_or(ServiceStatus::NO_TIMESTAMP, |t| t)
                .to_string()
        } else {
            ServiceStatus::NO_TIMESTAMP.to_string()
        };

        ServiceStatus {
            service: service.to_string(),
            is_active,
            active_since,
            checked_at: Utc::now(),
        }
    }
}

/// Scales a raw kB count for display: kB as-is under 1024, MB up to
/// 1 048 576, GB above, two decimal places.
fn scale_kb(kb: f64) -> String {
    if kb >= KIB_PER_GIB {
        format!("{:.2} GB", kb / KIB_PER_GIB)
    } else if kb >= KIB_PER_MIB {
        format!("{:.2} MB", kb / KIB_PER_MIB)
    } else {
        format!("{kb:.2} kB")
    }
}
