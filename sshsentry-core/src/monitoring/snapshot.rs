//! Data models for polled remote state
//!
//! Snapshots are immutable point-in-time values: every poll tick produces
//! a fresh one that replaces the previous, never mutates it.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Load average values from `/proc/loadavg`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LoadAverage {
    /// 1-minute load average
    pub one: f64,
    /// 5-minute load average
    pub five: f64,
    /// 15-minute load average
    pub fifteen: f64,
}

/// A point-in-time view of a server's memory and load state.
///
/// Memory figures are pre-scaled display strings ("2.00 GB"); missing
/// fields in the remote output default to `"0 GB"` / zero rather than
/// failing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    /// Total physical memory, scaled
    pub total_memory: String,
    /// Used memory (total minus available), in GB
    pub used_memory: String,
    /// Available memory, scaled
    pub free_memory: String,
    /// Load averages (1/5/15 min)
    pub load_average: LoadAverage,
    /// Currently running processes (from the loadavg ratio)
    pub running_procs: u32,
    /// Total processes (from the loadavg ratio)
    pub total_procs: u32,
    /// Most recently assigned PID
    pub last_pid: u32,
    /// System uptime in seconds
    pub uptime_secs: u64,
    /// When this snapshot was captured
    pub captured_at: DateTime<Utc>,
}

impl Default for SystemSnapshot {
    fn default() -> Self {
        Self {
            total_memory: "0 GB".to_string(),
            used_memory: "0.00 GB".to_string(),
            free_memory: "0 GB".to_string(),
            load_average: LoadAverage::default(),
            running_procs: 0,
            total_procs: 0,
            last_pid: 0,
            uptime_secs: 0,
            captured_at: Utc::now(),
        }
    }
}

/// A point-in-time view of one service's state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStatus {
    /// systemd unit name
    pub service: String,
    /// Whether `systemctl is-active` reported `active`
    pub is_active: bool,
    /// `ActiveEnterTimestamp` of the unit, or `"N/A"` when inactive or
    /// unreported
    pub active_since: String,
    /// When this status was captured
    pub checked_at: DateTime<Utc>,
}

impl ServiceStatus {
    /// Placeholder shown when a service has no usable uptime timestamp
    pub const NO_TIMESTAMP: &'static str = "N/A";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_snapshot_is_zeroed() {
        let snapshot = SystemSnapshot::default();
        assert_eq!(snapshot.total_memory, "0 GB");
        assert_eq!(snapshot.used_memory, "0.00 GB");
        assert_eq!(snapshot.free_memory, "0 GB");
        assert_eq!(snapshot.load_average, LoadAverage::default());
        assert_eq!(snapshot.uptime_secs, 0);
    }
}
