//! Threshold-based health evaluation.
//!
//! The evaluator takes a fresh numeric read of CPU, memory and disk usage and
//! compares it against fixed cutoffs. Only breaches produce entries; a report
//! without warnings means the host is healthy.
//!
//! # Usage
//!
//! ```rust
//! use chrono::{Duration, Local};
//! use system_status_check::health::{evaluate, DiskLoad, HealthInputs, Thresholds};
//!
//! let now = Local::now();
//! let inputs = HealthInputs {
//!     now,
//!     boot_time: now - Duration::hours(3),
//!     cpu_percent: 95.0,
//!     memory_percent: 40.0,
//!     disks: vec![DiskLoad { device: "/dev/sda1".into(), usage_percent: Some(50.0) }],
//! };
//!
//! let report = evaluate(&inputs, &Thresholds::default());
//! assert!(report.has_warnings());
//! assert_eq!(report.warnings[0].key, "cpu_warning");
//! ```

use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use sysinfo::System;
use tracing::{debug, warn};

use crate::collectors::cpu::sample_usage;
use crate::collectors::filesystem::read_partitions;
use crate::collectors::memory::read_memory;
use crate::collectors::HostPaths;
use crate::format::elapsed;
use crate::section::Section;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Usage cutoffs above which a warning is raised.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 85.0,
            disk_percent: 90.0,
        }
    }
}

/// Usage of one partition. `None` when the partition could not be read.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskLoad {
    pub device: String,
    pub usage_percent: Option<f64>,
}

/// Numeric host figures the evaluator works on.
#[derive(Debug, Clone)]
pub struct HealthInputs {
    pub now: DateTime<Local>,
    pub boot_time: DateTime<Local>,
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disks: Vec<DiskLoad>,
}

/// A single threshold breach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub key: String,
    pub message: String,
}

/// Outcome of one evaluation.
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub timestamp: DateTime<Local>,
    pub uptime: chrono::Duration,
    pub boot_time: DateTime<Local>,
    pub warnings: Vec<Warning>,
}

impl HealthReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// `timestamp`, `uptime`, `boot_time`, then one entry per warning.
    pub fn to_section(&self) -> Section {
        let mut section = Section::new();
        section.text("timestamp", self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        section.text("uptime", elapsed(self.uptime));
        section.text("boot_time", self.boot_time.format(TIMESTAMP_FORMAT).to_string());
        for warning in &self.warnings {
            section.text(warning.key.clone(), &warning.message);
        }
        section
    }
}

/// Applies `thresholds` to `inputs`. Pure; comparisons are strict.
pub fn evaluate(inputs: &HealthInputs, thresholds: &Thresholds) -> HealthReport {
    let mut warnings = Vec::new();

    if inputs.cpu_percent > thresholds.cpu_percent {
        warnings.push(Warning {
            key: "cpu_warning".to_string(),
            message: format!("High CPU usage: {:.1}%", inputs.cpu_percent),
        });
    }

    if inputs.memory_percent > thresholds.memory_percent {
        warnings.push(Warning {
            key: "memory_warning".to_string(),
            message: format!("High memory usage: {:.1}%", inputs.memory_percent),
        });
    }

    for disk in &inputs.disks {
        let Some(usage) = disk.usage_percent else {
            continue;
        };
        if usage > thresholds.disk_percent {
            let key = format!("disk_warning_{}", disk.device);
            let message = format!("Low disk space: {:.1}% used", usage);
            // A device mounted twice keeps one entry.
            match warnings.iter_mut().find(|w| w.key == key) {
                Some(existing) => existing.message = message,
                None => warnings.push(Warning { key, message }),
            }
        }
    }

    HealthReport {
        timestamp: inputs.now,
        uptime: inputs.now - inputs.boot_time,
        boot_time: inputs.boot_time,
        warnings,
    }
}

/// Takes the fresh reads the evaluator needs. Blocks for the CPU window.
pub fn gather_inputs(sys: &mut System, paths: &HostPaths, window: Duration) -> HealthInputs {
    let cpu_percent = sample_usage(sys, window) as f64;
    let memory_percent = read_memory(sys, paths).usage_percent();

    let disks = match read_partitions(paths) {
        Ok(partitions) => partitions
            .into_iter()
            .map(|p| {
                let usage_percent = match &p.usage {
                    Ok(usage) => usage.percent(),
                    Err(e) => {
                        debug!("Skipping {} in health check: {}", p.device, e);
                        None
                    }
                };
                DiskLoad {
                    device: p.device,
                    usage_percent,
                }
            })
            .collect(),
        Err(e) => {
            warn!("Partition list unavailable for health check: {}", e);
            Vec::new()
        }
    };

    let now = Local::now();
    let boot_secs = i64::try_from(System::boot_time()).unwrap_or(0);
    let boot_time = Local.timestamp_opt(boot_secs, 0).single().unwrap_or(now);

    HealthInputs {
        now,
        boot_time,
        cpu_percent,
        memory_percent,
        disks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(cpu: f64, mem: f64, disks: Vec<DiskLoad>) -> HealthInputs {
        let now = Local.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        HealthInputs {
            now,
            boot_time: now - chrono::Duration::seconds(90_061),
            cpu_percent: cpu,
            memory_percent: mem,
            disks,
        }
    }

    #[test]
    fn test_healthy_host_has_no_warnings() {
        let report = evaluate(
            &inputs(
                10.0,
                40.0,
                vec![DiskLoad {
                    device: "/dev/sda1".into(),
                    usage_percent: Some(50.0),
                }],
            ),
            &Thresholds::default(),
        );
        assert!(!report.has_warnings());

        let section = report.to_section();
        let labels: Vec<_> = section.labels().collect();
        assert_eq!(labels, vec!["timestamp", "uptime", "boot_time"]);
        assert_eq!(section.get_text("timestamp"), Some("2024-03-01 12:00:00"));
        assert_eq!(section.get_text("uptime"), Some("1 day, 1:01:01"));
        assert_eq!(section.get_text("boot_time"), Some("2024-02-29 10:58:59"));
    }

    #[test]
    fn test_breaches_raise_warnings() {
        let report = evaluate(
            &inputs(
                95.0,
                90.0,
                vec![DiskLoad {
                    device: "/dev/sda1".into(),
                    usage_percent: Some(95.5),
                }],
            ),
            &Thresholds::default(),
        );

        let section = report.to_section();
        assert_eq!(section.get_text("cpu_warning"), Some("High CPU usage: 95.0%"));
        assert_eq!(
            section.get_text("memory_warning"),
            Some("High memory usage: 90.0%")
        );
        assert_eq!(
            section.get_text("disk_warning_/dev/sda1"),
            Some("Low disk space: 95.5% used")
        );
    }

    #[test]
    fn test_threshold_is_strict() {
        let report = evaluate(&inputs(80.0, 85.0, Vec::new()), &Thresholds::default());
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_unreadable_disks_are_skipped() {
        let report = evaluate(
            &inputs(
                0.0,
                0.0,
                vec![
                    DiskLoad {
                        device: "/dev/sdb1".into(),
                        usage_percent: None,
                    },
                    DiskLoad {
                        device: "/dev/sdc1".into(),
                        usage_percent: Some(99.0),
                    },
                ],
            ),
            &Thresholds::default(),
        );
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].key, "disk_warning_/dev/sdc1");
    }

    #[test]
    fn test_duplicate_device_keeps_one_entry() {
        let disk = |p| DiskLoad {
            device: "/dev/sda1".into(),
            usage_percent: Some(p),
        };
        let report = evaluate(
            &inputs(0.0, 0.0, vec![disk(91.0), disk(92.0)]),
            &Thresholds::default(),
        );
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].message, "Low disk space: 92.0% used");
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = Thresholds {
            cpu_percent: 50.0,
            ..Thresholds::default()
        };
        let report = evaluate(&inputs(60.0, 0.0, Vec::new()), &thresholds);
        assert_eq!(report.warnings[0].message, "High CPU usage: 60.0%");
    }
}
