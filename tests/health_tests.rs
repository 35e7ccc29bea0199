//! Integration tests for the health evaluator.
//!
//! These tests verify the behavior of `evaluate()` with synthetic inputs and
//! the default thresholds.

use chrono::{Duration, Local};
use system_status_check::health::DiskLoad;
use system_status_check::{evaluate, HealthInputs, Thresholds};

/// Helper function to build inputs one hour after boot.
fn inputs(cpu_percent: f64, memory_percent: f64, disks: Vec<DiskLoad>) -> HealthInputs {
    let now = Local::now();
    HealthInputs {
        now,
        boot_time: now - Duration::hours(1),
        cpu_percent,
        memory_percent,
        disks,
    }
}

fn warning_keys(inputs: &HealthInputs) -> Vec<String> {
    evaluate(inputs, &Thresholds::default())
        .warnings
        .into_iter()
        .map(|w| w.key)
        .collect()
}

#[test]
fn test_high_cpu_only() {
    let keys = warning_keys(&inputs(
        81.0,
        50.0,
        vec![DiskLoad {
            device: "/dev/sda1".into(),
            usage_percent: Some(40.0),
        }],
    ));
    assert_eq!(keys, vec!["cpu_warning"]);
}

#[test]
fn test_high_memory_and_full_disk() {
    let keys = warning_keys(&inputs(
        10.0,
        90.0,
        vec![
            DiskLoad {
                device: "/dev/sda1".into(),
                usage_percent: Some(95.0),
            },
            DiskLoad {
                device: "/dev/sdb1".into(),
                usage_percent: Some(20.0),
            },
        ],
    ));
    assert_eq!(keys, vec!["memory_warning", "disk_warning_/dev/sda1"]);
}

#[test]
fn test_section_starts_with_time_fields() {
    let report = evaluate(&inputs(99.0, 99.0, Vec::new()), &Thresholds::default());
    let section = report.to_section();
    let labels: Vec<&str> = section.labels().collect();
    assert_eq!(
        labels,
        vec!["timestamp", "uptime", "boot_time", "cpu_warning", "memory_warning"]
    );
    assert_eq!(section.get_text("uptime"), Some("1:00:00"));
}
