//! Integration tests for the text report layout.

use chrono::Local;
use system_status_check::collectors::bios::{source_for, Platform, NOT_ACCESSIBLE};
use system_status_check::collectors::filesystem::{disk_section, DiskUsage, Partition};
use system_status_check::collectors::thermal::{temperature_section, NO_SENSORS};
use system_status_check::collectors::HostPaths;
use system_status_check::error::ProbeError;
use system_status_check::format::bytes_to_gb;
use system_status_check::report::DEFAULT_MAX_ADDRESSES;
use system_status_check::{ReportSink, Section, SectionKind, TextReport};

/// Section with `n` groups of a couple of entries each.
fn section_with(n: usize) -> Section {
    let mut section = Section::new();
    for i in 0..n {
        let mut group = Section::new();
        group.text("Status", "UP");
        group.text("Speed", "N/A");
        section.group(format!("item{}", i), group);
    }
    section
}

fn render_all(size: usize) -> String {
    let mut sink = TextReport::new(Vec::new(), DEFAULT_MAX_ADDRESSES);
    sink.begin(Local::now()).unwrap();
    for kind in SectionKind::ALL {
        sink.section(kind, &section_with(size)).unwrap();
    }
    sink.finish().unwrap();
    String::from_utf8(sink.into_inner()).unwrap()
}

#[test]
fn test_headers_once_and_in_order() {
    for size in [0, 1, 5] {
        let text = render_all(size);
        let lines: Vec<&str> = text.lines().collect();

        let mut last = 0;
        for kind in SectionKind::ALL {
            let hits: Vec<usize> = lines
                .iter()
                .enumerate()
                .filter(|(_, l)| **l == kind.header())
                .map(|(i, _)| i)
                .collect();
            assert_eq!(hits.len(), 1, "{} with size {}", kind.header(), size);
            assert!(hits[0] >= last);
            last = hits[0];
        }

        assert_eq!(lines[1], "MOTHERBOARD & SYSTEM STATUS CHECK");
        assert_eq!(lines[lines.len() - 2], "SCAN COMPLETE");
    }
}

#[test]
fn test_disk_permission_split() {
    let gb = 1_073_741_824u64;
    let mut partitions = Vec::new();
    for i in 0..5u64 {
        let usage = if i % 2 == 0 {
            Err(ProbeError::PermissionDenied(format!("/mnt/{}", i)))
        } else {
            Ok(DiskUsage {
                total_bytes: 10 * gb,
                used_bytes: i * gb,
                free_bytes: (10 - i) * gb,
            })
        };
        partitions.push(Partition {
            device: format!("/dev/sd{}", i),
            mount_point: format!("/mnt/{}", i),
            fstype: "ext4".into(),
            usage,
        });
    }

    let section = disk_section(&partitions);
    assert_eq!(section.len(), 5);

    let mut denied = 0;
    for (_, value) in section.iter() {
        let info = value.as_group().unwrap();
        if info.get_text("Status") == Some("Permission denied") {
            denied += 1;
            assert_eq!(info.len(), 1);
            continue;
        }
        for key in ["Mountpoint", "File System", "Total Size", "Used", "Free", "Usage %"] {
            assert!(info.contains(key), "missing {}", key);
        }
    }
    assert_eq!(denied, 3);

    let sd1 = section.get("/dev/sd1").and_then(|v| v.as_group()).unwrap();
    assert_eq!(sd1.get_text("Usage %"), Some("10.0%"));
    assert_eq!(sd1.get_text("Used"), Some("1.00 GB"));
}

#[test]
fn test_sentinels() {
    assert_eq!(bytes_to_gb(1_073_741_824), "1.00 GB");
    assert_eq!(bytes_to_gb(0), "0.00 GB");

    let temps = temperature_section(Ok(Vec::new()));
    assert_eq!(temps.len(), 1);
    assert_eq!(temps.get_text("Status"), Some(NO_SENSORS));

    let bios = source_for(
        Platform::Other,
        &HostPaths::default(),
        std::time::Duration::from_secs(1),
    )
    .collect();
    assert_eq!(bios.len(), 1);
    assert_eq!(bios.get_text("Status"), Some(NOT_ACCESSIBLE));
}
