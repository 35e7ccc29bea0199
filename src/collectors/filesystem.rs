//! Disk partition and usage collector.
//!
//! On Linux, partitions come from /proc/mounts (pseudo filesystems skipped) and
//! usage from statvfs. Other Unix hosts enumerate through `sysinfo` and still
//! use statvfs; remaining platforms take both from `sysinfo`.

use super::HostPaths;
use crate::error::ProbeError;
use crate::format::{bytes_to_gb, percent, percent_of, NOT_AVAILABLE};
use crate::section::Section;

pub const PERMISSION_DENIED: &str = "Permission denied";

/// One line of the mount table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
}

/// Space figures for a mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
}

impl DiskUsage {
    /// `used / total * 100`, `None` for a zero-sized filesystem.
    pub fn percent(&self) -> Option<f64> {
        percent_of(self.used_bytes, self.total_bytes)
    }
}

/// A mounted partition and the outcome of its usage query.
#[derive(Debug)]
pub struct Partition {
    pub device: String,
    pub mount_point: String,
    pub fstype: String,
    pub usage: Result<DiskUsage, ProbeError>,
}

impl Partition {
    pub fn to_section(&self) -> Section {
        let usage = match &self.usage {
            Ok(usage) => usage,
            Err(e) if e.is_permission_denied() => {
                return Section::single("Status", PERMISSION_DENIED);
            }
            Err(e) => return Section::single("Status", format!("Unavailable ({})", e)),
        };

        let mut section = Section::new();
        section.text("Mountpoint", &self.mount_point);
        section.text("File System", &self.fstype);
        section.text("Total Size", bytes_to_gb(usage.total_bytes));
        section.text("Used", bytes_to_gb(usage.used_bytes));
        section.text("Free", bytes_to_gb(usage.free_bytes));
        section.text(
            "Usage %",
            usage
                .percent()
                .map(percent)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        );
        section
    }
}

/// Builds the disk section, one group per device.
pub fn disk_section(partitions: &[Partition]) -> Section {
    let mut section = Section::new();
    for partition in partitions {
        section.group(partition.device.clone(), partition.to_section());
    }
    section
}

/// Decodes the octal escapes (`\040` etc.) used in the mount table.
fn decode_mount_field(field: &str) -> String {
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 4 <= bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses mount table content, dropping pseudo filesystems.
pub fn parse_mounts(content: &str) -> Vec<MountEntry> {
    content
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            if parts.len() < 3 {
                return None;
            }
            let entry = MountEntry {
                device: decode_mount_field(parts[0]),
                mount_point: decode_mount_field(parts[1]),
                fstype: parts[2].to_string(),
            };
            if should_skip_filesystem(&entry.fstype) {
                None
            } else {
                Some(entry)
            }
        })
        .collect()
}

/// Checks if a filesystem type is a pseudo/virtual filesystem.
///
/// Only the type decides: block devices mounted under /run/media or /sysroot
/// are real partitions.
fn should_skip_filesystem(fstype: &str) -> bool {
    // Skip pseudo/virtual filesystems
    let skip_types = [
        "proc",
        "sysfs",
        "devpts",
        "devtmpfs",
        "tmpfs",
        "ramfs",
        "overlay",
        "nsfs",
        "cgroup",
        "cgroup2",
        "pstore",
        "bpf",
        "debugfs",
        "tracefs",
        "fusectl",
        "configfs",
        "securityfs",
        "efivarfs",
        "hugetlbfs",
        "mqueue",
        "autofs",
        "binfmt_misc",
        "rpc_pipefs",
    ];

    skip_types.contains(&fstype)
}

/// Gets filesystem usage with statvfs.
///
/// Used space counts blocks not free to root; free space is what an
/// unprivileged user can still allocate.
#[cfg(unix)]
pub fn statvfs_usage(mount_point: &str) -> Result<DiskUsage, ProbeError> {
    use nix::errno::Errno;

    let stat = nix::sys::statvfs::statvfs(mount_point).map_err(|errno| match errno {
        Errno::EACCES | Errno::EPERM => ProbeError::PermissionDenied(mount_point.to_string()),
        Errno::ENOENT => ProbeError::NotFound(mount_point.to_string()),
        other => ProbeError::Io {
            path: mount_point.to_string(),
            source: std::io::Error::from(other),
        },
    })?;

    let block_size = stat.fragment_size() as u64;
    let total_blocks = stat.blocks() as u64;
    let free_blocks = stat.blocks_free() as u64;
    let available_blocks = stat.blocks_available() as u64;

    Ok(DiskUsage {
        total_bytes: total_blocks * block_size,
        used_bytes: total_blocks.saturating_sub(free_blocks) * block_size,
        free_bytes: available_blocks * block_size,
    })
}

#[cfg(target_os = "linux")]
fn list_mounts(paths: &HostPaths) -> Result<Vec<MountEntry>, ProbeError> {
    let path = paths.proc("mounts");
    let content = std::fs::read_to_string(&path).map_err(|e| ProbeError::from_io(&path, e))?;
    Ok(parse_mounts(&content))
}

#[cfg(all(unix, not(target_os = "linux")))]
fn list_mounts(_paths: &HostPaths) -> Result<Vec<MountEntry>, ProbeError> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    Ok(disks
        .list()
        .iter()
        .map(|disk| MountEntry {
            device: disk.name().to_string_lossy().to_string(),
            mount_point: disk.mount_point().to_string_lossy().to_string(),
            fstype: disk.file_system().to_string_lossy().to_string(),
        })
        .collect())
}

/// Reads every mounted partition with its usage.
#[cfg(unix)]
pub fn read_partitions(paths: &HostPaths) -> Result<Vec<Partition>, ProbeError> {
    let partitions = list_mounts(paths)?
        .into_iter()
        .map(|mount| {
            let usage = statvfs_usage(&mount.mount_point);
            if let Err(e) = &usage {
                tracing::debug!("Usage unavailable for {}: {}", mount.mount_point, e);
            }
            Partition {
                device: mount.device,
                mount_point: mount.mount_point,
                fstype: mount.fstype,
                usage,
            }
        })
        .collect();
    Ok(partitions)
}

#[cfg(not(unix))]
pub fn read_partitions(_paths: &HostPaths) -> Result<Vec<Partition>, ProbeError> {
    let disks = sysinfo::Disks::new_with_refreshed_list();
    Ok(disks
        .list()
        .iter()
        .map(|disk| {
            let total = disk.total_space();
            let available = disk.available_space();
            Partition {
                device: disk.name().to_string_lossy().to_string(),
                mount_point: disk.mount_point().to_string_lossy().to_string(),
                fstype: disk.file_system().to_string_lossy().to_string(),
                usage: Ok(DiskUsage {
                    total_bytes: total,
                    used_bytes: total.saturating_sub(available),
                    free_bytes: available,
                }),
            }
        })
        .collect())
}
