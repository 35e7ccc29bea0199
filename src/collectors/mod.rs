//! Collectors module for host status probes.
//!
//! Each collector reads one category of host state and turns it into a
//! [`Section`](crate::section::Section) of display-ready values. Collectors are
//! independent of each other; Linux readers take their sysfs/procfs roots from
//! [`HostPaths`] so they can be pointed at a fixture tree.

pub mod bios;
pub mod cpu;
pub mod filesystem;
pub mod identity;
pub mod memory;
pub mod netdev;
pub mod thermal;

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ProbeError;

/// Roots of the kernel pseudo filesystems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPaths {
    pub sysfs_root: PathBuf,
    pub procfs_root: PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from("/sys"),
            procfs_root: PathBuf::from("/proc"),
        }
    }
}

impl HostPaths {
    pub fn sys(&self, rel: &str) -> PathBuf {
        self.sysfs_root.join(rel)
    }

    pub fn proc(&self, rel: &str) -> PathBuf {
        self.procfs_root.join(rel)
    }
}

/// Reads a single-line pseudo file and trims it.
pub(crate) fn read_trimmed(path: &Path) -> Result<String, ProbeError> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| ProbeError::from_io(path, e))
}

/// Reads a pseudo file holding one integer.
pub(crate) fn read_number(path: &Path) -> Result<i64, ProbeError> {
    let raw = read_trimmed(path)?;
    raw.parse::<i64>()
        .map_err(|e| ProbeError::Parse(format!("{}: {:?}: {}", path.display(), raw, e)))
}
