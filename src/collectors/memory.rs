//! Physical memory and swap usage.
//!
//! On Linux the figures come straight from `/proc/meminfo`; other platforms use
//! the `sysinfo` provider.

use sysinfo::System;
use tracing::debug;

use super::HostPaths;
use crate::error::ProbeError;
use crate::format::{bytes_to_gb, percent, percent_of};
use crate::section::Section;

/// Memory and swap totals in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemorySnapshot {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_free_bytes: u64,
}

impl MemorySnapshot {
    /// Share of physical memory not available to new allocations.
    pub fn usage_percent(&self) -> f64 {
        percent_of(
            self.total_bytes.saturating_sub(self.available_bytes),
            self.total_bytes,
        )
        .unwrap_or(0.0)
    }

    pub fn swap_used_bytes(&self) -> u64 {
        self.swap_total_bytes.saturating_sub(self.swap_free_bytes)
    }

    pub fn swap_usage_percent(&self) -> f64 {
        percent_of(self.swap_used_bytes(), self.swap_total_bytes).unwrap_or(0.0)
    }

    pub fn to_section(&self) -> Section {
        let mut section = Section::new();
        section.text("Total RAM", bytes_to_gb(self.total_bytes));
        section.text("Available RAM", bytes_to_gb(self.available_bytes));
        section.text("RAM Usage", percent(self.usage_percent()));
        section.text("Total Swap", bytes_to_gb(self.swap_total_bytes));
        section.text("Swap Usage", percent(self.swap_usage_percent()));
        section
    }
}

/// Parses the fields of `/proc/meminfo` needed for the memory section.
pub fn parse_meminfo(content: &str) -> Result<MemorySnapshot, ProbeError> {
    let mut total_bytes: Option<u64> = None;
    let mut available_bytes: Option<u64> = None;
    let mut swap_total_bytes: Option<u64> = None;
    let mut swap_free_bytes: Option<u64> = None;

    for line in content.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };

        match key {
            "MemTotal:" => total_bytes = Some(kb * 1024),
            "MemAvailable:" => available_bytes = Some(kb * 1024),
            "SwapTotal:" => swap_total_bytes = Some(kb * 1024),
            "SwapFree:" => swap_free_bytes = Some(kb * 1024),
            _ => {}
        }

        if total_bytes.is_some()
            && available_bytes.is_some()
            && swap_total_bytes.is_some()
            && swap_free_bytes.is_some()
        {
            break;
        }
    }

    match (total_bytes, available_bytes, swap_total_bytes, swap_free_bytes) {
        (Some(total), Some(available), Some(swap_total), Some(swap_free)) => Ok(MemorySnapshot {
            total_bytes: total,
            available_bytes: available,
            swap_total_bytes: swap_total,
            swap_free_bytes: swap_free,
        }),
        _ => Err(ProbeError::Parse(
            "failed to parse required fields from meminfo".to_string(),
        )),
    }
}

fn provider_memory(sys: &mut System) -> MemorySnapshot {
    sys.refresh_memory();
    MemorySnapshot {
        total_bytes: sys.total_memory(),
        available_bytes: sys.available_memory(),
        swap_total_bytes: sys.total_swap(),
        swap_free_bytes: sys.free_swap(),
    }
}

#[cfg(target_os = "linux")]
fn read_meminfo(paths: &HostPaths) -> Result<MemorySnapshot, ProbeError> {
    let path = paths.proc("meminfo");
    let content = std::fs::read_to_string(&path).map_err(|e| ProbeError::from_io(&path, e))?;
    parse_meminfo(&content)
}

#[cfg(not(target_os = "linux"))]
fn read_meminfo(_paths: &HostPaths) -> Result<MemorySnapshot, ProbeError> {
    Err(ProbeError::Unsupported)
}

/// Reads memory figures, falling back to the provider when meminfo is unusable.
pub fn read_memory(sys: &mut System, paths: &HostPaths) -> MemorySnapshot {
    match read_meminfo(paths) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!("meminfo unavailable ({}), using provider", e);
            provider_memory(sys)
        }
    }
}
