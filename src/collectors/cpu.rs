//! CPU topology, frequency, utilisation and load.

use std::time::Duration;

use sysinfo::System;
use tracing::debug;

use super::HostPaths;
use crate::error::ProbeError;
use crate::format::{float_repr, mhz, percent, NOT_AVAILABLE};
use crate::section::Section;

/// Point-in-time CPU figures.
#[derive(Debug, Clone, PartialEq)]
pub struct CpuSnapshot {
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub max_frequency_mhz: Option<f64>,
    pub current_frequency_mhz: Option<f64>,
    pub usage_percent: f32,
    pub load_average_1m: Option<f64>,
}

impl CpuSnapshot {
    pub fn to_section(&self) -> Section {
        let mut section = Section::new();
        section.text(
            "Physical Cores",
            self.physical_cores
                .map(|n| n.to_string())
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        );
        section.text("Total Cores", self.logical_cores.to_string());
        section.text("Max Frequency", mhz(self.max_frequency_mhz));
        section.text("Current Frequency", mhz(self.current_frequency_mhz));
        section.text("CPU Usage", percent(self.usage_percent as f64));
        section.text(
            "Load Average (1min)",
            self.load_average_1m
                .map(float_repr)
                .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        );
        section
    }
}

/// Measures global CPU utilisation over `window`. Blocks for the window.
pub fn sample_usage(sys: &mut System, window: Duration) -> f32 {
    sys.refresh_cpu_usage();
    std::thread::sleep(window.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
    sys.refresh_cpu_usage();
    sys.global_cpu_usage()
}

/// Reads the CPU section figures, sampling utilisation over `window`.
pub fn read_cpu(sys: &mut System, paths: &HostPaths, window: Duration) -> CpuSnapshot {
    sys.refresh_cpu_all();
    let usage_percent = sample_usage(sys, window);

    let cpus = sys.cpus();
    let frequencies: Vec<u64> = cpus.iter().map(|c| c.frequency()).filter(|f| *f > 0).collect();
    let current_frequency_mhz = if frequencies.is_empty() {
        None
    } else {
        Some(frequencies.iter().sum::<u64>() as f64 / frequencies.len() as f64)
    };

    let max_frequency_mhz = match read_max_frequency(paths) {
        Ok(v) => Some(v),
        Err(e) => {
            debug!("Max CPU frequency unavailable: {}", e);
            None
        }
    };

    let load_average_1m = match read_load_average(paths) {
        Ok(load) => Some(load),
        Err(e) => {
            debug!("Load average unavailable: {}", e);
            None
        }
    };

    CpuSnapshot {
        physical_cores: sys.physical_core_count(),
        logical_cores: cpus.len(),
        max_frequency_mhz,
        current_frequency_mhz,
        usage_percent,
        load_average_1m,
    }
}

/// Maximum clock of cpu0 in MHz, from cpufreq.
#[cfg(target_os = "linux")]
pub fn read_max_frequency(paths: &HostPaths) -> Result<f64, ProbeError> {
    let khz = super::read_number(&paths.sys("devices/system/cpu/cpu0/cpufreq/cpuinfo_max_freq"))?;
    if khz <= 0 {
        return Err(ProbeError::Parse(format!("invalid cpuinfo_max_freq: {}", khz)));
    }
    Ok(crate::format::khz_to_mhz(khz as u64))
}

#[cfg(not(target_os = "linux"))]
pub fn read_max_frequency(_paths: &HostPaths) -> Result<f64, ProbeError> {
    Err(ProbeError::Unsupported)
}

/// Parses the 1-minute figure out of `/proc/loadavg`.
///
/// Format: "0.00 0.01 0.05 1/234 5678"
pub fn parse_load_average(content: &str) -> Result<f64, ProbeError> {
    let parts: Vec<&str> = content.split_whitespace().collect();
    if parts.len() < 3 {
        return Err(ProbeError::Parse(format!(
            "invalid loadavg format: expected at least 3 fields, got {}",
            parts.len()
        )));
    }

    parts[0]
        .parse::<f64>()
        .map_err(|e| ProbeError::Parse(format!("failed to parse 1min load average: {}", e)))
}

#[cfg(target_os = "linux")]
pub fn read_load_average(paths: &HostPaths) -> Result<f64, ProbeError> {
    let path = paths.proc("loadavg");
    let content = std::fs::read_to_string(&path).map_err(|e| ProbeError::from_io(&path, e))?;
    parse_load_average(&content)
}

#[cfg(all(unix, not(target_os = "linux")))]
pub fn read_load_average(_paths: &HostPaths) -> Result<f64, ProbeError> {
    Ok(System::load_average().one)
}

#[cfg(not(unix))]
pub fn read_load_average(_paths: &HostPaths) -> Result<f64, ProbeError> {
    Err(ProbeError::Unsupported)
}

#[cfg(test)]
mod tests {
    use super::*;
    #[cfg(target_os = "linux")]
    use std::fs;

    fn snapshot() -> CpuSnapshot {
        CpuSnapshot {
            physical_cores: Some(8),
            logical_cores: 16,
            max_frequency_mhz: Some(4_700.0),
            current_frequency_mhz: Some(2_345.678),
            usage_percent: 12.34,
            load_average_1m: Some(0.5),
        }
    }

    #[test]
    fn test_cpu_section_formatting() {
        let section = snapshot().to_section();
        assert_eq!(section.get_text("Physical Cores"), Some("8"));
        assert_eq!(section.get_text("Total Cores"), Some("16"));
        assert_eq!(section.get_text("Max Frequency"), Some("4700.00 MHz"));
        assert_eq!(section.get_text("Current Frequency"), Some("2345.68 MHz"));
        assert_eq!(section.get_text("CPU Usage"), Some("12.3%"));
        assert_eq!(section.get_text("Load Average (1min)"), Some("0.5"));
    }

    #[test]
    fn test_load_average_keeps_one_fractional_digit() {
        let section = CpuSnapshot {
            load_average_1m: Some(1.0),
            ..snapshot()
        }
        .to_section();
        assert_eq!(section.get_text("Load Average (1min)"), Some("1.0"));

        let section = CpuSnapshot {
            load_average_1m: Some(2.37),
            ..snapshot()
        }
        .to_section();
        assert_eq!(section.get_text("Load Average (1min)"), Some("2.37"));
    }

    #[test]
    fn test_cpu_section_sentinels_keep_labels() {
        let snap = CpuSnapshot {
            physical_cores: None,
            max_frequency_mhz: None,
            current_frequency_mhz: None,
            load_average_1m: None,
            ..snapshot()
        };
        let section = snap.to_section();
        assert_eq!(section.len(), 6);
        assert_eq!(section.get_text("Physical Cores"), Some("N/A"));
        assert_eq!(section.get_text("Max Frequency"), Some("N/A"));
        assert_eq!(section.get_text("Current Frequency"), Some("N/A"));
        assert_eq!(section.get_text("Load Average (1min)"), Some("N/A"));
    }

    #[test]
    fn test_parse_load_average() {
        assert_eq!(parse_load_average("0.52 0.58 0.59 3/467 12345\n").unwrap(), 0.52);

        assert!(parse_load_average("0.52").is_err());
        assert!(parse_load_average("x y z").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_readers_use_fixture_roots() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths {
            sysfs_root: dir.path().join("sys"),
            procfs_root: dir.path().join("proc"),
        };
        let freq_dir = paths.sys("devices/system/cpu/cpu0/cpufreq");
        fs::create_dir_all(&freq_dir).unwrap();
        fs::create_dir_all(&paths.procfs_root).unwrap();
        fs::write(freq_dir.join("cpuinfo_max_freq"), "3600000\n").unwrap();
        fs::write(paths.proc("loadavg"), "1.25 1.00 0.75 2/100 42\n").unwrap();

        assert_eq!(read_max_frequency(&paths).unwrap(), 3600.0);
        assert_eq!(read_load_average(&paths).unwrap(), 1.25);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_missing_cpufreq_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let paths = HostPaths {
            sysfs_root: dir.path().to_path_buf(),
            procfs_root: dir.path().to_path_buf(),
        };
        assert!(matches!(read_max_frequency(&paths), Err(ProbeError::NotFound(_))));
    }
}
