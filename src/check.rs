//! The status check pipeline.
//!
//! Runs every collector once, in report order, and hands each section to a
//! [`ReportSink`]. Collectors never fail the run; only a missing metrics
//! provider or an output error does.

use std::io::{self, Write};
use std::time::Duration;

use chrono::Local;
use sysinfo::System;
use tracing::{debug, info};

use crate::collectors::bios::{source_for, Platform};
use crate::collectors::cpu::read_cpu;
use crate::collectors::filesystem::{disk_section, read_partitions};
use crate::collectors::identity::read_identity;
use crate::collectors::memory::read_memory;
use crate::collectors::netdev::{collect_stats, network_section, read_interfaces};
use crate::collectors::thermal::{collect_temperatures, temperature_section};
use crate::collectors::HostPaths;
use crate::config::Config;
use crate::error::CheckError;
use crate::health::{evaluate, gather_inputs, HealthReport, Thresholds};
use crate::report::{ReportSink, SectionKind};
use crate::section::Section;

/// Inputs for one check run.
#[derive(Debug, Clone)]
pub struct CheckSettings {
    pub paths: HostPaths,
    pub thresholds: Thresholds,
    pub cpu_sample: Duration,
    pub bios_timeout: Duration,
    pub platform: Platform,
}

impl Default for CheckSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl CheckSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            paths: config.host_paths(),
            thresholds: config.thresholds(),
            cpu_sample: config.cpu_sample(),
            bios_timeout: config.bios_timeout(),
            platform: Platform::current(),
        }
    }
}

/// Fails when the metrics provider has no backend for this platform.
pub fn ensure_provider() -> Result<(), CheckError> {
    if sysinfo::IS_SUPPORTED_SYSTEM {
        Ok(())
    } else {
        Err(CheckError::MissingProvider(std::env::consts::OS.to_string()))
    }
}

/// Collects one section. Each call is an independent read of the host.
pub fn collect_section(kind: SectionKind, sys: &mut System, settings: &CheckSettings) -> Section {
    debug!("Collecting {}", kind.key());
    match kind {
        SectionKind::System => read_identity(sys).to_section(),
        SectionKind::Bios => {
            source_for(settings.platform, &settings.paths, settings.bios_timeout).collect()
        }
        SectionKind::Cpu => read_cpu(sys, &settings.paths, settings.cpu_sample).to_section(),
        SectionKind::Memory => read_memory(sys, &settings.paths).to_section(),
        SectionKind::Temperature => temperature_section(collect_temperatures(&settings.paths)),
        SectionKind::Disk => match read_partitions(&settings.paths) {
            Ok(partitions) => disk_section(&partitions),
            Err(e) => {
                tracing::warn!("Partition list unavailable: {}", e);
                Section::new()
            }
        },
        SectionKind::Network => match read_interfaces() {
            Ok(interfaces) => {
                let stats = collect_stats(&settings.paths, &interfaces);
                network_section(&interfaces, &stats)
            }
            Err(e) => {
                tracing::warn!("Interface list unavailable: {}", e);
                Section::new()
            }
        },
        SectionKind::Health => run_health_with(sys, settings).to_section(),
    }
}

fn run_health_with(sys: &mut System, settings: &CheckSettings) -> HealthReport {
    let inputs = gather_inputs(sys, &settings.paths, settings.cpu_sample);
    evaluate(&inputs, &settings.thresholds)
}

/// Runs the full check and writes the report to `sink`.
pub fn run_check(settings: &CheckSettings, sink: &mut dyn ReportSink) -> Result<(), CheckError> {
    ensure_provider()?;
    info!("Starting system status check");

    let mut sys = System::new();
    // CPU brand strings are needed by the identity section.
    sys.refresh_cpu_all();

    sink.begin(Local::now())?;
    for kind in SectionKind::ALL {
        let section = collect_section(kind, &mut sys, settings);
        sink.section(kind, &section)?;
    }
    sink.finish()?;

    info!("System status check complete");
    Ok(())
}

/// Writes the operator message for a fatal check error.
///
/// A closed output pipe is not reported: the reader has gone away.
pub fn write_failure<W: Write>(out: &mut W, err: &CheckError) -> io::Result<()> {
    match err {
        CheckError::Output(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        CheckError::MissingProvider(_) => {
            writeln!(out, "Missing required module: {}", err)?;
            writeln!(out, "Supported platforms: Linux, Windows, macOS, FreeBSD")
        }
        _ => {
            writeln!(out, "Error running system check: {}", err)?;
            writeln!(out, "Make sure you're running with appropriate permissions.")
        }
    }
}

/// Runs only the health evaluation.
pub fn run_health(settings: &CheckSettings) -> Result<HealthReport, CheckError> {
    ensure_provider()?;
    let mut sys = System::new();
    Ok(run_health_with(&mut sys, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_from_config() {
        let config = Config {
            cpu_sample_ms: 250,
            bios_timeout_secs: 3,
            disk_warn_percent: 75.0,
            ..Config::default()
        };
        let settings = CheckSettings::from_config(&config);
        assert_eq!(settings.cpu_sample, Duration::from_millis(250));
        assert_eq!(settings.bios_timeout, Duration::from_secs(3));
        assert_eq!(settings.thresholds.disk_percent, 75.0);
        assert_eq!(settings.platform, Platform::current());
    }

    /// Writer whose reader has hung up.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }
    }

    #[test]
    fn test_closed_pipe_surfaces_as_output_error() {
        let mut sink = crate::report::TextReport::new(ClosedPipe, 2);
        let err = sink.begin(Local::now()).map_err(CheckError::from).unwrap_err();
        assert!(matches!(&err, CheckError::Output(e) if e.kind() == io::ErrorKind::BrokenPipe));

        let mut out = Vec::new();
        write_failure(&mut out, &err).unwrap();
        assert!(out.is_empty());
        // Reporting to the closed pipe itself returns quietly too.
        assert!(write_failure(&mut ClosedPipe, &err).is_ok());
    }

    #[test]
    fn test_failure_messages() {
        let mut out = Vec::new();
        write_failure(&mut out, &CheckError::MissingProvider("plan9".into())).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Missing required module: system metrics provider unavailable on plan9\n"));

        let mut out = Vec::new();
        let err = CheckError::Output(io::Error::from(io::ErrorKind::PermissionDenied));
        write_failure(&mut out, &err).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Error running system check: failed to write report:"));
        assert!(text.ends_with("Make sure you're running with appropriate permissions.\n"));

        // A writer that fails for another reason reports the error instead of panicking.
        assert!(write_failure(&mut ClosedPipe, &err).is_err());
    }

    #[test]
    fn test_unsupported_platform_bios_section() {
        let settings = CheckSettings {
            platform: Platform::Other,
            ..CheckSettings::default()
        };
        let mut sys = System::new();
        let section = collect_section(SectionKind::Bios, &mut sys, &settings);
        assert_eq!(
            section.get_text("Status"),
            Some(crate::collectors::bios::NOT_ACCESSIBLE)
        );
        assert_eq!(section.len(), 1);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_temperature_section_with_empty_sysfs() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CheckSettings {
            paths: HostPaths {
                sysfs_root: dir.path().to_path_buf(),
                procfs_root: dir.path().to_path_buf(),
            },
            ..CheckSettings::default()
        };
        let mut sys = System::new();
        let section = collect_section(SectionKind::Temperature, &mut sys, &settings);
        assert_eq!(section.len(), 1);
        assert!(section.contains("Status"));
    }
}
