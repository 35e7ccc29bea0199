//! BIOS and board identification.
//!
//! The source is chosen once per run from the [`Platform`]:
//! - Windows: `wmic bios get ...` with a hard timeout
//! - Unix: the DMI pseudo files under `/sys/class/dmi/id`
//! - anything else: nothing to read
//!
//! Whatever happens, [`BiosSource::collect`] returns a section; failures are
//! reported as a single `Error` entry.

use std::path::PathBuf;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use super::{read_trimmed, HostPaths};
use crate::error::ProbeError;
use crate::section::Section;

pub const NOT_ACCESSIBLE: &str = "BIOS information not accessible";

/// DMI files read on Unix hosts and their report labels.
const DMI_FIELDS: [(&str, &str); 3] = [
    ("bios_version", "BIOS Version"),
    ("board_name", "Board Name"),
    ("board_vendor", "Board Vendor"),
];

/// Platform family, decides how BIOS data is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    UnixLike,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(unix) {
            Platform::UnixLike
        } else {
            Platform::Other
        }
    }
}

/// A way of reading BIOS/board identifiers.
pub trait BiosSource {
    fn collect(&self) -> Section;
}

/// Picks the source for `platform`.
pub fn source_for(platform: Platform, paths: &HostPaths, timeout: Duration) -> Box<dyn BiosSource> {
    match platform {
        Platform::Windows => Box::new(CommandBios::wmic(timeout)),
        Platform::UnixLike => Box::new(DmiBios::new(paths.sys("class/dmi/id"))),
        Platform::Other => Box::new(UnsupportedBios),
    }
}

fn not_accessible() -> Section {
    Section::single("Status", NOT_ACCESSIBLE)
}

fn failure(err: &ProbeError) -> Section {
    Section::single("Error", format!("Could not retrieve BIOS info: {}", err))
}

/// Reads DMI identifiers from sysfs, one file per field.
#[derive(Debug, Clone)]
pub struct DmiBios {
    dmi_dir: PathBuf,
}

impl DmiBios {
    pub fn new(dmi_dir: PathBuf) -> Self {
        Self { dmi_dir }
    }

    /// Reads one DMI attribute.
    pub fn read_field(&self, file: &str) -> Result<String, ProbeError> {
        read_trimmed(&self.dmi_dir.join(file))
    }
}

impl BiosSource for DmiBios {
    fn collect(&self) -> Section {
        let mut section = Section::new();
        for (file, label) in DMI_FIELDS {
            match self.read_field(file) {
                Ok(value) => section.text(label, value),
                Err(e) => debug!("Skipping DMI field {}: {}", file, e),
            }
        }

        if section.is_empty() {
            not_accessible()
        } else {
            section
        }
    }
}

/// Runs an external query tool and parses its `key=value` output.
#[derive(Debug, Clone)]
pub struct CommandBios {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandBios {
    pub fn new(program: impl Into<String>, args: &[&str], timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            timeout,
        }
    }

    /// The Windows management query for BIOS name, serial number and version.
    pub fn wmic(timeout: Duration) -> Self {
        Self::new(
            "wmic",
            &["bios", "get", "name,serialnumber,version", "/format:list"],
            timeout,
        )
    }

    /// Runs the tool; `Ok(None)` when it exits unsuccessfully.
    fn run(&self) -> Result<Option<String>, ProbeError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ProbeError::Command(format!("failed to start runtime: {}", e)))?;

        runtime.block_on(async {
            let output = Command::new(&self.program)
                .args(&self.args)
                .kill_on_drop(true)
                .output();

            match tokio::time::timeout(self.timeout, output).await {
                Err(_) => Err(ProbeError::Timeout(self.timeout)),
                Ok(Err(e)) => Err(ProbeError::Command(format!("{}: {}", self.program, e))),
                Ok(Ok(out)) if out.status.success() => {
                    Ok(Some(String::from_utf8_lossy(&out.stdout).into_owned()))
                }
                Ok(Ok(out)) => {
                    debug!("{} exited with {}", self.program, out.status);
                    Ok(None)
                }
            }
        })
    }
}

impl BiosSource for CommandBios {
    fn collect(&self) -> Section {
        match self.run() {
            Ok(Some(stdout)) => {
                let mut section = Section::new();
                for (key, value) in parse_key_values(&stdout) {
                    section.text(key, value);
                }
                if section.is_empty() {
                    not_accessible()
                } else {
                    section
                }
            }
            Ok(None) => not_accessible(),
            Err(e) => {
                warn!("BIOS query failed: {}", e);
                failure(&e)
            }
        }
    }
}

/// Used where no BIOS source exists.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedBios;

impl BiosSource for UnsupportedBios {
    fn collect(&self) -> Section {
        not_accessible()
    }
}

/// Parses `key=value` lines, keeping entries with a non-empty value.
pub fn parse_key_values(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), value.trim().to_string()))
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_key_values() {
        let output = "\r\n\r\nName=Default System BIOS\r\nSerialNumber=\r\nVersion=DELL   - 1072009\r\nnoise\r\n";
        let parsed = parse_key_values(output);
        assert_eq!(
            parsed,
            vec![
                ("Name".to_string(), "Default System BIOS".to_string()),
                ("Version".to_string(), "DELL   - 1072009".to_string()),
            ]
        );
    }

    #[test]
    fn test_parse_key_values_splits_on_first_equals() {
        let parsed = parse_key_values("Version=a=b\n");
        assert_eq!(parsed, vec![("Version".to_string(), "a=b".to_string())]);
    }

    #[test]
    fn test_unsupported_platform_is_not_accessible() {
        let section = source_for(Platform::Other, &HostPaths::default(), Duration::from_secs(1))
            .collect();
        assert_eq!(section, Section::single("Status", NOT_ACCESSIBLE));
    }

    #[test]
    fn test_dmi_reads_available_fields_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bios_version"), "1.14.0\n").unwrap();
        fs::write(dir.path().join("board_vendor"), "Dell Inc.\n").unwrap();

        let section = DmiBios::new(dir.path().to_path_buf()).collect();
        assert_eq!(section.len(), 2);
        assert_eq!(section.get_text("BIOS Version"), Some("1.14.0"));
        assert_eq!(section.get_text("Board Vendor"), Some("Dell Inc."));
        assert!(!section.contains("Board Name"));
    }

    #[test]
    fn test_dmi_missing_directory_is_not_accessible() {
        let dir = tempfile::tempdir().unwrap();
        let bios = DmiBios::new(dir.path().join("absent"));
        assert!(matches!(bios.read_field("board_name"), Err(ProbeError::NotFound(_))));
        assert_eq!(bios.collect(), Section::single("Status", NOT_ACCESSIBLE));
    }

    #[test]
    fn test_missing_tool_becomes_error_entry() {
        let bios = CommandBios::new(
            "definitely-not-a-bios-tool",
            &[],
            Duration::from_secs(2),
        );
        let section = bios.collect();
        assert_eq!(section.len(), 1);
        let msg = section.get_text("Error").unwrap();
        assert!(msg.starts_with("Could not retrieve BIOS info:"), "{}", msg);
    }

    #[cfg(unix)]
    #[test]
    fn test_command_output_is_parsed() {
        let bios = CommandBios::new(
            "sh",
            &["-c", "printf 'Name=Fake BIOS\\nSerialNumber=\\nVersion=2.3\\n'"],
            Duration::from_secs(5),
        );
        let section = bios.collect();
        assert_eq!(section.get_text("Name"), Some("Fake BIOS"));
        assert_eq!(section.get_text("Version"), Some("2.3"));
        assert!(!section.contains("SerialNumber"));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_timeout_becomes_error_entry() {
        let bios = CommandBios::new("sleep", &["5"], Duration::from_millis(100));
        let section = bios.collect();
        let msg = section.get_text("Error").unwrap();
        assert!(msg.contains("timed out"), "{}", msg);
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_is_not_accessible() {
        let bios = CommandBios::new("false", &[], Duration::from_secs(5));
        assert_eq!(bios.collect(), Section::single("Status", NOT_ACCESSIBLE));
    }
}
