//! Configuration management for system-status-check.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use crate::collectors::HostPaths;
use crate::error::CheckError;
use crate::health::Thresholds;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

// Default configuration constants
pub const DEFAULT_CPU_SAMPLE_MS: u64 = 1000;
pub const DEFAULT_BIOS_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Locations searched when no `--config` is given.
pub const DEFAULT_CONFIG_PATHS: [&str; 4] = [
    "/etc/system-status-check/config.yaml",
    "./system-status-check.yaml",
    "./system-status-check.yml",
    "./system-status-check.json",
];

fn default_cpu_warn() -> f64 {
    80.0
}
fn default_memory_warn() -> f64 {
    85.0
}
fn default_disk_warn() -> f64 {
    90.0
}
fn default_cpu_sample_ms() -> u64 {
    DEFAULT_CPU_SAMPLE_MS
}
fn default_bios_timeout_secs() -> u64 {
    DEFAULT_BIOS_TIMEOUT_SECS
}
fn default_max_addresses() -> usize {
    crate::report::DEFAULT_MAX_ADDRESSES
}
fn default_sysfs_root() -> PathBuf {
    PathBuf::from("/sys")
}
fn default_procfs_root() -> PathBuf {
    PathBuf::from("/proc")
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Effective settings for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    // Health thresholds
    #[serde(default = "default_cpu_warn", alias = "cpu-warn-percent")]
    pub cpu_warn_percent: f64,
    #[serde(default = "default_memory_warn", alias = "memory-warn-percent")]
    pub memory_warn_percent: f64,
    #[serde(default = "default_disk_warn", alias = "disk-warn-percent")]
    pub disk_warn_percent: f64,

    // Probing
    #[serde(default = "default_cpu_sample_ms", alias = "cpu-sample-ms")]
    pub cpu_sample_ms: u64,
    #[serde(default = "default_bios_timeout_secs", alias = "bios-timeout-secs")]
    pub bios_timeout_secs: u64,
    #[serde(default = "default_sysfs_root", alias = "sysfs-root")]
    pub sysfs_root: PathBuf,
    #[serde(default = "default_procfs_root", alias = "procfs-root")]
    pub procfs_root: PathBuf,

    // Output
    #[serde(default = "default_max_addresses", alias = "max-addresses-per-interface")]
    pub max_addresses_per_interface: usize,

    // Logging
    #[serde(default = "default_log_level", alias = "log-level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cpu_warn_percent: default_cpu_warn(),
            memory_warn_percent: default_memory_warn(),
            disk_warn_percent: default_disk_warn(),
            cpu_sample_ms: default_cpu_sample_ms(),
            bios_timeout_secs: default_bios_timeout_secs(),
            sysfs_root: default_sysfs_root(),
            procfs_root: default_procfs_root(),
            max_addresses_per_interface: default_max_addresses(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            cpu_percent: self.cpu_warn_percent,
            memory_percent: self.memory_warn_percent,
            disk_percent: self.disk_warn_percent,
        }
    }

    pub fn host_paths(&self) -> HostPaths {
        HostPaths {
            sysfs_root: self.sysfs_root.clone(),
            procfs_root: self.procfs_root.clone(),
        }
    }

    pub fn cpu_sample(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }

    pub fn bios_timeout(&self) -> Duration {
        Duration::from_secs(self.bios_timeout_secs)
    }

    /// Log level as a CLI value, `None` if the string is not a known level.
    pub fn parsed_log_level(&self) -> Option<LogLevel> {
        match self.log_level.to_ascii_lowercase().as_str() {
            "off" => Some(LogLevel::Off),
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), CheckError> {
    for (name, value) in [
        ("cpu_warn_percent", cfg.cpu_warn_percent),
        ("memory_warn_percent", cfg.memory_warn_percent),
        ("disk_warn_percent", cfg.disk_warn_percent),
    ] {
        if !(value > 0.0 && value <= 100.0) {
            return Err(CheckError::Config(format!(
                "{} must be in (0, 100], got {}",
                name, value
            )));
        }
    }

    if !(100..=10_000).contains(&cfg.cpu_sample_ms) {
        return Err(CheckError::Config(format!(
            "cpu_sample_ms must be between 100 and 10000, got {}",
            cfg.cpu_sample_ms
        )));
    }

    if !(1..=60).contains(&cfg.bios_timeout_secs) {
        return Err(CheckError::Config(format!(
            "bios_timeout_secs must be between 1 and 60, got {}",
            cfg.bios_timeout_secs
        )));
    }

    if cfg.parsed_log_level().is_none() {
        return Err(CheckError::Config(format!(
            "Invalid log_level '{}', expected off, error, warn, info, debug or trace",
            cfg.log_level
        )));
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, CheckError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(ms) = args.cpu_sample_ms {
        config.cpu_sample_ms = ms;
    }
    if let Some(secs) = args.bios_timeout_secs {
        config.bios_timeout_secs = secs;
    }
    if let Some(level) = args.log_level {
        config.log_level = format!("{:?}", level).to_lowercase();
    }

    Ok(config)
}

/// Loads the config file at `path`, or the first default location that exists.
///
/// An explicit path that does not exist is an error; missing default files
/// just yield the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, CheckError> {
    let path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CheckError::Config(format!(
                    "config file not found: {}",
                    p.display()
                )));
            }
            p.to_path_buf()
        }
        None => match DEFAULT_CONFIG_PATHS.iter().find(|p| Path::new(p).exists()) {
            Some(p) => PathBuf::from(p),
            None => return Ok(Config::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| CheckError::Config(format!("{}: {}", path.display(), e)))?;
    let parse_err = |e: &dyn std::fmt::Display| CheckError::Config(format!("{}: {}", path.display(), e));

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content).map_err(|e| parse_err(&e))?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content).map_err(|e| parse_err(&e))?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content).map_err(|e| parse_err(&e))?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Serializes a configuration in the requested format.
pub fn render_config(config: &Config, format: ConfigFormat) -> anyhow::Result<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> anyhow::Result<()> {
    let rendered = render_config(config, format)?;
    writeln!(std::io::stdout(), "{}", rendered)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn write_config(ext: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new()
            .suffix(&format!(".{}", ext))
            .tempfile()
            .unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(validate_effective_config(&config).is_ok());
        assert_eq!(config.thresholds(), Thresholds::default());
        assert_eq!(config.host_paths(), HostPaths::default());
        assert_eq!(config.cpu_sample(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_yaml_with_partial_keys() {
        let file = write_config("yaml", "cpu_warn_percent: 70\nmax_addresses_per_interface: 4\n");
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.cpu_warn_percent, 70.0);
        assert_eq!(config.max_addresses_per_interface, 4);
        assert_eq!(config.memory_warn_percent, 85.0);
    }

    #[test]
    fn test_load_json_and_toml() {
        let json = write_config("json", r#"{"disk_warn_percent": 95.5}"#);
        assert_eq!(load_config(Some(json.path())).unwrap().disk_warn_percent, 95.5);

        let toml = write_config("toml", "bios_timeout_secs = 3\n");
        assert_eq!(load_config(Some(toml.path())).unwrap().bios_timeout_secs, 3);
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let file = write_config("yaml", "port: 9215\n");
        assert!(matches!(
            load_config(Some(file.path())),
            Err(CheckError::Config(_))
        ));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let result = load_config(Some(Path::new("/nonexistent/system-status-check.yaml")));
        assert!(matches!(result, Err(CheckError::Config(_))));
    }

    #[test]
    fn test_validation_ranges() {
        let mut config = Config {
            cpu_warn_percent: 0.0,
            ..Config::default()
        };
        assert!(validate_effective_config(&config).is_err());

        config.cpu_warn_percent = 100.0;
        assert!(validate_effective_config(&config).is_ok());

        config.cpu_sample_ms = 50;
        assert!(validate_effective_config(&config).is_err());

        config.cpu_sample_ms = 100;
        config.bios_timeout_secs = 61;
        assert!(validate_effective_config(&config).is_err());

        config.bios_timeout_secs = 60;
        config.log_level = "loud".into();
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_config("yaml", "cpu_sample_ms: 500\nlog_level: info\n");
        let path = file.path().to_str().unwrap().to_string();
        let args = Args::parse_from([
            "system-status-check",
            "--config",
            &path,
            "--cpu-sample-ms",
            "200",
            "--log-level",
            "debug",
        ]);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.cpu_sample_ms, 200);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.parsed_log_level(), Some(LogLevel::Debug));
    }

    #[test]
    fn test_no_config_uses_defaults() {
        let args = Args::parse_from(["system-status-check", "--no-config"]);
        assert_eq!(resolve_config(&args).unwrap(), Config::default());
    }

    #[test]
    fn test_render_round_trips_through_yaml() {
        let rendered = render_config(&Config::default(), ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Config::default());
    }
}
