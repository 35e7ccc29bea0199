//! Config command implementation.
//!
//! Generates configuration files in various formats.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

pub const DEFAULT_OUTPUT: &str = "system-status-check.yaml";

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    let content = config_content(format, commented)?;

    if output.to_string_lossy() == "-" {
        io::stdout().write_all(content.as_bytes())?;
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Default configuration text, with a comment header for YAML and TOML.
pub fn config_content(format: ConfigFormat, commented: bool) -> anyhow::Result<String> {
    let content = render_config(&Config::default(), format)?;
    Ok(match format {
        ConfigFormat::Yaml | ConfigFormat::Toml if commented => add_config_comments(content),
        _ => content,
    })
}

/// Adds comments to a YAML or TOML configuration.
fn add_config_comments(body: String) -> String {
    let comments = r#"# System Status Check Configuration
# ==================================
#
# Health Thresholds
# -----------------
# cpu_warn_percent: 80.0       # Warn when CPU usage is above this
# memory_warn_percent: 85.0    # Warn when memory usage is above this
# disk_warn_percent: 90.0      # Warn when a partition is fuller than this
#
# Probing
# -------
# cpu_sample_ms: 1000          # CPU sampling window (100-10000)
# bios_timeout_secs: 10        # Timeout for the BIOS query tool (1-60)
# sysfs_root: "/sys"           # Root of sysfs (Linux)
# procfs_root: "/proc"         # Root of procfs (Linux)
#
# Output
# ------
# max_addresses_per_interface: 2  # Addresses shown per network interface
#
# Logging
# -------
# log_level: "warn"            # off, error, warn, info, debug, trace (stderr)
"#;

    format!("{comments}\n{body}")
}
