//! OS identity: name, host, kernel, machine and build information.

use sysinfo::System;

use crate::format::NOT_AVAILABLE;
use crate::section::Section;

/// Compiler version the binary was built with.
pub const RUST_VERSION: &str = env!("VERGEN_RUSTC_SEMVER");

/// Identity of the running host.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub system: String,
    pub node_name: String,
    pub release: String,
    pub version: String,
    pub machine: String,
    pub processor: String,
    pub architecture: String,
    pub rust_version: String,
}

impl Identity {
    pub fn to_section(&self) -> Section {
        let mut section = Section::new();
        section.text("System", &self.system);
        section.text("Node Name", &self.node_name);
        section.text("Release", &self.release);
        section.text("Version", &self.version);
        section.text("Machine", &self.machine);
        section.text("Processor", &self.processor);
        section.text("Architecture", &self.architecture);
        section.text("Rust Version", &self.rust_version);
        section
    }
}

/// Kernel identification as reported by `uname(2)`.
struct Uname {
    sysname: String,
    nodename: String,
    release: String,
    version: String,
    machine: String,
}

#[cfg(unix)]
fn read_uname() -> Option<Uname> {
    match nix::sys::utsname::uname() {
        Ok(uts) => Some(Uname {
            sysname: uts.sysname().to_string_lossy().into_owned(),
            nodename: uts.nodename().to_string_lossy().into_owned(),
            release: uts.release().to_string_lossy().into_owned(),
            version: uts.version().to_string_lossy().into_owned(),
            machine: uts.machine().to_string_lossy().into_owned(),
        }),
        Err(e) => {
            tracing::debug!("uname failed: {}", e);
            None
        }
    }
}

#[cfg(not(unix))]
fn read_uname() -> Option<Uname> {
    None
}

/// Platform name in the conventional capitalisation (`Linux`, `Windows`, `Darwin`).
fn platform_name() -> String {
    match std::env::consts::OS {
        "windows" => "Windows".to_string(),
        "macos" => "Darwin".to_string(),
        other => crate::format::title_case(other),
    }
}

fn or_na(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Reads the host identity. `sys` must have its CPU list loaded.
pub fn read_identity(sys: &System) -> Identity {
    let uname = read_uname();

    let processor = or_na(sys.cpus().first().map(|c| c.brand().trim().to_string()));
    let architecture = if cfg!(target_pointer_width = "64") {
        "64bit"
    } else {
        "32bit"
    };

    match uname {
        Some(u) => Identity {
            system: u.sysname,
            node_name: u.nodename,
            release: u.release,
            version: u.version,
            machine: u.machine,
            processor,
            architecture: architecture.to_string(),
            rust_version: RUST_VERSION.to_string(),
        },
        None => Identity {
            system: platform_name(),
            node_name: or_na(System::host_name()),
            release: or_na(System::os_version()),
            version: or_na(System::long_os_version()),
            machine: std::env::consts::ARCH.to_string(),
            processor,
            architecture: architecture.to_string(),
            rust_version: RUST_VERSION.to_string(),
        },
    }
}
