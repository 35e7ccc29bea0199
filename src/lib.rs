//! System Status Check Library
//!
//! Collects a one-shot snapshot of host status (OS identity, BIOS/board
//! identifiers, CPU, memory, temperatures, disks, network interfaces) and
//! evaluates a small set of health thresholds.
//!
//! # Usage
//!
//! ```no_run
//! use system_status_check::check::{run_check, CheckSettings};
//! use system_status_check::report::{TextReport, DEFAULT_MAX_ADDRESSES};
//!
//! let mut sink = TextReport::new(std::io::stdout(), DEFAULT_MAX_ADDRESSES);
//! run_check(&CheckSettings::default(), &mut sink)?;
//! # Ok::<(), system_status_check::CheckError>(())
//! ```

pub mod check;
pub mod cli;
pub mod collectors;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod health;
pub mod report;
pub mod section;

// Re-export main types for convenience
pub use check::{run_check, run_health, CheckSettings};
pub use config::Config;
pub use error::{CheckError, ProbeError};
pub use health::{evaluate, HealthInputs, HealthReport, Thresholds};
pub use report::{JsonReport, ReportSink, SectionKind, TextReport};
pub use section::{Section, Value};
