//! CLI command implementations for system-status-check.
//!
//! This module provides implementations for all CLI subcommands:
//! - `config`: Configuration file generation
//! - `health`: Health check only

pub mod config;
pub mod health;

// Re-export command functions
pub use config::command_config;
pub use health::command_health;
