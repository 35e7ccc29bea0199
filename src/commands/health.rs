//! Health command implementation.
//!
//! Runs the health evaluator on its own and prints it in report style.

use std::io::{self, Write};

use crate::check::{run_health, CheckSettings};
use crate::cli::OutputFormat;
use crate::report::{ReportSink, SectionKind, TextReport, DEFAULT_MAX_ADDRESSES};

/// Prints the health section. Returns whether any warning was raised.
pub fn command_health(settings: &CheckSettings, format: OutputFormat) -> anyhow::Result<bool> {
    let report = run_health(settings)?;
    let section = report.to_section();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match format {
        OutputFormat::Text => {
            let mut sink = TextReport::new(&mut out, DEFAULT_MAX_ADDRESSES);
            sink.section(SectionKind::Health, &section)?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut out, &section)?;
            writeln!(out)?;
        }
    }

    if report.has_warnings() {
        tracing::warn!("{} health warning(s) raised", report.warnings.len());
    }
    Ok(report.has_warnings())
}
