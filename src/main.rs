//! system-status-check
//!
//! Prints a one-shot motherboard and system status report.
//! This is the main entry point that resolves configuration and handles subcommands.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, Level};

use system_status_check::check::{run_check, write_failure, CheckSettings};
use system_status_check::cli::{Args, Commands, LogLevel, OutputFormat};
use system_status_check::commands::{command_config, command_health};
use system_status_check::config::{resolve_config, show_config, validate_effective_config, Config};
use system_status_check::error::CheckError;
use system_status_check::report::{JsonReport, TextReport};

/// Initializes tracing on stderr so stdout carries only the report.
fn setup_logging(config: &Config) {
    let log_level = match config.parsed_log_level().unwrap_or(LogLevel::Warn) {
        LogLevel::Off => return,
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return;
    }

    debug!("Logging initialized with level: {}", config.log_level);
}

/// Runs the full report, printing fatal errors the way operators expect.
fn report(config: &Config, format: OutputFormat) -> ExitCode {
    let settings = CheckSettings::from_config(config);
    let stdout = io::stdout();

    let result = match format {
        OutputFormat::Text => {
            let mut sink = TextReport::new(stdout.lock(), config.max_addresses_per_interface);
            run_check(&settings, &mut sink)
        }
        OutputFormat::Json => {
            let mut sink = JsonReport::new(stdout.lock());
            run_check(&settings, &mut sink)
        }
    };

    if let Err(e) = result {
        // Nothing more can be reported if stdout itself is gone.
        let _ = write_failure(&mut io::stdout(), &e);
    }
    ExitCode::SUCCESS
}

/// Main application entry point.
fn main() -> ExitCode {
    let args = Args::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };

    if args.check_config {
        return match validate_effective_config(&config) {
            Ok(()) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration invalid: {}", e);
                ExitCode::FAILURE
            }
        };
    }

    if args.show_config {
        return match show_config(&config, args.config_format) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ {:#}", e);
                ExitCode::FAILURE
            }
        };
    }

    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        return ExitCode::FAILURE;
    }

    setup_logging(&config);

    match &args.command {
        Some(Commands::Config {
            output,
            format,
            commented,
        }) => match command_config(output.clone(), *format, *commented) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ {:#}", e);
                ExitCode::FAILURE
            }
        },
        Some(Commands::Health) => {
            match command_health(&CheckSettings::from_config(&config), args.format) {
                Ok(false) => ExitCode::SUCCESS,
                Ok(true) => ExitCode::FAILURE,
                Err(e) => {
                    if let Some(check_err) = e.downcast_ref::<CheckError>() {
                        let _ = write_failure(&mut io::stdout(), check_err);
                    } else if e.downcast_ref::<io::Error>().map(io::Error::kind)
                        != Some(io::ErrorKind::BrokenPipe)
                    {
                        let _ = writeln!(io::stdout(), "Error running system check: {:#}", e);
                    }
                    ExitCode::FAILURE
                }
            }
        }
        None => report(&config, args.format),
    }
}
