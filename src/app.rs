use clap::Parser;
use std::fs;
use std::io::Write;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::domain::error::{AppError, Result};
use crate::infrastructure::config::AppConfig;
use crate::interfaces::cli::commands::{execute, CommandOutput};
use crate::interfaces::cli::Cli;

/// `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn emit(output: &CommandOutput) -> Result<()> {
    match &output.output_path {
        Some(path) => {
            fs::write(path, &output.body).map_err(|e| {
                AppError::IoError(format!("Failed to write report {}: {}", path.display(), e))
            })?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&output.body)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

pub fn run() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = AppConfig::load(cli.config.as_deref()).and_then(|config| {
        let output = execute(cli.command, &config)?;
        emit(&output)?;
        Ok(output.exit_code)
    });

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(2)
        }
    }
}
