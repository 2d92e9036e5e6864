#![warn(missing_docs)]
//! # proctor-app binary
//!
//! Command-line entry point: prints version and effective configuration, and
//! replays recorded interview sessions.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use proctor_app::{
    AppError, ProctorConfig, ReplayScript, app_version, init_logging, project_runtime_status,
    run_replay,
};

#[derive(Parser)]
#[command(name = "proctor-app", about = "Proctored interview session controller")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the application version.
    Version,
    /// Print the configuration resolved from `PROCTOR_*` variables.
    Config,
    /// Replay a scripted session and print the outcome as JSON.
    Replay {
        /// Path to the replay script.
        script: PathBuf,
    },
}

/// CLI entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("proctor-app: {error}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), AppError> {
    if let Command::Version = cli.command {
        println!("proctor-app {}", app_version());
        return Ok(());
    }

    let config = ProctorConfig::from_env()?;
    init_logging(config.log_format, &config.log_level)?;

    match cli.command {
        Command::Version => {}
        Command::Config => {
            println!("version={}", app_version());
            println!("submit_base_url={}", config.submit_base_url);
            println!("violation_threshold={}", config.violation_threshold);
            println!("reentry_delay_ms={}", config.reentry_delay_ms);
            println!("log_format={:?}", config.log_format);
            println!("log_level={}", config.log_level);
            println!(
                "monitoring_enabled={} (PROCTOR_MONITORING_ENABLED)",
                config.monitoring_enabled
            );
        }
        Command::Replay { script } => {
            let script = ReplayScript::from_path(&script)?;
            let report = run_replay(&script, &config)?;
            let status = project_runtime_status(&report.view);
            tracing::info!(
                phase = %status.phase,
                camera = %status.camera,
                submission = %status.submission,
                timer = %status.timer,
                "replay status"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
