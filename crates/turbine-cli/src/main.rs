//! turbine-monitor - simulated wind-turbine condition monitor
//!
//! Starts the monitoring pipeline, runs it until the requested duration
//! elapses or Ctrl-C arrives, then stops every task and prints the final
//! snapshot.

#![deny(static_mut_refs)]
#![deny(unused_must_use)]
#![deny(clippy::unwrap_used)]

mod config;
mod error;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turbine_pipeline::{MonitorConfig, MonitorRuntime};

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "turbine-monitor")]
#[command(about = "Simulated wind-turbine monitor with a real-time task pipeline")]
#[command(version)]
#[command(long_about = "
turbine-monitor runs a simulated wind-turbine monitoring pipeline: an interrupt
relay feeding five prioritised tasks (safety, sensor, anomaly, network,
dashboard) over bounded channels and lock-protected shared state.

The run ends after --duration seconds or on Ctrl-C. The final snapshot of the
shared state is printed on exit; use --json for machine-readable output.
")]
struct Cli {
    /// JSON configuration file; omitted sections keep their defaults
    #[arg(short, long, env = "TURBINE_MONITOR_CONFIG")]
    config: Option<PathBuf>,

    /// Stop after this many seconds instead of waiting for Ctrl-C
    #[arg(short, long)]
    duration: Option<u64>,

    /// Seed for every random source, overriding the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Print the final snapshot as JSON
    #[arg(long, help = "Output in JSON format for machine parsing")]
    json: bool,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter(cli.verbose).into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.json {
                output::print_error_json(&e);
            } else {
                output::print_error_human(&e);
            }
            ExitCode::from(error::exit_code(&e))
        }
    }
}

fn load_config(cli: &Cli) -> Result<MonitorConfig> {
    let config = match &cli.config {
        Some(path) => config::read_file(path)?,
        None => MonitorConfig::default(),
    };
    config::with_overrides(config, cli.seed).context("invalid configuration")
}

async fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    let duration = match cli.duration {
        Some(0) => return Err(CliError::ZeroDuration.into()),
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };

    let runtime = tokio::task::spawn_blocking(move || MonitorRuntime::start(config))
        .await
        .context("start-up task failed")?
        .context("failed to start the monitor")?;
    info!(seed = runtime.seed(), "monitor running");

    wait_for_stop(duration).await?;

    let snapshot = tokio::task::spawn_blocking(move || runtime.shutdown())
        .await
        .context("shutdown task failed")?
        .context("monitor did not stop cleanly")?;

    if cli.json {
        output::print_snapshot_json(&snapshot)?;
    } else {
        output::print_snapshot_human(&snapshot);
    }
    Ok(())
}

async fn wait_for_stop(duration: Option<Duration>) -> Result<()> {
    match duration {
        Some(duration) => {
            tokio::select! {
                () = tokio::time::sleep(duration) => info!("run duration elapsed"),
                signal = tokio::signal::ctrl_c() => {
                    signal.context("failed to listen for Ctrl-C")?;
                    info!("interrupted");
                }
            }
        }
        None => {
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            info!("interrupted");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    #[test]
    fn parse_defaults() -> TestResult {
        let cli = Cli::try_parse_from(["turbine-monitor"])?;
        assert!(cli.config.is_none());
        assert!(cli.duration.is_none());
        assert!(cli.seed.is_none());
        assert!(!cli.json);
        assert_eq!(cli.verbose, 0);
        Ok(())
    }

    #[test]
    fn parse_run_flags() -> TestResult {
        let cli = Cli::try_parse_from([
            "turbine-monitor",
            "--config",
            "turbine.json",
            "--duration",
            "30",
            "--seed",
            "42",
            "--json",
            "-vv",
        ])?;
        assert_eq!(cli.config, Some(PathBuf::from("turbine.json")));
        assert_eq!(cli.duration, Some(30));
        assert_eq!(cli.seed, Some(42));
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        Ok(())
    }

    #[test]
    fn parse_rejects_negative_duration() {
        assert!(Cli::try_parse_from(["turbine-monitor", "--duration", "-1"]).is_err());
    }

    #[test]
    fn log_filter_levels() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(1), "info");
        assert_eq!(log_filter(2), "debug");
        assert_eq!(log_filter(9), "trace");
    }

    #[test]
    fn seed_flag_reaches_config() -> TestResult {
        let cli = Cli::try_parse_from(["turbine-monitor", "--seed", "5"])?;
        let config = load_config(&cli)?;
        assert_eq!(config.simulation.seed, Some(5));
        Ok(())
    }
}
