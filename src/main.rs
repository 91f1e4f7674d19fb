use rinkwatch::config::MonitorConfig;
use rinkwatch::module::schedule::{Monitor, MonitorOutcome, ReportOutcome};

use clap::{Parser, Subcommand};

/// Exit codes consumed by the external scheduler: 0 = no changes,
/// 1 = changes detected (or notification failure), 2 = unexpected failure.
const EXIT_NO_CHANGES: i32 = 0;
const EXIT_CHANGES: i32 = 1;
const EXIT_FAILURE: i32 = 2;

fn monitor_exit_code(outcome: &MonitorOutcome) -> i32 {
    match outcome {
        MonitorOutcome::NoChanges | MonitorOutcome::Bootstrap => EXIT_NO_CHANGES,
        MonitorOutcome::ChangesDetected { .. } => EXIT_CHANGES,
    }
}

/// A scrape or disk failure while preparing the report is an unexpected
/// failure; only a failed email hand-off maps to the notification code.
fn report_exit_code(result: &anyhow::Result<ReportOutcome>) -> i32 {
    match result {
        Ok(ReportOutcome::Sent) => EXIT_NO_CHANGES,
        Ok(ReportOutcome::NotifyFailed) => EXIT_CHANGES,
        Err(_) => EXIT_FAILURE,
    }
}

#[derive(Parser)]
#[command(name = "rinkwatch", about = "Monitors a venue's ice-time schedule for changes")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "rinkwatch.toml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run one change-detection cycle against the previous snapshot (default)
    Monitor,
    /// Email the weekly full-schedule report with the CSV attached
    Report,
}

#[tokio::main]
async fn main() {
    let code = run().await;
    std::process::exit(code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let config = match MonitorConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {}", cli.config, e);
            return EXIT_FAILURE;
        }
    };

    let _logging_guard = rinkwatch::logging::init_logging("logs", "rinkwatch", &config.log_level);

    tracing::info!("rinkwatch starting");
    tracing::info!(
        "Venue: '{}', monitoring next {} days, output dir: {}",
        config.venue_filter,
        config.monitor_days,
        config.output_dir
    );

    let monitor = match Monitor::new(config) {
        Ok(monitor) => monitor,
        Err(e) => {
            tracing::error!("Failed to initialize monitor: {:#}", e);
            return EXIT_FAILURE;
        }
    };

    match cli.command.unwrap_or(Command::Monitor) {
        Command::Monitor => match monitor.run_change_cycle().await {
            Ok(outcome) => {
                match &outcome {
                    MonitorOutcome::NoChanges => tracing::info!("Cycle complete: no changes"),
                    MonitorOutcome::Bootstrap => {
                        tracing::info!("Cycle complete: baseline established (first run)")
                    }
                    MonitorOutcome::ChangesDetected { report, notified } => tracing::info!(
                        "Cycle complete: {} (notification {})",
                        report.summary(),
                        if *notified { "sent" } else { "failed" }
                    ),
                }
                monitor_exit_code(&outcome)
            }
            Err(e) => {
                tracing::error!("Change-detection cycle failed: {:#}", e);
                EXIT_FAILURE
            }
        },
        Command::Report => {
            let result = monitor.run_weekly_report().await;
            if let Err(e) = &result {
                tracing::error!("Weekly report failed: {:#}", e);
            }
            report_exit_code(&result)
        }
    }
}
