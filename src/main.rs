// cartflow - E-Commerce Funnel Analytics
//
// Ingests raw clickstream events, sessionizes them on inactivity gaps,
// derives the view -> addtocart -> transaction funnel per session, and
// exposes the resulting CSV artifacts through a CLI and a local HTTP API.
//
// Architecture:
// - Loader: CSV event export -> typed relation
// - Sessionizer / funnel builder: in-memory relational transforms
// - Artifact store: atomic CSV persistence
// - Reports: independent aggregations over the persisted step table
// - API server (axum): pipeline/report triggers + artifact metadata

use anyhow::Result;
use cartflow::cli::{Cli, Command};
use cartflow::config::{Config, LogRotation};
use cartflow::pipeline;
use cartflow::reports::ReportKind;
use cartflow::server;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config management runs before logging init so its output stays clean
    if let Command::Config { show, reset, path } = &cli.command {
        cartflow::cli::handle_config(*show, *reset, *path);
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let mut config = Config::from_env();

    // Initialize tracing/logging
    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("cartflow={}", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    // Set up file logging if enabled (non-blocking writer with rotation)
    // The guard must be kept alive for the duration of the program to ensure logs flush
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard> =
        if config.logging.file_enabled {
            match std::fs::create_dir_all(&config.logging.file_dir) {
                Ok(()) => {
                    let file_appender = match config.logging.file_rotation {
                        LogRotation::Hourly => tracing_appender::rolling::hourly(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Daily => tracing_appender::rolling::daily(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                        LogRotation::Never => tracing_appender::rolling::never(
                            &config.logging.file_dir,
                            &config.logging.file_prefix,
                        ),
                    };
                    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(tracing_subscriber::fmt::layer())
                        .with(
                            tracing_subscriber::fmt::layer()
                                .with_writer(non_blocking)
                                .with_ansi(false),
                        )
                        .init();
                    Some(guard)
                }
                Err(e) => {
                    eprintln!(
                        "Warning: Could not create log directory {:?}: {}",
                        config.logging.file_dir, e
                    );
                    // Fall back to stdout-only logging
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(tracing_subscriber::fmt::layer())
                        .init();
                    None
                }
            }
        } else {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
            None
        };

    match cli.command {
        Command::Pipeline { input } => {
            let input = input.unwrap_or_else(|| config.events_path());
            let summary =
                tokio::task::spawn_blocking(move || pipeline::run_pipeline(&config, &input))
                    .await??;

            println!("Pipeline complete");
            println!("  Events loaded: {}", summary.events_count);
            println!("  Funnel steps: {}", summary.steps_count);
            println!("  Sessions created: {}", summary.session_count);
            if let Some(rate) = summary.view_to_cart_rate {
                println!("  View-to-cart rate: {rate:.2}%");
            }
            if let Some(rate) = summary.cart_to_purchase_rate {
                println!("  Cart-to-purchase rate: {rate:.2}%");
            }
        }

        Command::Report { name } => {
            let kinds: Vec<ReportKind> = match name {
                Some(name) => match ReportKind::from_name(&name) {
                    Some(kind) => vec![kind],
                    None => anyhow::bail!(
                        "unknown report {name:?} (expected sku-dropoff or cohort-retention)"
                    ),
                },
                None => ReportKind::ALL.to_vec(),
            };

            // Reports are independent: run all requested, then fail if any did
            let mut failed = false;
            for kind in kinds {
                let report_config = config.clone();
                let outcome =
                    tokio::task::spawn_blocking(move || pipeline::run_report(&report_config, kind))
                        .await?;
                match outcome {
                    Ok(outcome) => {
                        println!("Exported {} rows to {}", outcome.rows, kind.artifact());
                    }
                    Err(e) => {
                        failed = true;
                        eprintln!("Report {} failed: {}", kind.name(), e);
                    }
                }
            }
            if failed {
                std::process::exit(1);
            }
        }

        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.bind_addr = bind;
            }
            server::serve(config).await?;
        }

        // Handled before logging init
        Command::Config { .. } => {}
    }

    Ok(())
}
