// CLI module - command-line argument parsing and handlers
//
// Subcommands:
// - pipeline: run the ETL pipeline and print the summary
// - report:   run one or both reporting queries
// - serve:    start the HTTP API server
// - config:   configuration management (--show/--reset/--path)

use crate::config::{Config, VERSION};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cartflow - e-commerce funnel analytics
#[derive(Parser)]
#[command(name = "cartflow")]
#[command(version = VERSION)]
#[command(
    about = "Clickstream sessionization and purchase-funnel analytics",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the ETL pipeline (load, sessionize, funnel, export)
    Pipeline {
        /// Path to the raw event export (default: <data_dir>/<events_file>)
        #[arg(long)]
        input: Option<PathBuf>,
    },

    /// Run reporting queries over the persisted artifacts
    Report {
        /// Report to run: sku-dropoff or cohort-retention (default: all)
        name: Option<String>,
    },

    /// Start the HTTP API server
    Serve {
        /// Bind address (overrides config)
        #[arg(long)]
        bind: Option<std::net::SocketAddr>,
    },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

/// Handle the config subcommand
pub fn handle_config(show: bool, reset: bool, path: bool) {
    if path {
        handle_config_path();
    } else if show {
        handle_config_show();
    } else if reset {
        handle_config_reset();
    } else {
        // No flag provided, show help
        println!("Usage: cartflow config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();
    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error: Could not create {}: {}", parent.display(), e);
            std::process::exit(1);
        }
    }
    match std::fs::write(&path, Config::default().to_toml()) {
        Ok(()) => println!("Config reset to defaults at {}", path.display()),
        Err(e) => {
            eprintln!("Error: Could not write {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
