// SPDX-License-Identifier: GPL-3.0-only

//! qrsnap - terminal QR code scanner
//!
//! Streams a camera feed into the terminal, detects QR codes on every
//! frame, and captures a still photo when the user confirms a detection.

use clap::{Parser, Subcommand};
use qrsnap::{cli, config::Config, terminal};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qrsnap")]
#[command(about = "Terminal QR code scanner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for QR codes (default)
    Scan {
        /// Camera device path (e.g. /dev/video0)
        #[arg(short, long)]
        device: Option<String>,
    },
    /// List available cameras
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging; defaults to warnings only, override with RUST_LOG
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::List) => {
            cli::list_cameras();
            Ok(())
        }
        Some(Commands::Scan { device }) => {
            let mut config = Config::load();
            if device.is_some() {
                config.device_path = device;
            }
            terminal::run(config)
        }
        None => terminal::run(Config::load()),
    }
}
