// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use parcel_camera::app::{self, SourceSelection};
use parcel_camera::config::Config;
use parcel_camera::constants::app_info;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "parcel-camera")]
#[command(about = "Barcode-triggered shipment recording station")]
#[command(version = app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/parcel-camera/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding recordings and archives
    #[arg(long, global = true)]
    archive_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the scanning station (default)
    Scan {
        /// Camera index to use (from 'parcel-camera list')
        #[arg(short, long)]
        camera: Option<usize>,

        /// Replay image files from a directory instead of a camera
        #[arg(long, value_name = "DIR", conflicts_with = "camera")]
        replay: Option<PathBuf>,

        /// Log events instead of drawing the terminal preview
        #[arg(long)]
        headless: bool,

        /// Exit after the first archived order (headless only)
        #[arg(long, requires = "headless")]
        once: bool,
    },

    /// List available cameras
    List,

    /// List finished orders
    Orders {
        /// Open the archive directory in the file manager
        #[arg(long)]
        open: bool,
    },

    /// Archive an order whose recording is already on disk
    Archive {
        /// Tracking number (the recording must be <TN>.mp4)
        tracking_number: String,
    },

    /// Show the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=parcel_camera=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(&config_path)?;
    if let Some(dir) = cli.archive_dir {
        config.archive_dir = Some(dir);
    }

    match cli.command {
        Some(Commands::Scan {
            camera,
            replay,
            headless,
            once,
        }) => {
            if let Some(index) = camera {
                config.camera_index = index;
            }
            let selection = match replay {
                Some(dir) => SourceSelection::Replay(dir),
                None => SourceSelection::Camera(config.camera_index),
            };
            run_station(&config, &selection, headless, once)
        }
        Some(Commands::List) => cli::list_cameras(),
        Some(Commands::Orders { open }) => cli::list_orders(&config, open),
        Some(Commands::Archive { tracking_number }) => cli::archive_order(&config, &tracking_number),
        Some(Commands::Config) => cli::show_config(&config, &config_path),
        None => run_station(
            &config,
            &SourceSelection::Camera(config.camera_index),
            false,
            false,
        ),
    }
}

fn run_station(
    config: &Config,
    selection: &SourceSelection,
    headless: bool,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = app::spawn_station(config, selection)?;
    if headless {
        cli::run_headless(controller, once)
    } else {
        parcel_camera::terminal::run(controller)
    }
}
