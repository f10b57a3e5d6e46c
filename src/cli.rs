// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the scanning station
//!
//! This module provides command-line functionality for:
//! - Listing available cameras
//! - Listing and opening finished orders
//! - Re-running the archive step for a tracking number
//! - Headless scanning
//! - Showing the effective configuration

use parcel_camera::app::{SessionController, SessionEvent};
use parcel_camera::backends::camera::enumerate_cameras;
use parcel_camera::config::Config;
use parcel_camera::errors::AppError;
use parcel_camera::location::{FixedLocation, LocationProvider};
use parcel_camera::pipelines::archive::{ArchiveBuilder, ArchiveOptions, ArchiveReceipt};
use parcel_camera::storage;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;

/// How long the headless loop waits for an event before checking Ctrl+C
const HEADLESS_POLL: Duration = Duration::from_millis(200);

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras();

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for camera in &cameras {
        println!("  [{}] {}", camera.index, camera.name);
        println!("      Device: {}", camera.path);
    }

    Ok(())
}

/// List finished orders, optionally opening the directory afterwards
pub fn list_orders(config: &Config, open: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = storage::archive_directory(config);
    let orders = storage::list_orders(&dir)?;

    if orders.is_empty() {
        println!("No orders in {}", dir.display());
    } else {
        println!("Orders in {}:", dir.display());
        println!();
        for order in &orders {
            let modified = order
                .modified
                .map(|time| {
                    chrono::DateTime::<chrono::Local>::from(time)
                        .format("%Y-%m-%d %H:%M")
                        .to_string()
                })
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:<24} {:>10}  {}",
                order.tracking_number,
                format_size(order.size_bytes),
                modified
            );
        }
    }

    if open {
        storage::open_orders_directory(&dir)?;
    }

    Ok(())
}

/// Build the archive for a tracking number whose recording is already on disk
pub fn archive_order(config: &Config, tracking_number: &str) -> Result<(), Box<dyn std::error::Error>> {
    let dir = storage::archive_directory(config);
    let builder = ArchiveBuilder::new(&dir, ArchiveOptions::from_config(config));
    let location = FixedLocation::new(config.location_label.clone()).label_or_unknown();

    let order = builder.order_for(tracking_number, &location)?;
    info!(tracking_number = %order.tracking_number, "Archiving order from the command line");
    let receipt = builder.build(&order)?;

    print_receipt(&receipt);

    Ok(())
}

/// Operator-facing report of a finished archive
fn receipt_lines(receipt: &ArchiveReceipt) -> Vec<String> {
    let mut lines = vec![format!("Archive saved to: {}", receipt.archive_path.display())];
    if receipt.replaced_existing {
        lines.push("  (replaced an existing archive)".to_string());
    }
    if receipt.media_removed {
        lines.push("  (recording removed)".to_string());
    }
    lines
}

fn print_receipt(receipt: &ArchiveReceipt) {
    for line in receipt_lines(receipt) {
        println!("{}", line);
    }
}

/// Print the effective configuration and where it is stored
pub fn show_config(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Config file: {}", path.display());
    println!("Archive directory: {}", storage::archive_directory(config).display());
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

/// Scan without a terminal UI, logging events until Ctrl+C
///
/// After each detection a new scan is started, unless `once` is set.
pub fn run_headless(
    mut controller: SessionController,
    once: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let stop_flag = Arc::new(AtomicBool::new(false));
    let stop_flag_clone = Arc::clone(&stop_flag);
    ctrlc::set_handler(move || {
        stop_flag_clone.store(true, Ordering::SeqCst);
    })?;

    println!("Scanning... Press Ctrl+C to stop.");
    controller.start_scanning();

    let mut failure = None;

    while !stop_flag.load(Ordering::SeqCst) {
        let Some(event) = controller.recv_event_timeout(HEADLESS_POLL) else {
            continue;
        };

        // The archive outcome is reported after the session is back to Idle
        let finished = match event {
            SessionEvent::Preview(_) | SessionEvent::ConfirmStopRequested => false,
            SessionEvent::StateChanged { from, to } => {
                info!(%from, %to, "Session state changed");
                false
            }
            SessionEvent::Detected { tracking_number } => {
                println!("Detected: {}", tracking_number);
                false
            }
            SessionEvent::Archived(receipt) => {
                print_receipt(&receipt);
                true
            }
            SessionEvent::Notice(AppError::Archive(e)) => {
                eprintln!("Archive failed: {}", e);
                true
            }
            SessionEvent::Notice(e) => {
                eprintln!("Error: {}", e);
                failure = Some(e);
                break;
            }
            SessionEvent::ShutDown => break,
        };

        if finished {
            if once {
                break;
            }
            controller.start_scanning();
        }
    }

    if stop_flag.load(Ordering::SeqCst) {
        println!();
        println!("Stopping...");
    }
    controller.shutdown();

    match failure {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

fn format_size(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let bytes = bytes as f64;
    if bytes >= GIB {
        format!("{:.1} GiB", bytes / GIB)
    } else if bytes >= MIB {
        format!("{:.1} MiB", bytes / MIB)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes / KIB)
    } else {
        format!("{} B", bytes)
    }
}
