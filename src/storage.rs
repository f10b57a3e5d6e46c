// SPDX-License-Identifier: GPL-3.0-only

//! Storage utilities for the archive directory

use crate::config::Config;
use crate::constants::archive;
use crate::errors::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, info};

/// A finished order archive on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// File stem of the archive
    pub tracking_number: String,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
}

/// Directory holding recordings and archives
///
/// Uses the configured directory, else the user's videos directory
/// (`~/Videos` when the platform does not define one).
pub fn archive_directory(config: &Config) -> PathBuf {
    if let Some(dir) = &config.archive_dir {
        return dir.clone();
    }

    dirs::video_dir().unwrap_or_else(|| {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join("Videos")
    })
}

/// List finished archives, newest first
///
/// In-progress bundles are hidden files and are skipped. A missing
/// directory simply has no orders yet.
pub fn list_orders(dir: &Path) -> AppResult<Vec<OrderEntry>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(AppError::Storage(format!(
                "cannot read {}: {}",
                dir.display(),
                e
            )));
        }
    };

    let mut orders: Vec<OrderEntry> = entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_str()?;
            if name.starts_with('.') {
                return None;
            }
            let ext = path.extension()?.to_str()?;
            if !ext.eq_ignore_ascii_case(archive::ARCHIVE_EXTENSION) {
                return None;
            }

            let metadata = entry.metadata().ok()?;
            if !metadata.is_file() {
                return None;
            }

            Some(OrderEntry {
                tracking_number: path.file_stem()?.to_string_lossy().to_string(),
                size_bytes: metadata.len(),
                modified: metadata.modified().ok(),
                path,
            })
        })
        .collect();

    // Sort by modification time (newest first), then by name
    orders.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.tracking_number.cmp(&b.tracking_number))
    });

    debug!(dir = %dir.display(), count = orders.len(), "Listed orders");
    Ok(orders)
}

/// Open the archive directory in the desktop file manager
pub fn open_orders_directory(dir: &Path) -> AppResult<()> {
    std::fs::create_dir_all(dir)?;
    open::that_detached(dir)
        .map_err(|e| AppError::Storage(format!("cannot open {}: {}", dir.display(), e)))?;
    info!(dir = %dir.display(), "Opened orders directory");
    Ok(())
}
