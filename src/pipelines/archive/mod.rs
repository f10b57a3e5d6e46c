// SPDX-License-Identifier: GPL-3.0-only

//! Order archive pipeline
//!
//! Packages one order's metadata and its recording into a single bundle:
//!
//! ```text
//! Decoded payload → Order → <tn>.json ─┐
//!                                      ├→ .<tn>.<id>.zip.part → <tn>.zip
//!              <tn>.mp4 (pre-existing) ┘
//! ```
//!
//! The bundle is all-or-nothing: if anything fails, neither a `.zip` nor the
//! transient `.json` is left behind.

mod bundle;
pub mod order;

pub use order::{Order, TrackingNumber};

use crate::config::{Config, DuplicatePolicy, MediaRetention};
use crate::constants::timing::DEFAULT_ARCHIVE_TIMEOUT_SECS;
use crate::errors::ArchiveError;
use bundle::{BundleJob, PublishState};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Archive policies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub duplicate_policy: DuplicatePolicy,
    pub media_retention: MediaRetention,
    /// Longest time a single build may take before it counts as failed
    pub timeout: Duration,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            duplicate_policy: DuplicatePolicy::default(),
            media_retention: MediaRetention::default(),
            timeout: Duration::from_secs(DEFAULT_ARCHIVE_TIMEOUT_SECS),
        }
    }
}

impl ArchiveOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            duplicate_policy: config.duplicate_policy,
            media_retention: config.media_retention,
            timeout: config.archive_timeout(),
        }
    }
}

/// Outcome of a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReceipt {
    pub tracking_number: String,
    /// Final `<tracking_number>.zip`
    pub archive_path: PathBuf,
    /// An older archive with the same tracking number was replaced
    pub replaced_existing: bool,
    /// The original recording was deleted after archiving
    pub media_removed: bool,
}

/// Assembles order archives inside one directory
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    root: PathBuf,
    options: ArchiveOptions,
    #[cfg(test)]
    publish_delay: Duration,
}

impl ArchiveBuilder {
    pub fn new(root: impl Into<PathBuf>, options: ArchiveOptions) -> Self {
        Self {
            root: root.into(),
            options,
            #[cfg(test)]
            publish_delay: Duration::ZERO,
        }
    }

    /// Hold every writer back for `delay` before it publishes
    #[cfg(test)]
    fn with_publish_delay(mut self, delay: Duration) -> Self {
        self.publish_delay = delay;
        self
    }

    /// Directory holding recordings and archives
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Build the order for a freshly decoded payload, stamped now
    pub fn order_for(&self, payload: &str, location: &str) -> Result<Order, ArchiveError> {
        let tracking_number = TrackingNumber::parse(payload)?;
        if tracking_number.as_str() != payload {
            debug!(raw = %payload, sanitized = %tracking_number, "Sanitized tracking number");
        }
        Ok(Order::capture(&tracking_number, &self.root, location))
    }

    /// Write `<tracking_number>.zip` for the order
    ///
    /// Blocks until the write completes or the configured timeout expires.
    /// On timeout the write is abandoned and nothing is published.
    pub fn build(&self, order: &Order) -> Result<ArchiveReceipt, ArchiveError> {
        let publish = Arc::new(Mutex::new(PublishState::Pending));
        let job = BundleJob {
            root: self.root.clone(),
            order: order.clone(),
            options: self.options,
            publish: Arc::clone(&publish),
            #[cfg(test)]
            publish_delay: self.publish_delay,
        };

        let (sender, receiver) = mpsc::channel();
        std::thread::Builder::new()
            .name("archive-writer".to_string())
            .spawn(move || {
                let _ = sender.send(job.run());
            })
            .map_err(|e| ArchiveError::WriteFailed(format!("cannot start archive writer: {}", e)))?;

        match receiver.recv_timeout(self.options.timeout) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                let mut state = publish.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if *state == PublishState::Published {
                    // Already renamed into place; only cleanup remains
                    drop(state);
                    return receiver.recv().unwrap_or_else(|_| {
                        Err(ArchiveError::WriteFailed("archive writer vanished".to_string()))
                    });
                }
                *state = PublishState::Abandoned;

                warn!(
                    tracking_number = %order.tracking_number,
                    timeout_secs = self.options.timeout.as_secs_f32(),
                    "Archive write timed out"
                );
                Err(ArchiveError::WriteFailed(format!(
                    "timed out after {:.1}s",
                    self.options.timeout.as_secs_f32()
                )))
            }
            Err(RecvTimeoutError::Disconnected) => {
                error!(tracking_number = %order.tracking_number, "Archive writer panicked");
                Err(ArchiveError::WriteFailed("archive writer panicked".to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Instant;

    fn recording(dir: &Path, tracking_number: &str) {
        std::fs::write(dir.join(format!("{}.mp4", tracking_number)), b"recording").unwrap();
    }

    fn order(dir: &Path, tracking_number: &str) -> Order {
        let tn = TrackingNumber::parse(tracking_number).unwrap();
        let timestamp = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap();
        Order::new(&tn, dir, timestamp, "unknown")
    }

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    /// Wait for an abandoned writer to finish its cleanup
    fn settle(dir: &Path, expected: &[&str]) -> Vec<String> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let names = file_names(dir);
            if names == expected || Instant::now() > deadline {
                return names;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_timed_out_build_publishes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        recording(dir.path(), "SP3");

        let options = ArchiveOptions {
            timeout: Duration::from_millis(50),
            ..ArchiveOptions::default()
        };
        let builder = ArchiveBuilder::new(dir.path(), options)
            .with_publish_delay(Duration::from_millis(500));

        let result = builder.build(&order(dir.path(), "SP3"));
        assert!(
            matches!(&result, Err(ArchiveError::WriteFailed(msg)) if msg.starts_with("timed out")),
            "got {:?}",
            result
        );

        // The writer wakes up abandoned and removes its json and partial zip
        assert_eq!(settle(dir.path(), &["SP3.mp4"]), vec!["SP3.mp4"]);
    }

    #[test]
    fn test_slow_build_within_timeout_is_published() {
        let dir = tempfile::tempdir().unwrap();
        recording(dir.path(), "SP4");

        let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default())
            .with_publish_delay(Duration::from_millis(100));

        let receipt = builder.build(&order(dir.path(), "SP4")).unwrap();
        assert!(receipt.archive_path.is_file());
        assert_eq!(file_names(dir.path()), vec!["SP4.mp4", "SP4.zip"]);
    }
}
