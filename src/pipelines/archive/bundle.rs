// SPDX-License-Identifier: GPL-3.0-only

//! Archive bundle writer
//!
//! Runs on the archive writer thread. The bundle is written to a hidden
//! temporary file and renamed into place, so a reader never sees a partial
//! `<tracking_number>.zip`.

use super::order::{Order, TrackingNumber};
use super::{ArchiveOptions, ArchiveReceipt};
use crate::config::{DuplicatePolicy, MediaRetention};
use crate::constants::archive;
use crate::errors::ArchiveError;
use chrono::{Datelike, Local, Timelike};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Handshake between the writer and the thread waiting for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum PublishState {
    /// Still writing; the result may yet be published
    Pending,
    /// The archive has been renamed into place
    Published,
    /// The caller gave up waiting; the writer must not publish
    Abandoned,
}

/// One archive write, moved onto the writer thread
pub(super) struct BundleJob {
    pub root: PathBuf,
    pub order: Order,
    pub options: ArchiveOptions,
    pub publish: Arc<Mutex<PublishState>>,
    /// Pause between writing the temporary zip and publishing it
    #[cfg(test)]
    pub publish_delay: std::time::Duration,
}

impl BundleJob {
    pub fn run(self) -> Result<ArchiveReceipt, ArchiveError> {
        let tracking_number = TrackingNumber::parse(&self.order.tracking_number)?;
        if tracking_number.as_str() != self.order.tracking_number {
            return Err(ArchiveError::InvalidTrackingNumber(
                self.order.tracking_number.clone(),
            ));
        }

        fs::create_dir_all(&self.root).map_err(|e| {
            ArchiveError::WriteFailed(format!("cannot create {}: {}", self.root.display(), e))
        })?;

        let archive_path = tracking_number.file_in(&self.root, archive::ARCHIVE_EXTENSION);
        let replaced_existing = archive_path.exists();
        if replaced_existing {
            match self.options.duplicate_policy {
                DuplicatePolicy::Reject => {
                    warn!(tracking_number = %tracking_number, "Archive already exists, rejecting");
                    return Err(ArchiveError::DuplicateTrackingNumber(
                        tracking_number.to_string(),
                    ));
                }
                DuplicatePolicy::Overwrite => {
                    warn!(
                        tracking_number = %tracking_number,
                        path = %archive_path.display(),
                        "Archive already exists and will be replaced"
                    );
                }
            }
        }

        let media_path = self.order.video_path();
        if !media_path.is_file() {
            warn!(path = %media_path.display(), "Recording missing, no archive written");
            return Err(ArchiveError::MissingMedia(media_path));
        }

        let metadata_path = tracking_number.file_in(&self.root, archive::METADATA_EXTENSION);
        let temp_path = self.root.join(format!(
            ".{}.{}.{}.{}",
            tracking_number,
            uuid::Uuid::new_v4().simple(),
            archive::ARCHIVE_EXTENSION,
            archive::PARTIAL_SUFFIX
        ));

        let written = self.write_and_publish(&metadata_path, &media_path, &temp_path, &archive_path);

        // The metadata file is transient whatever the outcome
        remove_if_present(&metadata_path);

        if let Err(e) = written {
            remove_if_present(&temp_path);
            return Err(e);
        }

        info!(
            tracking_number = %tracking_number,
            path = %archive_path.display(),
            replaced_existing,
            "Archive written"
        );

        let media_removed = match self.options.media_retention {
            MediaRetention::Keep => false,
            MediaRetention::Delete => match fs::remove_file(&media_path) {
                Ok(()) => {
                    debug!(path = %media_path.display(), "Removed archived recording");
                    true
                }
                Err(e) => {
                    warn!(path = %media_path.display(), error = %e, "Failed to remove archived recording");
                    false
                }
            },
        };

        Ok(ArchiveReceipt {
            tracking_number: tracking_number.to_string(),
            archive_path,
            replaced_existing,
            media_removed,
        })
    }

    fn write_and_publish(
        &self,
        metadata_path: &Path,
        media_path: &Path,
        temp_path: &Path,
        archive_path: &Path,
    ) -> Result<(), ArchiveError> {
        let metadata = self.order.to_metadata_json()?;
        fs::write(metadata_path, &metadata)?;
        debug!(path = %metadata_path.display(), "Wrote order metadata");

        write_zip(temp_path, metadata_path, &metadata, media_path)?;

        #[cfg(test)]
        std::thread::sleep(self.publish_delay);

        let mut state = self
            .publish
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if *state == PublishState::Abandoned {
            return Err(ArchiveError::WriteFailed(
                "archive write abandoned after timeout".to_string(),
            ));
        }
        fs::rename(temp_path, archive_path)?;
        *state = PublishState::Published;

        Ok(())
    }
}

/// Write `metadata` and the media file as flat entries of a new zip at `path`
fn write_zip(
    path: &Path,
    metadata_path: &Path,
    metadata: &[u8],
    media_path: &Path,
) -> Result<(), ArchiveError> {
    let metadata_name = entry_name(metadata_path)?;
    let media_name = entry_name(media_path)?;

    let mut media = File::open(media_path)?;
    let media_len = media.metadata()?.len();

    let mut zip = ZipWriter::new(File::create(path)?);
    let options = entry_options();

    zip.start_file(metadata_name, options.compression_method(CompressionMethod::Deflated))?;
    zip.write_all(metadata)?;

    // Recordings are already compressed
    zip.start_file(
        media_name,
        options
            .compression_method(CompressionMethod::Stored)
            .large_file(media_len > u32::MAX as u64),
    )?;
    std::io::copy(&mut media, &mut zip)?;

    let file = zip.finish()?;
    file.sync_all()?;
    Ok(())
}

fn entry_options() -> SimpleFileOptions {
    let now = Local::now();
    let options = SimpleFileOptions::default();
    match zip::DateTime::from_date_and_time(
        now.year().clamp(1980, 2107) as u16,
        now.month() as u8,
        now.day() as u8,
        now.hour() as u8,
        now.minute() as u8,
        now.second().min(59) as u8,
    ) {
        Ok(stamp) => options.last_modified_time(stamp),
        Err(_) => options,
    }
}

fn entry_name(path: &Path) -> Result<String, ArchiveError> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| ArchiveError::WriteFailed(format!("{} has no file name", path.display())))
}

fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed transient file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove transient file"),
    }
}
