// SPDX-License-Identifier: GPL-3.0-only

//! Orders and tracking numbers

use crate::constants::{ORDER_TIMESTAMP_FORMAT, archive};
use crate::errors::ArchiveError;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// A decoded barcode payload made safe for use as a file name stem
///
/// Every character outside `[A-Za-z0-9_-]` becomes `_`, so the value can
/// never escape the archive directory or hide itself behind a leading dot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Sanitize a raw payload
    pub fn parse(raw: &str) -> Result<Self, ArchiveError> {
        let trimmed = raw.trim();

        let sanitized: String = trimmed
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if sanitized.is_empty()
            || sanitized.chars().all(|c| c == '_')
            || sanitized.chars().count() > archive::MAX_TRACKING_NUMBER_LEN
        {
            return Err(ArchiveError::InvalidTrackingNumber(raw.to_string()));
        }

        Ok(Self(sanitized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `<root>/<tracking_number>.<extension>`
    pub fn file_in(&self, root: &Path, extension: &str) -> PathBuf {
        root.join(format!("{}.{}", self.0, extension))
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One scanned shipment
///
/// Serialized as the archive's metadata entry. Field order is part of the
/// on-disk format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub tracking_number: String,
    pub video_path: String,
    pub timestamp: String,
    pub location: String,
}

impl Order {
    /// Order for `tracking_number` with its recording expected under `root`
    pub fn new(
        tracking_number: &TrackingNumber,
        root: &Path,
        timestamp: NaiveDateTime,
        location: impl Into<String>,
    ) -> Self {
        let video_path = tracking_number.file_in(root, archive::MEDIA_EXTENSION);
        Self {
            tracking_number: tracking_number.to_string(),
            video_path: video_path.to_string_lossy().to_string(),
            timestamp: timestamp.format(ORDER_TIMESTAMP_FORMAT).to_string(),
            location: location.into(),
        }
    }

    /// Order stamped with the current local time
    pub fn capture(
        tracking_number: &TrackingNumber,
        root: &Path,
        location: impl Into<String>,
    ) -> Self {
        Self::new(tracking_number, root, Local::now().naive_local(), location)
    }

    /// Expected location of the recording
    pub fn video_path(&self) -> PathBuf {
        PathBuf::from(&self.video_path)
    }

    /// Metadata JSON with four-space indentation
    pub fn to_metadata_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(archive::METADATA_INDENT);
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut serializer)?;
        Ok(out)
    }
}
