// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for configuration module

use parcel_camera::Config;
use parcel_camera::config::{DuplicatePolicy, FrameOrientation, MediaRetention};
use parcel_camera::pipelines::archive::ArchiveOptions;
use std::path::PathBuf;
use std::time::Duration;

#[test]
fn test_config_default() {
    let config = Config::default();

    // Check sensible defaults
    assert_eq!(config.orientation, FrameOrientation::FlipVertical);
    assert_eq!(config.duplicate_policy, DuplicatePolicy::Overwrite);
    assert_eq!(config.media_retention, MediaRetention::Keep);
    assert_eq!(config.tick_rate, 30);
    assert!(!config.mirror_preview, "Preview mirroring should be off by default");
    assert!(config.archive_dir.is_none());
    assert!(config.location_label.is_none());
}

#[test]
fn test_config_save_and_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let config = Config {
        archive_dir: Some(PathBuf::from("/srv/parcels")),
        camera_index: 1,
        location_label: Some("Dock 3".to_string()),
        media_retention: MediaRetention::Delete,
        ..Config::default()
    };
    config.save(&path).unwrap();

    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn test_archive_options_follow_config() {
    let config = Config {
        duplicate_policy: DuplicatePolicy::Reject,
        archive_timeout_secs: 5,
        ..Config::default()
    };
    let options = ArchiveOptions::from_config(&config);

    assert_eq!(options.duplicate_policy, DuplicatePolicy::Reject);
    assert_eq!(options.media_retention, MediaRetention::Keep);
    assert_eq!(options.timeout, Duration::from_secs(5));
}

#[test]
fn test_zero_timeout_is_clamped() {
    let config = Config {
        archive_timeout_secs: 0,
        ..Config::default()
    };
    assert_eq!(config.archive_timeout(), Duration::from_secs(1));
}

#[test]
fn test_default_path_is_app_specific() {
    let path = Config::default_path();
    assert!(path.ends_with("parcel-camera/config.json"));
}
