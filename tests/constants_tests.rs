// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for constants module

use parcel_camera::constants::{UNKNOWN_LOCATION, archive, file_formats, timing};
use std::time::Duration;

#[test]
fn test_tick_interval_matches_rate() {
    assert_eq!(timing::tick_interval(30), Duration::from_secs(1) / 30);
    assert_eq!(timing::tick_interval(1), Duration::from_secs(1));
}

#[test]
fn test_tick_interval_never_divides_by_zero() {
    assert_eq!(timing::tick_interval(0), Duration::from_secs(1));
}

#[test]
fn test_read_failure_budget_is_about_one_second() {
    let budget = timing::tick_interval(timing::DEFAULT_TICK_RATE) * timing::DEFAULT_MAX_READ_FAILURES;
    assert!(budget <= Duration::from_millis(1100));
    assert!(budget >= Duration::from_millis(900));
}

#[test]
fn test_archive_extensions() {
    assert_eq!(archive::MEDIA_EXTENSION, "mp4");
    assert_eq!(archive::METADATA_EXTENSION, "json");
    assert_eq!(archive::ARCHIVE_EXTENSION, "zip");
}

#[test]
fn test_image_extensions_case_insensitive() {
    assert!(file_formats::is_image_extension("PNG"));
    assert!(file_formats::is_image_extension("jpeg"));
    assert!(!file_formats::is_image_extension("mp4"));
}

#[test]
fn test_unknown_location_label() {
    assert_eq!(UNKNOWN_LOCATION, "unknown");
}
