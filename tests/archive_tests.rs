// SPDX-License-Identifier: GPL-3.0-only

//! Integration tests for the order archive pipeline

mod common;

use chrono::NaiveDate;
use common::{file_names, write_recording};
use parcel_camera::config::{DuplicatePolicy, MediaRetention};
use parcel_camera::errors::ArchiveError;
use parcel_camera::pipelines::archive::{ArchiveBuilder, ArchiveOptions, Order, TrackingNumber};
use std::io::Read;
use std::path::Path;

fn read_entry(archive_path: &Path, name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(std::fs::File::open(archive_path).unwrap()).unwrap();
    let mut entry = archive.by_name(name).unwrap();
    let mut bytes = Vec::new();
    entry.read_to_end(&mut bytes).unwrap();
    bytes
}

fn fixed_order(root: &Path, tracking_number: &str) -> Order {
    let tn = TrackingNumber::parse(tracking_number).unwrap();
    let timestamp = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap();
    Order::new(&tn, root, timestamp, "unknown")
}

#[test]
fn test_archive_contains_metadata_and_recording() {
    let dir = tempfile::tempdir().unwrap();
    write_recording(dir.path(), "SP12345");
    let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default());

    let order = fixed_order(dir.path(), "SP12345");
    let receipt = builder.build(&order).unwrap();

    assert_eq!(receipt.tracking_number, "SP12345");
    assert!(!receipt.replaced_existing);
    assert!(!receipt.media_removed);

    let json = String::from_utf8(read_entry(&receipt.archive_path, "SP12345.json")).unwrap();
    let expected = format!(
        "{{\n    \"tracking_number\": \"SP12345\",\n    \"video_path\": \"{}\",\n    \"timestamp\": \"2024-05-01 10:30:00\",\n    \"location\": \"unknown\"\n}}",
        dir.path().join("SP12345.mp4").display()
    );
    assert_eq!(json, expected);

    let media = read_entry(&receipt.archive_path, "SP12345.mp4");
    assert_eq!(media, std::fs::read(dir.path().join("SP12345.mp4")).unwrap());

    assert_eq!(file_names(dir.path()), vec!["SP12345.mp4", "SP12345.zip"]);
}

#[test]
fn test_order_for_sanitizes_payload() {
    let dir = tempfile::tempdir().unwrap();
    let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default());

    let order = builder.order_for(" SP 123/45 ", "Dock 1").unwrap();
    assert_eq!(order.tracking_number, "SP_123_45");
    assert_eq!(order.video_path(), dir.path().join("SP_123_45.mp4"));
    assert_eq!(order.location, "Dock 1");
}

#[test]
fn test_order_for_rejects_unusable_payload() {
    let dir = tempfile::tempdir().unwrap();
    let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default());

    assert!(matches!(
        builder.order_for("   ", "unknown"),
        Err(ArchiveError::InvalidTrackingNumber(_))
    ));
}

#[test]
fn test_missing_recording_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default());

    let result = builder.build(&fixed_order(dir.path(), "SP404"));
    assert_eq!(
        result,
        Err(ArchiveError::MissingMedia(dir.path().join("SP404.mp4")))
    );
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_duplicate_is_replaced_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write_recording(dir.path(), "SP1");
    std::fs::write(dir.path().join("SP1.zip"), b"stale archive").unwrap();

    let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default());
    let receipt = builder.build(&fixed_order(dir.path(), "SP1")).unwrap();

    assert!(receipt.replaced_existing);
    // The stale bytes are gone and the new archive is readable
    let json = read_entry(&receipt.archive_path, "SP1.json");
    assert!(!json.is_empty());
}

#[test]
fn test_duplicate_rejected_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    write_recording(dir.path(), "SP1");
    std::fs::write(dir.path().join("SP1.zip"), b"first archive").unwrap();

    let options = ArchiveOptions {
        duplicate_policy: DuplicatePolicy::Reject,
        ..ArchiveOptions::default()
    };
    let builder = ArchiveBuilder::new(dir.path(), options);

    assert_eq!(
        builder.build(&fixed_order(dir.path(), "SP1")),
        Err(ArchiveError::DuplicateTrackingNumber("SP1".to_string()))
    );
    assert_eq!(
        std::fs::read(dir.path().join("SP1.zip")).unwrap(),
        b"first archive"
    );
    assert_eq!(file_names(dir.path()), vec!["SP1.mp4", "SP1.zip"]);
}

#[test]
fn test_recording_removed_when_configured() {
    let dir = tempfile::tempdir().unwrap();
    write_recording(dir.path(), "SP2");

    let options = ArchiveOptions {
        media_retention: MediaRetention::Delete,
        ..ArchiveOptions::default()
    };
    let builder = ArchiveBuilder::new(dir.path(), options);
    let receipt = builder.build(&fixed_order(dir.path(), "SP2")).unwrap();

    assert!(receipt.media_removed);
    assert_eq!(file_names(dir.path()), vec!["SP2.zip"]);
    assert!(!read_entry(&receipt.archive_path, "SP2.mp4").is_empty());
}

#[test]
fn test_failed_publish_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    write_recording(dir.path(), "SP9");

    // A non-empty directory squats on the archive name, so the final rename fails
    let squatter = dir.path().join("SP9.zip");
    std::fs::create_dir(&squatter).unwrap();
    std::fs::write(squatter.join("keep.txt"), b"not an archive").unwrap();

    let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default());
    let result = builder.build(&fixed_order(dir.path(), "SP9"));

    assert!(
        matches!(result, Err(ArchiveError::WriteFailed(_))),
        "got {:?}",
        result
    );
    // No transient json and no partial zip
    assert_eq!(file_names(dir.path()), vec!["SP9.mp4", "SP9.zip"]);
    assert!(squatter.is_dir());
    assert_eq!(file_names(&squatter), vec!["keep.txt"]);
}

#[test]
fn test_tampered_order_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut order = fixed_order(dir.path(), "SP5");
    order.tracking_number = "../SP5".to_string();

    let builder = ArchiveBuilder::new(dir.path(), ArchiveOptions::default());
    assert!(matches!(
        builder.build(&order),
        Err(ArchiveError::InvalidTrackingNumber(_))
    ));
    assert!(file_names(dir.path()).is_empty());
}
