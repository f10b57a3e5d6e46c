// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! - [`archive`]: Order metadata + recording → archive bundle

pub mod archive;

pub use archive::{ArchiveBuilder, ArchiveOptions, ArchiveReceipt, Order, TrackingNumber};
