//! # metatag
//!
//! Batch GPS and panorama metadata editor for images. The metadata itself is
//! rewritten by [ExifTool](https://exiftool.org); this crate validates the
//! arguments, runs one invocation per file, keeps going past per-file
//! failures, and reports every file's outcome.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use metatag::batch::run_batch;
//! use metatag::exif::ExifTool;
//! use metatag::operation::MetadataOperation;
//! use std::path::PathBuf;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Tag two equirectangular shots as 3840x1920 panoramas
//!     let (op, targets) = MetadataOperation::tag_pano(vec![
//!         PathBuf::from("pano-1.jpg"),
//!         PathBuf::from("pano-2.jpg"),
//!     ])?;
//!
//!     let result = run_batch(&ExifTool::new("exiftool"), &op, &targets).await?;
//!     for line in result.outcomes.iter().map(|o| metatag::report::format_line(op.action(), o)) {
//!         println!("{line}");
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Operations
//!
//! | Operation | ExifTool arguments |
//! |-----------|--------------------|
//! | Copy GPS | `-overwrite_original -tagsFromFile <reference> -gps:all <target>` |
//! | Tag panorama | `-overwrite_original -XMP-GPano:<tag>=<value> ... <target>` |
//!
//! ## Modules
//!
//! - [`batch`]: Sequential batch driver, directory expansion, per-file outcomes
//! - [`config`]: Configuration types and loading/saving
//! - [`error`]: Error type and fatal/per-file classification
//! - [`exif`]: Metadata editor trait, ExifTool adapter, reference GPS check
//! - [`operation`]: Operations, fixed panorama fields, input path validation
//! - [`report`]: Per-file lines, JSON output, summary

pub mod batch;
pub mod config;
pub mod error;
pub mod exif;
pub mod operation;
pub mod report;

pub use error::{Error, Result};
