use anyhow::{Context, Result};
use nom_exif::*;
use std::path::Path;

/// Whether the file's EXIF block carries GPS coordinates.
///
/// Files without a parseable EXIF block report `false`; XMP-only GPS is not
/// detected here.
pub fn has_gps(path: &Path) -> Result<bool> {
    let mut parser = MediaParser::new();
    let ms = MediaSource::file_path(path).context("Failed to open image file")?;

    let iter: ExifIter = match parser.parse(ms) {
        Ok(iter) => iter,
        Err(_) => {
            log::debug!("No EXIF data found in {}", path.display());
            return Ok(false);
        }
    };

    Ok(iter.parse_gps_info().ok().flatten().is_some())
}
