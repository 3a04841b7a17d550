use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// GPano fields written by [`MetadataOperation::TagPano`], in write order.
///
/// Equirectangular 3840x1920 panorama with the cropped area covering the
/// full frame.
pub const PANO_FIELDS: &[(&str, &str)] = &[
    ("XMP-GPano:UsePanoramaViewer", "True"),
    ("XMP-GPano:ProjectionType", "equirectangular"),
    ("XMP-GPano:FullPanoWidthPixels", "3840"),
    ("XMP-GPano:FullPanoHeightPixels", "1920"),
    ("XMP-GPano:CroppedAreaImageWidthPixels", "3840"),
    ("XMP-GPano:CroppedAreaImageHeightPixels", "1920"),
    ("XMP-GPano:CroppedAreaLeftPixels", "0"),
    ("XMP-GPano:CroppedAreaTopPixels", "0"),
];

/// Whether an image is only read from or also written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// A path that passed validation as an image input.
///
/// Validation is a snapshot: callers re-run [`ImagePath::check`] right before
/// each use rather than holding on to an old result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePath(PathBuf);

impl ImagePath {
    /// Check that `path` exists, is a non-empty regular file and, for
    /// [`Access::Write`], is not read-only.
    pub fn check(path: &Path, access: Access) -> Result<Self> {
        let meta = match std::fs::metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::invalid_path(path, "file not found"));
            }
            Err(e) => return Err(Error::invalid_path(path, e)),
        };

        if !meta.is_file() {
            return Err(Error::invalid_path(path, "not a regular file"));
        }
        if meta.len() == 0 {
            return Err(Error::invalid_path(path, "file is empty"));
        }
        if access == Access::Write && meta.permissions().readonly() {
            return Err(Error::invalid_path(path, "file is not writable"));
        }

        Ok(Self(path.to_path_buf()))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// A metadata mutation applied to every target of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataOperation {
    /// Copy all GPS tags from `reference` onto each target.
    CopyGps { reference: PathBuf },
    /// Write the fixed panorama field set onto each target.
    TagPano { fields: &'static [(&'static str, &'static str)] },
}

impl MetadataOperation {
    /// Split `copy-gps` arguments into the operation and its targets.
    ///
    /// The first path is the reference; at least one target must follow.
    pub fn copy_gps(mut paths: Vec<PathBuf>) -> Result<(Self, Vec<PathBuf>)> {
        if paths.len() < 2 {
            return Err(Error::Usage(format!(
                "copy-gps needs a reference image and at least one target, got {} path(s)",
                paths.len()
            )));
        }
        let reference = paths.remove(0);
        Ok((Self::CopyGps { reference }, paths))
    }

    /// Validate `tag-pano` arguments; every path is a target.
    pub fn tag_pano(paths: Vec<PathBuf>) -> Result<(Self, Vec<PathBuf>)> {
        if paths.is_empty() {
            return Err(Error::Usage(
                "tag-pano needs at least one target image".to_string(),
            ));
        }
        Ok((Self::TagPano { fields: PANO_FIELDS }, paths))
    }

    /// The reference file this operation reads from, if any.
    pub fn reference(&self) -> Option<&Path> {
        match self {
            Self::CopyGps { reference } => Some(reference),
            Self::TagPano { .. } => None,
        }
    }

    /// Short action label used in per-file report lines.
    pub fn action(&self) -> &'static str {
        match self {
            Self::CopyGps { .. } => "copy-gps",
            Self::TagPano { .. } => "tag-pano",
        }
    }
}

impl fmt::Display for MetadataOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CopyGps { reference } => {
                write!(f, "copy GPS tags from {}", reference.display())
            }
            Self::TagPano { fields } => write!(f, "write {} panorama tags", fields.len()),
        }
    }
}
