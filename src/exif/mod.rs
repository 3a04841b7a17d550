//! Metadata editing backends and the reference GPS check.
//!
//! - [`MetadataEditor`]: the capability "apply operation X to file Y"
//! - [`ExifTool`]: runs the `exiftool` binary as a child process
//! - [`DryRun`]: logs the `exiftool` command it would run, touches nothing
//! - [`has_gps`]: reads a file's EXIF to see whether it carries GPS data

mod exiftool;
mod reader;

pub use exiftool::{DryRun, ExifTool};
pub use reader::has_gps;

use std::path::Path;

use crate::error::Result;
use crate::operation::MetadataOperation;

/// Something that can apply a [`MetadataOperation`] to one file in place.
///
/// Implement this trait to plug in another backend or a test double; the
/// batch driver only ever talks to this trait.
///
/// # Example
///
/// ```rust,no_run
/// use metatag::exif::{ExifTool, MetadataEditor};
/// use metatag::operation::MetadataOperation;
/// use std::path::{Path, PathBuf};
///
/// # async fn example() -> metatag::Result<()> {
/// let tool = ExifTool::new("exiftool");
/// let (op, _) = MetadataOperation::tag_pano(vec![PathBuf::from("pano.jpg")])?;
/// tool.apply(&op, Path::new("pano.jpg")).await?;
/// # Ok(())
/// # }
/// ```
#[async_trait::async_trait]
pub trait MetadataEditor: Send + Sync {
    /// The display name of this backend (e.g. "exiftool").
    fn name(&self) -> &str;

    /// Apply `operation` to `target`, modifying the original file.
    ///
    /// Returns [`Error::ToolUnavailable`](crate::Error::ToolUnavailable) when the
    /// backend cannot run at all; any other error concerns `target` only.
    async fn apply(&self, operation: &MetadataOperation, target: &Path) -> Result<()>;
}
