use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::exif::{self, MetadataEditor};
use crate::operation::{Access, ImagePath, MetadataOperation};

/// Extensions picked up when walking a directory target.
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "tif", "tiff",
    "heic", "heif", "avif",
    "cr3", "cr2", "dng", "nef", "arw", "raf", "orf", "rw2", "pef", "srw",
];

/// Outcome of applying an operation to a single target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FileOutcome {
    Success { path: PathBuf },
    Failure { path: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Success { path } | Self::Failure { path, .. } => path,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Per-target outcomes of one batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BatchResult {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchResult {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.len() - self.succeeded()
    }

    pub fn all_succeeded(&self) -> bool {
        self.outcomes.iter().all(FileOutcome::is_success)
    }
}

/// A batch stopped by a fatal error.
///
/// `partial` holds the outcomes of the targets handled before the error; those
/// files may already have been modified.
#[derive(Debug, thiserror::Error)]
#[error("batch aborted after {} file(s): {error}", .partial.len())]
pub struct Aborted {
    pub error: Error,
    pub partial: BatchResult,
}

/// Expand directory targets into the image files they contain.
///
/// With `recursive` unset the paths are returned untouched. Otherwise each
/// directory is walked (following symlinks, sorted by file name) and replaced
/// in place by its supported image files. File paths are always kept as
/// given, even when missing, so they still show up as failures.
///
/// # Example
///
/// ```rust,no_run
/// use metatag::batch::expand_targets;
/// use std::path::PathBuf;
///
/// let targets = expand_targets(
///     vec![PathBuf::from("pano.jpg"), PathBuf::from("./trip/")],
///     true,
/// );
/// println!("{} target(s)", targets.len());
/// ```
pub fn expand_targets(paths: Vec<PathBuf>, recursive: bool) -> Vec<PathBuf> {
    if !recursive {
        return paths;
    }

    let mut targets = Vec::new();
    for path in paths {
        if !path.is_dir() {
            targets.push(path);
            continue;
        }

        let before = targets.len();
        for entry in WalkDir::new(&path)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let p = entry.path();
            if p.is_file() && is_supported_image(p) {
                targets.push(p.to_path_buf());
            }
        }
        if targets.len() == before {
            log::warn!("No supported image files in {}", path.display());
        }
    }

    targets
}

/// Check if a file has a supported image extension.
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Apply `operation` to every target, one at a time, in input order.
///
/// A failing target is recorded and the batch moves on. Only a fatal error
/// (see [`Error::is_fatal`](crate::Error::is_fatal)) stops the batch; it is
/// returned as [`Aborted`] together with the outcomes recorded before it.
///
/// # Example
///
/// ```rust,no_run
/// use metatag::batch::run_batch;
/// use metatag::exif::ExifTool;
/// use metatag::operation::MetadataOperation;
/// use std::path::PathBuf;
///
/// # async fn example() -> anyhow::Result<()> {
/// let (op, targets) = MetadataOperation::copy_gps(vec![
///     PathBuf::from("reference.jpg"),
///     PathBuf::from("a.jpg"),
///     PathBuf::from("b.jpg"),
/// ])?;
/// let result = run_batch(&ExifTool::new("exiftool"), &op, &targets).await?;
/// println!("{} of {} succeeded", result.succeeded(), result.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_batch(
    editor: &dyn MetadataEditor,
    operation: &MetadataOperation,
    targets: &[PathBuf],
) -> std::result::Result<BatchResult, Aborted> {
    if let Some(reference) = operation.reference() {
        warn_if_reference_lacks_gps(reference);
    }

    log::info!(
        "{} on {} file(s) via {}",
        operation,
        targets.len(),
        editor.name()
    );

    let total = targets.len();
    let mut result = BatchResult::default();

    for (i, target) in targets.iter().enumerate() {
        log::info!("[{}/{}] {}", i + 1, total, target.display());

        let outcome = match apply_one(editor, operation, target).await {
            Ok(()) => FileOutcome::Success {
                path: target.clone(),
            },
            Err(error) if error.is_fatal() => {
                return Err(Aborted {
                    error,
                    partial: result,
                });
            }
            Err(e) => {
                log::debug!("  {} failed: {e}", target.display());
                FileOutcome::Failure {
                    path: target.clone(),
                    reason: e.to_string(),
                }
            }
        };
        result.outcomes.push(outcome);
    }

    Ok(result)
}

/// Re-validate the inputs right before handing them to the editor.
async fn apply_one(
    editor: &dyn MetadataEditor,
    operation: &MetadataOperation,
    target: &Path,
) -> Result<()> {
    if let Some(reference) = operation.reference() {
        ImagePath::check(reference, Access::Read)?;
    }
    let target = ImagePath::check(target, Access::Write)?;
    editor.apply(operation, target.as_path()).await
}

fn warn_if_reference_lacks_gps(reference: &Path) {
    match exif::has_gps(reference) {
        Ok(true) => {}
        Ok(false) => log::warn!(
            "No EXIF GPS data found in {}; only XMP GPS tags (if any) will be copied",
            reference.display()
        ),
        Err(e) => log::debug!("Could not read EXIF from {}: {e}", reference.display()),
    }
}
