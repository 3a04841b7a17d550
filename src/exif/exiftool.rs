use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

use super::MetadataEditor;
use crate::config::ExifToolConfig;
use crate::error::{Error, Result};
use crate::operation::MetadataOperation;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs the `exiftool` binary once per target.
///
/// Every invocation passes `-overwrite_original`, so the target is rewritten
/// in place and no `_original` backup is left next to it.
#[derive(Debug, Clone)]
pub struct ExifTool {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl ExifTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn from_config(config: &ExifToolConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            timeout: config.timeout(),
        }
    }

    /// Arguments placed before the per-file arguments of every invocation.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build the full argument list for applying `operation` to `target`.
    pub fn build_args(&self, operation: &MetadataOperation, target: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push("-overwrite_original".into());

        match operation {
            MetadataOperation::CopyGps { reference } => {
                args.push("-tagsFromFile".into());
                args.push(reference.into());
                args.push("-gps:all".into());
            }
            MetadataOperation::TagPano { fields } => {
                for (tag, value) in fields.iter() {
                    args.push(format!("-{tag}={value}").into());
                }
            }
        }

        args.push(file_arg(target));
        args
    }

    /// Human-readable command line, as logged in dry-run mode.
    pub fn command_line(&self, operation: &MetadataOperation, target: &Path) -> String {
        std::iter::once(OsString::from(&self.program))
            .chain(self.build_args(operation, target))
            .map(|arg| quote(&arg.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run `exiftool -ver` and return the reported version.
    ///
    /// Used as an up-front availability check before a batch starts.
    pub async fn version(&self) -> Result<String> {
        let mut args: Vec<OsString> = self.args.iter().map(OsString::from).collect();
        args.push("-ver".into());

        let output = self.run(&args).await?;
        if !output.status.success() {
            return Err(Error::ToolFailed(failure_reason(&output)));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    async fn run(&self, args: &[OsString]) -> Result<Output> {
        log::debug!("Running {} {:?}", self.program, args);

        let mut command = Command::new(&self.program);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);

        match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(e)) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::PermissionDenied) => {
                Err(Error::ToolUnavailable {
                    program: self.program.clone(),
                    source: e,
                })
            }
            Ok(Err(e)) => Err(Error::Io(e)),
            // Dropping the output future kills the child.
            Err(_) => Err(Error::Timeout(self.timeout)),
        }
    }
}

#[async_trait::async_trait]
impl MetadataEditor for ExifTool {
    fn name(&self) -> &str {
        "exiftool"
    }

    async fn apply(&self, operation: &MetadataOperation, target: &Path) -> Result<()> {
        let output = self.run(&self.build_args(operation, target)).await?;
        if output.status.success() {
            Ok(())
        } else {
            Err(Error::ToolFailed(failure_reason(&output)))
        }
    }
}

/// Logs the command [`ExifTool`] would run and reports success.
#[derive(Debug, Clone)]
pub struct DryRun {
    tool: ExifTool,
}

impl DryRun {
    pub fn new(tool: ExifTool) -> Self {
        Self { tool }
    }
}

#[async_trait::async_trait]
impl MetadataEditor for DryRun {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn apply(&self, operation: &MetadataOperation, target: &Path) -> Result<()> {
        log::info!("  Would run: {}", self.tool.command_line(operation, target));
        Ok(())
    }
}

/// Pick the most useful diagnostic from a failed run: stderr, then stdout,
/// then the bare exit status.
fn failure_reason(output: &Output) -> String {
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    format!("exiftool exited with {}", output.status)
}

/// A relative path starting with `-` would be read as an option.
fn file_arg(path: &Path) -> OsString {
    if path.is_relative() && path.as_os_str().as_encoded_bytes().starts_with(b"-") {
        Path::new(".").join(path).into_os_string()
    } else {
        path.into()
    }
}

fn quote(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::PANO_FIELDS;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn copy_gps(reference: &str) -> MetadataOperation {
        MetadataOperation::CopyGps {
            reference: PathBuf::from(reference),
        }
    }

    fn tag_pano() -> MetadataOperation {
        MetadataOperation::TagPano { fields: PANO_FIELDS }
    }

    // ── build_args ───────────────────────────────────────────────────

    #[test]
    fn copy_gps_args() {
        let tool = ExifTool::new("exiftool");
        let args = tool.build_args(&copy_gps("ref.jpg"), Path::new("a.jpg"));
        assert_eq!(
            args,
            ["-overwrite_original", "-tagsFromFile", "ref.jpg", "-gps:all", "a.jpg"]
                .map(OsString::from)
        );
    }

    #[test]
    fn tag_pano_args() {
        let tool = ExifTool::new("exiftool");
        let args = tool.build_args(&tag_pano(), Path::new("pano.jpg"));

        assert_eq!(args.first().unwrap(), "-overwrite_original");
        assert_eq!(args.last().unwrap(), "pano.jpg");
        assert_eq!(args.len(), PANO_FIELDS.len() + 2);
        assert!(args.contains(&OsString::from("-XMP-GPano:ProjectionType=equirectangular")));
        assert!(args.contains(&OsString::from("-XMP-GPano:FullPanoWidthPixels=3840")));
        assert!(args.contains(&OsString::from("-XMP-GPano:CroppedAreaTopPixels=0")));
    }

    #[test]
    fn tag_pano_args_do_not_depend_on_target() {
        let tool = ExifTool::new("exiftool");
        let a = tool.build_args(&tag_pano(), Path::new("a.jpg"));
        let b = tool.build_args(&tag_pano(), Path::new("b.jpg"));
        assert_eq!(a[..a.len() - 1], b[..b.len() - 1]);
    }

    #[test]
    fn extra_args_come_first() {
        let tool = ExifTool::new("exiftool").with_args(["-P"]);
        let args = tool.build_args(&tag_pano(), Path::new("a.jpg"));
        assert_eq!(args[0], "-P");
        assert_eq!(args[1], "-overwrite_original");
    }

    #[test]
    fn dash_target_is_not_read_as_an_option() {
        let tool = ExifTool::new("exiftool");
        let args = tool.build_args(&tag_pano(), Path::new("-x.jpg"));
        assert_eq!(args.last().unwrap(), "./-x.jpg");

        let args = tool.build_args(&tag_pano(), Path::new("/photos/-x.jpg"));
        assert_eq!(args.last().unwrap(), "/photos/-x.jpg");

        let args = tool.build_args(&tag_pano(), Path::new("photos/-x.jpg"));
        assert_eq!(args.last().unwrap(), "photos/-x.jpg");
    }

    #[test]
    fn command_line_quotes_spaces() {
        let tool = ExifTool::new("exiftool");
        let line = tool.command_line(&copy_gps("my ref.jpg"), Path::new("a.jpg"));
        assert_eq!(
            line,
            "exiftool -overwrite_original -tagsFromFile 'my ref.jpg' -gps:all a.jpg"
        );
    }

    // ── running a stand-in tool ──────────────────────────────────────

    /// A shell script that logs its arguments and fails unless the last
    /// argument is a non-empty file, like exiftool on a missing target.
    #[cfg(unix)]
    fn fake_exiftool(dir: &Path) -> (ExifTool, PathBuf) {
        let log = dir.join("calls.log");
        let script = dir.join("fake-exiftool.sh");
        fs::write(
            &script,
            format!(
                r#"if [ "$1" = "-ver" ]; then echo 12.76; exit 0; fi
printf '%s\n' "$*" >> '{}'
for last; do :; done
if [ -s "$last" ]; then echo "    1 image files updated"; exit 0; fi
echo "Error: File not found - $last" >&2
exit 1
"#,
                log.display()
            ),
        )
        .unwrap();

        let tool = ExifTool::new("sh").with_args([script.to_string_lossy().into_owned()]);
        (tool, log)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn apply_success() {
        let dir = TempDir::new().unwrap();
        let (tool, log) = fake_exiftool(dir.path());
        let target = dir.path().join("a.jpg");
        fs::write(&target, b"fake").unwrap();

        tool.apply(&tag_pano(), &target).await.unwrap();

        let calls = fs::read_to_string(log).unwrap();
        assert_eq!(calls.lines().count(), 1);
        assert!(calls.contains("-overwrite_original"));
        assert!(calls.contains("-XMP-GPano:ProjectionType=equirectangular"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn apply_failure_carries_diagnostics() {
        let dir = TempDir::new().unwrap();
        let (tool, _) = fake_exiftool(dir.path());
        let target = dir.path().join("missing.jpg");

        let err = tool.apply(&tag_pano(), &target).await.unwrap_err();
        assert!(matches!(err, Error::ToolFailed(_)));
        assert!(!err.is_fatal());
        assert!(err.to_string().contains("File not found"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn version_reports_tool_version() {
        let dir = TempDir::new().unwrap();
        let (tool, _) = fake_exiftool(dir.path());
        assert_eq!(tool.version().await.unwrap(), "12.76");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn apply_times_out() {
        let tool = ExifTool::new("sh")
            .with_args(["-c", "sleep 10", "sh"])
            .with_timeout(Duration::from_millis(200));

        let err = tool.apply(&tag_pano(), Path::new("a.jpg")).await.unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
        assert!(!err.is_fatal());
    }

    #[tokio::test]
    async fn missing_program_is_fatal() {
        let tool = ExifTool::new("metatag-test-no-such-exiftool");

        let err = tool.apply(&tag_pano(), Path::new("a.jpg")).await.unwrap_err();
        assert!(matches!(err, Error::ToolUnavailable { .. }));
        assert!(err.is_fatal());

        let err = tool.version().await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn dry_run_touches_nothing() {
        let dry = DryRun::new(ExifTool::new("metatag-test-no-such-exiftool"));
        dry.apply(&copy_gps("ref.jpg"), Path::new("a.jpg")).await.unwrap();
        assert_eq!(dry.name(), "dry-run");
    }

    #[test]
    fn failure_reason_falls_back_to_status() {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            let output = Output {
                status: std::process::ExitStatus::from_raw(1 << 8),
                stdout: Vec::new(),
                stderr: Vec::new(),
            };
            assert!(failure_reason(&output).starts_with("exiftool exited with"));

            let output = Output {
                stdout: b"Warning: nothing to do\n".to_vec(),
                ..output
            };
            assert_eq!(failure_reason(&output), "Warning: nothing to do");
        }
    }
}
