use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name looked up next to the executable when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "metatag.json";

/// Top-level configuration for metatag.
///
/// Controls how the external metadata tool is invoked and how batch results
/// are reported.
///
/// # Loading
///
/// ```rust,no_run
/// use metatag::config::Config;
///
/// // From a JSON file
/// let config = Config::load(Some("metatag.json".as_ref())).unwrap();
///
/// // Or use defaults and customize
/// let mut config = Config::default();
/// config.exiftool.program = "/opt/exiftool/exiftool".into();
/// config.exiftool.timeout_secs = 120;
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// External tool invocation.
    pub exiftool: ExifToolConfig,
    /// Output behavior (dry run, JSON report).
    pub output: OutputConfig,
}

/// How the ExifTool binary is located and run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExifToolConfig {
    /// Program name or path, resolved through `PATH` when bare.
    pub program: String,
    /// Extra arguments placed before the per-file arguments (e.g. `["-P"]`).
    pub args: Vec<String>,
    /// Upper bound on a single invocation, in seconds.
    pub timeout_secs: u64,
}

/// Output and behavior configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// If `true`, validate targets and log the commands without running them.
    pub dry_run: bool,
    /// If `true`, print the batch result as JSON instead of per-file lines.
    pub json: bool,
}

impl Default for ExifToolConfig {
    fn default() -> Self {
        Self {
            program: "exiftool".to_string(),
            args: Vec::new(),
            timeout_secs: 60,
        }
    }
}

impl ExifToolConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Resolve the config file path, in the same directory as the executable.
    pub fn config_path() -> Result<PathBuf> {
        let exe_path = std::env::current_exe().context("Failed to get executable path")?;
        let exe_dir = exe_path
            .parent()
            .context("Failed to get executable directory")?;
        Ok(exe_dir.join(CONFIG_FILE_NAME))
    }

    /// Load config from the given path, or from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        if !config_path.exists() {
            // An explicit --config that is missing is a mistake; the default
            // location is optional.
            if path.is_some() {
                anyhow::bail!("Config file not found at {}", config_path.display());
            }
            log::debug!(
                "Config file not found at {}. Using defaults.",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config: Config =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        if config.exiftool.timeout_secs == 0 {
            anyhow::bail!("exiftool.timeout_secs must be greater than zero");
        }
        Ok(config)
    }

    /// Save config to the given path, or to the default location.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, contents).context("Failed to write config file")?;
        log::info!("Config saved to {}", config_path.display());
        Ok(config_path)
    }
}
