use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use metatag::batch::{self, BatchResult};
use metatag::config;
use metatag::exif::{DryRun, ExifTool};
use metatag::operation::MetadataOperation;
use metatag::report;

/// Exit status for a malformed invocation, matching clap's own.
const USAGE_EXIT: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "metatag",
    version,
    about = "Batch GPS and panorama metadata editor for images, driven by ExifTool"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config file (default: metatag.json next to binary)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Validate targets and print the exiftool commands without running them
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print the results as JSON instead of per-file lines
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Copy all GPS tags from a reference image onto one or more targets
    CopyGps(BatchArgs),
    /// Write equirectangular 3840x1920 panorama (GPano) tags onto one or more targets
    TagPano(BatchArgs),
    /// Write a default metatag.json and exit
    Init,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Image files (for copy-gps, the reference image comes first)
    #[arg(value_name = "PATH")]
    paths: Vec<PathBuf>,

    /// Replace directory targets with the image files found inside them
    #[arg(short, long)]
    recursive: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let (planned, args, name) = match cli.command {
        Command::Init => {
            let path = config::Config::default().save(cli.config.as_deref())?;
            println!("Default config written to {}", path.display());
            return Ok(ExitCode::SUCCESS);
        }
        Command::CopyGps(args) => (
            MetadataOperation::copy_gps(args.paths.clone()),
            args,
            "copy-gps",
        ),
        Command::TagPano(args) => (
            MetadataOperation::tag_pano(args.paths.clone()),
            args,
            "tag-pano",
        ),
    };

    let (operation, targets) = match planned {
        Ok(planned) => planned,
        Err(e) => {
            print_usage_error(name, &e);
            return Ok(ExitCode::from(USAGE_EXIT));
        }
    };

    let targets = batch::expand_targets(targets, args.recursive);
    if targets.is_empty() {
        anyhow::bail!("No supported image files found in the specified paths.");
    }

    // Load config
    let mut config = config::Config::load(cli.config.as_deref())?;

    // Override output settings from CLI flags
    if cli.dry_run {
        config.output.dry_run = true;
    }
    if cli.json {
        config.output.json = true;
    }

    let tool = ExifTool::from_config(&config.exiftool);
    let run = if config.output.dry_run {
        log::info!("DRY RUN: no files will be modified");
        batch::run_batch(&DryRun::new(tool), &operation, &targets).await
    } else {
        let version = tool.version().await?;
        log::debug!("Using {} {version}", tool.program());
        batch::run_batch(&tool, &operation, &targets).await
    };

    let result: BatchResult = match run {
        Ok(result) => result,
        Err(aborted) => {
            // Files handled before the error may already be modified.
            report::print_report(&operation, &aborted.partial, config.output.json)?;
            return Err(aborted.into());
        }
    };

    report::print_report(&operation, &result, config.output.json)?;

    if result.all_succeeded() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Print a usage error with the subcommand's usage text to stderr.
fn print_usage_error(name: &str, err: &metatag::Error) {
    let mut cmd = Cli::command();
    cmd.build();
    eprintln!("error: {err}\n");
    match cmd.find_subcommand_mut(name) {
        Some(sub) => eprintln!("{}", sub.render_usage()),
        None => eprintln!("{}", cmd.render_usage()),
    }
}
