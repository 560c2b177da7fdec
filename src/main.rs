mod output;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use verity::config::Settings;
use verity::hash::glob::normalize_globs;
use verity::hash::path_utils;
use verity::hash::report::{write_tsv_report, write_tsv_report_file};
use verity::hash::{
    CancellationToken, ChannelObserver, FinalSummary, ManifestStore, ParseMode, PathSnapshotResolver,
    PipelineConfig, ScanEngine, ScanReport, VerifyEngine,
};

#[derive(Parser, Debug)]
#[command(name = "verity", version)]
#[command(about = "Create, extend and verify checksum manifests for large file trees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log debug output (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check files against a manifest and report unlisted files
    Verify(RunArgs),
    /// Hash every selected file into a new manifest
    Create(RunArgs),
    /// Hash files the manifest does not list yet and append them
    Add(RunArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Manifest file (`<hash><TAB><relative path>` per line)
    manifest: PathBuf,

    /// Directory the manifest paths are relative to [default: manifest directory]
    #[arg(long)]
    root: Option<PathBuf>,

    /// Hash algorithm [default: from manifest extension, config, else SHA256]
    #[arg(short, long)]
    algorithm: Option<String>,

    /// Semicolon-separated include globs
    #[arg(long)]
    include: Option<String>,

    /// Semicolon-separated exclude globs
    #[arg(long)]
    exclude: Option<String>,

    /// Worker threads [default: one per CPU]
    #[arg(short, long)]
    threads: Option<usize>,

    /// Write the TSV problem report here instead of stderr
    #[arg(long)]
    tsv_report: Option<PathBuf>,

    /// Read files from this snapshot device or mount
    #[arg(long, requires = "snapshot_volume")]
    snapshot_device: Option<PathBuf>,

    /// Volume root the snapshot was taken of
    #[arg(long, requires = "snapshot_device")]
    snapshot_volume: Option<PathBuf>,

    /// Fail on malformed manifest lines instead of skipping them
    #[arg(long)]
    strict: bool,

    /// Print the summary as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let settings = Settings::load().context("loading configuration")?;

    match cli.command {
        Commands::Verify(args) => {
            let (config, manifest) = build_config(&args, &settings)?;
            let engine = VerifyEngine::new(config, CancellationToken::new()).with_parse_mode(parse_mode(&args));

            let summary = with_progress(!args.json, |observer| engine.verify(&manifest, observer))?;
            finish_verify(&args, &manifest, &summary)
        }
        Commands::Create(args) => {
            let (config, manifest) = build_config(&args, &settings)?;
            let engine = ScanEngine::new(config, CancellationToken::new());

            let report = with_progress(!args.json, |observer| engine.create_manifest(&manifest, observer))?;
            finish_scan(&args, "CREATE COMPLETE", &manifest, &report)
        }
        Commands::Add(args) => {
            let (config, manifest) = build_config(&args, &settings)?;
            let engine = ScanEngine::new(config, CancellationToken::new()).with_parse_mode(parse_mode(&args));

            let report = with_progress(!args.json, |observer| engine.add_to_manifest(&manifest, observer))?;
            finish_scan(&args, "ADD COMPLETE", &manifest, &report)
        }
    }
}

fn parse_mode(args: &RunArgs) -> ParseMode {
    if args.strict {
        ParseMode::Strict
    } else {
        ParseMode::Lenient
    }
}

// CLI flags win over the config file
fn build_config(args: &RunArgs, settings: &Settings) -> Result<(PipelineConfig, PathBuf)> {
    let manifest = path_utils::absolute(&args.manifest);
    let root = match &args.root {
        Some(root) => path_utils::absolute(root),
        None => manifest
            .parent()
            .map(Path::to_path_buf)
            .context("manifest path has no parent directory")?,
    };

    let algorithm = args
        .algorithm
        .as_deref()
        .or_else(|| ManifestStore::algorithm_from_extension(&manifest))
        .or(settings.algorithm.as_deref())
        .unwrap_or("SHA256");

    let includes = normalize_globs(args.include.as_deref().or(settings.include.as_deref()), false);
    let excludes = normalize_globs(args.exclude.as_deref().or(settings.exclude.as_deref()), true);

    let mut config = PipelineConfig::new(root, algorithm)?.with_globs(includes, excludes);
    if let Some(threads) = args.threads.or(settings.threads) {
        config = config.with_parallelism(threads);
    }
    if let (Some(device), Some(volume)) = (&args.snapshot_device, &args.snapshot_volume) {
        config = config.with_snapshot_resolver(PathSnapshotResolver::new(device, volume));
    }

    log::debug!(
        "Using {} on {} ({} workers)",
        config.algorithm(),
        config.root().display(),
        config.parallelism()
    );
    Ok((config, manifest))
}

// Runs `f` with a channel observer whose events drive the progress bar
fn with_progress<T, F>(show: bool, f: F) -> Result<T>
where
    F: FnOnce(&ChannelObserver) -> Result<T, verity::hash::HashUtilityError>,
{
    let (observer, events) = ChannelObserver::new();
    let progress = output::spawn_progress(events, show && io::stderr().is_terminal());

    let result = f(&observer);
    drop(observer);
    if progress.join().is_err() {
        log::warn!("Progress display thread panicked");
    }

    Ok(result?)
}

fn write_problem_report(args: &RunArgs, summary: &FinalSummary) -> Result<()> {
    if summary.problematic_results.is_empty() {
        return Ok(());
    }

    match &args.tsv_report {
        Some(path) => write_tsv_report_file(path, summary)?,
        None => write_tsv_report(&mut io::stderr().lock(), summary).context("writing report to stderr")?,
    }
    Ok(())
}

fn finish_verify(args: &RunArgs, manifest: &Path, summary: &FinalSummary) -> Result<u8> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        output::print_problems(summary);
        output::print_summary(&format!("VERIFY {}", manifest.display()), summary);
    }
    write_problem_report(args, summary)?;

    Ok(summary.exit_code() as u8)
}

fn finish_scan(args: &RunArgs, title: &str, manifest: &Path, report: &ScanReport) -> Result<u8> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        output::print_scan_report(title, report, manifest);
    }
    write_problem_report(args, &report.summary)?;

    // Nothing selected (create) or nothing new (add) is a warning-level outcome
    if !report.manifest_written {
        return Ok(1);
    }
    Ok(report.summary.exit_code() as u8)
}
