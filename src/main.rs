//! dirscope - directory tree analyzer.
//!
//! Usage:
//!   dirscope [PATH]                      Analyze in standard mode
//!   dirscope PATH --mode deep            No depth limit, hidden files included
//!   dirscope PATH --output report.json   Also write the full result as JSON
//!   dirscope PATH --format json          Print the result as JSON
//!   dirscope --help                      Show help

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::thread;
use std::time::SystemTime;

use chrono::{DateTime, Local};
use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use dirscope_analyze::{AnalysisMode, AnalysisResult, Analyzer, ScanConfig, ScanError};
use dirscope_scan::{ScanProgress, Walker};

/// Paths shown per duplicate group before eliding the rest.
const PATHS_PER_GROUP: usize = 3;

/// Error records printed in the text report.
const ERRORS_SHOWN: usize = 10;

#[derive(Parser)]
#[command(
    name = "dirscope",
    version,
    about = "Analyze a directory tree: sizes, file types and duplicates",
    long_about = "dirscope walks a directory tree, summarizes sizes and file types, \
                  and finds byte-identical duplicate files.\n\n\
                  Press Ctrl-C to stop early; the partial result is still reported."
)]
struct Cli {
    /// Path to analyze (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Analysis mode
    #[arg(short, long, value_enum, default_value_t = ModeArg::Standard)]
    mode: ModeArg,

    /// Write the full result as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Number of entries to show in each top-N listing
    #[arg(short = 'n', long, default_value = "10")]
    top: usize,

    /// Worker threads (0 = one per core)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Console output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// Metadata only, depth 3
    Quick,
    /// Hashes, text counts and duplicates, depth 10
    Standard,
    /// Like standard, depth 20, hidden and system files included
    Detailed,
    /// Like detailed, unlimited depth
    Deep,
}

impl From<ModeArg> for AnalysisMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Quick => AnalysisMode::Quick,
            ModeArg::Standard => AnalysisMode::Standard,
            ModeArg::Detailed => AnalysisMode::Detailed,
            ModeArg::Deep => AnalysisMode::Deep,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ScanConfig::builder()
        .root(cli.path.as_path())
        .apply_mode(cli.mode.into())
        .threads(cli.threads)
        .build()
        .map_err(ScanError::from)
        .context("Invalid configuration")?;
    debug!(?config, "resolved configuration");

    let walker = Walker::new();
    let cancel = walker.cancel_flag();
    ctrlc::set_handler(move || cancel.store(true, Ordering::Relaxed))
        .context("Failed to install Ctrl-C handler")?;

    let progress = (!cli.quiet).then(|| spawn_progress(walker.subscribe()));

    if !cli.quiet {
        eprintln!("Analyzing {} ({} mode)...", cli.path.display(), config.mode);
    }

    let analyzer = Analyzer::with_walker(walker);
    let result = analyzer.run(&config).context("Analysis failed")?;

    if let Some(handle) = progress {
        // The walker always sends a final snapshot, which ends the thread.
        let _ = handle.join();
    }

    match cli.format {
        OutputFormat::Text => print_report(&result, cli.top),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
    }

    if let Some(output_path) = cli.output {
        export_json(&result, &output_path)?;
        if !cli.quiet {
            eprintln!("Exported to {}", output_path.display());
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins unless `--verbose` is set.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

/// Print progress snapshots on stderr until the final one arrives.
fn spawn_progress(mut rx: broadcast::Receiver<ScanProgress>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        loop {
            match rx.blocking_recv() {
                Ok(progress) => {
                    eprint!(
                        "\r  {} entries ({} files), {} at {}/s, {:.0} files/s   ",
                        progress.entries_seen(),
                        progress.files_scanned,
                        format_size(progress.bytes_scanned),
                        format_size(progress.bytes_per_second() as u64),
                        progress.files_per_second()
                    );
                    if progress.finished {
                        eprintln!();
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Write the full result as pretty JSON.
fn export_json(result: &AnalysisResult, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Print the human-readable report.
fn print_report(result: &AnalysisResult, top_n: usize) {
    let summary = &result.summary;

    println!();
    println!("{}", "─".repeat(70));
    println!(" Directory Analysis Report");
    println!("{}", "─".repeat(70));
    println!(" Root: {}", result.root.display());
    println!(
        " Mode: {}   Started: {}   Took {:.2}s",
        result.mode,
        result.started_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
        result.elapsed.as_secs_f64()
    );
    if result.is_partial() {
        println!(" Interrupted: results cover only part of the tree");
    }
    println!();

    println!(" Basic Statistics:");
    println!("   Total files:        {}", summary.total_files);
    println!("   Total directories:  {}", summary.total_dirs);
    println!("   Total size:         {}", format_size(summary.total_size));
    println!("   Average file size:  {}", format_size(summary.mean_size as u64));
    println!("   Median file size:   {}", format_size(summary.median_size as u64));
    println!("   Deepest level:      {}", summary.max_depth);
    if let Some((path, size)) = &summary.largest_file {
        println!("   Largest file:       {} ({})", path.display(), format_size(*size));
    }
    if let Some((path, size)) = &summary.smallest_file {
        println!("   Smallest file:      {} ({})", path.display(), format_size(*size));
    }
    if let Some((path, time)) = &summary.oldest_file {
        println!("   Oldest file:        {} ({})", path.display(), format_time(*time));
    }
    if let Some((path, time)) = &summary.newest_file {
        println!("   Newest file:        {} ({})", path.display(), format_time(*time));
    }
    println!();

    if summary.total_files > 0 {
        println!(" File Types:");
        for (category, count) in summary.categories_by_count() {
            let ratio = count as f64 / summary.total_files as f64;
            println!(
                "   {:<12} {:>8} {:>5.1}% {}",
                category.label(),
                count,
                ratio * 100.0,
                make_bar(ratio, 20)
            );
        }
        println!();

        let extensions = summary.top_extensions(top_n);
        if !extensions.is_empty() {
            println!(" Top Extensions:");
            for (extension, count) in extensions {
                println!("   {:<12} {:>8}", extension, count);
            }
            println!();
        }

        println!(" Largest Files:");
        for file in result.largest_files(top_n) {
            println!(
                "   {:>10}  {}",
                format_size(file.size),
                truncate(&file.path.display().to_string(), 80)
            );
        }
        println!();
    }

    if result.duplicates_checked {
        print_duplicates(result, top_n);
    }

    if !result.errors.is_empty() {
        println!(" Errors ({}):", result.error_count());
        for error in result.errors.iter().take(ERRORS_SHOWN) {
            println!("   [{}] {}: {}", error.kind, error.path.display(), error.message);
        }
        let remaining = result.errors.len().saturating_sub(ERRORS_SHOWN);
        if remaining > 0 {
            println!("   ... and {} more", remaining);
        }
        println!();
    }

    let recommendations = result.recommendations();
    if !recommendations.is_empty() {
        println!(" Recommendations:");
        for recommendation in recommendations {
            println!("   - {}", recommendation);
        }
        println!();
    }
}

fn print_duplicates(result: &AnalysisResult, top_n: usize) {
    if result.duplicates.is_empty() {
        println!(" No duplicate files found.");
        println!();
        return;
    }

    println!(
        " Duplicates: {} groups ({} files), {} reclaimable",
        result.duplicates.len(),
        result.duplicate_file_count(),
        format_size(result.reclaimable_bytes())
    );
    println!();

    for (i, group) in result.duplicates.iter().take(top_n).enumerate() {
        println!(
            " Group {} ({} files, {} each, {} reclaimable)",
            i + 1,
            group.count,
            format_size(group.size),
            format_size(group.reclaimable_bytes())
        );
        for path in group.paths.iter().take(PATHS_PER_GROUP) {
            println!("   {}", path.display());
        }
        let hidden = group.count.saturating_sub(PATHS_PER_GROUP);
        if hidden > 0 {
            println!("   ... and {} more", hidden);
        }
    }

    let remaining = result.duplicates.len().saturating_sub(top_n);
    if remaining > 0 {
        println!(" ... and {} more groups", remaining);
    }
    println!();
}

/// Create a simple ASCII bar.
fn make_bar(ratio: f64, width: usize) -> String {
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(empty))
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}

fn format_time(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Truncate a string to at most `max_chars` characters.
fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_bar() {
        assert_eq!(make_bar(0.5, 4), "[██░░]");
        assert_eq!(make_bar(0.0, 2), "[░░]");
        assert_eq!(make_bar(1.0, 2), "[██]");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 3), "éé…");
    }

    #[test]
    fn test_mode_arg_maps_to_mode() {
        assert_eq!(AnalysisMode::from(ModeArg::Quick), AnalysisMode::Quick);
        assert_eq!(AnalysisMode::from(ModeArg::Deep), AnalysisMode::Deep);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from(["dirscope", "/tmp", "--mode", "detailed", "-n", "5", "-q"]);
        assert_eq!(cli.path, PathBuf::from("/tmp"));
        assert!(matches!(cli.mode, ModeArg::Detailed));
        assert_eq!(cli.top, 5);
        assert!(cli.quiet);
        assert!(cli.output.is_none());
    }
}
