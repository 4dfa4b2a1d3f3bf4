//! selectzip - Add or update files selected by extension in a ZIP archive
//!
//! Usage:
//!   selectzip <RootDir> <Extensions> <ZipFileName>
//!
//! Examples:
//!   selectzip "C:\Data" "txt;cpp" "C:\Backup\data.zip"
//!   selectzip . "txt;cpp" .          - executable directory into <dir name>.zip

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use selectzip::{
    format_size, update_archive, CompressionMethod, Error, RunConfig, RunObserver, SessionOptions,
    StageOutcome, WalkOptions,
};

#[derive(Parser)]
#[command(name = "selectzip")]
#[command(version)]
#[command(about = "Add or update files selected by extension in a ZIP archive", long_about = None)]
#[command(after_help = "Examples:\n  \
  selectzip \"C:\\Data\" \"txt;cpp\" \"C:\\Backup\\data.zip\"\n\n\
If <ROOT_DIR> is . then the executable's directory is used.\n\
If <ZIP_FILE> is . then <root directory name>.zip inside the root is used.")]
struct Cli {
    /// Directory to collect files from
    root_dir: String,

    /// Extensions to include, separated by ';' (e.g. "txt;cpp")
    extensions: String,

    /// Output ZIP file; a bare file name is placed inside the root
    zip_file: String,

    /// Compression method for added and updated entries
    #[arg(short, long, value_enum, default_value = "deflate")]
    compression: Compression,

    /// Deflate compression level (1-9)
    #[arg(short, long, default_value = "6", value_parser = clap::value_parser!(u32).range(1..=9))]
    level: u32,

    /// Descend into symlinked directories
    #[arg(long)]
    follow_links: bool,

    /// Show debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Compression {
    Store,
    Deflate,
}

impl From<Compression> for CompressionMethod {
    fn from(c: Compression) -> Self {
        match c {
            Compression::Store => CompressionMethod::Store,
            Compression::Deflate => CompressionMethod::Deflate,
        }
    }
}

/// Drives the spinner and prints per-file results
struct ConsoleObserver {
    pb: ProgressBar,
    quiet: bool,
}

impl ConsoleObserver {
    fn print(&self, line: String) {
        // A hidden bar (no terminal) swallows println
        if self.pb.is_hidden() {
            println!("{}", line);
        } else {
            self.pb.println(line);
        }
    }

    fn print_error(&self, line: String) {
        if self.pb.is_hidden() {
            eprintln!("{}", line);
        } else {
            self.pb.println(line);
        }
    }
}

impl RunObserver for ConsoleObserver {
    fn on_file(&mut self, entry_name: &str, _path: &Path) {
        self.pb.set_message(entry_name.to_string());
    }

    fn on_staged(&mut self, entry_name: &str, outcome: StageOutcome) {
        if !self.quiet {
            self.print(format!("Processing: {}  -> [{}]", entry_name, outcome));
        }
        self.pb.inc(1);
    }

    fn on_file_error(&mut self, path: &Path, error: &Error) {
        self.print_error(format!("  [Error] {} ({})", error, path.display()));
    }

    fn on_walk_error(&mut self, error: &Error) {
        self.print_error(format!("  [Error] {}", error));
    }

    fn on_finalize(&mut self, _archive: &Path) {
        self.pb
            .set_message("Finalizing archive (this may take a moment)...");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli);

    let exe_dir = executable_dir()?;
    let config = RunConfig::resolve(&cli.root_dir, &cli.extensions, &cli.zip_file, &exe_dir)
        .with_session_options(SessionOptions {
            compression: cli.compression.into(),
            compression_level: cli.level,
        })
        .with_walk_options(WalkOptions {
            follow_links: cli.follow_links,
        });

    if !cli.quiet {
        println!("========================================");
        println!("Root Directory   : {}", config.root.display());
        println!("Target Extensions: {}", config.extensions);
        println!("Output Zip File  : {}", config.archive.display());
        println!("========================================");
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template(
        "{spinner:.green} [{elapsed_precise}] {pos} files {msg}",
    )?);
    pb.enable_steady_tick(Duration::from_millis(100));

    let mut observer = ConsoleObserver {
        pb: pb.clone(),
        quiet: cli.quiet,
    };
    let result = update_archive(&config, &mut observer);
    pb.finish_and_clear();

    let report = result.with_context(|| format!("Failed to update {}", config.archive.display()))?;

    if !cli.quiet {
        println!();
        if report.commit.written {
            println!(
                "Archive: {} entries, {}",
                report.commit.entries_total,
                format_size(report.commit.archive_size)
            );
        }
        println!(
            "Done! Total {} files processed ({} added, {} updated).",
            report.processed, report.added, report.replaced
        );
    }
    if !report.failed.is_empty() {
        eprintln!("Failed: {} files", report.failed.len());
    }
    if report.walk_errors > 0 {
        eprintln!("Unreadable: {} paths", report.walk_errors);
    }

    Ok(())
}

fn init_tracing(cli: &Cli) {
    // The observer and the returned error already reach the console
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::OFF
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Directory containing the running executable
fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Cannot determine executable path")?;
    Ok(exe
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(".")))
}
