//! Command-line surface.
//!
//! Grounded on the teacher's `clap::Parser` derive usage in the legacy
//! `main.rs`/`cli/args.rs` (one flat struct, `ValueEnum` for closed choices,
//! a styled help renderer), pared down to the flags this analyzer actually
//! takes (target, `--exclude`, report flags, py2/skip-errors, verbosity).

use std::path::PathBuf;

use clap::Parser;
use clap::ValueEnum;
use clap::builder::Styles;
use clap::builder::styling::AnsiColor;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Yellow.on_default())
        .usage(AnsiColor::Yellow.on_default())
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Cyan.on_default())
}

/// How much warning/diagnostic output to emit. Maps onto a `tracing` filter
/// in [`crate::logging::init`]; `RUST_LOG` overrides this when set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "lower")]
pub enum ScanVerbosity {
    /// Suppress warnings; only fatal errors are printed.
    Quiet,
    /// Warnings and errors (default).
    #[default]
    Normal,
    /// Full diagnostic output, including parser and resolution notices.
    Verbose,
}

/// Detect insecure deserialization flows in a Python codebase.
#[derive(Debug, Parser)]
#[command(name = "deserial-inspector", version, about, styles = styles())]
pub struct Cli {
    /// Directory or Python file to scan.
    pub target: PathBuf,

    /// Substring to exclude from scanning; may be repeated.
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Write an HTML report to ./reports.
    #[arg(long)]
    pub html: bool,

    /// Write a JSON report to ./reports.
    #[arg(long)]
    pub json: bool,

    /// Enable Python 2 to 3 conversion (via lib2to3) for legacy files.
    #[arg(long = "py2-support")]
    pub py2_support: bool,

    /// Continue scanning when a file fails to parse, instead of aborting.
    #[arg(long = "skip-errors")]
    pub skip_errors: bool,

    /// Print the full trace for every finding.
    #[arg(long)]
    pub verbose: bool,

    /// Control warning output.
    #[arg(long = "scan-verbosity", value_enum, default_value_t = ScanVerbosity::Normal)]
    pub scan_verbosity: ScanVerbosity,
}
