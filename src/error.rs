//! Error types for the deserialization analyzer.
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the analysis pipeline.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Access to '{path}' is not allowed (outside of root directory '{root}')")]
    PathEscape { path: PathBuf, root: PathBuf },

    #[error("Failed to parse '{path}': {reason}")]
    ParseFailure { path: PathBuf, reason: String },

    #[error("Python 2 syntax detected in {path}. Use --py2-support to scan it.")]
    UnsupportedDialect { path: PathBuf },

    #[error("Failed to upgrade legacy dialect for '{path}': {reason}")]
    UpgradeFailure { path: PathBuf, reason: String },

    #[error("Internal error while tracing provenance: {reason}")]
    InternalTraceError { reason: String },

    #[error("No eligible files found under '{target}'")]
    Discovery { target: PathBuf },

    #[error("Failed to write report to '{path}': {source}")]
    ReportIoError {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl AnalyzerError {
    /// Get recovery suggestions for this error, printed alongside the message.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::UnsupportedDialect { .. } => vec![
                "Re-run with --py2-support to enable the legacy print-statement upgrade",
                "Or re-run with --skip-errors to skip this file and continue",
            ],
            Self::ParseFailure { .. } => vec![
                "Re-run with --skip-errors to skip this file and continue",
                "Check the file for syntax errors with a Python interpreter",
            ],
            Self::UpgradeFailure { .. } => vec!["Check that python3 and lib2to3 are installed"],
            Self::ReportIoError { .. } => vec![
                "Check that the 'reports/' directory is writable",
                "Check available disk space",
            ],
            _ => vec![],
        }
    }
}

/// Result type alias for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
