//! CLI module: argument parsing and file discovery.

pub mod args;
pub mod discover;

pub use args::{Cli, ScanVerbosity};
pub use discover::discover_python_files;
