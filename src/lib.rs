//! Static analysis library for detecting insecure deserialization flows in
//! Python codebases: discovery, AST lowering, cross-file indexing, name
//! resolution, taint tracing, context detection, and report generation.

pub mod ast;
pub mod catalog;
pub mod cli;
pub mod context;
pub mod error;
pub mod indexing;
pub mod logging;
pub mod report;
pub mod resolve;
pub mod tracer;

pub use error::{AnalyzerError, Result};
pub use report::Finding;

/// `"{seconds:.2} seconds"` below a minute, `"{m} minute(s), {s:.2} seconds"`
/// at or above it. Grounded on `analyzer.py::format_elapsed`.
pub fn format_elapsed(seconds: f64) -> String {
    if seconds < 60.0 {
        return format!("{seconds:.2} seconds");
    }
    let minutes = (seconds / 60.0) as u64;
    let remaining = seconds % 60.0;
    let plural = if minutes > 1 { "s" } else { "" };
    format!("{minutes} minute{plural}, {remaining:.2} seconds")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_sub_minute_elapsed() {
        assert_eq!(format_elapsed(12.3), "12.30 seconds");
    }

    #[test]
    fn formats_multi_minute_elapsed() {
        assert_eq!(format_elapsed(125.0), "2 minutes, 5.00 seconds");
    }

    #[test]
    fn formats_single_minute_without_plural() {
        assert_eq!(format_elapsed(61.0), "1 minute, 1.00 seconds");
    }
}
