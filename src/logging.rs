//! Unified logging for debug output.
//!
//! Provides compact timestamped logging whose verbosity is driven by the
//! `--scan-verbosity` CLI flag, with the `RUST_LOG` environment variable
//! taking precedence for ad-hoc debugging.
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over `--scan-verbosity`:
//! ```bash
//! RUST_LOG=debug deserial-inspector ./app
//! RUST_LOG=tracer=trace deserial-inspector ./app
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::cli::args::ScanVerbosity;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Map the CLI's `--scan-verbosity` flag onto a default tracing filter.
///
/// `quiet` suppresses warnings as well as errors surfaced through the error
/// log (§4.2); `normal` shows warnings and errors but the AST loader itself
/// filters out the "invalid escape sequence" class; `verbose` shows
/// everything down to `debug`.
fn default_filter_for(verbosity: ScanVerbosity) -> &'static str {
    match verbosity {
        ScanVerbosity::Quiet => "error",
        ScanVerbosity::Normal => "warn",
        ScanVerbosity::Verbose => "debug",
    }
}

/// Initialize logging for the given scan verbosity.
///
/// Call once at startup. Safe to call multiple times (only first call takes effect).
///
/// The `RUST_LOG` environment variable takes precedence over the verbosity flag.
pub fn init(verbosity: ScanVerbosity) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(default_filter_for(verbosity))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}
