//! Entry point: parse arguments, discover files, index the project, trace
//! findings, and hand them to the requested report sinks.
//!
//! Grounded on `cli.py::main`'s discover -> index -> analyze -> report
//! pipeline, adapted onto `clap::Parser` for the driver binary.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Parser;
use deserial_inspector::cli::{Cli, ScanVerbosity, discover_python_files};
use deserial_inspector::indexing::{ErrorPolicy, build_project_index};
use deserial_inspector::report::{console, html, json, sanitize_filename, sort_findings};
use deserial_inspector::{format_elapsed, logging, tracer};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.scan_verbosity);

    match run(&cli) {
        Ok(()) => {}
        Err(err) => {
            eprintln!("[!] {err}");
            for suggestion in err.recovery_suggestions() {
                eprintln!("    {suggestion}");
            }
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> deserial_inspector::Result<()> {
    let start = Instant::now();

    let files = discover_python_files(&cli.target, &cli.exclude);
    if files.is_empty() {
        println!("[!] No Python files found in the target.");
        return Ok(());
    }

    let root = scan_root(&cli.target);
    let error_policy = if cli.skip_errors {
        ErrorPolicy::Skip
    } else {
        ErrorPolicy::Fatal
    };

    let project_index = build_project_index(
        &files,
        &root,
        cli.py2_support,
        error_policy,
        cli.scan_verbosity,
    )?;

    let progress = progress_bar(project_index.files.len(), cli.scan_verbosity);
    let mut findings = Vec::new();
    for file_index in project_index.files.values() {
        findings.extend(tracer::analyze_file(file_index, &project_index));
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    sort_findings(&mut findings);

    if cli.verbose {
        console::print_verbose(&findings);
    }
    console::print_report(&findings);
    console::print_summary(&findings);

    if cli.html || cli.json {
        write_reports(cli, &findings)?;
    }

    console::print_elapsed(&format_elapsed(start.elapsed().as_secs_f64()));
    Ok(())
}

fn scan_root(target: &std::path::Path) -> PathBuf {
    if target.is_dir() {
        target.to_path_buf()
    } else {
        target.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."))
    }
}

fn write_reports(cli: &Cli, findings: &[deserial_inspector::Finding]) -> deserial_inspector::Result<()> {
    let project_name = cli
        .target
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scan".to_string());
    let project_name = sanitize_filename(&project_name);
    let reports_dir = PathBuf::from("reports");
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();

    if cli.html {
        html::export(findings, &project_name, &reports_dir, &timestamp)?;
    }
    if cli.json {
        let output_file = reports_dir.join(format!("{project_name}_{timestamp}.json"));
        let generated_at = chrono::Local::now().to_rfc3339();
        json::export(findings, &output_file, &generated_at)?;
    }
    Ok(())
}

fn progress_bar(total: usize, verbosity: ScanVerbosity) -> Option<indicatif::ProgressBar> {
    if verbosity == ScanVerbosity::Quiet || !console::is_tty() {
        return None;
    }
    let bar = indicatif::ProgressBar::new(total as u64);
    bar.set_style(
        indicatif::ProgressStyle::with_template("{msg} [{bar:40}] {pos}/{len}")
            .unwrap()
            .progress_chars("=> "),
    );
    bar.set_message("Scanning");
    Some(bar)
}
