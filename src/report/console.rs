//! Console report sink: a colorized table of findings plus a risk summary,
//! adapted from `report.py::print_console_report`/`print_summary_with_colors`
//! onto `comfy-table` and `console` in place of `rich`.

use std::collections::HashMap;

use comfy_table::{Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL};
use console::{Style, style};

use super::{Finding, Risk};

/// Whether stdout is an interactive terminal — drives the §10.5 rule that
/// the progress display is suppressed when piping to a file or CI log.
pub fn is_tty() -> bool {
    console::Term::stdout().is_term()
}

fn risk_color(risk: Risk) -> Color {
    match risk {
        Risk::High => Color::Red,
        Risk::Medium => Color::DarkYellow,
        Risk::Low => Color::Blue,
    }
}

fn risk_style(risk: Risk) -> Style {
    Style::new().bold().fg(match risk {
        Risk::High => console::Color::Red,
        Risk::Medium => console::Color::Color256(208),
        Risk::Low => console::Color::Blue,
    })
}

/// Print the findings table, or a single "no findings" line when empty.
pub fn print_report(findings: &[Finding]) {
    if findings.is_empty() {
        println!("[+] No insecure deserialization flows detected.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Risk", "File", "Line", "Context", "Source", "Flow", "Sink"]);

    for f in findings {
        table.add_row(vec![
            Cell::new(f.risk.as_str()).fg(risk_color(f.risk)),
            Cell::new(f.file.display()),
            Cell::new(f.line).set_alignment(CellAlignment::Right),
            Cell::new(f.context_label().unwrap_or_default()),
            Cell::new(&f.initial_source),
            Cell::new(f.enhanced_flow()),
            Cell::new(&f.sink).fg(Color::Red),
        ]);
    }

    println!("{table}");
}

/// Print one fully-detailed block per finding (`--verbose`), matching
/// `report.py::print_verbose_findings`.
pub fn print_verbose(findings: &[Finding]) {
    for f in findings {
        println!("{}", style("[!] Insecure deserialization detected").bold().yellow());
        println!("  Risk    : {}", risk_style(f.risk).apply_to(f.risk.as_str()));
        println!("  File    : {}:{}", f.file.display(), f.line);
        if let Some(label) = f.context_label() {
            println!("  Context : {label}");
        }
        println!("  Source  : {}", f.initial_source);
        println!("  Flow    : {}", f.enhanced_flow());
        println!("  Sink    : {}", f.sink);
        println!();
    }
}

/// Print the total-findings and per-risk-level summary block.
pub fn print_summary(findings: &[Finding]) {
    let mut counts: HashMap<Risk, usize> = HashMap::new();
    for f in findings {
        *counts.entry(f.risk).or_insert(0) += 1;
    }

    println!("\n[!] Total Findings: {}", findings.len());
    println!("\n{}", "-".repeat(60));
    println!("[!] Risk Summary:");
    for risk in [Risk::High, Risk::Medium, Risk::Low] {
        if let Some(count) = counts.get(&risk) {
            println!("    {}: {count}", risk_style(risk).apply_to(risk.as_str()));
        }
    }
    println!("{}", "-".repeat(60));
}

/// `"[✓] Scan completed in {elapsed}."`, elapsed already formatted by
/// [`crate::format_elapsed`].
pub fn print_elapsed(elapsed_text: &str) {
    println!("\n[\u{2713}] Scan completed in {elapsed_text}.");
}
