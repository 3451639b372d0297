//! HTML report sink, grounded on `report.py::export_html_report` /
//! `generate_html_content`. Kept as a single hand-assembled template to
//! match the original's structure rather than pulling in a templating
//! crate the teacher's stack doesn't otherwise need.

use std::path::{Path, PathBuf};

use crate::error::{AnalyzerError, Result};

use super::{Finding, Risk, sanitize_filename};

fn risk_color(risk: Risk) -> &'static str {
    match risk {
        Risk::High => "#dc3545",
        Risk::Medium => "#fd7e14",
        Risk::Low => "#0d6efd",
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn count(findings: &[Finding], risk: Risk) -> usize {
    findings.iter().filter(|f| f.risk == risk).count()
}

/// Write the HTML report to `reports_dir/{sanitized_name}_{timestamp}.html`
/// and return the path written.
pub fn export(
    findings: &[Finding],
    project_name: &str,
    reports_dir: &Path,
    timestamp: &str,
) -> Result<PathBuf> {
    let project_name = sanitize_filename(project_name);
    std::fs::create_dir_all(reports_dir).map_err(|source| AnalyzerError::ReportIoError {
        path: reports_dir.to_path_buf(),
        source,
    })?;

    let filename = format!("{project_name}_{timestamp}.html");
    let output_file = reports_dir.join(filename);
    let body = generate_html(findings, &project_name, timestamp);
    std::fs::write(&output_file, body).map_err(|source| AnalyzerError::ReportIoError {
        path: output_file.clone(),
        source,
    })?;
    println!("[+] HTML report written to {}", output_file.display());
    Ok(output_file)
}

fn generate_html(findings: &[Finding], project_name: &str, timestamp: &str) -> String {
    let mut html = format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>Deserial Inspector Report - {project_name}</title>
<style>
body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; margin: 0; padding: 20px; background-color: #f8f9fa; color: #333; }}
.container {{ max-width: 1200px; margin: 0 auto; background-color: white; border-radius: 8px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); overflow: hidden; }}
.header {{ background: linear-gradient(135deg, #667eea 0%, #764ba2 100%); color: white; padding: 30px; text-align: center; }}
.summary {{ padding: 20px; background-color: #f8f9fa; border-bottom: 1px solid #dee2e6; }}
.summary-grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin-top: 15px; }}
.summary-card {{ background: white; padding: 20px; border-radius: 6px; text-align: center; box-shadow: 0 2px 4px rgba(0,0,0,0.1); }}
.summary-card .number {{ font-size: 2em; font-weight: bold; margin-bottom: 5px; }}
.findings-section {{ padding: 20px; }}
.finding {{ background: white; border: 1px solid #dee2e6; border-radius: 6px; margin-bottom: 20px; overflow: hidden; }}
.finding-header {{ padding: 15px 20px; border-bottom: 1px solid #dee2e6; display: flex; justify-content: space-between; align-items: center; }}
.risk-badge {{ padding: 5px 12px; border-radius: 20px; color: white; font-weight: bold; }}
.finding-details {{ padding: 20px; }}
.detail-row {{ display: grid; grid-template-columns: 120px 1fr; gap: 15px; margin-bottom: 15px; }}
.detail-label {{ font-weight: bold; color: #495057; text-transform: uppercase; font-size: 0.8em; }}
.flow-text, .file-path {{ font-family: 'Courier New', monospace; background-color: #f8f9fa; padding: 8px 12px; border-radius: 4px; white-space: pre-wrap; }}
.no-findings {{ text-align: center; padding: 40px; color: #6c757d; }}
</style>
</head>
<body>
<div class="container">
<div class="header"><h1>Deserial Inspector Report</h1><div>Insecure Deserialization Analysis — generated {timestamp}</div></div>
<div class="summary"><h2>Scan Summary</h2><div class="summary-grid">
<div class="summary-card"><div class="number">{total}</div><div class="label">Total Findings</div></div>
"#,
        project_name = escape(project_name),
        timestamp = escape(timestamp),
        total = findings.len(),
    );

    for risk in [Risk::High, Risk::Medium, Risk::Low] {
        html.push_str(&format!(
            r#"<div class="summary-card"><div class="number" style="color: {color};">{n}</div><div class="label">{label} Risk</div></div>
"#,
            color = risk_color(risk),
            n = count(findings, risk),
            label = risk.as_str(),
        ));
    }

    html.push_str("</div></div><div class=\"findings-section\"><h2>Detailed Findings</h2>\n");

    if findings.is_empty() {
        html.push_str(
            "<div class=\"no-findings\"><h3>No Vulnerabilities Found</h3><p>No insecure deserialization vulnerabilities were detected in the scanned code.</p></div>\n",
        );
    } else {
        for (i, f) in findings.iter().enumerate() {
            let context = f.context_label().unwrap_or_else(|| "N/A".to_string());
            html.push_str(&format!(
                r#"<div class="finding">
<div class="finding-header"><h3>Finding #{n}</h3><span class="risk-badge" style="background-color: {color};">{risk}</span></div>
<div class="finding-details">
<div class="detail-row"><div class="detail-label">File</div><div class="detail-value"><div class="file-path">{file}:{line}</div></div></div>
<div class="detail-row"><div class="detail-label">Context</div><div class="detail-value">{context}</div></div>
<div class="detail-row"><div class="detail-label">Source</div><div class="detail-value">{source}</div></div>
<div class="detail-row"><div class="detail-label">Flow</div><div class="detail-value"><div class="flow-text">{flow}</div></div></div>
<div class="detail-row"><div class="detail-label">Sink</div><div class="detail-value">{sink}</div></div>
</div></div>
"#,
                n = i + 1,
                color = risk_color(f.risk),
                risk = f.risk.as_str(),
                file = escape(&f.file.display().to_string()),
                line = f.line,
                context = escape(&context),
                source = escape(&f.initial_source),
                flow = escape(&f.enhanced_flow()),
                sink = escape(&f.sink),
            ));
        }
    }

    html.push_str(&format!(
        "</div><div class=\"footer\">Generated by Deserial Inspector | {project_name} | {timestamp}</div></div></body></html>\n",
        project_name = escape(project_name),
        timestamp = escape(timestamp),
    ));

    html
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn empty_findings_render_no_vulnerabilities_banner() {
        let html = generate_html(&[], "demo", "20260727_000000");
        assert!(html.contains("No Vulnerabilities Found"));
    }

    #[test]
    fn escapes_untrusted_strings_in_output() {
        let f = Finding {
            sink: "pickle.load".into(),
            initial_source: "<script>alert(1)</script>".into(),
            flow: "x".into(),
            file: PathBuf::from("a.py"),
            line: 1,
            risk: Risk::High,
            context: None,
        };
        let html = generate_html(&[f], "demo", "t");
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }
}
