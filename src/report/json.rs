//! JSON report sink, grounded on `report.py::export_json_report`.

use std::collections::HashMap;
use std::path::Path;

use serde::Serialize;

use crate::context::Context;
use crate::error::{AnalyzerError, Result};

use super::Finding;

#[derive(Serialize)]
struct ScanInfo {
    total_findings: usize,
    risk_summary: HashMap<String, usize>,
    generated_at: String,
}

#[derive(Serialize)]
struct ContextInfo {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_name: Option<String>,
}

#[derive(Serialize)]
struct FindingDoc {
    file: String,
    line: usize,
    sink: String,
    initial_source: String,
    flow: String,
    risk: String,
    context: Option<ContextInfo>,
}

#[derive(Serialize)]
struct ReportDoc {
    scan_info: ScanInfo,
    findings: Vec<FindingDoc>,
}

fn context_info(context: &Option<Context>) -> Option<ContextInfo> {
    match context {
        Some(Context::HttpEndpoint { route, methods }) => Some(ContextInfo {
            kind: "http".into(),
            endpoint: Some(route.clone()),
            method: Some(methods.clone().unwrap_or_else(|| "GET".into())),
            function_name: None,
        }),
        Some(Context::FileOperation { function_name }) => Some(ContextInfo {
            kind: "file_operation".into(),
            endpoint: None,
            method: None,
            function_name: Some(function_name.clone()),
        }),
        Some(Context::TaskExecution { function_name }) => Some(ContextInfo {
            kind: "task_execution".into(),
            endpoint: None,
            method: None,
            function_name: Some(function_name.clone()),
        }),
        None => None,
    }
}

/// Serialize `findings` to `output_file`, creating any parent directory.
/// `generated_at` is passed in rather than computed here, since the
/// workflow/test harness must not call `chrono::Local::now()` from a
/// non-deterministic context at the wrong layer.
pub fn export(findings: &[Finding], output_file: &Path, generated_at: &str) -> Result<()> {
    let mut risk_summary: HashMap<String, usize> = HashMap::new();
    for f in findings {
        *risk_summary.entry(f.risk.as_str().to_string()).or_insert(0) += 1;
    }

    let doc = ReportDoc {
        scan_info: ScanInfo {
            total_findings: findings.len(),
            risk_summary,
            generated_at: generated_at.to_string(),
        },
        findings: findings
            .iter()
            .map(|f| FindingDoc {
                file: f.file.display().to_string(),
                line: f.line,
                sink: f.sink.clone(),
                initial_source: f.initial_source.clone(),
                flow: f.enhanced_flow(),
                risk: f.risk.as_str().to_string(),
                context: context_info(&f.context),
            })
            .collect(),
    };

    if let Some(parent) = output_file.parent() {
        std::fs::create_dir_all(parent).map_err(|source| AnalyzerError::ReportIoError {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let body = serde_json::to_string_pretty(&doc).map_err(|e| AnalyzerError::InternalTraceError {
        reason: format!("failed to serialize JSON report: {e}"),
    })?;
    std::fs::write(output_file, body).map_err(|source| AnalyzerError::ReportIoError {
        path: output_file.to_path_buf(),
        source,
    })?;
    println!("[+] JSON report written to {}", output_file.display());
    Ok(())
}
