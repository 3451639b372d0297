//! The finding model and its report sinks (console, JSON, HTML).
//!
//! Grounded on `analyzer.py::Finding` and `report.py`'s three output
//! functions, adapted to the teacher's `comfy-table`/`console`/`serde_json`
//! stack in place of `rich`.

pub mod console;
pub mod html;
pub mod json;

use std::path::PathBuf;

use crate::context::Context;

/// Risk level, in descending severity order for `Ord`/sorting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Risk {
    High,
    Medium,
    Low,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::High => "HIGH",
            Risk::Medium => "MEDIUM",
            Risk::Low => "LOW",
        }
    }

    /// Sort rank matching the original's `{"HIGH": 0, "MEDIUM": 1, "LOW": 2}`.
    fn rank(&self) -> u8 {
        match self {
            Risk::High => 0,
            Risk::Medium => 1,
            Risk::Low => 2,
        }
    }
}

/// One confirmed (or best-effort) insecure-deserialization flow.
#[derive(Debug, Clone)]
pub struct Finding {
    pub sink: String,
    pub initial_source: String,
    pub flow: String,
    pub file: PathBuf,
    pub line: usize,
    pub risk: Risk,
    pub context: Option<Context>,
}

impl Finding {
    /// `"HTTP <method> <route> → "` / `"<kind> (<fn>) → "` prepended to the
    /// flow when applicable, per §4.6/§4.7's context-enrichment rule.
    pub fn enhanced_flow(&self) -> String {
        match &self.context {
            Some(Context::HttpEndpoint { route, methods }) if self.flow.contains("request.") => {
                let method = methods.clone().unwrap_or_else(|| "GET".to_string());
                format!("HTTP {method} {route} \u{2192} {}", self.flow)
            }
            Some(Context::FileOperation { function_name }) => {
                format!("File Operation ({function_name}) \u{2192} {}", self.flow)
            }
            Some(Context::TaskExecution { function_name }) => {
                format!("Task Execution ({function_name}) \u{2192} {}", self.flow)
            }
            _ => self.flow.clone(),
        }
    }

    /// Short human label for the context column, e.g. `"POST /upload"` or
    /// `"File Op: save_model"`.
    pub fn context_label(&self) -> Option<String> {
        match &self.context {
            Some(Context::HttpEndpoint { route, methods }) => {
                let method = methods.clone().unwrap_or_else(|| "GET".to_string());
                Some(format!("{method} {route}"))
            }
            Some(Context::FileOperation { function_name }) => {
                Some(format!("File Op: {function_name}"))
            }
            Some(Context::TaskExecution { function_name }) => {
                Some(format!("Task: {function_name}"))
            }
            None => None,
        }
    }
}

/// Safely reduce a candidate project name to a single path component,
/// grounded on `utils.py::sanitize_filename`'s use of `pathlib.Path.name`
/// to strip any directory traversal.
pub fn sanitize_filename(name: &str) -> String {
    if name.is_empty() {
        return "unnamed".to_string();
    }
    let component = PathBuf::from(name)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let truncated: String = component.chars().take(100).collect();
    if truncated.is_empty() {
        "unnamed".to_string()
    } else {
        truncated
    }
}

/// Sort findings by `(risk, filename, line)`, matching the original's
/// `findings.sort(key=lambda f: (RISK_LEVELS[f.risk], f.filename, f.lineno))`.
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.risk
            .rank()
            .cmp(&b.risk.rank())
            .then_with(|| a.file.cmp(&b.file))
            .then_with(|| a.line.cmp(&b.line))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(risk: Risk, file: &str, line: usize) -> Finding {
        Finding {
            sink: "pickle.load".into(),
            initial_source: "x".into(),
            flow: "x".into(),
            file: PathBuf::from(file),
            line,
            risk,
            context: None,
        }
    }

    #[test]
    fn sorts_by_risk_then_file_then_line() {
        let mut findings = vec![
            finding(Risk::Low, "b.py", 1),
            finding(Risk::High, "a.py", 10),
            finding(Risk::High, "a.py", 2),
            finding(Risk::Medium, "a.py", 1),
        ];
        sort_findings(&mut findings);
        let order: Vec<(&str, usize)> = findings
            .iter()
            .map(|f| (f.risk.as_str(), f.line))
            .collect();
        assert_eq!(
            order,
            vec![("HIGH", 2), ("HIGH", 10), ("MEDIUM", 1), ("LOW", 1)]
        );
    }

    #[test]
    fn sanitize_strips_directory_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(""), "unnamed");
    }

    #[test]
    fn enhanced_flow_prepends_http_context() {
        let mut f = finding(Risk::High, "a.py", 1);
        f.flow = "request.form['x']".into();
        f.context = Some(Context::HttpEndpoint {
            route: "/upload".into(),
            methods: Some("POST".into()),
        });
        assert_eq!(f.enhanced_flow(), "HTTP POST /upload \u{2192} request.form['x']");
    }
}
