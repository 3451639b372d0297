//! Provenance tracing: given an expression passed as the first argument to a
//! deserialization sink, recursively classify where its value came from.
//!
//! This is a near-literal port of `analyzer.py::SinkVisitor.trace_source`.
//! Where the original's open/`os.path.join` handling duplicated the `open`
//! branch under two different conditions that amount to the same check
//! (since `"open"` is itself a registered source), this version keeps a
//! single `open` rule.

use crate::ast::{Constant, Expr, SubKey};
use crate::catalog;
use crate::indexing::{FileIndex, ProjectIndex};
use crate::report::Risk;
use crate::resolve::resolve_function_call;

const MAX_DEPTH: usize = 5;

/// `(initial_source, full_flow_description, risk)`.
pub type Trace = (String, String, Risk);

pub struct TraceCtx<'a> {
    pub tainted_files: &'a std::collections::HashSet<String>,
    pub file_index: &'a FileIndex,
    pub project_index: &'a ProjectIndex,
}

fn unknown() -> Trace {
    ("unknown source".to_string(), "unknown source".to_string(), Risk::Medium)
}

/// Entry point: trace the origin of `expr` (`None` when a sink call was
/// given no arguments).
pub fn trace_source(expr: Option<&Expr>, depth: usize, ctx: &TraceCtx) -> Trace {
    if depth > MAX_DEPTH {
        return (
            "unknown".to_string(),
            "unknown (recursion limit)".to_string(),
            Risk::Medium,
        );
    }
    let Some(expr) = expr else {
        return unknown();
    };

    match expr {
        Expr::Name { name, .. } => trace_name(name, depth, ctx),
        Expr::Call { func, args, keywords, .. } => trace_call(func, args, keywords, depth, ctx),
        Expr::Constant { value, .. } => trace_constant(value),
        Expr::Attribute { .. } => trace_attribute(expr),
        Expr::Subscript { value, key, .. } => trace_subscript(value, key, depth, ctx),
        Expr::BinOpAdd { left, right, .. } => trace_binop_add(left, right, depth, ctx),
        Expr::List { .. } | Expr::Other { .. } => unknown(),
    }
}

fn is_request_files_subscript(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Subscript { value, .. }
            if matches!(
                value.as_ref(),
                Expr::Attribute { value, attr, .. }
                    if attr == "files" && matches!(value.as_ref(), Expr::Name { name, .. } if name == "request")
            )
    )
}

fn trace_name(name: &str, depth: usize, ctx: &TraceCtx) -> Trace {
    if ctx.tainted_files.contains(name) {
        let desc = format!("{name} (tainted from file upload)");
        return (desc.clone(), desc, Risk::High);
    }

    if let Some((value, line)) = ctx.file_index.find_assignment(name) {
        if is_request_files_subscript(value) {
            let desc = format!("{name} (direct stream from request.files)");
            return (desc.clone(), desc, Risk::High);
        }
        let (initial, flow, risk) = trace_source(Some(value), depth + 1, ctx);
        let full_flow = format!("{name} (assigned at line {line}) \u{2192} {flow}");
        return (initial, full_flow, risk);
    }

    let desc = format!("{name} (unresolved)");
    (desc.clone(), desc, Risk::Medium)
}

fn trace_call(func: &Expr, args: &[Expr], _keywords: &[(String, Expr)], depth: usize, ctx: &TraceCtx) -> Trace {
    let (func_name, func_info) = resolve_function_call(func, ctx.file_index, ctx.project_index);

    if func_name == "open" {
        let (initial, flow, risk) = trace_source(args.first(), depth + 1, ctx);
        return (initial, format!("open({flow})"), risk);
    }

    if catalog::match_source(&func_name) {
        let desc = format!("{func_name} (call)");
        return (desc.clone(), desc, Risk::High);
    }

    if func_name.ends_with("os.path.join") && !args.is_empty() {
        let mut labels = Vec::new();
        let mut all_safe = true;
        for arg in args {
            let (_, flow, _) = trace_source(Some(arg), depth + 1, ctx);
            if flow.contains("unknown") || flow.contains("input") || flow.contains("tainted") {
                all_safe = false;
            }
            labels.push(flow);
        }
        let joined = format!("os.path.join({})", labels.join(", "));
        let risk = if all_safe { Risk::Low } else { Risk::High };
        return (joined.clone(), joined, risk);
    }

    if let Some(func_info) = func_info {
        if let Some(ret_value) = func_info.single_return_value() {
            return trace_source(Some(ret_value), depth + 1, ctx);
        }
    }

    unknown()
}

fn trace_constant(value: &Constant) -> Trace {
    match value {
        Constant::Str(s) => {
            let lower = s.to_lowercase();
            if lower.contains("pickle") || lower.contains("pkl") {
                (
                    format!("pickle file: '{s}'"),
                    format!("'{s}' (pickle file)"),
                    Risk::High,
                )
            } else {
                (format!("file: '{s}'"), format!("'{s}'"), Risk::Medium)
            }
        }
        Constant::Other => ("constant".to_string(), "constant".to_string(), Risk::Low),
    }
}

/// Mirrors `utils.py::get_attribute_path`: an `Attribute`/`Name` chain
/// lowered to dotted text, or `"unknown"` for anything else at the base.
fn attribute_path(expr: &Expr) -> String {
    match expr {
        Expr::Name { name, .. } => name.clone(),
        Expr::Attribute { value, attr, .. } => format!("{}.{attr}", attribute_path(value)),
        _ => "unknown".to_string(),
    }
}

const HIGH_RISK_ATTRIBUTES: &[&str] = &[
    "request.form",
    "request.args",
    "request.values",
    "request.json",
    "request.data",
    "request.POST",
    "request.GET",
];

fn trace_attribute(expr: &Expr) -> Trace {
    let attr = attribute_path(expr);
    let risk = if HIGH_RISK_ATTRIBUTES.contains(&attr.as_str()) {
        Risk::High
    } else {
        Risk::Low
    };
    let desc = format!("{attr} (attribute)");
    (desc.clone(), desc, risk)
}

fn trace_subscript(value: &Expr, key: &SubKey, depth: usize, ctx: &TraceCtx) -> Trace {
    let (value_initial, value_flow, value_risk) = trace_source(Some(value), depth + 1, ctx);
    let subscript_desc = match key {
        SubKey::Str(s) => format!("['{s}']"),
        SubKey::Name(n) => format!("[{n}]"),
        SubKey::Other => "[...]".to_string(),
    };

    if value_flow.contains("request.form") {
        let desc = format!("request.form{subscript_desc} (HTTP POST form data)");
        return (desc.clone(), desc, Risk::High);
    }
    if value_flow.contains("request.args") {
        let desc = format!("request.args{subscript_desc} (HTTP GET query parameter)");
        return (desc.clone(), desc, Risk::High);
    }
    if value_flow.contains("request.json") {
        let desc = format!("request.json{subscript_desc} (HTTP JSON body)");
        return (desc.clone(), desc, Risk::High);
    }
    if value_flow.contains("request.files") {
        let desc = format!("request.files{subscript_desc} (HTTP file upload)");
        return (desc.clone(), desc, Risk::High);
    }

    (value_initial, format!("{value_flow}{subscript_desc}"), value_risk)
}

fn trace_binop_add(left: &Expr, right: &Expr, depth: usize, ctx: &TraceCtx) -> Trace {
    let (left_initial, left_flow, _) = trace_source(Some(left), depth + 1, ctx);
    let (_, right_flow, _) = trace_source(Some(right), depth + 1, ctx);
    (left_initial, format!("{left_flow} + {right_flow}"), Risk::Low)
}
