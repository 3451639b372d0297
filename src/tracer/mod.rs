//! The taint tracer: walks a file's lowered statement tree in document
//! order, maintaining a tainted-identifier set, and emits a [`Finding`] for
//! every call whose resolved callee is a known deserialization sink.
//!
//! Grounded on `analyzer.py::SinkVisitor` (`visit_FunctionDef`,
//! `visit_Assign`, `visit_Call`), with [`provenance::trace_source`] doing
//! the recursive provenance classification.

pub mod provenance;

use std::collections::{HashMap, HashSet};

use crate::ast::{Expr, Stmt};
use crate::catalog;
use crate::context::{self, Context};
use crate::indexing::{FileIndex, ProjectIndex};
use crate::report::Finding;
use crate::resolve::extract_full_func_name;

use provenance::{TraceCtx, trace_source};

struct State<'a> {
    file_index: &'a FileIndex,
    project_index: &'a ProjectIndex,
    tainted_files: HashSet<String>,
    current_function: Option<String>,
    contexts: HashMap<String, Context>,
    findings: Vec<Finding>,
}

/// Run the tracer over a single file, returning every finding produced.
pub fn analyze_file(file_index: &FileIndex, project_index: &ProjectIndex) -> Vec<Finding> {
    let contexts = context::detect_contexts(&file_index.body);
    let mut state = State {
        file_index,
        project_index,
        tainted_files: HashSet::new(),
        current_function: None,
        contexts,
        findings: Vec::new(),
    };
    walk_stmts(&file_index.body, &mut state);
    state.findings
}

/// Run the tracer over every file in the project, in arbitrary file order
/// (the caller is expected to sort the combined result).
pub fn analyze_project(project_index: &ProjectIndex) -> Vec<Finding> {
    project_index
        .files
        .values()
        .flat_map(|fi| analyze_file(fi, project_index))
        .collect()
}

fn walk_stmts(stmts: &[Stmt], state: &mut State) {
    for stmt in stmts {
        match stmt {
            Stmt::Assign { target, value, .. } => {
                if is_request_files_subscript(value) {
                    state.tainted_files.insert(target.clone());
                }
                walk_expr(value, state);
            }
            Stmt::With { items, body, .. } => {
                for item in items {
                    walk_expr(&item.context_expr, state);
                }
                walk_stmts(body, state);
            }
            Stmt::FunctionDef { name, body, .. } => {
                // Matches the original's `finally: self.current_function = None`:
                // entering a function sets the context, leaving it always
                // clears rather than restoring an outer function's name.
                state.current_function = Some(name.clone());
                walk_stmts(body, state);
                state.current_function = None;
            }
            Stmt::ExprStmt(expr) => walk_expr(expr, state),
            Stmt::Return(Some(value), _) => walk_expr(value, state),
            Stmt::Return(None, _) => {}
            Stmt::Compound { branches, .. } => {
                for branch in branches {
                    walk_stmts(branch, state);
                }
            }
            Stmt::Import { .. } => {}
        }
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

fn walk_expr(expr: &Expr, state: &mut State) {
    match expr {
        Expr::Call {
            func,
            args,
            keywords,
            line,
        } => {
            propagate_save_taint(func, args, state);

            let func_name = extract_full_func_name(func, &state.file_index.imports);
            if catalog::is_sink(&func_name) {
                let (initial_source, flow, risk) = {
                    let ctx = TraceCtx {
                        tainted_files: &state.tainted_files,
                        file_index: state.file_index,
                        project_index: state.project_index,
                    };
                    trace_source(args.first(), 0, &ctx)
                };
                let context = state
                    .current_function
                    .as_ref()
                    .and_then(|f| state.contexts.get(f))
                    .cloned();
                state.findings.push(Finding {
                    sink: func_name,
                    initial_source,
                    flow,
                    file: state.file_index.path.clone(),
                    line: *line,
                    risk,
                    context,
                });
            }

            walk_expr(func, state);
            for a in args {
                walk_expr(a, state);
            }
            for (_, v) in keywords {
                walk_expr(v, state);
            }
        }
        Expr::Attribute { value, .. } => walk_expr(value, state),
        Expr::Subscript { value, .. } => walk_expr(value, state),
        Expr::BinOpAdd { left, right, .. } => {
            walk_expr(left, state);
            walk_expr(right, state);
        }
        Expr::List { items, .. } => {
            for item in items {
                walk_expr(item, state);
            }
        }
        Expr::Other { nested_calls, .. } => {
            for call in nested_calls {
                walk_expr(call, state);
            }
        }
        Expr::Name { .. } | Expr::Constant { .. } => {}
    }
}

/// `handle.save(path)` where `handle` is already tainted taints `path` too.
fn propagate_save_taint(func: &Expr, args: &[Expr], state: &mut State) {
    let Expr::Attribute { value, attr, .. } = func else {
        return;
    };
    if attr != "save" {
        return;
    }
    let Expr::Name { name: file_var, .. } = value.as_ref() else {
        return;
    };
    if !state.tainted_files.contains(file_var) {
        return;
    }
    if let Some(Expr::Name { name: arg_name, .. }) = args.first() {
        state.tainted_files.insert(arg_name.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::loader::AstLoader;
    use crate::indexing::file_index::FileIndex;
    use std::collections::HashMap;
    use std::path::Path;

    fn project_with(src: &str) -> ProjectIndex {
        let mut loader = AstLoader::new().unwrap();
        let loaded = loader.load_source(Path::new("app.py"), src.to_string()).unwrap();
        let fi = FileIndex::build(loaded.path.clone(), loaded.source, loaded.body);
        let mut files = HashMap::new();
        let mut function_map = HashMap::new();
        for name in fi.functions.keys() {
            function_map.insert(name.clone(), vec![loaded.path.clone()]);
        }
        files.insert(loaded.path.clone(), fi);
        ProjectIndex { files, function_map }
    }

    #[test]
    fn direct_file_upload_flow_is_high_risk() {
        let src = "\
@app.route('/upload', methods=['POST'])
def upload():
    f = request.files['data']
    path = '/tmp/' + f.filename
    f.save(path)
    with open(path, 'rb') as handle:
        obj = pickle.load(handle)
    return obj
";
        let project = project_with(src);
        let fi = project.files.values().next().unwrap();
        let findings = analyze_file(fi, &project);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].sink, "pickle.load");
        assert_eq!(findings[0].risk, crate::report::Risk::High);
    }

    #[test]
    fn yaml_load_via_plain_open_is_medium() {
        let src = "\
def load_config(path):
    with open(path) as handle:
        return yaml.load(handle)
";
        let project = project_with(src);
        let fi = project.files.values().next().unwrap();
        let findings = analyze_file(fi, &project);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].sink, "yaml.load");
    }

    #[test]
    fn no_argument_sink_call_is_unknown_medium() {
        let src = "def f():\n    pickle.load()\n";
        let project = project_with(src);
        let fi = project.files.values().next().unwrap();
        let findings = analyze_file(fi, &project);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].risk, crate::report::Risk::Medium);
    }

    #[test]
    fn cyclic_self_assignment_resolves_without_infinite_loop() {
        let src = "x = x\npickle.loads(x)\n";
        let project = project_with(src);
        let fi = project.files.values().next().unwrap();
        let findings = analyze_file(fi, &project);
        assert_eq!(findings.len(), 1);
    }
}
