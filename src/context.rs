//! Context detection: tags a function definition with the kind of operation
//! it performs, derived from its decorators and a name/docstring heuristic.
//!
//! Grounded on `analyzer.py::SinkVisitor.detect_context` /
//! `is_file_operation_function` / `is_task_function`, with precedence made
//! explicit (`HttpEndpoint` > `FileOperation` > `TaskExecution`) rather than
//! the original's implicit overwrite-on-match ordering.

use crate::ast::{Expr, Stmt};

const FILE_OPERATION_NAME_PATTERNS: &[&str] = &[
    "load",
    "save",
    "read",
    "write",
    "open",
    "close",
    "extract",
    "deserialize",
    "unpickle",
    "import",
    "export",
    "backup",
    "restore",
];

const FILE_OPERATION_DOC_KEYWORDS: &[&str] =
    &["file", "pickle", "load", "save", "extract", "deserialize"];

const TASK_EXECUTION_NAME_PATTERNS: &[&str] = &[
    "task", "job", "work", "execute", "run", "process", "compute", "worker", "runner", "handler",
    "do_work",
];

#[derive(Debug, Clone, PartialEq)]
pub enum Context {
    HttpEndpoint {
        route: String,
        methods: Option<String>,
    },
    FileOperation {
        function_name: String,
    },
    TaskExecution {
        function_name: String,
    },
}

/// Detect the context of a single function definition, checked in
/// `HttpEndpoint` -> `FileOperation` -> `TaskExecution` order.
pub fn detect_context(name: &str, decorators: &[Expr], docstring: &Option<String>) -> Option<Context> {
    if let Some(ctx) = detect_http_endpoint(decorators) {
        return Some(ctx);
    }
    if name_matches(name, FILE_OPERATION_NAME_PATTERNS)
        || docstring
            .as_deref()
            .map(|doc| doc_matches(doc, FILE_OPERATION_DOC_KEYWORDS))
            .unwrap_or(false)
    {
        return Some(Context::FileOperation {
            function_name: name.to_string(),
        });
    }
    if name_matches(name, TASK_EXECUTION_NAME_PATTERNS) {
        return Some(Context::TaskExecution {
            function_name: name.to_string(),
        });
    }
    None
}

fn name_matches(name: &str, patterns: &[&str]) -> bool {
    let lower = name.to_lowercase();
    patterns.iter().any(|p| lower.contains(p))
}

fn doc_matches(doc: &str, keywords: &[&str]) -> bool {
    let lower = doc.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

fn detect_http_endpoint(decorators: &[Expr]) -> Option<Context> {
    for decorator in decorators {
        let Expr::Call { func, args, keywords, .. } = decorator else {
            continue;
        };
        let attr_is_route = matches!(func.as_ref(), Expr::Attribute { attr, .. } if attr == "route");
        let name_is_route = matches!(func.as_ref(), Expr::Name { name, .. } if name == "route");
        if !attr_is_route && !name_is_route {
            continue;
        }
        let route = match args.first() {
            Some(Expr::Constant {
                value: crate::ast::Constant::Str(s),
                ..
            }) => s.clone(),
            _ => continue,
        };
        let methods = keywords
            .iter()
            .find(|(k, _)| k == "methods")
            .and_then(|(_, v)| methods_from_expr(v));
        return Some(Context::HttpEndpoint { route, methods });
    }
    None
}

fn methods_from_expr(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Constant {
            value: crate::ast::Constant::Str(s),
            ..
        } => Some(s.clone()),
        Expr::List { items, .. } => {
            let strs: Vec<&str> = items
                .iter()
                .filter_map(|item| match item {
                    Expr::Constant {
                        value: crate::ast::Constant::Str(s),
                        ..
                    } => Some(s.as_str()),
                    _ => None,
                })
                .collect();
            if strs.is_empty() {
                None
            } else {
                Some(strs.join(", "))
            }
        }
        _ => None,
    }
}

/// Walk the top-level and nested bodies of a file looking for
/// `Stmt::FunctionDef` nodes and build the name -> context table, matching
/// `ast.walk`'s full-tree traversal in the original.
pub fn detect_contexts(body: &[Stmt]) -> std::collections::HashMap<String, Context> {
    let mut out = std::collections::HashMap::new();
    walk(body, &mut out);
    out
}

fn walk(stmts: &[Stmt], out: &mut std::collections::HashMap<String, Context>) {
    for stmt in stmts {
        match stmt {
            Stmt::FunctionDef {
                name,
                decorators,
                docstring,
                body,
                ..
            } => {
                if let Some(ctx) = detect_context(name, decorators, docstring) {
                    out.insert(name.clone(), ctx);
                }
                walk(body, out);
            }
            Stmt::With { body, .. } => walk(body, out),
            Stmt::Compound { branches, .. } => {
                for branch in branches {
                    walk(branch, out);
                }
            }
            Stmt::Assign { .. } | Stmt::Import { .. } | Stmt::ExprStmt(_) | Stmt::Return(_, _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_endpoint_takes_precedence() {
        let decorators = vec![Expr::Call {
            func: Box::new(Expr::Attribute {
                value: Box::new(Expr::Name {
                    name: "app".into(),
                    line: 1,
                }),
                attr: "route".into(),
                line: 1,
            }),
            args: vec![Expr::Constant {
                value: crate::ast::Constant::Str("/upload".into()),
                line: 1,
            }],
            keywords: vec![],
            line: 1,
        }];
        let ctx = detect_context("load_model", &decorators, &None).unwrap();
        assert_eq!(
            ctx,
            Context::HttpEndpoint {
                route: "/upload".into(),
                methods: None
            }
        );
    }

    #[test]
    fn file_operation_from_name() {
        let ctx = detect_context("save_model", &[], &None).unwrap();
        assert_eq!(
            ctx,
            Context::FileOperation {
                function_name: "save_model".into()
            }
        );
    }

    #[test]
    fn task_execution_from_name() {
        let ctx = detect_context("run_worker", &[], &None).unwrap();
        assert_eq!(
            ctx,
            Context::TaskExecution {
                function_name: "run_worker".into()
            }
        );
    }

    #[test]
    fn no_match_is_none() {
        assert!(detect_context("helper", &[], &None).is_none());
    }
}
