//! Per-file index: the import table, function table, and flattened
//! assignment list a single source file contributes to the project index.
//!
//! Grounded on the shape of the teacher's `FileInfo`/`SimpleIndexer`
//! single-file bookkeeping in `indexing/file_info.rs` and `indexing/simple.rs`
//! (one record type per file, built once, then merged into a project-wide
//! table) but adapted to the narrower data this analyzer's tracer actually
//! needs, per the original `pickle_inspector.indexer.FileIndex`.

use std::path::PathBuf;

use crate::ast::{Expr, Stmt};

/// Everything the tracer needs about one function definition, independent of
/// which file it was found in (cross-file lookup by name happens in
/// [`crate::indexing::project_index::ProjectIndex`]).
#[derive(Debug, Clone)]
pub struct FunctionRecord {
    pub name: String,
    pub decorators: Vec<Expr>,
    pub docstring: Option<String>,
    pub body: Vec<Stmt>,
    pub file: PathBuf,
    pub line: usize,
}

impl FunctionRecord {
    /// The original indexer's single-return heuristic: only the function's
    /// *direct* top-level statements are examined, not statements nested
    /// inside `if`/`for`/`while`/`try` blocks. Returns the `return`'s value
    /// expression only when there is exactly one `Stmt::Return` among the
    /// direct statements.
    pub fn single_return_value(&self) -> Option<&Expr> {
        let mut found: Option<Option<&Expr>> = None;
        for stmt in &self.body {
            if let Stmt::Return(value, _) = stmt {
                if found.is_some() {
                    return None;
                }
                found = Some(value.as_ref());
            }
        }
        found.flatten()
    }
}

/// One file's contribution to the project index.
#[derive(Debug, Clone)]
pub struct FileIndex {
    pub path: PathBuf,
    pub source: String,
    pub body: Vec<Stmt>,
    /// alias -> fully qualified dotted name, e.g. `"pickle"` -> `"pickle"`,
    /// `"pk"` -> `"pickle"`, `"loads"` -> `"pickle.loads"`.
    pub imports: std::collections::HashMap<String, String>,
    /// Short function name -> its record. Nested function definitions
    /// shadow outer ones of the same name (last write wins), matching a
    /// single flat walk over the file in document order.
    pub functions: std::collections::HashMap<String, FunctionRecord>,
    /// Every `Assign` and `with ... as name` binding found anywhere in the
    /// file, in document order. [`find_assignment`] queries this for the
    /// most recent (highest line number) binding of a given name.
    pub assignments: Vec<(String, Expr, usize)>,
}

impl FileIndex {
    pub fn build(path: PathBuf, source: String, body: Vec<Stmt>) -> Self {
        let mut imports = std::collections::HashMap::new();
        let mut functions = std::collections::HashMap::new();
        let mut assignments = Vec::new();
        walk_statements(&body, &path, &mut imports, &mut functions, &mut assignments);
        Self {
            path,
            source,
            body,
            imports,
            functions,
            assignments,
        }
    }

    /// The most recent top-level-or-nested definition of `name` anywhere in
    /// the file, by document order (highest line number first).
    pub fn find_assignment(&self, name: &str) -> Option<(&Expr, usize)> {
        self.assignments
            .iter()
            .rev()
            .find(|(target, _, _)| target == name)
            .map(|(_, expr, line)| (expr, *line))
    }
}

fn walk_statements(
    stmts: &[Stmt],
    path: &std::path::Path,
    imports: &mut std::collections::HashMap<String, String>,
    functions: &mut std::collections::HashMap<String, FunctionRecord>,
    assignments: &mut Vec<(String, Expr, usize)>,
) {
    for stmt in stmts {
        match stmt {
            Stmt::Import { alias, qualified, .. } => {
                imports.insert(alias.clone(), qualified.clone());
            }
            Stmt::Assign { target, value, line } => {
                assignments.push((target.clone(), value.clone(), *line));
            }
            Stmt::With { items, body, line } => {
                for item in items {
                    if let Some(target) = &item.target {
                        assignments.push((target.clone(), item.context_expr.clone(), *line));
                    }
                }
                walk_statements(body, path, imports, functions, assignments);
            }
            Stmt::FunctionDef {
                name,
                decorators,
                docstring,
                body,
                line,
            } => {
                functions.insert(
                    name.clone(),
                    FunctionRecord {
                        name: name.clone(),
                        decorators: decorators.clone(),
                        docstring: docstring.clone(),
                        body: body.clone(),
                        file: path.to_path_buf(),
                        line: *line,
                    },
                );
                walk_statements(body, path, imports, functions, assignments);
            }
            Stmt::Compound { branches, .. } => {
                for branch in branches {
                    walk_statements(branch, path, imports, functions, assignments);
                }
            }
            Stmt::ExprStmt(_) | Stmt::Return(_, _) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::loader::AstLoader;
    use std::path::Path;

    fn index_source(src: &str) -> FileIndex {
        let mut loader = AstLoader::new().unwrap();
        let loaded = loader
            .load_source(Path::new("t.py"), src.to_string())
            .unwrap();
        FileIndex::build(loaded.path, loaded.source, loaded.body)
    }

    #[test]
    fn import_alias_mapping() {
        let idx = index_source("import pickle\nimport numpy as np\nfrom os import path as p\n");
        assert_eq!(idx.imports.get("pickle").map(String::as_str), Some("pickle"));
        assert_eq!(idx.imports.get("np").map(String::as_str), Some("numpy"));
        assert_eq!(idx.imports.get("p").map(String::as_str), Some("os.path"));
    }

    #[test]
    fn most_recent_assignment_wins() {
        let idx = index_source("x = 1\nx = 2\n");
        let (_, line) = idx.find_assignment("x").unwrap();
        assert_eq!(line, 2);
    }

    #[test]
    fn single_return_detected_direct_only() {
        let idx = index_source(
            "def f():\n    if True:\n        return 1\n    return 2\n",
        );
        let f = idx.functions.get("f").unwrap();
        // two direct-level returns (one inside `if`'s Compound branch does
        // NOT count as direct) -> only the outer `return 2` is direct.
        assert!(f.single_return_value().is_some());
    }

    #[test]
    fn multiple_direct_returns_yield_none() {
        let idx = index_source("def f(cond):\n    return 1\n    return 2\n");
        let f = idx.functions.get("f").unwrap();
        assert!(f.single_return_value().is_none());
    }
}
