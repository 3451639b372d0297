//! Callee name resolution: turns a `Call` expression's function sub-tree
//! into a fully-qualified dotted name, and, where possible, a cross-file
//! handle to the function it refers to.
//!
//! Grounded directly on `resolver.py::resolve_function_call` and
//! `utils.py::extract_full_func_name`.

use crate::ast::Expr;
use crate::catalog;
use crate::indexing::{FileIndex, FunctionRecord, ProjectIndex};

/// Walk an attribute/name chain (e.g. `pkl.load`, `os.path.join`) into a
/// dotted string, substituting the base name through `aliases` (the file's
/// import map) so `pkl.load` resolves to `pickle.load`.
pub fn extract_full_func_name(func: &Expr, aliases: &std::collections::HashMap<String, String>) -> String {
    match func {
        Expr::Name { name, .. } => aliases.get(name).cloned().unwrap_or_else(|| name.clone()),
        Expr::Attribute { value, attr, .. } => {
            let mut parts = vec![attr.clone()];
            let mut curr = value.as_ref();
            loop {
                match curr {
                    Expr::Attribute { value, attr, .. } => {
                        parts.insert(0, attr.clone());
                        curr = value.as_ref();
                    }
                    Expr::Name { name, .. } => {
                        let base = aliases.get(name).cloned().unwrap_or_else(|| name.clone());
                        parts.insert(0, base);
                        break;
                    }
                    _ => return String::new(),
                }
            }
            parts.join(".")
        }
        _ => String::new(),
    }
}

/// Resolve a call's callee name and, for local/project-internal calls, the
/// function it refers to. Returns `(callee_name, None)` for sinks (the
/// tracer handles those separately) and for anything unresolved.
pub fn resolve_function_call<'a>(
    func: &Expr,
    file_index: &'a FileIndex,
    project_index: &'a ProjectIndex,
) -> (String, Option<&'a FunctionRecord>) {
    let func_name = extract_full_func_name(func, &file_index.imports);

    if catalog::is_sink(&func_name) {
        return (func_name, None);
    }

    let parts: Vec<&str> = func_name.split('.').collect();
    match parts.as_slice() {
        [alias, short] => {
            if let Some(module) = file_index.imports.get(*alias) {
                if let Some(other) = project_index.file_for_module(module) {
                    return (func_name.clone(), other.functions.get(*short));
                }
            }
            (func_name, None)
        }
        [single] => {
            if let Some(local) = file_index.functions.get(*single) {
                return (func_name.clone(), Some(local));
            }
            if let Some(full_ref) = file_index.imports.get(*single) {
                if let Some((_, short)) = full_ref.rsplit_once('.') {
                    for (_path, fi) in project_index.files.iter() {
                        if let Some(f) = fi.functions.get(short) {
                            return (func_name.clone(), Some(f));
                        }
                    }
                }
            }
            (func_name, None)
        }
        _ => (func_name, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn resolves_alias_through_import_map() {
        let mut aliases = HashMap::new();
        aliases.insert("pkl".to_string(), "pickle".to_string());
        let func = Expr::Attribute {
            value: Box::new(Expr::Name {
                name: "pkl".into(),
                line: 1,
            }),
            attr: "load".into(),
            line: 1,
        };
        assert_eq!(extract_full_func_name(&func, &aliases), "pickle.load");
    }

    #[test]
    fn resolves_chained_attribute() {
        let aliases = HashMap::new();
        let func = Expr::Attribute {
            value: Box::new(Expr::Attribute {
                value: Box::new(Expr::Name {
                    name: "os".into(),
                    line: 1,
                }),
                attr: "path".into(),
                line: 1,
            }),
            attr: "join".into(),
            line: 1,
        };
        assert_eq!(extract_full_func_name(&func, &aliases), "os.path.join");
    }
}
