//! A compact tagged-variant syntax tree.
//!
//! The AST Loader parses a file with `tree_sitter_python` and immediately
//! lowers the concrete syntax tree into this owned representation: one
//! constructor per node kind the rest of the pipeline cares about (`Name`,
//! `Attribute`, `Subscript`, `Call`, `Constant`, `BinOp-Add`, `Assign`,
//! `With`, `FunctionDef`, `Import`, `Return`) plus a `Compound` catch-all
//! for control-flow wrappers (`if`/`for`/`while`/`try`/`class`) whose nested
//! blocks still need to be visited but whose own shape the tracer never
//! inspects.
//!
//! Lowering happens once per file; everything downstream (the file indexer,
//! the taint tracer, the context detector) operates purely on this tree and
//! never touches `tree_sitter` again.

pub mod loader;

/// A literal constant. Only the string/non-string distinction and the
/// string's text matter to the tracer.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Str(String),
    Other,
}

/// The key of a subscript expression, e.g. `request.form['payload']`.
#[derive(Debug, Clone, PartialEq)]
pub enum SubKey {
    Str(String),
    Name(String),
    Other,
}

/// An expression node.
#[derive(Debug, Clone)]
pub enum Expr {
    Name {
        name: String,
        line: usize,
    },
    Attribute {
        value: Box<Expr>,
        attr: String,
        line: usize,
    },
    Subscript {
        value: Box<Expr>,
        key: SubKey,
        line: usize,
    },
    Call {
        func: Box<Expr>,
        args: Vec<Expr>,
        keywords: Vec<(String, Expr)>,
        line: usize,
    },
    Constant {
        value: Constant,
        line: usize,
    },
    BinOpAdd {
        left: Box<Expr>,
        right: Box<Expr>,
        line: usize,
    },
    /// A list literal. Only needed to read decorator keyword arguments like
    /// `methods=["GET", "POST"]`; the tracer does not otherwise care about
    /// list contents.
    List {
        items: Vec<Expr>,
        line: usize,
    },
    /// Anything not modeled above (dict/comparison/lambda/f-string/...).
    /// `nested_calls` carries every `Call` node found anywhere inside the
    /// original sub-tree so that sink detection never misses a call merely
    /// because it is embedded in an unmodeled expression shape.
    Other {
        line: usize,
        nested_calls: Vec<Expr>,
    },
}

impl Expr {
    pub fn line(&self) -> usize {
        match self {
            Expr::Name { line, .. }
            | Expr::Attribute { line, .. }
            | Expr::Subscript { line, .. }
            | Expr::Call { line, .. }
            | Expr::Constant { line, .. }
            | Expr::BinOpAdd { line, .. }
            | Expr::List { line, .. }
            | Expr::Other { line, .. } => *line,
        }
    }
}

/// A `with expr [as target]` clause.
#[derive(Debug, Clone)]
pub struct WithItem {
    pub context_expr: Expr,
    pub target: Option<String>,
}

/// A statement node.
#[derive(Debug, Clone)]
pub enum Stmt {
    Assign {
        target: String,
        value: Expr,
        line: usize,
    },
    With {
        items: Vec<WithItem>,
        body: Vec<Stmt>,
        line: usize,
    },
    FunctionDef {
        name: String,
        decorators: Vec<Expr>,
        docstring: Option<String>,
        body: Vec<Stmt>,
        line: usize,
    },
    Import {
        alias: String,
        qualified: String,
        line: usize,
    },
    ExprStmt(Expr),
    Return(Option<Expr>, usize),
    /// Catch-all for `if`/`elif`/`else`/`for`/`while`/`try`/`except`/`class`
    /// bodies: each element of `branches` is the direct statement list of
    /// one nested block, lowered with the same rules, recursively.
    Compound {
        branches: Vec<Vec<Stmt>>,
        line: usize,
    },
}
