//! Parser hand-off format.
//!
//! The front end serializes every translation unit as JSON; this module is
//! the `serde` mirror of that document. Nothing here is resolved yet: class
//! and function names are plain strings, calls are raw `name`/`class`/`args`
//! triples.

mod expr;
mod stmt;
mod types;

pub use expr::{Expr, ExprKind};
pub use stmt::Stmt;
pub use types::TypeHint;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Program {
    pub units: Vec<Unit>,
}

impl Program {
    /// Append every unit of `other`, keeping unit order stable.
    pub fn merge(&mut self, other: Program) {
        self.units.extend(other.units);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub path: String,
    /// Original source text, only used to quote lines in diagnostics.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub classes: Vec<ClassDecl>,
    #[serde(default)]
    pub functions: Vec<FunctionDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassDecl {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Declared inside a conditional branch.
    #[serde(default)]
    pub conditional: bool,
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub methods: Vec<FunctionDecl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub is_static: bool,
    /// Reads its arguments through `func_get_args()`, so extra arguments are fine.
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub returns: Option<TypeHint>,
    #[serde(default)]
    pub line: usize,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub by_ref: bool,
    #[serde(default)]
    pub optional: bool,
}
