use serde::{Deserialize, Serialize};

/// Expression node with its source line (0 = unknown)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    #[serde(flatten)]
    pub kind: ExprKind,
    #[serde(default)]
    pub line: usize,
}

impl Expr {
    pub fn new(kind: ExprKind, line: usize) -> Self {
        Self { kind, line }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExprKind {
    /// String literal
    Str { value: String },

    /// Integer literal
    Int { value: i64 },

    Null,

    /// Variable reference (`$name`)
    Var { name: String },

    /// `$this`
    This,

    /// Bare identifier in class position: `Foo::`, `self::`, `parent::`, `static::`
    Name { value: String },

    /// String concatenation (`a . b`)
    Concat { left: Box<Expr>, right: Box<Expr> },

    /// Assignment to a local (`$target = value`)
    Assign { target: String, value: Box<Expr> },

    /// Call whose callee is given by an arbitrary name expression.
    /// `class` is the `X::` part, or the object of `$obj->` when `arrow` is set.
    Call {
        name: Box<Expr>,
        #[serde(default)]
        class: Option<Box<Expr>>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        arrow: bool,
    },
}
