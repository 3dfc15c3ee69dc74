pub mod call;

pub use call::{CallSite, ClassReference, NameExpression, ParamMode, StaticCall, StaticClass};

use crate::ast::TypeHint;
use crate::symbol_table::{ClassId, FunctionId};

// ── Value types ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// Dynamic value (`Variant` in the target)
    Any,
    Int,
    Str,
    Bool,
    Null,
    Object(String),
}

impl ValueType {
    pub fn from_hint(hint: &TypeHint) -> Self {
        match hint {
            TypeHint::Int => ValueType::Int,
            TypeHint::Str => ValueType::Str,
            TypeHint::Bool => ValueType::Bool,
            TypeHint::Class(name) => ValueType::Object(name.clone()),
        }
    }

    pub fn is_string(&self) -> bool {
        matches!(self, ValueType::Str)
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueType::Any => write!(f, "mixed"),
            ValueType::Int => write!(f, "int"),
            ValueType::Str => write!(f, "string"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Null => write!(f, "null"),
            ValueType::Object(name) => write!(f, "{}", name),
        }
    }
}

// ── Compile-time scalars ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Str(String),
    Int(i64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
        }
    }
}

// ── TIR nodes ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TirUnit {
    pub index: usize,
    pub path: String,
    pub functions: Vec<TirFunction>,
    /// Class names referenced literally by call sites of this unit.
    pub class_deps: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub name: String,
    pub by_ref: bool,
}

#[derive(Debug, Clone)]
pub struct TirFunction {
    pub id: FunctionId,
    pub name: String,
    pub class: Option<ClassId>,
    pub is_static: bool,
    pub params: Vec<FunctionParam>,
    pub body: Vec<TirStmt>,
}

#[derive(Debug, Clone)]
pub enum TirStmt {
    Expr(TirExpr),
    Return(Option<TirExpr>),
}

#[derive(Debug, Clone)]
pub struct TirExpr {
    pub kind: TirExprKind,
    pub ty: ValueType,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub enum TirExprKind {
    StrLiteral(String),
    IntLiteral(i64),
    Null,
    Var(String),
    This,
    /// Bare identifier in class position
    ClassName(String),
    Concat(Box<TirExpr>, Box<TirExpr>),
    Assign {
        target: String,
        value: Box<TirExpr>,
    },
    DynamicCall(Box<CallSite>),
    StaticCall(Box<StaticCall>),
}

impl TirExpr {
    pub fn new(kind: TirExprKind, line: usize) -> Self {
        Self {
            kind,
            ty: ValueType::Any,
            line,
        }
    }

    pub fn str_literal(value: impl Into<String>, line: usize) -> Self {
        Self {
            kind: TirExprKind::StrLiteral(value.into()),
            ty: ValueType::Str,
            line,
        }
    }

    /// Compile-time value, folding concatenations of constants.
    pub fn scalar_value(&self) -> Option<Scalar> {
        match &self.kind {
            TirExprKind::StrLiteral(s) | TirExprKind::ClassName(s) => Some(Scalar::Str(s.clone())),
            TirExprKind::IntLiteral(i) => Some(Scalar::Int(*i)),
            TirExprKind::Concat(left, right) => {
                let mut s = left.scalar_value()?.into_string();
                s.push_str(&right.scalar_value()?.into_string());
                Some(Scalar::Str(s))
            }
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.scalar_value().is_some()
    }

    /// Literals, variables and `$this`: cheap to re-read, no evaluation order.
    pub fn is_simple(&self) -> bool {
        matches!(
            self.kind,
            TirExprKind::StrLiteral(_)
                | TirExprKind::IntLiteral(_)
                | TirExprKind::Null
                | TirExprKind::Var(_)
                | TirExprKind::This
                | TirExprKind::ClassName(_)
        )
    }

    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            TirExprKind::StrLiteral(_)
                | TirExprKind::IntLiteral(_)
                | TirExprKind::Null
                | TirExprKind::ClassName(_)
        )
    }

    pub fn is_lvalue(&self) -> bool {
        matches!(self.kind, TirExprKind::Var(_))
    }

    pub fn has_effect(&self) -> bool {
        match &self.kind {
            TirExprKind::Assign { .. }
            | TirExprKind::DynamicCall(_)
            | TirExprKind::StaticCall(_) => true,
            TirExprKind::Concat(left, right) => left.has_effect() || right.has_effect(),
            _ => false,
        }
    }

    /// The bare `self` / `parent` / `static` keyword, lowercased.
    pub fn late_binding_keyword(&self) -> Option<&'static str> {
        let TirExprKind::ClassName(name) = &self.kind else {
            return None;
        };
        ["self", "parent", "static"]
            .into_iter()
            .find(|kw| name.eq_ignore_ascii_case(kw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> TirExpr {
        TirExpr::str_literal(s, 1)
    }

    fn concat(l: TirExpr, r: TirExpr) -> TirExpr {
        TirExpr::new(TirExprKind::Concat(Box::new(l), Box::new(r)), 1)
    }

    #[test]
    fn folds_constant_concatenation() {
        let e = concat(lit("fo"), concat(lit("o"), TirExpr::new(TirExprKind::IntLiteral(2), 1)));
        assert_eq!(e.scalar_value(), Some(Scalar::Str("foo2".into())));
        assert!(!e.is_simple());
        assert!(!e.has_effect());
    }

    #[test]
    fn variables_are_not_scalar() {
        let e = concat(lit("get_"), TirExpr::new(TirExprKind::Var("kind".into()), 1));
        assert_eq!(e.scalar_value(), None);
        let assign = TirExpr::new(
            TirExprKind::Assign {
                target: "x".into(),
                value: Box::new(lit("f")),
            },
            1,
        );
        assert!(concat(lit("a"), assign).has_effect());
    }

    #[test]
    fn recognises_late_binding_keywords() {
        let e = TirExpr::new(TirExprKind::ClassName("Parent".into()), 1);
        assert_eq!(e.late_binding_keyword(), Some("parent"));
        let e = TirExpr::new(TirExprKind::ClassName("Widget".into()), 1);
        assert_eq!(e.late_binding_keyword(), None);
    }
}
