use serde::Serialize;

use super::{Scalar, TirExpr};
use crate::symbol_table::{ClassId, FunctionId};

/// The sub-expression producing a callee name.
#[derive(Debug, Clone)]
pub struct NameExpression {
    pub expr: TirExpr,
    pub is_constant: bool,
    /// Set only for constants that are strings.
    pub constant_value: Option<String>,
}

impl NameExpression {
    pub fn new(expr: TirExpr) -> Self {
        let scalar = expr.scalar_value();
        Self {
            is_constant: scalar.is_some(),
            constant_value: match scalar {
                Some(Scalar::Str(s)) => Some(s),
                _ => None,
            },
            expr,
        }
    }

    /// The name is written as a single string literal already.
    pub fn is_plain_literal(&self) -> bool {
        matches!(self.expr.kind, super::TirExprKind::StrLiteral(_))
    }
}

/// How the class part of a call is known.
#[derive(Debug, Clone)]
pub enum ClassReference {
    None,
    StaticKnownUnique(ClassId),
    StaticKnownRedeclared(String),
    DynamicExpression(Box<TirExpr>),
    SelfBinding,
    ParentBinding,
    StaticBinding,
    Unknown(String),
}

impl ClassReference {
    pub fn is_binding(&self) -> bool {
        matches!(
            self,
            ClassReference::SelfBinding | ClassReference::ParentBinding | ClassReference::StaticBinding
        )
    }

    pub fn expression(&self) -> Option<&TirExpr> {
        match self {
            ClassReference::DynamicExpression(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn expression_mut(&mut self) -> Option<&mut TirExpr> {
        match self {
            ClassReference::DynamicExpression(expr) => Some(expr),
            _ => None,
        }
    }
}

/// Calling-convention hint for one argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParamMode {
    ByValue,
    ByRef,
    /// Callee unknown until runtime: the dispatch descriptor decides.
    Deferred,
}

/// A call whose callee could not be fixed by the parser.
#[derive(Debug, Clone)]
pub struct CallSite {
    pub name: NameExpression,
    pub class_ref: ClassReference,
    pub arguments: Vec<TirExpr>,
    pub arg_modes: Vec<ParamMode>,
    /// `$obj->name()` rather than `Cls::name()`
    pub arrow: bool,
    pub enclosing_function_id: FunctionId,
    pub enclosing_class_id: Option<ClassId>,
    pub line: usize,
}

/// Class of a statically bound call. `id` is `None` for redeclared classes,
/// which dispatch through the runtime table keyed by `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticClass {
    pub name: String,
    pub id: Option<ClassId>,
}

impl StaticClass {
    pub fn is_redeclared(&self) -> bool {
        self.id.is_none()
    }
}

/// Replacement node produced by constant folding.
#[derive(Debug, Clone)]
pub struct StaticCall {
    pub name: String,
    pub class: Option<StaticClass>,
    pub arguments: Vec<TirExpr>,
    pub arg_modes: Vec<ParamMode>,
    pub enclosing_function_id: FunctionId,
    pub enclosing_class_id: Option<ClassId>,
    pub line: usize,
}
