//! Runtime dispatch strategies for calls the optimizer could not bind.
//!
//! A [`CallPlan`] is picked by the pure functions in [`select`] and lowered
//! by the code generator. Plans serialize so `--dump-plans` can print them.

mod select;

pub use select::{select_dynamic, select_static};

use serde::Serialize;

use crate::tir::{NameExpression, TirExpr};

/// Callee name as the plan sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOperand {
    Literal(String),
    /// Evaluated at runtime.
    Expression,
}

impl NameOperand {
    pub fn from_name(name: &NameExpression) -> Self {
        match &name.constant_value {
            Some(value) => NameOperand::Literal(value.clone()),
            None => NameOperand::Expression,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, NameOperand::Literal(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassOperand {
    Literal(String),
    /// Class name or object computed by the call's class expression.
    Expression,
    /// `static::`, read from the executing frame.
    LateStatic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Receiver {
    This,
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum DispatchPlan {
    DirectFunctionCall {
        target: String,
    },
    StaticMethodCall {
        class: String,
        method: NameOperand,
        redeclared: bool,
        /// Call `c_<cls>::t_<m>` without a descriptor.
        direct: bool,
    },
    DynamicFunctionLookup {
        name: NameOperand,
    },
    DynamicMethodLookupByName {
        class: ClassOperand,
        method: NameOperand,
    },
    DynamicMethodLookupByRuntimeClass {
        class: ClassOperand,
        method: NameOperand,
        receiver: Receiver,
    },
    UnresolvableFatal {
        class: String,
    },
}

impl DispatchPlan {
    /// Goes through a `CallInfo` descriptor at runtime.
    pub fn uses_descriptor(&self) -> bool {
        match self {
            DispatchPlan::DirectFunctionCall { .. } | DispatchPlan::UnresolvableFatal { .. } => false,
            DispatchPlan::StaticMethodCall { direct, .. } => !direct,
            _ => true,
        }
    }

    pub fn is_method(&self) -> bool {
        matches!(
            self,
            DispatchPlan::StaticMethodCall { .. }
                | DispatchPlan::DynamicMethodLookupByName { .. }
                | DispatchPlan::DynamicMethodLookupByRuntimeClass { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            DispatchPlan::DirectFunctionCall { .. } => "DirectFunctionCall",
            DispatchPlan::StaticMethodCall { .. } => "StaticMethodCall",
            DispatchPlan::DynamicFunctionLookup { .. } => "DynamicFunctionLookup",
            DispatchPlan::DynamicMethodLookupByName { .. } => "DynamicMethodLookupByName",
            DispatchPlan::DynamicMethodLookupByRuntimeClass { .. } => {
                "DynamicMethodLookupByRuntimeClass"
            }
            DispatchPlan::UnresolvableFatal { .. } => "UnresolvableFatal",
        }
    }
}

/// Values the emitted sequence materializes before the call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Temporaries {
    pub class_value: bool,
    pub method_name: bool,
    pub dispatch_handle: bool,
}

impl Temporaries {
    fn for_plan(
        plan: &DispatchPlan,
        class_expr: Option<&TirExpr>,
        name_expr: Option<&TirExpr>,
    ) -> Self {
        let runtime_name = |operand: &NameOperand| {
            matches!(operand, NameOperand::Expression) && name_expr.is_some_and(|e| !e.is_simple())
        };
        let runtime_class = |operand: &ClassOperand| match operand {
            ClassOperand::Literal(_) => false,
            ClassOperand::LateStatic => true,
            ClassOperand::Expression => class_expr.is_some_and(|e| !e.is_simple()),
        };

        let (class_value, method_name) = match plan {
            DispatchPlan::DirectFunctionCall { .. } | DispatchPlan::UnresolvableFatal { .. } => {
                (false, false)
            }
            DispatchPlan::DynamicFunctionLookup { name } => (false, runtime_name(name)),
            DispatchPlan::StaticMethodCall { method, .. } => (false, runtime_name(method)),
            DispatchPlan::DynamicMethodLookupByName { class, method } => {
                (runtime_class(class), runtime_name(method))
            }
            // `mcp.name` points at the name, so it needs an lvalue.
            DispatchPlan::DynamicMethodLookupByRuntimeClass {
                class,
                receiver: Receiver::This,
                ..
            } => (runtime_class(class), true),
            DispatchPlan::DynamicMethodLookupByRuntimeClass { class, method, .. } => {
                (runtime_class(class), runtime_name(method))
            }
        };

        Self {
            class_value,
            method_name,
            dispatch_handle: plan.uses_descriptor(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallPlan {
    #[serde(flatten)]
    pub plan: DispatchPlan,
    pub temporaries: Temporaries,
}
