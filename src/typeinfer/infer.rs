use super::context::TypeContext;
use crate::symbol_table::SymbolTable;
use crate::tir::{
    ParamMode, StaticCall, TirExpr, TirExprKind, TirFunction, TirStmt, TirUnit, ValueType,
};

pub struct TypeInferencer<'a> {
    symbols: &'a SymbolTable,
    context: TypeContext,
}

impl<'a> TypeInferencer<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        Self {
            symbols,
            context: TypeContext::new(),
        }
    }

    /// Annotate every expression of the unit with its value type.
    pub fn infer_unit(&mut self, unit: &mut TirUnit) {
        for function in &mut unit.functions {
            self.infer_function(function);
        }
        log::debug!("{}: types inferred for {} function(s)", unit.path, unit.functions.len());
    }

    fn infer_function(&mut self, function: &mut TirFunction) {
        let this_type = match function.class {
            Some(class) if !function.is_static => {
                ValueType::Object(self.symbols.class(class).name.clone())
            }
            _ => ValueType::Any,
        };
        self.context.enter_function(this_type);

        for stmt in &mut function.body {
            match stmt {
                TirStmt::Expr(expr) | TirStmt::Return(Some(expr)) => self.infer_expr(expr),
                TirStmt::Return(None) => {}
            }
        }
    }

    fn infer_expr(&mut self, expr: &mut TirExpr) {
        let inferred = match &mut expr.kind {
            TirExprKind::StrLiteral(_) | TirExprKind::ClassName(_) => ValueType::Str,
            TirExprKind::IntLiteral(_) => ValueType::Int,
            TirExprKind::Null => ValueType::Null,
            TirExprKind::Var(name) => self.context.lookup_var(name),
            TirExprKind::This => self.context.this_type().clone(),

            TirExprKind::Concat(left, right) => {
                self.infer_expr(left);
                self.infer_expr(right);
                ValueType::Str
            }

            TirExprKind::Assign { target, value } => {
                self.infer_expr(value);
                self.context.assign_var(target, value.ty.clone());
                value.ty.clone()
            }

            TirExprKind::DynamicCall(site) => {
                // Name and class are evaluated before the arguments.
                self.infer_expr(&mut site.name.expr);
                if let Some(class_expr) = site.class_ref.expression_mut() {
                    self.infer_expr(class_expr);
                }
                for arg in &mut site.arguments {
                    self.infer_expr(arg);
                }
                self.release_references(&site.arguments, &site.arg_modes);
                ValueType::Any
            }

            TirExprKind::StaticCall(call) => {
                for arg in &mut call.arguments {
                    self.infer_expr(arg);
                }
                self.release_references(&call.arguments, &call.arg_modes);
                self.return_type(call)
            }
        };
        expr.ty = inferred;
    }

    /// The callee may rebind anything it gets by reference.
    fn release_references(&mut self, arguments: &[TirExpr], modes: &[ParamMode]) {
        for (arg, mode) in arguments.iter().zip(modes) {
            if let (TirExprKind::Var(name), ParamMode::ByRef | ParamMode::Deferred) = (&arg.kind, mode) {
                self.context.assign_var(name, ValueType::Any);
            }
        }
    }

    fn return_type(&self, call: &StaticCall) -> ValueType {
        let target = match &call.class {
            None => self.symbols.resolve_function(&call.name),
            Some(class) => class
                .id
                .and_then(|id| self.symbols.find_method(id, &call.name)),
        };
        target
            .and_then(|f| f.returns.as_ref())
            .map(ValueType::from_hint)
            .unwrap_or(ValueType::Any)
    }
}
