use super::expr::cpp_string;
use super::runtime_fn::{CppTy, RuntimeFn};
use super::CodeGenerator;
use crate::dispatch::{
    select_dynamic, select_static, CallPlan, ClassOperand, DispatchPlan, NameOperand, Receiver,
};
use crate::tir::{CallSite, ParamMode, StaticCall, TirExpr, TirExprKind};

/// The parts of a call the plan refers to.
struct CallParts<'e> {
    class_expr: Option<&'e TirExpr>,
    name_expr: Option<&'e TirExpr>,
    arguments: &'e [TirExpr],
    arg_modes: &'e [ParamMode],
}

impl<'a> CodeGenerator<'a> {
    pub(super) fn cpp_dynamic_call(&mut self, site: &CallSite) -> String {
        let plan = select_dynamic(site, self.symbols);
        self.record_plan(&plan, site.line);
        let parts = CallParts {
            class_expr: site.class_ref.expression(),
            name_expr: Some(&site.name.expr),
            arguments: &site.arguments,
            arg_modes: &site.arg_modes,
        };
        self.lower_plan(&plan, parts)
    }

    pub(super) fn cpp_static_call(&mut self, call: &StaticCall) -> String {
        let plan = select_static(call, self.symbols);
        self.record_plan(&plan, call.line);
        let parts = CallParts {
            class_expr: None,
            name_expr: None,
            arguments: &call.arguments,
            arg_modes: &call.arg_modes,
        };
        self.lower_plan(&plan, parts)
    }

    fn lower_plan(&mut self, call_plan: &CallPlan, parts: CallParts<'_>) -> String {
        let temps = call_plan.temporaries;

        let (id, callee) = match &call_plan.plan {
            // Nothing else of the call is evaluated.
            DispatchPlan::UnresolvableFatal { class } => {
                let message = cpp_string(&format!("unknown class {}", class));
                return RuntimeFn::ThrowFatal.call(&[&message]);
            }

            DispatchPlan::DirectFunctionCall { target } => {
                let args = self.cpp_arguments(&parts, None);
                return format!("{}({})", self.function_symbol(target), args);
            }

            DispatchPlan::StaticMethodCall {
                class,
                method: NameOperand::Literal(method),
                direct: true,
                ..
            } => {
                let args = self.cpp_arguments(&parts, None);
                return format!("{}({})", self.method_symbol(class, method), args);
            }

            DispatchPlan::StaticMethodCall {
                class,
                method,
                redeclared,
                ..
            } => {
                let (id, package) = self.method_package();
                let mth = self.name_operand(
                    method,
                    &parts,
                    temps.method_name,
                    id,
                    RuntimeFn::StaticMethodCall.params()[1],
                );
                emit_pre!(
                    self,
                    "{}.{};",
                    package,
                    RuntimeFn::StaticMethodCall.call(&[&cpp_string(class), &mth])
                );
                let p = &self.options.prefixes;
                let lookup = format!(
                    "{}{}",
                    p.object_static,
                    RuntimeFn::ClassGetCallInfo.call(&[&package])
                );
                let record = format!("{}{}", p.class_statics, class.to_ascii_lowercase());
                if *redeclared {
                    emit_pre!(self, "g->{}->{};", record, lookup);
                } else {
                    emit_pre!(self, "{}.{};", record, lookup);
                }
                (id, Callee::Method)
            }

            DispatchPlan::DynamicFunctionLookup { name } => {
                let id = self.next_local_id();
                let lookup = RuntimeFn::GetCallInfoOrFail;
                let name = self.name_operand(name, &parts, temps.method_name, id, lookup.params()[2]);
                let (cit, vt) = (format!("cit{}", id), format!("vt{}", id));
                emit_pre!(self, "{};", lookup.params()[0].declare(&cit));
                emit_pre!(self, "{};", lookup.params()[1].declare(&vt));
                emit_pre!(self, "{};", lookup.call(&[&cit, &vt, &name]));
                (id, Callee::Function)
            }

            DispatchPlan::DynamicMethodLookupByName { class, method } => {
                let (id, package) = self.method_package();
                let lookup = RuntimeFn::DynamicNamedCall;
                let cls = self.class_operand(class, &parts, temps.class_value, id);
                let mth = self.name_operand(method, &parts, temps.method_name, id, lookup.params()[1]);
                emit_pre!(self, "{}.{};", package, lookup.call(&[&cls, &mth]));
                (id, Callee::Method)
            }

            DispatchPlan::DynamicMethodLookupByRuntimeClass {
                class,
                method,
                receiver: Receiver::Object,
            } => {
                let (id, package) = self.method_package();
                let lookup = RuntimeFn::MethodCall;
                let obj = self.class_operand(class, &parts, temps.class_value, id);
                let mth = self.name_operand(method, &parts, temps.method_name, id, lookup.params()[1]);
                emit_pre!(self, "{}.{};", package, lookup.call(&[&obj, &mth]));
                (id, Callee::Method)
            }

            DispatchPlan::DynamicMethodLookupByRuntimeClass {
                class,
                method,
                receiver: Receiver::This,
            } => {
                let (id, package) = self.method_package();
                let cls = self.class_operand(class, &parts, temps.class_value, id);
                let mth = self.name_operand(method, &parts, true, id, CppTy::CStrRef);
                emit_pre!(self, "{}.isObj = true;", package);
                emit_pre!(self, "{}.rootObj = this;", package);
                emit_pre!(self, "{}.name = &{};", package, mth);
                emit_pre!(self, "{};", RuntimeFn::GetCallInfoEx.call(&[&cls, &package]));
                (id, Callee::Method)
            }
        };

        if callee == Callee::Method {
            let cit = CppTy::CallInfoOut.declare(&format!("cit{}", id));
            emit_pre!(self, "{} = mcp{}.ci;", cit, id);
        }
        let args = self.cpp_arguments(&parts, Some(id));
        let (getter, handle) = match callee {
            Callee::Function => ("getFunc", format!("vt{}", id)),
            Callee::Method => ("getMeth", format!("mcp{}", id)),
        };
        if args.is_empty() {
            format!("(cit{}->{}())({})", id, getter, handle)
        } else {
            format!("(cit{}->{}())({}, {})", id, getter, handle, args)
        }
    }

    /// A fresh `MethodCallPackage` and its id.
    fn method_package(&mut self) -> (usize, String) {
        let id = self.next_local_id();
        let package = format!("mcp{}", id);
        emit_pre!(self, "{};", CppTy::Package.declare(&package));
        (id, package)
    }

    /// Method or function name as passed to a lookup.
    fn name_operand(
        &mut self,
        operand: &NameOperand,
        parts: &CallParts<'_>,
        temp: bool,
        id: usize,
        temp_type: CppTy,
    ) -> String {
        let text = match (operand, parts.name_expr) {
            (NameOperand::Literal(name), _) => cpp_string(name),
            (NameOperand::Expression, Some(expr)) => {
                let text = self.cpp_expr(expr);
                if expr.is_simple() {
                    text
                } else {
                    format!("({})", text)
                }
            }
            (NameOperand::Expression, None) => "null".to_string(),
        };
        if !temp {
            return text;
        }
        let mth = format!("mth{}", id);
        emit_pre!(self, "{} = {};", temp_type.declare(&mth), text);
        mth
    }

    /// Class name or object as passed to a lookup.
    fn class_operand(
        &mut self,
        operand: &ClassOperand,
        parts: &CallParts<'_>,
        temp: bool,
        id: usize,
    ) -> String {
        let (text, temp_type) = match (operand, parts.class_expr) {
            (ClassOperand::Literal(name), _) => (cpp_string(name), CppTy::CStrRef),
            (ClassOperand::LateStatic, _) => (
                RuntimeFn::GetStaticClassName.call(&["fi.getThreadInfo()"]),
                CppTy::CStrRef,
            ),
            (ClassOperand::Expression, Some(expr)) => {
                let ty = if expr.ty.is_string() { CppTy::CStrRef } else { CppTy::CVarRef };
                (self.cpp_expr(expr), ty)
            }
            (ClassOperand::Expression, None) => ("null".to_string(), CppTy::CVarRef),
        };
        if !temp {
            return text;
        }
        let cls = format!("cls{}", id);
        emit_pre!(self, "{} = {};", temp_type.declare(&cls), text);
        cls
    }

    /// Arguments in order. Everything up to the last argument with side
    /// effects is stashed in a temporary so evaluation order holds. A
    /// deferred variable keeps its reference and stashes only the value.
    fn cpp_arguments(&mut self, parts: &CallParts<'_>, descriptor: Option<usize>) -> String {
        let last_effect = parts.arguments.iter().rposition(TirExpr::has_effect);
        let mut args = Vec::with_capacity(parts.arguments.len());

        for (i, arg) in parts.arguments.iter().enumerate() {
            let mode = parts.arg_modes.get(i).copied().unwrap_or(ParamMode::ByValue);
            let before_last_effect = last_effect.is_some_and(|last| i <= last);

            let text = match (&arg.kind, mode) {
                (TirExprKind::Var(name), ParamMode::ByRef) => format!("ref({})", self.variable(name)),
                (TirExprKind::Var(name), ParamMode::Deferred) => {
                    let var = self.variable(name);
                    let value = if before_last_effect {
                        self.stash(&var)
                    } else {
                        var.clone()
                    };
                    match descriptor {
                        Some(id) => format!("cit{}->isRef({}) ? ref({}) : {}", id, i, var, value),
                        None => value,
                    }
                }
                _ => {
                    let text = self.cpp_expr(arg);
                    let stash = before_last_effect && (!arg.is_simple() || arg.is_lvalue());
                    if stash {
                        self.stash(&text)
                    } else {
                        text
                    }
                }
            };
            args.push(text);
        }
        args.join(", ")
    }

    /// Evaluate `value` into a fresh `Variant` ahead of the statement.
    fn stash(&mut self, value: &str) -> String {
        let tmp = format!("tmp{}", self.next_local_id());
        emit_pre!(self, "{} = {};", CppTy::Variant.declare(&tmp), value);
        tmp
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Callee {
    Function,
    Method,
}
