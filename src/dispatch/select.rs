use super::{CallPlan, ClassOperand, DispatchPlan, NameOperand, Receiver, Temporaries};
use crate::symbol_table::{ClassId, ClassLookup, FunctionId, SymbolTable};
use crate::tir::{CallSite, ClassReference, StaticCall};

/// Class a method call is bound to once late bindings are resolved.
struct MethodTarget {
    name: String,
    /// Set when a single declaration carries the name.
    id: Option<ClassId>,
    redeclared: bool,
    /// Reached through `self::` / `parent::`.
    via_binding: bool,
}

/// Where the call sits.
struct CallContext {
    function: FunctionId,
    class: Option<ClassId>,
}

/// Pick the dispatch plan for a call site that is still dynamic.
pub fn select_dynamic(site: &CallSite, symbols: &SymbolTable) -> CallPlan {
    let method = NameOperand::from_name(&site.name);
    let context = CallContext {
        function: site.enclosing_function_id,
        class: site.enclosing_class_id,
    };

    let plan = match &site.class_ref {
        ClassReference::None => DispatchPlan::DynamicFunctionLookup { name: method },
        ClassReference::Unknown(class) => DispatchPlan::UnresolvableFatal {
            class: class.clone(),
        },
        ClassReference::DynamicExpression(_) if site.arrow => {
            DispatchPlan::DynamicMethodLookupByRuntimeClass {
                class: ClassOperand::Expression,
                method,
                receiver: Receiver::Object,
            }
        }
        // A class name computed at runtime still dispatches on `$this` from
        // an instance method; an object value or a static caller goes by name.
        ClassReference::DynamicExpression(expr)
            if expr.ty.is_string() && in_instance_method(&context, symbols) =>
        {
            DispatchPlan::DynamicMethodLookupByRuntimeClass {
                class: ClassOperand::Expression,
                method,
                receiver: Receiver::This,
            }
        }
        ClassReference::DynamicExpression(_) => DispatchPlan::DynamicMethodLookupByName {
            class: ClassOperand::Expression,
            method,
        },
        ClassReference::StaticBinding if in_instance_method(&context, symbols) => {
            DispatchPlan::DynamicMethodLookupByRuntimeClass {
                class: ClassOperand::LateStatic,
                method,
                receiver: Receiver::This,
            }
        }
        ClassReference::StaticBinding => DispatchPlan::DynamicMethodLookupByName {
            class: ClassOperand::LateStatic,
            method,
        },
        ClassReference::StaticKnownUnique(id) => {
            let target = MethodTarget {
                name: symbols.class(*id).name.clone(),
                id: Some(*id),
                redeclared: false,
                via_binding: false,
            };
            method_plan(target, method, &context, symbols)
        }
        ClassReference::StaticKnownRedeclared(name) => {
            let target = MethodTarget {
                name: name.clone(),
                id: None,
                redeclared: true,
                via_binding: false,
            };
            method_plan(target, method, &context, symbols)
        }
        binding @ (ClassReference::SelfBinding | ClassReference::ParentBinding) => {
            let keyword = if matches!(binding, ClassReference::SelfBinding) {
                "self"
            } else {
                "parent"
            };
            match binding_target(keyword, context.class, symbols) {
                Some(Ok(target)) => method_plan(target, method, &context, symbols),
                Some(Err(missing)) => DispatchPlan::UnresolvableFatal { class: missing },
                None => DispatchPlan::DynamicMethodLookupByName {
                    class: ClassOperand::Literal(keyword.to_string()),
                    method,
                },
            }
        }
    };

    let temporaries =
        Temporaries::for_plan(&plan, site.class_ref.expression(), Some(&site.name.expr));
    log::debug!("line {}: selected {}", site.line, plan.name());
    CallPlan { plan, temporaries }
}

/// Pick the dispatch plan for a call the optimizer bound statically.
pub fn select_static(call: &StaticCall, symbols: &SymbolTable) -> CallPlan {
    let plan = match &call.class {
        // An undeclared function fails at runtime, not in the C++ build.
        None if symbols.resolve_function(&call.name).is_none() => {
            DispatchPlan::DynamicFunctionLookup {
                name: NameOperand::Literal(call.name.clone()),
            }
        }
        None => DispatchPlan::DirectFunctionCall {
            target: call.name.clone(),
        },
        Some(class) => {
            let target = MethodTarget {
                name: class.name.clone(),
                id: class.id,
                redeclared: class.is_redeclared(),
                via_binding: false,
            };
            let context = CallContext {
                function: call.enclosing_function_id,
                class: call.enclosing_class_id,
            };
            method_plan(target, NameOperand::Literal(call.name.clone()), &context, symbols)
        }
    };

    let temporaries = Temporaries::for_plan(&plan, None, None);
    log::debug!("line {}: selected {}", call.line, plan.name());
    CallPlan { plan, temporaries }
}

/// Resolve `self` / `parent` against the enclosing class. `None` when there
/// is no class to resolve against, `Err` with the parent's name when the
/// parent is declared nowhere.
fn binding_target(
    keyword: &str,
    enclosing: Option<ClassId>,
    symbols: &SymbolTable,
) -> Option<Result<MethodTarget, String>> {
    let class = symbols.class(enclosing?);
    let name = match keyword {
        "self" => class.name.clone(),
        _ => class.parent.clone()?,
    };
    let (name, id, redeclared) = match symbols.resolve_class(&name) {
        ClassLookup::Unique(id) => (symbols.class(id).name.clone(), Some(id), false),
        ClassLookup::Redeclared => (name, None, true),
        ClassLookup::Absent => return Some(Err(name)),
    };
    Some(Ok(MethodTarget {
        name,
        id,
        redeclared,
        via_binding: true,
    }))
}

/// A call on a statically named class. It is polymorphic when made from an
/// instance method of that class or a subclass and the method may resolve
/// to an override below the target.
fn method_plan(
    target: MethodTarget,
    method: NameOperand,
    context: &CallContext,
    symbols: &SymbolTable,
) -> DispatchPlan {
    if let Some(enclosing) = context.class {
        let function = symbols.function(context.function);
        let enclosing_name = &symbols.class(enclosing).name;
        let related = enclosing_name.eq_ignore_ascii_case(&target.name)
            || symbols.derives_from(enclosing_name, &target.name);
        let overridable = match &method {
            NameOperand::Literal(name) => symbols.is_overridden_along(&target.name, enclosing, name),
            NameOperand::Expression => true,
        };
        if !function.is_static && related && overridable {
            return DispatchPlan::DynamicMethodLookupByRuntimeClass {
                class: ClassOperand::Literal(target.name),
                method,
                receiver: Receiver::This,
            };
        }
    }

    // `c_<cls>::t_<m>` only exists for a method the class hierarchy declares.
    let declared = match (&method, target.id) {
        (NameOperand::Literal(name), Some(id)) => symbols.find_method(id, name).is_some(),
        _ => false,
    };
    DispatchPlan::StaticMethodCall {
        direct: declared && !target.redeclared && !target.via_binding,
        class: target.name,
        method,
        redeclared: target.redeclared,
    }
}

fn in_instance_method(context: &CallContext, symbols: &SymbolTable) -> bool {
    context.class.is_some() && !symbols.function(context.function).is_static
}
