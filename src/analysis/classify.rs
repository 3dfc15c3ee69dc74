use anyhow::{anyhow, Result};

use super::{resolve_class_reference, Analyzer};
use crate::symbol_table::FunctionInfo;
use crate::tir::{CallSite, ClassReference, NameExpression, ParamMode, TirExpr};

impl<'a> Analyzer<'a> {
    /// Build the call-site record for one call and record what it implies
    /// for its enclosing function.
    pub(super) fn classify_call(
        &mut self,
        name: TirExpr,
        class: Option<TirExpr>,
        arguments: Vec<TirExpr>,
        arrow: bool,
        line: usize,
    ) -> Result<CallSite> {
        let enclosing_function_id = self
            .current_function
            .ok_or_else(|| anyhow!("call at line {} outside of a function body", line))?;
        let name = NameExpression::new(name);

        let class_ref = match class {
            // The object of `$obj->m()` is a runtime value whatever it looks like.
            Some(object) if arrow => ClassReference::DynamicExpression(Box::new(object)),
            class => resolve_class_reference(class, self.current_class, self.symbols)
                .map_err(|e| self.late_binding_error(line, e))?,
        };

        match &class_ref {
            ClassReference::StaticKnownUnique(id) => {
                self.class_deps.insert(self.symbols.class(*id).name.clone());
            }
            ClassReference::StaticKnownRedeclared(class_name)
            | ClassReference::Unknown(class_name) => {
                self.class_deps.insert(class_name.clone());
            }
            ClassReference::SelfBinding | ClassReference::ParentBinding => {
                let symbols = self.symbols;
                if let Some(class) = self.current_class.map(|id| symbols.class(id)) {
                    let bound = match class_ref {
                        ClassReference::SelfBinding => Some(&class.name),
                        _ => class.parent.as_ref(),
                    };
                    if let Some(bound) = bound {
                        self.class_deps.insert(bound.clone());
                    }
                }
            }
            _ => {}
        }

        let target = self.static_target(&name, &class_ref);
        if let Some(target) = target {
            self.check_arity(line, target, arguments.len())?;
        }

        let arg_modes = arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| param_mode(target, i, arg))
            .collect();

        if matches!(class_ref, ClassReference::None) && !name.is_constant {
            if let Some(attributes) = &self.current_attributes {
                attributes.mark_dynamic_function_call();
            }
        }

        log::debug!(
            "{}:{}: classified call (constant name: {:?}, class: {:?}, static target: {})",
            self.current_file,
            line,
            name.constant_value,
            class_ref_label(&class_ref),
            target.is_some()
        );

        Ok(CallSite {
            name,
            class_ref,
            arguments,
            arg_modes,
            arrow,
            enclosing_function_id,
            enclosing_class_id: self.current_class,
            line,
        })
    }

    /// The callee, when a constant name and a static class pin it down.
    fn static_target(
        &self,
        name: &NameExpression,
        class_ref: &ClassReference,
    ) -> Option<&'a FunctionInfo> {
        let symbols = self.symbols;
        let callee = name.constant_value.as_deref()?;
        match class_ref {
            ClassReference::None => symbols.resolve_function(callee),
            ClassReference::StaticKnownUnique(id) => symbols.find_method(*id, callee),
            _ => None,
        }
    }

    fn check_arity(&self, line: usize, target: &FunctionInfo, given: usize) -> Result<()> {
        if target.accepts(given) {
            return Ok(());
        }
        let required = target.required_args();
        let expected = if target.variadic {
            format!("at least {}", required)
        } else if required == target.params.len() {
            required.to_string()
        } else {
            format!("{} to {}", required, target.params.len())
        };
        let callee = match target.class {
            Some(class) => format!("{}::{}", self.symbols.class(class).name, target.name),
            None => target.name.clone(),
        };
        Err(self.argument_error(
            line,
            format!(
                "{}() expects {} argument{}, got {}",
                callee,
                expected,
                if target.params.len() == 1 { "" } else { "s" },
                given
            ),
        ))
    }
}

fn param_mode(target: Option<&FunctionInfo>, index: usize, arg: &TirExpr) -> ParamMode {
    if !arg.is_lvalue() {
        return ParamMode::ByValue;
    }
    match target {
        Some(t) if t.params.get(index).is_some_and(|p| p.by_ref) => ParamMode::ByRef,
        Some(_) => ParamMode::ByValue,
        None => ParamMode::Deferred,
    }
}

fn class_ref_label(class_ref: &ClassReference) -> &'static str {
    match class_ref {
        ClassReference::None => "none",
        ClassReference::StaticKnownUnique(_) => "unique",
        ClassReference::StaticKnownRedeclared(_) => "redeclared",
        ClassReference::DynamicExpression(_) => "dynamic",
        ClassReference::SelfBinding => "self",
        ClassReference::ParentBinding => "parent",
        ClassReference::StaticBinding => "static",
        ClassReference::Unknown(_) => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::{CompileError, ErrorCategory};
    use crate::symbol_table::FunctionId;
    use crate::test_support::*;
    use crate::tir::{ClassReference, ParamMode};
    use serde_json::json;

    #[test]
    fn dynamic_function_call_marks_scope() {
        let a = analyze(json!({"units": [{"path": "a.php", "functions": [
            {"name": "caller", "body": [{"expr": call(var("f"), None, vec![])}]},
            {"name": "quiet", "body": [{"expr": call(s("strlen"), None, vec![s("x")])}]},
        ]}]}));
        assert!(a.attributes.of(FunctionId(0)).contains_dynamic_function_call());
        assert!(!a.attributes.of(FunctionId(1)).contains_dynamic_function_call());
    }

    #[test]
    fn method_calls_never_mark_scope() {
        let a = analyze(json!({"units": [{"path": "a.php", "functions": [
            {"name": "caller", "body": [
                {"expr": call(var("m"), Some(var("cls")), vec![])},
                {"expr": arrow_call(var("m"), var("obj"), vec![])},
            ]},
        ]}]}));
        assert!(!a.attributes.of(FunctionId(0)).contains_dynamic_function_call());
    }

    #[test]
    fn arguments_follow_the_static_target_signature() {
        let a = analyze(json!({"units": [{"path": "a.php", "functions": [
            {"name": "swap", "params": [{"name": "a", "by_ref": true}, {"name": "b"}]},
            {"name": "caller", "body": [
                {"expr": call(s("swap"), None, vec![var("x"), var("y")])},
                {"expr": call(var("f"), None, vec![var("x"), s("lit")])},
            ]},
        ]}]}));
        let body = &a.units[0].functions[1].body;
        assert_eq!(site(body, 0).arg_modes, vec![ParamMode::ByRef, ParamMode::ByValue]);
        assert_eq!(site(body, 1).arg_modes, vec![ParamMode::Deferred, ParamMode::ByValue]);
    }

    #[test]
    fn arity_mismatch_against_known_method_is_an_error() {
        let err = try_analyze(json!({"units": [{"path": "a.php", "classes": [
            {"name": "Util", "methods": [
                {"name": "pair", "is_static": true, "params": [{"name": "a"}, {"name": "b"}]},
            ]},
        ], "functions": [
            {"name": "caller", "body": [
                {"expr": call(s("pair"), Some(name("Util")), vec![s("only")]).with_line(4)},
            ]},
        ]}]}))
        .unwrap_err();
        let ce = err.downcast_ref::<CompileError>().unwrap();
        assert_eq!(ce.category, ErrorCategory::ArgumentError);
        assert_eq!(ce.line, 4);
        assert_eq!(ce.message, "Util::pair() expects 2 arguments, got 1");
        assert_eq!(ce.function_name.as_deref(), Some("caller"));
    }

    #[test]
    fn self_outside_a_class_is_a_binding_error() {
        let err = try_analyze(json!({"units": [{"path": "a.php", "functions": [
            {"name": "caller", "body": [{"expr": call(var("m"), Some(name("self")), vec![])}]},
        ]}]}))
        .unwrap_err();
        let ce = err.downcast_ref::<CompileError>().unwrap();
        assert_eq!(ce.category, ErrorCategory::BindingError);
        assert!(ce.help.as_deref().is_some_and(|h| h.contains("name the class")));
    }

    #[test]
    fn records_literal_class_dependencies() {
        let a = analyze(json!({"units": [{"path": "a.php", "functions": [
            {"name": "caller", "body": [
                {"expr": call(var("m"), Some(name("Missing")), vec![])},
                {"expr": call(var("m"), Some(var("dyn")), vec![])},
            ]},
        ]}]}));
        assert_eq!(a.units[0].class_deps, vec!["Missing".to_string()]);
        let body = &a.units[0].functions[0].body;
        assert!(matches!(site(body, 0).class_ref, ClassReference::Unknown(_)));
    }

    #[test]
    fn late_bindings_and_parents_are_dependencies() {
        let a = analyze(json!({"units": [
            {"path": "child.php", "classes": [
                {"name": "Child", "parent": "Base", "methods": [
                    {"name": "go", "body": [
                        {"expr": call(s("hello"), Some(name("parent")), vec![])},
                        {"expr": call(s("go"), Some(name("self")), vec![])},
                    ]},
                ]},
                {"name": "Leaf", "parent": "Middle"},
            ]},
            {"path": "base.php", "classes": [{"name": "Base", "methods": [{"name": "hello"}]}, {"name": "Middle"}]},
        ]}));
        assert_eq!(
            a.units[0].class_deps,
            vec!["Base".to_string(), "Child".to_string(), "Middle".to_string()]
        );
        assert!(a.units[1].class_deps.is_empty());
    }
}
