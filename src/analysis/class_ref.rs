use thiserror::Error;

use crate::symbol_table::{ClassId, ClassLookup, SymbolTable};
use crate::tir::{ClassReference, Scalar, TirExpr};

/// `self::` / `parent::` used where no class context exists. The resolver
/// only reports it; the classifier turns it into a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LateBindingError {
    #[error("cannot use `self::` when no class scope is active")]
    SelfOutsideClass,
    #[error("cannot use `parent::` when no class scope is active")]
    ParentOutsideClass,
    #[error("cannot use `parent::` in class `{0}`, which has no parent")]
    NoParent(String),
}

impl LateBindingError {
    pub fn help(&self) -> String {
        match self {
            LateBindingError::SelfOutsideClass | LateBindingError::ParentOutsideClass => {
                "late bindings resolve against the enclosing class; name the class instead"
                    .to_string()
            }
            LateBindingError::NoParent(class) => {
                format!("declare `{}` with `extends` to give it a parent", class)
            }
        }
    }
}

/// Classify the class part of a call.
pub fn resolve_class_reference(
    class_expr: Option<TirExpr>,
    enclosing_class: Option<ClassId>,
    symbols: &SymbolTable,
) -> Result<ClassReference, LateBindingError> {
    let Some(expr) = class_expr else {
        return Ok(ClassReference::None);
    };

    match expr.late_binding_keyword() {
        Some("self") => {
            return match enclosing_class {
                Some(_) => Ok(ClassReference::SelfBinding),
                None => Err(LateBindingError::SelfOutsideClass),
            }
        }
        Some("parent") => {
            let class = enclosing_class.ok_or(LateBindingError::ParentOutsideClass)?;
            let info = symbols.class(class);
            return match info.parent {
                Some(_) => Ok(ClassReference::ParentBinding),
                None => Err(LateBindingError::NoParent(info.name.clone())),
            };
        }
        Some(_) => return Ok(ClassReference::StaticBinding),
        None => {}
    }

    let name = match expr.scalar_value() {
        Some(Scalar::Str(name)) => name,
        Some(Scalar::Int(i)) => i.to_string(),
        None => return Ok(ClassReference::DynamicExpression(Box::new(expr))),
    };

    Ok(match symbols.resolve_class(&name) {
        ClassLookup::Unique(id) => ClassReference::StaticKnownUnique(id),
        ClassLookup::Redeclared => ClassReference::StaticKnownRedeclared(name),
        ClassLookup::Absent => ClassReference::Unknown(name),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Program;
    use crate::tir::TirExprKind;
    use serde_json::json;

    fn symbols() -> SymbolTable {
        let program: Program = serde_json::from_value(json!({"units": [
            {"path": "a.php", "classes": [
                {"name": "Base"},
                {"name": "Child", "parent": "Base"},
                {"name": "Dup"},
                {"name": "Dup", "conditional": true},
            ]}
        ]}))
        .unwrap();
        SymbolTable::collect(&program).unwrap()
    }

    fn name(s: &str) -> Option<TirExpr> {
        Some(TirExpr::new(TirExprKind::ClassName(s.into()), 1))
    }

    #[test]
    fn absent_class_is_a_function_call() {
        let r = resolve_class_reference(None, None, &symbols()).unwrap();
        assert!(matches!(r, ClassReference::None));
    }

    #[test]
    fn constant_names_go_through_the_symbol_table() {
        let t = symbols();
        assert!(matches!(
            resolve_class_reference(name("child"), None, &t).unwrap(),
            ClassReference::StaticKnownUnique(ClassId(1))
        ));
        assert!(matches!(
            resolve_class_reference(name("Dup"), None, &t).unwrap(),
            ClassReference::StaticKnownRedeclared(n) if n == "Dup"
        ));
        assert!(matches!(
            resolve_class_reference(name("Undeclared"), None, &t).unwrap(),
            ClassReference::Unknown(n) if n == "Undeclared"
        ));

        let concat = TirExpr::new(
            TirExprKind::Concat(
                Box::new(TirExpr::str_literal("Ba", 1)),
                Box::new(TirExpr::str_literal("se", 1)),
            ),
            1,
        );
        assert!(matches!(
            resolve_class_reference(Some(concat), None, &t).unwrap(),
            ClassReference::StaticKnownUnique(ClassId(0))
        ));
    }

    #[test]
    fn runtime_values_stay_dynamic() {
        let var = TirExpr::new(TirExprKind::Var("cls".into()), 1);
        let r = resolve_class_reference(Some(var), None, &symbols()).unwrap();
        assert!(matches!(r, ClassReference::DynamicExpression(_)));
    }

    #[test]
    fn late_bindings_validate_class_context() {
        let t = symbols();
        assert!(matches!(
            resolve_class_reference(name("SELF"), Some(ClassId(0)), &t).unwrap(),
            ClassReference::SelfBinding
        ));
        assert!(matches!(
            resolve_class_reference(name("parent"), Some(ClassId(1)), &t).unwrap(),
            ClassReference::ParentBinding
        ));
        assert!(matches!(
            resolve_class_reference(name("static"), None, &t).unwrap(),
            ClassReference::StaticBinding
        ));
        assert_eq!(
            resolve_class_reference(name("self"), None, &t).unwrap_err(),
            LateBindingError::SelfOutsideClass
        );
        assert_eq!(
            resolve_class_reference(name("parent"), Some(ClassId(0)), &t).unwrap_err(),
            LateBindingError::NoParent("Base".into())
        );
    }
}
