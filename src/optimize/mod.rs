//! Constant folding of call sites.
//!
//! [`fold_call`] is pure: it looks at one call node and either returns a
//! replacement or nothing. [`optimize_unit`] is the rewrite driver that
//! substitutes replacements into the tree until a fixpoint.

use crate::symbol_table::SymbolTable;
use crate::tir::{
    CallSite, ClassReference, NameExpression, StaticCall, StaticClass, TirExpr, TirExprKind,
    TirStmt, TirUnit,
};

/// Try to bind a call statically.
///
/// A constant name with no class, or with a class known at compile time,
/// becomes a [`StaticCall`]. With a runtime or late-bound class only the
/// name is folded, and only when that simplifies it.
pub fn fold_call(expr: &TirExpr, symbols: &SymbolTable) -> Option<TirExpr> {
    let TirExprKind::DynamicCall(site) = &expr.kind else {
        return None;
    };
    let name = site.name.constant_value.as_ref()?;

    let class = match &site.class_ref {
        ClassReference::None => None,
        ClassReference::StaticKnownUnique(id) => Some(StaticClass {
            name: symbols.class(*id).name.clone(),
            id: Some(*id),
        }),
        ClassReference::StaticKnownRedeclared(class_name) => Some(StaticClass {
            name: class_name.clone(),
            id: None,
        }),
        ClassReference::DynamicExpression(_)
        | ClassReference::SelfBinding
        | ClassReference::ParentBinding
        | ClassReference::StaticBinding => {
            if site.name.is_plain_literal() {
                return None;
            }
            let folded = CallSite {
                name: NameExpression::new(TirExpr::str_literal(name.clone(), site.name.expr.line)),
                ..(**site).clone()
            };
            return Some(TirExpr {
                kind: TirExprKind::DynamicCall(Box::new(folded)),
                ty: expr.ty.clone(),
                line: expr.line,
            });
        }
        ClassReference::Unknown(_) => return None,
    };

    Some(TirExpr::new(
        TirExprKind::StaticCall(Box::new(StaticCall {
            name: name.clone(),
            class,
            arguments: site.arguments.clone(),
            arg_modes: site.arg_modes.clone(),
            enclosing_function_id: site.enclosing_function_id,
            enclosing_class_id: site.enclosing_class_id,
            line: site.line,
        })),
        expr.line,
    ))
}

/// Fold every call of the unit, repeating until nothing changes or
/// `max_iterations` passes ran. Returns the number of rewrites.
pub fn optimize_unit(unit: &mut TirUnit, symbols: &SymbolTable, max_iterations: usize) -> usize {
    let mut total = 0;
    for iteration in 0..max_iterations {
        let mut rewrites = 0;
        for function in &mut unit.functions {
            for stmt in &mut function.body {
                match stmt {
                    TirStmt::Expr(expr) | TirStmt::Return(Some(expr)) => {
                        rewrites += rewrite_expr(expr, symbols)
                    }
                    TirStmt::Return(None) => {}
                }
            }
        }
        log::debug!(
            "{}: optimization pass {} rewrote {} call(s)",
            unit.path,
            iteration + 1,
            rewrites
        );
        total += rewrites;
        if rewrites == 0 {
            break;
        }
    }
    total
}

fn rewrite_expr(expr: &mut TirExpr, symbols: &SymbolTable) -> usize {
    let mut rewrites = 0;
    match &mut expr.kind {
        TirExprKind::Concat(left, right) => {
            rewrites += rewrite_expr(left, symbols) + rewrite_expr(right, symbols);
        }
        TirExprKind::Assign { value, .. } => rewrites += rewrite_expr(value, symbols),
        TirExprKind::DynamicCall(site) => {
            let mut name_expr = std::mem::replace(&mut site.name.expr, TirExpr::new(TirExprKind::Null, 0));
            rewrites += rewrite_expr(&mut name_expr, symbols);
            site.name = NameExpression::new(name_expr);
            if let Some(class_expr) = site.class_ref.expression_mut() {
                rewrites += rewrite_expr(class_expr, symbols);
            }
            for arg in &mut site.arguments {
                rewrites += rewrite_expr(arg, symbols);
            }
        }
        TirExprKind::StaticCall(call) => {
            for arg in &mut call.arguments {
                rewrites += rewrite_expr(arg, symbols);
            }
        }
        _ => {}
    }

    if let Some(replacement) = fold_call(expr, symbols) {
        *expr = replacement;
        rewrites += 1;
    }
    rewrites
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use serde_json::json;

    fn caller(body: Vec<serde_json::Value>) -> serde_json::Value {
        json!({"units": [{"path": "a.php",
            "classes": [
                {"name": "Shape", "methods": [{"name": "area"}]},
                {"name": "Twin"}, {"name": "Twin", "conditional": true},
            ],
            "functions": [
                {"name": "foo", "params": [{"name": "a", "optional": true}]},
                {"name": "caller", "body": body.into_iter().map(|e| json!({"expr": e})).collect::<Vec<_>>()},
            ],
        }]})
    }

    #[test]
    fn literal_function_name_becomes_a_static_call() {
        let mut a = analyze(caller(vec![call(s("foo"), None, vec![s("x")])]));
        let original = stmt_expr(&a.units[0].functions[1].body, 0).clone();

        let folded = fold_call(&original, &a.symbols).unwrap();
        let TirExprKind::StaticCall(call) = &folded.kind else {
            panic!("expected a static call, got {:?}", folded.kind);
        };
        assert_eq!(call.name, "foo");
        assert!(call.class.is_none());
        assert_eq!(call.arguments.len(), 1);
        assert!(fold_call(&folded, &a.symbols).is_none());

        // The original node is untouched by folding.
        assert!(matches!(original.kind, TirExprKind::DynamicCall(_)));

        assert_eq!(optimize_unit(&mut a.units[0], &a.symbols, 4), 1);
        assert_eq!(optimize_unit(&mut a.units[0], &a.symbols, 4), 0);
        assert_eq!(static_call(&a.units[0].functions[1].body, 0).name, "foo");
    }

    #[test]
    fn static_classes_fold_with_their_binding() {
        let mut a = analyze(caller(vec![
            call(s("area"), Some(name("shape")), vec![]),
            call(s("make"), Some(name("Twin")), vec![]),
        ]));
        optimize_unit(&mut a.units[0], &a.symbols, 4);
        let body = &a.units[0].functions[1].body;
        let unique = static_call(body, 0).class.clone().unwrap();
        assert_eq!(unique.name, "Shape");
        assert!(!unique.is_redeclared());
        assert!(static_call(body, 1).class.as_ref().unwrap().is_redeclared());
    }

    #[test]
    fn dynamic_class_keeps_the_call_dynamic_but_folds_the_name() {
        let mut a = analyze(caller(vec![call(
            concat(s("ar"), s("ea")),
            Some(var("cls")),
            vec![],
        )]));
        assert_eq!(optimize_unit(&mut a.units[0], &a.symbols, 4), 1);
        let folded = site(&a.units[0].functions[1].body, 0);
        assert!(folded.name.is_plain_literal());
        assert_eq!(folded.name.constant_value.as_deref(), Some("area"));
        assert!(matches!(folded.class_ref, ClassReference::DynamicExpression(_)));
    }

    #[test]
    fn unknown_classes_and_runtime_names_are_left_alone() {
        let mut a = analyze(caller(vec![
            call(s("run"), Some(name("Undeclared")), vec![]),
            call(var("f"), None, vec![]),
            arrow_call(s("area"), var("obj"), vec![]),
        ]));
        assert_eq!(optimize_unit(&mut a.units[0], &a.symbols, 4), 0);
        let body = &a.units[0].functions[1].body;
        assert!(matches!(site(body, 0).class_ref, ClassReference::Unknown(_)));
        assert!(!site(body, 1).name.is_constant);
    }

    #[test]
    fn nested_calls_in_arguments_are_folded_too() {
        let mut a = analyze(caller(vec![call(
            var("f"),
            None,
            vec![call(s("foo"), None, vec![])],
        )]));
        assert_eq!(optimize_unit(&mut a.units[0], &a.symbols, 4), 1);
        let outer = site(&a.units[0].functions[1].body, 0);
        assert!(matches!(outer.arguments[0].kind, TirExprKind::StaticCall(_)));
    }
}
