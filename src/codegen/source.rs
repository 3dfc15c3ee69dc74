use super::CodeGenerator;
use crate::dispatch::{select_dynamic, select_static};
use crate::options::EmitTarget;
use crate::symbol_table::ClassId;
use crate::tir::{CallSite, ClassReference, StaticCall, TirExpr, TirExprKind, TirFunction, TirStmt, TirUnit};

impl<'a> CodeGenerator<'a> {
    pub(super) fn emit_source_unit(&mut self, unit: &TirUnit) {
        emit_line!(self, "// {}", unit.path);
        let mut open_class: Option<ClassId> = None;

        for function in &unit.functions {
            if function.class != open_class {
                if open_class.is_some() {
                    self.indent -= 1;
                    emit_line!(self, "}}");
                }
                if let Some(id) = function.class {
                    let class = self.symbols.class(id);
                    match &class.parent {
                        Some(parent) => emit_line!(self, "class {} extends {} {{", class.name, parent),
                        None => emit_line!(self, "class {} {{", class.name),
                    }
                    self.indent += 1;
                }
                open_class = function.class;
            }
            self.emit_source_function(function);
        }

        if open_class.is_some() {
            self.indent -= 1;
            emit_line!(self, "}}");
        }
    }

    fn emit_source_function(&mut self, function: &TirFunction) {
        self.enter_function(function);
        let params: Vec<String> = function
            .params
            .iter()
            .map(|p| format!("{}${}", if p.by_ref { "&" } else { "" }, p.name))
            .collect();
        let modifier = if function.is_static { "static " } else { "" };

        emit_line!(self, "{}function {}({}) {{", modifier, function.name, params.join(", "));
        self.indent += 1;
        for stmt in &function.body {
            let line = match stmt {
                TirStmt::Expr(expr) => format!("{};", self.source_expr(expr)),
                TirStmt::Return(Some(expr)) => format!("return {};", self.source_expr(expr)),
                TirStmt::Return(None) => "return;".to_string(),
            };
            self.push_line(line);
        }
        self.indent -= 1;
        emit_line!(self, "}}");
    }

    fn source_expr(&mut self, expr: &TirExpr) -> String {
        match &expr.kind {
            TirExprKind::StrLiteral(s) => source_string(s),
            TirExprKind::IntLiteral(i) => i.to_string(),
            TirExprKind::Null => "null".to_string(),
            TirExprKind::Var(name) => format!("${}", name),
            TirExprKind::This => "$this".to_string(),
            TirExprKind::ClassName(name) => name.clone(),
            TirExprKind::Concat(left, right) => {
                format!("{} . {}", self.source_expr(left), self.source_expr(right))
            }
            TirExprKind::Assign { target, value } => {
                format!("${} = {}", target, self.source_expr(value))
            }
            TirExprKind::DynamicCall(site) => self.source_dynamic_call(site),
            TirExprKind::StaticCall(call) => self.source_static_call(call),
        }
    }

    fn source_dynamic_call(&mut self, site: &CallSite) -> String {
        let plan = select_dynamic(site, self.symbols);
        self.record_plan(&plan, site.line);

        let callee = match &site.class_ref {
            ClassReference::None => self.source_function_name(&site.name.expr),
            class_ref => {
                let class = match class_ref {
                    ClassReference::SelfBinding => "self".to_string(),
                    ClassReference::ParentBinding => "parent".to_string(),
                    ClassReference::StaticBinding => "static".to_string(),
                    ClassReference::StaticKnownUnique(id) => self.symbols.class(*id).name.clone(),
                    ClassReference::StaticKnownRedeclared(name) | ClassReference::Unknown(name) => {
                        name.clone()
                    }
                    ClassReference::DynamicExpression(expr) => self.source_expr(expr),
                    ClassReference::None => String::new(),
                };
                let method = match &site.name.expr.kind {
                    TirExprKind::StrLiteral(name) => name.clone(),
                    TirExprKind::Var(name) => format!("${}", name),
                    _ => format!("{{{}}}", self.source_expr(&site.name.expr)),
                };
                let separator = if site.arrow { "->" } else { "::" };
                format!("{}{}{}", class, separator, method)
            }
        };
        format!("{}({})", callee, self.source_arguments(&site.arguments))
    }

    fn source_static_call(&mut self, call: &StaticCall) -> String {
        let plan = select_static(call, self.symbols);
        self.record_plan(&plan, call.line);
        let args = self.source_arguments(&call.arguments);
        match &call.class {
            Some(class) => format!("{}::{}({})", class.name, call.name, args),
            None => format!("{}({})", call.name, args),
        }
    }

    /// A function name that is not a literal. Trimmed output routes it
    /// through `dynamic_load`.
    fn source_function_name(&mut self, name: &TirExpr) -> String {
        if let TirExprKind::StrLiteral(literal) = &name.kind {
            return literal.clone();
        }
        let text = self.source_expr(name);
        if self.options.emit == EmitTarget::Trimmed {
            return format!("${{dynamic_load($tmp = ({}), 'tmp')}}", text);
        }
        match name.kind {
            TirExprKind::Var(_) => text,
            _ => format!("({})", text),
        }
    }

    fn source_arguments(&mut self, arguments: &[TirExpr]) -> String {
        arguments
            .iter()
            .map(|arg| self.source_expr(arg))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Single-quoted source string literal.
fn source_string(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{body, compile_with};
    use super::*;
    use crate::test_support::*;
    use serde_json::json;

    fn program() -> serde_json::Value {
        json!({"units": [{"path": "a.php",
            "classes": [
                {"name": "Base", "methods": [{"name": "hello"}]},
                {"name": "Child", "parent": "Base", "methods": [
                    {"name": "greet", "params": [{"name": "m"}], "body": body(vec![
                        call(s("hello"), Some(name("parent")), vec![]),
                        arrow_call(var("m"), this(), vec![s("it's")]),
                    ])},
                ]},
            ],
            "functions": [
                {"name": "run", "params": [{"name": "out", "by_ref": true}], "body": body(vec![
                    call(var("f"), None, vec![var("out")]),
                    call(s("hello"), Some(name("Base")), vec![]),
                    call(concat(s("he"), var("x")), None, vec![]),
                ])},
            ],
        }]})
    }

    #[test]
    fn prints_calls_back_in_source_form() {
        let out = compile_with(program(), EmitTarget::Source);
        assert_eq!(
            out.text,
            "// a.php\n\
             class Base {\n\
             \x20 function hello() {\n\
             \x20 }\n\
             }\n\
             class Child extends Base {\n\
             \x20 function greet($m) {\n\
             \x20   parent::hello();\n\
             \x20   $this->$m('it\\'s');\n\
             \x20 }\n\
             }\n\
             function run(&$out) {\n\
             \x20 $f($out);\n\
             \x20 Base::hello();\n\
             \x20 ('he' . $x)();\n\
             }\n"
        );
        assert_eq!(out.plans.len(), 5);
    }

    #[test]
    fn trimmed_output_loads_dynamic_names() {
        let out = compile_with(program(), EmitTarget::Trimmed);
        assert!(out.text.contains("  ${dynamic_load($tmp = ($f), 'tmp')}($out);\n"));
        assert!(out.text.contains("  ${dynamic_load($tmp = ('he' . $x), 'tmp')}();\n"));
        assert!(out.text.contains("  Base::hello();\n"));
    }
}
