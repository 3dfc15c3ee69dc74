//! Target emission.
//!
//! One [`CodeGenerator`] renders one unit, either as C++ against the runtime
//! library or back in source form. Every call it meets goes through the
//! dispatch selector; the chosen plans are kept as [`PlanRecord`]s.

macro_rules! emit_line {
    ($cg:expr, $($arg:tt)*) => {
        $cg.push_line(format!($($arg)*))
    };
}

/// Queue a line to run before the statement being emitted.
macro_rules! emit_pre {
    ($cg:expr, $($arg:tt)*) => {
        $cg.prelude.push(format!($($arg)*))
    };
}

mod call;
mod expr;
pub(crate) mod runtime_fn;
mod source;

use serde::Serialize;

use crate::analysis::ScopeAttributeTable;
use crate::dispatch::CallPlan;
use crate::options::{CodegenOptions, EmitTarget};
use crate::symbol_table::SymbolTable;
use crate::tir::{TirFunction, TirStmt, TirUnit};

/// A selected plan and where it was selected.
#[derive(Debug, Clone, Serialize)]
pub struct PlanRecord {
    pub unit: String,
    pub function: String,
    pub line: usize,
    #[serde(flatten)]
    pub plan: CallPlan,
}

#[derive(Debug, Clone)]
pub struct UnitOutput {
    pub index: usize,
    pub path: String,
    pub text: String,
    pub plans: Vec<PlanRecord>,
}

pub struct CodeGenerator<'a> {
    symbols: &'a SymbolTable,
    attributes: &'a ScopeAttributeTable,
    options: &'a CodegenOptions,

    out: String,
    indent: usize,
    /// Lines the current statement needs before its own text.
    prelude: Vec<String>,
    next_id: usize,

    current_unit: String,
    current_function: String,
    plans: Vec<PlanRecord>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(
        symbols: &'a SymbolTable,
        attributes: &'a ScopeAttributeTable,
        options: &'a CodegenOptions,
    ) -> Self {
        Self {
            symbols,
            attributes,
            options,
            out: String::new(),
            indent: 0,
            prelude: Vec::new(),
            next_id: 0,
            current_unit: String::new(),
            current_function: String::new(),
            plans: Vec::new(),
        }
    }

    pub fn emit_unit(mut self, unit: &TirUnit) -> UnitOutput {
        self.current_unit = unit.path.clone();
        match self.options.emit {
            EmitTarget::Cpp => self.emit_cpp_unit(unit),
            EmitTarget::Source | EmitTarget::Trimmed => self.emit_source_unit(unit),
        }
        UnitOutput {
            index: unit.index,
            path: unit.path.clone(),
            text: self.out,
            plans: self.plans,
        }
    }

    // ── buffer ────────────────────────────────────────────────────────

    fn push_line(&mut self, line: String) {
        if !line.is_empty() {
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
            self.out.push_str(&line);
        }
        self.out.push('\n');
    }

    fn next_local_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    fn record_plan(&mut self, plan: &CallPlan, line: usize) {
        self.plans.push(PlanRecord {
            unit: self.current_unit.clone(),
            function: self.current_function.clone(),
            line,
            plan: plan.clone(),
        });
    }

    fn enter_function(&mut self, function: &TirFunction) {
        self.next_id = 0;
        self.prelude.clear();
        self.current_function = match function.class {
            Some(class) => format!("{}::{}", self.symbols.class(class).name, function.name),
            None => function.name.clone(),
        };
    }

    // ── identifiers ───────────────────────────────────────────────────

    fn function_symbol(&self, name: &str) -> String {
        format!("{}{}", self.options.prefixes.function, name.to_ascii_lowercase())
    }

    fn method_symbol(&self, class: &str, method: &str) -> String {
        let p = &self.options.prefixes;
        format!(
            "{}{}::{}{}",
            p.class,
            class.to_ascii_lowercase(),
            p.method,
            method.to_ascii_lowercase()
        )
    }

    fn variable(&self, name: &str) -> String {
        format!("{}{}", self.options.prefixes.variable, name)
    }

    // ── C++ units ─────────────────────────────────────────────────────

    fn emit_cpp_unit(&mut self, unit: &TirUnit) {
        emit_line!(self, "// {}", unit.path);
        for function in &unit.functions {
            self.push_line(String::new());
            self.emit_cpp_function(function);
        }
    }

    fn emit_cpp_function(&mut self, function: &TirFunction) {
        self.enter_function(function);

        let symbol = match function.class {
            Some(class) => self.method_symbol(&self.symbols.class(class).name, &function.name),
            None => self.function_symbol(&function.name),
        };
        let params: Vec<String> = function
            .params
            .iter()
            .map(|p| {
                let ty = if p.by_ref { "VRefParam" } else { "CVarRef" };
                format!("{} {}", ty, self.variable(&p.name))
            })
            .collect();

        emit_line!(self, "Variant {}({}) {{", symbol, params.join(", "));
        self.indent += 1;
        if self.attributes.of(function.id).contains_dynamic_function_call() {
            emit_line!(self, "LVariableTable lvt;");
        }
        for stmt in &function.body {
            self.emit_cpp_stmt(stmt);
        }
        self.indent -= 1;
        emit_line!(self, "}}");
    }

    fn emit_cpp_stmt(&mut self, stmt: &TirStmt) {
        let statement = match stmt {
            TirStmt::Expr(expr) => format!("{};", self.cpp_expr(expr)),
            TirStmt::Return(Some(expr)) => format!("return {};", self.cpp_expr(expr)),
            TirStmt::Return(None) => "return null;".to_string(),
        };

        let prelude = std::mem::take(&mut self.prelude);
        if prelude.is_empty() {
            self.push_line(statement);
            return;
        }
        emit_line!(self, "{{");
        self.indent += 1;
        for line in prelude {
            self.push_line(line);
        }
        self.push_line(statement);
        self.indent -= 1;
        emit_line!(self, "}}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimize::optimize_unit;
    use crate::test_support::*;
    use crate::typeinfer::TypeInferencer;
    use serde_json::{json, Value};

    /// Run every phase on a one-unit program and return the unit's output.
    pub(super) fn compile_with(value: Value, emit: EmitTarget) -> UnitOutput {
        let mut a = analyze(value);
        optimize_unit(&mut a.units[0], &a.symbols, 4);
        TypeInferencer::new(&a.symbols).infer_unit(&mut a.units[0]);
        let options = CodegenOptions {
            emit,
            ..Default::default()
        };
        CodeGenerator::new(&a.symbols, &a.attributes, &options).emit_unit(&a.units[0])
    }

    pub(super) fn compile(value: Value) -> UnitOutput {
        compile_with(value, EmitTarget::Cpp)
    }

    pub(super) fn body(exprs: Vec<Value>) -> Vec<Value> {
        exprs.into_iter().map(|e| json!({"expr": e})).collect()
    }

    #[test]
    fn function_prologue_reflects_scope_attributes() {
        let out = compile(json!({"units": [{"path": "a.php", "functions": [
            {"name": "Dyn", "params": [{"name": "f"}, {"name": "out", "by_ref": true}],
             "body": body(vec![call(var("f"), None, vec![])])},
            {"name": "plain", "body": [{"return": null}]},
        ]}]}));
        assert_eq!(
            out.text,
            "// a.php\n\
             \n\
             Variant f_dyn(CVarRef v_f, VRefParam v_out) {\n\
             \x20 LVariableTable lvt;\n\
             \x20 {\n\
             \x20   const CallInfo *cit1;\n\
             \x20   void *vt1;\n\
             \x20   get_call_info_or_fail(cit1, vt1, v_f);\n\
             \x20   (cit1->getFunc())(vt1);\n\
             \x20 }\n\
             }\n\
             \n\
             Variant f_plain() {\n\
             \x20 return null;\n\
             }\n"
        );
    }

    #[test]
    fn methods_use_class_and_method_prefixes() {
        let out = compile(json!({"units": [{"path": "a.php", "classes": [
            {"name": "Shape", "methods": [{"name": "Area", "body": [{"return": s("x")}]}]},
        ]}]}));
        assert!(out.text.contains("Variant c_shape::t_area() {\n  return \"x\";\n}"));
    }

    #[test]
    fn records_one_plan_per_call() {
        let out = compile(json!({"units": [{"path": "a.php", "functions": [
            {"name": "helper"},
            {"name": "caller", "body": body(vec![
                call(s("helper"), None, vec![]),
                call(var("f"), None, vec![call(s("helper"), None, vec![])]),
            ])},
        ]}]}));
        let kinds: Vec<_> = out.plans.iter().map(|r| r.plan.plan.name()).collect();
        assert_eq!(
            kinds,
            ["DirectFunctionCall", "DynamicFunctionLookup", "DirectFunctionCall"]
        );
        assert!(out.plans.iter().all(|r| r.function == "caller" && r.unit == "a.php"));
    }
}
