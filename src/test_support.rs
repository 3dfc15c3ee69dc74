//! Shared fixtures for unit tests: programs are written as JSON, the same
//! shape the front end hands over.

use anyhow::Result;
use serde_json::{json, Value};

use crate::analysis::{Analyzer, ScopeAttributeTable};
use crate::ast::Program;
use crate::symbol_table::SymbolTable;
use crate::tir::{CallSite, StaticCall, TirExpr, TirExprKind, TirStmt, TirUnit};

#[derive(Debug)]
pub(crate) struct Analyzed {
    pub symbols: SymbolTable,
    pub attributes: ScopeAttributeTable,
    pub units: Vec<TirUnit>,
}

pub(crate) fn program(value: Value) -> Program {
    serde_json::from_value(value).unwrap()
}

pub(crate) fn try_analyze(value: Value) -> Result<Analyzed> {
    let program = program(value);
    let symbols = SymbolTable::collect(&program)?;
    let attributes = ScopeAttributeTable::new(symbols.function_count());
    let mut units = Vec::new();
    {
        let mut analyzer = Analyzer::new(&symbols, &attributes);
        for (index, unit) in program.units.iter().enumerate() {
            units.push(analyzer.analyze_unit(index, unit)?);
        }
    }
    Ok(Analyzed {
        symbols,
        attributes,
        units,
    })
}

pub(crate) fn analyze(value: Value) -> Analyzed {
    try_analyze(value).unwrap()
}

// ── JSON builders ──────────────────────────────────────────────────

pub(crate) fn s(value: &str) -> Value {
    json!({"kind": "str", "value": value})
}

pub(crate) fn var(name: &str) -> Value {
    json!({"kind": "var", "name": name})
}

pub(crate) fn name(value: &str) -> Value {
    json!({"kind": "name", "value": value})
}

pub(crate) fn this() -> Value {
    json!({"kind": "this"})
}

pub(crate) fn concat(left: Value, right: Value) -> Value {
    json!({"kind": "concat", "left": left, "right": right})
}

pub(crate) fn assign(target: &str, value: Value) -> Value {
    json!({"kind": "assign", "target": target, "value": value})
}

pub(crate) fn call(callee: Value, class: Option<Value>, args: Vec<Value>) -> Value {
    json!({"kind": "call", "name": callee, "class": class, "args": args})
}

pub(crate) fn arrow_call(callee: Value, object: Value, args: Vec<Value>) -> Value {
    json!({"kind": "call", "name": callee, "class": object, "args": args, "arrow": true})
}

pub(crate) trait WithLine {
    fn with_line(self, line: usize) -> Value;
}

impl WithLine for Value {
    fn with_line(mut self, line: usize) -> Value {
        self["line"] = json!(line);
        self
    }
}

// ── TIR accessors ──────────────────────────────────────────────────

pub(crate) fn stmt_expr(body: &[TirStmt], index: usize) -> &TirExpr {
    match &body[index] {
        TirStmt::Expr(expr) | TirStmt::Return(Some(expr)) => expr,
        other => panic!("statement {} has no expression: {:?}", index, other),
    }
}

pub(crate) fn site(body: &[TirStmt], index: usize) -> &CallSite {
    match &stmt_expr(body, index).kind {
        TirExprKind::DynamicCall(site) => site,
        other => panic!("statement {} is not a dynamic call: {:?}", index, other),
    }
}

pub(crate) fn static_call(body: &[TirStmt], index: usize) -> &StaticCall {
    match &stmt_expr(body, index).kind {
        TirExprKind::StaticCall(call) => call,
        other => panic!("statement {} is not a static call: {:?}", index, other),
    }
}
