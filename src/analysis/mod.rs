//! Analysis phase: lower each parsed unit into TIR and classify every call
//! site against the frozen symbol table.

mod class_ref;
mod classify;
mod scope;

pub use class_ref::{resolve_class_reference, LateBindingError};
pub use scope::{ScopeAttributeTable, ScopeAttributes};

use anyhow::Result;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::ast::{Expr, ExprKind, FunctionDecl, Stmt, Unit};
use crate::errors::{CompileError, ErrorCategory};
use crate::symbol_table::{ClassId, FunctionId, SymbolTable};
use crate::tir::{FunctionParam, TirExpr, TirExprKind, TirFunction, TirStmt, TirUnit};

macro_rules! define_error_helpers {
    ($($name:ident => $category:ident),* $(,)?) => {
        $(
            fn $name(&self, line: usize, msg: impl Into<String>) -> anyhow::Error {
                self.make_error(ErrorCategory::$category, line, msg.into())
            }
        )*
    }
}

pub struct Analyzer<'a> {
    symbols: &'a SymbolTable,
    attributes: &'a ScopeAttributeTable,

    current_file: String,
    source_lines: Vec<String>,
    current_function: Option<FunctionId>,
    current_class: Option<ClassId>,
    current_attributes: Option<Arc<ScopeAttributes>>,

    class_deps: BTreeSet<String>,
}

impl<'a> Analyzer<'a> {
    pub fn new(symbols: &'a SymbolTable, attributes: &'a ScopeAttributeTable) -> Self {
        Self {
            symbols,
            attributes,
            current_file: String::new(),
            source_lines: Vec::new(),
            current_function: None,
            current_class: None,
            current_attributes: None,
            class_deps: BTreeSet::new(),
        }
    }

    // ── error helpers ──────────────────────────────────────────────────

    fn compile_error(&self, category: ErrorCategory, line: usize, message: String) -> CompileError {
        CompileError {
            category,
            message,
            file: self.current_file.clone(),
            line,
            source_line: self.source_lines.get(line.wrapping_sub(1)).cloned(),
            function_name: self.current_function.map(|id| self.display_name(id)),
            help: None,
        }
    }

    fn make_error(&self, category: ErrorCategory, line: usize, message: String) -> anyhow::Error {
        self.compile_error(category, line, message).into()
    }

    fn late_binding_error(&self, line: usize, err: LateBindingError) -> anyhow::Error {
        CompileError {
            help: Some(err.help()),
            ..self.compile_error(ErrorCategory::BindingError, line, err.to_string())
        }
        .into()
    }

    define_error_helpers! {
        argument_error => ArgumentError,
        syntax_error   => SyntaxError,
    }

    fn display_name(&self, id: FunctionId) -> String {
        let info = self.symbols.function(id);
        match info.class {
            Some(class) => format!("{}::{}", self.symbols.class(class).name, info.name),
            None => info.name.clone(),
        }
    }

    // ── unit / function lowering ───────────────────────────────────────

    pub fn analyze_unit(&mut self, index: usize, unit: &Unit) -> Result<TirUnit> {
        self.current_file = unit.path.clone();
        self.source_lines = unit
            .source
            .as_deref()
            .map(|s| s.lines().map(String::from).collect())
            .unwrap_or_default();
        self.class_deps.clear();

        let symbols = self.symbols;
        let unit_symbols = symbols.unit(index);
        let mut functions = Vec::new();

        for (class_decl, &class_id) in unit.classes.iter().zip(&unit_symbols.classes) {
            self.current_class = Some(class_id);
            if let Some(parent) = &class_decl.parent {
                self.class_deps.insert(parent.clone());
            }
            let method_ids = &symbols.class(class_id).method_ids;
            for (method, &fid) in class_decl.methods.iter().zip(method_ids) {
                functions.push(self.lower_function(fid, method)?);
            }
        }

        self.current_class = None;
        for (decl, &fid) in unit.functions.iter().zip(&unit_symbols.functions) {
            functions.push(self.lower_function(fid, decl)?);
        }

        Ok(TirUnit {
            index,
            path: unit.path.clone(),
            functions,
            class_deps: std::mem::take(&mut self.class_deps).into_iter().collect(),
        })
    }

    fn lower_function(&mut self, id: FunctionId, decl: &FunctionDecl) -> Result<TirFunction> {
        self.current_function = Some(id);
        self.current_attributes = Some(self.attributes.get(id));

        let mut body = Vec::with_capacity(decl.body.len());
        for stmt in &decl.body {
            body.push(self.lower_stmt(stmt)?);
        }

        self.current_function = None;
        self.current_attributes = None;

        Ok(TirFunction {
            id,
            name: decl.name.clone(),
            class: self.current_class,
            is_static: decl.is_static,
            params: decl
                .params
                .iter()
                .map(|p| FunctionParam {
                    name: p.name.clone(),
                    by_ref: p.by_ref,
                })
                .collect(),
            body,
        })
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<TirStmt> {
        Ok(match stmt {
            Stmt::Expr(expr) => TirStmt::Expr(self.lower_expr(expr)?),
            Stmt::Return(value) => TirStmt::Return(
                value.as_ref().map(|e| self.lower_expr(e)).transpose()?,
            ),
        })
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<TirExpr> {
        let line = expr.line;
        let kind = match &expr.kind {
            ExprKind::Str { value } => return Ok(TirExpr::str_literal(value.clone(), line)),
            ExprKind::Int { value } => TirExprKind::IntLiteral(*value),
            ExprKind::Null => TirExprKind::Null,
            ExprKind::Var { name } => TirExprKind::Var(name.clone()),
            ExprKind::This => TirExprKind::This,
            ExprKind::Name { value } => TirExprKind::ClassName(value.clone()),
            ExprKind::Concat { left, right } => TirExprKind::Concat(
                Box::new(self.lower_expr(left)?),
                Box::new(self.lower_expr(right)?),
            ),
            ExprKind::Assign { target, value } => TirExprKind::Assign {
                target: target.clone(),
                value: Box::new(self.lower_expr(value)?),
            },
            ExprKind::Call {
                name,
                class,
                args,
                arrow,
            } => {
                if *arrow && class.is_none() {
                    return Err(self.syntax_error(line, "method call without an object"));
                }
                let name = self.lower_expr(name)?;
                let class = class.as_deref().map(|c| self.lower_expr(c)).transpose()?;
                let mut arguments = Vec::with_capacity(args.len());
                for arg in args {
                    arguments.push(self.lower_expr(arg)?);
                }
                let site = self.classify_call(name, class, arguments, *arrow, line)?;
                TirExprKind::DynamicCall(Box::new(site))
            }
        };
        Ok(TirExpr::new(kind, line))
    }
}
