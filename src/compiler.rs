use anyhow::{anyhow, Result};
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;
use std::sync::Arc;

use crate::analysis::{Analyzer, ScopeAttributeTable};
use crate::ast::Program;
use crate::codegen::{CodeGenerator, PlanRecord, UnitOutput};
use crate::optimize::optimize_unit;
use crate::options::CodegenOptions;
use crate::symbol_table::SymbolTable;
use crate::tir::TirUnit;
use crate::typeinfer::TypeInferencer;

pub struct CompileOutput {
    pub text: String,
    pub plans: Vec<PlanRecord>,
}

pub struct Compiler {
    options: CodegenOptions,
}

impl Compiler {
    pub fn new(options: CodegenOptions) -> Self {
        Self { options }
    }

    /// Run every phase over the whole program. Each phase finishes on all
    /// units before the next one starts.
    pub fn compile(&self, program: &Program) -> Result<CompileOutput> {
        let jobs = self.options.jobs;

        log::info!("Collecting declarations from {} unit(s)", program.units.len());
        let symbols = Arc::new(SymbolTable::collect(program)?);
        let attributes = Arc::new(ScopeAttributeTable::new(symbols.function_count()));

        log::info!("Analyzing call sites");
        let mut units = run_phase(jobs, program.units.iter().enumerate().collect(), |(index, unit)| {
            Analyzer::new(&symbols, &attributes).analyze_unit(index, unit)
        })?;

        log::info!("Optimizing (at most {} passes)", self.options.optimize_iterations);
        let rewrites = run_phase(jobs, units.iter_mut().collect(), |unit: &mut TirUnit| {
            Ok(optimize_unit(unit, &symbols, self.options.optimize_iterations))
        })?;
        log::debug!("Folded {} call(s)", rewrites.iter().sum::<usize>());

        log::info!("Inferring types");
        run_phase(jobs, units.iter_mut().collect(), |unit: &mut TirUnit| {
            TypeInferencer::new(&symbols).infer_unit(unit);
            Ok(())
        })?;

        let order = unit_order(&units, &symbols);
        log::info!("Generating code for {} unit(s)", order.len());
        let outputs = run_phase(jobs, order.iter().map(|&i| &units[i]).collect(), |unit| {
            Ok(CodeGenerator::new(&symbols, &attributes, &self.options).emit_unit(unit))
        })?;

        Ok(join_outputs(outputs))
    }
}

/// Apply `f` to every item on up to `jobs` scoped workers, keeping item
/// order. Returns after all workers finish; the first failing item wins.
fn run_phase<T, R, F>(jobs: usize, items: Vec<T>, f: F) -> Result<Vec<R>>
where
    T: Send,
    R: Send,
    F: Fn(T) -> Result<R> + Sync,
{
    let workers = jobs.clamp(1, items.len().max(1));
    let chunk_size = items.len().div_ceil(workers).max(1);

    let mut chunks: Vec<Vec<T>> = Vec::with_capacity(workers);
    let mut rest = items.into_iter().peekable();
    while rest.peek().is_some() {
        chunks.push(rest.by_ref().take(chunk_size).collect());
    }

    let f = &f;
    let results = std::thread::scope(|scope| {
        let handles: Vec<_> = chunks
            .into_iter()
            .map(|chunk| scope.spawn(move || chunk.into_iter().map(f).collect::<Vec<_>>()))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join())
            .collect::<Result<Vec<_>, _>>()
    })
    .map_err(|_| anyhow!("worker thread panicked"))?;

    results.into_iter().flatten().collect()
}

/// Units ordered so that the units declaring a class come before the units
/// calling into it. Mutually dependent units keep their input order.
fn unit_order(units: &[TirUnit], symbols: &SymbolTable) -> Vec<usize> {
    let mut graph = DiGraph::<usize, ()>::new();
    let nodes: Vec<_> = units.iter().map(|u| graph.add_node(u.index)).collect();

    for (position, unit) in units.iter().enumerate() {
        for class in &unit.class_deps {
            for declaring in symbols.declaring_units(class) {
                if declaring != unit.index {
                    if let Some(target) = units.iter().position(|u| u.index == declaring) {
                        graph.update_edge(nodes[position], nodes[target], ());
                    }
                }
            }
        }
    }

    tarjan_scc(&graph)
        .into_iter()
        .flat_map(|mut component| {
            component.sort();
            component
        })
        .map(|node| node.index())
        .collect()
}

fn join_outputs(outputs: Vec<UnitOutput>) -> CompileOutput {
    let mut text = String::new();
    let mut plans = Vec::new();
    for (i, output) in outputs.into_iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        log::debug!("{}: {} plan(s)", output.path, output.plans.len());
        text.push_str(&output.text);
        plans.extend(output.plans);
    }
    CompileOutput { text, plans }
}
