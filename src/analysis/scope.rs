use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::symbol_table::FunctionId;

/// Per-function facts collected while classifying call sites.
///
/// Flags only ever go from unset to set, so concurrent writers need no
/// ordering between them.
#[derive(Debug, Default)]
pub struct ScopeAttributes {
    contains_dynamic_function_call: AtomicBool,
}

impl ScopeAttributes {
    pub fn mark_dynamic_function_call(&self) {
        self.contains_dynamic_function_call
            .store(true, Ordering::Relaxed);
    }

    pub fn contains_dynamic_function_call(&self) -> bool {
        self.contains_dynamic_function_call.load(Ordering::Relaxed)
    }
}

/// One [`ScopeAttributes`] per function id, shared by every worker.
#[derive(Debug, Default)]
pub struct ScopeAttributeTable {
    entries: Vec<Arc<ScopeAttributes>>,
}

impl ScopeAttributeTable {
    pub fn new(function_count: usize) -> Self {
        Self {
            entries: (0..function_count)
                .map(|_| Arc::new(ScopeAttributes::default()))
                .collect(),
        }
    }

    pub fn get(&self, id: FunctionId) -> Arc<ScopeAttributes> {
        Arc::clone(&self.entries[id.0])
    }

    pub fn of(&self, id: FunctionId) -> &ScopeAttributes {
        &self.entries[id.0]
    }
}
