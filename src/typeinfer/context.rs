use std::collections::HashMap;

use crate::tir::ValueType;

/// Variable types seen so far in the function being inferred.
pub struct TypeContext {
    variables: HashMap<String, ValueType>,
    this_type: ValueType,
}

impl TypeContext {
    pub fn new() -> Self {
        Self {
            variables: HashMap::new(),
            this_type: ValueType::Any,
        }
    }

    /// A variable assigned values of different types degrades to `Any`.
    pub fn assign_var(&mut self, name: &str, ty: ValueType) {
        match self.variables.get_mut(name) {
            Some(existing) if *existing != ty => *existing = ValueType::Any,
            Some(_) => {}
            None => {
                self.variables.insert(name.to_string(), ty);
            }
        }
    }

    pub fn lookup_var(&self, name: &str) -> ValueType {
        self.variables.get(name).cloned().unwrap_or(ValueType::Any)
    }

    pub fn enter_function(&mut self, this_type: ValueType) {
        self.variables.clear();
        self.this_type = this_type;
    }

    pub fn this_type(&self) -> &ValueType {
        &self.this_type
    }
}

impl Default for TypeContext {
    fn default() -> Self {
        Self::new()
    }
}
