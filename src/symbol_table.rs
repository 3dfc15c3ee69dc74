use anyhow::Result;
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashMap;

use crate::ast::{FunctionDecl, Program, TypeHint, Unit};
use crate::errors::{CompileError, ErrorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClassId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FunctionId(pub usize);

/// Result of looking a class name up program-wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassLookup {
    Absent,
    Unique(ClassId),
    Redeclared,
}

#[derive(Debug, Clone)]
pub struct ParamInfo {
    pub name: String,
    pub by_ref: bool,
    pub optional: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub id: FunctionId,
    pub name: String,
    pub class: Option<ClassId>,
    pub is_static: bool,
    pub variadic: bool,
    pub params: Vec<ParamInfo>,
    pub returns: Option<TypeHint>,
    pub unit: usize,
    pub line: usize,
}

impl FunctionInfo {
    pub fn required_args(&self) -> usize {
        self.params.iter().filter(|p| !p.optional).count()
    }

    /// Whether a call with `count` arguments matches this signature.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.required_args() && (self.variadic || count <= self.params.len())
    }

    pub fn is_method(&self) -> bool {
        self.class.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub id: ClassId,
    pub name: String,
    pub parent: Option<String>,
    pub conditional: bool,
    pub unit: usize,
    pub line: usize,
    /// Method ids in declaration order.
    pub method_ids: Vec<FunctionId>,
    methods: HashMap<String, FunctionId>,
}

/// Function and class ids of one unit, parallel to the unit's declarations.
#[derive(Debug, Clone, Default)]
pub struct UnitSymbols {
    pub path: String,
    pub classes: Vec<ClassId>,
    pub functions: Vec<FunctionId>,
}

/// Program-wide declarations. Built once by [`SymbolTable::collect`] and
/// read-only afterwards, so every later phase can share it across workers.
#[derive(Debug, Default)]
pub struct SymbolTable {
    classes: Vec<ClassInfo>,
    class_index: HashMap<String, Vec<ClassId>>,
    functions: Vec<FunctionInfo>,
    function_index: HashMap<String, FunctionId>,
    units: Vec<UnitSymbols>,
    hierarchy: DiGraph<String, ()>,
    hierarchy_nodes: HashMap<String, NodeIndex>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

fn name_error(unit: &Unit, line: usize, message: String) -> anyhow::Error {
    CompileError {
        category: ErrorCategory::NameError,
        message,
        file: unit.path.clone(),
        line,
        source_line: unit
            .source
            .as_deref()
            .and_then(|s| s.lines().nth(line.wrapping_sub(1)))
            .map(String::from),
        function_name: None,
        help: None,
    }
    .into()
}

impl SymbolTable {
    /// Declaration collection: register every class, method and function of
    /// the program.
    pub fn collect(program: &Program) -> Result<Self> {
        let mut table = Self::default();

        for (unit_index, unit) in program.units.iter().enumerate() {
            let mut unit_symbols = UnitSymbols {
                path: unit.path.clone(),
                ..Default::default()
            };

            for class in &unit.classes {
                let id = ClassId(table.classes.len());
                let mut info = ClassInfo {
                    id,
                    name: class.name.clone(),
                    parent: class.parent.clone(),
                    conditional: class.conditional,
                    unit: unit_index,
                    line: class.line,
                    method_ids: Vec::with_capacity(class.methods.len()),
                    methods: HashMap::new(),
                };
                for method in &class.methods {
                    let method_key = key(&method.name);
                    if let Some(existing) = info.methods.get(&method_key) {
                        let previous = &table.functions[existing.0];
                        return Err(name_error(
                            unit,
                            method.line,
                            format!(
                                "cannot redeclare method `{}::{}` (previously declared on line {})",
                                class.name, method.name, previous.line
                            ),
                        ));
                    }
                    let fid = table.push_function(method, Some(id), unit_index);
                    info.method_ids.push(fid);
                    info.methods.insert(method_key, fid);
                }
                table.class_index.entry(key(&class.name)).or_default().push(id);
                table.link_hierarchy(&class.name, class.parent.as_deref());
                table.classes.push(info);
                unit_symbols.classes.push(id);
            }

            for function in &unit.functions {
                let name_key = key(&function.name);
                if let Some(existing) = table.function_index.get(&name_key) {
                    let previous = &table.functions[existing.0];
                    return Err(name_error(
                        unit,
                        function.line,
                        format!(
                            "cannot redeclare function `{}` (previously declared in {}:{})",
                            function.name,
                            table.units_path(previous.unit, &unit_symbols),
                            previous.line
                        ),
                    ));
                }
                let fid = table.push_function(function, None, unit_index);
                table.function_index.insert(name_key, fid);
                unit_symbols.functions.push(fid);
            }

            table.units.push(unit_symbols);
        }

        log::debug!(
            "Collected {} classes and {} functions from {} units",
            table.classes.len(),
            table.functions.len(),
            table.units.len()
        );
        Ok(table)
    }

    fn units_path<'a>(&'a self, unit: usize, current: &'a UnitSymbols) -> &'a str {
        self.units
            .get(unit)
            .map(|u| u.path.as_str())
            .unwrap_or(current.path.as_str())
    }

    fn push_function(
        &mut self,
        decl: &FunctionDecl,
        class: Option<ClassId>,
        unit: usize,
    ) -> FunctionId {
        let id = FunctionId(self.functions.len());
        self.functions.push(FunctionInfo {
            id,
            name: decl.name.clone(),
            class,
            is_static: decl.is_static,
            variadic: decl.variadic,
            params: decl
                .params
                .iter()
                .map(|p| ParamInfo {
                    name: p.name.clone(),
                    by_ref: p.by_ref,
                    optional: p.optional,
                })
                .collect(),
            returns: decl.returns.clone(),
            unit,
            line: decl.line,
        });
        id
    }

    fn hierarchy_node(&mut self, name: &str) -> NodeIndex {
        let k = key(name);
        if let Some(&node) = self.hierarchy_nodes.get(&k) {
            return node;
        }
        let node = self.hierarchy.add_node(k.clone());
        self.hierarchy_nodes.insert(k, node);
        node
    }

    fn link_hierarchy(&mut self, class: &str, parent: Option<&str>) {
        let child = self.hierarchy_node(class);
        if let Some(parent) = parent {
            let parent = self.hierarchy_node(parent);
            self.hierarchy.update_edge(child, parent, ());
        }
    }

    // ── classes ───────────────────────────────────────────────────────

    pub fn resolve_class(&self, name: &str) -> ClassLookup {
        match self.class_index.get(&key(name)).map(Vec::as_slice) {
            None | Some([]) => ClassLookup::Absent,
            Some([id]) => ClassLookup::Unique(*id),
            Some(_) => ClassLookup::Redeclared,
        }
    }

    pub fn class(&self, id: ClassId) -> &ClassInfo {
        &self.classes[id.0]
    }

    pub fn classes(&self) -> &[ClassInfo] {
        &self.classes
    }

    /// Units that declare a class of this name.
    pub fn declaring_units(&self, name: &str) -> Vec<usize> {
        self.class_index
            .get(&key(name))
            .map(|ids| ids.iter().map(|id| self.classes[id.0].unit).collect())
            .unwrap_or_default()
    }

    /// Declared directly on the class, not inherited.
    pub fn class_declares_method(&self, id: ClassId, name: &str) -> bool {
        self.classes[id.0].methods.contains_key(&key(name))
    }

    /// Strict subclass test over every declaration of both names.
    pub fn derives_from(&self, class: &str, ancestor: &str) -> bool {
        let (class, ancestor) = (key(class), key(ancestor));
        if class == ancestor {
            return false;
        }
        match (
            self.hierarchy_nodes.get(&class),
            self.hierarchy_nodes.get(&ancestor),
        ) {
            (Some(&from), Some(&to)) => has_path_connecting(&self.hierarchy, from, to, None),
            _ => false,
        }
    }

    /// Find a method on the class or its statically unique ancestors.
    pub fn find_method(&self, id: ClassId, name: &str) -> Option<&FunctionInfo> {
        let mut current = id;
        for _ in 0..=self.classes.len() {
            let class = &self.classes[current.0];
            if let Some(fid) = class.methods.get(&key(name)) {
                return Some(&self.functions[fid.0]);
            }
            match class.parent.as_deref().map(|p| self.resolve_class(p)) {
                Some(ClassLookup::Unique(parent)) => current = parent,
                _ => return None,
            }
        }
        None
    }

    /// Whether some class strictly below `target` on the inheritance chain
    /// running through `enclosing` declares `method`. Such an override makes
    /// a `$this`-relative call to `target::method` polymorphic.
    pub fn is_overridden_along(&self, target: &str, enclosing: ClassId, method: &str) -> bool {
        let enclosing_name = &self.classes[enclosing.0].name;
        self.classes.iter().any(|class| {
            class.methods.contains_key(&key(method))
                && self.derives_from(&class.name, target)
                && (key(&class.name) == key(enclosing_name)
                    || self.derives_from(enclosing_name, &class.name)
                    || self.derives_from(&class.name, enclosing_name))
        })
    }

    // ── functions ─────────────────────────────────────────────────────

    pub fn resolve_function(&self, name: &str) -> Option<&FunctionInfo> {
        self.function_index
            .get(&key(name))
            .map(|id| &self.functions[id.0])
    }

    pub fn function(&self, id: FunctionId) -> &FunctionInfo {
        &self.functions[id.0]
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub fn unit(&self, index: usize) -> &UnitSymbols {
        &self.units[index]
    }
}
