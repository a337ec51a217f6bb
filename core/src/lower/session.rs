//! file: core/src/lower/session.rs
//! description: per-module lowering state.
//!
//! `Session` owns every table and stack the lowering passes share. The
//! name table and substitution table live for the whole session; the
//! remaining stacks are transient and push/pop strictly with the tree
//! traversal. When a declaration fails, `reset_transient` puts the
//! transient state back to empty so the next declaration starts clean.

use std::collections::HashMap;

use crate::config::LoweringOptions;
use crate::reports::DiagnosticCollector;
use crate::tree::{Decl, DeclId, Program};

use super::err::{LowerResult, LoweringError};
use super::library::SubstitutionTable;
use super::mixin::Link;
use super::names::NameTable;

/// A cleanup registered by `defer`, owned by the block that declared it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCleanup {
    pub block: usize,
    pub name: String,
}

#[derive(Debug)]
pub struct Session<'p> {
    pub program: &'p Program,
    pub options: LoweringOptions,
    pub names: NameTable,
    pub library: SubstitutionTable,
    pub diagnostics: DiagnosticCollector,
    /// Monotonic counter behind `_.tmpN`.
    temp_counter: usize,
    /// Counters behind the other generated names (`$defer0`, `$switch0`).
    label_counters: HashMap<&'static str, usize>,
    /// One condition accumulator per open optional-evaluation region.
    optional_conditions: Vec<Vec<String>>,
    /// Deferred cleanups in registration order.
    cleanups: Vec<PendingCleanup>,
    /// Blocks currently being lowered, innermost last.
    open_blocks: Vec<usize>,
    block_counter: usize,
    /// Functions currently being lowered, innermost last.
    open_functions: Vec<DeclId>,
    /// Nominal types (or extensions) currently being lowered.
    open_types: Vec<DeclId>,
    /// Instance-property initializers collected for `init$vars`, one list
    /// per open type.
    struct_initializers: Vec<Vec<String>>,
    /// Text standing for each opened existential while its scope is open.
    opaque_values: HashMap<u32, String>,
    /// Labels of the `switch` statements being lowered.
    switch_labels: Vec<String>,
    /// Conformance linkage waiting for the end of the module.
    linkage: Vec<Link>,
}

impl<'p> Session<'p> {
    pub fn new(program: &'p Program, options: LoweringOptions) -> Self {
        Session {
            program,
            options,
            names: NameTable::new(),
            library: SubstitutionTable::standard(),
            diagnostics: DiagnosticCollector::new(),
            temp_counter: 0,
            label_counters: HashMap::new(),
            optional_conditions: Vec::new(),
            cleanups: Vec::new(),
            open_blocks: Vec::new(),
            block_counter: 0,
            open_functions: Vec::new(),
            open_types: Vec::new(),
            struct_initializers: Vec::new(),
            opaque_values: HashMap::new(),
            switch_labels: Vec::new(),
            linkage: Vec::new(),
        }
    }

    /// Look a declaration up, failing with an invalid-tree error.
    pub fn decl(&self, id: DeclId) -> LowerResult<&'p Decl> {
        self.program.get_decl(id).ok_or_else(|| {
            LoweringError::invalid_tree(format!("declaration {} is not in the program", id), "trellis.lower.session.decl")
        })
    }

    /// Primary output name of a declaration.
    pub fn name(&mut self, id: DeclId) -> LowerResult<String> {
        let program = self.program;
        self.names.name(program, &self.options, id)
    }

    /// Output name of `id` as the alias for its `requirement`-th protocol
    /// requirement.
    pub fn name_for(&mut self, id: DeclId, requirement: usize) -> LowerResult<Option<String>> {
        let program = self.program;
        self.names.name_for(program, &self.options, id, requirement)
    }

    pub fn key(&self, id: DeclId) -> String {
        super::names::qualified_key(self.program, &self.options, id)
    }

    pub fn is_native(&self, decl: &Decl) -> bool {
        self.options.is_native_module(&decl.module)
    }

    /// Name of the runtime witness info parameter of a declaration.
    pub fn info_tag(&self, id: DeclId) -> String {
        format!("$info{}", id)
    }

    // ------- Generated names -------

    /// Allocate the next `_.tmpN` temporary.
    pub fn next_temp(&mut self) -> String {
        let n = self.temp_counter;
        self.temp_counter += 1;
        format!("_.tmp{}", n)
    }

    pub fn fresh(&mut self, prefix: &'static str) -> String {
        let counter = self.label_counters.entry(prefix).or_insert(0);
        let n = *counter;
        *counter += 1;
        format!("{}{}", prefix, n)
    }

    // ------- Optional accumulators -------

    pub fn push_optional_region(&mut self) {
        self.optional_conditions.push(Vec::new());
    }

    pub fn pop_optional_region(&mut self) -> Vec<String> {
        self.optional_conditions.pop().unwrap_or_default()
    }

    /// Add an unwrap test to the innermost region. Returns false when no
    /// region is open.
    pub fn add_optional_condition(&mut self, condition: String) -> bool {
        match self.optional_conditions.last_mut() {
            Some(conds) => {
                conds.push(condition);
                true
            }
            None => false,
        }
    }

    // ------- Blocks & cleanups -------

    pub fn open_block(&mut self) -> usize {
        let id = self.block_counter;
        self.block_counter += 1;
        self.open_blocks.push(id);
        id
    }

    /// Close the innermost block and return its cleanups, most recently
    /// registered first.
    pub fn close_block(&mut self, block: usize) -> Vec<PendingCleanup> {
        if self.open_blocks.last() == Some(&block) {
            self.open_blocks.pop();
        }
        let mut own: Vec<PendingCleanup> = Vec::new();
        self.cleanups.retain(|c| {
            if c.block == block {
                own.push(c.clone());
                false
            } else {
                true
            }
        });
        own.reverse();
        own
    }

    pub fn current_block(&self) -> Option<usize> {
        self.open_blocks.last().copied()
    }

    pub fn register_cleanup(&mut self, name: String) -> LowerResult<()> {
        let block = self.current_block().ok_or_else(|| {
            LoweringError::invalid_tree("defer outside of a block".to_string(), "trellis.lower.session.register_cleanup")
        })?;
        self.cleanups.push(PendingCleanup { block, name });
        Ok(())
    }

    pub fn pending_cleanups(&self) -> &[PendingCleanup] {
        &self.cleanups
    }

    // ------- Functions & types -------

    pub fn push_function(&mut self, id: DeclId) {
        self.open_functions.push(id);
    }

    pub fn pop_function(&mut self) {
        self.open_functions.pop();
    }

    pub fn current_function(&self) -> Option<&'p Decl> {
        self.open_functions.last().and_then(|id| self.program.get_decl(*id))
    }

    pub fn push_type(&mut self, id: DeclId) {
        self.open_types.push(id);
        self.struct_initializers.push(Vec::new());
    }

    pub fn pop_type(&mut self) -> Vec<String> {
        self.open_types.pop();
        self.struct_initializers.pop().unwrap_or_default()
    }

    pub fn current_type(&self) -> Option<&'p Decl> {
        self.open_types.last().and_then(|id| self.program.get_decl(*id))
    }

    pub fn add_struct_initializer(&mut self, init: String) {
        if let Some(list) = self.struct_initializers.last_mut() {
            list.push(init);
        }
    }

    // ------- Existentials -------

    pub fn bind_opaque(&mut self, id: u32, text: String) -> Option<String> {
        self.opaque_values.insert(id, text)
    }

    pub fn unbind_opaque(&mut self, id: u32, previous: Option<String>) {
        match previous {
            Some(p) => {
                self.opaque_values.insert(id, p);
            }
            None => {
                self.opaque_values.remove(&id);
            }
        }
    }

    pub fn opaque(&self, id: u32) -> Option<&String> {
        self.opaque_values.get(&id)
    }

    // ------- Switch labels -------

    pub fn push_switch_label(&mut self, label: String) {
        self.switch_labels.push(label);
    }

    pub fn pop_switch_label(&mut self) {
        self.switch_labels.pop();
    }

    pub fn current_switch_label(&self) -> Option<&String> {
        self.switch_labels.last()
    }

    // ------- Linkage -------

    pub fn push_linkage(&mut self, link: Link) {
        self.linkage.push(link);
    }

    pub fn linkage_mark(&self) -> usize {
        self.linkage.len()
    }

    pub fn truncate_linkage(&mut self, mark: usize) {
        self.linkage.truncate(mark);
    }

    pub fn take_linkage(&mut self) -> Vec<Link> {
        std::mem::take(&mut self.linkage)
    }

    /// Drop every transient stack after a failed declaration. The name
    /// and substitution tables are left untouched.
    pub fn reset_transient(&mut self) {
        self.optional_conditions.clear();
        self.cleanups.clear();
        self.open_blocks.clear();
        self.open_functions.clear();
        self.open_types.clear();
        self.struct_initializers.clear();
        self.opaque_values.clear();
        self.switch_labels.clear();
        self.names.clear_replacements();
    }

    /// True when every transient stack is empty.
    pub fn is_quiescent(&self) -> bool {
        self.optional_conditions.is_empty()
            && self.cleanups.is_empty()
            && self.open_blocks.is_empty()
            && self.open_functions.is_empty()
            && self.open_types.is_empty()
            && self.struct_initializers.is_empty()
            && self.opaque_values.is_empty()
            && self.switch_labels.is_empty()
    }
}
