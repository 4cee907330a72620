//! The symbol tables a translation builds up while walking the instruction
//! stream: types, variables, constants, names, decorations,
//! and the reference table used to turn an id into the text that refers to
//! it at its use site.

use crate::arena::{Arena, Handle};
use crate::ir::constant::Constant;
use crate::ir::function::Function;
use crate::ir::types::Type;
use crate::ir::variable::Variable;
use crate::FastHashMap;

/// Decorations recorded against a single id (`OpDecorate`).
#[derive(Debug, Clone, Default)]
pub struct Decorations {
    pub builtin: bool,
    pub location: Option<u32>,
    pub binding: Option<u32>,
    pub descriptor_set: Option<u32>,
    pub offset: Option<u32>,
    pub array_stride: Option<u32>,
}

#[derive(Default)]
pub struct SymbolTables {
    pub types: Arena<Type>,
    pub variables: Arena<Variable>,
    pub constants: Arena<Constant>,
    /// `OpName` results, by raw id. Absent entries fall back to `_<id>`.
    pub names: FastHashMap<u32, String>,
    /// `OpMemberName` results, keyed by `(struct type id, member index)`.
    pub member_names: FastHashMap<(u32, u32), String>,
    /// `OpDecorate` results, by raw id.
    pub decorations: FastHashMap<u32, Decorations>,
    /// `OpMemberDecorate` results, keyed by `(struct type id, member index)`.
    pub member_decorations: FastHashMap<(u32, u32), Decorations>,
    /// The reference table: the textual expression that stands in for a
    /// value-producing id at its point of use.
    pub references: FastHashMap<u32, String>,
    /// Functions, in the order their `OpFunction` was seen.
    pub functions: Vec<Function>,
    function_index: FastHashMap<u32, usize>,
    /// Pre-rendered `ret name(params)` signatures for every non-entry
    /// function in the module, computed by a lookahead pass over the whole
    /// instruction stream before body emission begins. The GLSL module
    /// prologue needs the complete set the first time it runs (at the first
    /// label of the *first* function in the stream), which may well be
    /// before later helper functions have had their own `OpFunction` walked —
    /// a plain accumulate-as-you-go list would only ever contain whichever
    /// functions happened to precede the current one.
    pub forward_declarations: Vec<String>,
}

impl SymbolTables {
    pub fn with_bound(bound: u32) -> Self {
        SymbolTables {
            types: Arena::with_bound(bound),
            variables: Arena::with_bound(bound),
            constants: Arena::with_bound(bound),
            ..Default::default()
        }
    }

    /// The name bound to `id` by `OpName`, or the synthesized `_<id>`
    /// fallback.
    pub fn name_of(&self, id: u32) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("_{}", id))
    }

    pub fn member_name_of(&self, struct_id: u32, member: u32) -> String {
        self.member_names
            .get(&(struct_id, member))
            .cloned()
            .unwrap_or_else(|| format!("_m{}", member))
    }

    pub fn decoration(&self, id: u32) -> Decorations {
        self.decorations.get(&id).cloned().unwrap_or_default()
    }

    /// The textual reference for `id`: what to write at a use site.
    ///
    /// Falls back to `name_of` (and ultimately `_<id>`) so that referencing
    /// an id before its reference-table entry was populated still produces
    /// *something* recognizable rather than panicking — useful while an
    /// `UnsupportedOpcode` marker has been emitted in place of the
    /// instruction that would have set the real reference.
    pub fn reference(&self, id: u32) -> String {
        self.references
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.name_of(id))
    }

    pub fn set_reference(&mut self, id: u32, text: impl Into<String>) {
        self.references.insert(id, text.into());
    }

    pub fn open_function(&mut self, id: u32, name: String, return_type: Handle<Type>) -> usize {
        let index = self.functions.len();
        self.functions.push(Function::new(id, name, return_type));
        self.function_index.insert(id, index);
        index
    }

    pub fn function_index(&self, id: u32) -> Option<usize> {
        self.function_index.get(&id).copied()
    }
}
