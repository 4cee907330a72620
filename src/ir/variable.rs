use crate::arena::Handle;
use crate::ir::types::Type;

use spirv::StorageClass;

/// A module- or function-scoped variable, installed at `OpVariable` and
/// never removed for the lifetime of the translation.
#[derive(Debug, Clone)]
pub struct Variable {
    pub id: u32,
    /// The variable's pointer type.
    pub ty: Handle<Type>,
    pub storage: StorageClass,
    /// Set once a `BuiltIn` decoration targeting this id has been seen.
    /// Builtin variables are never declared in the GLSL interface block —
    /// they are reached indirectly through their `gl_`-prefixed name.
    pub builtin: bool,
}
