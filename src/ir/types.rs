use crate::arena::Handle;

/// A type declared in the module, keyed by its SPIR-V result id.
///
/// `name` is already the textual spelling the backend will emit (`float`,
/// `vec3`, `mat4`, a struct's name, …) rather than a structured description —
/// the translator commits to a target-language type name the moment it sees
/// the `OpType*` instruction, matching the single-forward-pass design.
#[derive(Debug, Clone)]
pub struct Type {
    pub name: String,
    /// For arrays: element count. For matrices: column count. Unused
    /// otherwise.
    pub length: u32,
    pub isarray: bool,
    pub ispointer: bool,
    /// Struct members, in declaration order: `(member name, member type)`.
    pub members: Vec<(String, Handle<Type>)>,
    /// Set for an `OpTypeImage` whose access-qualifier operand marks it as
    /// an external video image. `name` is still the generic `sampler2D`
    /// spelling installed by the shared walker; only a backend that knows
    /// the target platform (the GLSL emitter's Android path) decides
    /// whether to render `samplerExternalOES` instead.
    pub is_external_video: bool,
}

impl Type {
    pub fn scalar(name: impl Into<String>) -> Self {
        Type {
            name: name.into(),
            length: 1,
            isarray: false,
            ispointer: false,
            members: Vec::new(),
            is_external_video: false,
        }
    }

    pub fn is_struct(&self) -> bool {
        !self.members.is_empty()
    }
}
