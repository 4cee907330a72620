//! Backend framework (components 4.3–4.6): a capability-set trait that
//! every code-emitting backend implements, a reusable C-style default
//! implementation, and the two concrete backends built on top of it.
//!
//! The source material expresses backend variants through an inheritance
//! chain (abstract walker → C-style emitter → concrete dialect). Rust has
//! no implementation inheritance, so the chain is reimplemented as
//! composition: [`Emitter`] names the capability set a backend must
//! provide, [`cstyle::CStyle`] is a complete, reusable implementation of it
//! for curly-brace languages, and [`glsl::Glsl`] *contains* a `CStyle` and
//! delegates to it for everything except the module/function prologue and
//! final assembly, which are GLSL-specific.

pub mod cstyle;
pub mod glsl;
pub mod varlist;

use crate::decode::Instruction;
use crate::error::Error;
use crate::ir::{SymbolTables, Type};

/// The capability set required of any backend.
pub trait Emitter {
    /// Called for every `OpLabel`. `is_first_in_function` is true exactly
    /// once per function (its prologue point); `is_first_function` is
    /// true only for the very first label of the very first function in
    /// the module, which is also where the module-wide prologue belongs
    /// `label_id` is the label's own result id, needed by
    /// mid-function labels to close or re-open structured-control-flow
    /// braces (merge/continue/case targets).
    fn on_label(
        &mut self,
        tables: &mut SymbolTables,
        function: usize,
        label_id: u32,
        is_first_in_function: bool,
        is_first_function: bool,
    ) -> Result<(), Error>;

    /// Called for every instruction the base walker does not itself
    /// consume for symbol-table bookkeeping: expression and statement
    /// rendering.
    fn emit_op(
        &mut self,
        tables: &mut SymbolTables,
        function: usize,
        inst: &Instruction,
    ) -> Result<(), Error>;

    /// Called at `OpFunctionEnd`: closes the current function's buffer.
    fn on_function_end(&mut self, tables: &mut SymbolTables, function: usize);

    /// Assembles the final output from the per-function buffers built up
    /// during the walk.
    fn finalize(&mut self, tables: &SymbolTables) -> Result<Vec<u8>, Error>;
}

/// Prefix that marks a type or variable name as an implicit GLSL built-in,
/// reached indirectly rather than declared in the interface block.
pub const BUILTIN_PREFIX: &str = "gl_";

pub fn is_builtin_name(name: &str) -> bool {
    name.starts_with(BUILTIN_PREFIX)
}

/// The textual spelling a backend should use for `ty`, given whether the
/// current target is Android. Only `OpTypeImage` results ever carry
/// `is_external_video`, so this is a no-op for every other type; the
/// `sampler2D` name the shared walker installed stands for every platform
/// except an Android target sampling an external (camera/video) image.
pub fn resolved_type_name(ty: &Type, android: bool) -> String {
    if android && ty.is_external_video {
        "samplerExternalOES".to_string()
    } else {
        ty.name.clone()
    }
}
