//! SPIR-V to GLSL translator.
//!
//! Decodes a SPIR-V binary module ([`decode`]) and walks it once
//! ([`translator`]) to rebuild a typed symbol environment ([`ir`]), handing
//! every instruction that isn't symbol-table bookkeeping to a pluggable
//! [`back::Emitter`] — either the [`back::glsl::Glsl`] dialect backend or
//! the [`back::varlist::VarList`] interface-variable reporter.
#![deny(clippy::panic)]

pub mod arena;
pub mod back;
pub mod decode;
pub mod error;
pub mod ir;
pub mod target;
mod translator;

pub use crate::error::Error;
pub use crate::target::{Language, Stage, System, Target};

use std::collections::{HashMap, HashSet};
use std::hash::BuildHasherDefault;

/// Hash map that is faster but not resilient to DoS attacks.
pub type FastHashMap<K, T> = HashMap<K, T, BuildHasherDefault<fxhash::FxHasher>>;
/// Hash set that is faster but not resilient to DoS attacks.
pub type FastHashSet<K> = HashSet<K, BuildHasherDefault<fxhash::FxHasher>>;

/// Translates a SPIR-V binary module into GLSL source text.
///
/// `strict` upgrades an unsupported opcode from a resilience comment to a
/// hard [`Error::UnsupportedOpcode`].
pub fn translate_glsl(bytes: &[u8], target: Target, stage: Stage, strict: bool) -> Result<Vec<u8>, Error> {
    let (header, instructions) = decode::decode(bytes)?;
    log::debug!(
        "decoded {} instructions, id bound {}",
        instructions.len(),
        header.bound
    );
    let mut backend = back::glsl::Glsl::new(target, stage);
    backend.set_strict(strict);
    translator::translate(&header, &instructions, &mut backend)
}

/// Translates a SPIR-V binary module into the var-list file manifest
/// format. `target` only affects whether an external-video image samples
/// as `samplerExternalOES` (Android) or the generic `sampler2D`.
pub fn translate_varlist(bytes: &[u8], target: Target, stage: Stage) -> Result<Vec<u8>, Error> {
    let (header, instructions) = decode::decode(bytes)?;
    let mut backend = back::varlist::VarList::with_target(stage, &target);
    translator::translate(&header, &instructions, &mut backend)
}

/// Writes the var-list diagnostic dump to standard error.
pub fn print_varlist(bytes: &[u8], stage: Stage) -> Result<(), Error> {
    let (header, instructions) = decode::decode(bytes)?;
    let mut backend = back::varlist::VarList::new(stage);
    let tables = translator::collect_symbols(&header, &instructions, &mut backend)?;
    backend.print(&tables)
}
