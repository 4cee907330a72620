//! The var-list emitter: rather than translate shader
//! bodies, it enumerates the module's interface variables in one of two
//! textual formats — a file manifest (`outputCode`) or a stderr diagnostic
//! dump (`print`), mirroring the original tool's convention of reserving
//! stdout for the primary translation output.

use std::io::Write as _;

use spirv::StorageClass;

use crate::error::Error;
use crate::ir::SymbolTables;
use crate::target::Stage;

use super::{resolved_type_name, Emitter};

fn qualifier(storage: StorageClass) -> Option<&'static str> {
    match storage {
        StorageClass::Input => Some("in"),
        StorageClass::Output => Some("out"),
        StorageClass::UniformConstant => Some("uniform"),
        _ => None,
    }
}

fn diagnostic_qualifier(storage: StorageClass) -> Option<&'static str> {
    match storage {
        StorageClass::Input => Some("input"),
        StorageClass::Output => Some("output"),
        StorageClass::UniformConstant => Some("uniform"),
        _ => None,
    }
}

pub struct VarList {
    stage: Stage,
    /// Only consulted by [`VarList::finalize`] (the file manifest format).
    /// The original tool's diagnostic dump (`print`) takes no target at
    /// all and always reports the generic `sampler2D` spelling even for an
    /// external-video image on Android; `finalize` keeps the richer,
    /// target-aware naming its own `outputCode` used.
    android: bool,
}

impl VarList {
    pub fn new(stage: Stage) -> Self {
        VarList { stage, android: false }
    }

    pub fn with_target(stage: Stage, target: &crate::target::Target) -> Self {
        VarList {
            stage,
            android: target.is_android(),
        }
    }

    /// Writes the `#shader:<stage>` / `#<qualifier>:<name>:<type>` diagnostic
    /// dump to the process's standard error.
    pub fn print(&self, tables: &SymbolTables) -> Result<(), Error> {
        let stderr = std::io::stderr();
        let mut handle = stderr.lock();
        writeln!(handle, "#shader:{}", self.stage.manifest_name())?;
        for (id, storage, type_name) in self.records(tables, false) {
            let diag = diagnostic_qualifier(storage).expect("records() already filtered storage");
            writeln!(handle, "#{}:{}:{}", diag, tables.name_of(id), type_name)?;
        }
        Ok(())
    }

    fn records(&self, tables: &SymbolTables, android_aware: bool) -> Vec<(u32, StorageClass, String)> {
        let mut out = Vec::new();
        for (handle, variable) in tables.variables.iter() {
            let id = handle.id();
            if tables.names.get(&id).is_none() || qualifier(variable.storage).is_none() {
                continue;
            }
            let type_name = tables
                .types
                .get(variable.ty)
                .map(|t| resolved_type_name(t, android_aware && self.android))
                .unwrap_or_else(|| "_".into());
            out.push((id, variable.storage, type_name));
        }
        out
    }
}

impl Emitter for VarList {
    fn on_label(
        &mut self,
        _tables: &mut SymbolTables,
        _function: usize,
        _label_id: u32,
        _is_first_in_function: bool,
        _is_first_function: bool,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn emit_op(
        &mut self,
        _tables: &mut SymbolTables,
        _function: usize,
        _inst: &crate::decode::Instruction,
    ) -> Result<(), Error> {
        Ok(())
    }

    fn on_function_end(&mut self, _tables: &mut SymbolTables, _function: usize) {}

    fn finalize(&mut self, tables: &SymbolTables) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        writeln!(out, "{}", self.stage.manifest_name())?;
        for (id, storage, type_name) in self.records(tables, true) {
            let q = qualifier(storage).expect("records() already filtered storage");
            writeln!(out, "{} {} {}", q, type_name, tables.name_of(id))?;
        }
        Ok(out)
    }
}
