//! The GLSL backend (components 4.4/4.5): wraps a [`super::cstyle::CStyle`]
//! for expression/statement rendering and overrides only what is
//! GLSL-specific — the module/function prologue and the `patch_main`
//! splice that assembles the final file.

use std::fmt::Write as _;

use crate::ir::SymbolTables;
use crate::target::{Stage, Target};
use crate::Error;

use super::cstyle::CStyle;
use super::{is_builtin_name, resolved_type_name, Emitter};

use spirv::StorageClass;

/// Name of the GLSL variable desktop profiles ≥ 300 redirect the implicit
/// fragment color output to.
const FRAG_COLOR_REDIRECT: &str = "krafix_FragColor";

pub struct Glsl {
    cstyle: CStyle,
    target: Target,
    stage: Stage,
    /// Set once the module prologue (version directive onward) has been
    /// written, so it only happens before the very first function.
    module_prologue_done: bool,
}

impl Glsl {
    pub fn new(target: Target, stage: Stage) -> Self {
        Glsl {
            cstyle: CStyle {
                modern_sampling: target.version >= 300,
                ..Default::default()
            },
            target,
            stage,
            module_prologue_done: false,
        }
    }

    pub fn set_strict(&mut self, strict: bool) {
        self.cstyle.strict = strict;
    }

    fn qualifier(&self, storage: StorageClass) -> Option<&'static str> {
        let modern = self.target.version >= 300;
        match (self.stage, storage) {
            (Stage::Vertex, StorageClass::Input) => Some(if modern { "in" } else { "attribute" }),
            (Stage::Vertex, StorageClass::Output) => Some(if modern { "out" } else { "varying" }),
            (Stage::Fragment, StorageClass::Input) => Some(if modern { "in" } else { "varying" }),
            (Stage::Fragment, StorageClass::Output) => None,
            (
                Stage::Geometry | Stage::TessControl | Stage::TessEvaluation,
                StorageClass::Input,
            ) => Some("in"),
            (
                Stage::Geometry | Stage::TessControl | Stage::TessEvaluation,
                StorageClass::Output,
            ) => Some("out"),
            (_, StorageClass::UniformConstant) => Some("uniform"),
            (_, _) => Some(""),
        }
    }

    fn write_module_prologue(&mut self, tables: &mut SymbolTables, buf: &mut String) {
        let version = match self.stage {
            Stage::Vertex | Stage::Fragment if self.target.version != 0 => self.target.version,
            Stage::Vertex | Stage::Fragment => 330,
            _ => 400,
        };
        let _ = writeln!(buf, "#version {}", version);

        if self.target.is_android() && self.stage == Stage::Fragment {
            let _ = writeln!(buf, "#extension GL_OES_EGL_image_external : require");
        }

        for (_, ty) in tables.types.iter() {
            if ty.is_struct() && !ty.ispointer && !is_builtin_name(&ty.name) {
                let _ = writeln!(buf, "struct {} {{", ty.name);
                for (member_name, member_ty) in &ty.members {
                    let member_type_name = tables
                        .types
                        .get(*member_ty)
                        .map(|t| t.name.clone())
                        .unwrap_or_else(|| "_".into());
                    let _ = writeln!(buf, "\t{} {};", member_type_name, member_name);
                }
                let _ = writeln!(buf, "}};");
            }
        }

        let desktop_frag_color =
            !self.target.es && self.target.version >= 300 && self.stage == Stage::Fragment;
        if desktop_frag_color {
            let _ = writeln!(buf, "out vec4 {};", FRAG_COLOR_REDIRECT);
        }

        if self.target.es {
            let _ = writeln!(buf, "precision mediump float;");
        }

        for (handle, variable) in tables.variables.iter() {
            let name = tables.name_of(handle.id());
            if variable.builtin {
                continue;
            }
            let ty = tables.types.get(variable.ty);
            let type_name = ty
                .map(|t| resolved_type_name(t, self.target.is_android()))
                .unwrap_or_else(|| "_".into());
            if is_builtin_name(&type_name) {
                continue;
            }
            let qualifier = match self.qualifier(variable.storage) {
                Some(q) => q,
                None => continue,
            };
            let declarator = match ty {
                Some(t) if t.isarray => format!("{} {}[{}]", type_name, name, t.length),
                _ => format!("{} {}", type_name, name),
            };
            if qualifier.is_empty() {
                let _ = writeln!(buf, "{};", declarator);
            } else {
                let _ = writeln!(buf, "{} {};", qualifier, declarator);
            }
        }

        let _ = writeln!(buf);

        for declaration in &tables.forward_declarations {
            let _ = writeln!(buf, "{};", declaration);
        }
        let _ = writeln!(buf);
    }
}

impl Emitter for Glsl {
    fn on_label(
        &mut self,
        tables: &mut SymbolTables,
        function: usize,
        label_id: u32,
        is_first_in_function: bool,
        is_first_function: bool,
    ) -> Result<(), Error> {
        if !is_first_in_function {
            self.cstyle.on_block_label(tables, function, label_id);
            return Ok(());
        }

        let mut prologue = String::new();
        if is_first_function && !self.module_prologue_done {
            self.write_module_prologue(tables, &mut prologue);
            self.module_prologue_done = true;
        }

        let name = tables.functions[function].name.clone();
        let return_type = tables.functions[function].return_type;
        let params = tables.functions[function].parameters.clone();
        let type_name = tables
            .types
            .get(return_type)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "void".into());
        let args: Vec<String> = params
            .iter()
            .map(|p| {
                let tn = tables
                    .types
                    .get(p.ty)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| "_".into());
                format!("{} {}", tn, tables.name_of(p.id))
            })
            .collect();

        if name == "patch_main" {
            let _ = writeln!(prologue, "if (gl_InvocationID == 0)");
        } else {
            let _ = writeln!(prologue, "{} {}({})", type_name, name, args.join(", "));
        }
        let _ = writeln!(prologue, "{{");

        tables.functions[function].text.push_str(&prologue);
        self.cstyle.enter_function();
        Ok(())
    }

    fn emit_op(
        &mut self,
        tables: &mut SymbolTables,
        function: usize,
        inst: &crate::decode::Instruction,
    ) -> Result<(), Error> {
        self.cstyle.emit_op(tables, function, inst)
    }

    fn on_function_end(&mut self, tables: &mut SymbolTables, function: usize) {
        self.cstyle.on_function_end(tables, function)
    }

    fn finalize(&mut self, tables: &SymbolTables) -> Result<Vec<u8>, Error> {
        let patch_main_text = tables
            .functions
            .iter()
            .find(|f| f.name == "patch_main")
            .map(|f| f.text.as_str());

        let mut out = Vec::new();
        for function in &tables.functions {
            if function.name == "patch_main" {
                continue;
            }
            if function.name == "main" {
                if let Some(patch_text) = patch_main_text.filter(|t| !t.is_empty()) {
                    let main_lines: Vec<&str> = function.text.lines().collect();
                    for line in main_lines.iter().take(2) {
                        out.extend_from_slice(line.as_bytes());
                        out.push(b'\n');
                    }
                    for line in patch_text.lines() {
                        if line.len() >= 7 && &line[line.len() - 7..] == "return;" {
                            continue;
                        }
                        out.push(b'\t');
                        out.extend_from_slice(line.as_bytes());
                        out.push(b'\n');
                    }
                    for line in main_lines.iter().skip(2) {
                        out.extend_from_slice(line.as_bytes());
                        out.push(b'\n');
                    }
                    out.push(b'\n');
                    continue;
                }
            }
            out.extend_from_slice(function.text.as_bytes());
            out.extend_from_slice(b"\n\n");
        }
        Ok(out)
    }
}
