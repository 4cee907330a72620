//! The C-style emitter: expression/statement rendering and
//! structured control flow, shared by every curly-brace dialect. This is
//! the "reusable default implementation" the design notes call for;
//! [`crate::back::glsl::Glsl`] wraps one of these and delegates to it for
//! everything but the GLSL-specific prologue and final assembly.

use std::fmt::Write as _;

use spirv::Op;

use crate::arena::Handle;
use crate::decode::Instruction;
use crate::error::Error;
use crate::ir::{ConstantInner, SymbolTables, Type};

use super::Emitter;

/// The kind of structured-control-flow region a pending merge belongs to,
/// so the right thing happens when its merge label is finally reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Selection { false_label: u32, else_emitted: bool },
    Loop { continue_label: u32 },
    Switch,
}

#[derive(Debug)]
struct Frame {
    merge_label: u32,
    kind: FrameKind,
}

/// Shared rendering state for one translation. Indentation and the control
/// stack are reset per function by [`CStyle::enter_function`].
pub struct CStyle {
    indent: usize,
    stack: Vec<Frame>,
    /// Set by `OpSelectionMerge`/`OpSwitch`, consumed by the branch or
    /// switch instruction that immediately follows it.
    pending_merge: Option<u32>,
    /// `(literal, target label)` pairs from the most recent `OpSwitch`.
    switch_cases: Vec<(u32, u32)>,
    /// `texture(...)` for GLSL >= 300, `texture2D(...)` below. Set by
    /// the owning dialect backend before translation begins.
    pub modern_sampling: bool,
    /// When true, an unsupported opcode is a hard error instead of a
    /// resilience comment.
    pub strict: bool,
}

impl Default for CStyle {
    fn default() -> Self {
        CStyle {
            indent: 1,
            stack: Vec::new(),
            pending_merge: None,
            switch_cases: Vec::new(),
            modern_sampling: true,
            strict: false,
        }
    }
}

impl CStyle {
    pub fn enter_function(&mut self) {
        self.indent = 1;
        self.stack.clear();
    }

    pub fn indent_str(&self) -> String {
        "\t".repeat(self.indent)
    }

    fn push_line(&self, buf: &mut String, line: &str) {
        let _ = writeln!(buf, "{}{}", self.indent_str(), line);
    }

    /// Resolves a (possibly nested) access chain into a suffix string like
    /// `.field[2].x`, walking the pointee type chain as indices are
    /// consumed.
    fn access_suffix(
        &self,
        tables: &SymbolTables,
        mut ty: Handle<Type>,
        indices: &[u32],
    ) -> String {
        let mut out = String::new();
        for &index_id in indices {
            let literal = Handle::from_id(index_id).and_then(|h| tables.constants.get(h));
            let base_ty = tables.types.get(ty);
            match base_ty {
                Some(t) if t.is_struct() => {
                    let member_index = literal
                        .and_then(|c| match c.inner {
                            ConstantInner::Uint(v) => Some(v as u32),
                            ConstantInner::Sint(v) => Some(v as u32),
                            _ => None,
                        })
                        .unwrap_or(0);
                    if let Some((name, member_ty)) = t.members.get(member_index as usize) {
                        let _ = write!(out, ".{}", name);
                        ty = *member_ty;
                    } else {
                        let _ = write!(out, "[{}]", tables.reference(index_id));
                    }
                }
                _ => {
                    let _ = write!(out, "[{}]", tables.reference(index_id));
                    if let Some(t) = base_ty {
                        if t.isarray {
                            // the element type is the same handle convention
                            // used when the array type was installed: keep
                            // walking with the same handle since arrays
                            // store their element type inline via `members`
                            // is not used for arrays; nothing further to
                            // narrow without extra bookkeeping, so stop.
                        }
                    }
                }
            }
        }
        out
    }

    /// Like [`Self::access_suffix`], but for `OpCompositeExtract`: its
    /// indices are literal numbers baked into the instruction, not ids
    /// referencing a constant — so the member/array index is used directly
    /// rather than resolved through the constant table.
    fn access_suffix_literal(
        &self,
        tables: &SymbolTables,
        mut ty: Handle<Type>,
        indices: &[u32],
    ) -> String {
        let mut out = String::new();
        for &index in indices {
            let base_ty = tables.types.get(ty);
            match base_ty {
                Some(t) if t.is_struct() => {
                    if let Some((name, member_ty)) = t.members.get(index as usize) {
                        let _ = write!(out, ".{}", name);
                        ty = *member_ty;
                    } else {
                        let _ = write!(out, "[{}]", index);
                    }
                }
                _ => {
                    let _ = write!(out, "[{}]", index);
                }
            }
        }
        out
    }

    fn binary_operator(op: Op) -> Option<&'static str> {
        Some(match op {
            Op::FAdd | Op::IAdd => "+",
            Op::FSub | Op::ISub => "-",
            Op::FMul | Op::IMul => "*",
            Op::FDiv | Op::SDiv | Op::UDiv => "/",
            Op::FMod | Op::SMod | Op::UMod | Op::SRem => "%",
            Op::FOrdEqual | Op::IEqual | Op::LogicalEqual => "==",
            Op::FOrdNotEqual | Op::INotEqual | Op::LogicalNotEqual => "!=",
            Op::FOrdLessThan | Op::SLessThan | Op::ULessThan => "<",
            Op::FOrdLessThanEqual | Op::SLessThanEqual | Op::ULessThanEqual => "<=",
            Op::FOrdGreaterThan | Op::SGreaterThan | Op::UGreaterThan => ">",
            Op::FOrdGreaterThanEqual | Op::SGreaterThanEqual | Op::UGreaterThanEqual => ">=",
            Op::LogicalAnd | Op::BitwiseAnd => "&",
            Op::LogicalOr | Op::BitwiseOr => "|",
            Op::BitwiseXor => "^",
            Op::ShiftLeftLogical => "<<",
            Op::ShiftRightLogical | Op::ShiftRightArithmetic => ">>",
            _ => return None,
        })
    }

    fn texture_fn(&self) -> &'static str {
        if self.modern_sampling {
            "texture"
        } else {
            "texture2D"
        }
    }

    /// Maps a GLSL.std.450 extended instruction opcode to the GLSL builtin
    /// it stands for. Covers the functions a typical vertex/fragment shader
    /// actually emits rather than the whole set; anything else falls through
    /// to the unsupported-opcode path the same as an unrecognized `Op`.
    fn glsl_ext_inst_name(instruction: u32) -> Option<&'static str> {
        Some(match instruction {
            1 => "round",
            2 => "roundEven",
            3 => "trunc",
            4 | 5 => "abs",
            6 | 7 => "sign",
            8 => "floor",
            9 => "ceil",
            10 => "fract",
            11 => "radians",
            12 => "degrees",
            13 => "sin",
            14 => "cos",
            15 => "tan",
            16 => "asin",
            17 => "acos",
            18 | 25 => "atan",
            19 => "sinh",
            20 => "cosh",
            21 => "tanh",
            22 => "asinh",
            23 => "acosh",
            24 => "atanh",
            26 => "pow",
            27 => "exp",
            28 => "log",
            29 => "exp2",
            30 => "log2",
            31 => "sqrt",
            32 => "inversesqrt",
            33 => "determinant",
            34 => "inverse",
            37 | 38 | 39 => "min",
            40 | 41 | 42 => "max",
            43 | 44 | 45 => "clamp",
            46 => "mix",
            48 => "step",
            49 => "smoothstep",
            50 => "fma",
            66 => "length",
            67 => "distance",
            68 => "cross",
            69 => "normalize",
            70 => "faceforward",
            71 => "reflect",
            72 => "refract",
            _ => return None,
        })
    }

    /// Handles the structured control-flow opcodes. Returns `true` if the
    /// instruction was one of them (and therefore fully handled here).
    fn try_control_flow(
        &mut self,
        tables: &mut SymbolTables,
        function: usize,
        inst: &Instruction,
    ) -> Result<bool, Error> {
        match inst.opcode {
            Op::SelectionMerge => {
                // Recorded; the following OpBranchConditional pushes the frame.
                self.pending_merge = Some(inst.operand(0)?);
                Ok(true)
            }
            Op::LoopMerge => {
                let merge_label = inst.operand(0)?;
                let continue_label = inst.operand(1)?;
                self.push_frame(
                    tables,
                    function,
                    "while (true) {",
                    Frame {
                        merge_label,
                        kind: FrameKind::Loop { continue_label },
                    },
                );
                Ok(true)
            }
            Op::BranchConditional => {
                let cond = tables.reference(inst.operand(0)?);
                let true_label = inst.operand(1)?;
                let false_label = inst.operand(2)?;
                if let Some(merge_label) = self.pending_merge.take() {
                    // A plain `if`; `false_label` may equal `merge_label`
                    // when there is no `else`.
                    let _ = true_label;
                    self.push_frame(
                        tables,
                        function,
                        &format!("if ({}) {{", cond),
                        Frame {
                            merge_label,
                            kind: FrameKind::Selection {
                                false_label,
                                else_emitted: false,
                            },
                        },
                    );
                } else {
                    // Conditional branch without a preceding merge is the
                    // loop-condition check inside a `while (true)` body:
                    // `if (!cond) break;`
                    let buf = &mut tables.functions[function].text;
                    self.push_line(buf, &format!("if (!({})) break;", cond));
                }
                Ok(true)
            }
            Op::Branch => {
                let target = inst.operand(0)?;
                if let Some(frame) = self.stack.last() {
                    if let FrameKind::Loop { continue_label } = frame.kind {
                        if target == continue_label {
                            let buf = &mut tables.functions[function].text;
                            self.push_line(buf, "continue;");
                        }
                    }
                }
                Ok(true)
            }
            Op::Switch => {
                let selector = tables.reference(inst.operand(0)?);
                let merge_label = self.pending_merge.take().unwrap_or(0);
                self.switch_cases.clear();
                let mut i = 2;
                while i + 1 < inst.operands.len() {
                    self.switch_cases
                        .push((inst.operands[i], inst.operands[i + 1]));
                    i += 2;
                }
                self.push_frame(
                    tables,
                    function,
                    &format!("switch ({}) {{", selector),
                    Frame {
                        merge_label,
                        kind: FrameKind::Switch,
                    },
                );
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn push_frame(&mut self, tables: &mut SymbolTables, function: usize, header: &str, frame: Frame) {
        let buf = &mut tables.functions[function].text;
        self.push_line(buf, header);
        self.indent += 1;
        self.stack.push(frame);
    }

    /// Called by the owning backend whenever an `OpLabel` is *not* the
    /// first label of a function: matches the label id against any pending
    /// merge/case boundary and closes or re-opens braces accordingly.
    pub fn on_block_label(&mut self, tables: &mut SymbolTables, function: usize, label_id: u32) {
        // Close every frame whose merge label is this one (innermost first).
        while let Some(frame) = self.stack.last() {
            if frame.merge_label == label_id {
                let frame = self.stack.pop().unwrap();
                let _ = frame;
                self.indent -= 1;
                let buf = &mut tables.functions[function].text;
                self.push_line(buf, "}");
            } else {
                break;
            }
        }
        // An `else` boundary for the innermost selection frame.
        if let Some(frame) = self.stack.last_mut() {
            if let FrameKind::Selection {
                false_label,
                ref mut else_emitted,
            } = frame.kind
            {
                if *false_label == label_id && *false_label != frame.merge_label && !*else_emitted {
                    *else_emitted = true;
                    self.indent -= 1;
                    let buf = &mut tables.functions[function].text;
                    self.push_line(buf, "} else {");
                    self.indent += 1;
                }
            }
        }
        if let Some(case_value) = self
            .switch_cases
            .iter()
            .find(|(_, target)| *target == label_id)
            .map(|(value, _)| *value)
        {
            let buf = &mut tables.functions[function].text;
            self.push_line(buf, &format!("case {}:", case_value as i32));
        }
    }

    fn render_sample(&self, tables: &mut SymbolTables, inst: &Instruction) -> Result<(), Error> {
        let result_id = inst.operand(1)?;
        let sampled_image = inst.operand(2)?;
        let coordinate = inst.operand(3)?;
        let sampler_ref = tables.reference(sampled_image);
        let coord_ref = tables.reference(coordinate);
        let text = if inst.opcode == Op::ImageSampleDrefImplicitLod
            || inst.opcode == Op::ImageSampleDrefExplicitLod
        {
            let dref = tables.reference(inst.operand(4)?);
            format!(
                "{}({}, vec3({}, {}))",
                self.texture_fn(),
                sampler_ref,
                coord_ref,
                dref
            )
        } else {
            format!("{}({}, {})", self.texture_fn(), sampler_ref, coord_ref)
        };
        tables.set_reference(result_id, text);
        Ok(())
    }
}

impl Emitter for CStyle {
    fn on_label(
        &mut self,
        tables: &mut SymbolTables,
        function: usize,
        label_id: u32,
        is_first_in_function: bool,
        _is_first_function: bool,
    ) -> Result<(), Error> {
        if is_first_in_function {
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
            let buf = &mut tables.functions[function].text;
            let _ = writeln!(buf, "{} {}({})", type_name, name, args.join(", "));
            let _ = writeln!(buf, "{{");
            self.enter_function();
        } else {
            self.on_block_label(tables, function, label_id);
        }
        Ok(())
    }

    fn emit_op(
        &mut self,
        tables: &mut SymbolTables,
        function: usize,
        inst: &Instruction,
    ) -> Result<(), Error> {
        if self.try_control_flow(tables, function, inst)? {
            return Ok(());
        }

        match inst.opcode {
            Op::Load => {
                let result_id = inst.operand(1)?;
                let pointer = inst.operand(2)?;
                let text = tables.reference(pointer);
                tables.set_reference(result_id, text);
            }
            Op::Store => {
                let pointer = tables.reference(inst.operand(0)?);
                let value = tables.reference(inst.operand(1)?);
                let buf = &mut tables.functions[function].text;
                self.push_line(buf, &format!("{} = {};", pointer, value));
            }
            Op::AccessChain | Op::InBoundsAccessChain => {
                let result_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                let base = inst.operand(2)?;
                let base_text = tables.reference(base);
                let base_ty = Handle::from_id(base)
                    .and_then(|h| tables.variables.get(h))
                    .map(|v| v.ty)
                    .unwrap_or_else(|| Handle::from_id(result_type).unwrap());
                let suffix = self.access_suffix(tables, base_ty, &inst.operands[3..]);
                tables.set_reference(result_id, format!("{}{}", base_text, suffix));
            }
            Op::CompositeExtract => {
                let result_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                let base = inst.operand(2)?;
                let base_text = tables.reference(base);
                let base_ty = Handle::from_id(base)
                    .and_then(|h| tables.variables.get(h))
                    .map(|v| v.ty)
                    .unwrap_or_else(|| Handle::from_id(result_type).unwrap());
                let suffix = self.access_suffix_literal(tables, base_ty, &inst.operands[3..]);
                tables.set_reference(result_id, format!("{}{}", base_text, suffix));
            }
            Op::CompositeConstruct => {
                let result_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                let type_name = tables
                    .types
                    .get(Handle::from_id(result_type).unwrap())
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| "_".into());
                let args: Vec<String> = inst.operands[2..]
                    .iter()
                    .map(|&id| tables.reference(id))
                    .collect();
                tables.set_reference(result_id, format!("{}({})", type_name, args.join(", ")));
            }
            Op::VectorTimesScalar
            | Op::MatrixTimesVector
            | Op::MatrixTimesMatrix
            | Op::VectorTimesMatrix
            | Op::MatrixTimesScalar => {
                let result_id = inst.operand(1)?;
                let a = tables.reference(inst.operand(2)?);
                let b = tables.reference(inst.operand(3)?);
                tables.set_reference(result_id, format!("({} * {})", a, b));
            }
            Op::Dot => {
                let result_id = inst.operand(1)?;
                let a = tables.reference(inst.operand(2)?);
                let b = tables.reference(inst.operand(3)?);
                tables.set_reference(result_id, format!("dot({}, {})", a, b));
            }
            Op::FNegate | Op::SNegate => {
                let result_id = inst.operand(1)?;
                let a = tables.reference(inst.operand(2)?);
                tables.set_reference(result_id, format!("(-{})", a));
            }
            Op::LogicalNot => {
                let result_id = inst.operand(1)?;
                let a = tables.reference(inst.operand(2)?);
                tables.set_reference(result_id, format!("(!{})", a));
            }
            Op::FunctionCall => {
                let result_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                let callee = inst.operand(2)?;
                let callee_name = tables.name_of(callee);
                let args: Vec<String> = inst.operands[3..]
                    .iter()
                    .map(|&id| tables.reference(id))
                    .collect();
                let call = format!("{}({})", callee_name, args.join(", "));
                let is_void = tables
                    .types
                    .get(Handle::from_id(result_type).unwrap())
                    .map(|t| t.name == "void")
                    .unwrap_or(false);
                if is_void {
                    let buf = &mut tables.functions[function].text;
                    self.push_line(buf, &format!("{};", call));
                } else {
                    tables.set_reference(result_id, call);
                }
            }
            Op::ImageSampleImplicitLod
            | Op::ImageSampleExplicitLod
            | Op::ImageSampleDrefImplicitLod
            | Op::ImageSampleDrefExplicitLod => {
                self.render_sample(tables, inst)?;
            }
            Op::SampledImage => {
                let result_id = inst.operand(1)?;
                let image = tables.reference(inst.operand(2)?);
                tables.set_reference(result_id, image);
            }
            Op::ExtInst => {
                let result_id = inst.operand(1)?;
                let instruction = inst.operand(3)?;
                let args: Vec<String> = inst.operands[4..]
                    .iter()
                    .map(|&id| tables.reference(id))
                    .collect();
                if let Some(name) = Self::glsl_ext_inst_name(instruction) {
                    tables.set_reference(result_id, format!("{}({})", name, args.join(", ")));
                } else if self.strict {
                    return Err(Error::UnsupportedOpcode(inst.opcode));
                } else {
                    log::warn!("unsupported GLSL.std.450 extended instruction: {}", instruction);
                    tables.set_reference(
                        result_id,
                        format!("/* unsupported ext inst {} */({})", instruction, args.join(", ")),
                    );
                }
            }
            Op::Return => {
                let buf = &mut tables.functions[function].text;
                self.push_line(buf, "return;");
            }
            Op::ReturnValue => {
                let value = tables.reference(inst.operand(0)?);
                let buf = &mut tables.functions[function].text;
                self.push_line(buf, &format!("return {};", value));
            }
            Op::Kill => {
                let buf = &mut tables.functions[function].text;
                self.push_line(buf, "discard;");
            }
            _ => {
                if let Some(operator) = Self::binary_operator(inst.opcode) {
                    let result_id = inst.operand(1)?;
                    let a = tables.reference(inst.operand(2)?);
                    let b = tables.reference(inst.operand(3)?);
                    tables.set_reference(result_id, format!("({} {} {})", a, operator, b));
                } else if self.strict {
                    return Err(Error::UnsupportedOpcode(inst.opcode));
                } else {
                    log::warn!("unsupported opcode reached the emitter: {:?}", inst.opcode);
                    let buf = &mut tables.functions[function].text;
                    self.push_line(buf, &format!("// unsupported opcode: {:?}", inst.opcode));
                }
            }
        }
        Ok(())
    }

    fn on_function_end(&mut self, tables: &mut SymbolTables, function: usize) {
        self.indent = self.indent.saturating_sub(1);
        let buf = &mut tables.functions[function].text;
        let _ = writeln!(buf, "}}");
    }

    fn finalize(&mut self, tables: &SymbolTables) -> Result<Vec<u8>, Error> {
        let mut out = Vec::new();
        for function in &tables.functions {
            out.extend_from_slice(function.text.as_bytes());
            out.extend_from_slice(b"\n\n");
        }
        Ok(out)
    }
}
