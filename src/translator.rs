//! The base walker: a single forward pass over the decoded
//! instruction stream that rebuilds the symbol tables — types, variables,
//! constants, names, decorations, functions — and hands every other
//! instruction to a [`back::Emitter`] for rendering.

use num_traits::FromPrimitive;
use spirv::{Decoration, Op, StorageClass};

use crate::arena::Handle;
use crate::back::Emitter;
use crate::decode::{Header, Instruction};
use crate::error::Error;
use crate::ir::{Constant, ConstantInner, Decorations, SymbolTables, Type, Variable};

/// Walks `instructions` once, maintaining [`SymbolTables`] and delegating
/// label/expression/statement handling to `emitter`. Returns whatever
/// `emitter.finalize` produces.
pub fn translate<E: Emitter>(
    header: &Header,
    instructions: &[Instruction],
    emitter: &mut E,
) -> Result<Vec<u8>, Error> {
    let tables = walk(header, instructions, emitter)?;
    emitter.finalize(&tables)
}

/// Like [`translate`], but returns the populated symbol tables instead of
/// calling `emitter.finalize` — used by callers that only need the symbol
/// environment (e.g. the var-list diagnostic dump, which writes directly to
/// stderr rather than through the `Emitter` finalize path).
pub fn collect_symbols<E: Emitter>(
    header: &Header,
    instructions: &[Instruction],
    emitter: &mut E,
) -> Result<SymbolTables, Error> {
    walk(header, instructions, emitter)
}

fn walk<E: Emitter>(
    header: &Header,
    instructions: &[Instruction],
    emitter: &mut E,
) -> Result<SymbolTables, Error> {
    let mut tables = SymbolTables::with_bound(header.bound);
    tables.forward_declarations = prescan_forward_declarations(header, instructions)?;
    let mut current_function: Option<usize> = None;
    let mut is_first_function = true;
    let mut seen_label_in_function = false;

    for inst in instructions {
        if apply_declaration(&mut tables, inst)? {
            continue;
        }
        match inst.opcode {
            Op::Function => {
                let return_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                let name = tables.name_of(result_id);
                let index = tables.open_function(result_id, name, Handle::from_id(return_type).unwrap());
                current_function = Some(index);
                seen_label_in_function = false;
            }
            Op::FunctionParameter => {
                let result_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                if let Some(index) = current_function {
                    tables.functions[index].parameters.push(crate::ir::function::Parameter {
                        id: result_id,
                        ty: Handle::from_id(result_type).unwrap(),
                    });
                }
            }
            Op::Label => {
                let label_id = inst.operand(0)?;
                if let Some(index) = current_function {
                    let first = !seen_label_in_function;
                    emitter.on_label(&mut tables, index, label_id, first, first && is_first_function)?;
                    seen_label_in_function = true;
                    if first {
                        is_first_function = false;
                    }
                }
            }
            Op::FunctionEnd => {
                if let Some(index) = current_function {
                    emitter.on_function_end(&mut tables, index);
                }
                current_function = None;
            }
            _ => {
                if let Some(index) = current_function {
                    emitter.emit_op(&mut tables, index, inst)?;
                }
            }
        }
    }

    Ok(tables)
}

/// Processes every instruction that feeds the declaration tables (names,
/// decorations, types, constants, variables) rather than function bodies.
/// Returns `true` if `inst` was one of these and has been fully handled.
///
/// Factored out so the real walk and [`prescan_forward_declarations`] (which
/// needs the same type/name bookkeeping to spell a function's signature
/// before its own body has been reached) can never drift out of sync.
fn apply_declaration(tables: &mut SymbolTables, inst: &Instruction) -> Result<bool, Error> {
    match inst.opcode {
        Op::Name => {
            let id = inst.operand(0)?;
            let text = inst.string.clone().unwrap_or_default();
            log::debug!("OpName %{} = {:?}", id, text);
            tables.names.insert(id, text);
        }
        Op::MemberName => {
            let struct_id = inst.operand(0)?;
            let member = inst.operand(1)?;
            let text = inst.string.clone().unwrap_or_default();
            tables.member_names.insert((struct_id, member), text);
        }
        Op::Decorate => {
            apply_decoration(tables, inst.operand(0)?, inst, 1)?;
        }
        Op::MemberDecorate => {
            let struct_id = inst.operand(0)?;
            let member = inst.operand(1)?;
            let decoration = decode_decoration(inst, 2)?;
            let entry = tables.member_decorations.entry((struct_id, member)).or_default();
            merge_decoration(entry, decoration);
        }
        Op::TypeVoid => install_type(tables, inst.operand(0)?, Type::scalar("void")),
        Op::TypeBool => install_type(tables, inst.operand(0)?, Type::scalar("bool")),
        Op::TypeInt => {
            let signed = inst.operand(2)? != 0;
            install_type(
                tables,
                inst.operand(0)?,
                Type::scalar(if signed { "int" } else { "uint" }),
            );
        }
        Op::TypeFloat => install_type(tables, inst.operand(0)?, Type::scalar("float")),
        Op::TypeVector => {
            let result_id = inst.operand(0)?;
            let component = inst.operand(1)?;
            let count = inst.operand(2)?;
            let base = type_name(tables, component);
            let name = format!("{}vec{}", vector_prefix(&base), count);
            install_type(tables, result_id, Type::scalar(name));
        }
        Op::TypeMatrix => {
            let result_id = inst.operand(0)?;
            let column = inst.operand(1)?;
            let count = inst.operand(2)?;
            let column_name = type_name(tables, column);
            // Deliberately preserves the source tool's ambiguity: only
            // the square 3x3/4x4 forms get a name installed. A
            // non-square matrix (or any other column/count pairing)
            // falls through with no entry, so later references resolve
            // through the generic `_<id>` fallback instead of a bogus
            // synthesized name.
            let matrix_name = match (column_name.as_str(), count) {
                ("vec3", 3) => Some("mat3"),
                ("vec4", 4) => Some("mat4"),
                _ => None,
            };
            if let Some(name) = matrix_name {
                let mut ty = Type::scalar(name);
                ty.length = count;
                install_type(tables, result_id, ty);
            }
        }
        Op::TypeArray => {
            let result_id = inst.operand(0)?;
            let element = inst.operand(1)?;
            let length_id = inst.operand(2)?;
            let length = Handle::from_id(length_id)
                .and_then(|h| tables.constants.get(h))
                .map(|c| match c.inner {
                    ConstantInner::Uint(v) => v as u32,
                    ConstantInner::Sint(v) => v as u32,
                    _ => 0,
                })
                .unwrap_or(0);
            let mut ty = Type::scalar(type_name(tables, element));
            ty.length = length;
            ty.isarray = true;
            install_type(tables, result_id, ty);
        }
        Op::TypeStruct => {
            let result_id = inst.operand(0)?;
            let members = inst
                .operands
                .iter()
                .skip(1)
                .enumerate()
                .map(|(index, &member_type)| {
                    let name = tables.member_name_of(result_id, index as u32);
                    (name, Handle::from_id(member_type).unwrap())
                })
                .collect();
            let mut ty = Type::scalar(tables.name_of(result_id));
            ty.members = members;
            install_type(tables, result_id, ty);
        }
        Op::TypePointer => {
            let result_id = inst.operand(0)?;
            let pointee = inst.operand(2)?;
            let mut ty = Type::scalar(type_name(tables, pointee));
            ty.ispointer = true;
            // Copy the pointee's shape through so an access chain on the
            // *pointer* type (what `OpVariable` actually points at) can
            // still walk struct members / array-ness without an extra
            // indirection back to the pointee id.
            if let Some(pointee_ty) = Handle::from_id(pointee).and_then(|h| tables.types.get(h)) {
                ty.is_external_video = pointee_ty.is_external_video;
                ty.members = pointee_ty.members.clone();
                ty.isarray = pointee_ty.isarray;
                ty.length = pointee_ty.length;
            }
            install_type(tables, result_id, ty);
        }
        Op::TypeImage => {
            let result_id = inst.operand(0)?;
            // Operand 8 is the optional access qualifier, present only
            // when the image format operand is `Unknown`; krafix
            // overloads it to flag an external (camera/video) image.
            let is_video = inst.operands.get(8).copied() == Some(1);
            let mut ty = Type::scalar("sampler2D");
            ty.is_external_video = is_video;
            install_type(tables, result_id, ty);
        }
        Op::TypeSampler => {
            install_type(tables, inst.operand(0)?, Type::scalar("sampler"));
        }
        Op::TypeSampledImage => {
            let result_id = inst.operand(0)?;
            let image = inst.operand(1)?;
            let mut ty = Type::scalar(type_name(tables, image));
            ty.is_external_video = Handle::from_id(image)
                .and_then(|h| tables.types.get(h))
                .map(|t| t.is_external_video)
                .unwrap_or(false);
            install_type(tables, result_id, ty);
        }
        Op::TypeFunction => {
            install_type(tables, inst.operand(0)?, Type::scalar("function"));
        }
        Op::ConstantTrue => install_constant(tables, inst, ConstantInner::Bool(true))?,
        Op::ConstantFalse => install_constant(tables, inst, ConstantInner::Bool(false))?,
        Op::Constant => {
            let result_type = inst.operand(0)?;
            let value = inst.operand(2)?;
            let inner = match type_name(tables, result_type).as_str() {
                "float" => ConstantInner::Float(f32::from_bits(value) as f64),
                "uint" => ConstantInner::Uint(value as u64),
                _ => ConstantInner::Sint(value as i32 as i64),
            };
            install_constant(tables, inst, inner)?;
        }
        Op::ConstantComposite => {
            let components = inst.operands[2..]
                .iter()
                .filter_map(|&id| Handle::from_id(id))
                .collect();
            install_constant(tables, inst, ConstantInner::Composite(components))?;
        }
        Op::Variable => {
            let result_type = inst.operand(0)?;
            let result_id = inst.operand(1)?;
            let storage_class = raw_storage_class(inst.operand(2)?);
            let handle = Handle::from_id(result_id).unwrap();
            let decoration = tables.decoration(result_id);
            tables.variables.insert(
                handle,
                Variable {
                    id: result_id,
                    ty: Handle::from_id(result_type).unwrap(),
                    storage: storage_class,
                    builtin: decoration.builtin,
                },
            );
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Computes every non-entry function's rendered `ret name(params)` signature
/// ahead of the real walk.
///
/// The GLSL module prologue (§4.4) needs the complete list the first time it
/// runs, which is the first label of the *first* function in the stream —
/// potentially long before later helper functions have had their own
/// `OpFunction` reached by a single top-to-bottom pass. SPIR-V guarantees
/// every annotation, type, constant, and global variable precedes the first
/// function, so a lookahead limited to exactly that information (replayed
/// here against a throwaway table via [`apply_declaration`]) is enough to
/// spell every function's signature without touching body text.
fn prescan_forward_declarations(header: &Header, instructions: &[Instruction]) -> Result<Vec<String>, Error> {
    let mut tables = SymbolTables::with_bound(header.bound);
    let mut declarations = Vec::new();
    let mut current: Option<(u32, u32, Vec<(u32, u32)>)> = None; // (fn id, return type id, [(param id, param type id)])

    for inst in instructions {
        if apply_declaration(&mut tables, inst)? {
            continue;
        }
        match inst.opcode {
            Op::Function => {
                let return_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                current = Some((result_id, return_type, Vec::new()));
            }
            Op::FunctionParameter => {
                let result_type = inst.operand(0)?;
                let result_id = inst.operand(1)?;
                if let Some((_, _, params)) = current.as_mut() {
                    params.push((result_id, result_type));
                }
            }
            Op::FunctionEnd => {
                if let Some((fn_id, return_type, params)) = current.take() {
                    let name = tables.name_of(fn_id);
                    if name != "main" && name != "patch_main" {
                        let return_name = type_name(&tables, return_type);
                        let args: Vec<String> = params
                            .iter()
                            .map(|&(id, ty)| format!("{} {}", type_name(&tables, ty), tables.name_of(id)))
                            .collect();
                        declarations.push(format!("{} {}({})", return_name, name, args.join(", ")));
                    }
                }
            }
            _ => {}
        }
    }

    Ok(declarations)
}

fn install_type(tables: &mut SymbolTables, id: u32, ty: Type) {
    let handle = Handle::from_id(id).unwrap();
    tables.types.insert(handle, ty);
}

fn type_name(tables: &SymbolTables, id: u32) -> String {
    Handle::from_id(id)
        .and_then(|h| tables.types.get(h))
        .map(|t| t.name.clone())
        .unwrap_or_else(|| format!("_{}", id))
}

fn vector_prefix(component: &str) -> &'static str {
    match component {
        "int" => "i",
        "uint" => "u",
        "bool" => "b",
        _ => "",
    }
}

fn install_constant(tables: &mut SymbolTables, inst: &Instruction, inner: ConstantInner) -> Result<(), Error> {
    let result_type = inst.operand(0)?;
    let result_id = inst.operand(1)?;
    let handle = Handle::from_id(result_id).unwrap();
    tables.constants.insert(
        handle,
        Constant {
            ty: Handle::from_id(result_type).unwrap(),
            inner,
        },
    );
    let text = tables.constants.get(handle).unwrap().render(&tables.types, &tables.constants);
    tables.set_reference(result_id, text);
    Ok(())
}

fn raw_storage_class(word: u32) -> StorageClass {
    StorageClass::from_u32(word).unwrap_or(StorageClass::Private)
}

fn decode_decoration(inst: &Instruction, start: usize) -> Result<Decorations, Error> {
    let mut decorations = Decorations::default();
    let kind = inst.operand(start)?;
    let decoration = Decoration::from_u32(kind)
        .ok_or_else(|| Error::MalformedModule(format!("unknown decoration {}", kind)))?;
    match decoration {
        Decoration::BuiltIn => decorations.builtin = true,
        Decoration::Location => decorations.location = Some(inst.operand(start + 1)?),
        Decoration::Binding => decorations.binding = Some(inst.operand(start + 1)?),
        Decoration::DescriptorSet => decorations.descriptor_set = Some(inst.operand(start + 1)?),
        Decoration::Offset => decorations.offset = Some(inst.operand(start + 1)?),
        Decoration::ArrayStride => decorations.array_stride = Some(inst.operand(start + 1)?),
        _ => {}
    }
    Ok(decorations)
}

fn merge_decoration(entry: &mut Decorations, incoming: Decorations) {
    entry.builtin |= incoming.builtin;
    entry.location = incoming.location.or(entry.location);
    entry.binding = incoming.binding.or(entry.binding);
    entry.descriptor_set = incoming.descriptor_set.or(entry.descriptor_set);
    entry.offset = incoming.offset.or(entry.offset);
    entry.array_stride = incoming.array_stride.or(entry.array_stride);
}

fn apply_decoration(tables: &mut SymbolTables, id: u32, inst: &Instruction, start: usize) -> Result<(), Error> {
    let decoration = decode_decoration(inst, start)?;
    let entry = tables.decorations.entry(id).or_default();
    merge_decoration(entry, decoration);
    Ok(())
}
