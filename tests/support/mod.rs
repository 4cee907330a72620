//! Hand-assembled SPIR-V modules for the end-to-end tests.
//!
//! There is no SPIR-V assembler in the dependency graph, so every module
//! here is built word-by-word with the same layout the decoder's own unit
//! tests use: a length/opcode header word followed by its operands,
//! little-endian throughout.

use spirv::{Op, StorageClass};

const MAGIC: u32 = 0x0723_0203;

pub struct Builder {
    words: Vec<u32>,
    next_id: u32,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            words: Vec::new(),
            next_id: 1,
        }
    }

    pub fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn op(&mut self, opcode: Op, operands: &[u32]) {
        let length = operands.len() as u32 + 1;
        self.words.push((length << 16) | opcode as u32);
        self.words.extend_from_slice(operands);
    }

    pub fn name(&mut self, id: u32, text: &str) {
        let mut operands = vec![id];
        operands.extend(pack_string(text));
        self.op(Op::Name, &operands);
    }

    pub fn finish(self) -> Vec<u8> {
        let mut words = vec![MAGIC, 0x0001_0500, 0, self.next_id, 0];
        words.extend(self.words);
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }
}

fn pack_string(s: &str) -> Vec<u32> {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    while bytes.len() % 4 != 0 {
        bytes.push(0);
    }
    bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// A vertex shader computing `gl_Position` from a uniform MVP matrix and
/// writing a constant texture coordinate, the way a passthrough vertex
/// stage would.
pub fn vertex_passthrough() -> Vec<u8> {
    let mut b = Builder::new();

    let pos = b.id();
    let uv = b.id();
    let mvp = b.id();
    let gl_position = b.id();
    let main_fn = b.id();

    b.name(pos, "pos");
    b.name(uv, "uv");
    b.name(mvp, "mvp");
    b.name(gl_position, "gl_Position");
    b.name(main_fn, "main");

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let float_ty = b.id();
    b.op(Op::TypeFloat, &[float_ty, 32]);
    let v2float = b.id();
    b.op(Op::TypeVector, &[v2float, float_ty, 2]);
    let v3float = b.id();
    b.op(Op::TypeVector, &[v3float, float_ty, 3]);
    let v4float = b.id();
    b.op(Op::TypeVector, &[v4float, float_ty, 4]);
    let mat4 = b.id();
    b.op(Op::TypeMatrix, &[mat4, v4float, 4]);

    let ptr_in_v3 = b.id();
    b.op(Op::TypePointer, &[ptr_in_v3, StorageClass::Input as u32, v3float]);
    b.op(Op::Variable, &[ptr_in_v3, pos, StorageClass::Input as u32]);

    let ptr_out_v2 = b.id();
    b.op(Op::TypePointer, &[ptr_out_v2, StorageClass::Output as u32, v2float]);
    b.op(Op::Variable, &[ptr_out_v2, uv, StorageClass::Output as u32]);

    let ptr_uc_mat4 = b.id();
    b.op(
        Op::TypePointer,
        &[ptr_uc_mat4, StorageClass::UniformConstant as u32, mat4],
    );
    b.op(Op::Variable, &[ptr_uc_mat4, mvp, StorageClass::UniformConstant as u32]);

    let ptr_out_v4 = b.id();
    b.op(Op::TypePointer, &[ptr_out_v4, StorageClass::Output as u32, v4float]);
    b.op(Op::Variable, &[ptr_out_v4, gl_position, StorageClass::Output as u32]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);

    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);

    let load_pos = b.id();
    b.op(Op::Load, &[v3float, load_pos, pos]);
    let one_const = b.id();
    b.op(Op::Constant, &[float_ty, one_const, 1.0f32.to_bits()]);
    let composite = b.id();
    b.op(Op::CompositeConstruct, &[v4float, composite, load_pos, one_const]);
    let load_mvp = b.id();
    b.op(Op::Load, &[mat4, load_mvp, mvp]);
    let mul = b.id();
    b.op(Op::MatrixTimesVector, &[v4float, mul, load_mvp, composite]);
    b.op(Op::Store, &[gl_position, mul]);

    let zero_const = b.id();
    b.op(Op::Constant, &[float_ty, zero_const, 0.0f32.to_bits()]);
    let uvval = b.id();
    b.op(Op::CompositeConstruct, &[v2float, uvval, zero_const, zero_const]);
    b.op(Op::Store, &[uv, uvval]);

    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}

/// A vertex shader that normalizes an input direction vector through the
/// `GLSL.std.450` extended instruction set, exercising `OpExtInst` rendering.
pub fn vertex_with_normalize_ext_inst() -> Vec<u8> {
    let mut b = Builder::new();

    let dir = b.id();
    let out_dir = b.id();
    let main_fn = b.id();
    b.name(dir, "dir");
    b.name(out_dir, "outDir");
    b.name(main_fn, "main");

    let ext_set = b.id();
    let mut ext_operands = vec![ext_set];
    ext_operands.extend(pack_string("GLSL.std.450"));
    b.op(Op::ExtInstImport, &ext_operands);

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let float_ty = b.id();
    b.op(Op::TypeFloat, &[float_ty, 32]);
    let v3float = b.id();
    b.op(Op::TypeVector, &[v3float, float_ty, 3]);

    let ptr_in_v3 = b.id();
    b.op(Op::TypePointer, &[ptr_in_v3, StorageClass::Input as u32, v3float]);
    b.op(Op::Variable, &[ptr_in_v3, dir, StorageClass::Input as u32]);

    let ptr_out_v3 = b.id();
    b.op(Op::TypePointer, &[ptr_out_v3, StorageClass::Output as u32, v3float]);
    b.op(Op::Variable, &[ptr_out_v3, out_dir, StorageClass::Output as u32]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);
    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);

    let load_dir = b.id();
    b.op(Op::Load, &[v3float, load_dir, dir]);
    let normalized = b.id();
    // GLSL.std.450 opcode 69 is `Normalize`.
    b.op(Op::ExtInst, &[v3float, normalized, ext_set, 69, load_dir]);
    b.op(Op::Store, &[out_dir, normalized]);

    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}

/// A vertex shader whose body includes `OpNot`, an opcode outside this
/// crate's supported subset, exercising the unsupported-opcode resilience
/// (non-strict) and hard-error (strict) paths.
pub fn vertex_with_unsupported_opcode() -> Vec<u8> {
    let mut b = Builder::new();

    let counter = b.id();
    let out_counter = b.id();
    let main_fn = b.id();
    b.name(counter, "counter");
    b.name(out_counter, "outCounter");
    b.name(main_fn, "main");

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let uint_ty = b.id();
    b.op(Op::TypeInt, &[uint_ty, 32, 0]);

    let ptr_in_uint = b.id();
    b.op(Op::TypePointer, &[ptr_in_uint, StorageClass::Input as u32, uint_ty]);
    b.op(Op::Variable, &[ptr_in_uint, counter, StorageClass::Input as u32]);

    let ptr_out_uint = b.id();
    b.op(Op::TypePointer, &[ptr_out_uint, StorageClass::Output as u32, uint_ty]);
    b.op(Op::Variable, &[ptr_out_uint, out_counter, StorageClass::Output as u32]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);
    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);

    let load = b.id();
    b.op(Op::Load, &[uint_ty, load, counter]);
    let inverted = b.id();
    b.op(Op::Not, &[uint_ty, inverted, load]);
    b.op(Op::Store, &[out_counter, inverted]);

    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}

/// A fragment shader sampling an external (camera/video) image on Android.
pub fn fragment_external_sampler() -> Vec<u8> {
    let mut b = Builder::new();

    let sampler_var = b.id();
    let main_fn = b.id();
    b.name(sampler_var, "s");
    b.name(main_fn, "main");

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let float_ty = b.id();
    b.op(Op::TypeFloat, &[float_ty, 32]);

    let img_ty = b.id();
    // ResultId, SampledType, Dim, Depth, Arrayed, MS, Sampled, ImageFormat,
    // AccessQualifier. krafix overloads the access qualifier to flag an
    // external (camera/video) image.
    b.op(Op::TypeImage, &[img_ty, float_ty, 1, 0, 0, 0, 1, 0, 1]);
    let sampled_img_ty = b.id();
    b.op(Op::TypeSampledImage, &[sampled_img_ty, img_ty]);

    let ptr_uc = b.id();
    b.op(
        Op::TypePointer,
        &[ptr_uc, StorageClass::UniformConstant as u32, sampled_img_ty],
    );
    b.op(Op::Variable, &[ptr_uc, sampler_var, StorageClass::UniformConstant as u32]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);
    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);
    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}

/// A minimal vertex interface: one input, one output, one uniform matrix,
/// with no builtins — the var-list manifest should list exactly these
/// three variables.
pub fn varlist_vertex_interface() -> Vec<u8> {
    let mut b = Builder::new();

    let pos = b.id();
    let uv = b.id();
    let mvp = b.id();
    let main_fn = b.id();
    b.name(pos, "pos");
    b.name(uv, "uv");
    b.name(mvp, "mvp");
    b.name(main_fn, "main");

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let float_ty = b.id();
    b.op(Op::TypeFloat, &[float_ty, 32]);
    let v2float = b.id();
    b.op(Op::TypeVector, &[v2float, float_ty, 2]);
    let v3float = b.id();
    b.op(Op::TypeVector, &[v3float, float_ty, 3]);
    let v4float = b.id();
    b.op(Op::TypeVector, &[v4float, float_ty, 4]);
    let mat4 = b.id();
    b.op(Op::TypeMatrix, &[mat4, v4float, 4]);

    let ptr_in_v3 = b.id();
    b.op(Op::TypePointer, &[ptr_in_v3, StorageClass::Input as u32, v3float]);
    b.op(Op::Variable, &[ptr_in_v3, pos, StorageClass::Input as u32]);

    let ptr_out_v2 = b.id();
    b.op(Op::TypePointer, &[ptr_out_v2, StorageClass::Output as u32, v2float]);
    b.op(Op::Variable, &[ptr_out_v2, uv, StorageClass::Output as u32]);

    let ptr_uc_mat4 = b.id();
    b.op(
        Op::TypePointer,
        &[ptr_uc_mat4, StorageClass::UniformConstant as u32, mat4],
    );
    b.op(Op::Variable, &[ptr_uc_mat4, mvp, StorageClass::UniformConstant as u32]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);
    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);
    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}

/// A fragment stage with a single plain `sampler2D` uniform, for the
/// diagnostic var-list dump.
pub fn varlist_fragment_sampler() -> Vec<u8> {
    let mut b = Builder::new();

    let tex = b.id();
    let main_fn = b.id();
    b.name(tex, "tex");
    b.name(main_fn, "main");

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let float_ty = b.id();
    b.op(Op::TypeFloat, &[float_ty, 32]);
    let img_ty = b.id();
    b.op(Op::TypeImage, &[img_ty, float_ty, 1, 0, 0, 0, 1, 0]);
    let sampled_img_ty = b.id();
    b.op(Op::TypeSampledImage, &[sampled_img_ty, img_ty]);

    let ptr_uc = b.id();
    b.op(
        Op::TypePointer,
        &[ptr_uc, StorageClass::UniformConstant as u32, sampled_img_ty],
    );
    b.op(Op::Variable, &[ptr_uc, tex, StorageClass::UniformConstant as u32]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);
    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);
    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}

/// A tessellation-control shader: `patch_main` sets `gl_TessLevelOuter[0]`
/// and `main` calls a helper function, exercising both the `patch_main`
/// splice and the non-entry-function forward declaration.
pub fn tess_control_with_patch_main() -> Vec<u8> {
    let mut b = Builder::new();

    let foo_fn = b.id();
    let patch_main_fn = b.id();
    let main_fn = b.id();
    let gl_tess_level_outer = b.id();
    b.name(foo_fn, "foo");
    b.name(patch_main_fn, "patch_main");
    b.name(main_fn, "main");
    b.name(gl_tess_level_outer, "gl_TessLevelOuter");

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let float_ty = b.id();
    b.op(Op::TypeFloat, &[float_ty, 32]);
    let uint_ty = b.id();
    b.op(Op::TypeInt, &[uint_ty, 32, 0]);

    let array_len = b.id();
    b.op(Op::Constant, &[uint_ty, array_len, 4]);
    let arr_float_ty = b.id();
    b.op(Op::TypeArray, &[arr_float_ty, float_ty, array_len]);
    let ptr_out_arr = b.id();
    b.op(Op::TypePointer, &[ptr_out_arr, StorageClass::Output as u32, arr_float_ty]);
    b.op(
        Op::Variable,
        &[ptr_out_arr, gl_tess_level_outer, StorageClass::Output as u32],
    );
    let ptr_out_float = b.id();
    b.op(Op::TypePointer, &[ptr_out_float, StorageClass::Output as u32, float_ty]);

    let zero_idx = b.id();
    b.op(Op::Constant, &[uint_ty, zero_idx, 0]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);

    b.op(Op::Function, &[void_ty, foo_fn, 0, fn_void_ty]);
    let foo_label = b.id();
    b.op(Op::Label, &[foo_label]);
    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.op(Op::Function, &[void_ty, patch_main_fn, 0, fn_void_ty]);
    let patch_label = b.id();
    b.op(Op::Label, &[patch_label]);
    let elem_ptr = b.id();
    b.op(
        Op::AccessChain,
        &[ptr_out_float, elem_ptr, gl_tess_level_outer, zero_idx],
    );
    let one_const = b.id();
    b.op(Op::Constant, &[float_ty, one_const, 1.0f32.to_bits()]);
    b.op(Op::Store, &[elem_ptr, one_const]);
    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);
    let call_result = b.id();
    b.op(Op::FunctionCall, &[void_ty, call_result, foo_fn]);
    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}

/// Two helper functions, `scale` and `bias`, both called from `main`. `bias`
/// is declared *after* `main` in the instruction stream — its `OpFunction`
/// hasn't been reached yet at the point `main`'s own first label fires the
/// module prologue — so this exercises the lookahead that finds every
/// non-entry function's forward declaration regardless of where in the
/// stream it is actually defined.
pub fn vertex_with_forward_referenced_helper() -> Vec<u8> {
    let mut b = Builder::new();

    let scale_fn = b.id();
    let main_fn = b.id();
    let bias_fn = b.id();
    b.name(scale_fn, "scale");
    b.name(main_fn, "main");
    b.name(bias_fn, "bias");

    let void_ty = b.id();
    b.op(Op::TypeVoid, &[void_ty]);
    let float_ty = b.id();
    b.op(Op::TypeFloat, &[float_ty, 32]);

    let fn_void_ty = b.id();
    b.op(Op::TypeFunction, &[fn_void_ty, void_ty]);
    let fn_float_float_ty = b.id();
    b.op(Op::TypeFunction, &[fn_float_float_ty, float_ty, float_ty]);

    b.op(Op::Function, &[float_ty, scale_fn, 0, fn_float_float_ty]);
    let scale_param = b.id();
    b.op(Op::FunctionParameter, &[float_ty, scale_param]);
    let scale_label = b.id();
    b.op(Op::Label, &[scale_label]);
    b.op(Op::ReturnValue, &[scale_param]);
    b.op(Op::FunctionEnd, &[]);

    b.op(Op::Function, &[void_ty, main_fn, 0, fn_void_ty]);
    let main_label = b.id();
    b.op(Op::Label, &[main_label]);
    let one_const = b.id();
    b.op(Op::Constant, &[float_ty, one_const, 1.0f32.to_bits()]);
    let scale_call = b.id();
    b.op(Op::FunctionCall, &[float_ty, scale_call, scale_fn, one_const]);
    let bias_call = b.id();
    b.op(Op::FunctionCall, &[float_ty, bias_call, bias_fn, one_const]);
    b.op(Op::Return, &[]);
    b.op(Op::FunctionEnd, &[]);

    b.op(Op::Function, &[float_ty, bias_fn, 0, fn_float_float_ty]);
    let bias_param = b.id();
    b.op(Op::FunctionParameter, &[float_ty, bias_param]);
    let bias_label = b.id();
    b.op(Op::Label, &[bias_label]);
    b.op(Op::ReturnValue, &[bias_param]);
    b.op(Op::FunctionEnd, &[]);

    b.finish()
}
