//! Target configuration consumed from the caller: which dialect to
//! emit, which platform conventions to honor, and the stage the shader
//! fills. The stage enumeration itself is supplied externally — the
//! translator never infers it from the module.

/// Stage of the programmable pipeline a shader fills.
///
/// Supplied externally as an input constant of the translation;
/// the decoder/translator never infers this from the SPIR-V stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    Fragment,
    Geometry,
    TessControl,
    TessEvaluation,
    Compute,
}

impl Stage {
    /// Lower-case identifier used by the var-list file header.
    pub fn manifest_name(self) -> &'static str {
        match self {
            Stage::Vertex => "vertex",
            Stage::Fragment => "fragment",
            Stage::Geometry => "geometry",
            Stage::TessControl => "tesscontrol",
            Stage::TessEvaluation => "tessevaluation",
            Stage::Compute => "compute",
        }
    }
}

/// The operating system/platform family a translation targets.
///
/// Only `Android` changes translator behavior today (it unlocks the
/// external-image sampler substitution and its matching `#extension`); the
/// rest of the enumeration exists so callers have a stable place to put
/// other platform-specific hooks as they accrue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum System {
    Windows,
    Linux,
    MacOs,
    Ios,
    Android,
    Html5,
}

/// High level shading language family to emit.
///
/// Everything beyond `Glsl` and `VarList` is out of scope for this crate's
/// emitters: the variant exists so a `Target` is future-proof, and so
/// call sites can match exhaustively against "the dialects this crate
/// actually implements" without the enum itself growing unused branches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Glsl,
    Metal,
    Hlsl,
    Agal,
    JavaScript,
    VarList,
}

/// Full target configuration for one translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Target {
    pub system: System,
    pub language: Language,
    /// Chosen GLSL version; gates `in`/`out` vs. `attribute`/`varying` at
    /// the 300 boundary, and compute-shader/fragment-output handling.
    pub version: u32,
    /// Emits `precision mediump float;` and selects `attribute`/`varying`
    /// independent of `version` where the ES and desktop numbering diverge.
    pub es: bool,
    /// Whether this translation runs under the Kore runtime conventions
    /// (reserved for the krafix-derived ecosystem; does not currently
    /// change emitted text, but is threaded through so a caller's
    /// downstream tooling can branch on it without extending `Target`).
    pub kore: bool,
}

impl Target {
    pub fn is_android(&self) -> bool {
        self.system == System::Android
    }
}
