use std::io;

use spirv::Op;

/// Everything that can go wrong while decoding or translating a module.
///
/// All variants are fatal to the current translation (see the crate-level
/// docs): there is no retry path, and a translator that has produced an
/// `Error` should be discarded rather than reused.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The byte stream did not decode to a well-formed instruction sequence:
    /// bad magic number, a truncated instruction, or a declared word count
    /// that runs past the end of the buffer.
    #[error("malformed SPIR-V module: {0}")]
    MalformedModule(String),

    /// An opcode outside the supported subset reached the walker.
    ///
    /// In non-strict mode (the default) the translator does not construct
    /// this variant itself; it instead logs a warning and emits a comment
    /// marker so translation can continue. It is only returned when the
    /// translator has been put into strict mode.
    #[error("unsupported opcode: {0:?}")]
    UnsupportedOpcode(Op),

    /// An operand referenced an id that has no entry in the relevant symbol
    /// table at the point of reference.
    #[error("missing symbol for id %{0}")]
    MissingSymbol(u32),

    /// Writing the rendered output to its sink failed.
    #[error("output sink failure: {0}")]
    IoFailure(#[from] io::Error),
}
