//! Build-time error taxonomy.
//!
//! Recoverable conditions (allocation failure, resolver refusals) are kept
//! apart from caller contract violations (unknown dynamic-state values,
//! oversized patches) and from internal sizing defects, which the stream
//! writers additionally guard with debug asserts.

use slate_regs::limits;
use thiserror::Error;

use crate::shader::Stage;

/// Everything a pipeline build can report.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Backing-store reservation failed.
    #[error("out of memory reserving {what}")]
    OutOfMemory { what: &'static str },

    /// The descriptor names a dynamic-state category this hardware
    /// generation does not know.
    #[error("unknown dynamic state value {raw:#x}")]
    UnsupportedDynamicState { raw: u32 },

    /// More patch control points than the hull stage can be fed.
    #[error("{points} patch control points (hardware limit {max})", max = limits::MAX_PATCH_CONTROL_POINTS)]
    UnsupportedPatchSize { points: u32 },

    /// The linked varying map overflowed the varying cache.
    #[error("varying map needs {used} entries (hardware limit {max})", max = limits::MAX_LINKED_VARYINGS)]
    TooManyVaryings { used: u32 },

    /// The shader resolver refused a stage/key combination.
    #[error("shader resolver rejected {stage:?} variant: {reason}")]
    ShaderRejected { stage: Stage, reason: String },

    /// A sub-stream emitted a different number of dwords than the sizing
    /// pass planned for it. Always an encoder bug.
    #[error("sub-stream {substream}: planned {expected} dwords, emitted {got}")]
    SizingMismatch {
        substream: &'static str,
        expected: u32,
        got: u32,
    },
}
