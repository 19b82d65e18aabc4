//! Fixed-function state encoders.
//!
//! Each `emit_*` function writes one self-contained register group. Every
//! encoder runs twice per build, once against a counting sink and once
//! against the pipeline's backing block, so none of them may branch on
//! anything the two passes do not share.

pub(crate) mod blend;
pub(crate) mod depth;
pub(crate) mod msaa;
pub(crate) mod raster;
pub(crate) mod vertex;
pub(crate) mod viewport;
