//! Pipeline state compiler for the Slate S6.
//!
//! The S6 has no hardware state objects: everything a draw needs arrives
//! as register writes in a command stream. This crate turns a pipeline
//! description ([`PipelineDescriptor`]) plus resolved shader variants
//! ([`ShaderVariant`]) into one immutable, pre-sized [`CommandStream`],
//! partitioned into [`DrawState`] spans the draw-time recorder binds
//! individually:
//!
//! - the stage program blocks, once for rendering and once for the
//!   binning pass,
//! - vertex fetch, rasterizer, depth/stencil and blend state,
//! - one slot per dynamic-capable category, baked when the state is
//!   static and zero-filled for draw-time patching when dynamic,
//! - descriptor-set prefetch commands.
//!
//! Streams are sized by running every encoder against a counting sink,
//! then filled through the same code path; a build that emits a single
//! dword more or less than it planned fails with
//! [`PipelineError::SizingMismatch`] instead of producing a stream that
//! reads past its allocation. Shader compilation stays behind the
//! [`ShaderResolver`] trait: the crate consumes variant metadata and
//! never inspects instructions.
//!
//! Register and packet encodings live in `slate-regs`; nothing here
//! hand-rolls a header.

mod fixed;
mod linkage;
mod prefetch;
mod program;

pub mod builder;
pub mod descriptor;
pub mod dynamic;
pub mod error;
pub mod layout;
pub mod shader;
pub mod stream;

pub use builder::{DeviceInfo, Pipeline, PipelineBuilder, StageConstants};
pub use descriptor::PipelineDescriptor;
pub use dynamic::DynamicState;
pub use error::PipelineError;
pub use layout::PipelineLayout;
pub use shader::{ShaderKey, ShaderResolver, ShaderVariant, Stage, StageFlags, TessPrimitive};
pub use stream::{CommandStream, DrawState};
