//! Hardware limits of the S6 generation.
//!
//! These are properties of the silicon, not driver policy; sizing math and
//! precondition checks throughout the stack key off them.

/// Number of bindable descriptor sets. Bindless base registers 0..3 map the
/// sets; base [`DYNAMIC_SET_BASE`] is reserved for the dynamic-offset
/// descriptor block the driver assembles at bind time.
pub const MAX_SETS: u32 = 4;

/// Bindless base index used for dynamic-offset descriptors.
pub const DYNAMIC_SET_BASE: u32 = MAX_SETS;

/// Size of one texture/sampler/resource descriptor in dwords.
pub const TEX_CONST_DWORDS: u32 = 16;

/// Dword cost of one descriptor-prefetch packet: header, control word and a
/// 64-bit source address. Constant by design; prefetch sizing multiplies a
/// packet count by this.
pub const PREFETCH_PACKET_DWORDS: u32 = 4;

/// Widest value of the prefetch control word's unit-count field.
pub const PREFETCH_NUM_UNIT_MAX: u32 = 1023;

/// Maximum entries in the inter-stage varying map (pairs of 16-bit output
/// descriptors across the eight `SP_*_OUT` registers).
pub const MAX_LINKED_VARYINGS: usize = 32;

/// Component-location capacity of the varying cache (32 vec4 slots).
pub const MAX_VARYING_COMPONENTS: usize = 128;

pub const MAX_RENDER_TARGETS: usize = 8;
pub const MAX_VERTEX_BINDINGS: usize = 32;
pub const MAX_VERTEX_ATTRIBS: usize = 32;

/// Stream-out: buffer slots and program-table entries.
pub const MAX_STREAMOUT_BUFFERS: usize = 4;

/// Scissor and viewport-scissor coordinates are 15-bit.
pub const SCISSOR_COORD_MAX: u32 = 0x7fff;

/// The guardband adjustment fields are 9-bit log2 values.
pub const GUARDBAND_ADJ_MAX: u32 = 0x1ff;

/// Rasterizer window coordinates are signed 16.8 fixed point.
pub const RASTER_COORD_RANGE: f32 = 32768.0;

/// Instruction fetch granularity in bytes; shader object-start addresses
/// and instruction lengths are in units of this.
pub const INSTR_UNIT_BYTES: u32 = 128;
pub const INSTR_UNIT_DWORDS: u32 = INSTR_UNIT_BYTES / 4;

/// Shared constant RAM available to the geometry-family stages, in vec4
/// units, and the per-stage cap a reduced ("safe") variant must fit in.
pub const SHARED_CONST_VEC4: u32 = 512;
pub const SAFE_CONSTLEN_VEC4: u32 = 128;

/// Patch primitive types encode the control-point count; 32 is the widest.
pub const MAX_PATCH_CONTROL_POINTS: u32 = 32;

/// Wavefront width, used for tessellation local-memory sizing on S650.
pub const WAVE_SIZE: u32 = 64;
