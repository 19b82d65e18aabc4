//! Shader variants and the resolver seam.
//!
//! The pipeline compiler does not compile shaders. A [`ShaderResolver`]
//! implementation (the shader front-end and its cache) maps a stage plus a
//! [`ShaderKey`] to an immutable [`ShaderVariant`]: final machine code and
//! the reflection tables the register encoders consume. The builder derives
//! keys, requests variants, and where the shared constant RAM overflows
//! requests reduced ("safe") recompiles.

use std::sync::Arc;

use hashbrown::HashMap;

use slate_regs::enums::StateBlock;
use slate_regs::limits::{INSTR_UNIT_DWORDS, SAFE_CONSTLEN_VEC4, SHARED_CONST_VEC4};
use slate_regs::pkt::CpOpcode;
use slate_regs::REGID_NONE;

use crate::error::PipelineError;

/// Hardware shader stage, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl Stage {
    pub const COUNT: usize = 6;

    /// Graphics stages in the order their program state is emitted.
    pub const GRAPHICS: [Stage; 5] = [
        Stage::Vertex,
        Stage::TessControl,
        Stage::TessEval,
        Stage::Geometry,
        Stage::Fragment,
    ];

    pub const ALL: [Stage; Self::COUNT] = [
        Stage::Vertex,
        Stage::TessControl,
        Stage::TessEval,
        Stage::Geometry,
        Stage::Fragment,
        Stage::Compute,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Texture-descriptor state block for this stage.
    pub(crate) fn tex_block(self) -> StateBlock {
        match self {
            Stage::Vertex => StateBlock::VsTex,
            Stage::TessControl => StateBlock::HsTex,
            Stage::TessEval => StateBlock::DsTex,
            Stage::Geometry => StateBlock::GsTex,
            Stage::Fragment => StateBlock::FsTex,
            Stage::Compute => StateBlock::CsTex,
        }
    }

    /// Shader/constant state block for this stage.
    pub(crate) fn shader_block(self) -> StateBlock {
        match self {
            Stage::Vertex => StateBlock::VsShader,
            Stage::TessControl => StateBlock::HsShader,
            Stage::TessEval => StateBlock::DsShader,
            Stage::Geometry => StateBlock::GsShader,
            Stage::Fragment => StateBlock::FsShader,
            Stage::Compute => StateBlock::CsShader,
        }
    }

    /// `LOAD_STATE` flavour routed to this stage's state machine.
    pub(crate) fn load_op(self) -> CpOpcode {
        match self {
            Stage::Fragment | Stage::Compute => CpOpcode::LoadStateFrag,
            _ => CpOpcode::LoadStateGeom,
        }
    }
}

bitflags::bitflags! {
    /// Stage visibility mask, as descriptor-set bindings declare it.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct StageFlags: u32 {
        const VERTEX = 1 << 0;
        const TESS_CONTROL = 1 << 1;
        const TESS_EVAL = 1 << 2;
        const GEOMETRY = 1 << 3;
        const FRAGMENT = 1 << 4;
        const COMPUTE = 1 << 5;
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::TESS_CONTROL.bits()
            | Self::TESS_EVAL.bits()
            | Self::GEOMETRY.bits()
            | Self::FRAGMENT.bits();
    }
}

impl From<Stage> for StageFlags {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Vertex => StageFlags::VERTEX,
            Stage::TessControl => StageFlags::TESS_CONTROL,
            Stage::TessEval => StageFlags::TESS_EVAL,
            Stage::Geometry => StageFlags::GEOMETRY,
            Stage::Fragment => StageFlags::FRAGMENT,
            Stage::Compute => StageFlags::COMPUTE,
        }
    }
}

/// Inter-stage slot identity. Producer outputs and consumer inputs are
/// matched by slot, never by register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Vertex-fetch attribute, by API location.
    Attribute(u8),
    Position,
    PointSize,
    Layer,
    /// Point sprite coordinate, synthesized by the rasterizer.
    PointCoord,
    PrimitiveId,
    /// Per-vertex stream-out routing flags a geometry stage exports.
    VertexFlags,
    /// Generic varying, by API location.
    Varying(u8),
    /// Fragment depth export.
    Depth,
    SampleMask,
    StencilRef,
    /// Color export, by render-target index.
    Color(u8),
}

/// System values a variant consumes, looked up by the encoders to find the
/// register each one was compiled into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sysval {
    VertexId,
    InstanceId,
    PrimitiveId,
    /// Relative patch id within the draw (tess control + eval).
    PatchId,
    /// Output-vertex invocation id (tess control).
    InvocationId,
    TessCoordX,
    TessCoordY,
    /// Geometry-stage input header.
    GsHeader,
    FragCoord,
    FrontFace,
    SampleId,
    SampleMaskIn,
    BaryPerspPixel,
    BaryPerspCentroid,
    BaryPerspSample,
    /// Point-size/faceness interpolator slot.
    BarySize,
    WorkGroupId,
    LocalInvocationId,
}

/// One entry of a variant's input or output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoSlot {
    pub slot: Slot,
    pub regid: u8,
    pub compmask: u8,
    /// Packed location: varying-cache location for fragment inputs,
    /// memory location for geometry-family outputs.
    pub loc: u8,
    /// Flat-qualified (fragment inputs).
    pub flat: bool,
}

/// One texture fetch the scheduler hoisted ahead of shading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TexPrefetch {
    /// Packed source varying location.
    pub src: u8,
    pub samp_id: u8,
    pub tex_id: u8,
    pub dst_regid: u8,
    pub write_mask: u8,
    /// Fetch opcode.
    pub cmd: u8,
}

/// One captured output range: `num_components` components starting at
/// `start_component` of output table entry `output`, stored to `buffer`
/// at `dword_offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoCapture {
    pub output: u8,
    pub start_component: u8,
    pub num_components: u8,
    pub buffer: u8,
    pub dword_offset: u32,
}

/// Transform-feedback captures declared by the last geometry stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamOut {
    pub captures: Vec<SoCapture>,
}

impl StreamOut {
    pub fn is_empty(&self) -> bool {
        self.captures.is_empty()
    }
}

/// Offsets (vec4 units) of the driver-managed windows inside a variant's
/// constant file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConstOffsets {
    pub immediate: u32,
    pub primitive_param: u32,
    pub primitive_map: u32,
}

/// Fragment-stage reflection consumed by the FS input/output encoders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FragmentMeta {
    /// Pixel-coordinate components actually read (xyzw mask).
    pub coord_compmask: u8,
    /// An input is sample-qualified, forcing per-sample shading.
    pub per_sample: bool,
    /// The single color output is broadcast to every render target.
    pub color0_broadcast: bool,
    pub writes_depth: bool,
    pub writes_sample_mask: bool,
    pub writes_stencil_ref: bool,
    /// Side effects or late exports forbid the early-Z path.
    pub no_early_z: bool,
    pub has_kill: bool,
    pub prefetch: Vec<TexPrefetch>,
}

/// Output primitive a geometry stage declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GsOutput {
    Points,
    LineStrip,
    TriangleStrip,
}

/// Geometry-stage declarations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryMeta {
    pub vertices_out: u32,
    pub vertices_in: u32,
    pub invocations: u32,
    pub output: GsOutput,
}

/// Tessellation domain a control or evaluation stage declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TessPrimitive {
    Isolines,
    Triangles,
    Quads,
}

/// Tessellation declarations of a control or evaluation stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TessDomain {
    pub primitive: TessPrimitive,
    /// `None` when the stage leaves spacing to the other tess stage.
    pub spacing: Option<slate_regs::enums::TessSpacing>,
    pub point_mode: bool,
    pub ccw: bool,
    /// Control stage: vertices per output patch.
    pub vertices_out: u32,
}

/// One compiled shader: final machine code plus the reflection tables the
/// register encoders read. Produced by a [`ShaderResolver`]; immutable
/// afterwards.
#[derive(Debug, Clone)]
pub struct ShaderVariant {
    pub stage: Stage,
    /// Machine code. Length must be a whole number of 128-byte fetch units.
    pub code: Vec<u32>,
    /// Constant-file window, vec4 units.
    pub constlen: u32,
    /// Full-width GPR footprint, registers.
    pub full_regs: u32,
    /// Half-width GPR footprint, registers.
    pub half_regs: u32,
    pub branch_stack: u32,
    pub merged_regs: bool,
    pub pix_lod: bool,
    pub fine_derivatives: bool,
    /// Varying inputs; system values live in `sysvals`.
    pub inputs: Vec<IoSlot>,
    pub outputs: Vec<IoSlot>,
    pub sysvals: HashMap<Sysval, u8>,
    /// Scalar varying components consumed (fragment stage).
    pub total_in: u32,
    /// Per-vertex output footprint in memory, vec4 units (geometry family).
    pub output_size: u32,
    pub const_offsets: ConstOffsets,
    /// Immediate pool, dwords.
    pub immediates: Vec<u32>,
    /// `BINDLESS_*` resource-usage bits per `slate_regs::regs`.
    pub bindless: u8,
    pub tex_count: u32,
    pub samp_count: u32,
    /// Descriptor sets the stage actually references, as a bitmask.
    pub active_sets: u32,
    pub stream_out: StreamOut,
    pub fragment: FragmentMeta,
    pub geometry: Option<GeometryMeta>,
    pub tess: Option<TessDomain>,
    /// Compute workgroup size.
    pub local_size: [u16; 3],
}

impl ShaderVariant {
    /// A variant that exists but does nothing. Stands in for the fragment
    /// stage when rasterization state must be written with no fragment
    /// work (binning programs).
    pub fn empty(stage: Stage) -> Self {
        ShaderVariant {
            stage,
            code: Vec::new(),
            constlen: 0,
            full_regs: 0,
            half_regs: 0,
            branch_stack: 0,
            merged_regs: false,
            pix_lod: false,
            fine_derivatives: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            sysvals: HashMap::new(),
            total_in: 0,
            output_size: 0,
            const_offsets: ConstOffsets::default(),
            immediates: Vec::new(),
            bindless: 0,
            tex_count: 0,
            samp_count: 0,
            active_sets: 0,
            stream_out: StreamOut::default(),
            fragment: FragmentMeta::default(),
            geometry: None,
            tess: None,
            local_size: [0; 3],
        }
    }

    /// Instruction length in 128-byte fetch units.
    pub fn instr_units(&self) -> u32 {
        debug_assert_eq!(self.code.len() % INSTR_UNIT_DWORDS as usize, 0);
        (self.code.len() / INSTR_UNIT_DWORDS as usize) as u32
    }

    pub fn find_output(&self, slot: Slot) -> Option<&IoSlot> {
        self.outputs.iter().find(|o| o.slot == slot)
    }

    /// Register holding `slot`, `REGID_NONE` when the stage never writes
    /// it.
    pub fn output_regid(&self, slot: Slot) -> u8 {
        self.find_output(slot).map_or(REGID_NONE, |o| o.regid)
    }

    /// Register a system value was compiled into, `REGID_NONE` when the
    /// stage never reads it.
    pub fn sysval_regid(&self, sysval: Sysval) -> u8 {
        self.sysvals.get(&sysval).copied().unwrap_or(REGID_NONE)
    }
}

/// Compile key: everything outside the shader source that shapes a
/// variant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ShaderKey {
    pub has_geometry: bool,
    pub msaa: bool,
    pub sample_shading: bool,
    pub tess: Option<TessPrimitive>,
    /// No stage writes the layer output, so reads of it fold to zero.
    pub layer_zero: bool,
    /// Cap the constant window at the safe per-stage size.
    pub safe_constlen: bool,
}

/// Shader front-end seam. Implementations own compilation and caching;
/// the builder only requests variants by key. Resolution must be
/// deterministic: the same stage and key always yield the same variant.
pub trait ShaderResolver {
    /// Pre-compile reflection: the tessellation domain a stage declares,
    /// if any. Consulted before any variant is resolved so the key carries
    /// the domain to every stage.
    fn tess_primitive(&self, stage: Stage) -> Option<TessPrimitive> {
        let _ = stage;
        None
    }

    /// Pre-compile reflection: whether the stage writes the layer output.
    fn writes_layer(&self, stage: Stage) -> bool {
        let _ = stage;
        false
    }

    /// Resolve the variant for `stage` under `key`.
    fn resolve(&self, stage: Stage, key: &ShaderKey) -> Result<Arc<ShaderVariant>, PipelineError>;

    /// Resolve the position-only variant the binning pass runs in place of
    /// the full vertex shader.
    fn resolve_binning(&self, key: &ShaderKey) -> Result<Arc<ShaderVariant>, PipelineError>;
}

/// Shrink per-stage constant windows until the geometry family fits the
/// shared constant RAM, largest window first. Returns the mask of stage
/// indices that must be re-resolved with [`ShaderKey::safe_constlen`];
/// `constlens` is updated to the post-trim sizes.
pub(crate) fn trim_constlen(constlens: &mut [u32; Stage::COUNT]) -> u32 {
    let family = Stage::Vertex.index()..=Stage::Geometry.index();
    let mut total: u32 = constlens[family.clone()].iter().sum();
    let mut trimmed = 0u32;
    while total > SHARED_CONST_VEC4 {
        let mut stage = Stage::Vertex.index();
        let mut len = 0;
        for (i, &l) in constlens[family.clone()].iter().enumerate() {
            if l > len {
                stage = i;
                len = l;
            }
        }
        // A stage at or under the safe cap cannot be shrunk further; the
        // budget covers COUNT stages at the cap, so this never fires.
        debug_assert!(len > SAFE_CONSTLEN_VEC4);
        if len <= SAFE_CONSTLEN_VEC4 {
            break;
        }
        trimmed |= 1 << stage;
        total -= len - SAFE_CONSTLEN_VEC4;
        constlens[stage] = SAFE_CONSTLEN_VEC4;
    }
    trimmed
}
