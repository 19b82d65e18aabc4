//! Graphics- and compute-pipeline description model.
//!
//! Mirrors the create-info the API hands the driver. Enums whose hardware
//! encoding matches the API ordering use their `slate_regs` counterparts
//! directly; the rest (topology, logic ops, attachment formats) carry
//! translation helpers here.

use slate_regs::enums::{
    BlendFactor, BlendOp, CompareFunc, PolygonMode, PrimType, RopCode, StencilOp, VfFormat,
};

use crate::shader::StageFlags;

/// One vertex-buffer binding slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexBinding {
    pub binding: u32,
    /// Element stride, bytes.
    pub stride: u32,
    pub per_instance: bool,
}

/// One fetched attribute.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexAttribute {
    pub location: u32,
    pub binding: u32,
    pub format: VfFormat,
    /// Byte offset within the element.
    pub offset: u32,
}

/// Instance-rate divisor override for one binding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexBindingDivisor {
    pub binding: u32,
    pub divisor: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexInputState {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
    pub divisors: Vec<VertexBindingDivisor>,
}

/// API primitive topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
    TriangleFan,
    LineListAdjacency,
    LineStripAdjacency,
    TriangleListAdjacency,
    TriangleStripAdjacency,
    PatchList,
}

impl Topology {
    /// Primitive-assembler encoding. Patch lists encode their
    /// control-point count above the base; the builder adds it.
    pub(crate) fn prim_type(self) -> u32 {
        match self {
            Topology::PointList => PrimType::Points as u32,
            Topology::LineList => PrimType::Lines as u32,
            Topology::LineStrip => PrimType::LineStrip as u32,
            Topology::TriangleList => PrimType::Triangles as u32,
            Topology::TriangleStrip => PrimType::TriStrip as u32,
            Topology::TriangleFan => PrimType::TriFan as u32,
            Topology::LineListAdjacency => PrimType::LinesAdj as u32,
            Topology::LineStripAdjacency => PrimType::LineStripAdj as u32,
            Topology::TriangleListAdjacency => PrimType::TrianglesAdj as u32,
            Topology::TriangleStripAdjacency => PrimType::TriStripAdj as u32,
            Topology::PatchList => PrimType::PATCHES_BASE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputAssemblyState {
    pub topology: Topology,
    pub primitive_restart: bool,
}

impl Default for InputAssemblyState {
    fn default() -> Self {
        InputAssemblyState {
            topology: Topology::TriangleList,
            primitive_restart: false,
        }
    }
}

/// Tessellation-domain origin; lower-left flips the evaluated winding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainOrigin {
    UpperLeft,
    LowerLeft,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TessellationState {
    pub patch_control_points: u32,
    pub origin: DomainOrigin,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportState {
    pub viewport: Viewport,
    pub scissor: Rect2D,
}

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct CullMode: u32 {
        const FRONT = 1 << 0;
        const BACK = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Polygon-offset parameters; present only when depth bias is enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthBias {
    pub constant: f32,
    pub clamp: f32,
    pub slope: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterizationState {
    pub depth_clamp: bool,
    /// Discard all primitives before rasterization; the pipeline then
    /// carries no viewport, multisample or blend state.
    pub discard: bool,
    pub polygon_mode: PolygonMode,
    pub cull: CullMode,
    pub front_face: FrontFace,
    pub depth_bias: Option<DepthBias>,
    pub line_width: f32,
    /// Explicit near/far clip override; `None` follows depth clamp.
    pub depth_clip: Option<bool>,
}

impl Default for RasterizationState {
    fn default() -> Self {
        RasterizationState {
            depth_clamp: false,
            discard: false,
            polygon_mode: PolygonMode::Fill,
            cull: CullMode::empty(),
            front_face: FrontFace::CounterClockwise,
            depth_bias: None,
            line_width: 1.0,
            depth_clip: None,
        }
    }
}

/// One programmable sample position, both coordinates in [0, 1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleLocation {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultisampleState {
    pub samples: u32,
    pub sample_shading: bool,
    /// Static coverage mask; `None` covers all samples.
    pub sample_mask: Option<u32>,
    pub alpha_to_coverage: bool,
    pub alpha_to_one: bool,
    /// Programmable sample positions; `None` uses the standard grid.
    pub sample_locations: Option<Vec<SampleLocation>>,
}

impl Default for MultisampleState {
    fn default() -> Self {
        MultisampleState {
            samples: 1,
            sample_shading: false,
            sample_mask: None,
            alpha_to_coverage: false,
            alpha_to_one: false,
            sample_locations: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilFaceState {
    pub fail: StencilOp,
    pub pass: StencilOp,
    pub depth_fail: StencilOp,
    pub compare: CompareFunc,
    pub compare_mask: u32,
    pub write_mask: u32,
    pub reference: u32,
}

impl Default for StencilFaceState {
    fn default() -> Self {
        StencilFaceState {
            fail: StencilOp::Keep,
            pass: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            compare: CompareFunc::Never,
            compare_mask: 0,
            write_mask: 0,
            reference: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthBounds {
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthStencilState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub depth_compare: CompareFunc,
    pub depth_bounds: Option<DepthBounds>,
    pub stencil_test: bool,
    pub front: StencilFaceState,
    pub back: StencilFaceState,
}

impl Default for DepthStencilState {
    fn default() -> Self {
        DepthStencilState {
            depth_test: false,
            depth_write: false,
            depth_compare: CompareFunc::Never,
            depth_bounds: None,
            stencil_test: false,
            front: StencilFaceState::default(),
            back: StencilFaceState::default(),
        }
    }
}

/// API logic op, translated to the render backend's GL-ordered ROP codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicOp {
    Clear,
    And,
    AndReverse,
    Copy,
    AndInverted,
    Noop,
    Xor,
    Or,
    Nor,
    Equivalent,
    Invert,
    OrReverse,
    CopyInverted,
    OrInverted,
    Nand,
    Set,
}

impl LogicOp {
    pub(crate) fn rop(self) -> RopCode {
        match self {
            LogicOp::Clear => RopCode::Clear,
            LogicOp::And => RopCode::And,
            LogicOp::AndReverse => RopCode::AndReverse,
            LogicOp::Copy => RopCode::Copy,
            LogicOp::AndInverted => RopCode::AndInverted,
            LogicOp::Noop => RopCode::Noop,
            LogicOp::Xor => RopCode::Xor,
            LogicOp::Or => RopCode::Or,
            LogicOp::Nor => RopCode::Nor,
            LogicOp::Equivalent => RopCode::Equiv,
            LogicOp::Invert => RopCode::Invert,
            LogicOp::OrReverse => RopCode::OrReverse,
            LogicOp::CopyInverted => RopCode::CopyInverted,
            LogicOp::OrInverted => RopCode::OrInverted,
            LogicOp::Nand => RopCode::Nand,
            LogicOp::Set => RopCode::Set,
        }
    }

    /// Ops that source the destination force blend reads even with
    /// blending disabled.
    pub(crate) fn reads_dst(self) -> bool {
        !matches!(
            self,
            LogicOp::Clear | LogicOp::Copy | LogicOp::CopyInverted | LogicOp::Set
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendAttachment {
    pub blend: bool,
    pub src_color: BlendFactor,
    pub dst_color: BlendFactor,
    pub color_op: BlendOp,
    pub src_alpha: BlendFactor,
    pub dst_alpha: BlendFactor,
    pub alpha_op: BlendOp,
    /// RGBA write mask.
    pub write_mask: u8,
}

impl Default for BlendAttachment {
    fn default() -> Self {
        BlendAttachment {
            blend: false,
            src_color: BlendFactor::One,
            dst_color: BlendFactor::Zero,
            color_op: BlendOp::Add,
            src_alpha: BlendFactor::One,
            dst_alpha: BlendFactor::Zero,
            alpha_op: BlendOp::Add,
            write_mask: 0xf,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlendState {
    pub logic_op: Option<LogicOp>,
    /// One entry per color attachment slot.
    pub attachments: Vec<BlendAttachment>,
    pub constants: [f32; 4],
}

/// Color formats the render backend can resolve blending against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorFormat {
    R8Unorm,
    Rg8Unorm,
    Rgba8Unorm,
    Bgra8Unorm,
    R5g6b5Unorm,
    Rgb5a1Unorm,
    Rgba4Unorm,
    R16Unorm,
    Rg16Unorm,
    Rgba16Unorm,
    R16Float,
    Rg16Float,
    Rgba16Float,
    R32Float,
    Rg32Float,
    Rgba32Float,
    R8Uint,
    R8Sint,
    Rg8Uint,
    Rg8Sint,
    Rgba8Uint,
    Rgba8Sint,
    R16Uint,
    R16Sint,
    Rg16Uint,
    Rg16Sint,
    Rgba16Uint,
    Rgba16Sint,
    R32Uint,
    R32Sint,
    Rg32Uint,
    Rg32Sint,
    Rgba32Uint,
    Rgba32Sint,
    Rgb10a2Unorm,
    Rg11b10Float,
}

impl ColorFormat {
    /// Whether the format stores an alpha channel. Formats without one
    /// substitute constant-one destination alpha in the blender.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            ColorFormat::Rgba8Unorm
                | ColorFormat::Bgra8Unorm
                | ColorFormat::Rgb5a1Unorm
                | ColorFormat::Rgba4Unorm
                | ColorFormat::Rgba16Unorm
                | ColorFormat::Rgba16Float
                | ColorFormat::Rgba32Float
                | ColorFormat::Rgba8Uint
                | ColorFormat::Rgba8Sint
                | ColorFormat::Rgba16Uint
                | ColorFormat::Rgba16Sint
                | ColorFormat::Rgba32Uint
                | ColorFormat::Rgba32Sint
                | ColorFormat::Rgb10a2Unorm
        )
    }

    /// Integer formats never blend.
    pub fn is_int(self) -> bool {
        matches!(
            self,
            ColorFormat::R8Uint
                | ColorFormat::R8Sint
                | ColorFormat::Rg8Uint
                | ColorFormat::Rg8Sint
                | ColorFormat::Rgba8Uint
                | ColorFormat::Rgba8Sint
                | ColorFormat::R16Uint
                | ColorFormat::R16Sint
                | ColorFormat::Rg16Uint
                | ColorFormat::Rg16Sint
                | ColorFormat::Rgba16Uint
                | ColorFormat::Rgba16Sint
                | ColorFormat::R32Uint
                | ColorFormat::R32Sint
                | ColorFormat::Rg32Uint
                | ColorFormat::Rg32Sint
                | ColorFormat::Rgba32Uint
                | ColorFormat::Rgba32Sint
        )
    }
}

/// Depth/stencil attachment formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthFormat {
    D16Unorm,
    D24UnormS8Uint,
    D32Float,
    D32FloatS8Uint,
    S8Uint,
}

impl DepthFormat {
    pub fn has_depth(self) -> bool {
        !matches!(self, DepthFormat::S8Uint)
    }

    pub fn has_stencil(self) -> bool {
        matches!(
            self,
            DepthFormat::D24UnormS8Uint | DepthFormat::D32FloatS8Uint | DepthFormat::S8Uint
        )
    }
}

/// Render-target shapes the pipeline draws into.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttachmentSet {
    /// Per-slot color formats; `None` marks an unused slot.
    pub colors: Vec<Option<ColorFormat>>,
    pub depth: Option<DepthFormat>,
}

/// Everything a graphics-pipeline build consumes, minus the shaders
/// (resolved through the [`crate::shader::ShaderResolver`] seam) and the
/// binding interface (a [`crate::layout::PipelineLayout`]).
#[derive(Debug, Clone, Default)]
pub struct PipelineDescriptor {
    /// Stages present in the program.
    pub stages: StageFlags,
    pub vertex_input: VertexInputState,
    pub input_assembly: InputAssemblyState,
    pub tessellation: Option<TessellationState>,
    pub viewport: ViewportState,
    pub rasterization: RasterizationState,
    pub multisample: MultisampleState,
    pub depth_stencil: DepthStencilState,
    pub blend: BlendState,
    pub attachments: AttachmentSet,
    /// Raw dynamic-state category values; unknown values fail the build.
    pub dynamic_state: Vec<u32>,
}
