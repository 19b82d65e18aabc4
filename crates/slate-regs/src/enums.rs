//! Numeric encodings of hardware enums.
//!
//! The discriminants are the wire values. Translation from API-level enums
//! lives in the driver crates; nothing here should ever need to know about
//! Vulkan-style naming.

/// Payload kind of a `LoadState*` packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StateType {
    /// Shader instruction words.
    Shader = 0,
    /// Constant-file words (vec4 granular).
    Consts = 1,
    /// Uniform-buffer descriptors.
    Ubo = 2,
    /// Storage image/buffer descriptors.
    Resource = 3,
}

/// Where a `LoadState*` packet's payload comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StateSrc {
    /// Payload dwords follow inline in the packet.
    Direct = 0,
    /// Payload is fetched from the 64-bit address in the packet.
    Indirect = 1,
    /// Payload is fetched through a bindless base register.
    Bindless = 2,
}

/// Destination state block of a `LoadState*` packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StateBlock {
    VsTex = 0,
    HsTex = 1,
    DsTex = 2,
    GsTex = 3,
    FsTex = 4,
    CsTex = 5,
    /// Graphics-wide storage resource block.
    Resource = 6,
    /// Compute storage resource block.
    CsResource = 7,
    VsShader = 8,
    HsShader = 9,
    DsShader = 10,
    GsShader = 11,
    FsShader = 12,
    CsShader = 13,
}

/// Depth/stencil compare functions (`RB_DEPTH_CNTL.ZFUNC`,
/// `RB_STENCIL_CONTROL.FUNC*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum CompareFunc {
    Never = 0,
    Less = 1,
    Equal = 2,
    LessEqual = 3,
    Greater = 4,
    NotEqual = 5,
    GreaterEqual = 6,
    Always = 7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum StencilOp {
    Keep = 0,
    Zero = 1,
    Replace = 2,
    IncrClamp = 3,
    DecrClamp = 4,
    Invert = 5,
    IncrWrap = 6,
    DecrWrap = 7,
}

/// Blend factors (`RB_MRT_BLEND_CONTROL` 5-bit fields).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BlendFactor {
    Zero = 0,
    One = 1,
    Src = 2,
    OneMinusSrc = 3,
    SrcAlpha = 4,
    OneMinusSrcAlpha = 5,
    Dst = 6,
    OneMinusDst = 7,
    DstAlpha = 8,
    OneMinusDstAlpha = 9,
    Constant = 10,
    OneMinusConstant = 11,
    ConstantAlpha = 12,
    OneMinusConstantAlpha = 13,
    SrcAlphaSaturate = 14,
    Src1 = 15,
    OneMinusSrc1 = 16,
    Src1Alpha = 17,
    OneMinusSrc1Alpha = 18,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum BlendOp {
    Add = 0,
    Subtract = 1,
    ReverseSubtract = 2,
    Min = 3,
    Max = 4,
}

/// Raster operations (`RB_MRT_CONTROL.ROP_CODE`), GL ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum RopCode {
    Clear = 0,
    Nor = 1,
    AndInverted = 2,
    CopyInverted = 3,
    AndReverse = 4,
    Invert = 5,
    Xor = 6,
    Nand = 7,
    And = 8,
    Equiv = 9,
    Noop = 10,
    OrInverted = 11,
    Copy = 12,
    OrReverse = 13,
    Or = 14,
    Set = 15,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PolygonMode {
    Point = 0,
    Line = 1,
    Fill = 2,
}

/// Primitive types as consumed by the primitive assembler. Patch types
/// encode their control-point count above [`PrimType::PATCHES_BASE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum PrimType {
    Points = 0,
    Lines = 1,
    LineStrip = 2,
    Triangles = 3,
    TriStrip = 4,
    TriFan = 5,
    LinesAdj = 6,
    LineStripAdj = 7,
    TrianglesAdj = 8,
    TriStripAdj = 9,
}

impl PrimType {
    /// `PATCHES_BASE + n` is a patch primitive with `n` control points.
    pub const PATCHES_BASE: u32 = 0x20;
}

/// Tessellator point spacing (`PA_TESS_CNTL.SPACING`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TessSpacing {
    Equal = 0,
    FractionalOdd = 1,
    FractionalEven = 2,
}

/// Tessellator output primitive (`PA_TESS_CNTL.OUTPUT`, also the GS output
/// field of `PA_PRIMITIVE_CNTL_5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TessOutput {
    Points = 0,
    Lines = 1,
    TrisCw = 2,
    TrisCcw = 3,
}

/// Shader-processor thread width selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ThreadSize {
    Half = 0,
    Full = 1,
}

/// Depth-resolve ordering (`*_DEPTH_PLANE_CNTL.Z_MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ZMode {
    Early = 0,
    Late = 1,
}

/// Vertex-fetch data formats (`VF_DECODE.FORMAT`). Only the formats the
/// fetch units decode natively are listed; everything else must be lowered
/// before it reaches the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum VfFormat {
    R8Unorm = 0x01,
    R8Snorm = 0x02,
    R8Uint = 0x03,
    R8Sint = 0x04,
    Rg8Unorm = 0x05,
    Rg8Snorm = 0x06,
    Rg8Uint = 0x07,
    Rg8Sint = 0x08,
    Rgba8Unorm = 0x09,
    Rgba8Snorm = 0x0a,
    Rgba8Uint = 0x0b,
    Rgba8Sint = 0x0c,
    R16Unorm = 0x10,
    R16Snorm = 0x11,
    R16Uint = 0x12,
    R16Sint = 0x13,
    R16Float = 0x14,
    Rg16Unorm = 0x15,
    Rg16Snorm = 0x16,
    Rg16Uint = 0x17,
    Rg16Sint = 0x18,
    Rg16Float = 0x19,
    Rgba16Unorm = 0x1a,
    Rgba16Snorm = 0x1b,
    Rgba16Uint = 0x1c,
    Rgba16Sint = 0x1d,
    Rgba16Float = 0x1e,
    R32Uint = 0x20,
    R32Sint = 0x21,
    R32Float = 0x22,
    Rg32Uint = 0x23,
    Rg32Sint = 0x24,
    Rg32Float = 0x25,
    Rgb32Uint = 0x26,
    Rgb32Sint = 0x27,
    Rgb32Float = 0x28,
    Rgba32Uint = 0x29,
    Rgba32Sint = 0x2a,
    Rgba32Float = 0x2b,
    Rgb10a2Unorm = 0x30,
    Rg11b10Float = 0x31,
}

impl VfFormat {
    /// Integer formats fetch raw; everything else converts to float.
    pub fn is_int(self) -> bool {
        matches!(
            self,
            VfFormat::R8Uint
                | VfFormat::R8Sint
                | VfFormat::Rg8Uint
                | VfFormat::Rg8Sint
                | VfFormat::Rgba8Uint
                | VfFormat::Rgba8Sint
                | VfFormat::R16Uint
                | VfFormat::R16Sint
                | VfFormat::Rg16Uint
                | VfFormat::Rg16Sint
                | VfFormat::Rgba16Uint
                | VfFormat::Rgba16Sint
                | VfFormat::R32Uint
                | VfFormat::R32Sint
                | VfFormat::Rg32Uint
                | VfFormat::Rg32Sint
                | VfFormat::Rgb32Uint
                | VfFormat::Rgb32Sint
                | VfFormat::Rgba32Uint
                | VfFormat::Rgba32Sint
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rop_values_are_gl_order() {
        assert_eq!(RopCode::Clear as u32, 0);
        assert_eq!(RopCode::Copy as u32, 12);
        assert_eq!(RopCode::Set as u32, 15);
    }

    #[test]
    fn state_blocks_fit_control_field() {
        // The control word has a 4-bit block field.
        assert!((StateBlock::CsShader as u32) < 16);
    }
}
