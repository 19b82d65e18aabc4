//! Register dword addresses and field layouts.
//!
//! Multi-field registers get a value type with an `encode()` method; plain
//! value registers (f32 bit patterns, single counts) are written raw.
//! Addresses are grouped by hardware block. Stage-replicated registers
//! (`SP_VS_*`/`SP_HS_*`/...) are laid out at a fixed stride so the per-stage
//! tables in the driver stay data, not code.

use crate::enums::{
    BlendFactor, BlendOp, CompareFunc, PolygonMode, RopCode, StencilOp, TessOutput, TessSpacing,
    ThreadSize, VfFormat, ZMode,
};

// ---------------------------------------------------------------------------
// SQ: sequencer
// ---------------------------------------------------------------------------

pub const SQ_INVALIDATE_CMD: u16 = 0x0200;

pub const SQ_VS_CNTL: u16 = 0x0208;
pub const SQ_HS_CNTL: u16 = 0x0209;
pub const SQ_DS_CNTL: u16 = 0x020a;
pub const SQ_GS_CNTL: u16 = 0x020b;
pub const SQ_FS_CNTL: u16 = 0x020c;
pub const SQ_CS_CNTL: u16 = 0x020d;

/// Fragment-stage interpolator controls, written as one 5-dword group.
pub const SQ_FS_CONTROL_1: u16 = 0x0210;
pub const SQ_FS_CONTROL_5: u16 = 0x0214;
pub const SQ_FS_MODE: u16 = 0x0215;

pub const SQ_CS_CONTROL_0: u16 = 0x0218;
pub const SQ_CS_CONTROL_1: u16 = 0x0219;

/// Reference-blob value for `SQ_FS_CONTROL_1`; meaning unknown.
pub const SQ_FS_CONTROL_1_INIT: u32 = 0x7;
/// Reference-blob value for `SQ_FS_CONTROL_5`; looks like an invalid regid.
pub const SQ_FS_CONTROL_5_INIT: u32 = 0xfc;
/// `SQ_FS_MODE` values observed in the reference blob: 3 with live
/// varyings, 1 without.
pub const SQ_FS_MODE_VARYINGS: u32 = 3;
pub const SQ_FS_MODE_EMPTY: u32 = 1;
/// Reference-blob value for `SQ_CS_CONTROL_1`; meaning unknown.
pub const SQ_CS_CONTROL_1_INIT: u32 = 0x2fc;

/// `SQ_INVALIDATE_CMD`: drops cached sequencer state before a program
/// switch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqInvalidateCmd {
    pub vs_state: bool,
    pub hs_state: bool,
    pub ds_state: bool,
    pub gs_state: bool,
    pub fs_state: bool,
    pub cs_state: bool,
    pub gfx_resource: bool,
    pub cs_resource: bool,
    pub gfx_shared_const: bool,
    pub cs_shared_const: bool,
    /// Bindless base valid mask, graphics.
    pub gfx_bindless: u32,
    /// Bindless base valid mask, compute.
    pub cs_bindless: u32,
}

impl SqInvalidateCmd {
    pub const fn encode(self) -> u32 {
        (self.vs_state as u32)
            | (self.hs_state as u32) << 1
            | (self.ds_state as u32) << 2
            | (self.gs_state as u32) << 3
            | (self.fs_state as u32) << 4
            | (self.cs_state as u32) << 5
            | (self.gfx_resource as u32) << 6
            | (self.cs_resource as u32) << 7
            | (self.gfx_shared_const as u32) << 8
            | (self.cs_shared_const as u32) << 9
            | (self.gfx_bindless & 0x1f) << 16
            | (self.cs_bindless & 0x1f) << 24
    }
}

/// Per-stage `SQ_*_CNTL`: constant-file length (vec4 units) and enable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqStageCntl {
    pub constlen: u32,
    pub enabled: bool,
}

impl SqStageCntl {
    pub const fn encode(self) -> u32 {
        (self.constlen & 0xff) | (self.enabled as u32) << 8
    }
}

/// `SQ_CS_CONTROL_0`: compute id plumbing. `wgid_const` is a const-file
/// vec4 index, `local_id_regid` a GPR id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqCsControl0 {
    pub wgid_const: u8,
    pub unk1: u8,
    pub unk2: u8,
    pub local_id_regid: u8,
}

impl SqCsControl0 {
    pub const fn encode(self) -> u32 {
        crate::pack_regids(self.wgid_const, self.unk1, self.unk2, self.local_id_regid)
    }
}

// ---------------------------------------------------------------------------
// SP: shader processors
// ---------------------------------------------------------------------------

/// Stage register groups sit at `SP_STAGE_BASE + stage_index * SP_STAGE_STRIDE`
/// in the order VS, HS, DS, GS, FS, CS.
pub const SP_STAGE_BASE: u16 = 0x0800;
pub const SP_STAGE_STRIDE: u16 = 8;

pub const SP_VS_CTRL: u16 = 0x0800;
pub const SP_VS_CONFIG: u16 = 0x0801;
pub const SP_VS_INSTRLEN: u16 = 0x0802;
pub const SP_VS_OBJ_START: u16 = 0x0803;
pub const SP_HS_CTRL: u16 = 0x0808;
pub const SP_HS_CONFIG: u16 = 0x0809;
pub const SP_HS_OBJ_START: u16 = 0x080b;
pub const SP_DS_CTRL: u16 = 0x0810;
pub const SP_DS_CONFIG: u16 = 0x0811;
pub const SP_DS_OBJ_START: u16 = 0x0813;
pub const SP_GS_CTRL: u16 = 0x0818;
pub const SP_GS_CONFIG: u16 = 0x0819;
pub const SP_GS_OBJ_START: u16 = 0x081b;
pub const SP_FS_CTRL: u16 = 0x0820;
pub const SP_FS_CONFIG: u16 = 0x0821;
pub const SP_FS_OBJ_START: u16 = 0x0823;
pub const SP_CS_CTRL: u16 = 0x0828;
pub const SP_CS_CONFIG: u16 = 0x0829;
pub const SP_CS_OBJ_START: u16 = 0x082b;

/// Varying output descriptors, two 16-bit entries per dword.
pub const SP_VS_OUT: u16 = 0x0830;
pub const SP_VS_VC_DST: u16 = 0x0840;
pub const SP_GS_OUT: u16 = 0x0848;
pub const SP_GS_VC_DST: u16 = 0x0858;
pub const SP_DS_OUT: u16 = 0x0860;
pub const SP_DS_VC_DST: u16 = 0x0870;

pub const SP_VS_PRIMITIVE_CNTL: u16 = 0x0878;
pub const SP_GS_PRIMITIVE_CNTL: u16 = 0x0879;
pub const SP_DS_PRIMITIVE_CNTL: u16 = 0x087a;

/// Tessellation-control local allocation; on S650 this is per-wave local
/// memory, elsewhere the control stage's patch output size.
pub const SP_HS_WAVE_INPUT_SIZE: u16 = 0x087b;
pub const SP_GS_PRIM_SIZE: u16 = 0x087c;

pub const SP_FS_PREFETCH_CNTL: u16 = 0x0880;
pub const SP_FS_PREFETCH_CMD: u16 = 0x0881;

pub const SP_FS_OUTPUT_CNTL0: u16 = 0x0888;
pub const SP_FS_OUTPUT_CNTL1: u16 = 0x0889;
pub const SP_FS_OUTPUT_REG: u16 = 0x088a;
pub const SP_FS_RENDER_COMPONENTS: u16 = 0x0892;
pub const SP_BLEND_CNTL: u16 = 0x0893;

/// Reference-blob value; meaning unknown.
pub const SP_CS_MODE_CNTL: u16 = 0x0898;
pub const SP_CS_MODE_CNTL_INIT: u32 = 0x41;
/// Reference-blob value on the S650 variant; the extra bit changes the
/// workgroup dispatch order for its doubled shader-processor count.
pub const SP_CS_MODE_CNTL_INIT_S650: u32 = 0x141;

pub const TP_SAMPLE_CONFIG: u16 = 0x08a0;
pub const TP_SAMPLE_LOCATION_0: u16 = 0x08a1;
pub const TP_SAMPLE_LOCATION_1: u16 = 0x08a2;

/// Per-stage `SP_*_CTRL`: execution resources of the resolved binary.
///
/// The three `FS only` bits are ignored by the geometry-family processors.
/// Bit 24 is set by the reference blob on every fragment program; keep it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpStageCtrl {
    pub thread_size: ThreadSize,
    /// Full-width GPR footprint, in registers.
    pub full_regs: u32,
    /// Half-width GPR footprint, in registers.
    pub half_regs: u32,
    pub branch_stack: u32,
    pub merged_regs: bool,
    /// FS only: sampling with computed LOD.
    pub pix_lod: bool,
    /// FS only: fine-granularity derivatives.
    pub fine_derivatives: bool,
    /// FS only: consumes varyings.
    pub varying: bool,
    pub unk24: bool,
}

impl SpStageCtrl {
    pub const fn encode(self) -> u32 {
        (self.thread_size as u32)
            | (self.half_regs & 0x3f) << 1
            | (self.full_regs & 0x3f) << 7
            | (self.branch_stack & 0x3f) << 13
            | (self.merged_regs as u32) << 19
            | (self.pix_lod as u32) << 20
            | (self.fine_derivatives as u32) << 21
            | (self.varying as u32) << 22
            | (self.unk24 as u32) << 24
    }
}

/// Bindless-usage bits of `SP_*_CONFIG` (`SpStageConfig::bindless`).
pub const BINDLESS_TEX: u8 = 1 << 0;
pub const BINDLESS_SAMP: u8 = 1 << 1;
pub const BINDLESS_RESOURCE: u8 = 1 << 2;
pub const BINDLESS_UBO: u8 = 1 << 3;

/// Per-stage `SP_*_CONFIG`. A disabled stage writes zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpStageConfig {
    pub enabled: bool,
    pub bindless: u8,
    pub tex_count: u32,
    pub samp_count: u32,
}

impl SpStageConfig {
    pub const fn encode(self) -> u32 {
        (self.enabled as u32)
            | (self.bindless as u32 & 0xf) << 1
            | (self.tex_count & 0xff) << 8
            | (self.samp_count & 0xff) << 16
    }
}

/// One dword of `SP_*_OUT`: two (regid, component mask) output descriptors.
#[inline]
pub const fn sp_out_pair(a_regid: u8, a_mask: u8, b_regid: u8, b_mask: u8) -> u32 {
    (a_regid as u32)
        | (a_mask as u32 & 0xf) << 8
        | (b_regid as u32) << 16
        | (b_mask as u32 & 0xf) << 24
}

/// `SP_*_PRIMITIVE_CNTL`: varying output count plus the stream-out flags
/// regid (geometry stage only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpPrimitiveCntl {
    pub out_count: u32,
    pub flags_regid: u8,
}

impl SpPrimitiveCntl {
    pub const fn encode(self) -> u32 {
        (self.out_count & 0x3f) | (self.flags_regid as u32) << 8
    }
}

/// `SP_FS_OUTPUT_CNTL0`. Regids are [`crate::REGID_NONE`] when the program
/// does not write the export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpFsOutputCntl0 {
    pub dual_color_in_enable: bool,
    pub depth_regid: u8,
    pub sample_mask_regid: u8,
    pub stencil_ref_regid: u8,
}

impl SpFsOutputCntl0 {
    pub const fn encode(self) -> u32 {
        (self.dual_color_in_enable as u32)
            | (self.depth_regid as u32) << 8
            | (self.sample_mask_regid as u32) << 16
            | (self.stencil_ref_regid as u32) << 24
    }
}

/// `SP_FS_OUTPUT_CNTL1` / `RB_FS_OUTPUT_CNTL1`: live MRT count.
#[inline]
pub const fn fs_output_cntl1(mrt_count: u32) -> u32 {
    mrt_count & 0xf
}

/// One `SP_FS_OUTPUT_REG` entry.
#[inline]
pub const fn sp_fs_output_reg(regid: u8, half_precision: bool) -> u32 {
    (regid as u32) | (half_precision as u32) << 8
}

/// `SP_FS_PREFETCH_CNTL`. Bits [11:4] and [14:12] carry reference-blob
/// values with no known meaning.
#[inline]
pub const fn sp_fs_prefetch_cntl(count: u32) -> u32 {
    (count & 0x7) | (crate::REGID_NONE as u32) << 4 | 0x7000
}

/// One `SP_FS_PREFETCH_CMD` entry: a texture fetch the scheduler may issue
/// before the program starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpFsPrefetchCmd {
    /// Packed source varying location.
    pub src: u8,
    pub samp_id: u8,
    pub tex_id: u8,
    pub dst_regid: u8,
    pub write_mask: u8,
    /// Fetch opcode.
    pub cmd: u8,
}

impl SpFsPrefetchCmd {
    pub const fn encode(self) -> u32 {
        (self.src as u32)
            | (self.samp_id as u32 & 0xf) << 8
            | (self.tex_id as u32 & 0xf) << 12
            | (self.dst_regid as u32) << 16
            | (self.write_mask as u32 & 0xf) << 24
            | (self.cmd as u32 & 0xf) << 28
    }
}

/// `SP_BLEND_CNTL`. Bit 8 is always set by the reference blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpBlendCntl {
    pub enabled: bool,
    pub dual_color_in_enable: bool,
    pub alpha_to_coverage: bool,
    pub unk8: bool,
}

impl SpBlendCntl {
    pub const fn encode(self) -> u32 {
        (self.enabled as u32)
            | (self.dual_color_in_enable as u32) << 1
            | (self.alpha_to_coverage as u32) << 2
            | (self.unk8 as u32) << 8
    }
}

// ---------------------------------------------------------------------------
// VC: varying cache
// ---------------------------------------------------------------------------

pub const VC_VAR_DISABLE: u16 = 0x0900;
pub const VC_CNTL: u16 = 0x0904;
pub const VC_VS_PACK: u16 = 0x0908;
pub const VC_GS_PACK: u16 = 0x0909;
pub const VC_DS_PACK: u16 = 0x090a;
pub const VC_VS_CLIP_CNTL: u16 = 0x090c;
pub const VC_GS_CLIP_CNTL: u16 = 0x090d;
pub const VC_DS_CLIP_CNTL: u16 = 0x090e;
pub const VC_VS_LAYER_CNTL: u16 = 0x0910;
pub const VC_GS_LAYER_CNTL: u16 = 0x0911;
pub const VC_DS_LAYER_CNTL: u16 = 0x0912;
/// Reference-blob value written whenever a geometry stage is present.
pub const VC_GS_PARAM: u16 = 0x0913;
pub const VC_GS_PARAM_INIT: u32 = 0xff;
pub const VC_POLYGON_MODE: u16 = 0x0914;

pub const VC_SO_BUF_CNTL: u16 = 0x0918;
pub const VC_SO_NCOMP_0: u16 = 0x0919;
pub const VC_SO_CNTL: u16 = 0x091d;
/// FIFO register: each write appends one program-table entry. A write to
/// `VC_SO_CNTL` resets the table.
pub const VC_SO_PROG: u16 = 0x091e;

pub const VC_VARYING_INTERP: u16 = 0x0920;
pub const VC_VARYING_REPL: u16 = 0x0928;

/// Clip-distance plumbing is not wired up; the reference blob parks the
/// register at this value.
pub const VC_CLIP_CNTL_DISABLE_ALL: u32 = 0x00ffff00;

/// Per-last-stage `VC_*_PACK`: where position and point size live in the
/// packed varying space, and the per-vertex stride.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcPack {
    pub position_loc: u8,
    pub psize_loc: u8,
    pub stride_in_vc: u8,
}

impl VcPack {
    pub const fn encode(self) -> u32 {
        (self.position_loc as u32) | (self.psize_loc as u32) << 8 | (self.stride_in_vc as u32) << 16
    }
}

/// `VC_*_LAYER_CNTL`: packed location of the layer output. The upper byte
/// holds the reference blob's unused-location marker.
#[inline]
pub const fn vc_layer_cntl(layer_loc: u8) -> u32 {
    (layer_loc as u32) | 0xff00
}

/// `VC_CNTL`: fragment-side varying summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VcCntl {
    /// Scalar varying components consumed by the fragment stage.
    pub num_nonpos_var: u32,
    pub varying: bool,
    /// Packed location carrying the primitive id, 0xff when unused.
    pub primid_loc: u8,
    pub unk_loc: u8,
}

impl VcCntl {
    pub const fn encode(self) -> u32 {
        (self.num_nonpos_var & 0xff)
            | (self.varying as u32) << 8
            | (self.primid_loc as u32) << 16
            | (self.unk_loc as u32) << 24
    }
}

/// `VC_SO_BUF_CNTL`: which stream-out buffer slots are live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VcSoBufCntl {
    pub enable: bool,
    pub buf: [bool; 4],
}

impl VcSoBufCntl {
    pub const fn encode(self) -> u32 {
        (self.buf[0] as u32)
            | (self.buf[1] as u32) << 1
            | (self.buf[2] as u32) << 2
            | (self.buf[3] as u32) << 3
            | (self.enable as u32) << 15
    }
}

pub const VC_SO_CNTL_ENABLE: u32 = 1;

/// One `VC_SO_PROG` entry: capture routing for a pair of adjacent packed
/// locations (A = even, B = odd). Offsets are dwords into the buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VcSoProg {
    pub a_en: bool,
    pub a_buf: u32,
    pub a_off_dwords: u32,
    pub b_en: bool,
    pub b_buf: u32,
    pub b_off_dwords: u32,
}

impl VcSoProg {
    pub const fn encode(self) -> u32 {
        (self.a_en as u32)
            | (self.a_buf & 0x3) << 1
            | (self.a_off_dwords & 0x3ff) << 3
            | (self.b_en as u32) << 16
            | (self.b_buf & 0x3) << 17
            | (self.b_off_dwords & 0x3ff) << 19
    }
}

// ---------------------------------------------------------------------------
// VF: vertex fetch
// ---------------------------------------------------------------------------

pub const VF_CONTROL_0: u16 = 0x0a00;
pub const VF_CONTROL_1: u16 = 0x0a01;
pub const VF_FETCH_STRIDE: u16 = 0x0a10;
pub const VF_DECODE: u16 = 0x0a40;
pub const VF_DEST_CNTL: u16 = 0x0a80;

#[inline]
pub const fn vf_fetch_stride(binding: u32) -> u16 {
    VF_FETCH_STRIDE + binding as u16
}

/// `VF_DECODE` entries are (instruction, step rate) pairs.
#[inline]
pub const fn vf_decode_instr(i: u32) -> u16 {
    VF_DECODE + (2 * i) as u16
}

#[inline]
pub const fn vf_decode_step_rate(i: u32) -> u16 {
    VF_DECODE + (2 * i + 1) as u16
}

#[inline]
pub const fn vf_dest_cntl(i: u32) -> u16 {
    VF_DEST_CNTL + i as u16
}

/// `VF_CONTROL_0`: live fetch/decode unit counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VfControl0 {
    pub fetch_cnt: u32,
    pub decode_cnt: u32,
}

impl VfControl0 {
    pub const fn encode(self) -> u32 {
        (self.fetch_cnt & 0x3f) | (self.decode_cnt & 0x3f) << 8
    }
}

pub const VF_CONTROL_6_PRIMID_PASSTHRU: u32 = 1;

/// One `VF_DECODE` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfDecodeInstr {
    /// Source binding index.
    pub idx: u32,
    /// Byte offset within the element.
    pub offset: u32,
    pub instanced: bool,
    pub format: VfFormat,
    pub byte_swap: u32,
    pub unk30: bool,
    /// Convert to float on fetch.
    pub float: bool,
}

impl VfDecodeInstr {
    pub const fn encode(self) -> u32 {
        (self.idx & 0x1f)
            | (self.offset & 0xfff) << 5
            | (self.instanced as u32) << 17
            | (self.format as u32) << 18
            | (self.byte_swap & 0x3) << 24
            | (self.unk30 as u32) << 30
            | (self.float as u32) << 31
    }
}

/// One `VF_DEST_CNTL` entry: destination GPR of a decode unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfDestCntl {
    pub write_mask: u8,
    pub regid: u8,
}

impl VfDestCntl {
    pub const fn encode(self) -> u32 {
        (self.write_mask as u32 & 0xf) | (self.regid as u32) << 8
    }
}

// ---------------------------------------------------------------------------
// PA: primitive assembler
// ---------------------------------------------------------------------------

pub const PA_VS_OUT_CNTL: u16 = 0x0b00;
pub const PA_GS_OUT_CNTL: u16 = 0x0b01;
pub const PA_DS_OUT_CNTL: u16 = 0x0b02;
pub const PA_PRIMID_PASSTHRU: u16 = 0x0b04;
pub const PA_TESS_NUM_VERTEX: u16 = 0x0b05;
pub const PA_HS_INPUT_SIZE: u16 = 0x0b06;
pub const PA_TESS_CNTL: u16 = 0x0b07;
/// Reference-blob value 0 whenever a geometry stage is present.
pub const PA_PRIMITIVE_CNTL_3: u16 = 0x0b08;
pub const PA_PRIMITIVE_CNTL_5: u16 = 0x0b09;
pub const PA_PRIMITIVE_CNTL_6: u16 = 0x0b0a;
/// Reference-blob value 0 whenever a geometry stage is present.
pub const PA_GS_PARAM: u16 = 0x0b0b;
pub const PA_POLYGON_MODE: u16 = 0x0b0c;

/// Per-last-stage `PA_*_OUT_CNTL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaOutCntl {
    pub stride_in_vc: u32,
    pub psize: bool,
    pub layer: bool,
    pub primitive_id: bool,
}

impl PaOutCntl {
    pub const fn encode(self) -> u32 {
        (self.stride_in_vc & 0xff)
            | (self.psize as u32) << 8
            | (self.layer as u32) << 9
            | (self.primitive_id as u32) << 10
    }
}

/// `PA_TESS_CNTL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaTessCntl {
    pub spacing: TessSpacing,
    pub output: TessOutput,
}

impl PaTessCntl {
    pub const fn encode(self) -> u32 {
        (self.spacing as u32) | (self.output as u32) << 2
    }
}

/// `PA_PRIMITIVE_CNTL_5`: geometry-stage amplification shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaPrimitiveCntl5 {
    pub gs_vertices_out: u32,
    pub gs_output: TessOutput,
    pub gs_invocations: u32,
}

impl PaPrimitiveCntl5 {
    pub const fn encode(self) -> u32 {
        (self.gs_vertices_out & 0x3ff)
            | (self.gs_output as u32) << 10
            | (self.gs_invocations & 0x1f) << 12
    }
}

/// `PA_PRIMITIVE_CNTL_6`: per-primitive varying stride (vec4 units).
#[inline]
pub const fn pa_primitive_cntl_6(stride_in_vc: u32) -> u32 {
    stride_in_vc & 0x7ff
}

// ---------------------------------------------------------------------------
// RAS: rasterizer
// ---------------------------------------------------------------------------

pub const RAS_CL_CNTL: u16 = 0x0c00;
pub const RAS_VS_CL_CNTL: u16 = 0x0c01;
pub const RAS_GS_CL_CNTL: u16 = 0x0c02;
pub const RAS_DS_CL_CNTL: u16 = 0x0c03;
pub const RAS_VS_LAYER_CNTL: u16 = 0x0c04;
pub const RAS_GS_LAYER_CNTL: u16 = 0x0c05;
pub const RAS_DS_LAYER_CNTL: u16 = 0x0c06;
pub const RAS_CNTL: u16 = 0x0c07;

pub const RAS_CL_VPORT_XOFFSET: u16 = 0x0c10;
pub const RAS_CL_GUARDBAND: u16 = 0x0c16;
pub const RAS_CL_Z_CLAMP_MIN: u16 = 0x0c17;
pub const RAS_CL_Z_CLAMP_MAX: u16 = 0x0c18;

pub const RAS_SC_VIEWPORT_SCISSOR_TL: u16 = 0x0c20;
pub const RAS_SC_VIEWPORT_SCISSOR_BR: u16 = 0x0c21;
pub const RAS_SC_SCREEN_SCISSOR_TL: u16 = 0x0c22;
pub const RAS_SC_SCREEN_SCISSOR_BR: u16 = 0x0c23;

pub const RAS_SU_CNTL: u16 = 0x0c28;
pub const RAS_SU_POINT_MINMAX: u16 = 0x0c29;
pub const RAS_SU_POINT_SIZE: u16 = 0x0c2a;
pub const RAS_SU_POLY_OFFSET_SCALE: u16 = 0x0c2b;
pub const RAS_SU_POLY_OFFSET_OFFSET: u16 = 0x0c2c;
pub const RAS_SU_POLY_OFFSET_CLAMP: u16 = 0x0c2d;
pub const RAS_SU_DEPTH_PLANE_CNTL: u16 = 0x0c2e;

pub const RAS_SC_RAST_CNTL: u16 = 0x0c30;
/// Reference-blob value with per-sample shading; zero otherwise.
pub const RAS_SC_RAST_CNTL_PER_SAMPLE: u32 = 0x6;
pub const RAS_SAMPLE_CNTL: u16 = 0x0c31;
pub const RAS_SAMPLE_CONFIG: u16 = 0x0c32;
pub const RAS_SAMPLE_LOCATION_0: u16 = 0x0c33;
pub const RAS_SAMPLE_LOCATION_1: u16 = 0x0c34;

/// `RAS_CL_CNTL`: clip-stage behavior. `unk5` tracks the two clip-disable
/// bits in the reference blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasClCntl {
    pub znear_clip_disable: bool,
    pub zfar_clip_disable: bool,
    pub unk5: bool,
    pub zero_gb_scale_z: bool,
    pub vp_clip_code_ignore: bool,
}

impl RasClCntl {
    pub const fn encode(self) -> u32 {
        (self.znear_clip_disable as u32)
            | (self.zfar_clip_disable as u32) << 1
            | (self.unk5 as u32) << 5
            | (self.zero_gb_scale_z as u32) << 6
            | (self.vp_clip_code_ignore as u32) << 7
    }
}

/// `RAS_SU_CNTL`. The line half-width is 4.4 unsigned fixed point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasSuCntl {
    pub cull_front: bool,
    pub cull_back: bool,
    pub front_cw: bool,
    pub line_half_width_fp: u32,
    pub poly_offset: bool,
    pub msaa_enable: bool,
}

impl RasSuCntl {
    pub const fn encode(self) -> u32 {
        (self.cull_front as u32)
            | (self.cull_back as u32) << 1
            | (self.front_cw as u32) << 2
            | (self.line_half_width_fp & 0xff) << 3
            | (self.poly_offset as u32) << 11
            | (self.msaa_enable as u32) << 13
    }
}

/// Half line width in pixels to the 4.4 fixed-point `RAS_SU_CNTL` field.
#[inline]
pub fn line_half_width_fp(half_width: f32) -> u32 {
    let fp = (half_width * 16.0 + 0.5) as i64;
    fp.clamp(0, 0xff) as u32
}

/// 12.4 unsigned fixed point for the point-size registers.
#[inline]
pub fn point_size_fp(size: f32) -> u32 {
    let fp = (size * 16.0 + 0.5) as i64;
    fp.clamp(0, 0xffff) as u32
}

/// `RAS_SU_POINT_MINMAX`: two 12.4 values.
#[inline]
pub fn ras_su_point_minmax(min: f32, max: f32) -> u32 {
    point_size_fp(min) | point_size_fp(max) << 16
}

/// 15-bit x/y pair, used by every scissor register.
#[inline]
pub const fn scissor_xy(x: u32, y: u32) -> u32 {
    (x & 0x7fff) | (y & 0x7fff) << 16
}

/// `RAS_CL_GUARDBAND`: log2 clip adjustments, horizontal then vertical.
#[inline]
pub const fn guardband_adj(horz: u32, vert: u32) -> u32 {
    (horz & 0x1ff) | (vert & 0x1ff) << 9
}

/// Guardband clip adjustment for one axis: the log2 factor by which
/// clip-space coordinates may exceed the viewport before the scan
/// converter's signed 16.8 window range (±32768) could overflow. A zero
/// scale encodes the maximum adjustment.
#[inline]
pub fn guardband_clip_adj(offset: f32, scale: f32) -> u32 {
    if scale == 0.0 {
        return crate::limits::GUARDBAND_ADJ_MAX;
    }
    let coord = (crate::limits::RASTER_COORD_RANGE - offset.abs()) / scale.abs();
    (coord.log2() as u32).min(crate::limits::GUARDBAND_ADJ_MAX)
}

/// Shared layout of `RAS_CNTL` and `RB_RENDER_CONTROL0`: which
/// interpolation inputs the rasterizer must produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FsInterpControl {
    pub ij_persp_pixel: bool,
    pub ij_persp_centroid: bool,
    pub ij_persp_sample: bool,
    /// Linear (no-perspective) pixel ij, also carries point size.
    pub size: bool,
    pub size_persamp: bool,
    /// Frag-coord components to produce.
    pub coord_mask: u8,
}

impl FsInterpControl {
    pub const fn encode(self) -> u32 {
        (self.ij_persp_pixel as u32)
            | (self.ij_persp_centroid as u32) << 1
            | (self.ij_persp_sample as u32) << 2
            | (self.size as u32) << 3
            | (self.size_persamp as u32) << 4
            | (self.coord_mask as u32 & 0xf) << 6
    }
}

/// `*_DEPTH_PLANE_CNTL`.
#[inline]
pub const fn depth_plane_cntl(z_mode: ZMode) -> u32 {
    z_mode as u32
}

// ---------------------------------------------------------------------------
// RB: render backend
// ---------------------------------------------------------------------------

pub const RB_RENDER_CONTROL0: u16 = 0x0d00;
/// Reference-blob bit set in `RB_RENDER_CONTROL0` whenever any varying is
/// interpolated; meaning unknown.
pub const RB_RENDER_CONTROL0_UNK10: u32 = 1 << 10;
pub const RB_RENDER_CONTROL1: u16 = 0x0d01;
pub const RB_SAMPLE_CNTL: u16 = 0x0d02;
pub const RB_DEPTH_PLANE_CNTL: u16 = 0x0d03;
pub const RB_DEPTH_CNTL: u16 = 0x0d04;
pub const RB_Z_BOUNDS_MIN: u16 = 0x0d05;
pub const RB_Z_BOUNDS_MAX: u16 = 0x0d06;
pub const RB_Z_CLAMP_MIN: u16 = 0x0d07;
pub const RB_Z_CLAMP_MAX: u16 = 0x0d08;
pub const RB_STENCIL_CONTROL: u16 = 0x0d09;
pub const RB_STENCIL_MASK: u16 = 0x0d0a;
pub const RB_STENCIL_WRITE_MASK: u16 = 0x0d0b;
pub const RB_STENCIL_REF: u16 = 0x0d0c;
/// Legacy alpha test, never enabled; always written zero alongside depth
/// state.
pub const RB_ALPHA_CONTROL: u16 = 0x0d0d;

pub const RB_FS_OUTPUT_CNTL0: u16 = 0x0d10;
pub const RB_FS_OUTPUT_CNTL1: u16 = 0x0d11;
pub const RB_RENDER_COMPONENTS: u16 = 0x0d12;
pub const RB_SAMPLE_CONFIG: u16 = 0x0d13;
pub const RB_SAMPLE_LOCATION_0: u16 = 0x0d14;
pub const RB_SAMPLE_LOCATION_1: u16 = 0x0d15;

pub const RB_MRT: u16 = 0x0d20;
pub const RB_MRT_STRIDE: u16 = 2;

#[inline]
pub const fn rb_mrt_control(i: u32) -> u16 {
    RB_MRT + (i as u16) * RB_MRT_STRIDE
}

#[inline]
pub const fn rb_mrt_blend_control(i: u32) -> u16 {
    RB_MRT + (i as u16) * RB_MRT_STRIDE + 1
}

pub const RB_BLEND_CNTL: u16 = 0x0d30;
pub const RB_BLEND_RED_F32: u16 = 0x0d31;

/// `RB_RENDER_CONTROL1`: which fragment system values are live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RbRenderControl1 {
    pub sample_mask: bool,
    pub sample_id: bool,
    pub size: bool,
    pub faceness: bool,
}

impl RbRenderControl1 {
    pub const fn encode(self) -> u32 {
        (self.sample_mask as u32)
            | (self.sample_id as u32) << 1
            | (self.size as u32) << 2
            | (self.faceness as u32) << 3
    }
}

/// `RB_FS_OUTPUT_CNTL0`: which non-color exports the fragment shader
/// produces. Same information as `SP_FS_OUTPUT_CNTL0` but as presence
/// bits rather than register ids.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RbFsOutputCntl0 {
    pub dual_color_in_enable: bool,
    pub frag_writes_z: bool,
    pub frag_writes_sample_mask: bool,
    pub frag_writes_stencil_ref: bool,
}

impl RbFsOutputCntl0 {
    pub const fn encode(self) -> u32 {
        (self.dual_color_in_enable as u32)
            | (self.frag_writes_z as u32) << 1
            | (self.frag_writes_sample_mask as u32) << 2
            | (self.frag_writes_stencil_ref as u32) << 3
    }
}

/// `RB_SAMPLE_CNTL` / `RAS_SAMPLE_CNTL`.
#[inline]
pub const fn sample_cntl(per_samp_mode: bool) -> u32 {
    per_samp_mode as u32
}

/// `*_SAMPLE_CONFIG`.
pub const SAMPLE_CONFIG_LOCATION_ENABLE: u32 = 1;

/// Pack a programmable sample position into its byte of a
/// `*_SAMPLE_LOCATION` register: unsigned 0.4 fixed point x in the low
/// nibble, y in the high nibble.
#[inline]
pub fn sample_location_byte(x: f32, y: f32) -> u32 {
    let q = |v: f32| ((v * 16.0 + 0.5) as i64).clamp(0, 0xf) as u32;
    q(x) | q(y) << 4
}

/// `RB_DEPTH_CNTL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RbDepthCntl {
    pub z_enable: bool,
    pub z_write_enable: bool,
    pub zfunc: CompareFunc,
    pub z_clamp_enable: bool,
    pub z_test_enable: bool,
    pub z_bounds_enable: bool,
}

impl RbDepthCntl {
    pub const fn encode(self) -> u32 {
        (self.z_enable as u32)
            | (self.z_write_enable as u32) << 1
            | (self.zfunc as u32) << 2
            | (self.z_clamp_enable as u32) << 5
            | (self.z_test_enable as u32) << 6
            | (self.z_bounds_enable as u32) << 7
    }
}

/// `RB_STENCIL_CONTROL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RbStencilControl {
    pub enable: bool,
    pub enable_bf: bool,
    pub read: bool,
    pub func: CompareFunc,
    pub fail: StencilOp,
    pub zpass: StencilOp,
    pub zfail: StencilOp,
    pub func_bf: CompareFunc,
    pub fail_bf: StencilOp,
    pub zpass_bf: StencilOp,
    pub zfail_bf: StencilOp,
}

impl RbStencilControl {
    pub const fn encode(self) -> u32 {
        (self.enable as u32)
            | (self.enable_bf as u32) << 1
            | (self.read as u32) << 2
            | (self.func as u32) << 8
            | (self.fail as u32) << 11
            | (self.zpass as u32) << 14
            | (self.zfail as u32) << 17
            | (self.func_bf as u32) << 20
            | (self.fail_bf as u32) << 23
            | (self.zpass_bf as u32) << 26
            | (self.zfail_bf as u32) << 29
    }
}

/// Front/back byte pair for the stencil mask/ref registers.
#[inline]
pub const fn stencil_front_back(front: u8, back: u8) -> u32 {
    (front as u32) | (back as u32) << 8
}

/// `RB_MRT_CONTROL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RbMrtControl {
    pub blend: bool,
    /// Set alongside `blend` when the target format has an alpha channel.
    pub blend2: bool,
    pub rop_enable: bool,
    pub rop_code: RopCode,
    pub component_enable: u8,
}

impl RbMrtControl {
    pub const fn encode(self) -> u32 {
        (self.blend as u32)
            | (self.blend2 as u32) << 1
            | (self.rop_enable as u32) << 2
            | (self.rop_code as u32) << 3
            | (self.component_enable as u32 & 0xf) << 7
    }
}

/// `RB_MRT_BLEND_CONTROL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RbMrtBlendControl {
    pub rgb_src: BlendFactor,
    pub rgb_op: BlendOp,
    pub rgb_dst: BlendFactor,
    pub alpha_src: BlendFactor,
    pub alpha_op: BlendOp,
    pub alpha_dst: BlendFactor,
}

impl RbMrtBlendControl {
    pub const fn encode(self) -> u32 {
        (self.rgb_src as u32)
            | (self.rgb_op as u32) << 5
            | (self.rgb_dst as u32) << 8
            | (self.alpha_src as u32) << 16
            | (self.alpha_op as u32) << 21
            | (self.alpha_dst as u32) << 24
    }
}

/// `RB_BLEND_CNTL`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RbBlendCntl {
    /// Per-MRT blend/ROP enable mask.
    pub enable_blend: u32,
    pub independent_blend: bool,
    pub dual_color_in_enable: bool,
    pub alpha_to_coverage: bool,
    pub alpha_to_one: bool,
    pub sample_mask: u32,
}

impl RbBlendCntl {
    pub const fn encode(self) -> u32 {
        (self.enable_blend & 0xff)
            | (self.independent_blend as u32) << 8
            | (self.dual_color_in_enable as u32) << 9
            | (self.alpha_to_coverage as u32) << 10
            | (self.alpha_to_one as u32) << 11
            | (self.sample_mask & 0xffff) << 16
    }
}

/// `*_POLYGON_MODE`.
#[inline]
pub const fn polygon_mode(mode: PolygonMode) -> u32 {
    mode as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::REGID_NONE;

    #[test]
    fn stage_reg_strides() {
        assert_eq!(SP_STAGE_BASE + SP_STAGE_STRIDE, SP_HS_CTRL);
        assert_eq!(SP_STAGE_BASE + 4 * SP_STAGE_STRIDE, SP_FS_CTRL);
        assert_eq!(SP_STAGE_BASE + 5 * SP_STAGE_STRIDE, SP_CS_CTRL);
    }

    #[test]
    fn stage_ctrl_disjoint_fields() {
        let w = SpStageCtrl {
            thread_size: ThreadSize::Full,
            full_regs: 4,
            half_regs: 2,
            branch_stack: 3,
            merged_regs: true,
            pix_lod: false,
            fine_derivatives: false,
            varying: true,
            unk24: true,
        }
        .encode();
        assert_eq!(w & 1, 1);
        assert_eq!((w >> 1) & 0x3f, 2);
        assert_eq!((w >> 7) & 0x3f, 4);
        assert_eq!((w >> 13) & 0x3f, 3);
        assert_eq!((w >> 19) & 1, 1);
        assert_eq!((w >> 22) & 1, 1);
        assert_eq!((w >> 24) & 1, 1);
    }

    #[test]
    fn mrt_reg_addresses_interleave() {
        assert_eq!(rb_mrt_control(0), RB_MRT);
        assert_eq!(rb_mrt_blend_control(0), RB_MRT + 1);
        assert_eq!(rb_mrt_control(7), RB_MRT + 14);
        assert!(rb_mrt_blend_control(7) < RB_BLEND_CNTL);
    }

    #[test]
    fn prefetch_cntl_blob_bits() {
        assert_eq!(sp_fs_prefetch_cntl(0), 0x7fc0);
        assert_eq!(sp_fs_prefetch_cntl(2) & 0x7, 2);
    }

    #[test]
    fn line_width_fixed_point() {
        assert_eq!(line_half_width_fp(0.5), 8);
        assert_eq!(line_half_width_fp(1.0), 16);
        // Saturates at the field width.
        assert_eq!(line_half_width_fp(100.0), 0xff);
    }

    #[test]
    fn guardband_widens_as_viewport_shrinks() {
        // 32768 / 512 = 64, log2 = 6.
        assert_eq!(guardband_clip_adj(0.0, 512.0), 6);
        // Halving the scale buys one more doubling.
        assert_eq!(guardband_clip_adj(0.0, 256.0), 7);
        // Offset eats into the range before the divide.
        assert!(guardband_clip_adj(16384.0, 512.0) < guardband_clip_adj(0.0, 512.0));
        // Degenerate viewports clip at the hardware maximum.
        assert_eq!(guardband_clip_adj(0.0, 0.0), crate::limits::GUARDBAND_ADJ_MAX);
        assert_eq!(guardband_clip_adj(40000.0, 0.25), 0);
    }

    #[test]
    fn scissor_pair_masks_to_15_bits() {
        assert_eq!(scissor_xy(0x7fff, 0x7fff), 0x7fff_7fff);
        assert_eq!(scissor_xy(0xffff_ffff, 0), 0x7fff);
    }

    #[test]
    fn stencil_control_field_layout() {
        let w = RbStencilControl {
            enable: true,
            enable_bf: false,
            read: true,
            func: CompareFunc::Greater,
            fail: StencilOp::Keep,
            zpass: StencilOp::Replace,
            zfail: StencilOp::Invert,
            func_bf: CompareFunc::Never,
            fail_bf: StencilOp::Keep,
            zpass_bf: StencilOp::Keep,
            zfail_bf: StencilOp::Keep,
        }
        .encode();
        assert_eq!(w & 0x7, 0b101);
        assert_eq!((w >> 8) & 0x7, CompareFunc::Greater as u32);
        assert_eq!((w >> 14) & 0x7, StencilOp::Replace as u32);
        assert_eq!((w >> 17) & 0x7, StencilOp::Invert as u32);
    }

    #[test]
    fn sample_location_quantizes_to_nibbles() {
        assert_eq!(sample_location_byte(0.5, 0.5), 0x88);
        assert_eq!(sample_location_byte(0.0, 0.9375), 0xf0);
        assert_eq!(sample_location_byte(1.0, 0.0), 0x0f);
    }

    #[test]
    fn cs_control_packs_invalid_regids() {
        let w = SqCsControl0 {
            wgid_const: 4,
            unk1: REGID_NONE,
            unk2: REGID_NONE,
            local_id_regid: 8,
        }
        .encode();
        assert_eq!(w, 0x08fc_fc04);
    }
}
