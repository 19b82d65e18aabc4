//! Per-target blending, raster ops and the shared blend-control words.

use slate_regs::enums::{BlendFactor, RopCode};
use slate_regs::regs::{self, RbBlendCntl, RbMrtBlendControl, RbMrtControl, SpBlendCntl};

use crate::descriptor::{AttachmentSet, BlendAttachment, BlendState, MultisampleState};
use crate::stream::CsSink;

fn is_dual_src(factor: BlendFactor) -> bool {
    matches!(
        factor,
        BlendFactor::Src1
            | BlendFactor::OneMinusSrc1
            | BlendFactor::Src1Alpha
            | BlendFactor::OneMinusSrc1Alpha
    )
}

/// Whether any attachment sources the second fragment color. Dual-source
/// blending claims an extra shader output slot, so the program encoder
/// needs this before any blend state is emitted.
pub(crate) fn uses_dual_src(blend: &BlendState) -> bool {
    blend.attachments.iter().any(|att| {
        is_dual_src(att.src_color)
            || is_dual_src(att.dst_color)
            || is_dual_src(att.src_alpha)
            || is_dual_src(att.dst_alpha)
    })
}

/// Alpha-less targets read destination alpha as constant one.
fn factor_no_dst_alpha(factor: BlendFactor) -> BlendFactor {
    match factor {
        BlendFactor::DstAlpha => BlendFactor::One,
        BlendFactor::OneMinusDstAlpha => BlendFactor::Zero,
        other => other,
    }
}

fn mrt_control(att: &BlendAttachment, rop: Option<RopCode>, is_int: bool, has_alpha: bool) -> u32 {
    if is_int {
        // Integer targets ignore both blending and logic ops.
        return RbMrtControl {
            blend: false,
            blend2: false,
            rop_enable: false,
            rop_code: RopCode::Copy,
            component_enable: att.write_mask,
        }
        .encode();
    }
    RbMrtControl {
        blend: att.blend,
        blend2: att.blend && has_alpha,
        rop_enable: rop.is_some(),
        rop_code: rop.unwrap_or(RopCode::Clear),
        component_enable: att.write_mask,
    }
    .encode()
}

fn mrt_blend_control(att: &BlendAttachment, has_alpha: bool) -> u32 {
    let (rgb_src, rgb_dst) = if has_alpha {
        (att.src_color, att.dst_color)
    } else {
        (
            factor_no_dst_alpha(att.src_color),
            factor_no_dst_alpha(att.dst_color),
        )
    };
    RbMrtBlendControl {
        rgb_src,
        rgb_op: att.color_op,
        rgb_dst,
        alpha_src: att.src_alpha,
        alpha_op: att.alpha_op,
        alpha_dst: att.dst_alpha,
    }
    .encode()
}

/// Control/blend-control pair for every attachment slot. Returns the
/// mask of targets that read the destination, which later gates the
/// global blend enables.
pub(crate) fn emit_mrt_controls(
    cs: &mut impl CsSink,
    blend: &BlendState,
    attachments: &AttachmentSet,
) -> u32 {
    let rop = blend.logic_op.map(|op| op.rop());
    let rop_reads_dst = blend.logic_op.map_or(false, |op| op.reads_dst());

    let mut enable_mask = 0u32;
    for (i, att) in blend.attachments.iter().enumerate() {
        let format = attachments.colors.get(i).copied().flatten();
        let (control, blend_control) = match format {
            None => (0, 0),
            Some(format) => {
                if att.blend || rop_reads_dst {
                    enable_mask |= 1 << i;
                }
                (
                    mrt_control(att, rop, format.is_int(), format.has_alpha()),
                    mrt_blend_control(att, format.has_alpha()),
                )
            }
        };
        cs.pkt_reg(regs::rb_mrt_control(i as u32), 2);
        cs.emit(control);
        cs.emit(blend_control);
    }
    enable_mask
}

/// The two global blend-control registers shared by all targets.
pub(crate) fn emit_blend_control(
    cs: &mut impl CsSink,
    enable_mask: u32,
    dual_src: bool,
    msaa: &MultisampleState,
) {
    let sample_mask = msaa
        .sample_mask
        .map_or((1 << msaa.samples) - 1, |mask| mask & 0xffff);

    cs.write_reg(
        regs::SP_BLEND_CNTL,
        SpBlendCntl {
            enabled: enable_mask != 0,
            dual_color_in_enable: dual_src,
            alpha_to_coverage: msaa.alpha_to_coverage,
            unk8: true,
        }
        .encode(),
    );
    cs.write_reg(
        regs::RB_BLEND_CNTL,
        RbBlendCntl {
            enable_blend: enable_mask,
            independent_blend: true,
            dual_color_in_enable: dual_src,
            alpha_to_coverage: msaa.alpha_to_coverage,
            alpha_to_one: msaa.alpha_to_one,
            sample_mask,
        }
        .encode(),
    );
}

pub(crate) fn emit_blend_constants(cs: &mut impl CsSink, constants: [f32; 4]) {
    cs.pkt_reg(regs::RB_BLEND_RED_F32, 4);
    for value in constants {
        cs.emit(value.to_bits());
    }
}
