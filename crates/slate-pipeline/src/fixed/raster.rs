//! Rasterizer setup: clipping, polygon mode, culling, line width and
//! depth bias.

use slate_regs::regs::{self, RasClCntl, RasSuCntl};

use crate::descriptor::{CullMode, DepthBias, FrontFace, RasterizationState};
use crate::stream::CsSink;

/// Hardware limits of the point sprite rasterizer, 12.4 fixed point.
const POINT_SIZE_MIN: f32 = 1.0 / 16.0;
const POINT_SIZE_MAX: f32 = 4092.0;

/// The per-pipeline rasterizer block: clip control, polygon modes for
/// both units that replicate them, and the fixed point-size window.
pub(crate) fn emit_rasterizer(cs: &mut impl CsSink, rast: &RasterizationState) {
    // An explicit clip override wins; otherwise clamping implies
    // unclipped z.
    let clip_disable = rast.depth_clip.map_or(rast.depth_clamp, |clip| !clip);

    cs.write_reg(
        regs::RAS_CL_CNTL,
        RasClCntl {
            znear_clip_disable: clip_disable,
            zfar_clip_disable: clip_disable,
            unk5: rast.depth_clamp,
            zero_gb_scale_z: true,
            vp_clip_code_ignore: true,
        }
        .encode(),
    );

    cs.write_reg(regs::VC_POLYGON_MODE, regs::polygon_mode(rast.polygon_mode));
    cs.write_reg(regs::PA_POLYGON_MODE, regs::polygon_mode(rast.polygon_mode));

    cs.pkt_reg(regs::RAS_SU_POINT_MINMAX, 2);
    cs.emit(regs::ras_su_point_minmax(POINT_SIZE_MIN, POINT_SIZE_MAX));
    cs.emit(regs::point_size_fp(1.0));
}

/// `RAS_SU_CNTL` base word, retained on the pipeline so the line width
/// can be folded in later without re-deriving cull state.
pub(crate) fn ras_su_cntl(rast: &RasterizationState, samples: u32) -> RasSuCntl {
    RasSuCntl {
        cull_front: rast.cull.contains(CullMode::FRONT),
        cull_back: rast.cull.contains(CullMode::BACK),
        front_cw: rast.front_face == FrontFace::Clockwise,
        line_half_width_fp: 0,
        poly_offset: rast.depth_bias.is_some(),
        msaa_enable: samples > 1,
    }
}

/// `RAS_SU_CNTL` with the line half-width folded into the base word.
pub(crate) fn emit_line_width(cs: &mut impl CsSink, base: RasSuCntl, line_width: f32) {
    debug_assert_eq!(base.line_half_width_fp, 0);
    let mut cntl = base;
    cntl.line_half_width_fp = regs::line_half_width_fp(line_width / 2.0);
    cs.write_reg(regs::RAS_SU_CNTL, cntl.encode());
}

/// Polygon-offset triple: slope scale, constant offset, clamp.
pub(crate) fn emit_depth_bias(cs: &mut impl CsSink, bias: &DepthBias) {
    cs.pkt_reg(regs::RAS_SU_POLY_OFFSET_SCALE, 3);
    cs.emit(bias.slope.to_bits());
    cs.emit(bias.constant.to_bits());
    cs.emit(bias.clamp.to_bits());
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use slate_regs::enums::PolygonMode;
    use slate_regs::pkt::pkt_reg_hdr;

    use super::*;
    use crate::stream::RecordSink;

    #[test]
    fn rasterizer_block_layout() {
        let mut cs = RecordSink::default();
        emit_rasterizer(&mut cs, &RasterizationState::default());

        assert_eq!(cs.0.len(), 9);
        // Defaults clip z and keep only the always-on bits.
        assert_eq!(cs.0[1], 0xc0);
        // Both polygon-mode copies agree.
        assert_eq!(cs.0[2], pkt_reg_hdr(regs::VC_POLYGON_MODE, 1));
        assert_eq!(cs.0[3], regs::polygon_mode(PolygonMode::Fill));
        assert_eq!(cs.0[4], pkt_reg_hdr(regs::PA_POLYGON_MODE, 1));
        assert_eq!(cs.0[5], cs.0[3]);
        assert_eq!(cs.0[6], pkt_reg_hdr(regs::RAS_SU_POINT_MINMAX, 2));
        assert_eq!(cs.0[7], regs::ras_su_point_minmax(1.0 / 16.0, 4092.0));
        assert_eq!(cs.0[8], regs::point_size_fp(1.0));
    }

    #[test]
    fn explicit_depth_clip_beats_clamp() {
        let clamped = RasterizationState {
            depth_clamp: true,
            ..RasterizationState::default()
        };
        let mut cs = RecordSink::default();
        emit_rasterizer(&mut cs, &clamped);
        // Clamp without an override disables both z clips.
        assert_eq!(cs.0[1] & 0x3, 0x3);
        assert_eq!(cs.0[1] & 1 << 5, 1 << 5);

        let overridden = RasterizationState {
            depth_clip: Some(true),
            ..clamped
        };
        let mut cs = RecordSink::default();
        emit_rasterizer(&mut cs, &overridden);
        assert_eq!(cs.0[1] & 0x3, 0);
        assert_eq!(cs.0[1] & 1 << 5, 1 << 5);
    }

    #[test]
    fn line_width_folds_into_su_cntl() {
        let rast = RasterizationState {
            cull: CullMode::BACK,
            front_face: FrontFace::Clockwise,
            ..RasterizationState::default()
        };
        let base = ras_su_cntl(&rast, 4);

        let mut cs = RecordSink::default();
        emit_line_width(&mut cs, base, 2.0);

        let expected = RasSuCntl {
            cull_front: false,
            cull_back: true,
            front_cw: true,
            line_half_width_fp: 16,
            poly_offset: false,
            msaa_enable: true,
        };
        assert_eq!(cs.0, vec![pkt_reg_hdr(regs::RAS_SU_CNTL, 1), expected.encode()]);
    }

    #[test]
    fn depth_bias_payload_order() {
        let bias = DepthBias {
            constant: 2.0,
            clamp: 0.5,
            slope: 1.5,
        };
        let mut cs = RecordSink::default();
        emit_depth_bias(&mut cs, &bias);

        assert_eq!(
            cs.0,
            vec![
                pkt_reg_hdr(regs::RAS_SU_POLY_OFFSET_SCALE, 3),
                1.5f32.to_bits(),
                2.0f32.to_bits(),
                0.5f32.to_bits(),
            ]
        );
    }
}
