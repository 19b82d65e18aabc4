//! Viewport transform and scissor encoding.

use slate_regs::limits::SCISSOR_COORD_MAX;
use slate_regs::regs::{self, guardband_clip_adj};

use crate::descriptor::{Rect2D, Viewport};
use crate::stream::CsSink;

/// Viewport transform, the matching viewport scissor, the guardband and
/// the depth clamp range. Negative heights flip the y axis; the implied
/// scissor is re-sorted so the rasterizer always sees top-left before
/// bottom-right.
pub(crate) fn emit_viewport(cs: &mut impl CsSink, vp: &Viewport) {
    let scales = [vp.width / 2.0, vp.height / 2.0, vp.max_depth - vp.min_depth];
    let offsets = [vp.x + scales[0], vp.y + scales[1], vp.min_depth];

    cs.pkt_reg(regs::RAS_CL_VPORT_XOFFSET, 6);
    cs.emit(offsets[0].to_bits());
    cs.emit(scales[0].to_bits());
    cs.emit(offsets[1].to_bits());
    cs.emit(scales[1].to_bits());
    cs.emit(offsets[2].to_bits());
    cs.emit(scales[2].to_bits());

    let min_x = vp.x as i32;
    let max_x = (vp.x + vp.width).ceil() as i32;
    let (min_y, mut max_y) = if vp.height >= 0.0 {
        (vp.y as i32, (vp.y + vp.height).ceil() as i32)
    } else {
        ((vp.y + vp.height) as i32, vp.y.ceil() as i32)
    };
    // Zero-height viewports are legal; give the scissor one row.
    if min_y == max_y {
        max_y += 1;
    }
    debug_assert!(min_x >= 0 && min_x < max_x);
    debug_assert!(min_y >= 0 && min_y < max_y);

    cs.pkt_reg(regs::RAS_SC_VIEWPORT_SCISSOR_TL, 2);
    cs.emit(regs::scissor_xy(min_x as u32, min_y as u32));
    cs.emit(regs::scissor_xy(max_x as u32 - 1, max_y as u32 - 1));

    cs.write_reg(
        regs::RAS_CL_GUARDBAND,
        regs::guardband_adj(
            guardband_clip_adj(offsets[0], scales[0]),
            guardband_clip_adj(offsets[1], scales[1]),
        ),
    );

    let z_min = vp.min_depth.min(vp.max_depth);
    let z_max = vp.min_depth.max(vp.max_depth);
    cs.pkt_reg(regs::RAS_CL_Z_CLAMP_MIN, 2);
    cs.emit(z_min.to_bits());
    cs.emit(z_max.to_bits());
    cs.pkt_reg(regs::RB_Z_CLAMP_MIN, 2);
    cs.emit(z_min.to_bits());
    cs.emit(z_max.to_bits());
}

/// Screen scissor. A zero-area rectangle collapses to a minimal box at
/// its clamped origin so the range never inverts.
pub(crate) fn emit_scissor(cs: &mut impl CsSink, scissor: &Rect2D) {
    let clamp = |v: i64| v.clamp(0, SCISSOR_COORD_MAX as i64) as u32;
    let tl_x = clamp(scissor.x as i64);
    let tl_y = clamp(scissor.y as i64);
    let br_x = clamp(scissor.x as i64 + scissor.width as i64 - 1).max(tl_x);
    let br_y = clamp(scissor.y as i64 + scissor.height as i64 - 1).max(tl_y);

    cs.pkt_reg(regs::RAS_SC_SCREEN_SCISSOR_TL, 2);
    cs.emit(regs::scissor_xy(tl_x, tl_y));
    cs.emit(regs::scissor_xy(br_x, br_y));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use slate_regs::pkt::pkt_reg_hdr;

    use super::*;
    use crate::stream::RecordSink;

    #[test]
    fn full_hd_viewport_block() {
        let vp = Viewport {
            x: 0.0,
            y: 0.0,
            width: 1920.0,
            height: 1080.0,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let mut cs = RecordSink::default();
        emit_viewport(&mut cs, &vp);

        assert_eq!(cs.0.len(), 18);
        assert_eq!(cs.0[0], pkt_reg_hdr(regs::RAS_CL_VPORT_XOFFSET, 6));
        assert_eq!(cs.0[1], 960.0f32.to_bits());
        assert_eq!(cs.0[2], 960.0f32.to_bits());
        assert_eq!(cs.0[3], 540.0f32.to_bits());
        assert_eq!(cs.0[4], 540.0f32.to_bits());
        assert_eq!(cs.0[5], 0.0f32.to_bits());
        assert_eq!(cs.0[6], 1.0f32.to_bits());
        // Viewport scissor covers the full surface inclusively.
        assert_eq!(cs.0[8], regs::scissor_xy(0, 0));
        assert_eq!(cs.0[9], regs::scissor_xy(1919, 1079));
        // (32768 - 960) / 960 and (32768 - 540) / 540, both log2 = 5.
        assert_eq!(cs.0[11], regs::guardband_adj(5, 5));
        // Depth clamp range mirrored into RAS and RB.
        assert_eq!(cs.0[13], 0);
        assert_eq!(cs.0[14], 1.0f32.to_bits());
        assert_eq!(cs.0[16], 0);
        assert_eq!(cs.0[17], 1.0f32.to_bits());
    }

    #[test]
    fn negative_height_flips_y() {
        let vp = Viewport {
            x: 0.0,
            y: 1080.0,
            width: 1920.0,
            height: -1080.0,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let mut cs = RecordSink::default();
        emit_viewport(&mut cs, &vp);

        // The y scale goes negative but the scissor stays sorted.
        assert_eq!(cs.0[3], 540.0f32.to_bits());
        assert_eq!(cs.0[4], (-540.0f32).to_bits());
        assert_eq!(cs.0[8], regs::scissor_xy(0, 0));
        assert_eq!(cs.0[9], regs::scissor_xy(1919, 1079));
    }

    #[test]
    fn inverted_depth_range_sorts_clamp() {
        let vp = Viewport {
            x: 0.0,
            y: 0.0,
            width: 16.0,
            height: 16.0,
            min_depth: 1.0,
            max_depth: 0.0,
        };
        let mut cs = RecordSink::default();
        emit_viewport(&mut cs, &vp);

        assert_eq!(cs.0[13], 0.0f32.to_bits());
        assert_eq!(cs.0[14], 1.0f32.to_bits());
    }

    #[test]
    fn zero_area_scissor_collapses_to_minimal_box() {
        let mut cs = RecordSink::default();
        emit_scissor(
            &mut cs,
            &Rect2D {
                x: 5,
                y: 7,
                width: 0,
                height: 4,
            },
        );
        assert_eq!(
            cs.0,
            vec![
                pkt_reg_hdr(regs::RAS_SC_SCREEN_SCISSOR_TL, 2),
                regs::scissor_xy(5, 7),
                regs::scissor_xy(5, 10),
            ]
        );

        let mut cs = RecordSink::default();
        emit_scissor(
            &mut cs,
            &Rect2D {
                x: 0,
                y: 0,
                width: 0,
                height: 0,
            },
        );
        assert_eq!(cs.0[1], regs::scissor_xy(0, 0));
        assert_eq!(cs.0[2], regs::scissor_xy(0, 0));
    }

    #[test]
    fn scissor_clamps_to_hardware_range() {
        let mut cs = RecordSink::default();
        emit_scissor(
            &mut cs,
            &Rect2D {
                x: -100,
                y: -3,
                width: 200_000,
                height: 8,
            },
        );
        assert_eq!(cs.0[1], regs::scissor_xy(0, 0));
        assert_eq!(cs.0[2], regs::scissor_xy(0x7fff, 4));
    }
}
