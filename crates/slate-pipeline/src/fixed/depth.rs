//! Depth/stencil test encoding.

use slate_regs::enums::CompareFunc;
use slate_regs::regs::{self, RbDepthCntl, RbStencilControl};

use crate::descriptor::{DepthBounds, DepthFormat, DepthStencilState};
use crate::stream::CsSink;

fn depth_cntl(ds: &DepthStencilState, depth_clamp: bool) -> u32 {
    let bounds = ds.depth_bounds.is_some();
    RbDepthCntl {
        z_enable: ds.depth_test,
        z_write_enable: ds.depth_test && ds.depth_write,
        zfunc: if ds.depth_test {
            ds.depth_compare
        } else {
            CompareFunc::Never
        },
        z_clamp_enable: ds.depth_test && depth_clamp,
        // The bounds test runs through the z unit even with the z test
        // itself disabled.
        z_test_enable: ds.depth_test || bounds,
        z_bounds_enable: bounds,
    }
    .encode()
}

fn stencil_control(ds: &DepthStencilState) -> u32 {
    if !ds.stencil_test {
        return 0;
    }
    RbStencilControl {
        enable: true,
        enable_bf: true,
        read: true,
        func: ds.front.compare,
        fail: ds.front.fail,
        zpass: ds.front.pass,
        zfail: ds.front.depth_fail,
        func_bf: ds.back.compare,
        fail_bf: ds.back.fail,
        zpass_bf: ds.back.pass,
        zfail_bf: ds.back.depth_fail,
    }
    .encode()
}

/// Baked depth/stencil block. A stencil-only attachment keeps the
/// stencil unit live but runs the depth half fully disabled.
pub(crate) fn emit_depth_stencil(
    cs: &mut impl CsSink,
    ds: &DepthStencilState,
    depth_clamp: bool,
    format: Option<DepthFormat>,
) {
    cs.write_reg(regs::RB_ALPHA_CONTROL, 0);

    let depth = if format == Some(DepthFormat::S8Uint) {
        depth_cntl(&DepthStencilState::default(), depth_clamp)
    } else {
        depth_cntl(ds, depth_clamp)
    };
    cs.write_reg(regs::RB_DEPTH_CNTL, depth);
    cs.write_reg(regs::RB_STENCIL_CONTROL, stencil_control(ds));
}

pub(crate) fn emit_depth_bounds(cs: &mut impl CsSink, bounds: DepthBounds) {
    cs.pkt_reg(regs::RB_Z_BOUNDS_MIN, 2);
    cs.emit(bounds.min.to_bits());
    cs.emit(bounds.max.to_bits());
}

pub(crate) fn emit_stencil_compare_mask(cs: &mut impl CsSink, front: u32, back: u32) {
    cs.write_reg(
        regs::RB_STENCIL_MASK,
        regs::stencil_front_back(front as u8, back as u8),
    );
}

pub(crate) fn emit_stencil_write_mask(cs: &mut impl CsSink, front: u32, back: u32) {
    cs.write_reg(
        regs::RB_STENCIL_WRITE_MASK,
        regs::stencil_front_back(front as u8, back as u8),
    );
}

pub(crate) fn emit_stencil_reference(cs: &mut impl CsSink, front: u32, back: u32) {
    cs.write_reg(
        regs::RB_STENCIL_REF,
        regs::stencil_front_back(front as u8, back as u8),
    );
}
