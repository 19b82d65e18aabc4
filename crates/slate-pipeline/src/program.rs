//! Stage-program encoders: per-stage shader configuration, the varying
//! linkage block, fragment input/output wiring, and the constant-file
//! parameters consumed by the tessellation and geometry stages.
//!
//! Everything here writes through [`CsSink`], so the same code drives the
//! sizing pass and the real emission pass.

use slate_regs::enums::{StateBlock, StateSrc, StateType, TessSpacing, TessOutput, ThreadSize, ZMode};
use slate_regs::limits::{MAX_RENDER_TARGETS, MAX_VARYING_COMPONENTS, WAVE_SIZE};
use slate_regs::pkt::{CpOpcode, LoadStateControl};
use slate_regs::regs::{
    self, FsInterpControl, PaOutCntl, PaPrimitiveCntl5, PaTessCntl, RbFsOutputCntl0,
    RbRenderControl1, SpFsOutputCntl0, SpFsPrefetchCmd, SpPrimitiveCntl, SpStageConfig,
    SpStageCtrl, SqCsControl0, SqInvalidateCmd, SqStageCntl, VcCntl, VcPack,
};
use slate_regs::{pack_regids, REGID_NONE};

use crate::error::PipelineError;
use crate::linkage::{link_varyings, varying_modes, SoProgram, VaryingMap, LOC_NONE};
use crate::shader::{GsOutput, ShaderVariant, Slot, Stage, Sysval, TessPrimitive};
use crate::stream::CsSink;

/// Register addresses for one stage's configuration block.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StageRegs {
    pub cntl: u16,
    pub ctrl: u16,
    pub config: u16,
    pub obj_start: u16,
}

/// Per-stage configuration addresses, derived from the stage stride once
/// and passed explicitly to the encoders.
#[derive(Debug)]
pub(crate) struct StageRegTable([StageRegs; Stage::COUNT]);

impl StageRegTable {
    pub(crate) fn new() -> Self {
        StageRegTable(std::array::from_fn(|i| {
            let base = regs::SP_STAGE_BASE + i as u16 * regs::SP_STAGE_STRIDE;
            StageRegs {
                cntl: regs::SQ_VS_CNTL + i as u16,
                ctrl: base,
                config: base + 1,
                obj_start: base + 3,
            }
        }))
    }

    pub(crate) fn stage(&self, stage: Stage) -> &StageRegs {
        &self.0[stage.index()]
    }
}

/// A resolved shader variant together with its upload address.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoundShader<'a> {
    pub variant: &'a ShaderVariant,
    pub iova: u64,
}

/// The graphics stages of one pipeline, bound for emission.
///
/// [`ProgramCtx::emit`] writes the whole stage-program block; the varying
/// map is produced by [`ProgramCtx::link`] up front because linking can
/// fail while emission cannot.
pub(crate) struct ProgramCtx<'a> {
    pub vs: BoundShader<'a>,
    pub binning_vs: BoundShader<'a>,
    pub hs: Option<BoundShader<'a>>,
    pub ds: Option<BoundShader<'a>>,
    pub gs: Option<BoundShader<'a>>,
    pub fs: BoundShader<'a>,
    pub patch_control_points: u32,
    /// Lower-left tessellation domain origin flips the evaluated winding.
    pub lower_left_origin: bool,
    pub s650: bool,
    pub mrt_count: u32,
    pub dual_src_blend: bool,
    pub render_components: u32,
    pub stencil_only: bool,
}

impl<'a> ProgramCtx<'a> {
    /// The vertex shader feeding this pass. The binning pass runs the
    /// position-only variant unless a geometry stage is bound; binning
    /// variants are not compiled for geometry pipelines.
    fn vertex_stage(&self, binning: bool) -> BoundShader<'a> {
        if binning && self.gs.is_none() {
            self.binning_vs
        } else {
            self.vs
        }
    }

    fn last_stage(&self, binning: bool) -> &'a ShaderVariant {
        if let Some(gs) = self.gs {
            gs.variant
        } else if let Some(ds) = self.ds {
            ds.variant
        } else {
            self.vertex_stage(binning).variant
        }
    }

    /// Link the last geometry-family stage against the fragment stage.
    /// The binning pass links without a fragment consumer, which keeps
    /// only the outputs stream-out still needs.
    pub(crate) fn link(&self, binning: bool) -> Result<VaryingMap, PipelineError> {
        let fs = if binning { None } else { Some(self.fs.variant) };
        link_varyings(self.last_stage(binning), fs)
    }

    /// Emit the full stage-program block for one pass.
    pub(crate) fn emit(
        &self,
        sink: &mut impl CsSink,
        table: &StageRegTable,
        map: &VaryingMap,
        binning: bool,
    ) {
        sink.write_reg(
            regs::SQ_INVALIDATE_CMD,
            SqInvalidateCmd {
                vs_state: true,
                hs_state: true,
                ds_state: true,
                gs_state: true,
                fs_state: true,
                gfx_resource: true,
                ..Default::default()
            }
            .encode(),
        );

        let vs_bound = self.vertex_stage(binning);
        let stages: [(Stage, Option<BoundShader<'a>>); 5] = [
            (Stage::Vertex, Some(vs_bound)),
            (Stage::TessControl, self.hs),
            (Stage::TessEval, self.ds),
            (Stage::Geometry, self.gs),
            (Stage::Fragment, if binning { None } else { Some(self.fs) }),
        ];
        for (stage, bound) in stages {
            emit_stage_config(sink, table, stage, bound);
        }

        sink.write_reg(regs::SP_HS_WAVE_INPUT_SIZE, 0);

        let vs = vs_bound.variant;
        let fs = if binning { None } else { Some(self.fs.variant) };

        self.emit_vpc(sink, vs, fs, map);
        emit_varying_modes(sink, fs);

        // The hardware still consumes the fragment wiring registers when
        // the stage is disabled; park them with an empty variant.
        let placeholder;
        let fs_io = match fs {
            Some(fs) => fs,
            None => {
                placeholder = ShaderVariant::empty(Stage::Fragment);
                &placeholder
            }
        };
        emit_fs_inputs(sink, fs_io);
        emit_fs_outputs(
            sink,
            fs_io,
            self.mrt_count,
            self.dual_src_blend,
            self.render_components,
            self.stencil_only,
        );

        if self.hs.is_some() || self.gs.is_some() {
            self.emit_geom_consts(sink, vs);
        }
    }

    /// Varying-cache routing plus the tessellation and geometry registers
    /// that depend on which stage feeds the rasterizer.
    fn emit_vpc(
        &self,
        sink: &mut impl CsSink,
        vs: &ShaderVariant,
        fs: Option<&ShaderVariant>,
        map: &VaryingMap,
    ) {
        let hs = self.hs.map(|b| b.variant);
        let ds = self.ds.map(|b| b.variant);
        let gs = self.gs.map(|b| b.variant);

        let last = match (gs, ds) {
            (Some(gs), _) => gs,
            (None, Some(ds)) => ds,
            (None, None) => vs,
        };
        let regs_for = last_stage_regs(last.stage);

        emit_stage_sysvals(sink, vs, hs, ds, gs, map.primid_passthru());

        sink.pkt_reg(regs::VC_VAR_DISABLE, 4);
        sink.emit_all(&map.var_disable);

        emit_stream_out(sink, map.so.as_ref());

        let cnt = map.cnt();
        sink.pkt_reg(regs_for.sp_out, ((cnt + 1) / 2) as u16);
        for pair in map.entries.chunks(2) {
            let a = &pair[0];
            let (b_regid, b_mask) = pair.get(1).map_or((0, 0), |b| (b.regid, b.compmask));
            sink.emit(regs::sp_out_pair(a.regid, a.compmask, b_regid, b_mask));
        }

        sink.pkt_reg(regs_for.sp_vc_dst, ((cnt + 3) / 4) as u16);
        for quad in map.entries.chunks(4) {
            let loc = |i: usize| quad.get(i).map_or(0, |e| e.loc);
            sink.emit(pack_regids(loc(0), loc(1), loc(2), loc(3)));
        }

        sink.write_reg(
            regs_for.pack,
            VcPack {
                position_loc: map.position_loc,
                psize_loc: map.psize_loc,
                stride_in_vc: map.max_loc as u8,
            }
            .encode(),
        );
        sink.write_reg(regs_for.clip_cntl, regs::VC_CLIP_CNTL_DISABLE_ALL);
        sink.write_reg(regs_for.cl_cntl, 0);

        let has_psize = map.psize_loc != LOC_NONE;
        let has_layer = map.layer_loc != LOC_NONE;
        let gs_primitive_id =
            gs.is_some_and(|gs| gs.sysval_regid(Sysval::PrimitiveId) != REGID_NONE);
        sink.write_reg(
            regs_for.out_cntl,
            PaOutCntl {
                stride_in_vc: map.max_loc,
                psize: has_psize,
                layer: has_layer,
                primitive_id: gs_primitive_id,
            }
            .encode(),
        );

        let flags_regid = gs.map_or(0, |gs| gs.output_regid(Slot::VertexFlags));
        sink.write_reg(
            regs_for.sp_primitive_cntl,
            SpPrimitiveCntl { out_count: cnt, flags_regid }.encode(),
        );

        sink.write_reg(regs_for.layer_cntl, regs::vc_layer_cntl(map.layer_loc));
        sink.write_reg(regs_for.cl_layer_cntl, has_layer as u32);

        sink.write_reg(regs::PA_PRIMID_PASSTHRU, map.primid_passthru() as u32);

        sink.write_reg(
            regs::VC_CNTL,
            VcCntl {
                num_nonpos_var: fs.map_or(0, |fs| fs.total_in),
                varying: fs.is_some_and(|fs| fs.total_in > 0),
                primid_loc: map.primid_loc,
                unk_loc: LOC_NONE,
            }
            .encode(),
        );

        let tess = hs.zip(ds).and_then(|(hs, ds)| hs.tess.map(|t| (hs, ds, t)));
        if let Some((hs, ds, hs_domain)) = tess {
            sink.write_reg(regs::PA_TESS_NUM_VERTEX, hs_domain.vertices_out);

            // Total attribute slots in an incoming patch.
            sink.write_reg(
                regs::PA_HS_INPUT_SIZE,
                self.patch_control_points * vs.output_size / 4,
            );

            let wave_input_size = if self.s650 {
                // Local memory per wave on the S650, counted in wave-sized
                // blocks of control-point attributes.
                let prims_per_wave = WAVE_SIZE / hs_domain.vertices_out.max(1);
                let total = vs.output_size * self.patch_control_points * prims_per_wave;
                (total + WAVE_SIZE - 1) / WAVE_SIZE
            } else {
                vs.output_size
            };
            sink.write_reg(regs::SP_HS_WAVE_INPUT_SIZE, wave_input_size);

            // Evaluation shaders converted from HLSL leave the domain on
            // the control stage instead.
            let domain = ds.tess.filter(|d| d.spacing.is_some()).unwrap_or(hs_domain);
            let output = if domain.point_mode {
                TessOutput::Points
            } else if domain.primitive == TessPrimitive::Isolines {
                TessOutput::Lines
            } else if domain.ccw != self.lower_left_origin {
                TessOutput::TrisCcw
            } else {
                TessOutput::TrisCw
            };
            sink.write_reg(
                regs::PA_TESS_CNTL,
                PaTessCntl {
                    spacing: domain.spacing.unwrap_or(TessSpacing::Equal),
                    output,
                }
                .encode(),
            );

            emit_link_map(sink, vs, hs);
            emit_link_map(sink, hs, ds);
        }

        if let Some(gs) = gs {
            let (vertices_out, invocations, output, stride_in_vc) = match gs.geometry {
                Some(meta) => {
                    emit_link_map(sink, ds.unwrap_or(vs), gs);
                    let output = match meta.output {
                        GsOutput::Points => TessOutput::Points,
                        GsOutput::LineStrip => TessOutput::Lines,
                        GsOutput::TriangleStrip => TessOutput::TrisCw,
                    };
                    // Per-primitive allocation in local memory, in vec4s.
                    let stride = meta.vertices_in * ((vs.output_size + 3) / 4);
                    (
                        meta.vertices_out.saturating_sub(1),
                        meta.invocations.saturating_sub(1),
                        output,
                        stride,
                    )
                }
                None => (3, 0, TessOutput::TrisCw, 0),
            };

            sink.write_reg(
                regs::PA_PRIMITIVE_CNTL_5,
                PaPrimitiveCntl5 {
                    gs_vertices_out: vertices_out,
                    gs_output: output,
                    gs_invocations: invocations,
                }
                .encode(),
            );
            sink.write_reg(regs::PA_PRIMITIVE_CNTL_3, 0);
            sink.write_reg(regs::VC_GS_PARAM, regs::VC_GS_PARAM_INIT);
            sink.write_reg(regs::PA_PRIMITIVE_CNTL_6, regs::pa_primitive_cntl_6(stride_in_vc));
            sink.write_reg(regs::PA_GS_PARAM, 0);
            sink.write_reg(regs::SP_GS_PRIM_SIZE, vs.output_size);
        }
    }

    /// Primitive-parameter constants for the tessellation and geometry
    /// stages: interstage strides in dwords, plus patch layout.
    fn emit_geom_consts(&self, sink: &mut impl CsSink, vs: &ShaderVariant) {
        let hs = self.hs.map(|b| b.variant);
        let ds = self.ds.map(|b| b.variant);
        let gs = self.gs.map(|b| b.variant);
        let gs_meta = gs.and_then(|gs| gs.geometry);

        let mut num_vertices = if hs.is_some() {
            self.patch_control_points
        } else {
            gs_meta.map_or(0, |m| m.vertices_in)
        };

        let vs_params = [vs.output_size * num_vertices * 4, vs.output_size * 4, 0, 0];
        emit_const(
            sink,
            CpOpcode::LoadStateGeom,
            vs.const_offsets.primitive_param,
            Stage::Vertex.shader_block(),
            &vs_params,
        );

        if let (Some(hs), Some(ds)) = (hs, ds) {
            let hs_params = [
                vs.output_size * num_vertices * 4,
                vs.output_size * 4,
                hs.output_size,
                self.patch_control_points,
            ];
            emit_const(
                sink,
                CpOpcode::LoadStateGeom,
                hs.const_offsets.primitive_param,
                Stage::TessControl.shader_block(),
                &hs_params,
            );

            if let Some(meta) = gs_meta {
                num_vertices = meta.vertices_in;
            }
            let ds_params = [
                ds.output_size * num_vertices * 4,
                ds.output_size * 4,
                hs.output_size,
                hs.tess.map_or(0, |t| t.vertices_out),
            ];
            emit_const(
                sink,
                CpOpcode::LoadStateGeom,
                ds.const_offsets.primitive_param,
                Stage::TessEval.shader_block(),
                &ds_params,
            );
        }

        if let Some(gs) = gs {
            let prev = ds.unwrap_or(vs);
            let gs_params = [prev.output_size * num_vertices * 4, prev.output_size * 4, 0, 0];
            emit_const(
                sink,
                CpOpcode::LoadStateGeom,
                gs.const_offsets.primitive_param,
                Stage::Geometry.shader_block(),
                &gs_params,
            );
        }
    }
}

/// Registers that move with whichever stage feeds the rasterizer.
struct LastStageRegs {
    sp_out: u16,
    sp_vc_dst: u16,
    pack: u16,
    clip_cntl: u16,
    cl_cntl: u16,
    out_cntl: u16,
    sp_primitive_cntl: u16,
    layer_cntl: u16,
    cl_layer_cntl: u16,
}

fn last_stage_regs(stage: Stage) -> LastStageRegs {
    match stage {
        Stage::TessEval => LastStageRegs {
            sp_out: regs::SP_DS_OUT,
            sp_vc_dst: regs::SP_DS_VC_DST,
            pack: regs::VC_DS_PACK,
            clip_cntl: regs::VC_DS_CLIP_CNTL,
            cl_cntl: regs::RAS_DS_CL_CNTL,
            out_cntl: regs::PA_DS_OUT_CNTL,
            sp_primitive_cntl: regs::SP_DS_PRIMITIVE_CNTL,
            layer_cntl: regs::VC_DS_LAYER_CNTL,
            cl_layer_cntl: regs::RAS_DS_LAYER_CNTL,
        },
        Stage::Geometry => LastStageRegs {
            sp_out: regs::SP_GS_OUT,
            sp_vc_dst: regs::SP_GS_VC_DST,
            pack: regs::VC_GS_PACK,
            clip_cntl: regs::VC_GS_CLIP_CNTL,
            cl_cntl: regs::RAS_GS_CL_CNTL,
            out_cntl: regs::PA_GS_OUT_CNTL,
            sp_primitive_cntl: regs::SP_GS_PRIMITIVE_CNTL,
            layer_cntl: regs::VC_GS_LAYER_CNTL,
            cl_layer_cntl: regs::RAS_GS_LAYER_CNTL,
        },
        _ => LastStageRegs {
            sp_out: regs::SP_VS_OUT,
            sp_vc_dst: regs::SP_VS_VC_DST,
            pack: regs::VC_VS_PACK,
            clip_cntl: regs::VC_VS_CLIP_CNTL,
            cl_cntl: regs::RAS_VS_CL_CNTL,
            out_cntl: regs::PA_VS_OUT_CNTL,
            sp_primitive_cntl: regs::SP_VS_PRIMITIVE_CNTL,
            layer_cntl: regs::VC_VS_LAYER_CNTL,
            cl_layer_cntl: regs::RAS_VS_LAYER_CNTL,
        },
    }
}

/// One stage's configuration block: control word, enable/config pair,
/// constant-file length, binary address, and the indirect instruction
/// load. Disabled stages park the config and cntl registers at zero.
pub(crate) fn emit_stage_config(
    sink: &mut impl CsSink,
    table: &StageRegTable,
    stage: Stage,
    bound: Option<BoundShader<'_>>,
) {
    let stage_regs = table.stage(stage);
    let Some(BoundShader { variant: xs, iova }) = bound else {
        sink.write_reg(stage_regs.config, 0);
        sink.write_reg(stage_regs.cntl, 0);
        return;
    };
    debug_assert_eq!(xs.stage, stage);
    // Instruction fetch requires 128-byte alignment.
    debug_assert_eq!(iova & 0x7f, 0);

    let is_fs = stage == Stage::Fragment;
    let thread_size = if stage == Stage::Geometry {
        ThreadSize::Half
    } else {
        ThreadSize::Full
    };

    sink.write_reg(
        stage_regs.ctrl,
        SpStageCtrl {
            thread_size,
            full_regs: xs.full_regs,
            half_regs: xs.half_regs,
            branch_stack: xs.branch_stack,
            merged_regs: xs.merged_regs,
            pix_lod: xs.pix_lod,
            fine_derivatives: xs.fine_derivatives,
            varying: is_fs && xs.total_in > 0,
            unk24: is_fs,
        }
        .encode(),
    );

    sink.pkt_reg(stage_regs.config, 2);
    sink.emit(
        SpStageConfig {
            enabled: true,
            bindless: xs.bindless,
            tex_count: xs.tex_count,
            samp_count: xs.samp_count,
        }
        .encode(),
    );
    sink.emit(xs.instr_units());

    sink.write_reg(
        stage_regs.cntl,
        SqStageCntl { constlen: xs.constlen, enabled: true }.encode(),
    );

    sink.pkt_reg(stage_regs.obj_start, 2);
    sink.emit_qw(iova);

    sink.pkt_cmd(stage.load_op(), 3);
    sink.emit(
        LoadStateControl {
            dst_off: 0,
            ty: StateType::Shader,
            src: StateSrc::Indirect,
            block: stage.shader_block(),
            num_unit: xs.instr_units(),
        }
        .encode(),
    );
    sink.emit_qw(iova);

    emit_immediates(sink, stage, xs);
}

/// Immediate constants, clamped to the variant's constant-file length.
/// Short tails pad with zeroes up to the vec4 unit.
fn emit_immediates(sink: &mut impl CsSink, stage: Stage, xs: &ShaderVariant) {
    let base = xs.const_offsets.immediate;
    let size_vec4 = (xs.immediates.len() as u32 + 3) / 4;
    let size_vec4 = (size_vec4 + base).min(xs.constlen).saturating_sub(base);
    if size_vec4 == 0 {
        return;
    }

    sink.pkt_cmd(stage.load_op(), 3 + size_vec4 * 4);
    sink.emit(
        LoadStateControl {
            dst_off: base,
            ty: StateType::Consts,
            src: StateSrc::Direct,
            block: stage.shader_block(),
            num_unit: size_vec4,
        }
        .encode(),
    );
    sink.emit_qw(0);
    for i in 0..(size_vec4 * 4) as usize {
        sink.emit(xs.immediates.get(i).copied().unwrap_or(0));
    }
}

/// Compute stage block: state invalidate, stage configuration, dispatch
/// mode, and workgroup-id wiring.
pub(crate) fn emit_compute(
    sink: &mut impl CsSink,
    table: &StageRegTable,
    shader: BoundShader<'_>,
    s650: bool,
) {
    sink.write_reg(
        regs::SQ_INVALIDATE_CMD,
        SqInvalidateCmd {
            cs_state: true,
            cs_resource: true,
            ..Default::default()
        }
        .encode(),
    );

    emit_stage_config(sink, table, Stage::Compute, Some(shader));

    let mode = if s650 {
        regs::SP_CS_MODE_CNTL_INIT_S650
    } else {
        regs::SP_CS_MODE_CNTL_INIT
    };
    sink.write_reg(regs::SP_CS_MODE_CNTL, mode);

    let xs = shader.variant;
    sink.pkt_reg(regs::SQ_CS_CONTROL_0, 2);
    sink.emit(
        SqCsControl0 {
            wgid_const: xs.sysval_regid(Sysval::WorkGroupId),
            unk1: REGID_NONE,
            unk2: REGID_NONE,
            local_id_regid: xs.sysval_regid(Sysval::LocalInvocationId),
        }
        .encode(),
    );
    sink.emit(regs::SQ_CS_CONTROL_1_INIT);
}

/// The vertex-fetch sysval block. Register ids for ids the stages never
/// read park at the invalid register.
fn emit_stage_sysvals(
    sink: &mut impl CsSink,
    vs: &ShaderVariant,
    hs: Option<&ShaderVariant>,
    ds: Option<&ShaderVariant>,
    gs: Option<&ShaderVariant>,
    primid_passthru: bool,
) {
    let vertex_id = vs.sysval_regid(Sysval::VertexId);
    let instance_id = vs.sysval_regid(Sysval::InstanceId);
    let hs_patch_id = hs.map_or(REGID_NONE, |hs| hs.sysval_regid(Sysval::PatchId));
    let hs_invocation = hs.map_or(REGID_NONE, |hs| hs.sysval_regid(Sysval::InvocationId));
    let ds_patch_id = ds.map_or(REGID_NONE, |ds| ds.sysval_regid(Sysval::PatchId));
    let gs_primitive_id = gs.map_or(REGID_NONE, |gs| gs.sysval_regid(Sysval::PrimitiveId));
    let gs_header = gs.map_or(REGID_NONE, |gs| gs.sysval_regid(Sysval::GsHeader));
    let tess_x = if hs.is_some() {
        ds.map_or(REGID_NONE, |ds| ds.sysval_regid(Sysval::TessCoordX))
    } else {
        REGID_NONE
    };
    // The coordinate pair is allocated adjacently.
    let tess_y = if tess_x != REGID_NONE { tess_x + 1 } else { REGID_NONE };

    sink.pkt_reg(regs::VF_CONTROL_1, 6);
    sink.emit(pack_regids(vertex_id, instance_id, gs_primitive_id, REGID_NONE));
    sink.emit(pack_regids(hs_patch_id, hs_invocation, 0, 0));
    sink.emit(pack_regids(REGID_NONE, ds_patch_id, tess_x, tess_y));
    sink.emit(REGID_NONE as u32);
    sink.emit(pack_regids(gs_header, REGID_NONE, 0, 0));
    sink.emit(if primid_passthru {
        regs::VF_CONTROL_6_PRIMID_PASSTHRU
    } else {
        0
    });
}

/// Map one stage's packed output locations into the next stage's constant
/// file. Control and geometry stages address local memory in bytes, the
/// evaluation stage in dwords.
fn emit_link_map(sink: &mut impl CsSink, producer: &ShaderVariant, consumer: &ShaderVariant) {
    let factor = if consumer.stage == Stage::TessEval { 1 } else { 4 };

    let mut locs = [0u32; MAX_VARYING_COMPONENTS];
    let mut num_loc = 0u32;
    for input in &consumer.inputs {
        let Some(out) = producer.find_output(input.slot) else {
            continue;
        };
        locs[input.loc as usize] = out.loc as u32 * factor;
        num_loc = num_loc.max(input.loc as u32 + 1);
    }

    let base = consumer.const_offsets.primitive_map;
    let size_vec4 = ((num_loc + 3) / 4 + base)
        .min(consumer.constlen)
        .saturating_sub(base);
    if size_vec4 == 0 {
        return;
    }

    emit_const(
        sink,
        CpOpcode::LoadStateGeom,
        base,
        consumer.stage.shader_block(),
        &locs[..(size_vec4 * 4) as usize],
    );
}

/// Inline constant load in vec4 units.
fn emit_const(
    sink: &mut impl CsSink,
    op: CpOpcode,
    base: u32,
    block: StateBlock,
    dwords: &[u32],
) {
    debug_assert_eq!(dwords.len() % 4, 0);

    sink.pkt_cmd(op, 3 + dwords.len() as u32);
    sink.emit(
        LoadStateControl {
            dst_off: base,
            ty: StateType::Consts,
            src: StateSrc::Direct,
            block,
            num_unit: dwords.len() as u32 / 4,
        }
        .encode(),
    );
    sink.emit_qw(0);
    sink.emit_all(dwords);
}

/// Stream-out routing. Both arms go through the atomic register-bunch
/// packet: the enable write resets the capture program, so the whole
/// group must land together.
fn emit_stream_out(sink: &mut impl CsSink, so: Option<&SoProgram>) {
    let Some(so) = so else {
        sink.pkt_cmd(CpOpcode::RegBunch, 4);
        sink.emit(regs::VC_SO_CNTL as u32);
        sink.emit(0);
        sink.emit(regs::VC_SO_BUF_CNTL as u32);
        sink.emit(0);
        return;
    };

    sink.pkt_cmd(CpOpcode::RegBunch, 12 + 2 * so.prog.len() as u32);
    sink.emit(regs::VC_SO_BUF_CNTL as u32);
    sink.emit(so.buf_cntl.encode());
    for (i, ncomp) in so.ncomp.iter().enumerate() {
        sink.emit((regs::VC_SO_NCOMP_0 + i as u16) as u32);
        sink.emit(*ncomp);
    }
    sink.emit(regs::VC_SO_CNTL as u32);
    sink.emit(regs::VC_SO_CNTL_ENABLE);
    for word in &so.prog {
        sink.emit(regs::VC_SO_PROG as u32);
        sink.emit(*word);
    }
}

fn emit_varying_modes(sink: &mut impl CsSink, fs: Option<&ShaderVariant>) {
    let (interp, ps_repl) = varying_modes(fs);
    sink.pkt_reg(regs::VC_VARYING_INTERP, 8);
    sink.emit_all(&interp);
    sink.pkt_reg(regs::VC_VARYING_REPL, 8);
    sink.emit_all(&ps_repl);
}

/// Fragment-stage input wiring: sampler prefetch, sysval register ids,
/// and the interpolator controls shared between the rasterizer and the
/// render backend.
fn emit_fs_inputs(sink: &mut impl CsSink, fs: &ShaderVariant) {
    let meta = &fs.fragment;
    let sample_shading = meta.per_sample;
    let enable_varyings = fs.total_in > 0;

    let samp_id = fs.sysval_regid(Sysval::SampleId);
    let smask_in = fs.sysval_regid(Sysval::SampleMaskIn);
    let face = fs.sysval_regid(Sysval::FrontFace);
    let coord = fs.sysval_regid(Sysval::FragCoord);
    let zwcoord = if coord != REGID_NONE { coord + 2 } else { REGID_NONE };
    let ij_pixel = fs.sysval_regid(Sysval::BaryPerspPixel);
    let ij_centroid = fs.sysval_regid(Sysval::BaryPerspCentroid);
    let ij_sample = fs.sysval_regid(Sysval::BaryPerspSample);
    let ij_size = fs.sysval_regid(Sysval::BarySize);

    let prefetch = &meta.prefetch;
    if !prefetch.is_empty() {
        // Prefetch runs off the pixel barycentrics, which the compiler
        // pins to the first register.
        debug_assert_eq!(ij_pixel, 0);
    }
    sink.pkt_reg(regs::SP_FS_PREFETCH_CNTL, 1 + prefetch.len() as u16);
    sink.emit(regs::sp_fs_prefetch_cntl(prefetch.len() as u32));
    for p in prefetch {
        sink.emit(
            SpFsPrefetchCmd {
                src: p.src,
                samp_id: p.samp_id,
                tex_id: p.tex_id,
                dst_regid: p.dst_regid,
                write_mask: p.write_mask,
                cmd: p.cmd,
            }
            .encode(),
        );
    }

    sink.pkt_reg(regs::SQ_FS_CONTROL_1, 5);
    sink.emit(regs::SQ_FS_CONTROL_1_INIT);
    sink.emit(pack_regids(face, samp_id, smask_in, ij_size));
    sink.emit(pack_regids(ij_pixel, REGID_NONE, ij_centroid, REGID_NONE));
    sink.emit(pack_regids(coord, zwcoord, ij_sample, REGID_NONE));
    sink.emit(regs::SQ_FS_CONTROL_5_INIT);

    sink.write_reg(
        regs::SQ_FS_MODE,
        if enable_varyings {
            regs::SQ_FS_MODE_VARYINGS
        } else {
            regs::SQ_FS_MODE_EMPTY
        },
    );

    let mut need_size = face != REGID_NONE || meta.coord_compmask != 0;
    let mut need_size_persamp = false;
    if ij_size != REGID_NONE {
        if sample_shading {
            need_size_persamp = true;
        } else {
            need_size = true;
        }
    }

    let interp = FsInterpControl {
        ij_persp_pixel: ij_pixel != REGID_NONE,
        ij_persp_centroid: ij_centroid != REGID_NONE,
        ij_persp_sample: ij_sample != REGID_NONE,
        size: need_size,
        size_persamp: need_size_persamp,
        coord_mask: meta.coord_compmask,
    };
    sink.write_reg(regs::RAS_CNTL, interp.encode());

    sink.pkt_reg(regs::RB_RENDER_CONTROL0, 2);
    sink.emit(
        interp.encode()
            | if enable_varyings {
                regs::RB_RENDER_CONTROL0_UNK10
            } else {
                0
            },
    );
    sink.emit(
        RbRenderControl1 {
            sample_mask: smask_in != REGID_NONE,
            sample_id: samp_id != REGID_NONE,
            size: ij_size != REGID_NONE,
            faceness: face != REGID_NONE,
        }
        .encode(),
    );

    sink.write_reg(regs::RB_SAMPLE_CNTL, regs::sample_cntl(sample_shading));
    sink.write_reg(
        regs::RAS_SC_RAST_CNTL,
        if sample_shading {
            regs::RAS_SC_RAST_CNTL_PER_SAMPLE
        } else {
            0
        },
    );
    sink.write_reg(regs::RAS_SAMPLE_CNTL, regs::sample_cntl(sample_shading));
}

/// Fragment-stage output wiring and the early/late depth-test decision.
fn emit_fs_outputs(
    sink: &mut impl CsSink,
    fs: &ShaderVariant,
    mrt_count: u32,
    dual_src_blend: bool,
    render_components: u32,
    stencil_only: bool,
) {
    let meta = &fs.fragment;
    let depth_regid = fs.output_regid(Slot::Depth);
    let sample_mask_regid = fs.output_regid(Slot::SampleMask);
    let stencil_ref_regid = fs.output_regid(Slot::StencilRef);

    sink.pkt_reg(regs::SP_FS_OUTPUT_CNTL0, 2);
    sink.emit(
        SpFsOutputCntl0 {
            dual_color_in_enable: dual_src_blend,
            depth_regid,
            sample_mask_regid,
            stencil_ref_regid,
        }
        .encode(),
    );
    sink.emit(regs::fs_output_cntl1(mrt_count));

    // Output precision is not tracked per slot; everything emits full.
    sink.pkt_reg(regs::SP_FS_OUTPUT_REG, MAX_RENDER_TARGETS as u16);
    for i in 0..MAX_RENDER_TARGETS as u8 {
        let slot = if meta.color0_broadcast {
            Slot::Color(0)
        } else {
            Slot::Color(i)
        };
        sink.emit(regs::sp_fs_output_reg(fs.output_regid(slot), false));
    }

    sink.write_reg(regs::SP_FS_RENDER_COMPONENTS, render_components);

    sink.pkt_reg(regs::RB_FS_OUTPUT_CNTL0, 2);
    sink.emit(
        RbFsOutputCntl0 {
            dual_color_in_enable: dual_src_blend,
            frag_writes_z: meta.writes_depth,
            frag_writes_sample_mask: meta.writes_sample_mask,
            frag_writes_stencil_ref: meta.writes_stencil_ref,
        }
        .encode(),
    );
    sink.emit(regs::fs_output_cntl1(mrt_count));

    sink.write_reg(regs::RB_RENDER_COMPONENTS, render_components);

    // Anything that can change coverage or depth output after shading
    // forces the late test; stencil-only targets also feed back.
    let z_mode = if meta.no_early_z
        || meta.has_kill
        || meta.writes_depth
        || meta.writes_stencil_ref
        || stencil_only
    {
        ZMode::Late
    } else {
        ZMode::Early
    };
    sink.write_reg(regs::RAS_SU_DEPTH_PLANE_CNTL, regs::depth_plane_cntl(z_mode));
    sink.write_reg(regs::RB_DEPTH_PLANE_CNTL, regs::depth_plane_cntl(z_mode));
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use slate_regs::limits::INSTR_UNIT_DWORDS;
    use slate_regs::pkt::{decode_hdr, pkt_cmd_hdr, pkt_reg_hdr, PktHdr};
    use slate_regs::regs::VcSoBufCntl;

    use super::*;
    use crate::linkage::LinkedVarying;
    use crate::shader::{GeometryMeta, IoSlot, TessDomain, TexPrefetch};
    use crate::stream::RecordSink;

    const IOVA: u64 = 0x1_0000_0180;

    fn variant(stage: Stage) -> ShaderVariant {
        let mut v = ShaderVariant::empty(stage);
        v.code = vec![0; (INSTR_UNIT_DWORDS * 2) as usize];
        v.constlen = 8;
        v.full_regs = 4;
        v.half_regs = 1;
        v.branch_stack = 2;
        v
    }

    fn output(slot: Slot, regid: u8, compmask: u8) -> IoSlot {
        IoSlot { slot, regid, compmask, loc: 0, flat: false }
    }

    fn bound(v: &ShaderVariant, iova: u64) -> BoundShader<'_> {
        BoundShader { variant: v, iova }
    }

    fn graphics_ctx<'a>(
        vs: &'a ShaderVariant,
        binning_vs: &'a ShaderVariant,
        fs: &'a ShaderVariant,
    ) -> ProgramCtx<'a> {
        ProgramCtx {
            vs: bound(vs, 0x1000),
            binning_vs: bound(binning_vs, 0x2000),
            hs: None,
            ds: None,
            gs: None,
            fs: bound(fs, 0x3000),
            patch_control_points: 0,
            lower_left_origin: false,
            s650: false,
            mrt_count: 1,
            dual_src_blend: false,
            render_components: 0xf,
            stencil_only: false,
        }
    }

    /// Flattens register packets into `(reg, value)` writes and panics on
    /// any malformed header, so walking doubles as a structural check.
    fn reg_writes(words: &[u32]) -> Vec<(u16, u32)> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < words.len() {
            match decode_hdr(words[i]) {
                Some(PktHdr::Reg { reg, count }) => {
                    for k in 0..count {
                        out.push((reg + k, words[i + 1 + k as usize]));
                    }
                    i += 1 + count as usize;
                }
                Some(PktHdr::Cmd { count, .. }) => i += 1 + count as usize,
                None => panic!("bad packet header at {i}: {:#x}", words[i]),
            }
        }
        out
    }

    fn reg_value(words: &[u32], reg: u16) -> u32 {
        reg_writes(words)
            .into_iter()
            .rev()
            .find(|(r, _)| *r == reg)
            .map(|(_, v)| v)
            .expect("register not written")
    }

    fn cmd_packets(words: &[u32]) -> Vec<(CpOpcode, Vec<u32>)> {
        let mut out = Vec::new();
        let mut i = 0;
        while i < words.len() {
            match decode_hdr(words[i]) {
                Some(PktHdr::Reg { count, .. }) => i += 1 + count as usize,
                Some(PktHdr::Cmd { op, count }) => {
                    out.push((op, words[i + 1..i + 1 + count as usize].to_vec()));
                    i += 1 + count as usize;
                }
                None => panic!("bad packet header at {i}: {:#x}", words[i]),
            }
        }
        out
    }

    #[test]
    fn stage_reg_table_covers_all_stages() {
        let table = StageRegTable::new();
        assert_eq!(table.stage(Stage::Vertex).ctrl, regs::SP_VS_CTRL);
        assert_eq!(table.stage(Stage::Vertex).cntl, regs::SQ_VS_CNTL);
        assert_eq!(table.stage(Stage::TessControl).config, regs::SP_HS_CONFIG);
        assert_eq!(table.stage(Stage::TessEval).obj_start, regs::SP_DS_OBJ_START);
        assert_eq!(table.stage(Stage::Geometry).ctrl, regs::SP_GS_CTRL);
        assert_eq!(table.stage(Stage::Fragment).config, regs::SP_FS_CONFIG);
        assert_eq!(table.stage(Stage::Compute).cntl, regs::SQ_CS_CNTL);
        assert_eq!(table.stage(Stage::Compute).obj_start, regs::SP_CS_OBJ_START);
    }

    #[test]
    fn disabled_stage_parks_config_and_cntl() {
        let table = StageRegTable::new();
        let mut sink = RecordSink::default();
        emit_stage_config(&mut sink, &table, Stage::TessControl, None);
        assert_eq!(
            sink.0,
            vec![
                pkt_reg_hdr(regs::SP_HS_CONFIG, 1),
                0,
                pkt_reg_hdr(regs::SQ_HS_CNTL, 1),
                0,
            ]
        );
    }

    #[test]
    fn enabled_stage_emits_ctrl_config_and_binary_load() {
        let table = StageRegTable::new();
        let vs = variant(Stage::Vertex);
        let mut sink = RecordSink::default();
        emit_stage_config(&mut sink, &table, Stage::Vertex, Some(bound(&vs, IOVA)));

        let ctrl = SpStageCtrl {
            thread_size: ThreadSize::Full,
            full_regs: 4,
            half_regs: 1,
            branch_stack: 2,
            merged_regs: false,
            pix_lod: false,
            fine_derivatives: false,
            varying: false,
            unk24: false,
        }
        .encode();
        let config = SpStageConfig { enabled: true, ..Default::default() }.encode();
        let load = LoadStateControl {
            dst_off: 0,
            ty: StateType::Shader,
            src: StateSrc::Indirect,
            block: StateBlock::VsShader,
            num_unit: 2,
        }
        .encode();
        assert_eq!(
            sink.0,
            vec![
                pkt_reg_hdr(regs::SP_VS_CTRL, 1),
                ctrl,
                pkt_reg_hdr(regs::SP_VS_CONFIG, 2),
                config,
                2,
                pkt_reg_hdr(regs::SQ_VS_CNTL, 1),
                SqStageCntl { constlen: 8, enabled: true }.encode(),
                pkt_reg_hdr(regs::SP_VS_OBJ_START, 2),
                IOVA as u32,
                (IOVA >> 32) as u32,
                pkt_cmd_hdr(CpOpcode::LoadStateGeom, 3),
                load,
                IOVA as u32,
                (IOVA >> 32) as u32,
            ]
        );
    }

    #[test]
    fn short_immediates_pad_to_a_vec4() {
        let mut vs = variant(Stage::Vertex);
        vs.immediates = vec![10, 20, 30];

        let mut sink = RecordSink::default();
        emit_immediates(&mut sink, Stage::Vertex, &vs);

        let load = LoadStateControl {
            dst_off: 0,
            ty: StateType::Consts,
            src: StateSrc::Direct,
            block: StateBlock::VsShader,
            num_unit: 1,
        }
        .encode();
        assert_eq!(
            sink.0,
            vec![pkt_cmd_hdr(CpOpcode::LoadStateGeom, 7), load, 0, 0, 10, 20, 30, 0]
        );
    }

    #[test]
    fn immediates_clamp_to_the_constant_file() {
        let mut vs = variant(Stage::Vertex);
        vs.constlen = 2;
        vs.const_offsets.immediate = 1;
        vs.immediates = vec![10, 20, 30, 40, 50];

        let mut sink = RecordSink::default();
        emit_immediates(&mut sink, Stage::Vertex, &vs);

        let load = LoadStateControl {
            dst_off: 1,
            ty: StateType::Consts,
            src: StateSrc::Direct,
            block: StateBlock::VsShader,
            num_unit: 1,
        }
        .encode();
        assert_eq!(
            sink.0,
            vec![pkt_cmd_hdr(CpOpcode::LoadStateGeom, 7), load, 0, 0, 10, 20, 30, 40]
        );
    }

    #[test]
    fn immediates_past_the_constant_file_are_dropped() {
        let mut vs = variant(Stage::Vertex);
        vs.constlen = 4;
        vs.const_offsets.immediate = 4;
        vs.immediates = vec![1];

        let mut sink = RecordSink::default();
        emit_immediates(&mut sink, Stage::Vertex, &vs);
        assert!(sink.0.is_empty());
    }

    #[test]
    fn stage_sysvals_cover_the_fetch_block() {
        let mut vs = variant(Stage::Vertex);
        vs.sysvals.insert(Sysval::VertexId, 4);
        vs.sysvals.insert(Sysval::InstanceId, 8);
        let mut hs = variant(Stage::TessControl);
        hs.sysvals.insert(Sysval::PatchId, 12);
        hs.sysvals.insert(Sysval::InvocationId, 13);
        let mut ds = variant(Stage::TessEval);
        ds.sysvals.insert(Sysval::PatchId, 16);
        ds.sysvals.insert(Sysval::TessCoordX, 0x20);

        let mut sink = RecordSink::default();
        emit_stage_sysvals(&mut sink, &vs, Some(&hs), Some(&ds), None, false);

        assert_eq!(
            sink.0,
            vec![
                pkt_reg_hdr(regs::VF_CONTROL_1, 6),
                pack_regids(4, 8, REGID_NONE, REGID_NONE),
                pack_regids(12, 13, 0, 0),
                pack_regids(REGID_NONE, 16, 0x20, 0x21),
                REGID_NONE as u32,
                pack_regids(REGID_NONE, REGID_NONE, 0, 0),
                0,
            ]
        );
    }

    #[test]
    fn stream_out_disable_is_a_reg_bunch() {
        let mut sink = RecordSink::default();
        emit_stream_out(&mut sink, None);
        assert_eq!(
            sink.0,
            vec![
                pkt_cmd_hdr(CpOpcode::RegBunch, 4),
                regs::VC_SO_CNTL as u32,
                0,
                regs::VC_SO_BUF_CNTL as u32,
                0,
            ]
        );
    }

    #[test]
    fn stream_out_program_interleaves_registers_and_words() {
        let so = SoProgram {
            buf_cntl: VcSoBufCntl { enable: true, buf: [true, false, false, false] },
            ncomp: [4, 0, 0, 0],
            prog: vec![0x11, 0x22],
        };
        let mut sink = RecordSink::default();
        emit_stream_out(&mut sink, Some(&so));

        let mut expect = vec![pkt_cmd_hdr(CpOpcode::RegBunch, 16)];
        expect.extend([regs::VC_SO_BUF_CNTL as u32, so.buf_cntl.encode()]);
        for i in 0..4u16 {
            expect.extend([(regs::VC_SO_NCOMP_0 + i) as u32, so.ncomp[i as usize]]);
        }
        expect.extend([regs::VC_SO_CNTL as u32, regs::VC_SO_CNTL_ENABLE]);
        expect.extend([regs::VC_SO_PROG as u32, 0x11, regs::VC_SO_PROG as u32, 0x22]);
        assert_eq!(sink.0, expect);
    }

    #[test]
    fn vpc_maps_pack_pairs_and_quads() {
        let vs = variant(Stage::Vertex);
        let fs = variant(Stage::Fragment);
        let ctx = graphics_ctx(&vs, &vs, &fs);
        let map = VaryingMap {
            entries: vec![
                LinkedVarying { regid: 4, compmask: 0xf, loc: 0 },
                LinkedVarying { regid: 8, compmask: 0x3, loc: 4 },
                LinkedVarying { regid: 0, compmask: 0xf, loc: 6 },
            ],
            var_disable: [!0x3fu32, !0, !0, !0],
            position_loc: 6,
            psize_loc: LOC_NONE,
            layer_loc: LOC_NONE,
            primid_loc: LOC_NONE,
            max_loc: 10,
            so: None,
        };

        let table = StageRegTable::new();
        let mut sink = RecordSink::default();
        ctx.emit(&mut sink, &table, &map, false);
        let words = sink.0;

        assert_eq!(reg_value(&words, regs::VC_VAR_DISABLE), !0x3f);
        assert_eq!(reg_value(&words, regs::SP_VS_OUT), regs::sp_out_pair(4, 0xf, 8, 0x3));
        assert_eq!(reg_value(&words, regs::SP_VS_OUT + 1), regs::sp_out_pair(0, 0xf, 0, 0));
        assert_eq!(reg_value(&words, regs::SP_VS_VC_DST), pack_regids(0, 4, 6, 0));
        assert_eq!(
            reg_value(&words, regs::VC_VS_PACK),
            VcPack { position_loc: 6, psize_loc: LOC_NONE, stride_in_vc: 10 }.encode()
        );
        assert_eq!(reg_value(&words, regs::VC_VS_CLIP_CNTL), regs::VC_CLIP_CNTL_DISABLE_ALL);
        assert_eq!(reg_value(&words, regs::RAS_VS_CL_CNTL), 0);
        assert_eq!(
            reg_value(&words, regs::PA_VS_OUT_CNTL),
            PaOutCntl { stride_in_vc: 10, ..Default::default() }.encode()
        );
        assert_eq!(
            reg_value(&words, regs::SP_VS_PRIMITIVE_CNTL),
            SpPrimitiveCntl { out_count: 3, flags_regid: 0 }.encode()
        );
        assert_eq!(reg_value(&words, regs::VC_VS_LAYER_CNTL), regs::vc_layer_cntl(LOC_NONE));
        assert_eq!(reg_value(&words, regs::RAS_VS_LAYER_CNTL), 0);
        assert_eq!(reg_value(&words, regs::PA_PRIMID_PASSTHRU), 0);
    }

    #[test]
    fn binning_pass_swaps_the_vertex_binary_and_drops_the_fragment_stage() {
        let mut vs = variant(Stage::Vertex);
        vs.outputs.push(output(Slot::Position, 0, 0xf));
        let mut binning_vs = variant(Stage::Vertex);
        binning_vs.outputs.push(output(Slot::Position, 0, 0xf));
        let fs = variant(Stage::Fragment);
        let ctx = graphics_ctx(&vs, &binning_vs, &fs);

        let table = StageRegTable::new();
        let map = ctx.link(true).unwrap();
        let mut sink = RecordSink::default();
        ctx.emit(&mut sink, &table, &map, true);
        let words = sink.0;

        assert_eq!(reg_value(&words, regs::SP_FS_CONFIG), 0);
        assert_eq!(reg_value(&words, regs::SQ_FS_CNTL), 0);
        assert_eq!(reg_value(&words, regs::SP_VS_OBJ_START), 0x2000);
        assert_eq!(reg_value(&words, regs::SP_VS_OBJ_START + 1), 0);
        // The disabled fragment stage still parks its input registers.
        assert_eq!(reg_value(&words, regs::SQ_FS_MODE), regs::SQ_FS_MODE_EMPTY);
        assert_eq!(reg_value(&words, regs::RAS_CNTL), 0);
    }

    #[test]
    fn emitted_program_walks_as_whole_packets() {
        let mut vs = variant(Stage::Vertex);
        vs.outputs.push(output(Slot::Position, 0, 0xf));
        let mut fs = variant(Stage::Fragment);
        fs.sysvals.insert(Sysval::BaryPerspPixel, 0);
        let ctx = graphics_ctx(&vs, &vs, &fs);
        let table = StageRegTable::new();

        for binning in [false, true] {
            let map = ctx.link(binning).unwrap();
            let mut sink = RecordSink::default();
            ctx.emit(&mut sink, &table, &map, binning);
            // reg_writes panics on any partial or unknown packet.
            let writes = reg_writes(&sink.0);
            assert!(!writes.is_empty());
        }
    }

    #[test]
    fn fragment_inputs_wire_sysvals_and_interp() {
        let mut fs = variant(Stage::Fragment);
        fs.total_in = 4;
        fs.sysvals.insert(Sysval::FragCoord, 4);
        fs.sysvals.insert(Sysval::BaryPerspPixel, 0);
        fs.sysvals.insert(Sysval::SampleId, 9);
        fs.fragment.coord_compmask = 0xf;

        let mut sink = RecordSink::default();
        emit_fs_inputs(&mut sink, &fs);
        let words = sink.0;

        assert_eq!(reg_value(&words, regs::SQ_FS_CONTROL_1), regs::SQ_FS_CONTROL_1_INIT);
        assert_eq!(
            reg_value(&words, regs::SQ_FS_CONTROL_1 + 1),
            pack_regids(REGID_NONE, 9, REGID_NONE, REGID_NONE)
        );
        assert_eq!(
            reg_value(&words, regs::SQ_FS_CONTROL_1 + 2),
            pack_regids(0, REGID_NONE, REGID_NONE, REGID_NONE)
        );
        assert_eq!(
            reg_value(&words, regs::SQ_FS_CONTROL_1 + 3),
            pack_regids(4, 6, REGID_NONE, REGID_NONE)
        );
        assert_eq!(reg_value(&words, regs::SQ_FS_CONTROL_1 + 4), regs::SQ_FS_CONTROL_5_INIT);
        assert_eq!(reg_value(&words, regs::SQ_FS_MODE), regs::SQ_FS_MODE_VARYINGS);

        let interp = FsInterpControl {
            ij_persp_pixel: true,
            size: true,
            coord_mask: 0xf,
            ..Default::default()
        };
        assert_eq!(reg_value(&words, regs::RAS_CNTL), interp.encode());
        assert_eq!(
            reg_value(&words, regs::RB_RENDER_CONTROL0),
            interp.encode() | regs::RB_RENDER_CONTROL0_UNK10
        );
        assert_eq!(
            reg_value(&words, regs::RB_RENDER_CONTROL0 + 1),
            RbRenderControl1 { sample_id: true, ..Default::default() }.encode()
        );
    }

    #[test]
    fn empty_fragment_variant_parks_every_regid() {
        let fs = ShaderVariant::empty(Stage::Fragment);
        let mut sink = RecordSink::default();
        emit_fs_inputs(&mut sink, &fs);

        assert_eq!(
            sink.0,
            vec![
                pkt_reg_hdr(regs::SP_FS_PREFETCH_CNTL, 1),
                regs::sp_fs_prefetch_cntl(0),
                pkt_reg_hdr(regs::SQ_FS_CONTROL_1, 5),
                regs::SQ_FS_CONTROL_1_INIT,
                0xfcfcfcfc,
                0xfcfcfcfc,
                0xfcfcfcfc,
                regs::SQ_FS_CONTROL_5_INIT,
                pkt_reg_hdr(regs::SQ_FS_MODE, 1),
                regs::SQ_FS_MODE_EMPTY,
                pkt_reg_hdr(regs::RAS_CNTL, 1),
                0,
                pkt_reg_hdr(regs::RB_RENDER_CONTROL0, 2),
                0,
                0,
                pkt_reg_hdr(regs::RB_SAMPLE_CNTL, 1),
                0,
                pkt_reg_hdr(regs::RAS_SC_RAST_CNTL, 1),
                0,
                pkt_reg_hdr(regs::RAS_SAMPLE_CNTL, 1),
                0,
            ]
        );
    }

    #[test]
    fn sampler_prefetch_commands_follow_the_cntl() {
        let mut fs = variant(Stage::Fragment);
        fs.sysvals.insert(Sysval::BaryPerspPixel, 0);
        fs.fragment.prefetch = vec![
            TexPrefetch { src: 0, samp_id: 1, tex_id: 2, dst_regid: 8, write_mask: 0xf, cmd: 4 },
            TexPrefetch { src: 2, samp_id: 0, tex_id: 5, dst_regid: 12, write_mask: 0x7, cmd: 4 },
        ];

        let mut sink = RecordSink::default();
        emit_fs_inputs(&mut sink, &fs);

        assert_eq!(sink.0[0], pkt_reg_hdr(regs::SP_FS_PREFETCH_CNTL, 3));
        assert_eq!(sink.0[1], regs::sp_fs_prefetch_cntl(2));
        assert_eq!(
            sink.0[2],
            SpFsPrefetchCmd { src: 0, samp_id: 1, tex_id: 2, dst_regid: 8, write_mask: 0xf, cmd: 4 }
                .encode()
        );
        assert_eq!(
            sink.0[3],
            SpFsPrefetchCmd { src: 2, samp_id: 0, tex_id: 5, dst_regid: 12, write_mask: 0x7, cmd: 4 }
                .encode()
        );
    }

    #[test]
    fn color0_broadcast_fills_every_output_register() {
        let mut fs = variant(Stage::Fragment);
        fs.fragment.color0_broadcast = true;
        fs.outputs.push(output(Slot::Color(0), 12, 0xf));

        let mut sink = RecordSink::default();
        emit_fs_outputs(&mut sink, &fs, 4, false, 0xffff, false);
        let words = sink.0;

        for i in 0..MAX_RENDER_TARGETS as u16 {
            assert_eq!(
                reg_value(&words, regs::SP_FS_OUTPUT_REG + i),
                regs::sp_fs_output_reg(12, false)
            );
        }
        assert_eq!(reg_value(&words, regs::SP_FS_OUTPUT_CNTL0 + 1), regs::fs_output_cntl1(4));
        assert_eq!(reg_value(&words, regs::SP_FS_RENDER_COMPONENTS), 0xffff);
        assert_eq!(reg_value(&words, regs::RB_RENDER_COMPONENTS), 0xffff);
    }

    #[test]
    fn coverage_feedback_forces_late_z() {
        let mut fs = variant(Stage::Fragment);
        fs.fragment.has_kill = true;
        let mut sink = RecordSink::default();
        emit_fs_outputs(&mut sink, &fs, 1, false, 0xf, false);
        assert_eq!(
            reg_value(&sink.0, regs::RAS_SU_DEPTH_PLANE_CNTL),
            regs::depth_plane_cntl(ZMode::Late)
        );
        assert_eq!(
            reg_value(&sink.0, regs::RB_DEPTH_PLANE_CNTL),
            regs::depth_plane_cntl(ZMode::Late)
        );

        let clean = variant(Stage::Fragment);
        let mut sink = RecordSink::default();
        emit_fs_outputs(&mut sink, &clean, 1, false, 0xf, false);
        assert_eq!(
            reg_value(&sink.0, regs::RB_DEPTH_PLANE_CNTL),
            regs::depth_plane_cntl(ZMode::Early)
        );
    }

    #[test]
    fn stencil_only_target_forces_late_z() {
        let fs = variant(Stage::Fragment);
        let mut sink = RecordSink::default();
        emit_fs_outputs(&mut sink, &fs, 0, false, 0, true);
        assert_eq!(
            reg_value(&sink.0, regs::RB_DEPTH_PLANE_CNTL),
            regs::depth_plane_cntl(ZMode::Late)
        );
    }

    #[test]
    fn dual_source_blending_flags_both_output_cntl0() {
        let mut fs = variant(Stage::Fragment);
        fs.outputs.push(output(Slot::Color(0), 4, 0xf));
        let mut sink = RecordSink::default();
        emit_fs_outputs(&mut sink, &fs, 2, true, 0xff, false);
        assert_eq!(reg_value(&sink.0, regs::SP_FS_OUTPUT_CNTL0) & 1, 1);
        assert_eq!(reg_value(&sink.0, regs::RB_FS_OUTPUT_CNTL0) & 1, 1);
    }

    #[test]
    fn compute_config_wires_ids_and_mode() {
        let mut cs = variant(Stage::Compute);
        cs.sysvals.insert(Sysval::WorkGroupId, 20);
        cs.sysvals.insert(Sysval::LocalInvocationId, 2);

        let table = StageRegTable::new();
        let mut sink = RecordSink::default();
        emit_compute(&mut sink, &table, bound(&cs, 0x8000), false);
        let words = sink.0;

        assert_eq!(
            words[1],
            SqInvalidateCmd { cs_state: true, cs_resource: true, ..Default::default() }.encode()
        );
        assert_eq!(reg_value(&words, regs::SP_CS_MODE_CNTL), regs::SP_CS_MODE_CNTL_INIT);
        assert_eq!(
            reg_value(&words, regs::SQ_CS_CONTROL_0),
            pack_regids(20, REGID_NONE, REGID_NONE, 2)
        );
        assert_eq!(reg_value(&words, regs::SQ_CS_CONTROL_0 + 1), regs::SQ_CS_CONTROL_1_INIT);

        let mut sink = RecordSink::default();
        emit_compute(&mut sink, &table, bound(&cs, 0x8000), true);
        assert_eq!(reg_value(&sink.0, regs::SP_CS_MODE_CNTL), regs::SP_CS_MODE_CNTL_INIT_S650);
    }

    fn tess_variants() -> (ShaderVariant, ShaderVariant, ShaderVariant, ShaderVariant) {
        let mut vs = variant(Stage::Vertex);
        vs.output_size = 8;
        vs.outputs.push(output(Slot::Position, 0, 0xf));
        let mut hs = variant(Stage::TessControl);
        hs.output_size = 12;
        hs.tess = Some(TessDomain {
            primitive: TessPrimitive::Triangles,
            spacing: Some(TessSpacing::FractionalOdd),
            point_mode: false,
            ccw: true,
            vertices_out: 3,
        });
        let mut ds = variant(Stage::TessEval);
        ds.output_size = 6;
        ds.outputs.push(output(Slot::Position, 0, 0xf));
        ds.tess = Some(TessDomain {
            primitive: TessPrimitive::Triangles,
            spacing: None,
            point_mode: false,
            ccw: false,
            vertices_out: 0,
        });
        let fs = variant(Stage::Fragment);
        (vs, hs, ds, fs)
    }

    fn tess_ctx<'a>(
        vs: &'a ShaderVariant,
        hs: &'a ShaderVariant,
        ds: &'a ShaderVariant,
        fs: &'a ShaderVariant,
    ) -> ProgramCtx<'a> {
        ProgramCtx {
            hs: Some(bound(hs, 0x4000)),
            ds: Some(bound(ds, 0x5000)),
            patch_control_points: 4,
            ..graphics_ctx(vs, vs, fs)
        }
    }

    #[test]
    fn tess_domain_falls_back_to_the_control_stage() {
        let (vs, hs, ds, fs) = tess_variants();
        let ctx = tess_ctx(&vs, &hs, &ds, &fs);
        let table = StageRegTable::new();
        let map = ctx.link(false).unwrap();
        let mut sink = RecordSink::default();
        ctx.emit(&mut sink, &table, &map, false);
        let words = sink.0;

        assert_eq!(reg_value(&words, regs::PA_TESS_NUM_VERTEX), 3);
        assert_eq!(reg_value(&words, regs::PA_HS_INPUT_SIZE), 4 * 8 / 4);
        assert_eq!(reg_value(&words, regs::SP_HS_WAVE_INPUT_SIZE), 8);
        // The evaluation stage left spacing unset, so the control stage's
        // domain drives the mode, including its winding.
        assert_eq!(
            reg_value(&words, regs::PA_TESS_CNTL),
            PaTessCntl { spacing: TessSpacing::FractionalOdd, output: TessOutput::TrisCcw }
                .encode()
        );
    }

    #[test]
    fn lower_left_domain_flips_the_output_winding() {
        let (vs, hs, mut ds, fs) = tess_variants();
        ds.tess = Some(TessDomain {
            primitive: TessPrimitive::Triangles,
            spacing: Some(TessSpacing::Equal),
            point_mode: false,
            ccw: false,
            vertices_out: 0,
        });
        let mut ctx = tess_ctx(&vs, &hs, &ds, &fs);
        ctx.lower_left_origin = true;
        let table = StageRegTable::new();
        let map = ctx.link(false).unwrap();
        let mut sink = RecordSink::default();
        ctx.emit(&mut sink, &table, &map, false);

        assert_eq!(
            reg_value(&sink.0, regs::PA_TESS_CNTL),
            PaTessCntl { spacing: TessSpacing::Equal, output: TessOutput::TrisCcw }.encode()
        );
    }

    #[test]
    fn s650_wave_input_size_counts_patches_per_wave() {
        let (vs, hs, ds, fs) = tess_variants();
        let mut ctx = tess_ctx(&vs, &hs, &ds, &fs);
        ctx.s650 = true;
        let table = StageRegTable::new();
        let map = ctx.link(false).unwrap();
        let mut sink = RecordSink::default();
        ctx.emit(&mut sink, &table, &map, false);

        // 21 patches per wave, 8 dwords per control point, 4 points each.
        let total = 8 * 4 * (WAVE_SIZE / 3);
        assert_eq!(
            reg_value(&sink.0, regs::SP_HS_WAVE_INPUT_SIZE),
            (total + WAVE_SIZE - 1) / WAVE_SIZE
        );
    }

    #[test]
    fn tess_consts_load_each_stage_block() {
        let (mut vs, mut hs, mut ds, fs) = tess_variants();
        vs.const_offsets.primitive_param = 1;
        hs.const_offsets.primitive_param = 2;
        ds.const_offsets.primitive_param = 3;
        let ctx = tess_ctx(&vs, &hs, &ds, &fs);
        let table = StageRegTable::new();
        let map = ctx.link(false).unwrap();
        let mut sink = RecordSink::default();
        ctx.emit(&mut sink, &table, &map, false);

        let packets = cmd_packets(&sink.0);
        let payload_for = |block: StateBlock, dst_off: u32| {
            let ctl = LoadStateControl {
                dst_off,
                ty: StateType::Consts,
                src: StateSrc::Direct,
                block,
                num_unit: 1,
            }
            .encode();
            packets
                .iter()
                .find(|(_, p)| p.first() == Some(&ctl))
                .map(|(_, p)| p[3..].to_vec())
                .expect("missing const load")
        };

        // Four control points, 8-dword vertex outputs, 6-dword eval outputs.
        assert_eq!(payload_for(StateBlock::VsShader, 1), vec![8 * 4 * 4, 8 * 4, 0, 0]);
        assert_eq!(payload_for(StateBlock::HsShader, 2), vec![8 * 4 * 4, 8 * 4, 12, 4]);
        assert_eq!(payload_for(StateBlock::DsShader, 3), vec![6 * 4 * 4, 6 * 4, 12, 3]);
    }

    #[test]
    fn geometry_block_encodes_counts_minus_one() {
        let mut vs = variant(Stage::Vertex);
        vs.output_size = 10;
        vs.outputs.push(output(Slot::Position, 0, 0xf));
        let mut gs = variant(Stage::Geometry);
        gs.output_size = 4;
        gs.outputs.push(output(Slot::Position, 4, 0xf));
        gs.geometry = Some(GeometryMeta {
            vertices_out: 6,
            vertices_in: 3,
            invocations: 2,
            output: GsOutput::LineStrip,
        });
        let fs = variant(Stage::Fragment);
        let ctx = ProgramCtx {
            gs: Some(bound(&gs, 0x6000)),
            ..graphics_ctx(&vs, &vs, &fs)
        };

        let table = StageRegTable::new();
        let map = ctx.link(false).unwrap();
        let mut sink = RecordSink::default();
        ctx.emit(&mut sink, &table, &map, false);
        let words = sink.0;

        assert_eq!(
            reg_value(&words, regs::PA_PRIMITIVE_CNTL_5),
            PaPrimitiveCntl5 {
                gs_vertices_out: 5,
                gs_output: TessOutput::Lines,
                gs_invocations: 1,
            }
            .encode()
        );
        assert_eq!(reg_value(&words, regs::PA_PRIMITIVE_CNTL_3), 0);
        assert_eq!(reg_value(&words, regs::VC_GS_PARAM), regs::VC_GS_PARAM_INIT);
        assert_eq!(
            reg_value(&words, regs::PA_PRIMITIVE_CNTL_6),
            regs::pa_primitive_cntl_6(3 * ((10 + 3) / 4))
        );
        assert_eq!(reg_value(&words, regs::PA_GS_PARAM), 0);
        assert_eq!(reg_value(&words, regs::SP_GS_PRIM_SIZE), 10);
        // Geometry pipelines route the linkage block through the GS set.
        assert_eq!(reg_value(&words, regs::SP_GS_PRIMITIVE_CNTL) & 0x3f, map.cnt());
    }

    #[test]
    fn link_map_scales_producer_locations_by_consumer_kind() {
        let mut producer = variant(Stage::Vertex);
        producer.outputs.push(IoSlot {
            slot: Slot::Varying(0),
            regid: 4,
            compmask: 0xf,
            loc: 4,
            flat: false,
        });

        let mut hs = variant(Stage::TessControl);
        hs.const_offsets.primitive_map = 2;
        hs.inputs.push(IoSlot { slot: Slot::Varying(0), regid: 0, compmask: 0xf, loc: 0, flat: false });
        let mut sink = RecordSink::default();
        emit_link_map(&mut sink, &producer, &hs);
        let (_, payload) = &cmd_packets(&sink.0)[0];
        assert_eq!(payload[3], 16);

        let mut ds = variant(Stage::TessEval);
        ds.const_offsets.primitive_map = 2;
        ds.inputs.push(IoSlot { slot: Slot::Varying(0), regid: 0, compmask: 0xf, loc: 0, flat: false });
        let mut sink = RecordSink::default();
        emit_link_map(&mut sink, &producer, &ds);
        let (_, payload) = &cmd_packets(&sink.0)[0];
        assert_eq!(payload[3], 4);
    }

    #[test]
    fn link_map_outside_the_constant_file_is_skipped() {
        let mut producer = variant(Stage::Vertex);
        producer.outputs.push(IoSlot {
            slot: Slot::Varying(0),
            regid: 4,
            compmask: 0xf,
            loc: 0,
            flat: false,
        });
        let mut ds = variant(Stage::TessEval);
        ds.constlen = 2;
        ds.const_offsets.primitive_map = 2;
        ds.inputs.push(IoSlot { slot: Slot::Varying(0), regid: 0, compmask: 0xf, loc: 0, flat: false });

        let mut sink = RecordSink::default();
        emit_link_map(&mut sink, &producer, &ds);
        assert!(sink.0.is_empty());
    }
}
