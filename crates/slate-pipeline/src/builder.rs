//! Pipeline builds.
//!
//! A build resolves shader variants, links the stage interfaces, then runs
//! every encoder twice: once against a [`CountSink`] to size the stream and
//! once against the allocated [`CommandStream`] to fill it. Both passes walk
//! one shared [`Section`] list, so they cannot disagree on order, and the
//! allocation is exact. Any drift between the passes surfaces as a
//! [`PipelineError::SizingMismatch`] naming the section.

use std::sync::Arc;

use tracing::debug;

use slate_regs::limits::{MAX_PATCH_CONTROL_POINTS, MAX_RENDER_TARGETS};
use slate_regs::regs::RasSuCntl;

use crate::descriptor::{
    BlendState, DepthBounds, DepthFormat, DepthStencilState, DomainOrigin, PipelineDescriptor,
    TessellationState, Topology,
};
use crate::dynamic::{self, DynamicState};
use crate::error::PipelineError;
use crate::fixed::{blend, depth, msaa, raster, vertex, viewport};
use crate::layout::PipelineLayout;
use crate::linkage::VaryingMap;
use crate::prefetch;
use crate::program::{self, BoundShader, ProgramCtx, StageRegTable};
use crate::shader::{
    trim_constlen, ConstOffsets, ShaderKey, ShaderResolver, ShaderVariant, Stage, StageFlags,
};
use crate::stream::{CommandStream, CountSink, CsSink, DrawState, StreamPlan};

/// Device parameters a build needs.
#[derive(Debug, Clone, Copy)]
pub struct DeviceInfo {
    /// GPU revision. 650 has its own compute dispatch order.
    pub gpu_id: u32,
    /// Device address the finished stream will be mapped at. Must lie on
    /// an instruction-fetch boundary (128 bytes).
    pub stream_iova: u64,
}

impl DeviceInfo {
    fn s650(self) -> bool {
        self.gpu_id == 650
    }
}

/// Constant-file shape of one stage, kept for draw-time constant uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageConstants {
    /// Constant-file window in vec4 units; zero when the stage is absent.
    pub constlen: u32,
    /// Driver-managed ranges inside that window.
    pub offsets: ConstOffsets,
}

/// A built pipeline: shader binaries and encoded register state in one
/// immutable stream, plus the handles and scalars the draw-time recorder
/// reads back.
///
/// Each [`DrawState`] points into the stream; an empty handle means the
/// pipeline has no such section (a rasterizer-discard pipeline has no
/// blend section, a graphics pipeline has no compute program).
#[derive(Debug)]
pub struct Pipeline {
    stream: CommandStream,
    /// Shader program configuration for the render pass.
    pub program: DrawState,
    /// Program configuration for the binning pass.
    pub binning_program: DrawState,
    pub vertex_input: DrawState,
    pub binning_vertex_input: DrawState,
    pub rasterizer_state: DrawState,
    pub depth_stencil_state: DrawState,
    pub blend_state: DrawState,
    /// Descriptor prefetch commands, replayed whenever sets rebind.
    pub prefetch: DrawState,
    /// Slot per dynamic-capable category: baked packets when the category
    /// is static, a zero-filled patch slot when dynamic, empty when the
    /// pipeline carries no such section.
    pub dynamic: [DrawState; DynamicState::COUNT],
    /// Categories the descriptor declared dynamic.
    pub dynamic_mask: u32,
    pub active_stages: StageFlags,
    /// Descriptor sets any stage references, as a bitmask.
    pub active_sets: u32,
    /// Primitive-assembler type for draws; patch topologies fold their
    /// control-point count in.
    pub primtype: u32,
    pub primitive_restart: bool,
    /// Per-patch parameter stride in bytes, zero without tessellation.
    pub tess_param_stride: u32,
    /// Base `RAS_SU_CNTL` word the draw-time line-width patch merges into.
    pub ras_su_cntl: RasSuCntl,
    pub stage_constants: [StageConstants; Stage::COUNT],
    /// Compute workgroup size, zero for graphics.
    pub local_size: [u16; 3],
}

impl Pipeline {
    /// The backing stream. Its bytes live at the device address the build
    /// was given.
    pub fn stream(&self) -> &CommandStream {
        &self.stream
    }

    /// Whether a category is patched at draw time rather than baked.
    pub fn is_dynamic(&self, category: DynamicState) -> bool {
        self.dynamic_mask & category.bit() != 0
    }

    /// Builds a compute pipeline. Compute has no fixed-function state: the
    /// stream holds the shader binary, the dispatch configuration and the
    /// descriptor prefetch.
    pub fn build_compute(
        device: DeviceInfo,
        layout: &PipelineLayout,
        resolver: &impl ShaderResolver,
    ) -> Result<Self, PipelineError> {
        let variant = resolver.resolve(Stage::Compute, &ShaderKey::default())?;
        let shader = BoundShader {
            variant: &variant,
            iova: device.stream_iova,
        };
        let table = StageRegTable::new();

        let mut count = CountSink::default();
        program::emit_compute(&mut count, &table, shader, device.s650());
        let program_size = count.len();

        let mut count = CountSink::default();
        prefetch::emit_load_state(&mut count, layout, variant.active_sets, true);

        let mut plan = StreamPlan {
            binaries: variant.code.len() as u32,
            ..StreamPlan::default()
        };
        plan.push("compute program", program_size);
        plan.prefetch = count.len();

        let mut stream = CommandStream::with_capacity(plan.total(), device.stream_iova)?;
        let uploaded = stream.upload(&variant.code);
        debug_assert_eq!(uploaded, shader.iova);

        let mut sub = stream.begin("compute program", program_size);
        program::emit_compute(&mut sub, &table, shader, device.s650());
        let program_state = sub.finish()?;

        let mut sub = stream.begin("prefetch", plan.prefetch);
        prefetch::emit_load_state(&mut sub, layout, variant.active_sets, true);
        let prefetch_state = sub.finish()?;
        stream.check_full()?;

        let mut stage_constants = [StageConstants::default(); Stage::COUNT];
        stage_constants[Stage::Compute.index()] = StageConstants {
            constlen: variant.constlen,
            offsets: variant.const_offsets,
        };

        debug!(capacity = stream.capacity(), "compute pipeline stream assembled");

        Ok(Pipeline {
            stream,
            program: program_state,
            binning_program: DrawState::default(),
            vertex_input: DrawState::default(),
            binning_vertex_input: DrawState::default(),
            rasterizer_state: DrawState::default(),
            depth_stencil_state: DrawState::default(),
            blend_state: DrawState::default(),
            prefetch: prefetch_state,
            dynamic: [DrawState::default(); DynamicState::COUNT],
            dynamic_mask: 0,
            active_stages: StageFlags::COMPUTE,
            active_sets: variant.active_sets,
            primtype: 0,
            primitive_restart: false,
            tess_param_stride: 0,
            ras_su_cntl: RasSuCntl::default(),
            stage_constants,
            local_size: variant.local_size,
        })
    }
}

/// One-shot graphics pipeline builder. Borrows the descriptor, layout and
/// resolver for a single [`build`](Self::build) call; nothing persists
/// between builds.
pub struct PipelineBuilder<'a, R: ShaderResolver> {
    device: DeviceInfo,
    descriptor: &'a PipelineDescriptor,
    layout: &'a PipelineLayout,
    resolver: &'a R,
}

impl<'a, R: ShaderResolver> PipelineBuilder<'a, R> {
    pub fn new(
        device: DeviceInfo,
        descriptor: &'a PipelineDescriptor,
        layout: &'a PipelineLayout,
        resolver: &'a R,
    ) -> Self {
        Self {
            device,
            descriptor,
            layout,
            resolver,
        }
    }

    /// Builds a graphics pipeline.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let desc = self.descriptor;
        debug_assert!(desc.stages.contains(StageFlags::VERTEX));
        debug_assert!(!desc.stages.contains(StageFlags::COMPUTE));
        debug_assert!(desc.attachments.colors.len() <= MAX_RENDER_TARGETS);
        debug_assert_eq!(
            desc.tessellation.is_some(),
            desc.input_assembly.topology == Topology::PatchList
        );

        let dynamic_mask = dynamic::parse_mask(&desc.dynamic_state)?;

        let mut primtype = desc.input_assembly.topology.prim_type();
        if let Some(tess) = &desc.tessellation {
            if tess.patch_control_points == 0
                || tess.patch_control_points > MAX_PATCH_CONTROL_POINTS
            {
                return Err(PipelineError::UnsupportedPatchSize {
                    points: tess.patch_control_points,
                });
            }
            primtype += tess.patch_control_points;
        }

        // A discard pipeline never rasterizes: it runs with one sample, no
        // attachments and no color output, whatever the descriptor says.
        let discard = desc.rasterization.discard;
        let samples = if discard { 1 } else { desc.multisample.samples };
        let depth_format = if discard { None } else { desc.attachments.depth };

        let mut render_components = 0u32;
        let mut any_color = false;
        let mut mrt_count = 0u32;
        let mut dual_src = false;
        if !discard {
            for (slot, format) in desc.attachments.colors.iter().enumerate() {
                if format.is_some() {
                    render_components |= 0xf << (slot * 4);
                    any_color = true;
                }
            }
            mrt_count = desc.attachments.colors.len() as u32;
            dual_src = blend::uses_dual_src(&desc.blend);
            if dual_src {
                // The second source occupies the next MRT slot.
                mrt_count += 1;
                if matches!(desc.attachments.colors.first(), Some(Some(_))) {
                    render_components |= 0xf << 4;
                }
            }
        }

        let key = self.shader_key();
        let shaders = self.resolve(key)?;
        let active_sets = shaders.active_sets();

        // Binary layout is fixed before allocation: variants pack
        // back-to-back from the stream base in upload order.
        let base = self.device.stream_iova;
        let mut cursor = 0u32;
        let vs = bound_at(&shaders.vs, &mut cursor, base);
        let hs = shaders.hs.as_deref().map(|v| bound_at(v, &mut cursor, base));
        let ds = shaders.ds.as_deref().map(|v| bound_at(v, &mut cursor, base));
        let gs = shaders.gs.as_deref().map(|v| bound_at(v, &mut cursor, base));
        let fs = bound_at(&shaders.fs, &mut cursor, base);
        let binning_vs = bound_at(&shaders.binning, &mut cursor, base);

        let program = ProgramCtx {
            vs,
            binning_vs,
            hs,
            ds,
            gs,
            fs,
            patch_control_points: desc.tessellation.map_or(0, |t| t.patch_control_points),
            lower_left_origin: matches!(
                desc.tessellation,
                Some(TessellationState {
                    origin: DomainOrigin::LowerLeft,
                    ..
                })
            ),
            s650: self.device.s650(),
            mrt_count,
            dual_src_blend: dual_src,
            render_components,
            stencil_only: depth_format == Some(DepthFormat::S8Uint),
        };
        let map = program.link(false)?;
        let binning_map = program.link(true)?;

        let sections = section_list(discard);
        let ctx = SectionCtx {
            descriptor: desc,
            program,
            table: StageRegTable::new(),
            map,
            binning_map,
            dynamic_mask,
            su_cntl: raster::ras_su_cntl(&desc.rasterization, samples),
            depth_format,
            depth_stencil: if depth_format.is_some() {
                desc.depth_stencil
            } else {
                DepthStencilState::default()
            },
            blend: if any_color {
                desc.blend.clone()
            } else {
                BlendState::default()
            },
        };

        let mut plan = StreamPlan {
            binaries: cursor,
            ..StreamPlan::default()
        };
        for &section in &sections {
            let mut count = CountSink::default();
            ctx.emit_section(section, &mut count);
            plan.push(section.name(), count.len());
        }
        let mut count = CountSink::default();
        prefetch::emit_load_state(&mut count, self.layout, active_sets, false);
        plan.prefetch = count.len();

        let mut stream = CommandStream::with_capacity(plan.total(), base)?;
        for (_, variant) in shaders.stages() {
            stream.upload(&variant.code);
        }
        stream.upload(&shaders.binning.code);
        debug_assert_eq!(stream.head_iova(), base + u64::from(plan.binaries) * 4);

        let mut emitted = Vec::with_capacity(sections.len());
        for (&section, &(name, size)) in sections.iter().zip(&plan.substreams) {
            let mut sub = stream.begin(name, size);
            ctx.emit_section(section, &mut sub);
            emitted.push(sub.finish()?);
        }
        let mut sub = stream.begin("prefetch", plan.prefetch);
        prefetch::emit_load_state(&mut sub, self.layout, active_sets, false);
        let prefetch_state = sub.finish()?;
        stream.check_full()?;

        let mut stage_constants = [StageConstants::default(); Stage::COUNT];
        for (stage, variant) in shaders.stages() {
            stage_constants[stage.index()] = StageConstants {
                constlen: variant.constlen,
                offsets: variant.const_offsets,
            };
        }

        debug!(
            capacity = stream.capacity(),
            binaries = plan.binaries,
            substreams = plan.substreams.len(),
            dynamic_mask,
            "graphics pipeline stream assembled"
        );

        let mut pipeline = Pipeline {
            stream,
            program: DrawState::default(),
            binning_program: DrawState::default(),
            vertex_input: DrawState::default(),
            binning_vertex_input: DrawState::default(),
            rasterizer_state: DrawState::default(),
            depth_stencil_state: DrawState::default(),
            blend_state: DrawState::default(),
            prefetch: prefetch_state,
            dynamic: [DrawState::default(); DynamicState::COUNT],
            dynamic_mask,
            active_stages: desc.stages,
            active_sets,
            primtype,
            primitive_restart: desc.input_assembly.primitive_restart,
            tess_param_stride: shaders.hs.as_ref().map_or(0, |hs| hs.output_size * 4),
            ras_su_cntl: ctx.su_cntl,
            stage_constants,
            local_size: [0; 3],
        };
        for (&section, &state) in sections.iter().zip(&emitted) {
            match section {
                Section::Program => pipeline.program = state,
                Section::BinningProgram => pipeline.binning_program = state,
                Section::VertexInput => pipeline.vertex_input = state,
                Section::BinningVertexInput => pipeline.binning_vertex_input = state,
                Section::Rasterizer => pipeline.rasterizer_state = state,
                Section::DepthStencil => pipeline.depth_stencil_state = state,
                Section::Blend => pipeline.blend_state = state,
                Section::Dynamic(category) => pipeline.dynamic[category.index()] = state,
            }
        }
        Ok(pipeline)
    }

    fn shader_key(&self) -> ShaderKey {
        let desc = self.descriptor;
        let mut key = ShaderKey {
            has_geometry: desc.stages.contains(StageFlags::GEOMETRY),
            ..ShaderKey::default()
        };
        if !desc.rasterization.discard {
            key.msaa = desc.multisample.samples > 1 || desc.multisample.sample_locations.is_some();
            key.sample_shading = desc.multisample.sample_shading;
        }
        if desc
            .stages
            .intersects(StageFlags::TESS_CONTROL | StageFlags::TESS_EVAL)
        {
            key.tess = self
                .resolver
                .tess_primitive(Stage::TessEval)
                .or_else(|| self.resolver.tess_primitive(Stage::TessControl));
        }
        key.layer_zero = !key.has_geometry || !self.resolver.writes_layer(Stage::Geometry);
        key
    }

    fn resolve(&self, key: ShaderKey) -> Result<ResolvedShaders, PipelineError> {
        let flags = self.descriptor.stages;
        let optional = |stage: Stage| -> Result<Option<Arc<ShaderVariant>>, PipelineError> {
            if flags.contains(stage.into()) {
                Ok(Some(self.resolver.resolve(stage, &key)?))
            } else {
                Ok(None)
            }
        };

        let mut vs = self.resolver.resolve(Stage::Vertex, &key)?;
        let mut hs = optional(Stage::TessControl)?;
        let mut ds = optional(Stage::TessEval)?;
        let mut gs = optional(Stage::Geometry)?;
        // The fragment slot is always filled, trivial variant or not, so
        // the program block can park the stage uniformly.
        let mut fs = self.resolver.resolve(Stage::Fragment, &key)?;

        let mut constlens = [0u32; Stage::COUNT];
        constlens[Stage::Vertex.index()] = vs.constlen;
        constlens[Stage::TessControl.index()] = hs.as_ref().map_or(0, |v| v.constlen);
        constlens[Stage::TessEval.index()] = ds.as_ref().map_or(0, |v| v.constlen);
        constlens[Stage::Geometry.index()] = gs.as_ref().map_or(0, |v| v.constlen);
        constlens[Stage::Fragment.index()] = fs.constlen;

        let trimmed = trim_constlen(&mut constlens);
        if trimmed != 0 {
            debug!(mask = trimmed, "constant files over budget, re-resolving");
            let safe = ShaderKey {
                safe_constlen: true,
                ..key
            };
            if trimmed & (1 << Stage::Vertex.index()) != 0 {
                vs = self.resolver.resolve(Stage::Vertex, &safe)?;
            }
            if trimmed & (1 << Stage::TessControl.index()) != 0 {
                hs = Some(self.resolver.resolve(Stage::TessControl, &safe)?);
            }
            if trimmed & (1 << Stage::TessEval.index()) != 0 {
                ds = Some(self.resolver.resolve(Stage::TessEval, &safe)?);
            }
            if trimmed & (1 << Stage::Geometry.index()) != 0 {
                gs = Some(self.resolver.resolve(Stage::Geometry, &safe)?);
            }
            if trimmed & (1 << Stage::Fragment.index()) != 0 {
                fs = self.resolver.resolve(Stage::Fragment, &safe)?;
            }
        }

        // Binning reuses the full vertex shader whenever side effects or
        // later geometry stages depend on it running.
        let binning = if !vs.stream_out.is_empty() || gs.is_some() || hs.is_some() {
            Arc::clone(&vs)
        } else {
            let binning_key = ShaderKey {
                safe_constlen: trimmed & (1 << Stage::Vertex.index()) != 0,
                ..key
            };
            self.resolver.resolve_binning(&binning_key)?
        };

        Ok(ResolvedShaders {
            vs,
            hs,
            ds,
            gs,
            fs,
            binning,
        })
    }
}

/// The variant set a graphics build works from.
struct ResolvedShaders {
    vs: Arc<ShaderVariant>,
    hs: Option<Arc<ShaderVariant>>,
    ds: Option<Arc<ShaderVariant>>,
    gs: Option<Arc<ShaderVariant>>,
    fs: Arc<ShaderVariant>,
    /// Position-only vertex variant for the binning pass, or a second
    /// handle on `vs` when binning must run the full shader.
    binning: Arc<ShaderVariant>,
}

impl ResolvedShaders {
    /// Stage variants in upload order. The binning variant is not listed;
    /// it always uploads last.
    fn stages(&self) -> impl Iterator<Item = (Stage, &Arc<ShaderVariant>)> + '_ {
        [
            (Stage::Vertex, Some(&self.vs)),
            (Stage::TessControl, self.hs.as_ref()),
            (Stage::TessEval, self.ds.as_ref()),
            (Stage::Geometry, self.gs.as_ref()),
            (Stage::Fragment, Some(&self.fs)),
        ]
        .into_iter()
        .filter_map(|(stage, variant)| variant.map(|v| (stage, v)))
    }

    fn active_sets(&self) -> u32 {
        self.stages().fold(0, |sets, (_, v)| sets | v.active_sets)
    }
}

/// Assigns the next binary slot. Binaries pack back-to-back from the
/// stream base in upload order, each a whole number of fetch units, so
/// every start address stays fetch-aligned.
fn bound_at<'v>(variant: &'v ShaderVariant, cursor: &mut u32, base: u64) -> BoundShader<'v> {
    let bound = BoundShader {
        variant,
        iova: base + u64::from(*cursor) * 4,
    };
    *cursor += variant.code.len() as u32;
    bound
}

/// One sized-then-emitted slice of the stream. The same list drives both
/// passes, so a section cannot be sized and emitted in different orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Program,
    BinningProgram,
    VertexInput,
    BinningVertexInput,
    Rasterizer,
    DepthStencil,
    Blend,
    Dynamic(DynamicState),
}

impl Section {
    fn name(self) -> &'static str {
        match self {
            Section::Program => "program",
            Section::BinningProgram => "binning program",
            Section::VertexInput => "vertex input",
            Section::BinningVertexInput => "binning vertex input",
            Section::Rasterizer => "rasterizer",
            Section::DepthStencil => "depth stencil",
            Section::Blend => "blend",
            Section::Dynamic(DynamicState::Viewport) => "viewport",
            Section::Dynamic(DynamicState::Scissor) => "scissor",
            Section::Dynamic(DynamicState::LineWidth) => "line width",
            Section::Dynamic(DynamicState::DepthBias) => "depth bias",
            Section::Dynamic(DynamicState::BlendConstants) => "blend constants",
            Section::Dynamic(DynamicState::DepthBounds) => "depth bounds",
            Section::Dynamic(DynamicState::StencilCompareMask) => "stencil compare mask",
            Section::Dynamic(DynamicState::StencilWriteMask) => "stencil write mask",
            Section::Dynamic(DynamicState::StencilReference) => "stencil reference",
            Section::Dynamic(DynamicState::SampleLocations) => "sample locations",
        }
    }
}

/// Stream layout for a graphics build. Rasterizer-discard pipelines have
/// no raster output, so the viewport and color sections disappear rather
/// than encode placeholder state; depth/stencil and rasterizer sections
/// stay, matching what the hardware still consumes.
fn section_list(discard: bool) -> Vec<Section> {
    let mut sections = vec![
        Section::Program,
        Section::BinningProgram,
        Section::VertexInput,
        Section::BinningVertexInput,
    ];
    if !discard {
        sections.push(Section::Dynamic(DynamicState::Viewport));
        sections.push(Section::Dynamic(DynamicState::Scissor));
    }
    sections.extend([
        Section::Rasterizer,
        Section::Dynamic(DynamicState::LineWidth),
        Section::Dynamic(DynamicState::DepthBias),
        Section::DepthStencil,
        Section::Dynamic(DynamicState::DepthBounds),
        Section::Dynamic(DynamicState::StencilCompareMask),
        Section::Dynamic(DynamicState::StencilWriteMask),
        Section::Dynamic(DynamicState::StencilReference),
    ]);
    if !discard {
        sections.extend([
            Section::Blend,
            Section::Dynamic(DynamicState::BlendConstants),
            Section::Dynamic(DynamicState::SampleLocations),
        ]);
    }
    sections
}

/// Everything the section encoders read, fixed before either pass runs.
struct SectionCtx<'a> {
    descriptor: &'a PipelineDescriptor,
    program: ProgramCtx<'a>,
    table: StageRegTable,
    map: VaryingMap,
    binning_map: VaryingMap,
    dynamic_mask: u32,
    su_cntl: RasSuCntl,
    depth_format: Option<DepthFormat>,
    /// The descriptor's depth/stencil state, or the neutral default when
    /// there is no depth attachment to apply it against.
    depth_stencil: DepthStencilState,
    /// The descriptor's blend state, or the neutral default when no color
    /// attachment is written.
    blend: BlendState,
}

impl SectionCtx<'_> {
    fn emit_section(&self, section: Section, cs: &mut impl CsSink) {
        match section {
            Section::Program => self.program.emit(cs, &self.table, &self.map, false),
            Section::BinningProgram => {
                self.program.emit(cs, &self.table, &self.binning_map, true);
            }
            Section::VertexInput => {
                vertex::emit_vertex_input(
                    cs,
                    &self.descriptor.vertex_input,
                    self.program.vs.variant,
                );
            }
            Section::BinningVertexInput => {
                vertex::emit_vertex_input(
                    cs,
                    &self.descriptor.vertex_input,
                    self.program.binning_vs.variant,
                );
            }
            Section::Rasterizer => raster::emit_rasterizer(cs, &self.descriptor.rasterization),
            Section::DepthStencil => depth::emit_depth_stencil(
                cs,
                &self.depth_stencil,
                self.descriptor.rasterization.depth_clamp,
                self.depth_format,
            ),
            Section::Blend => {
                let enabled = blend::emit_mrt_controls(cs, &self.blend, &self.descriptor.attachments);
                blend::emit_blend_control(
                    cs,
                    enabled,
                    self.program.dual_src_blend,
                    &self.descriptor.multisample,
                );
            }
            Section::Dynamic(category) => self.emit_dynamic(category, cs),
        }
    }

    /// Dynamic categories hold a zero-filled slot of the category's fixed
    /// size for the draw-time recorder to overwrite; static ones bake
    /// their packets now.
    fn emit_dynamic(&self, category: DynamicState, cs: &mut impl CsSink) {
        if self.dynamic_mask & category.bit() != 0 {
            for _ in 0..category.slot_size() {
                cs.emit(0);
            }
            return;
        }
        let desc = self.descriptor;
        let ds = &self.depth_stencil;
        match category {
            DynamicState::Viewport => viewport::emit_viewport(cs, &desc.viewport.viewport),
            DynamicState::Scissor => viewport::emit_scissor(cs, &desc.viewport.scissor),
            DynamicState::LineWidth => {
                raster::emit_line_width(cs, self.su_cntl, desc.rasterization.line_width);
            }
            DynamicState::DepthBias => {
                raster::emit_depth_bias(cs, &desc.rasterization.depth_bias.unwrap_or_default());
            }
            DynamicState::BlendConstants => blend::emit_blend_constants(cs, self.blend.constants),
            DynamicState::DepthBounds => depth::emit_depth_bounds(
                cs,
                ds.depth_bounds.unwrap_or(DepthBounds { min: 0.0, max: 0.0 }),
            ),
            DynamicState::StencilCompareMask => {
                depth::emit_stencil_compare_mask(cs, ds.front.compare_mask, ds.back.compare_mask);
            }
            DynamicState::StencilWriteMask => {
                depth::emit_stencil_write_mask(cs, ds.front.write_mask, ds.back.write_mask);
            }
            DynamicState::StencilReference => {
                depth::emit_stencil_reference(cs, ds.front.reference, ds.back.reference);
            }
            DynamicState::SampleLocations => {
                msaa::emit_sample_locations(cs, desc.multisample.sample_locations.as_deref());
            }
        }
    }
}
