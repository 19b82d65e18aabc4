#![allow(dead_code)]

//! Shared fixtures for the pipeline integration tests: a canned shader
//! resolver, variant and descriptor factories, and walkers that decode an
//! emitted stream span back into register writes.

use std::cell::RefCell;
use std::sync::Arc;

use hashbrown::HashMap;
use slate_pipeline::descriptor::{
    AttachmentSet, BlendAttachment, BlendState, ColorFormat, Rect2D, Viewport, ViewportState,
};
use slate_pipeline::layout::{BindingLayout, DescriptorType};
use slate_pipeline::shader::{IoSlot, Slot};
use slate_pipeline::{
    DeviceInfo, DrawState, Pipeline, PipelineBuilder, PipelineDescriptor, PipelineError,
    PipelineLayout, ShaderKey, ShaderResolver, ShaderVariant, Stage, StageFlags, TessPrimitive,
};
use slate_regs::limits::{INSTR_UNIT_DWORDS, SAFE_CONSTLEN_VEC4};
use slate_regs::pkt::{decode_hdr, PktHdr};
use slate_regs::regid;

/// Stream backing-store base for every test build. 128-byte aligned, as
/// the shader object-start registers require.
pub const BASE_IOVA: u64 = 0x1_0000_0000;

pub fn device() -> DeviceInfo {
    DeviceInfo {
        gpu_id: 630,
        stream_iova: BASE_IOVA,
    }
}

pub fn device_650() -> DeviceInfo {
    DeviceInfo {
        gpu_id: 650,
        stream_iova: BASE_IOVA,
    }
}

/// Minimal viable variant: two instruction fetch units, a small constant
/// window, no I/O.
pub fn shader(stage: Stage) -> ShaderVariant {
    let mut v = ShaderVariant::empty(stage);
    v.code = vec![0; INSTR_UNIT_DWORDS as usize * 2];
    v.constlen = 8;
    v.full_regs = 4;
    v.half_regs = 1;
    v.branch_stack = 2;
    v
}

pub fn io(slot: Slot, regid: u8, compmask: u8, loc: u8) -> IoSlot {
    IoSlot {
        slot,
        regid,
        compmask,
        loc,
        flat: false,
    }
}

/// Vertex stage writing position plus `n` vec4 varyings.
pub fn vertex_shader(n: u8) -> ShaderVariant {
    let mut vs = shader(Stage::Vertex);
    vs.outputs.push(io(Slot::Position, regid(0, 0), 0xf, 0));
    for i in 0..n {
        vs.outputs.push(io(Slot::Varying(i), regid(1 + i, 0), 0xf, 0));
    }
    vs
}

/// Fragment stage consuming `n` vec4 varyings at packed locations.
pub fn fragment_shader(n: u8) -> ShaderVariant {
    let mut fs = shader(Stage::Fragment);
    for i in 0..n {
        fs.inputs.push(io(Slot::Varying(i), regid(i, 0), 0xf, i * 4));
    }
    fs.total_in = u32::from(n) * 4;
    fs
}

/// Position-only stand-in for the binning pass. One fetch unit, so tests
/// can tell its upload apart from the full vertex shader's.
pub fn binning_shader() -> ShaderVariant {
    let mut vs = shader(Stage::Vertex);
    vs.code = vec![0; INSTR_UNIT_DWORDS as usize];
    vs.outputs.push(io(Slot::Position, regid(0, 0), 0xf, 0));
    vs
}

/// One-color-attachment descriptor with every state category static.
pub fn graphics_descriptor() -> PipelineDescriptor {
    PipelineDescriptor {
        stages: StageFlags::VERTEX | StageFlags::FRAGMENT,
        viewport: ViewportState {
            viewport: Viewport {
                x: 0.0,
                y: 0.0,
                width: 256.0,
                height: 128.0,
                min_depth: 0.0,
                max_depth: 1.0,
            },
            scissor: Rect2D {
                x: 0,
                y: 0,
                width: 256,
                height: 128,
            },
        },
        blend: BlendState {
            attachments: vec![BlendAttachment::default()],
            ..BlendState::default()
        },
        attachments: AttachmentSet {
            colors: vec![Some(ColorFormat::Rgba8Unorm)],
            depth: None,
        },
        ..PipelineDescriptor::default()
    }
}

pub fn binding(ty: DescriptorType, count: u32, stages: StageFlags) -> BindingLayout {
    BindingLayout {
        ty,
        count,
        stages,
        offset: 0,
        dynamic_offset_index: 0,
    }
}

/// Canned [`ShaderResolver`]: one variant per stage, every resolution
/// recorded so tests can assert on the keys a build derives.
pub struct FakeResolver {
    variants: HashMap<Stage, ShaderVariant>,
    binning: Option<ShaderVariant>,
    pub calls: RefCell<Vec<(Stage, ShaderKey)>>,
    pub binning_calls: RefCell<Vec<ShaderKey>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        FakeResolver {
            variants: HashMap::new(),
            binning: None,
            calls: RefCell::new(Vec::new()),
            binning_calls: RefCell::new(Vec::new()),
        }
    }

    /// Vertex + fragment + binning set most tests start from.
    pub fn basic() -> Self {
        FakeResolver::new()
            .with(vertex_shader(1))
            .with(fragment_shader(1))
            .with_binning(binning_shader())
    }

    pub fn with(mut self, variant: ShaderVariant) -> Self {
        self.variants.insert(variant.stage, variant);
        self
    }

    pub fn with_binning(mut self, variant: ShaderVariant) -> Self {
        self.binning = Some(variant);
        self
    }

    /// Key the most recent resolution of `stage` used.
    pub fn key_for(&self, stage: Stage) -> ShaderKey {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find(|(s, _)| *s == stage)
            .map(|(_, key)| *key)
            .unwrap_or_else(|| panic!("no resolve call recorded for {stage:?}"))
    }
}

impl ShaderResolver for FakeResolver {
    fn tess_primitive(&self, stage: Stage) -> Option<TessPrimitive> {
        self.variants
            .get(&stage)
            .and_then(|v| v.tess.map(|t| t.primitive))
    }

    fn writes_layer(&self, stage: Stage) -> bool {
        self.variants
            .get(&stage)
            .is_some_and(|v| v.find_output(Slot::Layer).is_some())
    }

    fn resolve(&self, stage: Stage, key: &ShaderKey) -> Result<Arc<ShaderVariant>, PipelineError> {
        self.calls.borrow_mut().push((stage, *key));
        let mut variant =
            self.variants
                .get(&stage)
                .cloned()
                .ok_or_else(|| PipelineError::ShaderRejected {
                    stage,
                    reason: "no canned variant".to_owned(),
                })?;
        if key.safe_constlen {
            variant.constlen = variant.constlen.min(SAFE_CONSTLEN_VEC4);
        }
        Ok(Arc::new(variant))
    }

    fn resolve_binning(&self, key: &ShaderKey) -> Result<Arc<ShaderVariant>, PipelineError> {
        self.binning_calls.borrow_mut().push(*key);
        let variant = self
            .binning
            .clone()
            .ok_or_else(|| PipelineError::ShaderRejected {
                stage: Stage::Vertex,
                reason: "no canned binning variant".to_owned(),
            })?;
        Ok(Arc::new(variant))
    }
}

pub fn build(
    descriptor: &PipelineDescriptor,
    layout: &PipelineLayout,
    resolver: &FakeResolver,
) -> Result<Pipeline, PipelineError> {
    PipelineBuilder::new(device(), descriptor, layout, resolver).build()
}

/// The stream words a draw-state handle covers.
pub fn span(pipeline: &Pipeline, state: DrawState) -> &[u32] {
    let stream = pipeline.stream();
    let start = ((state.iova - stream.base_iova()) / 4) as usize;
    &stream.words()[start..start + state.size as usize]
}

/// Walk `words` as packets and flatten register packets into
/// `(reg, value)` pairs. Command-packet payloads are skipped. Panics when
/// a header is malformed or a packet overruns the span, so every caller
/// doubles as a framing check.
pub fn reg_writes(words: &[u32]) -> Vec<(u16, u32)> {
    let mut writes = Vec::new();
    let mut i = 0;
    while i < words.len() {
        match decode_hdr(words[i]) {
            Some(PktHdr::Reg { reg, count }) => {
                for k in 0..count {
                    writes.push((reg + k, words[i + 1 + k as usize]));
                }
                i += 1 + count as usize;
            }
            Some(PktHdr::Cmd { count, .. }) => {
                i += 1 + count as usize;
            }
            None => panic!("bad packet header {:#010x} at dword {i}", words[i]),
        }
    }
    assert_eq!(i, words.len(), "packet framing overruns the span");
    writes
}

/// Last value written to `reg` within `words`.
pub fn reg_value(words: &[u32], reg: u16) -> u32 {
    reg_writes(words)
        .into_iter()
        .rev()
        .find(|&(r, _)| r == reg)
        .map(|(_, value)| value)
        .unwrap_or_else(|| panic!("register {reg:#06x} never written"))
}
