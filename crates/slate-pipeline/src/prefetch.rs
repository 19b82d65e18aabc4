//! Descriptor prefetch.
//!
//! Descriptor sets are reached through bindless base registers, so their
//! contents are not resident in the on-chip state caches until something
//! loads them. The pipeline bakes one run of `LOAD_STATE` packets covering
//! every descriptor its shaders statically reference; replaying the run at
//! bind time hides the first-use latency of each descriptor.
//!
//! The walk is driven purely by the pipeline layout plus the set-usage
//! mask reflected out of the compiled variants, so the run can be sized
//! with [`CountSink`](crate::stream::CountSink) and emitted into the
//! pipeline's stream with no divergence between the passes.

use slate_regs::enums::{StateBlock, StateSrc, StateType};
use slate_regs::limits::{PREFETCH_NUM_UNIT_MAX, TEX_CONST_DWORDS};
use slate_regs::pkt::{bindless_src_addr, CpOpcode, LoadStateControl};

use crate::layout::{descriptor_addr, DescriptorType, PipelineLayout};
use crate::shader::{Stage, StageFlags};
use crate::stream::CsSink;

fn load_state_packet<S: CsSink>(
    cs: &mut S,
    op: CpOpcode,
    ty: StateType,
    block: StateBlock,
    base: u32,
    offset: u32,
    count: u32,
) {
    cs.pkt_cmd(op, 3);
    cs.emit(
        LoadStateControl {
            dst_off: offset,
            ty,
            src: StateSrc::Bindless,
            block,
            num_unit: count.min(PREFETCH_NUM_UNIT_MAX),
        }
        .encode(),
    );
    cs.emit_qw(bindless_src_addr(base, offset));
}

fn stages_of(flags: StageFlags) -> impl Iterator<Item = Stage> {
    Stage::ALL
        .into_iter()
        .filter(move |s| flags.contains(StageFlags::from(*s)))
}

/// Emit the prefetch run for every binding the pipeline can see.
///
/// `active_sets` is the union of the per-variant set-usage masks; sets no
/// variant touches are skipped wholesale. Graphics pipelines prefetch for
/// the graphics stages only and compute pipelines for the compute stage,
/// so a layout shared between the two never cross-primes the wrong
/// caches.
pub(crate) fn emit_load_state<S: CsSink>(
    cs: &mut S,
    layout: &PipelineLayout,
    active_sets: u32,
    compute: bool,
) {
    for (i, set) in layout.sets.iter().enumerate() {
        if active_sets & (1 << i) == 0 {
            continue;
        }
        for binding in &set.bindings {
            let stages = if compute {
                binding.stages & StageFlags::COMPUTE
            } else {
                binding.stages & StageFlags::ALL_GRAPHICS
            };
            if binding.count == 0 || stages.is_empty() {
                continue;
            }
            let (base, offset) = descriptor_addr(i as u32, set, binding);
            match binding.ty {
                DescriptorType::StorageBuffer
                | DescriptorType::StorageBufferDynamic
                | DescriptorType::StorageImage
                | DescriptorType::StorageTexelBuffer => {
                    // Storage resources load into shared blocks: one
                    // packet serves every graphics stage, one more the
                    // compute stage.
                    if stages.intersects(StageFlags::ALL_GRAPHICS) {
                        load_state_packet(
                            cs,
                            CpOpcode::LoadState,
                            StateType::Shader,
                            StateBlock::Resource,
                            base,
                            offset,
                            binding.count,
                        );
                    }
                    if stages.contains(StageFlags::COMPUTE) {
                        load_state_packet(
                            cs,
                            CpOpcode::LoadStateFrag,
                            StateType::Resource,
                            StateBlock::CsResource,
                            base,
                            offset,
                            binding.count,
                        );
                    }
                }
                DescriptorType::Sampler
                | DescriptorType::SampledImage
                | DescriptorType::UniformTexelBuffer => {
                    let ty = if binding.ty == DescriptorType::Sampler {
                        StateType::Shader
                    } else {
                        StateType::Consts
                    };
                    for stage in stages_of(stages) {
                        load_state_packet(
                            cs,
                            stage.load_op(),
                            ty,
                            stage.tex_block(),
                            base,
                            offset,
                            binding.count,
                        );
                    }
                }
                DescriptorType::UniformBuffer | DescriptorType::UniformBufferDynamic => {
                    for stage in stages_of(stages) {
                        load_state_packet(
                            cs,
                            stage.load_op(),
                            StateType::Ubo,
                            stage.shader_block(),
                            base,
                            offset,
                            binding.count,
                        );
                    }
                }
                DescriptorType::CombinedImageSampler => {
                    // Texture and sampler words interleave within the
                    // binding, so array elements load one pair at a time.
                    for stage in stages_of(stages) {
                        for k in 0..binding.count {
                            load_state_packet(
                                cs,
                                stage.load_op(),
                                StateType::Consts,
                                stage.tex_block(),
                                base,
                                offset + 2 * k * TEX_CONST_DWORDS,
                                1,
                            );
                            load_state_packet(
                                cs,
                                stage.load_op(),
                                StateType::Shader,
                                stage.tex_block(),
                                base,
                                offset + (2 * k + 1) * TEX_CONST_DWORDS,
                                1,
                            );
                        }
                    }
                }
                // Input attachments resolve through the framebuffer
                // descriptors patched in at render-pass time; nothing to
                // prime here.
                DescriptorType::InputAttachment => {}
            }
        }
    }
}
