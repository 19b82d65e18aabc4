//! Pipeline binding interface: descriptor-set layouts.
//!
//! Sets are backed by bindless descriptor memory; the pipeline only needs
//! the shape of each set (binding classes, stage visibility, offsets) to
//! emit prefetch packets and to tell the draw-time binder where dynamic
//! buffer descriptors land.

use slate_regs::limits::{DYNAMIC_SET_BASE, MAX_SETS, TEX_CONST_DWORDS};

use crate::shader::StageFlags;

/// Descriptor binding classes the prefetch engine distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorType {
    Sampler,
    CombinedImageSampler,
    SampledImage,
    StorageImage,
    UniformTexelBuffer,
    StorageTexelBuffer,
    UniformBuffer,
    UniformBufferDynamic,
    StorageBuffer,
    StorageBufferDynamic,
    /// Read through the resource path at draw time; never prefetched.
    InputAttachment,
}

/// One binding of a set layout.
#[derive(Debug, Clone)]
pub struct BindingLayout {
    pub ty: DescriptorType,
    /// Array length; arrayed descriptors are laid out consecutively.
    pub count: u32,
    /// Stages that may access the binding.
    pub stages: StageFlags,
    /// Byte offset of the binding's first descriptor inside the set.
    pub offset: u32,
    /// Dynamic buffer bindings: index of the binding's first slot among
    /// the set's dynamic descriptors.
    pub dynamic_offset_index: u32,
}

/// One descriptor-set layout.
#[derive(Debug, Clone, Default)]
pub struct SetLayout {
    pub bindings: Vec<BindingLayout>,
    /// First slot of this set within the pipeline's dynamic descriptor
    /// area.
    pub dynamic_offset_start: u32,
}

/// The full binding interface: at most [`MAX_SETS`] set layouts.
#[derive(Debug, Clone, Default)]
pub struct PipelineLayout {
    pub sets: Vec<SetLayout>,
}

impl PipelineLayout {
    pub fn new(sets: Vec<SetLayout>) -> Self {
        debug_assert!(sets.len() <= MAX_SETS as usize);
        PipelineLayout { sets }
    }
}

/// Bindless source coordinates of a binding: descriptor base index plus
/// dword offset within that base.
///
/// Dynamic buffer descriptors are gathered into the reserved dynamic base
/// at bind time, so both dynamic classes resolve through the same
/// arithmetic: the set's slice of the dynamic area, then the binding's
/// slot within the slice.
pub(crate) fn descriptor_addr(
    set_index: u32,
    set: &SetLayout,
    binding: &BindingLayout,
) -> (u32, u32) {
    match binding.ty {
        DescriptorType::UniformBufferDynamic | DescriptorType::StorageBufferDynamic => (
            DYNAMIC_SET_BASE,
            (set.dynamic_offset_start + binding.dynamic_offset_index) * TEX_CONST_DWORDS,
        ),
        _ => (set_index, binding.offset / 4),
    }
}
