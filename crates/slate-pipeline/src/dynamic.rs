//! Dynamic-state categories and their patch-slot sizes.
//!
//! The descriptor declares which state categories the application sets at
//! draw time. Those categories are not baked; instead the build reserves a
//! zero-filled patch slot of a fixed, category-specific size, so the
//! stream layout never depends on draw-time values.

use crate::error::PipelineError;

/// Draw-time-mutable state categories, in API raw-value order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum DynamicState {
    Viewport = 0,
    Scissor = 1,
    LineWidth = 2,
    DepthBias = 3,
    BlendConstants = 4,
    DepthBounds = 5,
    StencilCompareMask = 6,
    StencilWriteMask = 7,
    StencilReference = 8,
    SampleLocations = 9,
}

impl DynamicState {
    pub const COUNT: usize = 10;

    pub const ALL: [DynamicState; Self::COUNT] = [
        DynamicState::Viewport,
        DynamicState::Scissor,
        DynamicState::LineWidth,
        DynamicState::DepthBias,
        DynamicState::BlendConstants,
        DynamicState::DepthBounds,
        DynamicState::StencilCompareMask,
        DynamicState::StencilWriteMask,
        DynamicState::StencilReference,
        DynamicState::SampleLocations,
    ];

    /// Decode a raw API value. Unknown values are an error: silently
    /// ignoring one would bake state the caller expects to change at draw
    /// time.
    pub fn from_raw(raw: u32) -> Result<Self, PipelineError> {
        Ok(match raw {
            0 => DynamicState::Viewport,
            1 => DynamicState::Scissor,
            2 => DynamicState::LineWidth,
            3 => DynamicState::DepthBias,
            4 => DynamicState::BlendConstants,
            5 => DynamicState::DepthBounds,
            6 => DynamicState::StencilCompareMask,
            7 => DynamicState::StencilWriteMask,
            8 => DynamicState::StencilReference,
            9 => DynamicState::SampleLocations,
            _ => return Err(PipelineError::UnsupportedDynamicState { raw }),
        })
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn bit(self) -> u32 {
        1 << self as u32
    }

    /// Patch-slot size in dwords. Fixed per category; the draw-time
    /// recorder fills the slot with the same packets the static path
    /// bakes.
    pub fn slot_size(self) -> u32 {
        match self {
            DynamicState::Viewport => 18,
            DynamicState::Scissor => 3,
            DynamicState::LineWidth => 2,
            DynamicState::DepthBias => 4,
            DynamicState::BlendConstants => 5,
            DynamicState::DepthBounds => 3,
            DynamicState::StencilCompareMask
            | DynamicState::StencilWriteMask
            | DynamicState::StencilReference => 2,
            DynamicState::SampleLocations => 9,
        }
    }
}

/// Parse the descriptor's raw dynamic-state list into a category mask.
pub fn parse_mask(raw: &[u32]) -> Result<u32, PipelineError> {
    let mut mask = 0;
    for &value in raw {
        mask |= DynamicState::from_raw(value)?.bit();
    }
    Ok(mask)
}
