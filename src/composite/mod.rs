//! Effect compositing: strategies, the compositor, previews and the spot
//! pipeline.

pub mod pipeline;
pub mod preview;
pub mod strategy;
pub mod transit;

pub use pipeline::{EffectOutput, PipelineReport, SpotEffect, SpotOutcome, SpotPipeline, SpotReport, apply_spot};
pub use preview::{MaskPreview, PREVIEW_FLOOR, PreviewSources, render_mask_preview};
pub use strategy::{DeltaBuffers, DeltaStrategy, LabDifference, PixelDelta};
pub use transit::{CompositeInputs, blend_pixel, composite_spot, tool_gate};
