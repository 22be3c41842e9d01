//! Local-adjustment spot compositing.
//!
//! This crate decides, for every pixel and every spot, how much of an edit
//! to apply. A spot is a user-placed region (ellipse or rectangle with four
//! independent extents and a soft transition band) carrying a list of tools.
//! Each tool's photographic algorithm lives outside the crate and only
//! supplies a "processed" buffer or delta planes; the crate blends it back
//! through:
//!
//! - a spatial weight from the [`zone`] classifier,
//! - a perceptual [`gate`] on the colour distance to the spot's reference,
//! - optional structure (edge) and user-curve [`mask`]s.
//!
//! # Quick Start
//!
//! ```
//! use spotblend::{
//!     EffectOutput, LabImage, LabPixel, Result, SpotConfig, SpotParams, SpotPipeline, Tool, Viewport,
//! };
//!
//! let mut image = LabImage::from_pixel(200, 100, LabPixel::gray(12000.0));
//!
//! let brighten = |_tool: &Tool, crop: &LabImage, _spot: &SpotParams| -> Result<Option<EffectOutput>> {
//!     let mut out = crop.clone();
//!     for p in out.pixels_mut() {
//!         p.l += 2000.0;
//!     }
//!     Ok(Some(EffectOutput::Processed(out)))
//! };
//!
//! let pipeline = SpotPipeline::new(Viewport::full(200, 100))
//!     .with_spot(SpotConfig::new("sky").with_tool(Tool::exposure(60.0, 0.5)));
//! let report = pipeline.run(&mut image, &brighten)?;
//! assert_eq!(report.applied_tools(), 1);
//! assert_eq!(image.get_pixel(50, 100).l, 14000.0);
//! # Ok::<(), spotblend::SpotError>(())
//! ```
//!
//! # Features
//!
//! - **Ordered spots**: spots apply in list order over one mutable buffer
//! - **Collaborator-agnostic**: any [`SpotEffect`] can drive a tool
//! - **Optional parallelism**: the default `rayon` feature spreads rows over
//!   the global thread pool

pub mod composite;
pub mod filters;
pub mod gate;
pub mod image;
pub mod mask;
pub mod reference;
pub mod spot;
pub mod utils;
pub mod zone;

// Pipeline and collaborator API
pub use composite::{
    CompositeInputs, DeltaBuffers, DeltaStrategy, EffectOutput, LabDifference, MaskPreview, PipelineReport,
    PixelDelta, SpotEffect, SpotOutcome, SpotPipeline, SpotReport, apply_spot, composite_spot,
    render_mask_preview,
};

// Configuration
pub use spot::{ExtentMode, Shape, SpotConfig, SpotGeometry, SpotParams, Tool, ToolKind, UserMaskConfig, Viewport};

// Per-pixel building blocks
pub use gate::{DeltaEWeights, PerceptualGate};
pub use reference::{ReferenceColor, SpotReference, sample_reference};
pub use zone::{Zone, ZoneClassifier, ZoneSample};

// Masks
pub use mask::{LabMask, MaskCurve, StructureMask, UserMaskCurves};

// Buffers
pub use crate::image::{Array2D, LabImage, LabPixel, Rect};

// Error types
pub use utils::error::{Result, SpotError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api_pipeline() {
        let mut image = LabImage::from_pixel(80, 60, LabPixel::gray(10000.0));
        let pipeline = SpotPipeline::new(Viewport::full(80, 60));
        let untouched = |_: &Tool, _: &LabImage, _: &SpotParams| -> Result<Option<EffectOutput>> { Ok(None) };
        let report = pipeline.run(&mut image, &untouched).unwrap();
        assert!(report.spots.is_empty());
        assert_eq!(image.get_pixel(0, 0).l, 10000.0);
    }

    #[test]
    fn test_zone_api_is_pure() {
        let classifier = ZoneClassifier::new(SpotGeometry::ellipse(10.0, 10.0, 5.0, 5.0, 0.5));
        assert_eq!(classifier.classify(10.0, 10.0).zone, Zone::Inside);
        assert_eq!(classifier.classify(30.0, 10.0).zone, Zone::Outside);
    }
}
