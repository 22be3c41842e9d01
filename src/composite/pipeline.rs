// src/composite/pipeline.rs

//! Ordered spot pipeline.
//!
//! Spots are applied one after another to a single mutable image, each
//! reading the state the previous spot left behind. Within a spot the tools
//! run in list order: each tool's collaborator receives a crop of the
//! current state around the spot (bounding box plus margin) and returns
//! either a processed crop or delta planes, which are composited back.
//!
//! Collaborator failures and scratch allocation failures skip the tool or
//! the refinement, never the run.

use crate::composite::preview::{MaskPreview, PreviewSources, render_mask_preview};
use crate::composite::strategy::{DeltaBuffers, LabDifference};
use crate::composite::transit::{CompositeInputs, composite_spot};
use crate::filters::blur::gaussian_blur_lab;
use crate::image::geom::Rect;
use crate::image::lab_image::{Channel, LabImage};
use crate::mask::structure::{StructureMask, StructureTerm, build_structure_mask};
use crate::mask::user::{LabMask, build_user_mask};
use crate::reference::{SpotReference, sample_reference};
use crate::spot::config::{SpotConfig, Viewport};
use crate::spot::params::SpotParams;
use crate::spot::tools::Tool;
use crate::utils::error::{Result, SpotError};
use crate::utils::log::{ScopedTimer, debug, trace, warn};

/// What a collaborator hands back for one tool.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectOutput {
    /// Processed crop, same size as the input crop.
    Processed(LabImage),
    /// Explicit delta planes, crop-sized.
    Deltas(DeltaBuffers),
}

/// The photographic algorithms behind the tools.
pub trait SpotEffect: Sync {
    /// Computes the full-strength edit of `tool` on `crop`.
    ///
    /// `Ok(None)` means the tool is not implemented and is skipped.
    fn apply(&self, tool: &Tool, crop: &LabImage, spot: &SpotParams) -> Result<Option<EffectOutput>>;
}

impl<F> SpotEffect for F
where
    F: Fn(&Tool, &LabImage, &SpotParams) -> Result<Option<EffectOutput>> + Sync,
{
    fn apply(&self, tool: &Tool, crop: &LabImage, spot: &SpotParams) -> Result<Option<EffectOutput>> {
        self(tool, crop, spot)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpotOutcome {
    /// The spot's region does not overlap the buffer.
    NoOverlap,
    /// The mask preview was written instead of the edit.
    Previewed(MaskPreview),
    Composited { applied: usize, skipped: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpotReport {
    pub name: String,
    pub region: Rect,
    pub outcome: SpotOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipelineReport {
    pub spots: Vec<SpotReport>,
}

impl PipelineReport {
    /// Tools composited across all spots.
    pub fn applied_tools(&self) -> usize {
        self.spots
            .iter()
            .map(|s| match s.outcome {
                SpotOutcome::Composited { applied, .. } => applied,
                _ => 0,
            })
            .sum()
    }

    /// Tools skipped across all spots.
    pub fn skipped_tools(&self) -> usize {
        self.spots
            .iter()
            .map(|s| match s.outcome {
                SpotOutcome::Composited { skipped, .. } => skipped,
                _ => 0,
            })
            .sum()
    }
}

/// Spots in user order over one working buffer.
#[derive(Debug, Clone)]
pub struct SpotPipeline {
    viewport: Viewport,
    spots: Vec<SpotConfig>,
}

impl SpotPipeline {
    pub fn new(viewport: Viewport) -> Self {
        SpotPipeline {
            viewport,
            spots: Vec::new(),
        }
    }

    pub fn with_spot(mut self, spot: SpotConfig) -> Self {
        self.spots.push(spot);
        self
    }

    pub fn spots(&self) -> &[SpotConfig] {
        &self.spots
    }

    /// Applies every spot in order to `image`.
    pub fn run(&self, image: &mut LabImage, effect: &dyn SpotEffect) -> Result<PipelineReport> {
        let _timer = ScopedTimer::new("spot pipeline");
        let mut report = PipelineReport::default();
        for config in &self.spots {
            let params = config.resolve(&self.viewport);
            report.spots.push(apply_spot(&params, image, effect)?);
        }
        debug!(
            "pipeline: {} spot(s), {} tool(s) applied, {} skipped",
            report.spots.len(),
            report.applied_tools(),
            report.skipped_tools()
        );
        Ok(report)
    }
}

/// Keeps recoverable failures as `None` after logging them.
fn optional<T>(what: &str, spot: &str, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(err) if err.is_recoverable() => {
            warn!("spot '{spot}': skipping {what}: {err}");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Structure mask of the current crop for `tool`, if it asks for one.
fn structure_for(spot: &SpotParams, tool: &Tool, crop: &LabImage) -> Result<Option<StructureMask>> {
    let strength = tool.structure_strength();
    if strength <= 0.0 {
        return Ok(None);
    }
    let built = build_structure_mask(
        &crop.channel(Channel::L),
        spot.structure_blur,
        spot.structure_radius(strength),
    );
    optional("structure mask", &spot.name, built)
}

/// Applies one resolved spot to `image`.
pub fn apply_spot(spot: &SpotParams, image: &mut LabImage, effect: &dyn SpotEffect) -> Result<SpotReport> {
    let _timer = ScopedTimer::new("spot");
    let (w, h) = image.dimensions();
    let region = spot.region(w, h);
    let mut report = SpotReport {
        name: spot.name.clone(),
        region,
        outcome: SpotOutcome::NoOverlap,
    };
    if region.is_empty() {
        debug!("spot '{}': no overlap with {w}x{h} buffer", spot.name);
        return Ok(report);
    }

    let want_blurred = spot.tools.iter().any(Tool::uses_blurred_reference);
    let reference = sample_reference(image, spot, want_blurred)?;
    let first_crop = image.crop(&region)?;
    let user_mask: Option<LabMask> = match &spot.user_mask {
        Some(settings) => optional("user mask", &spot.name, build_user_mask(&first_crop, settings))?,
        None => None,
    };

    if let Some(preview) = spot.preview {
        if preview_spot(spot, preview, region, &reference, &first_crop, user_mask.as_ref(), image)? {
            report.outcome = SpotOutcome::Previewed(preview);
            return Ok(report);
        }
    }

    let (mut applied, mut skipped) = (0, 0);
    for tool in &spot.tools {
        let crop = if applied == 0 { first_crop.clone() } else { image.crop(&region)? };
        let output = match optional("effect", &spot.name, effect.apply(tool, &crop, spot))? {
            Some(Some(output)) => output,
            Some(None) | None => {
                trace!("spot '{}': {:?} produced no edit", spot.name, tool.kind());
                skipped += 1;
                continue;
            }
        };

        let structure = structure_for(spot, tool, &crop)?;
        let blurred = if tool.uses_blurred_reference() {
            optional("blurred original", &spot.name, gaussian_blur_lab(&crop, spot.reference_blur))?
        } else {
            None
        };
        let refinements = Refinements {
            structure: structure.as_ref(),
            blurred: blurred.as_ref(),
            user_mask: user_mask.as_ref(),
        };
        composite_tool(spot, tool, &reference, region, &crop, &output, &refinements, image)?;
        trace!("spot '{}': composited {:?}", spot.name, tool.kind());
        applied += 1;
    }

    debug!(
        "spot '{}': region {:?}, {applied} tool(s) applied, {skipped} skipped",
        spot.name,
        region.as_tuple()
    );
    report.outcome = SpotOutcome::Composited { applied, skipped };
    Ok(report)
}

/// Optional per-tool inputs; any of them may have been dropped.
#[derive(Default)]
struct Refinements<'a> {
    structure: Option<&'a StructureMask>,
    blurred: Option<&'a LabImage>,
    user_mask: Option<&'a LabMask>,
}

/// Blends one tool's output back into `image` over `region`.
#[allow(clippy::too_many_arguments)]
fn composite_tool(
    spot: &SpotParams,
    tool: &Tool,
    reference: &SpotReference,
    region: Rect,
    crop: &LabImage,
    output: &EffectOutput,
    refinements: &Refinements<'_>,
    image: &mut LabImage,
) -> Result<()> {
    let mut inputs = CompositeInputs::new(region, crop);
    if let Some(mask) = refinements.structure {
        let term = StructureTerm::new(tool.structure_strength(), reference.sobel, mask.mean_edge);
        inputs = inputs.with_structure(mask, term);
    }
    if let Some(blurred) = refinements.blurred {
        inputs = inputs.with_blurred(blurred);
    }
    if let Some(mask) = refinements.user_mask {
        inputs = inputs.with_user_mask(mask);
    }

    match output {
        EffectOutput::Processed(processed) => {
            composite_spot(spot, tool, reference, &inputs, &LabDifference::new(processed), image)
        }
        EffectOutput::Deltas(deltas) => {
            deltas.validate()?;
            composite_spot(spot, tool, reference, &inputs, deltas, image)
        }
    }
}

/// Writes the preview; `false` when the requested mask does not exist and
/// the spot should be composited normally.
fn preview_spot(
    spot: &SpotParams,
    preview: MaskPreview,
    region: Rect,
    reference: &SpotReference,
    crop: &LabImage,
    user_mask: Option<&LabMask>,
    image: &mut LabImage,
) -> Result<bool> {
    let structure_tool = spot.tools.iter().find(|t| t.structure_strength() > 0.0);
    let structure = match (preview, structure_tool) {
        (MaskPreview::Structure, Some(tool)) => structure_for(spot, tool, crop)?,
        _ => None,
    };
    let sources = PreviewSources {
        original: Some(crop),
        reference: Some(reference),
        tool: spot.tools.first(),
        user_mask,
        structure: structure.as_ref(),
    };
    match render_mask_preview(spot, preview, region, &sources, image) {
        Ok(()) => Ok(true),
        Err(SpotError::InvalidArg(msg)) => {
            warn!("spot '{}': {msg}, compositing instead", spot.name);
            Ok(false)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::lab_image::LabPixel;
    use crate::spot::params::SpotGeometry;

    fn brighten(tool: &Tool, crop: &LabImage, _spot: &SpotParams) -> Result<Option<EffectOutput>> {
        match tool {
            Tool::Exposure(_) => {
                let mut out = crop.clone();
                for p in out.pixels_mut() {
                    p.l += 1000.0;
                }
                Ok(Some(EffectOutput::Processed(out)))
            }
            Tool::Denoise(_) => Err(SpotError::Effect("out of memory".into())),
            _ => Ok(None),
        }
    }

    fn spot() -> SpotParams {
        SpotParams::from_geometry(SpotGeometry::ellipse(30.0, 30.0, 10.0, 10.0, 0.6))
    }

    #[test]
    fn test_failed_and_missing_tools_are_skipped() {
        let mut image = LabImage::from_pixel(60, 60, LabPixel::gray(10000.0));
        let spot = spot()
            .with_tool(Tool::denoise(100.0, false))
            .with_tool(Tool::vibrance(100.0))
            .with_tool(Tool::exposure(100.0, 0.0));
        let report = apply_spot(&spot, &mut image, &brighten).unwrap();
        assert_eq!(report.outcome, SpotOutcome::Composited { applied: 1, skipped: 2 });
        assert_eq!(image.get_pixel(30, 30).l, 11000.0);
        assert_eq!(image.get_pixel(0, 0).l, 10000.0);
    }

    #[test]
    fn test_tools_accumulate_in_order() {
        let mut image = LabImage::from_pixel(60, 60, LabPixel::gray(10000.0));
        let spot = spot()
            .with_tool(Tool::exposure(100.0, 0.0))
            .with_tool(Tool::exposure(100.0, 0.0));
        apply_spot(&spot, &mut image, &brighten).unwrap();
        assert_eq!(image.get_pixel(30, 30).l, 12000.0);
    }

    #[test]
    fn test_spot_off_buffer_reports_no_overlap() {
        let mut image = LabImage::from_pixel(20, 20, LabPixel::gray(10000.0));
        let spot = SpotParams::from_geometry(SpotGeometry::ellipse(-400.0, 5.0, 5.0, 5.0, 0.5))
            .with_tool(Tool::exposure(100.0, 0.0));
        let report = apply_spot(&spot, &mut image, &brighten).unwrap();
        assert_eq!(report.outcome, SpotOutcome::NoOverlap);
    }

    #[test]
    fn test_allocation_failure_drops_only_the_refinement() {
        let dropped = optional::<StructureMask>(
            "structure mask",
            "sky",
            Err(SpotError::Allocation { bytes: usize::MAX }),
        )
        .unwrap();
        assert!(dropped.is_none());
        let fatal = optional::<StructureMask>("structure mask", "sky", Err(SpotError::InvalidArg("radius".into())));
        assert!(matches!(fatal, Err(SpotError::InvalidArg(_))));

        let mut image = LabImage::from_pixel(60, 60, LabPixel::gray(10000.0));
        let mut tool = Tool::exposure(100.0, 0.0);
        if let Tool::Exposure(p) = &mut tool {
            p.structure = 80.0;
        }
        let spot = spot().with_tool(tool.clone());
        let region = spot.region(60, 60);
        let crop = image.crop(&region).unwrap();
        let reference = sample_reference(&image, &spot, false).unwrap();
        let output = brighten(&tool, &crop, &spot).unwrap().unwrap();
        let refinements = Refinements {
            structure: dropped.as_ref(),
            ..Default::default()
        };
        composite_tool(&spot, &tool, &reference, region, &crop, &output, &refinements, &mut image).unwrap();
        assert_eq!(image.get_pixel(30, 30).l, 11000.0);
        assert_eq!(image.get_pixel(0, 0).l, 10000.0);
    }

    #[test]
    fn test_missing_preview_mask_falls_back_to_compositing() {
        let mut image = LabImage::from_pixel(60, 60, LabPixel::gray(10000.0));
        let mut spot = spot().with_tool(Tool::exposure(100.0, 0.0));
        spot.preview = Some(MaskPreview::UserMask);
        let report = apply_spot(&spot, &mut image, &brighten).unwrap();
        assert_eq!(report.outcome, SpotOutcome::Composited { applied: 1, skipped: 0 });
    }
}
