// src/composite/transit.rs

//! Effect compositor.
//!
//! Blends a tool's full-strength delta back over the original region:
//!
//! ```text
//! factor = spatial(zone) * gate(dE) [* structure] * user_mask
//! output = clamp(original + factor * delta)
//! ```
//!
//! `spatial` is 1 inside, the transition weight in the falloff band and 0
//! outside (complemented for inverse spots). Outside pixels are copied from
//! the original untouched. Every written channel is clamped.

use crate::composite::strategy::{DeltaStrategy, PixelDelta};
use crate::gate::{Anchor, PerceptualGate};
use crate::image::color::{CHROMA_MAX, clamp_chroma, clamp_l};
use crate::image::geom::Rect;
use crate::image::lab_image::{LabImage, LabPixel};
use crate::mask::structure::{StructureMask, StructureTerm};
use crate::mask::user::LabMask;
use crate::reference::SpotReference;
use crate::spot::params::SpotParams;
use crate::spot::tools::Tool;
use crate::utils::error::{Result, SpotError};
use crate::utils::parallel::for_each_row_in_mut;
use crate::zone::ZoneClassifier;

/// Region-sized buffers and masks for one compositing call.
#[derive(Debug, Clone, Copy)]
pub struct CompositeInputs<'a> {
    /// Where the region sits in the output buffer.
    pub region: Rect,
    /// Original pixels of the region.
    pub original: &'a LabImage,
    /// Blurred original, gated against by tools that use the blurred
    /// reference.
    pub blurred: Option<&'a LabImage>,
    pub structure: Option<(&'a StructureMask, StructureTerm)>,
    pub user_mask: Option<&'a LabMask>,
}

impl<'a> CompositeInputs<'a> {
    pub fn new(region: Rect, original: &'a LabImage) -> Self {
        CompositeInputs {
            region,
            original,
            blurred: None,
            structure: None,
            user_mask: None,
        }
    }

    pub fn with_blurred(mut self, blurred: &'a LabImage) -> Self {
        self.blurred = Some(blurred);
        self
    }

    pub fn with_structure(mut self, mask: &'a StructureMask, term: StructureTerm) -> Self {
        self.structure = Some((mask, term));
        self
    }

    pub fn with_user_mask(mut self, mask: &'a LabMask) -> Self {
        self.user_mask = Some(mask);
        self
    }

    /// Entry preconditions: the region fits the output and every buffer
    /// has the region's size.
    fn check(&self, output: &LabImage, strategy_dims: (usize, usize)) -> Result<()> {
        let (ow, oh) = output.dimensions();
        if self.region.x < 0 || self.region.y < 0 || !output.bounds().contains_rect(&self.region) {
            return Err(SpotError::RegionOutOfBounds {
                region: self.region.as_tuple(),
                width: ow,
                height: oh,
            });
        }
        let expected = (self.region.width as usize, self.region.height as usize);
        let mut sizes = vec![self.original.dimensions(), strategy_dims];
        sizes.extend(self.blurred.map(|b| b.dimensions()));
        sizes.extend(self.structure.map(|(s, _)| s.mask.dimensions()));
        sizes.extend(self.user_mask.map(|m| m.dimensions()));
        match sizes.into_iter().find(|&d| d != expected) {
            Some(actual) => Err(SpotError::mismatch(expected, actual)),
            None => Ok(()),
        }
    }
}

/// Gate configured for one tool of one spot.
pub fn tool_gate(spot: &SpotParams, tool: &Tool) -> PerceptualGate {
    PerceptualGate::new(tool.sensitivity(), spot.gate.threshold, spot.gate.exponent)
        .with_weights(tool.delta_e_weights())
}

/// Blends `strategy`'s delta for `tool` into `output` over `inputs.region`.
///
/// Pixels of the region classified outside the spot receive the original
/// pixel; pixels of `output` outside the region are not touched.
pub fn composite_spot<S: DeltaStrategy>(
    spot: &SpotParams,
    tool: &Tool,
    reference: &SpotReference,
    inputs: &CompositeInputs<'_>,
    strategy: &S,
    output: &mut LabImage,
) -> Result<()> {
    inputs.check(output, strategy.dimensions())?;
    if inputs.region.is_empty() {
        return Ok(());
    }

    let classifier = ZoneClassifier::new(spot.geometry);
    let gate = tool_gate(spot, tool);
    let use_blurred = tool.uses_blurred_reference();
    let anchor = Anchor::from(&reference.anchor_color(use_blurred));
    let gating = if use_blurred { inputs.blurred } else { None };
    let policy = tool.channels();
    let blend = spot.user_mask.as_ref().map_or(1.0, |m| m.blend);
    let inverse = spot.inverse;

    let region = inputs.region;
    let width = output.width();
    let (rows, cols) = region.ranges();
    let x0 = cols.start;
    let y0 = rows.start;

    for_each_row_in_mut(output.pixels_mut(), width, rows, |y, out_row| {
        let r = y - y0;
        let original_row = inputs.original.row(r);
        let dst = &mut out_row[cols.clone()];
        if !inverse && classifier.row_is_outside(y as f32) {
            dst.copy_from_slice(original_row);
            return;
        }
        for (c, (out, orig)) in dst.iter_mut().zip(original_row).enumerate() {
            let x = x0 + c;
            let spatial = classifier.classify(x as f32, y as f32).spatial_weight(inverse);
            if spatial <= 0.0 {
                *out = *orig;
                continue;
            }
            let probe = gating.map_or(*orig, |b| b.get_pixel(r, c));
            let mut g = gate.evaluate(&probe, &anchor);
            if let Some((mask, term)) = inputs.structure {
                g = term.apply(g, mask.mask.get(r, c));
            }
            let (ml, mc) = inputs.user_mask.map_or((1.0, 1.0), |m| m.factors(r, c, blend));
            let fl = if policy.luma { spatial * g * ml } else { 0.0 };
            let fc = if policy.chroma { spatial * g * mc } else { 0.0 };
            *out = blend_pixel(orig, strategy.delta(r, c, orig), fl, fc);
        }
    });
    Ok(())
}

/// Applies a delta scaled by the luma and chroma factors, clamping every
/// channel. A zero factor leaves its channels untouched.
#[inline]
pub fn blend_pixel(original: &LabPixel, delta: PixelDelta, fl: f32, fc: f32) -> LabPixel {
    let (l, (a, b)) = match delta {
        PixelDelta::Lab { l, a, b } => {
            let ab = if fc > 0.0 {
                (original.a + fc * a, original.b + fc * b)
            } else {
                (original.a, original.b)
            };
            (l, ab)
        }
        PixelDelta::Polar { l, chroma, hue } => {
            let ab = if fc > 0.0 {
                let c = (original.chroma() + fc * chroma).clamp(0.0, CHROMA_MAX);
                let (sin, cos) = (original.hue() + fc * hue).sin_cos();
                (c * cos, c * sin)
            } else {
                (original.a, original.b)
            };
            (l, ab)
        }
    };
    let l = if fl > 0.0 { original.l + fl * l } else { original.l };
    let (a, b) = clamp_chroma(a, b);
    LabPixel::new(clamp_l(l), a, b)
}
