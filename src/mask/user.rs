// src/mask/user.rs

//! User mask curve evaluator.
//!
//! Up to three curves index the pixel by normalized lightness, normalized
//! chroma and hue. A curve value of 1 excludes the pixel, 0 fully includes
//! it, so each enabled curve contributes `1 - curve(index)`. Contributions
//! are summed (not multiplied) into a lightness mask and a chroma mask:
//!
//! - lightness mask: luminance curve + hue curve
//! - chroma mask: chroma curve + hue curve
//!
//! A mask with no contributing curve is 1. The raw masks are refined with
//! the guided filter, steered by the region's lightness.

use crate::filters::guided::{DEFAULT_EPS, guided_filter};
use crate::image::array2d::Array2D;
use crate::image::color::{CHROMA_MAX, L_MAX, LAB_SCALE, hue_to_unit};
use crate::image::lab_image::{Channel, LabImage, LabPixel};
use crate::mask::curve::MaskCurve;
use crate::spot::params::UserMaskSettings;
use crate::utils::error::Result;
use crate::utils::log::ScopedTimer;
use crate::utils::parallel::for_each_row_mut;

/// Chroma, on the 0..100 scale, mapped to the top of the chroma curve.
const CHROMA_INDEX_SPAN: f32 = 100.0;

/// The curves a user can draw for a spot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserMaskCurves {
    pub luminance: Option<MaskCurve>,
    pub chroma: Option<MaskCurve>,
    /// Should be periodic.
    pub hue: Option<MaskCurve>,
}

impl UserMaskCurves {
    /// True when at least one curve would exclude some pixel.
    pub fn is_active(&self) -> bool {
        [&self.luminance, &self.chroma, &self.hue]
            .into_iter()
            .flatten()
            .any(|curve| !curve.is_neutral())
    }

    /// Raw `(lightness, chroma)` mask values of one pixel, before refinement.
    /// Neutral curves do not contribute.
    pub fn evaluate(&self, pixel: &LabPixel) -> (f32, f32) {
        let chroma = pixel.chroma().min(CHROMA_MAX);
        let hue_term = contributing(&self.hue).map(|curve| 1.0 - curve.eval(hue_to_unit(pixel.hue())));
        let luma_term = contributing(&self.luminance).map(|curve| 1.0 - curve.eval(pixel.l / L_MAX));
        let chroma_term = contributing(&self.chroma)
            .map(|curve| 1.0 - curve.eval(chroma / LAB_SCALE / CHROMA_INDEX_SPAN));
        (combine(luma_term, hue_term), combine(chroma_term, hue_term))
    }
}

fn contributing(curve: &Option<MaskCurve>) -> Option<&MaskCurve> {
    curve.as_ref().filter(|curve| !curve.is_neutral())
}

fn combine(first: Option<f32>, second: Option<f32>) -> f32 {
    match (first, second) {
        (None, None) => 1.0,
        (a, b) => (a.unwrap_or(0.0) + b.unwrap_or(0.0)).clamp(0.0, 1.0),
    }
}

/// Refined user mask over a region, values in `[0, 1]`.
/// The `a` and `b` channels share the chroma mask.
#[derive(Debug, Clone, PartialEq)]
pub struct LabMask {
    pub luma: Array2D<f32>,
    pub chroma: Array2D<f32>,
}

impl LabMask {
    pub fn dimensions(&self) -> (usize, usize) {
        self.luma.dimensions()
    }

    /// `(luma, chroma)` factors at a position for a blend strength in 0..1.
    #[inline]
    pub fn factors(&self, row: usize, col: usize, blend: f32) -> (f32, f32) {
        let l = self.luma.get(row, col);
        let c = self.chroma.get(row, col);
        (1.0 - blend * (1.0 - l), 1.0 - blend * (1.0 - c))
    }
}

/// Evaluates the curves over `region` and refines both masks.
pub fn build_user_mask(region: &LabImage, settings: &UserMaskSettings) -> Result<LabMask> {
    let _timer = ScopedTimer::new("user mask");
    let (w, h) = region.dimensions();
    let curves = &settings.curves;

    let mut luma_raw = Array2D::try_filled(w, h, 1.0f32)?;
    let mut chroma_raw = Array2D::try_filled(w, h, 1.0f32)?;
    for_each_row_mut(luma_raw.as_mut_slice(), w, |row, dst| {
        for (col, value) in dst.iter_mut().enumerate() {
            *value = curves.evaluate(&region.get_pixel(row, col)).0;
        }
    });
    for_each_row_mut(chroma_raw.as_mut_slice(), w, |row, dst| {
        for (col, value) in dst.iter_mut().enumerate() {
            *value = curves.evaluate(&region.get_pixel(row, col)).1;
        }
    });

    let guide = region.channel(Channel::L).map(|l| (l / L_MAX).clamp(0.0, 1.0));
    let mut luma = guided_filter(&guide, &luma_raw, settings.radius, DEFAULT_EPS)?;
    let mut chroma = guided_filter(&guide, &chroma_raw, settings.chroma_radius, DEFAULT_EPS)?;
    for v in luma.as_mut_slice().iter_mut().chain(chroma.as_mut_slice().iter_mut()) {
        *v = v.clamp(0.0, 1.0);
    }
    Ok(LabMask { luma, chroma })
}
