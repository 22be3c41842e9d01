// src/composite/strategy.rs

//! Delta-producing strategies.
//!
//! The compositor never knows which tool produced an edit. It asks a
//! [`DeltaStrategy`] for the full-strength change at each position of the
//! region and scales it. Two strategies cover the collaborators:
//!
//! - [`LabDifference`]: a processed buffer, the delta is `processed - original`.
//! - [`DeltaBuffers`]: explicit lightness, chroma, `a`/`b` and optional hue
//!   delta planes.
//!
//! Non-finite deltas count as no change.

use crate::image::array2d::Array2D;
use crate::image::color::hue_sin_cos;
use crate::image::lab_image::{LabImage, LabPixel};
use crate::utils::error::{Result, SpotError};

/// Full-strength change of one pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PixelDelta {
    /// Added channel by channel.
    Lab { l: f32, a: f32, b: f32 },
    /// Chroma magnitude change plus hue rotation in radians; `a`/`b` are
    /// rebuilt from the new polar form.
    Polar { l: f32, chroma: f32, hue: f32 },
}

pub trait DeltaStrategy: Sync {
    /// `(width, height)` of the region the strategy covers.
    fn dimensions(&self) -> (usize, usize);

    /// Change at region position `(row, col)` whose original pixel is
    /// `original`.
    fn delta(&self, row: usize, col: usize, original: &LabPixel) -> PixelDelta;
}

/// Delta between a processed buffer and the original it was computed from.
#[derive(Debug, Clone, Copy)]
pub struct LabDifference<'a> {
    processed: &'a LabImage,
}

impl<'a> LabDifference<'a> {
    pub fn new(processed: &'a LabImage) -> Self {
        LabDifference { processed }
    }
}

impl DeltaStrategy for LabDifference<'_> {
    fn dimensions(&self) -> (usize, usize) {
        self.processed.dimensions()
    }

    #[inline]
    fn delta(&self, row: usize, col: usize, original: &LabPixel) -> PixelDelta {
        let p = self.processed.get_pixel(row, col);
        PixelDelta::Lab {
            l: finite_or_zero(p.l - original.l),
            a: finite_or_zero(p.a - original.a),
            b: finite_or_zero(p.b - original.b),
        }
    }
}

/// Per-pixel delta planes produced by a collaborator, all region-sized.
///
/// Without a hue plane the chroma delta is applied along the original
/// pixel's hue and the `a`/`b` deltas are added on top. With a hue plane
/// the `a`/`b` deltas are projected onto the radial direction and folded
/// into the chroma delta, and the result is recombined from polar form.
#[derive(Debug, Clone, PartialEq)]
pub struct DeltaBuffers {
    pub lightness: Array2D<f32>,
    pub chroma: Array2D<f32>,
    pub a: Array2D<f32>,
    pub b: Array2D<f32>,
    pub hue: Option<Array2D<f32>>,
}

impl DeltaBuffers {
    /// Zeroed planes of the given size.
    pub fn zeros(width: usize, height: usize) -> Result<Self> {
        Ok(DeltaBuffers {
            lightness: Array2D::try_filled(width, height, 0.0)?,
            chroma: Array2D::try_filled(width, height, 0.0)?,
            a: Array2D::try_filled(width, height, 0.0)?,
            b: Array2D::try_filled(width, height, 0.0)?,
            hue: None,
        })
    }

    /// Checks that every plane has the lightness plane's size.
    pub fn validate(&self) -> Result<()> {
        let expected = self.lightness.dimensions();
        let planes = [Some(&self.chroma), Some(&self.a), Some(&self.b), self.hue.as_ref()];
        for plane in planes.into_iter().flatten() {
            if plane.dimensions() != expected {
                return Err(SpotError::mismatch(expected, plane.dimensions()));
            }
        }
        Ok(())
    }
}

impl DeltaStrategy for DeltaBuffers {
    fn dimensions(&self) -> (usize, usize) {
        self.lightness.dimensions()
    }

    #[inline]
    fn delta(&self, row: usize, col: usize, original: &LabPixel) -> PixelDelta {
        let l = finite_or_zero(self.lightness.get(row, col));
        let dc = finite_or_zero(self.chroma.get(row, col));
        let da = finite_or_zero(self.a.get(row, col));
        let db = finite_or_zero(self.b.get(row, col));
        let (sin, cos) = hue_sin_cos(original.a, original.b);
        match &self.hue {
            Some(hue) => PixelDelta::Polar {
                l,
                chroma: finite_or_zero(dc + da * cos + db * sin),
                hue: finite_or_zero(hue.get(row, col)),
            },
            None => PixelDelta::Lab {
                l,
                a: finite_or_zero(da + dc * cos),
                b: finite_or_zero(db + dc * sin),
            },
        }
    }
}

#[inline]
fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}
