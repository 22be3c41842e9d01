// src/reference.rs

//! Reference sampler.
//!
//! A spot's anchor colour is the average of a small disk around the spot
//! centre in the original buffer. Hue comes from the mean opponent vector,
//! chroma is the mean of the per-pixel magnitudes (not the magnitude of the
//! mean), luma is the mean lightness capped at [`MAX_REFERENCE_LUMA`].
//! All values are on the 0..100 scale.

use crate::filters::blur::{gaussian_blur, gaussian_blur_lab};
use crate::filters::sobel::{mean_interior, sobel_magnitude};
use crate::image::array2d::Array2D;
use crate::image::color::{self, LAB_SCALE};
use crate::image::geom::Rect;
use crate::image::lab_image::{Channel, LabImage};
use crate::spot::params::SpotParams;
use crate::utils::error::Result;
use crate::utils::log::{debug, warn};
use crate::utils::parallel::map_indices;

/// Luma cap, keeps near-white anchors stable.
pub const MAX_REFERENCE_LUMA: f32 = 95.0;

/// Anchor colour of a spot: hue in radians, chroma and luma on 0..100.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceColor {
    pub hue: f32,
    pub chroma: f32,
    pub luma: f32,
}

impl ReferenceColor {
    /// Mid-grey, used when the sampling disk misses the buffer.
    pub const NEUTRAL: ReferenceColor = ReferenceColor {
        hue: 0.0,
        chroma: 0.0,
        luma: 50.0,
    };
}

/// Everything sampled once per spot.
#[derive(Debug, Clone, PartialEq)]
pub struct SpotReference {
    pub color: ReferenceColor,
    /// Reference of the blurred original, when requested.
    pub blurred: Option<ReferenceColor>,
    /// Mean edge strength around the centre.
    pub sobel: f32,
    /// Number of pixels inside the sampling disk.
    pub samples: usize,
}

impl SpotReference {
    /// Anchor for a tool; falls back to the plain reference when the
    /// blurred one was not computed.
    pub fn anchor_color(&self, blurred: bool) -> ReferenceColor {
        match (blurred, self.blurred) {
            (true, Some(color)) => color,
            _ => self.color,
        }
    }
}

#[derive(Default, Clone, Copy)]
struct DiskSums {
    l: f64,
    a: f64,
    b: f64,
    chroma: f64,
    count: usize,
}

impl DiskSums {
    fn merge(mut self, other: DiskSums) -> DiskSums {
        self.l += other.l;
        self.a += other.a;
        self.b += other.b;
        self.chroma += other.chroma;
        self.count += other.count;
        self
    }

    fn finish(&self) -> Option<ReferenceColor> {
        if self.count == 0 {
            return None;
        }
        let n = self.count as f64;
        let mean_a = (self.a / n) as f32;
        let mean_b = (self.b / n) as f32;
        Some(ReferenceColor {
            hue: color::hue(mean_a, mean_b),
            chroma: (self.chroma / n) as f32 / LAB_SCALE,
            luma: ((self.l / n) as f32 / LAB_SCALE).min(MAX_REFERENCE_LUMA),
        })
    }
}

/// Pixel-space box around the sampling disk.
fn disk_box(cx: f32, cy: f32, radius: f32) -> Rect {
    Rect::enclosing(cx - radius, cy - radius, cx + radius, cy + radius)
}

/// Sums the disk of `radius` centred at `(cx, cy)`, in `image` coordinates.
fn disk_sums(image: &LabImage, cx: f32, cy: f32, radius: f32) -> DiskSums {
    let area = image.bounds().intersection(&disk_box(cx, cy, radius));
    if area.is_empty() {
        return DiskSums::default();
    }
    let (rows, cols) = area.ranges();
    let r2 = radius * radius;
    let per_row = map_indices(rows.len(), |i| {
        let row = rows.start + i;
        let dy = row as f32 - cy;
        let mut sums = DiskSums::default();
        for col in cols.clone() {
            let dx = col as f32 - cx;
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let p = image.get_pixel(row, col);
            sums.l += p.l as f64;
            sums.a += p.a as f64;
            sums.b += p.b as f64;
            sums.chroma += p.chroma() as f64;
            sums.count += 1;
        }
        sums
    });
    per_row.into_iter().fold(DiskSums::default(), DiskSums::merge)
}

/// Blurred copy of the part of `image` around the disk, with enough margin
/// that the blur sees real pixels. Returns the patch and its offset.
fn blurred_patch(image: &LabImage, cx: f32, cy: f32, radius: f32, sigma: f32) -> Result<(LabImage, Rect)> {
    let margin = (3.0 * sigma).ceil() as i32 + 1;
    let area = image.bounds().intersection(&disk_box(cx, cy, radius).inflate(margin));
    let patch = gaussian_blur_lab(&image.crop(&area)?, sigma)?;
    Ok((patch, area))
}

/// Mean edge strength of the lightness around the centre, after the
/// structure pre-blur.
fn edge_reference(image: &LabImage, cx: f32, cy: f32, radius: f32, sigma: f32) -> Result<f32> {
    let margin = (3.0 * sigma).ceil() as i32 + 1;
    let area = image.bounds().intersection(&disk_box(cx, cy, radius).inflate(margin));
    if area.is_empty() {
        return Ok(0.0);
    }
    let luma: Array2D<f32> = image.crop(&area)?.channel(Channel::L);
    let edges = sobel_magnitude(&gaussian_blur(&luma, sigma));
    Ok(mean_interior(&edges))
}

/// Samples the reference colour of `spot` from `original`.
///
/// With `want_blurred`, the same average is also taken over a Gaussian
/// blurred copy of the neighbourhood.
pub fn sample_reference(original: &LabImage, spot: &SpotParams, want_blurred: bool) -> Result<SpotReference> {
    let (cx, cy) = (spot.geometry.cx, spot.geometry.cy);
    let radius = spot.reference_radius.max(0.5);

    let sums = disk_sums(original, cx, cy, radius);
    let color = match sums.finish() {
        Some(color) => color,
        None => {
            warn!(
                "spot '{}': reference disk at ({cx:.1}, {cy:.1}) misses the buffer, using neutral grey",
                spot.name
            );
            return Ok(SpotReference {
                color: ReferenceColor::NEUTRAL,
                blurred: want_blurred.then_some(ReferenceColor::NEUTRAL),
                sobel: 0.0,
                samples: 0,
            });
        }
    };

    let blurred = if want_blurred {
        let (patch, area) = blurred_patch(original, cx, cy, radius, spot.reference_blur)?;
        disk_sums(&patch, cx - area.x as f32, cy - area.y as f32, radius).finish()
    } else {
        None
    };

    let sobel = edge_reference(original, cx, cy, radius, spot.structure_blur)?;

    debug!(
        "spot '{}': reference hue {:.3} chroma {:.2} luma {:.2} sobel {:.1} ({} samples)",
        spot.name, color.hue, color.chroma, color.luma, sobel, sums.count
    );

    Ok(SpotReference {
        color,
        blurred,
        sobel,
        samples: sums.count,
    })
}
