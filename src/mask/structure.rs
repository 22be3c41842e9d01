// src/mask/structure.rs

//! Structure (edge) mask.
//!
//! Edge strength is the Sobel magnitude of the pre-blurred lightness. The
//! edge map and the lightness are normalized to `[0, 1]`, the edge map is
//! refined by the guided filter with the lightness as guide, and one 3x3
//! median pass removes what speckle is left.

use crate::filters::blur::gaussian_blur;
use crate::filters::guided::{DEFAULT_EPS, guided_filter};
use crate::filters::median::median3x3;
use crate::filters::sobel::{mean_interior, sobel_magnitude};
use crate::image::array2d::Array2D;
use crate::image::color::L_MAX;
use crate::utils::error::Result;
use crate::utils::log::{ScopedTimer, trace};

/// Refined edge mask of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureMask {
    /// Soft edge mask in `[0, 1]`.
    pub mask: Array2D<f32>,
    /// Mean raw edge strength over the region interior, in the same units
    /// as the reference edge strength.
    pub mean_edge: f32,
}

/// Builds the structure mask of the lightness plane `luma` (native scale).
///
/// `blur_sigma` is the pre-blur applied before edge detection, `radius`
/// the guided-filter window radius.
pub fn build_structure_mask(luma: &Array2D<f32>, blur_sigma: f32, radius: usize) -> Result<StructureMask> {
    let _timer = ScopedTimer::new("structure mask");
    let edges = sobel_magnitude(&gaussian_blur(luma, blur_sigma));
    let mean_edge = mean_interior(&edges);

    let mut normalized = edges;
    normalized.normalize_to_unit();
    let guide = luma.map(|l| (l / L_MAX).clamp(0.0, 1.0));

    let refined = guided_filter(&guide, &normalized, radius, DEFAULT_EPS)?;
    let mut mask = median3x3(&refined);
    for v in mask.as_mut_slice() {
        *v = v.clamp(0.0, 1.0);
    }
    trace!("structure mask {:?}: mean edge {:.1}, radius {}", luma.dimensions(), mean_edge, radius);
    Ok(StructureMask { mask, mean_edge })
}

/// How the structure mask modulates the perceptual gate.
///
/// When the spot centre is at least as structured as the region
/// (`sobelref >= mean_edge`), edges reinforce the edit: the gate is pulled
/// toward 1 in proportion to edge strength. Otherwise edges oppose it and
/// the gate is pulled toward 0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureTerm {
    pub strength: f32,
    pub reinforce: bool,
}

impl StructureTerm {
    pub fn new(strength: f32, reference_edge: f32, mean_edge: f32) -> Self {
        StructureTerm {
            strength: strength.clamp(0.0, 1.0),
            reinforce: reference_edge >= mean_edge,
        }
    }

    #[inline]
    pub fn apply(&self, gate: f32, edge: f32) -> f32 {
        let k = self.strength * edge.clamp(0.0, 1.0);
        if self.reinforce {
            gate + (1.0 - gate) * k
        } else {
            gate * (1.0 - k)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_plane_has_empty_mask() {
        let luma = Array2D::filled(20, 20, 16000.0f32);
        let structure = build_structure_mask(&luma, 1.0, 2).unwrap();
        assert_eq!(structure.mean_edge, 0.0);
        assert!(structure.mask.as_slice().iter().all(|&v| v.abs() < 1e-6));
    }

    #[test]
    fn test_edge_stands_out() {
        let luma = Array2D::from_fn(40, 30, |_, c| if c < 20 { 4000.0 } else { 28000.0 });
        let structure = build_structure_mask(&luma, 0.0, 2).unwrap();
        assert!(structure.mean_edge > 0.0);
        let at_edge = structure.mask.get(15, 19).max(structure.mask.get(15, 20));
        assert!(at_edge > 0.3);
        assert!(structure.mask.get(15, 5) < 0.1);
        assert!(structure.mask.get(15, 35) < 0.1);
    }

    #[test]
    fn test_term_direction() {
        let up = StructureTerm::new(0.5, 10.0, 5.0);
        assert!(up.reinforce);
        assert!((up.apply(0.4, 1.0) - 0.7).abs() < 1e-6);
        assert_eq!(up.apply(0.4, 0.0), 0.4);

        let down = StructureTerm::new(0.5, 1.0, 5.0);
        assert!(!down.reinforce);
        assert!((down.apply(0.4, 1.0) - 0.2).abs() < 1e-6);
    }
}
