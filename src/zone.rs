// src/zone.rs

//! Zone classification of pixels against a spot outline.
//!
//! A pixel is `Inside` when it lies within the full-effect part of the
//! extent, `Transition` in the falloff band, and `Outside` beyond the outer
//! extent. Each of the four quadrants around the center uses its own
//! horizontal and vertical extent. Boundaries belong to the stronger zone.

use crate::spot::params::{Shape, SpotGeometry};
use std::f32::consts::PI;

/// Extents below this many pixels describe no area.
const MIN_EXTENT: f32 = 1.0;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Zone {
    Outside = 0,
    Transition = 1,
    Inside = 2,
}

/// Zone plus its blend weight (1 inside, 0 outside).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoneSample {
    pub zone: Zone,
    pub weight: f32,
}

impl ZoneSample {
    pub const OUTSIDE: ZoneSample = ZoneSample {
        zone: Zone::Outside,
        weight: 0.0,
    };
    pub const INSIDE: ZoneSample = ZoneSample {
        zone: Zone::Inside,
        weight: 1.0,
    };

    /// Spatial factor applied to the effect; inverted spots use the
    /// complement.
    pub fn spatial_weight(&self, inverse: bool) -> f32 {
        if inverse { 1.0 - self.weight } else { self.weight }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Classifies points against one spot outline.
#[derive(Copy, Clone, Debug)]
pub struct ZoneClassifier {
    geometry: SpotGeometry,
}

impl ZoneClassifier {
    pub fn new(geometry: SpotGeometry) -> Self {
        ZoneClassifier { geometry }
    }

    pub fn geometry(&self) -> &SpotGeometry {
        &self.geometry
    }

    /// Quadrant of `(x, y)`; points on the center lines go right/bottom.
    pub fn quadrant(&self, x: f32, y: f32) -> Quadrant {
        let right = x >= self.geometry.cx;
        let bottom = y >= self.geometry.cy;
        match (bottom, right) {
            (false, false) => Quadrant::TopLeft,
            (false, true) => Quadrant::TopRight,
            (true, false) => Quadrant::BottomLeft,
            (true, true) => Quadrant::BottomRight,
        }
    }

    /// Horizontal and vertical extent of a quadrant.
    pub fn extents(&self, quadrant: Quadrant) -> (f32, f32) {
        let g = &self.geometry;
        match quadrant {
            Quadrant::TopLeft => (g.left, g.top),
            Quadrant::TopRight => (g.right, g.top),
            Quadrant::BottomLeft => (g.left, g.bottom),
            Quadrant::BottomRight => (g.right, g.bottom),
        }
    }

    /// True when no pixel of the row can be inside the outer extent.
    pub fn row_is_outside(&self, y: f32) -> bool {
        let g = &self.geometry;
        self.is_degenerate() || y < g.cy - g.top || y > g.cy + g.bottom
    }

    /// True when the outline covers no area at all.
    pub fn is_degenerate(&self) -> bool {
        let g = &self.geometry;
        (g.left < MIN_EXTENT && g.right < MIN_EXTENT) || (g.top < MIN_EXTENT && g.bottom < MIN_EXTENT)
    }

    pub fn classify(&self, x: f32, y: f32) -> ZoneSample {
        let (dx, dy) = self.extents(self.quadrant(x, y));
        if dx < MIN_EXTENT || dy < MIN_EXTENT {
            return ZoneSample::OUTSIDE;
        }
        let kx = x - self.geometry.cx;
        let ky = y - self.geometry.cy;
        match self.geometry.shape {
            Shape::Ellipse => self.classify_ellipse(kx, ky, dx, dy),
            Shape::Rectangle => self.classify_rectangle(kx, ky, dx, dy),
        }
    }

    fn classify_ellipse(&self, kx: f32, ky: f32, dx: f32, dy: f32) -> ZoneSample {
        let t = self.geometry.transition;
        let inner = sqr(kx / (t * dx)) + sqr(ky / (t * dy));
        if inner <= 1.0 {
            return ZoneSample::INSIDE;
        }
        let outer = sqr(kx / dx) + sqr(ky / dy);
        if outer > 1.0 {
            return ZoneSample::OUTSIDE;
        }
        // position along the ray, 0 at the center and 1 on the outer ellipse
        let radius = outer.sqrt();
        let angle = PI * (radius - t) / (1.0 - t);
        let weight = 0.5 * (1.0 + angle.cos());
        self.transition(weight)
    }

    fn classify_rectangle(&self, kx: f32, ky: f32, dx: f32, dy: f32) -> ZoneSample {
        let t = self.geometry.transition;
        let (ax, ay) = (kx.abs(), ky.abs());
        // the ray leaves through the vertical side when it is flatter than the
        // quadrant diagonal, otherwise through the horizontal side
        let coef = if ax * dy >= ay * dx { ax / dx } else { ay / dy };
        if coef <= t {
            return ZoneSample::INSIDE;
        }
        if coef > 1.0 {
            return ZoneSample::OUTSIDE;
        }
        self.transition((1.0 - coef) / (1.0 - t))
    }

    fn transition(&self, linear: f32) -> ZoneSample {
        let base = linear.clamp(0.0, 1.0);
        let weakness = self.geometry.weakness;
        let weight = if weakness == 1.0 { base } else { base.powf(weakness) };
        ZoneSample {
            zone: Zone::Transition,
            weight,
        }
    }
}

#[inline]
fn sqr(v: f32) -> f32 {
    v * v
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ellipse(t: f32) -> ZoneClassifier {
        ZoneClassifier::new(SpotGeometry::ellipse(100.0, 100.0, 50.0, 50.0, t))
    }

    #[test]
    fn test_ellipse_zones_along_axis() {
        let c = ellipse(0.8);
        assert_eq!(c.classify(100.0, 100.0), ZoneSample::INSIDE);
        assert_eq!(c.classify(140.0, 100.0).zone, Zone::Inside);
        assert_eq!(c.classify(145.0, 100.0).zone, Zone::Transition);
        assert_eq!(c.classify(150.0, 100.0).zone, Zone::Transition);
        assert_eq!(c.classify(151.0, 100.0), ZoneSample::OUTSIDE);
    }

    #[test]
    fn test_ellipse_midpoint_weight_is_half() {
        let c = ellipse(0.8);
        let sample = c.classify(100.0, 145.0);
        assert_eq!(sample.zone, Zone::Transition);
        assert!((sample.weight - 0.5).abs() < 0.02, "weight {}", sample.weight);
    }

    #[test]
    fn test_ellipse_weight_reaches_bounds() {
        let c = ellipse(0.5);
        let near_inner = c.classify(125.5, 100.0).weight;
        let outer = c.classify(150.0, 100.0).weight;
        assert!(near_inner > 0.99);
        assert!(outer < 1e-6);
    }

    #[test]
    fn test_rectangle_uses_dominant_axis() {
        let c = ZoneClassifier::new(SpotGeometry::rectangle(
            0.0,
            0.0,
            (100.0, 100.0, 50.0, 50.0),
            0.5,
        ));
        // |kx|/dx = 0.4, |ky|/dy = 0.8 -> vertical side dominates
        let sample = c.classify(40.0, 40.0);
        assert_eq!(sample.zone, Zone::Transition);
        assert!((sample.weight - 0.4).abs() < 1e-5);
        assert_eq!(c.classify(90.0, 10.0).zone, Zone::Transition);
        assert_eq!(c.classify(49.0, 24.0).zone, Zone::Inside);
        assert_eq!(c.classify(10.0, 51.0).zone, Zone::Outside);
    }

    #[test]
    fn test_weakness_sharpens_rectangle_falloff() {
        let mut geometry = SpotGeometry::rectangle(0.0, 0.0, (10.0, 10.0, 10.0, 10.0), 0.5);
        geometry.weakness = 2.0;
        let c = ZoneClassifier::new(geometry);
        let sample = c.classify(7.5, 0.0);
        assert!((sample.weight - 0.25).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_extent_is_outside() {
        let c = ZoneClassifier::new(SpotGeometry::ellipse(10.0, 10.0, 0.5, 20.0, 0.5));
        assert!(c.is_degenerate());
        assert_eq!(c.classify(10.0, 10.0), ZoneSample::OUTSIDE);
        assert!(c.row_is_outside(10.0));
    }

    #[test]
    fn test_row_short_circuit_bounds() {
        let c = ellipse(0.5);
        assert!(c.row_is_outside(49.0));
        assert!(!c.row_is_outside(50.0));
        assert!(!c.row_is_outside(150.0));
        assert!(c.row_is_outside(150.5));
    }

    #[test]
    fn test_inverse_spatial_weight() {
        assert_eq!(ZoneSample::OUTSIDE.spatial_weight(true), 1.0);
        assert_eq!(ZoneSample::INSIDE.spatial_weight(true), 0.0);
        let t = ZoneSample {
            zone: Zone::Transition,
            weight: 0.3,
        };
        assert!((t.spatial_weight(true) - 0.7).abs() < 1e-6);
    }
}
