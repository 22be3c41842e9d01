// src/gate.rs

//! Perceptual gate: turns the colour distance between a pixel and the spot
//! reference into an attenuation factor in `[0, 1]`.
//!
//! The distance is measured on the 0..100 Lab scale, between the pixel and
//! the reference rebuilt from its polar form
//! `(chroma * cos(hue), chroma * sin(hue), luma)`. Two thresholds derived
//! from the tool sensitivity bound a linear ramp: full effect below
//! `min_de`, none above `max_de`. The ramp is then raised to the spot's
//! exponent.
//!
//! The threshold constants are empirical and kept exactly as tuned.

use crate::image::color::LAB_SCALE;
use crate::image::lab_image::LabPixel;
use crate::reference::ReferenceColor;

/// Baseline of the lower threshold.
pub const MIN_DE_BASE: f32 = 2.0;
/// Baseline of the upper threshold.
pub const MAX_DE_BASE: f32 = 5.0;
/// Growth of the lower threshold per unit of `sensitivity * threshold`.
pub const MIN_SCOPE: f32 = 0.025;
/// Growth of the upper threshold per unit of sensitivity.
pub const MAX_SCOPE: f32 = 1.25;
/// Above this sensitivity the gate is blended toward full effect.
pub const LIMIT_SCOPE: f32 = 80.0;
/// Sensitivity at or above which the gate is always 1.
pub const FULL_EFFECT_SENSITIVITY: f32 = 99.0;

/// Per-axis weights of the colour distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaEWeights {
    /// Weight of the squared opponent-channel difference.
    pub ab: f32,
    /// Weight of the squared lightness difference.
    pub l: f32,
}

impl Default for DeltaEWeights {
    fn default() -> Self {
        DeltaEWeights { ab: 1.0, l: 1.0 }
    }
}

impl DeltaEWeights {
    /// Trades chroma discrimination against lightness discrimination.
    /// `balance > 1` favours hue/chroma, `balance < 1` favours lightness.
    pub fn balanced(balance: f32) -> Self {
        let balance = balance.max(0.01);
        DeltaEWeights {
            ab: balance,
            l: 1.0 / balance,
        }
    }
}

/// Reference colour in Cartesian 0..100 Lab, ready for distance queries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl From<&ReferenceColor> for Anchor {
    fn from(reference: &ReferenceColor) -> Self {
        let (sin, cos) = reference.hue.sin_cos();
        Anchor {
            l: reference.luma,
            a: reference.chroma * cos,
            b: reference.chroma * sin,
        }
    }
}

/// Attenuation curve for one tool of one spot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerceptualGate {
    sensitivity: f32,
    min_de: f32,
    max_de: f32,
    limit_min_de: f32,
    limit_max_de: f32,
    exponent: f32,
    weights: DeltaEWeights,
}

impl PerceptualGate {
    /// Builds the gate for a sensitivity in 0..100, the spot threshold
    /// tunable and the falloff exponent.
    pub fn new(sensitivity: f32, threshold: f32, exponent: f32) -> Self {
        let sensitivity = sensitivity.clamp(0.0, 100.0);
        let (min_de, max_de) = thresholds(sensitivity, threshold);
        let (limit_min_de, limit_max_de) = thresholds(LIMIT_SCOPE, threshold);
        PerceptualGate {
            sensitivity,
            min_de,
            max_de,
            limit_min_de,
            limit_max_de,
            exponent: exponent.max(f32::EPSILON),
            weights: DeltaEWeights::default(),
        }
    }

    pub fn with_weights(mut self, weights: DeltaEWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    /// `(min_de, max_de)` for this gate's sensitivity.
    pub fn thresholds(&self) -> (f32, f32) {
        (self.min_de, self.max_de)
    }

    /// True when the gate is 1 regardless of distance.
    pub fn is_open(&self) -> bool {
        self.sensitivity >= FULL_EFFECT_SENSITIVITY
    }

    /// Attenuation for a colour distance `de` (0..100 units).
    pub fn attenuation(&self, de: f32) -> f32 {
        if self.is_open() {
            return 1.0;
        }
        if self.sensitivity <= LIMIT_SCOPE {
            return self.shaped(ramp(de, self.min_de, self.max_de));
        }
        // blend toward full effect between LIMIT_SCOPE and 100
        if de > self.limit_max_de {
            return 0.0;
        }
        let limited = self.shaped(ramp(de, self.limit_min_de, self.limit_max_de));
        let lift = (100.0 - self.sensitivity) / (100.0 - LIMIT_SCOPE);
        (1.0 - (1.0 - limited) * lift).clamp(0.0, 1.0)
    }

    /// Weighted distance between a native-scale pixel and the anchor.
    pub fn distance(&self, pixel: &LabPixel, anchor: &Anchor) -> f32 {
        let dl = anchor.l - pixel.l / LAB_SCALE;
        let da = anchor.a - pixel.a / LAB_SCALE;
        let db = anchor.b - pixel.b / LAB_SCALE;
        (self.weights.ab * (da * da + db * db) + self.weights.l * dl * dl).sqrt()
    }

    /// Attenuation for a pixel against the anchor.
    #[inline]
    pub fn evaluate(&self, pixel: &LabPixel, anchor: &Anchor) -> f32 {
        if self.is_open() {
            return 1.0;
        }
        self.attenuation(self.distance(pixel, anchor))
    }

    fn shaped(&self, linear: f32) -> f32 {
        if linear <= 0.0 {
            0.0
        } else if linear >= 1.0 {
            1.0
        } else {
            linear.powf(self.exponent)
        }
    }
}

/// Lower and upper ramp thresholds for a sensitivity.
pub fn thresholds(sensitivity: f32, threshold: f32) -> (f32, f32) {
    let min_de = MIN_DE_BASE + MIN_SCOPE * sensitivity * threshold;
    let max_de = MAX_DE_BASE + MAX_SCOPE * sensitivity * (1.0 + 0.1 * threshold);
    (min_de, max_de.max(min_de + f32::EPSILON))
}

#[inline]
fn ramp(de: f32, min_de: f32, max_de: f32) -> f32 {
    if de <= min_de {
        1.0
    } else if de >= max_de {
        0.0
    } else {
        (max_de - de) / (max_de - min_de)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds_follow_sensitivity() {
        let (min_de, max_de) = thresholds(50.0, 2.0);
        assert!((min_de - 4.5).abs() < 1e-5);
        assert!((max_de - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_ramp_endpoints() {
        let gate = PerceptualGate::new(50.0, 2.0, 1.0);
        let (min_de, max_de) = gate.thresholds();
        assert_eq!(gate.attenuation(0.0), 1.0);
        assert_eq!(gate.attenuation(min_de), 1.0);
        assert_eq!(gate.attenuation(max_de), 0.0);
        let mid = gate.attenuation((min_de + max_de) / 2.0);
        assert!((mid - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_exponent_sharpens() {
        let soft = PerceptualGate::new(40.0, 1.8, 1.0);
        let sharp = PerceptualGate::new(40.0, 1.8, 3.0);
        let (min_de, max_de) = soft.thresholds();
        let de = (min_de + max_de) / 2.0;
        assert!(sharp.attenuation(de) < soft.attenuation(de));
    }

    #[test]
    fn test_full_sensitivity_ignores_distance() {
        let gate = PerceptualGate::new(100.0, 1.8, 2.0);
        assert_eq!(gate.attenuation(1000.0), 1.0);
        let gate = PerceptualGate::new(99.0, 1.8, 2.0);
        assert_eq!(gate.attenuation(500.0), 1.0);
    }

    #[test]
    fn test_high_sensitivity_blend_is_monotone() {
        let gate = PerceptualGate::new(90.0, 1.8, 1.0);
        let mut last = 1.0;
        for i in 0..400 {
            let g = gate.attenuation(i as f32 * 0.5);
            assert!(g <= last + 1e-6);
            assert!((0.0..=1.0).contains(&g));
            last = g;
        }
        assert_eq!(gate.attenuation(0.0), 1.0);
    }

    #[test]
    fn test_distance_uses_polar_reference() {
        let reference = ReferenceColor {
            hue: std::f32::consts::FRAC_PI_2,
            chroma: 10.0,
            luma: 50.0,
        };
        let anchor = Anchor::from(&reference);
        let gate = PerceptualGate::new(20.0, 1.8, 1.0);
        let same = LabPixel::new(50.0 * LAB_SCALE, 0.0, 10.0 * LAB_SCALE);
        assert!(gate.distance(&same, &anchor) < 1e-3);
        let lighter = LabPixel::new(53.0 * LAB_SCALE, 0.0, 14.0 * LAB_SCALE);
        assert!((gate.distance(&lighter, &anchor) - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_weights_shift_discrimination() {
        let anchor = Anchor { l: 50.0, a: 0.0, b: 0.0 };
        let lighter = LabPixel::new(60.0 * LAB_SCALE, 0.0, 0.0);
        let plain = PerceptualGate::new(20.0, 1.8, 1.0);
        let chroma_first = plain.with_weights(DeltaEWeights::balanced(2.0));
        assert!(chroma_first.distance(&lighter, &anchor) < plain.distance(&lighter, &anchor));
    }
}
