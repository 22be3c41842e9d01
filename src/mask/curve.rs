// src/mask/curve.rs

//! One-dimensional mask response curves.
//!
//! Control points live on `[0, 1] x [0, 1]`. Between points the curve is a
//! monotone cubic (Fritsch-Carlson tangents), so it never overshoots the
//! control values. Hue curves are periodic: the last point wraps around to
//! meet the first. The curve is baked into a lookup table once and sampled
//! with linear interpolation.

use crate::utils::error::{Result, SpotError};

const LUT_SIZE: usize = 501;

#[derive(Debug, Clone, PartialEq)]
pub struct MaskCurve {
    points: Vec<(f32, f32)>,
    periodic: bool,
    lut: Vec<f32>,
}

impl MaskCurve {
    /// Open curve through `points` (any order, distinct `x`).
    pub fn new(points: Vec<(f32, f32)>) -> Result<Self> {
        Self::build(points, false)
    }

    /// Curve whose domain wraps around, for hue-indexed masks.
    pub fn periodic(points: Vec<(f32, f32)>) -> Result<Self> {
        Self::build(points, true)
    }

    /// Flat zero curve: after the `1 - curve` inversion it includes every
    /// pixel.
    pub fn neutral() -> Self {
        MaskCurve {
            points: vec![(0.0, 0.0), (1.0, 0.0)],
            periodic: false,
            lut: vec![0.0; LUT_SIZE],
        }
    }

    fn build(mut points: Vec<(f32, f32)>, periodic: bool) -> Result<Self> {
        if points.is_empty() {
            return Err(SpotError::InvalidArg("mask curve needs at least one point".into()));
        }
        for &(x, y) in &points {
            if !(0.0..=1.0).contains(&x) || !y.is_finite() {
                return Err(SpotError::InvalidArg(format!("mask curve point ({x}, {y}) out of range")));
            }
        }
        points.sort_by(|p, q| p.0.total_cmp(&q.0));
        if points.windows(2).any(|w| w[1].0 - w[0].0 < 1e-6) {
            return Err(SpotError::InvalidArg("mask curve points must have distinct x".into()));
        }
        for p in points.iter_mut() {
            p.1 = p.1.clamp(0.0, 1.0);
        }

        let knots = if periodic && points.len() > 1 {
            let first = points[0];
            let last = points[points.len() - 1];
            let mut wrapped = Vec::with_capacity(points.len() + 2);
            wrapped.push((last.0 - 1.0, last.1));
            wrapped.extend_from_slice(&points);
            wrapped.push((first.0 + 1.0, first.1));
            wrapped
        } else {
            points.clone()
        };
        let tangents = monotone_tangents(&knots);
        let lut = (0..LUT_SIZE)
            .map(|i| hermite(&knots, &tangents, i as f32 / (LUT_SIZE - 1) as f32))
            .collect();

        Ok(MaskCurve {
            points,
            periodic,
            lut,
        })
    }

    pub fn points(&self) -> &[(f32, f32)] {
        &self.points
    }

    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// True when the curve is zero everywhere.
    pub fn is_neutral(&self) -> bool {
        self.lut.iter().all(|&v| v == 0.0)
    }

    /// Curve value at `x`; open curves clamp `x` to `[0, 1]`, periodic ones
    /// wrap it.
    #[inline]
    pub fn eval(&self, x: f32) -> f32 {
        let x = if self.periodic { x.rem_euclid(1.0) } else { x.clamp(0.0, 1.0) };
        let pos = x * (LUT_SIZE - 1) as f32;
        let i0 = (pos as usize).min(LUT_SIZE - 2);
        let frac = pos - i0 as f32;
        self.lut[i0] * (1.0 - frac) + self.lut[i0 + 1] * frac
    }
}

/// Fritsch-Carlson tangents for strictly increasing `x`.
fn monotone_tangents(knots: &[(f32, f32)]) -> Vec<f32> {
    let n = knots.len();
    if n < 2 {
        return vec![0.0; n];
    }
    let secants: Vec<f32> = knots
        .windows(2)
        .map(|w| (w[1].1 - w[0].1) / (w[1].0 - w[0].0))
        .collect();
    let mut tangents = vec![0.0f32; n];
    tangents[0] = secants[0];
    tangents[n - 1] = secants[n - 2];
    for k in 1..n - 1 {
        let (d0, d1) = (secants[k - 1], secants[k]);
        tangents[k] = if d0 * d1 <= 0.0 { 0.0 } else { 0.5 * (d0 + d1) };
    }
    for (k, &d) in secants.iter().enumerate() {
        if d == 0.0 {
            tangents[k] = 0.0;
            tangents[k + 1] = 0.0;
            continue;
        }
        let alpha = tangents[k] / d;
        let beta = tangents[k + 1] / d;
        let norm = alpha * alpha + beta * beta;
        if norm > 9.0 {
            let tau = 3.0 / norm.sqrt();
            tangents[k] = tau * alpha * d;
            tangents[k + 1] = tau * beta * d;
        }
    }
    tangents
}

fn hermite(knots: &[(f32, f32)], tangents: &[f32], x: f32) -> f32 {
    let n = knots.len();
    if n == 1 || x <= knots[0].0 {
        return knots[0].1;
    }
    if x >= knots[n - 1].0 {
        return knots[n - 1].1;
    }
    let seg = knots.partition_point(|p| p.0 <= x).clamp(1, n - 1) - 1;
    let (x0, y0) = knots[seg];
    let (x1, y1) = knots[seg + 1];
    let h = x1 - x0;
    let t = (x - x0) / h;
    let t2 = t * t;
    let t3 = t2 * t;
    let value = (2.0 * t3 - 3.0 * t2 + 1.0) * y0
        + (t3 - 2.0 * t2 + t) * h * tangents[seg]
        + (-2.0 * t3 + 3.0 * t2) * y1
        + (t3 - t2) * h * tangents[seg + 1];
    value.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_is_zero() {
        let curve = MaskCurve::neutral();
        assert!(curve.is_neutral());
        for i in 0..=20 {
            assert_eq!(curve.eval(i as f32 / 20.0), 0.0);
        }
    }

    #[test]
    fn test_passes_through_points() {
        let curve = MaskCurve::new(vec![(0.0, 0.0), (0.5, 1.0), (1.0, 0.0)]).unwrap();
        assert!(curve.eval(0.0).abs() < 1e-6);
        assert!((curve.eval(0.5) - 1.0).abs() < 1e-6);
        assert!(curve.eval(1.0).abs() < 1e-6);
        assert!(curve.eval(0.25) > 0.0 && curve.eval(0.25) < 1.0);
    }

    #[test]
    fn test_monotone_data_gives_monotone_curve() {
        let curve = MaskCurve::new(vec![(0.0, 0.0), (0.1, 0.8), (0.2, 0.85), (1.0, 1.0)]).unwrap();
        let mut last = 0.0;
        for i in 0..=200 {
            let v = curve.eval(i as f32 / 200.0);
            assert!(v + 1e-6 >= last);
            last = v;
        }
    }

    #[test]
    fn test_periodic_wraps() {
        let curve = MaskCurve::periodic(vec![(0.1, 1.0), (0.6, 0.0)]).unwrap();
        assert!((curve.eval(0.0) - curve.eval(1.0)).abs() < 1e-4);
        assert!((curve.eval(1.1) - curve.eval(0.1)).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_bad_points() {
        assert!(MaskCurve::new(vec![]).is_err());
        assert!(MaskCurve::new(vec![(1.5, 0.0)]).is_err());
        assert!(MaskCurve::new(vec![(0.3, 0.0), (0.3, 1.0)]).is_err());
    }

    #[test]
    fn test_single_point_is_constant() {
        let curve = MaskCurve::new(vec![(0.4, 0.7)]).unwrap();
        assert!((curve.eval(0.0) - 0.7).abs() < 1e-6);
        assert!((curve.eval(1.0) - 0.7).abs() < 1e-6);
    }
}
