// src/filters/guided.rs

//! Edge-aware smoothing (He et al. guided filter).
//!
//! Smooths `src` with local linear models of `guide`: inside each window
//! `q = a * guide + b`, where `a` collapses toward zero in flat guide areas
//! (plain box smoothing) and toward `cov / var` across guide edges (edges
//! preserved). Window means come from integral images, so cost does not
//! depend on the radius.

use crate::filters::blur::box_mean;
use crate::image::array2d::Array2D;
use crate::utils::error::{Result, SpotError};

/// Default regularization for guides normalized to `[0, 1]`.
pub const DEFAULT_EPS: f32 = 1e-3;

fn zip_with<F>(lhs: &Array2D<f32>, rhs: &Array2D<f32>, f: F) -> Result<Array2D<f32>>
where
    F: Fn(f32, f32) -> f32,
{
    let (w, h) = lhs.dimensions();
    let data = lhs
        .as_slice()
        .iter()
        .zip(rhs.as_slice())
        .map(|(&x, &y)| f(x, y))
        .collect();
    Array2D::from_vec(w, h, data)
}

/// Filters `src` guided by `guide` over `(2 * radius + 1)^2` windows.
///
/// Both planes must share dimensions. `radius == 0` returns `src`
/// unchanged.
pub fn guided_filter(guide: &Array2D<f32>, src: &Array2D<f32>, radius: usize, eps: f32) -> Result<Array2D<f32>> {
    if guide.dimensions() != src.dimensions() {
        return Err(SpotError::mismatch(guide.dimensions(), src.dimensions()));
    }
    if eps <= 0.0 {
        return Err(SpotError::InvalidArg(format!("guided filter eps must be positive, got {eps}")));
    }
    if radius == 0 {
        return Ok(src.clone());
    }

    let mean_i = box_mean(guide, radius)?;
    let mean_p = box_mean(src, radius)?;
    let corr_ii = box_mean(&zip_with(guide, guide, |i, _| i * i)?, radius)?;
    let corr_ip = box_mean(&zip_with(guide, src, |i, p| i * p)?, radius)?;

    let var_i = zip_with(&corr_ii, &mean_i, |c, m| (c - m * m).max(0.0))?;
    let cov_ip = {
        let mi_mp = zip_with(&mean_i, &mean_p, |i, p| i * p)?;
        zip_with(&corr_ip, &mi_mp, |c, m| c - m)?
    };
    let a = zip_with(&cov_ip, &var_i, |cov, var| cov / (var + eps))?;
    let b = {
        let a_mi = zip_with(&a, &mean_i, |a, m| a * m)?;
        zip_with(&mean_p, &a_mi, |p, am| p - am)?
    };

    let mean_a = box_mean(&a, radius)?;
    let mean_b = box_mean(&b, radius)?;
    let scaled = zip_with(&mean_a, guide, |a, i| a * i)?;
    zip_with(&scaled, &mean_b, |s, b| s + b)
}
