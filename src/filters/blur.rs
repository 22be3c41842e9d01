// src/filters/blur.rs

//! Separable Gaussian blur and box means over single-channel planes.

use crate::image::array2d::Array2D;
use crate::image::lab_image::{Channel, LabImage};
use crate::utils::error::Result;
use crate::utils::parallel::for_each_row_mut;

/// Sigmas below this leave the plane untouched.
const MIN_SIGMA: f32 = 0.3;

/// Normalized 1D Gaussian kernel covering ±3 sigma.
pub fn gaussian_kernel(sigma: f32) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil().max(1.0) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian blur with edge replication.
pub fn gaussian_blur(src: &Array2D<f32>, sigma: f32) -> Array2D<f32> {
    let (w, h) = src.dimensions();
    if sigma < MIN_SIGMA || w == 0 || h == 0 {
        return src.clone();
    }
    let kernel = gaussian_kernel(sigma);
    let radius = (kernel.len() / 2) as isize;

    let mut horizontal = Array2D::new(w, h);
    for_each_row_mut(horizontal.as_mut_slice(), w, |row, out| {
        for (col, value) in out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let c = col as isize + k as isize - radius;
                acc += weight * src.get_clamped(row as isize, c);
            }
            *value = acc;
        }
    });

    let mut out = Array2D::new(w, h);
    for_each_row_mut(out.as_mut_slice(), w, |row, dst| {
        for (col, value) in dst.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (k, weight) in kernel.iter().enumerate() {
                let r = row as isize + k as isize - radius;
                acc += weight * horizontal.get_clamped(r, col as isize);
            }
            *value = acc;
        }
    });
    out
}

/// Blurs the three channels of a Lab buffer independently.
pub fn gaussian_blur_lab(image: &LabImage, sigma: f32) -> Result<LabImage> {
    let l = gaussian_blur(&image.channel(Channel::L), sigma);
    let a = gaussian_blur(&image.channel(Channel::A), sigma);
    let b = gaussian_blur(&image.channel(Channel::B), sigma);
    LabImage::from_planes(&l, &a, &b)
}

/// Mean over the `(2 * radius + 1)^2` window around each sample, clipped to
/// the plane, computed from a double-precision integral image.
pub fn box_mean(src: &Array2D<f32>, radius: usize) -> Result<Array2D<f32>> {
    let (w, h) = src.dimensions();
    if radius == 0 || w == 0 || h == 0 {
        return Ok(src.clone());
    }

    let mut integral = Array2D::try_filled(w + 1, h + 1, 0.0f64)?;
    for row in 0..h {
        let mut running = 0.0f64;
        for col in 0..w {
            running += src.get(row, col) as f64;
            let above = integral.get(row, col + 1);
            integral.set(row + 1, col + 1, above + running);
        }
    }

    let mut out = Array2D::try_filled(w, h, 0.0f32)?;
    for_each_row_mut(out.as_mut_slice(), w, |row, dst| {
        let r0 = row.saturating_sub(radius);
        let r1 = (row + radius).min(h - 1);
        for (col, value) in dst.iter_mut().enumerate() {
            let c0 = col.saturating_sub(radius);
            let c1 = (col + radius).min(w - 1);
            let sum = integral.get(r1 + 1, c1 + 1) - integral.get(r0, c1 + 1)
                - integral.get(r1 + 1, c0)
                + integral.get(r0, c0);
            let count = ((r1 - r0 + 1) * (c1 - c0 + 1)) as f64;
            *value = (sum / count) as f32;
        }
    });
    Ok(out)
}
