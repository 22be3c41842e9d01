// src/filters/sobel.rs

//! Gradient-magnitude edge strength.
//!
//! Uses the two 3x3 Sobel kernels. Samples without a full 3x3 neighbourhood
//! (the outermost rows and columns) have zero strength. The plane is
//! processed in tiles so each worker reads a compact block.

use crate::image::array2d::{Array2D, Tile};
use crate::utils::parallel::map_items;

/// Tile edge length for the gradient pass.
const TILE: usize = 64;

/// Edge strength of a single interior sample.
#[inline]
pub fn sobel_at(src: &Array2D<f32>, row: usize, col: usize) -> f32 {
    let p = |dr: isize, dc: isize| src.get((row as isize + dr) as usize, (col as isize + dc) as usize);
    let gx = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
    let gy = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
    (gx * gx + gy * gy).sqrt()
}

/// Edge-strength map of `src`, same size, zero on the border.
pub fn sobel_magnitude(src: &Array2D<f32>) -> Array2D<f32> {
    let (w, h) = src.dimensions();
    let mut out = Array2D::new(w, h);
    if w < 3 || h < 3 {
        return out;
    }
    let tiles: Vec<Tile> = src.tiles(TILE).collect();
    let blocks = map_items(&tiles, |tile| {
        let mut values = Vec::with_capacity(tile.rows * tile.cols);
        for row in tile.row..tile.row + tile.rows {
            for col in tile.col..tile.col + tile.cols {
                let interior = row > 0 && col > 0 && row + 1 < h && col + 1 < w;
                values.push(if interior { sobel_at(src, row, col) } else { 0.0 });
            }
        }
        values
    });
    for (tile, values) in tiles.iter().zip(blocks) {
        out.write_tile(tile, &values);
    }
    out
}

/// Mean edge strength over the interior samples of `src`.
pub fn mean_interior(edges: &Array2D<f32>) -> f32 {
    let (w, h) = edges.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for row in 1..h - 1 {
        sum += edges.row(row)[1..w - 1].iter().map(|&v| v as f64).sum::<f64>();
    }
    (sum / ((w - 2) * (h - 2)) as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_plane_has_no_edges() {
        let plane = Array2D::filled(8, 8, 500.0f32);
        let edges = sobel_magnitude(&plane);
        assert!(edges.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_vertical_step_detected_and_border_zero() {
        let plane = Array2D::from_fn(100, 70, |_, c| if c < 50 { 0.0 } else { 1.0 });
        let edges = sobel_magnitude(&plane);
        assert_eq!(edges.get(30, 49), 4.0);
        assert_eq!(edges.get(30, 50), 4.0);
        assert_eq!(edges.get(30, 20), 0.0);
        assert_eq!(edges.get(0, 50), 0.0);
        assert_eq!(edges.get(69, 50), 0.0);
    }

    #[test]
    fn test_mean_interior_ignores_border() {
        let edges = Array2D::from_fn(4, 4, |r, c| {
            if r == 0 || c == 0 || r == 3 || c == 3 { 100.0 } else { 2.0 }
        });
        assert!((mean_interior(&edges) - 2.0).abs() < 1e-6);
    }
}
