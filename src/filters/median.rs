// src/filters/median.rs

use crate::image::array2d::Array2D;
use crate::utils::parallel::for_each_row_mut;

/// One pass of a 3x3 median, replicating the border samples.
pub fn median3x3(src: &Array2D<f32>) -> Array2D<f32> {
    let (w, h) = src.dimensions();
    let mut out = Array2D::new(w, h);
    for_each_row_mut(out.as_mut_slice(), w, |row, dst| {
        let mut window = [0.0f32; 9];
        for (col, value) in dst.iter_mut().enumerate() {
            let mut i = 0;
            for dr in -1..=1isize {
                for dc in -1..=1isize {
                    window[i] = src.get_clamped(row as isize + dr, col as isize + dc);
                    i += 1;
                }
            }
            window.select_nth_unstable_by(4, f32::total_cmp);
            *value = window[4];
        }
    });
    out
}
