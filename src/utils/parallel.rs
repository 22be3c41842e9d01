//! Row fan-out helpers.
//!
//! Every hot loop in the engine is a pure function of pixel position, so
//! work is split by rows (or tiles) with no synchronization. With the
//! `rayon` feature the rows run on the global pool; without it the same
//! closures run sequentially in row order.

use std::ops::Range;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Calls `f(row_index, row)` for every `width`-long row of `data`.
pub fn for_each_row_mut<T, F>(data: &mut [T], width: usize, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    let rows = data.len() / width.max(1);
    for_each_row_in_mut(data, width, 0..rows, f);
}

/// Like [`for_each_row_mut`] but restricted to `rows`; the index passed to
/// `f` is the absolute row index.
pub fn for_each_row_in_mut<T, F>(data: &mut [T], width: usize, rows: Range<usize>, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync + Send,
{
    if width == 0 || rows.is_empty() {
        return;
    }
    let end = (rows.end * width).min(data.len());
    let start = (rows.start * width).min(end);
    let slice = &mut data[start..end];
    let first = rows.start;

    #[cfg(feature = "rayon")]
    {
        slice
            .par_chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| f(first + i, row));
    }
    #[cfg(not(feature = "rayon"))]
    {
        slice
            .chunks_mut(width)
            .enumerate()
            .for_each(|(i, row)| f(first + i, row));
    }
}

/// Evaluates `f` for every index in `0..count` and collects the results in
/// index order.
pub fn map_indices<R, F>(count: usize, f: F) -> Vec<R>
where
    R: Send,
    F: Fn(usize) -> R + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        (0..count).into_par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        (0..count).map(f).collect()
    }
}

/// Evaluates `f` for every item of `items`, keeping order.
pub fn map_items<I, R, F>(items: &[I], f: F) -> Vec<R>
where
    I: Sync,
    R: Send,
    F: Fn(&I) -> R + Sync + Send,
{
    #[cfg(feature = "rayon")]
    {
        items.par_iter().map(f).collect()
    }
    #[cfg(not(feature = "rayon"))]
    {
        items.iter().map(f).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_receive_absolute_index() {
        let mut data = vec![0usize; 4 * 5];
        for_each_row_in_mut(&mut data, 4, 1..4, |y, row| {
            for v in row.iter_mut() {
                *v = y;
            }
        });
        assert_eq!(&data[0..4], &[0, 0, 0, 0]);
        assert_eq!(&data[4..8], &[1, 1, 1, 1]);
        assert_eq!(&data[12..16], &[3, 3, 3, 3]);
        assert_eq!(&data[16..20], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_map_indices_keeps_order() {
        let squares = map_indices(6, |i| i * i);
        assert_eq!(squares, vec![0, 1, 4, 9, 16, 25]);
    }

    #[test]
    fn test_zero_width_is_noop() {
        let mut data: Vec<u8> = Vec::new();
        for_each_row_mut(&mut data, 0, |_, _| panic!("no rows expected"));
    }
}
