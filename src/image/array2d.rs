// src/image/array2d.rs

//! Owned, bounds-checked 2D planes indexed by `(row, column)`.
//!
//! Scratch buffers (blurred copies, edge maps, masks) are all `Array2D`s
//! allocated per spot. Allocation goes through [`Array2D::try_filled`] so an
//! oversized request degrades into a skipped refinement instead of an abort.

use crate::image::geom::Rect;
use crate::utils::error::{Result, SpotError};

/// A dense row-major plane of `T`.
#[derive(Clone, Debug, PartialEq)]
pub struct Array2D<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Array2D<T> {
    /// Creates a plane filled with `T::default()`.
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, T::default())
    }
}

impl<T: Copy> Array2D<T> {
    /// Creates a plane filled with a single value.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Array2D {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Fallible variant of [`Array2D::filled`] for large scratch planes.
    pub fn try_filled(width: usize, height: usize, value: T) -> Result<Self> {
        let len = width
            .checked_mul(height)
            .ok_or_else(|| SpotError::InvalidArg(format!("plane {}x{} overflows", width, height)))?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| SpotError::Allocation {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
        data.resize(len, value);
        Ok(Array2D {
            width,
            height,
            data,
        })
    }

    /// Creates a plane from a row-major vector.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != width * height {
            return Err(SpotError::InvalidArg(format!(
                "expected {} samples for a {}x{} plane, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        Ok(Array2D {
            width,
            height,
            data,
        })
    }

    /// Creates a plane by calling `f(row, col)` for each sample.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> T,
    {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        Array2D {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the dimensions as a tuple (width, height).
    pub fn dimensions(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.height && col < self.width);
        self.data[row * self.width + col]
    }

    /// Sample with coordinates clamped to the plane (edge replication).
    pub fn get_clamped(&self, row: isize, col: isize) -> T {
        let r = row.clamp(0, self.height as isize - 1) as usize;
        let c = col.clamp(0, self.width as isize - 1) as usize;
        self.data[r * self.width + c]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(row < self.height && col < self.width);
        self.data[row * self.width + col] = value;
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Applies `f` to every sample, producing a new plane.
    pub fn map<U: Copy, F: FnMut(T) -> U>(&self, f: F) -> Array2D<U> {
        Array2D {
            width: self.width,
            height: self.height,
            data: self.data.iter().copied().map(f).collect(),
        }
    }

    /// Copies `tile`-sized `values` (row-major) back into the plane.
    pub fn write_tile(&mut self, tile: &Tile, values: &[T]) {
        debug_assert_eq!(values.len(), tile.rows * tile.cols);
        for r in 0..tile.rows {
            let dst = (tile.row + r) * self.width + tile.col;
            self.data[dst..dst + tile.cols]
                .copy_from_slice(&values[r * tile.cols..(r + 1) * tile.cols]);
        }
    }

    /// Copies the part of the plane covered by `rect`.
    pub fn crop(&self, rect: &Rect) -> Result<Self> {
        if !Rect::of_size(self.width, self.height).contains_rect(rect) {
            return Err(SpotError::RegionOutOfBounds {
                region: rect.as_tuple(),
                width: self.width,
                height: self.height,
            });
        }
        let (rows, cols) = rect.ranges();
        let mut data = Vec::with_capacity(rect.width as usize * rect.height as usize);
        for row in rows {
            data.extend_from_slice(&self.row(row)[cols.clone()]);
        }
        Ok(Array2D {
            width: rect.width as usize,
            height: rect.height as usize,
            data,
        })
    }

    /// Iterates the plane in `size` x `size` tiles, clipped at the edges.
    pub fn tiles(&self, size: usize) -> TileIter {
        TileIter::new(self.width, self.height, size)
    }
}

impl Array2D<f32> {
    /// Largest sample, or 0 for an empty plane.
    pub fn max_value(&self) -> f32 {
        self.data.iter().copied().fold(0.0f32, f32::max)
    }

    /// Mean of all samples accumulated in double precision.
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| v as f64).sum::<f64>() / self.data.len() as f64
    }

    /// Divides every sample by the plane maximum so values land in [0, 1].
    pub fn normalize_to_unit(&mut self) {
        let max = self.max_value();
        if max > 0.0 {
            let inv = 1.0 / max;
            for v in self.data.iter_mut() {
                *v = (*v * inv).clamp(0.0, 1.0);
            }
        }
    }
}

/// A rectangular block of a plane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub row: usize,
    pub col: usize,
    pub rows: usize,
    pub cols: usize,
}

/// Row-major iterator over the tiles of a plane.
#[derive(Debug, Clone)]
pub struct TileIter {
    width: usize,
    height: usize,
    size: usize,
    row: usize,
    col: usize,
}

impl TileIter {
    fn new(width: usize, height: usize, size: usize) -> Self {
        TileIter {
            width,
            height,
            size: size.max(1),
            row: 0,
            col: 0,
        }
    }
}

impl Iterator for TileIter {
    type Item = Tile;

    fn next(&mut self) -> Option<Tile> {
        if self.width == 0 || self.row >= self.height {
            return None;
        }
        let tile = Tile {
            row: self.row,
            col: self.col,
            rows: self.size.min(self.height - self.row),
            cols: self.size.min(self.width - self.col),
        };
        self.col += self.size;
        if self.col >= self.width {
            self.col = 0;
            self.row += self.size;
        }
        Some(tile)
    }
}
