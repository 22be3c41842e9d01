// src/image/lab_image.rs

//! In-memory Lab pixel buffers.
//!
//! `LabImage` is the buffer shape shared by the original working state, the
//! processed candidates returned by effects, and the output. Pixels are
//! stored interleaved so a compositor row is one contiguous slice; single
//! channels are extracted into [`Array2D`] planes for the filter passes.

use crate::image::array2d::Array2D;
use crate::image::color;
use crate::image::geom::Rect;
use crate::utils::error::{Result, SpotError};
use bytemuck::{Pod, Zeroable};

/// A single Lab pixel in native channel scale.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LabPixel {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

impl LabPixel {
    pub fn new(l: f32, a: f32, b: f32) -> Self {
        LabPixel { l, a, b }
    }

    pub fn black() -> Self {
        LabPixel::default()
    }

    /// Neutral gray at the given lightness.
    pub fn gray(l: f32) -> Self {
        LabPixel { l, a: 0.0, b: 0.0 }
    }

    pub fn chroma(&self) -> f32 {
        color::chroma(self.a, self.b)
    }

    pub fn hue(&self) -> f32 {
        color::hue(self.a, self.b)
    }

    /// Returns the pixel with every channel inside its valid range.
    pub fn clamped(self) -> Self {
        let (a, b) = color::clamp_chroma(self.a, self.b);
        LabPixel {
            l: color::clamp_l(self.l),
            a,
            b,
        }
    }
}

impl From<[f32; 3]> for LabPixel {
    fn from(arr: [f32; 3]) -> Self {
        LabPixel {
            l: arr[0],
            a: arr[1],
            b: arr[2],
        }
    }
}

impl From<LabPixel> for [f32; 3] {
    fn from(p: LabPixel) -> Self {
        [p.l, p.a, p.b]
    }
}

/// Selects one channel of a [`LabImage`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Channel {
    L,
    A,
    B,
}

/// A 2D buffer of Lab pixels stored in row-major order.
#[derive(Clone, Debug, PartialEq)]
pub struct LabImage {
    width: usize,
    height: usize,
    data: Vec<LabPixel>,
}

impl LabImage {
    /// Creates an image with the given dimensions, initialized to black.
    pub fn new(width: usize, height: usize) -> Self {
        Self::from_pixel(width, height, LabPixel::black())
    }

    /// Creates an image filled with a single pixel value.
    pub fn from_pixel(width: usize, height: usize, pixel: LabPixel) -> Self {
        LabImage {
            width,
            height,
            data: vec![pixel; width * height],
        }
    }

    /// Creates an image from a raw vector of pixels in row-major order.
    pub fn from_vec(width: usize, height: usize, data: Vec<LabPixel>) -> Result<Self> {
        if data.len() != width * height {
            return Err(SpotError::InvalidArg(format!(
                "expected {} pixels for a {}x{} image, got {}",
                width * height,
                width,
                height,
                data.len()
            )));
        }
        Ok(LabImage {
            width,
            height,
            data,
        })
    }

    /// Creates an image by calling `f(row, col)` for each pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> LabPixel,
    {
        let mut data = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                data.push(f(row, col));
            }
        }
        LabImage {
            width,
            height,
            data,
        }
    }

    /// Assembles an image from three planes of equal size.
    pub fn from_planes(l: &Array2D<f32>, a: &Array2D<f32>, b: &Array2D<f32>) -> Result<Self> {
        let dims = l.dimensions();
        for plane in [a, b] {
            if plane.dimensions() != dims {
                return Err(SpotError::mismatch(dims, plane.dimensions()));
            }
        }
        let data = l
            .as_slice()
            .iter()
            .zip(a.as_slice())
            .zip(b.as_slice())
            .map(|((&l, &a), &b)| LabPixel { l, a, b })
            .collect();
        Ok(LabImage {
            width: dims.0,
            height: dims.1,
            data,
        })
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

    pub fn bounds(&self) -> Rect {
        Rect::of_size(self.width, self.height)
    }

    pub fn get_pixel(&self, row: usize, col: usize) -> LabPixel {
        assert!(row < self.height && col < self.width);
        self.data[row * self.width + col]
    }

    pub fn put_pixel(&mut self, row: usize, col: usize, pixel: LabPixel) {
        assert!(row < self.height && col < self.width);
        self.data[row * self.width + col] = pixel;
    }

    pub fn row(&self, row: usize) -> &[LabPixel] {
        &self.data[row * self.width..(row + 1) * self.width]
    }

    pub fn pixels(&self) -> &[LabPixel] {
        &self.data
    }

    pub fn pixels_mut(&mut self) -> &mut [LabPixel] {
        &mut self.data
    }

    /// Returns the channel samples as a flat `[l, a, b, l, a, b, ...]` slice.
    pub fn as_raw(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data)
    }

    /// Returns mutable channel samples as a flat slice.
    pub fn as_raw_mut(&mut self) -> &mut [f32] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Extracts one channel as a plane.
    pub fn channel(&self, channel: Channel) -> Array2D<f32> {
        let offset = match channel {
            Channel::L => 0,
            Channel::A => 1,
            Channel::B => 2,
        };
        let samples = self.as_raw().iter().skip(offset).step_by(3).copied().collect();
        Array2D::from_vec(self.width, self.height, samples)
            .unwrap_or_else(|_| Array2D::new(self.width, self.height))
    }

    /// Copies the part of the image covered by `rect`.
    pub fn crop(&self, rect: &Rect) -> Result<LabImage> {
        if !self.bounds().contains_rect(rect) {
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
        Ok(LabImage {
            width: rect.width as usize,
            height: rect.height as usize,
            data,
        })
    }

    /// Clamps every pixel to the valid channel ranges.
    pub fn clamp_all(&mut self) {
        for p in self.data.iter_mut() {
            *p = p.clamped();
        }
    }
}
