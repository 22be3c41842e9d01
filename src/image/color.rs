// src/image/color.rs

//! Native channel scales and polar helpers for Lab pixels.
//!
//! Lightness is stored on a 0..32768 scale and the opponent channels on
//! roughly ±42000, matching the fixed-point-equivalent float ranges the
//! collaborating effects produce. Perceptual comparisons happen on the
//! familiar 0..100 scale, obtained by dividing by [`LAB_SCALE`].

/// Upper bound of the lightness channel.
pub const L_MAX: f32 = 32768.0;

/// Bound of each opponent channel (`a`, `b`) and of the chroma magnitude.
pub const CHROMA_MAX: f32 = 42000.0;

/// Native units per perceptual unit (32768 / 100).
pub const LAB_SCALE: f32 = 327.68;

/// Chroma magnitudes below this are treated as achromatic.
pub const ACHROMATIC_EPS: f32 = 1e-6;

/// Clamps lightness to `[0, L_MAX]`.
#[inline]
pub fn clamp_l(l: f32) -> f32 {
    l.clamp(0.0, L_MAX)
}

/// Clamps an opponent channel to `[-CHROMA_MAX, CHROMA_MAX]`.
#[inline]
pub fn clamp_ab(v: f32) -> f32 {
    v.clamp(-CHROMA_MAX, CHROMA_MAX)
}

/// Clamps `(a, b)` so the chroma magnitude stays within `CHROMA_MAX`,
/// keeping the hue.
#[inline]
pub fn clamp_chroma(a: f32, b: f32) -> (f32, f32) {
    let c = (a * a + b * b).sqrt();
    if c > CHROMA_MAX {
        let k = CHROMA_MAX / c;
        (a * k, b * k)
    } else {
        (a, b)
    }
}

/// Chroma magnitude of `(a, b)`.
#[inline]
pub fn chroma(a: f32, b: f32) -> f32 {
    (a * a + b * b).sqrt()
}

/// Hue angle of `(a, b)` in radians; 0 for achromatic input.
#[inline]
pub fn hue(a: f32, b: f32) -> f32 {
    if chroma(a, b) < ACHROMATIC_EPS {
        0.0
    } else {
        b.atan2(a)
    }
}

/// `(sin, cos)` of the hue of `(a, b)`; `(0, 1)` for achromatic input.
#[inline]
pub fn hue_sin_cos(a: f32, b: f32) -> (f32, f32) {
    let c = chroma(a, b);
    if c < ACHROMATIC_EPS {
        (0.0, 1.0)
    } else {
        (b / c, a / c)
    }
}

/// Maps a hue angle in `(-π, π]` to `[0, 1]`.
#[inline]
pub fn hue_to_unit(h: f32) -> f32 {
    ((h + std::f32::consts::PI) / std::f32::consts::TAU).clamp(0.0, 1.0)
}
