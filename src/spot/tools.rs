// src/spot/tools.rs

//! The closed set of tool families a spot can carry.
//!
//! Each variant holds only the fields its family needs. The compositor never
//! branches on the family; it asks the tool for its sensitivity, distance
//! weights, channel policy and structure strength, and the effect
//! collaborator reads the family-specific fields.

use crate::gate::DeltaEWeights;

/// Family discriminant, used for logging and reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ColorLight,
    Exposure,
    Vibrance,
    SoftLight,
    Retinex,
    DetailLevels,
    ToneMap,
    ShadowHighlight,
    Denoise,
    Sharpen,
}

/// Which channels a tool is allowed to change.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChannelPolicy {
    pub luma: bool,
    pub chroma: bool,
}

impl ChannelPolicy {
    pub const ALL: ChannelPolicy = ChannelPolicy { luma: true, chroma: true };
    pub const LUMA: ChannelPolicy = ChannelPolicy { luma: true, chroma: false };
    pub const CHROMA: ChannelPolicy = ChannelPolicy { luma: false, chroma: true };
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColorLightParams {
    pub sensitivity: f32,
    /// Structure-mask strength, 0..100.
    pub structure: f32,
    /// Chroma-vs-luma weighting of the colour distance, 0.2..2.5.
    pub balance: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExposureParams {
    pub sensitivity: f32,
    pub structure: f32,
    /// Exposure compensation in EV, for the effect.
    pub compensation: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct VibranceParams {
    pub sensitivity: f32,
    /// Boost of saturated tones, -100..100.
    pub saturated: f32,
    /// Boost of pastel tones, -100..100.
    pub pastels: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SoftLightParams {
    pub sensitivity: f32,
    /// 0..100.
    pub strength: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RetinexParams {
    pub sensitivity: f32,
    /// 0..100.
    pub strength: f32,
    /// Apply the result to chroma as well as lightness.
    pub chroma: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetailLevelsParams {
    pub sensitivity: f32,
    /// Per-level contrast multipliers, 0..4 with 1 neutral.
    pub multipliers: [f32; 5],
    /// 0..100.
    pub threshold: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToneMapParams {
    pub sensitivity: f32,
    /// Compression strength, -0.5..2.
    pub strength: f32,
    /// Spatial scale, 1..100.
    pub scale: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShadowHighlightParams {
    pub sensitivity: f32,
    /// 0..100.
    pub shadows: f32,
    /// 0..100.
    pub highlights: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DenoiseParams {
    pub sensitivity: f32,
    /// 0..100.
    pub luma_strength: f32,
    /// 0..100.
    pub chroma_strength: f32,
    /// Gate against the blurred reference instead of the plain one.
    pub blurred_reference: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SharpenParams {
    pub sensitivity: f32,
    /// Blur radius in pixels, 0.4..2.5.
    pub radius: f32,
    /// 0..1000.
    pub amount: f32,
}

/// One tool attached to a spot.
#[derive(Clone, Debug, PartialEq)]
pub enum Tool {
    ColorLight(ColorLightParams),
    Exposure(ExposureParams),
    Vibrance(VibranceParams),
    SoftLight(SoftLightParams),
    Retinex(RetinexParams),
    DetailLevels(DetailLevelsParams),
    ToneMap(ToneMapParams),
    ShadowHighlight(ShadowHighlightParams),
    Denoise(DenoiseParams),
    Sharpen(SharpenParams),
}

/// Default sensitivity of a freshly created tool.
pub const DEFAULT_SENSITIVITY: f32 = 19.0;

impl Tool {
    pub fn kind(&self) -> ToolKind {
        match self {
            Tool::ColorLight(_) => ToolKind::ColorLight,
            Tool::Exposure(_) => ToolKind::Exposure,
            Tool::Vibrance(_) => ToolKind::Vibrance,
            Tool::SoftLight(_) => ToolKind::SoftLight,
            Tool::Retinex(_) => ToolKind::Retinex,
            Tool::DetailLevels(_) => ToolKind::DetailLevels,
            Tool::ToneMap(_) => ToolKind::ToneMap,
            Tool::ShadowHighlight(_) => ToolKind::ShadowHighlight,
            Tool::Denoise(_) => ToolKind::Denoise,
            Tool::Sharpen(_) => ToolKind::Sharpen,
        }
    }

    /// Colour-similarity sensitivity, 0..100.
    pub fn sensitivity(&self) -> f32 {
        match self {
            Tool::ColorLight(p) => p.sensitivity,
            Tool::Exposure(p) => p.sensitivity,
            Tool::Vibrance(p) => p.sensitivity,
            Tool::SoftLight(p) => p.sensitivity,
            Tool::Retinex(p) => p.sensitivity,
            Tool::DetailLevels(p) => p.sensitivity,
            Tool::ToneMap(p) => p.sensitivity,
            Tool::ShadowHighlight(p) => p.sensitivity,
            Tool::Denoise(p) => p.sensitivity,
            Tool::Sharpen(p) => p.sensitivity,
        }
    }

    fn sensitivity_mut(&mut self) -> &mut f32 {
        match self {
            Tool::ColorLight(p) => &mut p.sensitivity,
            Tool::Exposure(p) => &mut p.sensitivity,
            Tool::Vibrance(p) => &mut p.sensitivity,
            Tool::SoftLight(p) => &mut p.sensitivity,
            Tool::Retinex(p) => &mut p.sensitivity,
            Tool::DetailLevels(p) => &mut p.sensitivity,
            Tool::ToneMap(p) => &mut p.sensitivity,
            Tool::ShadowHighlight(p) => &mut p.sensitivity,
            Tool::Denoise(p) => &mut p.sensitivity,
            Tool::Sharpen(p) => &mut p.sensitivity,
        }
    }

    /// Axis weights for the colour distance.
    pub fn delta_e_weights(&self) -> DeltaEWeights {
        match self {
            Tool::ColorLight(p) => DeltaEWeights::balanced(p.balance),
            // chroma edits should follow hue, not brightness
            Tool::Vibrance(_) => DeltaEWeights { ab: 1.0, l: 0.5 },
            _ => DeltaEWeights::default(),
        }
    }

    pub fn channels(&self) -> ChannelPolicy {
        match self {
            Tool::Vibrance(_) => ChannelPolicy::CHROMA,
            Tool::Retinex(p) if !p.chroma => ChannelPolicy::LUMA,
            Tool::ToneMap(_) | Tool::DetailLevels(_) | Tool::Sharpen(_) => ChannelPolicy::LUMA,
            _ => ChannelPolicy::ALL,
        }
    }

    /// Structure-mask strength in 0..1; zero disables the mask.
    pub fn structure_strength(&self) -> f32 {
        match self {
            Tool::ColorLight(p) => p.structure / 100.0,
            Tool::Exposure(p) => p.structure / 100.0,
            _ => 0.0,
        }
    }

    pub fn uses_blurred_reference(&self) -> bool {
        matches!(self, Tool::Denoise(p) if p.blurred_reference)
    }

    /// Clamps out-of-range fields in place and returns how many changed.
    pub fn sanitize(&mut self) -> usize {
        let mut changed = clamp_field(self.sensitivity_mut(), 0.0, 100.0, DEFAULT_SENSITIVITY);
        match self {
            Tool::ColorLight(p) => {
                changed += clamp_field(&mut p.structure, 0.0, 100.0, 0.0);
                changed += clamp_field(&mut p.balance, 0.2, 2.5, 1.0);
            }
            Tool::Exposure(p) => {
                changed += clamp_field(&mut p.structure, 0.0, 100.0, 0.0);
                changed += clamp_field(&mut p.compensation, -2.0, 4.0, 0.0);
            }
            Tool::Vibrance(p) => {
                changed += clamp_field(&mut p.saturated, -100.0, 100.0, 0.0);
                changed += clamp_field(&mut p.pastels, -100.0, 100.0, 0.0);
            }
            Tool::SoftLight(p) => {
                changed += clamp_field(&mut p.strength, 0.0, 100.0, 0.0);
            }
            Tool::Retinex(p) => {
                changed += clamp_field(&mut p.strength, 0.0, 100.0, 0.0);
            }
            Tool::DetailLevels(p) => {
                for m in p.multipliers.iter_mut() {
                    changed += clamp_field(m, 0.0, 4.0, 1.0);
                }
                changed += clamp_field(&mut p.threshold, 0.0, 100.0, 0.0);
            }
            Tool::ToneMap(p) => {
                changed += clamp_field(&mut p.strength, -0.5, 2.0, 0.5);
                changed += clamp_field(&mut p.scale, 1.0, 100.0, 10.0);
            }
            Tool::ShadowHighlight(p) => {
                changed += clamp_field(&mut p.shadows, 0.0, 100.0, 0.0);
                changed += clamp_field(&mut p.highlights, 0.0, 100.0, 0.0);
            }
            Tool::Denoise(p) => {
                changed += clamp_field(&mut p.luma_strength, 0.0, 100.0, 0.0);
                changed += clamp_field(&mut p.chroma_strength, 0.0, 100.0, 0.0);
            }
            Tool::Sharpen(p) => {
                changed += clamp_field(&mut p.radius, 0.4, 2.5, 0.75);
                changed += clamp_field(&mut p.amount, 0.0, 1000.0, 100.0);
            }
        }
        changed
    }

    pub fn color_light(sensitivity: f32) -> Tool {
        Tool::ColorLight(ColorLightParams {
            sensitivity,
            structure: 0.0,
            balance: 1.0,
        })
    }

    pub fn exposure(sensitivity: f32, compensation: f32) -> Tool {
        Tool::Exposure(ExposureParams {
            sensitivity,
            structure: 0.0,
            compensation,
        })
    }

    pub fn vibrance(sensitivity: f32) -> Tool {
        Tool::Vibrance(VibranceParams {
            sensitivity,
            saturated: 0.0,
            pastels: 0.0,
        })
    }

    pub fn denoise(sensitivity: f32, blurred_reference: bool) -> Tool {
        Tool::Denoise(DenoiseParams {
            sensitivity,
            luma_strength: 0.0,
            chroma_strength: 0.0,
            blurred_reference,
        })
    }

    pub fn tone_map(sensitivity: f32) -> Tool {
        Tool::ToneMap(ToneMapParams {
            sensitivity,
            strength: 0.5,
            scale: 10.0,
        })
    }
}

/// Clamps `value` into `[lo, hi]`; NaN falls back to `default`.
/// Returns 1 if the value changed.
fn clamp_field(value: &mut f32, lo: f32, hi: f32, default: f32) -> usize {
    let old = *value;
    let new = if old.is_nan() { default } else { old.clamp(lo, hi) };
    *value = new;
    usize::from(new.to_bits() != old.to_bits())
}

/// A tool together with its enable flag.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolSlot {
    pub enabled: bool,
    pub tool: Tool,
}

impl ToolSlot {
    pub fn enabled(tool: Tool) -> Self {
        ToolSlot { enabled: true, tool }
    }

    pub fn disabled(tool: Tool) -> Self {
        ToolSlot {
            enabled: false,
            tool,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_clamps_stale_values() {
        let mut tool = Tool::ColorLight(ColorLightParams {
            sensitivity: 140.0,
            structure: -5.0,
            balance: f32::NAN,
        });
        assert_eq!(tool.sanitize(), 3);
        match tool {
            Tool::ColorLight(p) => {
                assert_eq!(p.sensitivity, 100.0);
                assert_eq!(p.structure, 0.0);
                assert_eq!(p.balance, 1.0);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_sanitize_clamps_effect_strengths() {
        let mut tone = Tool::ToneMap(ToneMapParams {
            sensitivity: 30.0,
            strength: 9.0,
            scale: f32::NAN,
        });
        assert_eq!(tone.sanitize(), 2);
        assert_eq!(
            tone,
            Tool::ToneMap(ToneMapParams {
                sensitivity: 30.0,
                strength: 2.0,
                scale: 10.0,
            })
        );

        let mut levels = Tool::DetailLevels(DetailLevelsParams {
            sensitivity: 30.0,
            multipliers: [1.0, -1.0, 6.0, 1.0, 1.0],
            threshold: 250.0,
        });
        assert_eq!(levels.sanitize(), 3);
        match levels {
            Tool::DetailLevels(p) => {
                assert_eq!(p.multipliers, [1.0, 0.0, 4.0, 1.0, 1.0]);
                assert_eq!(p.threshold, 100.0);
            }
            _ => unreachable!(),
        }

        let mut others = [
            Tool::Vibrance(VibranceParams { sensitivity: 30.0, saturated: 300.0, pastels: -300.0 }),
            Tool::SoftLight(SoftLightParams { sensitivity: 30.0, strength: -1.0 }),
            Tool::Retinex(RetinexParams { sensitivity: 30.0, strength: 101.0, chroma: false }),
            Tool::ShadowHighlight(ShadowHighlightParams { sensitivity: 30.0, shadows: 120.0, highlights: -4.0 }),
            Tool::Denoise(DenoiseParams {
                sensitivity: 30.0,
                luma_strength: 500.0,
                chroma_strength: -2.0,
                blurred_reference: false,
            }),
            Tool::Sharpen(SharpenParams { sensitivity: 30.0, radius: 0.75, amount: 5000.0 }),
        ];
        let changed: Vec<usize> = others.iter_mut().map(Tool::sanitize).collect();
        assert_eq!(changed, vec![2, 1, 1, 2, 2, 1]);
        assert!(others.iter_mut().all(|tool| tool.sanitize() == 0));
    }

    #[test]
    fn test_sanitize_leaves_valid_values() {
        let mut tool = Tool::vibrance(40.0);
        assert_eq!(tool.sanitize(), 0);
        assert_eq!(tool.sensitivity(), 40.0);
    }

    #[test]
    fn test_channel_policies() {
        assert_eq!(Tool::vibrance(10.0).channels(), ChannelPolicy::CHROMA);
        assert_eq!(Tool::tone_map(10.0).channels(), ChannelPolicy::LUMA);
        let retinex = Tool::Retinex(RetinexParams {
            sensitivity: 10.0,
            strength: 1.0,
            chroma: true,
        });
        assert_eq!(retinex.channels(), ChannelPolicy::ALL);
    }

    #[test]
    fn test_structure_and_blur_flags() {
        let mut exposure = Tool::exposure(20.0, 1.0);
        assert_eq!(exposure.structure_strength(), 0.0);
        if let Tool::Exposure(p) = &mut exposure {
            p.structure = 50.0;
        }
        assert!((exposure.structure_strength() - 0.5).abs() < 1e-6);
        assert!(Tool::denoise(30.0, true).uses_blurred_reference());
        assert!(!Tool::denoise(30.0, false).uses_blurred_reference());
    }
}
