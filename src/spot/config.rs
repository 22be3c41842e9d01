// src/spot/config.rs

//! User-facing spot configuration and its resolution into [`SpotParams`].
//!
//! Values use the units of the editing controls: the center is given in
//! per-mille of half the image size relative to the image center, extents in
//! 1/2000 of the image dimension, strengths in percent. Saved settings can
//! carry values outside today's control ranges; the resolver clamps them and
//! logs a warning instead of failing.

use crate::composite::preview::MaskPreview;
use crate::mask::user::UserMaskCurves;
use crate::spot::params::{GateSettings, Shape, SpotGeometry, SpotParams, UserMaskSettings};
use crate::spot::tools::{Tool, ToolSlot};
use crate::utils::log::{debug, warn};

/// How the four extents relate to each other.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ExtentMode {
    /// Left/right and top/bottom are set independently.
    #[default]
    Independent,
    /// Left mirrors right and top mirrors bottom.
    Symmetric,
}

/// Describes the working buffer relative to the full-resolution image.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub full_width: usize,
    pub full_height: usize,
    /// Downscale divisor of the working buffer (1 = full resolution).
    pub skip: u32,
    /// Top-left corner of the working buffer in full-resolution pixels.
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Viewport {
    /// Full-resolution buffer covering the whole image.
    pub fn full(width: usize, height: usize) -> Self {
        Viewport {
            full_width: width,
            full_height: height,
            skip: 1,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }

    pub fn with_skip(mut self, skip: u32) -> Self {
        self.skip = skip.max(1);
        self
    }

    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin_x = x;
        self.origin_y = y;
        self
    }
}

/// User-authored mask curves and their refinement settings.
#[derive(Clone, Debug, PartialEq)]
pub struct UserMaskConfig {
    pub enabled: bool,
    pub curves: UserMaskCurves,
    /// Smoothing radius control, 0..100.
    pub blur: f32,
    /// Blend strength in percent.
    pub blend: f32,
}

impl Default for UserMaskConfig {
    fn default() -> Self {
        UserMaskConfig {
            enabled: false,
            curves: UserMaskCurves::default(),
            blur: 10.0,
            blend: 100.0,
        }
    }
}

/// One user-placed spot.
#[derive(Clone, Debug, PartialEq)]
pub struct SpotConfig {
    pub name: String,
    pub shape: Shape,
    pub extent_mode: ExtentMode,
    /// Center, -1000..1000 per-mille of the half image.
    pub center_x: f32,
    pub center_y: f32,
    /// Right extent, 0..2250 in 1/2000 of the image width.
    pub loc_x: f32,
    /// Left extent.
    pub loc_xl: f32,
    /// Bottom extent, 0..2250 in 1/2000 of the image height.
    pub loc_y: f32,
    /// Top extent.
    pub loc_yt: f32,
    /// Reference sampling radius, 4..150 full-resolution pixels.
    pub circle_radius: f32,
    /// Gate threshold, 1..35.
    pub threshold: f32,
    /// Gate sharpness, 0..60; 20 is neutral.
    pub proximity: f32,
    /// Full-effect part of the extent in percent, 5..95.
    pub transit: f32,
    /// Transition exponent, 0.5..10.
    pub transition_weakness: f32,
    /// Pre-blur for edge detection, 0..100.
    pub structure_blur: f32,
    pub inverse: bool,
    pub mask: UserMaskConfig,
    pub preview: Option<MaskPreview>,
    pub tools: Vec<ToolSlot>,
}

impl Default for SpotConfig {
    fn default() -> Self {
        SpotConfig {
            name: String::from("spot"),
            shape: Shape::Ellipse,
            extent_mode: ExtentMode::Independent,
            center_x: 0.0,
            center_y: 0.0,
            loc_x: 250.0,
            loc_xl: 250.0,
            loc_y: 250.0,
            loc_yt: 250.0,
            circle_radius: 18.0,
            threshold: 18.0,
            proximity: 20.0,
            transit: 60.0,
            transition_weakness: 1.0,
            structure_blur: 0.0,
            inverse: false,
            mask: UserMaskConfig::default(),
            preview: None,
            tools: Vec::new(),
        }
    }
}

/// Clamps a control value, warning when it was out of range.
fn clamp_control(name: &str, spot: &str, value: f32, lo: f32, hi: f32, default: f32) -> f32 {
    if value.is_nan() {
        warn!("spot '{}': {} is NaN, using {}", spot, name, default);
        return default;
    }
    let clamped = value.clamp(lo, hi);
    if clamped != value {
        warn!(
            "spot '{}': {} = {} outside [{}, {}], clamped to {}",
            spot, name, value, lo, hi, clamped
        );
    }
    clamped
}

impl SpotConfig {
    pub fn new(name: &str) -> Self {
        SpotConfig {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_center(mut self, x: f32, y: f32) -> Self {
        self.center_x = x;
        self.center_y = y;
        self
    }

    /// Sets all four extents; `Symmetric` mode later mirrors right/bottom.
    pub fn with_extents(mut self, left: f32, right: f32, top: f32, bottom: f32) -> Self {
        self.loc_xl = left;
        self.loc_x = right;
        self.loc_yt = top;
        self.loc_y = bottom;
        self
    }

    pub fn with_extent_mode(mut self, mode: ExtentMode) -> Self {
        self.extent_mode = mode;
        self
    }

    pub fn with_transit(mut self, transit: f32) -> Self {
        self.transit = transit;
        self
    }

    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse = inverse;
        self
    }

    pub fn with_mask(mut self, mask: UserMaskConfig) -> Self {
        self.mask = mask;
        self
    }

    pub fn with_preview(mut self, preview: MaskPreview) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(ToolSlot::enabled(tool));
        self
    }

    /// Expands the configuration into working-buffer units.
    pub fn resolve(&self, viewport: &Viewport) -> SpotParams {
        let name = self.name.as_str();
        let w = viewport.full_width as f32;
        let h = viewport.full_height as f32;
        let skip = viewport.skip.max(1) as f32;

        let center_x = clamp_control("center_x", name, self.center_x, -1000.0, 1000.0, 0.0);
        let center_y = clamp_control("center_y", name, self.center_y, -1000.0, 1000.0, 0.0);
        let loc_x = clamp_control("loc_x", name, self.loc_x, 0.0, 2250.0, 250.0);
        let loc_y = clamp_control("loc_y", name, self.loc_y, 0.0, 2250.0, 250.0);
        let (loc_xl, loc_yt) = match self.extent_mode {
            ExtentMode::Symmetric => (loc_x, loc_y),
            ExtentMode::Independent => (
                clamp_control("loc_xl", name, self.loc_xl, 0.0, 2250.0, 250.0),
                clamp_control("loc_yt", name, self.loc_yt, 0.0, 2250.0, 250.0),
            ),
        };
        let circle_radius = clamp_control("circle_radius", name, self.circle_radius, 4.0, 150.0, 18.0);
        let threshold = clamp_control("threshold", name, self.threshold, 1.0, 35.0, 18.0);
        let proximity = clamp_control("proximity", name, self.proximity, 0.0, 60.0, 20.0);
        let transit = clamp_control("transit", name, self.transit, 5.0, 95.0, 60.0);
        let weakness = clamp_control(
            "transition_weakness",
            name,
            self.transition_weakness,
            0.5,
            10.0,
            1.0,
        );
        let structure_blur = clamp_control("structure_blur", name, self.structure_blur, 0.0, 100.0, 0.0);

        let geometry = SpotGeometry {
            cx: (w / 2.0 + center_x * w / 2000.0 - viewport.origin_x) / skip,
            cy: (h / 2.0 + center_y * h / 2000.0 - viewport.origin_y) / skip,
            right: loc_x * w / 2000.0 / skip,
            left: loc_xl * w / 2000.0 / skip,
            bottom: loc_y * h / 2000.0 / skip,
            top: loc_yt * h / 2000.0 / skip,
            shape: self.shape,
            transition: transit / 100.0,
            weakness,
        };

        let mut tools = Vec::new();
        for slot in self.tools.iter().filter(|s| s.enabled) {
            let mut tool = slot.tool.clone();
            let changed = tool.sanitize();
            if changed > 0 {
                warn!(
                    "spot '{}': {} out-of-range {:?} field(s) clamped",
                    name,
                    changed,
                    tool.kind()
                );
            }
            tools.push(tool);
        }

        let user_mask = if self.mask.enabled && self.mask.curves.is_active() {
            let blur = clamp_control("mask.blur", name, self.mask.blur, 0.0, 100.0, 10.0);
            let blend = clamp_control("mask.blend", name, self.mask.blend, 0.0, 100.0, 100.0);
            let radius = (blur / skip).round() as usize;
            Some(UserMaskSettings {
                curves: self.mask.curves.clone(),
                radius,
                chroma_radius: radius / 2,
                blend: blend / 100.0,
            })
        } else {
            None
        };

        let params = SpotParams {
            name: self.name.clone(),
            geometry,
            inverse: self.inverse,
            reference_radius: (circle_radius / skip).max(2.0),
            reference_blur: (3.0 / skip).max(0.5),
            structure_blur: structure_blur / 10.0 / skip,
            gate: GateSettings {
                threshold: threshold / 10.0,
                exponent: (proximity / 20.0).max(0.2),
            },
            user_mask,
            preview: self.preview,
            tools,
            skip,
        };
        debug!(
            "resolved spot '{}': center=({:.1}, {:.1}) extents L{:.1} R{:.1} T{:.1} B{:.1} tools={}",
            params.name,
            geometry.cx,
            geometry.cy,
            geometry.left,
            geometry.right,
            geometry.top,
            geometry.bottom,
            params.tools.len()
        );
        params
    }
}
