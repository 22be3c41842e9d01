// src/spot/params.rs

//! The resolved spot parameter block.
//!
//! Everything downstream of the resolver reads this flat record. All values
//! are already in working-buffer pixel units and inside their valid ranges.

use crate::composite::preview::MaskPreview;
use crate::image::geom::Rect;
use crate::mask::user::UserMaskCurves;
use crate::spot::tools::Tool;

/// Outline of a spot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Shape {
    #[default]
    Ellipse,
    Rectangle,
}

/// Spot outline in working-buffer pixels.
///
/// Each quadrant around the center has its own extent, so ellipses and
/// rectangles may be asymmetric.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SpotGeometry {
    pub cx: f32,
    pub cy: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
    pub shape: Shape,
    /// Fraction of the extent receiving full effect, in (0, 1).
    pub transition: f32,
    /// Exponent applied to the transition weight.
    pub weakness: f32,
}

impl SpotGeometry {
    /// Symmetric ellipse with the given radii and defaults elsewhere.
    pub fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32, transition: f32) -> Self {
        SpotGeometry {
            cx,
            cy,
            left: rx,
            right: rx,
            top: ry,
            bottom: ry,
            shape: Shape::Ellipse,
            transition,
            weakness: 1.0,
        }
    }

    /// Rectangle with independent extents.
    pub fn rectangle(
        cx: f32,
        cy: f32,
        (left, right, top, bottom): (f32, f32, f32, f32),
        transition: f32,
    ) -> Self {
        SpotGeometry {
            cx,
            cy,
            left,
            right,
            top,
            bottom,
            shape: Shape::Rectangle,
            transition,
            weakness: 1.0,
        }
    }

    /// Bounding box of the outer extent.
    pub fn outer_box(&self) -> Rect {
        Rect::enclosing(
            self.cx - self.left,
            self.cy - self.top,
            self.cx + self.right,
            self.cy + self.bottom,
        )
    }
}

/// Gate tuning shared by all tools of a spot.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct GateSettings {
    /// Threshold tunable `thr` of the distance ramp.
    pub threshold: f32,
    /// Exponent applied to the ramp.
    pub exponent: f32,
}

/// Resolved user-mask configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct UserMaskSettings {
    pub curves: UserMaskCurves,
    /// Guided-filter radius for the luminance channel, in pixels.
    pub radius: usize,
    /// Guided-filter radius for the chroma channels, in pixels.
    pub chroma_radius: usize,
    /// Blend strength in 0..1.
    pub blend: f32,
}

/// Flat per-spot parameter block.
#[derive(Clone, Debug, PartialEq)]
pub struct SpotParams {
    pub name: String,
    pub geometry: SpotGeometry,
    /// Apply the effect outside the shape instead of inside.
    pub inverse: bool,
    /// Radius of the reference sampling disk, in pixels.
    pub reference_radius: f32,
    /// Gaussian sigma of the blurred reference, in pixels.
    pub reference_blur: f32,
    /// Gaussian sigma applied before edge detection, in pixels.
    pub structure_blur: f32,
    pub gate: GateSettings,
    pub user_mask: Option<UserMaskSettings>,
    pub preview: Option<MaskPreview>,
    /// Enabled tools, in application order.
    pub tools: Vec<Tool>,
    /// Downscale divisor of the working buffer.
    pub skip: f32,
}

impl SpotParams {
    /// Minimal block around a geometry, mainly for direct compositor use.
    pub fn from_geometry(geometry: SpotGeometry) -> Self {
        SpotParams {
            name: String::new(),
            geometry,
            inverse: false,
            reference_radius: 4.0,
            reference_blur: 3.0,
            structure_blur: 0.0,
            gate: GateSettings {
                threshold: 1.8,
                exponent: 1.0,
            },
            user_mask: None,
            preview: None,
            tools: Vec::new(),
            skip: 1.0,
        }
    }

    pub fn with_tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    /// Guided-filter radius used by the structure mask for a given strength.
    pub fn structure_radius(&self, strength: f32) -> usize {
        (1.0 + strength * 10.0 / self.skip).round().max(1.0) as usize
    }

    /// Extra pixels kept around the outer box so blurs do not see the crop edge.
    pub fn crop_margin(&self) -> i32 {
        let sigma = self.reference_blur.max(self.structure_blur);
        let guided = self
            .user_mask
            .as_ref()
            .map_or(0, |m| m.radius.max(m.chroma_radius));
        let structure = self
            .tools
            .iter()
            .map(|t| self.structure_radius(t.structure_strength()))
            .max()
            .unwrap_or(0);
        (3.0 * sigma).ceil() as i32 + guided.max(structure) as i32 + 2
    }

    /// Region of a `width` x `height` buffer this spot can touch, including
    /// the crop margin. Inverse spots cover the whole buffer.
    pub fn region(&self, width: usize, height: usize) -> Rect {
        let buffer = Rect::of_size(width, height);
        if self.inverse {
            return buffer;
        }
        buffer.intersection(&self.geometry.outer_box().inflate(self.crop_margin()))
    }
}
