// src/composite/preview.rs

//! Mask previews.
//!
//! Instead of compositing, a previewed spot writes its mask into the output
//! as a grey ramp: `L = PREVIEW_FLOOR + value * (L_MAX - PREVIEW_FLOOR)`
//! with `a = b = 0`. The value is scaled by the spatial weight so the
//! spot outline stays visible. Pixels outside the region are untouched.

use crate::composite::transit::tool_gate;
use crate::gate::Anchor;
use crate::image::color::L_MAX;
use crate::image::geom::Rect;
use crate::image::lab_image::{LabImage, LabPixel};
use crate::mask::structure::StructureMask;
use crate::mask::user::LabMask;
use crate::reference::SpotReference;
use crate::spot::params::SpotParams;
use crate::spot::tools::Tool;
use crate::utils::error::{Result, SpotError};
use crate::utils::parallel::for_each_row_in_mut;
use crate::zone::ZoneClassifier;

/// Lightness of a zero mask value, so it stays distinct from black.
pub const PREVIEW_FLOOR: f32 = 6000.0;

/// Which mask a spot shows instead of its edit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MaskPreview {
    /// Refined user mask (lightness channel).
    UserMask,
    /// Refined structure mask of the first tool using one.
    Structure,
    /// Combined spatial weight and colour gate of the first tool.
    Footprint,
}

/// Masks available to a preview.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreviewSources<'a> {
    pub original: Option<&'a LabImage>,
    pub reference: Option<&'a SpotReference>,
    pub tool: Option<&'a Tool>,
    pub user_mask: Option<&'a LabMask>,
    pub structure: Option<&'a StructureMask>,
}

/// Lightness used to display a mask value.
#[inline]
pub fn preview_pixel(value: f32) -> LabPixel {
    LabPixel::new(PREVIEW_FLOOR + value.clamp(0.0, 1.0) * (L_MAX - PREVIEW_FLOOR), 0.0, 0.0)
}

/// Writes the requested mask of `spot` over `region` of `output`.
pub fn render_mask_preview(
    spot: &SpotParams,
    preview: MaskPreview,
    region: Rect,
    sources: &PreviewSources<'_>,
    output: &mut LabImage,
) -> Result<()> {
    let (ow, oh) = output.dimensions();
    if region.x < 0 || region.y < 0 || !output.bounds().contains_rect(&region) {
        return Err(SpotError::RegionOutOfBounds {
            region: region.as_tuple(),
            width: ow,
            height: oh,
        });
    }
    let expected = (region.width as usize, region.height as usize);

    let user = match preview {
        MaskPreview::UserMask => Some(sources.user_mask.ok_or_else(|| missing("user mask"))?),
        _ => None,
    };
    let structure = match preview {
        MaskPreview::Structure => Some(sources.structure.ok_or_else(|| missing("structure mask"))?),
        _ => None,
    };
    let footprint = match preview {
        MaskPreview::Footprint => {
            let original = sources.original.ok_or_else(|| missing("original region"))?;
            let reference = sources.reference.ok_or_else(|| missing("reference"))?;
            let tool = sources.tool.ok_or_else(|| missing("tool"))?;
            let anchor = Anchor::from(&reference.anchor_color(false));
            Some((original, tool_gate(spot, tool), anchor))
        }
        _ => None,
    };
    let dims = user
        .map(|m| m.dimensions())
        .or(structure.map(|s| s.mask.dimensions()))
        .or(footprint.map(|(o, _, _)| o.dimensions()));
    if let Some(actual) = dims.filter(|&d| d != expected) {
        return Err(SpotError::mismatch(expected, actual));
    }

    let classifier = ZoneClassifier::new(spot.geometry);
    let inverse = spot.inverse;
    let (rows, cols) = region.ranges();
    let (x0, y0) = (cols.start, rows.start);
    for_each_row_in_mut(output.pixels_mut(), ow, rows, |y, out_row| {
        let r = y - y0;
        for (c, out) in out_row[cols.clone()].iter_mut().enumerate() {
            let spatial = classifier
                .classify((x0 + c) as f32, y as f32)
                .spatial_weight(inverse);
            let value = if let Some(mask) = user {
                mask.luma.get(r, c)
            } else if let Some(mask) = structure {
                mask.mask.get(r, c)
            } else if let Some((original, gate, anchor)) = &footprint {
                gate.evaluate(&original.get_pixel(r, c), anchor)
            } else {
                0.0
            };
            *out = preview_pixel(value * spatial);
        }
    });
    Ok(())
}

fn missing(what: &str) -> SpotError {
    SpotError::InvalidArg(format!("mask preview needs a {what}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::array2d::Array2D;
    use crate::spot::params::SpotGeometry;

    #[test]
    fn test_user_mask_preview_zeroes_chroma() {
        let spot = SpotParams::from_geometry(SpotGeometry::ellipse(8.0, 8.0, 6.0, 6.0, 0.5));
        let mask = LabMask {
            luma: Array2D::filled(16, 16, 1.0),
            chroma: Array2D::filled(16, 16, 1.0),
        };
        let mut output = LabImage::from_pixel(16, 16, LabPixel::new(9000.0, 500.0, -500.0));
        let sources = PreviewSources {
            user_mask: Some(&mask),
            ..Default::default()
        };
        render_mask_preview(&spot, MaskPreview::UserMask, output.bounds(), &sources, &mut output).unwrap();
        assert!(output.pixels().iter().all(|p| p.a == 0.0 && p.b == 0.0));
        assert_eq!(output.get_pixel(8, 8).l, L_MAX);
        assert_eq!(output.get_pixel(0, 0).l, PREVIEW_FLOOR);
    }

    #[test]
    fn test_missing_mask_is_an_error() {
        let spot = SpotParams::from_geometry(SpotGeometry::ellipse(4.0, 4.0, 2.0, 2.0, 0.5));
        let mut output = LabImage::new(8, 8);
        let err = render_mask_preview(
            &spot,
            MaskPreview::Structure,
            output.bounds(),
            &PreviewSources::default(),
            &mut output,
        )
        .unwrap_err();
        assert!(matches!(err, SpotError::InvalidArg(_)));
    }

    #[test]
    fn test_region_limits_the_write() {
        let spot = SpotParams::from_geometry(SpotGeometry::ellipse(5.0, 5.0, 3.0, 3.0, 0.5));
        let mask = LabMask {
            luma: Array2D::filled(4, 4, 1.0),
            chroma: Array2D::filled(4, 4, 1.0),
        };
        let mut output = LabImage::from_pixel(12, 12, LabPixel::new(100.0, 7.0, 7.0));
        let sources = PreviewSources {
            user_mask: Some(&mask),
            ..Default::default()
        };
        render_mask_preview(&spot, MaskPreview::UserMask, Rect::new(3, 3, 4, 4), &sources, &mut output).unwrap();
        assert_eq!(output.get_pixel(0, 0), LabPixel::new(100.0, 7.0, 7.0));
        assert_eq!(output.get_pixel(5, 5).l, L_MAX);
    }
}
