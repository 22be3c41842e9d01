use image::{GrayImage, Luma};
use spotblend::image::color::L_MAX;
use spotblend::mask::MaskCurve;
use spotblend::{
    DeltaBuffers, EffectOutput, LabImage, LabPixel, MaskPreview, Result, Shape, SpotConfig, SpotParams,
    SpotPipeline, Tool, UserMaskConfig, UserMaskCurves, Viewport,
};

/// Stand-in for the real photographic effects.
fn toy_effect(tool: &Tool, crop: &LabImage, _spot: &SpotParams) -> Result<Option<EffectOutput>> {
    match tool {
        Tool::Exposure(p) => {
            let gain = 2f32.powf(p.compensation);
            let mut out = crop.clone();
            for px in out.pixels_mut() {
                px.l *= gain;
            }
            Ok(Some(EffectOutput::Processed(out)))
        }
        Tool::Vibrance(_) => {
            let mut deltas = DeltaBuffers::zeros(crop.width(), crop.height())?;
            for (dst, px) in deltas.chroma.as_mut_slice().iter_mut().zip(crop.pixels()) {
                *dst = px.chroma() * 0.4;
            }
            Ok(Some(EffectOutput::Deltas(deltas)))
        }
        _ => Ok(None),
    }
}

fn to_gray(image: &LabImage) -> GrayImage {
    GrayImage::from_fn(image.width() as u32, image.height() as u32, |x, y| {
        let l = image.get_pixel(y as usize, x as usize).l;
        Luma([(l / L_MAX * 255.0).round().clamp(0.0, 255.0) as u8])
    })
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    let (width, height) = (640usize, 400usize);

    // horizontal lightness ramp with a warm band in the middle
    let source = LabImage::from_fn(width, height, |r, c| {
        let l = 4000.0 + 24000.0 * c as f32 / width as f32;
        let warm = if (150..250).contains(&r) { 6000.0 } else { 0.0 };
        LabPixel::new(l, warm, warm * 0.5)
    });

    let viewport = Viewport::full(width, height);
    let bright = SpotConfig::new("bright")
        .with_center(-400.0, 0.0)
        .with_extents(350.0, 250.0, 300.0, 300.0)
        .with_transit(50.0)
        .with_tool(Tool::exposure(60.0, 0.7));
    let warm = SpotConfig::new("warm")
        .with_shape(Shape::Rectangle)
        .with_center(400.0, 0.0)
        .with_extents(300.0, 300.0, 200.0, 200.0)
        .with_tool(Tool::vibrance(40.0));

    let mut edited = source.clone();
    let report = SpotPipeline::new(viewport)
        .with_spot(bright.clone())
        .with_spot(warm)
        .run(&mut edited, &toy_effect)?;
    for spot in &report.spots {
        println!("{}: {:?} over {:?}", spot.name, spot.outcome, spot.region.as_tuple());
    }
    let edited_path = std::path::Path::new(&out_dir).join("spot_edit.png");
    to_gray(&edited).save(&edited_path)?;
    println!("Wrote {}", edited_path.display());

    // same spot, showing a shadows-only user mask instead of the edit
    let mask = UserMaskConfig {
        enabled: true,
        curves: UserMaskCurves {
            luminance: Some(MaskCurve::new(vec![(0.0, 0.0), (0.35, 0.0), (0.6, 1.0), (1.0, 1.0)])?),
            ..Default::default()
        },
        blur: 8.0,
        blend: 100.0,
    };
    let mut preview = source.clone();
    SpotPipeline::new(viewport)
        .with_spot(bright.with_mask(mask).with_preview(MaskPreview::UserMask))
        .run(&mut preview, &toy_effect)?;
    let preview_path = std::path::Path::new(&out_dir).join("spot_mask.png");
    to_gray(&preview).save(&preview_path)?;
    println!("Wrote {}", preview_path.display());

    Ok(())
}
