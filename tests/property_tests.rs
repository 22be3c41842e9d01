use spotblend::composite::{CompositeInputs, DeltaBuffers, LabDifference, composite_spot};
use spotblend::gate::{LIMIT_SCOPE, PerceptualGate, thresholds};
use spotblend::image::color::{CHROMA_MAX, L_MAX};
use spotblend::mask::{MaskCurve, UserMaskCurves, build_user_mask};
use spotblend::spot::UserMaskSettings;
use spotblend::{Array2D, LabImage, LabPixel, SpotGeometry, SpotParams, Tool, Zone, ZoneClassifier, sample_reference};

/// Small deterministic generator so failures are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next_unit(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        ((self.0 >> 40) as f32) / (1u64 << 24) as f32
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.next_unit()
    }
}

fn noisy_image(w: usize, h: usize, seed: u64) -> LabImage {
    let mut rng = Lcg(seed);
    LabImage::from_fn(w, h, |_, _| {
        LabPixel::new(
            rng.range(0.0, L_MAX),
            rng.range(-20000.0, 20000.0),
            rng.range(-20000.0, 20000.0),
        )
    })
}

fn rank(zone: Zone) -> u8 {
    zone as u8
}

#[test]
fn test_zone_is_monotone_along_rays() {
    let shapes = [
        SpotGeometry::ellipse(0.0, 0.0, 80.0, 40.0, 0.6),
        SpotGeometry::rectangle(0.0, 0.0, (100.0, 50.0, 80.0, 30.0), 0.35),
        SpotGeometry {
            weakness: 2.5,
            ..SpotGeometry::ellipse(0.0, 0.0, 30.0, 70.0, 0.2)
        },
    ];
    for geometry in shapes {
        let classifier = ZoneClassifier::new(geometry);
        for k in 0..36 {
            let (sin, cos) = (k as f32 * 10.0).to_radians().sin_cos();
            let mut last_rank = rank(Zone::Inside);
            let mut last_weight = 1.0f32;
            for step in 0..400 {
                let r = step as f32 * 0.5;
                let sample = classifier.classify(r * cos, r * sin);
                assert!(rank(sample.zone) <= last_rank, "{geometry:?} ray {k} step {step}");
                assert!(sample.weight <= last_weight + 1e-5, "{geometry:?} ray {k} step {step}");
                last_rank = rank(sample.zone);
                last_weight = sample.weight;
            }
            assert_eq!(last_rank, rank(Zone::Outside));
        }
    }
}

#[test]
fn test_gate_is_monotone_with_fixed_endpoints() {
    for &sensitivity in &[0.0, 10.0, 19.0, 50.0, LIMIT_SCOPE, 85.0, 95.0] {
        let gate = PerceptualGate::new(sensitivity, 1.8, 1.4);
        assert_eq!(gate.attenuation(0.0), 1.0);
        if sensitivity <= LIMIT_SCOPE {
            let (_, max_de) = thresholds(sensitivity, 1.8);
            assert_eq!(gate.attenuation(max_de), 0.0);
        }
        let mut last = 1.0f32;
        for i in 0..2000 {
            let g = gate.attenuation(i as f32 * 0.1);
            assert!((0.0..=1.0).contains(&g));
            assert!(g <= last + 1e-6, "sensitivity {sensitivity} at {}", i as f32 * 0.1);
            last = g;
        }
    }
}

#[test]
fn test_gate_ignores_position() {
    let original = LabImage::from_fn(60, 60, |_, c| {
        if c % 7 == 0 { LabPixel::new(9000.0, 4000.0, -2000.0) } else { LabPixel::new(15000.0, 0.0, 0.0) }
    });
    let processed = LabImage::from_fn(60, 60, |r, c| {
        let p = original.get_pixel(r, c);
        LabPixel::new(p.l + 3000.0, p.a, p.b)
    });
    let spot = SpotParams::from_geometry(SpotGeometry::ellipse(30.0, 30.0, 28.0, 28.0, 0.9));
    let reference = sample_reference(&original, &spot, false).unwrap();
    let mut output = original.clone();
    let inputs = CompositeInputs::new(original.bounds(), &original);
    composite_spot(&spot, &Tool::exposure(30.0, 0.0), &reference, &inputs, &LabDifference::new(&processed), &mut output)
        .unwrap();
    // two inside pixels with the same colour at different places
    assert_eq!(output.get_pixel(30, 28), output.get_pixel(22, 35));
    assert_eq!(output.get_pixel(30, 29), output.get_pixel(40, 31));
}

#[test]
fn test_outside_pixels_are_exact_copies() {
    let original = noisy_image(90, 70, 7);
    let processed = noisy_image(90, 70, 99);
    for geometry in [
        SpotGeometry::ellipse(45.0, 35.0, 30.0, 20.0, 0.5),
        SpotGeometry::rectangle(20.0, 50.0, (10.0, 40.0, 25.0, 5.0), 0.7),
    ] {
        let spot = SpotParams::from_geometry(geometry);
        let classifier = ZoneClassifier::new(geometry);
        let reference = sample_reference(&original, &spot, false).unwrap();
        let mut output = noisy_image(90, 70, 3);
        let inputs = CompositeInputs::new(original.bounds(), &original);
        composite_spot(&spot, &Tool::color_light(100.0), &reference, &inputs, &LabDifference::new(&processed), &mut output)
            .unwrap();
        for row in 0..70 {
            for col in 0..90 {
                if classifier.classify(col as f32, row as f32).zone == Zone::Outside {
                    assert_eq!(output.get_pixel(row, col), original.get_pixel(row, col));
                }
            }
        }
    }
}

#[test]
fn test_neutral_mask_curves_do_not_dampen() {
    let region = noisy_image(32, 24, 11);
    let settings = UserMaskSettings {
        curves: UserMaskCurves {
            luminance: Some(MaskCurve::neutral()),
            chroma: Some(MaskCurve::neutral()),
            hue: Some(MaskCurve::neutral()),
        },
        radius: 4,
        chroma_radius: 2,
        blend: 1.0,
    };
    let mask = build_user_mask(&region, &settings).unwrap();
    for (l, c) in mask.luma.as_slice().iter().zip(mask.chroma.as_slice()) {
        assert!((l - 1.0).abs() < 1e-3);
        assert!((c - 1.0).abs() < 1e-3);
    }
}

#[test]
fn test_output_is_always_clamped() {
    let original = noisy_image(50, 50, 5);
    let spot = SpotParams::from_geometry(SpotGeometry::ellipse(25.0, 25.0, 24.0, 24.0, 0.3));
    let reference = sample_reference(&original, &spot, false).unwrap();
    for (luma, chroma) in [(1.0e9f32, 1.0e9f32), (-1.0e9, -1.0e9), (1.0e9, -5.0e8)] {
        let mut deltas = DeltaBuffers::zeros(50, 50).unwrap();
        deltas.lightness = Array2D::filled(50, 50, luma);
        deltas.chroma = Array2D::filled(50, 50, chroma);
        deltas.a = Array2D::filled(50, 50, chroma * 0.5);
        let mut output = original.clone();
        let inputs = CompositeInputs::new(original.bounds(), &original);
        composite_spot(&spot, &Tool::color_light(100.0), &reference, &inputs, &deltas, &mut output).unwrap();
        for p in output.pixels() {
            assert!(p.l >= 0.0 && p.l <= L_MAX);
            assert!(p.chroma() <= CHROMA_MAX * 1.0001);
        }
    }

    // non-finite planes, for a full tool and a luma-only one
    for tool in [Tool::color_light(100.0), Tool::tone_map(100.0)] {
        let mut deltas = DeltaBuffers::zeros(50, 50).unwrap();
        deltas.lightness = Array2D::filled(50, 50, f32::NEG_INFINITY);
        deltas.chroma = Array2D::filled(50, 50, f32::NAN);
        deltas.a = Array2D::filled(50, 50, f32::INFINITY);
        deltas.hue = Some(Array2D::filled(50, 50, f32::INFINITY));
        let mut output = original.clone();
        let inputs = CompositeInputs::new(original.bounds(), &original);
        composite_spot(&spot, &tool, &reference, &inputs, &deltas, &mut output).unwrap();
        for p in output.pixels() {
            assert!(p.l.is_finite() && p.a.is_finite() && p.b.is_finite());
            assert!(p.l >= 0.0 && p.l <= L_MAX);
            assert!(p.chroma() <= CHROMA_MAX * 1.0001);
        }
    }
}
