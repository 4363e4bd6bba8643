// tests/test_blur.rs — Integration tests for the CPU reference blur.
//
// These run with `cargo test --test test_blur` and exercise only the
// public API. The GPU path has its own suite (subprocess-isolated, behind
// #[ignore]) inside src/gpu/blur.rs — everything here runs without a GPU.

use blurbox::blur::box_blur;
use blurbox::image::RgbaImage;

/// Deterministic pseudo-random image (LCG).
fn random_image(w: usize, h: usize, seed: u32) -> RgbaImage {
    let mut rng = seed;
    let data: Vec<u8> = (0..w * h * 4)
        .map(|_| {
            rng = rng.wrapping_mul(1664525).wrapping_add(1013904223);
            (rng >> 24) as u8
        })
        .collect();
    RgbaImage::from_vec(w, h, data)
}

/// Checkerboard with the given cell size: alternating 0 / 255 in every
/// channel, alpha included.
fn checkerboard(w: usize, h: usize, cell: usize) -> RgbaImage {
    let mut img = RgbaImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let v = if (x / cell + y / cell) % 2 == 0 { 255 } else { 0 };
            img.set(x, y, [v, v, v, v]);
        }
    }
    img
}

/// Variance of the red channel over an interior region, as f64.
fn interior_variance(img: &RgbaImage, margin: usize) -> f64 {
    let xs: Vec<f64> = (margin..img.height() - margin)
        .flat_map(|y| {
            (margin..img.width() - margin).map(move |x| (x, y))
        })
        .map(|(x, y)| img.get(x, y)[0] as f64)
        .collect();
    let n = xs.len() as f64;
    let mean = xs.iter().sum::<f64>() / n;
    xs.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n
}

#[test]
fn radius_zero_identity() {
    let img = random_image(33, 21, 1234);
    assert_eq!(box_blur(&img, 0), img);
}

#[test]
fn repeated_blurs_are_deterministic() {
    let img = random_image(40, 30, 5);
    let a = box_blur(&img, 3);
    let b = box_blur(&img, 3);
    assert_eq!(a, b);
}

#[test]
fn checkerboard_variance_strictly_decreases_with_radius() {
    // 64×64 board with 4-pixel cells; measure well inside the image so
    // edge-shrinking effects don't pollute the comparison.
    let img = checkerboard(64, 64, 4);
    let margin = 12;

    let mut last = interior_variance(&img, margin);
    for radius in 1..=4u32 {
        let out = box_blur(&img, radius);
        let var = interior_variance(&out, margin);
        assert!(
            var < last,
            "variance did not decrease at radius {radius}: {var} >= {last}"
        );
        last = var;
    }
}

#[test]
fn blur_preserves_dimensions() {
    let img = random_image(13, 7, 9);
    let out = box_blur(&img, 2);
    assert_eq!(out.width(), 13);
    assert_eq!(out.height(), 7);
    assert_eq!(out.sample_count(), img.sample_count());
}

#[test]
fn opaque_alpha_stays_opaque() {
    // Alpha 255 everywhere: averaging a constant channel is the identity,
    // so blurring must never make an opaque image translucent.
    let mut img = random_image(20, 20, 77);
    for y in 0..20 {
        for x in 0..20 {
            let mut p = img.get(x, y);
            p[3] = 255;
            img.set(x, y, p);
        }
    }
    let out = box_blur(&img, 4);
    for y in 0..20 {
        for x in 0..20 {
            assert_eq!(out.get(x, y)[3], 255, "alpha changed at ({x}, {y})");
        }
    }
}

#[test]
fn single_pixel_image_is_untouched() {
    let img = RgbaImage::from_vec(1, 1, vec![12, 34, 56, 78]);
    for radius in [0u32, 1, 50] {
        assert_eq!(box_blur(&img, radius), img, "radius {radius}");
    }
}
