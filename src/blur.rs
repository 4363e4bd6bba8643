// blur.rs — CPU reference box blur.
//
// This is the authoritative definition of the filter. The WGSL kernel in
// gpu/blur must produce bit-identical output, and the GPU integration
// tests diff the two pixel-for-pixel.
//
// ALGORITHM: shrinking ("clamped") box filter. Each output pixel is the
// per-channel average of every in-bounds neighbor within the square
// window [-radius, +radius]². The divisor is the count of neighbors that
// actually landed in bounds, not the full window area — edge pixels
// average over a smaller window instead of being diluted by zero padding.
//
// BOUNDARY CONVENTION: a neighbor (nx, ny) is included iff
//   0 <= nx < width  &&  0 <= ny < height
// i.e. the conventional exclusive upper bound on both axes. An inclusive
// bound (`<=`) would admit a one-past-the-end neighbor on the right and
// bottom edges.
//
// NUMERIC SEMANTICS: accumulation in i32 — a full window holds at most
// (2r+1)² * 255, which for any radius a sane caller passes (r < 2047 on a
// real image) fits comfortably. Division is truncating integer division,
// matching WGSL's `/` on i32.

use crate::image::{RgbaImage, CHANNELS};

/// Blur `src` with a square window of half-width `radius`.
///
/// Radius 0 is the identity transform.
pub fn box_blur(src: &RgbaImage, radius: u32) -> RgbaImage {
    let width = src.width() as i64;
    let height = src.height() as i64;
    let r = radius as i64;

    let mut dst = RgbaImage::new(src.width(), src.height());

    for y in 0..height {
        for x in 0..width {
            let mut sum = [0i32; CHANNELS];
            let mut count = 0i32;

            for dy in -r..=r {
                for dx in -r..=r {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || nx >= width || ny < 0 || ny >= height {
                        continue;
                    }
                    let px = src.get(nx as usize, ny as usize);
                    for c in 0..CHANNELS {
                        sum[c] += px[c] as i32;
                    }
                    count += 1;
                }
            }

            // count >= 1 always: the window contains (x, y) itself.
            let mut out = [0u8; CHANNELS];
            for c in 0..CHANNELS {
                out[c] = (sum[c] / count) as u8;
            }
            dst.set(x as usize, y as usize, out);
        }
    }

    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radius_zero_is_identity() {
        let data: Vec<u8> = (0..4 * 4 * 4).map(|i| (i * 7 % 256) as u8).collect();
        let img = RgbaImage::from_vec(4, 4, data);
        assert_eq!(box_blur(&img, 0), img);
    }

    #[test]
    fn test_flat_image_is_fixed_point() {
        let img = RgbaImage::from_vec(5, 5, vec![90u8; 5 * 5 * 4]);
        for radius in [1, 2, 10] {
            assert_eq!(box_blur(&img, radius), img, "radius {radius}");
        }
    }

    #[test]
    fn test_3x3_center_is_mean_of_nine() {
        // Red channel carries 10..=90; other channels constant.
        let mut img = RgbaImage::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                img.set(x, y, [(10 * (y * 3 + x + 1)) as u8, 50, 0, 255]);
            }
        }
        let out = box_blur(&img, 1);
        // (10+20+...+90) / 9 = 450 / 9 = 50.
        assert_eq!(out.get(1, 1), [50, 50, 0, 255]);
    }

    #[test]
    fn test_3x3_corner_averages_four_neighbors() {
        let mut img = RgbaImage::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                img.set(x, y, [(10 * (y * 3 + x + 1)) as u8, 0, 0, 255]);
            }
        }
        let out = box_blur(&img, 1);
        // Corner (0,0) sees (0,0)=10, (1,0)=20, (0,1)=40, (1,1)=50.
        // (10+20+40+50) / 4 = 30.
        assert_eq!(out.get(0, 0)[0], 30);
        // Corner (2,2) sees 50, 60, 80, 90 → 280 / 4 = 70.
        assert_eq!(out.get(2, 2)[0], 70);
    }

    #[test]
    fn test_3x3_edge_averages_six_neighbors() {
        let mut img = RgbaImage::new(3, 3);
        for y in 0..3 {
            for x in 0..3 {
                img.set(x, y, [(10 * (y * 3 + x + 1)) as u8, 0, 0, 255]);
            }
        }
        let out = box_blur(&img, 1);
        // Edge (1,0) sees 10,20,30,40,50,60 → 210 / 6 = 35.
        assert_eq!(out.get(1, 0)[0], 35);
    }

    #[test]
    fn test_2x2_radius_one_scenario() {
        let img = RgbaImage::from_vec(
            2,
            2,
            vec![
                255, 0, 0, 255, //
                0, 255, 0, 255, //
                0, 0, 255, 255, //
                255, 255, 255, 255,
            ],
        );
        let out = box_blur(&img, 1);
        // Every window covers the whole image: per channel
        // r = 510/4 = 127, g = 510/4 = 127, b = 765/4 = 191 (truncated),
        // a = 1020/4 = 255.
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(out.get(x, y), [127, 127, 191, 255], "pixel ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_truncating_division() {
        // 1×2 image, radius 1: each pixel averages both. Sum 1 → 1/2 = 0.
        let img = RgbaImage::from_vec(2, 1, vec![1, 0, 0, 0, 0, 0, 0, 0]);
        let out = box_blur(&img, 1);
        assert_eq!(out.get(0, 0)[0], 0);
        assert_eq!(out.get(1, 0)[0], 0);
    }

    #[test]
    fn test_oversized_radius_converges_to_global_mean() {
        // Radius larger than the image: every pixel averages all pixels.
        let img = RgbaImage::from_vec(
            2,
            2,
            vec![
                0, 0, 0, 255, //
                100, 0, 0, 255, //
                200, 0, 0, 255, //
                100, 0, 0, 255,
            ],
        );
        let out = box_blur(&img, 100);
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(out.get(x, y)[0], 100);
            }
        }
    }
}
