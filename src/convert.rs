// convert.rs — Codec between the host image form and the device form.
//
// The WGSL kernel accumulates neighbor sums in i32, so pixel data crosses
// the host/device boundary as a widened `array<i32>` rather than raw u8
// bytes. This module is a lossless *shape* conversion, not color
// processing:
//
//   to_device_form    u8 → i32, verbatim widening, no scaling
//   from_device_form  i32 → u8, clamped to [0, 255]
//
// The clamp mirrors what an 8-bit display buffer does with out-of-range
// values: saturate, never wrap. Averaged output can never leave [0, 255],
// but malformed device data can, and a wrapped cast would turn that into
// garbage colors instead of a visible clip.
//
// Round-trip law: from_device_form(to_device_form(img)) == img for any
// valid image, and == clamp(x, 0, 255) element-wise in general.

use crate::image::RgbaImage;

/// Widen a host image into the i32 buffer the kernel operates on.
///
/// Element count is preserved exactly: index i of the output holds sample
/// i of the input, as the same numeric value.
pub fn to_device_form(src: &RgbaImage) -> Vec<i32> {
    src.as_slice().iter().map(|&s| s as i32).collect()
}

/// Narrow a device-form buffer back into a displayable host image.
///
/// Each sample is clamped to [0, 255] before the cast.
///
/// # Panics
/// Panics if `samples.len() != width * height * 4` (same contract as
/// [`RgbaImage::from_vec`]).
pub fn from_device_form(samples: &[i32], width: usize, height: usize) -> RgbaImage {
    let data: Vec<u8> = samples.iter().map(|&s| s.clamp(0, 255) as u8).collect();
    RgbaImage::from_vec(width, height, data)
}
