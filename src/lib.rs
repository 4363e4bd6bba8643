// blurbox: GPU-accelerated box blur over interleaved RGBA images.
//
// The CPU implementation in `blur` is the authoritative reference — the
// wgpu compute path in `gpu` is validated against it pixel-for-pixel.

pub mod image;
pub mod convert;
pub mod blur;
pub mod gpu;
