// gpu/mod.rs — wgpu compute layer.
//
// The CPU implementation in `crate::blur` is the authoritative reference;
// the kernel here is validated against it pixel-for-pixel.
//
// Split of responsibilities:
//
//   device  — adapter selection, device/queue, workgroup configuration
//   buffers — the five per-invocation buffers (size, pixels, radius,
//             result, staging) and their limits checks
//   blur    — compiled pipeline, per-frame dispatch, staged readback
//
// A `GpuDevice` plus a `GpuBoxBlur` are created once at startup; every
// blur call after that only allocates its own buffer set.

pub mod device;
pub mod buffers;
pub mod blur;
