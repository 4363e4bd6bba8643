// gpu/device.rs — wgpu device abstraction.
//
// Responsibilities:
//   - Enumerate adapters and select the first non-CPU one.
//   - Hold the process-wide reusable GPU state: device, queue, and the
//     workgroup configuration used when creating compute pipelines.
//   - Define `GpuError`, the error type for the whole GPU layer.
//
// ADAPTER SELECTION:
// wgpu's default `request_adapter` uses power preference heuristics that
// may grab llvmpipe/softpipe where a software renderer appears as a valid
// adapter. We enumerate explicitly and prefer real hardware, falling back
// to whatever exists only as a last resort (the adapter name is logged so
// you know what you got).
//
// LIFECYCLE:
// Create one `GpuDevice` at startup and pass it by reference into every
// blur invocation. It is expensive to create (instance + device
// initialization) and designed to live for the application session.
// Nothing per-invocation is stored here.

use std::fmt;

/// A workgroup size configuration for 2D compute dispatches.
///
/// The dispatch grid covers the image in tiles of `x`×`y` pixels; the
/// shader guards against out-of-bounds invocations in the final partial
/// tiles. Results are identical for any valid configuration — this is a
/// throughput knob, not a semantic one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Total invocations per workgroup (x * y).
    pub fn total(&self) -> u32 {
        self.x * self.y
    }
}

impl Default for WorkgroupSize {
    /// 16×8 = 128 invocations: aligns with NVIDIA's 32-wide warps
    /// (4 warps) and AMD's 64-wide wavefronts (2 waves), and the 16-wide
    /// x dimension matches row-major image locality.
    fn default() -> Self {
        WorkgroupSize { x: 16, y: 8 }
    }
}

impl fmt::Display for WorkgroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{} ({} invocations)", self.x, self.y, self.total())
    }
}

/// Cached adapter information for logging and debugging.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub vendor: u32,
    pub device: u32,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({:?}, {:?})",
            self.name, self.backend, self.device_type
        )
    }
}

/// The core GPU context: device, queue, and workgroup configuration.
///
/// Create via [`GpuDevice::new`]. Hold one for the lifetime of the
/// application; per-invocation resources (buffers, bind groups) are
/// created and dropped by each blur call and never stored here.
///
/// # Field drop order
/// Rust drops struct fields in declaration order (top → bottom).
/// `_instance` is declared last so the `wgpu::Instance` outlives `device`
/// and `queue` — some drivers crash if the instance is destroyed while
/// device-level objects still reference it.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    pub workgroup_size: WorkgroupSize,
    /// Keeps the `wgpu::Instance` alive until `device` and `queue` are
    /// dropped. Never accessed directly.
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Create a `GpuDevice` on the best available adapter.
    ///
    /// # Errors
    /// [`GpuError::NoAdapter`] if no adapter is found at all;
    /// [`GpuError::DeviceRequest`] if the device request fails.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Result<Self, GpuError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        // Enumerate every adapter, logging what exists:
        //   DiscreteGpu   — dedicated NVIDIA/AMD card       <- ideal
        //   IntegratedGpu — iGPU (AMD APU, Intel, Apple)    <- good
        //   VirtualGpu    — VM pass-through                 <- acceptable
        //   Other         — translation layers              <- acceptable
        //   Cpu           — llvmpipe / software rasterizer  <- last resort
        let all_adapters: Vec<wgpu::Adapter> = instance
            .enumerate_adapters(wgpu::Backends::PRIMARY)
            .into_iter()
            .collect();

        if all_adapters.is_empty() {
            return Err(GpuError::NoAdapter);
        }

        for a in &all_adapters {
            let info = a.get_info();
            eprintln!(
                "[blurbox] adapter: {} ({:?}, {:?})",
                info.name, info.backend, info.device_type
            );
        }

        // Tier 1: anything that is not a software rasterizer.
        let adapter = all_adapters
            .into_iter()
            .find(|a| a.get_info().device_type != wgpu::DeviceType::Cpu)
            // Tier 2 (last resort): take whatever exists, even software.
            .or_else(|| {
                instance
                    .enumerate_adapters(wgpu::Backends::PRIMARY)
                    .into_iter()
                    .next()
            })
            .ok_or(GpuError::NoAdapter)?;

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            vendor: raw_info.vendor,
            device: raw_info.device,
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };
        eprintln!("[blurbox] selected: {adapter_info}");

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("blurbox"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(GpuError::DeviceRequest)?;

        Ok(GpuDevice {
            device,
            queue,
            adapter_info,
            workgroup_size: WorkgroupSize::default(),
            _instance: instance,
        })
    }

    /// Override the default workgroup size.
    ///
    /// Returns `Err` if the total invocation count (x * y) exceeds the
    /// device's `max_compute_invocations_per_workgroup`, or if either
    /// dimension is zero.
    pub fn set_workgroup_size(&mut self, x: u32, y: u32) -> Result<(), GpuError> {
        let total = x * y;
        let max = self.device.limits().max_compute_invocations_per_workgroup;
        if total == 0 || total > max {
            return Err(GpuError::WorkgroupTooLarge { total, max });
        }
        self.workgroup_size = WorkgroupSize { x, y };
        Ok(())
    }

    /// Compute the dispatch dimensions needed to cover an image of the
    /// given size with the active workgroup size.
    ///
    /// Uses ceiling division so every pixel is covered even when the image
    /// dimensions are not multiples of the workgroup size; the shader must
    /// guard against out-of-bounds global IDs:
    /// ```wgsl
    /// if gid.x >= width || gid.y >= height { return; }
    /// ```
    pub fn dispatch_size(&self, img_w: u32, img_h: u32) -> (u32, u32) {
        let dx = img_w.div_ceil(self.workgroup_size.x);
        let dy = img_h.div_ceil(self.workgroup_size.y);
        (dx, dy)
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuDevice {{ adapter: {}, workgroup: {} }}",
            self.adapter_info, self.workgroup_size
        )
    }
}

// ============================================================
// Error type
// ============================================================

/// Errors from the GPU blur layer.
///
/// Every variant except `NoAdapter` and `DeviceRequest` leaves the
/// `GpuDevice` valid for further invocations. A lost device surfaces as
/// `Submission` or `Readback`; recovery is a fresh `GpuDevice::new()`.
#[derive(Debug)]
pub enum GpuError {
    /// No adapter found at all. Check that a GPU driver (or at least a
    /// software Vulkan/Metal/DX implementation) is installed.
    NoAdapter,
    /// wgpu device request failed (driver issue, unsupported limits, ...).
    DeviceRequest(wgpu::RequestDeviceError),
    /// Requested workgroup size exceeds the device's invocation limit.
    WorkgroupTooLarge { total: u32, max: u32 },
    /// A buffer allocation would exceed a device limit. `bytes` is the
    /// requested size, `limit` the binding/size limit it tripped.
    BufferAllocation { bytes: u64, limit: u64 },
    /// The submitted command sequence failed validation. This is a
    /// binding/layout contract violation — a programming defect, not an
    /// input error — and is never expected at runtime.
    Submission(wgpu::Error),
    /// Mapping the staging buffer for readback failed, or the device was
    /// lost mid-operation. The in-flight request is failed, not retried.
    Readback(wgpu::BufferAsyncError),
    /// A pixel buffer's length disagrees with the stated dimensions.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoAdapter => write!(
                f,
                "no GPU adapter found (not even a software rasterizer)"
            ),
            GpuError::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            GpuError::WorkgroupTooLarge { total, max } => write!(
                f,
                "workgroup size {total} exceeds device limit of {max} invocations"
            ),
            GpuError::BufferAllocation { bytes, limit } => write!(
                f,
                "buffer of {bytes} bytes exceeds device limit of {limit} bytes"
            ),
            GpuError::Submission(e) => write!(f, "command submission failed validation: {e}"),
            GpuError::Readback(e) => write!(f, "staging buffer readback failed: {e}"),
            GpuError::SizeMismatch { expected, actual } => write!(
                f,
                "pixel buffer length {actual} does not match dimensions (expected {expected})"
            ),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceRequest(e) => Some(e),
            GpuError::Submission(e) => Some(e),
            GpuError::Readback(e) => Some(e),
            _ => None,
        }
    }
}

// ============================================================
// Tests
// ============================================================
