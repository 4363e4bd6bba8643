// gpu/blur.rs — GPU box blur: pipeline, dispatch, and readback.
//
// BINDING CONTRACT (fixed, group 0):
//   0 — image size,   read-only storage, two u32
//   1 — input pixels, read-only storage, array<i32>
//   2 — blur radius,  read-only storage, one i32
//   3 — output pixels, read-write storage, array<i32>
//
// The WGSL kernel and the bind group layout below must agree on this
// order bit-for-bit; a mismatch surfaces as a validation error at submit
// time (GpuError::Submission), which is a bug, not an input condition.
//
// INVOCATION LIFECYCLE: one `blur()` call widens the image, allocates a
// fresh `FrameBuffers`, records compute pass + result→staging copy into a
// single encoder, submits, awaits the staging map, and narrows the result
// back to u8. The encoder establishes the happens-before chain: buffer
// population → dispatch → copy → map visibility. All per-invocation
// resources are locals and are released on every exit path, including the
// error paths.
//
// The pipeline itself is image-independent — same layout, same module,
// same entry point every time — so it is built once in `new()` and reused
// by every invocation.

use crate::convert;
use crate::gpu::buffers::FrameBuffers;
use crate::gpu::device::{GpuDevice, GpuError};
use crate::image::RgbaImage;

/// The compiled, reusable half of the GPU blur: shader module, bind group
/// layout, and compute pipeline.
///
/// Create once per [`GpuDevice`]; call [`blur`](GpuBoxBlur::blur) per
/// frame. All fields are immutable after construction and safely shared
/// by sequential invocations.
pub struct GpuBoxBlur {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
}

impl GpuBoxBlur {
    pub fn new(gpu: &GpuDevice) -> Self {
        // Bake the workgroup dimensions into the source. The template
        // markers keep the shader itself valid-looking WGSL while letting
        // the host pick the tile size at startup.
        let shader_template = include_str!("../shaders/blur.wgsl");
        let shader_src = shader_template
            .replace("{{WG_X}}", &gpu.workgroup_size.x.to_string())
            .replace("{{WG_Y}}", &gpu.workgroup_size.y.to_string());

        let shader = gpu
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("blur.wgsl"),
                source: wgpu::ShaderSource::Wgsl(shader_src.into()),
            });

        let bgl = gpu
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("GpuBoxBlur BGL"),
                entries: &[
                    // 0 — image size (read-only storage)
                    storage_entry(0, true),
                    // 1 — input pixels (read-only storage)
                    storage_entry(1, true),
                    // 2 — blur radius (read-only storage)
                    storage_entry(2, true),
                    // 3 — output pixels (read-write storage)
                    storage_entry(3, false),
                ],
            });

        let pipeline_layout = gpu
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("GpuBoxBlur pipeline layout"),
                bind_group_layouts: &[&bgl],
                push_constant_ranges: &[],
            });

        let pipeline = gpu
            .device
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: Some("box_blur"),
                layout: Some(&pipeline_layout),
                module: &shader,
                entry_point: "main",
                compilation_options: wgpu::PipelineCompilationOptions::default(),
                cache: None,
            });

        GpuBoxBlur { pipeline, bgl }
    }

    /// Blur `src` with a square window of half-width `radius`.
    ///
    /// Output is bit-identical to [`crate::blur::box_blur`] on the same
    /// input. Blocks the calling thread until the result has been read
    /// back from the device.
    ///
    /// # Errors
    /// [`GpuError::BufferAllocation`] if the image exceeds a device
    /// limit, [`GpuError::Submission`] on a binding/layout contract
    /// violation, [`GpuError::Readback`] if the staging map fails or the
    /// device is lost mid-operation.
    pub fn blur(
        &self,
        gpu: &GpuDevice,
        src: &RgbaImage,
        radius: u32,
    ) -> Result<RgbaImage, GpuError> {
        let width = src.width() as u32;
        let height = src.height() as u32;

        let device_pixels = convert::to_device_form(src);
        let bufs = FrameBuffers::allocate(gpu, width, height, radius as i32, &device_pixels)?;

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GpuBoxBlur BG"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: bufs.size.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: bufs.pixels.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: bufs.radius.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: bufs.result.as_entire_binding(),
                },
            ],
        });

        // Catch validation failures (binding/layout mismatches) as a typed
        // error instead of an uncaptured-error panic. Anything caught here
        // is a programming defect in this module.
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let (wg_x, wg_y) = gpu.dispatch_size(width, height);
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("GpuBoxBlur dispatch"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("box_blur"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }
        encoder.copy_buffer_to_buffer(&bufs.result, 0, &bufs.staging, 0, bufs.pixel_bytes);
        gpu.queue.submit(std::iter::once(encoder.finish()));

        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(GpuError::Submission(err));
        }

        // Await host visibility of the staging buffer. map_async is the
        // one genuinely asynchronous step; poll(Wait) drives the device
        // until the callback fires. The result buffer itself is never read
        // directly — only through this mapping, only after it resolves.
        let slice = bufs.staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx.send(r);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(GpuError::Readback(e)),
            // Channel dropped without a callback: device went away.
            Err(_) => return Err(GpuError::Readback(wgpu::BufferAsyncError)),
        }

        let mapped = slice.get_mapped_range();
        let samples: &[i32] = bytemuck::cast_slice(&mapped);
        let out = convert::from_device_form(samples, src.width(), src.height());
        drop(mapped);
        bufs.staging.unmap();

        Ok(out)
    }
}

/// A compute-stage storage buffer layout entry.
fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

// ---------------------------------------------------------------------------
// Tests — every GPU result is diffed against the CPU reference
// ---------------------------------------------------------------------------
