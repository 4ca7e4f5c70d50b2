// gpu/pipeline.rs — kernel build, device buffers, and the one-shot
// write → dispatch → blocking-readback sequence.
//
// KERNEL SOURCE:
// Loaded from a fixed filesystem path at runtime, like the sample this
// demo reproduces — not `include_str!`. A missing or unreadable file
// fails the run before any device interaction. The configured local size
// is substituted into the `{{WG_X}}` placeholder before the module is
// created; that substitution is the only build option and it is always
// passed explicitly.
//
// ERROR SCOPES:
// wgpu reports shader and allocation failures through uncaptured-error
// callbacks by default, which abort the process. Every fallible device
// call here runs inside an error scope instead, so failures come back as
// `GpuError` values. The four data buffers are created inside one
// combined scope checked once — several calls forming one logical step.
//
// BUFFER LAYOUT (positional, must match vecadd.wgsl):
//   binding 0 — source A          storage, read-only
//   binding 1 — source B          storage, read-only
//   binding 2 — destination       storage, read-write
//   binding 3 — element count     uniform
//   binding 4 — lane-index output storage, read-write

use std::fs;
use std::mem;
use std::path::Path;

use wgpu::util::DeviceExt;

use crate::gpu::device::{GpuDevice, GpuError};
use crate::host::HostBuffers;
use crate::work::WorkSize;

/// Fixed path of the kernel source text, absolute at compile time.
pub const KERNEL_SOURCE_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/src/shaders/vecadd.wgsl");

/// Entry point the kernel source must define.
pub const KERNEL_ENTRY_POINT: &str = "vector_add";

/// Read the kernel source from `path`.
///
/// The source length is logged the way the original sample logs it after
/// the file read; the full text only at debug level.
pub fn load_kernel_source(path: &Path) -> Result<String, GpuError> {
    let source = fs::read_to_string(path).map_err(|e| GpuError::SourceRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    println!("kernel source length = {} bytes", source.len());
    log::debug!("kernel source:\n{source}");
    Ok(source)
}

// Uniform params; must match WGSL struct VecAddParams. Padded to 16 bytes
// for uniform-block alignment.
#[repr(C)]
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct VecAddParams {
    count: u32,
    _pad: [u32; 3],
}

/// The built kernel plus its device buffers, sized for one [`WorkSize`].
///
/// Every field is a scoped-ownership wgpu handle: dropping the pipeline
/// releases the program, the bind group layout, and all five device
/// buffers exactly once, on every exit path.
#[derive(Debug)]
pub struct VecAddPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
    buf_a: wgpu::Buffer,
    buf_b: wgpu::Buffer,
    buf_dst: wgpu::Buffer,
    buf_lanes: wgpu::Buffer,
    buf_params: wgpu::Buffer,
    work: WorkSize,
}

impl VecAddPipeline {
    /// Build the shader module, pipeline, and device buffers.
    ///
    /// # Errors
    /// `ShaderBuild` if the source fails validation or lacks the entry
    /// point; `BufferAlloc` if any of the data buffers is refused.
    pub fn new(gpu: &GpuDevice, work: &WorkSize, source: &str) -> Result<Self, GpuError> {
        let shader_src = source.replace("{{WG_X}}", &work.local().to_string());

        // Shader + pipeline creation under one validation scope: an
        // invalid kernel must surface as an error, not a process abort.
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("vecadd.wgsl"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("VecAdd BGL"),
            entries: &[
                // 0 — source A
                storage_entry(0, true),
                // 1 — source B
                storage_entry(1, true),
                // 2 — destination
                storage_entry(2, false),
                // 3 — element count
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 4 — lane-index output
                storage_entry(4, false),
            ],
        });

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("VecAdd pipeline layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(KERNEL_ENTRY_POINT),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: KERNEL_ENTRY_POINT,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        if let Some(e) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(GpuError::ShaderBuild(e.to_string()));
        }

        // Four data buffers under one combined scope, checked once.
        let float_size = (work.global() as u64) * mem::size_of::<f32>() as u64;
        let lane_size = (work.global() as u64) * mem::size_of::<i32>() as u64;

        gpu.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let buf_a = data_buffer(gpu, "VecAdd srcA", float_size, false);
        let buf_b = data_buffer(gpu, "VecAdd srcB", float_size, false);
        let buf_dst = data_buffer(gpu, "VecAdd dst", float_size, true);
        let buf_lanes = data_buffer(gpu, "VecAdd lanes", lane_size, true);

        let params = VecAddParams { count: work.n(), _pad: [0; 3] };
        let buf_params = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("VecAdd params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let validation = pollster::block_on(gpu.device.pop_error_scope());
        let oom = pollster::block_on(gpu.device.pop_error_scope());
        if let Some(e) = oom.or(validation) {
            return Err(GpuError::BufferAlloc(e.to_string()));
        }

        Ok(VecAddPipeline {
            pipeline,
            bgl,
            buf_a,
            buf_b,
            buf_dst,
            buf_lanes,
            buf_params,
            work: *work,
        })
    }

    /// Run the core sequence once: enqueue the input writes, dispatch the
    /// kernel over `global` lanes, then block on the readback of the
    /// destination and lane buffers into `host.dst` and `host.lane_ids`.
    ///
    /// # Errors
    /// `Readback` if mapping the staging buffers fails. Writes and the
    /// dispatch itself have no per-call status in wgpu; a lost device
    /// also surfaces through the failed mapping.
    pub fn dispatch(&self, gpu: &GpuDevice, host: &mut HostBuffers) -> Result<(), GpuError> {
        debug_assert_eq!(host.len(), self.work.global() as usize);

        // Asynchronous writes of both sources; ordered before the dispatch
        // by queue submission order.
        gpu.queue.write_buffer(&self.buf_a, 0, bytemuck::cast_slice(&host.src_a));
        gpu.queue.write_buffer(&self.buf_b, 0, bytemuck::cast_slice(&host.src_b));

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("VecAdd BG"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: self.buf_a.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: self.buf_b.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: self.buf_dst.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: self.buf_params.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 4, resource: self.buf_lanes.as_entire_binding() },
            ],
        });

        let float_size = self.buf_dst.size();
        let lane_size = self.buf_lanes.size();
        let rb_dst = staging_buffer(gpu, "VecAdd dst readback", float_size);
        let rb_lanes = staging_buffer(gpu, "VecAdd lanes readback", lane_size);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("VecAdd dispatch") });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(KERNEL_ENTRY_POINT),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(self.work.workgroups(), 1, 1);
        }
        encoder.copy_buffer_to_buffer(&self.buf_dst, 0, &rb_dst, 0, float_size);
        encoder.copy_buffer_to_buffer(&self.buf_lanes, 0, &rb_lanes, 0, lane_size);
        gpu.queue.submit(std::iter::once(encoder.finish()));

        // Blocking read: map both staging buffers, wait for the device to
        // drain the queue, then copy into the host arrays.
        let dst_slice = rb_dst.slice(..);
        let lane_slice = rb_lanes.slice(..);
        let (tx_dst, rx_dst) = std::sync::mpsc::channel();
        let (tx_lanes, rx_lanes) = std::sync::mpsc::channel();
        dst_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx_dst.send(r);
        });
        lane_slice.map_async(wgpu::MapMode::Read, move |r| {
            let _ = tx_lanes.send(r);
        });
        gpu.device.poll(wgpu::Maintain::Wait);

        recv_map_result(rx_dst, "destination")?;
        recv_map_result(rx_lanes, "lane indices")?;

        host.dst.copy_from_slice(bytemuck::cast_slice(&dst_slice.get_mapped_range()));
        host.lane_ids.copy_from_slice(bytemuck::cast_slice(&lane_slice.get_mapped_range()));
        rb_dst.unmap();
        rb_lanes.unmap();
        Ok(())
    }

    pub fn work(&self) -> &WorkSize {
        &self.work
    }
}

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

fn data_buffer(gpu: &GpuDevice, label: &str, size: u64, readback: bool) -> wgpu::Buffer {
    let usage = if readback {
        wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC
    } else {
        wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST
    };
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage,
        mapped_at_creation: false,
    })
}

fn staging_buffer(gpu: &GpuDevice, label: &str, size: u64) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn recv_map_result(
    rx: std::sync::mpsc::Receiver<Result<(), wgpu::BufferAsyncError>>,
    what: &str,
) -> Result<(), GpuError> {
    match rx.recv() {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(GpuError::Readback(format!("{what}: {e}"))),
        Err(_) => Err(GpuError::Readback(format!("{what}: map callback never ran"))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
