// gpu/device.rs — wgpu adapter/device discovery for the offload driver.
//
// Responsibilities:
//   - Create the wgpu instance (the one compute platform).
//   - Enumerate adapters and select a GPU-class one, rejecting software
//     rasterizers.
//   - Request a device + in-order queue and hold them for the run.
//   - Validate a 1-D work configuration against the device's compute limits
//     before any pipeline is built.
//
// ADAPTER SELECTION:
// wgpu's default `request_adapter` uses power-preference heuristics that
// may grab llvmpipe/softpipe where the software renderer appears as a
// valid adapter. We enumerate explicitly and reject DeviceType::Cpu —
// "GPU-class device" is part of the contract, and a silent CPU fallback
// would make the offload demo meaningless.
//
// ERROR TYPE:
// `GpuError` is the single error enum for the whole GPU layer (discovery,
// shader build, buffer allocation, readback). The pipeline module reuses
// it rather than defining a parallel enum — the taxonomy is "a runtime
// call failed", one level deep, matching the flat fail-fast model of the
// driver.

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::work::WorkSize;

/// Cached adapter information for logging and diagnostics.
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

/// The GPU session: adapter info, device, and queue.
///
/// Create once per run via [`GpuDevice::new`]. All handles are
/// scoped-ownership wgpu objects — dropping the `GpuDevice` releases
/// everything exactly once, on every exit path, including early returns
/// from a failed pipeline build.
///
/// # Field drop order
/// Rust drops struct fields in declaration order (top → bottom).
/// `_instance` is declared last so the `wgpu::Instance` outlives `device`
/// and `queue`; some drivers crash if the instance is destroyed while
/// device-level objects still reference it.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    /// Keeps the `wgpu::Instance` alive until `device` and `queue` are
    /// dropped. Never accessed directly.
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Discover one GPU-class adapter and request a device + queue from it.
    ///
    /// # Errors
    /// `NoGpuAdapter` if nothing but CPU/software adapters is visible,
    /// `DeviceRequest` if the driver refuses the device request. Neither
    /// is retried — discovery failure is fatal to the run.
    pub fn new() -> Result<Self, GpuError> {
        pollster::block_on(Self::init_async())
    }

    async fn init_async() -> Result<Self, GpuError> {
        // Validation layer in debug builds for shader error feedback.
        let flags = if cfg!(debug_assertions) {
            wgpu::InstanceFlags::VALIDATION
        } else {
            wgpu::InstanceFlags::empty()
        };

        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags,
            ..Default::default()
        });

        // Enumerate every adapter and log it, then select:
        //   DiscreteGpu   — dedicated card          <- ideal
        //   IntegratedGpu — iGPU                    <- good
        //   VirtualGpu    — VM pass-through         <- acceptable
        //   Other         — translation layers      <- acceptable
        //   Cpu           — llvmpipe / software     <- reject
        let adapters: Vec<wgpu::Adapter> = instance
            .enumerate_adapters(wgpu::Backends::PRIMARY)
            .into_iter()
            .collect();

        for a in &adapters {
            let info = a.get_info();
            eprintln!(
                "[vecadd] adapter: {} ({:?}, {:?})",
                info.name, info.backend, info.device_type
            );
        }

        let adapter = adapters
            .into_iter()
            .find(|a| a.get_info().device_type != wgpu::DeviceType::Cpu)
            .ok_or(GpuError::NoGpuAdapter)?;

        let raw_info = adapter.get_info();
        let adapter_info = AdapterInfo {
            name: raw_info.name.clone(),
            vendor: raw_info.vendor,
            device: raw_info.device,
            device_type: raw_info.device_type,
            backend: raw_info.backend,
        };

        // wgpu 22: request_device returns (Device, Queue) directly.
        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("vecadd"),
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
            _instance: instance,
        })
    }

    /// Validate a work configuration against the device's compute limits.
    ///
    /// wgpu would reject an oversized dispatch at encode time anyway, but
    /// with a generic validation message; checking here names the limit
    /// that was violated while the run is still in its setup phase.
    pub fn validate_work(&self, work: &WorkSize) -> Result<(), GpuError> {
        let limits = self.device.limits();

        let max_local = limits
            .max_compute_workgroup_size_x
            .min(limits.max_compute_invocations_per_workgroup);
        if work.local() > max_local {
            return Err(GpuError::LocalSizeTooLarge {
                local: work.local(),
                max: max_local,
            });
        }

        if work.workgroups() > limits.max_compute_workgroups_per_dimension {
            return Err(GpuError::DispatchTooWide {
                workgroups: work.workgroups(),
                max: limits.max_compute_workgroups_per_dimension,
            });
        }

        Ok(())
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuDevice {{ adapter: {} }}", self.adapter_info)
    }
}

// ============================================================
// Error type
// ============================================================

/// Errors from the GPU layer: discovery, program build, buffers, readback.
#[derive(Debug)]
pub enum GpuError {
    /// No GPU-class adapter found (only CPU/software renderers visible).
    NoGpuAdapter,
    /// Device request failed (driver issue, unsupported limits, etc.).
    DeviceRequest(wgpu::RequestDeviceError),
    /// Configured local size exceeds the device's workgroup limits.
    LocalSizeTooLarge { local: u32, max: u32 },
    /// Dispatch needs more workgroups than the device allows in one
    /// dimension.
    DispatchTooWide { workgroups: u32, max: u32 },
    /// Kernel source file could not be read from its fixed path.
    SourceRead { path: PathBuf, source: io::Error },
    /// Shader compilation or pipeline creation was rejected by the
    /// validation layer.
    ShaderBuild(String),
    /// One of the device buffer allocations failed; the message is the
    /// first error reported by the combined allocation scope.
    BufferAlloc(String),
    /// The blocking readback of results failed.
    Readback(String),
}

impl fmt::Display for GpuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GpuError::NoGpuAdapter => write!(
                f,
                "no GPU-class adapter found (only CPU/software renderers visible)"
            ),
            GpuError::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            GpuError::LocalSizeTooLarge { local, max } => write!(
                f,
                "local work size {local} exceeds the device limit of {max} lanes per group"
            ),
            GpuError::DispatchTooWide { workgroups, max } => write!(
                f,
                "dispatch of {workgroups} workgroups exceeds the device limit of {max} per dimension"
            ),
            GpuError::SourceRead { path, source } => {
                write!(f, "failed to read kernel source {}: {source}", path.display())
            }
            GpuError::ShaderBuild(msg) => write!(f, "kernel build failed: {msg}"),
            GpuError::BufferAlloc(msg) => write!(f, "device buffer allocation failed: {msg}"),
            GpuError::Readback(msg) => write!(f, "result readback failed: {msg}"),
        }
    }
}

impl std::error::Error for GpuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GpuError::DeviceRequest(e) => Some(e),
            GpuError::SourceRead { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================
// Tests
// ============================================================
