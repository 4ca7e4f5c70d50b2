// driver.rs — The offload driver: the strict-sequence pipeline.
//
// One run performs, in fixed order, each step a precondition of the next:
//
//   1. Compute work sizes (ceiling-to-multiple rounding)
//   2. Allocate and demo-fill host arrays
//   3. Load the kernel source from its fixed path
//   4. Discover a GPU-class adapter, request device + queue
//   5. Build the kernel and device buffers
//   6. Enqueue writes → dispatch → blocking readback
//   7. Verify against the host reference
//
// The source file is read before any device interaction so a missing
// kernel fails without touching the GPU. Every fallible step is checked
// once via `?`; the first failure aborts the run — no retry, no partial
// recovery. There is no teardown step: every device resource is a
// scoped-ownership handle, so cleanup is automatic and total on both the
// success and every failure path.
//
// A progress line is printed before each step, mirroring the sample this
// demo reproduces.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::gpu::device::{GpuDevice, GpuError};
use crate::gpu::pipeline::{self, VecAddPipeline, KERNEL_SOURCE_PATH};
use crate::host::HostBuffers;
use crate::verify::{self, Mismatch, DEFAULT_TOLERANCE};
use crate::work::{WorkSize, WorkSizeError};

/// Demo default: elements per array. Deliberately not a multiple of the
/// local size, so the rounded-up tail path is always exercised.
pub const DEFAULT_NUM_ELEMENTS: u32 = 33334;

/// Demo default: lanes per workgroup.
pub const DEFAULT_LOCAL_SIZE: u32 = 128;

/// Demo default: lane-index entries printed after a successful run.
pub const DEFAULT_PRINT_LIMIT: usize = 512;

/// Driver configuration. The defaults are the demo constants.
pub struct DriverConfig {
    /// Logical element count per array.
    pub num_elements: u32,
    /// Lanes per workgroup.
    pub local_size: u32,
    /// Kernel source file. Defaults to the fixed shipped path.
    pub shader_path: PathBuf,
    /// How many lane-index entries the report carries for printing.
    pub print_limit: usize,
    /// Absolute tolerance for the host-reference comparison.
    pub tolerance: f32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            num_elements: DEFAULT_NUM_ELEMENTS,
            local_size: DEFAULT_LOCAL_SIZE,
            shader_path: PathBuf::from(KERNEL_SOURCE_PATH),
            print_limit: DEFAULT_PRINT_LIMIT,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Wall-clock duration of each pipeline stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    pub host_alloc: Duration,
    pub source_load: Duration,
    pub device_init: Duration,
    pub pipeline_build: Duration,
    pub dispatch: Duration,
    pub verify: Duration,
}

impl fmt::Display for StageTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host alloc {:?}, source load {:?}, device init {:?}, \
             pipeline build {:?}, dispatch+readback {:?}, verify {:?}",
            self.host_alloc,
            self.source_load,
            self.device_init,
            self.pipeline_build,
            self.dispatch,
            self.verify
        )
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct RunReport {
    pub work: WorkSize,
    pub adapter: String,
    pub timings: StageTimings,
    /// First `min(print_limit, global)` entries of the lane-index array.
    pub lane_preview: Vec<i32>,
    /// Elements compared against the host reference (= n).
    pub verified: usize,
}

/// Errors from a driver run. One flat taxonomy: the first failing step
/// aborts the run and is reported with the step named in the message.
#[derive(Debug)]
pub enum DriverError {
    Work(WorkSizeError),
    Gpu(GpuError),
    /// GPU results disagreed with the host reference.
    Mismatch(Vec<Mismatch>),
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::Work(e) => write!(f, "work-size setup failed: {e}"),
            DriverError::Gpu(e) => write!(f, "{e}"),
            DriverError::Mismatch(mismatches) => {
                write!(f, "verification failed: {} element(s) off", mismatches.len())?;
                // First few offenders only; a systematic failure would
                // otherwise flood the terminal with every element.
                for m in mismatches.iter().take(8) {
                    write!(f, "\n  {m}")?;
                }
                if mismatches.len() > 8 {
                    write!(f, "\n  ... {} more", mismatches.len() - 8)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DriverError::Work(e) => Some(e),
            DriverError::Gpu(e) => Some(e),
            DriverError::Mismatch(_) => None,
        }
    }
}

impl From<WorkSizeError> for DriverError {
    fn from(e: WorkSizeError) -> Self {
        DriverError::Work(e)
    }
}

impl From<GpuError> for DriverError {
    fn from(e: GpuError) -> Self {
        DriverError::Gpu(e)
    }
}

/// Run the full offload pipeline once.
///
/// On success every array element below `num_elements` has been checked
/// against the CPU reference. All device and host resources are released
/// by the time this returns, on both paths.
pub fn run(config: &DriverConfig) -> Result<RunReport, DriverError> {
    let mut timings = StageTimings::default();

    let work = WorkSize::new(config.num_elements, config.local_size)?;
    println!("Global Work Size            = {}", work.global());
    println!("Local Work Size             = {}", work.local());
    println!("# of Work Groups            = {}", work.workgroups());
    println!();

    println!("Allocate and init host arrays...");
    let t = Instant::now();
    let mut host = HostBuffers::allocate(&work);
    host.fill_demo(&work);
    timings.host_alloc = t.elapsed();

    println!("Load kernel source ({})...", config.shader_path.display());
    let t = Instant::now();
    let source = pipeline::load_kernel_source(Path::new(&config.shader_path))?;
    timings.source_load = t.elapsed();

    println!("Acquire GPU adapter, device, and queue...");
    let t = Instant::now();
    let gpu = GpuDevice::new()?;
    timings.device_init = t.elapsed();
    println!("Using adapter: {}", gpu.adapter_info);
    gpu.validate_work(&work)?;

    println!("Build kernel and device buffers...");
    let t = Instant::now();
    let pipeline = VecAddPipeline::new(&gpu, &work, &source)?;
    timings.pipeline_build = t.elapsed();

    println!("Enqueue writes, dispatch, blocking readback...");
    let t = Instant::now();
    pipeline.dispatch(&gpu, &mut host)?;
    timings.dispatch = t.elapsed();

    println!("Comparing against host computation...");
    let t = Instant::now();
    let n = work.n() as usize;
    let reference = verify::host_reference(&host.src_a, &host.src_b, n);
    verify::compare(&host.dst, &reference, config.tolerance).map_err(DriverError::Mismatch)?;
    timings.verify = t.elapsed();

    let preview_len = config.print_limit.min(host.lane_ids.len());
    Ok(RunReport {
        work,
        adapter: gpu.adapter_info.to_string(),
        timings,
        lane_preview: host.lane_ids[..preview_len].to_vec(),
        verified: n,
    })
}
