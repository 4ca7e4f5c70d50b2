// demos/minimal_add.rs — the library pipeline at toy size, every value
// printed.
//
// Runs 10 elements at local size 4 (global 12), so the rounded-up tail
// and the lane-mask behaviour are visible by eye: lanes 10 and 11 stay
// zero in both output arrays.
//
// USAGE
//   cargo run --example minimal_add

use std::path::Path;
use std::process::ExitCode;

use vecadd::gpu::device::GpuDevice;
use vecadd::gpu::pipeline::{load_kernel_source, VecAddPipeline, KERNEL_SOURCE_PATH};
use vecadd::host::HostBuffers;
use vecadd::work::WorkSize;

fn main() -> ExitCode {
    env_logger::init();

    let work = WorkSize::new(10, 4).expect("static sizes are nonzero");
    println!("{work}");

    let gpu = match GpuDevice::new() {
        Ok(gpu) => gpu,
        Err(e) => {
            eprintln!("[minimal_add] {e}");
            return ExitCode::FAILURE;
        }
    };
    println!("adapter: {}", gpu.adapter_info);

    let source = load_kernel_source(Path::new(KERNEL_SOURCE_PATH)).expect("shipped kernel");
    let pipeline = VecAddPipeline::new(&gpu, &work, &source).expect("pipeline build");

    let mut host = HostBuffers::allocate(&work);
    // Distinct values instead of the demo fill, so sums differ per lane.
    for i in 0..10 {
        host.src_a[i] = i as f32;
        host.src_b[i] = 10.0 * i as f32;
    }

    pipeline.dispatch(&gpu, &mut host).expect("dispatch");

    for i in 0..host.len() {
        let region = if i < 10 { "" } else { "  (tail)" };
        println!(
            "[{i:2}] {} + {} = {}   lane {}{region}",
            host.src_a[i], host.src_b[i], host.dst[i], host.lane_ids[i]
        );
    }
    ExitCode::SUCCESS
}
