// benches/benchmarks.rs — CPU-side benchmarks: fill, reference, compare.
//
// Always runnable (no GPU required):
//   cargo bench --bench benchmarks
//
// These measure the host half of the pipeline so the GPU benchmarks can
// be read against a baseline: if the dispatch benchmark is dominated by
// fill + verify time, the offload is not buying anything at that size.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use vecadd::host::HostBuffers;
use vecadd::verify;
use vecadd::work::WorkSize;

const SIZES: [u32; 3] = [1 << 12, 1 << 16, 1 << 20];
const LOCAL: u32 = 128;

fn bench_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_fill");
    for &n in &SIZES {
        let work = WorkSize::new(n, LOCAL).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(n), &work, |b, work| {
            let mut host = HostBuffers::allocate(work);
            b.iter(|| host.fill_demo(work));
        });
    }
    group.finish();
}

fn bench_reference(c: &mut Criterion) {
    let mut group = c.benchmark_group("host_reference");
    for &n in &SIZES {
        let work = WorkSize::new(n, LOCAL).unwrap();
        let mut host = HostBuffers::allocate(&work);
        host.fill_demo(&work);
        group.bench_with_input(BenchmarkId::from_parameter(n), &host, |b, host| {
            b.iter(|| verify::host_reference(&host.src_a, &host.src_b, n as usize));
        });
    }
    group.finish();
}

fn bench_compare(c: &mut Criterion) {
    let mut group = c.benchmark_group("compare");
    for &n in &SIZES {
        let reference = vec![4.0f32; n as usize];
        let gpu_out = vec![4.0f32; n as usize];
        group.bench_with_input(
            BenchmarkId::from_parameter(n),
            &(gpu_out, reference),
            |b, (gpu_out, reference)| {
                b.iter(|| verify::compare(gpu_out, reference, 1e-6));
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_fill, bench_reference, bench_compare);
criterion_main!(benches);
