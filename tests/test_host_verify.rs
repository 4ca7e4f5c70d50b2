// tests/test_host_verify.rs — Host fill and reference comparison working
// together, the CPU half of the pipeline.

use vecadd::host::{HostBuffers, FILL_VALUE, LANE_MARKER};
use vecadd::verify;
use vecadd::work::WorkSize;

#[test]
fn demo_fill_reference_is_four_everywhere_below_n() {
    let work = WorkSize::new(33334, 128).unwrap();
    let mut host = HostBuffers::allocate(&work);
    host.fill_demo(&work);

    let reference = verify::host_reference(&host.src_a, &host.src_b, work.n() as usize);
    assert_eq!(reference.len(), 33334);
    assert!(reference.iter().all(|&v| v == 2.0 * FILL_VALUE));
}

#[test]
fn fill_touches_exactly_the_logical_range() {
    let work = WorkSize::new(100, 64).unwrap();
    let mut host = HostBuffers::allocate(&work);
    host.fill_demo(&work);

    assert_eq!(host.len(), 128);
    assert!(host.src_a[..100].iter().all(|&v| v == FILL_VALUE));
    assert!(host.src_a[100..].iter().all(|&v| v == 0.0));
    assert!(host.lane_ids[..100].iter().all(|&v| v == LANE_MARKER));
    assert!(host.lane_ids[100..].iter().all(|&v| v == 0));
}

#[test]
fn a_correct_gpu_result_passes_and_a_corrupted_one_fails() {
    // Simulate the readback: the "GPU result" is the exact sum, then
    // corrupt one element beyond tolerance.
    let work = WorkSize::new(1000, 128).unwrap();
    let mut host = HostBuffers::allocate(&work);
    host.fill_demo(&work);

    let n = work.n() as usize;
    let reference = verify::host_reference(&host.src_a, &host.src_b, n);
    let mut gpu_out = vec![2.0 * FILL_VALUE; host.len()];

    assert!(verify::compare(&gpu_out, &reference, 1e-6).is_ok());

    gpu_out[777] = 0.0;
    let mismatches = verify::compare(&gpu_out, &reference, 1e-6).unwrap_err();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].index, 777);
    assert_eq!(mismatches[0].expected, 4.0);
    assert_eq!(mismatches[0].got, 0.0);
}

#[test]
fn garbage_in_the_dispatch_tail_is_not_a_failure() {
    // Only [0, n) is part of the verification contract.
    let work = WorkSize::new(100, 64).unwrap();
    let mut host = HostBuffers::allocate(&work);
    host.fill_demo(&work);

    let reference = verify::host_reference(&host.src_a, &host.src_b, 100);
    let mut gpu_out = vec![4.0; 128];
    for v in &mut gpu_out[100..] {
        *v = f32::NAN;
    }
    assert!(verify::compare(&gpu_out, &reference, 1e-6).is_ok());
}

#[test]
fn dropping_host_buffers_alone_is_fine() {
    // The teardown-idempotence property for the paths that exist without
    // a GPU: host buffers created and dropped with nothing else alive.
    let work = WorkSize::new(33334, 128).unwrap();
    let host = HostBuffers::allocate(&work);
    drop(host);
}
