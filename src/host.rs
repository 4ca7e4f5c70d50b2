// host.rs — Host-side arrays and the demo fill.
//
// Four flat arrays of length `global` (not `n`): two float sources, one
// float destination, one i32 lane-index array. All are allocated
// zero-filled, so the tail `[n, global)` is defined when transferred to
// the device even though the fill routines never touch it. The kernel
// additionally masks execution to `index < n`, so tail slots come back
// unchanged (zero) in the readback.
//
// The fill is an explicit debug/demo fill with constants, not randomized
// test data: sources get 2.0, the lane array gets the marker 8. A marker
// that survives the round trip means the kernel never ran on that lane.

use crate::work::WorkSize;

/// Value written to both source arrays for indices `< n`.
pub const FILL_VALUE: f32 = 2.0;

/// Marker written to the lane-index array for indices `< n`. The kernel
/// overwrites it with the lane index, so any surviving 8 is a lane that
/// was never executed.
pub const LANE_MARKER: i32 = 8;

/// Host buffers for one offload run. Owned by the driver; freed on drop.
pub struct HostBuffers {
    pub src_a: Vec<f32>,
    pub src_b: Vec<f32>,
    /// Destination for the blocking readback of the float results.
    pub dst: Vec<f32>,
    /// Destination for the blocking readback of the lane indices.
    pub lane_ids: Vec<i32>,
}

impl HostBuffers {
    /// Allocate all four arrays at length `global`, zero-filled.
    pub fn allocate(work: &WorkSize) -> Self {
        let len = work.global() as usize;
        HostBuffers {
            src_a: vec![0.0; len],
            src_b: vec![0.0; len],
            dst: vec![0.0; len],
            lane_ids: vec![0; len],
        }
    }

    /// Apply the demo fill to indices `< n`. Tail slots stay zero.
    pub fn fill_demo(&mut self, work: &WorkSize) {
        let n = work.n() as usize;
        self.src_a[..n].fill(FILL_VALUE);
        self.src_b[..n].fill(FILL_VALUE);
        self.lane_ids[..n].fill(LANE_MARKER);
    }

    /// Buffer length in elements (= `global`).
    pub fn len(&self) -> usize {
        self.src_a.len()
    }

    pub fn is_empty(&self) -> bool {
        self.src_a.is_empty()
    }
}
