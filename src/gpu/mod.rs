// gpu/mod.rs — GPU layer.
//
// `device` discovers the platform (instance → GPU-class adapter →
// device + in-order queue) and owns the session handles; `pipeline`
// builds the kernel from source text, owns the device buffers, and runs
// the one-shot write → dispatch → blocking-readback sequence.
//
// Everything here is RAII: no resource has an explicit release call, so
// teardown is exhaustive and idempotent on every exit path, including
// early returns from a failed setup step.

pub mod device;
pub mod pipeline;
