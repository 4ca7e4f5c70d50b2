// vecadd: GPU vector-addition offload demo.
//
// One linear pipeline: allocate and fill host arrays, discover a
// GPU-class adapter, build the kernel from source text, enqueue
// write → dispatch → blocking readback, verify against a CPU reference.
// Every device resource is a scoped-ownership handle, so teardown is
// automatic and exhaustive on every exit path.

pub mod driver;
pub mod gpu;
pub mod host;
pub mod verify;
pub mod work;
