// work.rs — 1-D work descriptor: element count, local size, rounded-up
// global size.
//
// The global size is the element count rounded up to the next multiple of
// the local (workgroup) size, so the dispatch covers every element with
// whole workgroups. The rounding is the only arithmetic in the program
// that can go wrong (division by a zero local size), so construction is
// fallible and both inputs are validated up front.

use std::fmt;

/// Work sizes for a 1-D compute dispatch.
///
/// Invariants (upheld by [`WorkSize::new`]):
/// - `global >= n`
/// - `global % local == 0`
/// - `global` is the smallest value satisfying both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkSize {
    n: u32,
    local: u32,
    global: u32,
}

impl WorkSize {
    /// Compute the global size by ceiling-to-multiple rounding.
    ///
    /// # Errors
    /// `ZeroElements` if `n == 0`, `ZeroLocalSize` if `local == 0`,
    /// `GlobalOverflow` if the rounded-up size does not fit in `u32`.
    pub fn new(n: u32, local: u32) -> Result<Self, WorkSizeError> {
        if n == 0 {
            return Err(WorkSizeError::ZeroElements);
        }
        if local == 0 {
            return Err(WorkSizeError::ZeroLocalSize);
        }
        // All arithmetic in u64: near u32::MAX the rounded-up size can
        // exceed u32 range even though both inputs are valid.
        let groups = (n as u64 + local as u64 - 1) / local as u64;
        let global = u32::try_from(groups * local as u64)
            .map_err(|_| WorkSizeError::GlobalOverflow { n, local })?;
        Ok(WorkSize { n, local, global })
    }

    /// Logical element count (the kernel masks execution to `< n`).
    pub fn n(&self) -> u32 {
        self.n
    }

    /// Lanes per workgroup.
    pub fn local(&self) -> u32 {
        self.local
    }

    /// Total dispatch width in lanes; buffer lengths use this.
    pub fn global(&self) -> u32 {
        self.global
    }

    /// Number of workgroups in the dispatch (`global / local`).
    pub fn workgroups(&self) -> u32 {
        self.global / self.local
    }

    /// Lanes in `[n, global)` that the kernel must not write.
    pub fn tail(&self) -> u32 {
        self.global - self.n
    }
}

impl fmt::Display for WorkSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} elements, global {} = {} groups × {} lanes",
            self.n,
            self.global,
            self.workgroups(),
            self.local
        )
    }
}

/// Errors from work-size construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkSizeError {
    /// Element count was zero — nothing to dispatch.
    ZeroElements,
    /// Local size was zero — the rounding would divide by zero.
    ZeroLocalSize,
    /// Rounding `n` up to a multiple of `local` exceeds u32 range.
    GlobalOverflow { n: u32, local: u32 },
}

impl fmt::Display for WorkSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkSizeError::ZeroElements => write!(f, "element count must be nonzero"),
            WorkSizeError::ZeroLocalSize => write!(f, "local work size must be nonzero"),
            WorkSizeError::GlobalOverflow { n, local } => write!(
                f,
                "global size for {n} elements at local size {local} overflows u32"
            ),
        }
    }
}

impl std::error::Error for WorkSizeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_up_to_next_multiple() {
        let w = WorkSize::new(100, 32).unwrap();
        assert_eq!(w.global(), 128);
        assert_eq!(w.workgroups(), 4);
        assert_eq!(w.tail(), 28);
    }

    #[test]
    fn test_exact_multiple_unchanged() {
        let w = WorkSize::new(256, 32).unwrap();
        assert_eq!(w.global(), 256);
        assert_eq!(w.workgroups(), 8);
        assert_eq!(w.tail(), 0);
    }

    #[test]
    fn test_demo_configuration() {
        // The demo default: 33334 elements at 128 lanes per group.
        let w = WorkSize::new(33334, 128).unwrap();
        assert_eq!(w.global(), 33408);
        assert_eq!(w.workgroups(), 261);
    }

    #[test]
    fn test_invariants_over_grid() {
        for n in [1u32, 2, 31, 32, 33, 127, 128, 129, 1000, 33334, 65535] {
            for local in [1u32, 2, 7, 32, 64, 128, 256] {
                let w = WorkSize::new(n, local).unwrap();
                assert!(w.global() >= n, "global < n for ({n}, {local})");
                assert_eq!(w.global() % local, 0, "not a multiple for ({n}, {local})");
                // Minimality: one fewer group would not cover n.
                assert!(
                    w.global() - local < n,
                    "global not minimal for ({n}, {local}): {}",
                    w.global()
                );
            }
        }
    }

    #[test]
    fn test_local_of_one() {
        let w = WorkSize::new(17, 1).unwrap();
        assert_eq!(w.global(), 17);
        assert_eq!(w.workgroups(), 17);
    }

    #[test]
    fn test_near_max_rounding_does_not_wrap() {
        // n just under u32::MAX at local 4096 would round up past 2^32:
        // that is an error, never a wrapped (and thus < n) global size.
        let err = WorkSize::new(u32::MAX - 1, 4096).unwrap_err();
        assert_eq!(err, WorkSizeError::GlobalOverflow { n: u32::MAX - 1, local: 4096 });

        // The largest multiple of 4096 that fits is still accepted.
        let n = u32::MAX - 4095; // 2^32 - 4096
        let w = WorkSize::new(n, 4096).unwrap();
        assert_eq!(w.global(), n);
        assert!(w.global() >= w.n());
        assert_eq!(w.global() % 4096, 0);
    }

    #[test]
    fn test_zero_inputs_rejected() {
        assert_eq!(WorkSize::new(0, 128), Err(WorkSizeError::ZeroElements));
        assert_eq!(WorkSize::new(100, 0), Err(WorkSizeError::ZeroLocalSize));
        // Both zero: element count is checked first.
        assert_eq!(WorkSize::new(0, 0), Err(WorkSizeError::ZeroElements));
    }

    #[test]
    fn test_display() {
        let w = WorkSize::new(33334, 128).unwrap();
        let s = format!("{w}");
        assert!(s.contains("33334"));
        assert!(s.contains("33408"));
        assert!(s.contains("261"));
    }
}
