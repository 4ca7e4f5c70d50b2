// verify.rs — Host reference computation and tolerance comparison.
//
// The original sample's "compare against host computation" step never
// computed anything and always reported success. Here the comparison is
// real: a CPU element-wise sum over [0, n) and a per-element absolute
// tolerance check against the GPU results.

use std::fmt;

/// Default absolute tolerance. Element-wise f32 addition is exact on both
/// sides for the demo fill, so this only matters for user-supplied data.
pub const DEFAULT_TOLERANCE: f32 = 1e-6;

/// One element where GPU and reference disagree beyond tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    pub expected: f32,
    pub got: f32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] expected {}, got {} (diff {})",
            self.index,
            self.expected,
            self.got,
            (self.expected - self.got).abs()
        )
    }
}

/// CPU reference: element-wise `a[i] + b[i]` for the first `n` elements.
///
/// # Panics
/// In debug builds, if either slice is shorter than `n` (caller bug; the
/// driver always passes arrays of length `global >= n`).
pub fn host_reference(a: &[f32], b: &[f32], n: usize) -> Vec<f32> {
    debug_assert!(a.len() >= n && b.len() >= n);
    a[..n].iter().zip(&b[..n]).map(|(x, y)| x + y).collect()
}

/// Compare GPU output against the reference with an absolute tolerance.
///
/// Only the first `reference.len()` elements of `gpu_out` are inspected;
/// the tail `[n, global)` is not part of the contract. In debug builds,
/// a `gpu_out` shorter than the reference panics (caller bug, as in
/// [`host_reference`]). Returns every
/// offending element so a systematic failure (wrong kernel, wrong
/// binding order) is visible at a glance rather than one index at a time.
pub fn compare(gpu_out: &[f32], reference: &[f32], tolerance: f32) -> Result<(), Vec<Mismatch>> {
    debug_assert!(gpu_out.len() >= reference.len());
    let mismatches: Vec<Mismatch> = reference
        .iter()
        .zip(gpu_out)
        .enumerate()
        // Negated `<=` rather than `>` so a NaN on either side fails the
        // comparison instead of slipping through it.
        .filter(|(_, (&want, &got))| !((want - got).abs() <= tolerance))
        .map(|(index, (&expected, &got))| Mismatch { index, expected, got })
        .collect();

    if mismatches.is_empty() {
        Ok(())
    } else {
        Err(mismatches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FILL_VALUE;

    #[test]
    fn test_reference_of_demo_fill() {
        let a = vec![FILL_VALUE; 64];
        let b = vec![FILL_VALUE; 64];
        let r = host_reference(&a, &b, 50);
        assert_eq!(r.len(), 50);
        assert!(r.iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_reference_ignores_tail() {
        // Arrays longer than n: only [0, n) contributes.
        let a = vec![1.0, 2.0, 3.0, 99.0];
        let b = vec![10.0, 20.0, 30.0, 99.0];
        let r = host_reference(&a, &b, 3);
        assert_eq!(r, vec![11.0, 22.0, 33.0]);
    }

    #[test]
    fn test_compare_exact_match() {
        let want = vec![4.0; 100];
        let got = vec![4.0; 100];
        assert!(compare(&got, &want, 0.0).is_ok());
    }

    #[test]
    fn test_compare_within_tolerance() {
        let want = vec![4.0; 4];
        let got = vec![4.0, 4.0 + 5e-7, 4.0 - 5e-7, 4.0];
        assert!(compare(&got, &want, 1e-6).is_ok());
    }

    #[test]
    fn test_compare_beyond_tolerance() {
        let want = vec![4.0; 4];
        let got = vec![4.0, 5.0, 4.0, 3.5];
        let mismatches = compare(&got, &want, 1e-6).unwrap_err();
        assert_eq!(mismatches.len(), 2);
        assert_eq!(mismatches[0].index, 1);
        assert_eq!(mismatches[0].expected, 4.0);
        assert_eq!(mismatches[0].got, 5.0);
        assert_eq!(mismatches[1].index, 3);
    }

    #[test]
    fn test_compare_rejects_nan_below_n() {
        // A NaN result inside the verified range is exactly what the
        // comparison exists to catch; it must never count as a match.
        let want = vec![4.0; 4];
        let got = vec![4.0, f32::NAN, 4.0, 4.0];
        let mismatches = compare(&got, &want, 1e-6).unwrap_err();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0].index, 1);
        assert!(mismatches[0].got.is_nan());
    }

    #[test]
    fn test_compare_rejects_nan_reference() {
        // NaN on the reference side (bad inputs) fails too.
        let want = vec![4.0, f32::NAN];
        let got = vec![4.0, 4.0];
        let mismatches = compare(&got, &want, 1e-6).unwrap_err();
        assert_eq!(mismatches[0].index, 1);
    }

    #[test]
    #[should_panic]
    fn test_compare_short_gpu_output_is_a_caller_bug() {
        // gpu_out shorter than the reference would silently truncate the
        // zip; the debug assertion turns that into a loud failure.
        let want = vec![4.0; 8];
        let got = vec![4.0; 3];
        let _ = compare(&got, &want, 1e-6);
    }

    #[test]
    fn test_compare_only_inspects_reference_length() {
        // GPU output is global-sized; reference is n-sized. The garbage
        // tail must not be flagged.
        let want = vec![4.0; 3];
        let got = vec![4.0, 4.0, 4.0, 777.0, -1.0];
        assert!(compare(&got, &want, 1e-6).is_ok());
    }

    #[test]
    fn test_mismatch_display() {
        let m = Mismatch { index: 7, expected: 4.0, got: 5.0 };
        let s = format!("{m}");
        assert!(s.contains("[7]"));
        assert!(s.contains("4"));
        assert!(s.contains("5"));
    }
}
