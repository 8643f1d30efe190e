//! Fixed-length time-axis normalization.
//!
//! Captures differ in duration; the classifier wants one fixed time length.
//! Longer tensors keep their first `target` steps, shorter ones are
//! right-padded with a constant fill. Frequency and antenna axes are never
//! altered.

use ndarray::{s, Array3};
use num_complex::Complex;

/// Normalize one `[time, frequency, antenna]` tensor to exactly `target`
/// time steps.
pub fn resize_tensor(
    tensor: &Array3<Complex<f64>>,
    target: usize,
    pad_value: Complex<f64>,
) -> Array3<Complex<f64>> {
    let (times, freqs, antennas) = tensor.dim();

    if times > target {
        tensor.slice(s![..target, .., ..]).to_owned()
    } else if times < target {
        let mut padded = Array3::from_elem((target, freqs, antennas), pad_value);
        padded.slice_mut(s![..times, .., ..]).assign(tensor);
        padded
    } else {
        tensor.clone()
    }
}

/// Normalize a whole collection to `target` time steps (zero fill).
pub fn resize_to_fixed_length(
    samples: &[Array3<Complex<f64>>],
    target: usize,
) -> Vec<Array3<Complex<f64>>> {
    samples
        .iter()
        .map(|s| resize_tensor(s, target, Complex::new(0.0, 0.0)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tensor(times: usize) -> Array3<Complex<f64>> {
        Array3::from_shape_fn((times, 4, 2), |(t, f, a)| {
            Complex::new((t * 100 + f * 10 + a) as f64, 1.0)
        })
    }

    #[test]
    fn test_pad_to_target() {
        let input = tensor(10);
        let out = resize_tensor(&input, 15, Complex::new(0.0, 0.0));

        assert_eq!(out.dim(), (15, 4, 2));
        // First 10 steps unchanged
        for t in 0..10 {
            for f in 0..4 {
                for a in 0..2 {
                    assert_eq!(out[[t, f, a]], input[[t, f, a]]);
                }
            }
        }
        // Remainder is all pad value
        for t in 10..15 {
            for f in 0..4 {
                for a in 0..2 {
                    assert_eq!(out[[t, f, a]], Complex::new(0.0, 0.0));
                }
            }
        }
    }

    #[test]
    fn test_truncate_keeps_prefix() {
        let input = tensor(20);
        let out = resize_tensor(&input, 15, Complex::new(0.0, 0.0));

        assert_eq!(out.dim(), (15, 4, 2));
        for t in 0..15 {
            assert_eq!(out[[t, 0, 0]], input[[t, 0, 0]]);
        }
    }

    #[test]
    fn test_equal_length_passthrough() {
        let input = tensor(15);
        let out = resize_tensor(&input, 15, Complex::new(0.0, 0.0));
        assert_eq!(out, input);
    }

    #[test]
    fn test_custom_pad_value() {
        let input = tensor(2);
        let pad = Complex::new(-1.0, 0.5);
        let out = resize_tensor(&input, 4, pad);
        assert_eq!(out[[3, 2, 1]], pad);
    }

    #[test]
    fn test_collection_resize() {
        let samples = vec![tensor(10), tensor(20), tensor(15)];
        let out = resize_to_fixed_length(&samples, 15);
        assert!(out.iter().all(|s| s.dim() == (15, 4, 2)));
    }
}
