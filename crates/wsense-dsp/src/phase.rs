//! Linear phase calibration across subcarriers.
//!
//! The raw phase over frequency has a linear trend caused by clock drift
//! between Tx and Rx (SFO) and variable packet detection timing (PDD). For
//! every `(time, antenna)` lane we unwrap the phase, fit a degree-1
//! least-squares line versus subcarrier index, and rotate the complex values
//! by the negated fit. Magnitude is untouched; the non-linear phase
//! structure carrying the motion signature survives.

use ndarray::Array3;
use num_complex::Complex;

/// Remove the linear phase ramp from every `(time, antenna)` lane of a
/// `[time, frequency, antenna]` tensor.
///
/// Pure and order-independent across lanes; no failure mode for finite
/// input.
pub fn calibrate_phase(csi: &Array3<Complex<f64>>) -> Array3<Complex<f64>> {
    let (times, freqs, antennas) = csi.dim();
    let mut corrected = csi.clone();

    let mut phase = vec![0.0; freqs];
    for t in 0..times {
        for a in 0..antennas {
            for f in 0..freqs {
                phase[f] = csi[[t, f, a]].arg();
            }
            unwrap_phase(&mut phase);
            let (slope, intercept) = linear_fit(&phase);

            for f in 0..freqs {
                let fitted = slope * f as f64 + intercept;
                corrected[[t, f, a]] = csi[[t, f, a]] * Complex::from_polar(1.0, -fitted);
            }
        }
    }

    corrected
}

/// Unwrap a phase sequence in place, removing artificial ±2π jumps between
/// adjacent samples so the underlying phase is continuous.
pub fn unwrap_phase(phase: &mut [f64]) {
    if phase.len() < 2 {
        return;
    }

    let threshold = std::f64::consts::PI;
    let mut cumulative_offset = 0.0;

    for i in 1..phase.len() {
        let diff = phase[i] + cumulative_offset - phase[i - 1];

        if diff > threshold {
            cumulative_offset -= 2.0 * std::f64::consts::PI;
        } else if diff < -threshold {
            cumulative_offset += 2.0 * std::f64::consts::PI;
        }

        phase[i] += cumulative_offset;
    }
}

/// Degree-1 least-squares fit of `y` against indices `0..n`, returning
/// `(slope, intercept)`.
fn linear_fit(y: &[f64]) -> (f64, f64) {
    let n = y.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean: f64 = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut denominator = 0.0;
    for (i, &v) in y.iter().enumerate() {
        let x = i as f64;
        numerator += (x - x_mean) * (v - y_mean);
        denominator += (x - x_mean).powi(2);
    }

    let slope = if denominator.abs() > 1e-10 {
        numerator / denominator
    } else {
        0.0
    };
    let intercept = y_mean - slope * x_mean;

    (slope, intercept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn ramp_tensor(times: usize, freqs: usize, antennas: usize, slope: f64) -> Array3<Complex<f64>> {
        Array3::from_shape_fn((times, freqs, antennas), |(t, f, a)| {
            let mag = 1.0 + 0.1 * (t as f64) + 0.05 * (a as f64);
            Complex::from_polar(mag, slope * f as f64 + 0.4)
        })
    }

    #[test]
    fn test_magnitude_invariant() {
        let csi = Array3::from_shape_fn((4, 16, 2), |(t, f, a)| {
            Complex::from_polar(
                1.0 + (t + f + a) as f64 * 0.3,
                ((t * f) as f64 * 0.7).sin() * 2.0,
            )
        });

        let out = calibrate_phase(&csi);
        for (x, y) in csi.iter().zip(out.iter()) {
            assert!((x.norm() - y.norm()).abs() < 1e-12);
        }
    }

    #[test]
    fn test_linear_ramp_cancelled() {
        let csi = ramp_tensor(3, 30, 2, 0.05);
        let out = calibrate_phase(&csi);

        for v in out.iter() {
            assert!(v.arg().abs() < 1e-9, "residual phase {}", v.arg());
        }
    }

    #[test]
    fn test_wrapped_ramp_cancelled() {
        // Slope large enough that the raw phase wraps several times
        let csi = ramp_tensor(2, 30, 1, 0.9);
        let out = calibrate_phase(&csi);

        for v in out.iter() {
            assert!(v.arg().abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_phase_input_unchanged() {
        // Real-valued formats (zero imaginary part) pass through untouched
        let csi = Array3::from_shape_fn((3, 8, 2), |(t, f, _)| {
            Complex::new(1.0 + (t * f) as f64, 0.0)
        });
        let out = calibrate_phase(&csi);

        for (x, y) in csi.iter().zip(out.iter()) {
            assert!((x - y).norm() < 1e-12);
        }
    }

    #[test]
    fn test_unwrap_removes_jumps() {
        let true_phase: Vec<f64> = (0..40).map(|i| i as f64 * 0.4).collect();
        let mut wrapped: Vec<f64> = true_phase
            .iter()
            .map(|p| (p + PI).rem_euclid(2.0 * PI) - PI)
            .collect();

        unwrap_phase(&mut wrapped);

        for (u, t) in wrapped.iter().zip(true_phase.iter()) {
            assert!((u - t).abs() < 1e-9);
        }
    }
}
