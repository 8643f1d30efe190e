//! Benchmarks for the CSI conditioning hot path.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ndarray::Array3;
use num_complex::Complex;

use wsense_dsp::{calibrate_phase, WaveletDenoiser};

fn test_tensor(times: usize, freqs: usize, antennas: usize) -> Array3<Complex<f64>> {
    Array3::from_shape_fn((times, freqs, antennas), |(t, f, a)| {
        let phase = 0.05 * f as f64 + 0.01 * t as f64 + 0.1 * a as f64;
        let mag = 3.0 + (t as f64 * 0.37).sin() + (f as f64 * 0.5).cos();
        Complex::from_polar(mag, phase)
    })
}

fn benchmark_phase_calibration(c: &mut Criterion) {
    let small = test_tensor(300, 30, 3);
    let large = test_tensor(1500, 30, 3);

    c.bench_function("calibrate_phase_300x30x3", |b| {
        b.iter(|| calibrate_phase(black_box(&small)))
    });
    c.bench_function("calibrate_phase_1500x30x3", |b| {
        b.iter(|| calibrate_phase(black_box(&large)))
    });
}

fn benchmark_wavelet_denoise(c: &mut Criterion) {
    let denoiser = WaveletDenoiser::new();
    let tensor = test_tensor(300, 30, 3);

    c.bench_function("wavelet_denoise_300x30x3", |b| {
        b.iter(|| denoiser.denoise(black_box(&tensor)))
    });

    let series: Vec<f64> = (0..1500).map(|i| 3.0 + (i as f64 * 0.37).sin()).collect();
    c.bench_function("wavelet_denoise_series_1500", |b| {
        b.iter(|| denoiser.denoise_series(black_box(&series)))
    });
}

criterion_group!(benches, benchmark_phase_calibration, benchmark_wavelet_denoise);
criterion_main!(benches);
