//! Packed real FFT against a direct DFT.

use melstream::rfft::{compute_power_spectrum, Rfft};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn naive_dft(x: &[f32]) -> Vec<(f64, f64)> {
    let n = x.len();
    (0..=n / 2)
        .map(|k| {
            let mut re = 0.0f64;
            let mut im = 0.0f64;
            for (t, &v) in x.iter().enumerate() {
                let theta = -2.0 * std::f64::consts::PI * (k * t) as f64 / n as f64;
                re += v as f64 * theta.cos();
                im += v as f64 * theta.sin();
            }
            (re, im)
        })
        .collect()
}

#[test]
fn matches_naive_dft() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in [2usize, 4, 8, 16, 64, 512] {
        let x: Vec<f32> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
        let reference = naive_dft(&x);
        let mut data = x.clone();
        let mut fft = Rfft::new(n).unwrap();
        fft.compute(&mut data).unwrap();

        let tol = 1e-4 * n as f64;
        assert!((data[0] as f64 - reference[0].0).abs() < tol);
        assert!((data[1] as f64 - reference[n / 2].0).abs() < tol);
        for k in 1..n / 2 {
            assert!((data[2 * k] as f64 - reference[k].0).abs() < tol, "n={n} k={k}");
            assert!((data[2 * k + 1] as f64 - reference[k].1).abs() < tol, "n={n} k={k}");
        }
    }
}

#[test]
fn cosine_power_lands_in_one_bin() {
    let n = 64;
    let x: Vec<f32> = (0..n)
        .map(|t| (2.0 * std::f32::consts::PI * 5.0 * t as f32 / n as f32).cos())
        .collect();
    let mut data = x;
    let mut fft = Rfft::new(n).unwrap();
    fft.compute(&mut data).unwrap();
    compute_power_spectrum(&mut data);
    // (n / 2)^2 at the tone, nothing elsewhere
    assert!((data[5] - 1024.0).abs() < 1e-2);
    for (k, &p) in data[..=n / 2].iter().enumerate() {
        if k != 5 {
            assert!(p < 1e-6, "bin {k}: {p}");
        }
    }
}

#[test]
fn plan_is_reusable() {
    let mut fft = Rfft::new(16).unwrap();
    let mut a: Vec<f32> = (0..16).map(|i| i as f32).collect();
    let mut b = a.clone();
    fft.compute(&mut a).unwrap();
    fft.compute(&mut b).unwrap();
    assert_eq!(a, b);
    assert_eq!(fft.len(), 16);
}
