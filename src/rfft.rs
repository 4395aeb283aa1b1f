//! Real-input FFT for power-of-two lengths with a packed half-spectrum.
//!
//! A length-`n` real signal is transformed through a length-`n/2` complex
//! FFT on the even/odd interleaved samples followed by a symmetric
//! post-processing pass. The output overwrites the input in the layout
//! `[Re(0), Re(n/2), Re(1), Im(1), Re(2), Im(2), ...]`, where bins
//! `0` and `n/2` are purely real.

use alloc::vec;
use alloc::vec::Vec;
use core::f64::consts::PI;

use libm::sqrtf;

use crate::error::FbankError;
use crate::num::Complex32;

/// Number of real samples that make up a complex pair.
pub const STRIDE: usize = 2;

/// Smallest supported transform length.
pub const MIN_LEN: usize = STRIDE;

/// Scalar used for halving values during post-processing.
const HALF: f32 = 0.5;

/// Precomputed tables for one transform length.
#[derive(Clone, Debug)]
pub struct Rfft {
    n: usize,
    /// Bit-reversal permutation for the half-length complex FFT.
    bit_reverse: Vec<usize>,
    /// `exp(-2πi k / m)` for `k < m / 2`, where `m = n / 2`.
    stage_twiddles: Vec<Complex32>,
    /// `exp(-πi k / m)` for `k < m`, used to split even/odd spectra.
    post_twiddles: Vec<Complex32>,
    scratch: Vec<Complex32>,
}

impl Rfft {
    pub fn new(n: usize) -> Result<Self, FbankError> {
        if n < MIN_LEN || !n.is_power_of_two() {
            return Err(FbankError::NonPowerOfTwoLength(n));
        }
        let m = n / STRIDE;
        let bits = m.trailing_zeros();
        let bit_reverse = (0..m)
            .map(|i| {
                if bits == 0 {
                    0
                } else {
                    i.reverse_bits() >> (usize::BITS - bits)
                }
            })
            .collect();
        let stage_twiddles = (0..m / 2)
            .map(|k| Complex32::expi(-2.0 * PI * k as f64 / m as f64))
            .collect();
        let post_twiddles = (0..m)
            .map(|k| Complex32::expi(-PI * k as f64 / m as f64))
            .collect();
        Ok(Self {
            n,
            bit_reverse,
            stage_twiddles,
            post_twiddles,
            scratch: vec![Complex32::zero(); m],
        })
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.n
    }

    /// Transform `data` in place into the packed half-spectrum layout.
    pub fn compute(&mut self, data: &mut [f32]) -> Result<(), FbankError> {
        if data.len() != self.n {
            return Err(FbankError::FrameSizeMismatch {
                expected: self.n,
                actual: data.len(),
            });
        }
        let m = self.n / STRIDE;
        for (i, &r) in self.bit_reverse.iter().enumerate() {
            self.scratch[r] = Complex32::new(data[STRIDE * i], data[STRIDE * i + 1]);
        }
        self.butterflies();

        let z = &self.scratch;
        let y0 = z[0];
        data[0] = y0.re + y0.im;
        data[1] = y0.re - y0.im;
        for k in 1..m {
            let a = z[k];
            let b = z[m - k].conj();
            let sum = a + b;
            let t = self.post_twiddles[k] * (a - b);
            // X[k] = (sum - i * t) / 2
            let x = Complex32::new(sum.re + t.im, sum.im - t.re) * HALF;
            data[STRIDE * k] = x.re;
            data[STRIDE * k + 1] = x.im;
        }
        Ok(())
    }

    /// Iterative radix-2 decimation-in-time over the bit-reversed scratch.
    fn butterflies(&mut self) {
        let m = self.scratch.len();
        let mut len = 2;
        while len <= m {
            let half = len / 2;
            let stride = m / len;
            for start in (0..m).step_by(len) {
                for j in 0..half {
                    let w = self.stage_twiddles[j * stride];
                    let u = self.scratch[start + j];
                    let v = self.scratch[start + j + half] * w;
                    self.scratch[start + j] = u + v;
                    self.scratch[start + j + half] = u - v;
                }
            }
            len <<= 1;
        }
    }
}

/// Convert a packed half-spectrum into a power spectrum in place.
///
/// Entries `0..=dim/2` receive `|X(k)|^2`; the rest of the buffer is left
/// holding stale spectrum values.
pub fn compute_power_spectrum(packed: &mut [f32]) {
    let dim = packed.len();
    if dim < MIN_LEN {
        return;
    }
    let half = dim / 2;
    let first = packed[0] * packed[0];
    let last = packed[1] * packed[1];
    for i in 1..half {
        let re = packed[STRIDE * i];
        let im = packed[STRIDE * i + 1];
        packed[i] = re * re + im * im;
    }
    packed[0] = first;
    packed[half] = last;
}

/// Replace the first `dim/2 + 1` power values with magnitudes.
pub fn power_to_magnitude(power: &mut [f32]) {
    let bins = power.len() / 2 + 1;
    for v in power.iter_mut().take(bins) {
        *v = sqrtf(*v);
    }
}
