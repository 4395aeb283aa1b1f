//! Triangular Mel filterbank construction and integration.

use alloc::vec::Vec;

use libm::{expf, logf};

use crate::error::FbankError;
use crate::frame::FrameExtractionOptions;

/// Mel-scale constants: `mel(f) = MEL_SCALE * ln(1 + f / MEL_BREAK_HZ)`.
const MEL_SCALE: f32 = 1127.0;
const MEL_BREAK_HZ: f32 = 700.0;

/// Smallest number of Mel bins that still forms a filterbank.
pub const MIN_MEL_BINS: usize = 3;

/// Options describing the Mel filterbank layout.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MelBanksOptions {
    pub num_bins: usize,
    pub low_freq: f32,
    /// Upper bound in Hz; values `<= 0` are an offset from Nyquist.
    pub high_freq: f32,
    pub vtln_low: f32,
    /// VTLN upper cutoff in Hz; values `< 0` are an offset from Nyquist.
    pub vtln_high: f32,
    /// Log every bin's weights on construction and every frame's energies.
    pub debug_mel: bool,
    /// Zero the first weight of bin 0 and floor energies at 1.0.
    pub htk_mode: bool,
}

impl Default for MelBanksOptions {
    fn default() -> Self {
        Self {
            num_bins: 23,
            low_freq: 20.0,
            high_freq: 0.0,
            vtln_low: 100.0,
            vtln_high: -500.0,
            debug_mel: false,
            htk_mode: false,
        }
    }
}

impl MelBanksOptions {
    pub fn validate(&self) -> Result<(), FbankError> {
        if self.num_bins < MIN_MEL_BINS {
            return Err(FbankError::TooFewMelBins(self.num_bins));
        }
        Ok(())
    }
}

#[inline]
pub fn mel_scale(freq: f32) -> f32 {
    MEL_SCALE * logf(1.0 + freq / MEL_BREAK_HZ)
}

#[inline]
pub fn inverse_mel_scale(mel: f32) -> f32 {
    MEL_BREAK_HZ * (expf(mel / MEL_SCALE) - 1.0)
}

/// Piecewise-linear VTLN frequency warp.
///
/// Frequencies outside `[low_freq, high_freq]` are returned unchanged.
/// Inside, the band between the (warp-adjusted) cutoffs is scaled by
/// `1 / warp_factor`, and two linear segments bridge it back to the fixed
/// end points `low_freq` and `high_freq`.
pub fn vtln_warp_freq(
    vtln_low_cutoff: f32,
    vtln_high_cutoff: f32,
    low_freq: f32,
    high_freq: f32,
    warp_factor: f32,
    freq: f32,
) -> f32 {
    if freq < low_freq || freq > high_freq {
        return freq;
    }
    let l = vtln_low_cutoff * warp_factor.max(1.0);
    let h = vtln_high_cutoff * warp_factor.min(1.0);
    let scale = 1.0 / warp_factor;
    let fl = scale * l;
    let fh = scale * h;
    if !(l > low_freq && h < high_freq) {
        return freq;
    }
    let scale_left = (fl - low_freq) / (l - low_freq);
    let scale_right = (high_freq - fh) / (high_freq - h);
    if freq < l {
        low_freq + scale_left * (freq - low_freq)
    } else if freq < h {
        scale * freq
    } else {
        high_freq + scale_right * (freq - high_freq)
    }
}

/// [`vtln_warp_freq`] applied to a Mel value.
pub fn vtln_warp_mel_freq(
    vtln_low_cutoff: f32,
    vtln_high_cutoff: f32,
    low_freq: f32,
    high_freq: f32,
    warp_factor: f32,
    mel_freq: f32,
) -> f32 {
    mel_scale(vtln_warp_freq(
        vtln_low_cutoff,
        vtln_high_cutoff,
        low_freq,
        high_freq,
        warp_factor,
        inverse_mel_scale(mel_freq),
    ))
}

/// One triangular filter stored as its first FFT bin and contiguous weights.
#[derive(Clone, Debug, PartialEq)]
pub struct MelBin {
    pub offset: usize,
    pub weights: Vec<f32>,
}

/// An immutable Mel filterbank for one VTLN warp factor.
#[derive(Clone, Debug)]
pub struct MelBanks {
    center_freqs: Vec<f32>,
    bins: Vec<MelBin>,
    debug: bool,
    htk_mode: bool,
}

impl MelBanks {
    pub fn new(
        opts: &MelBanksOptions,
        frame_opts: &FrameExtractionOptions,
        vtln_warp_factor: f32,
    ) -> Result<Self, FbankError> {
        opts.validate()?;
        let num_bins = opts.num_bins;
        let sample_freq = frame_opts.samp_freq;
        let window_length_padded = frame_opts.padded_window_size();
        if window_length_padded % 2 != 0 {
            return Err(FbankError::OddPaddedWindow(window_length_padded));
        }
        let num_fft_bins = window_length_padded / 2;
        let nyquist = 0.5 * sample_freq;

        let low_freq = opts.low_freq;
        let high_freq = if opts.high_freq > 0.0 {
            opts.high_freq
        } else {
            nyquist + opts.high_freq
        };
        if low_freq < 0.0
            || low_freq >= nyquist
            || high_freq <= 0.0
            || high_freq > nyquist
            || high_freq <= low_freq
        {
            return Err(FbankError::InvalidFrequencyRange {
                low: low_freq,
                high: high_freq,
                nyquist,
            });
        }

        let fft_bin_width = sample_freq / window_length_padded as f32;
        let mel_low_freq = mel_scale(low_freq);
        let mel_high_freq = mel_scale(high_freq);
        let mel_freq_delta = (mel_high_freq - mel_low_freq) / (num_bins + 1) as f32;

        let vtln_low = opts.vtln_low;
        let vtln_high = if opts.vtln_high < 0.0 {
            opts.vtln_high + nyquist
        } else {
            opts.vtln_high
        };
        let warping = vtln_warp_factor != 1.0;
        if warping
            && (vtln_low < 0.0
                || vtln_low <= low_freq
                || vtln_low >= high_freq
                || vtln_high <= 0.0
                || vtln_high >= high_freq
                || vtln_high <= vtln_low)
        {
            return Err(FbankError::InvalidVtlnRange {
                vtln_low,
                vtln_high,
                low: low_freq,
                high: high_freq,
            });
        }

        let warp = |mel: f32| {
            if warping {
                vtln_warp_mel_freq(
                    vtln_low,
                    vtln_high,
                    low_freq,
                    high_freq,
                    vtln_warp_factor,
                    mel,
                )
            } else {
                mel
            }
        };

        let mut bins = Vec::with_capacity(num_bins);
        let mut center_freqs = Vec::with_capacity(num_bins);
        for bin in 0..num_bins {
            let left_mel = warp(mel_low_freq + bin as f32 * mel_freq_delta);
            let center_mel = warp(mel_low_freq + (bin + 1) as f32 * mel_freq_delta);
            let right_mel = warp(mel_low_freq + (bin + 2) as f32 * mel_freq_delta);
            center_freqs.push(inverse_mel_scale(center_mel));

            let mut offset = None;
            let mut weights = Vec::new();
            for i in 0..num_fft_bins {
                let mel = mel_scale(fft_bin_width * i as f32);
                if mel > left_mel && mel < right_mel {
                    let weight = if mel <= center_mel {
                        (mel - left_mel) / (center_mel - left_mel)
                    } else {
                        (right_mel - mel) / (right_mel - center_mel)
                    };
                    offset.get_or_insert(i);
                    weights.push(weight);
                }
            }
            let offset = offset.ok_or(FbankError::EmptyMelBin(bin))?;
            if opts.htk_mode && bin == 0 && mel_low_freq != 0.0 {
                weights[0] = 0.0;
            }
            bins.push(MelBin { offset, weights });
        }

        if opts.debug_mel {
            for (i, b) in bins.iter().enumerate() {
                debug_log!("bin {}, offset = {}, vec = {:?}", i, b.offset, b.weights);
            }
        }

        Ok(Self {
            center_freqs,
            bins,
            debug: opts.debug_mel,
            htk_mode: opts.htk_mode,
        })
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Centre frequency of each bin in Hz, after any VTLN warp.
    pub fn center_freqs(&self) -> &[f32] {
        &self.center_freqs
    }

    pub fn bins(&self) -> &[MelBin] {
        &self.bins
    }

    /// Integrate `power_spectrum` into `mel_energies_out`, one value per bin.
    pub fn compute(
        &self,
        power_spectrum: &[f32],
        mel_energies_out: &mut [f32],
    ) -> Result<(), FbankError> {
        if mel_energies_out.len() != self.bins.len() {
            return Err(FbankError::FrameSizeMismatch {
                expected: self.bins.len(),
                actual: mel_energies_out.len(),
            });
        }
        for (i, (bin, out)) in self.bins.iter().zip(mel_energies_out.iter_mut()).enumerate() {
            let end = bin.offset + bin.weights.len();
            if end > power_spectrum.len() {
                return Err(FbankError::FrameSizeMismatch {
                    expected: end,
                    actual: power_spectrum.len(),
                });
            }
            let mut energy: f32 = bin
                .weights
                .iter()
                .zip(power_spectrum[bin.offset..end].iter())
                .map(|(w, p)| w * p)
                .sum();
            if self.htk_mode && energy < 1.0 {
                energy = 1.0;
            }
            if energy.is_nan() {
                return Err(FbankError::NanEnergy { bin: i });
            }
            *out = energy;
        }
        if self.debug {
            debug_log!("mel banks: {:?}", mel_energies_out);
        }
        Ok(())
    }
}
