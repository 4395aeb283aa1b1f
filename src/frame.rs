//! Frame segmentation and per-frame waveform conditioning.
//!
//! Frames are addressed by index. [`first_sample_of_frame`] and
//! [`num_frames`] are pure functions of the index and the options, so the
//! streaming controller can re-derive how many frames a growing waveform
//! supports on every call. [`extract_window`] copies one frame out of the
//! retained waveform into a zero-padded buffer and applies dither, DC
//! removal, pre-emphasis and the analysis window.

use libm::{cosf, logf, sqrtf};
use rand::Rng;

use crate::error::FbankError;
use crate::window::{FeatureWindowFunction, WindowType};

/// Milliseconds per second, for converting frame durations to samples.
const MS_PER_SECOND: f64 = 1000.0;

/// Options controlling how the waveform is cut into frames.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FrameExtractionOptions {
    pub samp_freq: f32,
    pub frame_shift_ms: f32,
    pub frame_length_ms: f32,
    /// Standard deviation of Gaussian noise added to each sample; `0` disables.
    pub dither: f32,
    /// Seed for the dither noise generator.
    pub dither_seed: u64,
    pub preemph_coeff: f32,
    /// Subtract the per-frame mean before spectral analysis.
    pub remove_dc_offset: bool,
    pub window_type: WindowType,
    /// Zero-pad each frame to the next power of two for the FFT.
    pub round_to_power_of_two: bool,
    pub blackman_coeff: f32,
    /// Only emit frames that lie fully inside the signal.
    pub snip_edges: bool,
    /// Number of feature vectors the streaming history retains.
    pub max_feature_vectors: usize,
}

impl Default for FrameExtractionOptions {
    fn default() -> Self {
        Self {
            samp_freq: 16000.0,
            frame_shift_ms: 10.0,
            frame_length_ms: 25.0,
            dither: 1.0,
            dither_seed: 0,
            preemph_coeff: 0.97,
            remove_dc_offset: true,
            window_type: WindowType::Povey,
            round_to_power_of_two: true,
            blackman_coeff: 0.42,
            snip_edges: true,
            max_feature_vectors: 1000,
        }
    }
}

impl FrameExtractionOptions {
    /// Frame stride in samples.
    pub fn window_shift(&self) -> usize {
        ms_to_samples(self.samp_freq, self.frame_shift_ms)
    }

    /// Frame width in samples.
    pub fn window_size(&self) -> usize {
        ms_to_samples(self.samp_freq, self.frame_length_ms)
    }

    /// Length of the buffer handed to the FFT.
    pub fn padded_window_size(&self) -> usize {
        let size = self.window_size();
        if self.round_to_power_of_two {
            round_up_to_power_of_two(size)
        } else {
            size
        }
    }

    pub fn validate(&self) -> Result<(), FbankError> {
        if !self.samp_freq.is_finite() || self.samp_freq <= 0.0 {
            return Err(FbankError::InvalidSampleFrequency(self.samp_freq));
        }
        if self.window_size() == 0 {
            return Err(FbankError::InvalidWindowLength);
        }
        if self.window_shift() == 0 {
            return Err(FbankError::InvalidWindowShift);
        }
        if !(0.0..=1.0).contains(&self.preemph_coeff) {
            return Err(FbankError::InvalidPreemphCoeff(self.preemph_coeff));
        }
        if !self.dither.is_finite() || self.dither < 0.0 {
            return Err(FbankError::InvalidDither(self.dither));
        }
        Ok(())
    }
}

fn ms_to_samples(samp_freq: f32, ms: f32) -> usize {
    let samples = samp_freq as f64 * ms as f64 / MS_PER_SECOND;
    if samples.is_finite() && samples > 0.0 {
        samples as usize
    } else {
        0
    }
}

/// Smallest power of two that is `>= n`; `0` maps to `1`.
pub fn round_up_to_power_of_two(n: usize) -> usize {
    n.max(1).next_power_of_two()
}

/// Absolute index of the first sample of `frame`.
///
/// Without snip-edges, frames are centred on `shift * frame + shift / 2`
/// and the result may be negative.
pub fn first_sample_of_frame(frame: usize, opts: &FrameExtractionOptions) -> i64 {
    let shift = opts.window_shift() as i64;
    let frame = frame as i64;
    if opts.snip_edges {
        frame * shift
    } else {
        let midpoint = shift * frame + shift / 2;
        midpoint - opts.window_size() as i64 / 2
    }
}

/// Number of frames supported by `num_samples` samples.
///
/// With snip-edges every frame lies fully inside the signal. Otherwise the
/// count is `round(num_samples / shift)`; when `flush` is false, trailing
/// frames whose end would pass `num_samples` are withheld because more audio
/// may still arrive.
pub fn num_frames(num_samples: i64, opts: &FrameExtractionOptions, flush: bool) -> usize {
    let shift = opts.window_shift() as i64;
    let size = opts.window_size() as i64;
    if shift == 0 || num_samples <= 0 {
        return 0;
    }
    if opts.snip_edges {
        if num_samples < size {
            0
        } else {
            (1 + (num_samples - size) / shift) as usize
        }
    } else {
        let mut count = (num_samples + shift / 2) / shift;
        if flush || count == 0 {
            return count as usize;
        }
        let mut end_of_last = first_sample_of_frame((count - 1) as usize, opts) + size;
        while count > 0 && end_of_last > num_samples {
            count -= 1;
            end_of_last -= shift;
        }
        count as usize
    }
}

/// Subtract the mean of `d` from every element.
pub fn remove_dc_offset(d: &mut [f32]) {
    if d.is_empty() {
        return;
    }
    let mean = d.iter().sum::<f32>() / d.len() as f32;
    for v in d.iter_mut() {
        *v -= mean;
    }
}

pub fn inner_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// `log(max(<d, d>, eps))`.
pub fn log_energy(d: &[f32]) -> f32 {
    logf(inner_product(d, d).max(f32::EPSILON))
}

/// First-order high-pass `d[i] -= coeff * d[i - 1]`, scanned from the end.
pub fn preemphasize(d: &mut [f32], coeff: f32) {
    if coeff == 0.0 || d.is_empty() {
        return;
    }
    for i in (1..d.len()).rev() {
        d[i] -= coeff * d[i - 1];
    }
    d[0] -= coeff * d[0];
}

/// Draw one standard-normal sample using the Box-Muller transform.
pub fn rand_gauss<R: Rng + ?Sized>(rng: &mut R) -> f32 {
    // gen::<f32>() is in [0, 1); flip it so the log argument is never zero.
    let u1 = 1.0 - rng.gen::<f32>();
    let u2 = rng.gen::<f32>();
    sqrtf(-2.0 * logf(u1)) * cosf(2.0 * core::f32::consts::PI * u2)
}

/// Add `dither * N(0, 1)` to every sample.
pub fn dither<R: Rng + ?Sized>(d: &mut [f32], amount: f32, rng: &mut R) {
    if amount == 0.0 {
        return;
    }
    for v in d.iter_mut() {
        *v += amount * rand_gauss(rng);
    }
}

/// Copy frame `frame` out of the retained waveform and condition it.
///
/// `wave` holds samples `[sample_offset, sample_offset + wave.len())` of the
/// stream. `window` is resized to the padded window size and its tail past
/// the frame length is zeroed. Without snip-edges, indices outside `wave`
/// are mirrored back inside it.
///
/// Returns the pre-window log energy when `capture_log_energy` is set.
#[allow(clippy::too_many_arguments)]
pub fn extract_window<R: Rng + ?Sized>(
    sample_offset: i64,
    wave: &[f32],
    frame: usize,
    opts: &FrameExtractionOptions,
    window_function: &FeatureWindowFunction,
    window: &mut alloc::vec::Vec<f32>,
    capture_log_energy: bool,
    rng: &mut R,
) -> Result<Option<f32>, FbankError> {
    let frame_length = opts.window_size();
    let frame_length_padded = opts.padded_window_size();
    let num_samples = sample_offset + wave.len() as i64;
    let start_sample = first_sample_of_frame(frame, opts);
    let end_sample = start_sample + frame_length as i64;

    let out_of_range = FbankError::InvalidFrameRange {
        frame,
        start: start_sample,
        end: end_sample,
    };
    if sample_offset < 0 || wave.is_empty() {
        return Err(out_of_range);
    }
    if opts.snip_edges {
        if start_sample < sample_offset || end_sample > num_samples {
            return Err(out_of_range);
        }
    } else if sample_offset != 0 && start_sample < sample_offset {
        return Err(out_of_range);
    }

    window.clear();
    window.resize(frame_length_padded, 0.0);

    let wave_start = start_sample - sample_offset;
    let wave_end = wave_start + frame_length as i64;
    if wave_start >= 0 && wave_end <= wave.len() as i64 {
        let ws = wave_start as usize;
        window[..frame_length].copy_from_slice(&wave[ws..ws + frame_length]);
    } else {
        let wave_dim = wave.len() as i64;
        for (s, out) in window[..frame_length].iter_mut().enumerate() {
            let mut idx = s as i64 + wave_start;
            while idx < 0 || idx >= wave_dim {
                if idx < 0 {
                    idx = -idx - 1;
                } else {
                    idx = 2 * wave_dim - 1 - idx;
                }
            }
            *out = wave[idx as usize];
        }
    }

    Ok(process_window(
        opts,
        window_function,
        &mut window[..frame_length],
        capture_log_energy,
        rng,
    ))
}

/// Dither, DC removal, optional energy capture, pre-emphasis and windowing
/// of one raw frame of exactly `window_size()` samples.
pub fn process_window<R: Rng + ?Sized>(
    opts: &FrameExtractionOptions,
    window_function: &FeatureWindowFunction,
    frame: &mut [f32],
    capture_log_energy: bool,
    rng: &mut R,
) -> Option<f32> {
    dither(frame, opts.dither, rng);
    if opts.remove_dc_offset {
        remove_dc_offset(frame);
    }
    let energy = capture_log_energy.then(|| log_energy(frame));
    preemphasize(frame, opts.preemph_coeff);
    window_function.apply(frame);
    energy
}
