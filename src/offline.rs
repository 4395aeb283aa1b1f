//! Whole-utterance Fbank extraction with a per-call VTLN warp factor.

use alloc::vec;
use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::error::FbankError;
use crate::fbank::{FbankComputer, FbankOptions, FeatureComputer};
use crate::frame::{extract_window, num_frames};
use crate::window::FeatureWindowFunction;

/// Computes Fbank features for a complete utterance in one call.
///
/// Unlike the streaming extractor, every call may use its own VTLN warp
/// factor. The dither generator is reseeded per call, so at warp `1.0` the
/// output equals what [`crate::OnlineFbank`] produces for the same waveform
/// followed by `input_finished`.
pub struct OfflineFbank {
    computer: FbankComputer,
    window_function: FeatureWindowFunction,
    window: Vec<f32>,
}

impl OfflineFbank {
    pub fn new(opts: FbankOptions) -> Result<Self, FbankError> {
        let computer = FbankComputer::new(opts)?;
        let window_function = FeatureWindowFunction::new(&opts.frame_opts)?;
        Ok(Self {
            computer,
            window_function,
            window: Vec::with_capacity(opts.frame_opts.padded_window_size()),
        })
    }

    pub fn options(&self) -> &FbankOptions {
        self.computer.options()
    }

    pub fn dim(&self) -> usize {
        self.computer.dim()
    }

    /// Number of frames `compute` yields for `num_samples` samples.
    pub fn num_frames(&self, num_samples: usize) -> usize {
        num_frames(num_samples as i64, self.computer.frame_options(), true)
    }

    pub fn compute(
        &mut self,
        sample_rate: f32,
        wave: &[f32],
        vtln_warp: f32,
    ) -> Result<Vec<Vec<f32>>, FbankError> {
        let frame_opts = *self.computer.frame_options();
        if sample_rate != frame_opts.samp_freq {
            return Err(FbankError::SampleRateMismatch {
                expected: frame_opts.samp_freq,
                actual: sample_rate,
            });
        }
        let rows = self.num_frames(wave.len());
        let need_raw_log_energy = self.computer.need_raw_log_energy();
        let dim = self.computer.dim();
        let mut rng = SmallRng::seed_from_u64(frame_opts.dither_seed);
        let mut features = Vec::with_capacity(rows);
        for frame in 0..rows {
            let raw_log_energy = extract_window(
                0,
                wave,
                frame,
                &frame_opts,
                &self.window_function,
                &mut self.window,
                need_raw_log_energy,
                &mut rng,
            )?;
            let mut feature = vec![0.0f32; dim];
            self.computer
                .compute(raw_log_energy, vtln_warp, &mut self.window, &mut feature)?;
            features.push(feature);
        }
        debug_log!(
            "computed {} frames from {} samples at vtln warp {}",
            rows,
            wave.len(),
            vtln_warp
        );
        Ok(features)
    }
}
