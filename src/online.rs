//! Incremental feature extraction over a waveform delivered in chunks.
//!
//! [`OnlineFeature`] keeps only the tail of the waveform that future frames
//! still need. Every call to [`OnlineFeature::accept_waveform`] appends the
//! new samples, computes exactly the frames that became ready, and discards
//! samples that no later frame can reach. Feeding the same audio in one
//! chunk or in many produces the same frames.
//!
//! # Example
//! ```
//! use melstream::fbank::FbankOptions;
//! use melstream::online::OnlineFbank;
//!
//! let mut opts = FbankOptions::default();
//! opts.frame_opts.dither = 0.0;
//! let mut fbank = OnlineFbank::new(opts).unwrap();
//! fbank.accept_waveform(16000.0, &vec![0.0; 16000]).unwrap();
//! fbank.input_finished().unwrap();
//! assert_eq!(fbank.num_frames_ready(), 98);
//! assert_eq!(fbank.get_frame(0).unwrap().len(), 23);
//! ```

use alloc::vec;
use alloc::vec::Vec;

use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::error::FbankError;
use crate::fbank::{FbankComputer, FbankOptions, FeatureComputer};
use crate::frame::{extract_window, first_sample_of_frame, num_frames};
use crate::recycling::RecyclingVector;
use crate::window::FeatureWindowFunction;

/// Streaming extraction must retain more than this many vectors.
pub const MIN_RETAINED_FEATURE_VECTORS: usize = 200;

/// The streaming path never applies VTLN.
const ONLINE_VTLN_WARP: f32 = 1.0;

/// Streaming controller generic over the per-frame computer.
pub struct OnlineFeature<C: FeatureComputer> {
    computer: C,
    window_function: FeatureWindowFunction,
    features: RecyclingVector,
    input_finished: bool,
    /// Absolute index of `waveform_remainder[0]`.
    waveform_offset: i64,
    waveform_remainder: Vec<f32>,
    window: Vec<f32>,
    rng: SmallRng,
}

/// Streaming Fbank extractor.
pub type OnlineFbank = OnlineFeature<FbankComputer>;

impl OnlineFeature<FbankComputer> {
    pub fn new(opts: FbankOptions) -> Result<Self, FbankError> {
        Self::with_computer(FbankComputer::new(opts)?)
    }
}

impl<C: FeatureComputer> OnlineFeature<C> {
    pub fn with_computer(computer: C) -> Result<Self, FbankError> {
        let frame_opts = *computer.frame_options();
        frame_opts.validate()?;
        if frame_opts.max_feature_vectors <= MIN_RETAINED_FEATURE_VECTORS {
            return Err(FbankError::TooFewFeatureVectors(
                frame_opts.max_feature_vectors,
            ));
        }
        let window_function = FeatureWindowFunction::new(&frame_opts)?;
        Ok(Self {
            computer,
            window_function,
            features: RecyclingVector::new(frame_opts.max_feature_vectors),
            input_finished: false,
            waveform_offset: 0,
            waveform_remainder: Vec::new(),
            window: Vec::with_capacity(frame_opts.padded_window_size()),
            rng: SmallRng::seed_from_u64(frame_opts.dither_seed),
        })
    }

    pub fn computer(&self) -> &C {
        &self.computer
    }

    pub fn dim(&self) -> usize {
        self.computer.dim()
    }

    pub fn frame_shift_in_seconds(&self) -> f32 {
        self.computer.frame_options().frame_shift_ms / 1000.0
    }

    /// Total number of frames produced so far, including evicted ones.
    pub fn num_frames_ready(&self) -> usize {
        self.features.size()
    }

    pub fn is_input_finished(&self) -> bool {
        self.input_finished
    }

    pub fn is_last_frame(&self, frame: usize) -> bool {
        self.input_finished && self.num_frames_ready().checked_sub(1) == Some(frame)
    }

    pub fn get_frame(&self, frame: usize) -> Result<&[f32], FbankError> {
        self.features.at(frame)
    }

    /// Index of the oldest frame still retained.
    pub fn first_available_frame(&self) -> usize {
        self.features.first_available_index()
    }

    /// Release the `n` oldest retained frames.
    pub fn pop(&mut self, n: usize) {
        self.features.pop(n);
    }

    /// Number of samples currently buffered for future frames.
    pub fn buffered_samples(&self) -> usize {
        self.waveform_remainder.len()
    }

    pub fn accept_waveform(&mut self, sampling_rate: f32, waveform: &[f32]) -> Result<(), FbankError> {
        if self.input_finished {
            return Err(FbankError::InputAfterFinished);
        }
        let expected = self.computer.frame_options().samp_freq;
        if sampling_rate != expected {
            return Err(FbankError::SampleRateMismatch {
                expected,
                actual: sampling_rate,
            });
        }
        if waveform.is_empty() {
            return Ok(());
        }
        self.waveform_remainder.extend_from_slice(waveform);
        self.compute_features()
    }

    /// Mark the end of input and flush any frames withheld for lookahead.
    ///
    /// Fails with [`FbankError::InputAfterFinished`] if input already ended.
    pub fn input_finished(&mut self) -> Result<(), FbankError> {
        if self.input_finished {
            return Err(FbankError::InputAfterFinished);
        }
        self.input_finished = true;
        self.compute_features()
    }

    fn compute_features(&mut self) -> Result<(), FbankError> {
        let frame_opts = *self.computer.frame_options();
        let num_samples_total = self.waveform_offset + self.waveform_remainder.len() as i64;
        let num_frames_old = self.features.size();
        let num_frames_new = num_frames(num_samples_total, &frame_opts, self.input_finished);
        if num_frames_new < num_frames_old {
            return Err(FbankError::FrameCountRegressed {
                old: num_frames_old,
                new: num_frames_new,
            });
        }
        let need_raw_log_energy = self.computer.need_raw_log_energy();
        let dim = self.computer.dim();
        for frame in num_frames_old..num_frames_new {
            let raw_log_energy = extract_window(
                self.waveform_offset,
                &self.waveform_remainder,
                frame,
                &frame_opts,
                &self.window_function,
                &mut self.window,
                need_raw_log_energy,
                &mut self.rng,
            )?;
            let mut feature = vec![0.0f32; dim];
            self.computer
                .compute(raw_log_energy, ONLINE_VTLN_WARP, &mut self.window, &mut feature)?;
            self.features.push_back(feature);
        }
        if num_frames_new > num_frames_old {
            debug_log!(
                "computed frames {}..{} from {} samples",
                num_frames_old,
                num_frames_new,
                num_samples_total
            );
        }

        let first_sample_of_next_frame = first_sample_of_frame(num_frames_new, &frame_opts);
        let samples_to_discard = first_sample_of_next_frame - self.waveform_offset;
        if samples_to_discard > 0 {
            let samples_to_discard = samples_to_discard as usize;
            if samples_to_discard >= self.waveform_remainder.len() {
                self.waveform_offset += self.waveform_remainder.len() as i64;
                self.waveform_remainder.clear();
            } else {
                self.waveform_remainder.drain(..samples_to_discard);
                self.waveform_offset += samples_to_discard as i64;
            }
            debug_log!(
                "discarded waveform up to sample {}, {} buffered",
                self.waveform_offset,
                self.waveform_remainder.len()
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameExtractionOptions;

    fn quiet_opts() -> FbankOptions {
        FbankOptions {
            frame_opts: FrameExtractionOptions {
                dither: 0.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn rejects_small_history() {
        let mut opts = quiet_opts();
        opts.frame_opts.max_feature_vectors = 200;
        assert_eq!(
            OnlineFbank::new(opts).err(),
            Some(FbankError::TooFewFeatureVectors(200))
        );
    }

    #[test]
    fn remainder_stays_bounded() {
        let mut fbank = OnlineFbank::new(quiet_opts()).unwrap();
        for _ in 0..50 {
            fbank.accept_waveform(16000.0, &[0.1; 1000]).unwrap();
            assert!(fbank.buffered_samples() < 400 + 160);
        }
        assert_eq!(fbank.num_frames_ready(), 1 + (50_000 - 400) / 160);
    }

    #[test]
    fn finish_is_terminal() {
        let mut fbank = OnlineFbank::new(quiet_opts()).unwrap();
        fbank.accept_waveform(16000.0, &[0.0; 800]).unwrap();
        assert!(!fbank.is_last_frame(2));
        fbank.input_finished().unwrap();
        assert!(fbank.is_last_frame(2));
        assert!(!fbank.is_last_frame(1));
        assert_eq!(
            fbank.accept_waveform(16000.0, &[0.0; 10]),
            Err(FbankError::InputAfterFinished)
        );
        assert_eq!(fbank.input_finished(), Err(FbankError::InputAfterFinished));
        assert_eq!(fbank.num_frames_ready(), 3);
    }

    #[test]
    fn last_frame_query_accepts_any_index() {
        let mut fbank = OnlineFbank::new(quiet_opts()).unwrap();
        fbank.input_finished().unwrap();
        assert!(!fbank.is_last_frame(0));
        assert!(!fbank.is_last_frame(usize::MAX));

        let mut fbank = OnlineFbank::new(quiet_opts()).unwrap();
        fbank.accept_waveform(16000.0, &[0.0; 400]).unwrap();
        fbank.input_finished().unwrap();
        assert!(fbank.is_last_frame(0));
        assert!(!fbank.is_last_frame(usize::MAX));
    }
}
