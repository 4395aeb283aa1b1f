//! Error type shared by every stage of the feature pipeline.

use alloc::string::String;
use core::fmt;

/// Errors raised while configuring or running the Fbank pipeline.
///
/// Configuration variants are produced once, by constructors and
/// `validate()` calls. Runtime variants are produced per call and leave the
/// failing instance in an unspecified state; callers should discard it.
#[derive(Debug, Clone, PartialEq)]
pub enum FbankError {
    /// The frame length in samples rounded down to zero.
    InvalidWindowLength,
    /// The frame shift in samples rounded down to zero.
    InvalidWindowShift,
    /// The sample frequency was non-positive or non-finite.
    InvalidSampleFrequency(f32),
    /// A window name that is not one of the supported window types.
    UnknownWindowType(String),
    /// The pre-emphasis coefficient was outside `[0, 1]`.
    InvalidPreemphCoeff(f32),
    /// The dither amount was negative or non-finite.
    InvalidDither(f32),
    /// The padded window length must be even to split into FFT bins.
    OddPaddedWindow(usize),
    /// The real FFT only supports power-of-two lengths of at least two.
    NonPowerOfTwoLength(usize),
    /// Fewer than three Mel bins were requested.
    TooFewMelBins(usize),
    /// Low/high Mel-bank bounds were inconsistent with the Nyquist frequency.
    InvalidFrequencyRange { low: f32, high: f32, nyquist: f32 },
    /// VTLN cutoffs must lie strictly inside `(low, high)` when warping.
    InvalidVtlnRange {
        vtln_low: f32,
        vtln_high: f32,
        low: f32,
        high: f32,
    },
    /// A Mel bin covered no FFT bin; usually too many Mel bins.
    EmptyMelBin(usize),
    /// Streaming extraction requires more than 200 retained vectors.
    TooFewFeatureVectors(usize),
    /// A chunk was declared at a different rate from the configured one.
    SampleRateMismatch { expected: f32, actual: f32 },
    /// Audio or another end-of-input arrived after `input_finished` was called.
    InputAfterFinished,
    /// A frame buffer did not have the expected length.
    FrameSizeMismatch { expected: usize, actual: usize },
    /// The number of ready frames went backwards.
    FrameCountRegressed { old: usize, new: usize },
    /// The requested frame was already evicted from history.
    FrameEvicted { index: usize, first_available: usize },
    /// The requested frame has not been produced yet.
    FrameNotReady { index: usize, ready: usize },
    /// The frame's sample span is not addressable from the retained waveform.
    InvalidFrameRange { frame: usize, start: i64, end: i64 },
    /// A Mel energy evaluated to NaN.
    NanEnergy { bin: usize },
    /// Energy output was enabled but no raw log-energy was supplied.
    MissingLogEnergy,
}

impl fmt::Display for FbankError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FbankError::InvalidWindowLength => {
                write!(f, "frame length must be at least one sample")
            }
            FbankError::InvalidWindowShift => {
                write!(f, "frame shift must be at least one sample")
            }
            FbankError::InvalidSampleFrequency(v) => {
                write!(f, "sample frequency must be finite and positive, got {v}")
            }
            FbankError::UnknownWindowType(name) => write!(f, "invalid window type {name}"),
            FbankError::InvalidPreemphCoeff(v) => {
                write!(f, "pre-emphasis coefficient must be in [0, 1], got {v}")
            }
            FbankError::InvalidDither(v) => {
                write!(f, "dither must be finite and non-negative, got {v}")
            }
            FbankError::OddPaddedWindow(n) => {
                write!(f, "padded window length must be even, got {n}")
            }
            FbankError::NonPowerOfTwoLength(n) => {
                write!(f, "real FFT length must be a power of two >= 2, got {n}")
            }
            FbankError::TooFewMelBins(n) => write!(f, "must have at least 3 mel bins, got {n}"),
            FbankError::InvalidFrequencyRange { low, high, nyquist } => write!(
                f,
                "bad values in options: low-freq {low} and high-freq {high} vs. nyquist {nyquist}"
            ),
            FbankError::InvalidVtlnRange {
                vtln_low,
                vtln_high,
                low,
                high,
            } => write!(
                f,
                "bad values in options: vtln-low {vtln_low} and vtln-high {vtln_high}, versus low-freq {low} and high-freq {high}"
            ),
            FbankError::EmptyMelBin(bin) => {
                write!(f, "mel bin {bin} is empty; num_bins may be too large")
            }
            FbankError::TooFewFeatureVectors(n) => write!(
                f,
                "online feature extraction requires more than 200 max feature vectors, got {n}"
            ),
            FbankError::SampleRateMismatch { expected, actual } => {
                write!(f, "sampling rate mismatch: expected {expected}, got {actual}")
            }
            FbankError::InputAfterFinished => {
                write!(f, "input already finished; no further input is accepted")
            }
            FbankError::FrameSizeMismatch { expected, actual } => {
                write!(f, "invalid frame size: expected {expected}, got {actual}")
            }
            FbankError::FrameCountRegressed { old, new } => write!(
                f,
                "number of ready frames went from {old} down to {new}"
            ),
            FbankError::FrameEvicted {
                index,
                first_available,
            } => write!(
                f,
                "feature vector {index} was already removed (first available is {first_available})"
            ),
            FbankError::FrameNotReady { index, ready } => {
                write!(f, "feature vector {index} is not ready ({ready} frames ready)")
            }
            FbankError::InvalidFrameRange { frame, start, end } => write!(
                f,
                "frame {frame} spans samples [{start}, {end}) which are not available"
            ),
            FbankError::NanEnergy { bin } => write!(f, "energy is NaN at bin {bin}"),
            FbankError::MissingLogEnergy => {
                write!(f, "energy output requested but no raw log-energy was supplied")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FbankError {}
