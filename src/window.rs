//! Analysis windows applied to each extracted frame.

use alloc::string::ToString;
use alloc::vec::Vec;
use core::f64::consts::PI;
use core::fmt;
use core::str::FromStr;

use libm::{cos, pow, sin};

use crate::error::FbankError;
use crate::frame::FrameExtractionOptions;

/// Exponent applied to the Hann shape to form the Povey window.
const POVEY_EXPONENT: f64 = 0.85;

/// Supported analysis window shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WindowType {
    Hamming,
    Hanning,
    /// Hann raised to the power 0.85; like Hamming but reaching zero at the edges.
    #[default]
    Povey,
    Rectangular,
    Blackman,
    Sine,
}

impl WindowType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowType::Hamming => "hamming",
            WindowType::Hanning => "hanning",
            WindowType::Povey => "povey",
            WindowType::Rectangular => "rectangular",
            WindowType::Blackman => "blackman",
            WindowType::Sine => "sine",
        }
    }
}

impl fmt::Display for WindowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WindowType {
    type Err = FbankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hamming" => Ok(WindowType::Hamming),
            "hanning" => Ok(WindowType::Hanning),
            "povey" => Ok(WindowType::Povey),
            "rectangular" => Ok(WindowType::Rectangular),
            "blackman" => Ok(WindowType::Blackman),
            "sine" => Ok(WindowType::Sine),
            other => Err(FbankError::UnknownWindowType(other.to_string())),
        }
    }
}

/// Coefficient `n` of a window of length `len`.
///
/// A single-sample window has no defined shape, so it is `1.0` for every
/// type instead of dividing by zero.
pub fn coefficient(window_type: WindowType, n: usize, len: usize, blackman_coeff: f32) -> f32 {
    if len == 1 {
        return 1.0;
    }
    let a = 2.0 * PI / (len - 1) as f64;
    let x = a * n as f64;
    let v = match window_type {
        WindowType::Hanning => 0.5 - 0.5 * cos(x),
        WindowType::Sine => sin(0.5 * x),
        WindowType::Hamming => 0.54 - 0.46 * cos(x),
        WindowType::Povey => pow(0.5 - 0.5 * cos(x), POVEY_EXPONENT),
        WindowType::Rectangular => 1.0,
        WindowType::Blackman => {
            let b = blackman_coeff as f64;
            b - 0.5 * cos(x) + (0.5 - b) * cos(2.0 * x)
        }
    };
    v as f32
}

/// Generate `len` coefficients of the given window.
pub fn generate(window_type: WindowType, len: usize, blackman_coeff: f32) -> Vec<f32> {
    (0..len)
        .map(|n| coefficient(window_type, n, len, blackman_coeff))
        .collect()
}

/// Precomputed window for a fixed frame length.
#[derive(Clone, Debug)]
pub struct FeatureWindowFunction {
    window: Vec<f32>,
}

impl FeatureWindowFunction {
    pub fn new(opts: &FrameExtractionOptions) -> Result<Self, FbankError> {
        let frame_length = opts.window_size();
        if frame_length == 0 {
            return Err(FbankError::InvalidWindowLength);
        }
        Ok(Self {
            window: generate(opts.window_type, frame_length, opts.blackman_coeff),
        })
    }

    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn coefficients(&self) -> &[f32] {
        &self.window
    }

    /// Multiply the first `len()` samples of `wave` by the window in place.
    pub fn apply(&self, wave: &mut [f32]) {
        for (s, w) in wave.iter_mut().zip(self.window.iter()) {
            *s *= *w;
        }
    }
}
