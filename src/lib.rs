//! # melstream - streaming log Mel-filterbank features
//!
//! Computes Kaldi-compatible Fbank features from audio that arrives in
//! arbitrary chunks. Chunking never changes the output: feeding a waveform
//! in one call or in a thousand yields the same frames.
//!
//! ## Pipeline
//!
//! Each frame goes through the same stages:
//!
//! 1. [`frame`] cuts the waveform into overlapping frames and conditions each
//!    one (dither, DC removal, pre-emphasis, analysis [`window`]).
//! 2. [`rfft`] turns the zero-padded frame into a power spectrum.
//! 3. [`mel`] integrates the spectrum with triangular Mel filters.
//! 4. [`fbank`] log-compresses the result and optionally adds log energy.
//!
//! [`online::OnlineFeature`] drives the pipeline incrementally, retaining a
//! bounded history of frames ([`recycling`]). [`offline::OfflineFbank`]
//! computes a whole utterance at once, and with the `std` feature
//! [`sync::SharedOnlineFbank`] wraps the streaming extractor for use from
//! several threads.
//!
//! ## Cargo Features
//!
//! - `std` (default): `std::error::Error` impls and the thread-safe facade
//! - `serde`: `Serialize`/`Deserialize` for every options struct
//! - `verbose-logging`: emit `log::debug!` records from the pipeline
//!
//! ## Example
//! ```
//! use melstream::{FbankOptions, OnlineFbank};
//!
//! let mut opts = FbankOptions::default();
//! opts.frame_opts.dither = 0.0;
//! opts.use_energy = true;
//! let mut fbank = OnlineFbank::new(opts).unwrap();
//! for chunk in vec![0.01f32; 4000].chunks(333) {
//!     fbank.accept_waveform(16000.0, chunk).unwrap();
//! }
//! fbank.input_finished().unwrap();
//! assert_eq!(fbank.dim(), 24);
//! assert_eq!(fbank.num_frames_ready(), 23);
//! ```

#![no_std]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(feature = "verbose-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "verbose-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}

pub mod error;
pub mod num;

/// Analysis window shapes and the per-frame window function.
pub mod window;

/// Frame segmentation and waveform conditioning.
pub mod frame;

pub mod rfft;

/// Triangular Mel filterbanks with optional VTLN warping.
pub mod mel;

pub mod fbank;
pub mod recycling;
pub mod online;

/// Whole-utterance extraction with per-utterance VTLN.
pub mod offline;

#[cfg(feature = "std")]
pub mod sync;

pub use error::FbankError;
pub use fbank::{FbankComputer, FbankOptions, FeatureComputer};
pub use frame::FrameExtractionOptions;
pub use mel::{MelBanks, MelBanksOptions};
pub use offline::OfflineFbank;
pub use online::{OnlineFbank, OnlineFeature};
#[cfg(feature = "std")]
pub use sync::SharedOnlineFbank;
pub use window::WindowType;
