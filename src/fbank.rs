//! Per-frame Mel-filterbank (Fbank) computation.

use hashbrown::hash_map::Entry;
use hashbrown::HashMap;
use libm::logf;

use crate::error::FbankError;
use crate::frame::{log_energy, FrameExtractionOptions};
use crate::mel::{MelBanks, MelBanksOptions};
use crate::rfft::{compute_power_spectrum, power_to_magnitude, Rfft};

/// Options for the Fbank feature computer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FbankOptions {
    pub frame_opts: FrameExtractionOptions,
    pub mel_opts: MelBanksOptions,
    /// Append a log-energy coefficient to every feature vector.
    pub use_energy: bool,
    /// Floor on the energy coefficient (absolute, not log); `0` disables.
    pub energy_floor: f32,
    /// Measure energy before pre-emphasis and windowing rather than after.
    pub raw_energy: bool,
    /// Put the energy last instead of first.
    pub htk_compat: bool,
    /// Log-compress the Mel energies.
    pub use_log_fbank: bool,
    /// Integrate the power spectrum rather than the magnitude spectrum.
    pub use_power: bool,
}

impl Default for FbankOptions {
    fn default() -> Self {
        Self {
            frame_opts: FrameExtractionOptions::default(),
            mel_opts: MelBanksOptions::default(),
            use_energy: false,
            energy_floor: 0.0,
            raw_energy: true,
            htk_compat: false,
            use_log_fbank: true,
            use_power: true,
        }
    }
}

impl FbankOptions {
    pub fn validate(&self) -> Result<(), FbankError> {
        self.frame_opts.validate()?;
        self.mel_opts.validate()
    }

    /// Length of each output feature vector.
    pub fn dim(&self) -> usize {
        self.mel_opts.num_bins + usize::from(self.use_energy)
    }
}

/// The seam between the streaming controller and a per-frame transform.
pub trait FeatureComputer {
    fn frame_options(&self) -> &FrameExtractionOptions;

    fn dim(&self) -> usize;

    /// Whether the controller must capture log energy before windowing.
    fn need_raw_log_energy(&self) -> bool;

    /// Turn one windowed, zero-padded frame into a feature vector.
    ///
    /// `signal_frame` is consumed as FFT scratch and must have the padded
    /// window length; `feature` must have length [`FeatureComputer::dim`].
    fn compute(
        &mut self,
        raw_log_energy: Option<f32>,
        vtln_warp: f32,
        signal_frame: &mut [f32],
        feature: &mut [f32],
    ) -> Result<(), FbankError>;
}

/// Computes Fbank features for individual frames.
///
/// Mel banks are cached per VTLN warp factor; the bank for warp `1.0` is
/// built on construction so configuration errors surface immediately.
pub struct FbankComputer {
    opts: FbankOptions,
    log_energy_floor: f32,
    mel_banks: HashMap<u32, MelBanks>,
    rfft: Rfft,
}

impl FbankComputer {
    pub fn new(opts: FbankOptions) -> Result<Self, FbankError> {
        opts.validate()?;
        let rfft = Rfft::new(opts.frame_opts.padded_window_size())?;
        let log_energy_floor = if opts.energy_floor > 0.0 {
            logf(opts.energy_floor)
        } else {
            0.0
        };
        let mut computer = Self {
            opts,
            log_energy_floor,
            mel_banks: HashMap::new(),
            rfft,
        };
        computer.mel_banks(1.0)?;
        Ok(computer)
    }

    pub fn options(&self) -> &FbankOptions {
        &self.opts
    }

    /// Number of distinct warp factors with a cached bank.
    pub fn cached_banks(&self) -> usize {
        self.mel_banks.len()
    }

    /// The bank for `vtln_warp`, if one has been built.
    pub fn cached_mel_banks(&self, vtln_warp: f32) -> Option<&MelBanks> {
        self.mel_banks.get(&vtln_warp.to_bits())
    }

    /// Fetch the bank for `vtln_warp`, building it on first use.
    pub fn mel_banks(&mut self, vtln_warp: f32) -> Result<&MelBanks, FbankError> {
        get_or_build_banks(&mut self.mel_banks, &self.opts, vtln_warp)
    }
}

fn get_or_build_banks<'a>(
    cache: &'a mut HashMap<u32, MelBanks>,
    opts: &FbankOptions,
    vtln_warp: f32,
) -> Result<&'a MelBanks, FbankError> {
    match cache.entry(vtln_warp.to_bits()) {
        Entry::Occupied(e) => Ok(e.into_mut()),
        Entry::Vacant(v) => {
            let banks = MelBanks::new(&opts.mel_opts, &opts.frame_opts, vtln_warp)?;
            debug_log!("built mel banks for vtln warp {}", vtln_warp);
            Ok(v.insert(banks))
        }
    }
}

impl FeatureComputer for FbankComputer {
    fn frame_options(&self) -> &FrameExtractionOptions {
        &self.opts.frame_opts
    }

    fn dim(&self) -> usize {
        self.opts.dim()
    }

    fn need_raw_log_energy(&self) -> bool {
        self.opts.use_energy && self.opts.raw_energy
    }

    fn compute(
        &mut self,
        raw_log_energy: Option<f32>,
        vtln_warp: f32,
        signal_frame: &mut [f32],
        feature: &mut [f32],
    ) -> Result<(), FbankError> {
        let padded = self.opts.frame_opts.padded_window_size();
        if signal_frame.len() != padded {
            return Err(FbankError::FrameSizeMismatch {
                expected: padded,
                actual: signal_frame.len(),
            });
        }
        let dim = self.opts.dim();
        if feature.len() != dim {
            return Err(FbankError::FrameSizeMismatch {
                expected: dim,
                actual: feature.len(),
            });
        }

        let mut energy = raw_log_energy;
        if self.opts.use_energy && !self.opts.raw_energy {
            energy = Some(log_energy(signal_frame));
        }

        self.rfft.compute(signal_frame)?;
        compute_power_spectrum(signal_frame);
        if !self.opts.use_power {
            power_to_magnitude(signal_frame);
        }

        let num_bins = self.opts.mel_opts.num_bins;
        let mel_offset = usize::from(self.opts.use_energy && !self.opts.htk_compat);
        let banks = get_or_build_banks(&mut self.mel_banks, &self.opts, vtln_warp)?;
        let mel_energies = &mut feature[mel_offset..mel_offset + num_bins];
        banks.compute(&signal_frame[..padded / 2 + 1], mel_energies)?;
        if self.opts.use_log_fbank {
            for e in mel_energies.iter_mut() {
                *e = logf(e.max(f32::EPSILON));
            }
        }

        if self.opts.use_energy {
            let mut e = energy.ok_or(FbankError::MissingLogEnergy)?;
            if self.opts.energy_floor > 0.0 && e < self.log_energy_floor {
                e = self.log_energy_floor;
            }
            let energy_index = if self.opts.htk_compat { num_bins } else { 0 };
            feature[energy_index] = e;
        }
        Ok(())
    }
}
