//! Mel filterbank layout, VTLN warping and validation.

use melstream::mel::{mel_scale, vtln_warp_freq, MelBanks, MelBanksOptions};
use melstream::{FbankError, FrameExtractionOptions};

fn frame_opts() -> FrameExtractionOptions {
    FrameExtractionOptions::default()
}

#[test]
fn bins_are_evenly_spaced_on_mel_scale() {
    let banks = MelBanks::new(&MelBanksOptions::default(), &frame_opts(), 1.0).unwrap();
    let mels: Vec<f32> = banks.center_freqs().iter().map(|&f| mel_scale(f)).collect();
    let delta = mels[1] - mels[0];
    for w in mels.windows(2) {
        assert!(((w[1] - w[0]) - delta).abs() < 1e-2);
    }
}

#[test]
fn every_bin_peaks_near_one() {
    let banks = MelBanks::new(&MelBanksOptions::default(), &frame_opts(), 1.0).unwrap();
    for bin in banks.bins() {
        let peak = bin.weights.iter().cloned().fold(0.0f32, f32::max);
        assert!(peak > 0.5 && peak <= 1.0);
    }
}

#[test]
fn htk_mode_zeroes_first_weight_and_floors_energy() {
    let opts = MelBanksOptions {
        htk_mode: true,
        ..Default::default()
    };
    let banks = MelBanks::new(&opts, &frame_opts(), 1.0).unwrap();
    assert_eq!(banks.bins()[0].weights[0], 0.0);
    let power = vec![0.0f32; 257];
    let mut out = vec![0.0f32; 23];
    banks.compute(&power, &mut out).unwrap();
    assert!(out.iter().all(|&e| e == 1.0));
}

#[test]
fn integrates_with_weights() {
    let banks = MelBanks::new(&MelBanksOptions::default(), &frame_opts(), 1.0).unwrap();
    let power = vec![1.0f32; 257];
    let mut out = vec![0.0f32; 23];
    banks.compute(&power, &mut out).unwrap();
    for (bin, e) in banks.bins().iter().zip(out.iter()) {
        let sum: f32 = bin.weights.iter().sum();
        assert!((sum - e).abs() < 1e-4);
    }
}

#[test]
fn warping_moves_centres() {
    let plain = MelBanks::new(&MelBanksOptions::default(), &frame_opts(), 1.0).unwrap();
    let warped = MelBanks::new(&MelBanksOptions::default(), &frame_opts(), 1.1).unwrap();
    assert_ne!(plain.center_freqs(), warped.center_freqs());
    assert_eq!(warped.num_bins(), 23);
}

#[test]
fn warp_is_identity_outside_band_and_continuous() {
    let (vl, vh, lo, hi) = (100.0, 7500.0, 20.0, 8000.0);
    for warp in [0.85f32, 1.0, 1.15] {
        assert_eq!(vtln_warp_freq(vl, vh, lo, hi, warp, 10.0), 10.0);
        assert_eq!(vtln_warp_freq(vl, vh, lo, hi, warp, 8100.0), 8100.0);
        assert!((vtln_warp_freq(vl, vh, lo, hi, warp, lo) - lo).abs() < 1e-3);
        assert!((vtln_warp_freq(vl, vh, lo, hi, warp, hi) - hi).abs() < 1e-2);
    }
    // inside the cutoffs the band is scaled by 1 / warp
    let f = vtln_warp_freq(vl, vh, lo, hi, 0.9, 1000.0);
    assert!((f - 1000.0 / 0.9).abs() < 1e-2);
}

#[test]
fn rejects_bad_frequency_range() {
    let opts = MelBanksOptions {
        low_freq: 9000.0,
        ..Default::default()
    };
    assert!(matches!(
        MelBanks::new(&opts, &frame_opts(), 1.0),
        Err(FbankError::InvalidFrequencyRange { .. })
    ));
    let opts = MelBanksOptions {
        high_freq: -8000.0,
        ..Default::default()
    };
    assert!(matches!(
        MelBanks::new(&opts, &frame_opts(), 1.0),
        Err(FbankError::InvalidFrequencyRange { .. })
    ));
}

/// VTLN cutoffs are only checked when a warp is actually applied.
#[test]
fn vtln_range_checked_only_when_warping() {
    let opts = MelBanksOptions {
        vtln_low: 10.0,
        ..Default::default()
    };
    assert!(MelBanks::new(&opts, &frame_opts(), 1.0).is_ok());
    assert!(matches!(
        MelBanks::new(&opts, &frame_opts(), 0.9),
        Err(FbankError::InvalidVtlnRange { .. })
    ));
}

#[test]
fn too_many_bins_leave_one_empty() {
    let opts = MelBanksOptions {
        num_bins: 200,
        ..Default::default()
    };
    assert!(matches!(
        MelBanks::new(&opts, &frame_opts(), 1.0),
        Err(FbankError::EmptyMelBin(_))
    ));
}
