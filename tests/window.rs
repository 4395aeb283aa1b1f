//! Analysis window shapes at their edges and centre.

use melstream::window::{coefficient, generate, FeatureWindowFunction};
use melstream::{FbankError, FrameExtractionOptions, WindowType};

const EPSILON: f32 = 1e-6;

#[test]
fn first_coefficient_per_window_type() {
    let expected = [
        (WindowType::Hanning, 0.0),
        (WindowType::Hamming, 0.08),
        (WindowType::Povey, 0.0),
        (WindowType::Rectangular, 1.0),
        (WindowType::Sine, 0.0),
        (WindowType::Blackman, 0.0),
    ];
    for (window_type, value) in expected {
        let c = coefficient(window_type, 0, 400, 0.42);
        assert!((c - value).abs() < EPSILON, "{window_type}: {c}");
    }
}

/// Every shape except the rectangle peaks at 1.0 in the middle of an odd window.
#[test]
fn centre_coefficient_is_one() {
    for window_type in [
        WindowType::Hanning,
        WindowType::Hamming,
        WindowType::Povey,
        WindowType::Sine,
        WindowType::Blackman,
    ] {
        let w = generate(window_type, 401, 0.42);
        assert!((w[200] - 1.0).abs() < 1e-5, "{window_type}: {}", w[200]);
    }
}

#[test]
fn windows_are_symmetric() {
    let w = generate(WindowType::Povey, 400, 0.42);
    for n in 0..200 {
        assert!((w[n] - w[399 - n]).abs() < 1e-5);
    }
}

#[test]
fn single_sample_window_is_unity() {
    for window_type in [WindowType::Hanning, WindowType::Povey, WindowType::Blackman] {
        assert_eq!(generate(window_type, 1, 0.42), vec![1.0]);
    }
}

#[test]
fn window_function_tracks_frame_length() {
    let opts = FrameExtractionOptions {
        window_type: WindowType::Hamming,
        ..Default::default()
    };
    let wf = FeatureWindowFunction::new(&opts).unwrap();
    assert_eq!(wf.len(), 400);
    assert_eq!(wf.coefficients(), generate(WindowType::Hamming, 400, 0.42).as_slice());
}

#[test]
fn names_round_trip_through_from_str() {
    for window_type in [
        WindowType::Hamming,
        WindowType::Hanning,
        WindowType::Povey,
        WindowType::Rectangular,
        WindowType::Blackman,
        WindowType::Sine,
    ] {
        assert_eq!(window_type.to_string().parse::<WindowType>(), Ok(window_type));
    }
    assert_eq!(
        "kaiser".parse::<WindowType>(),
        Err(FbankError::UnknownWindowType("kaiser".to_string()))
    );
}
