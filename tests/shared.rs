//! The mutex-guarded facade used from several threads.
#![cfg(feature = "std")]

use std::sync::Arc;
use std::thread;

use melstream::{FbankOptions, OnlineFbank, SharedOnlineFbank};

fn quiet_opts() -> FbankOptions {
    let mut opts = FbankOptions::default();
    opts.frame_opts.dither = 0.0;
    opts
}

#[test]
fn shared_frames_match_plain_extractor() {
    let wave: Vec<f32> = (0..8000).map(|i| (i as f32 * 0.05).sin()).collect();
    let shared = SharedOnlineFbank::new(quiet_opts()).unwrap();
    let mut plain = OnlineFbank::new(quiet_opts()).unwrap();
    plain.accept_waveform(16000.0, &wave).unwrap();

    let mut taken = Vec::new();
    for chunk in wave.chunks(500) {
        shared.accept_waveform(16000.0, chunk).unwrap();
        taken.extend(shared.take_ready_frames());
    }
    assert_eq!(taken.len(), plain.num_frames_ready());
    for (i, frame) in taken.iter().enumerate() {
        assert_eq!(frame.as_slice(), plain.get_frame(i).unwrap());
    }
    assert_eq!(shared.dim(), 23);
    assert_eq!(shared.num_frames_ready(), taken.len());
}

#[test]
fn readers_see_monotonic_progress() {
    let shared = Arc::new(SharedOnlineFbank::new(quiet_opts()).unwrap());
    let writer = {
        let shared = Arc::clone(&shared);
        thread::spawn(move || {
            for _ in 0..40 {
                shared.accept_waveform(16000.0, &[0.25; 400]).unwrap();
            }
            shared.input_finished().unwrap();
        })
    };
    let readers: Vec<_> = (0..3)
        .map(|_| {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                let mut last = 0;
                while !shared.is_input_finished() {
                    let ready = shared.num_frames_ready();
                    assert!(ready >= last);
                    last = ready;
                    if ready > 0 {
                        assert_eq!(shared.get_frame(ready - 1).unwrap().len(), 23);
                    }
                    thread::yield_now();
                }
            })
        })
        .collect();
    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(shared.num_frames_ready(), 1 + (16_000 - 400) / 160);
}
