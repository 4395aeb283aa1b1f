//! Thread-safe facade over the streaming extractor.
//!
//! One producer thread can push audio while consumers poll for frames. All
//! state lives behind a single mutex per instance; a panic on another thread
//! never makes the extractor unusable.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use crate::error::FbankError;
use crate::fbank::FbankOptions;
use crate::online::OnlineFbank;

struct Session {
    fbank: OnlineFbank,
    /// First frame not yet handed out by `take_ready_frames`.
    next_unread: usize,
}

/// An [`OnlineFbank`] shared between threads.
pub struct SharedOnlineFbank {
    inner: Mutex<Session>,
}

impl SharedOnlineFbank {
    pub fn new(opts: FbankOptions) -> Result<Self, FbankError> {
        Ok(Self {
            inner: Mutex::new(Session {
                fbank: OnlineFbank::new(opts)?,
                next_unread: 0,
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn accept_waveform(&self, sampling_rate: f32, waveform: &[f32]) -> Result<(), FbankError> {
        self.lock().fbank.accept_waveform(sampling_rate, waveform)
    }

    pub fn input_finished(&self) -> Result<(), FbankError> {
        self.lock().fbank.input_finished()
    }

    pub fn is_input_finished(&self) -> bool {
        self.lock().fbank.is_input_finished()
    }

    pub fn num_frames_ready(&self) -> usize {
        self.lock().fbank.num_frames_ready()
    }

    pub fn dim(&self) -> usize {
        self.lock().fbank.dim()
    }

    pub fn frame_shift_in_seconds(&self) -> f32 {
        self.lock().fbank.frame_shift_in_seconds()
    }

    /// Copy of frame `frame`; the lock is released before returning.
    pub fn get_frame(&self, frame: usize) -> Result<Vec<f32>, FbankError> {
        self.lock().fbank.get_frame(frame).map(<[f32]>::to_vec)
    }

    pub fn pop(&self, n: usize) {
        self.lock().fbank.pop(n);
    }

    /// Frames produced since the previous call, oldest first.
    ///
    /// Returned frames are released from the history. Frames evicted by the
    /// history bound before they were taken are skipped.
    pub fn take_ready_frames(&self) -> Vec<Vec<f32>> {
        let mut session = self.lock();
        let ready = session.fbank.num_frames_ready();
        let start = session.next_unread.max(session.fbank.first_available_frame());
        let frames: Vec<Vec<f32>> = (start..ready)
            .filter_map(|i| session.fbank.get_frame(i).ok().map(<[f32]>::to_vec))
            .collect();
        let release = ready - session.fbank.first_available_frame();
        session.fbank.pop(release);
        session.next_unread = ready;
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn quiet_opts() -> FbankOptions {
        let mut opts = FbankOptions::default();
        opts.frame_opts.dither = 0.0;
        opts
    }

    #[test]
    fn take_returns_each_frame_once() {
        let shared = SharedOnlineFbank::new(quiet_opts()).unwrap();
        shared.accept_waveform(16000.0, &[0.2; 800]).unwrap();
        assert_eq!(shared.take_ready_frames().len(), 3);
        assert!(shared.take_ready_frames().is_empty());
        shared.accept_waveform(16000.0, &[0.2; 320]).unwrap();
        assert_eq!(shared.take_ready_frames().len(), 2);
        assert_eq!(
            shared.get_frame(0),
            Err(FbankError::FrameEvicted {
                index: 0,
                first_available: 5
            })
        );
    }

    #[test]
    fn producer_and_consumer_threads() {
        let shared = Arc::new(SharedOnlineFbank::new(quiet_opts()).unwrap());
        let producer = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..20 {
                    shared.accept_waveform(16000.0, &[0.1; 800]).unwrap();
                }
                shared.input_finished().unwrap();
            })
        };
        let mut taken = 0;
        loop {
            let finished = shared.is_input_finished();
            taken += shared.take_ready_frames().len();
            if finished {
                taken += shared.take_ready_frames().len();
                break;
            }
            thread::yield_now();
        }
        producer.join().unwrap();
        assert_eq!(taken, 1 + (16_000 - 400) / 160);
    }
}
