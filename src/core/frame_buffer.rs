//! # Latest-Frame Buffer
//!
//! A single-slot buffer holding the most recent camera frame. The capture
//! loop overwrites it every tick and the analysis task copies it out when it
//! starts, so analysis always sees the freshest image instead of a queued,
//! stale one.
//!
//! The slot has its own lock. Readers clone the frame (an `Arc` bump) and
//! release the lock before touching any session state.

use std::sync::Mutex;

use super::frame::Frame;

/// Most-recent-frame slot shared between the capture loop and analysis.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Option<Frame>>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held frame.
    pub fn publish(&self, frame: Frame) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(frame);
    }

    /// Copy out the held frame, if any.
    pub fn latest(&self) -> Option<Frame> {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Sequence number of the held frame.
    pub fn sequence(&self) -> Option<u64> {
        self.slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|frame| frame.sequence)
    }
}
