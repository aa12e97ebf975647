//! Common test utilities shared by the integration tests.
//!
//! - [`ScriptedGateway`]: a model stand-in that replays canned replies
//! - [`SnapshotBuilder`]: fluent construction of perception snapshots
//! - [`frames`]: solid-color frames of a given size
//! - [`MockSource`]: a capture source that yields a fixed number of frames

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use desk_tutor::{
    TutorError, TutorResult,
    capture::CaptureSource,
    core::{Frame, Size},
    gateway::{EncodedImage, ModelGateway},
    perception::{NormRect, PerceptionSnapshot, Problem},
    session::{HistoryEntry, InteractionHistory, LastAction},
};

/// One recorded gateway call.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub had_image: bool,
    pub instruction: String,
    pub max_output_tokens: u32,
}

/// Replays replies in order. When the script runs out every call is a
/// transport error, so tests notice unexpected calls.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<TutorResult<String>>>,
    calls: Mutex<Vec<RecordedCall>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedGateway {
    pub fn new<I, S>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Arc::new(Self::with_replies(replies.into_iter().map(|r| Ok(r.into()))))
    }

    pub fn with_results(replies: Vec<TutorResult<String>>) -> Arc<Self> {
        Arc::new(Self::with_replies(replies))
    }

    /// Same script, but each call blocks for `delay`.
    pub fn slow<I, S>(replies: I, delay: Duration) -> Arc<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut gateway = Self::with_replies(replies.into_iter().map(|r| Ok(r.into())));
        gateway.delay = Some(delay);
        Arc::new(gateway)
    }

    fn with_replies(replies: impl IntoIterator<Item = TutorResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn push(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap().len()
    }

    /// Most calls that were ever running at the same time.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl ModelGateway for ScriptedGateway {
    fn call(
        &self,
        image: Option<&EncodedImage>,
        instruction: &str,
        max_output_tokens: u32,
    ) -> TutorResult<String> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        self.calls.lock().unwrap().push(RecordedCall {
            had_image: image.is_some(),
            instruction: instruction.to_string(),
            max_output_tokens,
        });
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TutorError::transport("chat_completions", "script exhausted")));
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        reply
    }
}

/// Fluent snapshot construction with writing explicitly off.
pub struct SnapshotBuilder {
    snapshot: PerceptionSnapshot,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        let mut snapshot = PerceptionSnapshot::empty(Utc::now());
        snapshot.is_writing = Some(false);
        Self { snapshot }
    }

    pub fn page(mut self, page: &str) -> Self {
        self.snapshot.page_id = Some(page.to_string());
        self
    }

    pub fn active(mut self, id: &str) -> Self {
        self.snapshot.active_problem_id = Some(id.to_string());
        self
    }

    pub fn dwell(mut self, secs: f64) -> Self {
        self.snapshot.dwell_seconds = secs;
        self
    }

    pub fn writing(mut self, writing: bool) -> Self {
        self.snapshot.is_writing = Some(writing);
        self
    }

    pub fn answer(mut self, id: &str, text: &str) -> Self {
        self.snapshot.answers.insert(id.to_string(), text.to_string());
        self
    }

    /// Adds a problem whose box covers `rect` of a `frame` sized image.
    pub fn problem(mut self, id: &str, text: &str, rect: [f64; 4], frame: Size) -> Self {
        let bbox = NormRect::from_slice(&rect).unwrap();
        self.snapshot.problems.push(Problem {
            id: id.to_string(),
            text: text.to_string(),
            bbox: Some(bbox),
            pixel_bbox: Some(bbox.to_pixels(frame)),
        });
        self
    }

    pub fn build(self) -> PerceptionSnapshot {
        self.snapshot
    }
}

/// History with one entry checked against `answer`.
pub fn checked_history(id: &str, is_correct: bool, answer: Option<&str>) -> InteractionHistory {
    let mut history = InteractionHistory::new();
    history.insert(
        id.to_string(),
        HistoryEntry {
            last_action: if is_correct {
                LastAction::CheckedCorrect
            } else {
                LastAction::CheckedIncorrect
            },
            is_correct: Some(is_correct),
            checked_answer: answer.map(str::to_string),
            last_action_at: Some(Utc::now()),
            ..HistoryEntry::default()
        },
    );
    history
}

pub mod frames {
    use super::*;

    pub const DESK: Size = Size { w: 640, h: 480 };

    pub fn solid(size: Size, shade: u8, sequence: u64) -> Frame {
        Frame::new(vec![shade; Frame::byte_len(size)], size, sequence).unwrap()
    }
}

/// Capture source yielding `limit` frames, then a capture error.
pub struct MockSource {
    size: Size,
    limit: u64,
    produced: u64,
    /// Reads that fail with an encoding error before the next frame
    glitches: VecDeque<(u64, u32)>,
    released: Arc<AtomicBool>,
}

impl MockSource {
    pub fn new(size: Size, limit: u64) -> Self {
        Self {
            size,
            limit,
            produced: 0,
            glitches: VecDeque::new(),
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    /// After `after` frames, fail the next `reads` reads with a retryable
    /// decode error.
    pub fn with_glitch(mut self, after: u64, reads: u32) -> Self {
        self.glitches.push_back((after, reads));
        self
    }

    /// Flag set once the loop releases the source.
    pub fn released_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.released)
    }
}

#[async_trait]
impl CaptureSource for MockSource {
    async fn initialize(&mut self) -> TutorResult<()> {
        Ok(())
    }

    async fn read_frame(&mut self) -> TutorResult<Frame> {
        if self.produced >= self.limit {
            return Err(TutorError::capture("camera unplugged"));
        }
        if let Some((after, reads)) = self.glitches.front_mut() {
            if *after == self.produced && *reads > 0 {
                *reads -= 1;
                return Err(TutorError::encoding("corrupt frame"));
            }
        }
        self.produced += 1;
        Ok(frames::solid(self.size, 128, self.produced))
    }

    fn input_size(&self) -> Option<Size> {
        Some(self.size)
    }

    async fn release(&mut self) -> TutorResult<()> {
        self.released.store(true, Ordering::SeqCst);
        Ok(())
    }
}
