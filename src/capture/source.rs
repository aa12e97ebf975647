//! Capture source abstraction.

use async_trait::async_trait;

use crate::{
    core::{Frame, Size},
    error::TutorResult,
};

/// Abstract interface for frame capture sources.
/// Enables pluggable capture backends: cameras, recorded sessions, test fixtures.
#[async_trait]
pub trait CaptureSource: Send {
    /// Opens the underlying device or input.
    async fn initialize(&mut self) -> TutorResult<()>;

    /// Reads the next frame.
    ///
    /// # Errors
    ///
    /// A `Capture` error ends the render loop.
    async fn read_frame(&mut self) -> TutorResult<Frame>;

    /// Native resolution, once known.
    fn input_size(&self) -> Option<Size>;

    /// Releases the device. Called once when the loop ends, whatever the reason.
    async fn release(&mut self) -> TutorResult<()>;
}
