//! # Core Frame Types
//!
//! Frames and the single-slot buffer that hands the freshest camera image
//! from the capture loop to the analysis task.

pub mod frame;
pub mod frame_buffer;

pub use frame::{Frame, Size};
pub use frame_buffer::LatestFrame;
