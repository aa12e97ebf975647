//! # Capture Module
//!
//! Frame sources for the render loop. The camera driver itself lives
//! outside this crate; anything that yields RGB frames can implement
//! [`CaptureSource`].

pub mod source;
pub mod still;

pub use source::CaptureSource;
pub use still::StillImageSource;
