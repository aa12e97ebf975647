//! # Model Gateway
//!
//! Everything between a captured frame and the free-form text a
//! vision-language model sends back:
//!
//! - [`encode`]: downscale and JPEG-encode a frame into a data URI
//! - [`client`]: the `ModelGateway` trait and its OpenAI-compatible HTTP client
//! - [`json`]: extraction and light repair of the JSON object inside a reply
//!
//! The gateway is stateless. Callers treat a `None` from [`extract_json`] as
//! "this cycle produced nothing usable", never as a crash.

pub mod client;
pub mod encode;
pub mod json;

pub use client::{GatewayConfig, ModelGateway, QwenGateway};
pub use encode::{EncodedImage, ImageOptions, encode_frame};
pub use json::extract_json;
