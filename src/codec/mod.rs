//! Frame codec: raw frames to JPEG bytes, raw frames to foreground masks
//!
//! Both halves are plain functions plus one stateful [`BackgroundModel`];
//! nothing here is shared across threads.

pub mod jpeg;
pub mod segment;

pub use jpeg::{encode_gray, encode_rgb, placeholder_jpeg, PLACEHOLDER_HEIGHT, PLACEHOLDER_WIDTH};
pub use segment::BackgroundModel;

/// Error type for encoding operations
///
/// Encoding failures are not expected in normal operation; callers treat
/// them as a non-fatal skip-this-frame condition.
#[derive(Debug, Clone)]
pub struct CodecError(pub String);

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "encode failed: {}", self.0)
    }
}

impl std::error::Error for CodecError {}
