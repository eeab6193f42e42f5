//! Crate-level error types
//!
//! Module-local failures (capture, codec) have their own enums next to the
//! code that raises them; this type is what crosses the crate boundary.

use crate::capture::CaptureError;
use crate::codec::CodecError;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type
#[derive(Debug)]
pub enum Error {
    /// No candidate device index could be opened
    DeviceUnavailable {
        /// Indices tried, in order
        tried: Vec<u32>,
    },
    /// Device open/read failure
    Capture(CaptureError),
    /// Frame encoding failure
    Codec(CodecError),
    /// Socket-level failure (bind, accept)
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::DeviceUnavailable { tried } => {
                write!(f, "no camera available at indices {:?}", tried)
            }
            Error::Capture(e) => write!(f, "capture error: {}", e),
            Error::Codec(e) => write!(f, "codec error: {}", e),
            Error::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Capture(e) => Some(e),
            Error::Codec(e) => Some(e),
            Error::Io(e) => Some(e),
            Error::DeviceUnavailable { .. } => None,
        }
    }
}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Error::Capture(e)
    }
}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Error::Codec(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}
