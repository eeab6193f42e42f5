//! Capture traits and raw frame type
//!
//! A [`DeviceOpener`] is shared by the broadcaster and invoked on the
//! producer thread, which is why it must be `Send + Sync` while the opened
//! [`CaptureDevice`] does not: real webcam handles are usually `!Send` and
//! never leave the thread that opened them. Releasing a device is its `Drop`.

/// One uncompressed RGB24 frame as read from a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Packed RGB pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
}

impl RawFrame {
    /// Create a frame, checking that the buffer matches the dimensions
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if data.len() == (width as usize) * (height as usize) * 3 {
            Some(Self {
                width,
                height,
                data,
            })
        } else {
            None
        }
    }

    /// Uniform single-color frame, used for placeholders and tests
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize) * 3);
        for _ in 0..(width as usize) * (height as usize) {
            data.extend_from_slice(&rgb);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Number of pixels
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }
}

/// Error type for capture operations
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// Device at the given index could not be opened
    Open {
        /// Device index that failed
        index: u32,
        /// Backend-reported reason
        reason: String,
    },
    /// A single read did not return a frame
    Read(String),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Open { index, reason } => {
                write!(f, "failed to open device {}: {}", index, reason)
            }
            CaptureError::Read(reason) => write!(f, "frame read failed: {}", reason),
        }
    }
}

impl std::error::Error for CaptureError {}

/// An open camera device
///
/// Read failures are expected to be transient; callers recover with
/// placeholder frames rather than tearing the device down.
pub trait CaptureDevice {
    /// Read one raw frame, blocking until the device produces it
    fn read_frame(&mut self) -> Result<RawFrame, CaptureError>;
}

/// Factory for capture devices, keyed by device index
pub trait DeviceOpener: Send + Sync {
    /// Open the device at `index`
    fn open(&self, index: u32) -> Result<Box<dyn CaptureDevice>, CaptureError>;
}
