//! Device-capture seam
//!
//! The broadcaster only ever talks to the camera through the
//! [`CaptureDevice`]/[`DeviceOpener`] traits, so tests can substitute
//! scripted devices and the real backend stays swappable.

pub mod device;
pub mod webcam;

pub use device::{CaptureDevice, CaptureError, DeviceOpener, RawFrame};
pub use webcam::NokhwaOpener;
