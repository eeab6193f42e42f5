//! Webcam capture backed by `nokhwa`
//!
//! `nokhwa::Camera` is `!Send`, so the opener is handed to the producer
//! thread and the camera never leaves it. The stream is closed by dropping
//! the device.

use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;

use super::device::{CaptureDevice, CaptureError, DeviceOpener, RawFrame};

/// Opens physical webcams by index
#[derive(Debug, Default)]
pub struct NokhwaOpener;

impl DeviceOpener for NokhwaOpener {
    fn open(&self, index: u32) -> Result<Box<dyn CaptureDevice>, CaptureError> {
        let requested =
            RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);

        let mut camera =
            Camera::new(CameraIndex::Index(index), requested).map_err(|e| CaptureError::Open {
                index,
                reason: e.to_string(),
            })?;

        camera.open_stream().map_err(|e| CaptureError::Open {
            index,
            reason: e.to_string(),
        })?;

        let format = camera.camera_format();
        tracing::info!(
            index = index,
            width = format.width(),
            height = format.height(),
            fps = format.frame_rate(),
            "Opened capture device"
        );

        Ok(Box::new(NokhwaDevice { camera }))
    }
}

/// An open webcam stream
struct NokhwaDevice {
    camera: Camera,
}

impl CaptureDevice for NokhwaDevice {
    fn read_frame(&mut self) -> Result<RawFrame, CaptureError> {
        let buffer = self
            .camera
            .frame()
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CaptureError::Read(e.to_string()))?;

        let (width, height) = (decoded.width(), decoded.height());
        RawFrame::new(width, height, decoded.into_raw())
            .ok_or_else(|| CaptureError::Read("decoded buffer size mismatch".into()))
    }
}
