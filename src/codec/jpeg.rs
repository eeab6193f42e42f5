//! JPEG encoding and the fixed placeholder frame

use std::sync::OnceLock;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::capture::RawFrame;

use super::CodecError;

/// Placeholder frame width
pub const PLACEHOLDER_WIDTH: u32 = 640;
/// Placeholder frame height
pub const PLACEHOLDER_HEIGHT: u32 = 480;

/// Encode an RGB24 frame as JPEG
///
/// Fails if the frame's buffer does not match its dimensions; `RawFrame`
/// fields are public, so the length invariant is re-checked here.
pub fn encode_rgb(frame: &RawFrame) -> Result<Bytes, CodecError> {
    let expected = frame.pixel_count() * 3;
    if frame.data.len() != expected {
        return Err(CodecError(format!(
            "frame buffer is {} bytes, expected {}",
            frame.data.len(),
            expected
        )));
    }

    let mut buf = Vec::new();
    JpegEncoder::new(&mut buf)
        .encode(
            &frame.data,
            frame.width,
            frame.height,
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| CodecError(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Encode an 8-bit grayscale buffer as JPEG
pub fn encode_gray(width: u32, height: u32, data: &[u8]) -> Result<Bytes, CodecError> {
    let mut buf = Vec::new();
    JpegEncoder::new(&mut buf)
        .encode(data, width, height, ExtendedColorType::L8)
        .map_err(|e| CodecError(e.to_string()))?;
    Ok(Bytes::from(buf))
}

/// Fixed uniform black JPEG substituted when no real frame is available
///
/// Encoded once; `Bytes` clones are reference-counted so handing this to
/// every session per tick is cheap.
pub fn placeholder_jpeg() -> Bytes {
    static PLACEHOLDER: OnceLock<Bytes> = OnceLock::new();
    PLACEHOLDER
        .get_or_init(|| {
            let black = vec![0u8; (PLACEHOLDER_WIDTH * PLACEHOLDER_HEIGHT) as usize];
            // Must not panic in library paths; an empty part still keeps
            // the multipart stream well-formed.
            encode_gray(PLACEHOLDER_WIDTH, PLACEHOLDER_HEIGHT, &black)
                .unwrap_or_else(|_| Bytes::new())
        })
        .clone()
}
