//! Stream sessions
//!
//! A session turns the broadcaster's pull-based snapshot into an infinite,
//! fixed-cadence sequence of multipart parts. Sessions never wait for a new
//! frame: each tick re-sends the latest known frame (or the placeholder
//! while none exists), so a slow cache never stalls a client and a slow
//! client never stalls anyone else.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use async_stream::stream;
use bytes::{BufMut, Bytes, BytesMut};
use futures::Stream;
use tokio::time::MissedTickBehavior;

use crate::broadcaster::{CameraBroadcaster, SessionHandle, StreamVariant};
use crate::codec::placeholder_jpeg;

/// Multipart boundary token, shared with the HTTP content type
pub const BOUNDARY: &str = "frame";

/// A registered, paced consumer of one stream variant
pub struct StreamSession {
    handle: SessionHandle,
    interval: Duration,
}

impl StreamSession {
    /// Register with the broadcaster and wrap the resulting handle
    ///
    /// Blocks if this is the first session (device open); call through
    /// `spawn_blocking` from async code.
    pub fn open(broadcaster: &Arc<CameraBroadcaster>, variant: StreamVariant) -> Self {
        let interval = broadcaster.config().frame_interval();
        let handle = broadcaster.register(variant);
        Self { handle, interval }
    }

    /// Whether a capture device backs this session
    pub fn is_available(&self) -> bool {
        self.handle.is_available()
    }

    /// The infinite multipart chunk stream for this session
    ///
    /// Emits one part per tick at the broadcaster's cadence, duplicating the
    /// previous frame when the producer has not advanced. Dropping the
    /// stream (client disconnect, error, timeout) drops the session handle,
    /// which unregisters exactly once.
    pub fn into_chunk_stream(self) -> impl Stream<Item = Result<Bytes, Infallible>> {
        stream! {
            let session = self;
            let mut ticker = tokio::time::interval(session.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let payload = session.handle.snapshot().unwrap_or_else(placeholder_jpeg);
                yield Ok(multipart_part(&payload));
            }
        }
    }
}

/// Frame one JPEG payload as a multipart part
///
/// Layout matches what browsers expect from `multipart/x-mixed-replace`:
/// boundary line, part headers, blank line, payload, trailing CRLF.
pub fn multipart_part(payload: &Bytes) -> Bytes {
    let header = format!(
        "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        BOUNDARY,
        payload.len()
    );

    let mut part = BytesMut::with_capacity(header.len() + payload.len() + 2);
    part.put_slice(header.as_bytes());
    part.put_slice(payload);
    part.put_slice(b"\r\n");
    part.freeze()
}
