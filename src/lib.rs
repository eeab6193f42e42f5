//! camcast - share one physical camera with any number of HTTP clients
//!
//! A single producer loop owns the webcam and derives two MJPEG streams per
//! captured frame: the raw feed ("real") and a background-subtraction
//! foreground mask ("virtual"). Clients attach and detach freely; capture
//! runs only while at least one client is connected, and the capture rate
//! never depends on how many there are.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use camcast::{BroadcasterConfig, CameraBroadcaster, ServerConfig};
//! use camcast::capture::NokhwaOpener;
//!
//! #[tokio::main]
//! async fn main() -> camcast::Result<()> {
//!     let broadcaster = Arc::new(CameraBroadcaster::new(
//!         BroadcasterConfig::default(),
//!         Arc::new(NokhwaOpener),
//!     ));
//!     camcast::server::serve(ServerConfig::default(), broadcaster).await
//! }
//! ```
//!
//! Point a browser at `/video_feed_real` or `/video_feed_virtual`; each
//! route answers with a `multipart/x-mixed-replace` stream of JPEG parts.

pub mod broadcaster;
pub mod capture;
pub mod codec;
pub mod error;
pub mod server;
pub mod session;

pub use broadcaster::{
    BroadcasterConfig, BroadcasterStats, CameraBroadcaster, SessionHandle, StreamVariant,
};
pub use error::{Error, Result};
pub use server::ServerConfig;
pub use session::StreamSession;
