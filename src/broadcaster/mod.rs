//! Shared camera broadcaster
//!
//! One physical camera, any number of HTTP clients. The broadcaster owns the
//! capture device and runs a single producer loop that captures and encodes
//! each frame exactly once; sessions read the latest encoded pair at their
//! own pace.
//!
//! # Architecture
//!
//! ```text
//!                  Arc<CameraBroadcaster>
//!            ┌───────────────────────────────┐
//!            │ control: Mutex<ControlState>  │  demand + producer lifecycle
//!            │ cache:   FrameCache           │  latest (real, virtual) pair
//!            │ model:   background model slot│  persists across restarts
//!            └──────────────┬────────────────┘
//!                           │ demand 0→1 spawns / 1→0 joins
//!                           ▼
//!                   [producer thread]
//!             read → encode real ─┐
//!                  → mask/encode ─┴► cache.publish(both)
//!                           ▲
//!         ┌─────────────────┼─────────────────┐
//!         ▼                 ▼                 ▼
//!    [Session]         [Session]         [Session]
//!    snapshot()        snapshot()        snapshot()
//! ```
//!
//! # Zero-Copy Fan-Out
//!
//! Encoded frames are `bytes::Bytes`, so every session snapshot shares the
//! producer's single allocation via reference counting.

pub mod cache;
pub mod config;
pub mod core;
pub mod handle;
mod producer;

pub use self::cache::{FrameCache, FramePair};
pub use self::config::BroadcasterConfig;
pub use self::core::{BroadcasterStats, CameraBroadcaster};
pub use self::handle::{SessionHandle, StreamVariant};
