//! HTTP surface
//!
//! Maps routes onto stream sessions and serves the multipart responses.
//! Everything camera-related stays behind the broadcaster; this layer only
//! opens sessions and forwards their chunk streams.

pub mod config;
pub mod routes;

pub use config::ServerConfig;
pub use routes::{router, serve};
