//! camcast server binary
//!
//! Configuration comes from `CAMCAST_*` environment variables; unset or
//! unparsable values fall back to the defaults with a warning.

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use camcast::capture::NokhwaOpener;
use camcast::{BroadcasterConfig, CameraBroadcaster, ServerConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = broadcaster_config_from_env();
    let bind_addr: SocketAddr = env_or("CAMCAST_BIND_ADDR", ([0, 0, 0, 0], 8080).into());

    let broadcaster = Arc::new(CameraBroadcaster::new(config, Arc::new(NokhwaOpener)));

    if let Err(e) = camcast::server::serve(ServerConfig::default().bind(bind_addr), broadcaster)
        .await
    {
        tracing::error!(error = %e, "Server exited");
        std::process::exit(1);
    }
}

fn broadcaster_config_from_env() -> BroadcasterConfig {
    let defaults = BroadcasterConfig::default();
    let primary = env_or("CAMCAST_PRIMARY_INDEX", 0u32);
    let fallback = env_or("CAMCAST_FALLBACK_INDEX", 1u32);

    BroadcasterConfig::default()
        .device_indices(vec![primary, fallback])
        .target_fps(env_or("CAMCAST_TARGET_FPS", defaults.target_fps))
        .mog2_history(env_or("CAMCAST_MOG2_HISTORY", defaults.mog2_history))
        .mog2_var_threshold(env_or(
            "CAMCAST_MOG2_VAR_THRESHOLD",
            defaults.mog2_var_threshold,
        ))
        .mask_threshold(env_or("CAMCAST_MASK_THRESHOLD", defaults.mask_threshold))
        .morph_kernel_size(env_or(
            "CAMCAST_MORPH_KERNEL_SIZE",
            defaults.morph_kernel_size,
        ))
        .learning_rate(env_or("CAMCAST_LEARNING_RATE", defaults.learning_rate))
}

/// Parse an environment variable, falling back to `default` when unset and
/// warning when set but unparsable
fn env_or<T: FromStr + std::fmt::Debug>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key = key, value = %raw, default = ?default, "Unparsable value, using default");
                default
            }
        },
        Err(_) => default,
    }
}
