//! Route handlers and serving
//!
//! `/video_feed_real` and `/video_feed_virtual` open one stream session each
//! and answer with a `multipart/x-mixed-replace` body that never ends until
//! the client disconnects. `/health` answers regardless of camera state.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::broadcaster::{CameraBroadcaster, StreamVariant};
use crate::session::{StreamSession, BOUNDARY};

use super::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
struct AppState {
    broadcaster: Arc<CameraBroadcaster>,
}

/// Build the router over a broadcaster
pub fn router(broadcaster: Arc<CameraBroadcaster>) -> Router {
    Router::new()
        .route("/video_feed_real", get(video_feed_real))
        .route("/video_feed_virtual", get(video_feed_virtual))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(AppState { broadcaster })
}

/// Bind and serve until the process exits
pub async fn serve(
    config: ServerConfig,
    broadcaster: Arc<CameraBroadcaster>,
) -> crate::error::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "HTTP server listening");

    axum::serve(listener, router(broadcaster)).await?;
    Ok(())
}

async fn video_feed_real(State(state): State<AppState>) -> Response {
    video_feed(state, StreamVariant::Real).await
}

async fn video_feed_virtual(State(state): State<AppState>) -> Response {
    video_feed(state, StreamVariant::Virtual).await
}

async fn video_feed(state: AppState, variant: StreamVariant) -> Response {
    // Registration may block on a device open; keep it off the async workers.
    let session = match tokio::task::spawn_blocking(move || {
        StreamSession::open(&state.broadcaster, variant)
    })
    .await
    {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(variant = %variant, error = %e, "Session open task failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if !session.is_available() {
        tracing::warn!(variant = %variant, "Serving placeholder stream, no capture device");
    }

    let content_type = format!("multipart/x-mixed-replace; boundary={}", BOUNDARY);
    match Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from_stream(session.into_chunk_stream()))
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build streaming response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn health() -> &'static str {
    "Server is running"
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::Request;
    use tokio_test::assert_ok;
    use tower::util::ServiceExt;

    use crate::broadcaster::BroadcasterConfig;
    use crate::capture::{CaptureDevice, CaptureError, DeviceOpener, RawFrame};

    use super::*;

    struct OneFrameOpener;

    impl DeviceOpener for OneFrameOpener {
        fn open(&self, _index: u32) -> Result<Box<dyn CaptureDevice>, CaptureError> {
            Ok(Box::new(OneFrameDevice))
        }
    }

    struct OneFrameDevice;

    impl CaptureDevice for OneFrameDevice {
        fn read_frame(&mut self) -> Result<RawFrame, CaptureError> {
            Ok(RawFrame::solid(16, 12, [50, 60, 70]))
        }
    }

    fn test_router() -> Router {
        let config = BroadcasterConfig::default()
            .target_fps(100)
            .stop_join_timeout(std::time::Duration::from_millis(500));
        let broadcaster = Arc::new(CameraBroadcaster::new(config, Arc::new(OneFrameOpener)));
        router(broadcaster)
    }

    #[tokio::test]
    async fn test_health_is_independent_of_camera() {
        let response = test_router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"Server is running");
    }

    #[tokio::test]
    async fn test_video_feed_real_is_multipart() {
        let response = test_router()
            .oneshot(
                Request::get("/video_feed_real")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(content_type, "multipart/x-mixed-replace; boundary=frame");
        tokio_test::assert_ok!(read_first_part(response).await);
    }

    #[tokio::test]
    async fn test_video_feed_virtual_is_multipart() {
        let response = test_router()
            .oneshot(
                Request::get("/video_feed_virtual")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        tokio_test::assert_ok!(read_first_part(response).await);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let response = test_router()
            .oneshot(Request::get("/video_feed").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    /// Pull the first chunk out of an infinite multipart body
    async fn read_first_part(response: Response) -> Result<(), String> {
        use futures::StreamExt;

        let mut stream = response.into_body().into_data_stream();
        let chunk = tokio::time::timeout(std::time::Duration::from_secs(2), stream.next())
            .await
            .map_err(|_| "no part within 2s".to_string())?
            .ok_or_else(|| "body ended".to_string())?
            .map_err(|e| e.to_string())?;

        if chunk.starts_with(b"--frame\r\n") {
            Ok(())
        } else {
            Err("chunk does not start with the boundary".into())
        }
    }
}
