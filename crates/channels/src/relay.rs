//! Inbound event relay.
//!
//! Accepts Open WebUI `channel-events` payloads over HTTP and forwards them
//! into the channel's event stream. When a shared secret is configured,
//! each request must carry `X-Signature: sha256=<hex hmac of body>`.

use std::sync::Arc;

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use toaster_core::channel::Channel;
use tracing::{debug, warn};

use crate::events::decode_event;
use crate::openwebui::OpenWebUiChannel;

type HmacSha256 = Hmac<Sha256>;

/// Shared state for the relay router.
pub struct RelayState {
    pub channel: Arc<OpenWebUiChannel>,
    pub shared_secret: Option<String>,
}

/// Build the relay router.
pub fn build_router(state: Arc<RelayState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/channel-events", post(events_handler))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Check an HMAC-SHA256 signature over `payload`.
///
/// Accepts `sha256=<hex>` or bare `<hex>`. No secret (or an empty one)
/// disables the check. Comparison is constant-time.
pub fn verify_signature(secret: Option<&str>, payload: &[u8], signature: Option<&str>) -> bool {
    let secret = match secret {
        None | Some("") => return true,
        Some(s) => s,
    };
    let Some(signature) = signature else {
        return false;
    };

    let sig_hex = signature.strip_prefix("sha256=").unwrap_or(signature);
    let Ok(provided) = hex::decode(sig_hex) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

async fn health_handler(State(state): State<Arc<RelayState>>) -> Json<serde_json::Value> {
    let ready = state.channel.health_check().await.unwrap_or(false);
    Json(serde_json::json!({
        "status": "ok",
        "stream": if ready { "running" } else { "stopped" },
    }))
}

async fn events_handler(
    State(state): State<Arc<RelayState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers.get("X-Signature").and_then(|v| v.to_str().ok());
    if !verify_signature(state.shared_secret.as_deref(), &body, signature) {
        warn!("Rejected channel event with bad signature");
        return StatusCode::UNAUTHORIZED;
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "Channel event is not JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    match decode_event(payload) {
        Ok(Some(event)) => match state.channel.inject_event(event).await {
            Ok(()) => StatusCode::ACCEPTED,
            Err(e) => {
                warn!(error = %e, "Channel event dropped");
                StatusCode::SERVICE_UNAVAILABLE
            }
        },
        Ok(None) => StatusCode::NO_CONTENT,
        Err(e) => {
            debug!(error = %e, "Undecodable channel event");
            StatusCode::UNPROCESSABLE_ENTITY
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use toaster_core::channel::ChannelEvent;
    use tower::ServiceExt;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn message_body() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!({
            "channel_id": "c-1",
            "user": {"id": "u-1", "name": "Alice"},
            "data": {"type": "message", "data": {
                "id": "m-1", "content": "hey toaster", "created_at": 5,
                "user": {"id": "u-1", "name": "Alice"}
            }}
        }))
        .unwrap()
    }

    fn post_event(body: Vec<u8>, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/channel-events")
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header("X-Signature", sig);
        }
        builder.body(Body::from(body)).unwrap()
    }

    fn state(secret: Option<&str>) -> Arc<RelayState> {
        Arc::new(RelayState {
            channel: Arc::new(OpenWebUiChannel::new("http://localhost:8080", "t")),
            shared_secret: secret.map(String::from),
        })
    }

    #[test]
    fn signature_rules() {
        let body = b"{\"a\":1}";
        assert!(verify_signature(None, body, None));
        assert!(verify_signature(Some(""), body, Some("garbage")));
        assert!(!verify_signature(Some("s3cret"), body, None));
        assert!(!verify_signature(Some("s3cret"), body, Some("not-hex")));
        assert!(!verify_signature(Some("s3cret"), body, Some(&sign("other", body))));

        let good = sign("s3cret", body);
        assert!(verify_signature(Some("s3cret"), body, Some(&good)));
        let bare = good.trim_start_matches("sha256=").to_string();
        assert!(verify_signature(Some("s3cret"), body, Some(&bare)));
    }

    #[tokio::test]
    async fn forwards_signed_event_into_stream() {
        let state = state(Some("s3cret"));
        let mut rx = state.channel.start().await.unwrap();
        let app = build_router(state);

        let body = message_body();
        let sig = sign("s3cret", &body);
        let response = app.oneshot(post_event(body, Some(sig))).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let event = rx.recv().await.unwrap().unwrap();
        let ChannelEvent::Message(inbound) = event else {
            panic!("expected a message event");
        };
        assert_eq!(inbound.message.text, "hey toaster");
    }

    #[tokio::test]
    async fn rejects_unsigned_event_when_secret_set() {
        let state = state(Some("s3cret"));
        let _rx = state.channel.start().await.unwrap();
        let app = build_router(state);
        let response = app.oneshot(post_event(message_body(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn event_before_start_is_unavailable() {
        let app = build_router(state(None));
        let response = app.oneshot(post_event(message_body(), None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn bad_bodies() {
        let app = build_router(state(None));
        let response = app
            .clone()
            .oneshot(post_event(b"not json".to_vec(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .oneshot(post_event(b"{\"channel_id\":\"c\"}".to_vec(), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn health_reports_stream_state() {
        let state = state(None);
        let _rx = state.channel.start().await.unwrap();
        let app = build_router(state);
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["stream"], "running");
    }
}
