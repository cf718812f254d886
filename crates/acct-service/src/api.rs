//! HTTP adapter
//!
//! `POST /{operation}` hands the raw body to the [`Dispatcher`] and returns its
//! status and body unchanged. Health probes live under `/q/health`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::dispatcher::Dispatcher;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Serialize)]
struct ProbeResponse {
    status: &'static str,
}

pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    let state = AppState { dispatcher };

    Router::new()
        .route("/q/health/live", get(liveness_probe))
        .route("/q/health/ready", get(readiness_probe))
        .route("/{operation}", post(dispatch_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch_handler(
    State(state): State<AppState>,
    Path(operation): Path<String>,
    body: Bytes,
) -> Response {
    // Body bytes go through unmodified; the dispatcher rejects invalid UTF-8
    let result = state
        .dispatcher
        .handle_bytes(&format!("/{}", operation), &body)
        .await;

    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let content_type = if result.is_success() {
        "application/json"
    } else {
        "text/plain; charset=utf-8"
    };

    (status, [(header::CONTENT_TYPE, content_type)], result.body).into_response()
}

async fn liveness_probe() -> impl IntoResponse {
    Json(ProbeResponse { status: "UP" })
}

async fn readiness_probe() -> impl IntoResponse {
    Json(ProbeResponse { status: "UP" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::Workflows;
    use acct_remote::{InMemoryLoginService, InMemoryPermissionsService};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn router() -> Router {
        let workflows = Workflows::new(
            Arc::new(InMemoryLoginService::new()),
            Arc::new(InMemoryPermissionsService::new()),
        );
        create_router(Arc::new(Dispatcher::new(workflows)))
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_liveness() {
        let response = router()
            .oneshot(Request::builder().uri("/q/health/live").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, r#"{"status":"UP"}"#);
    }

    #[tokio::test]
    async fn test_register_over_http() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .body(Body::from(
                        r#"{"email":"tester@carpark.ninja","password":"tester","verify":"tester"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
        assert!(body_text(response).await.contains("\"carparks\""));
    }

    #[tokio::test]
    async fn test_unknown_operation_over_http() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/unknown")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(body_text(response).await, "no matching operation: /unknown");
    }

    #[tokio::test]
    async fn test_malformed_body_over_http() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/login")
                    .body(Body::from("not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_text(response).await.starts_with("can't unmarshall input:"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_body_over_http() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/register")
                    .body(Body::from(vec![b'{', b'"', 0xff, 0xfe, b'"', b'}']))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response
            .headers()
            .get(header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let text = body_text(response).await;
        assert!(text.starts_with("can't unmarshall input:"), "{text}");
    }
}
