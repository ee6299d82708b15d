//! HTTP request handlers.

use axum::{
    body::{Body, Bytes},
    extract::{rejection::BytesRejection, State},
    http::{header, Method},
    response::{IntoResponse, Response},
    Json,
};
use tracing::Instrument;

use super::server::AppState;
use super::types::{InboundRequest, MockResponse, UpstreamRequest};
use crate::config::{GatewayMode, UpstreamConfig};
use crate::error::{Error, UPSTREAM_FAILURE_MESSAGE};

/// Optional attribution header: referring site.
pub const HTTP_REFERER_HEADER: &str = "HTTP-Referer";
/// Optional attribution header: application title.
pub const X_TITLE_HEADER: &str = "X-Title";

/// Handle POST /api/chat
///
/// Validates the body against the configured schema, then either forwards it
/// upstream (proxy mode) or answers with a canned message (mock mode).
///
/// The upstream call runs on its own task, so a client disconnect does not
/// cancel it; it completes or fails on its own.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, Error> {
    let body = body.map_err(|e| {
        tracing::warn!(error = %e, "Failed to read request body");
        Error::BadRequest("Invalid request body. Please send a JSON payload.".to_string())
    })?;

    let inbound = InboundRequest::parse(&body, state.config.schema).map_err(|e| {
        tracing::info!(reason = %e, "Rejected chat request");
        e
    })?;

    tracing::info!(
        messages = inbound.message_count(),
        mode = state.config.mode.name(),
        "Received chat request"
    );

    let upstream = match &state.config.mode {
        GatewayMode::Proxy(upstream) => upstream.clone(),
        GatewayMode::Mock => {
            return Ok(Json(MockResponse::for_request(&inbound)).into_response());
        }
    };

    let client = state.http_client.clone();
    let task = tokio::spawn(
        async move { forward(&client, &upstream, inbound).await }.in_current_span(),
    );

    task.await.map_err(|e| {
        tracing::error!(error = %e, "Upstream forwarding task failed");
        Error::Internal(UPSTREAM_FAILURE_MESSAGE.to_string())
    })?
}

/// Forward a validated request upstream and relay the reply verbatim.
///
/// Upstream 4xx/5xx replies are relayed like any other; only transport and
/// body-read failures become gateway errors.
async fn forward(
    client: &reqwest::Client,
    upstream: &UpstreamConfig,
    inbound: InboundRequest,
) -> Result<Response, Error> {
    let payload = UpstreamRequest::new(&upstream.model, inbound);
    let body = serde_json::to_vec(&payload).map_err(|e| {
        tracing::error!(error = %e, "Failed to serialize upstream payload");
        Error::Internal("Error creating JSON payload. Please try again later.".to_string())
    })?;

    tracing::debug!(
        uri = %upstream.uri,
        model = %payload.model,
        messages = payload.messages.len(),
        "Forwarding to upstream"
    );

    let mut upstream_request = client
        .post(&upstream.uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(
            header::AUTHORIZATION,
            format!("Bearer {}", upstream.api_key.expose_secret()),
        )
        .body(body);

    if let Some(referer) = &upstream.referer {
        upstream_request = upstream_request.header(HTTP_REFERER_HEADER, referer);
    }
    if let Some(title) = &upstream.title {
        upstream_request = upstream_request.header(X_TITLE_HEADER, title);
    }

    let upstream_response = upstream_request.send().await.map_err(|e| {
        tracing::error!(error = %e, uri = %upstream.uri, "Failed to reach upstream");
        Error::Upstream(e)
    })?;

    let status = upstream_response.status();
    let bytes = upstream_response.bytes().await.map_err(|e| {
        tracing::error!(error = %e, status = %status, "Failed to read upstream response");
        Error::Internal(
            "Error reading response from the upstream API. Please try again later.".to_string(),
        )
    })?;

    if status.is_success() {
        tracing::info!(status = status.as_u16(), bytes = bytes.len(), "Upstream responded");
    } else {
        tracing::warn!(
            status = status.as_u16(),
            bytes = bytes.len(),
            "Upstream returned error status, relaying"
        );
    }

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(bytes))
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to build relay response");
            Error::Internal(
                "Error relaying the upstream response. Please try again later.".to_string(),
            )
        })
}

/// Any method other than POST on the chat path.
pub async fn method_not_allowed(method: Method) -> Error {
    tracing::info!(method = %method, "Rejected non-POST chat request");
    Error::MethodNotAllowed
}

/// Unknown paths.
pub async fn not_found() -> Error {
    Error::NotFound
}

/// Handle GET /health
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "chatgate",
        "mode": state.config.mode.name(),
    }))
}
