//! Error types for chatgate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Client-facing message for every failure on the upstream leg.
pub const UPSTREAM_FAILURE_MESSAGE: &str =
    "Error communicating with the upstream API. Please try again later.";

/// Main error type for chatgate.
///
/// Every variant renders as `{"error": "<message>"}`. Upstream transport
/// errors are logged where they occur and only reach the client as a generic
/// message.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid method. Only POST requests are allowed.")]
    MethodNotAllowed,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::BadRequest(_) => StatusCode::BAD_REQUEST,
            Error::Upstream(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to return to the client.
    pub fn client_message(&self) -> String {
        match self {
            Error::Upstream(_) => UPSTREAM_FAILURE_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.client_message() });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_method_not_allowed_response() {
        let response = Error::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let json = body_json(response).await;
        assert_eq!(
            json["error"],
            "Invalid method. Only POST requests are allowed."
        );
    }

    #[tokio::test]
    async fn test_bad_request_message_passes_through() {
        let response = Error::BadRequest("The 'content' field cannot be empty.".into())
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "The 'content' field cannot be empty.");
    }

    #[tokio::test]
    async fn test_upstream_error_is_generic() {
        // Port 1 on loopback refuses connections.
        let err = reqwest::Client::new()
            .post("http://127.0.0.1:1/never")
            .send()
            .await
            .unwrap_err();
        let response = Error::Upstream(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["error"], UPSTREAM_FAILURE_MESSAGE);
        assert!(!json["error"].as_str().unwrap().contains("127.0.0.1"));
    }

    #[test]
    fn test_error_body_has_single_field() {
        let body = serde_json::json!({ "error": Error::NotFound.client_message() });
        assert_eq!(body.as_object().unwrap().len(), 1);
    }
}
