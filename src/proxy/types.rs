//! Inbound and upstream payload types.
//!
//! Inbound bodies are decoded in two steps: the raw JSON object is first
//! checked against an explicit allow-list of keys, then decoded into the typed
//! shape for the configured [`InboundSchema`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::InboundSchema;
use crate::error::Error;

/// Keys accepted at the top level of a simple-variant body.
const CONTENT_KEYS: &[&str] = &["content"];
/// Keys accepted at the top level of a chat-history body.
const MESSAGES_KEYS: &[&str] = &["messages"];
/// Keys accepted inside each chat-history message.
const MESSAGE_KEYS: &[&str] = &["role", "content"];

/// A chat message. Roles are passed through unchecked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A validated client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundRequest {
    /// `{"content": "..."}`, never empty
    Content(String),
    /// `{"messages": [...]}`, never empty
    Messages(Vec<Message>),
}

#[derive(Deserialize)]
struct ContentBody {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct MessagesBody {
    #[serde(default)]
    messages: Vec<Message>,
}

impl InboundRequest {
    /// Decode and validate a raw request body against `schema`.
    pub fn parse(body: &[u8], schema: InboundSchema) -> Result<Self, Error> {
        let value: Value =
            serde_json::from_slice(body).map_err(|_| Error::BadRequest(malformed(schema)))?;
        let object = value
            .as_object()
            .ok_or_else(|| Error::BadRequest(malformed(schema)))?;

        match schema {
            InboundSchema::Content => {
                ensure_allowed_keys(object, CONTENT_KEYS, schema)?;
                let body: ContentBody = serde_json::from_value(value)
                    .map_err(|_| Error::BadRequest(malformed(schema)))?;
                if body.content.is_empty() {
                    return Err(Error::BadRequest(
                        "Invalid JSON payload. Please provide the 'content' field with your message."
                            .to_string(),
                    ));
                }
                Ok(InboundRequest::Content(body.content))
            }
            InboundSchema::Messages => {
                ensure_allowed_keys(object, MESSAGES_KEYS, schema)?;
                if let Some(Value::Array(items)) = object.get("messages") {
                    for item in items {
                        if let Some(message) = item.as_object() {
                            ensure_allowed_keys(message, MESSAGE_KEYS, schema)?;
                        }
                    }
                }
                let body: MessagesBody = serde_json::from_value(value)
                    .map_err(|_| Error::BadRequest(malformed(schema)))?;
                if body.messages.is_empty() {
                    return Err(Error::BadRequest(
                        "Invalid JSON payload. The 'messages' list cannot be empty.".to_string(),
                    ));
                }
                Ok(InboundRequest::Messages(body.messages))
            }
        }
    }

    /// Messages to send upstream.
    pub fn into_messages(self) -> Vec<Message> {
        match self {
            InboundRequest::Content(content) => vec![Message::user(content)],
            InboundRequest::Messages(messages) => messages,
        }
    }

    /// Content of the most recent message.
    pub fn latest_content(&self) -> &str {
        match self {
            InboundRequest::Content(content) => content,
            InboundRequest::Messages(messages) => messages
                .last()
                .map(|m| m.content.as_str())
                .unwrap_or_default(),
        }
    }

    pub fn message_count(&self) -> usize {
        match self {
            InboundRequest::Content(_) => 1,
            InboundRequest::Messages(messages) => messages.len(),
        }
    }
}

fn malformed(schema: InboundSchema) -> String {
    match schema {
        InboundSchema::Content => {
            r#"Invalid JSON payload. Expected only the 'content' field, e.g. { "content": "your message" }."#
                .to_string()
        }
        InboundSchema::Messages => {
            r#"Invalid JSON payload. Expected only the 'messages' field, e.g. { "messages": [{ "role": "user", "content": "your message" }] }."#
                .to_string()
        }
    }
}

fn ensure_allowed_keys(
    object: &Map<String, Value>,
    allowed: &[&str],
    schema: InboundSchema,
) -> Result<(), Error> {
    match object.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => {
            tracing::debug!(field = %key, "Rejecting unknown field");
            Err(Error::BadRequest(malformed(schema)))
        }
        None => Ok(()),
    }
}

/// Chat completion request sent upstream.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamRequest {
    pub model: String,
    pub messages: Vec<Message>,
}

impl UpstreamRequest {
    /// Build the upstream payload; `model` always comes from configuration.
    pub fn new(model: impl Into<String>, inbound: InboundRequest) -> Self {
        Self {
            model: model.into(),
            messages: inbound.into_messages(),
        }
    }
}

/// Canned reply used in mock mode.
#[derive(Debug, Clone, Serialize)]
pub struct MockResponse {
    pub message: String,
}

impl MockResponse {
    pub fn for_request(request: &InboundRequest) -> Self {
        Self {
            message: format!(
                "Request received: {} -- Response: Hello from the chat gateway!",
                request.latest_content()
            ),
        }
    }
}
