//! HTTP gateway module.
//!
//! This module provides the `/api/chat` endpoint that validates client
//! requests, reshapes them for the upstream completion API and relays the
//! upstream reply.

mod handlers;
mod server;
pub mod types;

pub use handlers::{HTTP_REFERER_HEADER, X_TITLE_HEADER};
pub use server::{
    build_http_client, create_router, run_server, AppState, RequestId, REQUEST_ID_HEADER,
};
pub use types::{InboundRequest, Message, MockResponse, UpstreamRequest};
