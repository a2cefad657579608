//! # doc-chat
//!
//! A Rust web application for chatting with uploaded documents. Files are
//! uploaded to a managed blob container, a managed search index retrieves
//! relevant text chunks for a question, and a managed chat-completion
//! endpoint produces an answer grounded in those chunks.
//!
//! ## Architecture
//!
//! ```text
//!   browser ──upload──▶ POST /api/fileupload ──▶ BlobStore ───▶ blob container
//!   browser ──ask─────▶ POST /api/chat
//!                            │
//!                            ├─▶ SearchIndex::search ─────────▶ search service
//!                            │        (top-K chunks)
//!                            └─▶ ChatModel::ask ──────────────▶ chat deployment
//!                                     (context + question)
//! ```
//!
//! Every non-trivial capability (ranking, inference, durability) lives in the
//! external services; this crate is the request/response contract around them.
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for the server and the three backends
//! - [`error`] - Typed gateway error taxonomy and its HTTP status mapping
//! - [`models`] - Wire types: `StoredDocument`, upload/chat request and response bodies
//! - [`gateway::storage`] - Blob container wrapper (lazy create, put, list, delete)
//! - [`gateway::retrieval`] - Search index wrapper returning top-K content chunks
//! - [`gateway::answer`] - Chat-completion wrapper with a hard context cap
//! - [`api`] - Axum HTTP handlers composing the gateways
//! - [`state`] - Shared application state: config, HTTP client, gateways

use axum::response::Html;
use axum::routing::{delete, get, post};
use axum::Router;

pub mod api;
pub mod config;
pub mod error;
pub mod gateway;
pub mod models;
pub mod state;

use state::AppState;

/// Build the application router. Extracted from `main` so integration tests
/// can serve the exact same surface.
pub fn router(state: AppState) -> Router {
    // Allow some slack above the upload ceiling for multipart framing; the
    // upload handler enforces the configured ceiling on the file itself.
    let max_body = state.config.max_upload_bytes + 1024 * 1024;
    Router::new()
        // Serve frontend
        .route("/", get(serve_index))
        // API routes
        .route("/api/fileupload", post(api::documents::upload_document))
        .route("/api/fileupload", get(api::documents::list_documents))
        .route(
            "/api/fileupload/{blob_name}",
            delete(api::documents::delete_document),
        )
        .route("/api/chat", post(api::chat::chat))
        .layer(axum::extract::DefaultBodyLimit::max(max_body))
        .with_state(state)
        .fallback(serve_index)
}

async fn serve_index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}
