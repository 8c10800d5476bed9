//! Home route handler.
//!
//! Serves the embedded upload/result page.

use axum::response::{Html, IntoResponse};

const INDEX_HTML: &str = include_str!("../../../../assets/web/index.html");

/// GET / - Serve the upload page.
pub async fn index() -> impl IntoResponse {
    Html(INDEX_HTML)
}
