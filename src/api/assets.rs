//! Embedded dashboard frontend.
//!
//! The host ships a minimal live viewer compiled into the binary so a bare
//! `tessera serve` is immediately usable in a browser. The viewer talks to
//! the same admin API as any external presentation layer.

use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use rust_embed::RustEmbed;

/// Embedded dashboard assets from the assets/ directory
#[derive(RustEmbed)]
#[folder = "assets/"]
struct DashboardAssets;

/// Serves the main dashboard HTML page.
pub async fn index_handler() -> Response {
    match DashboardAssets::get("index.html") {
        Some(content) => match std::str::from_utf8(&content.data) {
            Ok(html) => Html(html.to_string()).into_response(),
            Err(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Invalid HTML encoding").into_response()
            }
        },
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Dashboard HTML not found",
        )
            .into_response(),
    }
}

/// Serves static assets (CSS, JS, etc.) under /static/.
pub async fn asset_handler(Path(path): Path<String>) -> Response {
    match DashboardAssets::get(&path) {
        Some(content) => {
            let mime_type = mime_guess::from_path(&path).first_or_octet_stream();

            ([(header::CONTENT_TYPE, mime_type.as_ref())], content.data).into_response()
        }
        None => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    }
}
