//! HTTP route handlers.

pub mod block;
pub mod health;
pub mod helpers;
pub mod page;
pub mod services;
pub mod static_files;

use axum::Router;
use axum::extract::State;
use axum::http::Uri;
use axum::response::Response;

use crate::content::load_globals;
use crate::state::AppState;

/// All site routes, with the themed 404 page as fallback.
///
/// Layers and state are applied by the caller.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(static_files::router())
        .merge(block::router())
        .merge(services::router())
        .merge(page::router())
        .fallback(not_found)
}

async fn not_found(State(state): State<AppState>, uri: Uri) -> Response {
    let chrome = load_globals(&state.request_store()).await;
    helpers::not_found_page(&state, &chrome, uri.path())
}
