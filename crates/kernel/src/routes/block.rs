//! Single-block fragment endpoint.
//!
//! The failed-block placeholder retries through this route: it re-resolves
//! the page and renders only the block at the given position, wrapper
//! included, so the client can swap it in place.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::{Router, routing::get};
use tracing::debug;

use crate::content::{Collection, PageResolver, RenderContext};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::Depth;

/// Create the block fragment router.
pub fn router() -> Router<AppState> {
    Router::new().route("/_block/{collection}/{slug}/{index}", get(render_fragment))
}

/// Re-render one block of a page as an HTML fragment.
///
/// Unlike [`BlockPipeline::retry`](crate::content::BlockPipeline::retry),
/// which reuses records already in memory, this fetches the page again
/// through a fresh request cache: the browser holds only rendered HTML.
async fn render_fragment(
    State(state): State<AppState>,
    Path((collection, slug, index)): Path<(String, String, usize)>,
) -> AppResult<Html<String>> {
    let collection = Collection::from_segment(&collection).ok_or(AppError::NotFound)?;

    let store = state.request_store();
    let page = PageResolver::new(&store)
        .resolve(collection, &slug, Depth::DETAIL)
        .await?
        .ok_or(AppError::NotFound)?;

    let ctx = RenderContext::new(collection, &page.slug)
        .development(state.site().environment.is_development());
    let pipeline = state.pipeline();
    let block = pipeline
        .retry(&page.layout, index, &ctx)
        .ok_or(AppError::NotFound)?;

    debug!(collection = %collection, slug = %slug, index, "rendered block fragment");
    Ok(Html(pipeline.block_html(&block, &ctx)))
}
