//! Page route handlers.
//!
//! `GET` renders a CMS page through the block pipeline. `POST` handles a
//! contact form block on that page and re-renders it with the form's
//! resulting state.

use std::collections::HashMap;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Router, routing::get};
use tracing::{debug, info, warn};

use crate::content::{
    Block, BlockKind, Collection, ContactFormBlock, PageDocument, PageResolver, RenderContext,
    SiteChrome, load_globals,
};
use crate::error::AppError;
use crate::form::{ContactForm, SubmitOutcome};
use crate::state::AppState;
use crate::store::{Depth, StoreError};

use super::helpers::{error_page, not_found_page, render_page};

/// Slug of the page served at `/`.
pub const HOME_SLUG: &str = "home";

/// Hidden form field holding the contact block's position.
pub const BLOCK_FIELD: &str = "_block";

/// Create the page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home).post(submit_home))
        .route("/{slug}", get(show).post(submit))
}

async fn home(State(state): State<AppState>) -> Response {
    let (page, chrome) = load(&state, Collection::Pages, HOME_SLUG).await;
    match page {
        Ok(Some(page)) => render_document(&state, &chrome, Collection::Pages, &page, None),
        Ok(None) => {
            debug!("no home page in the CMS, showing welcome placeholder");
            let mut context = tera::Context::new();
            context.insert("meta_title", &state.site().name);
            render_page(
                &state,
                &chrome,
                "/",
                "pages/home_welcome.html",
                StatusCode::OK,
                context,
            )
        }
        Err(e) => error_page(&state, &chrome, "/", e.into()),
    }
}

async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    view(&state, Collection::Pages, &slug).await
}

async fn submit_home(
    State(state): State<AppState>,
    Form(body): Form<HashMap<String, String>>,
) -> Response {
    handle_submission(&state, Collection::Pages, HOME_SLUG, body).await
}

async fn submit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(body): Form<HashMap<String, String>>,
) -> Response {
    handle_submission(&state, Collection::Pages, &slug, body).await
}

/// Fetch a page and the site globals concurrently through one request cache.
pub(crate) async fn load(
    state: &AppState,
    collection: Collection,
    slug: &str,
) -> (Result<Option<PageDocument>, StoreError>, SiteChrome) {
    let store = state.request_store();
    let resolver = PageResolver::new(&store);
    tokio::join!(
        resolver.resolve(collection, slug, Depth::DETAIL),
        load_globals(&store)
    )
}

/// Render a page or the matching 404/500 page.
pub(crate) async fn view(state: &AppState, collection: Collection, slug: &str) -> Response {
    let path = collection.page_path(slug);
    let (page, chrome) = load(state, collection, slug).await;
    match page {
        Ok(Some(page)) => render_document(state, &chrome, collection, &page, None),
        Ok(None) => not_found_page(state, &chrome, &path),
        Err(e) => error_page(state, &chrome, &path, e.into()),
    }
}

/// Render `page` through the block pipeline inside the site shell.
pub(crate) fn render_document(
    state: &AppState,
    chrome: &SiteChrome,
    collection: Collection,
    page: &PageDocument,
    form: Option<(usize, ContactForm)>,
) -> Response {
    let site = state.site();
    let mut ctx = RenderContext::new(collection, &page.slug)
        .development(site.environment.is_development());
    if let Some((index, form)) = form {
        ctx = ctx.with_form(index, form);
    }

    let pipeline = state.pipeline();
    let rendered = pipeline.render_page(page, &ctx, &site.name, &site.description);

    let mut context = tera::Context::new();
    context.insert("title", &rendered.title);
    context.insert("meta_title", &rendered.meta_title);
    context.insert("description", &rendered.description);
    context.insert("has_layout", &rendered.has_layout);
    context.insert("blocks", &pipeline.blocks_html(&rendered.blocks, &ctx));

    let suggestion = format!("pages/page--{}", page.slug);
    let template = state
        .theme()
        .resolve_template(&[&suggestion, "pages/page"])
        .unwrap_or_else(|| "pages/page.html".to_string());

    render_page(
        state,
        chrome,
        &ctx.action_path,
        &template,
        StatusCode::OK,
        context,
    )
}

/// Submit the contact form block named by `_block` and re-render the page.
pub(crate) async fn handle_submission(
    state: &AppState,
    collection: Collection,
    slug: &str,
    body: HashMap<String, String>,
) -> Response {
    let path = collection.page_path(slug);
    let (page, chrome) = load(state, collection, slug).await;
    let page = match page {
        Ok(Some(page)) => page,
        Ok(None) => return not_found_page(state, &chrome, &path),
        Err(e) => return error_page(state, &chrome, &path, e.into()),
    };

    let Some(index) = body.get(BLOCK_FIELD).and_then(|v| v.parse::<usize>().ok()) else {
        return AppError::BadRequest("missing or malformed block position".to_string())
            .into_response();
    };

    let Some(block) = contact_block(state, &page, index) else {
        warn!(page = %slug, index, "form posted to a position without a contact form");
        return AppError::BadRequest("no contact form at this position".to_string())
            .into_response();
    };

    let mut form = ContactForm::from_block(&block);
    form.apply_form_body(&body);

    match form.submit(state.submissions()).await {
        SubmitOutcome::Submitted => info!(page = %slug, index, "contact form submitted"),
        SubmitOutcome::Failed(message) => {
            warn!(page = %slug, index, error = %message, "contact form submission failed");
        }
        SubmitOutcome::Invalid(errors) => {
            debug!(page = %slug, index, errors = errors.len(), "contact form is invalid");
        }
        SubmitOutcome::Ignored => debug!(page = %slug, index, "duplicate submission ignored"),
    }

    render_document(state, &chrome, collection, &page, Some((index, form)))
}

/// The contact form block at `index`, if the record there is one and decodes.
fn contact_block(
    state: &AppState,
    page: &PageDocument,
    index: usize,
) -> Option<ContactFormBlock> {
    let record = page.layout.get(index)?;
    let definition = state.pipeline().registry().lookup(record.block_type())?;
    if definition.kind != BlockKind::ContactForm {
        return None;
    }
    match Block::decode(BlockKind::ContactForm, record).ok()? {
        Block::ContactForm(block) => Some(block),
        _ => None,
    }
}
