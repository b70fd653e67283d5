//! Service page routes.

use std::collections::HashMap;

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::{Router, routing::get};
use serde::Serialize;

use crate::content::{Collection, PageResolver, load_globals};
use crate::state::AppState;
use crate::store::Depth;

use super::helpers::{error_page, render_page};
use super::page::{handle_submission, view};

/// Upper bound on services shown in the listing.
const LISTING_LIMIT: u32 = 100;

/// Path of the listing page.
const SERVICES_PATH: &str = "/services";

/// One card of the services listing.
#[derive(Debug, Serialize)]
struct ServiceSummary {
    title: String,
    description: Option<String>,
    path: String,
}

/// Create the services router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(SERVICES_PATH, get(list_services))
        .route("/services/{slug}", get(show).post(submit))
}

/// Listing of every service page.
async fn list_services(State(state): State<AppState>) -> Response {
    let store = state.request_store();
    let resolver = PageResolver::new(&store);
    let (pages, chrome) = tokio::join!(
        resolver.list(Collection::ServicePages, Depth::LISTING, LISTING_LIMIT),
        load_globals(&store)
    );

    let pages = match pages {
        Ok(pages) => pages,
        Err(e) => return error_page(&state, &chrome, SERVICES_PATH, e.into()),
    };

    let services: Vec<ServiceSummary> = pages
        .iter()
        .map(|page| ServiceSummary {
            title: page.title.clone(),
            description: page.description().map(str::to_string),
            path: Collection::ServicePages.page_path(&page.slug),
        })
        .collect();

    let mut context = tera::Context::new();
    context.insert("meta_title", &format!("Our Services | {}", state.site().name));
    context.insert("services", &services);
    render_page(
        &state,
        &chrome,
        SERVICES_PATH,
        "pages/services.html",
        StatusCode::OK,
        context,
    )
}

async fn show(State(state): State<AppState>, Path(slug): Path<String>) -> Response {
    view(&state, Collection::ServicePages, &slug).await
}

async fn submit(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(body): Form<HashMap<String, String>>,
) -> Response {
    handle_submission(&state, Collection::ServicePages, &slug, body).await
}
