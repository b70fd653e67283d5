//! Shared route helpers for page rendering.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use chrono::Datelike;
use serde::Serialize;

use crate::content::SiteChrome;
use crate::error::AppError;
use crate::state::AppState;

/// Social link as shown in the footer.
#[derive(Debug, Serialize)]
struct SocialEntry<'a> {
    url: &'a str,
    label: &'static str,
}

/// Inject site-wide context variables into a Tera context.
///
/// Adds: `site_name`, `site_description`, `header`, `header_cta`, `footer`,
/// `copyright`, `social_links`, `current_path`
pub fn inject_site_context(
    state: &AppState,
    chrome: &SiteChrome,
    current_path: &str,
    context: &mut tera::Context,
) {
    let site = state.site();
    context.insert("site_name", &site.name);
    context.insert("site_description", &site.description);
    context.insert("current_path", current_path);

    context.insert("header", &chrome.header);
    context.insert("header_cta", &chrome.header.cta());

    let year = chrono::Utc::now().year();
    context.insert("footer", &chrome.footer);
    context.insert("copyright", &chrome.footer.copyright_line(year, &site.name));

    let social: Vec<SocialEntry<'_>> = chrome
        .footer
        .social_links
        .iter()
        .map(|s| SocialEntry {
            url: &s.url,
            label: s.platform.label(),
        })
        .collect();
    context.insert("social_links", &social);
}

/// Render a full page template inside the site shell.
///
/// `meta_title` and `description` default to the site name and description
/// when the caller has not set them.
pub fn render_shell(
    state: &AppState,
    chrome: &SiteChrome,
    current_path: &str,
    template: &str,
    mut context: tera::Context,
) -> Result<String, AppError> {
    inject_site_context(state, chrome, current_path, &mut context);
    if !context.contains_key("meta_title") {
        context.insert("meta_title", &state.site().name);
    }
    if !context.contains_key("description") {
        context.insert("description", &state.site().description);
    }
    Ok(state.theme().render(template, &context)?)
}

/// Render `template` and respond with `status`, falling back to a plain error.
pub fn render_page(
    state: &AppState,
    chrome: &SiteChrome,
    current_path: &str,
    template: &str,
    status: StatusCode,
    context: tera::Context,
) -> Response {
    match render_shell(state, chrome, current_path, template, context) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => e.into_response(),
    }
}

/// Themed 404 page.
pub fn not_found_page(state: &AppState, chrome: &SiteChrome, current_path: &str) -> Response {
    AppError::NotFound.log();
    let mut context = tera::Context::new();
    context.insert("meta_title", &format!("Page Not Found | {}", state.site().name));
    render_page(
        state,
        chrome,
        current_path,
        "pages/not_found.html",
        StatusCode::NOT_FOUND,
        context,
    )
}

/// Themed 500 page; `error` is logged and never shown.
pub fn error_page(
    state: &AppState,
    chrome: &SiteChrome,
    current_path: &str,
    error: AppError,
) -> Response {
    error.log();
    let mut context = tera::Context::new();
    context.insert("meta_title", &format!("Error | {}", state.site().name));
    render_page(
        state,
        chrome,
        current_path,
        "pages/error.html",
        error.status(),
        context,
    )
}

/// HTML-escape a string for safe output.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
