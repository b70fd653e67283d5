#![allow(clippy::unwrap_used, clippy::expect_used)]
//! Common test utilities for integration tests.
//!
//! [`TestApp`] wires the REAL kernel router and state over an in-memory
//! content store and a scripted submission client, so requests go through
//! the same handlers, templates and block pipeline as the server.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

use tessera_kernel::config::Environment;
use tessera_kernel::store::ContentStore;
use tessera_kernel::theme::ThemeEngine;
use tessera_kernel::{AppState, SiteSettings, routes};
use tessera_test_utils::{ScriptedSubmissionClient, seeded_store};

/// Site name used by every test app.
pub const SITE_NAME: &str = "Test Consultants";

/// Test application wrapper using the REAL kernel routes and state.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub submissions: Arc<ScriptedSubmissionClient>,
}

impl TestApp {
    /// App over the seeded store, in production mode.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> TestAppBuilder {
        TestAppBuilder {
            store: Arc::new(seeded_store()),
            submissions: ScriptedSubmissionClient::new(),
            theme: None,
            environment: Environment::Production,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `path`, returning the status and body text.
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let response = self
            .request(Request::get(path).body(Body::empty()).unwrap())
            .await;
        let status = response.status();
        (status, body_string(response).await)
    }

    /// POST an urlencoded form to `path`, returning the status and body text.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> (StatusCode, String) {
        let body = fields
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let response = self
            .request(
                Request::post(path)
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        let status = response.status();
        (status, body_string(response).await)
    }
}

pub struct TestAppBuilder {
    store: Arc<dyn ContentStore>,
    submissions: ScriptedSubmissionClient,
    theme: Option<ThemeEngine>,
    environment: Environment,
}

impl TestAppBuilder {
    pub fn store(mut self, store: Arc<dyn ContentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn submissions(mut self, submissions: ScriptedSubmissionClient) -> Self {
        self.submissions = submissions;
        self
    }

    pub fn theme(mut self, theme: ThemeEngine) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn development(mut self) -> Self {
        self.environment = Environment::Development;
        self
    }

    pub fn build(self) -> TestApp {
        let theme = match self.theme {
            Some(theme) => theme,
            None => ThemeEngine::builtin().expect("built-in templates compile"),
        };
        let submissions = Arc::new(self.submissions);
        let site = SiteSettings {
            name: SITE_NAME.to_string(),
            environment: self.environment,
            ..SiteSettings::default()
        };
        let state = AppState::from_parts(
            self.store,
            Arc::new(theme),
            submissions.clone(),
            site,
            static_dir(),
        );
        let router = routes::router().with_state(state.clone());
        TestApp {
            router,
            state,
            submissions,
        }
    }
}

/// The repository's static assets directory.
pub fn static_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/../../static"))
}

/// Collect a response body into a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}
