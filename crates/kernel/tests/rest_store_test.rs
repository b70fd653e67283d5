#![allow(clippy::unwrap_used, clippy::expect_used)]
//! REST content store and submission client against a local fake CMS.

mod common;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};
use url::Url;

use common::{SITE_NAME, static_dir};
use tessera_kernel::form::{
    HttpSubmissionClient, SubmissionClient, SubmissionError, UNREADABLE_REJECTION,
};
use tessera_kernel::store::{ContentStore, Depth, Query as StoreQuery, RestContentStore, StoreError};
use tessera_kernel::theme::ThemeEngine;
use tessera_kernel::{AppState, SiteSettings, routes};
use tessera_test_utils::{ScriptedSubmissionClient, assert, blocks, test_page};

/// What the fake CMS saw.
#[derive(Clone, Default)]
struct Seen {
    queries: Arc<Mutex<Vec<(String, HashMap<String, String>)>>>,
    auth: Arc<Mutex<Vec<Option<String>>>>,
    submissions: Arc<Mutex<Vec<Value>>>,
}

async fn find(
    State(seen): State<Seen>,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    seen.auth.lock().push(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    );
    seen.queries.lock().push((collection.clone(), params.clone()));

    match collection.as_str() {
        "pages" => {
            let docs = match params.get("where[slug][equals]").map(String::as_str) {
                Some("home") => vec![
                    test_page("Home", "home")
                        .with_block(blocks::hero("Served over HTTP"))
                        .build(),
                ],
                _ => Vec::new(),
            };
            Json(json!({ "docs": docs, "totalDocs": docs.len() })).into_response()
        }
        "broken" => (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable").into_response(),
        "garbled" => (StatusCode::OK, "not json").into_response(),
        _ => (StatusCode::NOT_FOUND, Json(json!({ "errors": [] }))).into_response(),
    }
}

async fn global(Path(slug): Path<String>) -> Response {
    match slug.as_str() {
        "footer" => Json(json!({ "copyrightText": "© {year} From the CMS" })).into_response(),
        "broken" => StatusCode::BAD_GATEWAY.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn contact(State(seen): State<Seen>, Json(payload): Json<Value>) -> Response {
    seen.submissions.lock().push(payload.clone());
    match payload["email"].as_str() {
        Some("blocked@example.com") => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "Email is blocked" })),
        )
            .into_response(),
        Some("crash@example.com") => {
            (StatusCode::INTERNAL_SERVER_ERROR, "<h1>oops</h1>").into_response()
        }
        _ => Json(json!({ "ok": true })).into_response(),
    }
}

/// Start the fake CMS on an ephemeral port.
async fn fake_cms() -> (Url, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/api/globals/{slug}", get(global))
        .route("/api/contact", post(contact))
        .route("/api/{collection}", get(find))
        .with_state(seen.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (Url::parse(&format!("http://{addr}")).unwrap(), seen)
}

fn rest_store(base: &Url, auth: Option<&str>) -> RestContentStore {
    RestContentStore::new(
        base.clone(),
        auth.map(str::to_string),
        Duration::from_secs(5),
    )
    .unwrap()
}

#[tokio::test]
async fn find_sends_payload_query() {
    let (base, seen) = fake_cms().await;
    let store = rest_store(&base, Some("users API-Key secret"));

    let docs = store
        .find("pages", &StoreQuery::field_equals("slug", "home", Depth::DETAIL))
        .await
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["slug"], "home");

    let queries = seen.queries.lock().clone();
    let (collection, params) = &queries[0];
    assert_eq!(collection, "pages");
    assert_eq!(params["where[slug][equals]"], "home");
    assert_eq!(params["depth"], "2");
    assert!(!params.contains_key("limit"));
    assert_eq!(
        seen.auth.lock()[0].as_deref(),
        Some("users API-Key secret")
    );
}

#[tokio::test]
async fn find_all_sends_limit() {
    let (base, seen) = fake_cms().await;
    let store = rest_store(&base, None);

    let docs = store
        .find("service-pages", &StoreQuery::all(Depth::LISTING).limit(100))
        .await;
    // Unknown collections are a 404 from the CMS.
    assert!(matches!(docs, Err(StoreError::Status { status: 404, .. })));

    let queries = seen.queries.lock().clone();
    assert_eq!(queries[0].1["limit"], "100");
    assert_eq!(queries[0].1["depth"], "1");
    assert_eq!(seen.auth.lock()[0], None);
}

#[tokio::test]
async fn find_reports_status_and_decode_errors() {
    let (base, _) = fake_cms().await;
    let store = rest_store(&base, None);

    match store.find("broken", &StoreQuery::all(Depth::LISTING)).await {
        Err(StoreError::Status { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "database unavailable");
        }
        other => panic!("expected status error, got {other:?}"),
    }

    let garbled = store.find("garbled", &StoreQuery::all(Depth::LISTING)).await;
    assert!(matches!(garbled, Err(StoreError::Decode(_))));
}

#[tokio::test]
async fn missing_global_is_absent() {
    let (base, _) = fake_cms().await;
    let store = rest_store(&base, None);

    assert!(store.find_global("header").await.unwrap().is_none());
    let footer = store.find_global("footer").await.unwrap().unwrap();
    assert_eq!(footer["copyrightText"], "© {year} From the CMS");
    assert!(matches!(
        store.find_global("broken").await,
        Err(StoreError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn unreachable_store_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    drop(listener);

    let base = Url::parse(&format!("http://{addr}")).unwrap();
    let store = rest_store(&base, None);
    assert!(matches!(
        store.find("pages", &StoreQuery::all(Depth::LISTING)).await,
        Err(StoreError::Transport(_))
    ));
    assert!(!store.ping().await);
}

#[tokio::test]
async fn site_renders_from_rest_store() {
    let (base, _) = fake_cms().await;
    let state = AppState::from_parts(
        Arc::new(rest_store(&base, None)),
        Arc::new(ThemeEngine::builtin().unwrap()),
        Arc::new(ScriptedSubmissionClient::new()),
        SiteSettings {
            name: SITE_NAME.to_string(),
            ..SiteSettings::default()
        },
        static_dir(),
    );
    let app = routes::router().with_state(state);

    let response = tower::ServiceExt::oneshot(
        app,
        axum::http::Request::get("/")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_string(response).await;
    assert::contains(&body, "Served over HTTP");
    assert::contains(&body, "From the CMS");
    // Header global is missing upstream, so the fallback nav renders.
    assert::contains(&body, "has-submenu");
}

fn payload(email: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("name".into(), json!("Ana"));
    map.insert("email".into(), json!(email));
    map.insert("consent".into(), json!(true));
    map
}

async fn submission_client() -> (HttpSubmissionClient, Seen) {
    let (base, seen) = fake_cms().await;
    let client =
        HttpSubmissionClient::new(base.join("/api/contact").unwrap(), Duration::from_secs(5))
            .unwrap();
    (client, seen)
}

#[tokio::test]
async fn submission_posts_json() {
    let (client, seen) = submission_client().await;

    client.submit(&payload("ana@example.com")).await.unwrap();

    let received = seen.submissions.lock().clone();
    assert_eq!(
        received,
        vec![json!({ "name": "Ana", "email": "ana@example.com", "consent": true })]
    );
}

#[tokio::test]
async fn submission_rejections() {
    let (client, _) = submission_client().await;

    assert_eq!(
        client.submit(&payload("blocked@example.com")).await,
        Err(SubmissionError::Rejected("Email is blocked".to_string()))
    );
    assert_eq!(
        client.submit(&payload("crash@example.com")).await,
        Err(SubmissionError::Rejected(UNREADABLE_REJECTION.to_string()))
    );
}

#[tokio::test]
async fn submission_network_failure() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let endpoint = Url::parse(&format!("http://{addr}/api/contact")).unwrap();
    let client = HttpSubmissionClient::new(endpoint, Duration::from_secs(5)).unwrap();
    let result = client.submit(&payload("ana@example.com")).await;
    assert!(matches!(result, Err(SubmissionError::Network(ref m)) if !m.is_empty()));
}
