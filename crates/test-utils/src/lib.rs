//! Tessera test utilities.
//!
//! Helpers for integration testing: page and block fixtures, a seeded
//! in-memory content store, counting/failing store fakes, a scripted
//! submission client, and assertion utilities.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value as JsonValue, json};

use tessera_kernel::form::{SubmissionClient, SubmissionError};
use tessera_kernel::store::{ContentStore, Document, MemoryContentStore, Query, StoreError};

/// Create a test page with an empty layout.
pub fn test_page(title: &str, slug: &str) -> TestPage {
    TestPage {
        id: 1,
        title: title.to_string(),
        slug: slug.to_string(),
        layout: Vec::new(),
        meta: None,
        extra: Map::new(),
    }
}

/// A page document builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestPage {
    pub id: u64,
    pub title: String,
    pub slug: String,
    pub layout: Vec<JsonValue>,
    pub meta: Option<JsonValue>,
    pub extra: Map<String, JsonValue>,
}

impl TestPage {
    /// Set a custom ID.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self
    }

    /// Append a block record to the layout.
    pub fn with_block(mut self, block: JsonValue) -> Self {
        self.layout.push(block);
        self
    }

    /// Set SEO metadata.
    pub fn with_meta(mut self, title: Option<&str>, description: Option<&str>) -> Self {
        self.meta = Some(json!({ "title": title, "description": description }));
        self
    }

    /// Set an arbitrary top-level field.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        self.extra.insert(name.to_string(), value);
        self
    }

    /// The document as the content store would return it.
    pub fn build(self) -> JsonValue {
        let mut doc = Map::new();
        doc.insert("id".into(), json!(self.id));
        doc.insert("title".into(), json!(self.title));
        doc.insert("slug".into(), json!(self.slug));
        doc.insert("layout".into(), JsonValue::Array(self.layout));
        if let Some(meta) = self.meta {
            doc.insert("meta".into(), meta);
        }
        doc.extend(self.extra);
        JsonValue::Object(doc)
    }
}

/// Block record builders, in the store's wire shape.
pub mod blocks {
    use serde_json::{Value, json};

    pub fn hero(heading: &str) -> Value {
        json!({ "blockType": "hero", "heading": heading })
    }

    pub fn hero_with_cta(heading: &str, label: &str, link: &str) -> Value {
        json!({
            "blockType": "hero",
            "heading": heading,
            "ctaButton": { "label": label, "link": link }
        })
    }

    pub fn intro(heading: &str, content: &str) -> Value {
        json!({ "blockType": "intro", "heading": heading, "content": content })
    }

    pub fn content(content: &str) -> Value {
        json!({ "blockType": "content", "content": content })
    }

    pub fn testimonials(heading: &str, entries: &[(&str, &str)]) -> Value {
        let entries: Vec<Value> = entries
            .iter()
            .map(|(quote, author)| json!({ "quote": quote, "author": author }))
            .collect();
        json!({ "blockType": "testimonials", "heading": heading, "testimonials": entries })
    }

    pub fn our_niche(title: &str, cards: &[&str]) -> Value {
        let cards: Vec<Value> = cards
            .iter()
            .map(|t| json!({ "title": t, "description": format!("About {t}") }))
            .collect();
        json!({ "blockType": "ourNiche", "title": title, "cards": cards })
    }

    pub fn contact_form(heading: &str, fields: Vec<Value>) -> Value {
        json!({
            "blockType": "contactForm",
            "heading": heading,
            "fields": fields,
            "submitLabel": "Send"
        })
    }

    /// A form field definition.
    pub fn field(name: &str, label: &str, field_type: &str, required: bool) -> Value {
        json!({ "name": name, "label": label, "type": field_type, "required": required })
    }

    /// A record whose tag has no renderer.
    pub fn unknown(tag: &str) -> Value {
        json!({ "blockType": tag })
    }

    /// A record with a known tag but missing required data.
    pub fn broken_intro() -> Value {
        json!({ "blockType": "intro", "content": "<p>No heading</p>" })
    }
}

/// Standard contact form: required name and email, optional message.
pub fn standard_contact_form() -> JsonValue {
    blocks::contact_form(
        "Get in touch",
        vec![
            blocks::field("name", "Name", "text", true),
            blocks::field("email", "Email", "email", true),
            blocks::field("message", "Message", "textarea", false),
        ],
    )
}

/// A store seeded with a home, about and contact page plus two services.
pub fn seeded_store() -> MemoryContentStore {
    MemoryContentStore::new()
        .with_document(
            "pages",
            test_page("Home", "home")
                .with_block(blocks::hero_with_cta("Plan with confidence", "Book a call", "/contact"))
                .with_block(blocks::intro("Who we are", "<p>Independent advisors.</p>"))
                .with_block(blocks::testimonials(
                    "Clients",
                    &[("Clear advice.", "Maria"), ("Fast work.", "Sam")],
                ))
                .build(),
        )
        .with_document(
            "pages",
            test_page("About", "about")
                .with_id(2)
                .with_meta(None, Some("About our firm"))
                .with_block(blocks::content("<p>Our story</p>"))
                .build(),
        )
        .with_document(
            "pages",
            test_page("Contact", "contact")
                .with_id(3)
                .with_block(blocks::intro("Contact us", "<p>Say hello</p>"))
                .with_block(standard_contact_form())
                .build(),
        )
        .with_document(
            "service-pages",
            test_page("Insurance", "insurance")
                .with_id(10)
                .with_meta(None, Some("Cover that fits"))
                .with_field("serviceType", json!("insurance"))
                .with_block(blocks::hero("Insurance"))
                .build(),
        )
        .with_document(
            "service-pages",
            test_page("Accounting", "accounting")
                .with_id(11)
                .with_field("serviceType", json!("accounting"))
                .with_block(blocks::hero("Accounting"))
                .build(),
        )
}

/// Store wrapper counting calls that reach the inner store.
pub struct CountingStore {
    inner: Arc<dyn ContentStore>,
    finds: AtomicUsize,
    globals: AtomicUsize,
}

impl CountingStore {
    pub fn new(inner: Arc<dyn ContentStore>) -> Self {
        Self {
            inner,
            finds: AtomicUsize::new(0),
            globals: AtomicUsize::new(0),
        }
    }

    pub fn finds(&self) -> usize {
        self.finds.load(Ordering::SeqCst)
    }

    pub fn globals(&self) -> usize {
        self.globals.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentStore for CountingStore {
    async fn find(&self, collection: &str, query: &Query) -> Result<Vec<Document>, StoreError> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        self.inner.find(collection, query).await
    }

    async fn find_global(&self, slug: &str) -> Result<Option<Document>, StoreError> {
        self.globals.fetch_add(1, Ordering::SeqCst);
        self.inner.find_global(slug).await
    }
}

/// Store whose every call fails with a transport error.
#[derive(Debug, Default)]
pub struct FailingStore;

#[async_trait]
impl ContentStore for FailingStore {
    async fn find(&self, _collection: &str, _query: &Query) -> Result<Vec<Document>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn find_global(&self, _slug: &str) -> Result<Option<Document>, StoreError> {
        Err(StoreError::Transport("connection refused".to_string()))
    }

    async fn ping(&self) -> bool {
        false
    }
}

/// Submission client returning queued results and recording every payload.
///
/// Once the queue is empty every submission succeeds.
#[derive(Default)]
pub struct ScriptedSubmissionClient {
    responses: Mutex<VecDeque<Result<(), SubmissionError>>>,
    payloads: Mutex<Vec<Map<String, JsonValue>>>,
    delay: Option<Duration>,
}

impl ScriptedSubmissionClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next submission.
    pub fn then(self, result: Result<(), SubmissionError>) -> Self {
        self.responses.lock().push_back(result);
        self
    }

    /// Hold every submission for `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Payloads received so far, in order.
    pub fn payloads(&self) -> Vec<Map<String, JsonValue>> {
        self.payloads.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.payloads.lock().len()
    }
}

#[async_trait]
impl SubmissionClient for ScriptedSubmissionClient {
    async fn submit(&self, payload: &Map<String, JsonValue>) -> Result<(), SubmissionError> {
        self.payloads.lock().push(payload.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.responses.lock().pop_front().unwrap_or(Ok(()))
    }
}

/// Assertion helpers for rendered output.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that `first` occurs before `second` in `haystack`.
    pub fn in_order(haystack: &str, first: &str, second: &str) {
        let a = haystack.find(first);
        let b = haystack.find(second);
        assert!(
            matches!((a, b), (Some(a), Some(b)) if a < b),
            "Expected '{first}' before '{second}'\nActual: {haystack}"
        );
    }
}
