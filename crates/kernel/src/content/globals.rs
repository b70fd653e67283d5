//! Header and footer global documents.
//!
//! Both are fetched once per request and shared by everything rendered in
//! it. A missing, empty, failed or undecodable document falls back to the
//! built-in default so the page shell always renders.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::blocks::Cta;
use super::null_as_default;
use crate::store::{ContentStore, Document, StoreError};

pub const HEADER_GLOBAL: &str = "header";
pub const FOOTER_GLOBAL: &str = "footer";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub link: String,
}

impl Link {
    fn new(label: &str, link: &str) -> Self {
        Self {
            label: label.to_string(),
            link: link.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavItem {
    pub label: String,
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub submenu: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    #[serde(default, deserialize_with = "null_as_default")]
    pub nav_items: Vec<NavItem>,
    #[serde(default)]
    pub cta_button: Option<Cta>,
}

impl Header {
    /// Built-in header used when the CMS has none.
    pub fn fallback() -> Self {
        let nav = |label: &str, link: &str, submenu: Vec<Link>| NavItem {
            label: label.to_string(),
            link: link.to_string(),
            submenu,
        };
        Self {
            nav_items: vec![
                nav("Home", "/", Vec::new()),
                nav("About", "/about", Vec::new()),
                nav(
                    "Services",
                    "/services",
                    vec![
                        Link::new("Insurance", "/services/insurance"),
                        Link::new("Accounting", "/services/accounting"),
                        Link::new("Wealth Management", "/services/wealth"),
                    ],
                ),
                nav("Contact", "/contact", Vec::new()),
            ],
            cta_button: Some(Cta {
                label: Some("Get in touch".to_string()),
                link: Some("/contact".to_string()),
            }),
        }
    }

    /// The CTA, only when both label and link are set.
    pub fn cta(&self) -> Option<&Cta> {
        self.cta_button.as_ref().filter(|c| c.is_complete())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FooterColumn {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialPlatform {
    Linkedin,
    Twitter,
    Facebook,
    Instagram,
    Youtube,
}

impl SocialPlatform {
    pub fn label(self) -> &'static str {
        match self {
            SocialPlatform::Linkedin => "LinkedIn",
            SocialPlatform::Twitter => "Twitter",
            SocialPlatform::Facebook => "Facebook",
            SocialPlatform::Instagram => "Instagram",
            SocialPlatform::Youtube => "YouTube",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: SocialPlatform,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Footer {
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<FooterColumn>,
    /// May contain `{year}` placeholders.
    #[serde(default)]
    pub copyright_text: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub social_links: Vec<SocialLink>,
}

impl Footer {
    /// Built-in footer used when the CMS has none.
    pub fn fallback() -> Self {
        Self {
            columns: vec![
                FooterColumn {
                    title: "Company".to_string(),
                    links: vec![
                        Link::new("About Us", "/about"),
                        Link::new("Our Team", "/about#team"),
                        Link::new("Contact", "/contact"),
                    ],
                },
                FooterColumn {
                    title: "Services".to_string(),
                    links: vec![
                        Link::new("Insurance", "/services/insurance"),
                        Link::new("Accounting", "/services/accounting"),
                        Link::new("Wealth Management", "/services/wealth"),
                    ],
                },
            ],
            copyright_text: None,
            social_links: Vec::new(),
        }
    }

    /// Copyright line with every `{year}` replaced.
    pub fn copyright_line(&self, year: i32, site_name: &str) -> String {
        match self.copyright_text.as_deref().filter(|t| !t.trim().is_empty()) {
            Some(text) => text.replace("{year}", &year.to_string()),
            None => format!("© {year} {site_name}. All rights reserved."),
        }
    }
}

/// Header and footer for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SiteChrome {
    pub header: Header,
    pub footer: Footer,
}

impl SiteChrome {
    pub fn fallback() -> Self {
        Self {
            header: Header::fallback(),
            footer: Footer::fallback(),
        }
    }
}

fn is_empty_document(doc: &Document) -> bool {
    match doc {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn decode_or_fallback<T>(
    slug: &str,
    result: Result<Option<Document>, StoreError>,
    fallback: fn() -> T,
) -> T
where
    T: serde::de::DeserializeOwned,
{
    match result {
        Ok(Some(doc)) if !is_empty_document(&doc) => match serde_json::from_value(doc) {
            Ok(decoded) => decoded,
            Err(e) => {
                warn!(global = %slug, error = %e, "undecodable global, using default");
                fallback()
            }
        },
        Ok(_) => fallback(),
        Err(e) => {
            warn!(global = %slug, error = %e, "failed to fetch global, using default");
            fallback()
        }
    }
}

/// Fetch header and footer concurrently. Never fails.
pub async fn load_globals(store: &dyn ContentStore) -> SiteChrome {
    let (header, footer) = tokio::join!(
        store.find_global(HEADER_GLOBAL),
        store.find_global(FOOTER_GLOBAL)
    );
    SiteChrome {
        header: decode_or_fallback(HEADER_GLOBAL, header, Header::fallback),
        footer: decode_or_fallback(FOOTER_GLOBAL, footer, Footer::fallback),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::store::MemoryContentStore;
    use serde_json::json;

    #[test]
    fn copyright_replaces_every_year() {
        let footer = Footer {
            copyright_text: Some("© {year} X. Since {year}.".into()),
            ..Footer::fallback()
        };
        assert_eq!(footer.copyright_line(2026, "Site"), "© 2026 X. Since 2026.");
    }

    #[test]
    fn copyright_default_line() {
        assert_eq!(
            Footer::fallback().copyright_line(2026, "Hybrid Wealth Consultants"),
            "© 2026 Hybrid Wealth Consultants. All rights reserved."
        );
    }

    #[test]
    fn header_cta_needs_label_and_link() {
        let header: Header = serde_json::from_value(json!({
            "navItems": [],
            "ctaButton": { "label": "Call", "link": null }
        }))
        .unwrap();
        assert!(header.cta().is_none());
        assert!(Header::fallback().cta().is_some());
    }

    #[tokio::test]
    async fn missing_globals_fall_back() {
        let store = MemoryContentStore::new();
        assert_eq!(load_globals(&store).await, SiteChrome::fallback());
    }

    #[tokio::test]
    async fn empty_or_invalid_globals_fall_back() {
        let store = MemoryContentStore::new()
            .with_global("header", json!({}))
            .with_global("footer", json!({ "columns": "nope" }));
        assert_eq!(load_globals(&store).await, SiteChrome::fallback());
    }

    #[tokio::test]
    async fn stored_globals_are_used() {
        let store = MemoryContentStore::new()
            .with_global(
                "header",
                json!({ "navItems": [{ "label": "Blog", "link": "/blog", "submenu": null }] }),
            )
            .with_global(
                "footer",
                json!({
                    "columns": [],
                    "copyrightText": "© {year} Acme",
                    "socialLinks": [{ "platform": "linkedin", "url": "https://linkedin.com/acme" }]
                }),
            );
        let chrome = load_globals(&store).await;
        assert_eq!(chrome.header.nav_items[0].label, "Blog");
        assert!(chrome.header.cta().is_none());
        assert_eq!(
            chrome.footer.social_links[0].platform,
            SocialPlatform::Linkedin
        );
    }
}
