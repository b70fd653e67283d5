//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use url::Url;

/// Runtime environment. Controls whether block failure details are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Parse an `APP_ENV` value. Anything other than a development alias is
    /// treated as production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Where page and global documents come from.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Payload-style REST API.
    Rest {
        /// Base URL of the content API (without the `/api` suffix).
        base_url: Url,
        /// Optional `Authorization` header value sent with every request.
        auth: Option<String>,
    },
    /// JSON fixtures file loaded into memory at startup.
    Fixtures(PathBuf),
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Site name used in titles and the default copyright line.
    pub site_name: String,

    /// Fallback meta description.
    pub site_description: String,

    /// Runtime environment (default: production).
    pub environment: Environment,

    /// Content store backend.
    pub content_source: ContentSource,

    /// URL the contact form posts its JSON payload to.
    pub contact_endpoint: Url,

    /// Optional directory of Tera templates overriding the built-in theme.
    pub templates_dir: Option<PathBuf>,

    /// Directory for static assets (default: ./static).
    pub static_dir: PathBuf,

    /// Timeout for outbound HTTP calls, in seconds (default: 10).
    pub http_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let site_name = env::var("SITE_NAME").unwrap_or_else(|_| DEFAULT_SITE_NAME.to_string());

        let site_description =
            env::var("SITE_DESCRIPTION").unwrap_or_else(|_| DEFAULT_SITE_DESCRIPTION.to_string());

        let environment = Environment::parse(&env::var("APP_ENV").unwrap_or_default());

        let api_url = env::var("CONTENT_API_URL")
            .unwrap_or_else(|_| "http://localhost:3001".to_string());
        let base_url = Url::parse(&api_url).context("CONTENT_API_URL must be a valid URL")?;

        let content_source = match env::var("CONTENT_FIXTURES") {
            Ok(path) if !path.trim().is_empty() => ContentSource::Fixtures(PathBuf::from(path)),
            _ => ContentSource::Rest {
                base_url: base_url.clone(),
                auth: env::var("CONTENT_API_AUTH").ok().filter(|s| !s.is_empty()),
            },
        };

        let contact_endpoint = match env::var("CONTACT_ENDPOINT") {
            Ok(v) => Url::parse(&v).context("CONTACT_ENDPOINT must be a valid URL")?,
            Err(_) => default_contact_endpoint(&base_url)?,
        };

        let templates_dir = env::var("TEMPLATES_DIR").ok().map(PathBuf::from);

        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./static"));

        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("HTTP_TIMEOUT_SECS must be a valid u64")?;

        Ok(Self {
            port,
            site_name,
            site_description,
            environment,
            content_source,
            contact_endpoint,
            templates_dir,
            static_dir,
            http_timeout_secs,
        })
    }
}

/// `{base}/api/contact`, keeping any path prefix on `base`.
fn default_contact_endpoint(base_url: &Url) -> Result<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| anyhow::anyhow!("CONTENT_API_URL {base_url} cannot be a base URL"))?
        .pop_if_empty()
        .extend(["api", "contact"]);
    Ok(url)
}

/// Default site name.
pub const DEFAULT_SITE_NAME: &str = "Hybrid Wealth Consultants";

/// Default meta description.
pub const DEFAULT_SITE_DESCRIPTION: &str = "Professional services for insurance, accounting, \
     wealth management, healthcare planning, and property.";
