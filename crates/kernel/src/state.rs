//! Application state shared across all handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

use crate::config::{
    Config, ContentSource, DEFAULT_SITE_DESCRIPTION, DEFAULT_SITE_NAME, Environment,
};
use crate::content::{BlockPipeline, BlockTypeRegistry};
use crate::form::{HttpSubmissionClient, SubmissionClient};
use crate::store::{CachedStore, ContentStore, MemoryContentStore, RestContentStore};
use crate::theme::ThemeEngine;

/// Site-wide settings used when rendering pages.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub name: String,
    pub description: String,
    pub environment: Environment,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            name: DEFAULT_SITE_NAME.to_string(),
            description: DEFAULT_SITE_DESCRIPTION.to_string(),
            environment: Environment::Production,
        }
    }
}

impl SiteSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            name: config.site_name.clone(),
            description: config.site_description.clone(),
            environment: config.environment,
        }
    }
}

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Backing content store. Handlers read through `request_store`.
    store: Arc<dyn ContentStore>,

    /// Theme engine for template rendering.
    theme: Arc<ThemeEngine>,

    /// Block registry + theme.
    pipeline: BlockPipeline,

    /// Delivery of contact form submissions.
    submissions: Arc<dyn SubmissionClient>,

    site: SiteSettings,

    /// Directory served under `/static`.
    static_dir: PathBuf,
}

impl AppState {
    /// Build state from configuration: content store, templates and clients.
    pub fn new(config: &Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.http_timeout_secs);

        let store: Arc<dyn ContentStore> = match &config.content_source {
            ContentSource::Rest { base_url, auth } => {
                info!(%base_url, "using content API");
                Arc::new(
                    RestContentStore::new(base_url.clone(), auth.clone(), timeout)
                        .context("failed to create content API client")?,
                )
            }
            ContentSource::Fixtures(path) => {
                info!(path = %path.display(), "using content fixtures");
                Arc::new(MemoryContentStore::from_file(path)?)
            }
        };

        let theme = match &config.templates_dir {
            Some(dir) => {
                info!(?dir, "loading templates from directory");
                ThemeEngine::new(dir)
                    .with_context(|| format!("failed to load templates from {}", dir.display()))?
            }
            None => ThemeEngine::builtin().context("failed to create theme engine")?,
        };

        let submissions = Arc::new(
            HttpSubmissionClient::new(config.contact_endpoint.clone(), timeout)
                .context("failed to create submission client")?,
        );

        Ok(Self::from_parts(
            store,
            Arc::new(theme),
            submissions,
            SiteSettings::from_config(config),
            config.static_dir.clone(),
        ))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        store: Arc<dyn ContentStore>,
        theme: Arc<ThemeEngine>,
        submissions: Arc<dyn SubmissionClient>,
        site: SiteSettings,
        static_dir: PathBuf,
    ) -> Self {
        let registry = Arc::new(BlockTypeRegistry::with_standard_types());
        let pipeline = BlockPipeline::new(registry, theme.clone());
        Self {
            inner: Arc::new(AppStateInner {
                store,
                theme,
                pipeline,
                submissions,
                site,
                static_dir,
            }),
        }
    }

    /// The backing content store, without request caching.
    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.inner.store
    }

    /// A fresh request-scoped cache over the content store.
    pub fn request_store(&self) -> CachedStore {
        CachedStore::new(self.inner.store.clone())
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    pub fn pipeline(&self) -> &BlockPipeline {
        &self.inner.pipeline
    }

    pub fn submissions(&self) -> &dyn SubmissionClient {
        self.inner.submissions.as_ref()
    }

    pub fn site(&self) -> &SiteSettings {
        &self.inner.site
    }

    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }
}
