//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use dashmap::DashMap;
use tera::Tera;
use tracing::debug;

use crate::content::sanitize_html;
use crate::routes::helpers::html_escape;

/// Templates compiled into the binary, used when no directory is configured.
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("layout/page.html", include_str!("../../templates/layout/page.html")),
    ("layout/header.html", include_str!("../../templates/layout/header.html")),
    ("layout/footer.html", include_str!("../../templates/layout/footer.html")),
    ("blocks/hero.html", include_str!("../../templates/blocks/hero.html")),
    ("blocks/intro.html", include_str!("../../templates/blocks/intro.html")),
    ("blocks/content.html", include_str!("../../templates/blocks/content.html")),
    (
        "blocks/contact_form.html",
        include_str!("../../templates/blocks/contact_form.html"),
    ),
    ("blocks/our_niche.html", include_str!("../../templates/blocks/our_niche.html")),
    (
        "blocks/testimonials.html",
        include_str!("../../templates/blocks/testimonials.html"),
    ),
    ("blocks/error.html", include_str!("../../templates/blocks/error.html")),
    ("pages/page.html", include_str!("../../templates/pages/page.html")),
    ("pages/home_welcome.html", include_str!("../../templates/pages/home_welcome.html")),
    ("pages/services.html", include_str!("../../templates/pages/services.html")),
    ("pages/not_found.html", include_str!("../../templates/pages/not_found.html")),
    ("pages/error.html", include_str!("../../templates/pages/error.html")),
];

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl ThemeEngine {
    /// Create a new theme engine loading templates from the given directory.
    ///
    /// Directory templates override built-ins of the same name, so a theme
    /// directory only needs the templates it changes or adds.
    pub fn new(template_dir: &Path) -> Result<Self> {
        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        // Parse without building inheritance: overrides may extend built-ins.
        let mut tera = Tera::parse(pattern_str).context("failed to initialize Tera templates")?;

        // `extend` only adds names not already present, so directory templates win.
        let builtin = Self::builtin()?;
        tera.extend(builtin.tera())
            .context("failed to merge built-in templates")?;

        Self::configure(&mut tera);

        debug!(
            count = tera.get_template_names().count(),
            dir = %template_dir.display(),
            "loaded templates"
        );
        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Create a theme engine with the built-in templates.
    pub fn builtin() -> Result<Self> {
        let mut tera = Tera::default();
        Self::configure(&mut tera);
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())
            .context("failed to compile built-in templates")?;
        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Escaping and filters shared by every constructor. Slashes are left
    /// unescaped so URLs in attributes stay readable.
    fn configure(tera: &mut Tera) {
        tera.set_escape_fn(html_escape);
        Self::register_filters(tera);
    }

    /// Register custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        // Rich text from the CMS; templates still need `| safe` after this.
        tera.register_filter(
            "sanitize",
            |value: &tera::Value, _args: &HashMap<String, tera::Value>| {
                let html = tera::try_get_value!("sanitize", "value", String, value);
                Ok(tera::Value::String(sanitize_html(&html)))
            },
        );
    }

    /// Get the underlying Tera instance for custom operations.
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Get a mutable reference to Tera (for adding templates at runtime).
    pub fn tera_mut(&mut self) -> &mut Tera {
        self.clear_cache();
        &mut self.tera
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    /// Results are cached for performance.
    ///
    /// Example suggestions: `["blocks/hero--about", "blocks/hero"]`
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");

        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                self.suggestion_cache
                    .insert(cache_key, template_name.clone());
                return Some(template_name);
            }

            if self.tera.get_template(suggestion).is_ok() {
                let name = (*suggestion).to_string();
                self.suggestion_cache.insert(cache_key, name.clone());
                return Some(name);
            }
        }

        // Negative results are not cached.
        None
    }

    /// Template suggestions for a block on a given page, most specific first:
    /// - `blocks/{template}--{page_slug}`
    /// - `blocks/{template}`
    pub fn block_suggestions(template: &str, page_slug: &str) -> Vec<String> {
        let mut suggestions = Vec::with_capacity(2);
        if !page_slug.is_empty() {
            suggestions.push(format!("blocks/{template}--{page_slug}"));
        }
        suggestions.push(format!("blocks/{template}"));
        suggestions
    }

    /// Render a named template.
    pub fn render(&self, template: &str, context: &tera::Context) -> Result<String, tera::Error> {
        self.tera.render(template, context)
    }

    /// Clear the suggestion cache (useful for development hot-reload).
    pub fn clear_cache(&self) {
        self.suggestion_cache.clear();
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .field("cache_size", &self.suggestion_cache.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_templates_compile() {
        let engine = ThemeEngine::builtin().unwrap();
        for (name, _) in BUILTIN_TEMPLATES {
            assert!(engine.tera().get_template(name).is_ok(), "missing {name}");
        }
    }

    #[test]
    fn block_suggestions_most_specific_first() {
        assert_eq!(
            ThemeEngine::block_suggestions("hero", "about"),
            vec!["blocks/hero--about", "blocks/hero"]
        );
        assert_eq!(
            ThemeEngine::block_suggestions("hero", ""),
            vec!["blocks/hero"]
        );
    }

    #[test]
    fn resolve_prefers_page_specific_template() {
        let mut engine = ThemeEngine::builtin().unwrap();
        engine
            .tera_mut()
            .add_raw_template("blocks/hero--about.html", "about hero")
            .unwrap();

        assert_eq!(
            engine
                .resolve_template(&["blocks/hero--about", "blocks/hero"])
                .as_deref(),
            Some("blocks/hero--about.html")
        );
        assert_eq!(
            engine
                .resolve_template(&["blocks/hero--home", "blocks/hero"])
                .as_deref(),
            Some("blocks/hero.html")
        );
        assert!(engine.resolve_template(&["blocks/carousel"]).is_none());
        assert!(engine.resolve_template(&[]).is_none());
    }

    #[test]
    fn sanitize_filter_strips_scripts() {
        let mut tera = Tera::default();
        ThemeEngine::register_filters(&mut tera);

        tera.add_raw_template("test", "{{ html | sanitize | safe }}")
            .unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("html", "<p>ok</p><script>x()</script>");
        assert_eq!(tera.render("test", &ctx).unwrap(), "<p>ok</p>");
    }

    #[test]
    fn autoescape_keeps_slashes() {
        let mut tera = Tera::default();
        ThemeEngine::configure(&mut tera);

        tera.add_raw_template("t.html", r#"<a href="{{ url }}">{{ text }}</a>"#)
            .unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("url", "/services/tax");
        ctx.insert("text", "<b>\"x\"</b>");
        assert_eq!(
            tera.render("t.html", &ctx).unwrap(),
            r#"<a href="/services/tax">&lt;b&gt;&quot;x&quot;&lt;/b&gt;</a>"#
        );
    }

    #[test]
    fn sanitize_filter_rejects_non_strings() {
        let mut tera = Tera::default();
        ThemeEngine::register_filters(&mut tera);

        tera.add_raw_template("test", "{{ n | sanitize }}").unwrap();
        let mut ctx = tera::Context::new();
        ctx.insert("n", &3);
        assert!(tera.render("test", &ctx).is_err());
    }
}
