//! Block rendering pipeline.
//!
//! Renders a page's `layout` in input order:
//! - Records whose tag has no registered renderer are skipped with a warning
//! - Each block is decoded and rendered on its own; a failure becomes a
//!   `BlockOutcome::Failed` for that position only
//! - Spacing depends on input position and kind (see `Spacing`)
//! - A single position can be re-rendered from the already-loaded records

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, warn};

use super::block_types::{BlockKind, BlockTypeRegistry};
use super::blocks::{Block, BlockError};
use super::page::{BlockRecord, PageDocument};
use super::resolver::Collection;
use crate::form::{ContactForm, FieldValue};
use crate::routes::helpers::html_escape;
use crate::theme::ThemeEngine;

/// Heading of the placeholder shown in place of a failed block.
pub const FAILED_BLOCK_MESSAGE: &str = "Block failed to render";

/// Vertical spacing applied around a rendered block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Spacing {
    None,
    Standard,
}

impl Spacing {
    /// Position 0 and hero blocks get no spacing; everything else does.
    pub fn for_position(index: usize, kind: BlockKind) -> Self {
        if index == 0 || kind == BlockKind::Hero {
            Spacing::None
        } else {
            Spacing::Standard
        }
    }

    /// CSS class for the block wrapper.
    pub fn class(self) -> &'static str {
        match self {
            Spacing::None => "",
            Spacing::Standard => "block-spacing",
        }
    }
}

/// A contained block failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockFailure {
    pub message: String,
    /// Technical detail; only shown in development.
    pub detail: String,
}

impl From<&BlockError> for BlockFailure {
    fn from(e: &BlockError) -> Self {
        Self {
            message: FAILED_BLOCK_MESSAGE.to_string(),
            detail: e.detail(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    Rendered(String),
    /// Nothing to show; no wrapper element is emitted.
    Empty,
    Failed(BlockFailure),
}

/// One entry of the pipeline output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    /// Position in the input sequence.
    pub index: usize,
    pub kind: BlockKind,
    pub spacing: Spacing,
    pub outcome: BlockOutcome,
}

/// Per-page inputs to block rendering.
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub collection: Collection,
    pub page_slug: String,
    /// URL contact forms post back to.
    pub action_path: String,
    /// Submitted form instance for the block at this position, if any.
    pub form: Option<(usize, ContactForm)>,
    pub development: bool,
}

impl RenderContext {
    pub fn new(collection: Collection, page_slug: &str) -> Self {
        Self {
            collection,
            page_slug: page_slug.to_string(),
            action_path: collection.page_path(page_slug),
            form: None,
            development: false,
        }
    }

    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    /// Render the contact form at `index` from `form` instead of a fresh instance.
    pub fn with_form(mut self, index: usize, form: ContactForm) -> Self {
        self.form = Some((index, form));
        self
    }

    /// URL of the single-block fragment for `index`.
    pub fn retry_url(&self, index: usize) -> String {
        format!(
            "/_block/{}/{}/{index}",
            self.collection.as_str(),
            urlencoding::encode(&self.page_slug)
        )
    }

    fn form_for(&self, index: usize) -> Option<&ContactForm> {
        self.form
            .as_ref()
            .filter(|(i, _)| *i == index)
            .map(|(_, f)| f)
    }
}

/// A page ready for the layout shell.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub title: String,
    /// `<title>` text.
    pub meta_title: String,
    pub description: String,
    /// False only when the page's layout has no entries at all.
    pub has_layout: bool,
    pub blocks: Vec<RenderedBlock>,
}

/// Renders block records through the registry and theme.
#[derive(Debug, Clone)]
pub struct BlockPipeline {
    registry: Arc<BlockTypeRegistry>,
    theme: Arc<ThemeEngine>,
}

impl BlockPipeline {
    pub fn new(registry: Arc<BlockTypeRegistry>, theme: Arc<ThemeEngine>) -> Self {
        Self { registry, theme }
    }

    pub fn registry(&self) -> &BlockTypeRegistry {
        &self.registry
    }

    /// Render every record in order, skipping unsupported tags.
    pub fn render(&self, records: &[BlockRecord], ctx: &RenderContext) -> Vec<RenderedBlock> {
        records
            .iter()
            .enumerate()
            .filter_map(|(index, record)| {
                let rendered = self.render_at(index, record, ctx);
                if rendered.is_none() {
                    warn!(
                        block_type = %record.block_type(),
                        index,
                        page = %ctx.page_slug,
                        "block type is not supported, skipping"
                    );
                }
                rendered
            })
            .collect()
    }

    /// Re-render the record at `index` from already-loaded data.
    ///
    /// `None` when the position does not exist or holds an unsupported tag.
    pub fn retry(
        &self,
        records: &[BlockRecord],
        index: usize,
        ctx: &RenderContext,
    ) -> Option<RenderedBlock> {
        debug!(index, page = %ctx.page_slug, "retrying block");
        self.render_at(index, records.get(index)?, ctx)
    }

    fn render_at(
        &self,
        index: usize,
        record: &BlockRecord,
        ctx: &RenderContext,
    ) -> Option<RenderedBlock> {
        let definition = self.registry.lookup(record.block_type())?;
        Some(self.render_one(index, definition.kind, &definition.template, record, ctx))
    }

    /// Render one record as `kind`, containing any failure.
    pub fn render_one(
        &self,
        index: usize,
        kind: BlockKind,
        template: &str,
        record: &BlockRecord,
        ctx: &RenderContext,
    ) -> RenderedBlock {
        let outcome = match Block::decode(kind, record).and_then(|block| {
            if block.renders_nothing() {
                Ok(None)
            } else {
                self.render_block(index, template, &block, ctx).map(Some)
            }
        }) {
            Ok(Some(html)) => BlockOutcome::Rendered(html),
            Ok(None) => BlockOutcome::Empty,
            Err(e) => {
                error!(
                    block_type = %kind.tag(),
                    index,
                    page = %ctx.page_slug,
                    error = %e.detail(),
                    "block failed to render"
                );
                BlockOutcome::Failed(BlockFailure::from(&e))
            }
        };

        RenderedBlock {
            index,
            kind,
            spacing: Spacing::for_position(index, kind),
            outcome,
        }
    }

    fn render_block(
        &self,
        index: usize,
        template: &str,
        block: &Block,
        ctx: &RenderContext,
    ) -> Result<String, BlockError> {
        let mut context = tera::Context::new();
        context.insert("index", &index);
        context.insert("page_slug", &ctx.page_slug);

        match block {
            Block::Hero(b) => context.insert("block", b),
            Block::Intro(b) => context.insert("block", b),
            Block::Content(b) => {
                context.insert("block", b);
                context.insert("image", &b.visible_image());
            }
            Block::ContactForm(b) => {
                context.insert("block", b);
                let fresh;
                let form = match ctx.form_for(index) {
                    Some(form) => form,
                    None => {
                        fresh = ContactForm::from_block(b);
                        &fresh
                    }
                };
                insert_form(&mut context, form, &ctx.action_path);
            }
            Block::OurNiche(b) => context.insert("block", b),
            Block::Testimonials(b) => context.insert("block", b),
        }

        let suggestions = ThemeEngine::block_suggestions(template, &ctx.page_slug);
        let refs: Vec<&str> = suggestions.iter().map(String::as_str).collect();
        let name = self
            .theme
            .resolve_template(&refs)
            .unwrap_or_else(|| format!("blocks/{template}.html"));

        self.theme
            .render(&name, &context)
            .map_err(|source| BlockError::Template {
                block_type: block.kind().tag(),
                source,
            })
    }

    /// Decode metadata and render the layout of `page`.
    pub fn render_page(
        &self,
        page: &PageDocument,
        ctx: &RenderContext,
        site_name: &str,
        site_description: &str,
    ) -> RenderedPage {
        RenderedPage {
            title: page.title.clone(),
            meta_title: page.document_title(site_name),
            description: page
                .description()
                .unwrap_or(site_description)
                .to_string(),
            has_layout: !page.layout.is_empty(),
            blocks: self.render(&page.layout, ctx),
        }
    }

    /// HTML for one rendered block, including its wrapper element.
    pub fn block_html(&self, block: &RenderedBlock, ctx: &RenderContext) -> String {
        let inner = match &block.outcome {
            BlockOutcome::Empty => return String::new(),
            BlockOutcome::Rendered(html) => html.clone(),
            BlockOutcome::Failed(failure) => self.failure_html(block.index, failure, ctx),
        };

        let mut class = format!("block block-{}", block.kind.tag());
        if block.spacing == Spacing::Standard {
            class.push(' ');
            class.push_str(block.spacing.class());
        }
        format!(
            "<div id=\"block-{index}\" class=\"{class}\" data-block-index=\"{index}\">{inner}</div>",
            index = block.index
        )
    }

    /// HTML for a sequence of rendered blocks, in order.
    pub fn blocks_html(&self, blocks: &[RenderedBlock], ctx: &RenderContext) -> String {
        blocks
            .iter()
            .map(|block| self.block_html(block, ctx))
            .collect()
    }

    fn failure_html(&self, index: usize, failure: &BlockFailure, ctx: &RenderContext) -> String {
        let mut context = tera::Context::new();
        context.insert("failure", failure);
        context.insert("development", &ctx.development);
        context.insert("retry_url", &ctx.retry_url(index));

        match self.theme.render("blocks/error.html", &context) {
            Ok(html) => html,
            Err(e) => {
                error!(error = %e, "failed to render block error template");
                format!(
                    "<div class=\"block-error\" role=\"alert\"><h4>{}</h4></div>",
                    html_escape(&failure.message)
                )
            }
        }
    }
}

fn insert_form(context: &mut tera::Context, form: &ContactForm, action: &str) {
    let values: HashMap<&str, FieldValue> = form
        .fields()
        .iter()
        .filter_map(|f| Some((f.name.as_str(), form.value(&f.name)?)))
        .collect();
    let field_errors: HashMap<&str, &str> = form
        .errors()
        .iter()
        .filter_map(|e| Some((e.field.as_deref()?, e.message.as_str())))
        .collect();

    context.insert("form_state", form.state());
    context.insert("values", &values);
    context.insert("field_errors", &field_errors);
    context.insert("action", action);
}
