//! Typed block data.
//!
//! A `BlockRecord` stays untyped until the pipeline has found a renderer for
//! its tag; `Block::decode` then turns the record's fields into the typed
//! shape for that kind. Decoding failures are per-block and never affect the
//! rest of the page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use super::block_types::BlockKind;
use super::null_as_default;
use super::page::BlockRecord;
use crate::form::FieldDefinition;

/// An uploaded media document as expanded by the store.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Media {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
}

/// How a block refers to an image.
///
/// At shallow depths the store returns the relation id instead of the media
/// document, so a reference is only usable once it resolves to a URL.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MediaRef {
    Id(u64),
    Url(String),
    Media(Media),
}

/// A resolved image, ready for a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl MediaRef {
    /// Resolve to a renderable image. Bare ids and strings that do not look
    /// like URLs resolve to `None`.
    pub fn resolve(&self) -> Option<Image> {
        match self {
            MediaRef::Id(_) => None,
            MediaRef::Url(url) => looks_like_url(url).then(|| Image {
                url: url.clone(),
                alt: None,
            }),
            MediaRef::Media(media) => {
                let url = media.url.as_deref().filter(|u| looks_like_url(u))?;
                Some(Image {
                    url: url.to_string(),
                    alt: media.alt.clone().filter(|a| !a.is_empty()),
                })
            }
        }
    }
}

fn looks_like_url(s: &str) -> bool {
    s.starts_with("https://")
        || s.starts_with("http://")
        || (s.starts_with('/') && !s.starts_with("//"))
}

/// Deserialize an optional media reference straight into a resolved image.
fn media<'de, D>(deserializer: D) -> Result<Option<Image>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .and_then(|v| serde_json::from_value::<MediaRef>(v).ok())
        .and_then(|r| r.resolve()))
}

/// Label and link of a call-to-action button.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cta {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
}

impl Cta {
    /// Both label and link are present and non-empty.
    pub fn is_complete(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.trim().is_empty());
        present(&self.label) && present(&self.link)
    }
}

/// Drop a CTA that is missing its label or link.
fn complete_cta<'de, D>(deserializer: D) -> Result<Option<Cta>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Cta>::deserialize(deserializer)?.filter(Cta::is_complete))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeroBlock {
    pub heading: String,
    #[serde(default)]
    pub subheading: Option<String>,
    #[serde(default, deserialize_with = "media")]
    pub image: Option<Image>,
    #[serde(default, deserialize_with = "complete_cta")]
    pub cta_button: Option<Cta>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroBlock {
    pub heading: String,
    /// Rich text (HTML), sanitized at render time.
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub alignment: Alignment,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContentLayout {
    ContentLeft,
    ContentRight,
    #[default]
    ContentOnly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default)]
    pub heading: Option<String>,
    pub content: String,
    #[serde(default, deserialize_with = "media")]
    pub image: Option<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub layout: ContentLayout,
}

impl ContentBlock {
    /// The image is only shown beside the content, never in content-only layout.
    pub fn visible_image(&self) -> Option<&Image> {
        match self.layout {
            ContentLayout::ContentOnly => None,
            ContentLayout::ContentLeft | ContentLayout::ContentRight => self.image.as_ref(),
        }
    }
}

fn default_submit_label() -> String {
    "Submit".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormBlock {
    pub heading: String,
    #[serde(default)]
    pub subheading: Option<String>,
    #[serde(default, deserialize_with = "media")]
    pub image: Option<Image>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<FieldDefinition>,
    #[serde(default = "default_submit_label")]
    pub submit_label: String,
    /// Rich text (HTML) shown after a successful submission.
    #[serde(default)]
    pub success_message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NicheCard {
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "media")]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OurNicheBlock {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: Vec<NicheCard>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Testimonial {
    pub quote: String,
    pub author: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "media")]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestimonialsBlock {
    pub heading: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub testimonials: Vec<Testimonial>,
}

/// A decoded block.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Hero(HeroBlock),
    Intro(IntroBlock),
    Content(ContentBlock),
    ContactForm(ContactFormBlock),
    OurNiche(OurNicheBlock),
    Testimonials(TestimonialsBlock),
}

/// Errors raised while turning one block record into HTML.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("invalid {block_type} block data")]
    InvalidData {
        block_type: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to render {block_type} block")]
    Template {
        block_type: &'static str,
        #[source]
        source: tera::Error,
    },
}

impl BlockError {
    /// The full cause chain, for development diagnostics.
    pub fn detail(&self) -> String {
        let mut parts = vec![self.to_string()];
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            parts.push(cause.to_string());
            source = cause.source();
        }
        parts.join(": ")
    }
}

fn decode_as<T: DeserializeOwned>(kind: BlockKind, record: &BlockRecord) -> Result<T, BlockError> {
    serde_json::from_value(Value::Object(record.fields().clone())).map_err(|source| {
        BlockError::InvalidData {
            block_type: kind.tag(),
            source,
        }
    })
}

impl Block {
    /// Decode `record` as a block of `kind`.
    pub fn decode(kind: BlockKind, record: &BlockRecord) -> Result<Self, BlockError> {
        Ok(match kind {
            BlockKind::Hero => Block::Hero(decode_as(kind, record)?),
            BlockKind::Intro => Block::Intro(decode_as(kind, record)?),
            BlockKind::Content => Block::Content(decode_as(kind, record)?),
            BlockKind::ContactForm => Block::ContactForm(decode_as(kind, record)?),
            BlockKind::OurNiche => Block::OurNiche(decode_as(kind, record)?),
            BlockKind::Testimonials => Block::Testimonials(decode_as(kind, record)?),
        })
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Hero(_) => BlockKind::Hero,
            Block::Intro(_) => BlockKind::Intro,
            Block::Content(_) => BlockKind::Content,
            Block::ContactForm(_) => BlockKind::ContactForm,
            Block::OurNiche(_) => BlockKind::OurNiche,
            Block::Testimonials(_) => BlockKind::Testimonials,
        }
    }

    /// Blocks whose collection is empty render nothing at all.
    pub fn renders_nothing(&self) -> bool {
        match self {
            Block::OurNiche(b) => b.cards.is_empty(),
            Block::Testimonials(b) => b.testimonials.is_empty(),
            _ => false,
        }
    }
}
