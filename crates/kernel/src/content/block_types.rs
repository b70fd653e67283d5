//! Block type registry.
//!
//! Provides:
//! - `BlockKind`: the closed set of block kinds the site can render
//! - `BlockTypeDefinition`: tag, label and template for one kind
//! - `BlockTypeRegistry`: tag → definition lookup used by the render pipeline
//! - `sanitize_html`: HTML sanitization via ammonia for rich-text fields

use std::collections::HashMap;

use serde::Serialize;

/// Every block kind with a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Hero,
    Intro,
    Content,
    ContactForm,
    OurNiche,
    Testimonials,
}

impl BlockKind {
    /// All kinds, in registry order.
    pub const ALL: [BlockKind; 6] = [
        BlockKind::Hero,
        BlockKind::Intro,
        BlockKind::Content,
        BlockKind::ContactForm,
        BlockKind::OurNiche,
        BlockKind::Testimonials,
    ];

    /// Map a canonical `blockType` tag to its kind.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "hero" => Some(Self::Hero),
            "intro" => Some(Self::Intro),
            "content" => Some(Self::Content),
            "contactForm" => Some(Self::ContactForm),
            "ourNiche" => Some(Self::OurNiche),
            "testimonials" => Some(Self::Testimonials),
            _ => None,
        }
    }

    /// Canonical `blockType` tag.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Intro => "intro",
            Self::Content => "content",
            Self::ContactForm => "contactForm",
            Self::OurNiche => "ourNiche",
            Self::Testimonials => "testimonials",
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Hero => "Hero",
            Self::Intro => "Intro",
            Self::Content => "Content",
            Self::ContactForm => "Contact Form",
            Self::OurNiche => "Our Niche",
            Self::Testimonials => "Testimonials",
        }
    }

    /// Base template name under `blocks/`.
    pub fn template(self) -> &'static str {
        match self {
            Self::Hero => "hero",
            Self::Intro => "intro",
            Self::Content => "content",
            Self::ContactForm => "contact_form",
            Self::OurNiche => "our_niche",
            Self::Testimonials => "testimonials",
        }
    }
}

/// Definition of a single block type.
#[derive(Debug, Clone, Serialize)]
pub struct BlockTypeDefinition {
    /// Tag as it appears in `blockType` (e.g. "hero", "contactForm").
    pub type_name: String,
    /// Kind that renders records carrying this tag.
    pub kind: BlockKind,
    /// Human-readable label (e.g. "Contact Form").
    pub label: String,
    /// Base template name under `blocks/`.
    pub template: String,
}

impl BlockTypeDefinition {
    /// Definition for a kind under its canonical tag.
    pub fn standard(kind: BlockKind) -> Self {
        Self {
            type_name: kind.tag().to_string(),
            kind,
            label: kind.label().to_string(),
            template: kind.template().to_string(),
        }
    }
}

/// Registry of block type definitions, keyed by tag.
#[derive(Debug, Clone)]
pub struct BlockTypeRegistry {
    types: HashMap<String, BlockTypeDefinition>,
}

impl Default for BlockTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTypeRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Create a registry with every standard kind plus legacy aliases.
    pub fn with_standard_types() -> Self {
        let mut registry = Self::new();
        registry.register_standard_types();
        registry
    }

    /// Register a single block type definition.
    pub fn register(&mut self, definition: BlockTypeDefinition) {
        self.types.insert(definition.type_name.clone(), definition);
    }

    /// Look up a block type by tag. A miss is expected for block types the
    /// site does not (or no longer) support.
    pub fn lookup(&self, type_name: &str) -> Option<&BlockTypeDefinition> {
        self.types.get(type_name)
    }

    /// Return the number of registered tags.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Register the six standard kinds, and `contentForm` as an alias of
    /// `contactForm` for records saved under the old block slug.
    pub fn register_standard_types(&mut self) {
        for kind in BlockKind::ALL {
            self.register(BlockTypeDefinition::standard(kind));
        }

        self.register(BlockTypeDefinition {
            type_name: "contentForm".to_string(),
            kind: BlockKind::ContactForm,
            label: "Contact Form (legacy)".to_string(),
            template: BlockKind::ContactForm.template().to_string(),
        });
    }
}

/// Sanitize HTML input using ammonia with default settings.
///
/// Strips dangerous elements like `<script>`, event handlers, and
/// other XSS vectors while preserving safe formatting tags.
pub fn sanitize_html(input: &str) -> String {
    ammonia::clean(input)
}
