//! Content model and block rendering.
//!
//! This module provides:
//! - PageDocument / BlockRecord: documents as delivered by the content store
//! - Block: typed block data decoded from a record
//! - BlockTypeRegistry: tag → block kind lookup
//! - BlockPipeline: ordered rendering with spacing and per-block failure isolation
//! - PageResolver: slug → page document
//! - SiteChrome: header/footer globals with built-in fallbacks

pub mod block_render;
pub mod block_types;
pub mod blocks;
pub mod globals;
pub mod page;
pub mod resolver;

pub use block_render::{
    BlockFailure, BlockOutcome, BlockPipeline, FAILED_BLOCK_MESSAGE, RenderContext, RenderedBlock,
    RenderedPage, Spacing,
};
pub use block_types::{BlockKind, BlockTypeDefinition, BlockTypeRegistry, sanitize_html};
pub use blocks::{Block, BlockError, ContactFormBlock, MediaRef};
pub use globals::{Footer, Header, SiteChrome, load_globals};
pub use page::{BlockRecord, PageDocument, PageMeta, ServiceType};
pub use resolver::{Collection, PageResolver, is_valid_slug};

use serde::{Deserialize, Deserializer};

/// Deserialize `null` as the type's default. Payload sends `null` for unset
/// arrays, groups and selects.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
