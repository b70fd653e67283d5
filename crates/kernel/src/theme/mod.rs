//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering with template suggestion resolution
//! and a built-in template set.

mod engine;

pub use engine::ThemeEngine;
