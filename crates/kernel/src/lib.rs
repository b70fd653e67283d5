//! Tessera Site Kernel Library
//!
//! Block rendering pipeline, content store access and the HTTP front end.
//! The main entry point for running the server is the `tessera` binary.

pub mod config;
pub mod content;
pub mod error;
pub mod form;
pub mod routes;
pub mod state;
pub mod store;
pub mod theme;

pub use config::Config;
pub use state::{AppState, SiteSettings};
