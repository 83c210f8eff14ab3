//! Storefront Bridge Library
//!
//! Product query translation and pagination for a headless storefront backed
//! by a commerce platform. The `storefront-bridge` binary runs the actions
//! from the command line.

pub mod actions;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod locale;
pub mod models;

pub use actions::{ActionRequest, ActionResponse, ProductActions};
pub use error::{BackendError, BridgeError, BridgeResult};
pub use locale::Locale;
