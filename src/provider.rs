//! Provider-facing data: Discord endpoints, client configuration, and token-error
//! classification.
//!
//! `endpoints` holds the validated endpoint set (HTTPS-only outside loopback hosts),
//! `config` the immutable [`AuthorizationConfig`] consumed by the authorization client,
//! and `classify` the heuristics that map token-endpoint failures into the crate's
//! error taxonomy.

pub mod classify;
pub mod config;
pub mod endpoints;

pub use classify::*;
pub use config::*;
pub use endpoints::*;
