//! Typed HTTP clients for the auth and social-data backends.
//!
//! Endpoint modules are pure request shaping: they build the path,
//! attach the body or query, and unwrap the response envelope. All
//! cross-cutting behavior (bearer credentials, 401 teardown, timeouts)
//! lives in [`client::ApiClient`].

pub mod auth;
pub mod chat;
pub mod client;
pub mod comments;
pub mod error;
pub mod follows;
pub mod likes;
pub mod posts;

pub use client::{ApiClient, ApiConfig, UnauthorizedHook};
pub use error::ApiError;
