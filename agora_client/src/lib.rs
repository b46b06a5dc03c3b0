//! Per-view client core for the Agora publishing service: the continuation
//! codec, content tree, engagement cache, notification inbox and the
//! `PostViewSession` that ties them to the HTTP API.

pub mod api;
pub mod config;
pub mod content_tree;
pub mod continuation;
pub mod engagement_cache;
#[cfg(test)]
mod fake_api;
pub mod models;
pub mod notifications;
pub mod session;

pub use api::{ApiClient, ClientError, ContentApi};
pub use config::ClientConfig;
pub use session::{PostViewSession, SessionStatus};
