pub mod api;
pub mod bootstrap;
pub mod config;
pub mod content;
pub mod database;
pub mod engagement;
pub mod error;
pub mod node;
pub mod notifications;
pub mod target;
pub mod telemetry;
pub mod utils;
