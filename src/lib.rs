//! Terminal client for the rental marketplace REST API.
//!
//! Fetches listings, runs them through the client-side
//! filter → sort → paginate pipeline, and keeps the viewer's favorites and
//! session in sync with the server.

pub mod api;
pub mod config;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod models;
pub mod notify;
pub mod pipeline;
pub mod render;
pub mod session;

pub use error::{ApiError, Result};
