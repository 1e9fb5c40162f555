//! Shared utilities, configuration, and error handling for Lexbridge
//!
//! This crate provides common functionality used across the Lexbridge application:
//! - Configuration management following 12-factor principles
//! - Error types and handling
//! - State machine error types
//! - Pagination for list queries

pub mod config;
pub mod db;
pub mod error;
pub mod pagination;
pub mod state;

pub use config::Config;
pub use db::RepositoryError;
pub use error::{Error, Result};
pub use pagination::Pagination;
pub use state::StateError;
