//! Tenrag Core Library
//!
//! This crate provides the foundational utilities shared by the tenrag crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management (retrieval bounds, transport endpoint)

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, RetrievalConfig, TransportConfig};
pub use error::{AppError, AppResult};
