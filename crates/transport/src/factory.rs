//! Transport factory.
//!
//! Resolves the configured provider name to a transport implementation.

use crate::client::RetrievalTransport;
use crate::providers::{HttpTransport, MockTransport};
use std::path::Path;
use std::sync::Arc;
use tenrag_core::{AppError, AppResult, TransportConfig};
use tenrag_retrieval::RetrievedChunk;

/// Create a transport for `config.provider`.
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown, the HTTP
/// client cannot be initialized, or the mock corpus cannot be loaded.
pub fn create_transport(config: &TransportConfig) -> AppResult<Arc<dyn RetrievalTransport>> {
    match config.provider.to_lowercase().as_str() {
        "http" => {
            let transport = HttpTransport::new(config)?;
            tracing::debug!(endpoint = %config.endpoint, "Created http transport");
            Ok(Arc::new(transport))
        }
        "mock" => {
            let corpus = match config.mock_corpus {
                Some(ref path) => load_corpus(path)?,
                None => {
                    tracing::warn!("Using mock transport with an empty corpus");
                    Vec::new()
                }
            };
            tracing::debug!(chunks = corpus.len(), "Created mock transport");
            Ok(Arc::new(MockTransport::new(corpus)))
        }
        other => Err(AppError::Config(format!(
            "Unknown transport provider: {}. Supported: http, mock",
            other
        ))),
    }
}

/// Read a JSON array of chunks for the mock provider.
fn load_corpus(path: &Path) -> AppResult<Vec<RetrievedChunk>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::Config(format!("Failed to read mock corpus {:?}: {}", path, e))
    })?;

    serde_json::from_str(&contents)
        .map_err(|e| AppError::Config(format!("Failed to parse mock corpus {:?}: {}", path, e)))
}
