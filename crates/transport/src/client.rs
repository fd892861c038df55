//! Transport abstraction.

use serde::{Deserialize, Serialize};
use tenrag_core::AppResult;
use tenrag_retrieval::RetrievalRequest;

/// Which backend operation to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrievalMode {
    /// Return passages only
    Retrieve,

    /// Return passages and a generated answer from the given model
    RetrieveAndGenerate { model_arn: String },
}

impl RetrievalMode {
    pub fn is_generate(&self) -> bool {
        matches!(self, Self::RetrieveAndGenerate { .. })
    }
}

/// Trait for retrieval backends.
///
/// Implementations own serialization to the wire format, the network call,
/// and any retry policy. They return the backend's raw JSON body; shape
/// checking is left to [`tenrag_retrieval::normalize`].
#[async_trait::async_trait]
pub trait RetrievalTransport: Send + Sync {
    /// Get the provider name (e.g., "http", "mock").
    fn provider_name(&self) -> &str;

    /// Send one request and return the raw response body.
    ///
    /// # Errors
    /// `AppError::Transport` for any failure to obtain a response.
    async fn send(
        &self,
        request: &RetrievalRequest,
        mode: &RetrievalMode,
    ) -> AppResult<serde_json::Value>;
}
