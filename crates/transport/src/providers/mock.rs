//! Mock transport backed by an in-memory corpus.

use crate::client::{RetrievalMode, RetrievalTransport};
use serde_json::json;
use std::sync::Mutex;
use tenrag_core::{AppError, AppResult};
use tenrag_retrieval::{RetrievalRequest, RetrievedChunk};

/// Mock backend for testing and offline runs.
///
/// Applies the request filter to each chunk's metadata the way the real
/// backend would, keeps corpus order, truncates to the requested count, and
/// answers in the same JSON shape as the runtime API.
#[derive(Debug, Default)]
pub struct MockTransport {
    corpus: Vec<RetrievedChunk>,
    answer: Option<String>,
    failure: Option<String>,
    sent: Mutex<Vec<RetrievalRequest>>,
}

impl MockTransport {
    /// Create a mock over `corpus`.
    pub fn new(corpus: Vec<RetrievedChunk>) -> Self {
        Self {
            corpus,
            ..Default::default()
        }
    }

    /// Fixed answer returned in retrieve-and-generate mode.
    pub fn with_answer(mut self, answer: impl Into<String>) -> Self {
        self.answer = Some(answer.into());
        self
    }

    /// Make every call fail with a transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Default::default()
        }
    }

    /// Requests received so far.
    pub fn sent_requests(&self) -> Vec<RetrievalRequest> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    fn reference(chunk: &RetrievedChunk) -> serde_json::Value {
        let mut reference = json!({
            "content": { "text": chunk.text },
            "location": {
                "type": "CUSTOM",
                "customDocumentLocation": { "id": chunk.source_id }
            },
            "metadata": chunk.metadata,
        });
        if let Some(score) = chunk.score {
            reference["score"] = json!(score);
        }
        reference
    }
}

#[async_trait::async_trait]
impl RetrievalTransport for MockTransport {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn send(
        &self,
        request: &RetrievalRequest,
        mode: &RetrievalMode,
    ) -> AppResult<serde_json::Value> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(request.clone());
        }

        if let Some(ref message) = self.failure {
            return Err(AppError::Transport(message.clone()));
        }

        let references: Vec<serde_json::Value> = self
            .corpus
            .iter()
            .filter(|chunk| request.filter().matches(&chunk.metadata))
            .take(request.result_count() as usize)
            .map(Self::reference)
            .collect();

        tracing::debug!(
            matched = references.len(),
            tenant = %request.tenant_id(),
            "Mock transport answered"
        );

        let body = match mode {
            RetrievalMode::Retrieve => json!({ "retrievalResults": references }),
            RetrievalMode::RetrieveAndGenerate { .. } => {
                let answer = self
                    .answer
                    .clone()
                    .unwrap_or_else(|| format!("Found {} relevant passages.", references.len()));
                json!({
                    "output": { "text": answer },
                    "citations": [{
                        "generatedResponsePart": { "textResponsePart": { "text": answer } },
                        "retrievedReferences": references
                    }]
                })
            }
        };

        Ok(body)
    }
}
