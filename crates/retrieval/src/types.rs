//! Request and response value types.

use crate::filter::{MetadataValue, RetrievalFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tenrag_core::{AppError, AppResult};

/// Identifier of the tenant a request is scoped to.
///
/// The value must come from the caller's authenticated context. It is never
/// deserialized from request payloads, so the only way in is [`TenantId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TenantId(String);

impl TenantId {
    /// Wrap a tenant identifier, rejecting empty or whitespace-only values.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::invalid_input("tenant id must not be blank"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A retrieval request pinned to one tenant.
///
/// Built only by [`crate::RequestBuilder`]; the fields are private so the
/// tenant predicate cannot be dropped after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalRequest {
    tenant_id: TenantId,
    query_text: String,
    result_count: u32,
    filter: RetrievalFilter,
}

impl RetrievalRequest {
    pub(crate) fn new(
        tenant_id: TenantId,
        query_text: String,
        result_count: u32,
        filter: RetrievalFilter,
    ) -> Self {
        Self {
            tenant_id,
            query_text,
            result_count,
            filter,
        }
    }

    pub fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn result_count(&self) -> u32 {
        self.result_count
    }

    pub fn filter(&self) -> &RetrievalFilter {
        &self.filter
    }
}

/// One passage returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedChunk {
    /// Where the passage came from (document URI or positional id)
    pub source_id: String,

    /// Passage text
    pub text: String,

    /// Backend relevance score, if reported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Scalar metadata attached to the source document
    #[serde(default)]
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl RetrievedChunk {
    /// Create a chunk with no score and no metadata.
    pub fn new(source_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
            score: None,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Backend-independent result of a retrieval call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedResponse {
    /// Generated answer; `None` when the backend only retrieved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_text: Option<String>,

    /// Passages in backend (relevance) order
    pub chunks: Vec<RetrievedChunk>,
}

impl NormalizedResponse {
    /// Highest score among the chunks, if any chunk carries one.
    pub fn max_score(&self) -> Option<f64> {
        self.chunks
            .iter()
            .filter_map(|c| c.score)
            .fold(None, |best, s| match best {
                Some(b) if b >= s => Some(b),
                _ => Some(s),
            })
    }

    /// No passages and no generated answer.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() && self.generated_text.is_none()
    }
}
