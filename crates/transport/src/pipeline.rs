//! Build, send, normalize.

use crate::client::{RetrievalMode, RetrievalTransport};
use tenrag_core::AppResult;
use tenrag_retrieval::{normalize, NormalizedResponse, RequestBuilder, RetrievalFilter};

/// Caller-supplied query parameters.
///
/// `tenant_id` must come from the caller's authenticated context.
#[derive(Debug, Clone)]
pub struct QueryParams {
    pub tenant_id: String,
    pub query_text: String,
    pub result_count: Option<i64>,
    pub extra_filter: Option<RetrievalFilter>,
}

impl QueryParams {
    pub fn new(tenant_id: impl Into<String>, query_text: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            query_text: query_text.into(),
            result_count: None,
            extra_filter: None,
        }
    }

    pub fn with_result_count(mut self, count: i64) -> Self {
        self.result_count = Some(count);
        self
    }

    pub fn with_filter(mut self, filter: RetrievalFilter) -> Self {
        self.extra_filter = Some(filter);
        self
    }
}

/// Build a tenant-scoped request, send it, and normalize the reply.
///
/// Errors from each stage reach the caller unchanged: `InvalidInput` from
/// the builder (nothing is sent), `Transport` from the transport, and
/// `MalformedResponse` from the normalizer.
pub async fn run_query(
    transport: &dyn RetrievalTransport,
    builder: &RequestBuilder,
    params: QueryParams,
    mode: &RetrievalMode,
) -> AppResult<NormalizedResponse> {
    let request = builder.build(
        &params.tenant_id,
        &params.query_text,
        params.result_count,
        params.extra_filter,
    )?;

    let raw = transport.send(&request, mode).await?;
    let response = normalize(&raw)?;

    tracing::info!(
        provider = transport.provider_name(),
        tenant = %request.tenant_id(),
        chunks = response.chunks.len(),
        "Query completed"
    );

    Ok(response)
}
