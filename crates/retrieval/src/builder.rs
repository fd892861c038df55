//! Tenant-scoped request construction.

use crate::filter::{MetadataValue, RetrievalFilter};
use crate::types::{RetrievalRequest, TenantId};
use tenrag_core::{AppError, AppResult, RetrievalConfig};

/// Builds retrieval requests that always carry the tenant predicate.
#[derive(Debug, Clone, Default)]
pub struct RequestBuilder {
    config: RetrievalConfig,
}

impl RequestBuilder {
    /// Create a builder after checking the configured bounds.
    pub fn new(config: RetrievalConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    /// Build a request for `tenant_id`.
    ///
    /// The filter is `equals(tenant_key, tenant_id)`, conjoined with
    /// `extra_filter` when one is given. One-member groups in the extra
    /// filter are collapsed into their member. A `result_count` that is absent,
    /// zero or negative becomes the configured default; one above the
    /// configured maximum becomes the maximum.
    ///
    /// # Errors
    /// `InvalidInput` when the tenant id or query is blank, when the extra
    /// filter is structurally empty, or when it mentions the tenant key.
    pub fn build(
        &self,
        tenant_id: &str,
        query_text: &str,
        result_count: Option<i64>,
        extra_filter: Option<RetrievalFilter>,
    ) -> AppResult<RetrievalRequest> {
        let tenant = TenantId::new(tenant_id)?;
        self.build_for(tenant, query_text, result_count, extra_filter)
    }

    /// Same as [`RequestBuilder::build`] for an already validated tenant.
    pub fn build_for(
        &self,
        tenant: TenantId,
        query_text: &str,
        result_count: Option<i64>,
        extra_filter: Option<RetrievalFilter>,
    ) -> AppResult<RetrievalRequest> {
        if query_text.trim().is_empty() {
            return Err(AppError::invalid_input("query text must not be blank"));
        }

        let filter = self.tenant_filter(&tenant, extra_filter)?;
        let count = self.clamp_result_count(result_count);

        tracing::debug!(
            tenant = %tenant,
            requested = ?result_count,
            result_count = count,
            "Built tenant-scoped retrieval request"
        );

        Ok(RetrievalRequest::new(
            tenant,
            query_text.to_string(),
            count,
            filter,
        ))
    }

    fn tenant_filter(
        &self,
        tenant: &TenantId,
        extra_filter: Option<RetrievalFilter>,
    ) -> AppResult<RetrievalFilter> {
        let key = self.config.tenant_key.as_str();
        let tenant_predicate = RetrievalFilter::equals(key, MetadataValue::from(tenant.as_str()));

        let Some(extra) = extra_filter else {
            return Ok(tenant_predicate);
        };

        extra.validate()?;
        let extra = extra.simplify();

        if extra.references_key(key) {
            return Err(AppError::invalid_input(format!(
                "extra filter must not reference the tenant key '{}'",
                key
            )));
        }

        Ok(tenant_predicate.and(extra))
    }

    fn clamp_result_count(&self, requested: Option<i64>) -> u32 {
        match requested {
            Some(n) if n > 0 => {
                let max = self.config.max_result_count;
                u32::try_from(n).map(|n| n.min(max)).unwrap_or(max)
            }
            _ => self.config.default_result_count,
        }
    }
}
