//! Command handlers for the tenrag CLI.

pub mod build;
pub mod normalize;
pub mod query;

pub use build::BuildCommand;
pub use normalize::NormalizeCommand;
pub use query::QueryCommand;

use tenrag_core::{config::AppConfig, AppError, AppResult};
use tenrag_retrieval::RetrievalFilter;
use tenrag_transport::RetrievalMode;

/// Parse an optional `--filter` JSON argument.
pub(crate) fn parse_filter(raw: Option<&str>) -> AppResult<Option<RetrievalFilter>> {
    raw.map(RetrievalFilter::from_json_str).transpose()
}

/// Pick the backend operation; generation needs a configured model.
pub(crate) fn resolve_mode(config: &AppConfig, generate: bool) -> AppResult<RetrievalMode> {
    if !generate {
        return Ok(RetrievalMode::Retrieve);
    }

    config
        .transport
        .model_arn
        .clone()
        .filter(|arn| !arn.trim().is_empty())
        .map(|model_arn| RetrievalMode::RetrieveAndGenerate { model_arn })
        .ok_or_else(|| {
            AppError::Config(
                "--generate requires transport.modelArn or TENRAG_MODEL_ARN".to_string(),
            )
        })
}
