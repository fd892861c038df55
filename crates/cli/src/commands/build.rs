//! Build command handler.
//!
//! Prints the tenant-scoped request and the body that would be sent for it.

use super::{parse_filter, resolve_mode};
use clap::Args;
use tenrag_core::{config::AppConfig, AppResult};
use tenrag_retrieval::RequestBuilder;
use tenrag_transport::wire;

/// Build a tenant-scoped request without sending it
#[derive(Args, Debug)]
pub struct BuildCommand {
    /// Tenant identifier, already authenticated by the caller
    #[arg(short, long, env = "TENRAG_TENANT_ID")]
    pub tenant: String,

    /// Query text
    #[arg(short, long)]
    pub query: String,

    /// Number of results (clamped to the configured bounds)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// Extra metadata filter as JSON, e.g. '{"equals":{"key":"lang","value":"en"}}'
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Build the retrieve-and-generate body instead of retrieve
    #[arg(long)]
    pub generate: bool,
}

impl BuildCommand {
    /// Execute the build command.
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let builder = RequestBuilder::new(config.retrieval.clone())?;
        let extra = parse_filter(self.filter.as_deref())?;
        let request = builder.build(&self.tenant, &self.query, self.count, extra)?;
        let mode = resolve_mode(config, self.generate)?;

        let kb_id = config.transport.knowledge_base_id.as_str();
        let wire_body = if kb_id.trim().is_empty() {
            tracing::warn!("No knowledge base id configured; omitting wire body");
            serde_json::Value::Null
        } else {
            serde_json::json!({
                "path": wire::request_path(kb_id, &mode),
                "body": wire::request_body(&request, kb_id, &mode)?,
            })
        };

        let output = serde_json::json!({
            "request": request,
            "wire": wire_body,
        });

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
