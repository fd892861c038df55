//! Query command handler.
//!
//! Runs build, send and normalize against the configured transport.

use super::{parse_filter, resolve_mode};
use clap::Args;
use tenrag_core::{config::AppConfig, AppResult};
use tenrag_retrieval::{NormalizedResponse, RequestBuilder};
use tenrag_transport::{create_transport, run_query, QueryParams};

/// Longest snippet shown per source in text output.
const SNIPPET_CHARS: usize = 160;

/// Query the shared knowledge base for one tenant
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// Tenant identifier, already authenticated by the caller
    #[arg(short, long, env = "TENRAG_TENANT_ID")]
    pub tenant: String,

    /// Query text
    #[arg(short, long)]
    pub query: String,

    /// Number of results (clamped to the configured bounds)
    #[arg(short = 'n', long, allow_negative_numbers = true)]
    pub count: Option<i64>,

    /// Extra metadata filter as JSON
    #[arg(short, long)]
    pub filter: Option<String>,

    /// Ask the backend to generate an answer from the retrieved passages
    #[arg(long)]
    pub generate: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommand {
    /// Execute the query command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let builder = RequestBuilder::new(config.retrieval.clone())?;
        let transport = create_transport(&config.transport)?;
        let mode = resolve_mode(config, self.generate)?;

        let params = QueryParams {
            tenant_id: self.tenant.clone(),
            query_text: self.query.clone(),
            result_count: self.count,
            extra_filter: parse_filter(self.filter.as_deref())?,
        };

        let response = run_query(transport.as_ref(), &builder, params, &mode).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print!("{}", render_text(&response));
        }

        Ok(())
    }
}

/// Plain-text rendering: the answer (if any), then numbered sources.
fn render_text(response: &NormalizedResponse) -> String {
    if response.is_empty() {
        return "No matching passages.\n".to_string();
    }

    let mut out = String::new();

    if let Some(ref answer) = response.generated_text {
        out.push_str(answer.trim_end());
        out.push_str("\n\n");
    }

    if response.chunks.is_empty() {
        out.push_str("No sources cited.\n");
        return out;
    }

    match response.max_score() {
        Some(top) => out.push_str(&format!("Sources (top score {:.2}):\n", top)),
        None => out.push_str("Sources:\n"),
    }
    for (i, chunk) in response.chunks.iter().enumerate() {
        match chunk.score {
            Some(score) => out.push_str(&format!(
                "[{}] {} (score {:.2})\n",
                i + 1,
                chunk.source_id,
                score
            )),
            None => out.push_str(&format!("[{}] {}\n", i + 1, chunk.source_id)),
        }
        out.push_str(&format!("    {}\n", snippet(&chunk.text)));
    }

    out
}

fn snippet(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SNIPPET_CHARS {
        return flat;
    }
    let cut: String = flat.chars().take(SNIPPET_CHARS).collect();
    format!("{}...", cut.trim_end())
}
