//! Normalize command handler.

use clap::Args;
use std::path::PathBuf;
use tenrag_core::{AppError, AppResult};
use tenrag_retrieval::normalize_str;

/// Normalize a raw backend response read from a file or stdin
#[derive(Args, Debug)]
pub struct NormalizeCommand {
    /// Raw response file (reads stdin when omitted)
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

impl NormalizeCommand {
    /// Execute the normalize command.
    pub fn execute(&self) -> AppResult<()> {
        let raw = match self.file {
            Some(ref path) => std::fs::read_to_string(path).map_err(|e| {
                AppError::InvalidInput(format!("Failed to read {:?}: {}", path, e))
            })?,
            None => std::io::read_to_string(std::io::stdin())?,
        };

        let response = normalize_str(&raw)?;
        tracing::debug!("Normalized {} chunks", response.chunks.len());

        println!("{}", serde_json::to_string_pretty(&response)?);
        Ok(())
    }
}
