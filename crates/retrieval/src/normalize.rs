//! Normalization of raw knowledge-base responses.
//!
//! Two response shapes are accepted:
//! - retrieval only: `{"retrievalResults": [reference, ...]}`
//! - retrieve and generate: `{"output": {"text": ...}, "citations": [{"retrievedReferences": [reference, ...]}]}`
//!
//! where a reference is `{"content": {"text"}, "location": {...}, "score", "metadata"}`.

use crate::filter::MetadataValue;
use crate::types::{NormalizedResponse, RetrievedChunk};
use serde::Deserialize;
use std::collections::BTreeMap;
use tenrag_core::{AppError, AppResult};

/// Metadata entry the backend uses for the originating document URI.
const SOURCE_URI_METADATA_KEY: &str = "x-amz-bedrock-kb-source-uri";

/// Location variants checked for a source id, in order: (object key, field).
const LOCATION_FIELDS: &[(&str, &str)] = &[
    ("s3Location", "uri"),
    ("webLocation", "url"),
    ("confluenceLocation", "url"),
    ("salesforceLocation", "url"),
    ("sharePointLocation", "url"),
    ("kendraDocumentLocation", "uri"),
    ("customDocumentLocation", "id"),
];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResponse {
    output: Option<RawOutput>,
    citations: Option<Vec<RawCitation>>,
    retrieval_results: Option<Vec<RawReference>>,
}

#[derive(Debug, Deserialize)]
struct RawOutput {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCitation {
    #[serde(default)]
    retrieved_references: Option<Vec<RawReference>>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    content: Option<RawContent>,
    location: Option<serde_json::Value>,
    score: Option<f64>,
    metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct RawContent {
    text: Option<String>,
}

/// Normalize a raw backend response.
///
/// Backend order is kept as-is. `generated_text` is `Some` only when the
/// backend returned an `output` block.
///
/// # Errors
/// `MalformedResponse` when the value is not an object, when neither
/// `retrievalResults` nor `citations` is present, when a field has the wrong
/// type, or when a reference has no `content.text`.
pub fn normalize(raw: &serde_json::Value) -> AppResult<NormalizedResponse> {
    if !raw.is_object() {
        return Err(AppError::malformed("response is not a JSON object"));
    }

    let parsed = RawResponse::deserialize(raw)
        .map_err(|e| AppError::malformed(format!("unexpected response shape: {}", e)))?;

    let generated_text = match parsed.output {
        Some(output) => Some(
            output
                .text
                .ok_or_else(|| AppError::malformed("output block has no text"))?,
        ),
        None => None,
    };

    let references: Vec<RawReference> = match (parsed.citations, parsed.retrieval_results) {
        (Some(citations), _) => citations
            .into_iter()
            .flat_map(|c| c.retrieved_references.unwrap_or_default())
            .collect(),
        (None, Some(results)) => results,
        (None, None) => {
            return Err(AppError::malformed(
                "response has neither retrievalResults nor citations",
            ))
        }
    };

    let chunks = references
        .into_iter()
        .enumerate()
        .map(|(index, reference)| to_chunk(index, reference))
        .collect::<AppResult<Vec<_>>>()?;

    tracing::debug!(
        chunks = chunks.len(),
        generated = generated_text.is_some(),
        "Normalized retrieval response"
    );

    Ok(NormalizedResponse {
        generated_text,
        chunks,
    })
}

/// Parse and normalize a raw JSON document.
pub fn normalize_str(raw: &str) -> AppResult<NormalizedResponse> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| AppError::malformed(format!("response is not valid JSON: {}", e)))?;
    normalize(&value)
}

fn to_chunk(index: usize, reference: RawReference) -> AppResult<RetrievedChunk> {
    let position = index + 1;

    let text = reference
        .content
        .and_then(|c| c.text)
        .ok_or_else(|| AppError::malformed(format!("result {} has no content.text", position)))?;

    let raw_metadata = reference.metadata.unwrap_or_default();

    let source_id = reference
        .location
        .as_ref()
        .and_then(source_from_location)
        .or_else(|| {
            raw_metadata
                .get(SOURCE_URI_METADATA_KEY)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("result-{}", position));

    let mut metadata = BTreeMap::new();
    for (key, value) in &raw_metadata {
        match MetadataValue::from_json(value) {
            Some(scalar) => {
                metadata.insert(key.clone(), scalar);
            }
            None => tracing::trace!(key = %key, "Dropping non-scalar metadata value"),
        }
    }

    Ok(RetrievedChunk {
        source_id,
        text,
        score: reference.score,
        metadata,
    })
}

fn source_from_location(location: &serde_json::Value) -> Option<String> {
    LOCATION_FIELDS.iter().find_map(|(object, field)| {
        location
            .get(object)
            .and_then(|l| l.get(field))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}
