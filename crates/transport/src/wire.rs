//! Knowledge-base runtime wire format.
//!
//! - retrieve: `POST {endpoint}/knowledgebases/{id}/retrieve`
//! - retrieve and generate: `POST {endpoint}/retrieveAndGenerate`

use crate::client::RetrievalMode;
use serde::Serialize;
use tenrag_core::{AppError, AppResult};
use tenrag_retrieval::{RetrievalFilter, RetrievalRequest};

#[derive(Debug, Serialize)]
struct TextInput<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrievalConfiguration<'a> {
    vector_search_configuration: VectorSearchConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VectorSearchConfiguration<'a> {
    number_of_results: u32,
    filter: &'a RetrievalFilter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveBody<'a> {
    retrieval_query: TextInput<'a>,
    retrieval_configuration: RetrievalConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RetrieveAndGenerateBody<'a> {
    input: TextInput<'a>,
    retrieve_and_generate_configuration: GenerateConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateConfiguration<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    knowledge_base_configuration: KnowledgeBaseConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KnowledgeBaseConfiguration<'a> {
    knowledge_base_id: &'a str,
    model_arn: &'a str,
    retrieval_configuration: RetrievalConfiguration<'a>,
}

fn retrieval_configuration(request: &RetrievalRequest) -> RetrievalConfiguration<'_> {
    RetrievalConfiguration {
        vector_search_configuration: VectorSearchConfiguration {
            number_of_results: request.result_count(),
            filter: request.filter(),
        },
    }
}

/// Path of the endpoint for `mode`, relative to the base URL.
pub fn request_path(knowledge_base_id: &str, mode: &RetrievalMode) -> String {
    match mode {
        RetrievalMode::Retrieve => format!("/knowledgebases/{}/retrieve", knowledge_base_id),
        RetrievalMode::RetrieveAndGenerate { .. } => "/retrieveAndGenerate".to_string(),
    }
}

/// JSON body for `mode`.
pub fn request_body(
    request: &RetrievalRequest,
    knowledge_base_id: &str,
    mode: &RetrievalMode,
) -> AppResult<serde_json::Value> {
    if knowledge_base_id.trim().is_empty() {
        return Err(AppError::Config(
            "knowledge base id is required to build a request body".to_string(),
        ));
    }

    let value = match mode {
        RetrievalMode::Retrieve => serde_json::to_value(RetrieveBody {
            retrieval_query: TextInput {
                text: request.query_text(),
            },
            retrieval_configuration: retrieval_configuration(request),
        })?,
        RetrievalMode::RetrieveAndGenerate { model_arn } => {
            serde_json::to_value(RetrieveAndGenerateBody {
                input: TextInput {
                    text: request.query_text(),
                },
                retrieve_and_generate_configuration: GenerateConfiguration {
                    kind: "KNOWLEDGE_BASE",
                    knowledge_base_configuration: KnowledgeBaseConfiguration {
                        knowledge_base_id,
                        model_arn,
                        retrieval_configuration: retrieval_configuration(request),
                    },
                },
            })?
        }
    };

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tenrag_retrieval::RequestBuilder;

    #[test]
    fn test_retrieve_body() {
        let request = RequestBuilder::default()
            .build("acme", "refund policy", Some(3), None)
            .unwrap();

        let body = request_body(&request, "KB1", &RetrievalMode::Retrieve).unwrap();

        assert_eq!(
            body,
            json!({
                "retrievalQuery": { "text": "refund policy" },
                "retrievalConfiguration": {
                    "vectorSearchConfiguration": {
                        "numberOfResults": 3,
                        "filter": { "equals": { "key": "tenantId", "value": "acme" } }
                    }
                }
            })
        );
    }

    #[test]
    fn test_retrieve_and_generate_body() {
        let request = RequestBuilder::default()
            .build(
                "acme",
                "q",
                None,
                Some(RetrievalFilter::equals("lang", "en")),
            )
            .unwrap();
        let mode = RetrievalMode::RetrieveAndGenerate {
            model_arn: "arn:model/x".to_string(),
        };

        let body = request_body(&request, "KB1", &mode).unwrap();
        let kb = &body["retrieveAndGenerateConfiguration"]["knowledgeBaseConfiguration"];

        assert_eq!(body["input"]["text"], "q");
        assert_eq!(body["retrieveAndGenerateConfiguration"]["type"], "KNOWLEDGE_BASE");
        assert_eq!(kb["knowledgeBaseId"], "KB1");
        assert_eq!(kb["modelArn"], "arn:model/x");
        assert_eq!(
            kb["retrievalConfiguration"]["vectorSearchConfiguration"]["filter"]["andAll"][0],
            json!({ "equals": { "key": "tenantId", "value": "acme" } })
        );
    }

    #[test]
    fn test_request_path() {
        assert_eq!(
            request_path("KB1", &RetrievalMode::Retrieve),
            "/knowledgebases/KB1/retrieve"
        );
        assert_eq!(
            request_path(
                "KB1",
                &RetrievalMode::RetrieveAndGenerate {
                    model_arn: "m".to_string()
                }
            ),
            "/retrieveAndGenerate"
        );
    }

    #[test]
    fn test_body_requires_knowledge_base_id() {
        let request = RequestBuilder::default().build("acme", "q", None, None).unwrap();
        assert!(request_body(&request, " ", &RetrievalMode::Retrieve).is_err());
    }
}
