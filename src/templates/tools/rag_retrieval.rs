// SPDX-License-Identifier: MIT

use super::tool_schema;
use crate::adk::error::{AdkError, Result};
use crate::adk::tool::{Tool, ToolOutput};
use crate::templates::deploy::{RagCorpus, VertexEndpoint};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

static RAG_SCHEMA: Lazy<Value> = Lazy::new(tool_schema::<RagQuery>);

pub const SIMILARITY_TOP_K: u32 = 10;
pub const VECTOR_DISTANCE_THRESHOLD: f64 = 0.6;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct RagQuery {
    /// The query to retrieve documentation for
    pub query: String,
}

/// One retrieved chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagContext {
    #[serde(default)]
    pub source_uri: String,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// Vertex AI RAG retrieval over a single corpus
pub struct RagRetrievalTool {
    endpoint: VertexEndpoint,
    corpus: RagCorpus,
}

impl RagRetrievalTool {
    /// `endpoint` must be in the corpus' project and location
    pub fn new(endpoint: VertexEndpoint, corpus: RagCorpus) -> Self {
        Self { endpoint, corpus }
    }

    pub fn corpus(&self) -> &RagCorpus {
        &self.corpus
    }

    pub fn request_body(&self, query: &str) -> Value {
        json!({
            "vertexRagStore": {
                "ragResources": [{ "ragCorpus": self.corpus.to_string() }],
                "vectorDistanceThreshold": VECTOR_DISTANCE_THRESHOLD,
            },
            "query": {
                "text": query,
                "similarityTopK": SIMILARITY_TOP_K,
            },
        })
    }

    /// Contexts of a `retrieveContexts` reply
    pub fn parse_contexts(reply: &Value) -> Vec<RagContext> {
        reply
            .pointer("/contexts/contexts")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| RagContext {
                        source_uri: item
                            .get("sourceUri")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        text: item
                            .get("text")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        score: item
                            .get("score")
                            .or_else(|| item.get("distance"))
                            .and_then(Value::as_f64),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl Tool for RagRetrievalTool {
    fn name(&self) -> &str {
        "retrieve_documentation"
    }

    fn description(&self) -> &str {
        "Retrieve relevant documentation and reference materials from the RAG corpus"
    }

    fn schema(&self) -> &Value {
        &RAG_SCHEMA
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput> {
        let args: RagQuery = serde_json::from_value(input)
            .map_err(|e| AdkError::tool(self.name(), format!("invalid arguments: {}", e)))?;

        let path = format!("{}:retrieveContexts", self.endpoint.parent());
        let reply = self
            .endpoint
            .post_json(&path, &self.request_body(&args.query))
            .await
            .map_err(|e| AdkError::tool(self.name(), e.to_string()))?;

        let contexts = Self::parse_contexts(&reply);
        log::info!(
            "Retrieved {} contexts from {}",
            contexts.len(),
            self.corpus.corpus_id
        );
        if contexts.is_empty() {
            return Ok(json!({
                "contexts": [],
                "message": format!("No matching result found for '{}'", args.query),
            })
            .into());
        }
        Ok(json!({ "contexts": contexts }).into())
    }
}
