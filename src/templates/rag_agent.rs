// SPDX-License-Identifier: MIT

//! rag-agent: documentation assistant backed by a Vertex AI RAG corpus

use super::deploy::{GcloudTokenSource, RagCorpus, VertexEndpoint};
use super::tools::RagRetrievalTool;
use crate::adk::agent::{Agent, LlmAgent};
use crate::adk::error::Result;
use crate::adk::model::{ModelProvider, DEFAULT_MODEL};
use crate::adk::tool::Tool;
use std::sync::Arc;

pub const INSTRUCTION: &str = "You are a documentation assistant powered by RAG (Retrieval-Augmented Generation).

Your capabilities:
1. Answer questions using information from the RAG corpus
2. Retrieve relevant documentation using the retrieve_documentation tool
3. Provide accurate answers with proper citations
4. Acknowledge when information is not available in the corpus

Guidelines:
- Always use the retrieve_documentation tool when answering questions
- Cite your sources when referencing retrieved information
- If information is not found, clearly state that
- Be concise but comprehensive in your answers";

/// Retrieval tool for `RAG_CORPUS`, authenticated through gcloud
pub fn retrieval_from_env() -> Result<Arc<dyn Tool>> {
    let corpus = RagCorpus::from_env()?;
    let endpoint = VertexEndpoint::new(
        corpus.project.clone(),
        corpus.location.clone(),
        Arc::new(GcloudTokenSource),
    );
    Ok(Arc::new(RagRetrievalTool::new(endpoint, corpus)))
}

pub fn build(provider: &dyn ModelProvider, retrieval: Arc<dyn Tool>) -> Result<Arc<dyn Agent>> {
    let agent = LlmAgent::builder("rag_agent")
        .description("Documentation agent with RAG retrieval")
        .model(provider.model(DEFAULT_MODEL)?)
        .instruction(INSTRUCTION)
        .tool(retrieval)
        .build()?;
    Ok(Arc::new(agent))
}
