// SPDX-License-Identifier: MIT

//! Model module - defines LLM model trait and implementations
//!
//! This module provides the core Model trait, shared message types and
//! the [`ModelProvider`] seam the templates use to obtain models by name.
//! The only concrete backend is [gemini].

pub mod gemini;

pub use gemini::{GeminiModel, GeminiProvider};

use crate::adk::error::Result;
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Model used by templates unless a stage asks for something else
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Configuration for model generation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GenerationConfig {
    pub temperature: Option<f32>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub top_k: Option<u32>,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn text(role: &str, text: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part::Text(text.into())],
        }
    }
}

/// Parts of a message - text, thinking, function calls, etc.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Part {
    /// Regular text output from the model
    Text(String),
    /// Thinking/reasoning content from thinking models
    Thinking(String),
    /// Function/tool call requested by the model
    FunctionCall {
        name: String,
        args: serde_json::Value,
        /// Thought signature from Gemini thinking models - must be preserved and sent back
        #[serde(skip_serializing_if = "Option::is_none")]
        thought_signature: Option<String>,
    },
    /// Response from executing a function/tool
    FunctionResponse {
        name: String,
        response: serde_json::Value,
    },
}

/// Core trait for LLM model implementations
#[async_trait]
pub trait Model: Send + Sync {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content>;
}

/// Resolves a model name (e.g. `gemini-2.5-pro`) to a model instance
pub trait ModelProvider: Send + Sync {
    fn model(&self, name: &str) -> Result<Arc<dyn Model>>;
}
