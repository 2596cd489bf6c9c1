// SPDX-License-Identifier: MIT

//! Typed error handling for agent-templates
//!
//! Every fallible operation in the crate returns [`Result`], whose error
//! side is [`AdkError`]. The binary converts it into `anyhow::Error` at
//! the edge.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, AdkError>;

/// Top-level error type for agent-templates
#[derive(Debug, Error)]
pub enum AdkError {
    /// Missing or malformed configuration (env vars, CLI values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors returned by, or while talking to, an LLM provider
    #[error("Model error from {provider}: {message}")]
    Model { provider: String, message: String },

    /// Tool failures and unknown tools
    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    /// Agent orchestration failures
    #[error("Agent error: {0}")]
    Agent(String),

    /// Session lookup or persistence failures
    #[error("Session error: {0}")]
    Session(String),

    /// An instruction placeholder referenced a key the state does not hold
    #[error("State key '{key}' not found while resolving instruction for agent '{agent}'")]
    MissingStateKey { agent: String, key: String },

    /// Max iterations/turns reached
    #[error("Max {kind} reached: {limit}")]
    MaxIterations { kind: String, limit: u32 },

    /// Cloud deployment failures
    #[error("Deployment error: {0}")]
    Deploy(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// URL construction errors
    #[error(transparent)]
    Url(#[from] url::ParseError),
}

impl AdkError {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a model error
    pub fn model(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Model {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a tool error
    pub fn tool(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an agent error
    pub fn agent(message: impl Into<String>) -> Self {
        Self::Agent(message.into())
    }

    /// Create a session error
    pub fn session(message: impl Into<String>) -> Self {
        Self::Session(message.into())
    }

    /// Create a deployment error
    pub fn deploy(message: impl Into<String>) -> Self {
        Self::Deploy(message.into())
    }
}
