// SPDX-License-Identifier: MIT

//! The agent templates and the surfaces that run them

pub mod console;
pub mod custom_agent;
pub mod deploy;
pub mod loop_agent;
pub mod parallel_agent;
pub mod rag_agent;
pub mod sequential_agent;
pub mod server;
pub mod simple_agent;
pub mod tools;

use crate::adk::agent::Agent;
use crate::adk::error::Result;
use crate::adk::model::{ModelProvider, DEFAULT_MODEL};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Topic seeded into templates that read one from state
pub const DEFAULT_TOPIC: &str = "A robot learning to paint";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Simple,
    Sequential,
    Parallel,
    Loop,
    Custom,
    Rag,
}

impl Template {
    pub const ALL: [Template; 6] = [
        Template::Simple,
        Template::Sequential,
        Template::Parallel,
        Template::Loop,
        Template::Custom,
        Template::Rag,
    ];

    /// Package name, e.g. `custom_agent`
    pub fn package_name(self) -> &'static str {
        match self {
            Template::Simple => "simple_agent",
            Template::Sequential => "sequential_agent",
            Template::Parallel => "parallel_agent",
            Template::Loop => "loop_agent",
            Template::Custom => "custom_agent",
            Template::Rag => "rag_agent",
        }
    }

    /// Display name, e.g. `custom-agent`
    pub fn display_name(self) -> &'static str {
        match self {
            Template::Simple => "simple-agent",
            Template::Sequential => "sequential-agent",
            Template::Parallel => "parallel-agent",
            Template::Loop => "loop-agent",
            Template::Custom => "custom-agent",
            Template::Rag => "rag-agent",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Template::Simple => "Single assistant with a weather tool",
            Template::Sequential => "Writer, reviewer and refiner in sequence",
            Template::Parallel => "Three researchers in parallel, then a synthesis",
            Template::Loop => "First draft, then critique and refinement until done",
            Template::Custom => "Story flow with conditional regeneration on negative tone",
            Template::Rag => "Documentation assistant over a Vertex AI RAG corpus",
        }
    }

    /// Deployment entrypoint, `<package>.agent:root_agent`
    pub fn entrypoint(self) -> String {
        format!("{}.agent:root_agent", self.package_name())
    }

    pub fn default_model(self) -> &'static str {
        DEFAULT_MODEL
    }

    /// Whether running or deploying requires `RAG_CORPUS`
    pub fn needs_rag_corpus(self) -> bool {
        self == Template::Rag
    }

    /// Whether the root agent reads `topic` from state
    pub fn uses_topic(self) -> bool {
        matches!(self, Template::Loop | Template::Custom)
    }

    /// State a new session starts with
    pub fn initial_state(self, topic: Option<&str>) -> HashMap<String, Value> {
        let mut state = HashMap::new();
        if self.uses_topic() {
            state.insert(
                "topic".to_string(),
                json!(topic.unwrap_or(DEFAULT_TOPIC)),
            );
        }
        state
    }

    /// Construct the root agent. The rag template reads `RAG_CORPUS`.
    pub fn build(self, provider: &dyn ModelProvider) -> Result<Arc<dyn Agent>> {
        match self {
            Template::Simple => simple_agent::build(provider),
            Template::Sequential => sequential_agent::build(provider),
            Template::Parallel => parallel_agent::build(provider),
            Template::Loop => loop_agent::build(provider),
            Template::Custom => custom_agent::build(provider),
            Template::Rag => rag_agent::build(provider, rag_agent::retrieval_from_env()?),
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
