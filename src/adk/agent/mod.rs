// SPDX-License-Identifier: MIT

//! Agent module - defines agent types for AI workflows
//!
//! This module provides the core Agent trait and implementations:
//! - `LlmAgent` - one model-backed stage with tool calling
//! - `SequentialAgent` - runs sub-agents in order
//! - `ParallelAgent` - runs independent sub-agents concurrently
//! - `LoopAgent` - repeats sub-agents up to a fixed number of iterations

mod llm;
mod workflow;

pub use llm::{LlmAgent, LlmAgentBuilder};
pub use workflow::{LoopAgent, ParallelAgent, SequentialAgent};

pub use crate::adk::tool::Control;

use crate::adk::context::InvocationContext;
use crate::adk::error::Result;
use async_trait::async_trait;

/// Core agent trait for all agent types
///
/// An agent reads and writes the shared state in `ctx`, emits events
/// through it, and returns a [`Control`] telling its parent whether to
/// keep going.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent name
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Run the agent against the given context
    async fn run(&self, ctx: &mut InvocationContext) -> Result<Control>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Agents used by the orchestration tests

    use super::*;
    use crate::adk::event::{Event, EventKind};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Writes a fixed value to its output key and records every call in
    /// a shared journal.
    pub struct RecordingAgent {
        pub name: String,
        pub output_key: String,
        pub output: String,
        pub journal: Arc<Mutex<Vec<String>>>,
        pub calls: AtomicUsize,
        pub escalate_on_call: Option<usize>,
    }

    impl RecordingAgent {
        pub fn new(name: &str, output_key: &str, journal: Arc<Mutex<Vec<String>>>) -> Self {
            Self {
                name: name.to_string(),
                output_key: output_key.to_string(),
                output: format!("{}-output", name),
                journal,
                calls: AtomicUsize::new(0),
                escalate_on_call: None,
            }
        }

        /// Escalate on the n-th call (1-based)
        pub fn escalating_on(mut self, call: usize) -> Self {
            self.escalate_on_call = Some(call);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Agent for RecordingAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, ctx: &mut InvocationContext) -> Result<Control> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Ok(mut journal) = self.journal.lock() {
                journal.push(self.name.clone());
            }

            if self.escalate_on_call == Some(call) {
                let event = Event::new(ctx.invocation_id(), &self.name, EventKind::Answer(String::new()))
                    .with_escalate();
                ctx.emit(event).await;
                return Ok(Control::Escalate);
            }

            ctx.state.set(self.output_key.clone(), json!(self.output));
            let event = Event::new(
                ctx.invocation_id(),
                &self.name,
                EventKind::Answer(self.output.clone()),
            )
            .with_state_delta(&self.output_key, json!(self.output));
            ctx.emit(event).await;
            Ok(Control::Continue)
        }
    }

    /// Always fails
    pub struct FailingAgent {
        pub name: String,
    }

    #[async_trait]
    impl Agent for FailingAgent {
        fn name(&self) -> &str {
            &self.name
        }

        async fn run(&self, _ctx: &mut InvocationContext) -> Result<Control> {
            Err(crate::adk::error::AdkError::agent(format!(
                "{} failed",
                self.name
            )))
        }
    }
}
