// SPDX-License-Identifier: MIT

use super::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Control signal returned alongside normal output by tools and agents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Control {
    /// Keep going
    #[default]
    Continue,
    /// Ask the enclosing loop to stop iterating
    Escalate,
}

impl Control {
    pub fn is_escalate(self) -> bool {
        self == Control::Escalate
    }
}

/// What a tool hands back to the model, plus its control signal
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub response: Value,
    pub control: Control,
}

impl ToolOutput {
    pub fn escalate(response: Value) -> Self {
        Self {
            response,
            control: Control::Escalate,
        }
    }
}

impl From<Value> for ToolOutput {
    fn from(response: Value) -> Self {
        Self {
            response,
            control: Control::Continue,
        }
    }
}

/// Trait for tools that can be called by agents.
///
/// `name()`, `description()` and `schema()` return borrowed data;
/// implementations keep them in fields or statics.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool name (must be unique within an agent's tool set)
    fn name(&self) -> &str;

    /// Returns a human-readable description of what the tool does
    fn description(&self) -> &str;

    /// Returns the JSON schema for the tool's input parameters
    fn schema(&self) -> &Value;

    /// Execute the tool with the given input
    async fn execute(&self, input: Value) -> Result<ToolOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_converts_to_continue() {
        let out: ToolOutput = json!({"ok": true}).into();
        assert_eq!(out.control, Control::Continue);
        assert!(!out.control.is_escalate());
    }

    #[test]
    fn test_escalate_output() {
        let out = ToolOutput::escalate(json!({}));
        assert!(out.control.is_escalate());
        assert_eq!(out.response, json!({}));
    }
}
