// SPDX-License-Identifier: MIT

use crate::adk::error::Result;
use crate::adk::tool::{Tool, ToolOutput};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::{json, Value};

static EXIT_LOOP_SCHEMA: Lazy<Value> = Lazy::new(|| {
    json!({
        "type": "object",
        "properties": {}
    })
});

/// Ends the enclosing loop agent
pub struct ExitLoopTool;

#[async_trait]
impl Tool for ExitLoopTool {
    fn name(&self) -> &str {
        "exit_loop"
    }

    fn description(&self) -> &str {
        "Call this function only when the critique says no further changes are needed, signalling the iterative process should end."
    }

    fn schema(&self) -> &Value {
        &EXIT_LOOP_SCHEMA
    }

    async fn execute(&self, _input: Value) -> Result<ToolOutput> {
        log::info!("exit_loop called, escalating");
        Ok(ToolOutput::escalate(json!({})))
    }
}
