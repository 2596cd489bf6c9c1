// SPDX-License-Identifier: MIT

//! LLM Agent - Standard LLM agent with tool calling
//!
//! This agent resolves its instruction against the shared state, sends it
//! to a model and executes tool calls in a loop until a turn without
//! calls is received. Its text is written to the agent's output key.

use super::{Agent, Control};
use crate::adk::context::InvocationContext;
use crate::adk::error::{AdkError, Result};
use crate::adk::event::{Event, EventKind};
use crate::adk::instruction::inject_state;
use crate::adk::model::{Content, GenerationConfig, Model, Part};
use crate::adk::tool::Tool;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Model turns allowed before giving up on a text answer
pub const MAX_TURNS: u32 = 10;

/// User turn sent when the invocation carries no message
const DEFAULT_USER_MESSAGE: &str = "Continue.";

/// Standard LLM agent with tool calling support
pub struct LlmAgent {
    name: String,
    description: String,
    instruction: String,
    model: Arc<dyn Model>,
    tools: Vec<Arc<dyn Tool>>,
    output_key: Option<String>,
    config: Option<GenerationConfig>,
    /// HashMap for O(1) tool lookups
    tool_map: HashMap<String, usize>,
}

impl LlmAgent {
    pub fn builder(name: impl Into<String>) -> LlmAgentBuilder {
        LlmAgentBuilder::new(name)
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub fn output_key(&self) -> Option<&str> {
        self.output_key.as_deref()
    }

    pub fn tools(&self) -> &[Arc<dyn Tool>] {
        &self.tools
    }

    fn get_tool(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tool_map.get(name).map(|&i| &self.tools[i])
    }

    /// Runs one requested call; failures are reported back to the model
    /// instead of aborting the turn.
    async fn call_tool(&self, name: &str, args: &Value) -> (Value, Control) {
        match self.get_tool(name) {
            Some(tool) => match tool.execute(args.clone()).await {
                Ok(output) => (output.response, output.control),
                Err(e) => {
                    log::error!("Tool {} failed: {}", name, e);
                    (json!({ "error": e.to_string() }), Control::Continue)
                }
            },
            None => {
                log::error!("Tool {} not found", name);
                (
                    json!({ "error": format!("Tool {} not found", name) }),
                    Control::Continue,
                )
            }
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &mut InvocationContext) -> Result<Control> {
        let instruction = inject_state(&self.name, &self.instruction, &ctx.state)?;
        let user_message = ctx.user_content().unwrap_or(DEFAULT_USER_MESSAGE).to_string();

        let mut history = vec![
            Content::text("system", instruction),
            Content::text("user", user_message),
        ];
        let tools = (!self.tools.is_empty()).then_some(self.tools.as_slice());

        for turn in 0..MAX_TURNS {
            log::info!("Agent {} turn {}/{}", self.name, turn + 1, MAX_TURNS);
            let response = self
                .model
                .generate_content(&history, self.config.as_ref(), tools)
                .await?;

            log::debug!(
                "Agent {} received response with {} parts",
                self.name,
                response.parts.len()
            );

            let function_calls: Vec<(String, Value)> = response
                .parts
                .iter()
                .filter_map(|part| match part {
                    Part::FunctionCall { name, args, .. } => Some((name.clone(), args.clone())),
                    _ => None,
                })
                .collect();

            // Calls win over text sent in the same turn
            if function_calls.is_empty() {
                let text: String = response
                    .parts
                    .iter()
                    .filter_map(|part| match part {
                        Part::Text(text) => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();

                if text.is_empty() {
                    log::warn!(
                        "Agent {} received empty response with no function calls",
                        self.name
                    );
                } else {
                    log::info!(
                        "Agent {} returning text response (length: {})",
                        self.name,
                        text.len()
                    );
                }

                let mut event =
                    Event::new(ctx.invocation_id(), &self.name, EventKind::Answer(text.clone()));
                if let (Some(key), false) = (&self.output_key, text.is_empty()) {
                    ctx.state.set(key.clone(), Value::String(text.clone()));
                    event = event.with_state_delta(key, Value::String(text));
                }
                ctx.emit(event).await;
                return Ok(Control::Continue);
            }

            let mut escalate = false;
            let mut function_responses = Vec::with_capacity(function_calls.len());
            for (name, args) in function_calls {
                log::info!("Tool call: {} {}", name, args);
                let call = Event::new(
                    ctx.invocation_id(),
                    &self.name,
                    EventKind::ToolCall {
                        name: name.clone(),
                        args: args.clone(),
                    },
                );
                ctx.emit(call).await;

                let (result, control) = self.call_tool(&name, &args).await;
                let mut event = Event::new(
                    ctx.invocation_id(),
                    &self.name,
                    EventKind::ToolResult {
                        name: name.clone(),
                        result: result.clone(),
                    },
                );
                if control.is_escalate() {
                    escalate = true;
                    event = event.with_escalate();
                }
                ctx.emit(event).await;

                function_responses.push(Part::FunctionResponse {
                    name,
                    response: result,
                });
            }

            if escalate {
                log::info!("Agent {} escalated through a tool call", self.name);
                return Ok(Control::Escalate);
            }

            history.push(response);
            history.push(Content {
                role: "user".to_string(),
                parts: function_responses,
            });
        }

        log::error!(
            "Agent {} reached max turns without text response",
            self.name
        );
        Err(AdkError::MaxIterations {
            kind: format!("agent {}", self.name),
            limit: MAX_TURNS,
        })
    }
}

/// Builder for [`LlmAgent`]
pub struct LlmAgentBuilder {
    name: String,
    description: String,
    instruction: String,
    model: Option<Arc<dyn Model>>,
    tools: Vec<Arc<dyn Tool>>,
    output_key: Option<String>,
    config: Option<GenerationConfig>,
}

impl LlmAgentBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            instruction: String::new(),
            model: None,
            tools: Vec::new(),
            output_key: None,
            config: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = instruction.into();
        self
    }

    pub fn model(mut self, model: Arc<dyn Model>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// State key the final answer is written to
    pub fn output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<LlmAgent> {
        let model = self
            .model
            .ok_or_else(|| AdkError::config(format!("Agent {} has no model", self.name)))?;

        let mut tool_map = HashMap::with_capacity(self.tools.len());
        for (i, tool) in self.tools.iter().enumerate() {
            if tool_map.insert(tool.name().to_string(), i).is_some() {
                return Err(AdkError::config(format!(
                    "Agent {} registers tool {} twice",
                    self.name,
                    tool.name()
                )));
            }
        }

        Ok(LlmAgent {
            name: self.name,
            description: self.description,
            instruction: self.instruction,
            model,
            tools: self.tools,
            output_key: self.output_key,
            config: self.config,
            tool_map,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::state::SessionState;
    use crate::adk::tool::ToolOutput;
    use once_cell::sync::Lazy;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every history it was sent
    struct ScriptedModel {
        responses: Mutex<VecDeque<Content>>,
        seen: Mutex<Vec<Vec<Content>>>,
    }

    impl ScriptedModel {
        fn new(responses: Vec<Content>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn system_prompt(&self, call: usize) -> String {
            match &self.seen.lock().unwrap()[call][0].parts[0] {
                Part::Text(t) => t.clone(),
                other => panic!("unexpected part {other:?}"),
            }
        }
    }

    #[async_trait]
    impl Model for ScriptedModel {
        async fn generate_content(
            &self,
            history: &[Content],
            _config: Option<&GenerationConfig>,
            _tools: Option<&[Arc<dyn Tool>]>,
        ) -> Result<Content> {
            self.seen.lock().unwrap().push(history.to_vec());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| AdkError::model("scripted", "script exhausted"))
        }
    }

    fn call(name: &str, args: Value) -> Content {
        Content {
            role: "model".into(),
            parts: vec![Part::FunctionCall {
                name: name.into(),
                args,
                thought_signature: None,
            }],
        }
    }

    fn reply(text: &str) -> Content {
        Content::text("model", text)
    }

    static ECHO_SCHEMA: Lazy<Value> = Lazy::new(|| json!({"type": "object"}));

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes its input"
        }
        fn schema(&self) -> &Value {
            &ECHO_SCHEMA
        }
        async fn execute(&self, input: Value) -> Result<ToolOutput> {
            Ok(json!({ "echo": input }).into())
        }
    }

    struct StopTool;

    #[async_trait]
    impl Tool for StopTool {
        fn name(&self) -> &str {
            "stop"
        }
        fn description(&self) -> &str {
            "Stops the loop"
        }
        fn schema(&self) -> &Value {
            &ECHO_SCHEMA
        }
        async fn execute(&self, _input: Value) -> Result<ToolOutput> {
            Ok(ToolOutput::escalate(json!({})))
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn name(&self) -> &str {
            "broken"
        }
        fn description(&self) -> &str {
            "Always fails"
        }
        fn schema(&self) -> &Value {
            &ECHO_SCHEMA
        }
        async fn execute(&self, _input: Value) -> Result<ToolOutput> {
            Err(AdkError::tool("broken", "boom"))
        }
    }

    fn ctx_with(state: SessionState) -> InvocationContext {
        InvocationContext::new("inv", Some("hello".to_string()), state)
    }

    #[tokio::test]
    async fn test_text_answer_written_to_output_key() {
        let model = ScriptedModel::new(vec![reply("Once upon a time")]);
        let agent = LlmAgent::builder("StoryGenerator")
            .model(model.clone())
            .instruction("Write a story about: {topic}")
            .output_key("current_story")
            .build()
            .unwrap();

        let mut state = SessionState::new();
        state.set("topic", json!("a brave kitten"));
        let mut ctx = ctx_with(state);

        let control = agent.run(&mut ctx).await.unwrap();

        assert_eq!(control, Control::Continue);
        assert_eq!(ctx.state.get_str("current_story"), Some("Once upon a time"));
        assert_eq!(model.system_prompt(0), "Write a story about: a brave kitten");

        let events = ctx.events();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_final_response());
        assert_eq!(events[0].author, "StoryGenerator");
        assert_eq!(
            events[0].actions.state_delta.get("current_story"),
            Some(&json!("Once upon a time"))
        );
    }

    #[tokio::test]
    async fn test_missing_required_key_fails_before_model_call() {
        let model = ScriptedModel::new(vec![reply("unused")]);
        let agent = LlmAgent::builder("Critic")
            .model(model.clone())
            .instruction("Review: {current_story}")
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        let err = agent.run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, AdkError::MissingStateKey { ref key, .. } if key == "current_story"));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let model = ScriptedModel::new(vec![call("echo", json!({"x": 1})), reply("done")]);
        let agent = LlmAgent::builder("worker")
            .model(model.clone())
            .instruction("Use tools")
            .tool(Arc::new(EchoTool))
            .output_key("out")
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        agent.run(&mut ctx).await.unwrap();

        assert_eq!(model.calls(), 2);
        // system, user, model call, tool response
        let second = &model.seen.lock().unwrap()[1];
        assert_eq!(second.len(), 4);
        match &second[3].parts[0] {
            Part::FunctionResponse { name, response } => {
                assert_eq!(name, "echo");
                assert_eq!(response, &json!({"echo": {"x": 1}}));
            }
            other => panic!("unexpected part {other:?}"),
        }

        let kinds: Vec<_> = ctx.events().iter().map(|e| &e.kind).collect();
        assert!(matches!(kinds[0], EventKind::ToolCall { name, .. } if name == "echo"));
        assert!(matches!(kinds[1], EventKind::ToolResult { name, .. } if name == "echo"));
        assert!(matches!(kinds[2], EventKind::Answer(t) if t == "done"));
        assert_eq!(ctx.state.get_str("out"), Some("done"));
    }

    #[tokio::test]
    async fn test_tool_failure_reported_to_model() {
        let model = ScriptedModel::new(vec![
            call("broken", json!({})),
            call("missing", json!({})),
            reply("recovered"),
        ]);
        let agent = LlmAgent::builder("worker")
            .model(model.clone())
            .tool(Arc::new(BrokenTool))
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        agent.run(&mut ctx).await.unwrap();

        let results: Vec<&Value> = ctx
            .events()
            .iter()
            .filter_map(|e| match &e.kind {
                EventKind::ToolResult { result, .. } => Some(result),
                _ => None,
            })
            .collect();
        assert!(results[0]["error"].as_str().unwrap().contains("boom"));
        assert_eq!(results[1]["error"], "Tool missing not found");
    }

    #[tokio::test]
    async fn test_escalating_tool_stops_agent() {
        let model = ScriptedModel::new(vec![call("stop", json!({})), reply("never sent")]);
        let agent = LlmAgent::builder("refiner")
            .model(model.clone())
            .tool(Arc::new(StopTool))
            .output_key("current_document")
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        let control = agent.run(&mut ctx).await.unwrap();

        assert_eq!(control, Control::Escalate);
        assert_eq!(model.calls(), 1);
        assert!(ctx.state.get("current_document").is_none());
        assert!(ctx.events().last().unwrap().actions.escalate);
    }

    fn text_and_call(text: &str, name: &str) -> Content {
        Content {
            role: "model".into(),
            parts: vec![
                Part::Text(text.into()),
                Part::FunctionCall {
                    name: name.into(),
                    args: json!({}),
                    thought_signature: None,
                },
            ],
        }
    }

    #[tokio::test]
    async fn test_escalating_call_beside_text_still_escalates() {
        let model = ScriptedModel::new(vec![
            text_and_call("No changes needed, exiting.", "stop"),
            reply("never sent"),
        ]);
        let agent = LlmAgent::builder("refiner")
            .model(model.clone())
            .tool(Arc::new(StopTool))
            .output_key("current_document")
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        let control = agent.run(&mut ctx).await.unwrap();

        assert_eq!(control, Control::Escalate);
        assert_eq!(model.calls(), 1);
        assert!(ctx.state.get("current_document").is_none());
        assert!(!ctx.events().iter().any(|e| e.is_final_response()));
    }

    #[tokio::test]
    async fn test_call_beside_text_runs_before_answer() {
        let model = ScriptedModel::new(vec![
            text_and_call("Let me check.", "echo"),
            reply("checked"),
        ]);
        let agent = LlmAgent::builder("worker")
            .model(model.clone())
            .tool(Arc::new(EchoTool))
            .output_key("out")
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        assert_eq!(agent.run(&mut ctx).await.unwrap(), Control::Continue);

        assert_eq!(model.calls(), 2);
        assert_eq!(ctx.state.get_str("out"), Some("checked"));
    }

    #[tokio::test]
    async fn test_empty_response_writes_nothing() {
        let model = ScriptedModel::new(vec![Content {
            role: "model".into(),
            parts: vec![],
        }]);
        let agent = LlmAgent::builder("quiet")
            .model(model)
            .output_key("out")
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        agent.run(&mut ctx).await.unwrap();

        assert!(ctx.state.get("out").is_none());
        assert_eq!(ctx.events().len(), 1);
        assert_eq!(ctx.events()[0].text(), Some(""));
    }

    #[tokio::test]
    async fn test_max_turns() {
        let responses = (0..MAX_TURNS).map(|_| call("echo", json!({}))).collect();
        let model = ScriptedModel::new(responses);
        let agent = LlmAgent::builder("looper")
            .model(model.clone())
            .tool(Arc::new(EchoTool))
            .build()
            .unwrap();

        let mut ctx = ctx_with(SessionState::new());
        let err = agent.run(&mut ctx).await.unwrap_err();

        assert!(matches!(err, AdkError::MaxIterations { limit: MAX_TURNS, .. }));
        assert_eq!(model.calls(), MAX_TURNS as usize);
    }

    #[tokio::test]
    async fn test_model_error_propagates() {
        let model = ScriptedModel::new(vec![]);
        let agent = LlmAgent::builder("a").model(model).build().unwrap();
        let mut ctx = ctx_with(SessionState::new());
        assert!(matches!(
            agent.run(&mut ctx).await,
            Err(AdkError::Model { .. })
        ));
    }

    #[test]
    fn test_builder_requires_model() {
        assert!(LlmAgent::builder("no_model").build().is_err());
    }

    #[test]
    fn test_builder_rejects_duplicate_tools() {
        let result = LlmAgent::builder("dup")
            .model(ScriptedModel::new(vec![]))
            .tool(Arc::new(EchoTool))
            .tool(Arc::new(EchoTool))
            .build();
        assert!(result.is_err());
    }
}
