// SPDX-License-Identifier: MIT

//! Progress events emitted while a pipeline runs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// What happened
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventKind {
    ToolCall { name: String, args: Value },
    ToolResult { name: String, result: Value },
    /// Final text produced by one stage invocation
    Answer(String),
    Error(String),
}

/// Side effects carried by an event
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventActions {
    /// Keys the authoring stage wrote to shared state
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub state_delta: Map<String, Value>,
    /// The authoring stage asked its enclosing loop to stop
    #[serde(default)]
    pub escalate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub invocation_id: String,
    /// Name of the stage that produced the event
    pub author: String,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    #[serde(default)]
    pub actions: EventActions,
}

impl Event {
    pub fn new(invocation_id: &str, author: &str, kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            invocation_id: invocation_id.to_string(),
            author: author.to_string(),
            timestamp: Utc::now(),
            kind,
            actions: EventActions::default(),
        }
    }

    pub fn with_state_delta(mut self, key: &str, value: Value) -> Self {
        self.actions.state_delta.insert(key.to_string(), value);
        self
    }

    pub fn with_escalate(mut self) -> Self {
        self.actions.escalate = true;
        self
    }

    /// True for the event that closes a stage invocation with its answer
    pub fn is_final_response(&self) -> bool {
        matches!(self.kind, EventKind::Answer(_))
    }

    /// Answer text, if this is an answer event
    pub fn text(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Answer(text) => Some(text),
            _ => None,
        }
    }
}
