// SPDX-License-Identifier: MIT

//! Runs a root agent against a stored session

use super::agent::Agent;
use super::context::InvocationContext;
use super::error::{AdkError, Result};
use super::event::Event;
use super::session::{SessionKey, SessionService};
use super::state::SessionState;
use std::sync::Arc;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Binds one root agent to a session service under an app name
#[derive(Clone)]
pub struct Runner {
    app_name: String,
    agent: Arc<dyn Agent>,
    sessions: Arc<dyn SessionService>,
}

impl Runner {
    pub fn new(
        app_name: impl Into<String>,
        agent: Arc<dyn Agent>,
        sessions: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            agent,
            sessions,
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    pub fn sessions(&self) -> &Arc<dyn SessionService> {
        &self.sessions
    }

    /// Run the agent for one user message and return every event it
    /// emitted. State changes and events are persisted only on success.
    pub async fn run(&self, user_id: &str, session_id: &str, message: &str) -> Result<Vec<Event>> {
        let ctx = self.context(user_id, session_id, message).await?;
        self.execute(ctx, user_id, session_id).await
    }

    /// Like [`Runner::run`], forwarding events to `tx` as they happen
    pub async fn run_stream(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
        tx: mpsc::Sender<Event>,
    ) -> Result<Vec<Event>> {
        let ctx = self
            .context(user_id, session_id, message)
            .await?
            .with_sink(tx);
        self.execute(ctx, user_id, session_id).await
    }

    async fn context(
        &self,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<InvocationContext> {
        let key = SessionKey::new(&self.app_name, user_id, session_id);
        let session = self.sessions.get(&key).await?.ok_or_else(|| {
            AdkError::session(format!(
                "Session {} not found for user {}",
                session_id, user_id
            ))
        })?;

        Ok(InvocationContext::new(
            Uuid::new_v4().to_string(),
            Some(message.to_string()),
            SessionState::from_map(session.state),
        ))
    }

    async fn execute(
        &self,
        mut ctx: InvocationContext,
        user_id: &str,
        session_id: &str,
    ) -> Result<Vec<Event>> {
        log::info!(
            "Invocation {} of {} for session {}",
            ctx.invocation_id(),
            self.agent.name(),
            session_id
        );
        self.agent.run(&mut ctx).await?;

        let (state, events) = ctx.into_parts();
        let key = SessionKey::new(&self.app_name, user_id, session_id);
        self.sessions
            .append(&key, state.delta(), events.clone())
            .await?;
        Ok(events)
    }
}

/// Texts of the non-empty final answers, in emission order
pub fn final_responses(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter(|e| e.is_final_response())
        .filter_map(Event::text)
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::agent::testing::{FailingAgent, RecordingAgent};
    use crate::adk::event::EventKind;
    use crate::adk::session::InMemorySessionService;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    async fn runner_with(agent: Arc<dyn Agent>) -> Runner {
        let sessions = Arc::new(InMemorySessionService::new());
        let mut state = HashMap::new();
        state.insert("topic".to_string(), json!("A robot learning to paint"));
        sessions
            .create("agents", "user123", Some("session001".into()), state)
            .await
            .unwrap();
        Runner::new("agents", agent, sessions)
    }

    #[tokio::test]
    async fn test_run_persists_state_and_events() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let runner = runner_with(Arc::new(RecordingAgent::new("writer", "draft", journal))).await;

        let events = runner.run("user123", "session001", "go").await.unwrap();
        assert_eq!(final_responses(&events), vec!["writer-output"]);

        let key = SessionKey::new("agents", "user123", "session001");
        let session = runner.sessions().get(&key).await.unwrap().unwrap();
        assert_eq!(session.state["draft"], json!("writer-output"));
        assert_eq!(session.state["topic"], json!("A robot learning to paint"));
        assert_eq!(session.events.len(), 1);
    }

    #[tokio::test]
    async fn test_run_stream_forwards_events() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let runner = runner_with(Arc::new(RecordingAgent::new("writer", "draft", journal))).await;

        let (tx, mut rx) = mpsc::channel(8);
        runner
            .run_stream("user123", "session001", "go", tx)
            .await
            .unwrap();
        let streamed = rx.recv().await.unwrap();
        assert_eq!(streamed.author, "writer");
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let runner = runner_with(Arc::new(RecordingAgent::new("w", "d", journal))).await;
        let err = runner.run("user123", "missing", "go").await.unwrap_err();
        assert!(matches!(err, AdkError::Session(_)));
    }

    #[tokio::test]
    async fn test_failure_persists_nothing() {
        let runner = runner_with(Arc::new(FailingAgent { name: "bad".into() })).await;
        assert!(runner.run("user123", "session001", "go").await.is_err());

        let key = SessionKey::new("agents", "user123", "session001");
        let session = runner.sessions().get(&key).await.unwrap().unwrap();
        assert!(session.events.is_empty());
    }

    #[test]
    fn test_final_responses_skip_empty_and_tool_events() {
        let events = vec![
            Event::new("i", "a", EventKind::ToolCall { name: "t".into(), args: json!({}) }),
            Event::new("i", "a", EventKind::Answer(String::new())),
            Event::new("i", "b", EventKind::Answer("text".into())),
        ];
        assert_eq!(final_responses(&events), vec!["text"]);
    }
}
