// SPDX-License-Identifier: MIT

//! Per-invocation context handed to every stage

use super::event::Event;
use super::state::SessionState;
use tokio::sync::mpsc;

/// Everything a stage needs while it runs: the shared state, the user's
/// message and somewhere to put the events it emits.
///
/// Events are recorded locally and, when a sink is attached, forwarded
/// to it as they happen so callers can stream progress.
pub struct InvocationContext {
    invocation_id: String,
    user_content: Option<String>,
    pub state: SessionState,
    events: Vec<Event>,
    sink: Option<mpsc::Sender<Event>>,
}

impl InvocationContext {
    pub fn new(
        invocation_id: impl Into<String>,
        user_content: Option<String>,
        state: SessionState,
    ) -> Self {
        Self {
            invocation_id: invocation_id.into(),
            user_content,
            state,
            events: Vec::new(),
            sink: None,
        }
    }

    /// Forward every emitted event to `tx`
    pub fn with_sink(mut self, tx: mpsc::Sender<Event>) -> Self {
        self.sink = Some(tx);
        self
    }

    pub fn invocation_id(&self) -> &str {
        &self.invocation_id
    }

    /// The message that started this invocation
    pub fn user_content(&self) -> Option<&str> {
        self.user_content.as_deref()
    }

    /// Record an event and stream it to the sink, if any
    pub async fn emit(&mut self, event: Event) {
        if let Some(tx) = &self.sink {
            // A caller that stopped listening does not stop the run
            let _ = tx.send(event.clone()).await;
        }
        self.events.push(event);
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Independent copy for a concurrently running stage: forked state,
    /// no recorded events, same sink.
    pub fn fork(&self) -> Self {
        Self {
            invocation_id: self.invocation_id.clone(),
            user_content: self.user_content.clone(),
            state: self.state.fork(),
            events: Vec::new(),
            sink: self.sink.clone(),
        }
    }

    /// Fold a finished fork back in. Its events were already streamed,
    /// so they are only recorded here.
    pub fn join(&mut self, fork: InvocationContext) {
        self.state.merge(&fork.state);
        self.events.extend(fork.events);
    }

    pub fn into_parts(self) -> (SessionState, Vec<Event>) {
        (self.state, self.events)
    }
}
