// SPDX-License-Identifier: MIT

//! Composite agents: sequence, parallel fan-out and bounded loop

use super::{Agent, Control};
use crate::adk::context::InvocationContext;
use crate::adk::error::{AdkError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// Runs sub-agents one after another on the same context
pub struct SequentialAgent {
    pub name: String,
    pub description: String,
    pub sub_agents: Vec<Arc<dyn Agent>>,
}

impl SequentialAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_agents: Vec<Arc<dyn Agent>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sub_agents,
        }
    }
}

#[async_trait]
impl Agent for SequentialAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &mut InvocationContext) -> Result<Control> {
        for agent in &self.sub_agents {
            log::info!("Sequence {} running {}", self.name, agent.name());
            // An escalation ends the sequence and travels up to the
            // enclosing loop
            if agent.run(ctx).await?.is_escalate() {
                log::info!("Sequence {} stopped by {}", self.name, agent.name());
                return Ok(Control::Escalate);
            }
        }
        Ok(Control::Continue)
    }
}

/// Runs independent sub-agents concurrently
///
/// Each member gets a fork of the context. Members never observe each
/// other's writes; their state deltas and events are merged into the
/// parent, in declaration order, only after every member has finished.
pub struct ParallelAgent {
    pub name: String,
    pub description: String,
    pub sub_agents: Vec<Arc<dyn Agent>>,
}

impl ParallelAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_agents: Vec<Arc<dyn Agent>>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sub_agents,
        }
    }
}

#[async_trait]
impl Agent for ParallelAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &mut InvocationContext) -> Result<Control> {
        let mut handles = Vec::with_capacity(self.sub_agents.len());

        for agent in &self.sub_agents {
            let agent = agent.clone();
            let mut fork = ctx.fork();
            handles.push(tokio::spawn(async move {
                let result = agent.run(&mut fork).await;
                (fork, result)
            }));
        }

        // Wait for every member before touching the parent state
        let mut finished = Vec::with_capacity(handles.len());
        for (handle, agent) in handles.into_iter().zip(&self.sub_agents) {
            let joined = handle.await.map_err(|e| {
                AdkError::agent(format!("Parallel member {} panicked: {}", agent.name(), e))
            });
            finished.push(joined);
        }

        let mut control = Control::Continue;
        let mut first_error = None;
        for joined in finished {
            match joined {
                Ok((fork, Ok(member_control))) => {
                    ctx.join(fork);
                    if member_control.is_escalate() {
                        control = Control::Escalate;
                    }
                }
                Ok((_, Err(e))) | Err(e) => {
                    log::error!("Parallel {} member failed: {}", self.name, e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(control),
        }
    }
}

/// Repeats its sub-agents, in order, up to `max_iterations` times
///
/// A sub-agent returning [`Control::Escalate`] ends the loop at once;
/// the escalation is consumed here and not passed to the parent.
pub struct LoopAgent {
    pub name: String,
    pub description: String,
    pub sub_agents: Vec<Arc<dyn Agent>>,
    pub max_iterations: u32,
}

impl LoopAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        sub_agents: Vec<Arc<dyn Agent>>,
        max_iterations: u32,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            sub_agents,
            max_iterations,
        }
    }
}

#[async_trait]
impl Agent for LoopAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, ctx: &mut InvocationContext) -> Result<Control> {
        for iteration in 0..self.max_iterations {
            log::info!(
                "Loop {} iteration {}/{}",
                self.name,
                iteration + 1,
                self.max_iterations
            );
            for agent in &self.sub_agents {
                if agent.run(ctx).await?.is_escalate() {
                    log::info!(
                        "Loop {} exited early by {} on iteration {}",
                        self.name,
                        agent.name(),
                        iteration + 1
                    );
                    return Ok(Control::Continue);
                }
            }
        }
        Ok(Control::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adk::agent::testing::{FailingAgent, RecordingAgent};
    use crate::adk::state::SessionState;
    use std::sync::Mutex;

    fn ctx() -> InvocationContext {
        InvocationContext::new("inv", Some("go".to_string()), SessionState::new())
    }

    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(journal: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[tokio::test]
    async fn test_sequential_runs_in_order() {
        let j = journal();
        let seq = SequentialAgent::new(
            "writing_pipeline",
            "test",
            vec![
                Arc::new(RecordingAgent::new("writer", "generated_content", j.clone())),
                Arc::new(RecordingAgent::new("reviewer", "review_feedback", j.clone())),
                Arc::new(RecordingAgent::new("refiner", "final_content", j.clone())),
            ],
        );

        let mut ctx = ctx();
        let control = seq.run(&mut ctx).await.unwrap();

        assert_eq!(control, Control::Continue);
        assert_eq!(entries(&j), vec!["writer", "reviewer", "refiner"]);
        assert_eq!(ctx.state.get_str("final_content"), Some("refiner-output"));
        assert_eq!(ctx.events().len(), 3);
    }

    #[tokio::test]
    async fn test_sequential_empty() {
        let seq = SequentialAgent::new("empty", "test", vec![]);
        let mut ctx = ctx();
        assert_eq!(seq.run(&mut ctx).await.unwrap(), Control::Continue);
        assert!(ctx.events().is_empty());
    }

    #[tokio::test]
    async fn test_sequential_stops_and_propagates_escalation() {
        let j = journal();
        let seq = SequentialAgent::new(
            "seq",
            "test",
            vec![
                Arc::new(RecordingAgent::new("a", "a", j.clone()).escalating_on(1)),
                Arc::new(RecordingAgent::new("b", "b", j.clone())),
            ],
        );

        let mut ctx = ctx();
        assert_eq!(seq.run(&mut ctx).await.unwrap(), Control::Escalate);
        assert_eq!(entries(&j), vec!["a"]);
    }

    #[tokio::test]
    async fn test_sequential_propagates_failure() {
        let j = journal();
        let seq = SequentialAgent::new(
            "seq",
            "test",
            vec![
                Arc::new(FailingAgent { name: "bad".into() }),
                Arc::new(RecordingAgent::new("after", "after", j.clone())),
            ],
        );

        let mut ctx = ctx();
        let err = seq.run(&mut ctx).await.unwrap_err();
        assert!(err.to_string().contains("bad failed"));
        assert!(entries(&j).is_empty());
    }

    #[tokio::test]
    async fn test_loop_runs_exactly_max_iterations() {
        let j = journal();
        let critic = Arc::new(RecordingAgent::new("critic", "criticism", j.clone()));
        let reviser = Arc::new(RecordingAgent::new("reviser", "current_story", j.clone()));
        let loop_agent = LoopAgent::new(
            "CriticReviserLoop",
            "test",
            vec![critic.clone(), reviser.clone()],
            2,
        );

        let mut ctx = ctx();
        loop_agent.run(&mut ctx).await.unwrap();

        assert_eq!(critic.calls(), 2);
        assert_eq!(reviser.calls(), 2);
        assert_eq!(entries(&j), vec!["critic", "reviser", "critic", "reviser"]);
    }

    #[tokio::test]
    async fn test_loop_zero_iterations() {
        let j = journal();
        let worker = Arc::new(RecordingAgent::new("worker", "out", j.clone()));
        let loop_agent = LoopAgent::new("loop", "test", vec![worker.clone()], 0);

        let mut ctx = ctx();
        loop_agent.run(&mut ctx).await.unwrap();
        assert_eq!(worker.calls(), 0);
        assert!(ctx.state.get("out").is_none());
    }

    #[tokio::test]
    async fn test_loop_escalation_halts_remaining_iterations() {
        let j = journal();
        let critic = Arc::new(RecordingAgent::new("critic", "criticism", j.clone()));
        // Refiner asks to stop on its second call, i.e. iteration 2 of 5
        let refiner = Arc::new(
            RecordingAgent::new("refiner", "current_document", j.clone()).escalating_on(2),
        );
        let after = Arc::new(RecordingAgent::new("after", "after", j.clone()));
        let loop_agent = LoopAgent::new(
            "refinement_loop",
            "test",
            vec![critic.clone(), refiner.clone(), after.clone()],
            5,
        );

        let mut ctx = ctx();
        let control = loop_agent.run(&mut ctx).await.unwrap();

        // Escalation is consumed by the loop
        assert_eq!(control, Control::Continue);
        assert_eq!(critic.calls(), 2);
        assert_eq!(refiner.calls(), 2);
        assert_eq!(after.calls(), 1);
        assert_eq!(
            entries(&j),
            vec!["critic", "refiner", "after", "critic", "refiner"]
        );
        assert!(ctx.events().last().unwrap().actions.escalate);
    }

    #[tokio::test]
    async fn test_loop_stops_on_escalating_nested_sequence() {
        let j = journal();
        let inner = Arc::new(SequentialAgent::new(
            "inner",
            "test",
            vec![
                Arc::new(RecordingAgent::new("a", "a", j.clone()).escalating_on(1)),
                Arc::new(RecordingAgent::new("b", "b", j.clone())),
            ],
        ));
        let loop_agent = LoopAgent::new("loop", "test", vec![inner], 3);

        let mut ctx = ctx();
        loop_agent.run(&mut ctx).await.unwrap();
        assert_eq!(entries(&j), vec!["a"]);
    }

    #[tokio::test]
    async fn test_parallel_merges_all_outputs() {
        let j = journal();
        let parallel = ParallelAgent::new(
            "parallel_research",
            "test",
            vec![
                Arc::new(RecordingAgent::new("r1", "renewable_energy_result", j.clone())),
                Arc::new(RecordingAgent::new("r2", "ev_technology_result", j.clone())),
                Arc::new(RecordingAgent::new("r3", "carbon_capture_result", j.clone())),
            ],
        );

        let mut ctx = ctx();
        let control = parallel.run(&mut ctx).await.unwrap();

        assert_eq!(control, Control::Continue);
        assert_eq!(ctx.state.get_str("renewable_energy_result"), Some("r1-output"));
        assert_eq!(ctx.state.get_str("ev_technology_result"), Some("r2-output"));
        assert_eq!(ctx.state.get_str("carbon_capture_result"), Some("r3-output"));
        assert_eq!(ctx.events().len(), 3);

        let mut ran = entries(&j);
        ran.sort();
        assert_eq!(ran, vec!["r1", "r2", "r3"]);
    }

    #[tokio::test]
    async fn test_parallel_members_do_not_see_each_other() {
        struct Peeker;

        #[async_trait]
        impl Agent for Peeker {
            fn name(&self) -> &str {
                "peeker"
            }
            async fn run(&self, ctx: &mut InvocationContext) -> Result<Control> {
                // Give the sibling a chance to run first
                tokio::task::yield_now().await;
                let saw = ctx.state.contains("sibling");
                ctx.state.set("peeker_saw_sibling", serde_json::json!(saw));
                Ok(Control::Continue)
            }
        }

        let j = journal();
        let parallel = ParallelAgent::new(
            "p",
            "test",
            vec![
                Arc::new(RecordingAgent::new("sibling", "sibling", j.clone())),
                Arc::new(Peeker),
            ],
        );

        let mut ctx = ctx();
        parallel.run(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.state.get("peeker_saw_sibling"),
            Some(&serde_json::json!(false))
        );
        assert!(ctx.state.contains("sibling"));
    }

    #[tokio::test]
    async fn test_parallel_failure_propagates_after_all_complete() {
        let j = journal();
        let ok = Arc::new(RecordingAgent::new("ok", "ok_result", j.clone()));
        let parallel = ParallelAgent::new(
            "p",
            "test",
            vec![ok.clone(), Arc::new(FailingAgent { name: "bad".into() })],
        );

        let mut ctx = ctx();
        let err = parallel.run(&mut ctx).await.unwrap_err();

        assert!(err.to_string().contains("bad failed"));
        assert_eq!(ok.calls(), 1);
    }

    #[tokio::test]
    async fn test_merge_stage_runs_after_parallel_members() {
        let j = journal();
        let parallel = Arc::new(ParallelAgent::new(
            "parallel_research",
            "test",
            vec![
                Arc::new(RecordingAgent::new("r1", "k1", j.clone())),
                Arc::new(RecordingAgent::new("r2", "k2", j.clone())),
            ],
        ));
        let merger = Arc::new(RecordingAgent::new("merger", "report", j.clone()));
        let pipeline = SequentialAgent::new("research", "test", vec![parallel, merger]);

        let mut ctx = ctx();
        pipeline.run(&mut ctx).await.unwrap();

        let ran = entries(&j);
        assert_eq!(ran.last().map(String::as_str), Some("merger"));
        assert_eq!(ran.len(), 3);
    }
}
