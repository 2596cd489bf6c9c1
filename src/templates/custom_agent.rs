// SPDX-License-Identifier: MIT

//! custom-agent: story generation with a conditional regeneration step
//!
//! ```text
//! AwaitingGeneration -> Generated -> Refining -> PostProcessing -> Branch
//!        |                                                          |
//!        v                                              negative tone?
//!     Aborted                                   yes: Regenerating -> Done
//!                                               no:  Done
//! ```

use crate::adk::agent::{Agent, Control, LlmAgent, LoopAgent, SequentialAgent};
use crate::adk::context::InvocationContext;
use crate::adk::error::Result;
use crate::adk::model::{ModelProvider, DEFAULT_MODEL};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub const STORY_KEY: &str = "current_story";
pub const TONE_KEY: &str = "tone_check_result";
pub const REFINEMENT_ITERATIONS: u32 = 2;

/// Where the orchestration currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    AwaitingGeneration,
    Generated,
    Refining,
    PostProcessing,
    Branch,
    Regenerating,
    Done,
    /// The generator produced no story
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Aborted)
    }
}

/// Classifier verdict on the story's tone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Positive,
    Negative,
    Neutral,
    /// Anything the classifier was not asked to say
    Unrecognized,
}

impl Tone {
    /// Case-insensitive; surrounding whitespace, quotes and punctuation
    /// are ignored so `"Negative."` still counts.
    pub fn parse(raw: &str) -> Tone {
        let word = raw
            .trim_matches(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .to_lowercase();
        match word.as_str() {
            "positive" => Tone::Positive,
            "negative" => Tone::Negative,
            "neutral" => Tone::Neutral,
            _ => Tone::Unrecognized,
        }
    }

    pub fn from_state(value: Option<&Value>) -> Tone {
        match value {
            Some(Value::String(s)) => Tone::parse(s),
            _ => Tone::Unrecognized,
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tone::Positive => "positive",
            Tone::Negative => "negative",
            Tone::Neutral => "neutral",
            Tone::Unrecognized => "unrecognized",
        };
        f.write_str(s)
    }
}

/// Generate, refine twice, check grammar and tone, and regenerate once
/// if the tone came out negative
pub struct StoryFlowAgent {
    name: String,
    story_generator: Arc<dyn Agent>,
    refinement_loop: LoopAgent,
    post_processing: SequentialAgent,
}

impl StoryFlowAgent {
    pub fn new(
        name: impl Into<String>,
        story_generator: Arc<dyn Agent>,
        critic: Arc<dyn Agent>,
        reviser: Arc<dyn Agent>,
        grammar_check: Arc<dyn Agent>,
        tone_check: Arc<dyn Agent>,
    ) -> Self {
        Self {
            name: name.into(),
            story_generator,
            refinement_loop: LoopAgent::new(
                "CriticReviserLoop",
                "Critique then revise the story",
                vec![critic, reviser],
                REFINEMENT_ITERATIONS,
            ),
            post_processing: SequentialAgent::new(
                "PostProcessing",
                "Grammar check then tone check",
                vec![grammar_check, tone_check],
            ),
        }
    }

    /// Drive the flow to a terminal phase
    pub async fn run_flow(&self, ctx: &mut InvocationContext) -> Result<Phase> {
        let mut phase = Phase::AwaitingGeneration;

        while !phase.is_terminal() {
            phase = match phase {
                Phase::AwaitingGeneration => {
                    self.story_generator.run(ctx).await?;
                    if ctx.state.contains(STORY_KEY) {
                        Phase::Generated
                    } else {
                        log::warn!("{}: no story generated, aborting", self.name);
                        Phase::Aborted
                    }
                }
                Phase::Generated => Phase::Refining,
                Phase::Refining => {
                    self.refinement_loop.run(ctx).await?;
                    Phase::PostProcessing
                }
                Phase::PostProcessing => {
                    self.post_processing.run(ctx).await?;
                    Phase::Branch
                }
                Phase::Branch => {
                    let tone = Tone::from_state(ctx.state.get(TONE_KEY));
                    log::info!("{}: tone is {}", self.name, tone);
                    if tone == Tone::Negative {
                        Phase::Regenerating
                    } else {
                        Phase::Done
                    }
                }
                Phase::Regenerating => {
                    // The new story is not re-checked
                    self.story_generator.run(ctx).await?;
                    Phase::Done
                }
                Phase::Done | Phase::Aborted => phase,
            };
            log::debug!("{}: entering {:?}", self.name, phase);
        }

        Ok(phase)
    }
}

#[async_trait]
impl Agent for StoryFlowAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Story generation with conditional regeneration"
    }

    async fn run(&self, ctx: &mut InvocationContext) -> Result<Control> {
        self.run_flow(ctx).await?;
        Ok(Control::Continue)
    }
}

const STORY_GENERATOR_INSTRUCTION: &str =
    "Write a short story (around 100 words) on the following topic: {topic}";

const CRITIC_INSTRUCTION: &str = "Review the following story:
{current_story}

Provide 1-2 sentences of constructive criticism on how to improve it. Focus on plot or character.";

const REVISER_INSTRUCTION: &str = "Revise the following story:
{current_story}

Base the revision on this criticism:
{criticism}

Output only the revised story.";

const GRAMMAR_INSTRUCTION: &str = "Check the grammar of the following story:
{current_story}

Output only the suggested corrections as a list, or output 'Grammar is good!' if there are no errors.";

const TONE_INSTRUCTION: &str = "Analyze the tone of the following story:
{current_story}

Output only one word: 'positive' if the tone is generally positive, 'negative' if generally negative, or 'neutral' otherwise.";

pub fn build(provider: &dyn ModelProvider) -> Result<Arc<dyn Agent>> {
    let stage = |name: &str, description: &str, instruction: &str, key: &str| -> Result<Arc<dyn Agent>> {
        let agent = LlmAgent::builder(name)
            .description(description)
            .model(provider.model(DEFAULT_MODEL)?)
            .instruction(instruction)
            .output_key(key)
            .build()?;
        Ok(Arc::new(agent))
    };

    Ok(Arc::new(StoryFlowAgent::new(
        "StoryFlowAgent",
        stage(
            "StoryGenerator",
            "Generates the initial story",
            STORY_GENERATOR_INSTRUCTION,
            STORY_KEY,
        )?,
        stage("Critic", "Critiques the story", CRITIC_INSTRUCTION, "criticism")?,
        stage(
            "Reviser",
            "Revises the story based on the criticism",
            REVISER_INSTRUCTION,
            STORY_KEY,
        )?,
        stage(
            "GrammarCheck",
            "Checks the grammar",
            GRAMMAR_INSTRUCTION,
            "grammar_suggestions",
        )?,
        stage("ToneCheck", "Analyzes the tone", TONE_INSTRUCTION, TONE_KEY)?,
    )))
}
