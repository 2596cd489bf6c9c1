// SPDX-License-Identifier: MIT

//! loop-agent: first draft, then critique and refinement until the
//! critic is satisfied or five rounds have passed

use super::tools::ExitLoopTool;
use crate::adk::agent::{Agent, LlmAgent, LoopAgent, SequentialAgent};
use crate::adk::error::Result;
use crate::adk::model::{ModelProvider, DEFAULT_MODEL};
use std::sync::Arc;

pub const MAX_ITERATIONS: u32 = 5;

/// Exact phrase the critic answers with once the draft is good enough
pub const COMPLETION_PHRASE: &str = "No major issues found.";

const INITIAL_WRITER_INSTRUCTION: &str = "You are a creative writer.

Topic: {topic}

Your task:
1. Write the first draft of a short story (2-4 sentences) on the topic
2. Output only the story text, no introductions or explanations

Be creative and engaging.";

const CRITIC_INSTRUCTION: &str = "You are a constructive critic reviewing a short document.

Current document:
```
{current_document}
```

Your task:
1. Review the document for clarity, engagement, and coherence
2. IF you identify 1-2 clear and actionable improvements, provide specific suggestions
3. ELSE IF the document is coherent and addresses the topic adequately, respond exactly: \"No major issues found.\"

Output only the critique OR the exact completion phrase.";

const REFINER_INSTRUCTION: &str = "You are a creative writer refining a document.

Current document:
```
{current_document}
```

Critique:
{criticism}

Your task:
1. IF the critique is exactly \"No major issues found.\":
   - Call the 'exit_loop' function
   - Do not output any text
2. ELSE:
   - Apply the suggestions to improve the document
   - Output only the refined document text";

pub fn build(provider: &dyn ModelProvider) -> Result<Arc<dyn Agent>> {
    let initial_writer = LlmAgent::builder("initial_writer")
        .description("Writes the first draft")
        .model(provider.model(DEFAULT_MODEL)?)
        .instruction(INITIAL_WRITER_INSTRUCTION)
        .output_key("current_document")
        .build()?;

    let critic = LlmAgent::builder("critic")
        .description("Critiques the current draft")
        .model(provider.model(DEFAULT_MODEL)?)
        .instruction(CRITIC_INSTRUCTION)
        .output_key("criticism")
        .build()?;

    let refiner = LlmAgent::builder("refiner")
        .description("Refines the draft or exits the loop when satisfied")
        .model(provider.model(DEFAULT_MODEL)?)
        .instruction(REFINER_INSTRUCTION)
        .tool(Arc::new(ExitLoopTool))
        .output_key("current_document")
        .build()?;

    let refinement_loop = LoopAgent::new(
        "refinement_loop",
        "Iterative improvement of the draft",
        vec![Arc::new(critic), Arc::new(refiner)],
        MAX_ITERATIONS,
    );

    Ok(Arc::new(SequentialAgent::new(
        "iterative_writing_pipeline",
        "Initial draft followed by iterative refinement",
        vec![Arc::new(initial_writer), Arc::new(refinement_loop)],
    )))
}
