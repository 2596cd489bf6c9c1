// SPDX-License-Identifier: MIT

//! sequential-agent: writer, reviewer, refiner

use crate::adk::agent::{Agent, LlmAgent, SequentialAgent};
use crate::adk::error::Result;
use crate::adk::model::{ModelProvider, DEFAULT_MODEL};
use std::sync::Arc;

pub const REFINER_MODEL: &str = "gemini-2.5-pro";

const WRITER_INSTRUCTION: &str = "You are a creative writer.

Your task:
1. Understand the user's request for content
2. Generate initial content based on the request
3. Output only the content, no explanations or meta-commentary

The content should be:
- Relevant to the user's request
- Well-structured
- Engaging

Output the content directly without any preamble.";

const REVIEWER_INSTRUCTION: &str = "You are a content reviewer.

Content to review:
```
{generated_content}
```

Your task:
1. Identify strengths and areas for improvement
2. Provide constructive feedback

Focus on:
- Clarity and coherence
- Grammar and style
- Engagement and relevance
- Overall quality

Output your review as concise bullet points.";

const REFINER_INSTRUCTION: &str = "You are a content refiner.

Original content:
```
{generated_content}
```

Review feedback:
{review_feedback}

Your task:
1. Refine the content based on the feedback
2. Improve clarity, fix issues, and enhance quality

Output only the refined content, no explanations.";

pub fn build(provider: &dyn ModelProvider) -> Result<Arc<dyn Agent>> {
    let writer = LlmAgent::builder("writer")
        .description("Generates initial content from the user's request")
        .model(provider.model(DEFAULT_MODEL)?)
        .instruction(WRITER_INSTRUCTION)
        .output_key("generated_content")
        .build()?;

    let reviewer = LlmAgent::builder("reviewer")
        .description("Reviews and critiques the generated content")
        .model(provider.model(DEFAULT_MODEL)?)
        .instruction(REVIEWER_INSTRUCTION)
        .output_key("review_feedback")
        .build()?;

    let refiner = LlmAgent::builder("refiner")
        .description("Refines the content based on the reviewer's feedback")
        .model(provider.model(REFINER_MODEL)?)
        .instruction(REFINER_INSTRUCTION)
        .output_key("final_content")
        .build()?;

    Ok(Arc::new(SequentialAgent::new(
        "writing_pipeline",
        "Sequential content generation with review",
        vec![Arc::new(writer), Arc::new(reviewer), Arc::new(refiner)],
    )))
}
