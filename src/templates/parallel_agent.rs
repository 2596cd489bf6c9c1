// SPDX-License-Identifier: MIT

//! parallel-agent: three independent researchers, then one synthesis

use crate::adk::agent::{Agent, LlmAgent, ParallelAgent, SequentialAgent};
use crate::adk::error::Result;
use crate::adk::model::{ModelProvider, DEFAULT_MODEL};
use std::sync::Arc;

pub const SYNTHESIS_MODEL: &str = "gemini-2.5-pro";

/// (agent name, description, research topic, focus, output key)
const RESEARCHERS: [(&str, &str, &str, &str, &str); 3] = [
    (
        "renewable_energy_researcher",
        "renewable energy",
        "renewable energy sources and latest trends",
        "solar, wind, and hydroelectric power",
        "renewable_energy_result",
    ),
    (
        "ev_researcher",
        "electric vehicles",
        "electric vehicle technology and market trends",
        "battery technology, charging infrastructure, and market adoption",
        "ev_technology_result",
    ),
    (
        "carbon_capture_researcher",
        "carbon capture",
        "carbon capture and storage methods",
        "effectiveness, costs, and scalability",
        "carbon_capture_result",
    ),
];

const SYNTHESIS_INSTRUCTION: &str = "You are a synthesis specialist.

Your task:
1. Review the research results from parallel researchers:
   - Renewable Energy: {renewable_energy_result}
   - Electric Vehicles: {ev_technology_result}
   - Carbon Capture: {carbon_capture_result}

2. Synthesize these findings into a coherent report

3. Structure your response with:
   - Introduction
   - Key findings from each area
   - Connections and relationships between findings
   - Conclusion

Be comprehensive but concise.";

fn researcher_instruction(field: &str, topic: &str, focus: &str) -> String {
    format!(
        "You are a researcher specializing in {field}.

Research topic: {topic}

Your task:
1. Research the latest developments in {field}
2. Focus on {focus}
3. Summarize key findings concisely (2-3 sentences)
4. Output only the summary, no meta-commentary"
    )
}

pub fn build(provider: &dyn ModelProvider) -> Result<Arc<dyn Agent>> {
    let mut researchers: Vec<Arc<dyn Agent>> = Vec::with_capacity(RESEARCHERS.len());
    for (name, field, topic, focus, key) in RESEARCHERS {
        let agent = LlmAgent::builder(name)
            .description(format!("Researches {}", field))
            .model(provider.model(DEFAULT_MODEL)?)
            .instruction(researcher_instruction(field, topic, focus))
            .output_key(key)
            .build()?;
        researchers.push(Arc::new(agent));
    }

    let parallel_research = ParallelAgent::new(
        "parallel_research",
        "Runs the research tasks concurrently",
        researchers,
    );

    let synthesis = LlmAgent::builder("synthesis_agent")
        .description("Synthesizes the parallel research results")
        .model(provider.model(SYNTHESIS_MODEL)?)
        .instruction(SYNTHESIS_INSTRUCTION)
        .output_key("synthesis_report")
        .build()?;

    Ok(Arc::new(SequentialAgent::new(
        "research_and_synthesis",
        "Parallel research followed by synthesis",
        vec![Arc::new(parallel_research), Arc::new(synthesis)],
    )))
}
