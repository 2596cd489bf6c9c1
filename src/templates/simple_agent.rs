// SPDX-License-Identifier: MIT

//! simple-agent: one assistant with a weather tool

use super::tools::GetWeatherTool;
use crate::adk::agent::{Agent, LlmAgent};
use crate::adk::error::Result;
use crate::adk::model::{ModelProvider, DEFAULT_MODEL};
use std::sync::Arc;

pub const INSTRUCTION: &str = "You are a helpful assistant that can provide weather information.

When users ask about the weather:
1. Identify the city name from their query
2. Use the get_weather tool to retrieve weather information
3. Present the information in a friendly and clear manner

Be concise and helpful. If you don't have weather information for a city, apologize and suggest checking a weather service directly.";

pub fn build(provider: &dyn ModelProvider) -> Result<Arc<dyn Agent>> {
    let agent = LlmAgent::builder("simple_agent")
        .description("Simple assistant that can provide weather information")
        .model(provider.model(DEFAULT_MODEL)?)
        .instruction(INSTRUCTION)
        .tool(Arc::new(GetWeatherTool))
        .build()?;
    Ok(Arc::new(agent))
}
