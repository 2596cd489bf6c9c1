// SPDX-License-Identifier: MIT

//! Gemini Model - Google's Gemini API implementation

use super::{Content, GenerationConfig, Model, ModelProvider, Part};
use crate::adk::error::{AdkError, Result};
use crate::adk::tool::Tool;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::env;
use std::sync::Arc;

const PROVIDER: &str = "Gemini";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/";

/// Google Gemini model implementation
pub struct GeminiModel {
    client: Client,
    api_key: String,
    model_name: String,
}

impl GeminiModel {
    /// Create a new GeminiModel
    ///
    /// Requires `GOOGLE_API_KEY` environment variable to be set.
    pub fn new(model_name: impl Into<String>) -> Result<Self> {
        let api_key = env::var("GOOGLE_API_KEY")
            .map_err(|_| AdkError::config("GOOGLE_API_KEY must be set"))?;
        Ok(Self::with_client(Client::new(), api_key, model_name))
    }

    pub fn with_client(client: Client, api_key: String, model_name: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            model_name: model_name.into(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    fn endpoint(&self) -> Result<url::Url> {
        let mut url = url::Url::parse(API_BASE)?
            .join(&format!("models/{}:generateContent", self.model_name))?;
        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

/// Build the generateContent request body
///
/// System turns go to `systemInstruction`; everything else becomes
/// `contents`.
pub fn build_request_body(
    history: &[Content],
    config: Option<&GenerationConfig>,
    tools: Option<&[Arc<dyn Tool>]>,
) -> Value {
    let mut system_parts = Vec::new();
    let mut contents = Vec::new();

    for c in history {
        let parts: Vec<Value> = c.parts.iter().filter_map(part_to_gemini_json).collect();
        if c.role == "system" {
            system_parts.extend(parts);
        } else {
            contents.push(json!({ "role": c.role, "parts": parts }));
        }
    }

    let mut body = json!({ "contents": contents });

    if !system_parts.is_empty() {
        body["systemInstruction"] = json!({ "parts": system_parts });
    }

    if let Some(config) = config {
        let mut gen = serde_json::Map::new();
        if let Some(t) = config.temperature {
            gen.insert("temperature".into(), json!(t));
        }
        if let Some(m) = config.max_output_tokens {
            gen.insert("maxOutputTokens".into(), json!(m));
        }
        if let Some(p) = config.top_p {
            gen.insert("topP".into(), json!(p));
        }
        if let Some(k) = config.top_k {
            gen.insert("topK".into(), json!(k));
        }
        if !gen.is_empty() {
            body["generationConfig"] = Value::Object(gen);
        }
    }

    if let Some(tools) = tools {
        if !tools.is_empty() {
            let function_declarations: Vec<Value> = tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name(),
                        "description": t.description(),
                        "parameters": t.schema()
                    })
                })
                .collect();

            body["tools"] = json!([{
                "function_declarations": function_declarations
            }]);
        }
    }

    body
}

/// Turn a generateContent response into a model Content
pub fn parse_response(resp_json: &Value) -> Result<Content> {
    let candidate = resp_json["candidates"]
        .as_array()
        .and_then(|c| c.first())
        .ok_or_else(|| AdkError::model(PROVIDER, "No candidates in response"))?;

    if let Some(finish_reason) = candidate.get("finishReason").and_then(|v| v.as_str()) {
        log::debug!("Gemini finish reason: {}", finish_reason);
        match finish_reason {
            "UNEXPECTED_TOOL_CALL" => {
                return Err(AdkError::model(
                    PROVIDER,
                    "Gemini returned UNEXPECTED_TOOL_CALL. The tool schema may be incompatible.",
                ))
            }
            "SAFETY" => {
                return Err(AdkError::model(
                    PROVIDER,
                    "Gemini blocked response due to safety filters.",
                ))
            }
            "MALFORMED_FUNCTION_CALL" => {
                if let Some(msg) = candidate.get("finishMessage").and_then(|m| m.as_str()) {
                    log::warn!("Gemini malformed function call: {}", msg);
                    return Ok(Content::text(
                        "model",
                        format!("I tried to use a tool that isn't available. {}", msg),
                    ));
                }
            }
            _ => {}
        }
    }

    // A candidate without content is an empty answer (e.g. STOP with no text)
    let parts = candidate
        .get("content")
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .map(|parts| parts.iter().flat_map(parse_gemini_part).collect())
        .unwrap_or_default();

    Ok(Content {
        role: "model".to_string(),
        parts,
    })
}

#[async_trait]
impl Model for GeminiModel {
    async fn generate_content(
        &self,
        history: &[Content],
        config: Option<&GenerationConfig>,
        tools: Option<&[Arc<dyn Tool>]>,
    ) -> Result<Content> {
        let body = build_request_body(history, config, tools);

        log::debug!(
            "Gemini request body: {}",
            serde_json::to_string_pretty(&body).unwrap_or_default()
        );

        let resp = self.client.post(self.endpoint()?).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(AdkError::model(
                PROVIDER,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let resp_json: Value = resp.json().await?;
        log::debug!("Gemini response: {}", resp_json);

        parse_response(&resp_json)
    }
}

/// Serialize a Part to Gemini API JSON format
/// Returns None for parts that shouldn't be sent (e.g., Thinking)
pub fn part_to_gemini_json(part: &Part) -> Option<Value> {
    match part {
        Part::Text(t) => Some(json!({ "text": t })),
        Part::Thinking(_) => None, // Thinking is internal, not sent to API
        Part::FunctionCall {
            name,
            args,
            thought_signature,
        } => {
            let mut fc = json!({ "functionCall": { "name": name, "args": args } });
            if let Some(sig) = thought_signature {
                fc["thoughtSignature"] = json!(sig);
            }
            Some(fc)
        }
        Part::FunctionResponse { name, response } => {
            Some(json!({ "functionResponse": { "name": name, "response": response } }))
        }
    }
}

/// Parse a Gemini API JSON part into Parts
pub fn parse_gemini_part(p: &Value) -> Vec<Part> {
    let mut parts = Vec::new();

    // Thought parts are flagged with `"thought": true` alongside their text
    if p.get("thought").and_then(|t| t.as_bool()) == Some(true) {
        if let Some(text) = p["text"].as_str() {
            if !text.is_empty() {
                parts.push(Part::Thinking(text.to_string()));
            }
        }
        return parts;
    }

    if let Some(text) = p["text"].as_str() {
        parts.push(Part::Text(text.to_string()));
    } else if let Some(fc) = p.get("functionCall") {
        let name = fc["name"].as_str().unwrap_or_default().to_string();
        let args = fc["args"].clone();
        let thought_signature = p
            .get("thoughtSignature")
            .and_then(|s| s.as_str())
            .map(|s| s.to_string());
        parts.push(Part::FunctionCall {
            name,
            args,
            thought_signature,
        });
    }

    parts
}

/// Hands out Gemini models sharing one HTTP client and API key
pub struct GeminiProvider {
    client: Client,
    api_key: String,
}

impl GeminiProvider {
    /// Requires `GOOGLE_API_KEY`
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("GOOGLE_API_KEY")
            .map_err(|_| AdkError::config("GOOGLE_API_KEY must be set"))?;
        Ok(Self {
            client: Client::new(),
            api_key,
        })
    }
}

impl ModelProvider for GeminiProvider {
    fn model(&self, name: &str) -> Result<Arc<dyn Model>> {
        log::debug!("Using provider '{}' with model '{}'", PROVIDER, name);
        Ok(Arc::new(GeminiModel::with_client(
            self.client.clone(),
            self.api_key.clone(),
            name,
        )))
    }
}
