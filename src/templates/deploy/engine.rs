// SPDX-License-Identifier: MIT

//! Vertex AI Agent Engine (reasoningEngines) client

use super::vertex::VertexEndpoint;
use crate::adk::error::{AdkError, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// What gets uploaded for one template
#[derive(Debug, Clone)]
pub struct EngineSpec {
    pub display_name: String,
    /// `module.path:object`
    pub entrypoint: String,
    pub model: String,
    pub artifact: PathBuf,
    pub env: Vec<(String, String)>,
}

impl EngineSpec {
    /// Request body for `reasoningEngines.create`
    pub fn request_body(&self, source_archive: &[u8]) -> Result<Value> {
        let (module, object) = self.entrypoint.split_once(':').ok_or_else(|| {
            AdkError::config(format!(
                "Entrypoint '{}' must look like module:object",
                self.entrypoint
            ))
        })?;

        let mut env = vec![json!({ "name": "GOOGLE_GENAI_MODEL", "value": self.model })];
        env.extend(
            self.env
                .iter()
                .map(|(name, value)| json!({ "name": name, "value": value })),
        );

        Ok(json!({
            "displayName": self.display_name,
            "spec": {
                "agentFramework": "google-adk",
                "sourceCodeSpec": {
                    "inlineSource": { "sourceArchive": BASE64.encode(source_archive) },
                    "pythonSpec": {
                        "entrypointModule": module,
                        "entrypointObject": object,
                    },
                },
                "deploymentSpec": { "env": env },
            },
        }))
    }
}

/// Strip the `/operations/<id>` suffix of a long-running operation name
pub fn resource_from_operation(operation_name: &str) -> &str {
    match operation_name.find("/operations/") {
        Some(idx) => &operation_name[..idx],
        None => operation_name,
    }
}

pub struct AgentEngineClient {
    endpoint: VertexEndpoint,
}

impl AgentEngineClient {
    pub fn new(endpoint: VertexEndpoint) -> Self {
        Self { endpoint }
    }

    /// Accepts a bare engine id or a full
    /// `projects/*/locations/*/reasoningEngines/*` name
    pub fn resource_name(&self, resource_id: &str) -> Result<String> {
        let resource_id = resource_id.trim().trim_matches('/');
        if resource_id.is_empty() {
            return Err(AdkError::config("Resource id cannot be empty"));
        }
        if resource_id.starts_with("projects/") {
            if !resource_id.contains("/reasoningEngines/") {
                return Err(AdkError::config(format!(
                    "'{}' is not a reasoning engine resource name",
                    resource_id
                )));
            }
            return Ok(resource_id.to_string());
        }
        Ok(format!(
            "{}/reasoningEngines/{}",
            self.endpoint.parent(),
            resource_id
        ))
    }

    /// Upload the artifact and return the new engine's resource name
    pub async fn create_agent_engine(&self, spec: &EngineSpec) -> Result<String> {
        let archive = tokio::fs::read(&spec.artifact).await?;
        let body = spec.request_body(&archive)?;

        log::info!(
            "Creating agent engine {} from {} ({} bytes)",
            spec.display_name,
            spec.artifact.display(),
            archive.len()
        );
        let path = format!("{}/reasoningEngines", self.endpoint.parent());
        let operation = self.endpoint.post_json(&path, &body).await?;

        let name = operation
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| AdkError::deploy("Create response carries no operation name"))?;
        Ok(resource_from_operation(name).to_string())
    }

    /// Call `create_session` on a deployed engine, returning the session id
    pub async fn create_session(&self, resource_id: &str, user_id: &str) -> Result<String> {
        let path = format!("{}:query", self.resource_name(resource_id)?);
        let body = json!({
            "classMethod": "create_session",
            "input": { "user_id": user_id },
        });
        let reply = self.endpoint.post_json(&path, &body).await?;

        reply
            .pointer("/output/id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AdkError::deploy("create_session returned no session id"))
    }

    /// Send one message through `stream_query` and collect the text parts
    /// of every streamed event
    pub async fn stream_query(
        &self,
        resource_id: &str,
        user_id: &str,
        session_id: &str,
        message: &str,
    ) -> Result<Vec<String>> {
        let path = format!("{}:streamQuery", self.resource_name(resource_id)?);
        let body = json!({
            "classMethod": "stream_query",
            "input": {
                "user_id": user_id,
                "session_id": session_id,
                "message": message,
            },
        });
        let raw = self.endpoint.post_text(&path, &body).await?;
        Ok(stream_texts(&raw))
    }
}

/// Text parts of newline-delimited JSON events; undecodable lines are skipped
pub fn stream_texts(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match serde_json::from_str::<Value>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                log::warn!("Skipping undecodable stream line: {}", e);
                None
            }
        })
        .flat_map(|event| {
            event
                .pointer("/content/parts")
                .and_then(Value::as_array)
                .map(|parts| {
                    parts
                        .iter()
                        .filter_map(|p| p.get("text").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        })
        .collect()
}

/// `<dir>/<package>-<version>.tar.gz`
pub fn artifact_path(dir: &Path, package: &str, version: &str) -> PathBuf {
    dir.join(format!("{}-{}.tar.gz", package, version))
}
