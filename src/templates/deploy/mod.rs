// SPDX-License-Identifier: MIT

//! Deployment to Vertex AI Agent Engine
//!
//! The packaged artifact is produced outside this crate; these helpers
//! only validate configuration, upload it and exercise the result.

mod auth;
mod config;
mod engine;
mod vertex;

pub use auth::{GcloudTokenSource, StaticToken, TokenSource};
pub use config::{CloudConfig, RagCorpus, DEFAULT_LOCATION};
pub use engine::{
    artifact_path, resource_from_operation, stream_texts, AgentEngineClient, EngineSpec,
};
pub use vertex::VertexEndpoint;

use super::Template;
use crate::adk::error::Result;
use std::path::Path;

/// Version baked into artifact file names
pub const ARTIFACT_VERSION: &str = "1.0.0";

/// Where `deploy` looks for artifacts unless told otherwise
pub const DEFAULT_DEPLOYMENT_DIR: &str = "deployment";

/// Instructions printed when the artifact has not been built yet
pub fn build_hint(template: Template, dir: &Path) -> String {
    format!(
        "Artifact {} not found.\nBuild the {} package first and place it in {}/",
        artifact_path(dir, template.package_name(), ARTIFACT_VERSION).display(),
        template.display_name(),
        dir.display()
    )
}

/// Deploy one template. Returns `Ok(None)` when the artifact is missing.
pub async fn deploy(
    template: Template,
    config: &CloudConfig,
    client: &AgentEngineClient,
    dir: &Path,
) -> Result<Option<String>> {
    let artifact = artifact_path(dir, template.package_name(), ARTIFACT_VERSION);
    if !artifact.exists() {
        log::warn!("Artifact {} missing, nothing deployed", artifact.display());
        return Ok(None);
    }

    let mut env = vec![
        ("GOOGLE_CLOUD_PROJECT".to_string(), config.project.clone()),
        ("GOOGLE_CLOUD_LOCATION".to_string(), config.location.clone()),
    ];
    if let Some(corpus) = &config.rag_corpus {
        env.push(("RAG_CORPUS".to_string(), corpus.to_string()));
    }

    let spec = EngineSpec {
        display_name: template.display_name().to_string(),
        entrypoint: template.entrypoint(),
        model: template.default_model().to_string(),
        artifact,
        env,
    };
    client.create_agent_engine(&spec).await.map(Some)
}
