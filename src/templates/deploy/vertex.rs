// SPDX-License-Identifier: MIT

//! Authenticated JSON calls against the regional Vertex AI endpoint

use super::auth::TokenSource;
use super::config::is_valid_location;
use crate::adk::error::{AdkError, Result};
use reqwest::{Client, RequestBuilder};
use serde_json::{Map, Value};
use std::sync::Arc;
use url::Url;

/// Hosts allowed over plain HTTP
const LOCAL_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

const API_VERSION: &str = "v1";
const MAX_ERROR_BODY: usize = 500;

#[derive(Clone)]
pub struct VertexEndpoint {
    http: Client,
    base: String,
    project: String,
    location: String,
    tokens: Arc<dyn TokenSource>,
}

impl VertexEndpoint {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        tokens: Arc<dyn TokenSource>,
    ) -> Self {
        let location = location.into();
        Self {
            http: Client::new(),
            base: format!("https://{}-aiplatform.googleapis.com", location),
            project: project.into(),
            location,
            tokens,
        }
    }

    /// Point at another host, e.g. a local stub server
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    /// `projects/<p>/locations/<l>`
    pub fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project, self.location)
    }

    /// Absolute URL for a resource path such as `projects/.../reasoningEngines`
    pub fn url(&self, path: &str) -> Result<String> {
        if !is_valid_location(&self.location) {
            return Err(AdkError::config(format!(
                "Invalid Vertex AI location '{}'",
                self.location
            )));
        }

        let url = format!("{}/{}/{}", self.base, API_VERSION, path.trim_start_matches('/'));
        let parsed = Url::parse(&url)?;
        let local = parsed
            .host_str()
            .is_some_and(|host| LOCAL_HOSTS.contains(&host));
        if parsed.scheme() != "https" && !(parsed.scheme() == "http" && local) {
            return Err(AdkError::config(format!(
                "Vertex AI endpoint must use HTTPS: {}",
                self.base
            )));
        }
        Ok(url)
    }

    async fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.tokens.access_token().await?;
        Ok(request.bearer_auth(token))
    }

    /// POST a JSON body and return the raw response text
    pub async fn post_text(&self, path: &str, body: &Value) -> Result<String> {
        let url = self.url(path)?;
        log::debug!("POST {}", url);
        let request = self.authorized(self.http.post(&url).json(body)).await?;
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let text = if text.trim().is_empty() {
                "<empty body>".to_string()
            } else {
                text.chars().take(MAX_ERROR_BODY).collect()
            };
            return Err(AdkError::deploy(format!(
                "Vertex AI request to {} failed with status {}: {}",
                path,
                status.as_u16(),
                text
            )));
        }
        Ok(text)
    }

    /// POST a JSON body and parse the JSON reply (empty reply -> `{}`)
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let text = self.post_text(path, body).await?;
        if text.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        Ok(serde_json::from_str(&text)?)
    }
}
