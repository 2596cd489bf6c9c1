// SPDX-License-Identifier: MIT

//! OAuth access tokens for the Vertex AI REST endpoints

use crate::adk::error::{AdkError, Result};
use async_trait::async_trait;
use std::env;
use tokio::process::Command;

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// `GOOGLE_CLOUD_ACCESS_TOKEN` when set, otherwise
/// `gcloud auth print-access-token`
#[derive(Debug, Default, Clone)]
pub struct GcloudTokenSource;

#[async_trait]
impl TokenSource for GcloudTokenSource {
    async fn access_token(&self) -> Result<String> {
        if let Ok(token) = env::var("GOOGLE_CLOUD_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                return Ok(token.trim().to_string());
            }
        }

        log::debug!("Fetching access token from gcloud");
        let output = Command::new("gcloud")
            .args(["auth", "print-access-token"])
            .output()
            .await
            .map_err(|e| {
                AdkError::config(format!(
                    "Could not run gcloud ({}). Set GOOGLE_CLOUD_ACCESS_TOKEN or install the Google Cloud SDK",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(AdkError::config(format!(
                "gcloud auth print-access-token failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(AdkError::config("gcloud returned an empty access token"));
        }
        Ok(token)
    }
}

/// A fixed token
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

#[async_trait]
impl TokenSource for StaticToken {
    async fn access_token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}
