// SPDX-License-Identifier: MIT

use crate::adk::error::{AdkError, Result};
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_LOCATION: &str = "us-central1";

/// Region names end up in the endpoint host, so only `[a-z0-9-]` passes
pub fn is_valid_location(location: &str) -> bool {
    !location.is_empty()
        && location
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

/// A Vertex AI RAG corpus, `projects/<id>/locations/<loc>/ragCorpora/<id>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RagCorpus {
    pub project: String,
    pub location: String,
    pub corpus_id: String,
}

impl FromStr for RagCorpus {
    type Err = AdkError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            AdkError::config(format!(
                "Invalid RAG_CORPUS '{}'. Format: projects/PROJECT_ID/locations/LOCATION/ragCorpora/CORPUS_ID",
                s
            ))
        };

        let segments: Vec<&str> = s.trim().split('/').collect();
        match segments.as_slice() {
            ["projects", project, "locations", location, "ragCorpora", corpus_id]
                if !project.is_empty() && !location.is_empty() && !corpus_id.is_empty() =>
            {
                Ok(Self {
                    project: project.to_string(),
                    location: location.to_string(),
                    corpus_id: corpus_id.to_string(),
                })
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for RagCorpus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/ragCorpora/{}",
            self.project, self.location, self.corpus_id
        )
    }
}

impl RagCorpus {
    /// Read and validate `RAG_CORPUS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let raw = lookup("RAG_CORPUS").filter(|v| !v.trim().is_empty()).ok_or_else(|| {
            AdkError::config(
                "RAG_CORPUS must be set. Format: projects/PROJECT_ID/locations/LOCATION/ragCorpora/CORPUS_ID",
            )
        })?;
        raw.parse()
    }
}

/// Google Cloud settings read from the environment
#[derive(Debug, Clone)]
pub struct CloudConfig {
    pub project: String,
    pub location: String,
    pub rag_corpus: Option<RagCorpus>,
}

impl CloudConfig {
    /// `GOOGLE_CLOUD_PROJECT` is required, `GOOGLE_CLOUD_LOCATION`
    /// defaults to us-central1 and `RAG_CORPUS` is required only when
    /// `require_rag` is set.
    pub fn from_env(require_rag: bool) -> Result<Self> {
        Self::from_lookup(require_rag, |key| env::var(key).ok())
    }

    pub fn from_lookup(
        require_rag: bool,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let project = lookup("GOOGLE_CLOUD_PROJECT")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AdkError::config("GOOGLE_CLOUD_PROJECT must be set"))?;
        let location = lookup("GOOGLE_CLOUD_LOCATION")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOCATION.to_string());
        if !is_valid_location(&location) {
            return Err(AdkError::config(format!(
                "Invalid GOOGLE_CLOUD_LOCATION '{}'",
                location
            )));
        }

        let rag_corpus = if require_rag {
            Some(RagCorpus::from_lookup(&lookup)?)
        } else {
            None
        };

        Ok(Self {
            project,
            location,
            rag_corpus,
        })
    }
}
