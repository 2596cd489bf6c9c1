// SPDX-License-Identifier: MIT

//! Session storage
//!
//! A session groups the state and events of one conversation, keyed by
//! app name, user id and session id. Only an in-memory store is provided.

use super::error::{AdkError, Result};
use super::event::Event;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SessionKey {
    pub app_name: String,
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(
        app_name: impl Into<String>,
        user_id: impl Into<String>,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            app_name: app_name.into(),
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }
}

/// Snapshot of a stored session
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub key: SessionKey,
    pub state: HashMap<String, Value>,
    pub events: Vec<Event>,
    pub last_update: DateTime<Utc>,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.key.session_id
    }
}

#[async_trait]
pub trait SessionService: Send + Sync {
    /// Create a session; a missing id is replaced by a fresh uuid
    async fn create(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<String>,
        initial_state: HashMap<String, Value>,
    ) -> Result<Session>;

    async fn get(&self, key: &SessionKey) -> Result<Option<Session>>;

    /// Apply a state delta and record events on an existing session
    async fn append(
        &self,
        key: &SessionKey,
        state_delta: &Map<String, Value>,
        events: Vec<Event>,
    ) -> Result<()>;

    async fn delete(&self, key: &SessionKey) -> Result<()>;

    /// Ids of a user's sessions, sorted
    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<String>>;
}

#[derive(Default)]
pub struct InMemorySessionService {
    sessions: RwLock<HashMap<SessionKey, Session>>,
}

impl InMemorySessionService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the stored session, creating it with `initial_state` first
    /// if absent. Check and insert happen under one write lock.
    pub async fn get_or_create(
        &self,
        key: &SessionKey,
        initial_state: impl FnOnce() -> HashMap<String, Value>,
    ) -> Session {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(key.clone())
            .or_insert_with(|| {
                log::debug!("Created session {}", key.session_id);
                Session {
                    key: key.clone(),
                    state: initial_state(),
                    events: Vec::new(),
                    last_update: Utc::now(),
                }
            })
            .clone()
    }
}

#[async_trait]
impl SessionService for InMemorySessionService {
    async fn create(
        &self,
        app_name: &str,
        user_id: &str,
        session_id: Option<String>,
        initial_state: HashMap<String, Value>,
    ) -> Result<Session> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let key = SessionKey::new(app_name, user_id, session_id);

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&key) {
            return Err(AdkError::session(format!(
                "Session {} already exists for user {}",
                key.session_id, key.user_id
            )));
        }

        let session = Session {
            key: key.clone(),
            state: initial_state,
            events: Vec::new(),
            last_update: Utc::now(),
        };
        sessions.insert(key, session.clone());
        log::debug!("Created session {}", session.id());
        Ok(session)
    }

    async fn get(&self, key: &SessionKey) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(key).cloned())
    }

    async fn append(
        &self,
        key: &SessionKey,
        state_delta: &Map<String, Value>,
        events: Vec<Event>,
    ) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(key)
            .ok_or_else(|| AdkError::session(format!("Session {} not found", key.session_id)))?;

        for (k, v) in state_delta {
            session.state.insert(k.clone(), v.clone());
        }
        session.events.extend(events);
        session.last_update = Utc::now();
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> Result<()> {
        self.sessions.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, app_name: &str, user_id: &str) -> Result<Vec<String>> {
        let sessions = self.sessions.read().await;
        let mut ids: Vec<String> = sessions
            .keys()
            .filter(|k| k.app_name == app_name && k.user_id == user_id)
            .map(|k| k.session_id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
