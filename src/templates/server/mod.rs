// SPDX-License-Identifier: MIT

//! HTTP API for running templates, with SSE streaming of events

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::Template;
use crate::adk::error::{AdkError, Result};
use crate::adk::event::{Event, EventKind};
use crate::adk::model::ModelProvider;
use crate::adk::runner::{final_responses, Runner};
use crate::adk::session::{InMemorySessionService, SessionKey, SessionService};

const DEFAULT_USER_ID: &str = "user123";

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn ModelProvider>,
    sessions: Arc<InMemorySessionService>,
}

impl AppState {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            sessions: Arc::new(InMemorySessionService::new()),
        }
    }

    /// Build the template's runner and make sure the session exists
    async fn prepare(&self, req: &RunRequest) -> Result<(Runner, String)> {
        let agent = req.template.build(self.provider.as_ref())?;
        let app_name = req.template.package_name();
        let initial_state = || req.template.initial_state(req.topic.as_deref());
        let session_id = match &req.session_id {
            Some(id) => {
                let key = SessionKey::new(app_name, &req.user_id, id);
                self.sessions.get_or_create(&key, initial_state).await;
                id.clone()
            }
            None => {
                let session = self
                    .sessions
                    .create(app_name, &req.user_id, None, initial_state())
                    .await?;
                session.id().to_string()
            }
        };

        let sessions: Arc<dyn SessionService> = self.sessions.clone();
        Ok((Runner::new(app_name, agent, sessions), session_id))
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/templates", get(list_templates))
        .route("/api/run", post(run_template))
        .route("/api/run/stream", post(stream_template))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(port: u16, provider: Arc<dyn ModelProvider>) -> Result<()> {
    let app = router(AppState::new(provider));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_templates() -> Json<Value> {
    let templates: Vec<Value> = Template::ALL
        .iter()
        .map(|t| {
            json!({
                "id": t,
                "name": t.display_name(),
                "package": t.package_name(),
                "description": t.description(),
                "needs_rag_corpus": t.needs_rag_corpus(),
            })
        })
        .collect();
    Json(json!(templates))
}

fn default_user_id() -> String {
    DEFAULT_USER_ID.to_string()
}

#[derive(Debug, Deserialize)]
pub struct RunRequest {
    pub template: Template,
    pub message: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
}

fn error_status(e: &AdkError) -> StatusCode {
    match e {
        AdkError::Config(_) | AdkError::Session(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn run_template(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> (StatusCode, Json<Value>) {
    let outcome = async {
        let (runner, session_id) = state.prepare(&req).await?;
        let events = runner.run(&req.user_id, &session_id, &req.message).await?;
        let key = SessionKey::new(runner.app_name(), &req.user_id, &session_id);
        let session_state = state
            .sessions
            .get(&key)
            .await?
            .map(|s| json!(s.state))
            .unwrap_or(Value::Null);
        Ok::<_, AdkError>(json!({
            "status": "completed",
            "session_id": session_id,
            "responses": final_responses(&events),
            "state": session_state,
            "events": events,
        }))
    }
    .await;

    match outcome {
        Ok(body) => (StatusCode::OK, Json(body)),
        Err(e) => {
            log::error!("Run of {} failed: {}", req.template, e);
            (
                error_status(&e),
                Json(json!({ "error": format!("Execution failed: {}", e) })),
            )
        }
    }
}

async fn stream_template(
    State(state): State<AppState>,
    Json(req): Json<RunRequest>,
) -> Sse<impl Stream<Item = std::result::Result<SseEvent, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Event>(100);

    tokio::spawn(async move {
        log::info!("Starting streaming run of {}", req.template);
        let result = match state.prepare(&req).await {
            Ok((runner, session_id)) => runner
                .run_stream(&req.user_id, &session_id, &req.message, tx.clone())
                .await
                .map(|_| ()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            log::error!("Streaming run failed: {}", e);
            let event = Event::new("", req.template.package_name(), EventKind::Error(e.to_string()));
            let _ = tx.send(event).await;
        }
        log::info!("Streaming run of {} finished", req.template);
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok(SseEvent::default()
            .json_data(&event)
            .unwrap_or_else(|e| SseEvent::default().event("error").data(e.to_string())))
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(1)))
}
