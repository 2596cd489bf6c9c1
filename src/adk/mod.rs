// SPDX-License-Identifier: MIT

//! Minimal agent development kit: agents, models, tools, state,
//! sessions and the runner that ties them together.

pub mod agent;
pub mod context;
pub mod error;
pub mod event;
pub mod instruction;
pub mod model;
pub mod runner;
pub mod session;
pub mod state;
pub mod tool;

pub use agent::{Agent, Control, LlmAgent, LoopAgent, ParallelAgent, SequentialAgent};
pub use context::InvocationContext;
pub use error::{AdkError, Result};
pub use event::{Event, EventKind};
pub use runner::Runner;
pub use session::{InMemorySessionService, SessionService};
pub use state::SessionState;
