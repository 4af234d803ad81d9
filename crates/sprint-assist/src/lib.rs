//! `sprint-assist` prompts a locally hosted, OpenAI-compatible
//! text-generation server with sprint data and cleans up what comes back.
//!
//! ```text
//! domain data ──serde_json──▶ user message ─┐
//! system prompt ────────────────────────────┴─▶ GenerationClient::complete
//!                                                    │ POST /v1/chat/completions
//!                                                    ▼
//!                                          strip_thinking ─▶ text
//! ```
//!
//! Calls are blocking with fixed timeouts and are never retried.

pub mod assist;
pub mod clean;
pub mod client;
pub mod error;
pub mod estimate;
pub mod prompts;

pub use assist::Assistant;
pub use clean::strip_thinking;
pub use client::{ChatMessage, GenerationClient, Role};
pub use error::{AssistError, Result};
pub use estimate::Estimate;
