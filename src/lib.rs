//! Terminal customer-support chat backed by an OpenAI-compatible
//! chat-completion endpoint.

pub mod app;
pub mod config;
pub mod error;
pub mod events;
pub mod llm;
pub mod logging;
pub mod prompts;
pub mod session;
pub mod tui;
pub mod ui;

pub use config::Config;
pub use error::ChatError;
pub use events::{ChatRole, TranscriptEntry};
pub use llm::{CompletionClient, LlmClient};
pub use session::{ChatSession, SubmitOutcome};
