//! AI text actions for the scratchpad
//!
//! Text is sent to an OpenAI-compatible chat-completions endpoint
//! (OpenRouter by default):
//! - Summarize
//! - Bullet points (returned as an HTML list)
//! - Tidy (spelling, grammar and formatting fixes)

mod client;
#[cfg(test)]
pub(crate) mod mock;
mod prompts;
mod service;

pub use service::{Action, AiError, AiService};
