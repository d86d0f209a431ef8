//! LLM access for the marketplace.
//!
//! - `LLMProvider`: provider trait, with an OpenAI-compatible implementation
//! - `ArtisanAssistant`: the prompt catalogue used by the API
//! - `parse_structured`: cleanup of fenced JSON replies

pub mod assistant;
pub mod completion;
pub mod error;
pub mod json;
pub mod prompts;
pub mod provider;
pub mod providers;

pub use assistant::{ArtisanAssistant, ImageAttachment, StoryBrief};
pub use completion::{ChatMessage, CompletionRequest, CompletionResponse, Role, TokenUsage};
pub use error::{LLMError, Result};
pub use json::{clean_json_response, parse_structured};
pub use provider::LLMProvider;
