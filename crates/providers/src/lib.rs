//! Generation-model boundary: the chat completion contract plus an
//! OpenAI-compatible implementation.

pub mod endpoint;
pub mod openai_chat;

use async_trait::async_trait;

pub use openai_chat::OpenAiChatProvider;

/// A chat completion backend: `(system prompt, user prompt) -> text`.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> anyhow::Result<String>;

    /// Model identifier, for logging.
    fn model_name(&self) -> &str;
}
