//! Model router client (§4.6): an OpenAI-style chat-completions/embeddings
//! HTTP client, wired against the model catalog (§0.3, §6).

mod client;
mod wire;

pub use client::ModelRouterClient;
pub use wire::{
    ChatMessage, ChatRequest, ChatResponse, Choice, EmbeddingsRequest, EmbeddingsResponse,
    MessageRole, ToolDefinition, Usage,
};
