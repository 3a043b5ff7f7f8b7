//! LLM support: chat client, prompt building, and response parsing.

mod client;
mod lines;
mod prompt;
mod yaml;

pub use client::{ChatClient, CompletionParams, LlmError};
pub use lines::split_lines;
pub use prompt::{ChatMessage, PromptBuilder, Role};
pub use yaml::parse_yaml_block;
