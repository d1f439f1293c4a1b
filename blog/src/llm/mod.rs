use crate::Result;
use async_trait::async_trait;

mod openai;
pub use openai::{OpenAI, OpenAISettings};

mod retry;
pub use retry::{RetryPolicy, Retrying};

#[derive(Clone, Debug, PartialEq)]
pub enum Message {
    System(String),
    User(String),
}

pub struct CompletionRequest<'a> {
    pub messages: &'a [Message],
}

pub struct CompletionResponse {
    pub content: String,
}

#[async_trait]
pub trait LLM {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse>;
}
