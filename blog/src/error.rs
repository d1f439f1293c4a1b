use async_openai::error::OpenAIError;
use std::path::PathBuf;
use thiserror::Error;

/// API error types the service uses for conditions that clear up on their own.
const TRANSIENT_API_ERRORS: &[&str] = &["server_error", "rate_limit_exceeded"];

#[derive(Error, Debug)]
pub enum Error {
    #[error("Openai error: {0}")]
    OpenaiError(#[from] OpenAIError),

    #[error("No response from llm: {0}")]
    LLMResponseError(String),

    #[error("Invalid topic {0:?}: {1}")]
    InvalidTopic(String, &'static str),

    #[error("Posts directory {0} does not exist or is not a directory")]
    PostsDirError(PathBuf),

    #[error("IO Error: {0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    /// Whether re-issuing the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::OpenaiError(OpenAIError::Reqwest(_)) => true,
            Error::OpenaiError(OpenAIError::ApiError(err)) => err
                .r#type
                .as_deref()
                .is_some_and(|kind| TRANSIENT_API_ERRORS.contains(&kind)),
            _ => false,
        }
    }
}
