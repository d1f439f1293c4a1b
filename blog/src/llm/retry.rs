use crate::Result;
use crate::llm::{CompletionRequest, CompletionResponse, LLM};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with exponential backoff. [`RetryPolicy::none`] issues the
/// request exactly once.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    pub fn new(retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: retries.saturating_add(1),
            initial_backoff,
            max_backoff: initial_backoff.saturating_mul(32),
        }
    }

    /// Delay before the attempt following failed attempt number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

pub struct Retrying {
    inner: Arc<dyn LLM + Send + Sync>,
    policy: RetryPolicy,
}

impl Retrying {
    pub fn new(inner: Arc<dyn LLM + Send + Sync>, policy: RetryPolicy) -> Arc<Self> {
        Arc::new(Self { inner, policy })
    }
}

#[async_trait]
impl LLM for Retrying {
    async fn completion<'a>(&self, request: CompletionRequest<'a>) -> Result<CompletionResponse> {
        let mut attempt = 1;
        loop {
            let res = self
                .inner
                .completion(CompletionRequest {
                    messages: request.messages,
                })
                .await;

            match res {
                Err(err) if err.is_transient() && attempt < self.policy.max_attempts => {
                    let delay = self.policy.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                res => return res,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryPolicy, Retrying};
    use crate::llm::{CompletionRequest, CompletionResponse, LLM, Message};
    use crate::{Error, Result};
    use async_openai::error::{ApiError, OpenAIError};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    fn server_error() -> Error {
        let err: ApiError = serde_json::from_value(serde_json::json!({
            "message": "The server had an error while processing your request.",
            "type": "server_error",
            "param": null,
            "code": null
        }))
        .unwrap();
        Error::OpenaiError(OpenAIError::ApiError(err))
    }

    /// Fails with a server error for the first `failures` calls.
    struct FlakyLLM {
        calls: AtomicU32,
        failures: u32,
    }

    #[async_trait]
    impl LLM for FlakyLLM {
        async fn completion<'a>(
            &self,
            _request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
                Err(server_error())
            } else {
                Ok(CompletionResponse {
                    content: "recovered".to_string(),
                })
            }
        }
    }

    struct CountingLLM {
        calls: AtomicU32,
        fail: bool,
    }

    #[async_trait]
    impl LLM for CountingLLM {
        async fn completion<'a>(
            &self,
            _request: CompletionRequest<'a>,
        ) -> Result<CompletionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Error::LLMResponseError("content is empty".to_string()))
            } else {
                Ok(CompletionResponse {
                    content: "# Hello\nWorld".to_string(),
                })
            }
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(10, Duration::from_millis(100));
        assert_eq!(policy.max_attempts, 11);
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(4), Duration::from_millis(800));
        assert_eq!(policy.backoff(9), Duration::from_millis(3200));
        assert_eq!(policy.backoff(40), Duration::from_millis(3200));
    }

    #[test]
    fn test_default_is_single_attempt() {
        assert_eq!(RetryPolicy::default().max_attempts, 1);
        assert_eq!(RetryPolicy::new(0, Duration::from_secs(1)).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_success_is_not_retried() -> Result<()> {
        let inner = Arc::new(CountingLLM {
            calls: AtomicU32::new(0),
            fail: false,
        });
        let llm = Retrying::new(inner.clone(), RetryPolicy::new(3, Duration::from_millis(1)));

        let res = llm
            .completion(CompletionRequest {
                messages: &[Message::User("hi".to_string())],
            })
            .await?;

        assert_eq!(res.content, "# Hello\nWorld");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_response_is_not_retried() {
        let inner = Arc::new(CountingLLM {
            calls: AtomicU32::new(0),
            fail: true,
        });
        let llm = Retrying::new(inner.clone(), RetryPolicy::new(3, Duration::from_millis(1)));

        let res = llm
            .completion(CompletionRequest {
                messages: &[Message::User("hi".to_string())],
            })
            .await;

        assert!(matches!(res, Err(Error::LLMResponseError(_))));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_retried_with_backoff() -> Result<()> {
        let inner = Arc::new(FlakyLLM {
            calls: AtomicU32::new(0),
            failures: 2,
        });
        let llm = Retrying::new(inner.clone(), RetryPolicy::new(3, Duration::from_secs(1)));
        let start = Instant::now();

        let res = llm
            .completion(CompletionRequest {
                messages: &[Message::User("hi".to_string())],
            })
            .await?;

        assert_eq!(res.content, "recovered");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
        // 1s after the first failure, 2s after the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_attempts() {
        let inner = Arc::new(FlakyLLM {
            calls: AtomicU32::new(0),
            failures: u32::MAX,
        });
        let llm = Retrying::new(inner.clone(), RetryPolicy::new(2, Duration::from_secs(1)));

        let res = llm
            .completion(CompletionRequest {
                messages: &[Message::User("hi".to_string())],
            })
            .await;

        assert!(matches!(res, Err(Error::OpenaiError(OpenAIError::ApiError(_)))));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }
}
