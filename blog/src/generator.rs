use crate::llm::{CompletionRequest, LLM};
use crate::{Result, post, prompt};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// Generates one blog post per call and persists it under `posts_dir`.
pub struct BlogGenerator {
    llm: Arc<dyn LLM + Send + Sync>,
    posts_dir: PathBuf,
    system_prompt: Option<String>,
}

impl BlogGenerator {
    pub fn new(llm: Arc<dyn LLM + Send + Sync>, posts_dir: impl Into<PathBuf>) -> Self {
        Self {
            llm,
            posts_dir: posts_dir.into(),
            system_prompt: None,
        }
    }

    pub fn system_prompt(mut self, system_prompt: String) -> Self {
        self.system_prompt = Some(system_prompt);
        self
    }

    pub async fn generate(&self, topic: &str) -> Result<String> {
        let messages = prompt::messages(topic, self.system_prompt.as_deref());
        debug!(?messages, "blog prompt");

        let res = self
            .llm
            .completion(CompletionRequest {
                messages: &messages,
            })
            .await?;

        Ok(res.content)
    }

    /// Generates a post for `topic` and writes it, returning the written path.
    /// Nothing is written if generation fails.
    pub async fn publish(&self, topic: &str) -> Result<PathBuf> {
        // everything that can make the write fail is checked before paying for a completion
        post::post_path(&self.posts_dir, topic)?;
        post::check_posts_dir(&self.posts_dir)?;

        info!(topic, "generating blog post");
        let content = self.generate(topic).await?;

        post::write_post(&self.posts_dir, topic, &content)
    }
}
