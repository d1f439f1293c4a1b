use blog::llm::{OpenAISettings, RetryPolicy};
use blog::post::DEFAULT_POSTS_DIR;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Generate markdown blog posts with a hosted language model.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory posts are written to and listed from
    #[arg(long, env = "BLOGPOST_DIR", default_value = DEFAULT_POSTS_DIR, global = true)]
    pub dir: PathBuf,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, env = "BLOGPOST_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generates a post for a topic and writes it to the posts directory
    Generate(GenerateArgs),
    /// Lists the most recently modified posts, newest first
    List {
        #[arg(long, default_value_t = 5)]
        count: usize,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Subject of the post; spaces become underscores in the file name
    pub topic: String,

    /// Create the posts directory if it does not exist
    #[arg(long)]
    pub create_dir: bool,

    #[arg(long, env = "BLOGPOST_MODEL", default_value = "gpt-3.5-turbo")]
    pub model: String,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Alternative OpenAI-compatible endpoint
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub api_base: Option<String>,

    #[arg(long)]
    pub temperature: Option<f32>,

    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Optional system message sent before the blog instruction
    #[arg(long)]
    pub system: Option<String>,

    /// Extra attempts after a transient failure
    #[arg(long, default_value_t = 0)]
    pub retries: u32,

    /// Initial backoff between attempts, doubled after each failure
    #[arg(long, default_value_t = 500)]
    pub backoff_ms: u64,
}

impl GenerateArgs {
    pub fn openai_settings(&self) -> OpenAISettings {
        OpenAISettings {
            model: self.model.clone(),
            api_key: self.api_key.clone(),
            api_base: self.api_base.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        if self.retries == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::new(self.retries, Duration::from_millis(self.backoff_ms))
        }
    }
}
