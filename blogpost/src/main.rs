mod cli;

use blog::llm::{OpenAI, Retrying};
use blog::{BlogGenerator, Result, post};
use clap::Parser;
use cli::{Cli, Commands, GenerateArgs};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_FILES_KEPT: usize = 5;

/// Logs go to stderr, and to rotated files under `log_dir` when given. The
/// returned guard flushes the file writer on drop.
fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix("blogpost")
                .filename_suffix("log")
                .max_log_files(LOG_FILES_KEPT)
                .build(dir)
                .map_err(std::io::Error::other)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn prepare_posts_dir(dir: &Path, create: bool) -> Result<()> {
    if create {
        std::fs::create_dir_all(dir)?;
    }
    post::check_posts_dir(dir)
}

async fn generate(dir: &Path, args: &GenerateArgs) -> Result<PathBuf> {
    prepare_posts_dir(dir, args.create_dir)?;

    let llm = Retrying::new(OpenAI::new(args.openai_settings()), args.retry_policy());

    let mut generator = BlogGenerator::new(llm, dir);
    if let Some(system) = &args.system {
        generator = generator.system_prompt(system.clone());
    }

    let path = generator.publish(&args.topic).await?;
    info!(path = %path.display(), "published");
    Ok(path)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_dir.as_deref())?;

    match &cli.command {
        Commands::Generate(args) => {
            let path = generate(&cli.dir, args).await?;
            println!("{}", path.display());
        }
        Commands::List { count } => {
            for path in post::list_posts(&cli.dir, *count)? {
                println!("{}", path.display());
            }
        }
    }

    Ok(())
}
