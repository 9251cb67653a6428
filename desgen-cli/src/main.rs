use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use desgen::config::DesgenConfig;
use desgen::events::LoggingEventSink;
use desgen::observability::init_logging;
use desgen::pipeline::DesignPipeline;

mod api;
mod cli;
mod error;
mod output;

use cli::{Cli, Commands, OutputFormat};
use output::{OutputWriter, PROMPT_QUESTION};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_json) {
        eprintln!("Failed to initialise logging: {e}");
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = DesgenConfig::from_env()?;

    match cli.command {
        Commands::Run { prompt, output } => cmd_run(&config, &prompt, output).await,
        Commands::Serve { bind } => cmd_serve(&config, bind).await,
    }
}

fn build_pipeline(config: &DesgenConfig) -> anyhow::Result<DesignPipeline> {
    let pipeline = DesignPipeline::from_config(config)?;
    Ok(pipeline.with_event_sink(Arc::new(LoggingEventSink::debug())))
}

async fn cmd_run(config: &DesgenConfig, words: &[String], format: OutputFormat) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let writer = OutputWriter::new(format);
    writer.emit_banner().context("Failed to write output")?;

    let mut prompt = join_prompt(words);
    if prompt.is_empty() {
        prompt = ask_prompt().context("Failed to read prompt from stdin")?;
    }

    let context = pipeline.handle(&prompt).await?;
    writer
        .emit_context(&context)
        .context("Failed to write output")?;
    Ok(())
}

async fn cmd_serve(config: &DesgenConfig, bind: std::net::SocketAddr) -> anyhow::Result<()> {
    let pipeline = build_pipeline(config)?;
    let app = api::router(api::AppState::new(Arc::new(pipeline)), &config.frontend_origin)?;

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;
    tracing::info!(%bind, origin = %config.frontend_origin, "Desgen API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("HTTP server error")
}

fn join_prompt(words: &[String]) -> String {
    words.join(" ").trim().to_string()
}

fn ask_prompt() -> io::Result<String> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{PROMPT_QUESTION}")?;
    write!(stdout, "> ")?;
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
