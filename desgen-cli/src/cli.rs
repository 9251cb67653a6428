use std::net::SocketAddr;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "desgen")]
#[command(author, version, about = "Four-stage LLM design pipeline", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Output format for `desgen run`.
/// - Text: one `KEY:` block per context field (default)
/// - Json: the context as a single JSON object
#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline once and print every stage output
    Run {
        /// Product idea; read from stdin when omitted
        prompt: Vec<String>,

        #[arg(short, long, value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Serve the pipeline over HTTP
    Serve {
        /// Address to listen on
        #[arg(long, env = "DESGEN_BIND", default_value = "127.0.0.1:8000")]
        bind: SocketAddr,
    },
}
