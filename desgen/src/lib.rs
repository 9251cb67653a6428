//! # Desgen
//!
//! A four-stage LLM design pipeline. One free-text product idea goes through
//! four role-specialized calls, each reading the previous result:
//!
//! - **Strategy**: product goals, target users and core features
//! - **Experience**: user flows and screens
//! - **Presentation**: palette, typography and UI style
//! - **Implementation**: component structure or UI code
//!
//! Every call goes through a [`llm::ResilientInvoker`] that spaces calls out,
//! retries rate-limited failures with exponential backoff and jitter, and
//! optionally logs token usage.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use desgen::prelude::*;
//!
//! let config = DesgenConfig::from_env()?;
//! let pipeline = DesignPipeline::from_config(&config)?;
//!
//! let context = pipeline.handle("a meal planning app for students").await?;
//! println!("{}", context.get(CODE_PLAN).unwrap_or_default());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod errors;
pub mod events;
pub mod llm;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::DesgenConfig;
    pub use crate::context::{
        DesignContext, RunIdentity, CODE_PLAN, PRODUCT_PLAN, PROMPT, UX_DESIGN, VISUAL_DESIGN,
    };
    pub use crate::errors::{
        ConfigurationError, DataConflictError, DesgenError, MissingInputError, ProviderError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    #[cfg(feature = "openai")]
    pub use crate::llm::OpenAiProvider;
    pub use crate::llm::{Generation, LlmProvider, ResilientInvoker, TokenUsage};
    pub use crate::pipeline::{DesignPipeline, PipelineRunner, PipelineState};
    pub use crate::stages::{run_stage, StageKind};
}
