//! LLM access for the design stages.
//!
//! This module provides:
//! - The provider port and its response types
//! - The resilient invoker (throttle, rate-limit retry, usage logging)
//! - The OpenAI Responses API adapter (feature `openai`)

mod invoker;
#[cfg(feature = "openai")]
mod openai;
mod prompt;
mod provider;
mod retry;
mod sleeper;
mod throttle;

pub use invoker::ResilientInvoker;
#[cfg(feature = "openai")]
pub use openai::OpenAiProvider;
pub use prompt::compose_prompt;
pub use provider::{Generation, LlmProvider, TokenUsage};
pub use retry::{BackoffPolicy, RetryDecision, JITTER_CEILING};
pub use sleeper::{Sleeper, TokioSleeper};
pub use throttle::{Reservation, Throttle};
