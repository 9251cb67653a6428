//! Pipeline orchestration.
//!
//! This module provides:
//! - The linear run state machine
//! - The orchestrator and the runner trait used by the front doors

mod runner;
mod state;

pub use runner::{DesignPipeline, PipelineRunner};
pub use state::PipelineState;
