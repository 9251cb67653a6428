//! Testing utilities for desgen pipelines.
//!
//! This module provides:
//! - Scripted and echoing providers
//! - A sleeper that records instead of waiting
//! - In-memory capture of log events
//! - Assertions over design contexts

mod assertions;
mod logs;
mod mocks;

pub use assertions::{
    assert_complete_context, assert_context_has, assert_context_keys, assert_error_code,
};
pub use logs::{CapturedLogs, CapturedWriter};
pub use mocks::{EchoProvider, RecordingSleeper, ScriptedProvider};
