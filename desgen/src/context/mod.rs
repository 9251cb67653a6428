//! Context management for pipeline execution.
//!
//! This module provides:
//! - The write-once design context passed from stage to stage
//! - Run identity for correlating events and logs

mod design;
mod identity;

pub use design::{
    DesignContext, CODE_PLAN, PRODUCT_PLAN, PROMPT, UX_DESIGN, VISUAL_DESIGN,
};
pub use identity::RunIdentity;
