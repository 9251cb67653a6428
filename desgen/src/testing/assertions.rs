//! Test assertions for design contexts and errors.

use crate::context::{DesignContext, CODE_PLAN, PRODUCT_PLAN, PROMPT, UX_DESIGN, VISUAL_DESIGN};
use crate::errors::DesgenError;

/// Asserts that the context holds exactly the given keys, in order.
pub fn assert_context_keys(context: &DesignContext, expected: &[&str]) {
    assert_eq!(
        context.keys(),
        expected,
        "Expected context keys {:?}, got {:?}",
        expected,
        context.keys()
    );
}

/// Asserts that the context holds `key` with the given value.
pub fn assert_context_has(context: &DesignContext, key: &str, expected: &str) {
    assert_eq!(
        context.get(key),
        Some(expected),
        "Expected '{}' = {:?}. Keys: {:?}",
        key,
        expected,
        context.keys()
    );
}

/// Asserts that a finished run holds all five keys in causal order.
pub fn assert_complete_context(context: &DesignContext) {
    assert_context_keys(
        context,
        &[PROMPT, PRODUCT_PLAN, UX_DESIGN, VISUAL_DESIGN, CODE_PLAN],
    );
}

/// Asserts that the error has the expected machine-readable code.
pub fn assert_error_code(error: &DesgenError, expected: &str) {
    assert_eq!(
        error.code(),
        expected,
        "Expected error code {}, got {}: {}",
        expected,
        error.code(),
        error
    );
}
