//! The design context threaded through the stages of one pipeline run.

use crate::errors::DataConflictError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Seed key holding the user's product idea.
pub const PROMPT: &str = "prompt";
/// Written by the strategy stage.
pub const PRODUCT_PLAN: &str = "product_plan";
/// Written by the experience stage.
pub const UX_DESIGN: &str = "ux_design";
/// Written by the presentation stage.
pub const VISUAL_DESIGN: &str = "visual_design";
/// Written by the implementation stage.
pub const CODE_PLAN: &str = "code_plan";

/// Write-once, insertion-ordered mapping of context keys to text.
///
/// Keys are never removed or overwritten. Iteration and serialization follow
/// the order in which keys were written, which for a pipeline run is the
/// causal order of the stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignContext {
    entries: Vec<(String, String)>,
}

impl DesignContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context seeded with the user's prompt.
    #[must_use]
    pub fn seeded(prompt: impl Into<String>) -> Self {
        Self {
            entries: vec![(PROMPT.to_string(), prompt.into())],
        }
    }

    /// Gets a value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Gets a value by key, treating an empty string as absent.
    #[must_use]
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.get(key).filter(|v| !v.is_empty())
    }

    /// Checks if a key exists.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Writes a new key.
    ///
    /// # Errors
    ///
    /// Returns `DataConflictError` if the key already exists.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DataConflictError> {
        let key = key.into();
        if self.contains_key(&key) {
            return Err(DataConflictError::new(key));
        }
        self.entries.push((key, value.into()));
        Ok(())
    }

    /// Merges every entry of `partial` into this context.
    ///
    /// # Errors
    ///
    /// Returns `DataConflictError` on the first key that already exists; no
    /// entry of `partial` is written in that case.
    pub fn merge(&mut self, partial: Self) -> Result<(), DataConflictError> {
        if let Some((key, _)) = partial.entries.iter().find(|(k, _)| self.contains_key(k)) {
            return Err(DataConflictError::new(key.clone()));
        }
        self.entries.extend(partial.entries);
        Ok(())
    }

    /// Returns the keys in write order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    /// Iterates over entries in write order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the context is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the context, returning its entries in write order.
    #[must_use]
    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DesignContext {
    /// Builds a context from pairs; a repeated key keeps its first value.
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for (k, v) in iter {
            let _ = ctx.insert(k, v);
        }
        ctx
    }
}

impl Serialize for DesignContext {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
