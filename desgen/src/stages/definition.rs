//! The four design roles and how each selects its input.

use crate::context::{DesignContext, CODE_PLAN, PRODUCT_PLAN, PROMPT, UX_DESIGN, VISUAL_DESIGN};
use crate::errors::MissingInputError;
use serde::{Deserialize, Serialize};

/// Which context key(s) a stage reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRule {
    /// Exactly one key, which must be present and non-empty.
    Required(&'static str),
    /// The first key holding a non-empty value, tried in order.
    FirstNonEmpty(&'static [&'static str]),
}

impl InputRule {
    /// Returns the keys this rule consults, in order.
    #[must_use]
    pub fn keys(&self) -> &[&'static str] {
        match self {
            Self::Required(key) => std::slice::from_ref(key),
            Self::FirstNonEmpty(keys) => keys,
        }
    }

    /// Selects the stage input from the context.
    ///
    /// # Errors
    ///
    /// Returns `MissingInputError` when no consulted key holds a non-empty value.
    pub fn select<'a>(
        &self,
        stage: &str,
        context: &'a DesignContext,
    ) -> Result<&'a str, MissingInputError> {
        self.keys()
            .iter()
            .find_map(|key| context.non_empty(key))
            .ok_or_else(|| MissingInputError::new(stage, self.keys()))
    }
}

/// Static description of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageDefinition {
    /// Display label of the role.
    pub label: &'static str,
    /// Role instruction sent as the system section of the prompt.
    pub instruction: &'static str,
    /// Input selection rule.
    pub input: InputRule,
    /// Context key the stage writes.
    pub output_key: &'static str,
}

const IMPLEMENTATION_INPUTS: &[&str] = &[VISUAL_DESIGN, UX_DESIGN, PRODUCT_PLAN];

/// The closed set of design stages, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Product strategy: goals, users and features.
    Strategy,
    /// UX: flows and screens.
    Experience,
    /// Visual design: palette, typography and style.
    Presentation,
    /// Frontend implementation plan.
    Implementation,
}

impl StageKind {
    /// All stages in execution order.
    pub const PIPELINE: [Self; 4] = [
        Self::Strategy,
        Self::Experience,
        Self::Presentation,
        Self::Implementation,
    ];

    /// Returns the stage's definition record.
    #[must_use]
    pub const fn definition(self) -> StageDefinition {
        match self {
            Self::Strategy => StageDefinition {
                label: "Product Strategist",
                instruction: "You are a senior product manager. Extract product goals, target users, and core features.",
                input: InputRule::Required(PROMPT),
                output_key: PRODUCT_PLAN,
            },
            Self::Experience => StageDefinition {
                label: "UX Architect",
                instruction: "You are a UX designer. Define user flows and screens.",
                input: InputRule::Required(PRODUCT_PLAN),
                output_key: UX_DESIGN,
            },
            Self::Presentation => StageDefinition {
                label: "Visual Designer",
                instruction: "You are a visual designer. Define color palette, typography, and UI style.",
                input: InputRule::Required(UX_DESIGN),
                output_key: VISUAL_DESIGN,
            },
            Self::Implementation => StageDefinition {
                label: "Frontend Engineer",
                instruction: "You are a senior frontend engineer. Produce implementation-ready UI code or component structure.",
                input: InputRule::FirstNonEmpty(IMPLEMENTATION_INPUTS),
                output_key: CODE_PLAN,
            },
        }
    }

    /// Returns the display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        self.definition().label
    }

    /// Returns the key this stage writes.
    #[must_use]
    pub const fn output_key(self) -> &'static str {
        self.definition().output_key
    }

    /// Returns the stage name used in events and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strategy => "strategy",
            Self::Experience => "experience",
            Self::Presentation => "presentation",
            Self::Implementation => "implementation",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
