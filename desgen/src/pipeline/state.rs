//! Linear state machine of a design run.

use crate::stages::StageKind;
use serde::{Deserialize, Serialize};

/// Progress of one pipeline run.
///
/// `Start -> AfterStrategy -> AfterExperience -> AfterPresentation -> Done`,
/// with `Aborted` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Context seeded with the prompt; no stage has run.
    Start,
    /// The product plan has been merged.
    AfterStrategy,
    /// The UX design has been merged.
    AfterExperience,
    /// The visual design has been merged.
    AfterPresentation,
    /// All four outputs have been merged.
    Done,
    /// A stage failed.
    Aborted,
}

impl PipelineState {
    /// Returns the state reached after the pending stage succeeds.
    ///
    /// Terminal states map to themselves.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Start => Self::AfterStrategy,
            Self::AfterStrategy => Self::AfterExperience,
            Self::AfterExperience => Self::AfterPresentation,
            Self::AfterPresentation | Self::Done => Self::Done,
            Self::Aborted => Self::Aborted,
        }
    }

    /// Returns the stage to run from this state, if any.
    #[must_use]
    pub const fn pending_stage(self) -> Option<StageKind> {
        match self {
            Self::Start => Some(StageKind::Strategy),
            Self::AfterStrategy => Some(StageKind::Experience),
            Self::AfterExperience => Some(StageKind::Presentation),
            Self::AfterPresentation => Some(StageKind::Implementation),
            Self::Done | Self::Aborted => None,
        }
    }

    /// Returns true for `Done` and `Aborted`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Aborted)
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::AfterStrategy => "after_strategy",
            Self::AfterExperience => "after_experience",
            Self::AfterPresentation => "after_presentation",
            Self::Done => "done",
            Self::Aborted => "aborted",
        };
        f.write_str(s)
    }
}
