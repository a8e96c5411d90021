//! Error types for the model layer

use crate::lifecycle::CaseStatus;

/// Errors raised by local model rules
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Lifecycle edge not defined for the current status
    #[error("Cannot transition from '{from}' to '{to}'")]
    InvalidTransition {
        /// Current status
        from: CaseStatus,
        /// Requested status
        to: CaseStatus,
    },

    /// Status text outside `open`/`active`/`closed`
    #[error("unknown case status: '{0}'")]
    UnknownStatus(String),

    /// Event type text outside `finding`/`action`/`note`
    #[error("unknown event type: '{0}'")]
    UnknownEventType(String),

    /// Report format or mode not recognized
    #[error("unknown report option: '{0}'")]
    UnknownReportOption(String),

    /// Partial update could not be merged into the entity
    #[error("patch rejected: {0}")]
    InvalidPatch(String),
}

impl ModelError {
    /// Create invalid transition error
    #[must_use]
    pub fn invalid_transition(from: CaseStatus, to: CaseStatus) -> Self {
        Self::InvalidTransition { from, to }
    }
}
