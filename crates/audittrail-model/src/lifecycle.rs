//! Case lifecycle state machine
//!
//! ```text
//!   open ──Start──▶ active
//!    │ ▲              │
//! Close│ │Reopen      │Close
//!    ▼ │              ▼
//!   closed ◀──────────┘
//! ```
//!
//! The available action set is a pure function of the current status.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Case status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseStatus {
    /// Created, work not started
    Open,
    /// Work in progress
    Active,
    /// Finished
    Closed,
}

/// A user-facing lifecycle action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// Action label ("Start", "Close", "Reopen")
    pub label: &'static str,
    /// Status reached by the action
    pub target: CaseStatus,
}

const FROM_OPEN: &[Transition] = &[
    Transition {
        label: "Start",
        target: CaseStatus::Active,
    },
    Transition {
        label: "Close",
        target: CaseStatus::Closed,
    },
];

const FROM_ACTIVE: &[Transition] = &[Transition {
    label: "Close",
    target: CaseStatus::Closed,
}];

const FROM_CLOSED: &[Transition] = &[Transition {
    label: "Reopen",
    target: CaseStatus::Open,
}];

impl CaseStatus {
    /// All statuses, in lifecycle order
    pub const ALL: [CaseStatus; 3] = [CaseStatus::Open, CaseStatus::Active, CaseStatus::Closed];

    /// Wire name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::Active => "active",
            CaseStatus::Closed => "closed",
        }
    }

    /// Display label
    #[inline]
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CaseStatus::Open => "Open",
            CaseStatus::Active => "Active",
            CaseStatus::Closed => "Closed",
        }
    }

    /// Actions available from this status
    #[inline]
    #[must_use]
    pub fn transitions(&self) -> &'static [Transition] {
        match self {
            CaseStatus::Open => FROM_OPEN,
            CaseStatus::Active => FROM_ACTIVE,
            CaseStatus::Closed => FROM_CLOSED,
        }
    }

    /// Check whether `target` is reachable in one step
    #[inline]
    #[must_use]
    pub fn can_transition_to(&self, target: CaseStatus) -> bool {
        self.transitions().iter().any(|t| t.target == target)
    }

    /// Validate a requested transition
    ///
    /// # Errors
    /// `ModelError::InvalidTransition` when no edge leads to `target`.
    pub fn validate_transition(&self, target: CaseStatus) -> Result<Transition, ModelError> {
        self.transitions()
            .iter()
            .find(|t| t.target == target)
            .copied()
            .ok_or_else(|| ModelError::invalid_transition(*self, target))
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CaseStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(CaseStatus::Open),
            "active" => Ok(CaseStatus::Active),
            "closed" => Ok(CaseStatus::Closed),
            other => Err(ModelError::UnknownStatus(other.to_string())),
        }
    }
}
