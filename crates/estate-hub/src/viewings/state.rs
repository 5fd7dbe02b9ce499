//! Viewing status transition table.
//!
//! ```text
//! PENDING --confirm--> CONFIRMED --complete--> COMPLETED
//!    |                    |
//!    +--reject--> REJECTED|
//!    +-------cancel-------+--> CANCELLED
//! ```

use std::fmt;

use crate::domain::ViewingStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewingAction {
    Confirm,
    Reject,
    Complete,
    Cancel,
}

impl ViewingAction {
    pub const fn target(self) -> ViewingStatus {
        match self {
            ViewingAction::Confirm => ViewingStatus::Confirmed,
            ViewingAction::Reject => ViewingStatus::Rejected,
            ViewingAction::Complete => ViewingStatus::Completed,
            ViewingAction::Cancel => ViewingStatus::Cancelled,
        }
    }

    pub const fn allowed_from(self) -> &'static [ViewingStatus] {
        match self {
            ViewingAction::Confirm | ViewingAction::Reject => &[ViewingStatus::Pending],
            ViewingAction::Complete => &[ViewingStatus::Confirmed],
            ViewingAction::Cancel => &[ViewingStatus::Pending, ViewingStatus::Confirmed],
        }
    }

    pub const fn verb(self) -> &'static str {
        match self {
            ViewingAction::Confirm => "confirm",
            ViewingAction::Reject => "reject",
            ViewingAction::Complete => "complete",
            ViewingAction::Cancel => "cancel",
        }
    }

    /// Resulting status when `self` is applied to a viewing in `current`.
    pub fn apply(self, current: ViewingStatus) -> Result<ViewingStatus, IllegalTransition> {
        if self.allowed_from().contains(&current) {
            Ok(self.target())
        } else {
            Err(IllegalTransition {
                action: self,
                current,
            })
        }
    }
}

impl fmt::Display for ViewingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a viewing that is {current}")]
pub struct IllegalTransition {
    pub action: ViewingAction,
    pub current: ViewingStatus,
}
