//! Dashboard controller and its view projection.
//!
//! # Responsibility
//! - Own all process-local view state (list, selection, dialogs, editors).
//! - Mediate every read/write against a [`crate::store::MeetingStore`].
//! - Project the state into a renderable [`screen::Screen`].
//!
//! # Invariants
//! - The local meeting list is replaced wholesale by every snapshot.
//! - Store failures are logged and returned; optimistic UI changes are only
//!   committed after the store confirms.

pub mod controller;
pub mod screen;
pub mod toolbar;
pub mod view_state;

use crate::model::meeting::{DraftValidationError, MeetingId};
use crate::store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use view_state::ViewMode;

pub type DashboardResult<T> = Result<T, DashboardError>;

/// Errors returned by dashboard actions.
#[derive(Debug)]
pub enum DashboardError {
    /// Create was invoked with a blank title, date or time.
    IncompleteDraft(DraftValidationError),
    /// Action is not available in the current view.
    InvalidTransition {
        from: ViewMode,
        action: &'static str,
    },
    /// Target meeting is not in the current list.
    MeetingNotFound(MeetingId),
    /// Confirm was invoked without a pending delete.
    NoPendingDelete,
    /// Inline action was invoked without an open inline editor.
    NoInlineEdit,
    /// Update carried no fields.
    EmptyPatch,
    /// Remote store operation failed.
    Store(StoreError),
}

impl Display for DashboardError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IncompleteDraft(err) => write!(f, "{err}"),
            Self::InvalidTransition { from, action } => {
                write!(f, "`{action}` is not available while {from}")
            }
            Self::MeetingNotFound(id) => write!(f, "meeting not found: {id}"),
            Self::NoPendingDelete => write!(f, "no meeting is pending deletion"),
            Self::NoInlineEdit => write!(f, "no meeting is being edited inline"),
            Self::EmptyPatch => write!(f, "update contains no fields"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DashboardError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::IncompleteDraft(err) => Some(err),
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for DashboardError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<DraftValidationError> for DashboardError {
    fn from(value: DraftValidationError) -> Self {
        Self::IncompleteDraft(value)
    }
}
