//! View state of the dashboard.
//!
//! # Invariants
//! - Exactly one of grid, viewer or editor is active; "editing without a
//!   selection" cannot be represented.
//! - The editor buffer only exists while a meeting is being edited.
//! - At most one inline grid edit exists at a time.

use crate::model::meeting::{Meeting, MeetingField, MeetingId, MeetingPatch};
use std::fmt::{Display, Formatter};

/// Payload-free discriminant of [`ViewState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Grid,
    Viewing,
    Editing,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Viewing => "viewing",
            Self::Editing => "editing",
        }
    }
}

impl Display for ViewMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markdown buffer of the full-content editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorSession {
    pub meeting_id: MeetingId,
    pub buffer: String,
    /// Set once the user changed the buffer; snapshots stop overwriting it.
    pub dirty: bool,
}

impl EditorSession {
    pub fn new(meeting_id: impl Into<MeetingId>, content: impl Into<String>) -> Self {
        Self {
            meeting_id: meeting_id.into(),
            buffer: content.into(),
            dirty: false,
        }
    }
}

/// Which single view is shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Grid,
    Viewing(MeetingId),
    Editing(EditorSession),
}

impl ViewState {
    pub fn mode(&self) -> ViewMode {
        match self {
            Self::Grid => ViewMode::Grid,
            Self::Viewing(_) => ViewMode::Viewing,
            Self::Editing(_) => ViewMode::Editing,
        }
    }

    pub fn selected_id(&self) -> Option<&str> {
        match self {
            Self::Grid => None,
            Self::Viewing(id) => Some(id),
            Self::Editing(session) => Some(&session.meeting_id),
        }
    }

    pub fn editor(&self) -> Option<&EditorSession> {
        match self {
            Self::Editing(session) => Some(session),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut EditorSession> {
        match self {
            Self::Editing(session) => Some(session),
            _ => None,
        }
    }
}

/// In-grid edit of one card's title/date/time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineEdit {
    pub meeting_id: MeetingId,
    pub title: String,
    pub date: String,
    pub time: String,
}

impl InlineEdit {
    pub fn from_meeting(meeting: &Meeting) -> Self {
        Self {
            meeting_id: meeting.id.clone(),
            title: meeting.title.clone(),
            date: meeting.date.clone(),
            time: meeting.time.clone(),
        }
    }

    pub fn set(&mut self, field: MeetingField, value: impl Into<String>) {
        let value = value.into();
        match field {
            MeetingField::Title => self.title = value,
            MeetingField::Date => self.date = value,
            MeetingField::Time => self.time = value,
        }
    }

    /// Patch with the fields that differ from `current`.
    ///
    /// All three fields are sent when the meeting is unknown locally.
    pub fn changes_from(&self, current: Option<&Meeting>) -> MeetingPatch {
        let changed = |value: &String, old: Option<&String>| match old {
            Some(old) if old == value => None,
            _ => Some(value.clone()),
        };
        MeetingPatch {
            title: changed(&self.title, current.map(|m| &m.title)),
            date: changed(&self.date, current.map(|m| &m.date)),
            time: changed(&self.time, current.map(|m| &m.time)),
            content: None,
        }
    }
}
