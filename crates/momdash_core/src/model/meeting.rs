//! Meeting record model.
//!
//! # Responsibility
//! - Define the canonical `{id, title, date, time, content}` record.
//! - Provide the draft guard used before any remote insert.
//! - Provide the partial patch shape used for field-level updates.
//!
//! # Invariants
//! - `id` is opaque, unique and immutable once assigned by the store.
//! - `MeetingDraft::into_fields()` always yields empty `content`.
//! - `date` and `time` are kept string-encoded exactly as entered.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque identifier assigned by the remote store.
pub type MeetingId = String;

/// One meeting as delivered by the subscription feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    pub id: MeetingId,
    pub title: String,
    /// Calendar date, e.g. `2024-01-05`.
    pub date: String,
    /// Wall-clock time, e.g. `09:00`.
    pub time: String,
    /// Markdown body (the minutes).
    #[serde(default)]
    pub content: String,
}

impl Meeting {
    /// Builds a meeting from stored fields and its store-assigned id.
    pub fn from_fields(id: impl Into<MeetingId>, fields: MeetingFields) -> Self {
        Self {
            id: id.into(),
            title: fields.title,
            date: fields.date,
            time: fields.time,
            content: fields.content,
        }
    }

    /// `"<date> at <time>"`, as shown under a card title.
    pub fn schedule_label(&self) -> String {
        format!("{} at {}", self.date, self.time)
    }

    /// `"<title> - <date> at <time>"`, as shown above the viewer/editor.
    pub fn heading(&self) -> String {
        format!("{} - {}", self.title, self.schedule_label())
    }
}

/// Document body written by an insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingFields {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub content: String,
}

/// Draft field selector for the create form and the inline editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingField {
    Title,
    Date,
    Time,
}

impl MeetingField {
    pub const ALL: [MeetingField; 3] = [Self::Title, Self::Date, Self::Time];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Date => "date",
            Self::Time => "time",
        }
    }

    /// Case-insensitive inverse of [`MeetingField::as_str`].
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(label))
    }
}

/// Draft guard failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftValidationError {
    /// The named field is empty or whitespace only.
    MissingField(MeetingField),
}

impl Display for DraftValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "meeting {} is required", field.as_str()),
        }
    }
}

impl Error for DraftValidationError {}

/// Transient input for a not-yet-created meeting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeetingDraft {
    pub title: String,
    pub date: String,
    pub time: String,
}

impl MeetingDraft {
    pub fn new(
        title: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            date: date.into(),
            time: time.into(),
        }
    }

    /// Sets one field from form input.
    pub fn set(&mut self, field: MeetingField, value: impl Into<String>) {
        let value = value.into();
        match field {
            MeetingField::Title => self.title = value,
            MeetingField::Date => self.date = value,
            MeetingField::Time => self.time = value,
        }
    }

    /// Checks title, date and time in form order.
    pub fn validate(&self) -> Result<(), DraftValidationError> {
        for (field, value) in [
            (MeetingField::Title, &self.title),
            (MeetingField::Date, &self.date),
            (MeetingField::Time, &self.time),
        ] {
            if value.trim().is_empty() {
                return Err(DraftValidationError::MissingField(field));
            }
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.validate().is_ok()
    }

    /// Insert payload for this draft. Content is always empty.
    pub fn into_fields(self) -> MeetingFields {
        MeetingFields {
            title: self.title,
            date: self.date,
            time: self.time,
            content: String::new(),
        }
    }
}

/// Field-level update. `None` fields are left untouched by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl MeetingPatch {
    /// Patch touching only the markdown body.
    pub fn content(markdown: impl Into<String>) -> Self {
        Self {
            content: Some(markdown.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none() && self.time.is_none() && self.content.is_none()
    }

    /// Names of the fields this patch replaces, in schema order.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.title.is_some() {
            names.push("title");
        }
        if self.date.is_some() {
            names.push("date");
        }
        if self.time.is_some() {
            names.push("time");
        }
        if self.content.is_some() {
            names.push("content");
        }
        names
    }

    pub fn apply_to(&self, meeting: &mut Meeting) {
        if let Some(title) = &self.title {
            meeting.title.clone_from(title);
        }
        if let Some(date) = &self.date {
            meeting.date.clone_from(date);
        }
        if let Some(time) = &self.time {
            meeting.time.clone_from(time);
        }
        if let Some(content) = &self.content {
            meeting.content.clone_from(content);
        }
    }
}
