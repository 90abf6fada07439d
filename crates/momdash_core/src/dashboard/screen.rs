//! Renderable projection of dashboard state.
//!
//! A [`Screen`] is everything a UI needs to draw one frame: the active body
//! (grid, viewer, editor or the not-found placeholder) plus the optional
//! create dialog and delete confirmation overlays. All HTML in it has been
//! sanitized.

use crate::dashboard::toolbar::FormatAction;
use crate::dashboard::view_state::{InlineEdit, ViewMode, ViewState};
use crate::model::meeting::{Meeting, MeetingDraft, MeetingId};
use crate::render::markdown::{render_card_preview, render_markdown, SafeHtml};

pub const NOT_FOUND_MESSAGE: &str = "Meeting not found";
pub const DELETE_PROMPT_MESSAGE: &str =
    "This action cannot be undone. This will permanently delete the meeting minutes.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Screen {
    pub body: ScreenBody,
    pub create_dialog: Option<CreateDialogView>,
    pub delete_prompt: Option<DeletePromptView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenBody {
    Grid(Vec<CardView>),
    Viewer(ViewerView),
    Editor(EditorView),
    /// Selection points at a meeting missing from the list. Offers only "back".
    NotFound(NotFoundView),
}

/// One grid card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: MeetingId,
    pub title: String,
    /// `"<date> at <time>"`.
    pub schedule: String,
    /// Clamped content preview.
    pub preview: SafeHtml,
    /// Present while this card is edited in place.
    pub inline_edit: Option<InlineEdit>,
    pub delete_pending: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerView {
    pub id: MeetingId,
    pub heading: String,
    pub html: SafeHtml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub id: MeetingId,
    pub heading: String,
    pub buffer: String,
    /// Live preview of `buffer`.
    pub preview: SafeHtml,
    pub toolbar: &'static [FormatAction],
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFoundView {
    pub requested_id: MeetingId,
    /// View the user was in when the meeting disappeared.
    pub mode: ViewMode,
    pub message: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDialogView {
    pub draft: MeetingDraft,
    pub can_submit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletePromptView {
    pub meeting_id: MeetingId,
    /// Title of the target when it is still listed.
    pub title: Option<String>,
    pub message: &'static str,
}

/// Inputs of one projection, borrowed from the controller.
pub(crate) struct ScreenInputs<'a> {
    pub meetings: &'a [Meeting],
    pub view: &'a ViewState,
    pub card_preview_lines: usize,
    pub draft: Option<&'a MeetingDraft>,
    pub inline_edit: Option<&'a InlineEdit>,
    pub pending_delete: Option<&'a str>,
}

pub(crate) fn project(inputs: ScreenInputs<'_>) -> Screen {
    let find = |id: &str| inputs.meetings.iter().find(|meeting| meeting.id == id);

    let body = match inputs.view {
        ViewState::Grid => ScreenBody::Grid(
            inputs
                .meetings
                .iter()
                .map(|meeting| card(meeting, &inputs))
                .collect(),
        ),
        ViewState::Viewing(id) => match find(id.as_str()) {
            Some(meeting) => ScreenBody::Viewer(ViewerView {
                id: meeting.id.clone(),
                heading: meeting.heading(),
                html: render_markdown(&meeting.content),
            }),
            None => not_found(id, ViewMode::Viewing),
        },
        ViewState::Editing(session) => match find(session.meeting_id.as_str()) {
            Some(meeting) => ScreenBody::Editor(EditorView {
                id: meeting.id.clone(),
                heading: meeting.heading(),
                buffer: session.buffer.clone(),
                preview: render_markdown(&session.buffer),
                toolbar: FormatAction::ALL,
                dirty: session.dirty,
            }),
            None => not_found(&session.meeting_id, ViewMode::Editing),
        },
    };

    Screen {
        body,
        create_dialog: inputs.draft.map(|draft| CreateDialogView {
            draft: draft.clone(),
            can_submit: draft.is_complete(),
        }),
        delete_prompt: inputs.pending_delete.map(|id| DeletePromptView {
            meeting_id: id.to_string(),
            title: find(id).map(|meeting| meeting.title.clone()),
            message: DELETE_PROMPT_MESSAGE,
        }),
    }
}

fn card(meeting: &Meeting, inputs: &ScreenInputs<'_>) -> CardView {
    CardView {
        id: meeting.id.clone(),
        title: meeting.title.clone(),
        schedule: meeting.schedule_label(),
        preview: render_card_preview(&meeting.content, inputs.card_preview_lines),
        inline_edit: inputs
            .inline_edit
            .filter(|edit| edit.meeting_id == meeting.id)
            .cloned(),
        delete_pending: inputs.pending_delete == Some(meeting.id.as_str()),
    }
}

fn not_found(id: &str, mode: ViewMode) -> ScreenBody {
    ScreenBody::NotFound(NotFoundView {
        requested_id: id.to_string(),
        mode,
        message: NOT_FOUND_MESSAGE,
    })
}
