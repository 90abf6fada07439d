//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose dashboard actions and the projected screen to Dart via FRB.
//! - Own the single process-wide dashboard session.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every action drains pending store snapshots before it runs.
//! - Failures are reported in response envelopes, never as panics.

use momdash_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    render_markdown as render_markdown_inner, AppConfig, Dashboard, FormatAction, MeetingDraft,
    MeetingField, MeetingPatch, Screen, ScreenBody, SqliteMeetingStore,
};
use std::sync::{Mutex, PoisonError};

static SESSION: Mutex<Option<Dashboard<SqliteMeetingStore>>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Renders markdown into sanitized HTML without touching the session.
#[flutter_rust_bridge::frb(sync)]
pub fn render_markdown(markdown: String) -> String {
    render_markdown_inner(&markdown).into_string()
}

/// Title, date and time as typed into a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingFieldsItem {
    pub title: String,
    pub date: String,
    pub time: String,
}

/// One meeting card in grid mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingCardItem {
    pub meeting_id: String,
    pub title: String,
    /// `"<date> at <time>"`.
    pub schedule: String,
    /// Sanitized HTML of the first content lines.
    pub preview_html: String,
    pub inline_editing: bool,
    /// Inline editor values while `inline_editing` is set.
    pub inline_fields: Option<MeetingFieldsItem>,
    pub delete_pending: bool,
}

/// Flattened dashboard screen for the Dart side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardScreenResponse {
    pub ok: bool,
    /// `grid|viewing|editing`.
    pub mode: String,
    pub selected_id: Option<String>,
    /// Populated in grid mode only.
    pub cards: Vec<MeetingCardItem>,
    /// `"<title> - <date> at <time>"` for viewer and editor.
    pub heading: Option<String>,
    /// Viewer HTML, or the live preview while editing.
    pub html: Option<String>,
    pub editor_buffer: Option<String>,
    /// Toolbar action labels while editing.
    pub toolbar: Vec<String>,
    /// Set when the selected meeting no longer exists.
    pub not_found: bool,
    pub create_dialog_open: bool,
    /// Draft values while the create dialog is open.
    pub create_draft: Option<MeetingFieldsItem>,
    /// Whether every draft field is filled in.
    pub create_can_submit: bool,
    /// Title (or id) of the meeting awaiting delete confirmation.
    pub delete_prompt: Option<String>,
    pub message: String,
}

impl DashboardScreenResponse {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            mode: String::new(),
            selected_id: None,
            cards: Vec::new(),
            heading: None,
            html: None,
            editor_buffer: None,
            toolbar: Vec::new(),
            not_found: false,
            create_dialog_open: false,
            create_draft: None,
            create_can_submit: false,
            delete_prompt: None,
            message: message.into(),
        }
    }
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Meeting the action applied to, when there is one.
    pub meeting_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl DashboardActionResponse {
    fn success(message: impl Into<String>, meeting_id: Option<String>) -> Self {
        Self {
            ok: true,
            meeting_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            meeting_id: None,
            message: message.into(),
        }
    }
}

/// Editor state after a toolbar action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorFormatResponse {
    pub ok: bool,
    pub buffer: String,
    /// Byte offsets of the selection after formatting.
    pub selection_start: u32,
    pub selection_end: u32,
    pub message: String,
}

/// Returns the current screen projection.
///
/// # FFI contract
/// - Sync call; opens the store on first use.
/// - Never panics.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_screen() -> DashboardScreenResponse {
    match with_dashboard(|dashboard| Ok(to_screen_response(dashboard.screen()))) {
        Ok(response) => response,
        Err(err) => DashboardScreenResponse::failure(format!("dashboard_screen failed: {err}")),
    }
}

/// Creates a meeting with empty content and opens it in the editor.
///
/// # FFI contract
/// - Blank title, date or time fail without a store call.
/// - Returns the store-assigned id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_create(title: String, date: String, time: String) -> DashboardActionResponse {
    let result = with_dashboard(|dashboard| {
        dashboard.open_create_dialog();
        dashboard.set_draft(MeetingDraft::new(title, date, time));
        dashboard.submit_create().map_err(|err| err.to_string())
    });
    match result {
        Ok(id) => DashboardActionResponse::success("Meeting created.", Some(id)),
        Err(err) => DashboardActionResponse::failure(format!("meeting_create failed: {err}")),
    }
}

/// Opens the create dialog, keeping any draft typed earlier.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_open_create_dialog() -> DashboardActionResponse {
    action("dashboard_open_create_dialog", None, |dashboard| {
        dashboard.open_create_dialog();
        Ok(())
    })
}

/// Closes the create dialog without creating anything.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_close_create_dialog() -> DashboardActionResponse {
    action("dashboard_close_create_dialog", None, |dashboard| {
        dashboard.close_create_dialog();
        Ok(())
    })
}

/// Sets one draft field (`title|date|time`) in the create dialog.
#[flutter_rust_bridge::frb(sync)]
pub fn create_dialog_set_field(field: String, value: String) -> DashboardActionResponse {
    let Some(field) = MeetingField::from_label(&field) else {
        return unknown_field("create_dialog_set_field", &field);
    };
    action("create_dialog_set_field", None, |dashboard| {
        dashboard.set_draft_field(field, value);
        Ok(())
    })
}

/// Creates a meeting from the dialog draft and opens it in the editor.
///
/// # FFI contract
/// - An incomplete draft fails without a store call and keeps the dialog open.
/// - Returns the store-assigned id on success.
#[flutter_rust_bridge::frb(sync)]
pub fn create_dialog_submit() -> DashboardActionResponse {
    let result =
        with_dashboard(|dashboard| dashboard.submit_create().map_err(|err| err.to_string()));
    match result {
        Ok(id) => DashboardActionResponse::success("Meeting created.", Some(id)),
        Err(err) => {
            DashboardActionResponse::failure(format!("create_dialog_submit failed: {err}"))
        }
    }
}

/// Opens a meeting in the viewer. Only valid from grid mode.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_select(meeting_id: String) -> DashboardActionResponse {
    let id = meeting_id.trim().to_string();
    action("meeting_select", Some(id.clone()), |dashboard| dashboard.select(id))
}

/// Switches the viewer into the editor.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_edit() -> DashboardActionResponse {
    action("meeting_edit", None, |dashboard| dashboard.edit())
}

/// Switches the editor back to the viewer, discarding unsaved edits.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_preview() -> DashboardActionResponse {
    action("meeting_preview", None, |dashboard| dashboard.preview())
}

/// Returns to the grid from any view.
#[flutter_rust_bridge::frb(sync)]
pub fn dashboard_back() -> DashboardActionResponse {
    action("dashboard_back", None, |dashboard| {
        dashboard.back();
        Ok(())
    })
}

/// Replaces the editor buffer with typed text.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_set_content(markdown: String) -> DashboardActionResponse {
    action("editor_set_content", None, |dashboard| {
        dashboard.set_editor_content(markdown)
    })
}

/// Applies a toolbar action (`bold|italic|heading|quote|unordered-list|
/// ordered-list|link|table`) to the editor buffer.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_apply_format(
    action_label: String,
    selection_start: u32,
    selection_end: u32,
) -> EditorFormatResponse {
    let Some(format) = FormatAction::from_label(&action_label) else {
        return EditorFormatResponse {
            ok: false,
            buffer: String::new(),
            selection_start,
            selection_end,
            message: format!("editor_apply_format failed: unknown action `{action_label}`"),
        };
    };
    let result = with_dashboard(|dashboard| {
        let range = dashboard
            .apply_format(format, selection_start as usize..selection_end as usize)
            .map_err(|err| err.to_string())?;
        let buffer = dashboard
            .editor()
            .map(|session| session.buffer.clone())
            .unwrap_or_default();
        Ok((buffer, range))
    });
    match result {
        Ok((buffer, range)) => EditorFormatResponse {
            ok: true,
            buffer,
            selection_start: to_u32(range.start),
            selection_end: to_u32(range.end),
            message: String::new(),
        },
        Err(err) => EditorFormatResponse {
            ok: false,
            buffer: String::new(),
            selection_start,
            selection_end,
            message: format!("editor_apply_format failed: {err}"),
        },
    }
}

/// Saves the editor buffer and returns to the viewer.
#[flutter_rust_bridge::frb(sync)]
pub fn editor_save() -> DashboardActionResponse {
    let result = with_dashboard(|dashboard| {
        let id = dashboard.selected_id().map(str::to_string);
        dashboard.save_editor().map_err(|err| err.to_string())?;
        Ok(id)
    });
    match result {
        Ok(id) => DashboardActionResponse::success("Minutes saved.", id),
        Err(err) => DashboardActionResponse::failure(format!("editor_save failed: {err}")),
    }
}

/// Replaces only the content of `meeting_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_save_content(meeting_id: String, markdown: String) -> DashboardActionResponse {
    let id = meeting_id.trim().to_string();
    action("meeting_save_content", Some(id.clone()), |dashboard| {
        dashboard.save_content(&id, markdown)
    })
}

/// Replaces the provided header fields of `meeting_id`.
///
/// `None` leaves a field untouched; at least one field is required.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_update(
    meeting_id: String,
    title: Option<String>,
    date: Option<String>,
    time: Option<String>,
) -> DashboardActionResponse {
    let id = meeting_id.trim().to_string();
    let patch = MeetingPatch {
        title,
        date,
        time,
        content: None,
    };
    action("meeting_update", Some(id.clone()), |dashboard| {
        dashboard.update_meeting(&id, &patch)
    })
}

/// Opens the in-grid editor on `meeting_id`, replacing any open one.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_begin_inline_edit(meeting_id: String) -> DashboardActionResponse {
    let id = meeting_id.trim().to_string();
    action("meeting_begin_inline_edit", Some(id.clone()), |dashboard| {
        dashboard.begin_inline_edit(&id)
    })
}

/// Sets one inline editor field (`title|date|time`).
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_set_inline_field(field: String, value: String) -> DashboardActionResponse {
    let Some(field) = MeetingField::from_label(&field) else {
        return unknown_field("meeting_set_inline_field", &field);
    };
    action("meeting_set_inline_field", None, |dashboard| {
        dashboard.set_inline_field(field, value)
    })
}

/// Sends the changed inline fields and closes the inline editor.
///
/// # FFI contract
/// - Unchanged fields are not sent; no change at all only closes the editor.
/// - On failure the inline editor stays open with the typed values.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_commit_inline_edit() -> DashboardActionResponse {
    let result = with_dashboard(|dashboard| {
        let id = dashboard.inline_edit().map(|edit| edit.meeting_id.clone());
        dashboard.commit_inline_edit().map_err(|err| err.to_string())?;
        Ok(id)
    });
    match result {
        Ok(id) => DashboardActionResponse::success("Meeting updated.", id),
        Err(err) => {
            DashboardActionResponse::failure(format!("meeting_commit_inline_edit failed: {err}"))
        }
    }
}

/// Closes the inline editor and drops its values.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_cancel_inline_edit() -> DashboardActionResponse {
    action("meeting_cancel_inline_edit", None, |dashboard| {
        dashboard.cancel_inline_edit();
        Ok(())
    })
}

/// Opens the delete confirmation for `meeting_id`.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_request_delete(meeting_id: String) -> DashboardActionResponse {
    let id = meeting_id.trim().to_string();
    action("meeting_request_delete", Some(id.clone()), |dashboard| {
        dashboard.request_delete(id);
        Ok(())
    })
}

/// Dismisses the delete confirmation without deleting.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_cancel_delete() -> DashboardActionResponse {
    action("meeting_cancel_delete", None, |dashboard| {
        dashboard.cancel_delete();
        Ok(())
    })
}

/// Deletes the meeting awaiting confirmation.
#[flutter_rust_bridge::frb(sync)]
pub fn meeting_confirm_delete() -> DashboardActionResponse {
    let result =
        with_dashboard(|dashboard| dashboard.confirm_delete().map_err(|err| err.to_string()));
    match result {
        Ok(id) => DashboardActionResponse::success("Meeting deleted.", Some(id)),
        Err(err) => {
            DashboardActionResponse::failure(format!("meeting_confirm_delete failed: {err}"))
        }
    }
}

fn unknown_field(name: &str, label: &str) -> DashboardActionResponse {
    DashboardActionResponse::failure(format!(
        "{name} failed: unknown field `{label}` (expected title|date|time)"
    ))
}

fn action(
    name: &str,
    meeting_id: Option<String>,
    f: impl FnOnce(&mut Dashboard<SqliteMeetingStore>) -> momdash_core::DashboardResult<()>,
) -> DashboardActionResponse {
    match with_dashboard(|dashboard| f(dashboard).map_err(|err| err.to_string())) {
        Ok(()) => DashboardActionResponse::success("OK", meeting_id),
        Err(err) => DashboardActionResponse::failure(format!("{name} failed: {err}")),
    }
}

fn with_dashboard<T>(
    f: impl FnOnce(&mut Dashboard<SqliteMeetingStore>) -> Result<T, String>,
) -> Result<T, String> {
    let mut guard = SESSION.lock().unwrap_or_else(PoisonError::into_inner);
    if guard.is_none() {
        *guard = Some(open_session(&AppConfig::from_env())?);
    }
    let Some(dashboard) = guard.as_mut() else {
        return Err("dashboard session unavailable".to_string());
    };
    dashboard.poll_snapshots();
    f(dashboard)
}

/// Replaces the process-wide session with one opened from `config`.
#[cfg(test)]
fn install_session(config: &AppConfig) -> Result<(), String> {
    let dashboard = open_session(config)?;
    *SESSION.lock().unwrap_or_else(PoisonError::into_inner) = Some(dashboard);
    Ok(())
}

fn open_session(config: &AppConfig) -> Result<Dashboard<SqliteMeetingStore>, String> {
    let store = SqliteMeetingStore::open(&config.db_path)
        .map_err(|err| format!("dashboard store open failed: {err}"))?;
    let mut dashboard = Dashboard::new(store, config.dashboard());
    dashboard
        .activate()
        .map_err(|err| format!("dashboard subscribe failed: {err}"))?;
    log::info!(
        "event=ffi_session_open module=ffi status=ok db_path={} collection={}",
        config.db_path.display(),
        config.collection
    );
    Ok(dashboard)
}

fn to_screen_response(screen: Screen) -> DashboardScreenResponse {
    let mut response = DashboardScreenResponse::failure(String::new());
    response.ok = true;
    response.create_dialog_open = screen.create_dialog.is_some();
    if let Some(dialog) = screen.create_dialog {
        response.create_can_submit = dialog.can_submit;
        response.create_draft = Some(MeetingFieldsItem {
            title: dialog.draft.title,
            date: dialog.draft.date,
            time: dialog.draft.time,
        });
    }
    response.delete_prompt = screen
        .delete_prompt
        .map(|prompt| prompt.title.unwrap_or(prompt.meeting_id));

    match screen.body {
        ScreenBody::Grid(cards) => {
            response.mode = "grid".to_string();
            response.cards = cards
                .into_iter()
                .map(|card| MeetingCardItem {
                    meeting_id: card.id,
                    title: card.title,
                    schedule: card.schedule,
                    preview_html: card.preview.into_string(),
                    inline_editing: card.inline_edit.is_some(),
                    inline_fields: card.inline_edit.map(|edit| MeetingFieldsItem {
                        title: edit.title,
                        date: edit.date,
                        time: edit.time,
                    }),
                    delete_pending: card.delete_pending,
                })
                .collect();
        }
        ScreenBody::Viewer(viewer) => {
            response.mode = "viewing".to_string();
            response.selected_id = Some(viewer.id);
            response.heading = Some(viewer.heading);
            response.html = Some(viewer.html.into_string());
        }
        ScreenBody::Editor(editor) => {
            response.mode = "editing".to_string();
            response.selected_id = Some(editor.id);
            response.heading = Some(editor.heading);
            response.html = Some(editor.preview.into_string());
            response.editor_buffer = Some(editor.buffer);
            response.toolbar = editor
                .toolbar
                .iter()
                .map(|action| action.label().to_string())
                .collect();
        }
        ScreenBody::NotFound(view) => {
            response.mode = view.mode.as_str().to_string();
            response.selected_id = Some(view.requested_id);
            response.not_found = true;
            response.message = view.message.to_string();
        }
    }
    response
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
