//! Dashboard controller.
//!
//! # Responsibility
//! - Keep the local meeting list in sync with the store subscription.
//! - Drive the `Grid | Viewing | Editing` view state machine.
//! - Run create/save/inline-update/delete against the store and apply their
//!   effects only after the store confirms.
//!
//! # Invariants
//! - Incomplete drafts never reach the store.
//! - A failed create keeps the dialog open with the draft intact.
//! - A failed save keeps the editor open; a failed inline update keeps the
//!   inline editor open; a failed delete keeps the confirmation prompt.
//! - A selection pointing at a missing meeting is kept until "back"; the
//!   screen shows the not-found placeholder meanwhile.

use crate::config::DashboardConfig;
use crate::dashboard::screen::{project, Screen, ScreenInputs};
use crate::dashboard::toolbar::{apply_format, FormatAction};
use crate::dashboard::view_state::{EditorSession, InlineEdit, ViewMode, ViewState};
use crate::dashboard::{DashboardError, DashboardResult};
use crate::model::meeting::{
    DraftValidationError, Meeting, MeetingDraft, MeetingField, MeetingId, MeetingPatch,
};
use crate::store::feed::Snapshot;
use crate::store::{MeetingStore, Subscription};
use log::{debug, error, info, warn};
use std::ops::Range;

/// Single-session dashboard over one store collection.
pub struct Dashboard<S: MeetingStore> {
    store: S,
    config: DashboardConfig,
    meetings: Vec<Meeting>,
    view: ViewState,
    create_dialog_open: bool,
    draft: MeetingDraft,
    inline_edit: Option<InlineEdit>,
    pending_delete: Option<MeetingId>,
    subscription: Option<Subscription>,
}

impl<S: MeetingStore> Dashboard<S> {
    /// Creates an inactive dashboard in `Grid` view.
    pub fn new(store: S, config: DashboardConfig) -> Self {
        Self {
            store,
            config,
            meetings: Vec::new(),
            view: ViewState::Grid,
            create_dialog_open: false,
            draft: MeetingDraft::default(),
            inline_edit: None,
            pending_delete: None,
            subscription: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    // ---- live subscription -------------------------------------------------

    /// Opens the collection subscription and applies its first snapshot.
    ///
    /// Calling this while already active is a no-op.
    pub fn activate(&mut self) -> DashboardResult<()> {
        if self.subscription.is_some() {
            return Ok(());
        }
        let collection = self.config.collection.as_str();
        match self.store.subscribe(collection) {
            Ok(subscription) => {
                info!("event=dashboard_activate module=dashboard status=ok collection={collection}");
                self.subscription = Some(subscription);
                self.poll_snapshots();
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=dashboard_activate module=dashboard status=error collection={collection} error={err}"
                );
                Err(err.into())
            }
        }
    }

    /// Tears down the subscription. Local state is kept as last seen.
    pub fn deactivate(&mut self) {
        if self.subscription.take().is_some() {
            info!(
                "event=dashboard_deactivate module=dashboard status=ok collection={}",
                self.config.collection
            );
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }

    /// Applies the newest pending snapshot, if any.
    ///
    /// Asks the store to pick up changes from other clients first.
    pub fn poll_snapshots(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_ref() else {
            return false;
        };
        if let Err(err) = self.store.refresh(subscription.collection()) {
            warn!(
                "event=snapshot_refresh module=dashboard status=error collection={} error={err}",
                subscription.collection()
            );
        }
        let latest = subscription.drain_latest();
        match latest {
            Some(snapshot) => {
                self.apply_snapshot(snapshot);
                true
            }
            None => false,
        }
    }

    /// Replaces the local list with `snapshot`.
    pub fn apply_snapshot(&mut self, snapshot: Snapshot) {
        debug!(
            "event=snapshot_apply module=dashboard status=ok previous={} records={}",
            self.meetings.len(),
            snapshot.len()
        );
        self.meetings = snapshot;

        if let Some(session) = self.view.editor_mut() {
            if !session.dirty {
                if let Some(meeting) = self
                    .meetings
                    .iter()
                    .find(|meeting| meeting.id == session.meeting_id)
                {
                    session.buffer.clone_from(&meeting.content);
                }
            }
        }

        let inline_target_gone = self
            .inline_edit
            .as_ref()
            .is_some_and(|edit| self.meeting(&edit.meeting_id).is_none());
        if inline_target_gone {
            self.inline_edit = None;
        }
    }

    // ---- queries -----------------------------------------------------------

    /// Meetings in feed order.
    pub fn meetings(&self) -> &[Meeting] {
        &self.meetings
    }

    pub fn meeting(&self, id: &str) -> Option<&Meeting> {
        self.meetings.iter().find(|meeting| meeting.id == id)
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn mode(&self) -> ViewMode {
        self.view.mode()
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.view.selected_id()
    }

    /// Selected meeting, `None` in grid view or when it vanished.
    pub fn selected_meeting(&self) -> Option<&Meeting> {
        self.selected_id().and_then(|id| self.meeting(id))
    }

    pub fn editor(&self) -> Option<&EditorSession> {
        self.view.editor()
    }

    pub fn draft(&self) -> &MeetingDraft {
        &self.draft
    }

    pub fn is_create_dialog_open(&self) -> bool {
        self.create_dialog_open
    }

    pub fn inline_edit(&self) -> Option<&InlineEdit> {
        self.inline_edit.as_ref()
    }

    pub fn pending_delete(&self) -> Option<&str> {
        self.pending_delete.as_deref()
    }

    pub fn is_delete_prompt_open(&self) -> bool {
        self.pending_delete.is_some()
    }

    /// Projects the current state into a renderable screen.
    pub fn screen(&self) -> Screen {
        project(ScreenInputs {
            meetings: &self.meetings,
            view: &self.view,
            card_preview_lines: self.config.card_preview_lines,
            draft: self.create_dialog_open.then_some(&self.draft),
            inline_edit: self.inline_edit.as_ref(),
            pending_delete: self.pending_delete.as_deref(),
        })
    }

    // ---- view transitions --------------------------------------------------

    /// `Grid -> Viewing`. The id is not checked against the list.
    pub fn select(&mut self, id: impl Into<MeetingId>) -> DashboardResult<()> {
        self.require_mode(ViewMode::Grid, "select")?;
        self.view = ViewState::Viewing(id.into());
        Ok(())
    }

    /// Any view `-> Grid`. Unsaved editor changes are discarded.
    pub fn back(&mut self) {
        if let Some(session) = self.view.editor() {
            if session.dirty {
                debug!(
                    "event=editor_discard module=dashboard status=ok id={} buffer_len={}",
                    session.meeting_id,
                    session.buffer.len()
                );
            }
        }
        self.view = ViewState::Grid;
    }

    /// `Viewing -> Editing`, seeding the editor with the stored content.
    pub fn edit(&mut self) -> DashboardResult<()> {
        let ViewState::Viewing(id) = &self.view else {
            return Err(self.invalid("edit"));
        };
        let id = id.clone();
        if self.meeting(&id).is_none() {
            return Err(DashboardError::MeetingNotFound(id));
        }
        self.enter_editing(id);
        Ok(())
    }

    /// `Editing -> Viewing`. Unsaved editor changes are discarded.
    pub fn preview(&mut self) -> DashboardResult<()> {
        let ViewState::Editing(session) = &self.view else {
            return Err(self.invalid("preview"));
        };
        self.view = ViewState::Viewing(session.meeting_id.clone());
        Ok(())
    }

    fn enter_editing(&mut self, id: MeetingId) {
        let content = self
            .meeting(&id)
            .map(|meeting| meeting.content.clone())
            .unwrap_or_default();
        self.view = ViewState::Editing(EditorSession::new(id, content));
    }

    // ---- create ------------------------------------------------------------

    pub fn open_create_dialog(&mut self) {
        self.create_dialog_open = true;
    }

    /// Closes the dialog; the draft is kept for the next open.
    pub fn close_create_dialog(&mut self) {
        self.create_dialog_open = false;
    }

    pub fn set_draft_field(&mut self, field: MeetingField, value: impl Into<String>) {
        self.draft.set(field, value);
    }

    pub fn set_draft(&mut self, draft: MeetingDraft) {
        self.draft = draft;
    }

    /// Inserts the draft as a new meeting with empty content.
    ///
    /// On success the dialog closes, the draft resets and the new meeting
    /// opens in the editor. An incomplete draft returns
    /// [`DashboardError::IncompleteDraft`] without touching the store.
    pub fn submit_create(&mut self) -> DashboardResult<MeetingId> {
        if let Err(err) = self.draft.validate() {
            let DraftValidationError::MissingField(field) = err;
            debug!(
                "event=meeting_create module=dashboard status=skipped reason=missing_{}",
                field.as_str()
            );
            return Err(err.into());
        }

        let fields = self.draft.clone().into_fields();
        let collection = self.config.collection.as_str();
        match self.store.insert(collection, &fields) {
            Ok(id) => {
                info!("event=meeting_create module=dashboard status=ok collection={collection} id={id}");
                self.create_dialog_open = false;
                self.draft = MeetingDraft::default();
                self.poll_snapshots();
                self.enter_editing(id.clone());
                Ok(id)
            }
            Err(err) => {
                error!(
                    "event=meeting_create module=dashboard status=error collection={collection} error={err}"
                );
                self.create_dialog_open = true;
                Err(err.into())
            }
        }
    }

    // ---- content editor ----------------------------------------------------

    /// Replaces the editor buffer.
    pub fn set_editor_content(&mut self, markdown: impl Into<String>) -> DashboardResult<()> {
        let from = self.mode();
        let session = self.view.editor_mut().ok_or(DashboardError::InvalidTransition {
            from,
            action: "set_editor_content",
        })?;
        session.buffer = markdown.into();
        session.dirty = true;
        Ok(())
    }

    /// Applies one toolbar action to the editor buffer.
    pub fn apply_format(
        &mut self,
        action: FormatAction,
        selection: Range<usize>,
    ) -> DashboardResult<Range<usize>> {
        let from = self.mode();
        let session = self.view.editor_mut().ok_or(DashboardError::InvalidTransition {
            from,
            action: "apply_format",
        })?;
        let selection = apply_format(&mut session.buffer, selection, action);
        session.dirty = true;
        Ok(selection)
    }

    /// Saves the editor buffer of the meeting being edited.
    pub fn save_editor(&mut self) -> DashboardResult<()> {
        let Some(session) = self.view.editor() else {
            return Err(self.invalid("save"));
        };
        let (id, markdown) = (session.meeting_id.clone(), session.buffer.clone());
        self.save_content(&id, markdown)
    }

    /// Replaces only the content of `id`.
    ///
    /// On success an editor open on `id` switches to `Viewing`.
    pub fn save_content(&mut self, id: &str, markdown: impl Into<String>) -> DashboardResult<()> {
        let patch = MeetingPatch::content(markdown);
        let content_len = patch.content.as_deref().map_or(0, str::len);
        let collection = self.config.collection.as_str();
        match self.store.update_partial(collection, id, &patch) {
            Ok(()) => {
                info!(
                    "event=meeting_save module=dashboard status=ok collection={collection} id={id} content_len={content_len}"
                );
                if self.view.editor().is_some_and(|s| s.meeting_id == id) {
                    self.view = ViewState::Viewing(id.to_string());
                }
                self.poll_snapshots();
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=meeting_save module=dashboard status=error collection={collection} id={id} error={err}"
                );
                Err(err.into())
            }
        }
    }

    // ---- inline grid edit --------------------------------------------------

    /// Opens the inline editor on `id`, replacing any open one.
    pub fn begin_inline_edit(&mut self, id: &str) -> DashboardResult<()> {
        let meeting = self
            .meeting(id)
            .ok_or_else(|| DashboardError::MeetingNotFound(id.to_string()))?;
        self.inline_edit = Some(InlineEdit::from_meeting(meeting));
        Ok(())
    }

    pub fn set_inline_field(
        &mut self,
        field: MeetingField,
        value: impl Into<String>,
    ) -> DashboardResult<()> {
        let edit = self
            .inline_edit
            .as_mut()
            .ok_or(DashboardError::NoInlineEdit)?;
        edit.set(field, value);
        Ok(())
    }

    pub fn cancel_inline_edit(&mut self) {
        self.inline_edit = None;
    }

    /// Sends the changed inline fields. Nothing changed just closes the editor.
    pub fn commit_inline_edit(&mut self) -> DashboardResult<()> {
        let edit = self
            .inline_edit
            .as_ref()
            .ok_or(DashboardError::NoInlineEdit)?;
        let id = edit.meeting_id.clone();
        let patch = edit.changes_from(self.meeting(&id));
        if patch.is_empty() {
            self.inline_edit = None;
            return Ok(());
        }
        self.update_meeting(&id, &patch)
    }

    /// Replaces the fields present in `patch`. Clears the inline editor on success.
    pub fn update_meeting(&mut self, id: &str, patch: &MeetingPatch) -> DashboardResult<()> {
        if patch.is_empty() {
            return Err(DashboardError::EmptyPatch);
        }
        let collection = self.config.collection.as_str();
        match self.store.update_partial(collection, id, patch) {
            Ok(()) => {
                info!(
                    "event=meeting_update module=dashboard status=ok collection={collection} id={id} fields={}",
                    patch.field_names().join(",")
                );
                self.inline_edit = None;
                self.poll_snapshots();
                Ok(())
            }
            Err(err) => {
                error!(
                    "event=meeting_update module=dashboard status=error collection={collection} id={id} error={err}"
                );
                Err(err.into())
            }
        }
    }

    // ---- delete ------------------------------------------------------------

    /// Marks `id` for deletion and opens the confirmation prompt.
    pub fn request_delete(&mut self, id: impl Into<MeetingId>) {
        let id = id.into();
        if self.meeting(&id).is_none() {
            warn!("event=meeting_delete_request module=dashboard status=ok id={id} listed=false");
        }
        self.pending_delete = Some(id);
    }

    /// Closes the prompt without contacting the store.
    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    /// Deletes the pending target. On success returns to `Grid`.
    pub fn confirm_delete(&mut self) -> DashboardResult<MeetingId> {
        let id = self
            .pending_delete
            .clone()
            .ok_or(DashboardError::NoPendingDelete)?;
        let collection = self.config.collection.as_str();
        match self.store.delete(collection, &id) {
            Ok(()) => {
                info!("event=meeting_delete module=dashboard status=ok collection={collection} id={id}");
                self.view = ViewState::Grid;
                self.pending_delete = None;
                if self
                    .inline_edit
                    .as_ref()
                    .is_some_and(|edit| edit.meeting_id == id)
                {
                    self.inline_edit = None;
                }
                self.poll_snapshots();
                Ok(id)
            }
            Err(err) => {
                error!(
                    "event=meeting_delete module=dashboard status=error collection={collection} id={id} error={err}"
                );
                Err(err.into())
            }
        }
    }

    fn require_mode(&self, expected: ViewMode, action: &'static str) -> DashboardResult<()> {
        if self.mode() == expected {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &'static str) -> DashboardError {
        DashboardError::InvalidTransition {
            from: self.mode(),
            action,
        }
    }
}
