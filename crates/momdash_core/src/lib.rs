//! Core logic for the minutes-of-meeting dashboard.
//! This crate is the single source of truth for meeting records, the store
//! contract, markdown rendering and the dashboard view state machine.

pub mod config;
pub mod dashboard;
pub mod db;
pub mod logging;
pub mod model;
pub mod render;
pub mod store;

pub use config::{AppConfig, DashboardConfig};
pub use dashboard::controller::Dashboard;
pub use dashboard::screen::{
    CardView, CreateDialogView, DeletePromptView, EditorView, NotFoundView, Screen, ScreenBody,
    ViewerView,
};
pub use dashboard::toolbar::FormatAction;
pub use dashboard::view_state::{EditorSession, InlineEdit, ViewMode, ViewState};
pub use dashboard::{DashboardError, DashboardResult};
pub use logging::{
    default_log_level, flush_logging, init_logging, init_logging_from_config, logging_status,
};
pub use model::meeting::{
    DraftValidationError, Meeting, MeetingDraft, MeetingField, MeetingFields, MeetingId,
    MeetingPatch,
};
pub use render::markdown::{render_card_preview, render_markdown, visible_text, SafeHtml};
pub use store::{
    InMemoryMeetingStore, MeetingStore, Snapshot, SqliteMeetingStore, StoreError, StoreResult,
    Subscription, DEFAULT_COLLECTION,
};

/// Minimal health-check API for host integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
