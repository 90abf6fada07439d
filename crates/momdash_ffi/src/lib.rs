//! Flutter-facing bindings for the meeting-minutes dashboard.

pub mod api;
