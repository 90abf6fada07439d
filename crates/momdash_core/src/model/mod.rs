//! Domain model for meeting minutes.
//!
//! # Responsibility
//! - Define the meeting record mirrored from the remote collection.
//! - Define write-side shapes (draft, insert fields, partial patch).
//!
//! # Invariants
//! - A meeting `id` is assigned by the store and never changes.
//! - A freshly created meeting always has empty `content`.

pub mod meeting;
