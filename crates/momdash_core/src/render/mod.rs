//! Rendering of meeting content for display.
//!
//! # Invariants
//! - Parser output is never handed out unsanitized; callers only ever see
//!   [`markdown::SafeHtml`].

pub mod markdown;
