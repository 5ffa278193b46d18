//! MeetCore - Meeting lifecycle manager
//!
//! Keeps an in-memory registry of scheduled meetings, drives each meeting
//! through scheduled, live and ended, enforces attendee capacity and a single
//! live meeting per user, and writes every change behind to a persistence
//! gateway (in-memory or PostgreSQL).

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-export commonly used types
pub use application::{JoinOutcome, JoinRejected, MeetingManager};
pub use domain::meeting::{Meeting, MeetingDraft, MeetingKind, MeetingPatch, MeetingStatus};
pub use domain::shared::error::DomainError;
pub use domain::shared::error::Result;
