//! Application layer - Use cases and application services
//!
//! This layer orchestrates domain objects to fulfill use cases:
//! - Owning the meeting registry and applying lifecycle transitions
//! - Enforcing capacity and single-live-meeting rules across meetings
//! - Writing applied mutations behind to persistence
//! - Publishing domain events

pub mod meeting_manager;
pub mod write_behind;

pub use meeting_manager::{JoinOutcome, JoinRejected, MeetingManager};
pub use write_behind::{RetryPolicy, WriteBehind};
