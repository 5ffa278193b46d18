//! Shared kernel - Common types and utilities used across the meeting context

pub mod clock;
pub mod error;
pub mod events;
pub mod value_objects;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{DomainError, Result};
pub use value_objects::*;
