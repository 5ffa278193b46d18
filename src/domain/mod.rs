//! Domain layer - Core business logic and rules
//!
//! This layer contains:
//! - Entities: the meeting record and its lifecycle rules
//! - Value Objects: identifiers and room codes
//! - Views: pure queries over the meeting registry
//! - Gateway Interfaces: ports for persistence
//! - Domain Events: things that happened to a meeting

pub mod meeting;
pub mod shared;

// Re-export commonly used types
pub use shared::{DomainError, Result};
