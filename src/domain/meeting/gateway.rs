//! Persistence gateway port

use super::entity::Meeting;
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::MeetingId;
use thiserror::Error;

/// Errors reported by a persistence gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Durable store for meeting records.
///
/// The manager never waits on these calls from a user-facing operation;
/// writes go through the write-behind queue.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MeetingGateway: Send + Sync {
    /// Load every stored meeting (called once at startup)
    async fn load_all(&self) -> Result<Vec<Meeting>, GatewayError>;

    /// Insert or replace a meeting
    async fn upsert(&self, meeting: &Meeting) -> Result<(), GatewayError>;

    /// Remove a meeting. Removing an unknown id is not an error.
    async fn delete(&self, id: MeetingId) -> Result<(), GatewayError>;
}
