//! Persistence implementations

pub mod memory;
pub mod record;
#[cfg(feature = "postgres")]
pub mod database;
#[cfg(feature = "postgres")]
pub mod meeting_repository;

pub use memory::MemoryMeetingGateway;
pub use record::{MeetingRecord, SettingsRecord};
#[cfg(feature = "postgres")]
pub use database::{create_pool, run_migrations};
#[cfg(feature = "postgres")]
pub use meeting_repository::PgMeetingGateway;
