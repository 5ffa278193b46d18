//! Meeting bounded context

pub mod entity;
pub mod event;
pub mod gateway;
pub mod views;

pub use entity::{Meeting, MeetingDraft, MeetingKind, MeetingPatch, MeetingSettings, MeetingStatus};
pub use event::{MeetingEvent, MeetingEventKind};
pub use gateway::{GatewayError, MeetingGateway};
