//! Meeting domain events

use crate::domain::shared::events::{DomainEvent, EventMetadata};
use crate::domain::shared::value_objects::MeetingId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to a meeting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MeetingEventKind {
    Created,
    Updated,
    Deleted,
    Started,
    Ended { duration_secs: i64 },
    ParticipantJoined { user_id: Option<String> },
    ParticipantLeft { user_id: Option<String> },
}

impl MeetingEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            MeetingEventKind::Created => "meeting.created",
            MeetingEventKind::Updated => "meeting.updated",
            MeetingEventKind::Deleted => "meeting.deleted",
            MeetingEventKind::Started => "meeting.started",
            MeetingEventKind::Ended { .. } => "meeting.ended",
            MeetingEventKind::ParticipantJoined { .. } => "meeting.participant_joined",
            MeetingEventKind::ParticipantLeft { .. } => "meeting.participant_left",
        }
    }
}

/// Event published after a mutation has been applied to the registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeetingEvent {
    pub metadata: EventMetadata,
    pub meeting_id: MeetingId,
    pub kind: MeetingEventKind,
}

impl MeetingEvent {
    pub fn new(meeting_id: MeetingId, kind: MeetingEventKind, occurred_at: DateTime<Utc>) -> Self {
        Self {
            metadata: EventMetadata::at(kind.name(), occurred_at),
            meeting_id,
            kind,
        }
    }
}

impl DomainEvent for MeetingEvent {
    fn event_type(&self) -> &'static str {
        self.kind.name()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        self.metadata.occurred_at
    }
}
