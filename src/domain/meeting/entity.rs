/// Meeting domain model
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::{MeetingId, RoomCode};
use crate::domain::shared::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Meeting kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingKind {
    OneOnOne,
    Group,
    Webinar,
}

impl MeetingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingKind::OneOnOne => "one-on-one",
            MeetingKind::Group => "group",
            MeetingKind::Webinar => "webinar",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "one-on-one" => Ok(MeetingKind::OneOnOne),
            "group" => Ok(MeetingKind::Group),
            "webinar" => Ok(MeetingKind::Webinar),
            other => Err(DomainError::ValidationError(format!(
                "Unknown meeting type: {}",
                other
            ))),
        }
    }
}

/// Meeting lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MeetingStatus {
    /// Created, not started yet
    Scheduled,
    /// Started and not ended
    Live,
    /// Terminal
    Ended,
}

impl MeetingStatus {
    /// Check if state transition is valid
    pub fn can_transition_to(&self, next: MeetingStatus) -> bool {
        use MeetingStatus::*;

        matches!((self, next), (Scheduled, Live) | (Scheduled, Ended) | (Live, Ended))
    }

    /// Rebuild the state from the `is_started` / `is_active` / `is_ended` flags.
    /// `is_ended` wins over the others.
    pub fn from_flags(is_started: bool, is_active: bool, is_ended: bool) -> Self {
        if is_ended {
            MeetingStatus::Ended
        } else if is_started || is_active {
            MeetingStatus::Live
        } else {
            MeetingStatus::Scheduled
        }
    }
}

/// In-call feature toggles. Passed through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSettings {
    pub screen_share: bool,
    pub recording: bool,
    pub chat: bool,
    pub transcription: bool,
    pub auto_mute: bool,
    pub waiting_room: bool,
}

impl Default for MeetingSettings {
    fn default() -> Self {
        Self {
            screen_share: true,
            recording: false,
            chat: true,
            transcription: false,
            auto_mute: false,
            waiting_room: false,
        }
    }
}

/// Input for scheduling a meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: MeetingKind,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub host_id: String,
    pub host_name: String,
    /// Falls back to the configured default for `kind`
    #[serde(default)]
    pub attendee_limit: Option<u32>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub settings: MeetingSettings,
}

/// Partial update of the mutable meeting fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub attendee_limit: Option<u32>,
    pub is_public: Option<bool>,
    pub settings: Option<MeetingSettings>,
}

/// Meeting record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    pub id: MeetingId,
    pub room_id: RoomCode,
    pub title: String,
    pub description: String,
    pub kind: MeetingKind,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub host_id: String,
    pub host_name: String,
    pub attendee_limit: u32,
    pub current_attendees: u32,
    /// Members other than the host, in join order
    pub joined_user_ids: Vec<String>,
    pub is_public: bool,
    pub status: MeetingStatus,
    pub actual_start_time: Option<DateTime<Utc>>,
    pub actual_end_time: Option<DateTime<Utc>>,
    /// Seconds
    pub duration: Option<i64>,
    pub settings: MeetingSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    /// Build a freshly scheduled meeting from a draft
    pub fn schedule(
        draft: MeetingDraft,
        room_id: RoomCode,
        default_limit: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: MeetingId::new(),
            room_id,
            title: draft.title,
            description: draft.description,
            kind: draft.kind,
            scheduled_start: draft.scheduled_start,
            scheduled_end: draft.scheduled_end,
            host_id: draft.host_id,
            host_name: draft.host_name,
            attendee_limit: draft.attendee_limit.unwrap_or(default_limit).max(1),
            current_attendees: 0,
            joined_user_ids: Vec::new(),
            is_public: draft.is_public,
            status: MeetingStatus::Scheduled,
            actual_start_time: None,
            actual_end_time: None,
            duration: None,
            settings: draft.settings,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_started(&self) -> bool {
        self.status != MeetingStatus::Scheduled
    }

    pub fn is_active(&self) -> bool {
        self.status == MeetingStatus::Live
    }

    pub fn is_ended(&self) -> bool {
        self.status == MeetingStatus::Ended
    }

    pub fn is_full(&self) -> bool {
        self.current_attendees >= self.attendee_limit
    }

    pub fn is_host(&self, user_id: &str) -> bool {
        self.host_id == user_id
    }

    pub fn has_member(&self, user_id: &str) -> bool {
        self.joined_user_ids.iter().any(|id| id == user_id)
    }

    /// Host or joined member
    pub fn involves(&self, user_id: &str) -> bool {
        self.is_host(user_id) || self.has_member(user_id)
    }

    /// Merge a patch into the record
    pub fn apply(&mut self, patch: MeetingPatch, now: DateTime<Utc>) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(start) = patch.scheduled_start {
            self.scheduled_start = start;
        }
        if let Some(end) = patch.scheduled_end {
            self.scheduled_end = end;
        }
        if let Some(limit) = patch.attendee_limit {
            // never below the people already in the room
            self.attendee_limit = limit.max(self.current_attendees).max(1);
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(settings) = patch.settings {
            self.settings = settings;
        }
        self.updated_at = now;
    }

    /// Scheduled -> Live
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.transition_to(MeetingStatus::Live)?;
        self.actual_start_time = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Scheduled | Live -> Ended. Returns the final duration in seconds.
    pub fn end(&mut self, now: DateTime<Utc>) -> Result<i64> {
        self.transition_to(MeetingStatus::Ended)?;
        let duration = self
            .actual_start_time
            .map(|start| whole_seconds(start, now))
            .unwrap_or(0);

        self.actual_end_time = Some(now);
        self.duration = Some(duration);
        self.updated_at = now;
        Ok(duration)
    }

    /// Recompute the running duration of a live meeting
    pub fn refresh_duration(&mut self, now: DateTime<Utc>) -> Option<i64> {
        if !self.is_active() {
            return None;
        }
        let start = self.actual_start_time?;
        let duration = whole_seconds(start, now);
        self.duration = Some(duration);
        Some(duration)
    }

    /// Count one more attendee. Capacity and membership checks are the caller's.
    pub fn admit(&mut self, user_id: Option<&str>, now: DateTime<Utc>) {
        self.current_attendees += 1;
        if let Some(user_id) = user_id {
            self.joined_user_ids.push(user_id.to_string());
        }
        self.updated_at = now;
    }

    /// Count one attendee out and drop the user from the member list
    pub fn release(&mut self, user_id: Option<&str>, now: DateTime<Utc>) {
        self.current_attendees = self.current_attendees.saturating_sub(1);
        if let Some(user_id) = user_id {
            self.joined_user_ids.retain(|id| id != user_id);
        }
        self.updated_at = now;
    }

    fn transition_to(&mut self, next: MeetingStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidStateTransition(format!(
                "Cannot transition meeting {} from {:?} to {:?}",
                self.id, self.status, next
            )));
        }

        self.status = next;
        Ok(())
    }
}

fn whole_seconds(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_seconds().max(0)
}
