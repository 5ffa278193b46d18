//! Wire representation of a meeting
//!
//! The remote store keeps meetings as flat snake_case rows with a nested
//! `settings` object. `MeetingRecord` mirrors that row; the conversions below
//! are the only place the two shapes meet.

use crate::domain::meeting::{Meeting, MeetingKind, MeetingSettings, MeetingStatus};
use crate::domain::shared::error::DomainError;
use crate::domain::shared::value_objects::{MeetingId, RoomCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingRecord {
    pub id: Uuid,
    pub room_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub meeting_type: String,
    pub scheduled_start_time: DateTime<Utc>,
    pub scheduled_end_time: DateTime<Utc>,
    pub host_id: String,
    pub host_name: String,
    pub attendee_limit: i32,
    pub current_attendees: i32,
    #[serde(default)]
    pub joined_user_ids: Option<Vec<String>>,
    pub is_public: bool,
    pub is_started: bool,
    pub is_active: bool,
    pub is_ended: bool,
    #[serde(default)]
    pub actual_start_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration: Option<i64>,
    #[serde(default)]
    pub settings: SettingsRecord,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsRecord {
    pub enable_screen_share: bool,
    pub enable_recording: bool,
    pub enable_chat: bool,
    pub enable_transcription: bool,
    pub auto_mute_participants: bool,
    pub enable_waiting_room: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        SettingsRecord::from(MeetingSettings::default())
    }
}

impl From<MeetingSettings> for SettingsRecord {
    fn from(settings: MeetingSettings) -> Self {
        Self {
            enable_screen_share: settings.screen_share,
            enable_recording: settings.recording,
            enable_chat: settings.chat,
            enable_transcription: settings.transcription,
            auto_mute_participants: settings.auto_mute,
            enable_waiting_room: settings.waiting_room,
        }
    }
}

impl From<SettingsRecord> for MeetingSettings {
    fn from(record: SettingsRecord) -> Self {
        Self {
            screen_share: record.enable_screen_share,
            recording: record.enable_recording,
            chat: record.enable_chat,
            transcription: record.enable_transcription,
            auto_mute: record.auto_mute_participants,
            waiting_room: record.enable_waiting_room,
        }
    }
}

impl From<&Meeting> for MeetingRecord {
    fn from(meeting: &Meeting) -> Self {
        Self {
            id: meeting.id.as_uuid(),
            room_id: meeting.room_id.as_str().to_string(),
            title: meeting.title.clone(),
            description: Some(meeting.description.clone()),
            meeting_type: meeting.kind.as_str().to_string(),
            scheduled_start_time: meeting.scheduled_start,
            scheduled_end_time: meeting.scheduled_end,
            host_id: meeting.host_id.clone(),
            host_name: meeting.host_name.clone(),
            attendee_limit: to_i32(meeting.attendee_limit),
            current_attendees: to_i32(meeting.current_attendees),
            joined_user_ids: Some(meeting.joined_user_ids.clone()),
            is_public: meeting.is_public,
            is_started: meeting.is_started(),
            is_active: meeting.is_active(),
            is_ended: meeting.is_ended(),
            actual_start_time: meeting.actual_start_time,
            actual_end_time: meeting.actual_end_time,
            duration: meeting.duration,
            settings: meeting.settings.into(),
            created_at: meeting.created_at,
            updated_at: meeting.updated_at,
        }
    }
}

impl TryFrom<MeetingRecord> for Meeting {
    type Error = DomainError;

    fn try_from(record: MeetingRecord) -> Result<Self, Self::Error> {
        let kind = MeetingKind::parse(&record.meeting_type)?;
        let attendee_limit = u32::try_from(record.attendee_limit)
            .ok()
            .filter(|limit| *limit >= 1)
            .ok_or_else(|| {
                DomainError::ValidationError(format!(
                    "Invalid attendee_limit {} for meeting {}",
                    record.attendee_limit, record.id
                ))
            })?;
        let current_attendees = u32::try_from(record.current_attendees).unwrap_or(0);
        let status = MeetingStatus::from_flags(record.is_started, record.is_active, record.is_ended);
        let (actual_end_time, duration) = match status {
            // an ended row always carries an end time and a final duration
            MeetingStatus::Ended => {
                let end = record.actual_end_time.unwrap_or(record.updated_at);
                let duration = record.duration.unwrap_or_else(|| {
                    record
                        .actual_start_time
                        .map(|start| (end - start).num_seconds().max(0))
                        .unwrap_or(0)
                });
                (Some(end), Some(duration))
            }
            MeetingStatus::Live => (None, record.duration),
            MeetingStatus::Scheduled => (None, None),
        };

        Ok(Meeting {
            id: MeetingId::from_uuid(record.id),
            room_id: RoomCode::new(record.room_id),
            title: record.title,
            description: record.description.unwrap_or_default(),
            kind,
            scheduled_start: record.scheduled_start_time,
            scheduled_end: record.scheduled_end_time,
            host_id: record.host_id,
            host_name: record.host_name,
            attendee_limit,
            current_attendees: current_attendees.min(attendee_limit),
            joined_user_ids: dedup(record.joined_user_ids.unwrap_or_default()),
            is_public: record.is_public,
            status,
            actual_start_time: record.actual_start_time,
            actual_end_time,
            duration,
            settings: record.settings.into(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn dedup(ids: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}
