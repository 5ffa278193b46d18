//! Read-only views over a set of meetings
//!
//! Every function here is pure: it borrows the registry, clones the matching
//! records and sorts them. Nothing is cached.

use super::entity::Meeting;
use chrono::{DateTime, Utc};

/// Meetings whose scheduled start is still ahead, soonest first
pub fn upcoming(meetings: &[Meeting], now: DateTime<Utc>) -> Vec<Meeting> {
    let mut result: Vec<Meeting> = meetings
        .iter()
        .filter(|m| m.scheduled_start > now)
        .cloned()
        .collect();
    result.sort_by_key(|m| m.scheduled_start);
    result
}

/// Ended meetings, most recently finished first
pub fn past(meetings: &[Meeting]) -> Vec<Meeting> {
    let mut result: Vec<Meeting> = meetings.iter().filter(|m| m.is_ended()).cloned().collect();
    result.sort_by(|a, b| finished_at(b).cmp(&finished_at(a)));
    result
}

/// Live meetings, earliest started first
pub fn active(meetings: &[Meeting]) -> Vec<Meeting> {
    let mut result: Vec<Meeting> = meetings.iter().filter(|m| m.is_active()).cloned().collect();
    result.sort_by_key(started_at);
    result
}

/// The live meeting a user is currently in, if any
pub fn active_meeting_for_user(meetings: &[Meeting], user_id: &str) -> Option<Meeting> {
    meetings
        .iter()
        .filter(|m| m.is_active() && m.involves(user_id))
        .min_by_key(|m| started_at(m))
        .cloned()
}

/// Live meetings involving a user, most recently started first
pub fn ongoing_for_user(meetings: &[Meeting], user_id: &str) -> Vec<Meeting> {
    let mut result: Vec<Meeting> = meetings
        .iter()
        .filter(|m| m.is_active() && m.involves(user_id))
        .cloned()
        .collect();
    result.sort_by(|a, b| started_at(b).cmp(&started_at(a)));
    result
}

/// Every meeting a user hosts or has joined, by scheduled start
pub fn involving_user(meetings: &[Meeting], user_id: &str) -> Vec<Meeting> {
    let mut result: Vec<Meeting> = meetings
        .iter()
        .filter(|m| m.involves(user_id))
        .cloned()
        .collect();
    result.sort_by_key(|m| m.scheduled_start);
    result
}

/// Meetings hosted by a user, by scheduled start
pub fn hosted_by(meetings: &[Meeting], user_id: &str) -> Vec<Meeting> {
    let mut result: Vec<Meeting> = meetings
        .iter()
        .filter(|m| m.is_host(user_id))
        .cloned()
        .collect();
    result.sort_by_key(|m| m.scheduled_start);
    result
}

/// Lookup by room code
pub fn for_room<'a>(meetings: &'a [Meeting], room_code: &str) -> Option<&'a Meeting> {
    meetings.iter().find(|m| m.room_id.matches(room_code))
}

fn started_at(meeting: &Meeting) -> DateTime<Utc> {
    meeting.actual_start_time.unwrap_or(meeting.scheduled_start)
}

fn finished_at(meeting: &Meeting) -> DateTime<Utc> {
    meeting.actual_end_time.unwrap_or(meeting.scheduled_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::meeting::entity::{MeetingDraft, MeetingKind, MeetingSettings};
    use crate::domain::shared::value_objects::RoomCode;
    use chrono::Duration;

    fn at(now: DateTime<Utc>, offset_minutes: i64, host: &str) -> Meeting {
        let start = now + Duration::minutes(offset_minutes);
        let draft = MeetingDraft {
            title: format!("meeting at {}", offset_minutes),
            description: String::new(),
            kind: MeetingKind::Group,
            scheduled_start: start,
            scheduled_end: start + Duration::minutes(30),
            host_id: host.to_string(),
            host_name: host.to_string(),
            attendee_limit: Some(10),
            is_public: true,
            settings: MeetingSettings::default(),
        };
        Meeting::schedule(draft, RoomCode::generate(), 10, now)
    }

    #[test]
    fn test_upcoming_sorted_ascending() {
        let now = Utc::now();
        let later = at(now, 120, "h");
        let soon = at(now, 30, "h");
        let gone = at(now, -30, "h");
        let meetings = vec![later.clone(), gone, soon.clone()];

        let ids: Vec<_> = upcoming(&meetings, now).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![soon.id, later.id]);
    }

    #[test]
    fn test_past_sorted_by_end_descending() {
        let now = Utc::now();
        let mut first = at(now, -120, "h");
        let mut second = at(now, -60, "h");
        let mut never_started = at(now, -300, "h");
        first.start(now - Duration::minutes(120)).unwrap();
        first.end(now - Duration::minutes(90)).unwrap();
        second.start(now - Duration::minutes(60)).unwrap();
        second.end(now - Duration::minutes(10)).unwrap();
        never_started.end(now - Duration::minutes(200)).unwrap();
        let live = {
            let mut m = at(now, -5, "h");
            m.start(now - Duration::minutes(5)).unwrap();
            m
        };
        let meetings = vec![first.clone(), never_started.clone(), second.clone(), live];

        let ids: Vec<_> = past(&meetings).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id, first.id, never_started.id]);
    }

    #[test]
    fn test_active_and_user_lookups() {
        let now = Utc::now();
        let mut early = at(now, -40, "alice");
        let mut late = at(now, -10, "bob");
        early.start(now - Duration::minutes(40)).unwrap();
        late.start(now - Duration::minutes(10)).unwrap();
        late.admit(Some("alice"), now);
        let scheduled = at(now, 60, "alice");
        let meetings = vec![late.clone(), scheduled.clone(), early.clone()];

        let ids: Vec<_> = active(&meetings).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![early.id, late.id]);

        assert_eq!(active_meeting_for_user(&meetings, "alice").map(|m| m.id), Some(early.id));
        assert_eq!(active_meeting_for_user(&meetings, "bob").map(|m| m.id), Some(late.id));
        assert!(active_meeting_for_user(&meetings, "carol").is_none());

        let ongoing: Vec<_> = ongoing_for_user(&meetings, "alice")
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ongoing, vec![late.id, early.id]);

        let involved: Vec<_> = involving_user(&meetings, "alice")
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(involved, vec![early.id, late.id, scheduled.id]);

        let hosted: Vec<_> = hosted_by(&meetings, "alice").into_iter().map(|m| m.id).collect();
        assert_eq!(hosted, vec![early.id, scheduled.id]);
    }

    #[test]
    fn test_for_room() {
        let now = Utc::now();
        let m = at(now, 10, "h");
        let code = m.room_id.as_str().to_uppercase();
        let meetings = vec![m.clone()];

        assert_eq!(for_room(&meetings, &code).map(|found| found.id), Some(m.id));
        assert!(for_room(&meetings, "zzz-zzzz-zzz").is_none());
    }
}
