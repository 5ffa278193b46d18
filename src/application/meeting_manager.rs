/// Meeting Manager for the meeting registry and lifecycle
///
/// Owns the in-memory registry, enforces capacity and one-live-meeting-per-user,
/// and writes every applied mutation behind to the persistence gateway.
/// Local state is authoritative; the gateway catches up eventually.
use crate::application::write_behind::{RetryPolicy, WriteBehind};
use crate::config::{Config, MeetingConfig};
use crate::domain::meeting::{
    views, Meeting, MeetingDraft, MeetingEvent, MeetingEventKind, MeetingGateway, MeetingPatch,
};
use crate::domain::shared::clock::{Clock, SystemClock};
use crate::domain::shared::value_objects::{MeetingId, RoomCode};
use crate::infrastructure::metrics;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Successful join
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Counted in as a new attendee
    Joined,
    /// Host or existing member; nothing changed
    AlreadyPresent,
}

/// Why a join was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinRejected {
    #[error("Meeting not found")]
    NotFound,

    #[error("Meeting is full")]
    CapacityExceeded,

    #[error("User is already in meeting {0}")]
    ActiveElsewhere(MeetingId),
}

impl JoinRejected {
    fn label(&self) -> &'static str {
        match self {
            JoinRejected::NotFound => "not_found",
            JoinRejected::CapacityExceeded => "full",
            JoinRejected::ActiveElsewhere(_) => "active_elsewhere",
        }
    }
}

/// Meeting registry with write-behind persistence
pub struct MeetingManager {
    /// Registry in creation order
    meetings: RwLock<Vec<Meeting>>,
    gateway: Arc<dyn MeetingGateway>,
    sync: WriteBehind,
    clock: Arc<dyn Clock>,
    defaults: MeetingConfig,
    events: broadcast::Sender<MeetingEvent>,
}

impl MeetingManager {
    /// Create a manager on the wall clock.
    ///
    /// Spawns the write-behind worker, so it must run inside a tokio runtime.
    pub fn new(gateway: Arc<dyn MeetingGateway>, config: &Config) -> Self {
        Self::with_clock(gateway, Arc::new(SystemClock), config)
    }

    /// Create a manager on an explicit clock
    pub fn with_clock(
        gateway: Arc<dyn MeetingGateway>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let sync = WriteBehind::spawn(gateway.clone(), RetryPolicy::from(&config.sync));
        let (events, _) = broadcast::channel(config.meetings.event_capacity);

        Self {
            meetings: RwLock::new(Vec::new()),
            gateway,
            sync,
            clock,
            defaults: config.meetings.clone(),
            events,
        }
    }

    /// Replace the registry with whatever the gateway has stored.
    ///
    /// A failed load is logged and leaves the registry as it was.
    pub async fn hydrate(&self) -> usize {
        match self.gateway.load_all().await {
            Ok(loaded) => {
                let mut meetings = self.meetings.write().await;
                *meetings = loaded;
                metrics::update_active_meetings(count_active(&meetings));
                info!("Loaded {} meetings from persistence", meetings.len());
                meetings.len()
            }
            Err(e) => {
                warn!("Failed to load meetings, starting with an empty registry: {}", e);
                0
            }
        }
    }

    /// Subscribe to meeting events
    pub fn subscribe(&self) -> broadcast::Receiver<MeetingEvent> {
        self.events.subscribe()
    }

    /// Wait for every remote write queued so far
    pub async fn flush(&self) {
        self.sync.flush().await;
    }

    /// Schedule a new meeting
    pub async fn create(&self, draft: MeetingDraft) -> Meeting {
        let now = self.clock.now();
        let default_limit = self.defaults.default_limit(draft.kind);

        let mut meetings = self.meetings.write().await;
        let room_id = unique_room_code(&meetings);
        let meeting = Meeting::schedule(draft, room_id, default_limit, now);
        meetings.push(meeting.clone());
        // queued and published under the lock so both follow mutation order
        self.sync.upsert(meeting.clone());
        self.publish(meeting.id, MeetingEventKind::Created, now);
        drop(meetings);

        info!(
            "Created meeting {} ({}) in room {}",
            meeting.id, meeting.title, meeting.room_id
        );
        metrics::record_meeting_created();
        meeting
    }

    /// Merge `patch` into a meeting. Unknown ids are ignored.
    pub async fn update(&self, id: MeetingId, patch: MeetingPatch) -> Option<Meeting> {
        let now = self.clock.now();
        let mut meetings = self.meetings.write().await;
        let meeting = find_mut(&mut meetings, id)?;

        meeting.apply(patch, now);
        let updated = meeting.clone();
        self.sync.upsert(updated.clone());
        self.publish(id, MeetingEventKind::Updated, now);
        drop(meetings);

        debug!("Updated meeting {}", id);
        Some(updated)
    }

    /// Remove a meeting. The remote delete is queued even if the id is unknown locally.
    pub async fn delete(&self, id: MeetingId) -> Option<Meeting> {
        let now = self.clock.now();
        let mut meetings = self.meetings.write().await;
        let removed = meetings
            .iter()
            .position(|m| m.id == id)
            .map(|index| meetings.remove(index));
        self.sync.delete(id);
        if removed.is_some() {
            self.publish(id, MeetingEventKind::Deleted, now);
        }
        metrics::update_active_meetings(count_active(&meetings));
        drop(meetings);

        if removed.is_some() {
            info!("Deleted meeting {}", id);
        } else {
            debug!("Delete of unknown meeting {}", id);
        }
        removed
    }

    /// Get meeting by ID
    pub async fn get(&self, id: MeetingId) -> Option<Meeting> {
        let meetings = self.meetings.read().await;
        meetings.iter().find(|m| m.id == id).cloned()
    }

    /// Get meeting by room code
    pub async fn get_by_room_id(&self, room_code: &str) -> Option<Meeting> {
        let meetings = self.meetings.read().await;
        views::for_room(&meetings, room_code).cloned()
    }

    /// Every meeting, in creation order
    pub async fn list(&self) -> Vec<Meeting> {
        self.meetings.read().await.clone()
    }

    /// Scheduled -> Live.
    ///
    /// Starting a live meeting does nothing; starting an ended one is refused
    /// with a warning. Returns the record as it stands afterwards.
    pub async fn start(&self, id: MeetingId) -> Option<Meeting> {
        let now = self.clock.now();
        let mut meetings = self.meetings.write().await;
        let meeting = find_mut(&mut meetings, id)?;

        if meeting.is_active() {
            debug!("Meeting {} is already live", id);
            return Some(meeting.clone());
        }
        if let Err(e) = meeting.start(now) {
            warn!("Ignoring start of meeting {}: {}", id, e);
            return Some(meeting.clone());
        }

        let started = meeting.clone();
        self.sync.upsert(started.clone());
        self.publish(id, MeetingEventKind::Started, now);
        metrics::update_active_meetings(count_active(&meetings));
        drop(meetings);

        info!("Meeting {} started", id);
        metrics::record_meeting_started();
        Some(started)
    }

    /// Scheduled | Live -> Ended, fixing the final duration.
    ///
    /// Ending an ended meeting is refused with a warning and keeps the
    /// original end time.
    pub async fn end(&self, id: MeetingId) -> Option<Meeting> {
        let now = self.clock.now();
        let mut meetings = self.meetings.write().await;
        let meeting = find_mut(&mut meetings, id)?;

        let duration_secs = match meeting.end(now) {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Ignoring end of meeting {}: {}", id, e);
                return Some(meeting.clone());
            }
        };

        let ended = meeting.clone();
        self.sync.upsert(ended.clone());
        self.publish(id, MeetingEventKind::Ended { duration_secs }, now);
        metrics::update_active_meetings(count_active(&meetings));
        drop(meetings);

        info!("Meeting {} ended after {}s", id, duration_secs);
        metrics::record_meeting_ended();
        Some(ended)
    }

    /// Recompute the elapsed time of a live meeting.
    ///
    /// Meant to be polled by the UI; the value is not written behind.
    pub async fn refresh_duration(&self, id: MeetingId) -> Option<i64> {
        let now = self.clock.now();
        let mut meetings = self.meetings.write().await;
        find_mut(&mut meetings, id)?.refresh_duration(now)
    }

    /// Join a meeting, optionally as a named user.
    ///
    /// Checks run in order: capacity, then whether the user is live in another
    /// meeting, then whether they are already in this one.
    pub async fn join(
        &self,
        id: MeetingId,
        user_id: Option<&str>,
    ) -> Result<JoinOutcome, JoinRejected> {
        let result = self.try_join(id, user_id).await;
        match &result {
            Ok(JoinOutcome::Joined) => metrics::record_join("joined"),
            Ok(JoinOutcome::AlreadyPresent) => metrics::record_join("already_present"),
            Err(rejected) => {
                debug!("Join of meeting {} by {:?} refused: {}", id, user_id, rejected);
                metrics::record_join(rejected.label());
            }
        }
        result
    }

    async fn try_join(
        &self,
        id: MeetingId,
        user_id: Option<&str>,
    ) -> Result<JoinOutcome, JoinRejected> {
        let now = self.clock.now();
        let mut meetings = self.meetings.write().await;

        let index = meetings
            .iter()
            .position(|m| m.id == id)
            .ok_or(JoinRejected::NotFound)?;

        if meetings[index].is_full() {
            return Err(JoinRejected::CapacityExceeded);
        }

        if let Some(user_id) = user_id {
            if let Some(current) = views::active_meeting_for_user(&meetings, user_id) {
                if current.id != id {
                    return Err(JoinRejected::ActiveElsewhere(current.id));
                }
            }
            if meetings[index].involves(user_id) {
                return Ok(JoinOutcome::AlreadyPresent);
            }
        }

        let meeting = &mut meetings[index];
        meeting.admit(user_id, now);
        self.sync.upsert(meeting.clone());
        let attendees = meeting.current_attendees;
        self.publish(
            id,
            MeetingEventKind::ParticipantJoined {
                user_id: user_id.map(str::to_string),
            },
            now,
        );
        drop(meetings);

        info!(
            "{} joined meeting {} ({} attendees)",
            user_id.unwrap_or("anonymous"),
            id,
            attendees
        );
        Ok(JoinOutcome::Joined)
    }

    /// Leave a meeting. Unknown ids are ignored.
    pub async fn leave(&self, id: MeetingId, user_id: Option<&str>) -> Option<Meeting> {
        let now = self.clock.now();
        let mut meetings = self.meetings.write().await;
        let meeting = find_mut(&mut meetings, id)?;

        meeting.release(user_id, now);
        let updated = meeting.clone();
        self.sync.upsert(updated.clone());
        self.publish(
            id,
            MeetingEventKind::ParticipantLeft {
                user_id: user_id.map(str::to_string),
            },
            now,
        );
        drop(meetings);

        info!(
            "{} left meeting {} ({} attendees)",
            user_id.unwrap_or("anonymous"),
            id,
            updated.current_attendees
        );
        Some(updated)
    }

    /// Meetings that have not reached their scheduled start
    pub async fn upcoming(&self) -> Vec<Meeting> {
        let now = self.clock.now();
        views::upcoming(&self.meetings.read().await, now)
    }

    /// Ended meetings, most recent first
    pub async fn past(&self) -> Vec<Meeting> {
        views::past(&self.meetings.read().await)
    }

    /// Live meetings, earliest started first
    pub async fn active(&self) -> Vec<Meeting> {
        views::active(&self.meetings.read().await)
    }

    pub async fn active_meeting_for_user(&self, user_id: &str) -> Option<Meeting> {
        views::active_meeting_for_user(&self.meetings.read().await, user_id)
    }

    pub async fn ongoing_for_user(&self, user_id: &str) -> Vec<Meeting> {
        views::ongoing_for_user(&self.meetings.read().await, user_id)
    }

    pub async fn meetings_for_user(&self, user_id: &str) -> Vec<Meeting> {
        views::involving_user(&self.meetings.read().await, user_id)
    }

    pub async fn hosted_by(&self, user_id: &str) -> Vec<Meeting> {
        views::hosted_by(&self.meetings.read().await, user_id)
    }

    fn publish(&self, meeting_id: MeetingId, kind: MeetingEventKind, now: DateTime<Utc>) {
        // no subscribers is fine
        let _ = self.events.send(MeetingEvent::new(meeting_id, kind, now));
    }
}

fn find_mut(meetings: &mut [Meeting], id: MeetingId) -> Option<&mut Meeting> {
    meetings.iter_mut().find(|m| m.id == id)
}

fn count_active(meetings: &[Meeting]) -> usize {
    meetings.iter().filter(|m| m.is_active()).count()
}

fn unique_room_code(meetings: &[Meeting]) -> RoomCode {
    loop {
        let code = RoomCode::generate();
        if !meetings.iter().any(|m| m.room_id == code) {
            return code;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::meeting::gateway::MockMeetingGateway;
    use crate::domain::meeting::{GatewayError, MeetingKind, MeetingSettings};
    use crate::domain::shared::clock::ManualClock;
    use chrono::Duration;

    fn draft(host: &str, limit: u32) -> MeetingDraft {
        let start = Utc::now() + Duration::hours(1);
        MeetingDraft {
            title: "Planning".to_string(),
            description: "Quarterly planning".to_string(),
            kind: MeetingKind::Group,
            scheduled_start: start,
            scheduled_end: start + Duration::hours(1),
            host_id: host.to_string(),
            host_name: host.to_string(),
            attendee_limit: Some(limit),
            is_public: false,
            settings: MeetingSettings::default(),
        }
    }

    fn failing_gateway() -> MockMeetingGateway {
        let mut gateway = MockMeetingGateway::new();
        gateway
            .expect_load_all()
            .returning(|| Err(GatewayError::Unavailable("offline".to_string())));
        gateway
            .expect_upsert()
            .returning(|_| Err(GatewayError::Unavailable("offline".to_string())));
        gateway
            .expect_delete()
            .returning(|_| Err(GatewayError::Unavailable("offline".to_string())));
        gateway
    }

    #[tokio::test]
    async fn test_local_state_survives_gateway_failure() {
        let manager = MeetingManager::new(Arc::new(failing_gateway()), &Config::default());

        assert_eq!(manager.hydrate().await, 0);

        let meeting = manager.create(draft("host", 5)).await;
        assert!(manager.get(meeting.id).await.is_some());

        let patch = MeetingPatch {
            title: Some("Renamed".to_string()),
            ..Default::default()
        };
        manager.update(meeting.id, patch).await;
        manager.flush().await;

        assert_eq!(manager.get(meeting.id).await.unwrap().title, "Renamed");
    }

    #[tokio::test]
    async fn test_hydrate_replaces_registry() {
        let now = Utc::now();
        let stored = Meeting::schedule(draft("host", 5), RoomCode::generate(), 10, now);
        let stored_id = stored.id;

        let mut gateway = MockMeetingGateway::new();
        gateway
            .expect_load_all()
            .times(1)
            .returning(move || Ok(vec![stored.clone()]));

        let manager = MeetingManager::new(Arc::new(gateway), &Config::default());
        assert_eq!(manager.hydrate().await, 1);
        assert!(manager.get(stored_id).await.is_some());
    }

    #[tokio::test]
    async fn test_refresh_duration_is_not_written_behind() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let mut gateway = MockMeetingGateway::new();
        // create + start only
        gateway.expect_upsert().times(2).returning(|_| Ok(()));

        let manager = MeetingManager::with_clock(Arc::new(gateway), clock.clone(), &Config::default());
        let meeting = manager.create(draft("host", 5)).await;

        assert_eq!(manager.refresh_duration(meeting.id).await, None);

        manager.start(meeting.id).await;
        clock.advance(Duration::seconds(75));
        assert_eq!(manager.refresh_duration(meeting.id).await, Some(75));
        assert_eq!(manager.get(meeting.id).await.unwrap().duration, Some(75));
        manager.flush().await;
    }

    #[tokio::test]
    async fn test_default_limit_from_config() {
        let mut gateway = MockMeetingGateway::new();
        gateway.expect_upsert().returning(|_| Ok(()));
        let manager = MeetingManager::new(Arc::new(gateway), &Config::default());

        let mut one_on_one = draft("host", 5);
        one_on_one.kind = MeetingKind::OneOnOne;
        one_on_one.attendee_limit = None;

        let meeting = manager.create(one_on_one).await;
        assert_eq!(meeting.attendee_limit, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_events_follow_write_order_under_concurrency() {
        let written = Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut gateway = MockMeetingGateway::new();
        let sink = written.clone();
        gateway.expect_upsert().returning(move |m| {
            sink.lock().unwrap().push(m.id);
            Ok(())
        });

        let manager = Arc::new(MeetingManager::new(Arc::new(gateway), &Config::default()));
        let mut events = manager.subscribe();

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let manager = manager.clone();
                tokio::spawn(async move { manager.create(draft(&format!("host-{}", i), 5)).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        manager.flush().await;

        let mut published = Vec::new();
        while let Ok(event) = events.try_recv() {
            published.push(event.meeting_id);
        }
        assert_eq!(published.len(), 32);
        assert_eq!(published, *written.lock().unwrap());
    }
}
