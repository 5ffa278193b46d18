/// Write-behind queue between the meeting registry and its persistence gateway
///
/// Remote writes are queued on an unbounded channel and applied by a single
/// background task, in the order they were queued. Callers never wait for a
/// write; failures are logged and counted, and never touch local state.
use crate::config::SyncConfig;
use crate::domain::meeting::{GatewayError, Meeting, MeetingGateway};
use crate::domain::shared::value_objects::MeetingId;
use crate::infrastructure::metrics;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// How failed remote writes are retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Give up after the first failure
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            initial_backoff: Duration::ZERO,
        }
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

impl From<&SyncConfig> for RetryPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

#[derive(Debug)]
enum SyncOp {
    Upsert(Box<Meeting>),
    Delete(MeetingId),
    Flush(oneshot::Sender<()>),
}

/// Handle to the write-behind worker
#[derive(Clone)]
pub struct WriteBehind {
    tx: mpsc::UnboundedSender<SyncOp>,
}

impl WriteBehind {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(gateway: Arc<dyn MeetingGateway>, policy: RetryPolicy) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(gateway, policy, rx));
        Self { tx }
    }

    /// Queue an insert-or-replace of `meeting`
    pub fn upsert(&self, meeting: Meeting) {
        self.enqueue(SyncOp::Upsert(Box::new(meeting)));
    }

    /// Queue a remote delete
    pub fn delete(&self, id: MeetingId) {
        self.enqueue(SyncOp::Delete(id));
    }

    /// Wait until everything queued before this call has been attempted
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.enqueue(SyncOp::Flush(ack_tx));
        if ack_rx.await.is_err() {
            warn!("Write-behind worker stopped before flush completed");
        }
    }

    fn enqueue(&self, op: SyncOp) {
        if let Err(e) = self.tx.send(op) {
            warn!("Write-behind worker is gone, dropping {:?}", e.0);
        }
    }
}

async fn run(
    gateway: Arc<dyn MeetingGateway>,
    policy: RetryPolicy,
    mut rx: mpsc::UnboundedReceiver<SyncOp>,
) {
    while let Some(op) = rx.recv().await {
        match op {
            SyncOp::Upsert(meeting) => {
                apply(&policy, "upsert", meeting.id, || {
                    let gateway = gateway.clone();
                    let meeting = meeting.clone();
                    async move { gateway.upsert(&meeting).await }
                })
                .await;
            }
            SyncOp::Delete(id) => {
                apply(&policy, "delete", id, || {
                    let gateway = gateway.clone();
                    async move { gateway.delete(id).await }
                })
                .await;
            }
            SyncOp::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }
    debug!("Write-behind worker stopped");
}

/// Each attempt runs on its own task so a panicking gateway fails that
/// write only and the worker keeps draining the queue.
async fn apply<F, Fut>(policy: &RetryPolicy, op: &str, id: MeetingId, mut attempt_write: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(), GatewayError>> + Send + 'static,
{
    let mut attempt = 0;
    loop {
        let outcome = match tokio::spawn(attempt_write()).await {
            Ok(outcome) => outcome,
            Err(e) => Err(GatewayError::Unavailable(format!("write task failed: {}", e))),
        };
        match outcome {
            Ok(()) => {
                debug!("Synced {} of meeting {}", op, id);
                return;
            }
            Err(e) if attempt < policy.max_retries => {
                let delay = policy.backoff(attempt);
                warn!(
                    "Failed to {} meeting {} (attempt {}): {}; retrying in {:?}",
                    op,
                    id,
                    attempt + 1,
                    e,
                    delay
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                warn!("Failed to {} meeting {}: {}; local state kept", op, id, e);
                metrics::record_sync_failure(op);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::meeting::gateway::MockMeetingGateway;
    use crate::domain::meeting::{MeetingDraft, MeetingKind, MeetingSettings};
    use crate::domain::shared::value_objects::RoomCode;
    use chrono::Utc;
    use std::sync::Mutex;

    fn meeting(title: &str) -> Meeting {
        let now = Utc::now();
        Meeting::schedule(
            MeetingDraft {
                title: title.to_string(),
                description: String::new(),
                kind: MeetingKind::Group,
                scheduled_start: now,
                scheduled_end: now,
                host_id: "host".to_string(),
                host_name: "Host".to_string(),
                attendee_limit: None,
                is_public: false,
                settings: MeetingSettings::default(),
            },
            RoomCode::generate(),
            10,
            now,
        )
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            initial_backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.backoff(0), Duration::from_millis(100));
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_writes_applied_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut gateway = MockMeetingGateway::new();

        let upserts = seen.clone();
        gateway.expect_upsert().times(2).returning(move |m| {
            upserts.lock().unwrap().push(format!("upsert:{}", m.title));
            Ok(())
        });
        let deletes = seen.clone();
        gateway.expect_delete().times(1).returning(move |_| {
            deletes.lock().unwrap().push("delete".to_string());
            Ok(())
        });

        let queue = WriteBehind::spawn(Arc::new(gateway), RetryPolicy::none());
        let first = meeting("first");
        queue.upsert(first.clone());
        queue.upsert(meeting("second"));
        queue.delete(first.id);
        queue.flush().await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["upsert:first", "upsert:second", "delete"]
        );
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = Arc::new(Mutex::new(0u32));
        let mut gateway = MockMeetingGateway::new();

        let counter = calls.clone();
        gateway.expect_upsert().times(3).returning(move |_| {
            let mut n = counter.lock().unwrap();
            *n += 1;
            if *n < 3 {
                Err(GatewayError::Unavailable("offline".to_string()))
            } else {
                Ok(())
            }
        });

        let policy = RetryPolicy {
            max_retries: 5,
            initial_backoff: Duration::from_millis(1),
        };
        let queue = WriteBehind::spawn(Arc::new(gateway), policy);
        queue.upsert(meeting("flaky"));
        queue.flush().await;

        assert_eq!(*calls.lock().unwrap(), 3);
    }

    /// Records upsert titles and panics on the title `boom`
    #[derive(Default)]
    struct ExplodingGateway {
        upserted: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl MeetingGateway for ExplodingGateway {
        async fn load_all(&self) -> Result<Vec<Meeting>, GatewayError> {
            Ok(Vec::new())
        }

        async fn upsert(&self, meeting: &Meeting) -> Result<(), GatewayError> {
            if meeting.title == "boom" {
                panic!("gateway bug");
            }
            self.upserted.lock().unwrap().push(meeting.title.clone());
            Ok(())
        }

        async fn delete(&self, _id: MeetingId) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panicking_write_does_not_stop_worker() {
        let gateway = Arc::new(ExplodingGateway::default());
        let queue = WriteBehind::spawn(gateway.clone(), RetryPolicy::none());

        queue.upsert(meeting("before"));
        queue.upsert(meeting("boom"));
        queue.upsert(meeting("after"));
        queue.flush().await;

        assert_eq!(*gateway.upserted.lock().unwrap(), vec!["before", "after"]);
    }

    #[tokio::test]
    async fn test_failure_without_retry_is_dropped() {
        let mut gateway = MockMeetingGateway::new();
        gateway
            .expect_delete()
            .times(1)
            .returning(|_| Err(GatewayError::Unavailable("offline".to_string())));
        gateway.expect_upsert().times(1).returning(|_| Ok(()));

        let queue = WriteBehind::spawn(Arc::new(gateway), RetryPolicy::none());
        queue.delete(MeetingId::new());
        queue.upsert(meeting("after failure"));
        queue.flush().await;
    }
}
