/// In-memory meeting gateway
///
/// Keeps each meeting as the JSON document the remote store would hold,
/// so every write and load goes through the wire mapping.
use super::record::MeetingRecord;
use crate::domain::meeting::{GatewayError, Meeting, MeetingGateway};
use crate::domain::shared::value_objects::MeetingId;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Default)]
pub struct MemoryMeetingGateway {
    documents: RwLock<HashMap<Uuid, Value>>,
}

impl MemoryMeetingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store, e.g. with meetings from a previous session
    pub async fn with_meetings(meetings: &[Meeting]) -> Result<Self, GatewayError> {
        let gateway = Self::new();
        for meeting in meetings {
            gateway.upsert(meeting).await?;
        }
        Ok(gateway)
    }

    /// Stored wire record for `id`
    pub async fn record(&self, id: MeetingId) -> Option<MeetingRecord> {
        let documents = self.documents.read().await;
        documents
            .get(&id.as_uuid())
            .and_then(|doc| serde_json::from_value(doc.clone()).ok())
    }

    /// Number of stored meetings
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

#[async_trait]
impl MeetingGateway for MemoryMeetingGateway {
    async fn load_all(&self) -> Result<Vec<Meeting>, GatewayError> {
        let documents = self.documents.read().await;
        let mut meetings = Vec::with_capacity(documents.len());

        for (id, doc) in documents.iter() {
            let record: MeetingRecord = match serde_json::from_value(doc.clone()) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping unreadable meeting document {}: {}", id, e);
                    continue;
                }
            };
            match Meeting::try_from(record) {
                Ok(meeting) => meetings.push(meeting),
                Err(e) => warn!("Skipping stored meeting {}: {}", id, e),
            }
        }

        meetings.sort_by_key(|m| m.created_at);
        Ok(meetings)
    }

    async fn upsert(&self, meeting: &Meeting) -> Result<(), GatewayError> {
        let doc = serde_json::to_value(MeetingRecord::from(meeting))?;
        let mut documents = self.documents.write().await;
        documents.insert(meeting.id.as_uuid(), doc);
        debug!("Stored meeting {}", meeting.id);
        Ok(())
    }

    async fn delete(&self, id: MeetingId) -> Result<(), GatewayError> {
        let mut documents = self.documents.write().await;
        documents.remove(&id.as_uuid());
        debug!("Removed meeting {}", id);
        Ok(())
    }
}
