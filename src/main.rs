use chrono::{Duration, Utc};
use meetcore::application::MeetingManager;
use meetcore::config::{Config, PersistenceBackend};
use meetcore::domain::meeting::{MeetingDraft, MeetingGateway, MeetingKind, MeetingSettings};
use meetcore::infrastructure::metrics;
use meetcore::infrastructure::persistence::{MeetingRecord, MemoryMeetingGateway};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "postgres")]
use meetcore::infrastructure::persistence::{create_pool, run_migrations, PgMeetingGateway};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::var("MEETCORE_CONFIG").ok();
    let config = Config::load(config_path.as_deref())?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting MeetCore");
    info!("Configuration loaded: {:?}", config.persistence.backend);

    metrics::describe_metrics();

    let gateway = build_gateway(&config).await?;
    let manager = MeetingManager::new(gateway, &config);

    let restored = manager.hydrate().await;
    info!("Registry ready with {} meetings", restored);

    demo_meeting_lifecycle(&manager).await?;

    manager.flush().await;
    info!("MeetCore shut down cleanly");

    Ok(())
}

async fn build_gateway(config: &Config) -> anyhow::Result<Arc<dyn MeetingGateway>> {
    match config.persistence.backend {
        PersistenceBackend::Memory => {
            info!("Using in-memory persistence");
            Ok(Arc::new(MemoryMeetingGateway::new()))
        }
        #[cfg(feature = "postgres")]
        PersistenceBackend::Postgres => {
            info!("Initializing database connection...");
            let pool = create_pool(&config.persistence.database).await?;
            info!("Database connection pool created");

            info!("Running database migrations...");
            run_migrations(&pool).await?;
            info!("Database migrations completed");

            Ok(Arc::new(PgMeetingGateway::new(pool)))
        }
        #[cfg(not(feature = "postgres"))]
        PersistenceBackend::Postgres => {
            anyhow::bail!("postgres backend requested but the `postgres` feature is disabled")
        }
    }
}

/// Demo: walk one meeting through its whole lifecycle
async fn demo_meeting_lifecycle(manager: &MeetingManager) -> anyhow::Result<()> {
    info!("=== Demo: Meeting Lifecycle ===");

    let start = Utc::now() + Duration::minutes(5);
    let meeting = manager
        .create(MeetingDraft {
            title: "Design sync".to_string(),
            description: "Weekly design review".to_string(),
            kind: MeetingKind::OneOnOne,
            scheduled_start: start,
            scheduled_end: start + Duration::minutes(30),
            host_id: "alice".to_string(),
            host_name: "Alice".to_string(),
            attendee_limit: None,
            is_public: false,
            settings: MeetingSettings {
                recording: true,
                ..MeetingSettings::default()
            },
        })
        .await;
    info!(
        "Scheduled {} in room {} (limit {})",
        meeting.title, meeting.room_id, meeting.attendee_limit
    );

    manager.start(meeting.id).await;

    for user in ["alice", "bob", "carol", "dave"] {
        match manager.join(meeting.id, Some(user)).await {
            Ok(outcome) => info!("{} -> {:?}", user, outcome),
            Err(rejected) => warn!("{} -> {}", user, rejected),
        }
    }

    manager.leave(meeting.id, Some("bob")).await;

    let Some(ended) = manager.end(meeting.id).await else {
        anyhow::bail!("meeting {} disappeared during the demo", meeting.id);
    };
    info!(
        "Meeting ended after {}s, status {:?}",
        ended.duration.unwrap_or(0),
        ended.status
    );

    info!("Upcoming: {}", manager.upcoming().await.len());
    info!("Active: {}", manager.active().await.len());
    info!("Past: {}", manager.past().await.len());
    info!("Hosted by alice: {}", manager.hosted_by("alice").await.len());

    let record = serde_json::to_string_pretty(&MeetingRecord::from(&ended))?;
    info!("Stored record:\n{}", record);

    info!("=== Demo Complete ===");
    Ok(())
}
