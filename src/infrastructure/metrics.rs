//! Meeting metrics
//!
//! Recorded through the `metrics` facade. Without an installed recorder
//! every call is a no-op.

use ::metrics::{counter, describe_counter, describe_gauge, gauge};

/// Register metric descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!("meetings_created_total", "Total number of meetings scheduled");
    describe_counter!("meetings_started_total", "Total number of meetings started");
    describe_counter!("meetings_ended_total", "Total number of meetings ended");
    describe_counter!(
        "meeting_joins_total",
        "Join attempts, labelled by outcome"
    );
    describe_counter!(
        "meetings_sync_failures_total",
        "Remote writes that were given up on"
    );
    describe_gauge!("meetings_active", "Number of meetings currently live");
}

pub fn record_meeting_created() {
    counter!("meetings_created_total").increment(1);
}

pub fn record_meeting_started() {
    counter!("meetings_started_total").increment(1);
}

pub fn record_meeting_ended() {
    counter!("meetings_ended_total").increment(1);
}

/// `outcome` is one of `joined`, `already_present`, `full`, `active_elsewhere`, `not_found`
pub fn record_join(outcome: &'static str) {
    counter!("meeting_joins_total", "outcome" => outcome).increment(1);
}

pub fn record_sync_failure(op: &str) {
    counter!("meetings_sync_failures_total", "op" => op.to_string()).increment(1);
}

pub fn update_active_meetings(count: usize) {
    gauge!("meetings_active").set(count as f64);
}
