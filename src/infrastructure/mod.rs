//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - Persistence gateways (in-memory and PostgreSQL)
//! - The wire record shared by both
//! - Metrics recording

pub mod metrics;
pub mod persistence;
