//! Metrics and statistics for sync runs

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use tracing::info;
use uuid::Uuid;

use crate::origin::OriginRead;
use crate::writer::WriteStats;

/// Counters for one sync run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncMetrics {
    /// Unique session identifier
    pub session_id: Uuid,
    pub start_time: SystemTime,
    pub end_time: Option<SystemTime>,
    pub duration: Duration,
    /// Origins read
    pub origins: usize,
    /// Documents fetched while crawling
    pub fetches: usize,
    /// Resources read across all origins, before merging
    pub resources_read: usize,
    pub resources_written: usize,
    pub batches: usize,
    pub bulk_writes: usize,
    pub single_writes: usize,
    /// Capability probes sent to the destination
    pub probes: usize,
    /// Attempts beyond the first, for reads and writes
    pub retries: u32,
}

impl Default for SyncMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            start_time: SystemTime::now(),
            end_time: None,
            duration: Duration::default(),
            origins: 0,
            fetches: 0,
            resources_read: 0,
            resources_written: 0,
            batches: 0,
            bulk_writes: 0,
            single_writes: 0,
            probes: 0,
            retries: 0,
        }
    }

    /// Mark the sync run as started
    pub fn start(&mut self) {
        self.start_time = SystemTime::now();
    }

    /// Record the outcome of reading one origin
    pub fn record_read(&mut self, read: &OriginRead) {
        self.origins += 1;
        self.fetches += read.fetches;
        self.resources_read += read.resources.len();
        self.retries += read.retries;
    }

    /// Record the writer's counters
    pub fn record_writes(&mut self, stats: WriteStats) {
        self.resources_written += stats.resources;
        self.batches += stats.batches;
        self.bulk_writes += stats.bulk_writes;
        self.single_writes += stats.single_writes;
        self.probes += stats.probes;
        self.retries += stats.retries;
    }

    /// Mark the sync run as completed
    pub fn complete(&mut self) {
        let end_time = SystemTime::now();
        self.end_time = Some(end_time);
        self.duration = end_time.duration_since(self.start_time).unwrap_or_default();

        info!(
            session_id = %self.session_id,
            duration_secs = self.duration.as_secs_f64(),
            origins = self.origins,
            resources_read = self.resources_read,
            resources_written = self.resources_written,
            batches = self.batches,
            bulk_writes = self.bulk_writes,
            single_writes = self.single_writes,
            probes = self.probes,
            retries = self.retries,
            "Sync run completed"
        );
    }

    /// Get a summary string
    pub fn summary(&self) -> String {
        format!(
            "Sync completed in {:.2}s: {} resources read from {} origin(s), {} written in {} batches ({} bulk, {} single writes, {} retries)",
            self.duration.as_secs_f64(),
            self.resources_read,
            self.origins,
            self.resources_written,
            self.batches,
            self.bulk_writes,
            self.single_writes,
            self.retries,
        )
    }

    /// Convert to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
