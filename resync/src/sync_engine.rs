//! Main sync engine that orchestrates a sync run
//!
//! A run validates its endpoints, reads every origin, merges and sorts the
//! resources, then writes them to the destination batch by batch.

use resync_core::{Endpoint, Formatter, ResourceSink, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::batching::batched;
use crate::error::{Result, SyncError};
use crate::follow::FollowMode;
use crate::merge::merge;
use crate::metrics::SyncMetrics;
use crate::origin::{ReadOptions, ResourceOrigin};
use crate::progress::{ProgressChannel, ProgressReporter};
use crate::schema::Schema;
use crate::toposort::toposorted;
use crate::writer::BatchWriter;

/// Options for sync runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncOptions {
    /// How documents are interpreted as resources
    pub schema: Schema,
    /// Which links the crawler follows
    pub follow_mode: FollowMode,
    /// Output format; the destination's default when unset
    pub formatter: Option<Formatter>,
    /// Replace an existing destination file
    pub remove: bool,
    /// Maximum resources per write batch
    pub batch_size: usize,
    /// Attempts and backoff for every read and write
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            schema: Schema::default(),
            follow_mode: FollowMode::default(),
            formatter: None,
            remove: false,
            batch_size: 1,
            retry: RetryPolicy::default(),
        }
    }
}

/// Main sync engine
pub struct SyncEngine {
    options: SyncOptions,
    cancellation: CancellationToken,
}

impl SyncEngine {
    /// Create a new sync engine with options
    pub fn new(options: SyncOptions) -> Self {
        Self {
            options,
            cancellation: CancellationToken::new(),
        }
    }

    /// Stop the run at the next origin or batch boundary once `token` fires.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Check options and endpoints before any I/O; returns the output format.
    pub fn validate(&self, origins: &[Endpoint], destination: &Endpoint) -> Result<Formatter> {
        if self.options.batch_size == 0 {
            return Err(SyncError::config("Batch size must be at least 1"));
        }
        if self.options.retry.max_attempts == 0 {
            return Err(SyncError::config("Max attempts must be at least 1"));
        }
        if origins.is_empty() {
            return Err(SyncError::config("At least one origin is required"));
        }

        for origin in origins {
            if origin == destination {
                return Err(SyncError::config(format!(
                    "Origin and destination must differ: {origin}"
                )));
            }
            origin.validate_for_read()?;
        }

        let formatter = self
            .options
            .formatter
            .unwrap_or_else(|| destination.default_formatter());
        destination.validate_for_write(formatter, self.options.remove)?;

        Ok(formatter)
    }

    /// Synchronize `origins` into `destination`
    pub async fn sync(&self, origins: &[Endpoint], destination: &Endpoint) -> Result<SyncMetrics> {
        let (progress_reporter, _progress_channel) = ProgressChannel::new();
        self.sync_with_progress(origins, destination, Some(progress_reporter))
            .await
    }

    /// Synchronize with progress reporting
    pub async fn sync_with_progress(
        &self,
        origins: &[Endpoint],
        destination: &Endpoint,
        progress_reporter: Option<ProgressReporter>,
    ) -> Result<SyncMetrics> {
        let formatter = self.validate(origins, destination)?;
        let origins: Vec<&dyn ResourceOrigin> =
            origins.iter().map(|origin| origin as &dyn ResourceOrigin).collect();

        let result = self
            .execute(
                &origins,
                destination,
                formatter,
                Some(destination),
                &progress_reporter,
            )
            .await;

        report_failure(&result, &progress_reporter).await;
        result
    }

    /// Run the read, sort and write stages against arbitrary origins and sink.
    pub async fn run(
        &self,
        origins: &[&dyn ResourceOrigin],
        sink: &dyn ResourceSink,
        formatter: Formatter,
        progress_reporter: Option<ProgressReporter>,
    ) -> Result<SyncMetrics> {
        if self.options.batch_size == 0 {
            return Err(SyncError::config("Batch size must be at least 1"));
        }

        let result = self
            .execute(origins, sink, formatter, None, &progress_reporter)
            .await;

        report_failure(&result, &progress_reporter).await;
        result
    }

    async fn execute(
        &self,
        origins: &[&dyn ResourceOrigin],
        sink: &dyn ResourceSink,
        formatter: Formatter,
        destination: Option<&Endpoint>,
        progress_reporter: &Option<ProgressReporter>,
    ) -> Result<SyncMetrics> {
        let mut metrics = SyncMetrics::new();
        metrics.start();

        if let Some(reporter) = progress_reporter {
            let name = destination.map(ToString::to_string).unwrap_or_default();
            reporter.sync_started(origins.len(), name)?;
        }

        let read_options = ReadOptions {
            schema: self.options.schema,
            follow_mode: self.options.follow_mode,
            formatter,
            retry: self.options.retry,
        };

        // Phase 1: read every origin
        let mut reads = Vec::with_capacity(origins.len());
        for origin in origins {
            self.check_cancelled()?;

            let start_time = Instant::now();
            let read = origin.read(&read_options).await?;
            info!(
                origin = %origin.name(),
                resources = read.resources.len(),
                fetches = read.fetches,
                "Read origin"
            );
            metrics.record_read(&read);

            if let Some(reporter) = progress_reporter {
                reporter
                    .origin_read(origin.name(), read.resources.len(), start_time.elapsed())
                    .await?;
            }
            reads.push(read.resources);
        }

        // Phase 2: merge and order
        let resources = merge(reads);
        let ordered = toposorted(&resources)?;
        let batches = batched(&ordered, self.options.batch_size);
        debug!(resources = ordered.len(), batches = batches.len(), "Sorted resources");

        // Phase 3: write
        if let Some(destination) = destination {
            destination.prepare_for_write(self.options.remove).await?;
        }

        if let Some(reporter) = progress_reporter {
            reporter.write_started(ordered.len(), batches.len()).await?;
        }

        let mut writer = BatchWriter::new(sink, formatter).with_retry(self.options.retry);
        for batch in &batches {
            self.check_cancelled()?;
            writer.write_batch(batch).await?;

            if let Some(reporter) = progress_reporter {
                reporter.batch_written(batch.len()).await?;
            }
        }
        metrics.record_writes(writer.stats());

        metrics.complete();

        if let Some(reporter) = progress_reporter {
            reporter.sync_completed().await?;
            reporter.info(metrics.summary())?;
        }

        Ok(metrics)
    }

    fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.is_cancelled() {
            info!("Sync run cancelled");
            return Err(SyncError::Cancelled);
        }
        Ok(())
    }
}

async fn report_failure(result: &Result<SyncMetrics>, progress_reporter: &Option<ProgressReporter>) {
    if let (Err(error), Some(reporter)) = (result, progress_reporter) {
        // the receiver may already be gone; the error itself is returned to the caller
        let _ = reporter.sync_failed(error.to_string()).await;
    }
}
