//! Adaptive batch writer
//!
//! Before the first write under a collection prefix the writer asks the
//! destination whether it accepts bulk updates there, and remembers the
//! answer for the rest of the run. Batches go out as one bulk request when
//! supported and as individual PUTs otherwise.

use resync_core::{Capability, Formatter, ResourceSink, RetryPolicy};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::batching::batched;
use crate::error::{Result, SyncError};
use crate::resource::Resource;

/// Counters collected while writing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteStats {
    pub batches: usize,
    pub resources: usize,
    pub bulk_writes: usize,
    pub single_writes: usize,
    pub probes: usize,
    pub retries: u32,
}

pub struct BatchWriter<'a> {
    sink: &'a dyn ResourceSink,
    formatter: Formatter,
    retry: RetryPolicy,
    capabilities: HashMap<String, Capability>,
    stats: WriteStats,
}

impl<'a> BatchWriter<'a> {
    pub fn new(sink: &'a dyn ResourceSink, formatter: Formatter) -> Self {
        Self {
            sink,
            formatter,
            retry: RetryPolicy::default(),
            capabilities: HashMap::new(),
            stats: WriteStats::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn stats(&self) -> WriteStats {
        self.stats
    }

    /// Write `ordered` in batches of at most `batch_size`.
    pub async fn write(&mut self, ordered: &[&Resource], batch_size: usize) -> Result<()> {
        for batch in batched(ordered, batch_size) {
            self.write_batch(&batch).await?;
        }
        Ok(())
    }

    /// Write one batch, as a bulk request when the destination supports it.
    pub async fn write_batch(&mut self, batch: &[&Resource]) -> Result<()> {
        let Some(first) = batch.first() else {
            return Ok(());
        };

        let prefix = first.collection_uri();
        let single_prefix = batch
            .iter()
            .all(|resource| resource.collection_uri() == prefix);

        let capability = self.capability(prefix).await;

        if capability.bulk_update && batch.len() > 1 && single_prefix {
            self.write_bulk(prefix, batch).await?;
        } else {
            for resource in batch {
                self.write_single(resource).await?;
            }
        }

        self.stats.batches += 1;
        self.stats.resources += batch.len();
        Ok(())
    }

    /// Capability for `prefix`, probing the destination on first use.
    async fn capability(&mut self, prefix: &str) -> Capability {
        if let Some(capability) = self.capabilities.get(prefix) {
            return *capability;
        }

        self.stats.probes += 1;
        let capability = match self.sink.probe_capability(prefix).await {
            Ok(capability) => {
                debug!(prefix = %prefix, bulk_update = capability.bulk_update, "Probed destination");
                capability
            }
            Err(error) => {
                warn!(prefix = %prefix, "Capability probe failed, writing resources individually: {}", error);
                Capability::single()
            }
        };

        self.capabilities.insert(prefix.to_string(), capability);
        capability
    }

    async fn write_bulk(&mut self, prefix: &str, batch: &[&Resource]) -> Result<()> {
        let items: Vec<&Value> = batch.iter().map(|resource| resource.document()).collect();
        let body = self
            .formatter
            .encode(&json!({ "items": items }))
            .map_err(|e| SyncError::write(prefix, e))?;

        info!(prefix = %prefix, resources = batch.len(), "Writing bulk batch");

        let sink = self.sink;
        let content_type = self.formatter.mime_type();
        let mut attempts = 0u32;
        let result = self
            .retry
            .run(prefix, || {
                attempts += 1;
                sink.patch(prefix, body.clone(), content_type)
            })
            .await;

        self.stats.retries += attempts.saturating_sub(1);
        result.map_err(|e| SyncError::write(prefix, e))?;
        self.stats.bulk_writes += 1;
        Ok(())
    }

    async fn write_single(&mut self, resource: &Resource) -> Result<()> {
        let uri = resource.uri();
        let body = self
            .formatter
            .encode_document(resource.document())
            .map_err(|e| SyncError::write(uri, e))?;

        debug!(uri = %uri, "Writing resource");

        let sink = self.sink;
        let content_type = self.formatter.mime_type();
        let mut attempts = 0u32;
        let result = self
            .retry
            .run(uri, || {
                attempts += 1;
                sink.put(uri, body.clone(), content_type)
            })
            .await;

        self.stats.retries += attempts.saturating_sub(1);
        result.map_err(|e| SyncError::write(uri, e))?;
        self.stats.single_writes += 1;
        Ok(())
    }
}
