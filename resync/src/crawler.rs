//! Hypermedia crawler
//!
//! Starting from one or more seed URIs, the crawler fetches documents,
//! decodes them with the configured schema and follows the links selected by
//! the follow mode. Every URI is fetched at most once per crawl.

use indexmap::IndexMap;
use resync_core::{Formatter, ResourceSource, RetryPolicy};
use std::collections::{HashSet, VecDeque};
use std::time::Instant;
use tracing::{debug, info};

use crate::error::{Result, SyncError};
use crate::follow::FollowMode;
use crate::resource::Resource;
use crate::schema::Schema;

/// Counters collected during one crawl
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub fetches: usize,
    pub retries: u32,
}

pub struct Crawler<'a> {
    source: &'a dyn ResourceSource,
    schema: Schema,
    follow_mode: FollowMode,
    retry: RetryPolicy,
    stats: CrawlStats,
}

impl<'a> Crawler<'a> {
    pub fn new(source: &'a dyn ResourceSource, schema: Schema, follow_mode: FollowMode) -> Self {
        Self {
            source,
            schema,
            follow_mode,
            retry: RetryPolicy::default(),
            stats: CrawlStats::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Discover every resource reachable from `seeds`.
    ///
    /// Resources come back in discovery order, one per URI; a resource seen
    /// again (for instance embedded in a second page) keeps its first
    /// position with the later payload.
    pub async fn crawl<S: AsRef<str>>(&mut self, seeds: &[S]) -> Result<Vec<Resource>> {
        let start_time = Instant::now();
        let mut queue: VecDeque<String> = seeds.iter().map(|seed| seed.as_ref().to_string()).collect();
        let mut seen: HashSet<String> = HashSet::new();
        let mut discovered: IndexMap<String, Resource> = IndexMap::new();

        while let Some(uri) = queue.pop_front() {
            if !seen.insert(uri.clone()) {
                continue;
            }

            let resource = self.fetch(&uri).await?;
            let embedded = resource.embedded()?;
            let targets: Vec<String> = resource
                .links(self.follow_mode)
                .filter(|target| !seen.contains(*target))
                .map(str::to_string)
                .collect();

            if resource.has_id() {
                discovered.insert(resource.uri().to_string(), resource);
            }

            for item in embedded {
                if item.has_id() {
                    discovered.insert(item.uri().to_string(), item);
                }
            }

            debug!(uri = %uri, queued = targets.len(), "Followed links");
            queue.extend(targets);
        }

        info!(
            seeds = seeds.len(),
            fetches = self.stats.fetches,
            resources = discovered.len(),
            follow_mode = %self.follow_mode,
            duration_ms = start_time.elapsed().as_millis() as u64,
            "Crawl completed"
        );

        Ok(discovered.into_values().collect())
    }

    async fn fetch(&mut self, uri: &str) -> Result<Resource> {
        let source = self.source;
        let mut attempts = 0u32;
        let fetched = self
            .retry
            .run(uri, || {
                attempts += 1;
                source.fetch(uri)
            })
            .await;

        self.stats.fetches += 1;
        self.stats.retries += attempts.saturating_sub(1);

        let fetched = fetched.map_err(|e| SyncError::read(uri, e))?;
        debug!(uri = %uri, content_type = %fetched.content_type, bytes = fetched.body.len(), "Fetched document");

        let document = Formatter::for_content_type(&fetched.content_type)
            .and_then(|formatter| formatter.decode(&fetched.body))
            .map_err(|e| SyncError::read(uri, e))?;

        self.schema.decode(document)
    }
}
