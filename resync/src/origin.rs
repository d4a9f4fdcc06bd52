//! Reading resources out of origin endpoints
//!
//! HTTP origins are crawled from their base URL. File and stream origins
//! hold a sequence of documents that are decoded directly; every document
//! with an `id` is a resource.

use async_trait::async_trait;
use resync_core::{Endpoint, Formatter, ResourceSource, RetryPolicy};
use tracing::debug;

use crate::crawler::Crawler;
use crate::error::{Result, SyncError};
use crate::follow::FollowMode;
use crate::resource::Resource;
use crate::schema::Schema;

/// How origins are read during one run
#[derive(Debug, Clone, Copy)]
pub struct ReadOptions {
    pub schema: Schema,
    pub follow_mode: FollowMode,
    /// Decoder for document streams; HTTP responses pick theirs by content type
    pub formatter: Formatter,
    pub retry: RetryPolicy,
}

/// Resources read from one origin
#[derive(Debug, Default)]
pub struct OriginRead {
    pub resources: Vec<Resource>,
    pub fetches: usize,
    pub retries: u32,
}

#[async_trait]
pub trait ResourceOrigin: Send + Sync {
    /// Human readable name used in logs and progress events
    fn name(&self) -> String;

    async fn read(&self, options: &ReadOptions) -> Result<OriginRead>;
}

/// A crawlable source together with the URIs to start from
pub struct CrawlOrigin<'a> {
    source: &'a dyn ResourceSource,
    seeds: Vec<String>,
}

impl<'a> CrawlOrigin<'a> {
    pub fn new(source: &'a dyn ResourceSource, seeds: Vec<String>) -> Self {
        Self { source, seeds }
    }
}

#[async_trait]
impl<'a> ResourceOrigin for CrawlOrigin<'a> {
    fn name(&self) -> String {
        self.seeds.join(", ")
    }

    async fn read(&self, options: &ReadOptions) -> Result<OriginRead> {
        let mut crawler = Crawler::new(self.source, options.schema, options.follow_mode)
            .with_retry(options.retry);
        let resources = crawler.crawl(self.seeds.as_slice()).await?;
        let stats = crawler.stats();

        Ok(OriginRead {
            resources,
            fetches: stats.fetches,
            retries: stats.retries,
        })
    }
}

#[async_trait]
impl ResourceOrigin for Endpoint {
    fn name(&self) -> String {
        self.to_string()
    }

    async fn read(&self, options: &ReadOptions) -> Result<OriginRead> {
        if let Endpoint::Http(http) = self {
            let seeds = vec![http.base_url().to_string()];
            return CrawlOrigin::new(http, seeds).read(options).await;
        }

        let documents = self
            .read_documents(options.formatter)
            .await
            .map_err(|e| SyncError::read(self.to_string(), e))?;
        debug!(origin = %self, documents = documents.len(), "Read document stream");

        let mut resources = Vec::with_capacity(documents.len());
        for document in documents {
            let resource = options.schema.decode(document)?;
            if resource.has_id() {
                resources.push(resource);
            }
        }

        Ok(OriginRead {
            resources,
            ..OriginRead::default()
        })
    }
}
