//! Resource Sync Engine Library
//!
//! Copies a graph of hypermedia-linked resources from one or more origins to
//! a destination:
//! - Resource model for HAL and simple documents
//! - Link crawling with configurable follow modes
//! - Parent-before-child ordering with cycle detection
//! - Batched writes that adapt to the destination's bulk support
//! - Progress reporting and metrics

pub mod batching;
pub mod crawler;
pub mod error;
pub mod follow;
pub mod merge;
pub mod metrics;
pub mod origin;
pub mod progress;
pub mod resource;
pub mod schema;
pub mod sync_engine;
pub mod toposort;
pub mod writer;

// Re-export main types and functions
pub use batching::batched;
pub use crawler::{CrawlStats, Crawler};
pub use error::{Result, SyncError};
pub use follow::FollowMode;
pub use merge::merge;
pub use metrics::SyncMetrics;
pub use origin::{CrawlOrigin, OriginRead, ReadOptions, ResourceOrigin};
pub use progress::{ProgressChannel, ProgressEvent, ProgressReporter, ProgressSnapshot};
pub use resource::{Link, Resource};
pub use schema::Schema;
pub use sync_engine::{SyncEngine, SyncOptions};
pub use toposort::toposorted;
pub use writer::{BatchWriter, WriteStats};

pub use resync_core::{Endpoint, Formatter, RetryPolicy};

/// Synchronize `origins` into `destination` with the given options
pub async fn sync_endpoints(
    origins: &[Endpoint],
    destination: &Endpoint,
    options: SyncOptions,
) -> Result<SyncMetrics> {
    let engine = SyncEngine::new(options);
    engine.sync(origins, destination).await
}

// Test modules
#[cfg(test)]
mod test_support;
