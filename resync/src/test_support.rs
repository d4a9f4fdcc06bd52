//! In-memory sources and sinks for engine tests

use async_trait::async_trait;
use resync_core::{
    Capability, EndpointError, Fetched, Formatter, ResourceSink, ResourceSource, RetryPolicy,
};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

/// Retry policy without delays between attempts
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts).with_intervals(Duration::ZERO, Duration::ZERO)
}

fn gateway_error(uri: &str, status: u16, attempt: usize) -> EndpointError {
    EndpointError::Status {
        uri: uri.to_string(),
        status,
        message: format!("attempt {attempt}"),
    }
}

/// Source serving canned documents; unknown URIs answer 404
#[derive(Default)]
pub struct MockSource {
    documents: HashMap<String, Fetched>,
    failures: HashMap<String, usize>,
    fetches: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(self, uri: &str, document: Value) -> Self {
        let body = Formatter::Json.encode(&document).unwrap();
        self.with_body(uri, "application/hal+json", &body)
    }

    pub fn with_body(mut self, uri: &str, content_type: &str, body: &[u8]) -> Self {
        self.documents.insert(
            uri.to_string(),
            Fetched {
                body: body.to_vec(),
                content_type: content_type.to_string(),
            },
        );
        self
    }

    /// Answer the first `count` fetches of `uri` with 502.
    pub fn failing(mut self, uri: &str, count: usize) -> Self {
        self.failures.insert(uri.to_string(), count);
        self
    }

    pub fn fetch_count(&self, uri: &str) -> usize {
        self.fetches.lock().unwrap().iter().filter(|fetched| *fetched == uri).count()
    }

    pub fn total_fetches(&self) -> usize {
        self.fetches.lock().unwrap().len()
    }
}

#[async_trait]
impl ResourceSource for MockSource {
    async fn fetch(&self, uri: &str) -> resync_core::Result<Fetched> {
        let attempt = {
            let mut fetches = self.fetches.lock().unwrap();
            fetches.push(uri.to_string());
            fetches.iter().filter(|fetched| *fetched == uri).count()
        };

        if attempt <= self.failures.get(uri).copied().unwrap_or(0) {
            return Err(gateway_error(uri, 502, attempt));
        }

        self.documents.get(uri).cloned().ok_or_else(|| EndpointError::Status {
            uri: uri.to_string(),
            status: 404,
            message: "Not Found".to_string(),
        })
    }
}

/// A write recorded by [`MockSink`]
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Put {
        uri: String,
        body: Vec<u8>,
        content_type: String,
    },
    Patch {
        uri: String,
        body: Vec<u8>,
        content_type: String,
    },
}

/// Sink recording every call; bulk updates are accepted under configured prefixes
#[derive(Default)]
pub struct MockSink {
    bulk_prefixes: HashSet<String>,
    probe_error: bool,
    failing_puts: usize,
    failing_patches: usize,
    probes: Mutex<Vec<String>>,
    calls: Mutex<Vec<SinkCall>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bulk(mut self, prefix: &str) -> Self {
        self.bulk_prefixes.insert(prefix.to_string());
        self
    }

    pub fn with_probe_error(mut self) -> Self {
        self.probe_error = true;
        self
    }

    /// Answer the first `count` PUTs with 504.
    pub fn failing_puts(mut self, count: usize) -> Self {
        self.failing_puts = count;
        self
    }

    /// Answer the first `count` PATCHes with 502.
    pub fn failing_patches(mut self, count: usize) -> Self {
        self.failing_patches = count;
        self
    }

    pub fn probes(&self) -> Vec<String> {
        self.probes.lock().unwrap().clone()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn put_uris(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                SinkCall::Put { uri, .. } => Some(uri),
                SinkCall::Patch { .. } => None,
            })
            .collect()
    }

    pub fn patch_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, SinkCall::Patch { .. }))
            .count()
    }

    /// Documents written so far, bulk items flattened, in write order.
    pub fn written_documents(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .flat_map(|call| match call {
                SinkCall::Put { body, .. } => vec![Formatter::Json.decode(&body).unwrap()],
                SinkCall::Patch { body, .. } => {
                    let bulk = Formatter::Json.decode(&body).unwrap();
                    bulk["items"].as_array().cloned().unwrap_or_default()
                }
            })
            .collect()
    }
}

#[async_trait]
impl ResourceSink for MockSink {
    async fn put(&self, uri: &str, body: Vec<u8>, content_type: &str) -> resync_core::Result<()> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(SinkCall::Put {
                uri: uri.to_string(),
                body,
                content_type: content_type.to_string(),
            });
            calls
                .iter()
                .filter(|call| matches!(call, SinkCall::Put { .. }))
                .count()
        };

        if attempt <= self.failing_puts {
            return Err(gateway_error(uri, 504, attempt));
        }
        Ok(())
    }

    async fn probe_capability(&self, uri_prefix: &str) -> resync_core::Result<Capability> {
        self.probes.lock().unwrap().push(uri_prefix.to_string());

        if self.probe_error {
            return Err(EndpointError::Connection {
                uri: uri_prefix.to_string(),
                message: "connection refused".to_string(),
            });
        }

        if self.bulk_prefixes.contains(uri_prefix) {
            Ok(Capability::bulk())
        } else {
            Ok(Capability::single())
        }
    }

    async fn patch(&self, uri_prefix: &str, body: Vec<u8>, content_type: &str) -> resync_core::Result<()> {
        let attempt = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(SinkCall::Patch {
                uri: uri_prefix.to_string(),
                body,
                content_type: content_type.to_string(),
            });
            calls
                .iter()
                .filter(|call| matches!(call, SinkCall::Patch { .. }))
                .count()
        };

        if attempt <= self.failing_patches {
            return Err(gateway_error(uri_prefix, 502, attempt));
        }
        Ok(())
    }
}
