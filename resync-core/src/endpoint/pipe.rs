use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::{Capability, ResourceSink};
use crate::error::{EndpointError, Result};
use crate::formatter::Formatter;

/// Standard input for reads, standard output for writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipeEndpoint;

impl PipeEndpoint {
    pub fn new() -> Self {
        Self
    }

    pub async fn read_documents(&self, formatter: Formatter) -> Result<Vec<Value>> {
        let mut data = Vec::new();
        tokio::io::stdin().read_to_end(&mut data).await?;
        formatter.decode_all(&data)
    }
}

impl std::fmt::Display for PipeEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PipeEndpoint('-')")
    }
}

#[async_trait]
impl ResourceSink for PipeEndpoint {
    async fn put(&self, _uri: &str, body: Vec<u8>, _content_type: &str) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(&body).await?;
        stdout.flush().await?;
        Ok(())
    }

    async fn probe_capability(&self, _uri_prefix: &str) -> Result<Capability> {
        Ok(Capability::single())
    }

    async fn patch(&self, _uri_prefix: &str, _body: Vec<u8>, _content_type: &str) -> Result<()> {
        Err(EndpointError::UnsupportedOperation {
            endpoint: self.to_string(),
            operation: "bulk updates",
        })
    }
}
