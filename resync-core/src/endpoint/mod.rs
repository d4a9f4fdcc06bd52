//! Endpoints: sources and sinks of resource documents
//!
//! An endpoint descriptor is resolved once into a closed [`Endpoint`] value
//! (HTTP service, YAML file, or standard streams). The sync engine talks to
//! endpoints only through the [`ResourceSource`] and [`ResourceSink`] traits.

pub mod file;
pub mod http;
pub mod pipe;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{EndpointError, Result};
use crate::formatter::Formatter;
use crate::ClientConfig;

pub use file::YamlFileEndpoint;
pub use http::{HttpEndpoint, HttpEndpointBuilder};
pub use pipe::PipeEndpoint;

/// Raw payload returned by a fetch
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: Vec<u8>,
    pub content_type: String,
}

/// Write capabilities advertised by a destination path prefix
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capability {
    pub bulk_update: bool,
}

impl Capability {
    pub fn bulk() -> Self {
        Self { bulk_update: true }
    }

    pub fn single() -> Self {
        Self { bulk_update: false }
    }
}

/// Read side of an endpoint
#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<Fetched>;
}

/// Write side of an endpoint
#[async_trait]
pub trait ResourceSink: Send + Sync {
    /// Replace the resource identified by `uri`.
    async fn put(&self, uri: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Discover what the destination accepts under `uri_prefix`.
    async fn probe_capability(&self, uri_prefix: &str) -> Result<Capability>;

    /// Replace or create every resource in a bulk body under `uri_prefix`.
    async fn patch(&self, uri_prefix: &str, body: Vec<u8>, content_type: &str) -> Result<()>;
}

/// A resolved endpoint descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Http(HttpEndpoint),
    YamlFile(YamlFileEndpoint),
    Pipe(PipeEndpoint),
}

impl Endpoint {
    /// Interpret a descriptor: `-` for standard streams, an `http(s)://`
    /// URI, or a path ending in `.yaml`/`.yml`.
    pub fn parse(descriptor: &str) -> Result<Self> {
        Self::parse_with_config(descriptor, &ClientConfig::default())
    }

    /// Like [`Endpoint::parse`], building HTTP clients from `config`.
    pub fn parse_with_config(descriptor: &str, config: &ClientConfig) -> Result<Self> {
        if descriptor == "-" {
            return Ok(Endpoint::Pipe(PipeEndpoint::new()));
        }

        if descriptor.starts_with("http://") || descriptor.starts_with("https://") {
            return Ok(Endpoint::Http(
                HttpEndpointBuilder::from_config(descriptor, config).build()?,
            ));
        }

        if descriptor.ends_with(".yaml") || descriptor.ends_with(".yml") {
            return Ok(Endpoint::YamlFile(YamlFileEndpoint::new(descriptor)));
        }

        Err(EndpointError::UnsupportedEndpoint(descriptor.to_string()))
    }

    pub fn default_formatter(&self) -> Formatter {
        match self {
            Endpoint::Http(_) => Formatter::Json,
            Endpoint::YamlFile(_) | Endpoint::Pipe(_) => Formatter::Yaml,
        }
    }

    /// Whether progress output makes sense while writing here.
    pub fn show_progress(&self) -> bool {
        !matches!(self, Endpoint::Pipe(_))
    }

    /// Read every document of a file or stream endpoint.
    ///
    /// HTTP endpoints are crawled instead and report an unsupported operation.
    pub async fn read_documents(&self, formatter: Formatter) -> Result<Vec<Value>> {
        match self {
            Endpoint::YamlFile(file) => file.read_documents().await,
            Endpoint::Pipe(pipe) => pipe.read_documents(formatter).await,
            Endpoint::Http(http) => Err(EndpointError::UnsupportedOperation {
                endpoint: http.to_string(),
                operation: "document stream reads",
            }),
        }
    }

    /// Check that the endpoint can be read from.
    pub fn validate_for_read(&self) -> Result<()> {
        match self {
            Endpoint::YamlFile(file) => file.validate_for_read(),
            Endpoint::Http(_) | Endpoint::Pipe(_) => Ok(()),
        }
    }

    /// Check that the endpoint accepts `formatter` output.
    pub fn validate_for_write(&self, formatter: Formatter, remove: bool) -> Result<()> {
        match self {
            Endpoint::YamlFile(file) => file.validate_for_write(formatter, remove),
            Endpoint::Http(_) | Endpoint::Pipe(_) => Ok(()),
        }
    }

    /// Last step before the first write, e.g. removing an existing file.
    pub async fn prepare_for_write(&self, remove: bool) -> Result<()> {
        match self {
            Endpoint::YamlFile(file) => file.prepare_for_write(remove).await,
            Endpoint::Http(_) | Endpoint::Pipe(_) => Ok(()),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Http(http) => write!(f, "{http}"),
            Endpoint::YamlFile(file) => write!(f, "{file}"),
            Endpoint::Pipe(pipe) => write!(f, "{pipe}"),
        }
    }
}

#[async_trait]
impl ResourceSink for Endpoint {
    async fn put(&self, uri: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        match self {
            Endpoint::Http(http) => http.put(uri, body, content_type).await,
            Endpoint::YamlFile(file) => file.put(uri, body, content_type).await,
            Endpoint::Pipe(pipe) => pipe.put(uri, body, content_type).await,
        }
    }

    async fn probe_capability(&self, uri_prefix: &str) -> Result<Capability> {
        match self {
            Endpoint::Http(http) => http.probe_capability(uri_prefix).await,
            Endpoint::YamlFile(file) => file.probe_capability(uri_prefix).await,
            Endpoint::Pipe(pipe) => pipe.probe_capability(uri_prefix).await,
        }
    }

    async fn patch(&self, uri_prefix: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        match self {
            Endpoint::Http(http) => http.patch(uri_prefix, body, content_type).await,
            Endpoint::YamlFile(file) => file.patch(uri_prefix, body, content_type).await,
            Endpoint::Pipe(pipe) => pipe.patch(uri_prefix, body, content_type).await,
        }
    }
}
