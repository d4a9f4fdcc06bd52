use async_trait::async_trait;
use reqwest::header::{ALLOW, CONTENT_TYPE};
use reqwest::{ClientBuilder, Method};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Capability, Fetched, ResourceSink, ResourceSource};
use crate::error::{EndpointError, Result};
use crate::ClientConfig;

/// Read and write resources over HTTP
#[derive(Debug, Clone)]
pub struct HttpEndpoint {
    /// Base URL the endpoint was configured with
    base_url: Url,

    /// HTTP client for making requests
    client: reqwest::Client,
}

impl HttpEndpoint {
    /// Create an endpoint with default client settings
    pub fn new(base_url: &str) -> Result<Self> {
        HttpEndpointBuilder::new(base_url).build()
    }

    /// Create an endpoint around an existing HTTP client
    pub fn with_client(base_url: &str, client: reqwest::Client) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            client,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve a possibly relative link target against the base URL.
    pub fn resolve(&self, uri: &str) -> Result<Url> {
        match Url::parse(uri) {
            Ok(url) => Ok(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(self.base_url.join(uri)?),
            Err(error) => Err(error.into()),
        }
    }

    /// Re-base a resource URI onto this endpoint: scheme, host and port come
    /// from the base URL, path and query from the resource.
    pub fn join_uri(&self, uri: &str) -> Result<Url> {
        let mut target = self.resolve(uri)?;

        let unsupported = || EndpointError::UnsupportedEndpoint(uri.to_string());
        target
            .set_scheme(self.base_url.scheme())
            .map_err(|_| unsupported())?;
        target.set_host(self.base_url.host_str())?;
        target
            .set_port(self.base_url.port())
            .map_err(|_| unsupported())?;

        Ok(target)
    }

    async fn send(&self, uri: &Url, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| EndpointError::from_transport(uri.as_str(), e))?;

        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(EndpointError::Status {
                uri: uri.to_string(),
                status: status.as_u16(),
                message,
            })
        }
    }

    async fn send_body(
        &self,
        method: Method,
        uri: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.join_uri(uri)?;
        debug!(method = %method, uri = %url, bytes = body.len(), "Writing resource");

        let request = self
            .client
            .request(method, url.clone())
            .header(CONTENT_TYPE, content_type)
            .body(body);

        self.send(&url, request).await?;
        Ok(())
    }
}

impl PartialEq for HttpEndpoint {
    fn eq(&self, other: &Self) -> bool {
        self.base_url == other.base_url
    }
}

impl Eq for HttpEndpoint {}

impl std::fmt::Display for HttpEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HttpEndpoint('{}')", self.base_url)
    }
}

#[async_trait]
impl ResourceSource for HttpEndpoint {
    async fn fetch(&self, uri: &str) -> Result<Fetched> {
        let url = self.resolve(uri)?;
        debug!(uri = %url, "Fetching resource");

        let response = self.send(&url, self.client.get(url.clone())).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| EndpointError::UnsupportedContentType(String::new()))?;

        let body = response
            .bytes()
            .await
            .map_err(|e| EndpointError::from_transport(url.as_str(), e))?;

        Ok(Fetched {
            body: body.to_vec(),
            content_type,
        })
    }
}

#[async_trait]
impl ResourceSink for HttpEndpoint {
    async fn put(&self, uri: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.send_body(Method::PUT, uri, body, content_type).await
    }

    /// Bulk updates are advertised by `PATCH` in the `Allow` header of an
    /// `OPTIONS` response for the collection.
    async fn probe_capability(&self, uri_prefix: &str) -> Result<Capability> {
        let url = self.join_uri(uri_prefix)?;
        debug!(uri = %url, "Probing write capability");

        let request = self.client.request(Method::OPTIONS, url.clone());
        let response = match self.send(&url, request).await {
            Ok(response) => response,
            Err(EndpointError::Status { status, .. }) if (400..500).contains(&status) => {
                debug!(uri = %url, status, "Capability probe not supported");
                return Ok(Capability::single());
            }
            Err(error) => return Err(error),
        };

        let bulk_update = response
            .headers()
            .get_all(ALLOW)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .any(allows_patch);

        Ok(Capability { bulk_update })
    }

    async fn patch(&self, uri_prefix: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        self.send_body(Method::PATCH, uri_prefix, body, content_type).await
    }
}

fn allows_patch(allow: &str) -> bool {
    allow
        .split(',')
        .any(|method| method.trim().eq_ignore_ascii_case("PATCH"))
}

/// Builder for HTTP endpoint client configuration
pub struct HttpEndpointBuilder {
    base_url: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpEndpointBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
            connect_timeout: None,
            user_agent: None,
        }
    }

    pub fn from_config(base_url: impl Into<String>, config: &ClientConfig) -> Self {
        Self::new(base_url)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<HttpEndpoint> {
        let mut client_builder = ClientBuilder::new();

        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        if let Some(connect_timeout) = self.connect_timeout {
            client_builder = client_builder.connect_timeout(connect_timeout);
        }

        if let Some(user_agent) = self.user_agent {
            client_builder = client_builder.user_agent(user_agent);
        }

        let client = client_builder.build()?;

        HttpEndpoint::with_client(&self.base_url, client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_endpoint_creation() {
        let endpoint = HttpEndpoint::new("http://localhost:5000/api");
        assert!(endpoint.is_ok());
    }

    #[test]
    fn test_endpoint_builder() {
        let endpoint = HttpEndpointBuilder::new("http://localhost:5000/api")
            .timeout(Duration::from_secs(60))
            .user_agent("test-client/1.0")
            .build();
        assert!(endpoint.is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpEndpoint::new("http://"),
            Err(EndpointError::InvalidUri(_))
        ));
    }

    #[test_case("http://example.com/api/foo/1", "https://dest.internal:8443/api/foo/1" ; "absolute")]
    #[test_case("http://example.com/api/foo/1?x=1", "https://dest.internal:8443/api/foo/1?x=1" ; "keeps query")]
    #[test_case("/api/bar/2", "https://dest.internal:8443/api/bar/2" ; "relative")]
    fn test_join_uri(uri: &str, expected: &str) {
        let endpoint = HttpEndpoint::new("https://dest.internal:8443/base").unwrap();
        assert_eq!(endpoint.join_uri(uri).unwrap().as_str(), expected);
    }

    #[test]
    fn test_join_uri_drops_source_port() {
        let endpoint = HttpEndpoint::new("http://dest.internal/api").unwrap();
        let joined = endpoint.join_uri("http://origin.internal:5000/api/foo/1").unwrap();
        assert_eq!(joined.as_str(), "http://dest.internal/api/foo/1");
    }

    #[test]
    fn test_resolve_keeps_absolute_links() {
        let endpoint = HttpEndpoint::new("http://example.com/api/").unwrap();
        assert_eq!(
            endpoint.resolve("http://other.com/api/foo/1").unwrap().as_str(),
            "http://other.com/api/foo/1"
        );
        assert_eq!(
            endpoint.resolve("foo/1").unwrap().as_str(),
            "http://example.com/api/foo/1"
        );
    }

    #[test_case("GET, PUT, PATCH", true ; "listed")]
    #[test_case("get,patch", true ; "lowercase")]
    #[test_case("GET, PUT", false ; "absent")]
    #[test_case("", false ; "empty")]
    fn test_allows_patch(allow: &str, expected: bool) {
        assert_eq!(allows_patch(allow), expected);
    }
}
