//! Document formatters
//!
//! Resources travel as `serde_json::Value` documents. A [`Formatter`] turns
//! those documents into bytes for a destination and back again; both
//! formatters share the same document model so round-trips are lossless.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EndpointError, Result};

const JSON_MIME_TYPES: &[&str] = &["application/json", "application/hal+json", "text/json"];

const YAML_MIME_TYPES: &[&str] = &[
    "application/yaml",
    "application/x-yaml",
    "text/vnd.yaml",
    "text/yaml",
    "text/x-yaml",
];

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Formatter {
    Json,
    Yaml,
}

impl Formatter {
    /// Preferred MIME type sent as `Content-Type`
    pub fn mime_type(&self) -> &'static str {
        match self {
            Formatter::Json => JSON_MIME_TYPES[0],
            Formatter::Yaml => YAML_MIME_TYPES[0],
        }
    }

    /// Resolve a formatter from a `Content-Type` header value.
    ///
    /// Parameters such as `charset` are ignored, and any `+json` structured
    /// syntax suffix is treated as JSON.
    pub fn for_content_type(content_type: &str) -> Result<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if JSON_MIME_TYPES.contains(&essence.as_str()) || essence.ends_with("+json") {
            Ok(Formatter::Json)
        } else if YAML_MIME_TYPES.contains(&essence.as_str()) || essence.ends_with("+yaml") {
            Ok(Formatter::Yaml)
        } else {
            Err(EndpointError::UnsupportedContentType(content_type.to_string()))
        }
    }

    /// Decode a single document.
    pub fn decode(&self, data: &[u8]) -> Result<Value> {
        match self {
            Formatter::Json => Ok(serde_json::from_slice(data)?),
            Formatter::Yaml => Ok(serde_yaml::from_slice(data)?),
        }
    }

    /// Decode a stream of documents: `---` separated YAML or concatenated
    /// (typically newline-delimited) JSON.
    pub fn decode_all(&self, data: &[u8]) -> Result<Vec<Value>> {
        match self {
            Formatter::Json => serde_json::Deserializer::from_slice(data)
                .into_iter::<Value>()
                .map(|document| document.map_err(EndpointError::from))
                .collect(),
            Formatter::Yaml => {
                let mut documents = Vec::new();
                for document in serde_yaml::Deserializer::from_slice(data) {
                    let value = Value::deserialize(document)?;
                    // an empty stream still yields one null document
                    if !value.is_null() {
                        documents.push(value);
                    }
                }
                Ok(documents)
            }
        }
    }

    /// Encode a single document, e.g. as a request body.
    pub fn encode(&self, document: &Value) -> Result<Vec<u8>> {
        match self {
            Formatter::Json => Ok(serde_json::to_vec(document)?),
            Formatter::Yaml => Ok(serde_yaml::to_string(document)?.into_bytes()),
        }
    }

    /// Encode a document so that it can be appended to a stream and read
    /// back with [`Formatter::decode_all`].
    pub fn encode_document(&self, document: &Value) -> Result<Vec<u8>> {
        let mut data = match self {
            Formatter::Json => Vec::new(),
            Formatter::Yaml => b"---\n".to_vec(),
        };
        data.extend(self.encode(document)?);
        if data.last() != Some(&b'\n') {
            data.push(b'\n');
        }
        Ok(data)
    }
}

impl std::fmt::Display for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Formatter::Json => write!(f, "JSON"),
            Formatter::Yaml => write!(f, "YAML"),
        }
    }
}

impl std::str::FromStr for Formatter {
    type Err = EndpointError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Formatter::Json),
            "yaml" | "yml" => Ok(Formatter::Yaml),
            other => Err(EndpointError::UnsupportedContentType(other.to_string())),
        }
    }
}
