use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use super::{Capability, ResourceSink};
use crate::error::{EndpointError, Result};
use crate::formatter::Formatter;

/// Read and write resources in a single multi-document YAML file.
///
/// Small data sets stay human-readable this way. Documents are appended, so
/// the file must not exist before a sync unless it is removed first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YamlFileEndpoint {
    path: PathBuf,
}

impl YamlFileEndpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read_documents(&self) -> Result<Vec<Value>> {
        let data = fs::read(&self.path).await?;
        let documents = Formatter::Yaml.decode_all(&data)?;
        debug!(path = %self.path.display(), documents = documents.len(), "Read YAML file");
        Ok(documents)
    }

    pub fn validate_for_read(&self) -> Result<()> {
        if self.path.is_file() {
            Ok(())
        } else {
            Err(EndpointError::Configuration(format!(
                "File not found: {}",
                self.path.display()
            )))
        }
    }

    pub fn validate_for_write(&self, formatter: Formatter, remove: bool) -> Result<()> {
        // JSON has no multi-document file form
        if formatter != Formatter::Yaml {
            return Err(EndpointError::Configuration(format!(
                "Cannot use {formatter} format with {self}"
            )));
        }

        if self.path.exists() && !remove {
            return Err(EndpointError::Configuration(format!(
                "File already exists: {}; perhaps you mean to use '--rm'?",
                self.path.display()
            )));
        }

        Ok(())
    }

    pub async fn prepare_for_write(&self, remove: bool) -> Result<()> {
        if remove && self.path.exists() {
            info!(path = %self.path.display(), "Removing existing file");
            fs::remove_file(&self.path).await?;
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for YamlFileEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "YamlFileEndpoint('{}')", self.path.display())
    }
}

#[async_trait]
impl ResourceSink for YamlFileEndpoint {
    async fn put(&self, uri: &str, body: Vec<u8>, _content_type: &str) -> Result<()> {
        debug!(uri = %uri, path = %self.path.display(), "Appending resource");

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&body).await?;
        file.flush().await?;
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

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_append_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let endpoint = YamlFileEndpoint::new(temp_dir.path().join("nested/out.yaml"));

        endpoint.validate_for_write(Formatter::Yaml, false).unwrap();
        endpoint.prepare_for_write(false).await.unwrap();

        for id in ["1", "2"] {
            let document = json!({"id": id, "uri": format!("http://example.com/foo/{id}")});
            let body = Formatter::Yaml.encode_document(&document).unwrap();
            endpoint.put("http://example.com/foo", body, "application/yaml").await.unwrap();
        }

        let documents = endpoint.read_documents().await.unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[1]["id"], json!("2"));
    }

    #[test]
    fn test_rejects_json_formatter() {
        let endpoint = YamlFileEndpoint::new("out.yaml");
        let result = endpoint.validate_for_write(Formatter::Json, true);
        assert!(matches!(result, Err(EndpointError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_existing_file_requires_remove() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.yaml");
        fs::write(&path, "---\nid: old\n").await.unwrap();

        let endpoint = YamlFileEndpoint::new(&path);
        assert!(endpoint.validate_for_write(Formatter::Yaml, false).is_err());
        endpoint.validate_for_write(Formatter::Yaml, true).unwrap();

        endpoint.prepare_for_write(true).await.unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_file_cannot_be_read() {
        let endpoint = YamlFileEndpoint::new("/nonexistent/resources.yaml");
        assert!(endpoint.validate_for_read().is_err());
    }

    #[tokio::test]
    async fn test_no_bulk_capability() {
        let endpoint = YamlFileEndpoint::new("out.yaml");
        assert_eq!(
            endpoint.probe_capability("http://example.com/foo").await.unwrap(),
            Capability::single()
        );
        assert!(endpoint.patch("http://example.com/foo", Vec::new(), "").await.is_err());
    }
}
