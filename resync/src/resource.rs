//! Resources: documents with identity, type and dependency edges

use serde_json::Value;

use crate::error::Result;
use crate::follow::FollowMode;
use crate::schema::Schema;

/// A typed hypertext link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub relation: String,
    pub target: String,
}

impl Link {
    pub fn new(relation: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            target: target.into(),
        }
    }
}

/// An immutable view over one decoded document
///
/// Derived attributes are computed once by [`Schema::decode`]; the wrapped
/// document is what gets written to the destination.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    schema: Schema,
    document: Value,
    uri: String,
    type_name: String,
    links: Vec<Link>,
    parents: Vec<String>,
}

impl Resource {
    pub(crate) fn new(
        schema: Schema,
        document: Value,
        uri: String,
        type_name: String,
        links: Vec<Link>,
        parents: Vec<String>,
    ) -> Self {
        Self {
            schema,
            document,
            uri,
            type_name,
            links,
            parents,
        }
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    /// The `id` field, if present and non-null
    pub fn id(&self) -> Option<&Value> {
        self.document.get("id").filter(|id| !id.is_null())
    }

    /// Whether this resource is a sync target rather than a page or wrapper
    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// URIs that must be written before this resource
    pub fn parents(&self) -> &[String] {
        &self.parents
    }

    /// Link targets whose relation passes `mode`
    pub fn links(&self, mode: FollowMode) -> impl Iterator<Item = &str> + '_ {
        self.links
            .iter()
            .filter(move |link| mode.follows(&link.relation))
            .map(|link| link.target.as_str())
    }

    /// Decode the inline `items` list with this resource's schema.
    pub fn embedded(&self) -> Result<Vec<Resource>> {
        match self.document.get("items") {
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| self.schema.decode(item.clone()))
                .collect(),
            _ => Ok(Vec::new()),
        }
    }

    /// The URI of the collection holding this resource: the resource URI
    /// with query, fragment and trailing identifier segment removed.
    pub fn collection_uri(&self) -> &str {
        let path = strip_query(&self.uri).trim_end_matches('/');
        match path.rfind('/') {
            Some(index) => &path[..index],
            None => path,
        }
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.type_name, self.uri)
    }
}

/// Drop the query string and fragment of a URI.
pub(crate) fn strip_query(uri: &str) -> &str {
    match uri.find(['?', '#']) {
        Some(index) => &uri[..index],
        None => uri,
    }
}
