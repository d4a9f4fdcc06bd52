//! Document schemas
//!
//! A schema tells how to read identity, type and links out of a raw
//! document. Two conventions are supported:
//!
//! - `Hal`: the URI is the `_links.self.href`, the type is the path segment
//!   before the identifier, and every link that is neither `self` nor a
//!   `child:*` relation names a parent.
//! - `Simple`: `uri`, `type`, `parents` and `links` are explicit fields.

use serde::{Deserialize, Serialize};
use indexmap::IndexSet;
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};
use crate::follow::{CHILD_PREFIX, SELF_RELATION};
use crate::resource::{strip_query, Link, Resource};

/// Relation given to links listed without one
pub const RELATED_RELATION: &str = "related";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schema {
    #[default]
    Hal,
    Simple,
}

impl Schema {
    /// Wrap `document` as a resource of this schema.
    pub fn decode(&self, document: Value) -> Result<Resource> {
        let Value::Object(fields) = &document else {
            return Err(SyncError::schema(format!(
                "{self} resource must be an object, got: {document}"
            )));
        };

        let (uri, type_name, links, parents) = match self {
            Schema::Hal => {
                let links = hal_links(fields)?;
                let uri = links
                    .iter()
                    .find(|link| link.relation == SELF_RELATION)
                    .map(|link| link.target.clone())
                    .ok_or_else(|| SyncError::schema("HAL resource has no self link"))?;
                let type_name = type_from_uri(&uri);
                let parents = unique(
                    links
                        .iter()
                        .filter(|link| is_parent_relation(&link.relation))
                        .map(|link| link.target.clone()),
                );
                (uri, type_name, links, parents)
            }
            Schema::Simple => {
                let uri = required_string(fields, "uri")?;
                let type_name = required_string(fields, "type")?;
                let links = simple_links(fields)?;
                let parents = simple_parents(fields)?;
                (uri, type_name, links, parents)
            }
        };

        Ok(Resource::new(*self, document, uri, type_name, links, parents))
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Schema::Hal => write!(f, "HAL"),
            Schema::Simple => write!(f, "Simple"),
        }
    }
}

impl std::str::FromStr for Schema {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "hal" => Ok(Schema::Hal),
            "simple" => Ok(Schema::Simple),
            other => Err(SyncError::config(format!("Unknown schema: {other}"))),
        }
    }
}

fn is_parent_relation(relation: &str) -> bool {
    relation != SELF_RELATION && !relation.starts_with(CHILD_PREFIX)
}

/// The second to last `/` segment: `https://example.com/path/to/<type>/<id>`.
///
/// URIs without such a segment (an API root, say) yield the host or an empty
/// type; the type only routes writes.
fn type_from_uri(uri: &str) -> String {
    let mut segments = strip_query(uri).rsplit('/');
    segments.next();
    segments.next().unwrap_or_default().to_string()
}

fn hal_links(fields: &Map<String, Value>) -> Result<Vec<Link>> {
    let Some(Value::Object(relations)) = fields.get("_links") else {
        return Err(SyncError::schema("HAL resource has no _links object"));
    };

    let mut links = Vec::new();
    for (relation, value) in relations {
        match value {
            Value::Array(entries) => {
                links.extend(entries.iter().filter_map(href).map(|target| Link::new(relation, target)));
            }
            entry => {
                if let Some(target) = href(entry) {
                    links.push(Link::new(relation, target));
                }
            }
        }
    }
    Ok(links)
}

fn href(link: &Value) -> Option<&str> {
    link.get("href").and_then(Value::as_str)
}

fn required_string(fields: &Map<String, Value>, name: &str) -> Result<String> {
    match fields.get(name) {
        Some(Value::String(value)) => Ok(value.clone()),
        Some(other) => Err(SyncError::schema(format!(
            "Field '{name}' must be a string, got: {other}"
        ))),
        None => Err(SyncError::schema(format!("Resource has no '{name}' field"))),
    }
}

fn string_list(value: &Value, name: &str) -> Result<Vec<String>> {
    match value {
        Value::String(single) => Ok(vec![single.clone()]),
        Value::Array(entries) => entries
            .iter()
            .map(|entry| {
                entry.as_str().map(str::to_string).ok_or_else(|| {
                    SyncError::schema(format!("Field '{name}' must only hold strings, got: {entry}"))
                })
            })
            .collect(),
        other => Err(SyncError::schema(format!(
            "Field '{name}' must be a list of strings, got: {other}"
        ))),
    }
}

fn simple_parents(fields: &Map<String, Value>) -> Result<Vec<String>> {
    match fields.get("parents") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(unique(string_list(value, "parents")?)),
    }
}

/// Drop repeated URIs, keeping the first occurrence
fn unique(uris: impl IntoIterator<Item = String>) -> Vec<String> {
    uris.into_iter().collect::<IndexSet<_>>().into_iter().collect()
}

fn simple_links(fields: &Map<String, Value>) -> Result<Vec<Link>> {
    match fields.get("links") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Object(relations)) => {
            let mut links = Vec::new();
            for (relation, targets) in relations {
                for target in string_list(targets, "links")? {
                    links.push(Link::new(relation, target));
                }
            }
            Ok(links)
        }
        Some(value) => Ok(string_list(value, "links")?
            .into_iter()
            .map(|target| Link::new(RELATED_RELATION, target))
            .collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::follow::FollowMode;
    use serde_json::json;
    use test_case::test_case;

    const ID: &str = "c7f12ba5885f4b47bfafaa583cd5a097";

    fn uri() -> String {
        format!("http://example.com/foo/{ID}")
    }

    #[test]
    fn test_hal_resource() {
        let resource = Schema::Hal
            .decode(json!({
                "id": ID,
                "_links": {"self": {"href": uri()}},
            }))
            .unwrap();

        assert_eq!(resource.id(), Some(&json!(ID)));
        assert_eq!(resource.type_name(), "foo");
        assert_eq!(resource.uri(), uri());
        assert!(resource.parents().is_empty());
    }

    #[test]
    fn test_simple_resource() {
        let resource = Schema::Simple
            .decode(json!({"id": ID, "type": "foo", "uri": uri()}))
            .unwrap();

        assert_eq!(resource.id(), Some(&json!(ID)));
        assert_eq!(resource.type_name(), "foo");
        assert_eq!(resource.uri(), uri());
    }

    #[test]
    fn test_hal_parents_exclude_self_and_children() {
        let resource = Schema::Hal
            .decode(json!({
                "id": "1",
                "_links": {
                    "self": {"href": "http://example.com/bar/1"},
                    "foo": {"href": "http://example.com/foo/1"},
                    "child:baz": [
                        {"href": "http://example.com/baz/1"},
                        {"href": "http://example.com/baz/2"},
                    ],
                    "tags": [
                        {"href": "http://example.com/tag/1"},
                        {"href": "http://example.com/tag/2"},
                    ],
                },
            }))
            .unwrap();

        assert_eq!(
            resource.parents(),
            [
                "http://example.com/foo/1",
                "http://example.com/tag/1",
                "http://example.com/tag/2",
            ]
        );
        let children: Vec<_> = resource.links(FollowMode::Child).collect();
        assert_eq!(children, ["http://example.com/baz/1", "http://example.com/baz/2"]);
    }

    #[test]
    fn test_hal_type_ignores_query() {
        let resource = Schema::Hal
            .decode(json!({
                "_links": {"self": {"href": "http://example.com/api/foo?offset=0&limit=20"}},
            }))
            .unwrap();

        assert_eq!(resource.type_name(), "api");
        assert!(!resource.has_id());
    }

    #[test_case("http://example.com/api/foo/1", "foo" ; "resource")]
    #[test_case("http://example.com/api/foo/1/", "1" ; "trailing slash")]
    #[test_case("http://example.com/", "example.com" ; "root with slash")]
    #[test_case("http://localhost:5000/", "localhost:5000" ; "root with port")]
    #[test_case("http://example.com", "" ; "bare host")]
    #[test_case("foo", "" ; "no separator")]
    fn test_type_from_uri(uri: &str, expected: &str) {
        assert_eq!(type_from_uri(uri), expected);
    }

    #[test]
    fn test_hal_root_document_is_a_container() {
        for root in ["http://example.com/", "http://example.com", "http://localhost:5000/"] {
            let resource = Schema::Hal
                .decode(json!({
                    "_links": {
                        "self": {"href": root},
                        "child:foo": {"href": "http://example.com/foo/1"},
                    },
                }))
                .unwrap();

            assert!(!resource.has_id());
            let children: Vec<_> = resource.links(FollowMode::Child).collect();
            assert_eq!(children, ["http://example.com/foo/1"], "{root}");
        }
    }

    #[test]
    fn test_hal_links_keep_document_order() {
        let resource = Schema::Hal
            .decode(json!({
                "id": "1",
                "_links": {
                    "self": {"href": "http://example.com/bar/1"},
                    "zebra": {"href": "http://example.com/zebra/1"},
                    "apple": [
                        {"href": "http://example.com/apple/1"},
                        {"href": "http://example.com/zebra/1"},
                    ],
                },
            }))
            .unwrap();

        assert_eq!(
            resource.parents(),
            ["http://example.com/zebra/1", "http://example.com/apple/1"]
        );
    }

    #[test]
    fn test_simple_parents_are_deduplicated() {
        let resource = Schema::Simple
            .decode(json!({
                "type": "foo",
                "uri": "http://example.com/foo/1",
                "parents": [
                    "http://example.com/baz/2",
                    "http://example.com/baz/1",
                    "http://example.com/baz/2",
                ],
            }))
            .unwrap();

        assert_eq!(
            resource.parents(),
            ["http://example.com/baz/2", "http://example.com/baz/1"]
        );
    }

    #[test]
    fn test_hal_requires_self_link() {
        let error = Schema::Hal
            .decode(json!({"id": "1", "_links": {"next": {"href": "http://example.com/foo/2"}}}))
            .unwrap_err();
        assert!(matches!(error, SyncError::Schema { .. }));

        let error = Schema::Hal.decode(json!({"id": "1"})).unwrap_err();
        assert!(matches!(error, SyncError::Schema { .. }));
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        assert!(matches!(
            Schema::Hal.decode(json!(["not", "a", "resource"])),
            Err(SyncError::Schema { .. })
        ));
        assert!(matches!(
            Schema::Simple.decode(json!("resource")),
            Err(SyncError::Schema { .. })
        ));
    }

    #[test]
    fn test_simple_requires_uri_and_type() {
        assert!(Schema::Simple.decode(json!({"id": "1", "type": "foo"})).is_err());
        assert!(Schema::Simple.decode(json!({"id": "1", "uri": uri()})).is_err());
        assert!(Schema::Simple
            .decode(json!({"id": "1", "type": 7, "uri": uri()}))
            .is_err());
    }

    #[test]
    fn test_simple_links_as_map() {
        let resource = Schema::Simple
            .decode(json!({
                "type": "foo",
                "uri": "http://example.com/foo",
                "links": {
                    "next": "http://example.com/foo?page=2",
                    "child:bar": ["http://example.com/bar/1", "http://example.com/bar/2"],
                },
            }))
            .unwrap();

        let page: Vec<_> = resource.links(FollowMode::Page).collect();
        assert_eq!(page, ["http://example.com/foo?page=2"]);
        assert_eq!(resource.links(FollowMode::Child).count(), 3);
    }

    #[test]
    fn test_simple_links_as_list() {
        let resource = Schema::Simple
            .decode(json!({
                "type": "foo",
                "uri": "http://example.com/foo/1",
                "links": ["http://example.com/bar/1"],
                "parents": ["http://example.com/baz/1"],
            }))
            .unwrap();

        assert_eq!(resource.links(FollowMode::Child).count(), 0);
        let all: Vec<_> = resource.links(FollowMode::All).collect();
        assert_eq!(all, ["http://example.com/bar/1"]);
        assert_eq!(resource.parents(), ["http://example.com/baz/1"]);
    }

    #[test]
    fn test_parse_schema() {
        assert_eq!("HAL".parse::<Schema>().unwrap(), Schema::Hal);
        assert_eq!("simple".parse::<Schema>().unwrap(), Schema::Simple);
        assert!("xml".parse::<Schema>().is_err());
    }
}
