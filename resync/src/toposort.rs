//! Dependency ordering for resources
//!
//! Resources are nodes keyed by URI; every in-set parent contributes an edge
//! parent -> child. The sort is a depth-first search with an explicit frame
//! stack, so deep parent chains cannot overflow the call stack, and the
//! output is the reversed post-order.

use indexmap::IndexMap;

use crate::error::{Result, SyncError};
use crate::resource::Resource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

/// Order `resources` so that every resource follows its in-set parents.
///
/// Parents outside the set create no edge. Duplicate URIs collapse to one
/// node holding the last payload at the first position. A cycle among the
/// resources is an error naming a URI on the cycle.
pub fn toposorted(resources: &[Resource]) -> Result<Vec<&Resource>> {
    let mut index: IndexMap<&str, &Resource> = IndexMap::with_capacity(resources.len());
    for resource in resources {
        index.insert(resource.uri(), resource);
    }
    let nodes: Vec<&Resource> = index.values().copied().collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
    for (position, resource) in nodes.iter().enumerate() {
        for parent in resource.parents() {
            if let Some(parent_position) = index.get_index_of(parent.as_str()) {
                children[parent_position].push(position);
            }
        }
    }

    let mut marks = vec![Mark::Unvisited; nodes.len()];
    let mut post_order = Vec::with_capacity(nodes.len());

    for start in 0..nodes.len() {
        if marks[start] != Mark::Unvisited {
            continue;
        }

        marks[start] = Mark::InProgress;
        let mut frames = vec![(start, 0usize)];

        while let Some((node, cursor)) = frames.last_mut() {
            let node = *node;
            match children[node].get(*cursor).copied() {
                Some(child) => {
                    *cursor += 1;
                    match marks[child] {
                        Mark::Unvisited => {
                            marks[child] = Mark::InProgress;
                            frames.push((child, 0));
                        }
                        Mark::InProgress => {
                            return Err(SyncError::Cycle {
                                uri: nodes[child].uri().to_string(),
                            });
                        }
                        Mark::Done => {}
                    }
                }
                None => {
                    marks[node] = Mark::Done;
                    post_order.push(node);
                    frames.pop();
                }
            }
        }
    }

    Ok(post_order.into_iter().rev().map(|position| nodes[position]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use serde_json::json;

    fn resource(kind: &str, id: u32, parents: &[&str]) -> Resource {
        Schema::Simple
            .decode(json!({
                "id": id,
                "type": kind,
                "uri": format!("http://example.com/{kind}/{id}"),
                "parents": parents,
            }))
            .unwrap()
    }

    fn uris<'a>(sorted: &[&'a Resource]) -> Vec<&'a str> {
        sorted.iter().map(|resource| resource.uri()).collect()
    }

    #[test]
    fn test_toposort() {
        let resources = vec![
            resource("foo", 1, &[]),
            resource("foo", 2, &["http://example.com/foo/1"]),
            resource("foo", 3, &[]),
            resource("bar", 1, &["http://example.com/foo/1"]),
        ];

        let sorted = toposorted(&resources).unwrap();

        assert_eq!(
            uris(&sorted),
            [
                "http://example.com/foo/3",
                "http://example.com/foo/1",
                "http://example.com/bar/1",
                "http://example.com/foo/2",
            ]
        );
    }

    #[test]
    fn test_parents_outside_the_set_are_ignored() {
        let resources = vec![
            resource("bar", 1, &["http://example.com/foo/404"]),
            resource("bar", 2, &[]),
        ];

        let sorted = toposorted(&resources).unwrap();
        assert_eq!(sorted.len(), 2);
    }

    #[test]
    fn test_cycle_is_detected() {
        let resources = vec![
            resource("foo", 1, &["http://example.com/foo/2"]),
            resource("foo", 2, &["http://example.com/foo/1"]),
        ];

        let error = toposorted(&resources).unwrap_err();
        match error {
            SyncError::Cycle { uri } => assert!(
                uri == "http://example.com/foo/1" || uri == "http://example.com/foo/2",
                "unexpected cycle uri: {uri}"
            ),
            other => panic!("Expected cycle error, got: {other}"),
        }
    }

    #[test]
    fn test_self_parent_is_a_cycle() {
        let resources = vec![resource("foo", 1, &["http://example.com/foo/1"])];
        assert!(matches!(toposorted(&resources), Err(SyncError::Cycle { .. })));
    }

    #[test]
    fn test_duplicates_collapse_to_last_payload() {
        let first = resource("foo", 1, &[]);
        let mut second_document = first.document().clone();
        second_document["name"] = json!("updated");
        let second = Schema::Simple.decode(second_document).unwrap();

        let resources = vec![first, resource("foo", 2, &[]), second];
        let sorted = toposorted(&resources).unwrap();

        assert_eq!(sorted.len(), 2);
        let foo = sorted
            .iter()
            .find(|resource| resource.uri() == "http://example.com/foo/1")
            .unwrap();
        assert_eq!(foo.document()["name"], json!("updated"));
    }

    #[test]
    fn test_long_chain_does_not_recurse() {
        let resources: Vec<_> = (0..10_000)
            .rev()
            .map(|id| {
                let parent = format!("http://example.com/foo/{}", id + 1);
                resource("foo", id, &[parent.as_str()])
            })
            .collect();

        let sorted = toposorted(&resources).unwrap();
        assert_eq!(sorted.first().unwrap().uri(), "http://example.com/foo/9999");
        assert_eq!(sorted.last().unwrap().uri(), "http://example.com/foo/0");
    }

    #[test]
    fn test_empty_input() {
        assert!(toposorted(&[]).unwrap().is_empty());
    }
}
