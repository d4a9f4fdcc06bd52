//! Union of resources read from several origins

use indexmap::IndexMap;

use crate::resource::Resource;

/// Merge origin reads into one set keyed by URI.
///
/// The first occurrence of a URI fixes its position; the last occurrence
/// supplies the payload.
pub fn merge<I>(reads: I) -> Vec<Resource>
where
    I: IntoIterator<Item = Vec<Resource>>,
{
    let mut merged: IndexMap<String, Resource> = IndexMap::new();
    for resource in reads.into_iter().flatten() {
        merged.insert(resource.uri().to_string(), resource);
    }
    merged.into_values().collect()
}
