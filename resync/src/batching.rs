//! Partitioning of ordered resources into write batches

use crate::resource::Resource;

/// Split `resources` into contiguous batches of at most `batch_size`.
///
/// A batch never spans two collections, so a bulk write always targets a
/// single prefix. Order is preserved; a `batch_size` of zero is treated as 1.
pub fn batched<'a>(resources: &[&'a Resource], batch_size: usize) -> Vec<Vec<&'a Resource>> {
    let batch_size = batch_size.max(1);
    let mut batches: Vec<Vec<&'a Resource>> = Vec::new();
    let mut current: Vec<&'a Resource> = Vec::with_capacity(batch_size);

    for &resource in resources {
        let boundary = current.len() == batch_size
            || current
                .last()
                .is_some_and(|last| last.collection_uri() != resource.collection_uri());

        if boundary {
            batches.push(std::mem::replace(&mut current, Vec::with_capacity(batch_size)));
        }
        current.push(resource);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    batches
}
