//! Result sequence of the `get_objects_for_*` queries.

use std::collections::btree_set;
use std::collections::BTreeSet;

use crate::access::{resolve_all, EntityResolver};
use crate::primitives::EntityRef;

/// Deduplicated object references, yielded in ascending [`EntityRef`] order.
///
/// The order depends only on the grants present, so repeated queries against
/// an unchanged store yield identical sequences.
#[derive(Debug)]
pub struct Objects {
    inner: btree_set::IntoIter<EntityRef>,
}

impl Objects {
    pub(crate) fn new(objects: BTreeSet<EntityRef>) -> Self {
        Objects {
            inner: objects.into_iter(),
        }
    }

    /// Lazily turns the references into objects, skipping any whose entity
    /// no longer exists.
    pub fn resolve<R: EntityResolver>(self, resolver: &R) -> impl Iterator<Item = R::Object> + '_ {
        resolve_all(resolver, self)
    }
}

impl Iterator for Objects {
    type Item = EntityRef;

    fn next(&mut self) -> Option<EntityRef> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Objects {}

impl DoubleEndedIterator for Objects {
    fn next_back(&mut self) -> Option<EntityRef> {
        self.inner.next_back()
    }
}
