//! Entity reference resolution.
//!
//! Grants point at objects through an [`EntityRef`]. Turning a reference back
//! into a live object is the job of whatever owns the entities; the engine only
//! needs [`EntityResolver`] when a caller wants objects instead of references.

use crate::primitives::EntityRef;

/// Maps between concrete objects and their `(type, id)` references.
///
/// `identify` must be deterministic and total. `resolve` returns `None` for a
/// dangling reference (the entity was deleted but its grants were not).
pub trait EntityResolver {
    type Object;

    fn resolve(&self, reference: &EntityRef) -> Option<Self::Object>;

    fn identify(&self, object: &Self::Object) -> EntityRef;
}

/// Resolves an iterator of references lazily, skipping dangling ones.
pub fn resolve_all<'r, R, I>(resolver: &'r R, references: I) -> impl Iterator<Item = R::Object> + 'r
where
    R: EntityResolver,
    I: IntoIterator<Item = EntityRef>,
    I::IntoIter: 'r,
{
    references.into_iter().filter_map(move |reference| {
        let object = resolver.resolve(&reference);
        if object.is_none() {
            tracing::debug!(%reference, "skipping dangling entity reference");
        }
        object
    })
}
