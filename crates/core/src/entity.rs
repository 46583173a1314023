//! Things with a stable key.

/// A record identified by its key rather than its attributes.
///
/// Two identity records with the same key describe the same subject even when
/// department or title differ; uniqueness checks within a run go through
/// [`Entity::id`].
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
