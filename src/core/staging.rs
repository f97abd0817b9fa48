//! Staged construction.
//!
//! A [`Staging<D>`] is an isolated triangulation that only offers unchecked
//! edits: no lock checks, no change spans, no skeleton invalidation. Bulk
//! builders (subdivision, signature decoding, construction arrays) assemble
//! their result here and then hand it to a live triangulation in one step,
//! so the live triangulation sees exactly one change notification.

use std::sync::Arc;

use crate::core::perm::Perm;
use crate::core::simplex::Simplex;
use crate::core::triangulation::{SimplexKey, Triangulation};
use crate::topology::skeleton::Skeleton;

/// An unobserved triangulation under construction.
#[derive(Debug, Default)]
pub struct Staging<const D: usize> {
    tri: Triangulation<D>,
}

impl<const D: usize> Staging<D> {
    /// An empty staging area.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tri: Triangulation::new(),
        }
    }

    /// Number of simplices built so far.
    #[must_use]
    pub fn size(&self) -> usize {
        self.tri.size()
    }

    /// Key of the simplex at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= size()`.
    #[must_use]
    pub fn key(&self, index: usize) -> SimplexKey {
        self.tri.key(index)
    }

    /// The simplex addressed by `key`.
    #[must_use]
    pub fn simplex(&self, key: SimplexKey) -> Option<&Simplex<D>> {
        self.tri.simplex_by_key(key)
    }

    /// Read-only view of the triangulation being built.
    #[must_use]
    pub const fn triangulation(&self) -> &Triangulation<D> {
        &self.tri
    }

    /// Appends a boundary simplex.
    pub fn new_simplex(&mut self) -> SimplexKey {
        self.tri.new_simplex_raw(String::new())
    }

    /// Appends a labelled boundary simplex.
    pub fn new_simplex_with_description(&mut self, description: impl Into<String>) -> SimplexKey {
        self.tri.new_simplex_raw(description.into())
    }

    /// Appends `count` boundary simplices.
    pub fn new_simplices(&mut self, count: usize) -> Vec<SimplexKey> {
        (0..count)
            .map(|_| self.tri.new_simplex_raw(String::new()))
            .collect()
    }

    /// Glues `facet` of `key` to facet `gluing[facet]` of `other`.
    ///
    /// # Panics
    ///
    /// Panics if a key does not belong to this staging area or the facet is
    /// out of range. Debug builds also panic if either facet is already
    /// glued or the gluing does not act on `D + 1` points.
    pub fn join(&mut self, key: SimplexKey, facet: usize, other: SimplexKey, gluing: Perm) {
        self.tri.join_raw(key, facet, other, gluing);
    }

    /// Ungludes `facet` of `key`, returning the former partner.
    ///
    /// # Panics
    ///
    /// Panics if the key does not belong to this staging area.
    pub fn unjoin(&mut self, key: SimplexKey, facet: usize) -> Option<SimplexKey> {
        self.tri.unjoin_raw(key, facet)
    }

    /// Isolates and removes a simplex.
    pub fn remove_simplex(&mut self, key: SimplexKey) {
        self.tri.remove_simplices_raw(&[key]);
    }

    /// Isolates and removes several simplices, re-indexing once.
    pub fn remove_simplices(&mut self, keys: &[SimplexKey]) {
        self.tri.remove_simplices_raw(keys);
    }

    /// Skeleton of the staged triangulation.
    ///
    /// Raw edits do not invalidate it; call
    /// [`Staging::clear_skeleton`] after editing past a skeleton query.
    pub fn skeleton(&self) -> Arc<Skeleton<D>> {
        self.tri.skeleton()
    }

    /// Drops a cached skeleton.
    pub fn clear_skeleton(&self) {
        self.tri.clear_skeleton();
    }

    /// Replaces the contents of `dest` with the staged simplices.
    ///
    /// `dest`'s former simplices are dropped. `dest` receives one change
    /// notification.
    pub fn adopt_into(mut self, dest: &mut Triangulation<D>) {
        tracing::debug!(simplices = self.tri.size(), "adopting staged triangulation");
        dest.swap_contents(&mut self.tri);
    }

    /// Appends the staged simplices to `dest`. `dest` receives one change
    /// notification.
    pub fn append_to(mut self, dest: &mut Triangulation<D>) {
        tracing::debug!(simplices = self.tri.size(), "appending staged triangulation");
        self.tri.move_contents_to(dest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staged_edits_are_silent_until_adoption() {
        let mut live = Triangulation::<2>::new();
        let before = live.version();
        let mut staging = Staging::<2>::new();
        let keys = staging.new_simplices(3);
        staging.join(keys[0], 0, keys[1], Perm::IDENTITY);
        staging.join(keys[1], 1, keys[2], Perm::IDENTITY);
        assert_eq!(staging.triangulation().version(), 0);

        staging.adopt_into(&mut live);
        assert_eq!(live.size(), 3);
        assert_eq!(live.version(), before + 1);
        assert_eq!(live.notifications_fired(), 1);
        assert!(live.validate_structure().is_ok());
    }

    #[test]
    fn adoption_discards_previous_contents() {
        let mut live = Triangulation::<3>::new();
        live.new_simplices(4);
        let mut staging = Staging::<3>::new();
        staging.new_simplex();
        staging.adopt_into(&mut live);
        assert_eq!(live.size(), 1);
    }

    #[test]
    fn append_keeps_existing_simplices() {
        let mut live = Triangulation::<3>::new();
        live.new_simplex();
        let mut staging = Staging::<3>::new();
        let a = staging.new_simplex_with_description("staged");
        staging.join(a, 0, a, Perm::transposition(0, 1));
        staging.append_to(&mut live);
        assert_eq!(live.size(), 2);
        assert_eq!(live.simplex(1).description(), "staged");
        assert_eq!(live.facet_gluing(1, 0), Some((1, Perm::transposition(0, 1))));
        assert!(live.validate_structure().is_ok());
    }

    #[test]
    fn batch_removal_reindexes() {
        let mut staging = Staging::<3>::new();
        let keys = staging.new_simplices(5);
        staging.join(keys[0], 3, keys[4], Perm::IDENTITY);
        staging.join(keys[1], 3, keys[2], Perm::IDENTITY);
        staging.remove_simplices(&[keys[1], keys[3], keys[1]]);
        assert_eq!(staging.size(), 3);
        assert_eq!(staging.key(2), keys[4]);
        assert_eq!(staging.simplex(keys[4]).map(Simplex::index), Some(2));
        assert!(staging.simplex(keys[2]).is_some_and(Simplex::has_boundary));
        assert!(staging.triangulation().validate_structure().is_ok());
    }

    #[test]
    fn skeleton_must_be_cleared_after_raw_edits() {
        let mut staging = Staging::<3>::new();
        let a = staging.new_simplex();
        assert_eq!(staging.skeleton().count_vertices(), 4);
        staging.join(a, 0, a, Perm::transposition(0, 1));
        assert_eq!(staging.skeleton().count_vertices(), 4);
        staging.clear_skeleton();
        assert_eq!(staging.skeleton().count_vertices(), 3);
    }
}
