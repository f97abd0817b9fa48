//! The triangulation container.
//!
//! [`Triangulation<D>`] owns an ordered, densely indexed set of
//! [`Simplex<D>`]s stored in a slotmap. Safe operations check their
//! preconditions, honour locks, run inside a [`ChangeSpan`] and drop the
//! cached [`Skeleton`]. The crate-internal `*_raw` operations skip all of
//! that; they are used on isolated staging triangulations (see
//! [`Staging`](crate::core::staging::Staging)) that are later adopted whole.
//!
//! # Invariants
//!
//! - Indices are `0..size()` and match positions in the index order.
//! - If facet `f` of `A` is glued to `B` via `p`, then facet `p[f]` of `B`
//!   is glued to `A` via `p⁻¹`.
//! - Every adjacency points at a member of the same triangulation.
//! - Facet locks on glued facets are recorded on both sides.
//!
//! [`Triangulation::validate_structure`] re-checks all of them.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use slotmap::new_key_type;
use thiserror::Error;
use uuid::Uuid;

use crate::core::change::{ChangeListener, ChangeSpan, ChangeTracker, ListenerId};
use crate::core::collections::{StorageMap, fast_hash_map_with_capacity};
use crate::core::perm::Perm;
use crate::core::simplex::{Adjacency, LockViolation, Simplex};
use crate::core::util::{UuidValidationError, make_uuid, validate_uuid};
use crate::topology::skeleton::Skeleton;

new_key_type! {
    /// Handle to a simplex in its triangulation's storage.
    ///
    /// Keys survive [`Triangulation::swap_contents`]; they are re-issued by
    /// [`Triangulation::move_contents_to`] and never shared between
    /// triangulations.
    pub struct SimplexKey;
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors reported by the checked triangulation API.
///
/// A failed operation leaves the triangulation untouched.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum TriangulationError {
    /// The key does not address a simplex of this triangulation.
    #[error("simplex key {key:?} does not belong to this triangulation")]
    UnknownSimplex {
        /// The offending key.
        key: SimplexKey,
    },
    /// A simplex index was past the end.
    #[error("simplex index {index} is out of range for a triangulation of size {size}")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The triangulation size.
        size: usize,
    },
    /// A facet number was larger than the dimension.
    #[error("facet {facet} is out of range for a {dimension}-simplex")]
    FacetOutOfRange {
        /// The requested facet.
        facet: usize,
        /// The simplex dimension.
        dimension: usize,
    },
    /// The gluing does not permute the simplex's vertices.
    #[error("gluing {gluing} does not permute the {vertices} vertices of a simplex")]
    InvalidGluing {
        /// The offending permutation.
        gluing: Perm,
        /// Number of vertices per simplex.
        vertices: usize,
    },
    /// A facet cannot be glued to itself.
    #[error("facet {facet} of simplex {index} cannot be glued to itself")]
    SameFacet {
        /// Index of the simplex.
        index: usize,
        /// The facet.
        facet: usize,
    },
    /// A facet that must be boundary is already glued.
    #[error("facet {facet} of simplex {index} is already glued")]
    AlreadyGlued {
        /// Index of the simplex.
        index: usize,
        /// The glued facet.
        facet: usize,
    },
    /// A facet that must be glued is boundary.
    #[error("facet {facet} of simplex {index} is not glued")]
    NotGlued {
        /// Index of the simplex.
        index: usize,
        /// The boundary facet.
        facet: usize,
    },
    /// A simplex or facet lock forbids the edit.
    #[error(transparent)]
    Locked(#[from] LockViolation),
}

/// A broken structural invariant, as found by
/// [`Triangulation::validate_structure`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum StructureError {
    /// Storage and index order disagree on the number of simplices.
    #[error("storage holds {stored} simplices but the index order lists {ordered}")]
    CountMismatch {
        /// Simplices in storage.
        stored: usize,
        /// Entries in the index order.
        ordered: usize,
    },
    /// The index order names a key missing from storage.
    #[error("index order position {position} names a missing simplex")]
    MissingSimplex {
        /// Position in the index order.
        position: usize,
    },
    /// A simplex records the wrong index.
    #[error("simplex at position {position} records index {recorded}")]
    IndexMismatch {
        /// Actual position.
        position: usize,
        /// Index stored on the simplex.
        recorded: usize,
    },
    /// A simplex claims a different owner.
    #[error("simplex {index} is owned by another triangulation")]
    ForeignOwner {
        /// Index of the simplex.
        index: usize,
    },
    /// A simplex UUID is malformed.
    #[error("simplex {index} has an invalid UUID: {source}")]
    InvalidUuid {
        /// Index of the simplex.
        index: usize,
        /// Why the UUID was rejected.
        source: UuidValidationError,
    },
    /// An adjacency points outside the triangulation.
    #[error("facet {facet} of simplex {index} is glued to a simplex outside this triangulation")]
    DanglingAdjacency {
        /// Index of the simplex.
        index: usize,
        /// The facet.
        facet: usize,
    },
    /// A gluing does not permute the simplex's vertices.
    #[error("facet {facet} of simplex {index} carries the invalid gluing {gluing}")]
    InvalidGluing {
        /// Index of the simplex.
        index: usize,
        /// The facet.
        facet: usize,
        /// The stored permutation.
        gluing: Perm,
    },
    /// A facet is glued to itself.
    #[error("facet {facet} of simplex {index} is glued to itself")]
    SelfGluedFacet {
        /// Index of the simplex.
        index: usize,
        /// The facet.
        facet: usize,
    },
    /// The far side does not record the inverse gluing.
    #[error("the gluing on facet {facet} of simplex {index} is not mirrored on the far side")]
    AsymmetricGluing {
        /// Index of the simplex.
        index: usize,
        /// The facet.
        facet: usize,
    },
    /// A facet lock is recorded on only one side of a gluing.
    #[error("the lock on facet {facet} of simplex {index} is not mirrored on the far side")]
    AsymmetricLock {
        /// Index of the simplex.
        index: usize,
        /// The facet.
        facet: usize,
    },
}

// =============================================================================
// TRIANGULATION
// =============================================================================

/// A `D`-dimensional triangulation: simplices glued pairwise along facets.
///
/// # Examples
///
/// ```rust
/// use gluing::prelude::*;
///
/// let mut tri = Triangulation::<3>::new();
/// let a = tri.new_simplex();
/// let b = tri.new_simplex();
/// tri.join(a, 0, b, Perm::from_images([1, 0, 2, 3])).unwrap();
///
/// assert_eq!(tri.simplex(1).adjacent_simplex(1), Some(a));
/// assert_eq!(tri.count_boundary_facets(), 6);
/// assert_eq!(tri.version(), 3);
/// ```
#[derive(Debug)]
pub struct Triangulation<const D: usize> {
    simplices: StorageMap<SimplexKey, Simplex<D>>,
    order: Vec<SimplexKey>,
    id: Uuid,
    changes: ChangeTracker,
    skeleton: ArcSwapOption<Skeleton<D>>,
}

impl<const D: usize> Triangulation<D> {
    /// An empty triangulation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            simplices: StorageMap::with_key(),
            order: Vec::new(),
            id: make_uuid(),
            changes: ChangeTracker::new(),
            skeleton: ArcSwapOption::empty(),
        }
    }

    /// The dimension `D`.
    #[must_use]
    pub const fn dimension() -> usize {
        D
    }

    /// Identity of this triangulation; every owned simplex records it.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    // -------------------------------------------------------------------------
    // Read access
    // -------------------------------------------------------------------------

    /// Number of top-dimensional simplices.
    #[must_use]
    pub fn size(&self) -> usize {
        self.order.len()
    }

    /// Whether the triangulation has no simplices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Key of the simplex at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= size()`.
    #[must_use]
    pub fn key(&self, index: usize) -> SimplexKey {
        self.order[index]
    }

    /// Key of the simplex at `index`, if any.
    #[must_use]
    pub fn get_key(&self, index: usize) -> Option<SimplexKey> {
        self.order.get(index).copied()
    }

    /// The simplex at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= size()`.
    #[must_use]
    pub fn simplex(&self, index: usize) -> &Simplex<D> {
        &self.simplices[self.order[index]]
    }

    /// The simplex at `index`, if any.
    #[must_use]
    pub fn get_simplex(&self, index: usize) -> Option<&Simplex<D>> {
        self.get_key(index).and_then(|key| self.simplices.get(key))
    }

    /// The simplex addressed by `key`, if it belongs here.
    #[must_use]
    pub fn simplex_by_key(&self, key: SimplexKey) -> Option<&Simplex<D>> {
        self.simplices.get(key)
    }

    /// Whether `key` addresses a simplex of this triangulation.
    #[must_use]
    pub fn contains_key(&self, key: SimplexKey) -> bool {
        self.simplices.contains_key(key)
    }

    /// Current index of the simplex addressed by `key`.
    #[must_use]
    pub fn index_of(&self, key: SimplexKey) -> Option<usize> {
        self.simplices.get(key).map(Simplex::index)
    }

    /// Finds a simplex by its stable UUID.
    #[must_use]
    pub fn key_from_uuid(&self, uuid: Uuid) -> Option<SimplexKey> {
        self.simplices
            .iter()
            .find_map(|(key, simplex)| (simplex.uuid() == uuid).then_some(key))
    }

    /// Keys in index order.
    pub fn keys(&self) -> impl ExactSizeIterator<Item = SimplexKey> + '_ {
        self.order.iter().copied()
    }

    /// Simplices in index order.
    pub fn simplices(&self) -> impl ExactSizeIterator<Item = (SimplexKey, &Simplex<D>)> + '_ {
        self.order.iter().map(|&key| (key, &self.simplices[key]))
    }

    /// Whether `simplex` belongs to this triangulation.
    #[must_use]
    pub fn owns(&self, simplex: &Simplex<D>) -> bool {
        simplex.owner == self.id
    }

    /// The gluing on `facet` of the simplex at `index`, as the adjacent
    /// simplex's index and the gluing permutation.
    #[must_use]
    pub fn facet_gluing(&self, index: usize, facet: usize) -> Option<(usize, Perm)> {
        let adj = self.get_simplex(index)?.adjacent(facet)?;
        Some((self.simplices[adj.simplex].index, adj.gluing))
    }

    /// Number of boundary facets over all simplices.
    #[must_use]
    pub fn count_boundary_facets(&self) -> usize {
        self.simplices
            .values()
            .map(|simplex| simplex.boundary_facets().count())
            .sum()
    }

    /// Whether any facet is boundary.
    #[must_use]
    pub fn has_boundary_facets(&self) -> bool {
        self.simplices.values().any(Simplex::has_boundary)
    }

    // -------------------------------------------------------------------------
    // Change tracking
    // -------------------------------------------------------------------------

    /// Number of top-level changes made so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.changes.version()
    }

    /// Number of change notifications fired so far.
    #[must_use]
    pub fn notifications_fired(&self) -> u64 {
        self.changes.notifications_fired()
    }

    /// Opens a change span, grouping every edit made while the guard lives
    /// into one notification.
    pub fn change_span(&self) -> ChangeSpan {
        self.changes.span()
    }

    /// Registers a listener for change notifications.
    pub fn subscribe(&self, listener: ChangeListener) -> ListenerId {
        self.changes.subscribe(listener)
    }

    /// Removes a listener. Returns whether it was registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.changes.unsubscribe(id)
    }

    // -------------------------------------------------------------------------
    // Skeleton cache
    // -------------------------------------------------------------------------

    /// The skeleton, computed on first use after each structural edit.
    pub fn skeleton(&self) -> Arc<Skeleton<D>> {
        if let Some(skeleton) = self.skeleton.load_full() {
            return skeleton;
        }
        let built = Arc::new(Skeleton::compute(self));
        self.skeleton.store(Some(Arc::clone(&built)));
        built
    }

    /// Whether a skeleton is currently cached.
    #[must_use]
    pub fn has_cached_skeleton(&self) -> bool {
        self.skeleton.load().is_some()
    }

    pub(crate) fn clear_skeleton(&self) {
        self.skeleton.store(None);
    }

    // -------------------------------------------------------------------------
    // Checked mutation
    // -------------------------------------------------------------------------

    /// Appends a new, fully boundary simplex.
    pub fn new_simplex(&mut self) -> SimplexKey {
        self.new_simplex_with_description(String::new())
    }

    /// Appends a new, fully boundary simplex with a label.
    pub fn new_simplex_with_description(&mut self, description: impl Into<String>) -> SimplexKey {
        let _span = self.changes.span();
        let key = self.new_simplex_raw(description.into());
        self.clear_skeleton();
        key
    }

    /// Appends `count` new simplices under a single notification.
    pub fn new_simplices(&mut self, count: usize) -> Vec<SimplexKey> {
        let _span = self.changes.span();
        let keys = (0..count)
            .map(|_| self.new_simplex_raw(String::new()))
            .collect();
        self.clear_skeleton();
        keys
    }

    /// Replaces the label of a simplex.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::UnknownSimplex`] for a foreign key.
    pub fn set_description(
        &mut self,
        key: SimplexKey,
        description: impl Into<String>,
    ) -> Result<(), TriangulationError> {
        self.checked(key)?;
        let _span = self.changes.span();
        self.simplices[key].set_description(description.into());
        Ok(())
    }

    /// Glues `facet` of `key` to facet `gluing[facet]` of `other`.
    ///
    /// `gluing` maps the vertex labels of `key` onto those of `other`; the
    /// reverse side records `gluing⁻¹`.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if either key is foreign, the facet
    /// is out of range, the gluing does not permute `D + 1` points, the two
    /// facets coincide, either simplex or facet is locked, or either facet is
    /// already glued.
    pub fn join(
        &mut self,
        key: SimplexKey,
        facet: usize,
        other: SimplexKey,
        gluing: Perm,
    ) -> Result<(), TriangulationError> {
        let me = self.checked(key)?;
        let them = self.checked(other)?;
        Self::check_facet(facet)?;
        if !gluing.acts_on(D + 1) {
            return Err(TriangulationError::InvalidGluing {
                gluing,
                vertices: D + 1,
            });
        }
        let other_facet = gluing.image(facet);
        if key == other && other_facet == facet {
            return Err(TriangulationError::SameFacet {
                index: me.index,
                facet,
            });
        }
        me.check_facet_unlocked(facet)?;
        them.check_facet_unlocked(other_facet)?;
        if !me.is_boundary_facet(facet) {
            return Err(TriangulationError::AlreadyGlued {
                index: me.index,
                facet,
            });
        }
        if !them.is_boundary_facet(other_facet) {
            return Err(TriangulationError::AlreadyGlued {
                index: them.index,
                facet: other_facet,
            });
        }

        let _span = self.changes.span();
        self.join_raw(key, facet, other, gluing);
        self.clear_skeleton();
        Ok(())
    }

    /// Ungludes `facet` of `key` on both sides. Returns the former partner.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the key is foreign, the facet is
    /// out of range, either side is locked, or the facet is boundary.
    pub fn unjoin(&mut self, key: SimplexKey, facet: usize) -> Result<SimplexKey, TriangulationError> {
        let me = self.checked(key)?;
        Self::check_facet(facet)?;
        me.check_facet_unlocked(facet)?;
        let Some(adj) = me.adjacent(facet) else {
            return Err(TriangulationError::NotGlued {
                index: me.index,
                facet,
            });
        };
        self.simplices[adj.simplex].check_facet_unlocked(adj.facet(facet))?;

        let _span = self.changes.span();
        self.unjoin_raw(key, facet);
        self.clear_skeleton();
        Ok(adj.simplex)
    }

    /// Ungludes every facet of `key`.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the key is foreign or any glued
    /// facet (on either side) is locked.
    pub fn isolate(&mut self, key: SimplexKey) -> Result<(), TriangulationError> {
        let me = self.checked(key)?;
        for facet in 0..=D {
            if let Some(adj) = me.adjacent(facet) {
                me.check_facet_unlocked(facet)?;
                self.simplices[adj.simplex].check_facet_unlocked(adj.facet(facet))?;
            }
        }

        let _span = self.changes.span();
        self.isolate_raw(key);
        self.clear_skeleton();
        Ok(())
    }

    /// Isolates and removes a simplex; later simplices move down one index.
    ///
    /// # Errors
    ///
    /// Fails without changing anything if the key is foreign or the simplex
    /// or any of its facets is locked.
    pub fn remove_simplex(&mut self, key: SimplexKey) -> Result<(), TriangulationError> {
        let me = self.checked(key)?;
        if me.is_locked() {
            return Err(LockViolation::Simplex { index: me.index }.into());
        }
        if let Some(facet) = (0..=D).find(|&facet| me.is_facet_locked(facet)) {
            return Err(LockViolation::Facet {
                index: me.index,
                facet,
            }
            .into());
        }

        let _span = self.changes.span();
        self.remove_simplices_raw(&[key]);
        self.clear_skeleton();
        Ok(())
    }

    /// Removes the simplex at `index`.
    ///
    /// # Errors
    ///
    /// As [`Triangulation::remove_simplex`], plus
    /// [`TriangulationError::IndexOutOfRange`].
    pub fn remove_simplex_at(&mut self, index: usize) -> Result<(), TriangulationError> {
        let key = self
            .get_key(index)
            .ok_or(TriangulationError::IndexOutOfRange {
                index,
                size: self.size(),
            })?;
        self.remove_simplex(key)
    }

    /// Removes every simplex.
    ///
    /// # Errors
    ///
    /// Returns [`LockViolation::Triangulation`] if any lock is held.
    pub fn remove_all_simplices(&mut self) -> Result<(), LockViolation> {
        if self.has_locks() {
            return Err(LockViolation::Triangulation {
                operation: "remove_all_simplices",
            });
        }
        let _span = self.changes.span();
        self.simplices.clear();
        self.order.clear();
        self.clear_skeleton();
        Ok(())
    }

    /// Exchanges the simplices of two triangulations.
    ///
    /// Simplices are re-owned rather than copied: their keys, UUIDs and
    /// gluings stay as they were, now reachable through the other container.
    pub fn swap_contents(&mut self, other: &mut Self) {
        let _mine = self.changes.span();
        let _theirs = other.changes.span();
        std::mem::swap(&mut self.simplices, &mut other.simplices);
        std::mem::swap(&mut self.order, &mut other.order);
        self.reown();
        other.reown();
        self.clear_skeleton();
        other.clear_skeleton();
        tracing::trace!(
            left = self.size(),
            right = other.size(),
            "swapped triangulation contents"
        );
    }

    /// Moves every simplex onto the end of `dest`, leaving `self` empty.
    ///
    /// Moved simplices keep their UUIDs, gluings, labels and locks but are
    /// issued new keys in `dest`.
    pub fn move_contents_to(&mut self, dest: &mut Self) {
        let _mine = self.changes.span();
        let _theirs = dest.changes.span();

        let order = std::mem::take(&mut self.order);
        let mut storage = std::mem::replace(&mut self.simplices, StorageMap::with_key());
        let base = dest.order.len();
        let mut remap = fast_hash_map_with_capacity(order.len());
        let mut moved = Vec::with_capacity(order.len());
        for old_key in order {
            if let Some(mut simplex) = storage.remove(old_key) {
                simplex.owner = dest.id;
                simplex.index = base + moved.len();
                let new_key = dest.simplices.insert(simplex);
                remap.insert(old_key, new_key);
                moved.push(new_key);
            }
        }
        for &key in &moved {
            for adj in dest.simplices[key].adjacency.iter_mut().flatten() {
                if let Some(&new_key) = remap.get(&adj.simplex) {
                    adj.simplex = new_key;
                }
            }
        }
        tracing::trace!(moved = moved.len(), base, "moved triangulation contents");
        dest.order.extend(moved);
        self.clear_skeleton();
        dest.clear_skeleton();
    }

    /// Appends a structural copy of `source`: labels, gluings and locks, with
    /// fresh keys and UUIDs. `source` is left untouched.
    pub fn insert_triangulation(&mut self, source: &Self) {
        if source.is_empty() {
            return;
        }
        let _span = self.changes.span();
        let base = self.order.len();
        let id = self.id;
        let copies: Vec<SimplexKey> = source
            .simplices()
            .enumerate()
            .map(|(offset, (_, simplex))| {
                self.simplices
                    .insert(simplex.detached_copy(id, base + offset))
            })
            .collect();
        self.order.extend_from_slice(&copies);

        for (position, (_, simplex)) in source.simplices().enumerate() {
            for facet in 0..=D {
                let Some(adj) = simplex.adjacent(facet) else {
                    continue;
                };
                let adj_position = source.simplices[adj.simplex].index;
                if adj_position > position
                    || (adj_position == position && adj.facet(facet) > facet)
                {
                    self.join_raw(copies[position], facet, copies[adj_position], adj.gluing);
                }
            }
        }
        self.clear_skeleton();
    }

    /// Whether both triangulations have the same gluings, index by index.
    ///
    /// Labels, locks and identities are ignored; this is not a test up to
    /// relabelling.
    #[must_use]
    pub fn is_identical_to(&self, other: &Self) -> bool {
        self.size() == other.size()
            && self
                .simplices()
                .zip(other.simplices())
                .all(|((_, mine), (_, theirs))| {
                    (0..=D).all(|facet| match (mine.adjacent(facet), theirs.adjacent(facet)) {
                        (None, None) => true,
                        (Some(a), Some(b)) => {
                            a.gluing == b.gluing
                                && self.simplices[a.simplex].index
                                    == other.simplices[b.simplex].index
                        }
                        _ => false,
                    })
                })
    }

    // -------------------------------------------------------------------------
    // Locks
    // -------------------------------------------------------------------------

    /// Locks a simplex against removal and re-gluing.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::UnknownSimplex`] for a foreign key.
    pub fn lock_simplex(&mut self, key: SimplexKey) -> Result<(), TriangulationError> {
        self.checked(key)?;
        self.simplices[key].locked = true;
        Ok(())
    }

    /// Clears a simplex lock.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::UnknownSimplex`] for a foreign key.
    pub fn unlock_simplex(&mut self, key: SimplexKey) -> Result<(), TriangulationError> {
        self.checked(key)?;
        self.simplices[key].locked = false;
        Ok(())
    }

    /// Locks a facet; a glued facet is locked on both sides.
    ///
    /// # Errors
    ///
    /// Fails for a foreign key or an out-of-range facet.
    pub fn lock_facet(&mut self, key: SimplexKey, facet: usize) -> Result<(), TriangulationError> {
        self.set_facet_lock(key, facet, true)
    }

    /// Clears a facet lock on both sides of the facet.
    ///
    /// # Errors
    ///
    /// Fails for a foreign key or an out-of-range facet.
    pub fn unlock_facet(&mut self, key: SimplexKey, facet: usize) -> Result<(), TriangulationError> {
        self.set_facet_lock(key, facet, false)
    }

    fn set_facet_lock(
        &mut self,
        key: SimplexKey,
        facet: usize,
        locked: bool,
    ) -> Result<(), TriangulationError> {
        let adj = self.checked(key)?.adjacent(facet);
        Self::check_facet(facet)?;
        self.simplices[key].set_facet_lock(facet, locked);
        if let Some(adj) = adj {
            self.simplices[adj.simplex].set_facet_lock(adj.facet(facet), locked);
        }
        Ok(())
    }

    /// Whether any simplex or facet lock is held.
    #[must_use]
    pub fn has_locks(&self) -> bool {
        self.simplices.values().any(Simplex::has_locks)
    }

    /// Clears every simplex and facet lock.
    pub fn unlock_all(&mut self) {
        for simplex in self.simplices.values_mut() {
            simplex.locked = false;
            simplex.facet_locks = 0;
        }
    }

    // -------------------------------------------------------------------------
    // Raw operations (staging only)
    // -------------------------------------------------------------------------

    pub(crate) fn new_simplex_raw(&mut self, description: String) -> SimplexKey {
        let index = self.order.len();
        let key = self
            .simplices
            .insert(Simplex::new(self.id, index, description));
        self.order.push(key);
        key
    }

    /// # Panics
    ///
    /// Panics if either key is foreign or the facet is out of range.
    pub(crate) fn join_raw(&mut self, key: SimplexKey, facet: usize, other: SimplexKey, gluing: Perm) {
        let other_facet = gluing.image(facet);
        debug_assert!(gluing.acts_on(D + 1), "gluing {gluing} does not act on {} points", D + 1);
        debug_assert!(
            self.simplices[key].is_boundary_facet(facet),
            "facet {facet} of simplex {} is already glued",
            self.simplices[key].index
        );
        debug_assert!(
            self.simplices[other].is_boundary_facet(other_facet),
            "facet {other_facet} of simplex {} is already glued",
            self.simplices[other].index
        );
        debug_assert!(key != other || other_facet != facet, "facet glued to itself");
        self.simplices[key].adjacency[facet] = Some(Adjacency {
            simplex: other,
            gluing,
        });
        self.simplices[other].adjacency[other_facet] = Some(Adjacency {
            simplex: key,
            gluing: gluing.inverse(),
        });
    }

    pub(crate) fn unjoin_raw(&mut self, key: SimplexKey, facet: usize) -> Option<SimplexKey> {
        let adj = self.simplices[key].adjacency[facet].take()?;
        self.simplices[adj.simplex].adjacency[adj.facet(facet)] = None;
        Some(adj.simplex)
    }

    pub(crate) fn isolate_raw(&mut self, key: SimplexKey) {
        for facet in 0..=D {
            self.unjoin_raw(key, facet);
        }
    }

    /// Isolates and removes every listed simplex, then re-indexes once.
    /// Foreign or repeated keys are skipped.
    pub(crate) fn remove_simplices_raw(&mut self, keys: &[SimplexKey]) {
        let mut removed_any = false;
        for &key in keys {
            if self.simplices.contains_key(key) {
                self.isolate_raw(key);
                self.simplices.remove(key);
                removed_any = true;
            }
        }
        if removed_any {
            let simplices = &self.simplices;
            self.order.retain(|&key| simplices.contains_key(key));
            self.reindex();
        }
    }

    // -------------------------------------------------------------------------
    // Validation
    // -------------------------------------------------------------------------

    /// Re-checks every structural invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, scanning simplices in index order.
    pub fn validate_structure(&self) -> Result<(), StructureError> {
        if self.order.len() != self.simplices.len() {
            return Err(StructureError::CountMismatch {
                stored: self.simplices.len(),
                ordered: self.order.len(),
            });
        }
        for (position, &key) in self.order.iter().enumerate() {
            let simplex = self
                .simplices
                .get(key)
                .ok_or(StructureError::MissingSimplex { position })?;
            if simplex.index != position {
                return Err(StructureError::IndexMismatch {
                    position,
                    recorded: simplex.index,
                });
            }
            if simplex.owner != self.id {
                return Err(StructureError::ForeignOwner { index: position });
            }
            validate_uuid(&simplex.uuid()).map_err(|source| StructureError::InvalidUuid {
                index: position,
                source,
            })?;
            for facet in 0..=D {
                let Some(adj) = simplex.adjacent(facet) else {
                    continue;
                };
                if !adj.gluing.acts_on(D + 1) {
                    return Err(StructureError::InvalidGluing {
                        index: position,
                        facet,
                        gluing: adj.gluing,
                    });
                }
                let far = self
                    .simplices
                    .get(adj.simplex)
                    .filter(|far| far.owner == self.id)
                    .ok_or(StructureError::DanglingAdjacency {
                        index: position,
                        facet,
                    })?;
                let far_facet = adj.facet(facet);
                if adj.simplex == key && far_facet == facet {
                    return Err(StructureError::SelfGluedFacet {
                        index: position,
                        facet,
                    });
                }
                let mirrored = Adjacency {
                    simplex: key,
                    gluing: adj.gluing.inverse(),
                };
                if far.adjacent(far_facet) != Some(mirrored) {
                    return Err(StructureError::AsymmetricGluing {
                        index: position,
                        facet,
                    });
                }
                if simplex.is_facet_locked(facet) != far.is_facet_locked(far_facet) {
                    return Err(StructureError::AsymmetricLock {
                        index: position,
                        facet,
                    });
                }
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Text output
    // -------------------------------------------------------------------------

    /// Multi-line description: a summary line followed by one row per
    /// simplex listing, for each facet from `D` down to `0`, the adjacent
    /// simplex and the images of the facet's vertices.
    #[must_use]
    pub fn detail(&self) -> String {
        let mut out = format!("{self}\n\n  Simplex  |  glued to:");
        for facet in (0..=D).rev() {
            let _ = write!(out, "  {:>width$}", facet_label(facet, Perm::IDENTITY, D), width = D + 9);
        }
        out.push('\n');
        out.push_str(&"-".repeat(21 + (D + 11) * (D + 1)));
        out.push('\n');
        for (index, (_, simplex)) in self.simplices().enumerate() {
            let _ = write!(out, "  {index:>7}  |           ");
            for facet in (0..=D).rev() {
                let entry = match simplex.adjacent(facet) {
                    None => "boundary".to_owned(),
                    Some(adj) => format!(
                        "{} {}",
                        self.simplices[adj.simplex].index,
                        facet_label(facet, adj.gluing, D)
                    ),
                };
                let _ = write!(out, "  {entry:>width$}", width = D + 9);
            }
            out.push('\n');
        }
        out
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn checked(&self, key: SimplexKey) -> Result<&Simplex<D>, TriangulationError> {
        self.simplices
            .get(key)
            .ok_or(TriangulationError::UnknownSimplex { key })
    }

    const fn check_facet(facet: usize) -> Result<(), TriangulationError> {
        if facet > D {
            return Err(TriangulationError::FacetOutOfRange {
                facet,
                dimension: D,
            });
        }
        Ok(())
    }

    fn reown(&mut self) {
        let id = self.id;
        for simplex in self.simplices.values_mut() {
            simplex.owner = id;
        }
    }

    fn reindex(&mut self) {
        for (index, &key) in self.order.iter().enumerate() {
            self.simplices[key].index = index;
        }
    }
}

/// The vertices of `facet` after applying `gluing`, e.g. `(023)`.
fn facet_label(facet: usize, gluing: Perm, dimension: usize) -> String {
    let ordering = Perm::facet_ordering(facet, dimension + 1);
    let mut label = String::from("(");
    for slot in 0..dimension {
        let _ = write!(label, "{}", gluing.image(ordering.image(slot)));
    }
    label.push(')');
    label
}

impl<const D: usize> Default for Triangulation<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy with fresh identities.
///
/// The copy gets a new triangulation UUID, new simplex UUIDs, its own change
/// tracker (version 0, no listeners) and no cached skeleton. Keys are
/// preserved, so every gluing resolves into the copy's own storage.
impl<const D: usize> Clone for Triangulation<D> {
    fn clone(&self) -> Self {
        let id = make_uuid();
        let mut simplices = self.simplices.clone();
        for simplex in simplices.values_mut() {
            simplex.owner = id;
            simplex.refresh_uuid();
        }
        Self {
            simplices,
            order: self.order.clone(),
            id,
            changes: ChangeTracker::new(),
            skeleton: ArcSwapOption::empty(),
        }
    }
}

impl<const D: usize> fmt::Display for Triangulation<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.size() {
            0 => write!(f, "Empty {}-dimensional triangulation", D),
            1 => write!(f, "Triangulation with 1 {}-simplex", D),
            n => write!(f, "Triangulation with {} {}-simplices", n, D),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
