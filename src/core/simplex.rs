//! Top-dimensional simplices and their facet gluings.
//!
//! A [`Simplex<D>`] has `D + 1` facet slots. Slot `f` holds either nothing
//! (facet `f` is boundary) or an [`Adjacency`]: the neighbouring simplex and
//! the permutation mapping this simplex's vertex labels onto the
//! neighbour's. Simplices are created and mutated only through their owning
//! [`Triangulation`](crate::core::triangulation::Triangulation), which keeps
//! both sides of every gluing consistent.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::core::collections::{FacetBuffer, MAX_PRACTICAL_DIMENSION_SIZE};
use crate::core::perm::Perm;
use crate::core::triangulation::SimplexKey;
use crate::core::util::make_uuid;

// =============================================================================
// ERRORS
// =============================================================================

/// A structural edit was refused because a simplex or facet lock is held.
///
/// Locks are policy flags, not synchronisation primitives: they mark parts of
/// a triangulation that external derived state relies on.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LockViolation {
    /// The simplex at `index` is locked.
    #[error("simplex {index} is locked")]
    Simplex {
        /// Index of the locked simplex.
        index: usize,
    },
    /// Facet `facet` of the simplex at `index` is locked.
    #[error("facet {facet} of simplex {index} is locked")]
    Facet {
        /// Index of the simplex.
        index: usize,
        /// The locked facet.
        facet: usize,
    },
    /// A whole-triangulation operation met at least one lock.
    #[error("{operation} cannot run while the triangulation holds simplex or facet locks")]
    Triangulation {
        /// The refused operation.
        operation: &'static str,
    },
}

// =============================================================================
// ADJACENCY
// =============================================================================

/// The far side of a glued facet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Adjacency {
    /// The neighbouring simplex.
    pub simplex: SimplexKey,
    /// Maps this simplex's vertex labels onto the neighbour's.
    pub gluing: Perm,
}

impl Adjacency {
    /// The neighbour's facet that `facet` is glued to.
    #[must_use]
    #[inline]
    pub const fn facet(&self, facet: usize) -> usize {
        self.gluing.image(facet)
    }
}

// =============================================================================
// SIMPLEX
// =============================================================================

/// A top-dimensional simplex with `D + 1` facets.
#[derive(Clone, Debug)]
pub struct Simplex<const D: usize> {
    uuid: Uuid,
    pub(crate) owner: Uuid,
    pub(crate) index: usize,
    description: String,
    pub(crate) adjacency: FacetBuffer<Option<Adjacency>>,
    pub(crate) locked: bool,
    pub(crate) facet_locks: u16,
}

impl<const D: usize> Simplex<D> {
    /// Number of facets (and vertices) of each simplex.
    pub const FACETS: usize = {
        assert!(
            D >= 1 && D < MAX_PRACTICAL_DIMENSION_SIZE,
            "dimension must lie in 1..MAX_PRACTICAL_DIMENSION_SIZE"
        );
        D + 1
    };

    pub(crate) fn new(owner: Uuid, index: usize, description: String) -> Self {
        Self {
            uuid: make_uuid(),
            owner,
            index,
            description,
            adjacency: std::iter::repeat_n(None, Self::FACETS).collect(),
            locked: false,
            facet_locks: 0,
        }
    }

    /// Copy of this simplex's label and locks, fully boundary, with a fresh
    /// UUID.
    pub(crate) fn detached_copy(&self, owner: Uuid, index: usize) -> Self {
        let mut copy = Self::new(owner, index, self.description.clone());
        copy.locked = self.locked;
        copy.facet_locks = self.facet_locks;
        copy
    }

    pub(crate) fn refresh_uuid(&mut self) {
        self.uuid = make_uuid();
    }

    /// Stable identity of this simplex.
    ///
    /// Unlike its key and index, the UUID survives every re-parenting.
    #[must_use]
    pub const fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Position of this simplex in its triangulation.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// UUID of the owning triangulation.
    #[must_use]
    pub const fn owner(&self) -> Uuid {
        self.owner
    }

    /// Free-form label.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    pub(crate) fn set_description(&mut self, description: String) {
        self.description = description;
    }

    /// The gluing on `facet`, or `None` if it is boundary or out of range.
    #[must_use]
    #[inline]
    pub fn adjacent(&self, facet: usize) -> Option<Adjacency> {
        self.adjacency.get(facet).copied().flatten()
    }

    /// The simplex glued to `facet`.
    #[must_use]
    pub fn adjacent_simplex(&self, facet: usize) -> Option<SimplexKey> {
        self.adjacent(facet).map(|adj| adj.simplex)
    }

    /// The gluing permutation on `facet`.
    #[must_use]
    pub fn adjacent_gluing(&self, facet: usize) -> Option<Perm> {
        self.adjacent(facet).map(|adj| adj.gluing)
    }

    /// The neighbour's facet glued to `facet`.
    #[must_use]
    pub fn adjacent_facet(&self, facet: usize) -> Option<usize> {
        self.adjacent(facet).map(|adj| adj.facet(facet))
    }

    /// Whether `facet` is a boundary facet.
    #[must_use]
    pub fn is_boundary_facet(&self, facet: usize) -> bool {
        self.adjacent(facet).is_none()
    }

    /// Whether any facet of this simplex is boundary.
    #[must_use]
    pub fn has_boundary(&self) -> bool {
        self.adjacency.iter().any(Option::is_none)
    }

    /// The boundary facets, in increasing order.
    pub fn boundary_facets(&self) -> impl Iterator<Item = usize> + '_ {
        self.adjacency
            .iter()
            .enumerate()
            .filter_map(|(facet, adj)| adj.is_none().then_some(facet))
    }

    /// Every facet slot in order.
    pub fn adjacencies(&self) -> impl Iterator<Item = Option<Adjacency>> + '_ {
        self.adjacency.iter().copied()
    }

    /// Whether the whole simplex is locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    /// Whether `facet` is locked.
    #[must_use]
    pub const fn is_facet_locked(&self, facet: usize) -> bool {
        facet < Self::FACETS && self.facet_locks & (1 << facet) != 0
    }

    /// Whether the simplex or any of its facets is locked.
    #[must_use]
    pub const fn has_locks(&self) -> bool {
        self.locked || self.facet_locks != 0
    }

    pub(crate) const fn set_facet_lock(&mut self, facet: usize, locked: bool) {
        if locked {
            self.facet_locks |= 1 << facet;
        } else {
            self.facet_locks &= !(1 << facet);
        }
    }

    /// Checks that `facet` may be re-glued: neither the simplex nor the
    /// facet is locked.
    pub(crate) const fn check_facet_unlocked(&self, facet: usize) -> Result<(), LockViolation> {
        if self.locked {
            return Err(LockViolation::Simplex { index: self.index });
        }
        if self.is_facet_locked(facet) {
            return Err(LockViolation::Facet {
                index: self.index,
                facet,
            });
        }
        Ok(())
    }
}

impl<const D: usize> fmt::Display for Simplex<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-simplex {}", D, self.index)?;
        if !self.description.is_empty() {
            write!(f, " ({})", self.description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_simplex_is_fully_boundary() {
        let simplex = Simplex::<3>::new(make_uuid(), 0, "alpha".into());
        assert_eq!(Simplex::<3>::FACETS, 4);
        assert_eq!(simplex.adjacencies().count(), 4);
        assert!(simplex.has_boundary());
        assert_eq!(simplex.boundary_facets().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(simplex.adjacent(4).is_none());
        assert_eq!(simplex.description(), "alpha");
        assert_eq!(simplex.to_string(), "3-simplex 0 (alpha)");
    }

    #[test]
    fn facet_locks_are_tracked_per_facet() {
        let mut simplex = Simplex::<2>::new(make_uuid(), 5, String::new());
        assert!(!simplex.has_locks());
        simplex.set_facet_lock(1, true);
        assert!(simplex.is_facet_locked(1));
        assert!(!simplex.is_facet_locked(0));
        assert!(!simplex.is_facet_locked(9));
        assert_eq!(
            simplex.check_facet_unlocked(1),
            Err(LockViolation::Facet { index: 5, facet: 1 })
        );
        simplex.set_facet_lock(1, false);
        assert!(!simplex.has_locks());
        simplex.locked = true;
        assert_eq!(
            simplex.check_facet_unlocked(0),
            Err(LockViolation::Simplex { index: 5 })
        );
    }

    #[test]
    fn detached_copy_keeps_label_and_locks() {
        let mut simplex = Simplex::<3>::new(make_uuid(), 2, "beta".into());
        simplex.locked = true;
        simplex.set_facet_lock(3, true);
        let owner = make_uuid();
        let copy = simplex.detached_copy(owner, 7);
        assert_ne!(copy.uuid(), simplex.uuid());
        assert_eq!(copy.owner(), owner);
        assert_eq!(copy.index(), 7);
        assert_eq!(copy.description(), "beta");
        assert!(copy.is_locked());
        assert!(copy.is_facet_locked(3));
    }
}
