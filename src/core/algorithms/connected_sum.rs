//! Connected sums of 3-dimensional triangulations.
//!
//! The sum is built in three steps, all inside one change span:
//!
//! 1. A structural copy of the other triangulation is appended.
//! 2. The first tetrahedron of the receiving side is punctured, which
//!    exposes a 2-sphere made of two boundary triangles.
//! 3. Facet 0 of the first copied tetrahedron is opened. If it was glued,
//!    it is unjoined, which gives two triangles again. The sphere triangles
//!    are then glued onto those sides.
//!
//! Locks are checked before anything is copied, so a refused sum leaves
//! both triangulations as they were.

use crate::core::perm::Perm;
use crate::core::simplex::LockViolation;
use crate::core::triangulation::{Triangulation, TriangulationError};

// The opened facet is always facet 0, whose vertex ordering
// `facet_ordering(0, 4)` is odd, so one pair of gluings serves every sum.
const FIRST_GLUING: Perm = Perm::from_images([3, 0, 2, 1]);
const SECOND_GLUING: Perm = Perm::from_images([3, 0, 1, 2]);

impl Triangulation<3> {
    /// Replaces this triangulation with its connected sum with `other`.
    ///
    /// A copy of `other` is appended, the first tetrahedron of `self` is
    /// punctured, and the two new sphere triangles are glued into facet 0
    /// of the first copied tetrahedron (which is unglued first if needed).
    /// The gluings are chosen so that orientations on both sides are
    /// respected. The size grows by `other.size() + 6`. One change
    /// notification fires.
    ///
    /// Summing with an empty triangulation does nothing; summing an empty
    /// triangulation copies `other`. To sum a triangulation with itself,
    /// pass a clone.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::Locked`] if anything in `self` is
    /// locked, or if the copied locks of `other` would block reopening its
    /// first facet; nothing is changed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gluing::prelude::*;
    ///
    /// let mut sphere = Triangulation::<3>::new();
    /// let a = sphere.new_simplex();
    /// let b = sphere.new_simplex();
    /// for facet in 0..4 {
    ///     sphere.join(a, facet, b, Perm::IDENTITY).unwrap();
    /// }
    /// let mut sum = sphere.clone();
    /// sum.connected_sum_with(&sphere).unwrap();
    /// assert_eq!(sum.size(), 10);
    /// assert!(sum.is_closed());
    /// assert!(sum.is_orientable());
    /// ```
    pub fn connected_sum_with(&mut self, other: &Self) -> Result<(), TriangulationError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.has_locks() {
            tracing::warn!(
                simplices = self.size(),
                "refusing connected sum on a triangulation with locks"
            );
            return Err(LockViolation::Triangulation {
                operation: "connected_sum_with",
            }
            .into());
        }
        if self.is_empty() {
            self.insert_triangulation(other);
            return Ok(());
        }
        let opened = other.simplex(0);
        opened.check_facet_unlocked(0)?;
        if let Some(adj) = opened.adjacent(0) {
            if let Some(far) = other.simplex_by_key(adj.simplex) {
                far.check_facet_unlocked(adj.facet(0))?;
            }
        }

        let _span = self.change_span();
        let size = self.size();
        self.insert_triangulation(other);
        self.puncture(self.get_key(0))?;
        let boundary = [self.key(self.size() - 2), self.key(self.size() - 1)];

        let first = self.key(size);
        let near = Perm::facet_ordering(0, 4);
        tracing::debug!(size, inserted = other.size(), "forming connected sum");

        match self.simplex(size).adjacent(0) {
            Some(adj) => {
                let far = adj.gluing * near;
                self.unjoin(first, 0)?;
                self.join(boundary[0], 0, first, near * FIRST_GLUING)?;
                self.join(boundary[1], 0, adj.simplex, far * SECOND_GLUING)?;
            }
            None => {
                self.join(boundary[0], 0, first, near * FIRST_GLUING)?;
            }
        }
        Ok(())
    }
}
