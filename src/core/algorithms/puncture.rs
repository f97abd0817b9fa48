//! Puncturing: removing a ball to create a new 2-sphere boundary.
//!
//! A puncture cuts a tetrahedron open along facet 0 and inserts six new
//! tetrahedra in two stacks of three. The stacks are glued to each other
//! along their sides. The bottom of the first stack closes the opened
//! facet, and the bottom of the second meets whatever used to be glued
//! there. The tops of the two stacks stay open and form a 2-sphere.
//!
//! The operation touches no other gluing. The number of simplices grows by
//! [`PUNCTURE_SIMPLICES`], and the new boundary consists of exactly two
//! triangles: facet 0 of the last two tetrahedra added. Connected sums use
//! those two triangles (see [`Triangulation::connected_sum_with`]).

use crate::core::perm::Perm;
use crate::core::triangulation::{SimplexKey, Triangulation, TriangulationError};

/// Simplices added by [`Triangulation::puncture`].
pub const PUNCTURE_SIMPLICES: usize = 6;

const CYCLE: Perm = Perm::from_images([3, 0, 1, 2]);
const WALL: Perm = Perm::from_images([1, 2, 3, 0]);

impl Triangulation<3> {
    /// Attaches two triangular prisms (six tetrahedra) across facet 0 of a
    /// tetrahedron, opening a new boundary 2-sphere there.
    ///
    /// `simplex` defaults to the tetrahedron at index 0. Whatever was glued
    /// to that facet is reattached to the far end of the prisms with the
    /// same gluing, so nothing else changes. The two boundary triangles of
    /// the new sphere are facet 0 of the last two tetrahedra. One change
    /// notification fires.
    ///
    /// Puncturing an empty triangulation with no simplex given does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns [`TriangulationError::UnknownSimplex`] for a foreign key and
    /// [`TriangulationError::Locked`] if the tetrahedron, its facet 0 or the
    /// tetrahedron across that facet is locked. Nothing is changed on error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gluing::prelude::*;
    ///
    /// let mut tri = Triangulation::<3>::new();
    /// let a = tri.new_simplex();
    /// let b = tri.new_simplex();
    /// for facet in 0..4 {
    ///     tri.join(a, facet, b, Perm::IDENTITY).unwrap();
    /// }
    /// tri.puncture(None).unwrap();
    /// assert_eq!(tri.size(), 8);
    /// assert_eq!(tri.count_boundary_facets(), 2);
    /// assert_eq!(tri.count_boundary_components(), 1);
    /// ```
    pub fn puncture(&mut self, simplex: Option<SimplexKey>) -> Result<(), TriangulationError> {
        let key = match simplex {
            Some(key) => key,
            None => match self.get_key(0) {
                Some(key) => key,
                None => return Ok(()),
            },
        };
        let tet = self
            .simplex_by_key(key)
            .ok_or(TriangulationError::UnknownSimplex { key })?;
        tet.check_facet_unlocked(0)?;
        let neighbour = tet.adjacent(0);
        if let Some(adj) = neighbour {
            let far = self
                .simplex_by_key(adj.simplex)
                .ok_or(TriangulationError::UnknownSimplex { key: adj.simplex })?;
            far.check_facet_unlocked(adj.facet(0))?;
        }

        let _span = self.change_span();
        tracing::debug!(index = tet.index(), glued = neighbour.is_some(), "puncturing");

        // prism[i][j]: created with j outermost so the two boundary
        // triangles land on the final two simplices.
        let mut prism = [[key; 3]; 2];
        for j in 0..3 {
            for row in &mut prism {
                row[j] = self.new_simplex_raw(String::new());
            }
        }
        let [a, b] = prism;
        self.join_raw(a[0], 0, a[1], CYCLE);
        self.join_raw(a[1], 0, a[2], CYCLE);
        self.join_raw(b[0], 1, b[1], CYCLE);
        self.join_raw(b[1], 1, b[2], Perm::from_images([3, 2, 0, 1]));
        for j in 0..2 {
            self.join_raw(a[j], 1, b[j], WALL);
            self.join_raw(a[j], 2, b[j], WALL);
        }
        let twist = Perm::from_images([0, 1, 3, 2]);
        self.join_raw(a[2], 1, b[2], twist);
        self.join_raw(a[2], 2, b[2], twist);

        if let Some(adj) = neighbour {
            self.unjoin_raw(key, 0);
            self.join_raw(b[0], 0, adj.simplex, adj.gluing);
        }
        self.join_raw(key, 0, a[0], CYCLE);
        self.clear_skeleton();
        Ok(())
    }
}
