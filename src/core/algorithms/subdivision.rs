//! Subdivision that truncates ideal and invalid vertices.
//!
//! Every tetrahedron is cut into 32 pieces: four *tips* at the facet
//! centres, four *interior* pieces, and for each ordered pair of vertices
//! `(j, k)` an *edge* piece and a *vertex* piece. The pieces near each
//! original vertex form a small neighbourhood of it; for ideal or invalid
//! vertices those pieces are then thrown away, leaving a real boundary
//! component in place of the vertex.

use crate::core::perm::Perm;
use crate::core::simplex::LockViolation;
use crate::core::staging::Staging;
use crate::core::triangulation::{SimplexKey, Triangulation};
use crate::core::util::{SURGERY_TRACE_ENV, env_flag};

/// Pieces per original tetrahedron.
pub const PIECES_PER_TETRAHEDRON: usize = 32;

/// Offsets of the pieces within one tetrahedron's block.
struct PieceLayout {
    tip: [usize; 4],
    interior: [usize; 4],
    edge: [[usize; 4]; 4],
    vertex: [[usize; 4]; 4],
}

impl PieceLayout {
    fn new() -> Self {
        let mut layout = Self {
            tip: [0; 4],
            interior: [0; 4],
            edge: [[0; 4]; 4],
            vertex: [[0; 4]; 4],
        };
        let mut next = 0;
        for j in 0..4 {
            layout.tip[j] = next;
            layout.interior[j] = next + 1;
            next += 2;
            for k in (0..4).filter(|&k| k != j) {
                layout.edge[j][k] = next;
                layout.vertex[j][k] = next + 1;
                next += 2;
            }
        }
        debug_assert_eq!(next, PIECES_PER_TETRAHEDRON);
        layout
    }
}

impl Triangulation<3> {
    /// Replaces every ideal or invalid vertex with real boundary.
    ///
    /// Returns `Ok(false)` without changing anything if the triangulation is
    /// empty, or is valid with no ideal vertices. Otherwise the whole
    /// triangulation is subdivided (32 pieces per tetrahedron), the pieces
    /// around bad vertices are removed, and `Ok(true)` is returned. One
    /// change notification fires.
    ///
    /// # Errors
    ///
    /// Returns [`LockViolation::Triangulation`] if any simplex or facet is
    /// locked; nothing is changed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gluing::prelude::*;
    ///
    /// // One tetrahedron with two pairs of facets glued: the Gieseking
    /// // manifold, whose only vertex is ideal.
    /// let mut tri = Triangulation::<3>::new();
    /// let r = tri.new_simplex();
    /// tri.join(r, 0, r, Perm::from_images([1, 2, 0, 3])).unwrap();
    /// tri.join(r, 2, r, Perm::from_images([0, 2, 3, 1])).unwrap();
    /// assert!(tri.is_ideal());
    ///
    /// assert!(tri.ideal_to_finite().unwrap());
    /// assert!(!tri.is_ideal());
    /// assert!(tri.is_valid());
    /// ```
    pub fn ideal_to_finite(&mut self) -> Result<bool, LockViolation> {
        if self.is_empty() || (self.is_valid() && !self.is_ideal()) {
            return Ok(false);
        }
        if self.has_locks() {
            tracing::warn!(
                simplices = self.size(),
                "refusing to subdivide a triangulation with locks"
            );
            return Err(LockViolation::Triangulation {
                operation: "ideal_to_finite",
            });
        }

        let trace = env_flag(SURGERY_TRACE_ENV);
        let size = self.size();
        let layout = PieceLayout::new();
        let mut staging = Staging::<3>::new();
        let pieces = staging.new_simplices(PIECES_PER_TETRAHEDRON * size);
        let piece = |tet: usize, offset: usize| pieces[tet * PIECES_PER_TETRAHEDRON + offset];

        for tet in 0..size {
            for j in 0..4 {
                staging.join(
                    piece(tet, layout.tip[j]),
                    j,
                    piece(tet, layout.interior[j]),
                    Perm::IDENTITY,
                );
            }
            for j in 0..4 {
                for k in (0..4).filter(|&k| k != j) {
                    staging.join(
                        piece(tet, layout.interior[j]),
                        k,
                        piece(tet, layout.vertex[k][j]),
                        Perm::IDENTITY,
                    );
                }
            }
            for j in 0..4 {
                for k in (0..4).filter(|&k| k != j) {
                    if j < k {
                        staging.join(
                            piece(tet, layout.edge[j][k]),
                            j,
                            piece(tet, layout.edge[k][j]),
                            Perm::transposition(j, k),
                        );
                    }
                    for l in (0..4).filter(|&l| l != j && l != k) {
                        staging.join(
                            piece(tet, layout.edge[j][k]),
                            l,
                            piece(tet, layout.vertex[j][l]),
                            Perm::transposition(k, l),
                        );
                    }
                }
            }
        }

        for tet in 0..size {
            for j in 0..4 {
                let Some((opposite, gluing)) = self.facet_gluing(tet, j) else {
                    continue;
                };
                if opposite < tet || (opposite == tet && gluing.image(j) < j) {
                    continue;
                }
                if trace {
                    tracing::trace!(tet, facet = j, opposite, %gluing, "gluing subdivided facet");
                }
                for k in (0..4).filter(|&k| k != j) {
                    let (gj, gk) = (gluing.image(j), gluing.image(k));
                    staging.join(
                        piece(tet, layout.tip[k]),
                        j,
                        piece(opposite, layout.tip[gk]),
                        gluing,
                    );
                    staging.join(
                        piece(tet, layout.edge[j][k]),
                        k,
                        piece(opposite, layout.edge[gj][gk]),
                        gluing,
                    );
                    staging.join(
                        piece(tet, layout.vertex[j][k]),
                        k,
                        piece(opposite, layout.vertex[gj][gk]),
                        gluing,
                    );
                }
            }
        }

        let skeleton = staging.skeleton();
        let mut doomed: Vec<SimplexKey> = skeleton
            .vertices()
            .iter()
            .filter(|vertex| vertex.is_ideal() || !vertex.is_valid())
            .flat_map(|vertex| vertex.embeddings().iter().map(|embedding| embedding.simplex))
            .collect();
        drop(skeleton);
        staging.clear_skeleton();
        doomed.sort_unstable();
        doomed.dedup();
        if trace {
            tracing::trace!(removed = doomed.len(), "removing pieces at ideal or invalid vertices");
        }
        staging.remove_simplices(&doomed);

        tracing::debug!(
            before = size,
            after = staging.size(),
            "truncated ideal and invalid vertices"
        );
        staging.adopt_into(self);
        Ok(true)
    }
}
