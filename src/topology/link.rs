//! Vertex links.
//!
//! The link of a vertex class is the surface (in dimension 3) swept out by
//! the small corner triangles cut off each simplex at that vertex. For a
//! 3-dimensional triangulation the link is classified from its Euler
//! characteristic, boundary and orientability:
//!
//! - `F` = number of vertex embeddings (one link triangle each)
//! - `Bd` = link edges lying in boundary facets
//! - `E = (3F + Bd) / 2`
//! - `V` = classes of triangle corners under facet gluings
//!
//! Lower dimensions only need the boundary flag; higher dimensions are left
//! unclassified.

use std::collections::VecDeque;

use crate::core::collections::FacetBuffer;
use crate::core::perm::Perm;
use crate::core::simplex::Simplex;
use crate::core::triangulation::Triangulation;
use crate::core::util::DisjointSets;

/// Topological type of a vertex link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexLink {
    /// A sphere: an ordinary internal vertex.
    Sphere,
    /// A disc: an ordinary boundary vertex.
    Disc,
    /// A torus: a standard orientable cusp.
    Torus,
    /// A Klein bottle: a standard non-orientable cusp.
    KleinBottle,
    /// Any other closed surface.
    NonStandardCusp,
    /// A bounded surface other than a disc.
    Invalid,
    /// Not classified in this dimension.
    Unclassified,
}

impl VertexLink {
    /// Whether the vertex is ideal: its link is closed but not a sphere.
    #[must_use]
    pub const fn is_ideal(self) -> bool {
        matches!(self, Self::Torus | Self::KleinBottle | Self::NonStandardCusp)
    }

    /// Whether the vertex is valid: its link is a sphere, a disc or a closed
    /// surface.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// What is known about one vertex link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LinkSummary {
    /// Classification.
    pub kind: VertexLink,
    /// Whether the link has boundary, i.e. the vertex lies on a boundary
    /// facet.
    pub has_boundary: bool,
    /// Euler characteristic, where computed.
    pub euler_characteristic: Option<i64>,
    /// Orientability, where computed.
    pub orientable: Option<bool>,
}

/// Summarises the link of every vertex class.
///
/// `vertex_of[s][a]` is the class of vertex `a` of the simplex at index `s`.
pub(crate) fn summarize_links<const D: usize>(
    tri: &Triangulation<D>,
    vertex_of: &[FacetBuffer<usize>],
    vertex_count: usize,
) -> Vec<LinkSummary> {
    let simplices: Vec<&Simplex<D>> = tri.simplices().map(|(_, simplex)| simplex).collect();

    let mut has_boundary = vec![false; vertex_count];
    let mut boundary_edges = vec![0i64; vertex_count];
    let mut triangles = vec![0i64; vertex_count];
    for (s, simplex) in simplices.iter().enumerate() {
        for apex in 0..=D {
            let vertex = vertex_of[s][apex];
            triangles[vertex] += 1;
            for facet in (0..=D).filter(|&facet| facet != apex) {
                if simplex.is_boundary_facet(facet) {
                    has_boundary[vertex] = true;
                    boundary_edges[vertex] += 1;
                }
            }
        }
    }

    if D != 3 {
        return has_boundary
            .into_iter()
            .map(|bounded| low_or_high_dimension_summary(D, bounded))
            .collect();
    }

    let adjacent_index = |simplex: &Simplex<D>, facet: usize| {
        simplex.adjacent(facet).and_then(|adj| {
            tri.index_of(adj.simplex)
                .map(|index| (index, adj.gluing))
        })
    };

    // Corner (s, apex, w) is where the link triangle of (s, apex) meets the
    // edge {apex, w}.
    let corner = |s: usize, apex: usize, w: usize| (s * 4 + apex) * 4 + w;
    let mut corners = DisjointSets::new(simplices.len() * 16);
    for (s, &simplex) in simplices.iter().enumerate() {
        for facet in 0..4 {
            let Some((t, gluing)) = adjacent_index(simplex, facet) else {
                continue;
            };
            for apex in (0..4).filter(|&apex| apex != facet) {
                for w in (0..4).filter(|&w| w != apex && w != facet) {
                    corners.merge(
                        corner(s, apex, w),
                        corner(t, gluing.image(apex), gluing.image(w)),
                    );
                }
            }
        }
    }
    let mut vertex_corners = Vec::with_capacity(simplices.len() * 12);
    for s in 0..simplices.len() {
        for apex in 0..4 {
            for w in (0..4).filter(|&w| w != apex) {
                vertex_corners.push((vertex_of[s][apex], corners.root(corner(s, apex, w))));
            }
        }
    }
    vertex_corners.sort_unstable();
    vertex_corners.dedup();
    let mut link_vertices = vec![0i64; vertex_count];
    for (vertex, _) in vertex_corners {
        link_vertices[vertex] += 1;
    }

    // Orient link triangles; a conflict makes that vertex's link
    // non-orientable.
    let mut orientable = vec![true; vertex_count];
    let mut sign = vec![0i8; simplices.len() * 4];
    let mut queue = VecDeque::new();
    for s in 0..simplices.len() {
        for apex in 0..4 {
            if sign[s * 4 + apex] != 0 {
                continue;
            }
            sign[s * 4 + apex] = 1;
            queue.push_back((s, apex));
            while let Some((s, apex)) = queue.pop_front() {
                let current = sign[s * 4 + apex];
                for facet in (0..4).filter(|&facet| facet != apex) {
                    let Some((t, gluing)) = adjacent_index(simplices[s], facet) else {
                        continue;
                    };
                    let far_apex = gluing.image(apex);
                    let expected = -link_gluing_sign(gluing, apex) * current;
                    match sign[t * 4 + far_apex] {
                        0 => {
                            sign[t * 4 + far_apex] = expected;
                            queue.push_back((t, far_apex));
                        }
                        existing if existing != expected => {
                            orientable[vertex_of[s][apex]] = false;
                        }
                        _ => {}
                    }
                }
            }
        }
    }

    (0..vertex_count)
        .map(|vertex| {
            let edges = (3 * triangles[vertex] + boundary_edges[vertex]) / 2;
            let chi = link_vertices[vertex] - edges + triangles[vertex];
            let kind = if has_boundary[vertex] {
                if chi == 1 {
                    VertexLink::Disc
                } else {
                    VertexLink::Invalid
                }
            } else {
                match (chi, orientable[vertex]) {
                    (2, _) => VertexLink::Sphere,
                    (0, true) => VertexLink::Torus,
                    (0, false) => VertexLink::KleinBottle,
                    _ => VertexLink::NonStandardCusp,
                }
            };
            LinkSummary {
                kind,
                has_boundary: has_boundary[vertex],
                euler_characteristic: Some(chi),
                orientable: Some(orientable[vertex]),
            }
        })
        .collect()
}

fn low_or_high_dimension_summary(dimension: usize, has_boundary: bool) -> LinkSummary {
    match dimension {
        // Links are S⁰ / a point, or a circle / an arc.
        1 | 2 => LinkSummary {
            kind: if has_boundary {
                VertexLink::Disc
            } else {
                VertexLink::Sphere
            },
            has_boundary,
            euler_characteristic: Some(match (dimension, has_boundary) {
                (1, false) => 2,
                (2, false) => 0,
                _ => 1,
            }),
            orientable: Some(true),
        },
        _ => LinkSummary {
            kind: VertexLink::Unclassified,
            has_boundary,
            euler_characteristic: None,
            orientable: None,
        },
    }
}

/// Sign of the map between the link triangles at `apex` and at
/// `gluing[apex]` induced by a tetrahedron gluing.
fn link_gluing_sign(gluing: Perm, apex: usize) -> i8 {
    let far_apex = gluing.image(apex);
    let mut ranks = [0usize; 3];
    for (slot, w) in (0..4).filter(|&w| w != apex).enumerate() {
        let image = gluing.image(w);
        ranks[slot] = image - usize::from(image > far_apex);
    }
    let inversions = (0..3)
        .flat_map(|i| (i + 1..3).map(move |j| (i, j)))
        .filter(|&(i, j)| ranks[i] > ranks[j])
        .count();
    if inversions % 2 == 0 { 1 } else { -1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ideal_and_valid_flags() {
        assert!(VertexLink::Torus.is_ideal());
        assert!(VertexLink::KleinBottle.is_ideal());
        assert!(VertexLink::NonStandardCusp.is_ideal());
        assert!(!VertexLink::Sphere.is_ideal());
        assert!(!VertexLink::Disc.is_ideal());
        assert!(!VertexLink::Invalid.is_valid());
        assert!(VertexLink::NonStandardCusp.is_valid());
        assert!(VertexLink::Unclassified.is_valid());
    }

    #[test]
    fn link_sign_of_identity_is_positive() {
        for apex in 0..4 {
            assert_eq!(link_gluing_sign(Perm::IDENTITY, apex), 1);
        }
    }

    #[test]
    fn link_sign_tracks_corner_swaps() {
        // Swapping two corners of the link triangle at vertex 0.
        assert_eq!(link_gluing_sign(Perm::transposition(1, 2), 0), -1);
        // Moving the apex itself while keeping the corners in order.
        assert_eq!(link_gluing_sign(Perm::from_images([1, 0, 2, 3]), 0), 1);
    }

    #[test]
    fn single_tetrahedron_has_disc_links() {
        let mut tri = Triangulation::<3>::new();
        tri.new_simplex();
        let skeleton = tri.skeleton();
        for vertex in skeleton.vertices() {
            assert_eq!(vertex.link(), VertexLink::Disc);
            assert_eq!(vertex.link_summary().euler_characteristic, Some(1));
        }
    }

    #[test]
    fn high_dimensions_are_unclassified() {
        let mut tri = Triangulation::<4>::new();
        tri.new_simplex();
        let skeleton = tri.skeleton();
        assert!(
            skeleton
                .vertices()
                .iter()
                .all(|vertex| vertex.link() == VertexLink::Unclassified && vertex.is_boundary())
        );
    }
}
