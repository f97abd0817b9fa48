//! Skeleton: faces and components derived from the gluings.
//!
//! A [`Skeleton<D>`] is a read-only snapshot computed from a triangulation at
//! one version. It holds simplex keys and indices for lookup only. The
//! owning triangulation caches it and drops the cache on every checked
//! structural edit; anything holding an `Arc<Skeleton>` across an edit is
//! holding stale data (compare [`Skeleton::version`] against
//! [`Triangulation::version`]).

use std::collections::VecDeque;

use crate::core::collections::{FacetBuffer, FacetEmbeddingBuffer, FastHashSet, SmallBuffer};
use crate::core::perm::Perm;
use crate::core::simplex::Simplex;
use crate::core::triangulation::{SimplexKey, Triangulation};
use crate::core::util::DisjointSets;
use crate::topology::link::{LinkSummary, VertexLink, summarize_links};

/// Edges per simplex for the largest supported dimension.
const MAX_EDGES_PER_SIMPLEX: usize = 28;

// =============================================================================
// FACES
// =============================================================================

/// A vertex of a specific simplex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VertexEmbedding {
    /// The simplex.
    pub simplex: SimplexKey,
    /// Its index at the time the skeleton was computed.
    pub simplex_index: usize,
    /// The vertex label within the simplex.
    pub vertex: usize,
}

/// An edge of a specific simplex, with its two endpoint labels in the
/// orientation of the skeleton edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EdgeEmbedding {
    /// The simplex.
    pub simplex: SimplexKey,
    /// Its index at the time the skeleton was computed.
    pub simplex_index: usize,
    /// Endpoint labels within the simplex.
    pub vertices: [usize; 2],
}

/// A facet of a specific simplex.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FacetEmbedding {
    /// The simplex.
    pub simplex: SimplexKey,
    /// Its index at the time the skeleton was computed.
    pub simplex_index: usize,
    /// The facet number within the simplex.
    pub facet: usize,
    /// Sends `0..D` to the facet's vertices (consistently across both
    /// embeddings of an internal facet) and `D` to `facet`.
    pub vertices: Perm,
}

/// A vertex class.
#[derive(Clone, Debug)]
pub struct SkeletonVertex {
    embeddings: Vec<VertexEmbedding>,
    link: LinkSummary,
    component: usize,
}

impl SkeletonVertex {
    /// Every (simplex, vertex) identified into this class.
    #[must_use]
    pub fn embeddings(&self) -> &[VertexEmbedding] {
        &self.embeddings
    }

    /// Number of embeddings.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.embeddings.len()
    }

    /// Link classification.
    #[must_use]
    pub const fn link(&self) -> VertexLink {
        self.link.kind
    }

    /// Everything computed about the link.
    #[must_use]
    pub const fn link_summary(&self) -> LinkSummary {
        self.link
    }

    /// Closed non-sphere link.
    #[must_use]
    pub const fn is_ideal(&self) -> bool {
        self.link.kind.is_ideal()
    }

    /// Link is a sphere, a disc or a closed surface.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.link.kind.is_valid()
    }

    /// Lies on a boundary facet.
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        self.link.has_boundary
    }

    /// Connected component containing the vertex.
    #[must_use]
    pub const fn component(&self) -> usize {
        self.component
    }
}

/// An edge class.
#[derive(Clone, Debug)]
pub struct SkeletonEdge {
    embeddings: Vec<EdgeEmbedding>,
    vertices: [usize; 2],
    valid: bool,
    boundary: bool,
}

impl SkeletonEdge {
    /// Every simplex edge identified into this class.
    #[must_use]
    pub fn embeddings(&self) -> &[EdgeEmbedding] {
        &self.embeddings
    }

    /// Number of embeddings.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.embeddings.len()
    }

    /// Skeleton indices of the two endpoints.
    #[must_use]
    pub const fn vertices(&self) -> [usize; 2] {
        self.vertices
    }

    /// False if the edge is identified with itself in reverse.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Lies on a boundary facet.
    #[must_use]
    pub const fn is_boundary(&self) -> bool {
        self.boundary
    }
}

/// A facet class: one boundary facet or one glued pair.
#[derive(Clone, Debug)]
pub struct SkeletonFacet {
    embeddings: FacetEmbeddingBuffer<FacetEmbedding>,
    boundary_component: Option<usize>,
}

impl SkeletonFacet {
    /// One embedding for boundary facets, two for internal ones.
    #[must_use]
    pub fn embeddings(&self) -> &[FacetEmbedding] {
        &self.embeddings
    }

    /// Number of embeddings.
    #[must_use]
    pub fn degree(&self) -> usize {
        self.embeddings.len()
    }

    /// Whether this is a boundary facet.
    #[must_use]
    pub fn is_boundary(&self) -> bool {
        self.embeddings.len() == 1
    }

    /// The real boundary component containing this facet.
    #[must_use]
    pub const fn boundary_component(&self) -> Option<usize> {
        self.boundary_component
    }
}

/// A connected component of the gluing graph.
#[derive(Clone, Debug)]
pub struct Component {
    simplices: Vec<usize>,
    orientable: bool,
    boundary_facets: usize,
}

impl Component {
    /// Indices of the member simplices, increasing.
    #[must_use]
    pub fn simplices(&self) -> &[usize] {
        &self.simplices
    }

    /// Number of member simplices.
    #[must_use]
    pub fn size(&self) -> usize {
        self.simplices.len()
    }

    /// Whether the simplices can be oriented consistently.
    #[must_use]
    pub const fn is_orientable(&self) -> bool {
        self.orientable
    }

    /// Number of boundary facets in the component.
    #[must_use]
    pub const fn count_boundary_facets(&self) -> usize {
        self.boundary_facets
    }
}

/// A boundary component.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BoundaryComponent {
    /// Boundary facets connected through shared ridges.
    Real {
        /// Skeleton indices of the boundary facets.
        facets: Vec<usize>,
    },
    /// An ideal vertex.
    Ideal {
        /// Skeleton index of the vertex.
        vertex: usize,
    },
}

impl BoundaryComponent {
    /// Whether this is an ideal vertex.
    #[must_use]
    pub const fn is_ideal(&self) -> bool {
        matches!(self, Self::Ideal { .. })
    }

    /// Number of boundary facets (zero for ideal components).
    #[must_use]
    pub fn count_facets(&self) -> usize {
        match self {
            Self::Real { facets } => facets.len(),
            Self::Ideal { .. } => 0,
        }
    }
}

// =============================================================================
// SKELETON
// =============================================================================

/// Faces, components and boundary components of a triangulation.
#[derive(Clone, Debug)]
pub struct Skeleton<const D: usize> {
    version: u64,
    vertices: Vec<SkeletonVertex>,
    edges: Vec<SkeletonEdge>,
    facets: Vec<SkeletonFacet>,
    components: Vec<Component>,
    boundary_components: Vec<BoundaryComponent>,
    simplex_vertices: Vec<FacetBuffer<usize>>,
    simplex_edges: Vec<SmallBuffer<usize, MAX_EDGES_PER_SIMPLEX>>,
    simplex_facets: Vec<FacetBuffer<usize>>,
    simplex_components: Vec<usize>,
    orientation: Vec<i8>,
}

impl<const D: usize> Skeleton<D> {
    /// Computes the skeleton from scratch, bypassing the cache held by
    /// [`Triangulation::skeleton`].
    #[must_use]
    pub fn compute(tri: &Triangulation<D>) -> Self {
        let simplices: Vec<(SimplexKey, &Simplex<D>)> = tri.simplices().collect();
        let n = simplices.len();
        let adjacent = |s: usize, facet: usize| {
            simplices[s].1.adjacent(facet).and_then(|adj| {
                tri.index_of(adj.simplex)
                    .map(|t| (t, adj.gluing))
            })
        };

        let (simplex_components, orientation, components) =
            Self::component_classes(n, &adjacent, &simplices);
        let (simplex_vertices, vertex_embeddings) = Self::vertex_classes(n, &adjacent, &simplices);
        let links = summarize_links(tri, &simplex_vertices, vertex_embeddings.len());
        let vertices: Vec<SkeletonVertex> = vertex_embeddings
            .into_iter()
            .zip(links)
            .map(|(embeddings, link)| SkeletonVertex {
                component: simplex_components[embeddings[0].simplex_index],
                embeddings,
                link,
            })
            .collect();
        let (simplex_edges, edges) = Self::edge_classes(n, &adjacent, &simplices, &simplex_vertices);
        let (simplex_facets, mut facets) = Self::facet_classes(n, &adjacent, &simplices);
        let mut boundary_components =
            Self::real_boundary_components(n, &adjacent, &simplex_facets, &mut facets);
        boundary_components.extend(
            vertices
                .iter()
                .enumerate()
                .filter(|(_, vertex)| vertex.is_ideal())
                .map(|(vertex, _)| BoundaryComponent::Ideal { vertex }),
        );

        Self {
            version: tri.version(),
            vertices,
            edges,
            facets,
            components,
            boundary_components,
            simplex_vertices,
            simplex_edges,
            simplex_facets,
            simplex_components,
            orientation,
        }
    }

    fn component_classes(
        n: usize,
        adjacent: &impl Fn(usize, usize) -> Option<(usize, Perm)>,
        simplices: &[(SimplexKey, &Simplex<D>)],
    ) -> (Vec<usize>, Vec<i8>, Vec<Component>) {
        let mut component_of = vec![usize::MAX; n];
        let mut orientation = vec![0i8; n];
        let mut components = Vec::new();
        let mut queue = VecDeque::new();
        for start in 0..n {
            if component_of[start] != usize::MAX {
                continue;
            }
            let id = components.len();
            let mut members = vec![start];
            let mut orientable = true;
            let mut boundary_facets = 0;
            component_of[start] = id;
            orientation[start] = 1;
            queue.push_back(start);
            while let Some(s) = queue.pop_front() {
                boundary_facets += simplices[s].1.boundary_facets().count();
                for facet in 0..=D {
                    let Some((t, gluing)) = adjacent(s, facet) else {
                        continue;
                    };
                    let expected = if gluing.sign() > 0 {
                        -orientation[s]
                    } else {
                        orientation[s]
                    };
                    if component_of[t] == usize::MAX {
                        component_of[t] = id;
                        orientation[t] = expected;
                        members.push(t);
                        queue.push_back(t);
                    } else if orientation[t] != expected {
                        orientable = false;
                    }
                }
            }
            members.sort_unstable();
            components.push(Component {
                simplices: members,
                orientable,
                boundary_facets,
            });
        }
        (component_of, orientation, components)
    }

    fn vertex_classes(
        n: usize,
        adjacent: &impl Fn(usize, usize) -> Option<(usize, Perm)>,
        simplices: &[(SimplexKey, &Simplex<D>)],
    ) -> (Vec<FacetBuffer<usize>>, Vec<Vec<VertexEmbedding>>) {
        let slot = |s: usize, v: usize| s * (D + 1) + v;
        let mut sets = DisjointSets::new(n * (D + 1));
        for s in 0..n {
            for facet in 0..=D {
                let Some((t, gluing)) = adjacent(s, facet) else {
                    continue;
                };
                for v in (0..=D).filter(|&v| v != facet) {
                    sets.merge(slot(s, v), slot(t, gluing.image(v)));
                }
            }
        }
        let (labels, count) = sets.labels();
        let mut embeddings = vec![Vec::new(); count];
        let mut simplex_vertices = Vec::with_capacity(n);
        for (s, (key, _)) in simplices.iter().enumerate() {
            let row: FacetBuffer<usize> = (0..=D).map(|v| labels[slot(s, v)]).collect();
            for (v, &class) in row.iter().enumerate() {
                embeddings[class].push(VertexEmbedding {
                    simplex: *key,
                    simplex_index: s,
                    vertex: v,
                });
            }
            simplex_vertices.push(row);
        }
        (simplex_vertices, embeddings)
    }

    fn edge_classes(
        n: usize,
        adjacent: &impl Fn(usize, usize) -> Option<(usize, Perm)>,
        simplices: &[(SimplexKey, &Simplex<D>)],
        simplex_vertices: &[FacetBuffer<usize>],
    ) -> (Vec<SmallBuffer<usize, MAX_EDGES_PER_SIMPLEX>>, Vec<SkeletonEdge>) {
        let per_simplex = edge_number(D - 1, D, D) + 1;
        let slot = |s: usize, a: usize, b: usize| s * per_simplex + edge_number(a, b, D);
        let mut sets = DisjointSets::new(n * per_simplex);
        let mut conflicted = Vec::new();
        for s in 0..n {
            for facet in 0..=D {
                let Some((t, gluing)) = adjacent(s, facet) else {
                    continue;
                };
                for (a, b) in edge_pairs(D).filter(|&(a, b)| a != facet && b != facet) {
                    let (ga, gb) = (gluing.image(a), gluing.image(b));
                    let reversed = ga > gb;
                    let far = slot(t, ga.min(gb), ga.max(gb));
                    if let Err(root) = sets.union(slot(s, a, b), far, reversed) {
                        conflicted.push(root);
                    }
                }
            }
        }
        let invalid_roots: FastHashSet<usize> =
            conflicted.iter().map(|&root| sets.root(root)).collect();
        let (labels, count) = sets.labels();

        let mut edges: Vec<Option<SkeletonEdge>> = vec![None; count];
        let mut simplex_edges = Vec::with_capacity(n);
        for (s, (key, simplex)) in simplices.iter().enumerate() {
            let mut row = SmallBuffer::new();
            for (a, b) in edge_pairs(D) {
                let element = slot(s, a, b);
                let class = labels[element];
                row.push(class);
                let (root, flipped) = sets.find(element);
                let vertices = if flipped { [b, a] } else { [a, b] };
                let boundary = (0..=D)
                    .filter(|&facet| facet != a && facet != b)
                    .any(|facet| simplex.is_boundary_facet(facet));
                let edge = edges[class].get_or_insert_with(|| SkeletonEdge {
                    embeddings: Vec::new(),
                    vertices: [
                        simplex_vertices[s][vertices[0]],
                        simplex_vertices[s][vertices[1]],
                    ],
                    valid: !invalid_roots.contains(&root),
                    boundary: false,
                });
                edge.boundary |= boundary;
                edge.embeddings.push(EdgeEmbedding {
                    simplex: *key,
                    simplex_index: s,
                    vertices,
                });
            }
            simplex_edges.push(row);
        }
        (simplex_edges, edges.into_iter().flatten().collect())
    }

    fn facet_classes(
        n: usize,
        adjacent: &impl Fn(usize, usize) -> Option<(usize, Perm)>,
        simplices: &[(SimplexKey, &Simplex<D>)],
    ) -> (Vec<FacetBuffer<usize>>, Vec<SkeletonFacet>) {
        let mut simplex_facets: Vec<FacetBuffer<usize>> =
            (0..n).map(|_| std::iter::repeat_n(usize::MAX, D + 1).collect()).collect();
        let mut facets = Vec::new();
        for s in 0..n {
            for facet in 0..=D {
                if simplex_facets[s][facet] != usize::MAX {
                    continue;
                }
                let id = facets.len();
                let ordering = Perm::facet_ordering(facet, D + 1);
                let mut embeddings = FacetEmbeddingBuffer::new();
                embeddings.push(FacetEmbedding {
                    simplex: simplices[s].0,
                    simplex_index: s,
                    facet,
                    vertices: ordering,
                });
                simplex_facets[s][facet] = id;
                if let Some((t, gluing)) = adjacent(s, facet) {
                    let far_facet = gluing.image(facet);
                    embeddings.push(FacetEmbedding {
                        simplex: simplices[t].0,
                        simplex_index: t,
                        facet: far_facet,
                        vertices: gluing * ordering,
                    });
                    simplex_facets[t][far_facet] = id;
                }
                facets.push(SkeletonFacet {
                    embeddings,
                    boundary_component: None,
                });
            }
        }
        (simplex_facets, facets)
    }

    /// Groups boundary facets that meet along boundary ridges.
    ///
    /// From boundary facet `f` of simplex `s` and another vertex `x`, the
    /// ridge opposite `{f, x}` is followed through the simplices around it
    /// until a boundary facet is reached again.
    fn real_boundary_components(
        n: usize,
        adjacent: &impl Fn(usize, usize) -> Option<(usize, Perm)>,
        simplex_facets: &[FacetBuffer<usize>],
        facets: &mut [SkeletonFacet],
    ) -> Vec<BoundaryComponent> {
        let mut sets = DisjointSets::new(facets.len());
        if D >= 2 {
            let step_limit = n * (D + 1) + 1;
            for s in 0..n {
                for facet in (0..=D).filter(|&facet| adjacent(s, facet).is_none()) {
                    for pivot in (0..=D).filter(|&pivot| pivot != facet) {
                        let (mut at, mut entered, mut exit) = (s, facet, pivot);
                        for _ in 0..step_limit {
                            match adjacent(at, exit) {
                                None => {
                                    sets.merge(simplex_facets[s][facet], simplex_facets[at][exit]);
                                    break;
                                }
                                Some((t, gluing)) => {
                                    (at, entered, exit) =
                                        (t, gluing.image(exit), gluing.image(entered));
                                }
                            }
                        }
                    }
                }
            }
        }

        let mut component_of_root = vec![usize::MAX; facets.len()];
        let mut components: Vec<Vec<usize>> = Vec::new();
        for id in 0..facets.len() {
            if !facets[id].is_boundary() {
                continue;
            }
            let root = sets.root(id);
            if component_of_root[root] == usize::MAX {
                component_of_root[root] = components.len();
                components.push(Vec::new());
            }
            let component = component_of_root[root];
            components[component].push(id);
            facets[id].boundary_component = Some(component);
        }
        components
            .into_iter()
            .map(|facets| BoundaryComponent::Real { facets })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Triangulation version this skeleton was computed at.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    /// Vertex classes.
    #[must_use]
    pub fn vertices(&self) -> &[SkeletonVertex] {
        &self.vertices
    }

    /// Edge classes.
    #[must_use]
    pub fn edges(&self) -> &[SkeletonEdge] {
        &self.edges
    }

    /// Facet classes.
    #[must_use]
    pub fn facets(&self) -> &[SkeletonFacet] {
        &self.facets
    }

    /// Connected components.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Real boundary components, then one per ideal vertex.
    #[must_use]
    pub fn boundary_components(&self) -> &[BoundaryComponent] {
        &self.boundary_components
    }

    /// Number of vertex classes.
    #[must_use]
    pub fn count_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edge classes.
    #[must_use]
    pub fn count_edges(&self) -> usize {
        self.edges.len()
    }

    /// Number of facet classes.
    #[must_use]
    pub fn count_facets(&self) -> usize {
        self.facets.len()
    }

    /// Number of connected components.
    #[must_use]
    pub fn count_components(&self) -> usize {
        self.components.len()
    }

    /// Number of boundary components, real and ideal.
    #[must_use]
    pub fn count_boundary_components(&self) -> usize {
        self.boundary_components.len()
    }

    /// Vertex class of vertex `vertex` of the simplex at `simplex`.
    #[must_use]
    pub fn vertex_of(&self, simplex: usize, vertex: usize) -> Option<usize> {
        self.simplex_vertices.get(simplex)?.get(vertex).copied()
    }

    /// Edge class of the edge `{a, b}` of the simplex at `simplex`.
    #[must_use]
    pub fn edge_of(&self, simplex: usize, a: usize, b: usize) -> Option<usize> {
        if a == b || a > D || b > D {
            return None;
        }
        let number = edge_number(a.min(b), a.max(b), D);
        self.simplex_edges.get(simplex)?.get(number).copied()
    }

    /// Facet class of facet `facet` of the simplex at `simplex`.
    #[must_use]
    pub fn facet_of(&self, simplex: usize, facet: usize) -> Option<usize> {
        self.simplex_facets.get(simplex)?.get(facet).copied()
    }

    /// Component of the simplex at `simplex`.
    #[must_use]
    pub fn component_of(&self, simplex: usize) -> Option<usize> {
        self.simplex_components.get(simplex).copied()
    }

    /// Orientation (`±1`) assigned to the simplex at `simplex`; consistent
    /// across gluings within orientable components.
    #[must_use]
    pub fn orientation(&self, simplex: usize) -> Option<i8> {
        self.orientation.get(simplex).copied()
    }

    /// Every vertex and edge is valid.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.vertices.iter().all(SkeletonVertex::is_valid)
            && self.edges.iter().all(SkeletonEdge::is_valid)
    }

    /// Some vertex is ideal.
    #[must_use]
    pub fn is_ideal(&self) -> bool {
        self.vertices.iter().any(SkeletonVertex::is_ideal)
    }

    /// Every component is orientable.
    #[must_use]
    pub fn is_orientable(&self) -> bool {
        self.components.iter().all(Component::is_orientable)
    }

    /// At most one component.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.components.len() <= 1
    }

    /// No boundary components, real or ideal.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.boundary_components.is_empty()
    }
}

/// Position of edge `{a, b}` (`a < b`) in the lexicographic list of edges
/// of a `dimension`-simplex.
const fn edge_number(a: usize, b: usize, dimension: usize) -> usize {
    let n = dimension + 1;
    a * (2 * n - a - 1) / 2 + (b - a - 1)
}

fn edge_pairs(dimension: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..=dimension).flat_map(move |a| (a + 1..=dimension).map(move |b| (a, b)))
}

// =============================================================================
// TRIANGULATION QUERIES
// =============================================================================

impl<const D: usize> Triangulation<D> {
    /// Number of vertex classes.
    pub fn count_vertices(&self) -> usize {
        self.skeleton().count_vertices()
    }

    /// Number of edge classes.
    pub fn count_edges(&self) -> usize {
        self.skeleton().count_edges()
    }

    /// Number of facet classes.
    pub fn count_facets(&self) -> usize {
        self.skeleton().count_facets()
    }

    /// Number of connected components.
    pub fn count_components(&self) -> usize {
        self.skeleton().count_components()
    }

    /// Number of boundary components, real and ideal.
    pub fn count_boundary_components(&self) -> usize {
        self.skeleton().count_boundary_components()
    }

    /// Every vertex and edge is valid.
    pub fn is_valid(&self) -> bool {
        self.skeleton().is_valid()
    }

    /// Some vertex is ideal.
    pub fn is_ideal(&self) -> bool {
        self.skeleton().is_ideal()
    }

    /// Every component is orientable.
    pub fn is_orientable(&self) -> bool {
        self.skeleton().is_orientable()
    }

    /// At most one component.
    pub fn is_connected(&self) -> bool {
        self.skeleton().is_connected()
    }

    /// No boundary components, real or ideal.
    pub fn is_closed(&self) -> bool {
        self.skeleton().is_closed()
    }
}
