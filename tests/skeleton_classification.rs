//! Skeleton queries on the classic fixtures.
//!
//! Checks face counts, vertex link types, validity, orientability and
//! boundary components against known values, and cross-checks the
//! per-simplex lookup tables against the face embeddings.

mod common;

use common::*;
use gluing::prelude::*;

// =============================================================================
// KNOWN VALUES
// =============================================================================

#[test]
fn sphere_skeleton() {
    let tri = two_tetrahedron_sphere();
    let skeleton = tri.skeleton();
    assert_eq!(skeleton.count_vertices(), 4);
    assert_eq!(skeleton.count_edges(), 6);
    assert_eq!(skeleton.count_facets(), 4);
    assert!(skeleton.is_valid());
    assert!(skeleton.is_closed());
    assert!(skeleton.is_orientable());
    assert!(!skeleton.is_ideal());
    assert!(
        skeleton
            .vertices()
            .iter()
            .all(|vertex| vertex.link() == VertexLink::Sphere && vertex.degree() == 2)
    );
}

#[test]
fn figure_eight_has_one_torus_cusp() {
    let tri = figure_eight();
    let skeleton = tri.skeleton();
    assert_eq!(skeleton.count_vertices(), 1);
    assert_eq!(skeleton.count_edges(), 2);
    assert_eq!(skeleton.count_facets(), 4);
    assert_eq!(skeleton.count_components(), 1);

    let cusp = &skeleton.vertices()[0];
    assert_eq!(cusp.link(), VertexLink::Torus);
    assert_eq!(cusp.link_summary().euler_characteristic, Some(0));
    assert_eq!(cusp.link_summary().orientable, Some(true));
    assert!(cusp.is_ideal());
    assert!(!cusp.is_boundary());

    assert!(tri.is_valid());
    assert!(tri.is_ideal());
    assert!(tri.is_orientable());
    assert!(!tri.is_closed());
    assert_eq!(
        skeleton.boundary_components(),
        &[BoundaryComponent::Ideal { vertex: 0 }]
    );
}

#[test]
fn gieseking_has_one_klein_bottle_cusp() {
    let tri = gieseking();
    let skeleton = tri.skeleton();
    assert_eq!(skeleton.count_vertices(), 1);
    assert_eq!(skeleton.count_edges(), 1);
    assert_eq!(skeleton.count_facets(), 2);
    assert_eq!(skeleton.vertices()[0].link(), VertexLink::KleinBottle);
    assert_eq!(skeleton.vertices()[0].degree(), 4);
    assert!(tri.is_valid());
    assert!(tri.is_ideal());
    assert!(!tri.is_orientable());
    assert_eq!(tri.count_boundary_components(), 1);
}

#[test]
fn solid_klein_bottle_is_bounded_and_non_orientable() {
    let tri = solid_klein_bottle();
    let skeleton = tri.skeleton();
    assert!(tri.is_valid());
    assert!(!tri.is_ideal());
    assert!(!tri.is_orientable());
    assert_eq!(tri.count_boundary_facets(), 4);
    assert_eq!(skeleton.count_boundary_components(), 1);
    assert_eq!(skeleton.boundary_components()[0].count_facets(), 4);
    assert!(!skeleton.boundary_components()[0].is_ideal());
    for vertex in skeleton.vertices() {
        let expected = if vertex.is_boundary() {
            VertexLink::Disc
        } else {
            VertexLink::Sphere
        };
        assert_eq!(vertex.link(), expected);
    }
    for facet in skeleton.facets() {
        assert_eq!(facet.is_boundary(), facet.boundary_component().is_some());
    }
}

#[test]
fn rp2_cross_circle_is_closed_and_non_orientable() {
    let tri = rp2_cross_circle();
    let skeleton = tri.skeleton();
    assert!(tri.is_valid());
    assert!(tri.is_closed());
    assert!(!tri.is_orientable());
    assert!(!tri.is_ideal());
    assert!(
        skeleton
            .vertices()
            .iter()
            .all(|vertex| vertex.link() == VertexLink::Sphere)
    );
}

#[test]
fn closed_fixtures_have_zero_euler_characteristic() {
    for tri in [two_tetrahedron_sphere(), rp2_cross_circle()] {
        let skeleton = tri.skeleton();
        let chi = skeleton.count_vertices() as i64 - skeleton.count_edges() as i64
            + skeleton.count_facets() as i64
            - tri.size() as i64;
        assert_eq!(chi, 0);
    }
}

// =============================================================================
// STRUCTURAL CROSS-CHECKS
// =============================================================================

#[test]
fn embedding_degrees_account_for_every_face() {
    for (name, tri) in all_fixtures() {
        let skeleton = tri.skeleton();
        let n = tri.size();
        let vertex_degrees: usize = skeleton.vertices().iter().map(SkeletonVertex::degree).sum();
        let edge_degrees: usize = skeleton.edges().iter().map(SkeletonEdge::degree).sum();
        let facet_degrees: usize = skeleton.facets().iter().map(SkeletonFacet::degree).sum();
        assert_eq!(vertex_degrees, 4 * n, "{name}");
        assert_eq!(edge_degrees, 6 * n, "{name}");
        assert_eq!(facet_degrees, 4 * n, "{name}");
        let boundary = skeleton.facets().iter().filter(|facet| facet.is_boundary()).count();
        assert_eq!(boundary, tri.count_boundary_facets(), "{name}");
    }
}

#[test]
fn lookup_tables_match_embeddings() {
    for (name, tri) in all_fixtures() {
        let skeleton = tri.skeleton();
        for (class, vertex) in skeleton.vertices().iter().enumerate() {
            for embedding in vertex.embeddings() {
                assert_eq!(
                    skeleton.vertex_of(embedding.simplex_index, embedding.vertex),
                    Some(class),
                    "{name}"
                );
                assert_eq!(tri.index_of(embedding.simplex), Some(embedding.simplex_index));
            }
        }
        for (class, edge) in skeleton.edges().iter().enumerate() {
            for embedding in edge.embeddings() {
                let [a, b] = embedding.vertices;
                assert_eq!(skeleton.edge_of(embedding.simplex_index, a, b), Some(class), "{name}");
                assert_eq!(
                    [
                        skeleton.vertex_of(embedding.simplex_index, a),
                        skeleton.vertex_of(embedding.simplex_index, b)
                    ],
                    edge.vertices().map(Some),
                    "{name}"
                );
            }
        }
        for (class, facet) in skeleton.facets().iter().enumerate() {
            for embedding in facet.embeddings() {
                assert_eq!(
                    skeleton.facet_of(embedding.simplex_index, embedding.facet),
                    Some(class),
                    "{name}"
                );
                assert_eq!(embedding.vertices.image(3), embedding.facet);
            }
        }
    }
}

#[test]
fn orientations_are_consistent_in_orientable_fixtures() {
    for (name, tri) in all_fixtures() {
        if !tri.is_orientable() {
            continue;
        }
        let skeleton = tri.skeleton();
        for s in 0..tri.size() {
            for facet in 0..4 {
                if let Some((t, gluing)) = tri.facet_gluing(s, facet) {
                    let (os, ot) = (skeleton.orientation(s), skeleton.orientation(t));
                    let expected = os.map(|o| if gluing.sign() > 0 { -o } else { o });
                    assert_eq!(ot, expected, "{name}");
                }
            }
        }
    }
}

#[test]
fn disjoint_union_has_two_components() {
    let mut tri = two_tetrahedron_sphere();
    tri.insert_triangulation(&ball());
    let skeleton = tri.skeleton();
    assert_eq!(skeleton.count_components(), 2);
    assert!(!skeleton.is_connected());
    assert_eq!(skeleton.components()[0].simplices(), &[0, 1]);
    assert_eq!(skeleton.components()[1].simplices(), &[2]);
    assert_eq!(skeleton.components()[1].count_boundary_facets(), 4);
    assert_eq!(skeleton.component_of(2), Some(1));
    assert_eq!(skeleton.vertices()[skeleton.vertex_of(2, 0).unwrap()].component(), 1);
}

#[test]
fn skeleton_is_recomputed_after_each_edit() {
    let mut tri = figure_eight();
    let before = tri.skeleton();
    assert!(!before.is_closed() && before.is_ideal());
    let r = tri.key(0);
    tri.unjoin(r, 0).unwrap();
    let after = tri.skeleton();
    assert!(after.version() > before.version());
    assert_eq!(tri.count_boundary_facets(), 2);
    assert!(!std::sync::Arc::ptr_eq(&before, &after));
    // Holding the old snapshot does not change it.
    assert_eq!(before.count_facets(), 4);
    assert_eq!(after.count_facets(), 5);
}
