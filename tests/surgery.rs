//! Surgery on the classic fixtures: truncation, puncturing and connected
//! sums.

mod common;

use common::*;
use gluing::prelude::*;

// =============================================================================
// IDEAL TO FINITE
// =============================================================================

#[test]
fn finite_fixtures_are_left_alone() {
    init_tracing();
    for tri in [two_tetrahedron_sphere(), solid_klein_bottle(), rp2_cross_circle(), ball()] {
        let mut edited = tri.clone();
        assert_eq!(edited.ideal_to_finite(), Ok(false));
        assert_eq!(edited.size(), tri.size());
        assert!(edited.is_identical_to(&tri));
        assert_eq!(edited.version(), 0);
    }
}

#[test]
fn truncating_the_gieseking_cusp() {
    init_tracing();
    let mut tri = gieseking();
    assert!(tri.ideal_to_finite().unwrap());
    assert!(tri.size() > 1);
    assert!(tri.validate_structure().is_ok());
    let skeleton = tri.skeleton();
    assert!(
        skeleton
            .vertices()
            .iter()
            .all(|vertex| !vertex.is_ideal() && vertex.is_valid())
    );
    assert!(tri.is_valid());
    assert!(!tri.is_orientable());
    assert!(tri.is_connected());
    assert_eq!(skeleton.count_boundary_components(), 1);
    assert!(!skeleton.boundary_components()[0].is_ideal());
}

#[test]
fn truncating_the_figure_eight_cusp() {
    init_tracing();
    let mut tri = figure_eight();
    let fired = tri.notifications_fired();
    assert!(tri.ideal_to_finite().unwrap());
    assert_eq!(tri.notifications_fired(), fired + 1);
    // Pieces around the cusp are discarded.
    assert!(tri.size() < 2 * PIECES_PER_TETRAHEDRON);
    assert!(tri.is_valid());
    assert!(!tri.is_ideal());
    assert!(tri.is_orientable());
    assert_eq!(tri.count_boundary_components(), 1);
    assert!(
        tri.skeleton()
            .vertices()
            .iter()
            .all(|vertex| matches!(vertex.link(), VertexLink::Sphere | VertexLink::Disc))
    );
    // A second pass has nothing left to do.
    assert_eq!(tri.ideal_to_finite(), Ok(false));
}

#[test]
fn truncation_is_deterministic() {
    let mut first = figure_eight();
    let mut second = figure_eight();
    first.ideal_to_finite().unwrap();
    second.ideal_to_finite().unwrap();
    assert!(first.is_identical_to(&second));
}

// =============================================================================
// PUNCTURE
// =============================================================================

#[test]
fn puncture_adds_six_simplices_and_one_boundary_sphere() {
    init_tracing();
    for (name, tri) in all_fixtures() {
        for index in 0..tri.size() {
            let mut punctured = tri.clone();
            let key = punctured.key(index);
            let before = punctured.count_boundary_components();
            punctured.puncture(Some(key)).unwrap();
            assert_eq!(punctured.size(), tri.size() + PUNCTURE_SIMPLICES, "{name}");
            assert_eq!(punctured.count_boundary_components(), before + 1, "{name}");
            assert!(punctured.validate_structure().is_ok(), "{name}");
            assert_eq!(punctured.is_orientable(), tri.is_orientable(), "{name}");

            // Only facet 0 of the punctured simplex changed.
            for s in 0..tri.size() {
                for facet in 0..4 {
                    let touched = (s == index && facet == 0)
                        || tri.facet_gluing(index, 0).is_some_and(|(t, gluing)| {
                            s == t && facet == gluing.image(0)
                        });
                    if !touched {
                        assert_eq!(
                            punctured.facet_gluing(s, facet),
                            tri.facet_gluing(s, facet),
                            "{name}: simplex {s} facet {facet}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn puncture_reattaches_the_old_neighbour_with_its_gluing() {
    let tri = figure_eight();
    let mut punctured = tri.clone();
    punctured.puncture(None).unwrap();
    let (old_neighbour, gluing) = tri.facet_gluing(0, 0).unwrap();
    let far_facet = gluing.image(0);
    let (end, end_gluing) = punctured.facet_gluing(old_neighbour, far_facet).unwrap();
    assert!(end >= tri.size());
    assert_eq!(end_gluing, gluing.inverse());
}

#[test]
fn new_sphere_is_two_triangles() {
    let mut tri = two_tetrahedron_sphere();
    tri.puncture(None).unwrap();
    let skeleton = tri.skeleton();
    let sphere = &skeleton.boundary_components()[0];
    assert_eq!(sphere.count_facets(), 2);
    let last = tri.size() - 1;
    assert!(tri.simplex(last).is_boundary_facet(0));
    assert!(tri.simplex(last - 1).is_boundary_facet(0));
}

// =============================================================================
// CONNECTED SUM
// =============================================================================

#[test]
fn connected_sum_sizes_and_boundary() {
    init_tracing();
    let fixtures = all_fixtures();
    for (left_name, left) in &fixtures {
        for (right_name, right) in &fixtures {
            let mut sum = left.clone();
            sum.connected_sum_with(right).unwrap();
            assert_eq!(
                sum.size(),
                left.size() + right.size() + PUNCTURE_SIMPLICES,
                "{left_name} # {right_name}"
            );
            assert_eq!(
                sum.count_boundary_facets(),
                left.count_boundary_facets() + right.count_boundary_facets(),
                "{left_name} # {right_name}"
            );
            assert!(sum.validate_structure().is_ok(), "{left_name} # {right_name}");
            assert!(sum.is_connected(), "{left_name} # {right_name}");
            assert_eq!(
                sum.is_orientable(),
                left.is_orientable() && right.is_orientable(),
                "{left_name} # {right_name}"
            );
        }
    }
}

#[test]
fn summing_with_a_copy_of_itself() {
    let mut tri = rp2_cross_circle();
    let copy = tri.clone();
    tri.connected_sum_with(&copy).unwrap();
    assert_eq!(tri.size(), 3 + 3 + PUNCTURE_SIMPLICES);
    assert!(tri.is_closed());
    assert!(tri.is_valid());
    assert!(!tri.is_orientable());
    assert_eq!(copy.size(), 3);
}

#[test]
fn connected_sum_keeps_the_cusps() {
    let mut tri = figure_eight();
    tri.connected_sum_with(&gieseking()).unwrap();
    assert_eq!(tri.count_boundary_components(), 2);
    let cusps: Vec<_> = tri
        .skeleton()
        .vertices()
        .iter()
        .filter(|vertex| vertex.is_ideal())
        .map(SkeletonVertex::link)
        .collect();
    assert_eq!(cusps.len(), 2);
    assert!(cusps.contains(&VertexLink::Torus));
    assert!(cusps.contains(&VertexLink::KleinBottle));
}
