//! Classic 3-manifold triangulations shared by the integration tests.
#![allow(dead_code)]

use gluing::prelude::*;

/// Two tetrahedra glued by the identity on every facet: the 3-sphere.
pub fn two_tetrahedron_sphere() -> Triangulation<3> {
    let mut tri = Triangulation::<3>::new();
    let a = tri.new_simplex();
    let b = tri.new_simplex();
    for facet in 0..4 {
        tri.join(a, facet, b, Perm::IDENTITY).unwrap();
    }
    tri
}

/// Figure-eight knot complement: ideal, orientable, one torus cusp.
pub fn figure_eight() -> Triangulation<3> {
    let mut tri = Triangulation::<3>::new();
    let r = tri.new_simplex();
    let s = tri.new_simplex();
    tri.join(r, 0, s, Perm::from_images([1, 3, 0, 2])).unwrap();
    tri.join(r, 1, s, Perm::from_images([2, 0, 3, 1])).unwrap();
    tri.join(r, 2, s, Perm::from_images([0, 3, 2, 1])).unwrap();
    tri.join(r, 3, s, Perm::from_images([2, 1, 0, 3])).unwrap();
    tri
}

/// Gieseking manifold: ideal, non-orientable, one Klein bottle cusp.
pub fn gieseking() -> Triangulation<3> {
    let mut tri = Triangulation::<3>::new();
    let r = tri.new_simplex();
    tri.join(r, 0, r, Perm::from_images([1, 2, 0, 3])).unwrap();
    tri.join(r, 2, r, Perm::from_images([0, 2, 3, 1])).unwrap();
    tri
}

/// Three-tetrahedron solid Klein bottle: bounded, non-orientable.
pub fn solid_klein_bottle() -> Triangulation<3> {
    let mut tri = Triangulation::<3>::new();
    let r = tri.new_simplex_with_description("r");
    let s = tri.new_simplex_with_description("s");
    let t = tri.new_simplex_with_description("t");
    tri.join(s, 0, r, Perm::IDENTITY).unwrap();
    tri.join(s, 3, r, Perm::from_images([3, 0, 1, 2])).unwrap();
    tri.join(s, 1, t, Perm::from_images([3, 0, 1, 2])).unwrap();
    tri.join(s, 2, t, Perm::IDENTITY).unwrap();
    tri
}

/// RP² × S¹: the solid Klein bottle with its boundary identified. Closed,
/// non-orientable.
pub fn rp2_cross_circle() -> Triangulation<3> {
    let mut tri = solid_klein_bottle();
    let r = tri.key(0);
    let t = tri.key(2);
    tri.join(r, 1, t, Perm::from_images([2, 3, 0, 1])).unwrap();
    tri.join(r, 3, t, Perm::from_images([2, 3, 0, 1])).unwrap();
    tri
}

/// A single tetrahedron with every facet on the boundary.
pub fn ball() -> Triangulation<3> {
    let mut tri = Triangulation::<3>::new();
    tri.new_simplex();
    tri
}

/// Every classic fixture with a name, for table-driven tests.
pub fn all_fixtures() -> Vec<(&'static str, Triangulation<3>)> {
    vec![
        ("sphere", two_tetrahedron_sphere()),
        ("figure eight", figure_eight()),
        ("gieseking", gieseking()),
        ("solid klein bottle", solid_klein_bottle()),
        ("rp2 x s1", rp2_cross_circle()),
        ("ball", ball()),
    ]
}

/// Installs a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
