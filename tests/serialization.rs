//! Serde round trips through the index-based construction form.

mod common;

use common::*;
use gluing::prelude::*;
use serde_json::{Value, json};

#[test]
fn fixtures_survive_json() {
    for (name, tri) in all_fixtures() {
        let json = serde_json::to_string(&tri).unwrap();
        let back: Triangulation<3> = serde_json::from_str(&json).unwrap();
        assert!(back.is_identical_to(&tri), "{name}");
        assert!(back.validate_structure().is_ok(), "{name}");
        for index in 0..tri.size() {
            assert_eq!(
                back.simplex(index).description(),
                tri.simplex(index).description(),
                "{name}"
            );
        }
    }
}

#[test]
fn json_layout() {
    let tri = solid_klein_bottle();
    let value: Value = serde_json::to_value(&tri).unwrap();
    assert_eq!(value["dimension"], 3);
    let simplices = value["simplices"].as_array().unwrap();
    assert_eq!(simplices.len(), 3);
    assert_eq!(simplices[1]["description"], "s");
    assert_eq!(
        simplices[1]["facets"][0],
        json!({ "simplex": 0, "gluing": [0, 1, 2, 3, 4, 5, 6, 7] })
    );
    // Boundary facets are null.
    assert_eq!(simplices[0]["facets"][1], Value::Null);
}

#[test]
fn unlabelled_simplices_omit_the_description() {
    let tri = two_tetrahedron_sphere();
    let value = serde_json::to_value(&tri).unwrap();
    assert!(value["simplices"][0].get("description").is_none());
    let back: Triangulation<3> = serde_json::from_value(value).unwrap();
    assert_eq!(back.simplex(0).description(), "");
}

#[test]
fn locks_and_identities_are_not_serialized() {
    let mut tri = figure_eight();
    let r = tri.key(0);
    tri.lock_simplex(r).unwrap();
    let back: Triangulation<3> = serde_json::from_str(&serde_json::to_string(&tri).unwrap()).unwrap();
    assert!(!back.has_locks());
    assert_ne!(back.id(), tri.id());
    assert_ne!(back.simplex(0).uuid(), tri.simplex(0).uuid());
}

#[test]
fn mismatched_or_broken_input_is_rejected() {
    let json = serde_json::to_string(&figure_eight()).unwrap();
    let err = serde_json::from_str::<Triangulation<2>>(&json).unwrap_err();
    assert!(
        err.to_string()
            .contains("construction describes a 3-dimensional triangulation, expected 2")
    );

    // The far side of the gluing is missing.
    let lopsided = json!({
        "dimension": 2,
        "simplices": [
            { "facets": [{ "simplex": 1, "gluing": [0, 1, 2] }, null, null] },
            { "facets": [null, null, null] }
        ]
    });
    assert!(serde_json::from_value::<Triangulation<2>>(lopsided).is_err());

    let not_a_perm = json!({
        "dimension": 1,
        "simplices": [{ "facets": [{ "simplex": 0, "gluing": [0, 0] }, null] }]
    });
    assert!(serde_json::from_value::<Triangulation<1>>(not_a_perm).is_err());
}
