//! # gluing
//!
//! Combinatorial triangulations of manifolds: `D`-dimensional simplices
//! glued pairwise along their facets by vertex relabelling permutations.
//!
//! # Features
//!
//! - Triangulations of any dimension `1 <= D <= 7` with slotmap-backed
//!   storage and stable simplex keys
//! - Checked editing that keeps every gluing mirrored on both sides, honours
//!   simplex and facet locks, and fires one change notification per edit
//! - Staged bulk construction that bypasses per-edit checks and is adopted
//!   in a single step
//! - A lazily computed skeleton: vertex, edge and facet classes, vertex link
//!   classification, components, orientability and boundary components
//! - 3-dimensional surgery: truncating ideal vertices, puncturing and
//!   connected sums
//! - Isomorphism signatures with a pluggable canonical labelling
//! - Serialization with [serde](https://serde.rs)
//!
//! # Basic Usage
//!
//! ```rust
//! use gluing::prelude::*;
//!
//! // The figure-eight knot complement: two tetrahedra, no boundary facets,
//! // one ideal vertex whose link is a torus.
//! let mut tri = Triangulation::<3>::new();
//! let r = tri.new_simplex();
//! let s = tri.new_simplex();
//! tri.join(r, 0, s, Perm::from_images([1, 3, 0, 2])).unwrap();
//! tri.join(r, 1, s, Perm::from_images([2, 0, 3, 1])).unwrap();
//! tri.join(r, 2, s, Perm::from_images([0, 3, 2, 1])).unwrap();
//! tri.join(r, 3, s, Perm::from_images([2, 1, 0, 3])).unwrap();
//!
//! assert!(tri.is_ideal());
//! assert!(tri.is_orientable());
//! assert_eq!(tri.count_vertices(), 1);
//! assert_eq!(tri.skeleton().vertices()[0].link(), VertexLink::Torus);
//!
//! // Truncate the cusp: the result is compact with a torus boundary.
//! assert!(tri.ideal_to_finite().unwrap());
//! assert!(!tri.is_ideal());
//! assert_eq!(tri.count_boundary_components(), 1);
//! ```
//!
//! # Change notifications
//!
//! Every checked edit runs inside a [`ChangeSpan`](core::change::ChangeSpan).
//! Nested spans collapse, so a surgery that performs many gluings still
//! bumps the version once and notifies listeners once:
//!
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use gluing::prelude::*;
//!
//! let mut tri = Triangulation::<3>::new();
//! tri.new_simplex();
//! let seen = Arc::new(AtomicU64::new(0));
//! let counter = Arc::clone(&seen);
//! tri.subscribe(Arc::new(move |_event: &ChangeEvent| {
//!     counter.fetch_add(1, Ordering::Relaxed);
//! }));
//!
//! tri.puncture(None).unwrap();
//! assert_eq!(seen.load(Ordering::Relaxed), 1);
//! ```
//!
//! # Staged construction
//!
//! [`Staging`](core::staging::Staging) builds a triangulation with unchecked
//! edits and hands it over whole:
//!
//! ```rust
//! use gluing::prelude::*;
//!
//! let mut staging = Staging::<2>::new();
//! let [a, b] = [staging.new_simplex(), staging.new_simplex()];
//! for facet in 0..3 {
//!     staging.join(a, facet, b, Perm::IDENTITY);
//! }
//! let mut sphere = Triangulation::<2>::new();
//! staging.adopt_into(&mut sphere);
//! assert!(sphere.is_closed());
//! assert_eq!(sphere.count_vertices(), 3);
//! ```

// Forbid unsafe code throughout the entire crate
#![forbid(unsafe_code)]

/// The `core` module holds the triangulation data model: permutations,
/// simplices, the triangulation container, change tracking, staging and the
/// surgery algorithms.
pub mod core {
    /// Structural surgery on 3-dimensional triangulations
    pub mod algorithms {
        /// Connected sums
        pub mod connected_sum;
        /// Puncturing a triangulation
        pub mod puncture;
        /// Truncation of ideal and invalid vertices
        pub mod subdivision;
    }
    pub mod change;
    /// Storage, hashing and small-buffer type aliases
    pub mod collections;
    pub mod construction;
    pub mod perm;
    pub mod simplex;
    pub mod staging;
    pub mod triangulation;
    pub mod util;

    pub use change::*;
    pub use construction::*;
    pub use perm::*;
    pub use simplex::*;
    pub use staging::*;
    pub use triangulation::*;
    // Note: collections module not re-exported here to avoid namespace pollution
}

/// Structure derived from the gluings: the skeleton, vertex links,
/// isomorphisms and isomorphism signatures.
pub mod topology {
    pub mod isomorphism;
    pub mod isosig;
    pub mod link;
    pub mod skeleton;

    pub use isomorphism::*;
    pub use isosig::*;
    pub use link::*;
    pub use skeleton::*;
}

/// A prelude module that re-exports commonly used types.
pub mod prelude {
    pub use crate::core::{
        algorithms::{puncture::PUNCTURE_SIMPLICES, subdivision::PIECES_PER_TETRAHEDRON},
        change::*,
        construction::*,
        perm::*,
        simplex::*,
        staging::*,
        triangulation::*,
    };

    pub use crate::core::collections::{
        FacetBuffer, FastHashMap, FastHashSet, SmallBuffer, Uuid, fast_hash_map_with_capacity,
        fast_hash_set_with_capacity,
    };

    pub use crate::topology::{isomorphism::*, isosig::*, link::*, skeleton::*};
}

/// The function `is_normal` checks that structs implement `auto` traits.
/// Traits are checked at compile time, so this function is only used for
/// testing.
#[must_use]
pub const fn is_normal<T: Sized + Send + Sync + Unpin>() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use crate::{
        core::{
            perm::Perm,
            simplex::Simplex,
            staging::Staging,
            triangulation::Triangulation,
        },
        is_normal,
        topology::skeleton::Skeleton,
    };

    #[test]
    fn normal_types() {
        assert!(is_normal::<Perm>());
        assert!(is_normal::<Simplex<3>>());
        assert!(is_normal::<Triangulation<2>>());
        assert!(is_normal::<Triangulation<3>>());
        assert!(is_normal::<Staging<4>>());
        assert!(is_normal::<Skeleton<3>>());
    }

    #[test]
    fn prelude_exports() {
        use crate::prelude::*;

        let mut map: FastHashMap<SimplexKey, usize> = fast_hash_map_with_capacity(4);
        let mut tri = Triangulation::<3>::new();
        let key = tri.new_simplex();
        map.insert(key, 0);
        assert_eq!(map.get(&key), Some(&0));

        let mut set: FastHashSet<Perm> = fast_hash_set_with_capacity(24);
        set.extend(Perm::all(4));
        assert_eq!(set.len(), 24);

        let buffer: FacetBuffer<usize> = (0..4).collect();
        assert_eq!(buffer.len(), 4);
        let small: SmallBuffer<u8, 2> = SmallBuffer::new();
        assert!(small.is_empty());
        assert_eq!(PUNCTURE_SIMPLICES, 6);
        assert_eq!(PIECES_PER_TETRAHEDRON, 32);
    }
}
