//! General helper utilities

use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// UUIDS
// =============================================================================

/// Errors that can occur during UUID validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum UuidValidationError {
    /// The UUID is nil (all zeros), which is not allowed.
    #[error("UUID is nil (all zeros) which is not allowed")]
    NilUuid,
    /// The UUID is not version 4.
    #[error("UUID is not version 4: expected version 4, found version {found}")]
    InvalidVersion {
        /// The version number that was found.
        found: usize,
    },
}

/// Generates a random version 4 [`Uuid`].
///
/// # Example
///
/// ```
/// use gluing::core::util::make_uuid;
/// let uuid = make_uuid();
/// assert_eq!(uuid.get_version_num(), 4);
/// ```
#[must_use]
pub fn make_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Checks that a UUID is non-nil and version 4.
///
/// # Errors
///
/// Returns [`UuidValidationError::NilUuid`] for the nil UUID and
/// [`UuidValidationError::InvalidVersion`] for any other version.
pub const fn validate_uuid(uuid: &Uuid) -> Result<(), UuidValidationError> {
    if uuid.is_nil() {
        return Err(UuidValidationError::NilUuid);
    }
    let version = uuid.get_version_num();
    if version != 4 {
        return Err(UuidValidationError::InvalidVersion { found: version });
    }
    Ok(())
}

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Environment variable enabling step-by-step surgery tracing.
pub const SURGERY_TRACE_ENV: &str = "TRIANGULATION_SURGERY_TRACE";

/// Whether the environment variable `name` is set (to anything).
#[must_use]
pub fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some()
}

// =============================================================================
// DISJOINT SETS
// =============================================================================

/// Union-find forest whose elements also carry a parity relative to their
/// root.
///
/// Plain equivalence classes use parity `false` everywhere. Edge
/// identification uses the parity to record whether an identification
/// reverses the edge; a class that would be identified with its own reverse
/// is reported by [`DisjointSets::union`].
#[derive(Clone, Debug, Default)]
pub struct DisjointSets {
    parent: Vec<usize>,
    parity: Vec<bool>,
    rank: Vec<u8>,
}

impl DisjointSets {
    /// A forest of `len` singleton classes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
            parity: vec![false; len],
            rank: vec![0; len],
        }
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.parent.len()
    }

    /// Whether the forest has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.parent.is_empty()
    }

    /// The root of `x` and the parity of `x` relative to that root.
    pub fn find(&mut self, x: usize) -> (usize, bool) {
        let mut path = Vec::new();
        let mut cursor = x;
        while self.parent[cursor] != cursor {
            path.push(cursor);
            cursor = self.parent[cursor];
        }
        let root = cursor;
        // Walk back from the node nearest the root so each parity is already
        // relative to the root when the next one needs it.
        for &node in path.iter().rev() {
            let parent = self.parent[node];
            if parent != root {
                self.parity[node] ^= self.parity[parent];
            }
            self.parent[node] = root;
        }
        (root, self.parity[x] && x != root)
    }

    /// The root of `x`.
    pub fn root(&mut self, x: usize) -> usize {
        self.find(x).0
    }

    /// Records that `x` and `y` are equivalent with relative parity `odd`.
    ///
    /// Returns `Ok(true)` if two classes merged, `Ok(false)` if they were
    /// already one class with a consistent parity.
    ///
    /// # Errors
    ///
    /// Returns the shared root if the two elements were already in one class
    /// with the opposite parity.
    pub fn union(&mut self, x: usize, y: usize, odd: bool) -> Result<bool, usize> {
        let (rx, px) = self.find(x);
        let (ry, py) = self.find(y);
        if rx == ry {
            return if px ^ py == odd { Ok(false) } else { Err(rx) };
        }
        let relative = px ^ py ^ odd;
        let (child, parent) = if self.rank[rx] < self.rank[ry] {
            (rx, ry)
        } else {
            (ry, rx)
        };
        self.parent[child] = parent;
        self.parity[child] = relative;
        if self.rank[child] == self.rank[parent] {
            self.rank[parent] = self.rank[parent].saturating_add(1);
        }
        Ok(true)
    }

    /// Plain merge, ignoring parity. Returns whether two classes merged.
    pub fn merge(&mut self, x: usize, y: usize) -> bool {
        let (rx, _) = self.find(x);
        let (ry, _) = self.find(y);
        if rx == ry {
            return false;
        }
        let (child, parent) = if self.rank[rx] < self.rank[ry] {
            (rx, ry)
        } else {
            (ry, rx)
        };
        self.parent[child] = parent;
        if self.rank[child] == self.rank[parent] {
            self.rank[parent] = self.rank[parent].saturating_add(1);
        }
        true
    }

    /// Dense class labels `0..classes` in order of first appearance, and the
    /// number of classes.
    pub fn labels(&mut self) -> (Vec<usize>, usize) {
        let mut label_of_root = vec![usize::MAX; self.len()];
        let mut labels = Vec::with_capacity(self.len());
        let mut classes = 0;
        for x in 0..self.len() {
            let root = self.root(x);
            if label_of_root[root] == usize::MAX {
                label_of_root[root] = classes;
                classes += 1;
            }
            labels.push(label_of_root[root]);
        }
        (labels, classes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuids_are_unique_v4() {
        let a = make_uuid();
        let b = make_uuid();
        assert_ne!(a, b);
        assert!(validate_uuid(&a).is_ok());
        assert_eq!(validate_uuid(&Uuid::nil()), Err(UuidValidationError::NilUuid));
    }

    #[test]
    fn disjoint_sets_merge_and_label() {
        let mut sets = DisjointSets::new(6);
        assert_eq!(sets.union(0, 1, false), Ok(true));
        assert_eq!(sets.union(2, 3, false), Ok(true));
        assert_eq!(sets.union(1, 3, false), Ok(true));
        assert_eq!(sets.union(0, 2, false), Ok(false));
        let (labels, classes) = sets.labels();
        assert_eq!(classes, 3);
        assert_eq!(labels, vec![0, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn parity_conflict_is_reported() {
        let mut sets = DisjointSets::new(4);
        assert_eq!(sets.union(0, 1, true), Ok(true));
        assert_eq!(sets.union(1, 2, true), Ok(true));
        assert_eq!(sets.union(2, 3, false), Ok(true));
        // 0 ~ 3 with even parity is consistent: two odd steps cancel.
        assert_eq!(sets.union(0, 3, false), Ok(false));
        let root = sets.root(0);
        assert_eq!(sets.union(0, 3, true), Err(root));
    }

    #[test]
    fn parity_survives_path_compression() {
        let mut sets = DisjointSets::new(5);
        for i in 0..4 {
            assert_eq!(sets.union(i, i + 1, true), Ok(true));
        }
        for i in 0..5 {
            let (_, p0) = sets.find(0);
            let (_, pi) = sets.find(i);
            assert_eq!(p0 ^ pi, i % 2 == 1);
        }
    }
}
