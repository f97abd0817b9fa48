//! Bulk construction from gluing arrays, and the serialized form built on it.
//!
//! [`Triangulation::insert_construction`] takes two parallel arrays indexed
//! by `(simplex, facet)`: the adjacent simplex (relative to the new block)
//! and the gluing permutation. The block is assembled in a
//! [`Staging`] area and appended in one step, so the input is validated in
//! full before the live triangulation is touched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::core::perm::Perm;
use crate::core::staging::Staging;
use crate::core::triangulation::Triangulation;

/// Problems found in construction arrays.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConstructionError {
    /// The serialized form was written for another dimension.
    #[error("construction describes a {found}-dimensional triangulation, expected {expected}")]
    DimensionMismatch {
        /// Dimension of the target triangulation.
        expected: usize,
        /// Dimension recorded in the input.
        found: usize,
    },
    /// The two arrays list different numbers of simplices.
    #[error("{adjacencies} adjacency rows but {gluings} gluing rows")]
    LengthMismatch {
        /// Rows in the adjacency array.
        adjacencies: usize,
        /// Rows in the gluing array.
        gluings: usize,
    },
    /// A row does not have one entry per facet.
    #[error("simplex {index} lists {found} facets, expected {expected}")]
    WrongFacetCount {
        /// Simplex index within the block.
        index: usize,
        /// Facets per simplex.
        expected: usize,
        /// Entries supplied.
        found: usize,
    },
    /// An adjacency names a simplex outside the block.
    #[error("facet {facet} of simplex {index} names simplex {target}, but only {size} are being built")]
    TargetOutOfRange {
        /// Simplex index within the block.
        index: usize,
        /// The facet.
        facet: usize,
        /// The named simplex.
        target: usize,
        /// Simplices in the block.
        size: usize,
    },
    /// A gluing does not permute the simplex's vertices.
    #[error("facet {facet} of simplex {index} carries the invalid gluing {gluing}")]
    InvalidGluing {
        /// Simplex index within the block.
        index: usize,
        /// The facet.
        facet: usize,
        /// The offending permutation.
        gluing: Perm,
    },
    /// A facet would be glued to itself.
    #[error("facet {facet} of simplex {index} would be glued to itself")]
    SelfGluedFacet {
        /// Simplex index within the block.
        index: usize,
        /// The facet.
        facet: usize,
    },
    /// Two entries claim the same far facet, or the two sides of a gluing
    /// disagree.
    #[error("facet {facet} of simplex {index} disagrees with its partner's entry")]
    Inconsistent {
        /// Simplex index within the block.
        index: usize,
        /// The facet.
        facet: usize,
    },
}

impl<const D: usize> Triangulation<D> {
    /// Appends a block of simplices described by gluing arrays.
    ///
    /// `adjacencies[i][f]` is the block-relative index of the simplex glued
    /// to facet `f` of simplex `i` (or `None` for boundary) and
    /// `gluings[i][f]` the gluing permutation. Each pair is applied once,
    /// from whichever side is met first; the other side must agree.
    /// Gluing entries on boundary facets are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstructionError`] and leaves `self` untouched if the
    /// arrays are malformed or inconsistent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gluing::prelude::*;
    ///
    /// // Two triangles glued along one edge.
    /// let mut tri = Triangulation::<2>::new();
    /// let swap = Perm::from_images([1, 0, 2]);
    /// tri.insert_construction(
    ///     &[[Some(1), None, None], [None, Some(0), None]],
    ///     &[[swap, Perm::IDENTITY, Perm::IDENTITY], [Perm::IDENTITY, swap, Perm::IDENTITY]],
    /// )
    /// .unwrap();
    /// assert_eq!(tri.size(), 2);
    /// assert_eq!(tri.count_boundary_facets(), 4);
    /// ```
    pub fn insert_construction<A, G>(
        &mut self,
        adjacencies: &[A],
        gluings: &[G],
    ) -> Result<(), ConstructionError>
    where
        A: AsRef<[Option<usize>]>,
        G: AsRef<[Perm]>,
    {
        let staging = stage::<D, _, _>(adjacencies, gluings, |_| String::new())?;
        staging.append_to(self);
        Ok(())
    }

    /// Dumps the gluings in the form accepted by
    /// [`Triangulation::from_construction`].
    #[must_use]
    pub fn construction(&self) -> Construction {
        let simplices = self
            .simplices()
            .enumerate()
            .map(|(index, (_, simplex))| ConstructionSimplex {
                description: simplex.description().to_owned(),
                facets: (0..=D)
                    .map(|facet| {
                        self.facet_gluing(index, facet)
                            .map(|(simplex, gluing)| FacetGluing { simplex, gluing })
                    })
                    .collect(),
            })
            .collect();
        Construction {
            dimension: D,
            simplices,
        }
    }

    /// Builds a triangulation from its dumped gluings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConstructionError`] if the dump is for another dimension
    /// or is malformed.
    pub fn from_construction(construction: &Construction) -> Result<Self, ConstructionError> {
        if construction.dimension != D {
            return Err(ConstructionError::DimensionMismatch {
                expected: D,
                found: construction.dimension,
            });
        }
        let adjacencies: Vec<Vec<Option<usize>>> = construction
            .simplices
            .iter()
            .map(|simplex| {
                simplex
                    .facets
                    .iter()
                    .map(|slot| slot.map(|glued| glued.simplex))
                    .collect()
            })
            .collect();
        let gluings: Vec<Vec<Perm>> = construction
            .simplices
            .iter()
            .map(|simplex| {
                simplex
                    .facets
                    .iter()
                    .map(|slot| slot.map_or(Perm::IDENTITY, |glued| glued.gluing))
                    .collect()
            })
            .collect();
        let staging = stage::<D, _, _>(&adjacencies, &gluings, |index| {
            construction.simplices[index].description.clone()
        })?;
        let mut tri = Self::new();
        staging.adopt_into(&mut tri);
        Ok(tri)
    }
}

/// Validates the arrays and builds them into a fresh staging area.
fn stage<const D: usize, A, G>(
    adjacencies: &[A],
    gluings: &[G],
    description: impl Fn(usize) -> String,
) -> Result<Staging<D>, ConstructionError>
where
    A: AsRef<[Option<usize>]>,
    G: AsRef<[Perm]>,
{
    let size = adjacencies.len();
    if gluings.len() != size {
        return Err(ConstructionError::LengthMismatch {
            adjacencies: size,
            gluings: gluings.len(),
        });
    }
    for index in 0..size {
        for found in [adjacencies[index].as_ref().len(), gluings[index].as_ref().len()] {
            if found != D + 1 {
                return Err(ConstructionError::WrongFacetCount {
                    index,
                    expected: D + 1,
                    found,
                });
            }
        }
    }

    let mut staging = Staging::<D>::new();
    let keys: Vec<_> = (0..size)
        .map(|index| staging.new_simplex_with_description(description(index)))
        .collect();

    for index in 0..size {
        for facet in 0..=D {
            let Some(target) = adjacencies[index].as_ref()[facet] else {
                continue;
            };
            let gluing = gluings[index].as_ref()[facet];
            if target >= size {
                return Err(ConstructionError::TargetOutOfRange {
                    index,
                    facet,
                    target,
                    size,
                });
            }
            if !gluing.acts_on(D + 1) {
                return Err(ConstructionError::InvalidGluing {
                    index,
                    facet,
                    gluing,
                });
            }
            let target_facet = gluing.image(facet);
            if target == index && target_facet == facet {
                return Err(ConstructionError::SelfGluedFacet { index, facet });
            }
            let is_free = |key, facet| {
                staging
                    .simplex(key)
                    .is_some_and(|simplex| simplex.is_boundary_facet(facet))
            };
            if !is_free(keys[index], facet) {
                continue;
            }
            if !is_free(keys[target], target_facet) {
                return Err(ConstructionError::Inconsistent {
                    index: target,
                    facet: target_facet,
                });
            }
            staging.join(keys[index], facet, keys[target], gluing);
        }
    }

    // Every slot must now say exactly what the input said.
    let tri = staging.triangulation();
    for index in 0..size {
        for facet in 0..=D {
            let expected = adjacencies[index].as_ref()[facet]
                .map(|target| (target, gluings[index].as_ref()[facet]));
            if tri.facet_gluing(index, facet) != expected {
                return Err(ConstructionError::Inconsistent { index, facet });
            }
        }
    }
    Ok(staging)
}

// =============================================================================
// SERIALIZED FORM
// =============================================================================

/// One glued facet in a [`Construction`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetGluing {
    /// Index of the adjacent simplex.
    pub simplex: usize,
    /// Gluing permutation.
    pub gluing: Perm,
}

/// One simplex in a [`Construction`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstructionSimplex {
    /// Free-form label.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// One entry per facet; `None` for boundary.
    pub facets: Vec<Option<FacetGluing>>,
}

/// Index-based description of a triangulation's gluings.
///
/// This is also the serde representation of [`Triangulation`]. Locks,
/// identities and change history are not part of it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Construction {
    /// Dimension of the simplices.
    pub dimension: usize,
    /// Simplices in index order.
    pub simplices: Vec<ConstructionSimplex>,
}

impl<const D: usize> Serialize for Triangulation<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.construction().serialize(serializer)
    }
}

impl<'de, const D: usize> Deserialize<'de> for Triangulation<D> {
    fn deserialize<De: Deserializer<'de>>(deserializer: De) -> Result<Self, De::Error> {
        let construction = Construction::deserialize(deserializer)?;
        Self::from_construction(&construction).map_err(serde::de::Error::custom)
    }
}
