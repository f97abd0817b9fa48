//! Combinatorial isomorphisms.
//!
//! An [`Isomorphism<D>`] relabels a triangulation: simplex `s` becomes
//! simplex `simplex_image[s]`, and its vertex `v` becomes vertex
//! `facet_perm[s][v]` of that image. A gluing of facet `f` of `s` to `t`
//! via `g` becomes a gluing of facet `facet_perm[s][f]` of the image of `s`
//! to the image of `t` via `facet_perm[t] * g * facet_perm[s]⁻¹`.

use thiserror::Error;

use crate::core::perm::Perm;
use crate::core::staging::Staging;
use crate::core::triangulation::Triangulation;

/// Errors raised when building or applying an [`Isomorphism`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IsomorphismError {
    /// Simplex images and vertex relabellings have different lengths.
    #[error("{images} simplex images but {perms} vertex relabellings")]
    LengthMismatch {
        /// Number of simplex images.
        images: usize,
        /// Number of vertex relabellings.
        perms: usize,
    },
    /// The simplex images are not a permutation of `0..n`.
    #[error("simplex images {images:?} are not a permutation")]
    NotABijection {
        /// The offending images.
        images: Vec<usize>,
    },
    /// A vertex relabelling moves points beyond the simplex.
    #[error("vertex relabelling {perm} of simplex {index} does not act on {vertices} vertices")]
    InvalidRelabelling {
        /// Source simplex.
        index: usize,
        /// The relabelling.
        perm: Perm,
        /// Vertices per simplex.
        vertices: usize,
    },
    /// Applied to a triangulation of a different size.
    #[error("isomorphism of {expected} simplices applied to a triangulation of {found}")]
    SizeMismatch {
        /// Size of the isomorphism.
        expected: usize,
        /// Size of the triangulation.
        found: usize,
    },
}

/// A simplex permutation together with a vertex relabelling per simplex.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Isomorphism<const D: usize> {
    simplex_image: Vec<usize>,
    facet_perm: Vec<Perm>,
}

impl<const D: usize> Isomorphism<D> {
    /// The identity on `size` simplices.
    #[must_use]
    pub fn identity(size: usize) -> Self {
        Self {
            simplex_image: (0..size).collect(),
            facet_perm: vec![Perm::IDENTITY; size],
        }
    }

    /// Builds an isomorphism, checking that the simplex images form a
    /// bijection and every relabelling acts on `D + 1` vertices.
    ///
    /// # Errors
    ///
    /// Returns the first [`IsomorphismError`] found.
    pub fn new(simplex_image: Vec<usize>, facet_perm: Vec<Perm>) -> Result<Self, IsomorphismError> {
        if simplex_image.len() != facet_perm.len() {
            return Err(IsomorphismError::LengthMismatch {
                images: simplex_image.len(),
                perms: facet_perm.len(),
            });
        }
        let mut seen = vec![false; simplex_image.len()];
        for &image in &simplex_image {
            if image >= seen.len() || std::mem::replace(&mut seen[image], true) {
                return Err(IsomorphismError::NotABijection {
                    images: simplex_image,
                });
            }
        }
        if let Some((index, &perm)) = facet_perm
            .iter()
            .enumerate()
            .find(|(_, perm)| !perm.acts_on(D + 1))
        {
            return Err(IsomorphismError::InvalidRelabelling {
                index,
                perm,
                vertices: D + 1,
            });
        }
        Ok(Self {
            simplex_image,
            facet_perm,
        })
    }

    /// Number of simplices relabelled.
    #[must_use]
    pub fn size(&self) -> usize {
        self.simplex_image.len()
    }

    /// New index of the simplex at `index`.
    #[must_use]
    pub fn simplex_image(&self, index: usize) -> usize {
        self.simplex_image[index]
    }

    /// Vertex relabelling of the simplex at `index`.
    #[must_use]
    pub fn facet_perm(&self, index: usize) -> Perm {
        self.facet_perm[index]
    }

    /// The inverse isomorphism.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut simplex_image = vec![0; self.size()];
        let mut facet_perm = vec![Perm::IDENTITY; self.size()];
        for (s, &image) in self.simplex_image.iter().enumerate() {
            simplex_image[image] = s;
            facet_perm[image] = self.facet_perm[s].inverse();
        }
        Self {
            simplex_image,
            facet_perm,
        }
    }

    /// Relabelled copy of `tri`. Descriptions travel with their simplices;
    /// locks are not copied.
    ///
    /// # Errors
    ///
    /// Returns [`IsomorphismError::SizeMismatch`] if `tri` has a different
    /// number of simplices.
    pub fn apply(&self, tri: &Triangulation<D>) -> Result<Triangulation<D>, IsomorphismError> {
        if tri.size() != self.size() {
            return Err(IsomorphismError::SizeMismatch {
                expected: self.size(),
                found: tri.size(),
            });
        }
        let preimage = self.inverse().simplex_image;
        let mut staging = Staging::<D>::new();
        let keys: Vec<_> = preimage
            .iter()
            .map(|&s| staging.new_simplex_with_description(tri.simplex(s).description()))
            .collect();
        for s in 0..tri.size() {
            for facet in 0..=D {
                let Some((t, gluing)) = tri.facet_gluing(s, facet) else {
                    continue;
                };
                // Each gluing once, from its lexicographically smaller side.
                if (t, gluing.image(facet)) < (s, facet) {
                    continue;
                }
                let relabelled = self.facet_perm[t] * gluing * self.facet_perm[s].inverse();
                staging.join(
                    keys[self.simplex_image[s]],
                    self.facet_perm[s].image(facet),
                    keys[self.simplex_image[t]],
                    relabelled,
                );
            }
        }
        let mut result = Triangulation::new();
        staging.adopt_into(&mut result);
        Ok(result)
    }
}
