//! Vertex relabelling permutations.
//!
//! A [`Perm`] records how the `D + 1` vertex labels of one simplex map onto
//! the vertex labels of another. Permutations live in a fixed eight-slot
//! array; every slot past the active degree is a fixed point, which lets
//! permutations of different sizes compose without carrying a length.

use std::fmt;
use std::ops::{Index, Mul};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::core::collections::MAX_PRACTICAL_DIMENSION_SIZE;

/// Number of slots held by every [`Perm`].
pub const PERM_CAPACITY: usize = MAX_PRACTICAL_DIMENSION_SIZE;

/// Errors produced when building a [`Perm`] from untrusted input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PermError {
    /// More images were supplied than a permutation can hold.
    #[error("permutation of {size} points exceeds the supported maximum of {PERM_CAPACITY}")]
    TooLarge {
        /// The requested number of points.
        size: usize,
    },
    /// The images do not form a bijection of `0..images.len()`.
    #[error("images {images:?} do not form a permutation")]
    NotAPermutation {
        /// The offending image list.
        images: Vec<u8>,
    },
    /// A lexicographic rank fell outside `0..n!`.
    #[error("rank {rank} is out of range for permutations of {size} points")]
    RankOutOfRange {
        /// The requested rank.
        rank: usize,
        /// The number of points permuted.
        size: usize,
    },
}

/// A permutation of at most [`PERM_CAPACITY`] points.
///
/// `p[i]` is the image of `i`. Composition follows function notation:
/// `p * q` applies `q` first and then `p`.
///
/// # Examples
///
/// ```rust
/// use gluing::core::perm::Perm;
///
/// let p = Perm::from_images([1, 2, 0, 3]);
/// assert_eq!(p[0], 1);
/// assert_eq!((p * p.inverse()), Perm::IDENTITY);
/// assert_eq!(p.sign(), 1);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Perm {
    images: [u8; PERM_CAPACITY],
}

const IDENTITY_IMAGES: [u8; PERM_CAPACITY] = {
    let mut images = [0u8; PERM_CAPACITY];
    let mut i = 0u8;
    while (i as usize) < PERM_CAPACITY {
        images[i as usize] = i;
        i += 1;
    }
    images
};

impl Perm {
    /// The identity permutation.
    pub const IDENTITY: Self = Self {
        images: IDENTITY_IMAGES,
    };

    /// Returns the identity permutation.
    #[must_use]
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    /// Builds a permutation from its images on `0..N`.
    ///
    /// # Panics
    ///
    /// Panics if `images` is not a bijection of `0..N` or if `N` exceeds
    /// [`PERM_CAPACITY`]. In a `const` context this is a compile-time error.
    #[must_use]
    pub const fn from_images<const N: usize>(images: [u8; N]) -> Self {
        assert!(N <= PERM_CAPACITY, "too many images for Perm");
        let mut seen = [false; PERM_CAPACITY];
        let mut out = IDENTITY_IMAGES;
        let mut i = 0;
        while i < N {
            let image = images[i] as usize;
            assert!(image < N, "image out of range");
            assert!(!seen[image], "repeated image");
            seen[image] = true;
            out[i] = images[i];
            i += 1;
        }
        Self { images: out }
    }

    /// Builds a permutation from a slice of images, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`PermError::TooLarge`] if the slice is longer than
    /// [`PERM_CAPACITY`], or [`PermError::NotAPermutation`] if it is not a
    /// bijection of `0..images.len()`.
    pub fn try_from_images(images: &[u8]) -> Result<Self, PermError> {
        if images.len() > PERM_CAPACITY {
            return Err(PermError::TooLarge { size: images.len() });
        }
        let mut seen = [false; PERM_CAPACITY];
        let mut out = IDENTITY_IMAGES;
        for (i, &image) in images.iter().enumerate() {
            let slot = usize::from(image);
            if slot >= images.len() || seen[slot] {
                return Err(PermError::NotAPermutation {
                    images: images.to_vec(),
                });
            }
            seen[slot] = true;
            out[i] = image;
        }
        Ok(Self { images: out })
    }

    /// The transposition swapping `a` and `b` (the identity if `a == b`).
    ///
    /// # Panics
    ///
    /// Panics if either point is not below [`PERM_CAPACITY`].
    #[must_use]
    pub const fn transposition(a: usize, b: usize) -> Self {
        let mut images = IDENTITY_IMAGES;
        let tmp = images[a];
        images[a] = images[b];
        images[b] = tmp;
        Self { images }
    }

    /// The image of `i`.
    #[must_use]
    #[inline]
    pub const fn image(&self, i: usize) -> usize {
        self.images[i] as usize
    }

    /// The point mapped onto `i`.
    #[must_use]
    pub fn pre_image(&self, i: usize) -> usize {
        self.images
            .iter()
            .position(|&image| usize::from(image) == i)
            .unwrap_or(i)
    }

    /// The inverse permutation.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let mut images = IDENTITY_IMAGES;
        for (&point, &image) in IDENTITY_IMAGES.iter().zip(self.images.iter()) {
            images[usize::from(image)] = point;
        }
        Self { images }
    }

    /// Returns `self ∘ other`, applying `other` first.
    #[must_use]
    pub fn compose(&self, other: &Self) -> Self {
        let mut images = IDENTITY_IMAGES;
        for (slot, &mid) in images.iter_mut().zip(other.images.iter()) {
            *slot = self.images[usize::from(mid)];
        }
        Self { images }
    }

    /// `+1` for even permutations, `-1` for odd ones.
    #[must_use]
    pub fn sign(&self) -> i32 {
        let mut visited = [false; PERM_CAPACITY];
        let mut transpositions = 0usize;
        for start in 0..PERM_CAPACITY {
            if visited[start] {
                continue;
            }
            let mut len = 0usize;
            let mut cursor = start;
            while !visited[cursor] {
                visited[cursor] = true;
                cursor = usize::from(self.images[cursor]);
                len += 1;
            }
            transpositions += len - 1;
        }
        if transpositions % 2 == 0 { 1 } else { -1 }
    }

    /// Whether this is the identity.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Whether the permutation maps `0..n` onto itself, fixing every other
    /// point, so that it is a genuine permutation of `n` points.
    #[must_use]
    pub fn acts_on(&self, n: usize) -> bool {
        n <= PERM_CAPACITY && self.images[n..] == IDENTITY_IMAGES[n..]
    }

    /// The images of `0..n`.
    ///
    /// # Panics
    ///
    /// Panics if `n` exceeds [`PERM_CAPACITY`].
    #[must_use]
    pub fn images(&self, n: usize) -> &[u8] {
        &self.images[..n]
    }

    /// The lexicographic rank of this permutation among all permutations
    /// of `n` points, in `0..n!`.
    ///
    /// The permutation must act on `n` points (see [`Perm::acts_on`]).
    #[must_use]
    pub fn rank(&self, n: usize) -> usize {
        debug_assert!(self.acts_on(n), "{self:?} does not act on {n} points");
        let mut rank = 0;
        for i in 0..n {
            let smaller_later = self.images[i + 1..n]
                .iter()
                .filter(|&&later| later < self.images[i])
                .count();
            rank = rank * (n - i) + smaller_later;
        }
        rank
    }

    /// Inverse of [`Perm::rank`].
    ///
    /// # Errors
    ///
    /// Returns [`PermError::TooLarge`] if `n` exceeds [`PERM_CAPACITY`] and
    /// [`PermError::RankOutOfRange`] if `rank >= n!`.
    pub fn from_rank(n: usize, rank: usize) -> Result<Self, PermError> {
        if n > PERM_CAPACITY {
            return Err(PermError::TooLarge { size: n });
        }
        if rank >= factorial(n) {
            return Err(PermError::RankOutOfRange { rank, size: n });
        }
        let mut digits = [0usize; PERM_CAPACITY];
        let mut remainder = rank;
        for i in (0..n).rev() {
            let base = n - i;
            digits[i] = remainder % base;
            remainder /= base;
        }
        let mut unused: Vec<u8> = IDENTITY_IMAGES[..n].to_vec();
        let mut images = IDENTITY_IMAGES;
        for i in 0..n {
            images[i] = unused.remove(digits[i]);
        }
        Ok(Self { images })
    }

    /// Every permutation of `n` points in lexicographic order.
    pub fn all(n: usize) -> impl Iterator<Item = Self> {
        let count = if n <= PERM_CAPACITY { factorial(n) } else { 0 };
        (0..count).filter_map(move |rank| Self::from_rank(n, rank).ok())
    }

    /// The permutation sending `n - 1` to `facet` and `0..n - 1` to the
    /// remaining labels in ascending order.
    ///
    /// Its first `n - 1` images list the vertices of facet `facet` of a
    /// simplex with `n` vertices.
    ///
    /// # Panics
    ///
    /// Panics if `facet >= n` or `n` exceeds [`PERM_CAPACITY`].
    #[must_use]
    pub fn facet_ordering(facet: usize, n: usize) -> Self {
        assert!(facet < n && n <= PERM_CAPACITY, "facet {facet} out of range for {n} points");
        let mut images = IDENTITY_IMAGES;
        let mut slot = 0;
        for label in 0..n {
            if label != facet {
                images[slot] = IDENTITY_IMAGES[label];
                slot += 1;
            }
        }
        images[n - 1] = IDENTITY_IMAGES[facet];
        Self { images }
    }
}

/// `n!` for the small sizes a permutation can hold.
#[must_use]
pub const fn factorial(n: usize) -> usize {
    let mut out = 1;
    let mut i = 2;
    while i <= n {
        out *= i;
        i += 1;
    }
    out
}

impl Default for Perm {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Index<usize> for Perm {
    type Output = u8;

    fn index(&self, i: usize) -> &u8 {
        &self.images[i]
    }
}

impl Mul for Perm {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        self.compose(&rhs)
    }
}

impl fmt::Debug for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Perm{}", self)
    }
}

/// Shows the images up to the last point that moves (at least two).
impl fmt::Display for Perm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = self
            .images
            .iter()
            .enumerate()
            .rposition(|(i, &image)| usize::from(image) != i)
            .map_or(2, |last| (last + 1).max(2));
        f.write_str("(")?;
        for (i, image) in self.images[..shown].iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{image}")?;
        }
        f.write_str(")")
    }
}

// Serialized as the full image array so that the degree never has to be
// inferred on the way back in.
impl Serialize for Perm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.images.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Perm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let images = Vec::<u8>::deserialize(deserializer)?;
        Self::try_from_images(&images).map_err(serde::de::Error::custom)
    }
}
