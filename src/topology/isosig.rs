//! Isomorphism signatures.
//!
//! A signature is a printable string that identifies a triangulation up to
//! relabelling of simplices and vertices. Each connected component is
//! traversed breadth-first from a chosen starting simplex and vertex
//! labelling; the traversal is written out as
//!
//! 1. the component size,
//! 2. one action per facet visited (`0` boundary, `1` new simplex,
//!    `2` existing simplex), packed three to a character,
//! 3. the destination of every action `2`,
//! 4. the gluing permutation rank of every action `2`.
//!
//! Component signatures are sorted and concatenated. The empty
//! triangulation is `"a"`.
//!
//! Which start a component is traversed from is decided by a
//! [`CanonicalLabelling`]. The default [`ExhaustiveLabelling`] tries every
//! start and keeps the smallest string, which makes the signature a
//! complete invariant.

use thiserror::Error;

use crate::core::perm::{Perm, PermError, factorial};
use crate::core::staging::Staging;
use crate::core::triangulation::{SimplexKey, Triangulation};

const SIG_CHARS: &[u8; 64] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789+-";

/// Widest multi-character value accepted when decoding.
const MAX_VALUE_WIDTH: usize = 10;

/// Errors raised while decoding a signature.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum IsoSigError {
    /// The signature ended early.
    #[error("signature ended unexpectedly")]
    UnexpectedEnd,
    /// A character outside the signature alphabet.
    #[error("invalid signature character {character:?} at position {position}")]
    InvalidCharacter {
        /// The character.
        character: char,
        /// Byte position in the signature.
        position: usize,
    },
    /// A size field declares an unsupported width.
    #[error("invalid size width {width}")]
    InvalidWidth {
        /// The declared width.
        width: usize,
    },
    /// A facet action outside `0..=2`.
    #[error("invalid facet action {action}")]
    InvalidAction {
        /// The decoded action.
        action: usize,
    },
    /// The actions do not account for every facet of every simplex.
    #[error("facet actions do not describe a connected component of {size} simplices")]
    InconsistentActions {
        /// The declared component size.
        size: usize,
    },
    /// A destination names a simplex not yet reached.
    #[error("destination {destination} is not an earlier simplex of the component")]
    InvalidDestination {
        /// The decoded destination.
        destination: usize,
    },
    /// A gluing rank is out of range.
    #[error(transparent)]
    InvalidPermutation(#[from] PermError),
    /// A gluing targets a facet that is already processed or is the source.
    #[error("gluing from facet {facet} of simplex {simplex} targets an unavailable facet")]
    InconsistentGluing {
        /// Source simplex, within its component.
        simplex: usize,
        /// Source facet.
        facet: usize,
    },
}

/// Chooses where the traversal of a component starts.
pub trait CanonicalLabelling<const D: usize> {
    /// Returns the starting simplex (an index from `component`) and the
    /// relabelling applied to its vertices.
    ///
    /// `component` lists the indices of one connected component in
    /// increasing order and is never empty.
    fn choose_start(&self, tri: &Triangulation<D>, component: &[usize]) -> (usize, Perm);
}

/// Tries every simplex and every vertex relabelling; keeps the start with
/// the lexicographically smallest encoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExhaustiveLabelling;

impl<const D: usize> CanonicalLabelling<D> for ExhaustiveLabelling {
    fn choose_start(&self, tri: &Triangulation<D>, component: &[usize]) -> (usize, Perm) {
        let mut best: Option<(String, usize, Perm)> = None;
        for &start in component {
            for perm in Perm::all(D + 1) {
                let encoded = encode_component(tri, component.len(), start, perm);
                if best.as_ref().is_none_or(|(current, ..)| encoded < *current) {
                    best = Some((encoded, start, perm));
                }
            }
        }
        best.map_or((component[0], Perm::IDENTITY), |(_, start, perm)| (start, perm))
    }
}

/// Starts at the lowest-indexed simplex with its own labelling. Fast, but
/// the result depends on the labelling.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexOrderLabelling;

impl<const D: usize> CanonicalLabelling<D> for IndexOrderLabelling {
    fn choose_start(&self, _tri: &Triangulation<D>, component: &[usize]) -> (usize, Perm) {
        (component[0], Perm::IDENTITY)
    }
}

// =============================================================================
// CHARACTER CODING
// =============================================================================

fn push_char(out: &mut String, value: usize) {
    out.push(char::from(SIG_CHARS[value & 63]));
}

fn push_value(out: &mut String, mut value: usize, width: usize) {
    for _ in 0..width {
        push_char(out, value);
        value >>= 6;
    }
}

/// Characters needed to write every value up to and including `max`.
fn width_for(max: usize) -> usize {
    let mut width = 1u32;
    while max.checked_shr(6 * width).is_some_and(|rest| rest != 0) {
        width += 1;
    }
    width as usize
}

fn char_value(byte: u8) -> Option<usize> {
    SIG_CHARS.iter().position(|&c| c == byte)
}

struct Reader<'a> {
    bytes: &'a [u8],
    position: usize,
}

impl<'a> Reader<'a> {
    const fn new(sig: &'a str) -> Self {
        Self {
            bytes: sig.as_bytes(),
            position: 0,
        }
    }

    const fn is_done(&self) -> bool {
        self.position >= self.bytes.len()
    }

    fn next(&mut self) -> Result<usize, IsoSigError> {
        let &byte = self
            .bytes
            .get(self.position)
            .ok_or(IsoSigError::UnexpectedEnd)?;
        let value = char_value(byte).ok_or(IsoSigError::InvalidCharacter {
            character: char::from(byte),
            position: self.position,
        })?;
        self.position += 1;
        Ok(value)
    }

    fn value(&mut self, width: usize) -> Result<usize, IsoSigError> {
        let mut value = 0;
        for digit in 0..width {
            value |= self.next()? << (6 * digit);
        }
        Ok(value)
    }

    fn size(&mut self) -> Result<usize, IsoSigError> {
        let first = self.next()?;
        if first < 63 {
            return Ok(first);
        }
        let width = self.next()?;
        if width == 0 || width > MAX_VALUE_WIDTH {
            return Err(IsoSigError::InvalidWidth { width });
        }
        self.value(width)
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Signature of the component of `start`, traversed from `start` with its
/// vertices relabelled by `start_perm`.
fn encode_component<const D: usize>(
    tri: &Triangulation<D>,
    size: usize,
    start: usize,
    start_perm: Perm,
) -> String {
    let vertices = D + 1;
    let mut image = vec![usize::MAX; tri.size()];
    let mut relabel = vec![Perm::IDENTITY; tri.size()];
    let mut preimage = Vec::with_capacity(size);
    let mut processed = vec![false; tri.size() * vertices];
    let mut actions = Vec::with_capacity(size * vertices);
    let mut destinations = Vec::new();
    let mut gluings = Vec::new();

    image[start] = 0;
    relabel[start] = start_perm;
    preimage.push(start);
    let mut current = 0;
    while current < preimage.len() {
        let s = preimage[current];
        for new_facet in 0..vertices {
            if std::mem::replace(&mut processed[current * vertices + new_facet], true) {
                continue;
            }
            let facet = relabel[s].pre_image(new_facet);
            let Some((t, gluing)) = tri.facet_gluing(s, facet) else {
                actions.push(0);
                continue;
            };
            if image[t] == usize::MAX {
                image[t] = preimage.len();
                relabel[t] = relabel[s] * gluing.inverse();
                preimage.push(t);
                actions.push(1);
            } else {
                actions.push(2);
                destinations.push(image[t]);
                gluings.push((relabel[t] * gluing * relabel[s].inverse()).rank(vertices));
            }
            processed[image[t] * vertices + relabel[t].image(gluing.image(facet))] = true;
        }
        current += 1;
    }

    let width = width_for(size);
    let mut out = String::new();
    if size < 63 {
        push_char(&mut out, size);
    } else {
        push_char(&mut out, 63);
        push_char(&mut out, width);
        push_value(&mut out, size, width);
    }
    for chunk in actions.chunks(3) {
        push_char(&mut out, chunk.iter().rev().fold(0, |packed, &action| packed * 4 + action));
    }
    for destination in destinations {
        push_value(&mut out, destination, width);
    }
    let perm_width = width_for(factorial(vertices) - 1);
    for rank in gluings {
        push_value(&mut out, rank, perm_width);
    }
    out
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes one component and appends it to `staging`.
fn decode_component<const D: usize>(
    reader: &mut Reader<'_>,
    staging: &mut Staging<D>,
) -> Result<(), IsoSigError> {
    let vertices = D + 1;
    let size = reader.size()?;
    if size == 0 {
        return Ok(());
    }
    let inconsistent = IsoSigError::InconsistentActions { size };

    let total = size.checked_mul(vertices).ok_or_else(|| inconsistent.clone())?;
    let mut actions = Vec::new();
    let (mut covered, mut joins, mut created) = (0, 0, 0);
    let (mut packed, mut unread) = (0, 0);
    while covered < total {
        if unread == 0 {
            packed = reader.next()?;
            unread = 3;
        }
        let action = packed & 3;
        packed >>= 2;
        unread -= 1;
        match action {
            0 => covered += 1,
            1 => {
                covered += 2;
                created += 1;
            }
            2 => {
                covered += 2;
                joins += 1;
            }
            _ => return Err(IsoSigError::InvalidAction { action }),
        }
        actions.push(action);
    }
    if covered != total || created + 1 != size {
        return Err(inconsistent);
    }

    let width = width_for(size);
    let destinations = (0..joins)
        .map(|_| reader.value(width))
        .collect::<Result<Vec<_>, _>>()?;
    let perm_width = width_for(factorial(vertices) - 1);
    let gluings = (0..joins)
        .map(|_| Ok(Perm::from_rank(vertices, reader.value(perm_width)?)?))
        .collect::<Result<Vec<_>, IsoSigError>>()?;

    let keys = staging.new_simplices(size);
    let is_open = |staging: &Staging<D>, key: SimplexKey, facet: usize| {
        staging
            .simplex(key)
            .is_some_and(|simplex| simplex.is_boundary_facet(facet))
    };
    let mut actions = actions.into_iter();
    let mut joins = destinations.into_iter().zip(gluings);
    let mut next_new = 1;
    for s in 0..size {
        // Every simplex past the first must be created by an earlier action.
        if s >= next_new {
            return Err(inconsistent);
        }
        for facet in 0..vertices {
            if !is_open(staging, keys[s], facet) {
                continue;
            }
            match actions.next().ok_or_else(|| inconsistent.clone())? {
                0 => {}
                1 => {
                    staging.join(keys[s], facet, keys[next_new], Perm::IDENTITY);
                    next_new += 1;
                }
                _ => {
                    let (destination, gluing) = joins.next().ok_or(IsoSigError::UnexpectedEnd)?;
                    if destination >= next_new {
                        return Err(IsoSigError::InvalidDestination { destination });
                    }
                    let far_facet = gluing.image(facet);
                    if (destination, far_facet) <= (s, facet)
                        || !is_open(staging, keys[destination], far_facet)
                    {
                        return Err(IsoSigError::InconsistentGluing { simplex: s, facet });
                    }
                    staging.join(keys[s], facet, keys[destination], gluing);
                }
            }
        }
    }
    if actions.next().is_some() {
        return Err(inconsistent);
    }
    Ok(())
}

/// Number of simplices in the first component of `sig`.
///
/// # Errors
///
/// Returns [`IsoSigError`] if the size field cannot be read.
pub fn iso_sig_component_size(sig: &str) -> Result<usize, IsoSigError> {
    Reader::new(sig).size()
}

// =============================================================================
// TRIANGULATION API
// =============================================================================

impl<const D: usize> Triangulation<D> {
    /// Canonical isomorphism signature.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use gluing::prelude::*;
    ///
    /// let mut tri = Triangulation::<3>::new();
    /// assert_eq!(tri.iso_sig(), "a");
    /// tri.new_simplex();
    /// assert_eq!(tri.iso_sig(), "baa");
    /// ```
    #[must_use]
    pub fn iso_sig(&self) -> String {
        self.iso_sig_with(&ExhaustiveLabelling)
    }

    /// Signature using `labelling` to pick each component's start.
    #[must_use]
    pub fn iso_sig_with<L: CanonicalLabelling<D> + ?Sized>(&self, labelling: &L) -> String {
        if self.is_empty() {
            let mut out = String::new();
            push_char(&mut out, 0);
            return out;
        }
        let skeleton = self.skeleton();
        let mut parts: Vec<String> = skeleton
            .components()
            .iter()
            .map(|component| {
                let (start, perm) = labelling.choose_start(self, component.simplices());
                encode_component(self, component.size(), start, perm)
            })
            .collect();
        parts.sort_unstable();
        parts.concat()
    }

    /// Rebuilds a triangulation from a signature.
    ///
    /// The result is isomorphic to the triangulation the signature was
    /// taken from.
    ///
    /// # Errors
    ///
    /// Returns [`IsoSigError`] if the signature is malformed.
    pub fn from_iso_sig(sig: &str) -> Result<Self, IsoSigError> {
        let mut reader = Reader::new(sig);
        let mut staging = Staging::<D>::new();
        loop {
            decode_component(&mut reader, &mut staging)?;
            if reader.is_done() {
                break;
            }
        }
        tracing::debug!(sig, simplices = staging.size(), "decoded isomorphism signature");
        let mut tri = Self::new();
        staging.adopt_into(&mut tri);
        Ok(tri)
    }

    /// Whether the two triangulations are combinatorially isomorphic.
    #[must_use]
    pub fn is_isomorphic_to(&self, other: &Self) -> bool {
        self.size() == other.size()
            && self.count_components() == other.count_components()
            && self.iso_sig() == other.iso_sig()
    }
}
