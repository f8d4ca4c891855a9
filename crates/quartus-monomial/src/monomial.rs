//! The monomial capability trait.
//!
//! Every representation provides the same small operation set; the engine
//! is generic over it and is specialized per concrete type at dispatch.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

use crate::divmask::{DivMap, DivMask};
use crate::ordering::MonomialOrder;

/// Errors produced by monomial construction and arithmetic.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MonomialError {
    /// An exponent or a total degree exceeded the representation budget.
    ///
    /// The top-level driver reacts by restarting with a wider
    /// representation before any incorrect result can be produced.
    #[error("monomial degree exceeds the representation budget")]
    DegreeOverflow,

    /// The representation cannot hold this many variables.
    #[error("representation supports at most {max} variables, got {nvars}")]
    TooManyVariables {
        /// Requested variable count.
        nvars: usize,
        /// Representation limit.
        max: usize,
    },
}

/// Operations every monomial representation supports.
///
/// The hash is *linear*: `hash(a·b) = hash(a) + hash(b)` in wrapping
/// arithmetic, which lets the hashtable compute product hashes without
/// materializing the product.
pub trait Monomial: Clone + PartialEq + Eq + Hash + Debug + Send + Sync + Sized {
    /// Builds a monomial from an exponent vector, checking every component
    /// and the total degree against the representation budget.
    fn from_exponents(exps: &[u32]) -> Result<Self, MonomialError>;

    /// Exports the exponent vector in natural variable order.
    fn exponents(&self) -> Vec<u32>;

    /// Number of variables.
    fn nvars(&self) -> usize;

    /// Total degree, O(1).
    fn total_degree(&self) -> u64;

    /// Returns true for the identity monomial.
    fn is_one(&self) -> bool {
        self.total_degree() == 0
    }

    /// Componentwise sum, overflow-checked.
    fn checked_mul(&self, other: &Self) -> Result<Self, MonomialError>;

    /// Componentwise difference. The caller guarantees `other` divides
    /// `self`; violating that is a logic bug, checked in debug builds.
    fn div_exact(&self, other: &Self) -> Self;

    /// Returns true iff `other` divides `self` (every component of `other`
    /// is at most the matching component of `self`).
    fn is_divisible_by(&self, other: &Self) -> bool;

    /// Divisibility test returning the quotient on success.
    fn try_div(&self, other: &Self) -> Option<Self> {
        if self.is_divisible_by(other) {
            Some(self.div_exact(other))
        } else {
            None
        }
    }

    /// Componentwise maximum, overflow-checked on the resulting degree.
    fn checked_lcm(&self, other: &Self) -> Result<Self, MonomialError>;

    /// Linear hash: the inner product of the exponent vector with the
    /// weight vector, wrapping.
    fn weighted_hash(&self, weights: &[u64]) -> u64;

    /// Compares under the given ordering.
    ///
    /// The representation must support the ordering; the dispatch layer
    /// checks [`Monomial::supports_ordering`] up front.
    fn compare(&self, other: &Self, ord: &MonomialOrder) -> Ordering;

    /// Computes the divisibility mask under the given threshold map.
    fn divmask(&self, map: &DivMap) -> DivMask;

    /// Whether this representation implements the ordering.
    fn supports_ordering(ord: &MonomialOrder) -> bool;
}
