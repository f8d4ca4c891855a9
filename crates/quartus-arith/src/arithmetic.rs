//! The coefficient arithmetic seam.
//!
//! The F4 engine is generic over an [`Arithmetic`] backend: the inner basis
//! computation always runs over a prime field, while normal form and the
//! Gröbner test can also run with exact rational arithmetic.

use num_traits::{One, Zero};
use std::fmt::Debug;

use crate::{Integer, Rational};

/// Coefficient operations required by the linear algebra.
///
/// Besides plain field operations, a backend supplies an accumulator cell
/// type used for dense row elimination: `acc_sub_mul` performs the fused
/// `acc -= a * b` update, and `acc_reduce` folds the accumulator back into
/// a normalized element. Modular backends use this seam for deferred
/// reduction with a wider accumulator.
pub trait Arithmetic: Clone + Send + Sync {
    /// Field element representation.
    type Elem: Clone + Default + PartialEq + Debug + Send + Sync;
    /// Dense-row accumulator cell.
    type Acc: Clone;

    /// The field characteristic, or 0 for the rationals.
    fn characteristic(&self) -> u64;

    /// Number of coefficient lanes carried per element (1 unless batched).
    fn lanes(&self) -> usize {
        1
    }

    /// The additive identity.
    fn zero(&self) -> Self::Elem;

    /// The multiplicative identity.
    fn one(&self) -> Self::Elem;

    /// Returns true if `a` is zero (in every lane).
    fn is_zero(&self, a: &Self::Elem) -> bool;

    /// Returns true if `a` is one (in every lane).
    fn is_one(&self, a: &Self::Elem) -> bool;

    /// Returns true if `a` is invertible in every lane.
    ///
    /// For single-lane backends this is just non-zeroness; the batched
    /// backend reports false when any lane vanishes, which trace apply
    /// treats as an unlucky specialization.
    fn is_invertible(&self, a: &Self::Elem) -> bool {
        !self.is_zero(a)
    }

    fn add(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn sub(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;
    fn neg(&self, a: &Self::Elem) -> Self::Elem;
    fn mul(&self, a: &Self::Elem, b: &Self::Elem) -> Self::Elem;

    /// Multiplicative inverse.
    ///
    /// The caller guarantees `is_invertible(a)`; inverting zero is a logic
    /// bug in the engine, not an input condition.
    fn inv(&self, a: &Self::Elem) -> Self::Elem;

    /// Converts an integer, reducing it per lane.
    fn from_integer(&self, n: &Integer) -> Self::Elem;

    /// Reads one lane back as a `u64` residue.
    ///
    /// Only meaningful for modular backends; panics for the rationals.
    fn lane_residue(&self, a: &Self::Elem, lane: usize) -> u64;

    fn acc_zero(&self) -> Self::Acc;
    fn acc_from(&self, a: &Self::Elem) -> Self::Acc;

    /// Fused `acc -= a * b`.
    fn acc_sub_mul(&self, acc: &mut Self::Acc, a: &Self::Elem, b: &Self::Elem);

    /// Normalizes an accumulator cell back to a field element.
    fn acc_reduce(&self, acc: &Self::Acc) -> Self::Elem;
}

/// Exact rational arithmetic.
///
/// Used by normal form and the Gröbner test over ℚ. The basis computation
/// itself never runs on this backend; the multi-modular driver reduces to
/// prime fields instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct RationalArithmetic;

impl Arithmetic for RationalArithmetic {
    type Elem = Rational;
    type Acc = Rational;

    fn characteristic(&self) -> u64 {
        0
    }

    fn zero(&self) -> Rational {
        Rational::zero()
    }

    fn one(&self) -> Rational {
        Rational::one()
    }

    fn is_zero(&self, a: &Rational) -> bool {
        a.is_zero()
    }

    fn is_one(&self, a: &Rational) -> bool {
        a.is_one()
    }

    fn add(&self, a: &Rational, b: &Rational) -> Rational {
        a + b
    }

    fn sub(&self, a: &Rational, b: &Rational) -> Rational {
        a - b
    }

    fn neg(&self, a: &Rational) -> Rational {
        -a
    }

    fn mul(&self, a: &Rational, b: &Rational) -> Rational {
        a * b
    }

    fn inv(&self, a: &Rational) -> Rational {
        a.recip()
    }

    fn from_integer(&self, n: &Integer) -> Rational {
        Rational::from_integer(n.clone())
    }

    fn lane_residue(&self, _a: &Rational, _lane: usize) -> u64 {
        unreachable!("rational coefficients have no modular residue")
    }

    fn acc_zero(&self) -> Rational {
        Rational::zero()
    }

    fn acc_from(&self, a: &Rational) -> Rational {
        a.clone()
    }

    fn acc_sub_mul(&self, acc: &mut Rational, a: &Rational, b: &Rational) {
        *acc = &*acc - &(a * b);
    }

    fn acc_reduce(&self, acc: &Rational) -> Rational {
        acc.clone()
    }
}
