//! The polynomial exchange format.
//!
//! A polynomial is a pair of parallel lists: exponent vectors and
//! non-zero coefficients. Rational coefficients are reduced fractions
//! with positive denominators by construction of [`Rational`].

use num_traits::Zero;

use quartus_arith::{is_prime_u64, Rational};
use quartus_f4::ExchangePoly;

use crate::error::GroebnerError;

/// The ambient polynomial ring.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PolyRing {
    /// Number of variables.
    pub nvars: usize,
    /// Field characteristic: a prime below 2^63, or 0 for ℚ.
    pub characteristic: u64,
}

impl PolyRing {
    /// A prime-field ring.
    #[must_use]
    pub fn prime_field(nvars: usize, characteristic: u64) -> Self {
        Self {
            nvars,
            characteristic,
        }
    }

    /// The rational ring.
    #[must_use]
    pub fn rational(nvars: usize) -> Self {
        Self {
            nvars,
            characteristic: 0,
        }
    }
}

/// A polynomial in exchange form.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Polynomial<C> {
    monomials: Vec<Vec<u32>>,
    coefficients: Vec<C>,
}

impl<C: Clone + Zero + PartialEq> Polynomial<C> {
    /// Creates a polynomial from parallel term lists.
    ///
    /// # Errors
    ///
    /// Fails when the lists have different lengths, a coefficient is
    /// zero, or the exponent vectors disagree in arity.
    pub fn new(monomials: Vec<Vec<u32>>, coefficients: Vec<C>) -> Result<Self, GroebnerError> {
        if monomials.len() != coefficients.len() {
            return Err(GroebnerError::InvalidInput(
                "monomial and coefficient counts differ".into(),
            ));
        }
        if coefficients.iter().any(Zero::is_zero) {
            return Err(GroebnerError::InvalidInput(
                "zero coefficient in polynomial".into(),
            ));
        }
        if let Some(first) = monomials.first() {
            let arity = first.len();
            if monomials.iter().any(|m| m.len() != arity) {
                return Err(GroebnerError::InvalidInput(
                    "exponent vectors of mixed arity".into(),
                ));
            }
        }
        Ok(Self {
            monomials,
            coefficients,
        })
    }

    /// The zero polynomial.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            monomials: Vec::new(),
            coefficients: Vec::new(),
        }
    }

    /// Exponent vectors, one per term.
    #[must_use]
    pub fn monomials(&self) -> &[Vec<u32>] {
        &self.monomials
    }

    /// Coefficients, parallel to the monomials.
    #[must_use]
    pub fn coefficients(&self) -> &[C] {
        &self.coefficients
    }

    /// True for the zero polynomial.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.monomials.is_empty()
    }

    pub(crate) fn from_exchange((monomials, coefficients): ExchangePoly<C>) -> Self {
        Self {
            monomials,
            coefficients,
        }
    }

    pub(crate) fn to_exchange(&self) -> ExchangePoly<C> {
        (self.monomials.clone(), self.coefficients.clone())
    }
}

/// Checks the ring and returns the non-zero input in exchange form.
///
/// Zero polynomials are dropped; an all-zero (or empty) input is a
/// distinct error. Arity is checked against the ring.
pub(crate) fn validate_input<C: Clone + Zero + PartialEq>(
    ring: &PolyRing,
    polys: &[Polynomial<C>],
) -> Result<Vec<ExchangePoly<C>>, GroebnerError> {
    if polys.is_empty() {
        return Err(GroebnerError::EmptyInput);
    }

    let mut out = Vec::with_capacity(polys.len());
    for p in polys {
        if p.is_zero() {
            continue;
        }
        for m in p.monomials() {
            if m.len() != ring.nvars {
                return Err(GroebnerError::InconsistentVariableCount {
                    expected: ring.nvars,
                    got: m.len(),
                });
            }
        }
        out.push(p.to_exchange());
    }

    if out.is_empty() {
        return Err(GroebnerError::ZeroInput);
    }
    Ok(out)
}

/// Checks that a prime-field characteristic is usable.
pub(crate) fn validate_characteristic(p: u64) -> Result<(), GroebnerError> {
    if p < 2 || p >= (1 << 63) || !is_prime_u64(p) {
        return Err(GroebnerError::InvalidCharacteristic(p));
    }
    Ok(())
}

/// Canonicalizes prime-field coefficients into `[1, p)`, dropping terms
/// that reduce to zero.
pub(crate) fn canonicalize_mod_p(
    polys: Vec<ExchangePoly<u64>>,
    p: u64,
) -> Vec<ExchangePoly<u64>> {
    polys
        .into_iter()
        .map(|(monoms, coeffs)| {
            let mut ms = Vec::with_capacity(monoms.len());
            let mut cs = Vec::with_capacity(coeffs.len());
            for (m, c) in monoms.into_iter().zip(coeffs) {
                let r = c % p;
                if r != 0 {
                    ms.push(m);
                    cs.push(r);
                }
            }
            (ms, cs)
        })
        .filter(|(ms, _)| !ms.is_empty())
        .collect()
}

/// Rationals are exchanged as `(numerator, denominator)` pairs through
/// [`Rational`]; this helper builds one, normalizing sign and content.
///
/// # Panics
///
/// Panics if `denom` is zero.
#[must_use]
pub fn rational(numer: i64, denom: i64) -> Rational {
    Rational::from_i64(numer, denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polynomial_validation() {
        assert!(Polynomial::new(vec![vec![1, 0]], vec![3u64]).is_ok());
        assert!(Polynomial::new(vec![vec![1, 0]], vec![0u64]).is_err());
        assert!(Polynomial::new(vec![vec![1, 0], vec![0, 1]], vec![1u64]).is_err());
        assert!(Polynomial::new(vec![vec![1, 0], vec![1]], vec![1u64, 2]).is_err());
    }

    #[test]
    fn test_input_validation() {
        let ring = PolyRing::prime_field(2, 7);
        let empty: Vec<Polynomial<u64>> = vec![];
        assert_eq!(validate_input(&ring, &empty), Err(GroebnerError::EmptyInput));

        let zeros = vec![Polynomial::<u64>::zero()];
        assert_eq!(validate_input(&ring, &zeros), Err(GroebnerError::ZeroInput));

        let wrong = vec![Polynomial::new(vec![vec![1, 0, 0]], vec![1u64]).unwrap()];
        assert!(matches!(
            validate_input(&ring, &wrong),
            Err(GroebnerError::InconsistentVariableCount { expected: 2, got: 3 })
        ));
    }

    #[test]
    fn test_characteristic_validation() {
        assert!(validate_characteristic(2).is_ok());
        assert!(validate_characteristic(2_147_483_647).is_ok());
        assert!(validate_characteristic(0).is_err());
        assert!(validate_characteristic(6).is_err());
        assert!(validate_characteristic(u64::MAX).is_err());
    }

    #[test]
    fn test_canonicalize_drops_zero_residues() {
        let polys = vec![(vec![vec![1], vec![0]], vec![14u64, 3])];
        let out = canonicalize_mod_p(polys, 7);
        assert_eq!(out, vec![(vec![vec![0]], vec![3])]);
    }
}
