//! Dense exponent vectors.
//!
//! The wide fallback representation: 32-bit exponents, any number of
//! variables, every supported ordering. The top-level driver restarts on
//! this type when the packed representation overflows.

use std::cmp::Ordering;
use std::fmt;

use smallvec::SmallVec;

use crate::divmask::{DivMap, DivMask};
use crate::monomial::{Monomial, MonomialError};
use crate::ordering::MonomialOrder;

/// A dense monomial with 32-bit exponents and a cached total degree.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct DenseMonomial {
    exps: SmallVec<[u32; 8]>,
    degree: u64,
}

impl DenseMonomial {
    /// Exponent of variable `v`.
    #[must_use]
    pub fn exponent(&self, v: usize) -> u32 {
        self.exps[v]
    }
}

impl Monomial for DenseMonomial {
    fn from_exponents(exps: &[u32]) -> Result<Self, MonomialError> {
        let mut degree = 0u64;
        for &e in exps {
            degree = degree
                .checked_add(e as u64)
                .ok_or(MonomialError::DegreeOverflow)?;
        }
        Ok(Self {
            exps: SmallVec::from_slice(exps),
            degree,
        })
    }

    fn exponents(&self) -> Vec<u32> {
        self.exps.to_vec()
    }

    fn nvars(&self) -> usize {
        self.exps.len()
    }

    fn total_degree(&self) -> u64 {
        self.degree
    }

    fn checked_mul(&self, other: &Self) -> Result<Self, MonomialError> {
        debug_assert_eq!(self.exps.len(), other.exps.len());
        let mut exps = SmallVec::with_capacity(self.exps.len());
        for (a, b) in self.exps.iter().zip(&other.exps) {
            exps.push(a.checked_add(*b).ok_or(MonomialError::DegreeOverflow)?);
        }
        Ok(Self {
            exps,
            degree: self.degree + other.degree,
        })
    }

    fn div_exact(&self, other: &Self) -> Self {
        debug_assert!(self.is_divisible_by(other), "quotient of non-multiple");
        let exps: SmallVec<[u32; 8]> = self
            .exps
            .iter()
            .zip(&other.exps)
            .map(|(a, b)| a - b)
            .collect();
        Self {
            exps,
            degree: self.degree - other.degree,
        }
    }

    fn is_divisible_by(&self, other: &Self) -> bool {
        debug_assert_eq!(self.exps.len(), other.exps.len());
        if other.degree > self.degree {
            return false;
        }
        self.exps.iter().zip(&other.exps).all(|(a, b)| a >= b)
    }

    fn checked_lcm(&self, other: &Self) -> Result<Self, MonomialError> {
        debug_assert_eq!(self.exps.len(), other.exps.len());
        let mut exps = SmallVec::with_capacity(self.exps.len());
        let mut degree = 0u64;
        for (a, b) in self.exps.iter().zip(&other.exps) {
            let e = (*a).max(*b);
            degree = degree
                .checked_add(e as u64)
                .ok_or(MonomialError::DegreeOverflow)?;
            exps.push(e);
        }
        Ok(Self { exps, degree })
    }

    fn weighted_hash(&self, weights: &[u64]) -> u64 {
        debug_assert_eq!(weights.len(), self.exps.len());
        let mut h = 0u64;
        for (&e, &w) in self.exps.iter().zip(weights) {
            h = h.wrapping_add((e as u64).wrapping_mul(w));
        }
        h
    }

    fn compare(&self, other: &Self, ord: &MonomialOrder) -> Ordering {
        ord.compare_slices(&self.exps, &other.exps)
    }

    fn divmask(&self, map: &DivMap) -> DivMask {
        map.mask_of(&self.exps)
    }

    fn supports_ordering(_ord: &MonomialOrder) -> bool {
        true
    }
}

impl fmt::Debug for DenseMonomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mono(")?;
        let mut first = true;
        for (v, &e) in self.exps.iter().enumerate() {
            if e > 0 {
                if !first {
                    write!(f, "*")?;
                }
                first = false;
                if e == 1 {
                    write!(f, "x{}", v)?;
                } else {
                    write!(f, "x{}^{}", v, e)?;
                }
            }
        }
        if first {
            write!(f, "1")?;
        }
        write!(f, ")")
    }
}
