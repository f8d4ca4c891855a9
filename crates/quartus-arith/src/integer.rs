//! Arbitrary precision integers.
//!
//! This module wraps `dashu::IBig` with the operations needed by the
//! multi-modular driver: gcd/lcm, Chinese remaindering, integer square
//! roots for reconstruction bounds.

use dashu::base::{Abs, BitTest, Gcd, Signed as DashuSigned};
use dashu::integer::IBig;
use num_traits::{One, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Rem, Sub};

/// An arbitrary precision integer.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Integer(IBig);

impl Integer {
    /// Creates a new integer from an i64.
    #[must_use]
    pub fn new(value: i64) -> Self {
        Self(IBig::from(value))
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.clone().abs())
    }

    /// Returns the sign: -1, 0, or 1.
    #[must_use]
    pub fn signum(&self) -> i8 {
        if self.0.is_zero() {
            0
        } else if DashuSigned::is_positive(&self.0) {
            1
        } else {
            -1
        }
    }

    /// Returns true if this integer is negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        DashuSigned::is_negative(&self.0)
    }

    /// Returns the number of bits needed to represent this integer.
    #[must_use]
    pub fn bit_len(&self) -> usize {
        self.0.bit_len()
    }

    /// Computes the greatest common divisor.
    #[must_use]
    pub fn gcd(&self, other: &Self) -> Self {
        Self(IBig::from(self.0.clone().gcd(other.0.clone())))
    }

    /// Computes the least common multiple.
    #[must_use]
    pub fn lcm(&self, other: &Self) -> Self {
        if self.is_zero() || other.is_zero() {
            return Self::zero();
        }
        let g = self.gcd(other);
        Self(&self.0 / &g.0 * &other.0).abs()
    }

    /// Returns the inner `dashu::IBig`.
    #[must_use]
    pub fn into_inner(self) -> IBig {
        self.0
    }

    /// Returns a reference to the inner `dashu::IBig`.
    #[must_use]
    pub fn as_inner(&self) -> &IBig {
        &self.0
    }

    /// Attempts to convert to an i64.
    ///
    /// Returns `None` if the value doesn't fit in an i64.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        self.0.clone().try_into().ok()
    }

    /// Computes self^exp for non-negative exp.
    #[must_use]
    pub fn pow(&self, exp: u32) -> Self {
        Self(self.0.pow(exp as usize))
    }

    /// Reduces this integer into `[0, p)`.
    ///
    /// # Panics
    ///
    /// Panics if `p` is zero.
    #[must_use]
    pub fn rem_u64(&self, p: u64) -> u64 {
        assert!(p != 0, "modulus cannot be zero");
        let r = &self.0 % IBig::from(p);
        let r = if DashuSigned::is_negative(&r) {
            r + IBig::from(p)
        } else {
            r
        };
        u64::try_from(r).expect("residue fits in u64")
    }

    /// Floor of the square root of a non-negative integer, by Newton
    /// iteration seeded from the bit length.
    ///
    /// # Panics
    ///
    /// Panics if the integer is negative.
    #[must_use]
    pub fn isqrt(&self) -> Self {
        assert!(!self.is_negative(), "isqrt of negative integer");
        if self.0 <= IBig::ONE {
            return self.clone();
        }

        let mut x = Self(IBig::ONE << (self.bit_len() / 2 + 1));
        loop {
            let y = Self((&x.0 + &self.0 / &x.0) >> 1usize);
            if y >= x {
                return x;
            }
            x = y;
        }
    }

    /// Combines `self mod m` with `r mod p` into the unique residue in
    /// `[0, m*p)`, for coprime `m` and `p`.
    ///
    /// The inverse of `m` modulo `p` is supplied by the caller so that a
    /// whole coefficient vector can be combined against one precomputed
    /// inverse; see [`crt_inverse`].
    #[must_use]
    pub fn crt(&self, m: &Integer, r: u64, p: u64, m_inv_p: u64) -> Self {
        let c_mod_p = self.rem_u64(p);
        // t = (r - c) * m^{-1} mod p
        let diff = if r >= c_mod_p {
            r - c_mod_p
        } else {
            p - (c_mod_p - r)
        };
        let t = ((diff as u128 * m_inv_p as u128) % p as u128) as u64;
        self + &(m * &Integer::from(t))
    }
}

/// Computes `m^{-1} mod p` for CRT combination.
///
/// # Panics
///
/// Panics if `m` and `p` are not coprime.
#[must_use]
pub fn crt_inverse(m: &Integer, p: u64) -> u64 {
    let m_mod_p = m.rem_u64(p);
    inv_mod_u64(m_mod_p, p).expect("CRT moduli must be coprime")
}

/// Modular inverse on u64 by the extended Euclidean algorithm.
///
/// Returns `None` if `a` and `p` are not coprime.
#[must_use]
pub fn inv_mod_u64(a: u64, p: u64) -> Option<u64> {
    if a == 0 {
        return None;
    }

    let mut t = 0i128;
    let mut new_t = 1i128;
    let mut r = p as i128;
    let mut new_r = a as i128;

    while new_r != 0 {
        let quotient = r / new_r;
        (t, new_t) = (new_t, t - quotient * new_t);
        (r, new_r) = (new_r, r - quotient * new_r);
    }

    if r > 1 {
        return None;
    }

    if t < 0 {
        t += p as i128;
    }
    Some(t as u64)
}

impl Zero for Integer {
    fn zero() -> Self {
        Self(IBig::ZERO)
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Integer {
    fn one() -> Self {
        Self(IBig::ONE)
    }

    fn is_one(&self) -> bool {
        self.0 == IBig::ONE
    }
}

impl fmt::Debug for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Integer({})", self.0)
    }
}

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Arithmetic operations
impl Add for Integer {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Add<&Integer> for Integer {
    type Output = Self;

    fn add(self, rhs: &Integer) -> Self::Output {
        Self(self.0 + &rhs.0)
    }
}

impl Add for &Integer {
    type Output = Integer;

    fn add(self, rhs: Self) -> Self::Output {
        Integer(&self.0 + &rhs.0)
    }
}

impl Sub for Integer {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sub<&Integer> for Integer {
    type Output = Self;

    fn sub(self, rhs: &Integer) -> Self::Output {
        Self(self.0 - &rhs.0)
    }
}

impl Sub for &Integer {
    type Output = Integer;

    fn sub(self, rhs: Self) -> Self::Output {
        Integer(&self.0 - &rhs.0)
    }
}

impl Mul for Integer {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl Mul<&Integer> for Integer {
    type Output = Self;

    fn mul(self, rhs: &Integer) -> Self::Output {
        Self(self.0 * &rhs.0)
    }
}

impl Mul for &Integer {
    type Output = Integer;

    fn mul(self, rhs: Self) -> Self::Output {
        Integer(&self.0 * &rhs.0)
    }
}

impl Div for Integer {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self(self.0 / rhs.0)
    }
}

impl Div for &Integer {
    type Output = Integer;

    fn div(self, rhs: Self) -> Self::Output {
        Integer(&self.0 / &rhs.0)
    }
}

impl Rem for Integer {
    type Output = Self;

    fn rem(self, rhs: Self) -> Self::Output {
        Self(self.0 % rhs.0)
    }
}

impl Rem for &Integer {
    type Output = Integer;

    fn rem(self, rhs: Self) -> Self::Output {
        Integer(&self.0 % &rhs.0)
    }
}

impl Neg for Integer {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Neg for &Integer {
    type Output = Integer;

    fn neg(self) -> Self::Output {
        Integer(-&self.0)
    }
}

impl From<i64> for Integer {
    fn from(value: i64) -> Self {
        Self::new(value)
    }
}

impl From<u64> for Integer {
    fn from(value: u64) -> Self {
        Self(IBig::from(value))
    }
}

impl From<IBig> for Integer {
    fn from(value: IBig) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_ops() {
        let a = Integer::new(10);
        let b = Integer::new(3);

        assert_eq!((a.clone() + b.clone()).to_i64(), Some(13));
        assert_eq!((a.clone() - b.clone()).to_i64(), Some(7));
        assert_eq!((a.clone() * b.clone()).to_i64(), Some(30));
        assert_eq!((a % b).to_i64(), Some(1));
    }

    #[test]
    fn test_rem_u64() {
        assert_eq!(Integer::new(17).rem_u64(5), 2);
        assert_eq!(Integer::new(-17).rem_u64(5), 3);
        assert_eq!(Integer::new(0).rem_u64(7), 0);
    }

    #[test]
    fn test_isqrt() {
        assert_eq!(Integer::new(0).isqrt().to_i64(), Some(0));
        assert_eq!(Integer::new(1).isqrt().to_i64(), Some(1));
        assert_eq!(Integer::new(15).isqrt().to_i64(), Some(3));
        assert_eq!(Integer::new(16).isqrt().to_i64(), Some(4));
        assert_eq!(Integer::new(999_999).isqrt().to_i64(), Some(999));
    }

    #[test]
    fn test_inv_mod() {
        assert_eq!(inv_mod_u64(3, 7), Some(5));
        assert_eq!(inv_mod_u64(0, 7), None);
        assert_eq!(inv_mod_u64(6, 9), None);

        let p = 2_147_483_647u64;
        let inv = inv_mod_u64(123_456_789, p).unwrap();
        assert_eq!((123_456_789u128 * inv as u128 % p as u128) as u64, 1);
    }

    #[test]
    fn test_crt_pair() {
        // x ≡ 2 (mod 7), x ≡ 3 (mod 11) → x = 58
        let m = Integer::new(7);
        let c = Integer::new(2);
        let inv = crt_inverse(&m, 11);
        let x = c.crt(&m, 3, 11, inv);
        assert_eq!(x.to_i64(), Some(58));
        assert_eq!(x.rem_u64(7), 2);
        assert_eq!(x.rem_u64(11), 3);
    }
}
