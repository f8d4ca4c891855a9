//! Arbitrary precision rational numbers and rational reconstruction.

use dashu::base::{Abs, Inverse, Signed as DashuSigned, UnsignedAbs};
use dashu::rational::RBig;
use num_traits::{One, Zero};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use crate::Integer;

/// An arbitrary precision rational number.
///
/// Rationals are always stored in lowest terms with a positive denominator.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Rational(RBig);

impl Rational {
    /// Creates a new rational from numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    #[must_use]
    pub fn new(numerator: Integer, denominator: Integer) -> Self {
        assert!(!denominator.is_zero(), "denominator cannot be zero");
        let negate = denominator.is_negative();
        let q = Self(RBig::from_parts(
            numerator.into_inner(),
            denominator.into_inner().unsigned_abs(),
        ));
        if negate {
            -q
        } else {
            q
        }
    }

    /// Creates a rational from an integer (denominator = 1).
    #[must_use]
    pub fn from_integer(n: Integer) -> Self {
        Self(RBig::from(n.into_inner()))
    }

    /// Creates a rational from i64 numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if the denominator is zero.
    #[must_use]
    pub fn from_i64(numerator: i64, denominator: i64) -> Self {
        Self::new(Integer::new(numerator), Integer::new(denominator))
    }

    /// Returns the numerator.
    #[must_use]
    pub fn numerator(&self) -> Integer {
        Integer::from(self.0.numerator().clone())
    }

    /// Returns the denominator (always positive).
    #[must_use]
    pub fn denominator(&self) -> Integer {
        Integer::from(dashu::integer::IBig::from(self.0.denominator().clone()))
    }

    /// Returns true if this rational is an integer.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.0.denominator().is_one()
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.clone().abs())
    }

    /// Returns the reciprocal (1/x).
    ///
    /// # Panics
    ///
    /// Panics if the rational is zero.
    #[must_use]
    pub fn recip(&self) -> Self {
        assert!(!self.is_zero(), "cannot take reciprocal of zero");
        Self(self.0.clone().inv())
    }

    /// Returns true if negative.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        DashuSigned::is_negative(&self.0)
    }

    /// Reduces this rational modulo `p`: `numer * denom^{-1} mod p`.
    ///
    /// Returns `None` if the denominator vanishes modulo `p`.
    #[must_use]
    pub fn rem_u64(&self, p: u64) -> Option<u64> {
        let n = self.numerator().rem_u64(p);
        let d = self.denominator().rem_u64(p);
        let d_inv = crate::integer::inv_mod_u64(d, p)?;
        Some(((n as u128 * d_inv as u128) % p as u128) as u64)
    }
}

/// Reconstructs a rational `n/d` from its residue `a` modulo `m`.
///
/// Finds `(n, d)` with `n ≡ a·d (mod m)`, `|n| ≤ sqrt(m/2)` and
/// `0 < d ≤ sqrt(m/2)` by the bounded extended Euclidean iteration.
/// Returns `None` when no such pair exists, which the multi-modular
/// driver treats as "gather more primes".
#[must_use]
pub fn rational_reconstruct(a: &Integer, m: &Integer) -> Option<Rational> {
    assert!(m.signum() > 0, "modulus must be positive");
    let mut a = a % m;
    if a.is_negative() {
        a = &a + m;
    }
    if a.is_zero() {
        return Some(Rational::from_integer(Integer::zero()));
    }

    let bound = (m / &Integer::new(2)).isqrt();

    let mut r0 = m.clone();
    let mut r1 = a;
    let mut t0 = Integer::zero();
    let mut t1 = Integer::one();

    while r1 > bound {
        let q = &r0 / &r1;
        let r2 = &r0 - &(&q * &r1);
        let t2 = &t0 - &(&q * &t1);
        r0 = r1;
        r1 = r2;
        t0 = t1;
        t1 = t2;
    }

    if t1.is_zero() || t1.abs() > bound {
        return None;
    }

    let (mut n, mut d) = (r1, t1);
    if d.is_negative() {
        n = -n;
        d = -d;
    }

    if !n.gcd(&d).is_one() {
        return None;
    }

    Some(Rational::new(n, d))
}

impl Zero for Rational {
    fn zero() -> Self {
        Self(RBig::ZERO)
    }

    fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl One for Rational {
    fn one() -> Self {
        Self(RBig::ONE)
    }

    fn is_one(&self) -> bool {
        self.0 == RBig::ONE
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({})", self.0)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Add for Rational {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Add for &Rational {
    type Output = Rational;

    fn add(self, rhs: Self) -> Self::Output {
        Rational(&self.0 + &rhs.0)
    }
}

impl Sub for Rational {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sub for &Rational {
    type Output = Rational;

    fn sub(self, rhs: Self) -> Self::Output {
        Rational(&self.0 - &rhs.0)
    }
}

impl Mul for Rational {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0 * rhs.0)
    }
}

impl Mul for &Rational {
    type Output = Rational;

    fn mul(self, rhs: Self) -> Self::Output {
        Rational(&self.0 * &rhs.0)
    }
}

impl Div for Rational {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        Self(self.0 / rhs.0)
    }
}

impl Div for &Rational {
    type Output = Rational;

    fn div(self, rhs: Self) -> Self::Output {
        Rational(&self.0 / &rhs.0)
    }
}

impl Neg for Rational {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;

    fn neg(self) -> Self::Output {
        Rational(-&self.0)
    }
}

impl From<i64> for Rational {
    fn from(value: i64) -> Self {
        Self::from_integer(Integer::new(value))
    }
}
