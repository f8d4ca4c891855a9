//! Monomial orderings.
//!
//! The choice of monomial ordering determines leading terms and therefore
//! the shape of the computed Gröbner basis.

use std::cmp::Ordering;

/// A monomial ordering.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum MonomialOrder {
    /// Lexicographic order.
    ///
    /// The first nonzero difference of exponent vectors decides.
    Lex,

    /// Graded lexicographic order.
    ///
    /// Compares total degree first, then lex as tiebreaker.
    DegLex,

    /// Graded reverse lexicographic order.
    ///
    /// Compares total degree first; on a tie the largest variable index
    /// with differing exponents decides, with the smaller exponent winning.
    #[default]
    DegRevLex,

    /// Weight order: graded by the inner product with a weight vector,
    /// with lex as tiebreaker. One weight per variable.
    Weighted(Vec<u64>),
}

impl MonomialOrder {
    /// Compares two exponent slices according to this ordering.
    ///
    /// # Panics
    ///
    /// Panics if the slices have different lengths, or if a weighted
    /// ordering carries the wrong number of weights.
    #[must_use]
    pub fn compare_slices(&self, a: &[u32], b: &[u32]) -> Ordering {
        assert_eq!(a.len(), b.len(), "exponent arity mismatch");
        match self {
            MonomialOrder::Lex => cmp_lex(a, b),
            MonomialOrder::DegLex => cmp_deglex(a, b),
            MonomialOrder::DegRevLex => cmp_degrevlex(a, b),
            MonomialOrder::Weighted(w) => {
                assert_eq!(w.len(), a.len(), "weight arity mismatch");
                cmp_weighted(a, b, w)
            }
        }
    }

    /// Returns true if the ordering refines total degree (possibly with
    /// weights): any two monomials of different grade compare by grade.
    #[must_use]
    pub fn is_graded(&self) -> bool {
        !matches!(self, MonomialOrder::Lex)
    }

    /// Returns a short name for the ordering.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            MonomialOrder::Lex => "lex",
            MonomialOrder::DegLex => "deglex",
            MonomialOrder::DegRevLex => "degrevlex",
            MonomialOrder::Weighted(_) => "weighted",
        }
    }
}

impl std::fmt::Display for MonomialOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Lexicographic comparison of exponent slices.
#[must_use]
pub fn cmp_lex(a: &[u32], b: &[u32]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        match x.cmp(y) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// Graded lexicographic comparison.
#[must_use]
pub fn cmp_deglex(a: &[u32], b: &[u32]) -> Ordering {
    let da: u64 = a.iter().map(|&e| e as u64).sum();
    let db: u64 = b.iter().map(|&e| e as u64).sum();
    da.cmp(&db).then_with(|| cmp_lex(a, b))
}

/// Graded reverse lexicographic comparison.
#[must_use]
pub fn cmp_degrevlex(a: &[u32], b: &[u32]) -> Ordering {
    let da: u64 = a.iter().map(|&e| e as u64).sum();
    let db: u64 = b.iter().map(|&e| e as u64).sum();
    match da.cmp(&db) {
        Ordering::Equal => {}
        ord => return ord,
    }

    for (x, y) in a.iter().zip(b).rev() {
        match y.cmp(x) {
            Ordering::Equal => continue,
            ord => return ord,
        }
    }
    Ordering::Equal
}

/// Weighted comparison: grade by the weight vector, then lex.
#[must_use]
pub fn cmp_weighted(a: &[u32], b: &[u32], w: &[u64]) -> Ordering {
    let ga: u128 = a.iter().zip(w).map(|(&e, &wi)| e as u128 * wi as u128).sum();
    let gb: u128 = b.iter().zip(w).map(|(&e, &wi)| e as u128 * wi as u128).sum();
    ga.cmp(&gb).then_with(|| cmp_lex(a, b))
}
