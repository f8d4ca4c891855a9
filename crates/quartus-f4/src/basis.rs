//! Basis storage.
//!
//! Polynomials live as parallel vectors: a list of monomial identifiers
//! (leading term first) and a list of coefficients. Redundant entries are
//! kept but skipped; `standardize` compacts the survivors at the end.

use quartus_arith::Arithmetic;
use quartus_monomial::DivMask;

use crate::hashtable::{MonomId, MonomialHashtable};
use quartus_monomial::Monomial;

/// The evolving generating set.
pub struct Basis<A: Arithmetic> {
    /// Term monomials per polynomial, ordering-descending, lead first.
    pub monoms: Vec<Vec<MonomId>>,
    /// Parallel coefficient lists; `coeffs[i][0]` is the leading
    /// coefficient.
    pub coeffs: Vec<Vec<A::Elem>>,
    /// Redundancy marks, parallel to `monoms`.
    pub is_redundant: Vec<bool>,
    /// Indices of non-redundant polynomials, insertion order.
    pub nonredundant: Vec<usize>,
    /// Leading-term divmasks, parallel to `nonredundant` (copied out of
    /// the hashtable for locality in the divisor search).
    pub lead_divmasks: Vec<DivMask>,
    /// Number of polynomials already run through the pairset update.
    pub nprocessed: usize,
}

impl<A: Arithmetic> Basis<A> {
    /// Creates an empty basis.
    #[must_use]
    pub fn new() -> Self {
        Self {
            monoms: Vec::new(),
            coeffs: Vec::new(),
            is_redundant: Vec::new(),
            nonredundant: Vec::new(),
            lead_divmasks: Vec::new(),
            nprocessed: 0,
        }
    }

    /// Number of stored polynomials, redundant ones included.
    #[must_use]
    pub fn nfilled(&self) -> usize {
        self.monoms.len()
    }

    /// Number of non-redundant polynomials.
    #[must_use]
    pub fn nnonredundant(&self) -> usize {
        self.nonredundant.len()
    }

    /// Appends a polynomial. It stays outside the pairset until the next
    /// update pass.
    pub fn push_polynomial(&mut self, monoms: Vec<MonomId>, coeffs: Vec<A::Elem>) {
        debug_assert_eq!(monoms.len(), coeffs.len());
        debug_assert!(!monoms.is_empty());
        self.monoms.push(monoms);
        self.coeffs.push(coeffs);
        self.is_redundant.push(false);
    }

    /// Leading monomial identifier of polynomial `i`.
    #[must_use]
    pub fn lead(&self, i: usize) -> MonomId {
        self.monoms[i][0]
    }

    /// Declares every stored polynomial non-redundant, with divmasks
    /// pulled from the hashtable. Normal form and the Gröbner test start
    /// from a caller-supplied basis that skips the update pass.
    pub fn declare_all_nonredundant<M: Monomial>(&mut self, ht: &MonomialHashtable<M>) {
        self.nonredundant = (0..self.nfilled()).collect();
        self.lead_divmasks = self
            .nonredundant
            .iter()
            .map(|&i| ht.hashvalue(self.lead(i)).divmask)
            .collect();
        self.nprocessed = self.nfilled();
    }

    /// Scales every unprocessed polynomial to leading coefficient 1.
    pub fn make_monic(&mut self, arith: &A) {
        for i in self.nprocessed..self.coeffs.len() {
            let lead = self.coeffs[i][0].clone();
            if arith.is_one(&lead) {
                continue;
            }
            let inv = arith.inv(&lead);
            for c in &mut self.coeffs[i] {
                *c = arith.mul(c, &inv);
            }
        }
    }

    /// Releases the storage of redundant entries; indices stay valid.
    pub fn sweep_redundant(&mut self) {
        for i in 0..self.monoms.len() {
            if self.is_redundant[i] {
                self.monoms[i] = Vec::new();
                self.coeffs[i] = Vec::new();
            }
        }
    }

    /// Compacts the non-redundant polynomials into positions `0..k`,
    /// sorted ascending by leading monomial, monic, with divmasks synced
    /// to the hashtable.
    pub fn standardize<M: Monomial>(&mut self, ht: &MonomialHashtable<M>, arith: &A) {
        let mut order: Vec<usize> = self.nonredundant.clone();
        order.sort_by(|&a, &b| ht.cmp(self.lead(a), self.lead(b)));

        let mut monoms = Vec::with_capacity(order.len());
        let mut coeffs = Vec::with_capacity(order.len());
        for &i in &order {
            monoms.push(std::mem::take(&mut self.monoms[i]));
            coeffs.push(std::mem::take(&mut self.coeffs[i]));
        }

        self.monoms = monoms;
        self.coeffs = coeffs;
        self.is_redundant = vec![false; order.len()];
        self.nonredundant = (0..order.len()).collect();
        self.lead_divmasks = self
            .nonredundant
            .iter()
            .map(|&i| ht.hashvalue(self.lead(i)).divmask)
            .collect();
        self.nprocessed = order.len();
        self.make_monic_all(arith);
    }

    fn make_monic_all(&mut self, arith: &A) {
        for i in 0..self.coeffs.len() {
            let lead = self.coeffs[i][0].clone();
            if arith.is_one(&lead) {
                continue;
            }
            let inv = arith.inv(&lead);
            for c in &mut self.coeffs[i] {
                *c = arith.mul(c, &inv);
            }
        }
    }
}

impl<A: Arithmetic> Default for Basis<A> {
    fn default() -> Self {
        Self::new()
    }
}
