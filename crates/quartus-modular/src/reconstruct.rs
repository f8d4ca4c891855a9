//! Coefficient-wise CRT accumulation and rational reconstruction.

use num_traits::Zero;

use quartus_arith::{crt_inverse, rational_reconstruct, Integer, Rational};
use quartus_f4::ExchangePoly;

/// The monomial supports of a basis, the driver's shape template.
pub type Shape = Vec<Vec<Vec<u32>>>;

/// Extracts the shape of a computed basis.
#[must_use]
pub fn shape_of(basis: &[ExchangePoly<u64>]) -> Shape {
    basis.iter().map(|(monoms, _)| monoms.clone()).collect()
}

/// Coefficient-wise Chinese remainder state over a growing modulus.
pub struct CrtAccumulator {
    /// Fixed monomial supports; per-prime bases must match exactly.
    pub shape: Shape,
    /// Combined coefficients in `[0, modulo)`, parallel to `shape`.
    pub coeffs: Vec<Vec<Integer>>,
    /// Product of the absorbed primes.
    pub modulo: Integer,
    /// Primes absorbed so far, ascending.
    pub primes: Vec<u64>,
}

impl CrtAccumulator {
    /// Starts the accumulator from one reduced basis.
    #[must_use]
    pub fn new(prime: u64, basis: &[ExchangePoly<u64>]) -> Self {
        Self {
            shape: shape_of(basis),
            coeffs: basis
                .iter()
                .map(|(_, cs)| cs.iter().map(|&c| Integer::from(c)).collect())
                .collect(),
            modulo: Integer::from(prime),
            primes: vec![prime],
        }
    }

    /// Absorbs another prime's basis. The caller has already checked the
    /// shape against the template.
    ///
    /// # Panics
    ///
    /// Panics if the coefficient counts disagree with the template; shape
    /// checking is the caller's contract.
    pub fn absorb(&mut self, prime: u64, basis: &[ExchangePoly<u64>]) {
        debug_assert_eq!(shape_of(basis), self.shape);
        let inv = crt_inverse(&self.modulo, prime);
        for (row, (_, cs)) in self.coeffs.iter_mut().zip(basis) {
            assert_eq!(row.len(), cs.len(), "coefficient shape drift");
            for (acc, &c) in row.iter_mut().zip(cs) {
                *acc = acc.crt(&self.modulo, c, prime, inv);
            }
        }
        self.modulo = self.modulo.clone() * Integer::from(prime);
        self.primes.push(prime);
    }

    /// Deterministic small subset of coefficient positions used to probe
    /// whether reconstruction can succeed before paying for all of it.
    /// Leading coefficients are 1 and are skipped.
    fn probe_positions(&self) -> Vec<(usize, usize)> {
        let mut positions = Vec::new();
        for (i, row) in self.coeffs.iter().enumerate() {
            if row.len() < 2 {
                continue;
            }
            positions.push((i, 1));
            if row.len() > 2 {
                positions.push((i, row.len() / 2));
                positions.push((i, row.len() - 1));
            }
        }
        positions.dedup();
        positions
    }

    /// Attempts reconstruction on the probe subset only.
    #[must_use]
    pub fn reconstruct_partial(&self) -> bool {
        self.probe_positions()
            .into_iter()
            .all(|(i, j)| rational_reconstruct(&self.coeffs[i][j], &self.modulo).is_some())
    }

    /// Full reconstruction of the candidate basis over ℚ.
    #[must_use]
    pub fn reconstruct_full(&self) -> Option<Vec<ExchangePoly<Rational>>> {
        let mut out = Vec::with_capacity(self.shape.len());
        for (monoms, row) in self.shape.iter().zip(&self.coeffs) {
            let mut coeffs = Vec::with_capacity(row.len());
            for c in row {
                coeffs.push(rational_reconstruct(c, &self.modulo)?);
            }
            out.push((monoms.clone(), coeffs));
        }
        Some(out)
    }

    /// Bit-size heuristic: every reconstructed coefficient must leave
    /// slack under the modulus, otherwise the answer is still drifting
    /// and more primes are needed.
    #[must_use]
    pub fn heuristic_accepts(&self, candidate: &[ExchangePoly<Rational>]) -> bool {
        let modulus_bits = self.modulo.bit_len();
        candidate.iter().all(|(_, coeffs)| {
            coeffs.iter().all(|q| {
                let n = q.numerator();
                let d = q.denominator();
                let bits = if n.is_zero() { 1 } else { n.bit_len() } + d.bit_len();
                bits + 10 <= modulus_bits
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basis_mod(coeffs: &[u64]) -> Vec<ExchangePoly<u64>> {
        vec![(vec![vec![1], vec![0]], coeffs.to_vec())]
    }

    #[test]
    fn test_absorb_and_reconstruct() {
        // The rational 1/3 modulo two primes.
        let (p1, p2) = (1_000_003u64, 1_000_033u64);
        let r1 = Rational::from_i64(1, 3).rem_u64(p1).unwrap();
        let r2 = Rational::from_i64(1, 3).rem_u64(p2).unwrap();

        let mut acc = CrtAccumulator::new(p1, &basis_mod(&[1, r1]));
        acc.absorb(p2, &basis_mod(&[1, r2]));

        assert!(acc.reconstruct_partial());
        let full = acc.reconstruct_full().unwrap();
        assert_eq!(full[0].1[1], Rational::from_i64(1, 3));
    }

    #[test]
    fn test_partial_fails_with_single_small_prime() {
        // 1/3 mod 17 = 6; sqrt(17/2) < 3 leaves no room for 1/3.
        let acc = CrtAccumulator::new(17, &basis_mod(&[1, 6]));
        assert!(!acc.reconstruct_partial());
    }

    #[test]
    fn test_heuristic_needs_slack() {
        let (p1, p2) = (1_000_003u64, 1_000_033u64);
        let q = Rational::from_i64(1, 3);
        let mut acc = CrtAccumulator::new(p1, &basis_mod(&[1, q.rem_u64(p1).unwrap()]));
        acc.absorb(p2, &basis_mod(&[1, q.rem_u64(p2).unwrap()]));

        let small = vec![(vec![vec![1], vec![0]], vec![Rational::from_i64(1, 1), q])];
        assert!(acc.heuristic_accepts(&small));

        let huge = vec![(
            vec![vec![1], vec![0]],
            vec![
                Rational::from_i64(1, 1),
                Rational::new(Integer::new(1), Integer::new(i64::MAX))
                    * Rational::new(Integer::new(1), Integer::new(i64::MAX)),
            ],
        )];
        assert!(!acc.heuristic_accepts(&huge));
    }
}
