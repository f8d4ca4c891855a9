//! Row reduction of the Macaulay matrix.
//!
//! Lower rows are loaded one at a time into a dense accumulator and
//! eliminated against the known pivots, in ascending pivot column. A row
//! whose surviving lead has no pivot is normalized and promoted, so later
//! rows reduce against it too. All pivot rows are monic, so elimination is
//! one fused multiply-subtract per non-zero entry and never divides.
//!
//! Four modes share this kernel: basis reduction (promote), randomized
//! basis reduction (reduce random row combinations first), normal form
//! (never promote, export residues), and the Gröbner test (early exit on
//! the first non-zero residue).

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use quartus_arith::Arithmetic;
use quartus_monomial::Monomial;

use crate::basis::Basis;
use crate::matrix::MacaulayMatrix;
use crate::trace::TraceUseful;

/// A freshly produced pivot row.
pub struct NewRow<A: Arithmetic> {
    /// Column indices, ascending; the first is the new pivot.
    pub cols: Vec<u32>,
    /// Normalized coefficients, `coeffs[0] == 1`.
    pub coeffs: Vec<A::Elem>,
    /// Index into `matrix.lower` of the row that produced this pivot.
    pub lower_pos: usize,
}

/// Structure diverged from the recorded trace during apply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApplyDrift;

#[derive(Clone, Copy)]
enum PivotRef {
    Upper(usize),
    New(usize),
}

struct Reducer<'a, M, A: Arithmetic> {
    matrix: &'a MacaulayMatrix<M, A>,
    basis: &'a Basis<A>,
    arith: &'a A,
    pivots: Vec<Option<PivotRef>>,
    new_cols: Vec<Vec<u32>>,
    new_coeffs: Vec<Vec<A::Elem>>,
    new_from: Vec<usize>,
    acc: Vec<A::Acc>,
}

impl<'a, M: Monomial, A: Arithmetic> Reducer<'a, M, A> {
    fn new(matrix: &'a MacaulayMatrix<M, A>, basis: &'a Basis<A>, arith: &'a A) -> Self {
        let mut pivots = vec![None; matrix.ncols];
        for (r, row) in matrix.upper.iter().enumerate() {
            debug_assert!(pivots[row.support[0] as usize].is_none());
            pivots[row.support[0] as usize] = Some(PivotRef::Upper(r));
        }
        Self {
            matrix,
            basis,
            arith,
            pivots,
            new_cols: Vec::new(),
            new_coeffs: Vec::new(),
            new_from: Vec::new(),
            acc: vec![arith.acc_zero(); matrix.ncols],
        }
    }

    /// Lower-row processing order: ascending lead column, then position.
    fn lower_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.matrix.lower.len()).collect();
        order.sort_by_key(|&i| (self.matrix.lower[i].support[0], i));
        order
    }

    fn clear(&mut self) {
        for cell in &mut self.acc {
            *cell = self.arith.acc_zero();
        }
    }

    fn load_lower(&mut self, li: usize) {
        self.clear();
        let row = &self.matrix.lower[li];
        let coeffs = self.matrix.coeffs_of(self.basis, row);
        for (k, &c) in row.support.iter().enumerate() {
            self.acc[c as usize] = self.arith.acc_from(&coeffs[k]);
        }
    }

    /// Subtracts `lam` times the (monic) pivot row at column `c`.
    fn eliminate(&mut self, c: usize, lam: &A::Elem) {
        let p = self.pivots[c].expect("pivot present");
        self.acc[c] = self.arith.acc_zero();
        // Pivot row data is disjoint from the accumulator.
        let (cols, coeffs): (&[u32], &[A::Elem]) = match p {
            PivotRef::Upper(r) => {
                let row = &self.matrix.upper[r];
                (&row.support, self.matrix.coeffs_of(self.basis, row))
            }
            PivotRef::New(r) => (&self.new_cols[r], &self.new_coeffs[r]),
        };
        for k in 1..cols.len() {
            self.arith.acc_sub_mul(&mut self.acc[cols[k] as usize], lam, &coeffs[k]);
        }
    }

    /// Collects the non-zero accumulator entries from `from` on.
    fn extract(&self, from: usize) -> (Vec<u32>, Vec<A::Elem>) {
        let mut cols = Vec::new();
        let mut coeffs = Vec::new();
        for c in from..self.acc.len() {
            let v = self.arith.acc_reduce(&self.acc[c]);
            if !self.arith.is_zero(&v) {
                cols.push(c as u32);
                coeffs.push(v);
            }
        }
        (cols, coeffs)
    }

    /// Reduces the loaded row against known pivots; promotes the residue
    /// as a new monic pivot when one remains.
    fn reduce_and_promote(&mut self, start: usize, lower_pos: usize) {
        let mut c = start;
        while c < self.matrix.ncols {
            let v = self.arith.acc_reduce(&self.acc[c]);
            if self.arith.is_zero(&v) {
                c += 1;
                continue;
            }
            if self.pivots[c].is_some() {
                self.eliminate(c, &v);
                c += 1;
                continue;
            }

            let (cols, mut coeffs) = self.extract(c);
            let inv = self.arith.inv(&v);
            for x in &mut coeffs {
                *x = self.arith.mul(x, &inv);
            }
            self.pivots[c] = Some(PivotRef::New(self.new_cols.len()));
            self.new_cols.push(cols);
            self.new_coeffs.push(coeffs);
            self.new_from.push(lower_pos);
            return;
        }
    }

    /// Reduces the loaded row by pivots only, skipping `keep` (the row's
    /// own lead during interreduction). The residue stays in the
    /// accumulator for the caller to extract.
    fn reduce_no_promote(&mut self, start: usize, keep: Option<usize>) {
        let mut c = start;
        while c < self.matrix.ncols {
            if Some(c) == keep {
                c += 1;
                continue;
            }
            let v = self.arith.acc_reduce(&self.acc[c]);
            if self.arith.is_zero(&v) {
                c += 1;
                continue;
            }
            if self.pivots[c].is_some() {
                self.eliminate(c, &v);
            }
            c += 1;
        }
    }

    fn into_new_rows(self) -> Vec<NewRow<A>> {
        let mut out = Vec::with_capacity(self.new_cols.len());
        for ((cols, coeffs), lower_pos) in self
            .new_cols
            .into_iter()
            .zip(self.new_coeffs)
            .zip(self.new_from)
        {
            out.push(NewRow {
                cols,
                coeffs,
                lower_pos,
            });
        }
        out
    }
}

/// Deterministic Gauss-like reduction; returns the new pivot rows in
/// promotion order.
pub fn reduce_deterministic<M: Monomial, A: Arithmetic>(
    matrix: &MacaulayMatrix<M, A>,
    basis: &Basis<A>,
    arith: &A,
) -> Vec<NewRow<A>> {
    let mut red = Reducer::new(matrix, basis, arith);
    for li in red.lower_order() {
        let start = matrix.lower[li].support[0] as usize;
        red.load_lower(li);
        red.reduce_and_promote(start, li);
    }
    red.into_new_rows()
}

/// Randomized reduction: random combinations of small lower-row batches
/// are reduced first. A batch whose combinations yield one pivot per row
/// is fully covered and pays nothing more; only rank-deficient batches
/// top up their rows through the deterministic path, so the result spans
/// the same row space.
///
/// Callers downgrade to [`reduce_deterministic`] for characteristics
/// below 500, where random combinations collide too often.
pub fn reduce_randomized<M: Monomial, A: Arithmetic>(
    matrix: &MacaulayMatrix<M, A>,
    basis: &Basis<A>,
    arith: &A,
    seed: u64,
) -> Vec<NewRow<A>> {
    const BATCH: usize = 8;
    debug_assert!(arith.lanes() == 1, "randomized reduction is single-lane");
    debug_assert!(arith.characteristic() >= 500);

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let p = arith.characteristic();
    let mut red = Reducer::new(matrix, basis, arith);
    let order = red.lower_order();

    for batch in order.chunks(BATCH) {
        let pivots_before = red.new_cols.len();
        for _ in 0..batch.len() {
            red.clear();
            let mut start = usize::MAX;
            for &li in batch {
                let row = &matrix.lower[li];
                start = start.min(row.support[0] as usize);
                let lam = arith.neg(&arith.from_integer(&rng.gen_range(1..p).into()));
                let coeffs = matrix.coeffs_of(basis, row);
                for (k, &c) in row.support.iter().enumerate() {
                    arith.acc_sub_mul(&mut red.acc[c as usize], &lam, &coeffs[k]);
                }
            }
            red.reduce_and_promote(start, batch[0]);
        }

        // One pivot per batch row means the combinations span the whole
        // batch modulo the earlier pivots: every row now reduces to zero
        // and the per-row pass is skipped. A deficit means some
        // combinations collapsed, so the uncovered rank is topped up row
        // by row (already-covered rows drop out immediately).
        if red.new_cols.len() - pivots_before == batch.len() {
            continue;
        }
        for &li in batch {
            let start = matrix.lower[li].support[0] as usize;
            red.load_lower(li);
            red.reduce_and_promote(start, li);
        }
    }
    red.into_new_rows()
}

/// Normal-form reduction: residues of the lower rows against the upper
/// rows, `None` for rows in the ideal. Never promotes.
pub fn reduce_normal_form<M: Monomial, A: Arithmetic>(
    matrix: &MacaulayMatrix<M, A>,
    basis: &Basis<A>,
    arith: &A,
) -> Vec<Option<(Vec<u32>, Vec<A::Elem>)>> {
    let mut red = Reducer::new(matrix, basis, arith);
    let mut out = Vec::with_capacity(matrix.lower.len());
    for li in 0..matrix.lower.len() {
        let start = matrix.lower[li].support[0] as usize;
        red.load_lower(li);
        red.reduce_no_promote(start, None);
        let (cols, coeffs) = red.extract(start);
        out.push(if cols.is_empty() {
            None
        } else {
            Some((cols, coeffs))
        });
    }
    out
}

/// Interreduction: every lower row's tail is reduced against all pivots
/// while its own lead is kept. Residues come back in lower-row order.
pub fn reduce_interreduce<M: Monomial, A: Arithmetic>(
    matrix: &MacaulayMatrix<M, A>,
    basis: &Basis<A>,
    arith: &A,
) -> Vec<(Vec<u32>, Vec<A::Elem>)> {
    let mut red = Reducer::new(matrix, basis, arith);
    let mut out = Vec::with_capacity(matrix.lower.len());
    for li in 0..matrix.lower.len() {
        let lead = matrix.lower[li].support[0] as usize;
        red.load_lower(li);
        red.reduce_no_promote(lead, Some(lead));
        let (cols, coeffs) = red.extract(lead);
        debug_assert!(!cols.is_empty() && cols[0] as usize == lead);
        out.push((cols, coeffs));
    }
    out
}

/// Gröbner test: true iff every lower row reduces to zero.
pub fn reduce_is_groebner<M: Monomial, A: Arithmetic>(
    matrix: &MacaulayMatrix<M, A>,
    basis: &Basis<A>,
    arith: &A,
) -> bool {
    let mut red = Reducer::new(matrix, basis, arith);
    for li in 0..matrix.lower.len() {
        let start = matrix.lower[li].support[0] as usize;
        red.load_lower(li);
        let mut c = start;
        while c < matrix.ncols {
            let v = arith.acc_reduce(&red.acc[c]);
            if arith.is_zero(&v) {
                c += 1;
                continue;
            }
            if red.pivots[c].is_none() {
                return false;
            }
            red.eliminate(c, &v);
            c += 1;
        }
    }
    true
}

/// Replays the reduction against a recorded trace iteration. Promotions
/// must happen at the recorded rows with the recorded support sizes, and
/// every promoted lead must be invertible in every lane; anything else is
/// an unlucky specialization.
pub fn reduce_apply<M: Monomial, A: Arithmetic>(
    matrix: &MacaulayMatrix<M, A>,
    basis: &Basis<A>,
    arith: &A,
    expected: &[TraceUseful],
) -> Result<Vec<NewRow<A>>, ApplyDrift> {
    let mut red = Reducer::new(matrix, basis, arith);
    let mut next = 0usize;
    for li in red.lower_order() {
        let start = matrix.lower[li].support[0] as usize;
        red.load_lower(li);

        // Inline promotion with lane checks.
        let mut c = start;
        while c < matrix.ncols {
            let v = arith.acc_reduce(&red.acc[c]);
            if arith.is_zero(&v) {
                c += 1;
                continue;
            }
            if red.pivots[c].is_some() {
                red.eliminate(c, &v);
                c += 1;
                continue;
            }
            if !arith.is_invertible(&v) {
                return Err(ApplyDrift);
            }
            let (cols, mut coeffs) = red.extract(c);
            let record = expected.get(next).ok_or(ApplyDrift)?;
            if record.lower_pos != li || record.support_len != cols.len() {
                return Err(ApplyDrift);
            }
            next += 1;
            let inv = arith.inv(&v);
            for x in &mut coeffs {
                *x = arith.mul(x, &inv);
            }
            red.pivots[c] = Some(PivotRef::New(red.new_cols.len()));
            red.new_cols.push(cols);
            red.new_coeffs.push(coeffs);
            red.new_from.push(li);
            break;
        }
    }
    if next != expected.len() {
        return Err(ApplyDrift);
    }
    Ok(red.into_new_rows())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashtable::MonomialHashtable;
    use crate::matrix::{CoeffSource, MatrixRow};
    use quartus_arith::BarrettArithmetic;
    use quartus_monomial::{DivMap, MonomialOrder, PackedMonomial};

    type Matrix = MacaulayMatrix<PackedMonomial, BarrettArithmetic>;

    fn one() -> PackedMonomial {
        PackedMonomial::from_exponents(&[0]).unwrap()
    }

    /// Builds a matrix directly from dense rows for kernel tests; columns
    /// are already enumerated.
    fn matrix_from(upper: &[&[u64]], lower: &[&[u64]]) -> (Matrix, Basis<BarrettArithmetic>) {
        let ncols = upper
            .iter()
            .chain(lower)
            .map(|r| r.len())
            .max()
            .unwrap_or(0);
        let mut matrix = Matrix::new();
        matrix.ncols = ncols;
        for row in upper {
            let (support, coeffs) = sparsify(row);
            matrix.local_coeffs.push(coeffs);
            matrix.upper.push(MatrixRow {
                support,
                source: CoeffSource::Local(matrix.local_coeffs.len() - 1),
                mult: one(),
            });
        }
        for row in lower {
            let (support, coeffs) = sparsify(row);
            matrix.local_coeffs.push(coeffs);
            matrix.lower.push(MatrixRow {
                support,
                source: CoeffSource::Local(matrix.local_coeffs.len() - 1),
                mult: one(),
            });
        }
        (matrix, Basis::new())
    }

    fn sparsify(row: &[u64]) -> (Vec<u32>, Vec<u64>) {
        let support: Vec<u32> = (0..row.len() as u32).filter(|&c| row[c as usize] != 0).collect();
        let coeffs = support.iter().map(|&c| row[c as usize]).collect();
        (support, coeffs)
    }

    const P: u64 = 65_537;

    #[test]
    fn test_single_elimination() {
        // upper: x + 1 (cols 0, 2), lower: x + y (cols 0, 1)
        let (matrix, basis) = matrix_from(&[&[1, 0, 1]], &[&[1, 1, 0]]);
        let arith = BarrettArithmetic::new(P);
        let rows = reduce_deterministic(&matrix, &basis, &arith);

        // residue y - 1 promoted at column 1
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].cols, vec![1, 2]);
        assert_eq!(rows[0].coeffs, vec![1, P - 1]);
    }

    #[test]
    fn test_promoted_row_reduces_later_rows() {
        let (matrix, basis) = matrix_from(
            &[],
            &[
                &[1, 2, 0], // r0
                &[1, 0, 3], // r1: reduced by r0 to -2y + 3z
                &[0, 1, 1], // r2: reduced by the promotion chain
            ],
        );
        let arith = BarrettArithmetic::new(P);
        let rows = reduce_deterministic(&matrix, &basis, &arith);
        assert_eq!(rows.len(), 3);
        // Leads are distinct columns 0, 1, 2.
        let leads: Vec<u32> = rows.iter().map(|r| r.cols[0]).collect();
        assert_eq!(leads, vec![0, 1, 2]);
        // All monic.
        assert!(rows.iter().all(|r| r.coeffs[0] == 1));
    }

    #[test]
    fn test_dependent_row_drops() {
        let (matrix, basis) = matrix_from(&[], &[&[1, 1], &[2, 2]]);
        let arith = BarrettArithmetic::new(P);
        let rows = reduce_deterministic(&matrix, &basis, &arith);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_normal_form_keeps_irreducible_part() {
        // upper pivot at col 0; lower has entries at cols 0 and 2.
        let (matrix, basis) = matrix_from(&[&[1, 1, 0]], &[&[2, 0, 5]]);
        let arith = BarrettArithmetic::new(P);
        let out = reduce_normal_form(&matrix, &basis, &arith);
        assert_eq!(out.len(), 1);
        let (cols, coeffs) = out[0].clone().unwrap();
        // 2*(row0) eliminated: residue = -2 at col 1, 5 at col 2.
        assert_eq!(cols, vec![1, 2]);
        assert_eq!(coeffs, vec![P - 2, 5]);
    }

    #[test]
    fn test_normal_form_detects_membership() {
        let (matrix, basis) = matrix_from(&[&[1, 1, 0], &[0, 1, 2]], &[&[1, 0, P - 2]]);
        let arith = BarrettArithmetic::new(P);
        let out = reduce_normal_form(&matrix, &basis, &arith);
        assert!(out[0].is_none());
    }

    #[test]
    fn test_is_groebner_modes() {
        let arith = BarrettArithmetic::new(P);

        let (m1, b1) = matrix_from(&[&[1, 1, 0], &[0, 1, 2]], &[&[1, 0, P - 2]]);
        assert!(reduce_is_groebner(&m1, &b1, &arith));

        let (m2, b2) = matrix_from(&[&[1, 1, 0]], &[&[1, 0, 1]]);
        assert!(!reduce_is_groebner(&m2, &b2, &arith));
    }

    #[test]
    fn test_randomized_matches_deterministic_rank() {
        let rows: Vec<&[u64]> = vec![
            &[1, 2, 3, 0, 1],
            &[0, 1, 1, 1, 0],
            &[1, 0, 0, 2, 2],
            &[2, 4, 6, 0, 2], // dependent on row 0
            &[0, 0, 1, 1, 1],
        ];
        let (matrix, basis) = matrix_from(&[], &rows);
        let arith = BarrettArithmetic::new(P);

        let det = reduce_deterministic(&matrix, &basis, &arith);
        let rnd = reduce_randomized(&matrix, &basis, &arith, 17);
        let mut det_leads: Vec<u32> = det.iter().map(|r| r.cols[0]).collect();
        let mut rnd_leads: Vec<u32> = rnd.iter().map(|r| r.cols[0]).collect();
        det_leads.sort_unstable();
        rnd_leads.sort_unstable();
        assert_eq!(det_leads, rnd_leads);
    }

    #[test]
    fn test_interreduce_keeps_leads() {
        // Two rows with distinct leads; the first's tail overlaps the
        // second's lead.
        let (matrix, _b) = matrix_from(&[&[1, 1, 0], &[0, 1, 2]], &[&[1, 1, 0], &[0, 1, 2]]);
        let arith = BarrettArithmetic::new(P);
        let basis = Basis::new();
        let out = reduce_interreduce(&matrix, &basis, &arith);
        assert_eq!(out.len(), 2);
        // Row 0 lead stays at col 0, its tail entry at col 1 was
        // eliminated using row 1, introducing col 2.
        assert_eq!(out[0].0, vec![0, 2]);
        assert_eq!(out[1].0, vec![1, 2]);
    }
}
