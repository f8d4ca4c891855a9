//! The Macaulay matrix.
//!
//! Rows are sparse: a support of column indices plus a reference to a
//! coefficient list, either a basis polynomial (monomial multiples share
//! the source coefficients unchanged) or a matrix-local store for normal
//! form inputs. The *upper* half holds reducer rows whose pivot column is
//! known; the *lower* half holds the rows to be reduced.
//!
//! Supports are built as secondary-hashtable identifiers and remapped in
//! place to column indices once the column order is fixed.

use quartus_arith::Arithmetic;
use quartus_monomial::Monomial;

use crate::basis::Basis;
use crate::error::EngineError;
use crate::hashtable::{ColumnFlag, MonomId, MonomialHashtable};

/// Where a row's coefficients live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoeffSource {
    /// Coefficient list of a basis polynomial.
    Basis(usize),
    /// Matrix-local coefficient list.
    Local(usize),
}

/// One sparse row.
#[derive(Clone, Debug)]
pub struct MatrixRow<M> {
    /// Monomial identifiers before column conversion, column indices
    /// after; strictly descending in the monomial ordering either way.
    pub support: Vec<u32>,
    /// Coefficient source.
    pub source: CoeffSource,
    /// The monomial this row's source polynomial was multiplied by.
    pub mult: M,
}

/// The per-iteration matrix.
pub struct MacaulayMatrix<M, A: Arithmetic> {
    /// Reducer rows; the first support entry is the pivot column.
    pub upper: Vec<MatrixRow<M>>,
    /// Rows to be reduced.
    pub lower: Vec<MatrixRow<M>>,
    /// Coefficient lists for [`CoeffSource::Local`] rows.
    pub local_coeffs: Vec<Vec<A::Elem>>,
    /// Number of columns after conversion.
    pub ncols: usize,
    /// Column index → secondary-hashtable identifier.
    pub col_to_monom: Vec<MonomId>,
}

impl<M: Monomial, A: Arithmetic> MacaulayMatrix<M, A> {
    /// Creates an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            upper: Vec::new(),
            lower: Vec::new(),
            local_coeffs: Vec::new(),
            ncols: 0,
            col_to_monom: Vec::new(),
        }
    }

    /// Resolves a row's coefficient list.
    #[must_use]
    pub fn coeffs_of<'a>(&'a self, basis: &'a Basis<A>, row: &MatrixRow<M>) -> &'a [A::Elem] {
        match row.source {
            CoeffSource::Basis(i) => &basis.coeffs[i],
            CoeffSource::Local(i) => &self.local_coeffs[i],
        }
    }
}

impl<M: Monomial, A: Arithmetic> Default for MacaulayMatrix<M, A> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the support of `mult · basis[g]` in the secondary table.
///
/// Product hashes are sums of stored hashes, so no weight product is
/// recomputed. The support inherits the source polynomial's descending
/// term order because multiplication by a monomial is order-preserving.
pub fn multiplied_support<M: Monomial, A: Arithmetic>(
    g: usize,
    mult: &M,
    mult_hash: u64,
    basis: &Basis<A>,
    ht: &MonomialHashtable<M>,
    symbol_ht: &mut MonomialHashtable<M>,
) -> Result<Vec<u32>, EngineError> {
    let terms = &basis.monoms[g];
    symbol_ht.ensure_capacity(terms.len());

    let mut support = Vec::with_capacity(terms.len());
    for &t in terms {
        let prod = ht.monom(t).checked_mul(mult)?;
        let hash = ht.hashvalue(t).hash.wrapping_add(mult_hash);
        support.push(symbol_ht.insert_with_hash(prod, hash));
    }
    Ok(support)
}

/// Appends the row `mult · basis[g]`, where `mult = target / lm(g)` for an
/// interned `target` in the primary table. Upper rows register their lead
/// as a known pivot column.
pub fn push_multiple_of<M: Monomial, A: Arithmetic>(
    matrix: &mut MacaulayMatrix<M, A>,
    upper: bool,
    g: usize,
    target: MonomId,
    basis: &Basis<A>,
    ht: &MonomialHashtable<M>,
    symbol_ht: &mut MonomialHashtable<M>,
) -> Result<(), EngineError> {
    let lead = basis.lead(g);
    let mult = ht.monom(target).div_exact(ht.monom(lead));
    let mult_hash = ht
        .hashvalue(target)
        .hash
        .wrapping_sub(ht.hashvalue(lead).hash);

    let support = multiplied_support(g, &mult, mult_hash, basis, ht, symbol_ht)?;
    if upper {
        symbol_ht.set_flag(support[0], ColumnFlag::Pivot);
    }

    let row = MatrixRow {
        support,
        source: CoeffSource::Basis(g),
        mult,
    };
    if upper {
        matrix.upper.push(row);
    } else {
        matrix.lower.push(row);
    }
    Ok(())
}

/// Fixes the column order: all secondary-table identifiers sorted
/// descending under the monomial ordering, then every support remapped
/// from identifiers to column indices.
pub fn convert_to_columns<M: Monomial, A: Arithmetic>(
    matrix: &mut MacaulayMatrix<M, A>,
    symbol_ht: &MonomialHashtable<M>,
) {
    let mut ids: Vec<MonomId> = (1..symbol_ht.len() as MonomId).collect();
    ids.sort_by(|&a, &b| symbol_ht.cmp(b, a));
    apply_column_order(matrix, ids);
}

/// Remaps supports under a fixed descending column order.
pub fn apply_column_order<M: Monomial, A: Arithmetic>(
    matrix: &mut MacaulayMatrix<M, A>,
    ids: Vec<MonomId>,
) {
    let total = ids.len() + 1;
    let mut col_of = vec![0u32; total];
    for (col, &id) in ids.iter().enumerate() {
        col_of[id as usize] = col as u32;
    }

    for row in matrix.upper.iter_mut().chain(matrix.lower.iter_mut()) {
        for entry in &mut row.support {
            *entry = col_of[*entry as usize];
        }
        debug_assert!(row.support.windows(2).all(|w| w[0] < w[1]));
    }

    matrix.ncols = ids.len();
    matrix.col_to_monom = ids;
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_arith::BarrettArithmetic;
    use quartus_monomial::{DivMap, MonomialOrder, PackedMonomial};

    type Matrix = MacaulayMatrix<PackedMonomial, BarrettArithmetic>;

    fn setup() -> (MonomialHashtable<PackedMonomial>, Basis<BarrettArithmetic>) {
        let divmap = DivMap::new(2, &[(0, 4), (0, 4)]);
        let mut ht = MonomialHashtable::new(2, MonomialOrder::DegRevLex, divmap, 7);

        let mut basis = Basis::new();
        // x^2 + y
        let ids = vec![
            ht.insert(PackedMonomial::from_exponents(&[2, 0]).unwrap()),
            ht.insert(PackedMonomial::from_exponents(&[0, 1]).unwrap()),
        ];
        basis.push_polynomial(ids, vec![1, 1]);
        (ht, basis)
    }

    #[test]
    fn test_multiplied_row_support() {
        let (mut ht, basis) = setup();
        let mut symbol_ht = ht.secondary();
        let mut matrix = Matrix::new();

        // target = x^2 * y: multiply the basis polynomial by y.
        let target = ht.insert(PackedMonomial::from_exponents(&[2, 1]).unwrap());
        push_multiple_of(&mut matrix, true, 0, target, &basis, &ht, &mut symbol_ht).unwrap();

        assert_eq!(matrix.upper.len(), 1);
        let row = &matrix.upper[0];
        assert_eq!(row.support.len(), 2);
        assert_eq!(symbol_ht.monom(row.support[0]).exponents(), vec![2, 1]);
        assert_eq!(symbol_ht.monom(row.support[1]).exponents(), vec![0, 2]);
        assert_eq!(symbol_ht.hashvalue(row.support[0]).flag, ColumnFlag::Pivot);
    }

    #[test]
    fn test_column_conversion_is_descending() {
        let (mut ht, basis) = setup();
        let mut symbol_ht = ht.secondary();
        let mut matrix = Matrix::new();

        let t1 = ht.insert(PackedMonomial::from_exponents(&[2, 1]).unwrap());
        let t2 = ht.insert(PackedMonomial::from_exponents(&[2, 0]).unwrap());
        push_multiple_of(&mut matrix, true, 0, t1, &basis, &ht, &mut symbol_ht).unwrap();
        push_multiple_of(&mut matrix, false, 0, t2, &basis, &ht, &mut symbol_ht).unwrap();

        convert_to_columns(&mut matrix, &symbol_ht);

        assert_eq!(matrix.ncols, 4); // x^2y, y^2, x^2, y
        // Upper row lead is its smallest column index.
        assert_eq!(matrix.upper[0].support[0], 0);
        // Every support is strictly increasing after conversion.
        for row in matrix.upper.iter().chain(&matrix.lower) {
            assert!(row.support.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
