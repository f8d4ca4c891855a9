//! Symbolic preprocessing.
//!
//! Walks the secondary hashtable in insertion order. Every monomial whose
//! column status is still unknown is searched against the non-redundant
//! basis, divmask first; the first hit (lowest basis index) contributes an
//! upper reducer row whose own terms extend the walk. Monomials without a
//! divisor stay unknown and become non-pivot columns after linear algebra.

use quartus_arith::Arithmetic;
use quartus_monomial::Monomial;

use crate::basis::Basis;
use crate::error::EngineError;
use crate::hashtable::{ColumnFlag, MonomId, MonomialHashtable};
use crate::matrix::{multiplied_support, CoeffSource, MacaulayMatrix, MatrixRow};

/// Finds the lowest-indexed non-redundant polynomial whose leading
/// monomial divides `id`, filtered through the divmasks.
pub fn find_reducer<M: Monomial, A: Arithmetic>(
    basis: &Basis<A>,
    ht: &MonomialHashtable<M>,
    symbol_ht: &MonomialHashtable<M>,
    id: MonomId,
) -> Option<usize> {
    let mask = symbol_ht.hashvalue(id).divmask;
    let monom = symbol_ht.monom(id);
    for (k, &j) in basis.nonredundant.iter().enumerate() {
        if basis.lead_divmasks[k].may_divide(mask)
            && monom.is_divisible_by(ht.monom(basis.lead(j)))
        {
            return Some(j);
        }
    }
    None
}

/// Completes the matrix with reducer rows for every reducible monomial.
pub fn symbolic_preprocess<M: Monomial, A: Arithmetic>(
    basis: &Basis<A>,
    ht: &MonomialHashtable<M>,
    symbol_ht: &mut MonomialHashtable<M>,
    matrix: &mut MacaulayMatrix<M, A>,
) -> Result<(), EngineError> {
    let mut id: MonomId = 1;
    while (id as usize) < symbol_ht.len() {
        if symbol_ht.hashvalue(id).flag != ColumnFlag::UnknownPivot {
            id += 1;
            continue;
        }

        let Some(g) = find_reducer(basis, ht, symbol_ht, id) else {
            id += 1;
            continue;
        };

        let lead = basis.lead(g);
        let mult = symbol_ht.monom(id).div_exact(ht.monom(lead));
        let mult_hash = symbol_ht
            .hashvalue(id)
            .hash
            .wrapping_sub(ht.hashvalue(lead).hash);

        let support = multiplied_support(g, &mult, mult_hash, basis, ht, symbol_ht)?;
        debug_assert_eq!(support[0], id);
        symbol_ht.set_flag(id, ColumnFlag::Pivot);
        matrix.upper.push(MatrixRow {
            support,
            source: CoeffSource::Basis(g),
            mult,
        });

        id += 1;
    }
    Ok(())
}
