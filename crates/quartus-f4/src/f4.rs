//! The F4 main loop and its entry points.
//!
//! One iteration: select the minimum-degree pair block, build the lower
//! rows, complete the upper rows by symbolic preprocessing, enumerate
//! columns, reduce, feed the new rows back into the basis and pairset.
//! Postprocessing optionally sweeps and autoreduces, then standardizes.

use rustc_hash::FxHashMap;

use quartus_arith::Arithmetic;
use quartus_monomial::{DivMap, Monomial, MonomialOrder};

use crate::basis::Basis;
use crate::error::EngineError;
use crate::hashtable::{MonomId, MonomialHashtable};
use crate::linalg::{
    reduce_apply, reduce_deterministic, reduce_interreduce, reduce_is_groebner,
    reduce_normal_form, reduce_randomized, NewRow,
};
use crate::matrix::{
    apply_column_order, convert_to_columns, multiplied_support, push_multiple_of, CoeffSource,
    MacaulayMatrix, MatrixRow,
};
use crate::params::{AlgorithmParams, LinalgBackend, SelectionStrategy, MAX_ITERATIONS};
use crate::pairset::Pairset;
use crate::select::{block_to_rows, select_critical_pairs};
use crate::symbolic::symbolic_preprocess;
use crate::trace::{Trace, TraceIteration, TraceRow, TraceUseful};
use crate::update::update;

/// A polynomial in the exchange form used at the engine boundary:
/// exponent vectors and parallel coefficients.
pub type ExchangePoly<C> = (Vec<Vec<u32>>, Vec<C>);

/// Interns the input and fills a basis.
///
/// Terms are sorted descending under the ordering and polynomials are
/// sorted ascending by leading monomial; the polynomial permutation is
/// returned (and recorded in traces) so callers can relate output to
/// input.
pub fn initialize<M: Monomial, A: Arithmetic>(
    nvars: usize,
    ordering: MonomialOrder,
    seed: u64,
    input: &[ExchangePoly<A::Elem>],
) -> Result<(MonomialHashtable<M>, Basis<A>, Vec<usize>), EngineError> {
    let mut ranges = vec![(u32::MAX, 0u32); nvars];
    for (monoms, _) in input {
        for exps in monoms {
            for v in 0..nvars {
                ranges[v].0 = ranges[v].0.min(exps[v]);
                ranges[v].1 = ranges[v].1.max(exps[v]);
            }
        }
    }
    for r in &mut ranges {
        if r.0 == u32::MAX {
            *r = (0, 0);
        }
    }

    let divmap = DivMap::new(nvars, &ranges);
    let mut ht = MonomialHashtable::new(nvars, ordering, divmap, seed);

    let mut polys: Vec<(Vec<MonomId>, Vec<A::Elem>)> = Vec::with_capacity(input.len());
    for (monoms, coeffs) in input {
        let mut ids = Vec::with_capacity(monoms.len());
        for exps in monoms {
            ids.push(ht.insert(M::from_exponents(exps)?));
        }

        let mut order: Vec<usize> = (0..ids.len()).collect();
        order.sort_by(|&a, &b| ht.cmp(ids[b], ids[a]));
        let ids: Vec<MonomId> = order.iter().map(|&k| ids[k]).collect();
        let coeffs: Vec<A::Elem> = order.iter().map(|&k| coeffs[k].clone()).collect();
        polys.push((ids, coeffs));
    }

    let mut perm: Vec<usize> = (0..polys.len()).collect();
    perm.sort_by(|&a, &b| ht.cmp(polys[a].0[0], polys[b].0[0]));

    let mut basis = Basis::new();
    for &k in &perm {
        let (ids, coeffs) = std::mem::take(&mut polys[k]);
        basis.push_polynomial(ids, coeffs);
    }
    Ok((ht, basis, perm))
}

/// Exports the basis back into exchange form.
#[must_use]
pub fn export_basis<M: Monomial, A: Arithmetic>(
    basis: &Basis<A>,
    ht: &MonomialHashtable<M>,
) -> Vec<ExchangePoly<A::Elem>> {
    (0..basis.nfilled())
        .map(|i| {
            let monoms = basis.monoms[i]
                .iter()
                .map(|&id| ht.monom(id).exponents())
                .collect();
            (monoms, basis.coeffs[i].clone())
        })
        .collect()
}

fn resolve_backend<A: Arithmetic>(params: &AlgorithmParams, arith: &A, learning: bool) -> LinalgBackend {
    match params.linalg {
        // Learning needs the deterministic row bookkeeping; small
        // characteristics make random combinations collide too often.
        LinalgBackend::Randomized if learning || arith.characteristic() < 500 || arith.lanes() > 1 => {
            LinalgBackend::Deterministic
        }
        backend => backend,
    }
}

fn check_cancelled(params: &AlgorithmParams) -> Result<(), EngineError> {
    if let Some(flag) = &params.cancel {
        if flag.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(EngineError::Cancelled);
        }
    }
    Ok(())
}

/// Converts new pivot rows into basis polynomials, re-interning their
/// monomials into the primary table.
fn insert_new_rows<M: Monomial, A: Arithmetic>(
    basis: &mut Basis<A>,
    ht: &mut MonomialHashtable<M>,
    symbol_ht: &MonomialHashtable<M>,
    matrix: &MacaulayMatrix<M, A>,
    new_rows: Vec<NewRow<A>>,
) {
    for row in new_rows {
        let mut monoms = Vec::with_capacity(row.cols.len());
        for &c in &row.cols {
            let sid = matrix.col_to_monom[c as usize];
            let hash = symbol_ht.hashvalue(sid).hash;
            monoms.push(ht.insert_with_hash(symbol_ht.monom(sid).clone(), hash));
        }
        basis.push_polynomial(monoms, row.coeffs);
    }
}

fn record_iteration<M: Monomial, A: Arithmetic>(
    matrix: &MacaulayMatrix<M, A>,
    symbol_ht: &MonomialHashtable<M>,
    new_rows: &[NewRow<A>],
) -> TraceIteration<M> {
    let row_of = |row: &MatrixRow<M>| -> TraceRow<M> {
        let CoeffSource::Basis(basis_index) = row.source else {
            unreachable!("basis runs only build rows from basis polynomials")
        };
        TraceRow {
            basis_index,
            mult: row.mult.clone(),
        }
    };

    let empty = new_rows.is_empty();
    TraceIteration {
        empty,
        nup: matrix.upper.len(),
        nlow: matrix.lower.len(),
        ncols: matrix.ncols,
        upper: if empty { Vec::new() } else { matrix.upper.iter().map(row_of).collect() },
        lower: if empty { Vec::new() } else { matrix.lower.iter().map(row_of).collect() },
        column_order: if empty {
            Vec::new()
        } else {
            matrix
                .col_to_monom
                .iter()
                .map(|&id| symbol_ht.monom(id).clone())
                .collect()
        },
        useful: new_rows
            .iter()
            .map(|r| TraceUseful {
                lower_pos: r.lower_pos,
                support_len: r.cols.len(),
            })
            .collect(),
    }
}

/// Runs F4 to fixpoint. With `learn`, the run's decisions are recorded
/// into the given trace.
pub fn f4<M: Monomial, A: Arithmetic>(
    basis: &mut Basis<A>,
    pairset: &mut Pairset,
    ht: &mut MonomialHashtable<M>,
    arith: &A,
    params: &AlgorithmParams,
    mut learn: Option<&mut Trace<M>>,
) -> Result<(), EngineError> {
    basis.make_monic(arith);
    if let Some(trace) = learn.as_deref_mut() {
        trace.input_supports = (0..basis.nfilled()).map(|i| basis.monoms[i].len()).collect();
    }
    update(basis, pairset, ht)?;

    let mut iterations = 0usize;
    while !pairset.is_empty() {
        iterations += 1;
        if iterations > MAX_ITERATIONS {
            return Err(EngineError::IterationLimit);
        }
        check_cancelled(params)?;

        let mut symbol_ht = ht.secondary();
        let mut matrix = MacaulayMatrix::new();
        let selected = match params.selection {
            // Sugar selection is declared in the options but not
            // implemented; it resolves to the normal strategy here, not
            // by silent aliasing inside the selection.
            SelectionStrategy::Normal | SelectionStrategy::Sugar => {
                select_critical_pairs(pairset, ht, params.maxpairs)
            }
        };
        block_to_rows(&selected, basis, ht, &mut symbol_ht, &mut matrix)?;
        symbolic_preprocess(basis, ht, &mut symbol_ht, &mut matrix)?;
        convert_to_columns(&mut matrix, &symbol_ht);

        let new_rows = match resolve_backend(params, arith, learn.is_some()) {
            LinalgBackend::Deterministic => reduce_deterministic(&matrix, basis, arith),
            LinalgBackend::Randomized => {
                reduce_randomized(&matrix, basis, arith, params.seed ^ iterations as u64)
            }
        };

        if let Some(trace) = learn.as_deref_mut() {
            trace
                .iterations
                .push(record_iteration(&matrix, &symbol_ht, &new_rows));
        }

        insert_new_rows(basis, ht, &symbol_ht, &matrix, new_rows);
        update(basis, pairset, ht)?;
    }

    postprocess(basis, ht, arith, params)
}

/// Replays a learned run on new coefficients. Returns `Ok(false)` when
/// the structure drifts (an unlucky specialization); the basis is then
/// partial and must be discarded by the caller.
pub fn f4_apply<M: Monomial, A: Arithmetic>(
    trace: &Trace<M>,
    basis: &mut Basis<A>,
    pairset: &mut Pairset,
    ht: &mut MonomialHashtable<M>,
    arith: &A,
    params: &AlgorithmParams,
) -> Result<bool, EngineError> {
    if basis.nfilled() != trace.input_supports.len() {
        return Ok(false);
    }
    for i in 0..basis.nfilled() {
        if basis.monoms[i].len() != trace.input_supports[i] {
            return Ok(false);
        }
    }

    basis.make_monic(arith);
    update(basis, pairset, ht)?;

    for it in &trace.iterations {
        check_cancelled(params)?;
        if pairset.is_empty() {
            return Ok(false);
        }
        // Keep the pairset in step; the block itself is not used.
        let _ = select_critical_pairs(pairset, ht, params.maxpairs);
        if it.empty {
            continue;
        }

        let mut symbol_ht = ht.secondary();
        let mut matrix = MacaulayMatrix::new();
        for (rows, upper) in [(&it.upper, true), (&it.lower, false)] {
            for row in rows {
                if row.basis_index >= basis.nfilled() {
                    return Ok(false);
                }
                let mult_hash = symbol_ht.hash_of(&row.mult);
                let support = multiplied_support(
                    row.basis_index,
                    &row.mult,
                    mult_hash,
                    basis,
                    ht,
                    &mut symbol_ht,
                )?;
                let matrix_row = MatrixRow {
                    support,
                    source: CoeffSource::Basis(row.basis_index),
                    mult: row.mult.clone(),
                };
                if upper {
                    matrix.upper.push(matrix_row);
                } else {
                    matrix.lower.push(matrix_row);
                }
            }
        }

        if symbol_ht.len() != it.ncols + 1
            || matrix.upper.len() != it.nup
            || matrix.lower.len() != it.nlow
        {
            return Ok(false);
        }

        // Recorded column order, keyed by monomial so identifier
        // assignment within this run is irrelevant.
        let col_of: FxHashMap<&M, u32> = it
            .column_order
            .iter()
            .enumerate()
            .map(|(c, m)| (m, c as u32))
            .collect();
        let mut ids = vec![0 as MonomId; it.ncols];
        for id in 1..symbol_ht.len() as MonomId {
            match col_of.get(symbol_ht.monom(id)) {
                Some(&c) => ids[c as usize] = id,
                None => return Ok(false),
            }
        }
        apply_column_order(&mut matrix, ids);

        match reduce_apply(&matrix, basis, arith, &it.useful) {
            Ok(new_rows) => insert_new_rows(basis, ht, &symbol_ht, &matrix, new_rows),
            Err(_) => return Ok(false),
        }
        update(basis, pairset, ht)?;
    }

    if !pairset.is_empty() {
        return Ok(false);
    }
    postprocess(basis, ht, arith, params)?;
    Ok(true)
}

/// Reduces `inputs` to normal form modulo the (already standardized)
/// basis. Zero residues come back as empty polynomials.
pub fn f4_normal_form<M: Monomial, A: Arithmetic>(
    basis: &Basis<A>,
    ht: &mut MonomialHashtable<M>,
    arith: &A,
    inputs: &[ExchangePoly<A::Elem>],
) -> Result<Vec<ExchangePoly<A::Elem>>, EngineError> {
    let mut symbol_ht = ht.secondary();
    let mut matrix: MacaulayMatrix<M, A> = MacaulayMatrix::new();
    let identity = M::from_exponents(&vec![0; ht.nvars()])?;

    for (monoms, coeffs) in inputs {
        let mut terms: Vec<(M, A::Elem)> = Vec::with_capacity(monoms.len());
        for (exps, c) in monoms.iter().zip(coeffs) {
            terms.push((M::from_exponents(exps)?, c.clone()));
        }
        terms.sort_by(|a, b| b.0.compare(&a.0, symbol_ht.ordering()));

        let mut support = Vec::with_capacity(terms.len());
        let mut local = Vec::with_capacity(terms.len());
        for (m, c) in terms {
            support.push(symbol_ht.insert(m));
            local.push(c);
        }
        matrix.local_coeffs.push(local);
        matrix.lower.push(MatrixRow {
            support,
            source: CoeffSource::Local(matrix.local_coeffs.len() - 1),
            mult: identity.clone(),
        });
    }

    symbolic_preprocess(basis, ht, &mut symbol_ht, &mut matrix)?;
    convert_to_columns(&mut matrix, &symbol_ht);

    let residues = reduce_normal_form(&matrix, basis, arith);
    Ok(residues
        .into_iter()
        .map(|r| match r {
            None => (Vec::new(), Vec::new()),
            Some((cols, coeffs)) => {
                let monoms = cols
                    .iter()
                    .map(|&c| symbol_ht.monom(matrix.col_to_monom[c as usize]).exponents())
                    .collect();
                (monoms, coeffs)
            }
        })
        .collect())
}

/// Tests whether the basis is already a Gröbner basis: every surviving
/// S-pair must reduce to zero in one matrix.
pub fn f4_is_groebner<M: Monomial, A: Arithmetic>(
    basis: &mut Basis<A>,
    pairset: &mut Pairset,
    ht: &mut MonomialHashtable<M>,
    arith: &A,
) -> Result<bool, EngineError> {
    basis.make_monic(arith);
    update(basis, pairset, ht)?;
    if pairset.is_empty() {
        return Ok(true);
    }

    let mut symbol_ht = ht.secondary();
    let mut matrix = MacaulayMatrix::new();
    while !pairset.is_empty() {
        let selected = select_critical_pairs(pairset, ht, 0);
        block_to_rows(&selected, basis, ht, &mut symbol_ht, &mut matrix)?;
    }
    symbolic_preprocess(basis, ht, &mut symbol_ht, &mut matrix)?;
    convert_to_columns(&mut matrix, &symbol_ht);

    Ok(reduce_is_groebner(&matrix, basis, arith))
}

fn postprocess<M: Monomial, A: Arithmetic>(
    basis: &mut Basis<A>,
    ht: &mut MonomialHashtable<M>,
    arith: &A,
    params: &AlgorithmParams,
) -> Result<(), EngineError> {
    if params.sweep {
        basis.sweep_redundant();
    }
    if params.reduced {
        autoreduce(basis, ht, arith)?;
    }
    basis.standardize(ht, arith);
    Ok(())
}

/// Mutually reduces the non-redundant elements into reduced Gröbner form.
///
/// Every element joins the matrix as a lower row; symbolic preprocessing
/// supplies the reducers (including each element itself, whose pivot the
/// interreduction skips for its own row).
fn autoreduce<M: Monomial, A: Arithmetic>(
    basis: &mut Basis<A>,
    ht: &mut MonomialHashtable<M>,
    arith: &A,
) -> Result<(), EngineError> {
    let order = basis.nonredundant.clone();
    if order.is_empty() {
        return Ok(());
    }

    let mut symbol_ht = ht.secondary();
    let mut matrix = MacaulayMatrix::new();
    for &i in &order {
        push_multiple_of(&mut matrix, false, i, basis.lead(i), basis, ht, &mut symbol_ht)?;
    }
    symbolic_preprocess(basis, ht, &mut symbol_ht, &mut matrix)?;
    convert_to_columns(&mut matrix, &symbol_ht);

    let reduced = reduce_interreduce(&matrix, basis, arith);
    for (k, (cols, coeffs)) in reduced.into_iter().enumerate() {
        let i = order[k];
        let mut monoms = Vec::with_capacity(cols.len());
        for &c in &cols {
            let sid = matrix.col_to_monom[c as usize];
            let hash = symbol_ht.hashvalue(sid).hash;
            monoms.push(ht.insert_with_hash(symbol_ht.monom(sid).clone(), hash));
        }
        basis.monoms[i] = monoms;
        basis.coeffs[i] = coeffs;
    }
    Ok(())
}
