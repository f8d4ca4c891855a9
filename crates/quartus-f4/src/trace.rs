//! The learn/apply trace.
//!
//! Learning records the discrete decisions of one F4 run: which basis
//! polynomial was multiplied by which monomial into which matrix half,
//! the column order, the matrix shape, and which lower rows produced
//! pivots. Application replays those decisions on a structurally
//! identical input, paying only for the coefficient arithmetic.
//!
//! The trace is an opaque in-memory value; it is not serialized.

use quartus_monomial::MonomialOrder;

/// One matrix row: a basis polynomial and its monomial multiplier.
#[derive(Clone, Debug)]
pub struct TraceRow<M> {
    /// Index into the basis as it stood in that iteration.
    pub basis_index: usize,
    /// Monomial the polynomial was multiplied by.
    pub mult: M,
}

/// A lower row that produced a pivot, with the expected residue size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceUseful {
    /// Index into the matrix's lower half.
    pub lower_pos: usize,
    /// Non-zero count of the promoted row.
    pub support_len: usize,
}

/// Per-iteration record.
#[derive(Clone, Debug)]
pub struct TraceIteration<M> {
    /// True when the iteration produced no new pivots; application skips
    /// the matrix entirely and only discards the pair block.
    pub empty: bool,
    /// Matrix shape at learn time.
    pub nup: usize,
    /// Lower row count at learn time.
    pub nlow: usize,
    /// Column count at learn time.
    pub ncols: usize,
    /// Upper rows (selection reducers, then symbolic reducers).
    pub upper: Vec<TraceRow<M>>,
    /// Lower rows in selection order.
    pub lower: Vec<TraceRow<M>>,
    /// Column order as monomials, descending; keying by monomial keeps
    /// the permutation valid regardless of identifier assignment.
    pub column_order: Vec<M>,
    /// Lower rows that fired, in promotion order.
    pub useful: Vec<TraceUseful>,
}

/// A recorded F4 run.
#[derive(Clone, Debug)]
pub struct Trace<M> {
    /// Number of variables of the ring.
    pub nvars: usize,
    /// Monomial ordering of the run.
    pub ordering: MonomialOrder,
    /// RNG seed used by the run.
    pub seed: u64,
    /// Permutation applied to the input polynomials at initialization.
    pub input_sort: Vec<usize>,
    /// Term counts of the sorted input; application verifies the new
    /// coefficients preserve them before replaying anything.
    pub input_supports: Vec<usize>,
    /// Iteration records, in order.
    pub iterations: Vec<TraceIteration<M>>,
}

impl<M> Trace<M> {
    /// Creates an empty trace for a run about to be learned.
    #[must_use]
    pub fn new(nvars: usize, ordering: MonomialOrder, seed: u64) -> Self {
        Self {
            nvars,
            ordering,
            seed,
            input_sort: Vec::new(),
            input_supports: Vec::new(),
            iterations: Vec::new(),
        }
    }
}
