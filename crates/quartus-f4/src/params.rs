//! Engine parameters.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Hard cap on F4 iterations; hitting it signals a bug, not a hard input.
pub const MAX_ITERATIONS: usize = 10_000;

/// Matrix reducer backends.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LinalgBackend {
    /// Gauss-like sparse row reduction.
    #[default]
    Deterministic,
    /// Random lower-row combinations; downgraded to deterministic for
    /// characteristics below 500 and for multi-lane arithmetic.
    Randomized,
}

/// Critical-pair selection strategies.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SelectionStrategy {
    /// Minimum-degree block selection.
    #[default]
    Normal,
    /// Accepted for configuration compatibility; resolves to the normal
    /// strategy. The resolution is explicit so callers can observe it.
    Sugar,
}

impl SelectionStrategy {
    /// Resolves the strategy actually run. Sugar selection is not
    /// implemented; it maps to normal selection, visibly.
    #[must_use]
    pub fn resolved(self) -> ResolvedSelection {
        ResolvedSelection {
            sugar_requested: matches!(self, SelectionStrategy::Sugar),
        }
    }
}

/// Outcome of selection-strategy resolution: always the normal strategy,
/// with a flag recording that sugar was asked for.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ResolvedSelection {
    /// True when the caller asked for sugar selection.
    pub sugar_requested: bool,
}

/// Parameters of one engine run.
#[derive(Clone, Default)]
pub struct AlgorithmParams {
    /// Autoreduce the final basis.
    pub reduced: bool,
    /// Cap on pairs per iteration; 0 means no cap.
    pub maxpairs: usize,
    /// Pair selection strategy.
    pub selection: SelectionStrategy,
    /// Matrix reducer.
    pub linalg: LinalgBackend,
    /// Seed for hashtable weights and randomized reduction.
    pub seed: u64,
    /// Release the storage of redundant elements before postprocessing.
    pub sweep: bool,
    /// Cooperative cancellation, checked between iterations.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl AlgorithmParams {
    /// Parameters with the engine defaults: reduced output, normal
    /// selection, deterministic linear algebra.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            reduced: true,
            maxpairs: 0,
            selection: SelectionStrategy::Normal,
            linalg: LinalgBackend::Deterministic,
            seed,
            sweep: false,
            cancel: None,
        }
    }
}
