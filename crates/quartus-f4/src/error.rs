//! Engine-level errors.

use thiserror::Error;

use quartus_monomial::MonomialError;

/// Failures the F4 engine can surface.
///
/// Monomial overflow is recoverable at the dispatch layer, which restarts
/// with a wider representation; the iteration limit is a bug guard.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A monomial operation exceeded the representation budget.
    #[error(transparent)]
    Monomial(#[from] MonomialError),

    /// The main loop ran past its hard iteration cap.
    #[error("F4 exceeded the iteration limit")]
    IterationLimit,

    /// The caller's cancel flag was raised between iterations.
    #[error("computation cancelled")]
    Cancelled,
}
