//! The public error taxonomy.

use thiserror::Error;

use quartus_f4::EngineError;
use quartus_monomial::MonomialError;

/// Errors surfaced by the library API.
///
/// Every failure is a value; nothing panics across the API boundary.
/// Unlucky primes never appear here: the multi-modular driver recovers
/// from them internally.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GroebnerError {
    /// The input polynomial list is empty.
    #[error("input polynomial list is empty")]
    EmptyInput,

    /// Every input polynomial is zero.
    #[error("input contains only zero polynomials")]
    ZeroInput,

    /// A polynomial's exponent vectors disagree with the ring arity.
    #[error("polynomial has {got} variables, the ring has {expected}")]
    InconsistentVariableCount {
        /// Ring arity.
        expected: usize,
        /// Offending polynomial's arity.
        got: usize,
    },

    /// A monomial exceeded the widest representation budget.
    ///
    /// The dispatch layer first restarts packed computations with the
    /// 32-bit dense representation; this error means even that failed.
    #[error("monomial degree overflow")]
    MonomialDegreeOverflow,

    /// `normal_form` was called with `check` and the supplied set is not
    /// a Gröbner basis.
    #[error("the supplied set is not a Gröbner basis")]
    NotAGroebnerBasis,

    /// The requested ordering is not supported by the requested monomial
    /// representation.
    #[error("ordering {ordering} is unsupported by the {representation} representation")]
    UnsupportedOrdering {
        /// Ordering name.
        ordering: String,
        /// Representation name.
        representation: String,
    },

    /// The ring characteristic is not usable (not prime, or out of the
    /// supported range).
    #[error("characteristic {0} is not a supported prime")]
    InvalidCharacteristic(u64),

    /// Malformed input outside the other categories.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The engine ran past its iteration cap; a bug guard, not an input
    /// condition.
    #[error("F4 exceeded its iteration limit")]
    IterationLimit,

    /// The caller's cancel flag was raised.
    #[error("computation cancelled")]
    Cancelled,
}

impl From<EngineError> for GroebnerError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Monomial(MonomialError::DegreeOverflow)
            | EngineError::Monomial(MonomialError::TooManyVariables { .. }) => {
                GroebnerError::MonomialDegreeOverflow
            }
            EngineError::IterationLimit => GroebnerError::IterationLimit,
            EngineError::Cancelled => GroebnerError::Cancelled,
        }
    }
}
