//! Computation options.

use quartus_f4::{AlgorithmParams, SelectionStrategy};
use quartus_modular::ModularStrategy;
use quartus_monomial::MonomialOrder;

/// Monomial representation hint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum MonomialRepr {
    /// Packed for degrevlex within the lane budget, dense otherwise.
    #[default]
    Auto,
    /// 32-bit dense exponent vectors.
    Dense,
    /// Packed 16-lane layout (degrevlex only).
    Packed,
    /// Accepted for compatibility; served by the dense representation.
    Sparse,
}

/// Modular arithmetic backend hint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ArithmeticBackend {
    /// Barrett reduction.
    #[default]
    Auto,
    /// Deferred reduction with a wide accumulator (31-bit moduli).
    Signed,
    /// Barrett reduction.
    Unsigned,
    /// Floating-point reduction (25-bit moduli), Barrett otherwise.
    Floating,
}

/// Matrix reducer hint.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LinearAlgebra {
    /// Deterministic reduction.
    #[default]
    Auto,
    /// Deterministic Gauss-like reduction.
    Deterministic,
    /// Randomized batch reduction (auto-downgraded below char 500).
    Randomized,
}

/// Homogenization policy.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Homogenize {
    /// Homogenize exactly for non-graded orderings.
    #[default]
    Auto,
    /// Always homogenize, compute, dehomogenize, and re-reduce.
    Yes,
    /// Never homogenize.
    No,
}

/// Threading policy for the multi-modular driver.
///
/// There is no hidden global switch: a frontend that honors an
/// environment knob translates it into this option.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Threaded {
    /// Threads allowed.
    #[default]
    Auto,
    /// Force the parallel prime batches.
    Yes,
    /// Strictly single-threaded.
    No,
}

/// Options recognized by every entry point.
#[derive(Clone, Debug)]
pub struct GroebnerOptions {
    /// Monomial ordering of the output.
    pub ordering: MonomialOrder,
    /// Autoreduce the result to the reduced Gröbner basis.
    pub reduced: bool,
    /// Monomial representation hint.
    pub monoms: MonomialRepr,
    /// Modular arithmetic backend hint.
    pub arithmetic: ArithmeticBackend,
    /// Matrix reducer hint.
    pub linalg: LinearAlgebra,
    /// Cap on critical pairs per iteration; 0 means no cap.
    pub maxpairs: usize,
    /// Critical-pair selection strategy.
    pub selection: SelectionStrategy,
    /// Homogenization policy.
    pub homogenize: Homogenize,
    /// Strategy of the multi-modular driver.
    pub modular: ModularStrategy,
    /// Replay four primes at once through composite coefficients.
    pub batched: bool,
    /// Threading policy of the multi-modular driver.
    pub threaded: Threaded,
    /// Fully certify reconstructed rational bases.
    pub certify: bool,
    /// RNG seed (hashtable weights, randomized reduction).
    pub seed: u64,
    /// Release storage of redundant elements before postprocessing.
    pub sweep: bool,
    /// For `normal_form`: verify that the supplied basis is a Gröbner
    /// basis before reducing.
    pub check: bool,
}

impl Default for GroebnerOptions {
    fn default() -> Self {
        Self {
            ordering: MonomialOrder::DegRevLex,
            reduced: true,
            monoms: MonomialRepr::Auto,
            arithmetic: ArithmeticBackend::Auto,
            linalg: LinearAlgebra::Auto,
            maxpairs: 0,
            selection: SelectionStrategy::Normal,
            homogenize: Homogenize::Auto,
            modular: ModularStrategy::LearnAndApply,
            batched: false,
            threaded: Threaded::Auto,
            certify: false,
            seed: 42,
            sweep: false,
            check: false,
        }
    }
}

impl GroebnerOptions {
    /// Options with the given ordering, defaults otherwise.
    #[must_use]
    pub fn with_ordering(ordering: MonomialOrder) -> Self {
        Self {
            ordering,
            ..Self::default()
        }
    }

    /// The engine-level parameters these options resolve to.
    #[must_use]
    pub fn algorithm_params(&self) -> AlgorithmParams {
        AlgorithmParams {
            reduced: self.reduced,
            maxpairs: self.maxpairs,
            // Sugar resolves to the normal strategy, visibly; the engine
            // only runs normal selection.
            selection: self.selection,
            linalg: match self.linalg {
                LinearAlgebra::Randomized => quartus_f4::LinalgBackend::Randomized,
                LinearAlgebra::Auto | LinearAlgebra::Deterministic => {
                    quartus_f4::LinalgBackend::Deterministic
                }
            },
            seed: self.seed,
            sweep: self.sweep,
            cancel: None,
        }
    }

    /// Whether homogenization applies under this ordering.
    #[must_use]
    pub fn homogenize_enabled(&self) -> bool {
        match self.homogenize {
            Homogenize::Yes => true,
            Homogenize::No => false,
            Homogenize::Auto => !self.ordering.is_graded(),
        }
    }

    /// Whether the multi-modular driver may spawn threads.
    #[must_use]
    pub fn threads_enabled(&self) -> bool {
        !matches!(self.threaded, Threaded::No)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = GroebnerOptions::default();
        assert_eq!(opts.ordering, MonomialOrder::DegRevLex);
        assert!(opts.reduced);
        assert!(!opts.homogenize_enabled());
        assert!(opts.threads_enabled());
    }

    #[test]
    fn test_auto_homogenize_tracks_grading() {
        let lex = GroebnerOptions::with_ordering(MonomialOrder::Lex);
        assert!(lex.homogenize_enabled());

        let drl = GroebnerOptions::default();
        assert!(!drl.homogenize_enabled());
    }

    #[test]
    fn test_sugar_resolution_is_visible() {
        use quartus_f4::SelectionStrategy;
        let resolved = SelectionStrategy::Sugar.resolved();
        assert!(resolved.sugar_requested);
    }
}
