//! The library entry points.
//!
//! All operations are generic over the coefficient domain through the
//! sealed [`Coefficient`] trait: `u64` residues over a prime field
//! carried by the ring, or [`Rational`] coefficients driven through the
//! multi-modular machinery.

use quartus_arith::Rational;
use quartus_f4::{ExchangePoly, Trace};
use quartus_monomial::{DenseMonomial, MonomialOrder, PackedMonomial};

use crate::dispatch::{
    apply_ff, choose_repr, groebner_ff, groebner_qq, is_groebner_ff, is_groebner_qq, learn_ff,
    normal_form_ff, normal_form_qq, restartable, with_overflow_restart, ReprChoice,
};
use crate::error::GroebnerError;
use crate::homogenize::{dehomogenize, extend_ordering, homogenize};
use crate::io::{
    canonicalize_mod_p, validate_characteristic, validate_input, PolyRing, Polynomial,
};
use crate::options::{GroebnerOptions, Homogenize};

mod sealed {
    pub trait Sealed {}
    impl Sealed for u64 {}
    impl Sealed for quartus_arith::Rational {}
}

/// Coefficient domains the API accepts: prime-field residues (`u64`,
/// with the characteristic carried by [`PolyRing`]) and [`Rational`].
pub trait Coefficient:
    sealed::Sealed + Clone + PartialEq + std::fmt::Debug + num_traits::Zero
{
    #[doc(hidden)]
    fn groebner_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<Self>>,
        options: &GroebnerOptions,
    ) -> Result<Vec<ExchangePoly<Self>>, GroebnerError>;

    #[doc(hidden)]
    fn normal_form_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<Self>>,
        basis: Vec<ExchangePoly<Self>>,
        options: &GroebnerOptions,
    ) -> Result<Vec<ExchangePoly<Self>>, GroebnerError>;

    #[doc(hidden)]
    fn is_groebner_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<Self>>,
        options: &GroebnerOptions,
    ) -> Result<bool, GroebnerError>;
}

/// Computes a (by default reduced) Gröbner basis.
///
/// The output is sorted ascending by leading monomial under the
/// requested ordering, and every polynomial is monic.
pub fn groebner<C: Coefficient>(
    ring: &PolyRing,
    polys: &[Polynomial<C>],
    options: &GroebnerOptions,
) -> Result<Vec<Polynomial<C>>, GroebnerError> {
    let input = validate_input(ring, polys)?;
    let out = C::groebner_impl(ring, input, options)?;
    Ok(out.into_iter().map(Polynomial::from_exchange).collect())
}

/// Reduces `polys` to normal form modulo `basis`.
///
/// With `options.check` the basis is first verified to be a Gröbner
/// basis; without it, the caller vouches. Polynomials in the ideal come
/// back as zero.
pub fn normal_form<C: Coefficient>(
    ring: &PolyRing,
    polys: &[Polynomial<C>],
    basis: &[Polynomial<C>],
    options: &GroebnerOptions,
) -> Result<Vec<Polynomial<C>>, GroebnerError> {
    if polys.is_empty() {
        return Err(GroebnerError::EmptyInput);
    }
    for p in polys {
        for m in p.monomials() {
            if m.len() != ring.nvars {
                return Err(GroebnerError::InconsistentVariableCount {
                    expected: ring.nvars,
                    got: m.len(),
                });
            }
        }
    }

    let basis_ex = validate_input(ring, basis)?;
    if options.check && !C::is_groebner_impl(ring, basis_ex.clone(), options)? {
        return Err(GroebnerError::NotAGroebnerBasis);
    }

    let input_ex: Vec<ExchangePoly<C>> = polys.iter().map(Polynomial::to_exchange).collect();
    let out = C::normal_form_impl(ring, input_ex, basis_ex, options)?;
    Ok(out.into_iter().map(Polynomial::from_exchange).collect())
}

/// Tests whether `polys` already form a Gröbner basis.
pub fn is_groebner<C: Coefficient>(
    ring: &PolyRing,
    polys: &[Polynomial<C>],
    options: &GroebnerOptions,
) -> Result<bool, GroebnerError> {
    let input = validate_input(ring, polys)?;
    C::is_groebner_impl(ring, input, options)
}

/// A recorded run, reusable on structurally identical inputs.
///
/// Opaque and in-memory only; the internal layout is not stable across
/// versions and is deliberately not serializable.
pub struct LearnedTrace {
    nvars: usize,
    ordering: MonomialOrder,
    inner: TraceRepr,
}

enum TraceRepr {
    Packed(Trace<PackedMonomial>),
    Dense(Trace<DenseMonomial>),
}

/// Computes a Gröbner basis over a prime field while recording a trace
/// for [`groebner_apply`].
pub fn groebner_learn(
    ring: &PolyRing,
    polys: &[Polynomial<u64>],
    options: &GroebnerOptions,
) -> Result<(LearnedTrace, Vec<Polynomial<u64>>), GroebnerError> {
    validate_characteristic(ring.characteristic)?;
    let input = canonicalize_mod_p(validate_input(ring, polys)?, ring.characteristic);
    if input.is_empty() {
        return Err(GroebnerError::ZeroInput);
    }

    let repr = choose_repr(ring.nvars, options)?;
    let packed_attempt = if repr == ReprChoice::Packed {
        match learn_ff::<PackedMonomial>(ring.nvars, ring.characteristic, &input, options) {
            Err(GroebnerError::MonomialDegreeOverflow) => None,
            other => Some(other?),
        }
    } else {
        None
    };

    let (inner, basis) = match packed_attempt {
        Some((trace, basis)) => (TraceRepr::Packed(trace), basis),
        None => {
            let (trace, basis) =
                learn_ff::<DenseMonomial>(ring.nvars, ring.characteristic, &input, options)?;
            (TraceRepr::Dense(trace), basis)
        }
    };

    Ok((
        LearnedTrace {
            nvars: ring.nvars,
            ordering: options.ordering.clone(),
            inner,
        },
        basis.into_iter().map(Polynomial::from_exchange).collect(),
    ))
}

/// Replays a learned trace on new coefficients.
///
/// Returns `(false, [])` when the input is not structurally compatible
/// with the trace (a different shape, or an unlucky specialization);
/// the caller falls back to [`groebner`].
pub fn groebner_apply(
    trace: &LearnedTrace,
    ring: &PolyRing,
    polys: &[Polynomial<u64>],
    options: &GroebnerOptions,
) -> Result<(bool, Vec<Polynomial<u64>>), GroebnerError> {
    validate_characteristic(ring.characteristic)?;
    let input = canonicalize_mod_p(validate_input(ring, polys)?, ring.characteristic);
    if input.is_empty() {
        return Err(GroebnerError::ZeroInput);
    }
    if trace.nvars != ring.nvars || trace.ordering != options.ordering {
        return Ok((false, Vec::new()));
    }

    let (ok, basis) = match &trace.inner {
        TraceRepr::Packed(t) => {
            apply_ff::<PackedMonomial>(t, ring.nvars, ring.characteristic, &input, options)?
        }
        TraceRepr::Dense(t) => {
            apply_ff::<DenseMonomial>(t, ring.nvars, ring.characteristic, &input, options)?
        }
    };
    Ok((ok, basis.into_iter().map(Polynomial::from_exchange).collect()))
}

fn add_mod(a: u64, b: u64, p: u64) -> u64 {
    ((a as u128 + b as u128) % p as u128) as u64
}

/// Splits the input of a normal-form call into engine rows, remembering
/// where the zero polynomials were.
fn partition_zeros<C: Clone>(
    input: Vec<ExchangePoly<C>>,
) -> (Vec<ExchangePoly<C>>, Vec<Option<usize>>) {
    let mut engine = Vec::with_capacity(input.len());
    let mut slots = Vec::with_capacity(input.len());
    for poly in input {
        if poly.0.is_empty() {
            slots.push(None);
        } else {
            slots.push(Some(engine.len()));
            engine.push(poly);
        }
    }
    (engine, slots)
}

fn merge_zeros<C>(residues: Vec<ExchangePoly<C>>, slots: &[Option<usize>]) -> Vec<ExchangePoly<C>> {
    let mut residues: Vec<Option<ExchangePoly<C>>> = residues.into_iter().map(Some).collect();
    slots
        .iter()
        .map(|slot| match slot {
            Some(k) => residues[*k].take().expect("each residue consumed once"),
            None => (Vec::new(), Vec::new()),
        })
        .collect()
}

impl Coefficient for u64 {
    fn groebner_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<u64>>,
        options: &GroebnerOptions,
    ) -> Result<Vec<ExchangePoly<u64>>, GroebnerError> {
        let p = ring.characteristic;
        validate_characteristic(p)?;
        let input = canonicalize_mod_p(input, p);
        if input.is_empty() {
            return Err(GroebnerError::ZeroInput);
        }

        if options.homogenize_enabled() {
            let mut hopts = options.clone();
            hopts.homogenize = Homogenize::No;
            hopts.ordering = extend_ordering(&options.ordering);

            let hom = homogenize(&input);
            let repr = choose_repr(ring.nvars + 1, &hopts)?;
            let hgb = with_overflow_restart(repr, restartable(options), |r| match r {
                ReprChoice::Packed => groebner_ff::<PackedMonomial>(ring.nvars + 1, p, &hom, &hopts),
                ReprChoice::Dense => groebner_ff::<DenseMonomial>(ring.nvars + 1, p, &hom, &hopts),
            })?;

            let dehom = dehomogenize(hgb, |a, b| add_mod(*a, *b, p), |c| *c == 0);
            let mut ropts = options.clone();
            ropts.homogenize = Homogenize::No;
            return Self::groebner_impl(ring, dehom, &ropts);
        }

        let repr = choose_repr(ring.nvars, options)?;
        with_overflow_restart(repr, restartable(options), |r| match r {
            ReprChoice::Packed => groebner_ff::<PackedMonomial>(ring.nvars, p, &input, options),
            ReprChoice::Dense => groebner_ff::<DenseMonomial>(ring.nvars, p, &input, options),
        })
    }

    fn normal_form_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<u64>>,
        basis: Vec<ExchangePoly<u64>>,
        options: &GroebnerOptions,
    ) -> Result<Vec<ExchangePoly<u64>>, GroebnerError> {
        let p = ring.characteristic;
        validate_characteristic(p)?;
        let basis = canonicalize_mod_p(basis, p);
        if basis.is_empty() {
            return Err(GroebnerError::ZeroInput);
        }

        // Zero polynomials (and ones vanishing mod p) reduce to zero
        // without visiting the engine.
        let reduced: Vec<ExchangePoly<u64>> = input
            .into_iter()
            .map(|(monoms, coeffs)| {
                let mut ms = Vec::with_capacity(monoms.len());
                let mut cs = Vec::with_capacity(coeffs.len());
                for (m, c) in monoms.into_iter().zip(coeffs) {
                    let r = c % p;
                    if r != 0 {
                        ms.push(m);
                        cs.push(r);
                    }
                }
                (ms, cs)
            })
            .collect();
        let (engine_input, slots) = partition_zeros(reduced);
        if engine_input.is_empty() {
            return Ok(merge_zeros(Vec::new(), &slots));
        }

        let repr = choose_repr(ring.nvars, options)?;
        let residues = with_overflow_restart(repr, restartable(options), |r| match r {
            ReprChoice::Packed => {
                normal_form_ff::<PackedMonomial>(ring.nvars, p, &engine_input, &basis, options)
            }
            ReprChoice::Dense => {
                normal_form_ff::<DenseMonomial>(ring.nvars, p, &engine_input, &basis, options)
            }
        })?;
        Ok(merge_zeros(residues, &slots))
    }

    fn is_groebner_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<u64>>,
        options: &GroebnerOptions,
    ) -> Result<bool, GroebnerError> {
        let p = ring.characteristic;
        validate_characteristic(p)?;
        let input = canonicalize_mod_p(input, p);
        if input.is_empty() {
            return Err(GroebnerError::ZeroInput);
        }

        let repr = choose_repr(ring.nvars, options)?;
        with_overflow_restart(repr, restartable(options), |r| match r {
            ReprChoice::Packed => is_groebner_ff::<PackedMonomial>(ring.nvars, p, &input, options),
            ReprChoice::Dense => is_groebner_ff::<DenseMonomial>(ring.nvars, p, &input, options),
        })
    }
}

fn ensure_rational_ring(ring: &PolyRing) -> Result<(), GroebnerError> {
    if ring.characteristic != 0 {
        return Err(GroebnerError::InvalidInput(
            "rational coefficients require characteristic 0".into(),
        ));
    }
    Ok(())
}

impl Coefficient for Rational {
    fn groebner_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<Rational>>,
        options: &GroebnerOptions,
    ) -> Result<Vec<ExchangePoly<Rational>>, GroebnerError> {
        ensure_rational_ring(ring)?;

        if options.homogenize_enabled() {
            let mut hopts = options.clone();
            hopts.homogenize = Homogenize::No;
            hopts.ordering = extend_ordering(&options.ordering);

            let hom = homogenize(&input);
            let repr = choose_repr(ring.nvars + 1, &hopts)?;
            let hgb = with_overflow_restart(repr, restartable(options), |r| match r {
                ReprChoice::Packed => groebner_qq::<PackedMonomial>(ring.nvars + 1, &hom, &hopts),
                ReprChoice::Dense => groebner_qq::<DenseMonomial>(ring.nvars + 1, &hom, &hopts),
            })?;

            let dehom = dehomogenize(hgb, |a, b| a + b, num_traits::Zero::is_zero);
            let mut ropts = options.clone();
            ropts.homogenize = Homogenize::No;
            return Self::groebner_impl(ring, dehom, &ropts);
        }

        let repr = choose_repr(ring.nvars, options)?;
        with_overflow_restart(repr, restartable(options), |r| match r {
            ReprChoice::Packed => groebner_qq::<PackedMonomial>(ring.nvars, &input, options),
            ReprChoice::Dense => groebner_qq::<DenseMonomial>(ring.nvars, &input, options),
        })
    }

    fn normal_form_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<Rational>>,
        basis: Vec<ExchangePoly<Rational>>,
        options: &GroebnerOptions,
    ) -> Result<Vec<ExchangePoly<Rational>>, GroebnerError> {
        ensure_rational_ring(ring)?;

        let (engine_input, slots) = partition_zeros(input);
        if engine_input.is_empty() {
            return Ok(merge_zeros(Vec::new(), &slots));
        }

        let repr = choose_repr(ring.nvars, options)?;
        let residues = with_overflow_restart(repr, restartable(options), |r| match r {
            ReprChoice::Packed => {
                normal_form_qq::<PackedMonomial>(ring.nvars, &engine_input, &basis, options)
            }
            ReprChoice::Dense => {
                normal_form_qq::<DenseMonomial>(ring.nvars, &engine_input, &basis, options)
            }
        })?;
        Ok(merge_zeros(residues, &slots))
    }

    fn is_groebner_impl(
        ring: &PolyRing,
        input: Vec<ExchangePoly<Rational>>,
        options: &GroebnerOptions,
    ) -> Result<bool, GroebnerError> {
        ensure_rational_ring(ring)?;

        let repr = choose_repr(ring.nvars, options)?;
        with_overflow_restart(repr, restartable(options), |r| match r {
            ReprChoice::Packed => is_groebner_qq::<PackedMonomial>(ring.nvars, &input, options),
            ReprChoice::Dense => is_groebner_qq::<DenseMonomial>(ring.nvars, &input, options),
        })
    }
}
