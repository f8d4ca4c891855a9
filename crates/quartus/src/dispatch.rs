//! Representation and backend selection.
//!
//! The engine is monomorphized per monomial representation and per
//! arithmetic backend; this module picks the concrete instantiation from
//! the options and the ring, and owns the overflow-restart policy: a
//! packed computation that overflows its 15-bit exponent budget is
//! restarted on the 32-bit dense representation before any error
//! reaches the caller.

use quartus_arith::{
    Arithmetic, BarrettArithmetic, DelayedArithmetic, FloatingArithmetic, Rational,
    RationalArithmetic,
};
use quartus_f4::{
    export_basis, f4::f4, f4_apply, f4_is_groebner, f4_normal_form, initialize, ExchangePoly,
    Pairset, Trace,
};
use quartus_modular::{groebner_rational, DriverOptions};
use quartus_monomial::{DenseMonomial, Monomial, PackedMonomial, PACKED_MAX_VARS};

use crate::error::GroebnerError;
use crate::options::{ArithmeticBackend, GroebnerOptions, MonomialRepr};

/// Concrete monomial representation for a run.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ReprChoice {
    Packed,
    Dense,
}

/// Picks the representation for `nvars` variables under the options.
pub(crate) fn choose_repr(
    nvars: usize,
    options: &GroebnerOptions,
) -> Result<ReprChoice, GroebnerError> {
    match options.monoms {
        MonomialRepr::Dense | MonomialRepr::Sparse => Ok(ReprChoice::Dense),
        MonomialRepr::Packed => {
            if !PackedMonomial::supports_ordering(&options.ordering) {
                return Err(GroebnerError::UnsupportedOrdering {
                    ordering: options.ordering.name().into(),
                    representation: "packed".into(),
                });
            }
            if nvars > PACKED_MAX_VARS {
                return Err(GroebnerError::MonomialDegreeOverflow);
            }
            Ok(ReprChoice::Packed)
        }
        MonomialRepr::Auto => {
            if PackedMonomial::supports_ordering(&options.ordering) && nvars <= PACKED_MAX_VARS {
                Ok(ReprChoice::Packed)
            } else {
                Ok(ReprChoice::Dense)
            }
        }
    }
}

/// Whether an overflow may restart on the wider representation: only
/// when the representation was auto-selected. An explicit `packed` hint
/// surfaces the overflow instead.
pub(crate) fn restartable(options: &GroebnerOptions) -> bool {
    matches!(options.monoms, MonomialRepr::Auto)
}

/// Retries a packed run on the dense representation after an exponent
/// overflow; dense overflows are final.
pub(crate) fn with_overflow_restart<T>(
    repr: ReprChoice,
    allow_restart: bool,
    mut run: impl FnMut(ReprChoice) -> Result<T, GroebnerError>,
) -> Result<T, GroebnerError> {
    match run(repr) {
        Err(GroebnerError::MonomialDegreeOverflow)
            if allow_restart && repr == ReprChoice::Packed =>
        {
            run(ReprChoice::Dense)
        }
        other => other,
    }
}

enum ArithChoice {
    Barrett(BarrettArithmetic),
    Delayed(DelayedArithmetic),
    Floating(FloatingArithmetic),
}

fn select_arithmetic(p: u64, kind: ArithmeticBackend) -> ArithChoice {
    match kind {
        ArithmeticBackend::Signed if p < (1 << 31) => {
            ArithChoice::Delayed(DelayedArithmetic::new(p))
        }
        ArithmeticBackend::Floating if p < (1 << 25) => {
            ArithChoice::Floating(FloatingArithmetic::new(p))
        }
        _ => ArithChoice::Barrett(BarrettArithmetic::new(p)),
    }
}

fn groebner_core<M: Monomial, A: Arithmetic<Elem = u64>>(
    nvars: usize,
    input: &[ExchangePoly<u64>],
    options: &GroebnerOptions,
    arith: &A,
) -> Result<Vec<ExchangePoly<u64>>, GroebnerError> {
    let params = options.algorithm_params();
    let (mut ht, mut basis, _) =
        initialize::<M, A>(nvars, options.ordering.clone(), params.seed, input)?;
    let mut pairset = Pairset::new();
    f4(&mut basis, &mut pairset, &mut ht, arith, &params, None)?;
    Ok(export_basis(&basis, &ht))
}

/// Prime-field basis computation for a fixed representation.
pub(crate) fn groebner_ff<M: Monomial>(
    nvars: usize,
    p: u64,
    input: &[ExchangePoly<u64>],
    options: &GroebnerOptions,
) -> Result<Vec<ExchangePoly<u64>>, GroebnerError> {
    match select_arithmetic(p, options.arithmetic) {
        ArithChoice::Barrett(a) => groebner_core::<M, _>(nvars, input, options, &a),
        ArithChoice::Delayed(a) => groebner_core::<M, _>(nvars, input, options, &a),
        ArithChoice::Floating(a) => groebner_core::<M, _>(nvars, input, options, &a),
    }
}

fn normal_form_core<M: Monomial, A: Arithmetic>(
    nvars: usize,
    input: &[ExchangePoly<A::Elem>],
    basis_polys: &[ExchangePoly<A::Elem>],
    options: &GroebnerOptions,
    arith: &A,
) -> Result<Vec<ExchangePoly<A::Elem>>, GroebnerError> {
    let (mut ht, mut basis, _) = initialize::<M, A>(
        nvars,
        options.ordering.clone(),
        options.seed,
        basis_polys,
    )?;
    basis.make_monic(arith);
    basis.declare_all_nonredundant(&ht);
    Ok(f4_normal_form(&basis, &mut ht, arith, input)?)
}

/// Prime-field normal form for a fixed representation.
pub(crate) fn normal_form_ff<M: Monomial>(
    nvars: usize,
    p: u64,
    input: &[ExchangePoly<u64>],
    basis: &[ExchangePoly<u64>],
    options: &GroebnerOptions,
) -> Result<Vec<ExchangePoly<u64>>, GroebnerError> {
    match select_arithmetic(p, options.arithmetic) {
        ArithChoice::Barrett(a) => normal_form_core::<M, _>(nvars, input, basis, options, &a),
        ArithChoice::Delayed(a) => normal_form_core::<M, _>(nvars, input, basis, options, &a),
        ArithChoice::Floating(a) => normal_form_core::<M, _>(nvars, input, basis, options, &a),
    }
}

fn is_groebner_core<M: Monomial, A: Arithmetic>(
    nvars: usize,
    input: &[ExchangePoly<A::Elem>],
    options: &GroebnerOptions,
    arith: &A,
) -> Result<bool, GroebnerError> {
    let (mut ht, mut basis, _) =
        initialize::<M, A>(nvars, options.ordering.clone(), options.seed, input)?;
    let mut pairset = Pairset::new();
    Ok(f4_is_groebner(&mut basis, &mut pairset, &mut ht, arith)?)
}

/// Prime-field Gröbner test for a fixed representation.
pub(crate) fn is_groebner_ff<M: Monomial>(
    nvars: usize,
    p: u64,
    input: &[ExchangePoly<u64>],
    options: &GroebnerOptions,
) -> Result<bool, GroebnerError> {
    match select_arithmetic(p, options.arithmetic) {
        ArithChoice::Barrett(a) => is_groebner_core::<M, _>(nvars, input, options, &a),
        ArithChoice::Delayed(a) => is_groebner_core::<M, _>(nvars, input, options, &a),
        ArithChoice::Floating(a) => is_groebner_core::<M, _>(nvars, input, options, &a),
    }
}

/// Learning run over a prime field (Barrett arithmetic: the trace must
/// replay against any backend, and Barrett covers every modulus).
pub(crate) fn learn_ff<M: Monomial>(
    nvars: usize,
    p: u64,
    input: &[ExchangePoly<u64>],
    options: &GroebnerOptions,
) -> Result<(Trace<M>, Vec<ExchangePoly<u64>>), GroebnerError> {
    let params = options.algorithm_params();
    let arith = BarrettArithmetic::new(p);
    let mut trace = Trace::new(nvars, options.ordering.clone(), params.seed);
    let (mut ht, mut basis, perm) =
        initialize::<M, _>(nvars, options.ordering.clone(), params.seed, input)?;
    trace.input_sort = perm;
    let mut pairset = Pairset::new();
    f4(&mut basis, &mut pairset, &mut ht, &arith, &params, Some(&mut trace))?;
    Ok((trace, export_basis(&basis, &ht)))
}

/// Replay over a prime field.
pub(crate) fn apply_ff<M: Monomial>(
    trace: &Trace<M>,
    nvars: usize,
    p: u64,
    input: &[ExchangePoly<u64>],
    options: &GroebnerOptions,
) -> Result<(bool, Vec<ExchangePoly<u64>>), GroebnerError> {
    let params = options.algorithm_params();
    let arith = BarrettArithmetic::new(p);
    let (mut ht, mut basis, _) =
        initialize::<M, _>(nvars, options.ordering.clone(), params.seed, input)?;
    let mut pairset = Pairset::new();
    let ok = f4_apply(trace, &mut basis, &mut pairset, &mut ht, &arith, &params)?;
    if ok {
        Ok((true, export_basis(&basis, &ht)))
    } else {
        Ok((false, Vec::new()))
    }
}

/// Rational basis computation through the multi-modular driver.
pub(crate) fn groebner_qq<M: Monomial>(
    nvars: usize,
    input: &[ExchangePoly<Rational>],
    options: &GroebnerOptions,
) -> Result<Vec<ExchangePoly<Rational>>, GroebnerError> {
    let driver = DriverOptions {
        params: options.algorithm_params(),
        strategy: options.modular,
        batched: options.batched,
        threaded: options.threads_enabled(),
        certify: options.certify,
    };
    Ok(groebner_rational::<M>(
        nvars,
        options.ordering.clone(),
        input,
        &driver,
    )?)
}

/// Rational normal form with exact arithmetic.
pub(crate) fn normal_form_qq<M: Monomial>(
    nvars: usize,
    input: &[ExchangePoly<Rational>],
    basis: &[ExchangePoly<Rational>],
    options: &GroebnerOptions,
) -> Result<Vec<ExchangePoly<Rational>>, GroebnerError> {
    normal_form_core::<M, _>(nvars, input, basis, options, &RationalArithmetic)
}

/// Rational Gröbner test with exact arithmetic.
pub(crate) fn is_groebner_qq<M: Monomial>(
    nvars: usize,
    input: &[ExchangePoly<Rational>],
    options: &GroebnerOptions,
) -> Result<bool, GroebnerError> {
    is_groebner_core::<M, _>(nvars, input, options, &RationalArithmetic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_monomial::MonomialOrder;

    #[test]
    fn test_repr_selection() {
        let drl = GroebnerOptions::default();
        assert_eq!(choose_repr(3, &drl).unwrap(), ReprChoice::Packed);
        assert_eq!(choose_repr(40, &drl).unwrap(), ReprChoice::Dense);

        let lex = GroebnerOptions::with_ordering(MonomialOrder::Lex);
        assert_eq!(choose_repr(3, &lex).unwrap(), ReprChoice::Dense);

        let mut sparse = GroebnerOptions::default();
        sparse.monoms = MonomialRepr::Sparse;
        assert_eq!(choose_repr(3, &sparse).unwrap(), ReprChoice::Dense);
    }

    #[test]
    fn test_packed_rejects_lex() {
        let mut opts = GroebnerOptions::with_ordering(MonomialOrder::Lex);
        opts.monoms = MonomialRepr::Packed;
        assert!(matches!(
            choose_repr(3, &opts),
            Err(GroebnerError::UnsupportedOrdering { .. })
        ));
    }

    #[test]
    fn test_overflow_restart_retries_dense() {
        let mut calls = Vec::new();
        let result = with_overflow_restart(ReprChoice::Packed, true, |repr| {
            calls.push(repr);
            match repr {
                ReprChoice::Packed => Err(GroebnerError::MonomialDegreeOverflow),
                ReprChoice::Dense => Ok(7),
            }
        });
        assert_eq!(result, Ok(7));
        assert_eq!(calls, vec![ReprChoice::Packed, ReprChoice::Dense]);

        // An explicit packed hint does not restart.
        let result = with_overflow_restart(ReprChoice::Packed, false, |_| {
            Err::<i32, _>(GroebnerError::MonomialDegreeOverflow)
        });
        assert_eq!(result, Err(GroebnerError::MonomialDegreeOverflow));
    }
}
