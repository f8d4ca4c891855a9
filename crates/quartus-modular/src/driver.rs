//! The multi-modular driver.
//!
//! Rational input is cleared to integers, reduced modulo a stream of
//! lucky primes, and solved over each prime field by F4. Per-prime bases
//! are vetted by a leading-structure majority vote, combined by CRT, and
//! lifted back to ℚ by rational reconstruction; a randomized check over a
//! fresh verification prime (and optionally a full certification over ℚ)
//! guards the answer. Unlucky primes are discarded internally and never
//! surface.

use rayon::prelude::*;

use num_traits::One;
use quartus_arith::{
    Arithmetic, BarrettArithmetic, CompositeArithmetic, Integer, PrimeSequence, Rational,
    RationalArithmetic, COMPOSITE_LANES,
};
use quartus_f4::{
    export_basis, f4::f4, f4_apply, f4_is_groebner, f4_normal_form, initialize, AlgorithmParams,
    EngineError, ExchangePoly, Pairset, Trace,
};
use quartus_monomial::{Monomial, MonomialOrder};
use rustc_hash::FxHashMap;

use crate::reconstruct::{shape_of, CrtAccumulator, Shape};

/// Strategy for the per-prime runs.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ModularStrategy {
    /// Run F4 from scratch for every prime.
    ClassicModular,
    /// Learn a trace on the first prime, replay it on the rest.
    #[default]
    LearnAndApply,
}

/// Driver configuration.
#[derive(Clone)]
pub struct DriverOptions {
    /// Engine parameters forwarded to every per-prime run.
    pub params: AlgorithmParams,
    /// Per-prime strategy.
    pub strategy: ModularStrategy,
    /// Replay four primes per pass through composite coefficients.
    pub batched: bool,
    /// Process prime batches in parallel.
    pub threaded: bool,
    /// Certify the reconstructed basis over ℚ before returning.
    pub certify: bool,
}

/// How many primes must agree before reconstruction is attempted.
const VOTE_QUORUM: usize = 3;

/// Computes a Gröbner basis of rational input polynomials.
pub fn groebner_rational<M: Monomial>(
    nvars: usize,
    ordering: MonomialOrder,
    input: &[ExchangePoly<Rational>],
    options: &DriverOptions,
) -> Result<Vec<ExchangePoly<Rational>>, EngineError> {
    let cleared: Vec<(Vec<Vec<u32>>, Vec<Integer>)> =
        input.iter().map(clear_denominators).collect();
    let lead_coeffs = leading_coefficients(&cleared, &ordering);

    let mut lucky = PrimeSequence::lucky();
    let mut verification = PrimeSequence::verification();

    let mut trace: Option<Trace<M>> = None;
    let mut pending: Vec<(u64, Vec<ExchangePoly<u64>>)> = Vec::new();
    let mut accumulator: Option<CrtAccumulator> = None;
    let mut batch_size = 1usize;

    loop {
        let primes: Vec<u64> = (0..batch_size)
            .map(|_| lucky.next_coprime_prime(&lead_coeffs))
            .collect();

        let mut results =
            run_batch::<M>(nvars, &ordering, &cleared, &primes, &mut trace, options)?;
        results.sort_by_key(|(p, _)| *p);
        pending.extend(results);

        // Majority vote on the basis structure before any combination.
        if accumulator.is_none() {
            if pending.len() < VOTE_QUORUM {
                batch_size *= 2;
                continue;
            }
            let template = majority_shape(&pending);
            let mut acc: Option<CrtAccumulator> = None;
            for (p, basis) in pending.drain(..) {
                if shape_of(&basis) != template {
                    continue; // unlucky
                }
                match &mut acc {
                    None => acc = Some(CrtAccumulator::new(p, &basis)),
                    Some(acc) => acc.absorb(p, &basis),
                }
            }
            accumulator = acc;
        } else {
            let acc = accumulator.as_mut().expect("accumulator initialized");
            for (p, basis) in pending.drain(..) {
                if shape_of(&basis) != acc.shape {
                    continue; // unlucky
                }
                acc.absorb(p, &basis);
            }
        }

        if let Some(acc) = &accumulator {
            if acc.primes.len() >= VOTE_QUORUM && acc.reconstruct_partial() {
                if let Some(candidate) = acc.reconstruct_full() {
                    if acc.heuristic_accepts(&candidate)
                        && randomized_check::<M>(
                            nvars,
                            &ordering,
                            input,
                            &candidate,
                            &mut verification,
                            &options.params,
                        )?
                        && (!options.certify
                            || certify_over_rationals::<M>(
                                nvars,
                                &ordering,
                                input,
                                &candidate,
                                &options.params,
                            )?)
                    {
                        return Ok(candidate);
                    }
                }
            }
        }

        batch_size *= 2;
    }
}

/// Multiplies a rational polynomial by the lcm of its denominators.
fn clear_denominators(poly: &ExchangePoly<Rational>) -> (Vec<Vec<u32>>, Vec<Integer>) {
    let (monoms, coeffs) = poly;
    let mut lcm = Integer::one();
    for c in coeffs {
        lcm = lcm.lcm(&c.denominator());
    }
    let cleared = coeffs
        .iter()
        .map(|c| c.numerator() * (&lcm / &c.denominator()))
        .collect();
    (monoms.clone(), cleared)
}

/// Leading coefficients of the cleared input under the target ordering;
/// primes dividing any of them are skipped outright.
fn leading_coefficients(
    cleared: &[(Vec<Vec<u32>>, Vec<Integer>)],
    ordering: &MonomialOrder,
) -> Vec<Integer> {
    cleared
        .iter()
        .map(|(monoms, coeffs)| {
            let mut best = 0usize;
            for k in 1..monoms.len() {
                if ordering.compare_slices(&monoms[k], &monoms[best]) == std::cmp::Ordering::Greater
                {
                    best = k;
                }
            }
            coeffs[best].clone()
        })
        .collect()
}

/// Reduces the cleared input modulo `p`, dropping vanished coefficients.
fn input_mod_p(
    cleared: &[(Vec<Vec<u32>>, Vec<Integer>)],
    p: u64,
) -> Vec<ExchangePoly<u64>> {
    cleared
        .iter()
        .map(|(monoms, coeffs)| {
            let mut ms = Vec::with_capacity(monoms.len());
            let mut cs = Vec::with_capacity(coeffs.len());
            for (m, c) in monoms.iter().zip(coeffs) {
                let r = c.rem_u64(p);
                if r != 0 {
                    ms.push(m.clone());
                    cs.push(r);
                }
            }
            (ms, cs)
        })
        .collect()
}

/// One from-scratch run modulo `p`, optionally learning a trace.
fn compute_mod_p<M: Monomial>(
    nvars: usize,
    ordering: &MonomialOrder,
    cleared: &[(Vec<Vec<u32>>, Vec<Integer>)],
    p: u64,
    params: &AlgorithmParams,
    mut learn: Option<&mut Trace<M>>,
) -> Result<Vec<ExchangePoly<u64>>, EngineError> {
    let arith = BarrettArithmetic::new(p);
    let input = input_mod_p(cleared, p);
    let (mut ht, mut basis, perm) =
        initialize::<M, _>(nvars, ordering.clone(), params.seed, &input)?;
    if let Some(trace) = learn.as_deref_mut() {
        trace.input_sort = perm;
    }
    let mut pairset = Pairset::new();
    f4(&mut basis, &mut pairset, &mut ht, &arith, params, learn)?;
    Ok(export_basis(&basis, &ht))
}

/// A replay modulo `p`; falls back to the classic run when the trace
/// does not transfer (unlucky specialization).
fn apply_mod_p<M: Monomial>(
    nvars: usize,
    ordering: &MonomialOrder,
    cleared: &[(Vec<Vec<u32>>, Vec<Integer>)],
    p: u64,
    params: &AlgorithmParams,
    trace: &Trace<M>,
) -> Result<Vec<ExchangePoly<u64>>, EngineError> {
    let arith = BarrettArithmetic::new(p);
    let input = input_mod_p(cleared, p);
    let (mut ht, mut basis, _) =
        initialize::<M, _>(nvars, ordering.clone(), params.seed, &input)?;
    let mut pairset = Pairset::new();
    if f4_apply(trace, &mut basis, &mut pairset, &mut ht, &arith, params)? {
        return Ok(export_basis(&basis, &ht));
    }
    compute_mod_p::<M>(nvars, ordering, cleared, p, params, None)
}

/// A four-lane replay; on any drift the chunk falls back to scalar runs.
fn apply_composite<M: Monomial>(
    nvars: usize,
    ordering: &MonomialOrder,
    cleared: &[(Vec<Vec<u32>>, Vec<Integer>)],
    primes: [u64; COMPOSITE_LANES],
    params: &AlgorithmParams,
    trace: &Trace<M>,
) -> Result<Vec<(u64, Vec<ExchangePoly<u64>>)>, EngineError> {
    let arith = CompositeArithmetic::new(primes);

    // Lane-packed input; a residue vanishing in any lane would desync
    // the lanes' supports, so such chunks run scalar.
    let mut packed: Vec<ExchangePoly<<CompositeArithmetic as Arithmetic>::Elem>> =
        Vec::with_capacity(cleared.len());
    let mut clean = true;
    'pack: for (monoms, coeffs) in cleared {
        let mut cs = Vec::with_capacity(coeffs.len());
        for c in coeffs {
            let lanes = arith.from_integer(c);
            if lanes.iter().any(|&x| x == 0) {
                clean = false;
                break 'pack;
            }
            cs.push(lanes);
        }
        packed.push((monoms.clone(), cs));
    }

    if clean {
        let (mut ht, mut basis, _) =
            initialize::<M, _>(nvars, ordering.clone(), params.seed, &packed)?;
        let mut pairset = Pairset::new();
        if f4_apply(trace, &mut basis, &mut pairset, &mut ht, &arith, params)? {
            let lanes = export_basis(&basis, &ht);
            return Ok(split_lanes(&lanes, primes));
        }
    }

    let mut out = Vec::with_capacity(COMPOSITE_LANES);
    for &p in &primes {
        out.push((p, apply_mod_p::<M>(nvars, ordering, cleared, p, params, trace)?));
    }
    Ok(out)
}

/// Splits a composite basis into one scalar basis per lane, dropping
/// coefficients that vanish in a lane.
fn split_lanes(
    lanes: &[ExchangePoly<<CompositeArithmetic as Arithmetic>::Elem>],
    primes: [u64; COMPOSITE_LANES],
) -> Vec<(u64, Vec<ExchangePoly<u64>>)> {
    (0..COMPOSITE_LANES)
        .map(|lane| {
            let basis = lanes
                .iter()
                .map(|(monoms, coeffs)| {
                    let mut ms = Vec::with_capacity(monoms.len());
                    let mut cs = Vec::with_capacity(coeffs.len());
                    for (m, c) in monoms.iter().zip(coeffs) {
                        if c[lane] != 0 {
                            ms.push(m.clone());
                            cs.push(c[lane]);
                        }
                    }
                    (ms, cs)
                })
                .collect();
            (primes[lane], basis)
        })
        .collect()
}

/// Runs one batch of primes, honoring the strategy and thread options.
fn run_batch<M: Monomial>(
    nvars: usize,
    ordering: &MonomialOrder,
    cleared: &[(Vec<Vec<u32>>, Vec<Integer>)],
    primes: &[u64],
    trace: &mut Option<Trace<M>>,
    options: &DriverOptions,
) -> Result<Vec<(u64, Vec<ExchangePoly<u64>>)>, EngineError> {
    let params = &options.params;
    let mut results = Vec::with_capacity(primes.len());
    let mut rest = primes;

    // Learn once, on the first prime ever processed.
    if options.strategy == ModularStrategy::LearnAndApply && trace.is_none() {
        let (&first, tail) = rest.split_first().expect("batch is never empty");
        let mut learned = Trace::new(nvars, ordering.clone(), params.seed);
        let basis = compute_mod_p::<M>(nvars, ordering, cleared, first, params, Some(&mut learned))?;
        *trace = Some(learned);
        results.push((first, basis));
        rest = tail;
    }

    match (options.strategy, trace.as_ref()) {
        (ModularStrategy::LearnAndApply, Some(trace)) if options.batched => {
            let mut chunks = rest.chunks_exact(COMPOSITE_LANES);
            for chunk in &mut chunks {
                let primes: [u64; COMPOSITE_LANES] = chunk.try_into().expect("exact chunk");
                results.extend(apply_composite::<M>(
                    nvars, ordering, cleared, primes, params, trace,
                )?);
            }
            for &p in chunks.remainder() {
                results.push((p, apply_mod_p::<M>(nvars, ordering, cleared, p, params, trace)?));
            }
        }
        (ModularStrategy::LearnAndApply, Some(trace)) if options.threaded && rest.len() > 1 => {
            let applied: Result<Vec<_>, EngineError> = rest
                .par_iter()
                .map(|&p| {
                    apply_mod_p::<M>(nvars, ordering, cleared, p, params, trace)
                        .map(|basis| (p, basis))
                })
                .collect();
            results.extend(applied?);
        }
        (ModularStrategy::LearnAndApply, Some(trace)) => {
            for &p in rest {
                results.push((p, apply_mod_p::<M>(nvars, ordering, cleared, p, params, trace)?));
            }
        }
        _ if options.threaded && rest.len() > 1 => {
            let computed: Result<Vec<_>, EngineError> = rest
                .par_iter()
                .map(|&p| {
                    compute_mod_p::<M>(nvars, ordering, cleared, p, params, None)
                        .map(|basis| (p, basis))
                })
                .collect();
            results.extend(computed?);
        }
        _ => {
            for &p in rest {
                results.push((p, compute_mod_p::<M>(nvars, ordering, cleared, p, params, None)?));
            }
        }
    }
    Ok(results)
}

/// The most frequent basis shape. Ties resolve to the earliest prime's
/// shape: the first occurrence with the winning count is kept.
fn majority_shape(pending: &[(u64, Vec<ExchangePoly<u64>>)]) -> Shape {
    let mut counts: FxHashMap<Shape, usize> = FxHashMap::default();
    for (_, basis) in pending {
        *counts.entry(shape_of(basis)).or_insert(0) += 1;
    }

    let mut best_shape: Option<Shape> = None;
    let mut best_count = 0usize;
    for (_, basis) in pending {
        let shape = shape_of(basis);
        let count = counts[&shape];
        if count > best_count {
            best_count = count;
            best_shape = Some(shape);
        }
    }
    best_shape.expect("pending is non-empty")
}

/// Randomized correctness check over a fresh verification prime: the
/// candidate must be a Gröbner basis and must reduce the input to zero.
fn randomized_check<M: Monomial>(
    nvars: usize,
    ordering: &MonomialOrder,
    input: &[ExchangePoly<Rational>],
    candidate: &[ExchangePoly<Rational>],
    verification: &mut PrimeSequence,
    params: &AlgorithmParams,
) -> Result<bool, EngineError> {
    // A prime where some candidate denominator vanishes is useless for
    // checking; draw until reduction is defined.
    let (q, candidate_q, input_q) = loop {
        let q = verification.next_prime();
        if let (Some(c), Some(i)) = (reduce_rational(candidate, q), reduce_rational(input, q)) {
            break (q, c, i);
        }
    };

    let arith = BarrettArithmetic::new(q);
    let (mut ht, mut basis, _) =
        initialize::<M, _>(nvars, ordering.clone(), params.seed, &candidate_q)?;
    let mut pairset = Pairset::new();
    if !f4_is_groebner(&mut basis, &mut pairset, &mut ht, &arith)? {
        return Ok(false);
    }

    let (mut ht, mut basis, _) =
        initialize::<M, _>(nvars, ordering.clone(), params.seed, &candidate_q)?;
    basis.make_monic(&arith);
    basis.declare_all_nonredundant(&ht);
    let residues = f4_normal_form(&basis, &mut ht, &arith, &input_q)?;
    Ok(residues.iter().all(|(m, _)| m.is_empty()))
}

/// Full certification over ℚ with exact rational arithmetic.
fn certify_over_rationals<M: Monomial>(
    nvars: usize,
    ordering: &MonomialOrder,
    input: &[ExchangePoly<Rational>],
    candidate: &[ExchangePoly<Rational>],
    params: &AlgorithmParams,
) -> Result<bool, EngineError> {
    let arith = RationalArithmetic;
    let (mut ht, mut basis, _) =
        initialize::<M, _>(nvars, ordering.clone(), params.seed, candidate)?;
    let mut pairset = Pairset::new();
    if !f4_is_groebner(&mut basis, &mut pairset, &mut ht, &arith)? {
        return Ok(false);
    }

    let (mut ht, mut basis, _) =
        initialize::<M, _>(nvars, ordering.clone(), params.seed, candidate)?;
    basis.make_monic(&arith);
    basis.declare_all_nonredundant(&ht);
    let residues = f4_normal_form(&basis, &mut ht, &arith, input)?;
    Ok(residues.iter().all(|(m, _)| m.is_empty()))
}

/// Reduces rational polynomials modulo `q`; `None` when a denominator
/// vanishes. Coefficients reducing to zero are dropped.
fn reduce_rational(
    polys: &[ExchangePoly<Rational>],
    q: u64,
) -> Option<Vec<ExchangePoly<u64>>> {
    let mut out = Vec::with_capacity(polys.len());
    for (monoms, coeffs) in polys {
        let mut ms = Vec::with_capacity(monoms.len());
        let mut cs = Vec::with_capacity(coeffs.len());
        for (m, c) in monoms.iter().zip(coeffs) {
            let r = c.rem_u64(q)?;
            if r != 0 {
                ms.push(m.clone());
                cs.push(r);
            }
        }
        if ms.is_empty() {
            return None; // the whole polynomial vanished; useless prime
        }
        out.push((ms, cs));
    }
    Some(out)
}
