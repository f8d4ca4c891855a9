//! Engine-level tests over small ideals with known Gröbner bases.

use quartus_arith::BarrettArithmetic;
use quartus_monomial::{MonomialOrder, PackedMonomial};

use crate::f4::{export_basis, f4, f4_apply, f4_is_groebner, f4_normal_form, initialize, ExchangePoly};
use crate::pairset::Pairset;
use crate::params::AlgorithmParams;
use crate::trace::Trace;

const P: u64 = 2_147_483_647; // 2^31 - 1

fn arith() -> BarrettArithmetic {
    BarrettArithmetic::new(P)
}

fn neg(c: i64) -> u64 {
    if c >= 0 {
        c as u64 % P
    } else {
        P - ((-c) as u64 % P)
    }
}

fn poly(terms: &[(i64, &[u32])]) -> ExchangePoly<u64> {
    (
        terms.iter().map(|(_, e)| e.to_vec()).collect(),
        terms.iter().map(|(c, _)| neg(*c)).collect(),
    )
}

fn groebner(nvars: usize, input: &[ExchangePoly<u64>], seed: u64) -> Vec<ExchangePoly<u64>> {
    let a = arith();
    let (mut ht, mut basis, _perm) =
        initialize::<PackedMonomial, _>(nvars, MonomialOrder::DegRevLex, seed, input).unwrap();
    let mut pairset = Pairset::new();
    let params = AlgorithmParams::new(seed);
    f4(&mut basis, &mut pairset, &mut ht, &a, &params, None).unwrap();
    export_basis(&basis, &ht)
}

#[test]
fn test_two_generators() {
    // {x + y^2, xy - y^2} has the reduced degrevlex basis
    // {y^2 + x, xy + x, x^2 + x}.
    let input = vec![
        poly(&[(1, &[1, 0]), (1, &[0, 2])]),
        poly(&[(1, &[1, 1]), (-1, &[0, 2])]),
    ];
    let gb = groebner(2, &input, 42);

    let expected = vec![
        poly(&[(1, &[0, 2]), (1, &[1, 0])]),
        poly(&[(1, &[1, 1]), (1, &[1, 0])]),
        poly(&[(1, &[2, 0]), (1, &[1, 0])]),
    ];
    assert_eq!(gb, expected);
}

#[test]
fn test_lead_divisibility_does_not_lose_generators() {
    // {y, xy + x}: the second generator's lead is covered by y, but x
    // must still be found. Reduced basis is {x, y}.
    let input = vec![
        poly(&[(1, &[0, 1])]),
        poly(&[(1, &[1, 1]), (1, &[1, 0])]),
    ];
    let gb = groebner(2, &input, 42);

    // Ascending under degrevlex: y < x.
    let expected = vec![poly(&[(1, &[0, 1])]), poly(&[(1, &[1, 0])])];
    assert_eq!(gb, expected);
}

#[test]
fn test_already_groebner_is_unchanged() {
    let input = vec![poly(&[(1, &[1, 0])]), poly(&[(1, &[0, 1])])];
    let gb = groebner(2, &input, 42);
    assert_eq!(gb.len(), 2);
    assert_eq!(gb, vec![poly(&[(1, &[0, 1])]), poly(&[(1, &[1, 0])])]);
}

#[test]
fn test_cyclic3_satisfies_groebner_property() {
    // Elementary symmetric relations for n = 3 with e3 = 1.
    let input = vec![
        poly(&[(1, &[1, 0, 0]), (1, &[0, 1, 0]), (1, &[0, 0, 1])]),
        poly(&[(1, &[1, 1, 0]), (1, &[1, 0, 1]), (1, &[0, 1, 1])]),
        poly(&[(1, &[1, 1, 1]), (-1, &[0, 0, 0])]),
    ];
    let gb = groebner(3, &input, 42);
    assert!(!gb.is_empty());

    // The computed basis passes the Gröbner test.
    let a = arith();
    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(3, MonomialOrder::DegRevLex, 42, &gb).unwrap();
    let mut pairset = Pairset::new();
    assert!(f4_is_groebner(&mut basis, &mut pairset, &mut ht, &a).unwrap());
}

#[test]
fn test_input_reduces_to_zero_modulo_basis() {
    let input = vec![
        poly(&[(1, &[1, 0]), (1, &[0, 2])]),
        poly(&[(1, &[1, 1]), (-1, &[0, 2])]),
    ];
    let gb = groebner(2, &input, 42);

    let a = arith();
    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &gb).unwrap();
    basis.make_monic(&a);
    basis.declare_all_nonredundant(&ht);

    let residues = f4_normal_form(&basis, &mut ht, &a, &input).unwrap();
    for (monoms, coeffs) in residues {
        assert!(monoms.is_empty());
        assert!(coeffs.is_empty());
    }
}

#[test]
fn test_normal_form_of_nonmember() {
    let gb = vec![poly(&[(1, &[1, 0])]), poly(&[(1, &[0, 1])])];
    let a = arith();
    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &gb).unwrap();
    basis.make_monic(&a);
    basis.declare_all_nonredundant(&ht);

    // x + y + 5 reduces to 5 modulo {x, y}.
    let inputs = vec![poly(&[(1, &[1, 0]), (1, &[0, 1]), (5, &[0, 0])])];
    let residues = f4_normal_form(&basis, &mut ht, &a, &inputs).unwrap();
    assert_eq!(residues[0], poly(&[(5, &[0, 0])]));
}

#[test]
fn test_is_groebner_rejects_incomplete_set() {
    // {x + y^2, xy - y^2} is not a Gröbner basis (x^2 + x is missing).
    let input = vec![
        poly(&[(1, &[1, 0]), (1, &[0, 2])]),
        poly(&[(1, &[1, 1]), (-1, &[0, 2])]),
    ];
    let a = arith();
    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &input).unwrap();
    let mut pairset = Pairset::new();
    assert!(!f4_is_groebner(&mut basis, &mut pairset, &mut ht, &a).unwrap());
}

#[test]
fn test_idempotence() {
    let input = vec![
        poly(&[(1, &[1, 0]), (1, &[0, 2])]),
        poly(&[(1, &[1, 1]), (-1, &[0, 2])]),
    ];
    let gb = groebner(2, &input, 42);
    let gb2 = groebner(2, &gb, 42);
    assert_eq!(gb, gb2);
}

#[test]
fn test_learn_then_apply_same_prime() {
    let input = vec![
        poly(&[(1, &[1, 0]), (1, &[0, 2])]),
        poly(&[(1, &[1, 1]), (-1, &[0, 2])]),
    ];
    let a = arith();
    let params = AlgorithmParams::new(42);

    let mut trace = Trace::new(2, MonomialOrder::DegRevLex, 42);
    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &input).unwrap();
    let mut pairset = Pairset::new();
    f4(&mut basis, &mut pairset, &mut ht, &a, &params, Some(&mut trace)).unwrap();
    let learned = export_basis(&basis, &ht);

    let (mut ht2, mut basis2, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &input).unwrap();
    let mut pairset2 = Pairset::new();
    let ok = f4_apply(&trace, &mut basis2, &mut pairset2, &mut ht2, &a, &params).unwrap();
    assert!(ok);
    assert_eq!(export_basis(&basis2, &ht2), learned);
}

#[test]
fn test_learn_then_apply_other_prime() {
    // Same structure, different coefficients (a different prime field).
    let input = vec![
        poly(&[(1, &[1, 0]), (1, &[0, 2])]),
        poly(&[(1, &[1, 1]), (-1, &[0, 2])]),
    ];
    let a1 = arith();
    let params = AlgorithmParams::new(42);

    let mut trace = Trace::new(2, MonomialOrder::DegRevLex, 42);
    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &input).unwrap();
    let mut pairset = Pairset::new();
    f4(&mut basis, &mut pairset, &mut ht, &a1, &params, Some(&mut trace)).unwrap();

    let q = 1_073_741_827u64; // 2^30 + 3
    let a2 = BarrettArithmetic::new(q);
    let input_q = vec![
        (input[0].0.clone(), vec![1, 1]),
        (input[1].0.clone(), vec![1, q - 1]),
    ];
    let (mut ht2, mut basis2, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &input_q).unwrap();
    let mut pairset2 = Pairset::new();
    let ok = f4_apply(&trace, &mut basis2, &mut pairset2, &mut ht2, &a2, &params).unwrap();
    assert!(ok);

    // Matches the direct computation modulo q.
    let (mut ht3, mut basis3, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 42, &input_q).unwrap();
    let mut pairset3 = Pairset::new();
    f4(&mut basis3, &mut pairset3, &mut ht3, &a2, &params, None).unwrap();
    assert_eq!(export_basis(&basis2, &ht2), export_basis(&basis3, &ht3));
}

#[test]
fn test_unreduced_output_still_generates_lead_ideal() {
    let input = vec![
        poly(&[(1, &[1, 0]), (1, &[0, 2])]),
        poly(&[(1, &[1, 1]), (-1, &[0, 2])]),
    ];
    let a = arith();
    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(2, MonomialOrder::DegRevLex, 7, &input).unwrap();
    let mut pairset = Pairset::new();
    let mut params = AlgorithmParams::new(7);
    params.reduced = false;
    f4(&mut basis, &mut pairset, &mut ht, &a, &params, None).unwrap();

    let gb = export_basis(&basis, &ht);
    let leads: Vec<Vec<u32>> = gb.iter().map(|(m, _)| m[0].clone()).collect();
    assert_eq!(leads, vec![vec![0, 2], vec![1, 1], vec![2, 0]]);
}

#[test]
fn test_randomized_backend_agrees() {
    use crate::params::LinalgBackend;

    let input = vec![
        poly(&[(1, &[1, 0, 0]), (1, &[0, 1, 0]), (1, &[0, 0, 1])]),
        poly(&[(1, &[1, 1, 0]), (1, &[1, 0, 1]), (1, &[0, 1, 1])]),
        poly(&[(1, &[1, 1, 1]), (-1, &[0, 0, 0])]),
    ];
    let a = arith();

    let deterministic = groebner(3, &input, 42);

    let (mut ht, mut basis, _) =
        initialize::<PackedMonomial, _>(3, MonomialOrder::DegRevLex, 42, &input).unwrap();
    let mut pairset = Pairset::new();
    let mut params = AlgorithmParams::new(42);
    params.linalg = LinalgBackend::Randomized;
    f4(&mut basis, &mut pairset, &mut ht, &a, &params, None).unwrap();

    assert_eq!(export_basis(&basis, &ht), deterministic);
}
