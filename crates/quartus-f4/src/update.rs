//! Basis and pairset update (Gebauer–Möller).
//!
//! After an F4 iteration appends new polynomials, this pass creates their
//! critical pairs, prunes the pairset with the Gebauer–Möller criteria,
//! and maintains the redundancy marks of the basis.

use quartus_arith::Arithmetic;
use quartus_monomial::Monomial;

use crate::basis::Basis;
use crate::error::EngineError;
use crate::hashtable::MonomialHashtable;
use crate::pairset::{Pairset, SPair};

/// Runs the update for every polynomial appended since the last pass.
pub fn update<M: Monomial, A: Arithmetic>(
    basis: &mut Basis<A>,
    pairset: &mut Pairset,
    ht: &mut MonomialHashtable<M>,
) -> Result<(), EngineError> {
    for i in basis.nprocessed..basis.nfilled() {
        process_new_polynomial(basis, pairset, ht, i)?;
    }
    basis.nprocessed = basis.nfilled();
    Ok(())
}

fn process_new_polynomial<M: Monomial, A: Arithmetic>(
    basis: &mut Basis<A>,
    pairset: &mut Pairset,
    ht: &mut MonomialHashtable<M>,
    i: usize,
) -> Result<(), EngineError> {
    let lead_i = basis.lead(i);
    let mask_i = ht.hashvalue(lead_i).divmask;
    let deg_i = ht.deg(lead_i);

    // A new polynomial whose lead is already covered is redundant. One
    // pair with the covering element is still required: its S-polynomial
    // carries the information the discarded lead would have contributed.
    for (k, &j) in basis.nonredundant.iter().enumerate() {
        let lead_j = basis.lead(j);
        if basis.lead_divmasks[k].may_divide(mask_i)
            && ht.monom(lead_i).is_divisible_by(ht.monom(lead_j))
        {
            pairset.pairs.push(SPair {
                poly1: j as u32,
                poly2: i as u32,
                lcm: lead_i,
                deg: deg_i,
            });
            basis.is_redundant[i] = true;
            return Ok(());
        }
    }

    // Candidate pairs (j, i) with every non-redundant element.
    struct Candidate<M> {
        poly1: usize,
        lcm: M,
        deg: u64,
        alive: bool,
    }

    let monom_i = ht.monom(lead_i).clone();
    let mut candidates: Vec<Candidate<M>> = Vec::with_capacity(basis.nonredundant.len());
    for &j in &basis.nonredundant {
        let lcm = ht.monom(basis.lead(j)).checked_lcm(&monom_i)?;
        let deg = lcm.total_degree();
        candidates.push(Candidate {
            poly1: j,
            lcm,
            deg,
            alive: true,
        });
    }

    // Gebauer–Möller among the candidates: a pair dies when another
    // candidate's lcm strictly divides its lcm.
    for a in 0..candidates.len() {
        for b in 0..candidates.len() {
            if a == b || !candidates[a].alive {
                continue;
            }
            if candidates[b].deg < candidates[a].deg
                && candidates[a].lcm.is_divisible_by(&candidates[b].lcm)
            {
                candidates[a].alive = false;
            }
        }
    }

    // Equal lcms: keep the lexicographically smallest (poly1, poly2).
    for a in 0..candidates.len() {
        if !candidates[a].alive {
            continue;
        }
        for b in (a + 1)..candidates.len() {
            if candidates[b].alive
                && candidates[b].deg == candidates[a].deg
                && candidates[b].lcm == candidates[a].lcm
            {
                candidates[b].alive = false;
            }
        }
    }

    // Product criterion: coprime leads reduce to zero on their own.
    for c in &mut candidates {
        if c.alive && c.deg == ht.deg(basis.lead(c.poly1)) + deg_i {
            c.alive = false;
        }
    }

    // Buchberger's lcm criterion against the existing pairset: an old
    // pair is dropped when the new lead divides its lcm and both mixed
    // lcms have strictly smaller degree.
    let exps_i = monom_i.exponents();
    for pair in &mut pairset.pairs {
        if pair.lcm == 0 {
            continue;
        }
        if !mask_i.may_divide(ht.hashvalue(pair.lcm).divmask)
            || !ht.monom(pair.lcm).is_divisible_by(&monom_i)
        {
            continue;
        }
        let d1 = lcm_degree(&ht.monom(basis.lead(pair.poly1 as usize)).exponents(), &exps_i);
        let d2 = lcm_degree(&ht.monom(basis.lead(pair.poly2 as usize)).exponents(), &exps_i);
        if pair.deg > d1.max(d2) {
            pair.lcm = 0;
        }
    }
    pairset.compact();

    // Older elements covered by the new lead become redundant.
    let mut any_superseded = false;
    for &j in &basis.nonredundant {
        let lead_j = basis.lead(j);
        if mask_i.may_divide(ht.hashvalue(lead_j).divmask)
            && ht.monom(lead_j).is_divisible_by(&monom_i)
        {
            basis.is_redundant[j] = true;
            any_superseded = true;
        }
    }
    if any_superseded {
        let retained: Vec<usize> = basis
            .nonredundant
            .iter()
            .copied()
            .filter(|&j| !basis.is_redundant[j])
            .collect();
        basis.lead_divmasks = retained
            .iter()
            .map(|&j| ht.hashvalue(basis.lead(j)).divmask)
            .collect();
        basis.nonredundant = retained;
    }

    // Surviving lcms are interned and the pairs recorded.
    for c in candidates {
        if !c.alive {
            continue;
        }
        let lcm = ht.insert(c.lcm);
        pairset.pairs.push(SPair {
            poly1: c.poly1 as u32,
            poly2: i as u32,
            lcm,
            deg: c.deg,
        });
    }

    basis.nonredundant.push(i);
    basis.lead_divmasks.push(mask_i);
    Ok(())
}

fn lcm_degree(a: &[u32], b: &[u32]) -> u64 {
    a.iter().zip(b).map(|(&x, &y)| x.max(y) as u64).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_arith::BarrettArithmetic;
    use quartus_monomial::{DivMap, MonomialOrder, PackedMonomial};

    fn setup() -> (
        MonomialHashtable<PackedMonomial>,
        Basis<BarrettArithmetic>,
        Pairset,
    ) {
        let divmap = DivMap::new(2, &[(0, 4), (0, 4)]);
        let ht = MonomialHashtable::new(2, MonomialOrder::DegRevLex, divmap, 3);
        (ht, Basis::new(), Pairset::new())
    }

    fn push(
        ht: &mut MonomialHashtable<PackedMonomial>,
        basis: &mut Basis<BarrettArithmetic>,
        exps: &[&[u32]],
    ) {
        let ids: Vec<_> = exps
            .iter()
            .map(|e| ht.insert(PackedMonomial::from_exponents(e).unwrap()))
            .collect();
        let coeffs = vec![1u64; ids.len()];
        basis.push_polynomial(ids, coeffs);
    }

    #[test]
    fn test_coprime_pair_is_pruned() {
        let (mut ht, mut basis, mut pairset) = setup();
        push(&mut ht, &mut basis, &[&[2, 0]]); // x^2
        push(&mut ht, &mut basis, &[&[0, 3]]); // y^3
        update(&mut basis, &mut pairset, &mut ht).unwrap();

        assert!(pairset.is_empty());
        assert_eq!(basis.nnonredundant(), 2);
    }

    #[test]
    fn test_overlapping_pair_survives() {
        let (mut ht, mut basis, mut pairset) = setup();
        push(&mut ht, &mut basis, &[&[2, 1]]); // x^2 y
        push(&mut ht, &mut basis, &[&[1, 2]]); // x y^2
        update(&mut basis, &mut pairset, &mut ht).unwrap();

        assert_eq!(pairset.len(), 1);
        let p = pairset.pairs[0];
        assert_eq!((p.poly1, p.poly2), (0, 1));
        assert_eq!(ht.monom(p.lcm).exponents(), vec![2, 2]);
        assert_eq!(p.deg, 4);
    }

    #[test]
    fn test_covered_new_polynomial_keeps_one_pair() {
        let (mut ht, mut basis, mut pairset) = setup();
        push(&mut ht, &mut basis, &[&[0, 1]]); // y
        push(&mut ht, &mut basis, &[&[1, 1], &[1, 0]]); // xy + x
        update(&mut basis, &mut pairset, &mut ht).unwrap();

        assert!(basis.is_redundant[1]);
        assert_eq!(basis.nnonredundant(), 1);
        // The pair (y, xy + x) survives so that x is not lost.
        assert_eq!(pairset.len(), 1);
        assert_eq!(ht.monom(pairset.pairs[0].lcm).exponents(), vec![1, 1]);
    }

    #[test]
    fn test_superseded_old_element_is_marked() {
        let (mut ht, mut basis, mut pairset) = setup();
        push(&mut ht, &mut basis, &[&[2, 0]]); // x^2
        update(&mut basis, &mut pairset, &mut ht).unwrap();
        push(&mut ht, &mut basis, &[&[1, 0]]); // x supersedes x^2
        update(&mut basis, &mut pairset, &mut ht).unwrap();

        assert!(basis.is_redundant[0]);
        assert!(!basis.is_redundant[1]);
        assert_eq!(basis.nonredundant, vec![1]);
    }
}
