//! Critical pair selection.
//!
//! The normal strategy: take the whole minimum-degree block, ordered by
//! lcm under the monomial ordering with `(poly1, poly2)` as tiebreaker.
//! A `maxpairs` cap cuts the block but always extends to the end of the
//! lcm class it lands in, so no class is ever split across matrices.

use quartus_arith::Arithmetic;
use quartus_monomial::Monomial;

use crate::basis::Basis;
use crate::error::EngineError;
use crate::hashtable::MonomialHashtable;
use crate::matrix::{push_multiple_of, MacaulayMatrix};
use crate::pairset::{Pairset, SPair};

/// Removes and returns the minimum-degree block, sorted by
/// `(lcm, poly1, poly2)`. Trace application calls this to keep the
/// pairset in step while skipping matrix construction.
pub fn select_critical_pairs<M: Monomial>(
    pairset: &mut Pairset,
    ht: &MonomialHashtable<M>,
    maxpairs: usize,
) -> Vec<SPair> {
    let Some(deg) = pairset.min_degree() else {
        return Vec::new();
    };

    let mut block: Vec<usize> = (0..pairset.pairs.len())
        .filter(|&k| pairset.pairs[k].deg == deg)
        .collect();
    block.sort_by(|&a, &b| {
        let (pa, pb) = (&pairset.pairs[a], &pairset.pairs[b]);
        ht.cmp(pa.lcm, pb.lcm)
            .then_with(|| pa.poly1.cmp(&pb.poly1))
            .then_with(|| pa.poly2.cmp(&pb.poly2))
    });

    if maxpairs > 0 && block.len() > maxpairs {
        // Extend past the cap until the current lcm class ends.
        let last_lcm = pairset.pairs[block[maxpairs - 1]].lcm;
        let mut end = maxpairs;
        while end < block.len() && pairset.pairs[block[end]].lcm == last_lcm {
            end += 1;
        }
        block.truncate(end);
    }

    let selected: Vec<SPair> = block.iter().map(|&k| pairset.pairs[k]).collect();
    for &k in &block {
        pairset.pairs[k].lcm = 0;
    }
    pairset.compact();
    selected
}

/// Converts a selected block into matrix rows.
///
/// For each distinct lcm, the lowest-indexed polynomial of the class
/// becomes the one upper (reducer) row and every other polynomial of the
/// class contributes a lower row. S-polynomials of the class are exactly
/// the pairwise differences of these rows.
pub fn block_to_rows<M: Monomial, A: Arithmetic>(
    selected: &[SPair],
    basis: &Basis<A>,
    ht: &MonomialHashtable<M>,
    symbol_ht: &mut MonomialHashtable<M>,
    matrix: &mut MacaulayMatrix<M, A>,
) -> Result<(), EngineError> {
    let mut k = 0;
    while k < selected.len() {
        let lcm = selected[k].lcm;
        let mut polys: Vec<usize> = Vec::new();
        while k < selected.len() && selected[k].lcm == lcm {
            for p in [selected[k].poly1 as usize, selected[k].poly2 as usize] {
                if !polys.contains(&p) {
                    polys.push(p);
                }
            }
            k += 1;
        }
        polys.sort_unstable();

        push_multiple_of(matrix, true, polys[0], lcm, basis, ht, symbol_ht)?;
        for &p in &polys[1..] {
            push_multiple_of(matrix, false, p, lcm, basis, ht, symbol_ht)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quartus_arith::BarrettArithmetic;
    use quartus_monomial::{DivMap, MonomialOrder, PackedMonomial};

    fn ht() -> MonomialHashtable<PackedMonomial> {
        let divmap = DivMap::new(2, &[(0, 4), (0, 4)]);
        MonomialHashtable::new(2, MonomialOrder::DegRevLex, divmap, 5)
    }

    fn pair(ht: &mut MonomialHashtable<PackedMonomial>, p1: u32, p2: u32, exps: &[u32]) -> SPair {
        let m = PackedMonomial::from_exponents(exps).unwrap();
        let deg = m.total_degree();
        SPair {
            poly1: p1,
            poly2: p2,
            lcm: ht.insert(m),
            deg,
        }
    }

    #[test]
    fn test_minimum_degree_block() {
        let mut table = ht();
        let mut pairset = Pairset::new();
        pairset.pairs.push(pair(&mut table, 0, 1, &[2, 2]));
        pairset.pairs.push(pair(&mut table, 0, 2, &[1, 1]));
        pairset.pairs.push(pair(&mut table, 1, 2, &[2, 0]));

        let block = select_critical_pairs(&mut pairset, &table, 0);

        // Only the degree-2 pairs are taken.
        assert_eq!(block.len(), 2);
        assert!(block.iter().all(|p| p.deg == 2));
        assert_eq!(pairset.len(), 1);
    }

    #[test]
    fn test_cap_extends_to_class_boundary() {
        let mut table = ht();
        let mut pairset = Pairset::new();
        // Three pairs sharing one lcm, one with another.
        pairset.pairs.push(pair(&mut table, 0, 1, &[1, 1]));
        pairset.pairs.push(pair(&mut table, 0, 2, &[1, 1]));
        pairset.pairs.push(pair(&mut table, 1, 2, &[1, 1]));
        pairset.pairs.push(pair(&mut table, 0, 3, &[2, 0]));

        let block = select_critical_pairs(&mut pairset, &table, 2);

        // The cap of 2 lands inside the xy class, so all three xy pairs
        // are selected; the x^2 class stays behind.
        assert_eq!(block.len(), 3);
        assert!(block.iter().all(|p| table.monom(p.lcm).exponents() == vec![1, 1]));
        assert_eq!(pairset.len(), 1);
    }

    #[test]
    fn test_block_is_sorted_deterministically() {
        let mut table = ht();
        let mut pairset = Pairset::new();
        pairset.pairs.push(pair(&mut table, 1, 3, &[2, 0]));
        pairset.pairs.push(pair(&mut table, 0, 2, &[0, 2]));
        pairset.pairs.push(pair(&mut table, 0, 1, &[2, 0]));

        let block = select_critical_pairs(&mut pairset, &table, 0);

        // degrevlex: x^2 > y^2, ascending order puts y^2 first; ties on
        // the lcm break by (poly1, poly2).
        assert_eq!(block[0].lcm, pairset_lcm(&table, &[0, 2]));
        assert_eq!((block[1].poly1, block[1].poly2), (0, 1));
        assert_eq!((block[2].poly1, block[2].poly2), (1, 3));
    }

    fn pairset_lcm(ht: &MonomialHashtable<PackedMonomial>, exps: &[u32]) -> u32 {
        for id in 1..ht.len() as u32 {
            if ht.monom(id).exponents() == exps {
                return id;
            }
        }
        unreachable!()
    }
}
