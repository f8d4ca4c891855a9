//! Homogenization support.
//!
//! For non-graded orderings the engine first computes the basis of the
//! homogenized ideal (one fresh variable, appended last), dehomogenizes,
//! and recomputes in the original ring to restore the Gröbner property.

use quartus_f4::ExchangePoly;
use quartus_monomial::MonomialOrder;

/// Extends the ordering to the ring with the homogenizing variable.
pub(crate) fn extend_ordering(ordering: &MonomialOrder) -> MonomialOrder {
    match ordering {
        MonomialOrder::Weighted(w) => {
            let mut w = w.clone();
            w.push(1);
            MonomialOrder::Weighted(w)
        }
        other => other.clone(),
    }
}

/// Homogenizes each polynomial with an appended variable lifting every
/// term to the polynomial's top degree.
pub(crate) fn homogenize<C: Clone>(polys: &[ExchangePoly<C>]) -> Vec<ExchangePoly<C>> {
    polys
        .iter()
        .map(|(monoms, coeffs)| {
            let top = monoms
                .iter()
                .map(|m| m.iter().map(|&e| e as u64).sum::<u64>())
                .max()
                .unwrap_or(0);
            let lifted = monoms
                .iter()
                .map(|m| {
                    let deg: u64 = m.iter().map(|&e| e as u64).sum();
                    let mut m = m.clone();
                    m.push((top - deg) as u32);
                    m
                })
                .collect();
            (lifted, coeffs.clone())
        })
        .collect()
}

/// Sets the homogenizing variable to 1: strips the last exponent and
/// merges terms that collide, dropping cancellations.
pub(crate) fn dehomogenize<C: Clone>(
    polys: Vec<ExchangePoly<C>>,
    add: impl Fn(&C, &C) -> C,
    is_zero: impl Fn(&C) -> bool,
) -> Vec<ExchangePoly<C>> {
    polys
        .into_iter()
        .filter_map(|(monoms, coeffs)| {
            let mut ms: Vec<Vec<u32>> = Vec::with_capacity(monoms.len());
            let mut cs: Vec<C> = Vec::with_capacity(coeffs.len());
            for (mut m, c) in monoms.into_iter().zip(coeffs) {
                m.pop();
                match ms.iter().position(|seen| *seen == m) {
                    Some(k) => cs[k] = add(&cs[k], &c),
                    None => {
                        ms.push(m);
                        cs.push(c);
                    }
                }
            }

            let mut out_m = Vec::with_capacity(ms.len());
            let mut out_c = Vec::with_capacity(cs.len());
            for (m, c) in ms.into_iter().zip(cs) {
                if !is_zero(&c) {
                    out_m.push(m);
                    out_c.push(c);
                }
            }
            if out_m.is_empty() {
                None
            } else {
                Some((out_m, out_c))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_homogenize_lifts_to_top_degree() {
        // x^2 + y + 1 becomes x^2 + y h + h^2.
        let polys = vec![(vec![vec![2, 0], vec![0, 1], vec![0, 0]], vec![1u64, 1, 1])];
        let hom = homogenize(&polys);
        assert_eq!(hom[0].0, vec![vec![2, 0, 0], vec![0, 1, 1], vec![0, 0, 2]]);
    }

    #[test]
    fn test_dehomogenize_merges_and_cancels() {
        // x h + x - y over F_7: terms x h and x merge to 2x.
        let polys = vec![(
            vec![vec![1, 1], vec![1, 0], vec![0, 1]],
            vec![1u64, 1, 6],
        )];
        let out = dehomogenize(polys, |a, b| (a + b) % 7, |c| *c == 0);
        assert_eq!(out, vec![(vec![vec![1], vec![0]], vec![2u64, 6])]);
    }

    #[test]
    fn test_dehomogenize_drops_vanishing_polynomials() {
        // x h - x cancels entirely.
        let polys = vec![(vec![vec![1, 1], vec![1, 0]], vec![1u64, 6])];
        let out = dehomogenize(polys, |a, b| (a + b) % 7, |c| *c == 0);
        assert!(out.is_empty());
    }
}
