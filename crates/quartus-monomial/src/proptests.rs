//! Property-based tests for monomial representations.

use proptest::prelude::*;
use std::cmp::Ordering;

use crate::dense::DenseMonomial;
use crate::divmask::DivMap;
use crate::monomial::Monomial;
use crate::ordering::MonomialOrder;
use crate::packed::PackedMonomial;

fn small_exps() -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(0u32..50, 4)
}

proptest! {
    #[test]
    fn packed_and_dense_agree_on_degrevlex(a in small_exps(), b in small_exps()) {
        let ord = MonomialOrder::DegRevLex;
        let pa = PackedMonomial::from_exponents(&a).unwrap();
        let pb = PackedMonomial::from_exponents(&b).unwrap();
        let da = DenseMonomial::from_exponents(&a).unwrap();
        let db = DenseMonomial::from_exponents(&b).unwrap();
        prop_assert_eq!(pa.compare(&pb, &ord), da.compare(&db, &ord));
    }

    #[test]
    fn packed_and_dense_agree_on_divisibility(a in small_exps(), b in small_exps()) {
        let pa = PackedMonomial::from_exponents(&a).unwrap();
        let pb = PackedMonomial::from_exponents(&b).unwrap();
        let da = DenseMonomial::from_exponents(&a).unwrap();
        let db = DenseMonomial::from_exponents(&b).unwrap();
        prop_assert_eq!(pa.is_divisible_by(&pb), da.is_divisible_by(&db));
    }

    #[test]
    fn ordering_respects_multiplication(a in small_exps(), b in small_exps(), c in small_exps()) {
        // a < b implies a*c < b*c for every monomial ordering.
        for ord in [MonomialOrder::Lex, MonomialOrder::DegLex, MonomialOrder::DegRevLex] {
            let da = DenseMonomial::from_exponents(&a).unwrap();
            let db = DenseMonomial::from_exponents(&b).unwrap();
            let dc = DenseMonomial::from_exponents(&c).unwrap();
            let before = da.compare(&db, &ord);
            let after = da
                .checked_mul(&dc)
                .unwrap()
                .compare(&db.checked_mul(&dc).unwrap(), &ord);
            prop_assert_eq!(before, after);
        }
    }

    #[test]
    fn lcm_is_an_upper_bound(a in small_exps(), b in small_exps()) {
        let da = DenseMonomial::from_exponents(&a).unwrap();
        let db = DenseMonomial::from_exponents(&b).unwrap();
        let l = da.checked_lcm(&db).unwrap();
        prop_assert!(l.is_divisible_by(&da));
        prop_assert!(l.is_divisible_by(&db));
    }

    #[test]
    fn divmask_never_rejects_a_divisor(a in small_exps(), b in small_exps()) {
        let map = DivMap::new(4, &[(0, 10), (0, 10), (0, 10), (0, 10)]);
        let da = DenseMonomial::from_exponents(&a).unwrap();
        let db = DenseMonomial::from_exponents(&b).unwrap();
        if db.is_divisible_by(&da) {
            prop_assert!(da.divmask(&map).may_divide(db.divmask(&map)));
        }
    }

    #[test]
    fn quotient_inverts_product(a in small_exps(), b in small_exps()) {
        let da = DenseMonomial::from_exponents(&a).unwrap();
        let db = DenseMonomial::from_exponents(&b).unwrap();
        let ab = da.checked_mul(&db).unwrap();
        prop_assert_eq!(ab.div_exact(&db), da);

        let pa = PackedMonomial::from_exponents(&a).unwrap();
        let pb = PackedMonomial::from_exponents(&b).unwrap();
        let pab = pa.checked_mul(&pb).unwrap();
        prop_assert_eq!(pab.div_exact(&pb), pa);
    }

    #[test]
    fn compare_is_total(a in small_exps(), b in small_exps()) {
        let ord = MonomialOrder::DegRevLex;
        let da = DenseMonomial::from_exponents(&a).unwrap();
        let db = DenseMonomial::from_exponents(&b).unwrap();
        match da.compare(&db, &ord) {
            Ordering::Equal => prop_assert_eq!(&a, &b),
            Ordering::Less => prop_assert_eq!(db.compare(&da, &ord), Ordering::Greater),
            Ordering::Greater => prop_assert_eq!(db.compare(&da, &ord), Ordering::Less),
        }
    }
}
