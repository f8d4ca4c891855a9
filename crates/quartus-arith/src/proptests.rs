//! Property-based tests for the arithmetic backends.

use proptest::prelude::*;

use crate::arithmetic::Arithmetic;
use crate::integer::{crt_inverse, Integer};
use crate::modular::{BarrettArithmetic, DelayedArithmetic};
use crate::rational::{rational_reconstruct, Rational};

const P: u64 = 2_147_483_647; // 2^31 - 1

fn elem() -> impl Strategy<Value = u64> {
    0..P
}

proptest! {
    #[test]
    fn barrett_mul_matches_naive(a in elem(), b in elem()) {
        let f = BarrettArithmetic::new(P);
        prop_assert_eq!(f.mul(&a, &b), (a as u128 * b as u128 % P as u128) as u64);
    }

    #[test]
    fn backends_agree(a in elem(), b in elem()) {
        let f = BarrettArithmetic::new(P);
        let d = DelayedArithmetic::new(P);
        prop_assert_eq!(f.add(&a, &b), d.add(&a, &b));
        prop_assert_eq!(f.sub(&a, &b), d.sub(&a, &b));
        prop_assert_eq!(f.mul(&a, &b), d.mul(&a, &b));
    }

    #[test]
    fn delayed_accumulator_matches_immediate(
        start in elem(),
        pairs in proptest::collection::vec((elem(), elem()), 0..32),
    ) {
        let f = BarrettArithmetic::new(P);
        let d = DelayedArithmetic::new(P);

        let mut acc_f = f.acc_from(&start);
        let mut acc_d = d.acc_from(&start);
        for (a, b) in &pairs {
            f.acc_sub_mul(&mut acc_f, a, b);
            d.acc_sub_mul(&mut acc_d, a, b);
        }
        prop_assert_eq!(f.acc_reduce(&acc_f), d.acc_reduce(&acc_d));
    }

    #[test]
    fn inverse_is_inverse(a in 1..P) {
        let f = BarrettArithmetic::new(P);
        prop_assert_eq!(f.mul(&a, &f.inv(&a)), 1);
    }

    #[test]
    fn crt_then_reconstruct(n in -1000i64..1000, d in 1i64..60) {
        let q = Rational::new(Integer::new(n), Integer::new(d));
        let (p1, p2) = (1_000_003u64, 1_000_033u64);
        prop_assume!(d as u64 % p1 != 0 && d as u64 % p2 != 0);

        let r1 = q.rem_u64(p1).unwrap();
        let r2 = q.rem_u64(p2).unwrap();

        let m1 = Integer::from(p1);
        let a = Integer::from(r1).crt(&m1, r2, p2, crt_inverse(&m1, p2));
        let m = m1 * Integer::from(p2);

        prop_assert_eq!(rational_reconstruct(&a, &m), Some(q));
    }
}
