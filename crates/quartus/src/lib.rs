//! # quartus
//!
//! Gröbner bases of multivariate polynomial ideals via the F4 algorithm,
//! over prime fields and the rationals.
//!
//! The engine reduces Macaulay matrices built from packed monomials and
//! a divmask-filtered hashtable; rational inputs run through a
//! multi-modular driver (lucky primes, CRT, rational reconstruction)
//! that can learn the structure of one run and replay it per prime.
//!
//! ## Quick start
//!
//! ```rust
//! use quartus::{groebner, GroebnerOptions, PolyRing, Polynomial};
//!
//! // {y, xy + x} over F_7: the reduced basis is {y, x}.
//! let ring = PolyRing::prime_field(2, 7);
//! let polys = vec![
//!     Polynomial::new(vec![vec![0, 1]], vec![1u64]).unwrap(),
//!     Polynomial::new(vec![vec![1, 1], vec![1, 0]], vec![1u64, 1]).unwrap(),
//! ];
//! let basis = groebner(&ring, &polys, &GroebnerOptions::default()).unwrap();
//! assert_eq!(basis.len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod api;
mod dispatch;
mod error;
mod homogenize;
mod io;
mod options;


pub use api::{groebner, groebner_apply, groebner_learn, is_groebner, normal_form, Coefficient, LearnedTrace};
pub use error::GroebnerError;
pub use io::{rational, PolyRing, Polynomial};
pub use options::{
    ArithmeticBackend, GroebnerOptions, Homogenize, LinearAlgebra, MonomialRepr, Threaded,
};

pub use quartus_arith::Rational;
pub use quartus_f4::SelectionStrategy;
pub use quartus_modular::ModularStrategy;
pub use quartus_monomial::MonomialOrder;
