//! Multi-modular Gröbner basis computation over the rationals.
//!
//! The F4 engine only ever runs over prime fields; this crate drives it
//! across a stream of lucky primes and lifts the results back to ℚ via
//! Chinese remaindering and rational reconstruction, with a majority
//! vote against unlucky primes and randomized (optionally certified)
//! verification of the reconstructed basis.

pub mod driver;
pub mod reconstruct;

pub use driver::{groebner_rational, DriverOptions, ModularStrategy};
pub use reconstruct::CrtAccumulator;
