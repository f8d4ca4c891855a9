//! Coefficient arithmetic for Gröbner basis computation.
//!
//! This crate provides the number-theoretic substrate of the engine:
//! arbitrary-precision integers and rationals, runtime-prime modular
//! backends behind the [`Arithmetic`] trait, Chinese remaindering,
//! rational reconstruction, and prime streams.

pub mod arithmetic;
pub mod integer;
pub mod modular;
pub mod primes;
pub mod rational;

#[cfg(test)]
mod proptests;

pub use arithmetic::{Arithmetic, RationalArithmetic};
pub use integer::{crt_inverse, inv_mod_u64, Integer};
pub use modular::{
    BarrettArithmetic, CompositeArithmetic, DelayedArithmetic, FloatingArithmetic,
    COMPOSITE_LANES,
};
pub use primes::{is_prime_u64, PrimeSequence};
pub use rational::{rational_reconstruct, Rational};
