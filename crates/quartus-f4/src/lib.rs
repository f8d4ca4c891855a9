//! The F4 Gröbner basis engine.
//!
//! Everything here works over interned monomials and a coefficient
//! arithmetic backend: the monomial hashtable assigns stable identifiers,
//! the basis and pairset evolve through Gebauer–Möller updates, and each
//! iteration reduces a Macaulay matrix built by pair selection plus
//! symbolic preprocessing. A learn/apply trace replays a run's discrete
//! decisions on structurally identical inputs.

pub mod basis;
pub mod error;
pub mod f4;
pub mod hashtable;
pub mod linalg;
pub mod matrix;
pub mod pairset;
pub mod params;
pub mod select;
pub mod symbolic;
pub mod trace;
pub mod update;

#[cfg(test)]
mod tests;

pub use basis::Basis;
pub use error::EngineError;
pub use f4::{
    export_basis, f4 as f4_compute, f4_apply, f4_is_groebner, f4_normal_form, initialize,
    ExchangePoly,
};
pub use hashtable::{ColumnFlag, Hashvalue, MonomId, MonomialHashtable};
pub use params::{AlgorithmParams, LinalgBackend, ResolvedSelection, SelectionStrategy};
pub use pairset::{Pairset, SPair};
pub use trace::Trace;
