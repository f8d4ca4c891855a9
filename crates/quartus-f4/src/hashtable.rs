//! The monomial hashtable.
//!
//! Interns monomials into stable small integer identifiers. The table is
//! open-addressed with a power-of-two capacity; the stored hash is linear
//! in the exponents (`hash(a·b) = hash(a) + hash(b)` wrapping), so product
//! hashes are additions and growth never re-multiplies.
//!
//! One *primary* table lives for the whole computation (basis monomials,
//! pair lcms). A fresh *secondary* table is created per F4 iteration for
//! symbolic preprocessing; it shares the primary's weight vector, ordering
//! and divmap, so hashes and comparisons are cross-compatible, but
//! identifiers are not transferable between tables.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::cmp::Ordering;

use quartus_monomial::{DivMap, DivMask, Monomial, MonomialOrder};

/// Identifier of an interned monomial. 0 is reserved and never assigned;
/// the pairset uses it as a tombstone.
pub type MonomId = u32;

/// Scratch column state used during symbolic preprocessing.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ColumnFlag {
    /// Known to have no reducer.
    NonPivot,
    /// Not yet examined.
    #[default]
    UnknownPivot,
    /// A reducer row with this leading monomial is registered.
    Pivot,
}

/// Per-identifier record.
#[derive(Clone, Copy, Debug)]
pub struct Hashvalue {
    /// Linear hash of the exponent vector.
    pub hash: u64,
    /// Divisibility prefilter bits.
    pub divmask: DivMask,
    /// Total degree.
    pub deg: u64,
    /// Symbolic-preprocessing scratch state.
    pub flag: ColumnFlag,
}

const INITIAL_CAPACITY: usize = 1 << 12;

/// Open-addressed monomial interning table.
pub struct MonomialHashtable<M> {
    /// Monomials by identifier; slot 0 is a placeholder.
    monoms: Vec<M>,
    /// Parallel per-identifier records.
    hashdata: Vec<Hashvalue>,
    /// Probe table: hash slot → identifier, 0 = empty.
    slots: Vec<MonomId>,
    /// `slots.len() - 1`; capacity is a power of two.
    mask: u64,
    nvars: usize,
    ordering: MonomialOrder,
    divmap: DivMap,
    /// Random hash weights, one per variable.
    weights: Vec<u64>,
}

impl<M: Monomial> MonomialHashtable<M> {
    /// Creates a primary table.
    ///
    /// # Panics
    ///
    /// Panics if the placeholder identity monomial cannot be built, which
    /// would mean `nvars` exceeds the representation limit; the dispatch
    /// layer checks that before constructing a table.
    #[must_use]
    pub fn new(nvars: usize, ordering: MonomialOrder, divmap: DivMap, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let weights: Vec<u64> = (0..nvars).map(|_| rng.gen()).collect();
        Self::with_parts(nvars, ordering, divmap, weights)
    }

    /// Creates a secondary table sharing this table's weights, ordering
    /// and divmap. Identifiers start fresh.
    #[must_use]
    pub fn secondary(&self) -> Self {
        Self::with_parts(
            self.nvars,
            self.ordering.clone(),
            self.divmap.clone(),
            self.weights.clone(),
        )
    }

    fn with_parts(
        nvars: usize,
        ordering: MonomialOrder,
        divmap: DivMap,
        weights: Vec<u64>,
    ) -> Self {
        let one = M::from_exponents(&vec![0; nvars]).expect("identity monomial");
        Self {
            monoms: vec![one],
            hashdata: vec![Hashvalue {
                hash: 0,
                divmask: DivMask::empty(),
                deg: 0,
                flag: ColumnFlag::default(),
            }],
            slots: vec![0; INITIAL_CAPACITY],
            mask: INITIAL_CAPACITY as u64 - 1,
            nvars,
            ordering,
            divmap,
            weights,
        }
    }

    /// Number of assigned identifiers plus the reserved slot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.monoms.len()
    }

    /// Returns true if no monomial has been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monoms.len() == 1
    }

    /// Number of variables.
    #[must_use]
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    /// The monomial ordering shared by comparisons in this table.
    #[must_use]
    pub fn ordering(&self) -> &MonomialOrder {
        &self.ordering
    }

    /// The divmask threshold map.
    #[must_use]
    pub fn divmap(&self) -> &DivMap {
        &self.divmap
    }

    /// The monomial behind an identifier.
    #[must_use]
    pub fn monom(&self, id: MonomId) -> &M {
        &self.monoms[id as usize]
    }

    /// The per-identifier record.
    #[must_use]
    pub fn hashvalue(&self, id: MonomId) -> &Hashvalue {
        &self.hashdata[id as usize]
    }

    /// Total degree of an interned monomial.
    #[must_use]
    pub fn deg(&self, id: MonomId) -> u64 {
        self.hashdata[id as usize].deg
    }

    /// Sets the symbolic-preprocessing flag of an identifier.
    pub fn set_flag(&mut self, id: MonomId, flag: ColumnFlag) {
        self.hashdata[id as usize].flag = flag;
    }

    /// Compares two interned monomials under the table ordering.
    #[must_use]
    pub fn cmp(&self, a: MonomId, b: MonomId) -> Ordering {
        self.monoms[a as usize].compare(&self.monoms[b as usize], &self.ordering)
    }

    /// Linear hash of an arbitrary monomial under this table's weights.
    #[must_use]
    pub fn hash_of(&self, m: &M) -> u64 {
        m.weighted_hash(&self.weights)
    }

    /// Interns a monomial, computing its hash.
    pub fn insert(&mut self, m: M) -> MonomId {
        let hash = m.weighted_hash(&self.weights);
        self.insert_with_hash(m, hash)
    }

    /// Interns a monomial whose linear hash the caller already knows.
    ///
    /// Symbolic preprocessing inserts products `mult · t` here with
    /// `hash = hash(mult) + hash(t)`, skipping the inner product.
    pub fn insert_with_hash(&mut self, m: M, hash: u64) -> MonomId {
        debug_assert_eq!(hash, m.weighted_hash(&self.weights));
        self.ensure_capacity(1);

        let mut slot = hash & self.mask;
        loop {
            let id = self.slots[slot as usize];
            if id == 0 {
                let new_id = self.monoms.len() as MonomId;
                let divmask = m.divmask(&self.divmap);
                let deg = m.total_degree();
                self.slots[slot as usize] = new_id;
                self.monoms.push(m);
                self.hashdata.push(Hashvalue {
                    hash,
                    divmask,
                    deg,
                    flag: ColumnFlag::default(),
                });
                return new_id;
            }
            if self.hashdata[id as usize].hash == hash && self.monoms[id as usize] == m {
                return id;
            }
            slot = (slot + 1) & self.mask;
        }
    }

    /// Grows the probe table until `extra` more insertions keep the load
    /// below half of the capacity.
    pub fn ensure_capacity(&mut self, extra: usize) {
        while (self.monoms.len() + extra) * 2 > self.slots.len() {
            self.grow();
        }
    }

    fn grow(&mut self) {
        let new_capacity = self.slots.len() * 2;
        self.mask = new_capacity as u64 - 1;
        self.slots = vec![0; new_capacity];
        // Stored hashes make rehashing a pure re-probe.
        for id in 1..self.monoms.len() {
            let mut slot = self.hashdata[id].hash & self.mask;
            while self.slots[slot as usize] != 0 {
                slot = (slot + 1) & self.mask;
            }
            self.slots[slot as usize] = id as MonomId;
        }
    }
}
