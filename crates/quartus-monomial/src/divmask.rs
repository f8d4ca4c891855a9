//! Divisibility masks.
//!
//! A divmask compresses an exponent vector into a 32-bit filter: bit
//! (v, t) is set when variable v has exponent at least the t-th threshold.
//! If a divides b then every bit of a's mask is also set in b's mask, so a
//! single AND-NOT rejects most non-divisors before the exact lane test.

/// Width of a divmask in bits.
pub const DIVMASK_BITS: usize = 32;

/// A one-word divisibility filter.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct DivMask(u32);

impl DivMask {
    /// The empty mask (monomial 1, or an unmasked entry).
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Creates a mask from raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Returns false when `self` certainly does not divide `other`.
    ///
    /// A true result is only a "maybe": the caller must follow up with the
    /// exact componentwise test.
    #[inline]
    #[must_use]
    pub const fn may_divide(self, other: DivMask) -> bool {
        self.0 & !other.0 == 0
    }
}

/// Per-variable exponent thresholds backing divmask construction.
///
/// The 32 mask bits are split evenly over the first `min(nvars, 32)`
/// variables; each variable gets thresholds spread over its observed
/// exponent range. Primary and secondary hashtables must share one map so
/// their masks stay comparable.
#[derive(Clone, Debug)]
pub struct DivMap {
    nvars: usize,
    /// Number of masked variables.
    ndivvars: usize,
    /// Bits (thresholds) per masked variable.
    ndivbits: usize,
    /// Thresholds, `ndivvars * ndivbits` entries, variable-major.
    thresholds: Vec<u32>,
}

impl DivMap {
    /// Builds a threshold map from observed per-variable exponent ranges.
    ///
    /// `ranges[v]` is the `(min, max)` exponent of variable `v` over the
    /// input monomials. Thresholds are spaced evenly inside each range;
    /// degenerate ranges fall back to unit steps so every mask bit keeps a
    /// meaning.
    #[must_use]
    pub fn new(nvars: usize, ranges: &[(u32, u32)]) -> Self {
        assert_eq!(ranges.len(), nvars, "one range per variable");
        let ndivvars = nvars.min(DIVMASK_BITS);
        let ndivbits = if ndivvars == 0 {
            0
        } else {
            DIVMASK_BITS / ndivvars
        };

        let mut thresholds = Vec::with_capacity(ndivvars * ndivbits);
        for v in 0..ndivvars {
            let (lo, hi) = ranges[v];
            let span = hi.saturating_sub(lo).max(ndivbits as u32);
            for t in 0..ndivbits {
                // Strictly positive and increasing within the variable.
                let step = lo as u64 + 1 + (span as u64 * t as u64) / ndivbits.max(1) as u64;
                thresholds.push(step.min(u32::MAX as u64) as u32);
            }
        }

        Self {
            nvars,
            ndivvars,
            ndivbits,
            thresholds,
        }
    }

    /// Number of variables of the ambient ring.
    #[must_use]
    pub fn nvars(&self) -> usize {
        self.nvars
    }

    /// Number of masked variables.
    #[must_use]
    pub fn ndivvars(&self) -> usize {
        self.ndivvars
    }

    /// Thresholds per masked variable.
    #[must_use]
    pub fn ndivbits(&self) -> usize {
        self.ndivbits
    }

    /// The `t`-th threshold of masked variable `v`.
    #[must_use]
    pub fn threshold(&self, v: usize, t: usize) -> u32 {
        self.thresholds[v * self.ndivbits + t]
    }

    /// Computes the mask of an exponent vector.
    #[must_use]
    pub fn mask_of(&self, exps: &[u32]) -> DivMask {
        debug_assert_eq!(exps.len(), self.nvars);
        let mut bits = 0u32;
        let mut bit = 0;
        for v in 0..self.ndivvars {
            for t in 0..self.ndivbits {
                if exps[v] >= self.thresholds[v * self.ndivbits + t] {
                    bits |= 1 << bit;
                }
                bit += 1;
            }
        }
        DivMask::from_bits(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_monotone_in_divisibility() {
        let map = DivMap::new(3, &[(0, 5), (0, 5), (0, 5)]);

        let a = map.mask_of(&[1, 0, 2]); // divides b
        let b = map.mask_of(&[2, 1, 2]);
        assert!(a.may_divide(b));

        let c = map.mask_of(&[0, 4, 0]); // does not divide b
        assert!(!c.may_divide(b));
    }

    #[test]
    fn test_one_has_empty_mask() {
        let map = DivMap::new(2, &[(0, 3), (0, 3)]);
        assert_eq!(map.mask_of(&[0, 0]), DivMask::empty());
    }

    #[test]
    fn test_many_variables_share_bits() {
        let ranges: Vec<(u32, u32)> = (0..40).map(|_| (0, 2)).collect();
        let map = DivMap::new(40, &ranges);
        assert_eq!(map.ndivvars(), 32);
        assert_eq!(map.ndivbits(), 1);
        let mask = map.mask_of(&vec![2; 40]);
        assert_ne!(mask, DivMask::empty());
    }
}
