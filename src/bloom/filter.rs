// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use std::f64::consts::LN_2;

use super::bitvec::BitVector;
use super::bitvec::WORD_BITS;
use crate::error::Error;
use crate::hash;

/// Largest bit count whose backing words are addressable on this platform.
const MAX_NUM_BITS: u64 = {
    let max_words = isize::MAX as u64 / (WORD_BITS / 8);
    if max_words > u64::MAX / WORD_BITS {
        u64::MAX - (WORD_BITS - 1)
    } else {
        max_words * WORD_BITS
    }
};

/// Upper bound on the probe rounds the planner produces. The smallest positive `f64`,
/// `2^-1074`, asks for `ceil(1074)` rounds; one more absorbs rounding in `ln`.
pub(super) const MAX_NUM_HASHES: u64 = 1075;

/// A fixed-capacity Bloom filter.
///
/// Provides membership queries with:
/// - No false negatives (added keys always report `true`)
/// - A false positive rate that approaches the configured probability as the filter fills up
/// - Constant space, chosen up front from the target item count and probability
///
/// Keys are opaque byte strings; anything that implements `AsRef<[u8]>` can be added or
/// queried, so `&str`, `String`, `&[u8]` and `Vec<u8>` all work directly.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Number of items the filter was planned for (N)
    pub(super) capacity: u64,
    /// Target false positive probability (P)
    pub(super) fpp: f64,
    /// Number of probe rounds per key (k)
    pub(super) hashes: u64,
    /// Count of bits set to 1
    pub(super) popcount: u64,
    pub(super) bits: BitVector,
}

/// Introspection snapshot returned by [`Filter::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterStats {
    /// Number of probe rounds per key.
    pub hashes: u64,
    /// Number of addressable bits.
    pub nbits: u64,
    /// Number of bits currently set to 1.
    pub popcount: u64,
}

impl Filter {
    /// Creates a filter sized for `n` items with false positive probability `p`.
    ///
    /// The bit count is `ceil(-n * ln(p) / ln(2)^2)` rounded up to a whole number of 64-bit
    /// words (at least one), and the number of probe rounds is `ceil(-log2(p))`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if `n`
    /// is negative, if `p` is not strictly between 0 and 1, or if the resulting bit vector is
    /// too large to address.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::Filter;
    /// let filter = Filter::new(1000, 0.01).unwrap();
    /// let stats = filter.stats();
    /// assert_eq!(stats.nbits, 9600);
    /// assert_eq!(stats.hashes, 7);
    ///
    /// assert!(Filter::new(-1, 0.01).is_err());
    /// ```
    pub fn new(n: i64, p: f64) -> Result<Self, Error> {
        let Ok(capacity) = u64::try_from(n) else {
            return Err(Error::invalid_argument("item count must not be negative")
                .with_context("n", n));
        };
        let nbits = Self::suggest_num_bits(capacity, p)?;
        let hashes = Self::suggest_num_hashes(p)?;

        Ok(Filter {
            capacity,
            fpp: p,
            hashes,
            popcount: 0,
            bits: BitVector::new(nbits),
        })
    }

    /// Suggests the number of bits for `n` items at false positive probability `p`.
    ///
    /// Formula: `m = ceil(-n * ln(p) / ln(2)^2)`, rounded up to a multiple of 64 and never
    /// less than 64.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::Filter;
    /// assert_eq!(Filter::suggest_num_bits(1000, 0.01).unwrap(), 9600); // ~9586 bits
    /// assert_eq!(Filter::suggest_num_bits(0, 0.01).unwrap(), 64);
    /// ```
    pub fn suggest_num_bits(n: u64, p: f64) -> Result<u64, Error> {
        check_fpp(p)?;
        let ln2_squared = LN_2 * LN_2;
        let bits = (-(n as f64) * p.ln() / ln2_squared).ceil();

        let too_large = || {
            Error::invalid_argument("filter needs more bits than this platform can address")
                .with_context("n", n)
                .with_context("p", p)
        };
        if bits > MAX_NUM_BITS as f64 {
            return Err(too_large());
        }
        let bits = (bits as u64).max(1);
        match bits.div_ceil(WORD_BITS).checked_mul(WORD_BITS) {
            Some(bits) if bits <= MAX_NUM_BITS => Ok(bits),
            _ => Err(too_large()),
        }
    }

    /// Suggests the number of probe rounds for false positive probability `p`.
    ///
    /// Formula: `k = ceil(-ln(p) / ln(2))`, never less than 1.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::Filter;
    /// assert_eq!(Filter::suggest_num_hashes(0.01).unwrap(), 7); // -log2(0.01) ≈ 6.64
    /// assert_eq!(Filter::suggest_num_hashes(0.9).unwrap(), 1);
    /// ```
    pub fn suggest_num_hashes(p: f64) -> Result<u64, Error> {
        check_fpp(p)?;
        let k = (-p.ln() / LN_2).ceil();
        Ok((k as u64).max(1))
    }

    /// Adds a key to the filter.
    ///
    /// After the call, [`has`](Self::has) reports `true` for the key for the lifetime of the
    /// filter.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::Filter;
    /// let mut filter = Filter::new(100, 0.01).unwrap();
    /// filter.add("apple");
    /// filter.add(b"raw bytes");
    /// filter.add(vec![1u8, 2, 3]);
    ///
    /// assert!(filter.has("apple"));
    /// assert!(filter.has([1u8, 2, 3]));
    /// ```
    pub fn add(&mut self, key: impl AsRef<[u8]>) {
        let nbits = self.bits.bit_len();
        for index in hash::probes(key.as_ref(), self.hashes, nbits) {
            if self.bits.set(index) {
                self.popcount += 1;
            }
        }
    }

    /// Tests whether a key is possibly in the filter.
    ///
    /// Returns:
    /// - `true`: the key was **possibly** added (or this is a false positive)
    /// - `false`: the key was **definitely not** added
    pub fn has(&self, key: impl AsRef<[u8]>) -> bool {
        if self.is_empty() {
            return false;
        }
        let nbits = self.bits.bit_len();
        hash::probes(key.as_ref(), self.hashes, nbits).all(|index| self.bits.get(index))
    }

    /// Estimates the number of distinct keys added.
    ///
    /// Uses `n = -(m/k) * ln(1 - X/m)` where `m` is the bit count, `k` the number of probe
    /// rounds and `X` the popcount, rounded half up. While the filter holds at most its planned
    /// capacity the estimate stays within a few percent of the true count.
    ///
    /// A saturated filter (every bit set) carries no information about its size; the estimate
    /// is undefined there and this method returns `u64::MAX`.
    pub fn size(&self) -> u64 {
        let nbits = self.bits.bit_len();
        if self.popcount >= nbits {
            return u64::MAX;
        }
        let m = nbits as f64;
        let k = self.hashes as f64;
        let x = self.popcount as f64;
        (-(m / k) * (1.0 - x / m).ln() + 0.5).floor() as u64
    }

    /// Estimates the current false positive probability.
    ///
    /// Based on the formula `(1 - e^(-k*n/m))^k` with `n` taken from [`size`](Self::size). It
    /// approaches 1 as the filter saturates.
    pub fn err_rate(&self) -> f64 {
        let k = self.hashes as f64;
        let n = self.size() as f64;
        let m = self.bits.bit_len() as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }

    /// Returns the number of probe rounds, the bit count and the popcount.
    pub fn stats(&self) -> FilterStats {
        FilterStats {
            hashes: self.hashes,
            nbits: self.bits.bit_len(),
            popcount: self.popcount,
        }
    }

    /// Returns the number of items the filter was planned for.
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Returns the target false positive probability the filter was planned for.
    pub fn fpp(&self) -> f64 {
        self.fpp
    }

    /// Returns whether no key has been added.
    pub fn is_empty(&self) -> bool {
        self.popcount == 0
    }

    /// Returns the fraction of bits set.
    pub fn load_factor(&self) -> f64 {
        self.popcount as f64 / self.bits.bit_len() as f64
    }

    /// Checks if two filters can be combined with [`union`](Self::union) or
    /// [`intersect`](Self::intersect).
    ///
    /// Filters are compatible if they have the same bit count and target probability, which
    /// in practice means they were created with the same `n` and `p`.
    pub fn is_compatible(&self, other: &Filter) -> bool {
        self.bits.bit_len() == other.bits.bit_len() && self.fpp == other.fpp
    }

    pub(super) fn check_compatible(&self, other: &Filter) -> Result<(), Error> {
        if self.bits.bit_len() != other.bits.bit_len() {
            return Err(Error::incompatible_filters("different number of bits")
                .with_context("nbits", self.bits.bit_len())
                .with_context("other_nbits", other.bits.bit_len()));
        }
        if self.fpp != other.fpp {
            return Err(Error::incompatible_filters("different false positive probabilities")
                .with_context("p", self.fpp)
                .with_context("other_p", other.fpp));
        }
        Ok(())
    }
}

fn check_fpp(p: f64) -> Result<(), Error> {
    if p > 0.0 && p < 1.0 {
        Ok(())
    } else {
        Err(Error::invalid_argument(
            "false positive probability must be between 0.0 and 1.0 (exclusive)",
        )
        .with_context("p", p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parameter_planning() {
        // 1000 * ln(100) / ln(2)^2 = 9585.06 -> 9586 -> 150 words
        let filter = Filter::new(1000, 0.01).unwrap();
        assert_eq!(filter.stats().nbits, 9600);
        assert_eq!(filter.stats().hashes, 7);
        assert_eq!(filter.capacity(), 1000);
        assert_eq!(filter.fpp(), 0.01);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_zero_items_still_has_one_word() {
        let mut filter = Filter::new(0, 0.5).unwrap();
        assert_eq!(filter.stats().nbits, 64);
        assert_eq!(filter.stats().hashes, 1);
        filter.add("x");
        assert!(filter.has("x"));
    }

    #[test]
    fn test_invalid_arguments() {
        let err = Filter::new(-1, 0.01).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        for p in [0.0, 1.0, -0.5, 1.5, f64::NAN, f64::INFINITY] {
            let err = Filter::new(10, p).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "p = {p}");
        }
        let err = Filter::new(i64::MAX, 1e-300).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_popcount_counts_bits_not_adds() {
        let mut filter = Filter::new(100, 0.01).unwrap();
        filter.add("apple");
        let after_first = filter.stats().popcount;
        assert!(after_first >= 1 && after_first <= filter.stats().hashes);

        filter.add("apple");
        assert_eq!(filter.stats().popcount, after_first);
        assert_eq!(filter.stats().popcount, filter.bits.popcount());
    }

    #[test]
    fn test_empty_filter_estimates() {
        let filter = Filter::new(100, 0.01).unwrap();
        assert_eq!(filter.size(), 0);
        assert_eq!(filter.err_rate(), 0.0);
        assert_eq!(filter.load_factor(), 0.0);
        assert!(!filter.has("anything"));
    }

    #[test]
    fn test_saturated_size_is_max() {
        let mut filter = Filter::new(1, 0.5).unwrap();
        for i in 0..10_000 {
            filter.add(format!("key-{i}"));
        }
        assert_eq!(filter.stats().popcount, filter.stats().nbits);
        assert_eq!(filter.size(), u64::MAX);
        assert_eq!(filter.err_rate(), 1.0);
        assert_eq!(filter.load_factor(), 1.0);
    }

    #[test]
    fn test_planned_hashes_stay_bounded() {
        for p in [f64::MIN_POSITIVE, 5e-324, 1e-300] {
            let hashes = Filter::suggest_num_hashes(p).unwrap();
            assert!(hashes <= MAX_NUM_HASHES, "p = {p}, hashes = {hashes}");
        }
    }

    #[test]
    fn test_is_compatible() {
        let f1 = Filter::new(100, 0.01).unwrap();
        let f2 = Filter::new(100, 0.01).unwrap();
        let f3 = Filter::new(200, 0.01).unwrap();
        let f4 = Filter::new(100, 0.02).unwrap();

        assert!(f1.is_compatible(&f2));
        assert!(!f1.is_compatible(&f3));
        assert!(!f1.is_compatible(&f4));
        assert_eq!(
            f1.check_compatible(&f3).unwrap_err().kind(),
            ErrorKind::IncompatibleFilters
        );
    }
}
