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

/// Bits per storage word.
pub(crate) const WORD_BITS: u64 = 64;

/// A fixed-length bit array packed into `u64` words.
///
/// The length is always a whole number of words: a request for `n` bits is rounded up to the
/// next multiple of 64.
///
/// Indices must satisfy `i < bit_len()`. The vector does not clamp out-of-range indices; they
/// panic on the underlying slice access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitVector {
    words: Vec<u64>,
}

impl BitVector {
    /// Creates a zeroed vector holding at least `bits` bits.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::BitVector;
    /// let bits = BitVector::new(100);
    /// assert_eq!(bits.bit_len(), 128);
    /// assert_eq!(bits.popcount(), 0);
    /// ```
    pub fn new(bits: u64) -> Self {
        let num_words = bits.div_ceil(WORD_BITS) as usize;
        BitVector {
            words: vec![0u64; num_words],
        }
    }

    pub(crate) fn from_words(words: Vec<u64>) -> Self {
        BitVector { words }
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }

    /// Returns the number of addressable bits.
    pub fn bit_len(&self) -> u64 {
        self.words.len() as u64 * WORD_BITS
    }

    /// Tests bit `i`.
    #[inline]
    pub fn get(&self, i: u64) -> bool {
        let (word_index, mask) = Self::locate(i);
        (self.words[word_index] & mask) != 0
    }

    /// Sets bit `i` to 1.
    ///
    /// Returns `true` if the bit was previously 0, which lets owners keep an exact popcount
    /// without rescanning.
    #[inline]
    pub fn set(&mut self, i: u64) -> bool {
        let (word_index, mask) = Self::locate(i);
        let word = &mut self.words[word_index];
        let was_clear = (*word & mask) == 0;
        *word |= mask;
        was_clear
    }

    /// Counts the bits set to 1.
    ///
    /// `u64::count_ones` compiles to the `popcnt` instruction on targets that have one and to a
    /// portable bit-twiddling sequence elsewhere.
    pub fn popcount(&self) -> u64 {
        self.words.iter().map(|word| u64::from(word.count_ones())).sum()
    }

    /// ORs `other` into `self` and returns the resulting popcount.
    pub(crate) fn union_with(&mut self, other: &BitVector) -> u64 {
        debug_assert_eq!(self.words.len(), other.words.len());
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word |= *other_word;
        }
        self.popcount()
    }

    /// ANDs `other` into `self` and returns the resulting popcount.
    pub(crate) fn intersect_with(&mut self, other: &BitVector) -> u64 {
        debug_assert_eq!(self.words.len(), other.words.len());
        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word &= *other_word;
        }
        self.popcount()
    }

    #[inline]
    fn locate(i: u64) -> (usize, u64) {
        ((i / WORD_BITS) as usize, 1u64 << (i % WORD_BITS))
    }
}
