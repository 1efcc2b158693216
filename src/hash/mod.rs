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

//! Probe index derivation for the filter family.
//!
//! Every key is hashed once with MurmurHash3 x64/128. The two 64-bit halves `(a, b)` stand in
//! for `k` independent hash functions: round `i` probes bit `(a + i*b) mod nbits`, following
//! Kirsch and Mitzenmacher, "Less Hashing, Same Performance: Building a Better Bloom Filter".
//!
//! The seed is a public constant, so the hash is not keyed: anyone can compute probe indices
//! offline and choose keys that collide. Filters fed by untrusted input should expect their
//! false positive rate to be driven up deliberately.

/// Seed for all key hashing.
///
/// Filters only combine and compare meaningfully when they hash with the same seed, and encoded
/// filters do not record it. Changing this value invalidates every filter persisted so far.
const HASH_SEED: u32 = 9001;

/// Hashes `key` into the two base values of the double hashing scheme.
pub(crate) fn hash_pair(key: &[u8]) -> (u64, u64) {
    mur3::murmurhash3_x64_128(key, HASH_SEED)
}

/// Computes the bit probed in `round` for the base values `(a, b)`.
#[inline]
pub(crate) fn probe_index(a: u64, b: u64, round: u64, nbits: u64) -> u64 {
    a.wrapping_add(round.wrapping_mul(b)) % nbits
}

/// Returns the `rounds` bit indices probed for `key` in a vector of `nbits` bits.
pub(crate) fn probes(key: &[u8], rounds: u64, nbits: u64) -> Probes {
    let (a, b) = hash_pair(key);
    Probes {
        a,
        b,
        round: 0,
        rounds,
        nbits,
    }
}

/// Iterator over the probe indices of a single key.
#[derive(Debug, Clone)]
pub(crate) struct Probes {
    a: u64,
    b: u64,
    round: u64,
    rounds: u64,
    nbits: u64,
}

impl Iterator for Probes {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        if self.round == self.rounds {
            return None;
        }
        let index = probe_index(self.a, self.b, self.round, self.nbits);
        self.round += 1;
        Some(index)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = (self.rounds - self.round) as usize;
        (left, Some(left))
    }
}

impl ExactSizeIterator for Probes {}
