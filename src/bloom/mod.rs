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

//! Bloom filters for probabilistic set membership testing.
//!
//! A Bloom filter is a space-efficient probabilistic data structure used to test whether
//! a key is a member of a set. False positive matches are possible, but false negatives
//! are not. In other words, a query returns either "possibly in set" or "definitely not in set".
//!
//! # Properties
//!
//! - **No false negatives**: If a key was added, `has()` will always return `true`
//! - **Possible false positives**: `has()` may return `true` for keys never added
//! - **Fixed size**: [`Filter`] never resizes; [`DynamicFilter`] grows by appending filters
//! - **Cardinality estimates**: the number of distinct keys is estimated from the popcount
//!
//! # Usage
//!
//! ```rust
//! use bloomcascade::bloom::Filter;
//!
//! // Create a filter planned for 1000 keys with a 1% false positive rate
//! let mut filter = Filter::new(1000, 0.01).unwrap();
//!
//! filter.add("apple");
//! filter.add("banana");
//! filter.add(b"\x00\x01");
//!
//! assert!(filter.has("apple"));
//! assert!(!filter.has("grape")); // never added (probably)
//!
//! let stats = filter.stats();
//! println!("{} bits, {} set, {} probes per key", stats.nbits, stats.popcount, stats.hashes);
//! println!("~{} keys, est. FPP {:.4}%", filter.size(), filter.err_rate() * 100.0);
//! ```
//!
//! # Growing Without a Capacity
//!
//! ```rust
//! use bloomcascade::bloom::DynamicFilter;
//!
//! let mut filter = DynamicFilter::new(0.01).unwrap();
//! for i in 0..5000 {
//!     filter.add(format!("user-{i}"));
//! }
//! assert_eq!(filter.num_filters(), 2);
//! assert!(filter.has("user-0"));
//! ```
//!
//! # Set Operations
//!
//! Filters created with the same `n` and `p` can be combined:
//!
//! ```rust
//! use bloomcascade::bloom::{intersect, jaccard, Filter};
//!
//! let mut filter1 = Filter::new(100, 0.01).unwrap();
//! let mut filter2 = Filter::new(100, 0.01).unwrap();
//! filter1.add("a");
//! filter1.add("b");
//! filter2.add("b");
//!
//! let both = intersect(&filter1, &filter2).unwrap();
//! assert!(both.has("b"));
//!
//! // Union in place: recognizes keys from either filter
//! filter1.union(&filter2).unwrap();
//!
//! let similarity = jaccard(&filter1, &filter2).unwrap();
//! assert!(similarity > 0.0);
//! ```
//!
//! # Implementation Details
//!
//! - Uses MurmurHash3 x64/128 with a fixed seed for hashing
//! - Implements double hashing (Kirsch-Mitzenmacher method) for k probe positions
//! - Bits packed in `u64` words; the bit count is always a multiple of 64
//! - Versioned little-endian binary encoding (version 1)
//!
//! # References
//!
//! - Bloom, Burton H. (1970). "Space/time trade-offs in hash coding with allowable errors"
//! - Kirsch and Mitzenmacher (2008). "Less Hashing, Same Performance: Building a Better Bloom
//!   Filter"
//! - Swamidass and Baldi (2007). "Mathematical Correction for Fingerprint Similarity Measures
//!   to Improve Chemical Retrieval", for the cardinality estimate

mod bitvec;
mod dynamic;
mod filter;
mod serialization;
mod set_ops;

pub use self::bitvec::BitVector;
pub use self::dynamic::DEFAULT_DYNAMIC_CAPACITY;
pub use self::dynamic::DynamicFilter;
pub use self::filter::Filter;
pub use self::filter::FilterStats;
pub use self::set_ops::intersect;
pub use self::set_ops::jaccard;
pub use self::set_ops::union;
