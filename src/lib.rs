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

//! Bloom filters for probabilistic set membership.
//!
//! The crate provides a fixed-capacity [`Filter`](bloom::Filter) sized from a target item
//! count and false positive probability, a [`DynamicFilter`](bloom::DynamicFilter) that grows
//! by appending ever larger filters, set algebra across compatible filters, a cardinality
//! estimator, and a versioned binary encoding for both filter kinds.
//!
//! # Usage
//!
//! ```rust
//! use bloomcascade::bloom::Filter;
//!
//! let mut filter = Filter::new(1000, 0.01).unwrap();
//! filter.add("apple");
//!
//! assert!(filter.has("apple"));
//! assert_eq!(filter.size(), 1);
//!
//! let restored = Filter::deserialize(&filter.serialize()).unwrap();
//! assert_eq!(restored, filter);
//! ```
//!
//! # Concurrency
//!
//! Nothing in this crate synchronizes internally. Mutation takes `&mut self` and queries take
//! `&self`, so callers that share a filter across threads wrap it in the lock of their choice.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod bloom;
pub mod error;

mod codec;
mod hash;
