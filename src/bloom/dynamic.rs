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

use log::debug;

use super::filter::Filter;
use crate::error::Error;

/// Item count the seed filter of [`DynamicFilter::new`] is planned for.
pub const DEFAULT_DYNAMIC_CAPACITY: i64 = 4096;

/// Each appended filter is planned for this many times the items of its predecessor.
const GROWTH_FACTOR: u64 = 2;

/// Each appended filter targets this fraction of its predecessor's false positive probability.
const TIGHTENING_RATIO: f64 = 0.85;

/// A Bloom filter without a pre-declared capacity.
///
/// The filter is a cascade of fixed-size [`Filter`]s. Keys go into the newest member; once
/// that member's estimated size reaches its planned capacity, a new member twice as large is
/// appended with a false positive target 0.85 times as large. Earlier members are never merged
/// or removed, so the cascade only grows.
///
/// A query reports `true` if any member does. Because every member contributes its own false
/// positives, the effective rate compounds across the cascade; the tightening targets keep that
/// compounded rate bounded.
///
/// The idea comes from "Dynamic Bloom Filters" (Guo et al.) and "Scalable Bloom Filters"
/// (Almeida et al.).
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicFilter {
    /// Members in insertion order, oldest and smallest first. Never empty.
    pub(super) filters: Vec<Filter>,
}

impl DynamicFilter {
    /// Creates a cascade whose seed filter holds 4096 items at false positive probability `p`.
    ///
    /// # Errors
    ///
    /// Fails like [`Filter::new`] if `p` is not strictly between 0 and 1.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::DynamicFilter;
    /// let mut filter = DynamicFilter::new(0.01).unwrap();
    /// for i in 0..10_000 {
    ///     filter.add(format!("key-{i}"));
    /// }
    /// assert!(filter.num_filters() > 1);
    /// assert!(filter.has("key-42"));
    /// ```
    pub fn new(p: f64) -> Result<Self, Error> {
        Self::with_capacity(DEFAULT_DYNAMIC_CAPACITY, p)
    }

    /// Creates a cascade whose seed filter is planned for `n` items.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument) if `n`
    /// is not positive, or fails like [`Filter::new`].
    pub fn with_capacity(n: i64, p: f64) -> Result<Self, Error> {
        if n <= 0 {
            return Err(
                Error::invalid_argument("seed capacity must be positive").with_context("n", n)
            );
        }
        Ok(DynamicFilter {
            filters: vec![Filter::new(n, p)?],
        })
    }

    /// Adds a key, growing the cascade when the newest member reaches its capacity.
    ///
    /// # Panics
    ///
    /// Panics if the cascade would have to grow beyond the largest capacity this platform can
    /// represent. See [`try_add`](Self::try_add) for a non-panicking variant.
    pub fn add(&mut self, key: impl AsRef<[u8]>) {
        if let Err(err) = self.try_add(key) {
            panic!("DynamicFilter too large: {err}");
        }
    }

    /// Adds a key, growing the cascade when the newest member reaches its capacity.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Overflow`](crate::error::ErrorKind::Overflow) if the next member
    /// cannot be planned because its capacity would exceed what this platform can represent.
    /// The key is still recorded in the newest member, but the cascade is not extended; every
    /// later add will fail the same way.
    pub fn try_add(&mut self, key: impl AsRef<[u8]>) -> Result<(), Error> {
        let last = self.filters.len() - 1;
        let current = &mut self.filters[last];
        current.add(key);
        if current.size() < current.capacity() {
            return Ok(());
        }

        let next = next_filter(current)?;
        debug!(
            "growing dynamic filter to {} members: capacity={}, p={}",
            self.filters.len() + 1,
            next.capacity(),
            next.fpp()
        );
        self.filters.push(next);
        Ok(())
    }

    /// Tests whether a key is possibly in any member of the cascade.
    pub fn has(&self, key: impl AsRef<[u8]>) -> bool {
        let key = key.as_ref();
        self.filters.iter().any(|filter| filter.has(key))
    }

    /// Returns the number of member filters.
    pub fn num_filters(&self) -> usize {
        self.filters.len()
    }

    /// Returns the member filters, oldest first.
    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Estimates the number of distinct keys added, summed over all members.
    pub fn size(&self) -> u64 {
        self.filters
            .iter()
            .fold(0u64, |total, filter| total.saturating_add(filter.size()))
    }

    /// Estimates the compounded false positive probability of the cascade.
    ///
    /// A key is a false positive if any member reports it, so the rate is
    /// `1 - Π(1 - err_rate_i)` over all members.
    pub fn err_rate(&self) -> f64 {
        let all_negative: f64 = self
            .filters
            .iter()
            .map(|filter| 1.0 - filter.err_rate())
            .product();
        1.0 - all_negative
    }
}

/// Plans the member that follows `current` in the cascade.
fn next_filter(current: &Filter) -> Result<Filter, Error> {
    let capacity = current.capacity();
    let Some(next_capacity) = capacity
        .checked_mul(GROWTH_FACTOR)
        .filter(|&n| n < isize::MAX as u64)
    else {
        return Err(
            Error::overflow("capacity of the next filter is not representable")
                .with_context("capacity", capacity),
        );
    };
    let next_fpp = current.fpp() * TIGHTENING_RATIO;

    Filter::new(next_capacity as i64, next_fpp).map_err(|err| {
        Error::overflow("next filter cannot be allocated")
            .with_context("capacity", next_capacity)
            .with_context("p", next_fpp)
            .with_context("cause", err)
    })
}
