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

//! Set algebra across compatible filters.
//!
//! Union and intersection work on the bit vectors directly: the union of two filters is the
//! bitwise OR of their bits and the intersection the bitwise AND, after which the popcount is
//! recomputed from the result. Both require filters with the same bit count and target
//! probability (see [`Filter::is_compatible`]).

use super::filter::Filter;
use crate::error::Error;

impl Filter {
    /// Merges another filter into this one via bitwise OR.
    ///
    /// After merging, this filter recognizes keys from either filter (plus any false
    /// positives from either).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IncompatibleFilters`](crate::error::ErrorKind::IncompatibleFilters)
    /// if the filters differ in bit count or target probability. `self` is left unchanged.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::Filter;
    /// let mut f1 = Filter::new(100, 0.01).unwrap();
    /// let mut f2 = Filter::new(100, 0.01).unwrap();
    /// f1.add("a");
    /// f2.add("b");
    ///
    /// f1.union(&f2).unwrap();
    /// assert!(f1.has("a"));
    /// assert!(f1.has("b"));
    /// ```
    pub fn union(&mut self, other: &Filter) -> Result<(), Error> {
        self.check_compatible(other)?;
        self.popcount = self.bits.union_with(&other.bits);
        Ok(())
    }

    /// Intersects this filter with another via bitwise AND.
    ///
    /// After intersecting, this filter recognizes only keys present in both filters (plus
    /// false positives).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::IncompatibleFilters`](crate::error::ErrorKind::IncompatibleFilters)
    /// if the filters differ in bit count or target probability. `self` is left unchanged.
    pub fn intersect(&mut self, other: &Filter) -> Result<(), Error> {
        self.check_compatible(other)?;
        self.popcount = self.bits.intersect_with(&other.bits);
        Ok(())
    }
}

/// Returns a new filter holding the union of `a` and `b`.
///
/// The result takes its planned capacity, probability and probe count from `a`.
pub fn union(a: &Filter, b: &Filter) -> Result<Filter, Error> {
    a.check_compatible(b)?;
    let mut result = a.clone();
    result.union(b)?;
    Ok(result)
}

/// Returns a new filter holding the intersection of `a` and `b`.
///
/// The result takes its planned capacity, probability and probe count from `a`.
pub fn intersect(a: &Filter, b: &Filter) -> Result<Filter, Error> {
    a.check_compatible(b)?;
    let mut result = a.clone();
    result.intersect(b)?;
    Ok(result)
}

/// Estimates the Jaccard index `|A ∩ B| / |A ∪ B|` of the key sets behind `a` and `b`.
///
/// Both cardinalities come from [`Filter::size`] on the intersection and union filters.
/// Returns `0.0` when the union is estimated to be empty.
///
/// # Errors
///
/// Fails like [`union`] when the filters are incompatible.
///
/// # Examples
///
/// ```
/// # use bloomcascade::bloom::{jaccard, Filter};
/// let mut a = Filter::new(1000, 0.001).unwrap();
/// let mut b = Filter::new(1000, 0.001).unwrap();
/// for key in ["x", "y"] {
///     a.add(key);
/// }
/// for key in ["y", "z"] {
///     b.add(key);
/// }
/// let index = jaccard(&a, &b).unwrap();
/// assert!((index - 1.0 / 3.0).abs() < 0.05);
/// ```
pub fn jaccard(a: &Filter, b: &Filter) -> Result<f64, Error> {
    let shared = intersect(a, b)?.size();
    let total = union(a, b)?.size();
    if total == 0 {
        return Ok(0.0);
    }
    Ok(shared as f64 / total as f64)
}
