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

use bloomcascade::bloom::DynamicFilter;
use bloomcascade::bloom::Filter;
use bloomcascade::error::ErrorKind;
use googletest::assert_that;
use googletest::prelude::contains_substring;

const HEADER_BYTES: usize = 41;

fn loaded_filter(capacity: i64, p: f64, keys: usize) -> Filter {
    let mut filter = Filter::new(capacity, p).unwrap();
    for i in 0..keys {
        filter.add(format!("key-{i}"));
    }
    filter
}

#[test]
fn test_filter_round_trip() {
    for (capacity, p, keys) in [(5, 0.2, 5), (100, 0.01, 0), (10_000, 0.001, 7_500)] {
        let filter = loaded_filter(capacity, p, keys);
        let bytes = filter.serialize();
        let restored = Filter::deserialize(&bytes).unwrap();

        assert_eq!(restored, filter);
        assert_eq!(restored.stats(), filter.stats());
        assert_eq!(restored.capacity(), capacity as u64);
        assert_eq!(restored.fpp(), p);
        for i in 0..keys {
            assert!(restored.has(format!("key-{i}")));
        }
        assert_eq!(restored.serialize(), bytes);
    }
}

#[test]
fn test_filter_too_short() {
    let bytes = loaded_filter(100, 0.01, 10).serialize();

    for len in [0, 1, HEADER_BYTES - 1] {
        let err = Filter::deserialize(&bytes[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataTooShort, "len = {len}");
    }

    let err = Filter::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataTooShort);
    assert_that!(err.message(), contains_substring("bit vector"));
}

#[test]
fn test_filter_trailing_bytes() {
    let mut bytes = loaded_filter(100, 0.01, 10).serialize();
    bytes.push(0);
    let err = Filter::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataTooShort);
    assert_that!(err.message(), contains_substring("trailing"));
}

#[test]
fn test_filter_unknown_version() {
    let mut bytes = loaded_filter(100, 0.01, 10).serialize();
    bytes[0] = 2;
    let err = Filter::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownEncoding);
    assert_that!(err.message(), contains_substring("got 2"));
}

#[test]
fn test_dynamic_round_trip() {
    let mut filter = DynamicFilter::with_capacity(256, 0.01).unwrap();
    for i in 0..2_000 {
        filter.add(format!("key-{i}"));
    }
    assert!(filter.num_filters() >= 3);

    let bytes = filter.serialize();
    let restored = DynamicFilter::deserialize(&bytes).unwrap();
    assert_eq!(restored, filter);
    for i in 0..2_000 {
        assert!(restored.has(format!("key-{i}")));
    }

    // Each framed member parses on its own.
    for (member, original) in restored.filters().iter().zip(filter.filters()) {
        let bytes = original.serialize();
        assert_eq!(&Filter::deserialize(&bytes).unwrap(), member);
    }
}

#[test]
fn test_dynamic_keeps_growing_after_round_trip() {
    let mut filter = DynamicFilter::with_capacity(64, 0.05).unwrap();
    for i in 0..100 {
        filter.add(format!("key-{i}"));
    }
    let mut restored = DynamicFilter::deserialize(&filter.serialize()).unwrap();
    for i in 100..1_000 {
        filter.add(format!("key-{i}"));
        restored.add(format!("key-{i}"));
    }
    assert_eq!(restored, filter);
}

#[test]
fn test_dynamic_malformed_input() {
    let filter = DynamicFilter::new(0.01).unwrap();
    let bytes = filter.serialize();

    let err = DynamicFilter::deserialize(&[]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataTooShort);

    let mut wrong_version = bytes.clone();
    wrong_version[0] = 0;
    let err = DynamicFilter::deserialize(&wrong_version).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownEncoding);

    let err = DynamicFilter::deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataTooShort);

    let mut trailing = bytes.clone();
    trailing.extend_from_slice(&[0, 0]);
    let err = DynamicFilter::deserialize(&trailing).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataTooShort);

    // Claim two members while only one follows.
    let mut missing_member = bytes;
    missing_member[1] = 2;
    let err = DynamicFilter::deserialize(&missing_member).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataTooShort);
}

#[test]
fn test_dynamic_reports_failing_member() {
    let mut filter = DynamicFilter::with_capacity(16, 0.1).unwrap();
    for i in 0..100 {
        filter.add(format!("key-{i}"));
    }
    assert!(filter.num_filters() >= 2);

    let mut bytes = filter.serialize();
    // Version byte of the first member: after the cascade version, the count and the length.
    let first_member = 1 + 1 + 1;
    assert_eq!(bytes[first_member], 1);
    bytes[first_member] = 9;

    let err = DynamicFilter::deserialize(&bytes).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownEncoding);
    assert_that!(err.to_string().as_str(), contains_substring("filter: 0"));
}
