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

//! Binary encoding of filters.
//!
//! A [`Filter`] encodes as, all integers little-endian:
//!
//! ```text
//! byte 0        : format version (1)
//! bytes 1..9    : N, the planned item count
//! bytes 9..17   : P, the raw IEEE-754 bits of the target probability
//! bytes 17..25  : number of probe rounds
//! bytes 25..33  : popcount
//! bytes 33..41  : nbits
//! bytes 41..    : nbits / 64 words of the bit vector, in index order
//! ```
//!
//! A [`DynamicFilter`] encodes as the version byte, a varint member count, then for each member
//! a varint byte length followed by that member's own filter encoding. The framing lets every
//! member be parsed on its own.

use std::io;

use log::trace;

use super::bitvec::BitVector;
use super::bitvec::WORD_BITS;
use super::dynamic::DynamicFilter;
use super::filter::Filter;
use super::filter::MAX_NUM_HASHES;
use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::error::Error;

/// Format version written by this crate and the only one it reads.
const SERIAL_VERSION: u8 = 1;

/// Version byte plus the five scalar fields.
const HEADER_BYTES: usize = 1 + 5 * 8;

impl Filter {
    /// Serializes the filter to a byte vector.
    ///
    /// # Examples
    ///
    /// ```
    /// # use bloomcascade::bloom::Filter;
    /// let mut filter = Filter::new(100, 0.01).unwrap();
    /// filter.add("test");
    ///
    /// let bytes = filter.serialize();
    /// assert_eq!(bytes.len(), 41 + 960 / 8);
    /// let restored = Filter::deserialize(&bytes).unwrap();
    /// assert!(restored.has("test"));
    /// ```
    pub fn serialize(&self) -> Vec<u8> {
        let words = self.bits.words();
        let mut bytes = SketchBytes::with_capacity(HEADER_BYTES + words.len() * 8);

        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u64_le(self.capacity);
        bytes.write_u64_le(self.fpp.to_bits());
        bytes.write_u64_le(self.hashes);
        bytes.write_u64_le(self.popcount);
        bytes.write_u64_le(self.bits.bit_len());
        for &word in words {
            bytes.write_u64_le(word);
        }

        bytes.into_bytes()
    }

    /// Deserializes a filter from bytes.
    ///
    /// The input must hold exactly one encoded filter.
    ///
    /// # Errors
    ///
    /// - [`DataTooShort`](crate::error::ErrorKind::DataTooShort) if the input is shorter than
    ///   the header or than the bit vector the header announces, or if bytes remain after it
    /// - [`UnknownEncoding`](crate::error::ErrorKind::UnknownEncoding) if the version byte is
    ///   not 1
    /// - [`InvalidData`](crate::error::ErrorKind::InvalidData) if the header describes a filter
    ///   that cannot exist, such as zero probe rounds or more set bits than bits
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_BYTES {
            trace!("rejecting {} byte filter encoding: header incomplete", bytes.len());
            return Err(Error::data_too_short("filter header")
                .with_context("expected", HEADER_BYTES)
                .with_context("actual", bytes.len()));
        }

        let mut cursor = SketchSlice::new(bytes);
        let version = cursor
            .read_u8()
            .map_err(|_| Error::data_too_short("version"))?;
        if version != SERIAL_VERSION {
            return Err(Error::unknown_encoding(SERIAL_VERSION, version));
        }

        let capacity = cursor
            .read_u64_le()
            .map_err(|_| Error::data_too_short("capacity"))?;
        let fpp = cursor
            .read_u64_le()
            .map(f64::from_bits)
            .map_err(|_| Error::data_too_short("fpp"))?;
        let hashes = cursor
            .read_u64_le()
            .map_err(|_| Error::data_too_short("hashes"))?;
        let popcount = cursor
            .read_u64_le()
            .map_err(|_| Error::data_too_short("popcount"))?;
        let nbits = cursor
            .read_u64_le()
            .map_err(|_| Error::data_too_short("nbits"))?;

        if !(fpp > 0.0 && fpp < 1.0) {
            return Err(Error::invalid_data("false positive probability out of range")
                .with_context("p", fpp));
        }
        if hashes == 0 {
            return Err(Error::invalid_data("filter must use at least one probe round"));
        }
        if hashes > MAX_NUM_HASHES {
            return Err(Error::invalid_data("too many probe rounds")
                .with_context("hashes", hashes)
                .with_context("max", MAX_NUM_HASHES));
        }
        if nbits == 0 || nbits % WORD_BITS != 0 {
            return Err(
                Error::invalid_data("bit count must be a positive multiple of 64")
                    .with_context("nbits", nbits),
            );
        }
        if popcount > nbits {
            return Err(Error::invalid_data("popcount exceeds bit count")
                .with_context("popcount", popcount)
                .with_context("nbits", nbits));
        }

        // Compare lengths before allocating so a corrupt header cannot request a huge vector.
        let payload_bytes = nbits / 8;
        let remaining = cursor.remaining() as u64;
        if remaining < payload_bytes {
            trace!("rejecting filter encoding: {remaining} of {payload_bytes} payload bytes");
            return Err(Error::data_too_short("bit vector")
                .with_context("expected", payload_bytes)
                .with_context("actual", remaining));
        }
        if remaining > payload_bytes {
            return Err(Error::trailing_data((remaining - payload_bytes) as usize));
        }

        let num_words = (nbits / WORD_BITS) as usize;
        let mut words = Vec::with_capacity(num_words);
        for _ in 0..num_words {
            let word = cursor
                .read_u64_le()
                .map_err(|_| Error::data_too_short("bit vector"))?;
            words.push(word);
        }

        let bits = BitVector::from_words(words);
        let actual = bits.popcount();
        if actual != popcount {
            return Err(Error::invalid_data("popcount does not match the bit vector")
                .with_context("popcount", popcount)
                .with_context("actual", actual));
        }

        Ok(Filter {
            capacity,
            fpp,
            hashes,
            popcount,
            bits,
        })
    }
}

impl DynamicFilter {
    /// Serializes the whole cascade to a byte vector.
    pub fn serialize(&self) -> Vec<u8> {
        let members: Vec<Vec<u8>> = self.filters.iter().map(Filter::serialize).collect();
        let framed_len: usize = members.iter().map(|member| member.len() + 10).sum();
        let mut bytes = SketchBytes::with_capacity(1 + 10 + framed_len);

        bytes.write_u8(SERIAL_VERSION);
        bytes.write_uvarint(members.len() as u64);
        for member in &members {
            bytes.write_uvarint(member.len() as u64);
            bytes.write(member);
        }

        bytes.into_bytes()
    }

    /// Deserializes a cascade from bytes.
    ///
    /// Every byte of the input must belong to the cascade.
    ///
    /// # Errors
    ///
    /// - [`DataTooShort`](crate::error::ErrorKind::DataTooShort) if the input is empty, a
    ///   length prefix or member is cut short, or bytes remain after the last member
    /// - [`UnknownEncoding`](crate::error::ErrorKind::UnknownEncoding) if the version byte is
    ///   not 1
    /// - [`InvalidData`](crate::error::ErrorKind::InvalidData) if a varint is malformed or the
    ///   cascade holds no members
    /// - any error of [`Filter::deserialize`] for a member, with the member index attached as
    ///   context
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let version = cursor
            .read_u8()
            .map_err(|_| Error::data_too_short("version"))?;
        if version != SERIAL_VERSION {
            return Err(Error::unknown_encoding(SERIAL_VERSION, version));
        }

        let count = cursor
            .read_uvarint()
            .map_err(|err| varint_error("filter count", err))?;
        if count == 0 {
            return Err(Error::invalid_data("dynamic filter holds no filters"));
        }

        // The count is untrusted, so the vector grows with the members actually present.
        let mut filters = Vec::new();
        for index in 0..count {
            let len = cursor
                .read_uvarint()
                .map_err(|err| varint_error("filter length", err).with_context("filter", index))?;
            let member = usize::try_from(len)
                .ok()
                .and_then(|len| cursor.read_slice(len).ok())
                .ok_or_else(|| {
                    Error::data_too_short("filter")
                        .with_context("filter", index)
                        .with_context("expected", len)
                        .with_context("actual", cursor.remaining())
                })?;
            let filter =
                Filter::deserialize(member).map_err(|err| err.with_context("filter", index))?;
            if filter.capacity() == 0 {
                return Err(
                    Error::invalid_data("dynamic filter member planned for zero items")
                        .with_context("filter", index),
                );
            }
            filters.push(filter);
        }

        if cursor.remaining() != 0 {
            trace!(
                "rejecting dynamic filter encoding: {} bytes after {count} filters",
                cursor.remaining()
            );
            return Err(Error::trailing_data(cursor.remaining()));
        }

        Ok(DynamicFilter { filters })
    }
}

fn varint_error(what: &'static str, err: io::Error) -> Error {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        Error::data_too_short(what)
    } else {
        Error::invalid_data(format!("malformed varint for {what}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_filter_layout() {
        let mut filter = Filter::new(5, 0.2).unwrap();
        for key in ["one", "two", "three", "four", "five"] {
            filter.add(key);
        }
        let bytes = filter.serialize();
        let stats = filter.stats();

        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1..9], 5u64.to_le_bytes());
        assert_eq!(bytes[9..17], 0.2f64.to_bits().to_le_bytes());
        assert_eq!(bytes[17..25], stats.hashes.to_le_bytes());
        assert_eq!(bytes[25..33], stats.popcount.to_le_bytes());
        assert_eq!(bytes[33..41], stats.nbits.to_le_bytes());
        assert_eq!(bytes.len() as u64, 41 + stats.nbits / 8);
        assert_eq!(bytes[41..49], filter.bits.words()[0].to_le_bytes());
    }

    #[test]
    fn test_filter_rejects_bad_header_values() {
        let filter = Filter::new(100, 0.01).unwrap();
        let bytes = filter.serialize();

        let mut zero_hashes = bytes.clone();
        zero_hashes[17..25].copy_from_slice(&0u64.to_le_bytes());
        let err = Filter::deserialize(&zero_hashes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);

        let mut bad_fpp = bytes.clone();
        bad_fpp[9..17].copy_from_slice(&1.5f64.to_bits().to_le_bytes());
        let err = Filter::deserialize(&bad_fpp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);

        let mut unaligned = bytes.clone();
        unaligned[33..41].copy_from_slice(&100u64.to_le_bytes());
        let err = Filter::deserialize(&unaligned).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);

        let mut overfull = bytes;
        overfull[25..33].copy_from_slice(&u64::MAX.to_le_bytes());
        let err = Filter::deserialize(&overfull).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_filter_rejects_huge_nbits_without_allocating() {
        let filter = Filter::new(100, 0.01).unwrap();
        let mut bytes = filter.serialize();
        bytes[33..41].copy_from_slice(&(u64::MAX - 63).to_le_bytes());
        let err = Filter::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataTooShort);
    }

    #[test]
    fn test_filter_rejects_popcount_mismatch() {
        let mut filter = Filter::new(100, 0.01).unwrap();
        for i in 0..50 {
            filter.add(format!("key-{i}"));
        }
        let mut bytes = filter.serialize();

        bytes[25..33].copy_from_slice(&0u64.to_le_bytes());
        let err = Filter::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);

        let off_by_one = filter.stats().popcount - 1;
        bytes[25..33].copy_from_slice(&off_by_one.to_le_bytes());
        let err = Filter::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_filter_rejects_excessive_probe_rounds() {
        let filter = Filter::new(100, 0.01).unwrap();
        let mut bytes = filter.serialize();

        for hashes in [MAX_NUM_HASHES + 1, 1 << 32, u64::MAX] {
            bytes[17..25].copy_from_slice(&hashes.to_le_bytes());
            let err = Filter::deserialize(&bytes).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidData, "hashes = {hashes}");
        }

        bytes[17..25].copy_from_slice(&MAX_NUM_HASHES.to_le_bytes());
        let mut decoded = Filter::deserialize(&bytes).unwrap();
        decoded.add("key");
        assert!(decoded.has("key"));
    }

    #[test]
    fn test_dynamic_layout() {
        let filter = DynamicFilter::with_capacity(10, 0.1).unwrap();
        let member = filter.filters()[0].serialize();
        let bytes = filter.serialize();

        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[1], 1); // one member
        assert_eq!(bytes[2] as usize, member.len()); // 41 + 8 fits in one varint byte
        assert_eq!(&bytes[3..], &member[..]);
    }

    #[test]
    fn test_dynamic_rejects_empty_cascade() {
        let err = DynamicFilter::deserialize(&[1, 0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_dynamic_rejects_member_without_capacity() {
        let filter = DynamicFilter::with_capacity(10, 0.1).unwrap();
        let mut bytes = filter.serialize();
        // N of the first member, after the version, count and length bytes.
        bytes[4..12].copy_from_slice(&0u64.to_le_bytes());

        let err = DynamicFilter::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("filter: 0"));

        // A standalone filter planned for zero items is still valid.
        assert!(Filter::deserialize(&bytes[3..]).is_ok());
    }

    #[test]
    fn test_dynamic_rejects_malformed_varint() {
        let mut bytes = vec![1];
        bytes.extend_from_slice(&[0xff; 10]);
        let err = DynamicFilter::deserialize(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);

        let err = DynamicFilter::deserialize(&[1, 0x80]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataTooShort);
    }
}
