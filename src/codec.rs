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

use std::io;
use std::io::Cursor;

use byteorder::ByteOrder;
use byteorder::LittleEndian;
use byteorder::ReadBytesExt;

/// Longest encoding of a 64-bit unsigned varint.
const MAX_VARINT_LEN64: usize = 10;

pub(crate) struct SketchBytes {
    bytes: Vec<u8>,
}

impl SketchBytes {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn write(&mut self, buf: &[u8]) {
        self.bytes.extend_from_slice(buf);
    }

    pub fn write_u8(&mut self, n: u8) {
        self.bytes.push(n);
    }

    pub fn write_u64_le(&mut self, n: u64) {
        let mut buf = [0u8; 8];
        LittleEndian::write_u64(&mut buf, n);
        self.write(&buf);
    }

    /// Writes `n` as an unsigned LEB128 varint, seven bits per byte, low bits first.
    pub fn write_uvarint(&mut self, mut n: u64) {
        while n >= 0x80 {
            self.write_u8((n as u8) | 0x80);
            n >>= 7;
        }
        self.write_u8(n as u8);
    }
}

pub(crate) struct SketchSlice<'a> {
    slice: Cursor<&'a [u8]>,
}

impl<'a> SketchSlice<'a> {
    pub fn new(slice: &'a [u8]) -> Self {
        SketchSlice {
            slice: Cursor::new(slice),
        }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        let len = self.slice.get_ref().len();
        len.saturating_sub(self.slice.position() as usize)
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        self.slice.read_u8()
    }

    pub fn read_u64_le(&mut self) -> io::Result<u64> {
        self.slice.read_u64::<LittleEndian>()
    }

    /// Borrows the next `len` bytes without copying them.
    pub fn read_slice(&mut self, len: usize) -> io::Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof));
        }
        let data: &'a [u8] = *self.slice.get_ref();
        let start = self.slice.position() as usize;
        self.slice.set_position((start + len) as u64);
        Ok(&data[start..start + len])
    }

    /// Reads an unsigned LEB128 varint.
    ///
    /// Truncated input fails with [`io::ErrorKind::UnexpectedEof`]; an encoding that does not
    /// fit in 64 bits fails with [`io::ErrorKind::InvalidData`].
    pub fn read_uvarint(&mut self) -> io::Result<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        for i in 0..MAX_VARINT_LEN64 {
            let byte = self.read_u8()?;
            if byte < 0x80 {
                if i == MAX_VARINT_LEN64 - 1 && byte > 1 {
                    break;
                }
                return Ok(value | (u64::from(byte) << shift));
            }
            value |= u64::from(byte & 0x7f) << shift;
            shift += 7;
        }
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "varint overflows a 64-bit integer",
        ))
    }
}
