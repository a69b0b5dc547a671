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

use super::raw::{self, Scalar};
use paste::paste;

/// Growable output buffer; the mirror image of [`Reader`](super::Reader).
#[derive(Default)]
pub struct Writer {
    bf: Vec<u8>,
    native: bool,
}

macro_rules! impl_write_fixed {
    ($($ty:ident),*) => {
        paste! {
            $(
                #[inline(always)]
                pub fn [<write_ $ty>](&mut self, value: $ty) {
                    if self.native {
                        self.bf.extend_from_slice(&value.to_ne_bytes());
                    } else {
                        self.bf.extend_from_slice(&value.to_le_bytes());
                    }
                }

                pub fn [<write_ $ty s>](&mut self, values: &[$ty]) {
                    self.write_array(values);
                }
            )*
        }
    };
}

impl Writer {
    /// Creates a compact-mode writer.
    pub fn new() -> Writer {
        Writer::default()
    }

    /// Creates a writer in native mode, see the [module docs](super).
    pub fn native() -> Writer {
        Writer {
            bf: Vec::new(),
            native: true,
        }
    }

    #[inline(always)]
    pub fn is_native(&self) -> bool {
        self.native
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) {
        self.bf.push(value as u8);
    }

    #[inline(always)]
    pub fn write_bool(&mut self, value: bool) {
        self.bf.push(value as u8);
    }

    impl_write_fixed!(i16, u16, i32, u32, i64, u64, f32, f64);

    /// Writes every element; raw host-order bytes in native mode.
    pub fn write_array<T: Scalar>(&mut self, values: &[T]) {
        if self.native {
            self.bf.extend_from_slice(raw::bytes_of(values));
        } else {
            self.bf.reserve(values.len() * T::WIDTH);
            for value in values {
                value.write_le(&mut self.bf);
            }
        }
    }

    pub fn write_varuint32(&mut self, value: u32) {
        if self.native {
            self.write_u32(value);
        } else {
            self.write_leb128(value as u64);
        }
    }

    pub fn write_varint32(&mut self, value: i32) {
        if self.native {
            self.write_i32(value);
        } else {
            let zigzag = ((value << 1) ^ (value >> 31)) as u32;
            self.write_leb128(zigzag as u64);
        }
    }

    pub fn write_varuint64(&mut self, value: u64) {
        if self.native {
            self.write_u64(value);
        } else {
            self.write_leb128(value);
        }
    }

    pub fn write_varint64(&mut self, value: i64) {
        if self.native {
            self.write_i64(value);
        } else {
            let zigzag = ((value << 1) ^ (value >> 63)) as u64;
            self.write_leb128(zigzag);
        }
    }

    pub fn write_varint32s(&mut self, values: &[i32]) {
        if self.native {
            self.write_array(values);
        } else {
            for &value in values {
                self.write_varint32(value);
            }
        }
    }

    pub fn write_varint64s(&mut self, values: &[i64]) {
        if self.native {
            self.write_array(values);
        } else {
            for &value in values {
                self.write_varint64(value);
            }
        }
    }

    /// Writes a `varuint32` byte length followed by the UTF-8 bytes.
    pub fn write_string(&mut self, s: &str) {
        self.write_varuint32(s.len() as u32);
        self.bf.extend_from_slice(s.as_bytes());
    }

    fn write_leb128(&mut self, mut value: u64) {
        while value >= 0x80 {
            self.bf.push((value as u8 & 0x7F) | 0x80);
            value >>= 7;
        }
        self.bf.push(value as u8);
    }
}
