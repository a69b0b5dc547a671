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
use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian, NativeEndian};
use paste::paste;
use std::any::Any;
use std::io::{ErrorKind, Read};
use tracing::trace;

/// Input buffer with a cursor, a limit and an optional refill source.
///
/// Invariant: `position <= limit <= capacity`. Every read first calls
/// [`Reader::require`], which refills from the source when fewer bytes than
/// requested are buffered and fails with [`Error::BufferUnderflow`] once the
/// source is exhausted.
///
/// In native mode (see the [module docs](super)) the variable-length integer
/// reads are "wide": they consume the full 4 or 8 bytes and return the value
/// unchanged, trading compactness for decode speed.
pub struct Reader {
    buffer: Vec<u8>,
    position: usize,
    limit: usize,
    total: usize,
    native: bool,
    source: Option<Box<dyn Read>>,
}

macro_rules! impl_read_fixed {
    ($($ty:ident),*) => {
        paste! {
            $(
                #[inline(always)]
                pub fn [<read_ $ty>](&mut self) -> Result<$ty, Error> {
                    let native = self.native;
                    let bytes = self.take(std::mem::size_of::<$ty>())?;
                    Ok(if native {
                        NativeEndian::[<read_ $ty>](bytes)
                    } else {
                        LittleEndian::[<read_ $ty>](bytes)
                    })
                }

                pub fn [<read_ $ty s>](&mut self, length: usize) -> Result<Vec<$ty>, Error> {
                    let mut values = vec![<$ty>::default(); length];
                    self.read_array(&mut values)?;
                    Ok(values)
                }
            )*
        }
    };
}

impl Reader {
    /// Creates a compact-mode reader over a copy of `bf`.
    pub fn new(bf: &[u8]) -> Reader {
        Reader::from_vec(bf.to_vec())
    }

    pub fn from_vec(buffer: Vec<u8>) -> Reader {
        let limit = buffer.len();
        Reader {
            buffer,
            position: 0,
            limit,
            total: 0,
            native: false,
            source: None,
        }
    }

    /// Creates a reader that refills its `buffer_size` bytes from `source`.
    pub fn from_source<R: Read + 'static>(source: R, buffer_size: usize) -> Reader {
        Reader {
            buffer: vec![0; buffer_size],
            position: 0,
            limit: 0,
            total: 0,
            native: false,
            source: Some(Box::new(source)),
        }
    }

    /// Switches between native and compact layout.
    pub fn native(mut self, native: bool) -> Reader {
        self.native = native;
        self
    }

    #[inline(always)]
    pub fn is_native(&self) -> bool {
        self.native
    }

    /// Replaces the buffered bytes and drops any refill source.
    pub fn set_bytes(&mut self, bf: &[u8]) {
        self.buffer.clear();
        self.buffer.extend_from_slice(bf);
        self.position = 0;
        self.limit = bf.len();
        self.total = 0;
        self.source = None;
    }

    #[inline(always)]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Bytes consumed since construction, across refills.
    pub fn total(&self) -> usize {
        self.total + self.position
    }

    /// True when every buffered byte has been consumed and no refill source remains.
    pub fn eof(&mut self) -> Result<bool, Error> {
        if self.position < self.limit {
            return Ok(false);
        }
        Ok(self.optional(1)? == 0)
    }

    /// Reads from the source into `buffer[offset..offset + count]`.
    /// Returns `None` when the source is exhausted or absent.
    fn fill(&mut self, offset: usize, count: usize) -> Result<Option<usize>, Error> {
        let Some(source) = self.source.as_mut() else {
            return Ok(None);
        };
        loop {
            match source.read(&mut self.buffer[offset..offset + count]) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    trace!(filled = n, offset, "refilled read buffer");
                    return Ok(Some(n));
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io(e)),
            }
        }
    }

    /// Moves the unread bytes to the front of the buffer.
    fn compact(&mut self) {
        self.buffer.copy_within(self.position..self.limit, 0);
        self.total += self.position;
        self.limit -= self.position;
        self.position = 0;
    }

    /// Ensures at least `required` bytes are buffered, refilling as needed.
    /// Returns the number of buffered bytes.
    pub fn require(&mut self, required: usize) -> Result<usize, Error> {
        let mut remaining = self.limit - self.position;
        if remaining >= required {
            return Ok(remaining);
        }
        if required > self.capacity() {
            if self.source.is_none() {
                return Err(Error::buffer_underflow(required, remaining));
            }
            return Err(Error::invalid_argument(format!(
                "Buffer too small: capacity {}, required {}",
                self.capacity(),
                required
            )));
        }
        if remaining > 0 && self.limit < self.capacity() {
            match self.fill(self.limit, self.capacity() - self.limit)? {
                None => return Err(Error::buffer_underflow(required, remaining)),
                Some(count) => {
                    remaining += count;
                    self.limit += count;
                    if remaining >= required {
                        return Ok(remaining);
                    }
                }
            }
        }
        self.compact();
        while remaining < required {
            match self.fill(remaining, self.capacity() - remaining)? {
                None => return Err(Error::buffer_underflow(required, remaining)),
                Some(count) => {
                    remaining += count;
                    self.limit = remaining;
                }
            }
        }
        Ok(remaining)
    }

    /// Buffers up to `optional` bytes without failing at the end of the source.
    /// Returns how many bytes are buffered, capped at `optional`.
    pub fn optional(&mut self, optional: usize) -> Result<usize, Error> {
        let optional = optional.min(self.capacity());
        let mut remaining = self.limit - self.position;
        if remaining >= optional {
            return Ok(optional);
        }
        self.compact();
        while remaining < optional {
            match self.fill(remaining, self.capacity() - remaining)? {
                None => break,
                Some(count) => {
                    remaining += count;
                    self.limit = remaining;
                }
            }
        }
        Ok(remaining.min(optional))
    }

    #[inline(always)]
    fn take(&mut self, width: usize) -> Result<&[u8], Error> {
        self.require(width)?;
        let start = self.position;
        self.position += width;
        Ok(&self.buffer[start..start + width])
    }

    pub fn skip(&mut self, mut count: usize) -> Result<(), Error> {
        while count > 0 {
            let step = count.min(self.capacity().max(1));
            self.require(step)?;
            self.position += step;
            count -= step;
        }
        Ok(())
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        Ok(self.take(1)?[0])
    }

    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    #[inline(always)]
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    impl_read_fixed!(i16, u16, i32, u32, i64, u64, f32, f64);

    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        if self.native {
            return self.read_u32();
        }
        Ok(self.read_leb128(32)? as u32)
    }

    pub fn read_varint32(&mut self) -> Result<i32, Error> {
        if self.native {
            return self.read_i32();
        }
        let encoded = self.read_leb128(32)? as u32;
        Ok(((encoded >> 1) as i32) ^ -((encoded & 1) as i32))
    }

    pub fn read_varuint64(&mut self) -> Result<u64, Error> {
        if self.native {
            return self.read_u64();
        }
        self.read_leb128(64)
    }

    pub fn read_varint64(&mut self) -> Result<i64, Error> {
        if self.native {
            return self.read_i64();
        }
        let encoded = self.read_leb128(64)?;
        Ok(((encoded >> 1) as i64) ^ -((encoded & 1) as i64))
    }

    /// Decodes a LEB128 value of at most `bits` bits. The last allowed byte
    /// may only carry the bits that are left, so an overlong encoding fails
    /// instead of being truncated.
    fn read_leb128(&mut self, bits: u32) -> Result<u64, Error> {
        let max_bytes = (bits + 6) / 7;
        let last_bits = bits - 7 * (max_bytes - 1);
        let mut result = 0u64;
        for i in 0..max_bytes {
            let b = self.read_u8()?;
            if i == max_bytes - 1 && (b >> last_bits) != 0 {
                return Err(Error::invalid_data(format!(
                    "Variable-length integer overflows {} bits",
                    bits
                )));
            }
            result |= ((b & 0x7F) as u64) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(Error::invalid_data(format!(
            "Variable-length integer longer than {} bytes",
            max_bytes
        )))
    }

    /// True when a `varint32` can be decoded from already buffered bytes.
    /// Never touches the refill source.
    pub fn can_read_varint(&self) -> bool {
        self.can_read_var(4, 5)
    }

    /// True when a `varint64` can be decoded from already buffered bytes.
    /// Never touches the refill source.
    pub fn can_read_varlong(&self) -> bool {
        self.can_read_var(8, 10)
    }

    fn can_read_var(&self, width: usize, max_bytes: usize) -> bool {
        let buffered = &self.buffer[self.position..self.limit];
        if self.native {
            return buffered.len() >= width;
        }
        buffered.iter().take(max_bytes).any(|b| b & 0x80 == 0)
    }

    pub fn read_varint32s(&mut self, length: usize) -> Result<Vec<i32>, Error> {
        if self.native {
            return self.read_i32s(length);
        }
        (0..length).map(|_| self.read_varint32()).collect()
    }

    pub fn read_varint64s(&mut self, length: usize) -> Result<Vec<i64>, Error> {
        if self.native {
            return self.read_i64s(length);
        }
        (0..length).map(|_| self.read_varint64()).collect()
    }

    pub fn read_string(&mut self) -> Result<String, Error> {
        let len = self.read_varuint32()? as usize;
        let bytes = self.read_bytes(len)?;
        String::from_utf8(bytes).map_err(|e| Error::invalid_data(format!("Invalid UTF-8: {}", e)))
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let mut bytes = vec![0; len];
        self.read_exact_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Copies `out.len()` bytes into `out`, refilling between chunks.
    ///
    /// Each round copies `min(buffered, still needed)` bytes, so the source
    /// and destination offsets advance together however small the refills are.
    pub fn read_exact_into(&mut self, out: &mut [u8]) -> Result<(), Error> {
        let mut offset = 0;
        let mut count = out.len();
        let mut copy_count = count.min(self.limit - self.position);
        loop {
            out[offset..offset + copy_count]
                .copy_from_slice(&self.buffer[self.position..self.position + copy_count]);
            self.position += copy_count;
            count -= copy_count;
            if count == 0 {
                return Ok(());
            }
            offset += copy_count;
            copy_count = count.min(self.capacity());
            if copy_count == 0 {
                return Err(Error::buffer_underflow(count, 0));
            }
            self.require(copy_count)?;
        }
    }

    /// Fills `out` with scalars: one raw byte copy in native mode,
    /// element-wise little-endian decoding otherwise.
    pub fn read_array<T: Scalar>(&mut self, out: &mut [T]) -> Result<(), Error> {
        if self.native {
            return self.read_exact_into(raw::bytes_of_mut(out));
        }
        for slot in out.iter_mut() {
            *slot = T::read_le(self.take(T::WIDTH)?);
        }
        Ok(())
    }

    /// Bulk-decodes into a type-erased target, which must be a `Vec` of a
    /// [`Scalar`] type or of `u8`. Its current length is the element count.
    pub fn read_into(&mut self, target: &mut dyn Any) -> Result<(), Error> {
        macro_rules! try_target {
            ($($ty:ty),*) => {
                $(
                    if let Some(values) = target.downcast_mut::<Vec<$ty>>() {
                        return self.read_array(values.as_mut_slice());
                    }
                )*
            };
        }
        try_target!(i16, u16, i32, u32, i64, u64, f32, f64);
        if let Some(bytes) = target.downcast_mut::<Vec<u8>>() {
            return self.read_exact_into(bytes);
        }
        Err(Error::invalid_argument(
            "Bulk read target must be a vector of numeric scalars",
        ))
    }
}
