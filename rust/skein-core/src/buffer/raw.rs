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

//! Byte views over scalar slices.
//!
//! This is the only place where scalar storage is reinterpreted as bytes.
//! The casts go through `bytemuck`, so they are checked for size and
//! alignment and need no `unsafe`.

use byteorder::{ByteOrder, LittleEndian};
use bytemuck::Pod;

mod private {
    pub trait Sealed {}
}

/// Fixed-width numeric element that can be bulk-copied by the buffers.
pub trait Scalar: Pod + Default + private::Sealed {
    const WIDTH: usize;

    fn read_le(bytes: &[u8]) -> Self;

    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_scalar {
    ($($ty:ident),*) => {
        paste::paste! {
            $(
                impl private::Sealed for $ty {}

                impl Scalar for $ty {
                    const WIDTH: usize = std::mem::size_of::<$ty>();

                    #[inline(always)]
                    fn read_le(bytes: &[u8]) -> Self {
                        LittleEndian::[<read_ $ty>](bytes)
                    }

                    #[inline(always)]
                    fn write_le(self, out: &mut Vec<u8>) {
                        out.extend_from_slice(&self.to_le_bytes());
                    }
                }
            )*
        }
    };
}

impl_scalar!(i16, u16, i32, u32, i64, u64, f32, f64);

#[inline(always)]
pub(super) fn bytes_of<T: Scalar>(values: &[T]) -> &[u8] {
    bytemuck::cast_slice(values)
}

#[inline(always)]
pub(super) fn bytes_of_mut<T: Scalar>(values: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(values)
}
