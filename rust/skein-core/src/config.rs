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

/// Configuration for skein serialization.
///
/// Shared by the [`Skein`](crate::skein::Skein) instance and every
/// `WriteContext`/`ReadContext`/`CopyContext` it creates, so both sides of an
/// operation agree on the wire layout.
#[derive(Clone, Debug)]
pub struct Config {
    /// Whether shared and circular references are tracked.
    /// When disabled, an object reachable twice is written twice and a cycle
    /// fails with a depth error instead of recursing forever.
    pub track_ref: bool,
    /// Whether the native fast path is used: fixed-width scalars in the
    /// host byte order and full-width "varints". Streams written in this mode
    /// can only be read on hosts with the same byte order.
    pub native: bool,
    /// Maximum nesting depth of serializer calls in one operation.
    pub max_depth: u32,
    /// Buffer capacity used when reading from an `std::io::Read` source.
    pub buffer_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            track_ref: false,
            native: false,
            max_depth: 128,
            buffer_size: 4096,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn is_track_ref(&self) -> bool {
        self.track_ref
    }

    #[inline(always)]
    pub fn is_native(&self) -> bool {
        self.native
    }

    #[inline(always)]
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    #[inline(always)]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
}
