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

//! Byte buffers used by every serializer.
//!
//! [`Writer`] appends to a growable `Vec<u8>`; [`Reader`] decodes from a fixed
//! capacity buffer that can be refilled from any [`std::io::Read`] source.
//! Both run in one of two layouts, picked at construction:
//!
//! - **compact**: little-endian fixed-width scalars and LEB128 varints
//!   (zig-zag for signed values). Portable between hosts.
//! - **native**: fixed-width scalars in the host byte order, varints written
//!   and read at full width, bulk arrays copied as raw bytes. Faster to decode,
//!   but only readable on a host with the same byte order as the writer.

mod raw;
mod reader;
mod writer;

pub use raw::Scalar;
pub use reader::Reader;
pub use writer::Writer;
