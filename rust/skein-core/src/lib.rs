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

//! # Skein Core
//!
//! Core engine of the skein object-graph serialization framework.
//!
//! ## Architecture
//!
//! - **`skein`**: the [`Skein`] instance: configuration, registration and the
//!   serialize/deserialize/copy entry points
//! - **`buffer`**: [`Writer`](buffer::Writer) and the refillable
//!   [`Reader`](buffer::Reader), in compact or native mode
//! - **`object`**: the dynamic object model and the associative containers
//! - **`resolver`**: type registry, reference tables, generic type stack and
//!   the per-operation contexts
//! - **`serializer`**: the [`Serializer`](serializer::Serializer) trait, the
//!   builtin leaf serializers and the map codec
//! - **`types`**: wire constants
//! - **`error`**: error type and the `ensure!` macro
//!
//! ## Wire modes
//!
//! Compact mode writes little-endian scalars and LEB128 varints and is
//! portable. Native mode writes every scalar, varints included, at full
//! width in host byte order, which the reader decodes with plain loads and
//! bulk copies; the stream header records the byte order and a host with the
//! other order refuses the stream.
//!
//! ## Usage
//!
//! ```rust
//! use skein_core::object::{value, AssociativeContainer, LinkedMapObject};
//! use skein_core::Skein;
//!
//! let skein = Skein::default().native(true);
//! let map = LinkedMapObject::from_entries([
//!     (value(String::from("one")), value(1i64)),
//!     (value(String::from("two")), None),
//! ]);
//! let bytes = skein.serialize(&Some(map.into_object())).unwrap();
//! let decoded = skein.deserialize(&bytes).unwrap().unwrap();
//! assert_eq!(decoded.as_container().unwrap().len(), 2);
//! ```

pub mod buffer;
pub mod config;
pub mod error;
pub mod object;
pub mod resolver;
pub mod serializer;
pub mod skein;
pub mod types;

pub use crate::skein::Skein;
