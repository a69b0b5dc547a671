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

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Marker written in front of nullable or reference-tracked payloads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(i8)]
pub enum RefFlag {
    Null = -3,
    // Ref is followed by the varuint id of an object written earlier in the
    // same operation.
    Ref = -2,
    // NotNullValue precedes the payload of an untracked, non-null object.
    NotNullValue = -1,
    // RefValue precedes the payload of a tracked object seen for the first time.
    RefValue = 0,
}

/// Type ids reserved for the types every `TypeResolver` registers up front.
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[allow(non_camel_case_types)]
#[repr(u32)]
pub enum BuiltinId {
    BOOL = 1,
    INT8 = 2,
    INT16 = 3,
    INT32 = 4,
    INT64 = 5,
    FLOAT32 = 6,
    FLOAT64 = 7,
    STRING = 8,
    HASH_MAP = 9,
    LINKED_MAP = 10,
}

/// Ids below this value are reserved for builtin registrations.
pub const FIRST_USER_TYPE_ID: u32 = 32;

/// Polymorphic type ids are written shifted by one; zero encodes null.
pub const NULL_TYPE_ID: u32 = 0;

pub const NATIVE_LITTLE_ENDIAN: bool = cfg!(target_endian = "little");

pub mod config_flags {
    pub const IS_NULL_FLAG: u8 = 1 << 0;
    pub const IS_LITTLE_ENDIAN_FLAG: u8 = 1 << 1;
    pub const IS_NATIVE_FLAG: u8 = 1 << 2;
    pub const IS_TRACK_REF_FLAG: u8 = 1 << 3;
}
