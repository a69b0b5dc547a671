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

use crate::error::Error;
use crate::object::{Object, ObjectRef};
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::type_resolver::TypeInfo;

pub mod map;
pub mod number;
pub mod string;

/// Encodes, decodes and copies objects of one registered type.
///
/// Serializers are stateless after setup and shared between operations; all
/// per-operation state lives in the contexts.
pub trait Serializer {
    /// Writes the payload of `object`. Markers and type ids are written by
    /// the context before this is called.
    fn write(&self, context: &mut WriteContext, object: &ObjectRef) -> Result<(), Error>;

    /// Reads the payload of an object of the type described by `type_info`.
    fn read(&self, context: &mut ReadContext, type_info: &TypeInfo) -> Result<ObjectRef, Error>;

    /// Deep copy. The default returns the same instance, which is right for
    /// immutable types only.
    fn copy(&self, _context: &mut CopyContext, object: &ObjectRef) -> Result<ObjectRef, Error> {
        Ok(object.clone())
    }
}

/// Borrows the concrete value behind `object`, or fails with a type error.
pub fn downcast<T: Object>(object: &ObjectRef) -> Result<&T, Error> {
    object.downcast_ref::<T>().ok_or_else(|| {
        Error::type_error(format!(
            "expected {}, found {}",
            std::any::type_name::<T>(),
            object.type_name()
        ))
    })
}
