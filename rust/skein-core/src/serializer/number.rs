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
use crate::object::ObjectRef;
use crate::resolver::context::ReadContext;
use crate::resolver::context::WriteContext;
use crate::resolver::type_resolver::TypeInfo;
use crate::serializer::{downcast, Serializer};
use std::rc::Rc;

macro_rules! impl_num_serializer {
    ($name:ident, $ty:ty, $writer:ident, $reader:ident) => {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct $name;

        impl Serializer for $name {
            #[inline(always)]
            fn write(&self, context: &mut WriteContext, object: &ObjectRef) -> Result<(), Error> {
                let value = *downcast::<$ty>(object)?;
                context.writer.$writer(value);
                Ok(())
            }

            #[inline(always)]
            fn read(&self, context: &mut ReadContext, _: &TypeInfo) -> Result<ObjectRef, Error> {
                let value: ObjectRef = Rc::new(context.reader.$reader()?);
                Ok(value)
            }
        }
    };
}

impl_num_serializer!(BoolSerializer, bool, write_bool, read_bool);
impl_num_serializer!(I8Serializer, i8, write_i8, read_i8);
impl_num_serializer!(I16Serializer, i16, write_i16, read_i16);
impl_num_serializer!(I32Serializer, i32, write_varint32, read_varint32);
impl_num_serializer!(I64Serializer, i64, write_varint64, read_varint64);
impl_num_serializer!(F32Serializer, f32, write_f32, read_f32);
impl_num_serializer!(F64Serializer, f64, write_f64, read_f64);
