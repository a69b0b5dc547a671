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

/// Length-prefixed UTF-8.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringSerializer;

impl Serializer for StringSerializer {
    #[inline]
    fn write(&self, context: &mut WriteContext, object: &ObjectRef) -> Result<(), Error> {
        context.writer.write_string(downcast::<String>(object)?);
        Ok(())
    }

    #[inline]
    fn read(&self, context: &mut ReadContext, _: &TypeInfo) -> Result<ObjectRef, Error> {
        let value: ObjectRef = Rc::new(context.reader.read_string()?);
        Ok(value)
    }
}
