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

use crate::buffer::{Reader, Writer};
use crate::config::Config;
use crate::ensure;
use crate::error::Error;
use crate::object::{AssociativeContainer, ObjectRef, Value};
use crate::resolver::generics::{GenericType, Generics, GenericsScope};
use crate::resolver::ref_resolver::{CopyRefs, RefReader, RefWriter};
use crate::resolver::type_resolver::{TypeInfo, TypeResolver};
use crate::serializer::Serializer;
use crate::types::{RefFlag, NULL_TYPE_ID};
use std::rc::Rc;

#[cold]
fn depth_exceeded(max_depth: u32, depth: usize) -> Error {
    Error::depth_exceed(format!(
        "Maximum nesting depth ({max_depth}) exceeded. Current depth: {depth}. \
        This may indicate a cycle written with reference tracking disabled, \
        or an overly deep object graph."
    ))
}

fn check_type(object: &ObjectRef, type_info: &TypeInfo) -> Result<(), Error> {
    ensure!(
        object.concrete_type_id() == type_info.get_type_id(),
        Error::type_error(format!(
            "expected {}, found {}",
            type_info.get_name(),
            object.type_name()
        ))
    );
    Ok(())
}

fn new_container(type_info: &TypeInfo) -> Result<Rc<dyn AssociativeContainer>, Error> {
    match type_info.get_container_factory() {
        Some(factory) => Ok(factory()),
        None => Err(Error::container_construction(format!(
            "no container factory registered for {}",
            type_info.get_name()
        ))),
    }
}

pub struct WriteContext<'a> {
    pub writer: &'a mut Writer,
    resolver: &'a TypeResolver,
    config: &'a Config,
    ref_writer: RefWriter,
    generics: Generics,
    depth: usize,
}

impl<'a> WriteContext<'a> {
    pub fn new(
        resolver: &'a TypeResolver,
        config: &'a Config,
        writer: &'a mut Writer,
    ) -> WriteContext<'a> {
        WriteContext {
            writer,
            resolver,
            config,
            ref_writer: RefWriter::new(),
            generics: Generics::new(),
            depth: 0,
        }
    }

    pub fn get_resolver(&self) -> &'a TypeResolver {
        self.resolver
    }

    pub fn get_config(&self) -> &'a Config {
        self.config
    }

    #[inline(always)]
    fn tracks(&self, type_info: &TypeInfo) -> bool {
        self.config.is_track_ref() && type_info.is_track_ref()
    }

    /// Writes a nullable object whose type is known to both sides.
    pub fn write_object_or_null(
        &mut self,
        value: &Value,
        type_info: &TypeInfo,
        serializer: &dyn Serializer,
    ) -> Result<(), Error> {
        let Some(object) = value else {
            self.writer.write_i8(RefFlag::Null.into());
            return Ok(());
        };
        check_type(object, type_info)?;
        if self.tracks(type_info) {
            if self.ref_writer.try_write_ref(self.writer, object) {
                return Ok(());
            }
        } else {
            self.writer.write_i8(RefFlag::NotNullValue.into());
        }
        self.write_data(object, serializer)
    }

    /// Writes a non-null object whose type is known to both sides. Untracked
    /// types are written without any marker.
    pub fn write_object(
        &mut self,
        value: &Value,
        type_info: &TypeInfo,
        serializer: &dyn Serializer,
    ) -> Result<(), Error> {
        let Some(object) = value else {
            return Err(Error::null_not_allowed(format!(
                "null {} in a non-nullable slot",
                type_info.get_name()
            )));
        };
        check_type(object, type_info)?;
        if self.tracks(type_info) && self.ref_writer.try_write_ref(self.writer, object) {
            return Ok(());
        }
        self.write_data(object, serializer)
    }

    /// Writes the type id of the runtime type followed by the object, so the
    /// reader needs no declared type. A null value is written as type id 0.
    pub fn write_class_and_object(&mut self, value: &Value) -> Result<(), Error> {
        let Some(object) = value else {
            self.writer.write_varuint32(NULL_TYPE_ID);
            return Ok(());
        };
        let resolver = self.resolver;
        let type_info = resolver.get_type_info_of(object.as_ref())?;
        let serializer = resolver.get_serializer(type_info)?;
        self.writer.write_varuint32(type_info.get_id() + 1);
        if self.tracks(type_info) && self.ref_writer.try_write_ref(self.writer, object) {
            return Ok(());
        }
        self.write_data(object, serializer.as_ref())
    }

    /// Writes a field declared with `declared`. The declared type is pushed
    /// as a generic frame for the field's serializer; a final declared type
    /// is written without a type id.
    pub fn write_field(&mut self, declared: &GenericType, value: &Value) -> Result<(), Error> {
        let resolver = self.resolver;
        let typed = declared
            .type_id()
            .filter(|type_id| resolver.is_final(*type_id));
        let mut scope = self.push_generic_type(declared);
        match typed {
            Some(type_id) => {
                let type_info = resolver.get_type_info(type_id)?;
                let serializer = resolver.get_serializer(type_info)?;
                scope.write_object_or_null(value, type_info, serializer.as_ref())
            }
            None => scope.write_class_and_object(value),
        }
    }

    fn write_data(&mut self, object: &ObjectRef, serializer: &dyn Serializer) -> Result<(), Error> {
        self.inc_depth()?;
        let result = serializer.write(self, object);
        self.dec_depth();
        result
    }

    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config.max_depth() as usize {
            let err = depth_exceeded(self.config.max_depth(), self.depth);
            self.depth -= 1;
            return Err(err);
        }
        Ok(())
    }

    pub fn dec_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl GenericsScope for WriteContext<'_> {
    fn generics(&self) -> &Generics {
        &self.generics
    }

    fn generics_mut(&mut self) -> &mut Generics {
        &mut self.generics
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

pub struct ReadContext<'a> {
    pub reader: &'a mut Reader,
    resolver: &'a TypeResolver,
    config: &'a Config,
    ref_reader: RefReader,
    generics: Generics,
    depth: usize,
}

impl<'a> ReadContext<'a> {
    pub fn new(
        resolver: &'a TypeResolver,
        config: &'a Config,
        reader: &'a mut Reader,
    ) -> ReadContext<'a> {
        ReadContext {
            reader,
            resolver,
            config,
            ref_reader: RefReader::new(),
            generics: Generics::new(),
            depth: 0,
        }
    }

    pub fn get_resolver(&self) -> &'a TypeResolver {
        self.resolver
    }

    pub fn get_config(&self) -> &'a Config {
        self.config
    }

    #[inline(always)]
    fn tracks(&self, type_info: &TypeInfo) -> bool {
        self.config.is_track_ref() && type_info.is_track_ref()
    }

    fn read_flag(&mut self) -> Result<RefFlag, Error> {
        let flag = self.reader.read_i8()?;
        RefFlag::try_from(flag)
            .map_err(|_| Error::invalid_data(format!("unknown reference flag {flag}")))
    }

    pub fn read_object_or_null(
        &mut self,
        type_info: &TypeInfo,
        serializer: &dyn Serializer,
    ) -> Result<Value, Error> {
        let object = match self.read_flag()? {
            RefFlag::Null => return Ok(None),
            RefFlag::Ref => {
                let ref_id = self.reader.read_varuint32()?;
                self.ref_reader.get(ref_id)?
            }
            RefFlag::NotNullValue => self.read_data(type_info, serializer, None)?,
            RefFlag::RefValue => {
                let ref_id = self.ref_reader.reserve();
                self.read_data(type_info, serializer, Some(ref_id))?
            }
        };
        Ok(Some(object))
    }

    pub fn read_object(
        &mut self,
        type_info: &TypeInfo,
        serializer: &dyn Serializer,
    ) -> Result<ObjectRef, Error> {
        if self.tracks(type_info) {
            self.read_tracked(type_info, serializer)
        } else {
            self.read_data(type_info, serializer, None)
        }
    }

    /// Reads an object written by
    /// [`WriteContext::write_class_and_object`]. Fails with
    /// [`Error::UnresolvedType`] on an unknown type id.
    pub fn read_class_and_object(&mut self) -> Result<Value, Error> {
        let id = self.reader.read_varuint32()?;
        if id == NULL_TYPE_ID {
            return Ok(None);
        }
        let resolver = self.resolver;
        let type_info = resolver.get_type_info_by_id(id - 1)?;
        let serializer = resolver.get_serializer(type_info)?;
        let object = if self.tracks(type_info) {
            self.read_tracked(type_info, serializer.as_ref())?
        } else {
            self.read_data(type_info, serializer.as_ref(), None)?
        };
        Ok(Some(object))
    }

    /// Mirror of [`WriteContext::write_field`].
    pub fn read_field(&mut self, declared: &GenericType) -> Result<Value, Error> {
        let resolver = self.resolver;
        let typed = declared
            .type_id()
            .filter(|type_id| resolver.is_final(*type_id));
        let mut scope = self.push_generic_type(declared);
        match typed {
            Some(type_id) => {
                let type_info = resolver.get_type_info(type_id)?;
                let serializer = resolver.get_serializer(type_info)?;
                scope.read_object_or_null(type_info, serializer.as_ref())
            }
            None => scope.read_class_and_object(),
        }
    }

    fn read_tracked(
        &mut self,
        type_info: &TypeInfo,
        serializer: &dyn Serializer,
    ) -> Result<ObjectRef, Error> {
        match self.read_flag()? {
            RefFlag::Ref => {
                let ref_id = self.reader.read_varuint32()?;
                self.ref_reader.get(ref_id)
            }
            RefFlag::RefValue => {
                let ref_id = self.ref_reader.reserve();
                self.read_data(type_info, serializer, Some(ref_id))
            }
            flag => Err(Error::invalid_data(format!(
                "unexpected {flag:?} flag before a non-null {}",
                type_info.get_name()
            ))),
        }
    }

    fn read_data(
        &mut self,
        type_info: &TypeInfo,
        serializer: &dyn Serializer,
        ref_id: Option<u32>,
    ) -> Result<ObjectRef, Error> {
        self.inc_depth()?;
        let pending = self.ref_reader.push_pending(ref_id);
        let result = serializer.read(self, type_info);
        self.dec_depth();
        let object = result?;
        if self.ref_reader.pending_len() == pending {
            self.ref_reader.reference(object.clone());
        }
        Ok(object)
    }

    /// Binds `object` to the reference id of the object being read, so that
    /// back references inside its payload resolve to it. Containers call this
    /// before reading their entries.
    pub fn reference(&mut self, object: ObjectRef) {
        self.ref_reader.reference(object);
    }

    pub fn new_instance(
        &self,
        type_info: &TypeInfo,
    ) -> Result<Rc<dyn AssociativeContainer>, Error> {
        new_container(type_info)
    }

    pub fn inc_depth(&mut self) -> Result<(), Error> {
        self.depth += 1;
        if self.depth > self.config.max_depth() as usize {
            let err = depth_exceeded(self.config.max_depth(), self.depth);
            self.depth -= 1;
            return Err(err);
        }
        Ok(())
    }

    pub fn dec_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }
}

impl GenericsScope for ReadContext<'_> {
    fn generics(&self) -> &Generics {
        &self.generics
    }

    fn generics_mut(&mut self) -> &mut Generics {
        &mut self.generics
    }

    fn depth(&self) -> usize {
        self.depth
    }
}

/// Context of a deep copy. Every object is tracked, so shared and cyclic
/// graphs come out with the same shape.
pub struct CopyContext<'a> {
    resolver: &'a TypeResolver,
    config: &'a Config,
    refs: CopyRefs,
    depth: usize,
}

impl<'a> CopyContext<'a> {
    pub fn new(resolver: &'a TypeResolver, config: &'a Config) -> CopyContext<'a> {
        CopyContext {
            resolver,
            config,
            refs: CopyRefs::new(),
            depth: 0,
        }
    }

    pub fn get_resolver(&self) -> &'a TypeResolver {
        self.resolver
    }

    pub fn copy(&mut self, value: &Value) -> Result<Value, Error> {
        match value {
            None => Ok(None),
            Some(object) => self.copy_object(object).map(Some),
        }
    }

    pub fn copy_object(&mut self, object: &ObjectRef) -> Result<ObjectRef, Error> {
        if let Some(copy) = self.refs.get(object) {
            return Ok(copy);
        }
        let resolver = self.resolver;
        let type_info = resolver.get_type_info_of(object.as_ref())?;
        let serializer = resolver.get_serializer(type_info)?;

        self.depth += 1;
        if self.depth > self.config.max_depth() as usize {
            let err = depth_exceeded(self.config.max_depth(), self.depth);
            self.depth -= 1;
            return Err(err);
        }
        let pending = self.refs.push_pending(object);
        let result = serializer.copy(self, object);
        self.depth -= 1;
        let copy = result?;
        if self.refs.pending_len() == pending {
            self.refs.reference(copy.clone());
        }
        Ok(copy)
    }

    /// Binds `copy` to the original being copied. Containers call this
    /// before copying their entries.
    pub fn reference(&mut self, copy: ObjectRef) {
        self.refs.reference(copy);
    }

    pub fn new_instance(
        &self,
        type_info: &TypeInfo,
    ) -> Result<Rc<dyn AssociativeContainer>, Error> {
        new_container(type_info)
    }
}
