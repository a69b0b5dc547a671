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
use crate::object::{AssociativeContainer, Object, Value};
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::generics::GenericType;
use crate::resolver::type_resolver::{container_factory, TypeInfo, TypeResolver};
use crate::serializer::map::{MapBinding, MapSerializer};
use crate::serializer::Serializer;
use crate::types::config_flags::{
    IS_LITTLE_ENDIAN_FLAG, IS_NATIVE_FLAG, IS_NULL_FLAG, IS_TRACK_REF_FLAG,
};
use crate::types::{FIRST_USER_TYPE_ID, NATIVE_LITTLE_ENDIAN};
use std::io::Read;
use std::rc::Rc;
use tracing::{debug, trace};

/// The main skein serialization instance.
///
/// `Skein` holds the configuration and the type registry. Both are fixed
/// once setup is done; every operation creates its own context, so one
/// instance serves any number of sequential operations.
///
/// # Examples
///
/// ```rust
/// use skein_core::object::{value, AssociativeContainer, HashMapObject};
/// use skein_core::Skein;
///
/// let skein = Skein::default().track_ref(true);
/// let map = HashMapObject::from_entries([(value(String::from("a")), value(1i32))]);
/// let bytes = skein.serialize(&Some(map.into_object())).unwrap();
///
/// let decoded = skein.deserialize(&bytes).unwrap().unwrap();
/// assert_eq!(decoded.as_container().unwrap().len(), 1);
/// ```
pub struct Skein {
    config: Config,
    type_resolver: TypeResolver,
}

impl Default for Skein {
    fn default() -> Self {
        Skein {
            config: Config::default(),
            type_resolver: TypeResolver::default(),
        }
    }
}

impl Skein {
    /// Enables tracking of shared and circular references.
    ///
    /// Without it an object reachable twice is written twice, and a cycle
    /// fails once it nests deeper than [`Skein::max_depth`].
    pub fn track_ref(mut self, track_ref: bool) -> Self {
        self.config.track_ref = track_ref;
        self
    }

    /// Selects the native fast path: host byte order fixed-width scalars and
    /// full-width varints. Native streams are rejected by hosts with the
    /// other byte order.
    pub fn native(mut self, native: bool) -> Self {
        self.config.native = native;
        self
    }

    pub fn max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Buffer capacity for [`Skein::deserialize_from`].
    pub fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.config.buffer_size = buffer_size;
        self
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn get_type_resolver(&self) -> &TypeResolver {
        &self.type_resolver
    }

    /// Registers a type with full control over its flags.
    pub fn register(&mut self, type_info: TypeInfo) -> Result<(), Error> {
        ensure!(
            type_info.get_id() >= FIRST_USER_TYPE_ID,
            Error::type_error(format!(
                "type id {} of {} is reserved, user ids start at {}",
                type_info.get_id(),
                type_info.get_name(),
                FIRST_USER_TYPE_ID
            ))
        );
        self.type_resolver.register(type_info)
    }

    /// Registers a final, reference tracked type with its serializer.
    pub fn register_serializer<T: Object>(
        &mut self,
        id: u32,
        serializer: Rc<dyn Serializer>,
    ) -> Result<(), Error> {
        self.register(TypeInfo::with_serializer::<T>(id, serializer).final_type(true))
    }

    /// Registers container type `M` with an unconfigured [`MapSerializer`].
    pub fn register_map<M: AssociativeContainer + Default>(&mut self, id: u32) -> Result<(), Error> {
        self.register(
            TypeInfo::with_serializer::<M>(id, Rc::new(MapSerializer::default()))
                .container_factory(container_factory::<M>()),
        )
    }

    /// Registers container type `M` with a [`MapSerializer`] built from
    /// `binding`. The binding is resolved on first use, so key and value
    /// classes may be registered after the container.
    pub fn register_map_with<M: AssociativeContainer + Default>(
        &mut self,
        id: u32,
        binding: MapBinding,
    ) -> Result<(), Error> {
        self.register(
            TypeInfo::new::<M>(id, move |resolver| {
                let serializer = MapSerializer::from_binding(resolver, binding.clone())?;
                Ok(Rc::new(serializer) as Rc<dyn Serializer>)
            })
            .container_factory(container_factory::<M>()),
        )
    }

    fn new_writer(&self) -> Writer {
        if self.config.is_native() {
            Writer::native()
        } else {
            Writer::new()
        }
    }

    pub fn write_head(&self, is_none: bool, writer: &mut Writer) {
        let mut bitmap = 0;
        if NATIVE_LITTLE_ENDIAN {
            bitmap |= IS_LITTLE_ENDIAN_FLAG;
        }
        if self.config.is_native() {
            bitmap |= IS_NATIVE_FLAG;
        }
        if self.config.is_track_ref() {
            bitmap |= IS_TRACK_REF_FLAG;
        }
        if is_none {
            bitmap |= IS_NULL_FLAG;
        }
        writer.write_u8(bitmap);
    }

    /// Reads and checks the header. Returns whether the stream holds null.
    fn read_head(&self, reader: &mut Reader) -> Result<bool, Error> {
        let bitmap = reader.read_u8()?;
        let peer_native = (bitmap & IS_NATIVE_FLAG) != 0;
        ensure!(
            peer_native == self.config.is_native(),
            Error::invalid_data(format!(
                "header bitmap mismatch at native bit: stream native={}, configured native={}",
                peer_native,
                self.config.is_native()
            ))
        );
        if peer_native {
            let peer_little_endian = (bitmap & IS_LITTLE_ENDIAN_FLAG) != 0;
            if peer_little_endian != NATIVE_LITTLE_ENDIAN {
                debug!(
                    peer_little_endian,
                    host_little_endian = NATIVE_LITTLE_ENDIAN,
                    "native stream written with another byte order"
                );
                return Err(Error::invalid_data(
                    "native stream was written on a host with a different byte order",
                ));
            }
        }
        let peer_track_ref = (bitmap & IS_TRACK_REF_FLAG) != 0;
        ensure!(
            peer_track_ref == self.config.is_track_ref(),
            Error::invalid_data("header bitmap mismatch at reference tracking bit")
        );
        Ok((bitmap & IS_NULL_FLAG) != 0)
    }

    /// Serializes `value` with its runtime type id, so it can be read back
    /// without a declared type.
    pub fn serialize(&self, value: &Value) -> Result<Vec<u8>, Error> {
        let mut writer = self.new_writer();
        self.serialize_to(value, &mut writer)?;
        Ok(writer.into_inner())
    }

    /// Appends the serialized `value` to `writer`, whose mode must match the
    /// configuration.
    pub fn serialize_to(&self, value: &Value, writer: &mut Writer) -> Result<(), Error> {
        ensure!(
            writer.is_native() == self.config.is_native(),
            Error::invalid_argument("writer mode does not match the native setting")
        );
        let start = writer.len();
        self.write_head(value.is_none(), writer);
        if value.is_some() {
            let mut context = WriteContext::new(&self.type_resolver, &self.config, writer);
            context.write_class_and_object(value)?;
        }
        trace!(bytes = writer.len() - start, "serialized");
        Ok(())
    }

    /// Serializes `value` as a field declared with `declared`. Final declared
    /// types, and final type arguments of declared containers, are written
    /// without type ids.
    pub fn serialize_field(&self, declared: &GenericType, value: &Value) -> Result<Vec<u8>, Error> {
        let mut writer = self.new_writer();
        self.write_head(value.is_none(), &mut writer);
        if value.is_some() {
            let mut context = WriteContext::new(&self.type_resolver, &self.config, &mut writer);
            context.write_field(declared, value)?;
        }
        trace!(bytes = writer.len(), "serialized field");
        Ok(writer.into_inner())
    }

    pub fn deserialize(&self, bf: &[u8]) -> Result<Value, Error> {
        let mut reader = Reader::new(bf).native(self.config.is_native());
        self.deserialize_with_reader(&mut reader)
    }

    /// Deserializes from a byte source, refilling a buffer of
    /// [`Skein::buffer_size`] bytes as needed.
    pub fn deserialize_from<R: Read + 'static>(&self, source: R) -> Result<Value, Error> {
        let mut reader =
            Reader::from_source(source, self.config.buffer_size()).native(self.config.is_native());
        self.deserialize_with_reader(&mut reader)
    }

    pub fn deserialize_with_reader(&self, reader: &mut Reader) -> Result<Value, Error> {
        ensure!(
            reader.is_native() == self.config.is_native(),
            Error::invalid_argument("reader mode does not match the native setting")
        );
        if self.read_head(reader)? {
            return Ok(None);
        }
        let value = {
            let mut context = ReadContext::new(&self.type_resolver, &self.config, reader);
            context.read_class_and_object()?
        };
        trace!(bytes = reader.total(), "deserialized");
        Ok(value)
    }

    /// Mirror of [`Skein::serialize_field`].
    pub fn deserialize_field(&self, declared: &GenericType, bf: &[u8]) -> Result<Value, Error> {
        let mut reader = Reader::new(bf).native(self.config.is_native());
        if self.read_head(&mut reader)? {
            return Ok(None);
        }
        let mut context = ReadContext::new(&self.type_resolver, &self.config, &mut reader);
        context.read_field(declared)
    }

    /// Deep copy of `value`. Shared and cyclic references keep their shape
    /// whether or not reference tracking is enabled.
    pub fn copy(&self, value: &Value) -> Result<Value, Error> {
        CopyContext::new(&self.type_resolver, &self.config).copy(value)
    }
}
