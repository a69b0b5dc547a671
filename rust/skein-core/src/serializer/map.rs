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

//! Codec for associative containers.
//!
//! Layout: the entry count as a varuint, then per entry the key and the
//! value. A slot with a known serializer is written through it (behind a
//! null marker if the slot is nullable); any other slot is written with its
//! runtime type id.

use crate::ensure;
use crate::error::Error;
use crate::object::{AssociativeContainer, ObjectRef, Value};
use crate::resolver::context::{CopyContext, ReadContext, WriteContext};
use crate::resolver::generics::{GenericType, Generics, GenericsScope};
use crate::resolver::type_resolver::{ContainerFactory, TypeInfo, TypeResolver};
use crate::serializer::Serializer;
use std::any::TypeId;
use std::rc::Rc;
use tracing::trace;

/// Declarative key/value configuration of a [`MapSerializer`], applied by
/// [`MapSerializer::from_binding`] once the registry is complete.
///
/// ```rust
/// use skein_core::serializer::map::MapBinding;
///
/// let binding = MapBinding::new()
///     .key_class::<String>()
///     .keys_can_be_null(false);
/// assert!(binding.values_can_be_null);
/// ```
#[derive(Clone)]
pub struct MapBinding {
    pub key_class: Option<TypeId>,
    pub value_class: Option<TypeId>,
    pub key_serializer: Option<Rc<dyn Serializer>>,
    pub value_serializer: Option<Rc<dyn Serializer>>,
    pub keys_can_be_null: bool,
    pub values_can_be_null: bool,
}

impl Default for MapBinding {
    fn default() -> Self {
        MapBinding {
            key_class: None,
            value_class: None,
            key_serializer: None,
            value_serializer: None,
            keys_can_be_null: true,
            values_can_be_null: true,
        }
    }
}

impl MapBinding {
    pub fn new() -> MapBinding {
        MapBinding::default()
    }

    pub fn key_class<K: 'static>(mut self) -> MapBinding {
        self.key_class = Some(TypeId::of::<K>());
        self
    }

    pub fn value_class<V: 'static>(mut self) -> MapBinding {
        self.value_class = Some(TypeId::of::<V>());
        self
    }

    pub fn key_serializer(mut self, serializer: Rc<dyn Serializer>) -> MapBinding {
        self.key_serializer = Some(serializer);
        self
    }

    pub fn value_serializer(mut self, serializer: Rc<dyn Serializer>) -> MapBinding {
        self.value_serializer = Some(serializer);
        self
    }

    pub fn keys_can_be_null(mut self, keys_can_be_null: bool) -> MapBinding {
        self.keys_can_be_null = keys_can_be_null;
        self
    }

    pub fn values_can_be_null(mut self, values_can_be_null: bool) -> MapBinding {
        self.values_can_be_null = values_can_be_null;
        self
    }
}

/// How one side of an entry is encoded for the current call.
struct Slot {
    binding: Option<(Rc<TypeInfo>, Rc<dyn Serializer>)>,
    can_be_null: bool,
    kind: &'static str,
}

impl Slot {
    fn resolve(
        resolver: &TypeResolver,
        generics: &Generics,
        generic_type: Option<&GenericType>,
        class: &Option<Rc<TypeInfo>>,
        serializer: &Option<Rc<dyn Serializer>>,
        can_be_null: bool,
        kind: &'static str,
    ) -> Result<Slot, Error> {
        let binding = match (class, serializer) {
            (Some(class), Some(serializer)) => Some((class.clone(), serializer.clone())),
            _ => match generic_type
                .and_then(|ty| generics.resolve(ty))
                .filter(|type_id| resolver.is_final(*type_id))
            {
                Some(type_id) => {
                    let type_info = resolver.get_type_info(type_id)?;
                    Some((type_info.clone(), resolver.get_serializer(type_info)?))
                }
                None => None,
            },
        };
        Ok(Slot {
            binding,
            can_be_null,
            kind,
        })
    }

    fn check(&self, value: &Value) -> Result<(), Error> {
        ensure!(
            value.is_some() || self.can_be_null,
            Error::null_not_allowed(format!("null map {} is not allowed", self.kind))
        );
        Ok(())
    }

    fn write(&self, context: &mut WriteContext, value: &Value) -> Result<(), Error> {
        match &self.binding {
            Some((class, serializer)) if self.can_be_null => {
                context.write_object_or_null(value, class, serializer.as_ref())
            }
            Some((class, serializer)) => context.write_object(value, class, serializer.as_ref()),
            None => context.write_class_and_object(value),
        }
    }

    fn read(&self, context: &mut ReadContext) -> Result<Value, Error> {
        match &self.binding {
            Some((class, serializer)) if self.can_be_null => {
                context.read_object_or_null(class, serializer.as_ref())
            }
            Some((class, serializer)) => context.read_object(class, serializer.as_ref()).map(Some),
            None => context.read_class_and_object(),
        }
    }
}

fn as_container(object: &ObjectRef) -> Result<&dyn AssociativeContainer, Error> {
    object.as_container().ok_or_else(|| {
        Error::type_error(format!(
            "{} is not an associative container",
            object.type_name()
        ))
    })
}

/// Serializer for any [`AssociativeContainer`].
///
/// Without configuration every key and value is written with its type id.
/// Configuring a class and serializer for a slot, or pushing a declared
/// generic type whose arguments are final, drops the per-element type id.
pub struct MapSerializer {
    key_class: Option<Rc<TypeInfo>>,
    value_class: Option<Rc<TypeInfo>>,
    key_serializer: Option<Rc<dyn Serializer>>,
    value_serializer: Option<Rc<dyn Serializer>>,
    keys_can_be_null: bool,
    values_can_be_null: bool,
    factory: Option<ContainerFactory>,
}

impl Default for MapSerializer {
    fn default() -> Self {
        MapSerializer {
            key_class: None,
            value_class: None,
            key_serializer: None,
            value_serializer: None,
            keys_can_be_null: true,
            values_can_be_null: true,
            factory: None,
        }
    }
}

fn bind_slot(
    resolver: &TypeResolver,
    class: Option<TypeId>,
    serializer: Option<Rc<dyn Serializer>>,
    kind: &str,
) -> Result<(Option<Rc<TypeInfo>>, Option<Rc<dyn Serializer>>), Error> {
    match (class, serializer) {
        (None, None) => Ok((None, None)),
        (None, Some(_)) => Err(Error::type_error(format!(
            "a {kind} serializer needs a {kind} class"
        ))),
        (Some(type_id), serializer) => {
            let type_info = resolver.get_type_info(type_id)?;
            let serializer = match serializer {
                Some(serializer) => serializer,
                None => resolver.get_serializer(type_info)?,
            };
            Ok((Some(type_info.clone()), Some(serializer)))
        }
    }
}

impl MapSerializer {
    pub fn new() -> MapSerializer {
        MapSerializer::default()
    }

    /// Builds a serializer from `binding`. A class without a serializer uses
    /// the class's registered serializer.
    pub fn from_binding(resolver: &TypeResolver, binding: MapBinding) -> Result<MapSerializer, Error> {
        let (key_class, key_serializer) =
            bind_slot(resolver, binding.key_class, binding.key_serializer, "key")?;
        let (value_class, value_serializer) =
            bind_slot(resolver, binding.value_class, binding.value_serializer, "value")?;
        Ok(MapSerializer {
            key_class,
            value_class,
            key_serializer,
            value_serializer,
            keys_can_be_null: binding.keys_can_be_null,
            values_can_be_null: binding.values_can_be_null,
            factory: None,
        })
    }

    /// False if no key is ever null; saves the null marker per key when a
    /// key serializer is known.
    pub fn set_keys_can_be_null(&mut self, keys_can_be_null: bool) {
        self.keys_can_be_null = keys_can_be_null;
    }

    pub fn set_values_can_be_null(&mut self, values_can_be_null: bool) {
        self.values_can_be_null = values_can_be_null;
    }

    /// Sets the concrete class of every key and the serializer used for it.
    /// A class without a serializer leaves keys polymorphic.
    pub fn set_key_class(
        &mut self,
        class: Option<Rc<TypeInfo>>,
        serializer: Option<Rc<dyn Serializer>>,
    ) -> Result<(), Error> {
        ensure!(
            class.is_some() || serializer.is_none(),
            Error::type_error("a key serializer needs a key class")
        );
        self.key_class = class;
        self.key_serializer = serializer;
        Ok(())
    }

    pub fn set_value_class(
        &mut self,
        class: Option<Rc<TypeInfo>>,
        serializer: Option<Rc<dyn Serializer>>,
    ) -> Result<(), Error> {
        ensure!(
            class.is_some() || serializer.is_none(),
            Error::type_error("a value serializer needs a value class")
        );
        self.value_class = class;
        self.value_serializer = serializer;
        Ok(())
    }

    /// Overrides how new containers are created on read and copy. By default
    /// the factory registered with the container type is used.
    pub fn with_factory(mut self, factory: ContainerFactory) -> MapSerializer {
        self.factory = Some(factory);
        self
    }

    fn create(
        &self,
        context: &ReadContext,
        type_info: &TypeInfo,
    ) -> Result<Rc<dyn AssociativeContainer>, Error> {
        match self.factory {
            Some(factory) => Ok(factory()),
            None => context.new_instance(type_info),
        }
    }

    fn create_copy(
        &self,
        context: &CopyContext,
        type_info: &TypeInfo,
    ) -> Result<Rc<dyn AssociativeContainer>, Error> {
        match self.factory {
            Some(factory) => Ok(factory()),
            None => context.new_instance(type_info),
        }
    }

    fn slots(
        &self,
        resolver: &TypeResolver,
        generics: &Generics,
        generic_types: Option<&[GenericType]>,
    ) -> Result<(Slot, Slot), Error> {
        let key = Slot::resolve(
            resolver,
            generics,
            generic_types.and_then(|types| types.first()),
            &self.key_class,
            &self.key_serializer,
            self.keys_can_be_null,
            "key",
        )?;
        let value = Slot::resolve(
            resolver,
            generics,
            generic_types.and_then(|types| types.get(1)),
            &self.value_class,
            &self.value_serializer,
            self.values_can_be_null,
            "value",
        )?;
        Ok((key, value))
    }
}

impl Serializer for MapSerializer {
    fn write(&self, context: &mut WriteContext, object: &ObjectRef) -> Result<(), Error> {
        let map = as_container(object)?;
        let entries = map.entries();
        context.writer.write_varuint32(entries.len() as u32);

        let generic_types = context.next_generic_types();
        let (key_slot, value_slot) = self.slots(
            context.get_resolver(),
            context.generics(),
            generic_types.as_deref(),
        )?;
        let key_type = generic_types
            .as_deref()
            .and_then(|types| types.first())
            .cloned()
            .unwrap_or(GenericType::Unknown);

        for (key, value) in &entries {
            key_slot.check(key)?;
            value_slot.check(value)?;
            {
                let mut scope = context.push_generic_type(&key_type);
                key_slot.write(&mut scope, key)?;
            }
            value_slot.write(context, value)?;
        }
        // the frame pushed by the caller for the whole field
        context.pop_generic_type();
        trace!(entries = entries.len(), "wrote map");
        Ok(())
    }

    fn read(&self, context: &mut ReadContext, type_info: &TypeInfo) -> Result<ObjectRef, Error> {
        let map = self.create(context, type_info)?;
        let len = context.reader.read_varuint32()? as usize;

        let generic_types = context.next_generic_types();
        let (key_slot, value_slot) = self.slots(
            context.get_resolver(),
            context.generics(),
            generic_types.as_deref(),
        )?;
        let key_type = generic_types
            .as_deref()
            .and_then(|types| types.first())
            .cloned()
            .unwrap_or(GenericType::Unknown);

        context.reference(map.clone().into_object());

        for _ in 0..len {
            let key = {
                let mut scope = context.push_generic_type(&key_type);
                key_slot.read(&mut scope)?
            };
            let value = value_slot.read(context)?;
            map.insert(key, value);
        }
        context.pop_generic_type();
        trace!(entries = len, "read map");
        Ok(map.into_object())
    }

    fn copy(&self, context: &mut CopyContext, object: &ObjectRef) -> Result<ObjectRef, Error> {
        let original = as_container(object)?;
        let type_info = context.get_resolver().get_type_info_of(object.as_ref())?;
        let copy = self.create_copy(context, type_info)?;
        context.reference(copy.clone().into_object());

        for (key, value) in original.entries() {
            let key = context.copy(&key)?;
            let value = context.copy(&value)?;
            copy.insert(key, value);
        }
        Ok(copy.into_object())
    }
}
