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

use crate::ensure;
use crate::error::Error;
use crate::object::{AssociativeContainer, HashMapObject, LinkedMapObject, Object};
use crate::serializer::map::MapSerializer;
use crate::serializer::number::{
    BoolSerializer, F32Serializer, F64Serializer, I16Serializer, I32Serializer, I64Serializer,
    I8Serializer,
};
use crate::serializer::string::StringSerializer;
use crate::serializer::Serializer;
use crate::types::BuiltinId;
use std::any::TypeId;
use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Creates an empty container of a registered associative type.
pub type ContainerFactory = fn() -> Rc<dyn AssociativeContainer>;

/// Builds the serializer of a type on first use. Runs against the complete
/// registry, so it may look up the serializers of other registered types.
pub type SerializerFactory = Box<dyn Fn(&TypeResolver) -> Result<Rc<dyn Serializer>, Error>>;

/// Returns the default factory of container type `M`.
pub fn container_factory<M: AssociativeContainer + Default>() -> ContainerFactory {
    fn create<M: AssociativeContainer + Default>() -> Rc<dyn AssociativeContainer> {
        Rc::new(M::default())
    }
    create::<M>
}

pub struct TypeInfo {
    id: u32,
    type_id: TypeId,
    name: &'static str,
    is_final: bool,
    track_ref: bool,
    factory: Option<SerializerFactory>,
    serializer: OnceCell<Rc<dyn Serializer>>,
    creating: Cell<bool>,
    container_factory: Option<ContainerFactory>,
}

impl TypeInfo {
    /// Registration whose serializer is built lazily by `factory`.
    /// Not final, reference tracked.
    pub fn new<T: Object>(
        id: u32,
        factory: impl Fn(&TypeResolver) -> Result<Rc<dyn Serializer>, Error> + 'static,
    ) -> TypeInfo {
        TypeInfo {
            id,
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            is_final: false,
            track_ref: true,
            factory: Some(Box::new(factory)),
            serializer: OnceCell::new(),
            creating: Cell::new(false),
            container_factory: None,
        }
    }

    /// Registration with a ready serializer instance.
    pub fn with_serializer<T: Object>(id: u32, serializer: Rc<dyn Serializer>) -> TypeInfo {
        let cell = OnceCell::new();
        let _ = cell.set(serializer);
        TypeInfo {
            id,
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            is_final: false,
            track_ref: true,
            factory: None,
            serializer: cell,
            creating: Cell::new(false),
            container_factory: None,
        }
    }

    /// A final type has no other runtime types behind it, so a slot declared
    /// with it can be written without a type id.
    pub fn final_type(mut self, is_final: bool) -> TypeInfo {
        self.is_final = is_final;
        self
    }

    pub fn track_ref(mut self, track_ref: bool) -> TypeInfo {
        self.track_ref = track_ref;
        self
    }

    pub fn container_factory(mut self, factory: ContainerFactory) -> TypeInfo {
        self.container_factory = Some(factory);
        self
    }

    #[inline(always)]
    pub fn get_id(&self) -> u32 {
        self.id
    }

    #[inline(always)]
    pub fn get_type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline(always)]
    pub fn get_name(&self) -> &'static str {
        self.name
    }

    #[inline(always)]
    pub fn is_final(&self) -> bool {
        self.is_final
    }

    #[inline(always)]
    pub fn is_track_ref(&self) -> bool {
        self.track_ref
    }

    pub fn get_container_factory(&self) -> Option<ContainerFactory> {
        self.container_factory
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("is_final", &self.is_final)
            .field("track_ref", &self.track_ref)
            .finish()
    }
}

/// Registry of the types a `Skein` instance can serialize, keyed both by
/// Rust type and by wire id.
pub struct TypeResolver {
    by_type: HashMap<TypeId, Rc<TypeInfo>>,
    by_id: HashMap<u32, Rc<TypeInfo>>,
}

impl Default for TypeResolver {
    fn default() -> Self {
        let mut resolver = TypeResolver::empty();
        resolver.register_builtin_types();
        resolver
    }
}

impl TypeResolver {
    /// A registry without the builtin types.
    pub fn empty() -> TypeResolver {
        TypeResolver {
            by_type: HashMap::new(),
            by_id: HashMap::new(),
        }
    }

    fn register_builtin_types(&mut self) {
        fn leaf<T: Object>(id: BuiltinId, serializer: Rc<dyn Serializer>) -> TypeInfo {
            TypeInfo::with_serializer::<T>(id.into(), serializer)
                .final_type(true)
                .track_ref(false)
        }

        self.insert(leaf::<bool>(BuiltinId::BOOL, Rc::new(BoolSerializer)));
        self.insert(leaf::<i8>(BuiltinId::INT8, Rc::new(I8Serializer)));
        self.insert(leaf::<i16>(BuiltinId::INT16, Rc::new(I16Serializer)));
        self.insert(leaf::<i32>(BuiltinId::INT32, Rc::new(I32Serializer)));
        self.insert(leaf::<i64>(BuiltinId::INT64, Rc::new(I64Serializer)));
        self.insert(leaf::<f32>(BuiltinId::FLOAT32, Rc::new(F32Serializer)));
        self.insert(leaf::<f64>(BuiltinId::FLOAT64, Rc::new(F64Serializer)));
        self.insert(leaf::<String>(BuiltinId::STRING, Rc::new(StringSerializer)));
        self.insert(
            TypeInfo::with_serializer::<HashMapObject>(
                BuiltinId::HASH_MAP.into(),
                Rc::new(MapSerializer::default()),
            )
            .container_factory(container_factory::<HashMapObject>()),
        );
        self.insert(
            TypeInfo::with_serializer::<LinkedMapObject>(
                BuiltinId::LINKED_MAP.into(),
                Rc::new(MapSerializer::default()),
            )
            .container_factory(container_factory::<LinkedMapObject>()),
        );
    }

    fn insert(&mut self, info: TypeInfo) {
        debug!(
            id = info.id,
            name = info.name,
            is_final = info.is_final,
            track_ref = info.track_ref,
            "registered type"
        );
        let info = Rc::new(info);
        self.by_id.insert(info.id, info.clone());
        self.by_type.insert(info.type_id, info);
    }

    /// Adds a registration. Both the wire id and the Rust type must be new.
    pub fn register(&mut self, info: TypeInfo) -> Result<(), Error> {
        if let Some(existing) = self.by_id.get(&info.id) {
            return Err(Error::type_error(format!(
                "type id {} of {} is already taken by {}",
                info.id, info.name, existing.name
            )));
        }
        ensure!(
            !self.by_type.contains_key(&info.type_id),
            Error::type_error(format!("{} is already registered", info.name))
        );
        self.insert(info);
        Ok(())
    }

    pub fn get_type_info(&self, type_id: TypeId) -> Result<&Rc<TypeInfo>, Error> {
        self.by_type
            .get(&type_id)
            .ok_or_else(|| Error::unresolved_type(format!("type {type_id:?} is not registered")))
    }

    /// Registration of the runtime type of `object`.
    pub fn get_type_info_of(&self, object: &dyn Object) -> Result<&Rc<TypeInfo>, Error> {
        self.by_type
            .get(&object.concrete_type_id())
            .ok_or_else(|| {
                Error::unresolved_type(format!("type {} is not registered", object.type_name()))
            })
    }

    pub fn get_type_info_by_id(&self, id: u32) -> Result<&Rc<TypeInfo>, Error> {
        self.by_id
            .get(&id)
            .ok_or_else(|| Error::unresolved_type(format!("no type registered with id {id}")))
    }

    /// Unregistered types are never final.
    pub fn is_final(&self, type_id: TypeId) -> bool {
        self.by_type
            .get(&type_id)
            .map_or(false, |info| info.is_final())
    }

    /// Serializer of a registered type, created on first use and cached.
    pub fn get_serializer(&self, info: &TypeInfo) -> Result<Rc<dyn Serializer>, Error> {
        if let Some(serializer) = info.serializer.get() {
            return Ok(serializer.clone());
        }
        let Some(factory) = info.factory.as_ref() else {
            return Err(Error::unresolved_type(format!("no serializer for {}", info.name)));
        };
        ensure!(
            !info.creating.replace(true),
            Error::type_error(format!("serializer of {} depends on itself", info.name))
        );
        let created = factory(self);
        info.creating.set(false);
        let serializer = created?;
        let _ = info.serializer.set(serializer.clone());
        Ok(serializer)
    }
}
