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

//! # Skein
//!
//! Binary serialization of dynamic object graphs: polymorphic values,
//! nullable slots, shared and circular references, and associative
//! containers whose key and value types are only partly known up front.
//!
//! ## Quick start
//!
//! ```rust
//! use skein::{value, AssociativeContainer, HashMapObject, Skein};
//!
//! let skein = Skein::default().track_ref(true);
//!
//! let map = HashMapObject::from_entries([(value(1i32), value(String::from("one")))]);
//! // the map contains itself
//! map.insert(value(2i32), Some(map.clone().into_object()));
//!
//! let bytes = skein.serialize(&Some(map.into_object())).unwrap();
//! let decoded = skein.deserialize(&bytes).unwrap().unwrap();
//! let decoded_map = decoded.as_container().unwrap();
//! let inner = decoded_map.get(&value(2i32)).unwrap().unwrap();
//! assert!(skein::object::same_object(&inner, &decoded));
//! ```
//!
//! ## Typed slots
//!
//! A container type registered with a [`MapBinding`] writes keys or values of
//! a configured class without per-element type ids:
//!
//! ```rust
//! use skein::{value, AssociativeContainer, LinkedMapObject, MapBinding, Skein};
//!
//! #[derive(Default, Debug)]
//! struct Scores(LinkedMapObject);
//! # use std::any::Any;
//! # use std::hash::Hasher;
//! # use std::rc::Rc;
//! # use skein::{Object, ObjectRef, Value};
//! # impl Object for Scores {
//! #     fn as_any(&self) -> &dyn Any { self }
//! #     fn object_eq(&self, other: &dyn Object) -> bool { self.0.object_eq(other) }
//! #     fn object_hash(&self, state: &mut dyn Hasher) { self.0.object_hash(state) }
//! #     fn as_container(&self) -> Option<&dyn AssociativeContainer> { Some(self) }
//! # }
//! # impl AssociativeContainer for Scores {
//! #     fn len(&self) -> usize { self.0.len() }
//! #     fn entries(&self) -> Vec<(Value, Value)> { self.0.entries() }
//! #     fn insert(&self, key: Value, value: Value) -> Option<Value> { self.0.insert(key, value) }
//! #     fn get(&self, key: &Value) -> Option<Value> { self.0.get(key) }
//! #     fn into_object(self: Rc<Self>) -> ObjectRef { self }
//! # }
//!
//! let mut skein = Skein::default();
//! skein
//!     .register_map_with::<Scores>(
//!         40,
//!         MapBinding::new()
//!             .key_class::<String>()
//!             .value_class::<i32>()
//!             .keys_can_be_null(false),
//!     )
//!     .unwrap();
//!
//! let scores = Rc::new(Scores::default());
//! scores.insert(value(String::from("ada")), value(36i32));
//! let bytes = skein.serialize(&Some(scores.into_object())).unwrap();
//! assert_eq!(skein.deserialize(&bytes).unwrap().unwrap().as_container().unwrap().len(), 1);
//! ```

pub use skein_core::{
    buffer::{Reader, Writer},
    config::Config,
    error::Error,
    object::{
        value, AssociativeContainer, HashKey, HashMapObject, LinkedMapObject, Object, ObjectRef,
        Value,
    },
    resolver::generics::GenericType,
    serializer::map::{MapBinding, MapSerializer},
    serializer::Serializer,
    Skein,
};
pub use skein_core::{ensure, impl_object, object};
