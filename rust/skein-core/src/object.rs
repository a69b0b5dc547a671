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

//! Dynamic object model of the graphs skein serializes.
//!
//! Every node is an [`ObjectRef`] (`Rc<dyn Object>`); a nullable slot is a
//! [`Value`]. Object identity is the `Rc` allocation, which is what the
//! reference tables key on.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

pub type ObjectRef = Rc<dyn Object>;

/// A nullable slot in the graph. `None` is null.
pub type Value = Option<ObjectRef>;

/// A node of a serializable object graph.
///
/// Leaf types get an implementation from [`impl_object!`](crate::impl_object).
pub trait Object: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// Value equality; objects of different concrete types are never equal.
    fn object_eq(&self, other: &dyn Object) -> bool;

    /// Must agree with [`Object::object_eq`].
    fn object_hash(&self, state: &mut dyn Hasher);

    fn as_container(&self) -> Option<&dyn AssociativeContainer> {
        None
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

impl dyn Object {
    pub fn is<T: Object>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Object>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// The concrete Rust type behind the trait object.
    pub fn concrete_type_id(&self) -> std::any::TypeId {
        self.as_any().type_id()
    }
}

/// Implements [`Object`] for value types that are `PartialEq + Hash + Debug`.
/// Floating point types use the `@float` form, which hashes the bit pattern.
#[macro_export]
macro_rules! impl_object {
    (@float $($ty:ty),* $(,)?) => {
        $(
            impl $crate::object::Object for $ty {
                fn as_any(&self) -> &dyn std::any::Any {
                    self
                }

                fn object_eq(&self, other: &dyn $crate::object::Object) -> bool {
                    other.as_any().downcast_ref::<$ty>().map_or(false, |o| o == self)
                }

                fn object_hash(&self, mut state: &mut dyn std::hash::Hasher) {
                    std::hash::Hash::hash(&self.to_bits(), &mut state);
                }
            }
        )*
    };
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::object::Object for $ty {
                fn as_any(&self) -> &dyn std::any::Any {
                    self
                }

                fn object_eq(&self, other: &dyn $crate::object::Object) -> bool {
                    other.as_any().downcast_ref::<$ty>().map_or(false, |o| o == self)
                }

                fn object_hash(&self, mut state: &mut dyn std::hash::Hasher) {
                    std::hash::Hash::hash(self, &mut state);
                }
            }
        )*
    };
}

impl_object!(bool, i8, i16, i32, i64, String);
impl_object!(@float f32, f64);

/// Wraps an object into a non-null [`Value`].
pub fn value<T: Object>(object: T) -> Value {
    Some(Rc::new(object))
}

/// Whether both references point at the same allocation.
pub fn same_object(a: &ObjectRef, b: &ObjectRef) -> bool {
    std::ptr::eq(Rc::as_ptr(a) as *const (), Rc::as_ptr(b) as *const ())
}

/// Null-aware value equality: same instance, or [`Object::object_eq`].
///
/// Comparing two distinct graphs that each contain a cycle recurses without
/// bound; compare such graphs structurally instead.
pub fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => same_object(a, b) || a.object_eq(b.as_ref()),
        _ => false,
    }
}

/// Map key with hashing and equality delegated to the dynamic object.
/// A null key is a valid key.
#[derive(Clone, Debug)]
pub struct HashKey(pub Value);

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        value_eq(&self.0, &other.0)
    }
}

impl Eq for HashKey {}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            None => 0u8.hash(state),
            Some(object) => {
                1u8.hash(state);
                object.object_hash(state);
            }
        }
    }
}

/// Key-unique container of nullable keys and values.
///
/// Mutation goes through `&self` so a container can be shared, and registered
/// as a back-reference target, before its entries exist.
pub trait AssociativeContainer: Object {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the entries in the container's iteration order.
    fn entries(&self) -> Vec<(Value, Value)>;

    /// Like [`AssociativeContainer::entries`], but `None` while the container
    /// is being mutated, for example when it is hashed or compared as a key
    /// of its own `insert`.
    fn try_entries(&self) -> Option<Vec<(Value, Value)>> {
        Some(self.entries())
    }

    /// Inserts or replaces, returning the previous value when the key existed.
    fn insert(&self, key: Value, value: Value) -> Option<Value>;

    /// `None` when the key is absent, `Some(None)` when it maps to null.
    fn get(&self, key: &Value) -> Option<Value>;

    fn into_object(self: Rc<Self>) -> ObjectRef;
}

/// A container that is mutably borrowed equals only itself, which
/// [`value_eq`] has already checked by identity.
fn container_eq(this: &dyn AssociativeContainer, other: &dyn Object) -> bool {
    let Some(other) = other.as_container() else {
        return false;
    };
    if this.concrete_type_id() != other.concrete_type_id() {
        return false;
    }
    let (Some(entries), Some(other_entries)) = (this.try_entries(), other.try_entries()) else {
        return false;
    };
    entries.len() == other_entries.len()
        && entries.iter().all(|(key, value)| {
            other
                .get(key)
                .map_or(false, |other_value| value_eq(value, &other_value))
        })
}

/// Containers hash by type only: the hash of a key must not change when the
/// key container is mutated, and must not borrow a container that is being
/// mutated.
fn container_hash(this: &dyn AssociativeContainer, mut state: &mut dyn Hasher) {
    this.concrete_type_id().hash(&mut state);
}

impl dyn AssociativeContainer {
    pub fn concrete_type_id(&self) -> std::any::TypeId {
        self.as_any().type_id()
    }
}

/// Unordered container backed by a `HashMap`.
#[derive(Default)]
pub struct HashMapObject {
    entries: RefCell<HashMap<HashKey, Value>>,
}

impl HashMapObject {
    pub fn new() -> HashMapObject {
        HashMapObject::default()
    }

    pub fn from_entries<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Rc<HashMapObject> {
        let map = Rc::new(HashMapObject::new());
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }
}

impl fmt::Debug for HashMapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // entries may point back at this map
        f.debug_struct("HashMapObject")
            .field("len", &self.len())
            .finish()
    }
}

impl Object for HashMapObject {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn object_eq(&self, other: &dyn Object) -> bool {
        container_eq(self, other)
    }

    fn object_hash(&self, state: &mut dyn Hasher) {
        container_hash(self, state);
    }

    fn as_container(&self) -> Option<&dyn AssociativeContainer> {
        Some(self)
    }
}

impl AssociativeContainer for HashMapObject {
    fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    fn entries(&self) -> Vec<(Value, Value)> {
        self.entries
            .borrow()
            .iter()
            .map(|(key, value)| (key.0.clone(), value.clone()))
            .collect()
    }

    fn try_entries(&self) -> Option<Vec<(Value, Value)>> {
        let entries = self.entries.try_borrow().ok()?;
        Some(
            entries
                .iter()
                .map(|(key, value)| (key.0.clone(), value.clone()))
                .collect(),
        )
    }

    fn insert(&self, key: Value, value: Value) -> Option<Value> {
        self.entries.borrow_mut().insert(HashKey(key), value)
    }

    fn get(&self, key: &Value) -> Option<Value> {
        self.entries.borrow().get(&HashKey(key.clone())).cloned()
    }

    fn into_object(self: Rc<Self>) -> ObjectRef {
        self
    }
}

#[derive(Default)]
struct LinkedEntries {
    order: Vec<(HashKey, Value)>,
    index: HashMap<HashKey, usize>,
}

/// Container that iterates in insertion order. Replacing the value of an
/// existing key keeps the key's original position.
#[derive(Default)]
pub struct LinkedMapObject {
    entries: RefCell<LinkedEntries>,
}

impl LinkedMapObject {
    pub fn new() -> LinkedMapObject {
        LinkedMapObject::default()
    }

    pub fn from_entries<I: IntoIterator<Item = (Value, Value)>>(
        entries: I,
    ) -> Rc<LinkedMapObject> {
        let map = Rc::new(LinkedMapObject::new());
        for (key, value) in entries {
            map.insert(key, value);
        }
        map
    }
}

impl fmt::Debug for LinkedMapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedMapObject")
            .field("len", &self.len())
            .finish()
    }
}

impl Object for LinkedMapObject {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn object_eq(&self, other: &dyn Object) -> bool {
        container_eq(self, other)
    }

    fn object_hash(&self, state: &mut dyn Hasher) {
        container_hash(self, state);
    }

    fn as_container(&self) -> Option<&dyn AssociativeContainer> {
        Some(self)
    }
}

impl AssociativeContainer for LinkedMapObject {
    fn len(&self) -> usize {
        self.entries.borrow().order.len()
    }

    fn entries(&self) -> Vec<(Value, Value)> {
        self.entries
            .borrow()
            .order
            .iter()
            .map(|(key, value)| (key.0.clone(), value.clone()))
            .collect()
    }

    fn try_entries(&self) -> Option<Vec<(Value, Value)>> {
        let entries = self.entries.try_borrow().ok()?;
        Some(
            entries
                .order
                .iter()
                .map(|(key, value)| (key.0.clone(), value.clone()))
                .collect(),
        )
    }

    fn insert(&self, key: Value, value: Value) -> Option<Value> {
        let mut entries = self.entries.borrow_mut();
        let key = HashKey(key);
        if let Some(&slot) = entries.index.get(&key) {
            return Some(std::mem::replace(&mut entries.order[slot].1, value));
        }
        let slot = entries.order.len();
        entries.index.insert(key.clone(), slot);
        entries.order.push((key, value));
        None
    }

    fn get(&self, key: &Value) -> Option<Value> {
        let entries = self.entries.borrow();
        let slot = *entries.index.get(&HashKey(key.clone()))?;
        Some(entries.order[slot].1.clone())
    }

    fn into_object(self: Rc<Self>) -> ObjectRef {
        self
    }
}
