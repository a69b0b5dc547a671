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

use crate::buffer::Writer;
use crate::error::Error;
use crate::object::ObjectRef;
use crate::types::RefFlag;
use std::collections::HashMap;
use std::rc::Rc;

#[inline(always)]
fn address(object: &ObjectRef) -> usize {
    Rc::as_ptr(object) as *const () as usize
}

/// Reference writer for tracking shared references during serialization.
///
/// RefWriter maps the address of every tracked object written so far to a
/// reference id, so the second occurrence of an object is written as a back
/// reference instead of a second copy. Ids are assigned in first-seen order
/// and are only meaningful within one top-level operation.
///
/// # Examples
///
/// ```rust
/// use skein_core::buffer::Writer;
/// use skein_core::object::ObjectRef;
/// use skein_core::resolver::ref_resolver::RefWriter;
/// use std::rc::Rc;
///
/// let mut ref_writer = RefWriter::new();
/// let mut writer = Writer::default();
/// let object: ObjectRef = Rc::new(42i32);
///
/// // First encounter - returns false, the payload must follow
/// assert!(!ref_writer.try_write_ref(&mut writer, &object));
///
/// // Second encounter - a back reference was written
/// assert!(ref_writer.try_write_ref(&mut writer, &object.clone()));
/// ```
#[derive(Default)]
pub struct RefWriter {
    /// Maps object addresses to reference ids
    refs: HashMap<usize, u32>,
    next_ref_id: u32,
}

impl RefWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes the reference marker for `object`.
    ///
    /// Returns `true` if the object was seen before, in which case a
    /// [`RefFlag::Ref`] followed by its id was written and the caller must not
    /// write the payload. Otherwise registers the object, writes
    /// [`RefFlag::RefValue`] and returns `false`.
    pub fn try_write_ref(&mut self, writer: &mut Writer, object: &ObjectRef) -> bool {
        let addr = address(object);
        if let Some(&ref_id) = self.refs.get(&addr) {
            writer.write_i8(RefFlag::Ref.into());
            writer.write_varuint32(ref_id);
            true
        } else {
            self.refs.insert(addr, self.next_ref_id);
            self.next_ref_id += 1;
            writer.write_i8(RefFlag::RefValue.into());
            false
        }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Clear all stored references.
    pub fn clear(&mut self) {
        self.refs.clear();
        self.next_ref_id = 0;
    }
}

/// Reference reader for resolving back references during deserialization.
///
/// Every object read pushes a pending entry: the reserved reference id for a
/// tracked object, `None` otherwise. [`RefReader::reference`] pops the top
/// entry and binds the object to the reserved id. A container calls it
/// before reading its entries so entries can refer back to the container;
/// if the serializer never calls it, the context binds the finished object.
///
/// ```rust
/// use skein_core::object::{same_object, ObjectRef};
/// use skein_core::resolver::ref_resolver::RefReader;
/// use std::rc::Rc;
///
/// let mut ref_reader = RefReader::new();
/// let id = ref_reader.reserve();
/// ref_reader.push_pending(Some(id));
///
/// let object: ObjectRef = Rc::new(String::from("shared"));
/// ref_reader.reference(object.clone());
/// assert!(same_object(&ref_reader.get(id).unwrap(), &object));
/// ```
#[derive(Default)]
pub struct RefReader {
    refs: Vec<Option<ObjectRef>>,
    pending: Vec<Option<u32>>,
}

impl RefReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next reference id. The slot stays empty until bound.
    pub fn reserve(&mut self) -> u32 {
        let ref_id = self.refs.len() as u32;
        self.refs.push(None);
        ref_id
    }

    /// Returns the number of pending entries after the push.
    pub fn push_pending(&mut self, ref_id: Option<u32>) -> usize {
        self.pending.push(ref_id);
        self.pending.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Binds `object` to the innermost pending read.
    pub fn reference(&mut self, object: ObjectRef) {
        if let Some(Some(ref_id)) = self.pending.pop() {
            self.refs[ref_id as usize] = Some(object);
        }
    }

    pub fn get(&self, ref_id: u32) -> Result<ObjectRef, Error> {
        match self.refs.get(ref_id as usize) {
            Some(Some(object)) => Ok(object.clone()),
            Some(None) => Err(Error::invalid_ref(format!(
                "reference {ref_id} points at an object that is still being read"
            ))),
            None => Err(Error::invalid_ref(format!(
                "reference {ref_id} out of range, {} objects read",
                self.refs.len()
            ))),
        }
    }
}

/// Original to copy table of a deep copy.
///
/// Works like [`RefReader`]: each copied object pushes its original's
/// address, and [`CopyRefs::reference`] binds the innermost pending original
/// to its copy. Every object is tracked during a copy, so shared and cyclic
/// graphs copy with the same shape.
#[derive(Default)]
pub struct CopyRefs {
    copies: HashMap<usize, ObjectRef>,
    pending: Vec<usize>,
}

impl CopyRefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, original: &ObjectRef) -> Option<ObjectRef> {
        self.copies.get(&address(original)).cloned()
    }

    pub fn push_pending(&mut self, original: &ObjectRef) -> usize {
        self.pending.push(address(original));
        self.pending.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn reference(&mut self, copy: ObjectRef) {
        if let Some(addr) = self.pending.pop() {
            self.copies.insert(addr, copy);
        }
    }
}
