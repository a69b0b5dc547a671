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

//! Stack of generic type bindings for the subtree being serialized.
//!
//! A caller that knows the declared type of a field (say a map from `String`
//! to `i32`) pushes that type before descending into the field; the
//! serializer of the field reads the type arguments from the top of the
//! stack and may pick a typed encoding for them.
//!
//! Every frame records the serializer nesting depth it was pushed at. A
//! serializer running at depth `d` only sees, and only pops, a frame pushed at
//! depth `d - 1`, so it can never consume a frame that belongs to an
//! unrelated sibling. Pushes go through [`GenericsGuard`], which truncates the
//! stack back on drop, including on error paths.

use std::any::TypeId;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

/// Declared type of a field or of a type argument.
#[derive(Clone, Debug, PartialEq)]
pub enum GenericType {
    Concrete {
        type_id: TypeId,
        name: &'static str,
        args: Rc<[GenericType]>,
    },
    /// The type bound to parameter `i` of the enclosing declaration.
    Variable(usize),
    Unknown,
}

impl GenericType {
    pub fn of<T: 'static>() -> GenericType {
        GenericType::with_args::<T>(Vec::new())
    }

    pub fn with_args<T: 'static>(args: Vec<GenericType>) -> GenericType {
        GenericType::Concrete {
            type_id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            args: args.into(),
        }
    }

    pub fn variable(index: usize) -> GenericType {
        GenericType::Variable(index)
    }

    pub fn unknown() -> GenericType {
        GenericType::Unknown
    }

    pub fn args(&self) -> &[GenericType] {
        match self {
            GenericType::Concrete { args, .. } => &args[..],
            _ => &[],
        }
    }

    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            GenericType::Concrete { type_id, .. } => Some(*type_id),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct GenericFrame {
    depth: usize,
    args: Rc<[GenericType]>,
}

#[derive(Debug, Default)]
pub struct Generics {
    frames: Vec<GenericFrame>,
}

impl Generics {
    pub fn new() -> Generics {
        Generics::default()
    }

    pub fn height(&self) -> usize {
        self.frames.len()
    }

    /// Pushes the type arguments of `ty`, tagged with `depth`. Types without
    /// arguments push nothing; returns whether a frame was pushed.
    pub fn push(&mut self, ty: &GenericType, depth: usize) -> bool {
        match ty {
            GenericType::Concrete { args, .. } if !args.is_empty() => {
                self.frames.push(GenericFrame {
                    depth,
                    args: args.clone(),
                });
                true
            }
            _ => false,
        }
    }

    /// Pops the top frame if it was pushed by the caller of a serializer
    /// running at `depth`. Otherwise does nothing.
    pub fn pop(&mut self, depth: usize) -> bool {
        match self.frames.last() {
            Some(frame) if frame.depth + 1 == depth => {
                self.frames.pop();
                true
            }
            _ => false,
        }
    }

    pub fn truncate(&mut self, height: usize) {
        self.frames.truncate(height);
    }

    /// Type arguments bound for a serializer running at `depth`.
    pub fn next_generic_types(&self, depth: usize) -> Option<Rc<[GenericType]>> {
        self.frames
            .last()
            .filter(|frame| frame.depth + 1 == depth)
            .map(|frame| frame.args.clone())
    }

    /// Resolves a type argument read from the top frame to a concrete type.
    /// Variables are looked up in the frames below, following chains of
    /// variables as far as they go.
    pub fn resolve(&self, ty: &GenericType) -> Option<TypeId> {
        let mut level = self.frames.len().checked_sub(1)?;
        let mut current = ty;
        loop {
            match current {
                GenericType::Concrete { type_id, .. } => return Some(*type_id),
                GenericType::Unknown => return None,
                GenericType::Variable(index) => {
                    level = level.checked_sub(1)?;
                    current = self.frames[level].args.get(*index)?;
                }
            }
        }
    }
}

/// Implemented by the contexts that carry a [`Generics`] stack.
pub trait GenericsScope: Sized {
    fn generics(&self) -> &Generics;

    fn generics_mut(&mut self) -> &mut Generics;

    /// Current serializer nesting depth.
    fn depth(&self) -> usize;

    fn next_generic_types(&self) -> Option<Rc<[GenericType]>> {
        self.generics().next_generic_types(self.depth())
    }

    /// Pops the frame pushed by the caller of the running serializer, if any.
    fn pop_generic_type(&mut self) {
        let depth = self.depth();
        self.generics_mut().pop(depth);
    }

    /// Pushes `ty` for the duration of the returned guard.
    fn push_generic_type(&mut self, ty: &GenericType) -> GenericsGuard<'_, Self> {
        let depth = self.depth();
        let generics = self.generics_mut();
        let height = generics.height();
        generics.push(ty, depth);
        GenericsGuard {
            scope: self,
            height,
        }
    }
}

/// Restores the generics stack height on drop. Derefs to the context so the
/// nested call can go through the guard.
pub struct GenericsGuard<'a, C: GenericsScope> {
    scope: &'a mut C,
    height: usize,
}

impl<C: GenericsScope> Deref for GenericsGuard<'_, C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.scope
    }
}

impl<C: GenericsScope> DerefMut for GenericsGuard<'_, C> {
    fn deref_mut(&mut self) -> &mut C {
        self.scope
    }
}

impl<C: GenericsScope> Drop for GenericsGuard<'_, C> {
    fn drop(&mut self) {
        self.scope.generics_mut().truncate(self.height);
    }
}
