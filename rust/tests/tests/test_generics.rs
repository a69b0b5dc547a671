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

use skein::object::value_eq;
use skein::{value, AssociativeContainer, Error, GenericType, HashMapObject, MapBinding, Skein, Writer};
use skein_core::error::should_panic_on_error;
use skein_core::resolver::context::{ReadContext, WriteContext};
use skein_core::resolver::generics::GenericsScope;
use skein_core::buffer::Reader;
use tests::{container, string, string_to_int_map, TypedMap};

fn non_null_typed_map(skein: &mut Skein, id: u32) {
    skein
        .register_map_with::<TypedMap>(
            id,
            MapBinding::new()
                .keys_can_be_null(false)
                .values_can_be_null(false),
        )
        .unwrap();
}

fn declared_string_to_i32<M: 'static>() -> GenericType {
    GenericType::with_args::<M>(vec![GenericType::of::<String>(), GenericType::of::<i32>()])
}

#[test]
fn test_final_generic_arguments_drop_type_ids() {
    let mut skein = Skein::default();
    non_null_typed_map(&mut skein, 40);
    let map = TypedMap::from_entries((0..3).map(|i| (string(&format!("k{i}")), value(i))));
    let original = Some(map.into_object());

    let declared = declared_string_to_i32::<TypedMap>();
    let field_bytes = skein.serialize_field(&declared, &original).unwrap();
    let plain_bytes = skein.serialize(&original).unwrap();
    // header, map type id, count, then per entry "kN" and a one byte varint
    assert_eq!(field_bytes.len(), 3 + 3 * 4);
    assert_eq!(plain_bytes.len(), field_bytes.len() + 3 * 2);

    let decoded = skein.deserialize_field(&declared, &field_bytes).unwrap();
    assert!(value_eq(&original, &decoded));
}

#[test]
fn test_nullable_generic_arguments_roundtrip() {
    for native in [false, true] {
        let skein = Skein::default().native(native);
        let map = string_to_int_map(20);
        map.insert(string("none"), None);
        let original = Some(map.into_object());

        let declared = declared_string_to_i32::<HashMapObject>();
        let bytes = skein.serialize_field(&declared, &original).unwrap();
        let decoded = skein.deserialize_field(&declared, &bytes).unwrap();
        assert!(value_eq(&original, &decoded));
    }
}

#[test]
fn test_unknown_and_non_final_arguments_stay_polymorphic() {
    let skein = Skein::default();
    let inner = string_to_int_map(2).into_object();
    let map = HashMapObject::from_entries([(value(1i64), Some(inner)), (value(2i64), None)]);
    let original = Some(map.into_object());

    let declared = GenericType::with_args::<HashMapObject>(vec![
        GenericType::unknown(),
        GenericType::of::<HashMapObject>(),
    ]);
    let field_bytes = skein.serialize_field(&declared, &original).unwrap();
    assert_eq!(field_bytes, skein.serialize(&original).unwrap());
    let decoded = skein.deserialize_field(&declared, &field_bytes).unwrap();
    assert!(value_eq(&original, &decoded));
}

#[test]
fn test_key_frame_reaches_nested_key_maps() {
    let mut skein = Skein::default();
    non_null_typed_map(&mut skein, 40);

    let inner = TypedMap::from_entries([(string("x"), value(1i32)), (string("y"), value(2i32))]);
    let outer = HashMapObject::from_entries([(Some(inner.into_object()), string("point"))]);
    let original = Some(outer.into_object());

    // key type is itself a declared TypedMap<String, i32>
    let declared = GenericType::with_args::<HashMapObject>(vec![
        declared_string_to_i32::<TypedMap>(),
        GenericType::of::<String>(),
    ]);
    let field_bytes = skein.serialize_field(&declared, &original).unwrap();
    let plain_bytes = skein.serialize(&original).unwrap();
    // the inner map writes its two entries without type ids
    assert_eq!(plain_bytes.len(), field_bytes.len() + 2 * 2);

    let decoded = skein.deserialize_field(&declared, &field_bytes).unwrap().unwrap();
    let (key, value) = container(&decoded).entries().pop().unwrap();
    assert!(value_eq(&value, &string("point")));
    let key = key.unwrap();
    assert!(key.is::<TypedMap>());
    assert_eq!(container(&key).len(), 2);
}

#[test]
fn test_value_frames_are_not_pushed() {
    let mut skein = Skein::default();
    non_null_typed_map(&mut skein, 40);

    let inner = TypedMap::from_entries([(string("x"), value(1i32))]);
    let outer = HashMapObject::from_entries([(string("point"), Some(inner.into_object()))]);
    let original = Some(outer.into_object());

    let declared = GenericType::with_args::<HashMapObject>(vec![
        GenericType::of::<String>(),
        declared_string_to_i32::<TypedMap>(),
    ]);
    let field_bytes = skein.serialize_field(&declared, &original).unwrap();
    let plain_bytes = skein.serialize(&original).unwrap();
    // the String key of the outer map loses its type id but gains a null
    // marker; the nested value map sees no generic arguments
    assert_eq!(field_bytes.len(), plain_bytes.len());
    let decoded = skein.deserialize_field(&declared, &field_bytes).unwrap();
    assert!(value_eq(&original, &decoded));
}

#[test]
fn test_generics_stack_balanced_after_failure() {
    if should_panic_on_error() {
        return;
    }
    let mut skein = Skein::default();
    non_null_typed_map(&mut skein, 40);
    let map = TypedMap::from_entries([(string("a"), value(1i32)), (None, value(2i32))]);
    let original = Some(map.into_object());
    let declared = declared_string_to_i32::<TypedMap>();

    let mut writer = Writer::new();
    let mut context = WriteContext::new(skein.get_type_resolver(), skein.get_config(), &mut writer);
    let err = context.write_field(&declared, &original).unwrap_err();
    assert!(matches!(err, Error::NullNotAllowed(_)));
    assert_eq!(context.generics().height(), 0);
    assert_eq!(context.depth(), 0);
}

#[test]
fn test_read_field_pops_caller_frame() {
    let skein = Skein::default();
    let declared = declared_string_to_i32::<HashMapObject>();
    let original = Some(string_to_int_map(5).into_object());

    let mut writer = Writer::new();
    {
        let mut context =
            WriteContext::new(skein.get_type_resolver(), skein.get_config(), &mut writer);
        context.write_field(&declared, &original).unwrap();
        context.write_field(&GenericType::of::<String>(), &string("tail")).unwrap();
        assert_eq!(context.generics().height(), 0);
    }

    let mut reader = Reader::new(writer.as_slice());
    let mut context = ReadContext::new(skein.get_type_resolver(), skein.get_config(), &mut reader);
    let decoded = context.read_field(&declared).unwrap();
    assert_eq!(context.generics().height(), 0);
    let tail = context.read_field(&GenericType::of::<String>()).unwrap();
    assert!(value_eq(&original, &decoded));
    assert!(value_eq(&tail, &string("tail")));
}
