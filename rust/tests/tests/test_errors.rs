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

use skein::{
    value, AssociativeContainer, Error, HashMapObject, MapBinding, MapSerializer, Skein, Writer,
};
use skein_core::error::should_panic_on_error;
use skein_core::resolver::context::WriteContext;
use skein_core::resolver::type_resolver::{container_factory, TypeInfo};
use skein_core::serializer::number::I32Serializer;
use skein_core::types::config_flags::IS_LITTLE_ENDIAN_FLAG;
use std::rc::Rc;
use tests::{string, string_to_int_map, TypedMap};

#[derive(Debug, PartialEq, Hash)]
struct Opaque(u8);

skein::impl_object!(Opaque);

#[test]
fn test_null_value_rejected_before_entry_is_written() {
    if should_panic_on_error() {
        return;
    }
    let mut skein = Skein::default();
    skein
        .register_map_with::<TypedMap>(40, MapBinding::new().values_can_be_null(false))
        .unwrap();
    let map = TypedMap::from_entries([(string("a"), value(1i32)), (string("b"), None)]);

    let mut writer = Writer::new();
    let mut context = WriteContext::new(skein.get_type_resolver(), skein.get_config(), &mut writer);
    let err = context
        .write_class_and_object(&Some(map.into_object()))
        .unwrap_err();
    assert!(matches!(err, Error::NullNotAllowed(_)));
    // type id, count and the complete first entry; nothing of "b"
    assert_eq!(writer.len(), 1 + 1 + 3 + 2);
}

#[test]
fn test_null_key_rejected() {
    if should_panic_on_error() {
        return;
    }
    let mut skein = Skein::default();
    skein
        .register_map_with::<TypedMap>(
            40,
            MapBinding::new().key_class::<String>().keys_can_be_null(false),
        )
        .unwrap();
    let map = TypedMap::from_entries([(None, value(1i32))]);
    let err = skein.serialize(&Some(map.into_object())).unwrap_err();
    assert!(matches!(err, Error::NullNotAllowed(_)));
}

#[test]
fn test_key_of_wrong_class() {
    if should_panic_on_error() {
        return;
    }
    let mut skein = Skein::default();
    skein
        .register_map_with::<TypedMap>(40, MapBinding::new().key_class::<String>())
        .unwrap();
    let map = TypedMap::from_entries([(value(1i32), value(1i32))]);
    let err = skein.serialize(&Some(map.into_object())).unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));
}

#[test]
fn test_unregistered_type() {
    if should_panic_on_error() {
        return;
    }
    let skein = Skein::default();
    let err = skein.serialize(&value(Opaque(3))).unwrap_err();
    assert!(matches!(err, Error::UnresolvedType(_)));

    let map = HashMapObject::from_entries([(string("opaque"), value(Opaque(3)))]);
    let err = skein.serialize(&Some(map.into_object())).unwrap_err();
    assert!(matches!(err, Error::UnresolvedType(_)));
}

#[test]
fn test_unknown_type_id_on_read() {
    if should_panic_on_error() {
        return;
    }
    let skein = Skein::default();
    let mut bytes = skein.serialize(&value(1i32)).unwrap();
    bytes[1] = 100;
    let err = skein.deserialize(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnresolvedType(_)));

    // the reader does not know a type the writer registered
    let mut writer_side = Skein::default();
    writer_side.register_map::<TypedMap>(40).unwrap();
    let bytes = writer_side
        .serialize(&Some(TypedMap::from_entries([]).into_object()))
        .unwrap();
    let err = skein.deserialize(&bytes).unwrap_err();
    assert!(matches!(err, Error::UnresolvedType(_)));
}

#[test]
fn test_missing_container_factory() {
    if should_panic_on_error() {
        return;
    }
    let mut skein = Skein::default();
    skein
        .register(TypeInfo::with_serializer::<TypedMap>(
            41,
            Rc::new(MapSerializer::default()),
        ))
        .unwrap();
    let original = Some(TypedMap::from_entries([(string("a"), value(1i32))]).into_object());
    let bytes = skein.serialize(&original).unwrap();

    let err = skein.deserialize(&bytes).unwrap_err();
    assert!(matches!(err, Error::ContainerConstruction(_)));
    let err = skein.copy(&original).unwrap_err();
    assert!(matches!(err, Error::ContainerConstruction(_)));
}

#[test]
fn test_factory_override() {
    let mut skein = Skein::default();
    let serializer = MapSerializer::new().with_factory(container_factory::<TypedMap>());
    skein
        .register(TypeInfo::with_serializer::<TypedMap>(41, Rc::new(serializer)))
        .unwrap();
    let original = Some(TypedMap::from_entries([(string("a"), value(1i32))]).into_object());
    let bytes = skein.serialize(&original).unwrap();
    let decoded = skein.deserialize(&bytes).unwrap().unwrap();
    assert!(decoded.is::<TypedMap>());
    assert_eq!(decoded.as_container().unwrap().len(), 1);
}

#[test]
fn test_header_mismatch() {
    if should_panic_on_error() {
        return;
    }
    let original = Some(string_to_int_map(3).into_object());
    let compact = Skein::default();
    let native = Skein::default().native(true);
    let tracking = Skein::default().track_ref(true);

    let bytes = native.serialize(&original).unwrap();
    assert!(matches!(compact.deserialize(&bytes), Err(Error::InvalidData(_))));

    let bytes = compact.serialize(&original).unwrap();
    assert!(matches!(native.deserialize(&bytes), Err(Error::InvalidData(_))));
    assert!(matches!(tracking.deserialize(&bytes), Err(Error::InvalidData(_))));

    let bytes = tracking.serialize(&original).unwrap();
    assert!(matches!(compact.deserialize(&bytes), Err(Error::InvalidData(_))));
}

#[test]
fn test_native_byte_order_mismatch() {
    if should_panic_on_error() {
        return;
    }
    let native = Skein::default().native(true);
    let mut bytes = native.serialize(&value(7i32)).unwrap();
    bytes[0] ^= IS_LITTLE_ENDIAN_FLAG;
    assert!(matches!(native.deserialize(&bytes), Err(Error::InvalidData(_))));

    // compact streams are byte order independent
    let compact = Skein::default();
    let mut bytes = compact.serialize(&value(7i32)).unwrap();
    bytes[0] ^= IS_LITTLE_ENDIAN_FLAG;
    let decoded = compact.deserialize(&bytes).unwrap().unwrap();
    assert_eq!(decoded.downcast_ref::<i32>(), Some(&7));
}

#[test]
fn test_cycle_without_tracking_exceeds_depth() {
    if should_panic_on_error() {
        return;
    }
    let skein = Skein::default().max_depth(16);
    let map = HashMapObject::from_entries([]);
    map.insert(string("self"), Some(map.clone().into_object()));
    let original = Some(map.clone().into_object());
    let err = skein.serialize(&original).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)));
    // break the cycle so the map is freed
    map.insert(string("self"), None);
}

#[test]
fn test_deep_stream_exceeds_read_depth() {
    if should_panic_on_error() {
        return;
    }
    let mut nested = None;
    for i in 0..10 {
        nested = Some(HashMapObject::from_entries([(value(i), nested)]).into_object());
    }
    let bytes = Skein::default().serialize(&nested).unwrap();
    assert!(Skein::default().deserialize(&bytes).is_ok());
    let err = Skein::default().max_depth(4).deserialize(&bytes).unwrap_err();
    assert!(matches!(err, Error::DepthExceed(_)));
}

#[test]
fn test_serializer_without_class() {
    if should_panic_on_error() {
        return;
    }
    let mut skein = Skein::default();
    // accepted at registration, the binding is resolved on first use
    skein
        .register_map_with::<TypedMap>(
            40,
            MapBinding::new().value_serializer(Rc::new(I32Serializer)),
        )
        .unwrap();
    let map = TypedMap::from_entries([(string("a"), value(1i32))]);
    let err = skein.serialize(&Some(map.into_object())).unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));

    let mut serializer = MapSerializer::new();
    let err = serializer
        .set_key_class(None, Some(Rc::new(I32Serializer)))
        .unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));
}

#[test]
fn test_registration_errors() {
    if should_panic_on_error() {
        return;
    }
    let mut skein = Skein::default();
    let err = skein.register_map::<TypedMap>(5).unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));

    skein.register_map::<TypedMap>(40).unwrap();
    let err = skein.register_map::<TypedMap>(41).unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));
    let err = skein.register_map::<HashMapObject>(40).unwrap_err();
    assert!(matches!(err, Error::TypeError(_)));
}

#[test]
fn test_truncated_stream() {
    if should_panic_on_error() {
        return;
    }
    for native in [false, true] {
        let skein = Skein::default().native(native);
        let bytes = skein.serialize(&Some(string_to_int_map(10).into_object())).unwrap();
        let err = skein.deserialize(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err, Error::BufferUnderflow(..)));
    }
}

#[test]
fn test_unknown_ref_flag() {
    if should_panic_on_error() {
        return;
    }
    let skein = Skein::default().track_ref(true);
    let mut bytes = skein.serialize(&Some(string_to_int_map(1).into_object())).unwrap();
    // header, type id, then the marker of the tracked map
    bytes[2] = 0x55;
    let err = skein.deserialize(&bytes).unwrap_err();
    assert!(matches!(err, Error::InvalidData(_)));
}
