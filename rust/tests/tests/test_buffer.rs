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

use rand::Rng;
use skein_core::buffer::{Reader, Writer};
use skein_core::error::{should_panic_on_error, Error};
use std::io::Read;

/// Read source that hands out at most `step` bytes per call.
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    step: usize,
}

impl Trickle {
    fn new(data: Vec<u8>, step: usize) -> Trickle {
        Trickle { data, pos: 0, step }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

#[test]
fn test_compact_varint_sizes() {
    let cases: [(i32, usize); 6] = [
        (0, 1),
        (-1, 1),
        (63, 1),
        (64, 2),
        (i32::MAX, 5),
        (i32::MIN, 5),
    ];
    for (value, size) in cases {
        let mut writer = Writer::new();
        writer.write_varint32(value);
        assert_eq!(writer.len(), size, "size of {value}");
        let mut reader = Reader::new(writer.as_slice());
        assert_eq!(reader.read_varint32().unwrap(), value);
        assert_eq!(reader.position(), size);
    }

    let mut writer = Writer::new();
    writer.write_varuint64(u64::MAX);
    writer.write_varint64(i64::MIN);
    writer.write_varuint32(300);
    let mut reader = Reader::new(writer.as_slice());
    assert_eq!(reader.read_varuint64().unwrap(), u64::MAX);
    assert_eq!(reader.read_varint64().unwrap(), i64::MIN);
    assert_eq!(reader.read_varuint32().unwrap(), 300);
    assert!(reader.eof().unwrap());
}

#[test]
fn test_native_i32_roundtrip() {
    let mut rng = rand::thread_rng();
    let values: Vec<i32> = (0..1000).map(|_| rng.gen()).collect();
    let mut writer = Writer::native();
    for &v in &values {
        writer.write_i32(v);
    }
    assert_eq!(writer.len(), 4000);

    let mut reader = Reader::new(writer.as_slice()).native(true);
    for &v in &values {
        assert_eq!(reader.read_i32().unwrap(), v);
    }
    assert_eq!(reader.position(), 4000);
}

#[test]
fn test_native_scalars_use_host_byte_order() {
    let mut writer = Writer::native();
    writer.write_i16(-2);
    writer.write_u16(0xBEEF);
    writer.write_i64(i64::MIN + 7);
    writer.write_f32(1.5);
    writer.write_f64(-0.25);
    let bytes = writer.dump();
    assert_eq!(&bytes[..2], &(-2i16).to_ne_bytes());
    assert_eq!(&bytes[2..4], &0xBEEFu16.to_ne_bytes());

    let mut reader = Reader::new(&bytes).native(true);
    assert_eq!(reader.read_i16().unwrap(), -2);
    assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
    assert_eq!(reader.read_i64().unwrap(), i64::MIN + 7);
    assert_eq!(reader.read_f32().unwrap(), 1.5);
    assert_eq!(reader.read_f64().unwrap(), -0.25);
}

#[test]
fn test_wide_varint_equals_fixed_read() {
    for value in [0, 1, -1, 127, 128, i32::MAX, i32::MIN] {
        let mut writer = Writer::native();
        writer.write_varint32(value);
        assert_eq!(writer.len(), 4);

        let mut wide = Reader::new(writer.as_slice()).native(true);
        let mut fixed = Reader::new(writer.as_slice()).native(true);
        assert_eq!(wide.read_varint32().unwrap(), fixed.read_i32().unwrap());
        assert_eq!(wide.position(), 4);
    }

    let mut writer = Writer::native();
    writer.write_varuint64(5);
    let mut reader = Reader::new(writer.as_slice()).native(true);
    assert_eq!(reader.read_varuint64().unwrap(), 5);
    assert_eq!(reader.position(), 8);
}

#[test]
fn test_can_read_var_in_native_mode() {
    let reader = Reader::new(&[1, 0, 0]).native(true);
    assert!(!reader.can_read_varint());
    let reader = Reader::new(&[1, 0, 0, 0]).native(true);
    assert!(reader.can_read_varint());
    assert!(!reader.can_read_varlong());
    let reader = Reader::new(&[0; 8]).native(true);
    assert!(reader.can_read_varlong());
}

#[test]
fn test_chunked_bulk_decode() {
    let mut rng = rand::thread_rng();
    let values: Vec<i32> = (0..1024).map(|_| rng.gen()).collect();

    for native in [true, false] {
        let mut writer = if native {
            Writer::native()
        } else {
            Writer::new()
        };
        writer.write_i32s(&values);
        let source = Trickle::new(writer.dump(), 16);
        let mut reader = Reader::from_source(source, 64).native(native);

        let mut out = vec![0i32; 1024];
        reader.read_array(&mut out).unwrap();
        assert_eq!(out, values);
        assert_eq!(reader.total(), 4096);
        assert!(reader.eof().unwrap());
    }
}

#[test]
fn test_bulk_decode_after_partial_buffer() {
    let mut writer = Writer::native();
    writer.write_u8(9);
    writer.write_i64s(&[1, -2, 3, i64::MAX]);
    let source = Trickle::new(writer.dump(), 5);
    let mut reader = Reader::from_source(source, 12).native(true);
    assert_eq!(reader.read_u8().unwrap(), 9);
    assert_eq!(reader.read_i64s(4).unwrap(), vec![1, -2, 3, i64::MAX]);
}

#[test]
fn test_read_into_dynamic_target() {
    let mut writer = Writer::native();
    writer.write_f64s(&[0.5, 1.5]);
    let mut reader = Reader::new(writer.as_slice()).native(true);
    let mut target = vec![0f64; 2];
    reader.read_into(&mut target).unwrap();
    assert_eq!(target, vec![0.5, 1.5]);
}

#[test]
fn test_read_into_non_array_target() {
    if should_panic_on_error() {
        return;
    }
    let mut reader = Reader::new(&[0; 16]).native(true);
    let mut target = String::from("not an array");
    let err = reader.read_into(&mut target).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(reader.position(), 0);
}

#[test]
fn test_underflow_without_source() {
    if should_panic_on_error() {
        return;
    }
    let mut reader = Reader::new(&[1, 2, 3]).native(true);
    let err = reader.read_i32().unwrap_err();
    assert!(matches!(err, Error::BufferUnderflow(4, 3)));

    let mut reader = Reader::new(&[1, 2, 3]);
    let mut out = [0u8; 8];
    let err = reader.read_exact_into(&mut out).unwrap_err();
    assert!(matches!(err, Error::BufferUnderflow(..)));
}

#[test]
fn test_strings_across_refills() {
    let mut writer = Writer::new();
    let long = "skein ".repeat(40);
    writer.write_string("short");
    writer.write_string(&long);
    writer.write_string("");
    let source = Trickle::new(writer.dump(), 7);
    let mut reader = Reader::from_source(source, 32);
    assert_eq!(reader.read_string().unwrap(), "short");
    assert_eq!(reader.read_string().unwrap(), long);
    assert_eq!(reader.read_string().unwrap(), "");
    assert!(reader.eof().unwrap());
}

#[test]
fn test_invalid_utf8() {
    if should_panic_on_error() {
        return;
    }
    let mut reader = Reader::new(&[2, 0xC3, 0x28]);
    assert!(matches!(reader.read_string(), Err(Error::InvalidData(_))));
}

#[test]
fn test_varint_arrays() {
    let mut rng = rand::thread_rng();
    let ints: Vec<i32> = (0..200).map(|i| if i % 3 == 0 { rng.gen() } else { i - 100 }).collect();
    let longs: Vec<i64> = (0..200).map(|i| if i % 3 == 0 { rng.gen() } else { i * -7 }).collect();

    for native in [false, true] {
        let mut writer = if native {
            Writer::native()
        } else {
            Writer::new()
        };
        writer.write_varint32s(&ints);
        writer.write_varint64s(&longs);
        if native {
            assert_eq!(writer.len(), 200 * 4 + 200 * 8);
        } else {
            assert!(writer.len() < 200 * 4 + 200 * 8);
        }

        let source = Trickle::new(writer.dump(), 11);
        let mut reader = Reader::from_source(source, 48).native(native);
        assert_eq!(reader.read_varint32s(ints.len()).unwrap(), ints);
        assert_eq!(reader.read_varint64s(longs.len()).unwrap(), longs);
        assert!(reader.eof().unwrap());
    }
}

#[test]
fn test_scalar_arrays() {
    let shorts: Vec<i16> = vec![i16::MIN, -1, 0, 1, i16::MAX];
    let chars: Vec<u16> = "skein ✓".encode_utf16().collect();
    let floats: Vec<f32> = vec![f32::MIN, -0.5, 0.0, 3.25, f32::MAX];
    let longs: Vec<u64> = vec![0, 1, u64::MAX / 3, u64::MAX];

    for native in [false, true] {
        let mut writer = if native {
            Writer::native()
        } else {
            Writer::new()
        };
        writer.write_i16s(&shorts);
        writer.write_u16s(&chars);
        writer.write_f32s(&floats);
        writer.write_u64s(&longs);

        let mut reader = Reader::new(writer.as_slice()).native(native);
        assert_eq!(reader.read_i16s(shorts.len()).unwrap(), shorts);
        assert_eq!(reader.read_u16s(chars.len()).unwrap(), chars);
        assert_eq!(reader.read_f32s(floats.len()).unwrap(), floats);
        assert_eq!(reader.read_u64s(longs.len()).unwrap(), longs);
        assert!(reader.eof().unwrap());
    }
}

#[test]
fn test_chunked_u16_decode() {
    let mut rng = rand::thread_rng();
    let chars: Vec<u16> = (0..999).map(|_| rng.gen()).collect();

    for native in [true, false] {
        let mut writer = if native {
            Writer::native()
        } else {
            Writer::new()
        };
        writer.write_u8(1);
        writer.write_u16s(&chars);
        // odd refill sizes split elements across refills
        let source = Trickle::new(writer.dump(), 7);
        let mut reader = Reader::from_source(source, 33).native(native);
        assert_eq!(reader.read_u8().unwrap(), 1);
        assert_eq!(reader.read_u16s(chars.len()).unwrap(), chars);
        assert_eq!(reader.total(), 1 + 999 * 2);
    }
}

#[test]
fn test_overlong_varint() {
    if should_panic_on_error() {
        return;
    }
    let mut reader = Reader::new(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    assert_eq!(reader.read_varuint32().unwrap(), u32::MAX);

    for bytes in [
        [0xFF, 0xFF, 0xFF, 0xFF, 0x1F],
        [0x80, 0x80, 0x80, 0x80, 0x10],
        [0xFF, 0xFF, 0xFF, 0xFF, 0x8F],
    ] {
        let mut reader = Reader::new(&bytes);
        assert!(matches!(reader.read_varuint32(), Err(Error::InvalidData(_))));
        let mut reader = Reader::new(&bytes);
        assert!(matches!(reader.read_varint32(), Err(Error::InvalidData(_))));
    }

    let mut max = vec![0xFF; 9];
    max.push(0x01);
    assert_eq!(Reader::new(&max).read_varuint64().unwrap(), u64::MAX);
    let mut overlong = vec![0xFF; 9];
    overlong.push(0x02);
    assert!(matches!(
        Reader::new(&overlong).read_varuint64(),
        Err(Error::InvalidData(_))
    ));
}

struct Broken;

impl Read for Broken {
    fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "source closed"))
    }
}

#[test]
fn test_failing_source() {
    if should_panic_on_error() {
        return;
    }
    let mut reader = Reader::from_source(Broken, 16);
    let err = reader.read_i32().unwrap_err();
    assert!(matches!(err, Error::Io(_)));
    assert_eq!(err.to_string(), "I/O error: source closed");
}
