//! Per-field primitive encoding and decoding.
//!
//! Numeric elements are read with [`bytes::Buf`] and written with
//! [`bytes::BufMut`] in the field's byte order. String-like fields follow
//! fixed-width struct semantics: short input is padded, long input truncated.

use super::Value;
use crate::error::CodecError;
use crate::schema::{ByteOrder, FieldDescriptor, Primitive, StringMode};
use bytes::{Buf, BufMut};

/// Decodes one field from exactly `field.byte_length()` bytes.
///
/// Padding fields must be filtered out by the caller.
pub(crate) fn decode(field: &FieldDescriptor, raw: &[u8]) -> Result<Value, CodecError> {
    if let Some(hook) = &field.decode {
        return hook(raw).map_err(|e| CodecError::transform(field.name(), e));
    }

    let value = match field.primitive() {
        Primitive::String => decode_string(raw, field.string_mode()),
        Primitive::Bytes | Primitive::Padding => Value::Bytes(raw.to_vec()),
        Primitive::PascalString => {
            let declared = raw.first().copied().unwrap_or(0) as usize;
            let len = declared.min(raw.len().saturating_sub(1));
            Value::Bytes(raw[1..1 + len].to_vec())
        }
        primitive if field.count() == 1 => decode_element(primitive, field.byte_order(), raw),
        primitive => Value::List(
            raw.chunks_exact(primitive.width())
                .map(|chunk| decode_element(primitive, field.byte_order(), chunk))
                .collect(),
        ),
    };

    Ok(value)
}

fn decode_string(raw: &[u8], mode: StringMode) -> Value {
    if mode == StringMode::Raw {
        return Value::Bytes(raw.to_vec());
    }

    let pad = mode.pad_byte();
    let end = raw.iter().rposition(|&b| b != pad).map_or(0, |i| i + 1);
    let trimmed = &raw[..end];
    match std::str::from_utf8(trimmed) {
        Ok(text) => Value::Text(text.to_string()),
        Err(_) => Value::Bytes(trimmed.to_vec()),
    }
}

fn decode_element(primitive: Primitive, order: ByteOrder, mut buf: &[u8]) -> Value {
    let little = order == ByteOrder::Little;
    match primitive {
        Primitive::U8 => Value::Unsigned(buf.get_u8().into()),
        Primitive::I8 => Value::Signed(buf.get_i8().into()),
        Primitive::U16 if little => Value::Unsigned(buf.get_u16_le().into()),
        Primitive::U16 => Value::Unsigned(buf.get_u16().into()),
        Primitive::I16 if little => Value::Signed(buf.get_i16_le().into()),
        Primitive::I16 => Value::Signed(buf.get_i16().into()),
        Primitive::U32 if little => Value::Unsigned(buf.get_u32_le().into()),
        Primitive::U32 => Value::Unsigned(buf.get_u32().into()),
        Primitive::I32 if little => Value::Signed(buf.get_i32_le().into()),
        Primitive::I32 => Value::Signed(buf.get_i32().into()),
        Primitive::U64 if little => Value::Unsigned(buf.get_u64_le()),
        Primitive::U64 => Value::Unsigned(buf.get_u64()),
        Primitive::I64 if little => Value::Signed(buf.get_i64_le()),
        Primitive::I64 => Value::Signed(buf.get_i64()),
        Primitive::F32 if little => Value::Float32(buf.get_f32_le()),
        Primitive::F32 => Value::Float32(buf.get_f32()),
        Primitive::F64 if little => Value::Float(buf.get_f64_le()),
        Primitive::F64 => Value::Float(buf.get_f64()),
        Primitive::Bool => Value::Bool(buf.get_u8() != 0),
        Primitive::Char
        | Primitive::String
        | Primitive::Bytes
        | Primitive::PascalString
        | Primitive::Padding => Value::Bytes(buf.to_vec()),
    }
}

/// Encodes one field, appending exactly `field.byte_length()` bytes to `out`.
///
/// `value` is `None` only for padding fields.
pub(crate) fn encode(
    field: &FieldDescriptor,
    value: Option<&Value>,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let expected = field.byte_length();

    let value = match value {
        Some(value) => value,
        None => {
            out.put_bytes(0, expected);
            return Ok(());
        }
    };

    if let Some(hook) = &field.encode {
        let encoded = hook(value).map_err(|e| CodecError::transform(field.name(), e))?;
        return put_exact(field, &encoded, out);
    }

    match field.primitive() {
        // untransformed custom types pass through unchanged
        Primitive::Bytes if field.is_custom() => put_exact(field, bytes_of(field, value)?, out),
        Primitive::Bytes | Primitive::Padding => {
            put_padded(out, bytes_of(field, value)?, expected, 0);
            Ok(())
        }
        Primitive::String => {
            let pad = field.string_mode().pad_byte();
            put_padded(out, bytes_of(field, value)?, expected, pad);
            Ok(())
        }
        Primitive::PascalString => {
            let data = bytes_of(field, value)?;
            let len = data.len().min(expected - 1).min(u8::MAX as usize);
            out.put_u8(len as u8);
            put_padded(out, &data[..len], expected - 1, 0);
            Ok(())
        }
        primitive if field.count() == 1 => encode_element(field, primitive, value, out),
        primitive => {
            let items = value
                .as_list()
                .ok_or_else(|| CodecError::type_mismatch(field.name(), "list", value.kind()))?;
            if items.len() != field.count() {
                return Err(CodecError::CountMismatch {
                    name: field.name().to_string(),
                    expected: field.count(),
                    actual: items.len(),
                });
            }
            items
                .iter()
                .try_for_each(|item| encode_element(field, primitive, item, out))
        }
    }
}

fn bytes_of<'v>(field: &FieldDescriptor, value: &'v Value) -> Result<&'v [u8], CodecError> {
    value
        .as_bytes()
        .ok_or_else(|| CodecError::type_mismatch(field.name(), "bytes or text", value.kind()))
}

fn put_exact(field: &FieldDescriptor, data: &[u8], out: &mut Vec<u8>) -> Result<(), CodecError> {
    if data.len() != field.byte_length() {
        return Err(CodecError::EncodeLengthMismatch {
            name: field.name().to_string(),
            expected: field.byte_length(),
            actual: data.len(),
        });
    }
    out.put_slice(data);
    Ok(())
}

fn put_padded(out: &mut Vec<u8>, data: &[u8], width: usize, pad: u8) {
    let len = data.len().min(width);
    out.put_slice(&data[..len]);
    out.put_bytes(pad, width - len);
}

macro_rules! put_int {
    ($out:ident, $field:ident, $value:ident, $ty:ty, $le:ident, $be:ident, $little:expr) => {{
        let v = integer::<$ty>($field, $value)?;
        if $little {
            $out.$le(v)
        } else {
            $out.$be(v)
        }
    }};
}

fn encode_element(
    field: &FieldDescriptor,
    primitive: Primitive,
    value: &Value,
    out: &mut Vec<u8>,
) -> Result<(), CodecError> {
    let little = field.byte_order() == ByteOrder::Little;
    match primitive {
        Primitive::U8 => out.put_u8(integer::<u8>(field, value)?),
        Primitive::I8 => out.put_i8(integer::<i8>(field, value)?),
        Primitive::U16 => put_int!(out, field, value, u16, put_u16_le, put_u16, little),
        Primitive::I16 => put_int!(out, field, value, i16, put_i16_le, put_i16, little),
        Primitive::U32 => put_int!(out, field, value, u32, put_u32_le, put_u32, little),
        Primitive::I32 => put_int!(out, field, value, i32, put_i32_le, put_i32, little),
        Primitive::U64 => put_int!(out, field, value, u64, put_u64_le, put_u64, little),
        Primitive::I64 => put_int!(out, field, value, i64, put_i64_le, put_i64, little),
        Primitive::F32 => {
            // single precision values are written as-is so NaN payloads survive
            let v = match *value {
                Value::Float32(v) => v,
                ref other => float(field, other)? as f32,
            };
            if little {
                out.put_f32_le(v)
            } else {
                out.put_f32(v)
            }
        }
        Primitive::F64 => {
            let v = float(field, value)?;
            if little {
                out.put_f64_le(v)
            } else {
                out.put_f64(v)
            }
        }
        Primitive::Bool => match value {
            Value::Bool(b) => out.put_u8(u8::from(*b)),
            other => return Err(CodecError::type_mismatch(field.name(), "bool", other.kind())),
        },
        Primitive::Char => match value.as_bytes() {
            Some([byte]) => out.put_u8(*byte),
            _ => {
                return Err(CodecError::type_mismatch(
                    field.name(),
                    "a single byte",
                    value.kind(),
                ))
            }
        },
        Primitive::String | Primitive::Bytes | Primitive::PascalString | Primitive::Padding => {
            unreachable!("string-like primitives are encoded as a whole")
        }
    }
    Ok(())
}

fn float(field: &FieldDescriptor, value: &Value) -> Result<f64, CodecError> {
    value
        .as_f64()
        .ok_or_else(|| CodecError::type_mismatch(field.name(), "number", value.kind()))
}

/// Converts an integer value into the target width, rejecting out-of-range values
fn integer<T>(field: &FieldDescriptor, value: &Value) -> Result<T, CodecError>
where
    T: TryFrom<u64> + TryFrom<i64>,
{
    let converted = match *value {
        Value::Unsigned(v) => <T as TryFrom<u64>>::try_from(v).ok(),
        Value::Signed(v) => <T as TryFrom<i64>>::try_from(v).ok(),
        ref other => {
            return Err(CodecError::type_mismatch(field.name(), "integer", other.kind()));
        }
    };
    converted.ok_or_else(|| {
        let rendered = value.to_string();
        CodecError::out_of_range(field.name(), rendered, field.primitive().width())
    })
}
