//! Record packing and unpacking.
//!
//! A [`Codec`] walks the descriptors of a compiled [`Schema`] in layout
//! order. `unpack` slices each field out of a buffer of exactly
//! [`Schema::total_length`] bytes; `pack` encodes each field of a record and
//! concatenates the results. Both are all-or-nothing: on error no partial
//! record or buffer is returned.
//!
//! A `Codec` is itself a [`Transform`]: registered under a custom type tag it
//! decodes that field as a nested record ([`Value::Map`]) and packs it back.

mod field;
mod value;

use crate::error::{CodecError, HookError, SchemaError};
use crate::schema::{Schema, SchemaConfig};
use crate::transform::{Transform, TransformRegistry};
use tracing::trace;

pub use value::{Record, Value};

/// Reader/writer for one record layout.
///
/// Cheap to clone and safe to share across threads; pack and unpack never
/// mutate the codec.
#[derive(Debug, Clone)]
pub struct Codec {
    schema: Schema,
}

impl Codec {
    /// Wraps a compiled schema
    pub fn new(schema: Schema) -> Self {
        Self { schema }
    }

    /// Compiles a text layout and wraps it
    pub fn compile(layout: &str, registry: &TransformRegistry) -> Result<Self, SchemaError> {
        Schema::compile(layout, registry).map(Self::new)
    }

    /// Compiles a text layout with a custom configuration and wraps it
    pub fn compile_with_config(
        layout: &str,
        registry: &TransformRegistry,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        Schema::compile_with_config(layout, registry, config).map(Self::new)
    }

    /// Compiles an offset layout and wraps it
    pub fn from_offsets(
        layout: &str,
        registry: &TransformRegistry,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        Schema::from_offsets(layout, registry, config).map(Self::new)
    }

    /// The compiled schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Exact byte length of every record
    pub fn record_length(&self) -> usize {
        self.schema.total_length()
    }

    /// Decodes a buffer into a fresh record.
    ///
    /// Fails with [`CodecError::LengthMismatch`] unless `data` is exactly
    /// [`Schema::total_length`] bytes long.
    pub fn unpack(&self, data: &[u8]) -> Result<Record, CodecError> {
        let expected = self.schema.total_length();
        if data.len() != expected {
            return Err(CodecError::LengthMismatch {
                expected,
                actual: data.len(),
            });
        }

        trace!("Unpacking {} bytes", data.len());

        let mut record = Record::new();
        let mut offset = 0;

        for descriptor in self.schema.fields() {
            let end = offset + descriptor.byte_length();
            let raw = &data[offset..end];
            offset = end;

            if descriptor.is_padding() {
                continue;
            }

            let value = field::decode(descriptor, raw)?;
            trace!("{} = {}", descriptor.name(), value);
            record.insert(descriptor.name(), value);
        }

        Ok(record)
    }

    /// Encodes a record into a buffer of exactly [`Schema::total_length`] bytes.
    ///
    /// The record must hold one value per non-padding field and nothing else.
    pub fn pack(&self, record: &Record) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(self.schema.total_length());
        let mut consumed = 0;

        for descriptor in self.schema.fields() {
            let value = if descriptor.is_padding() {
                None
            } else {
                let value = record
                    .get(descriptor.name())
                    .ok_or_else(|| CodecError::missing_field(descriptor.name()))?;
                consumed += 1;
                Some(value)
            };
            field::encode(descriptor, value, &mut out)?;
        }

        if consumed != record.len() {
            let unexpected = record
                .keys()
                .find(|name| self.schema.field(name).map_or(true, |f| f.is_padding()))
                .unwrap_or_default();
            return Err(CodecError::UnexpectedField {
                name: unexpected.to_string(),
            });
        }

        debug_assert_eq!(out.len(), self.schema.total_length());
        trace!("Packed {} bytes", out.len());
        Ok(out)
    }
}

impl From<Schema> for Codec {
    fn from(schema: Schema) -> Self {
        Self::new(schema)
    }
}

impl Transform for Codec {
    fn decode(&self, raw: &[u8]) -> Result<Value, HookError> {
        Ok(self.unpack(raw)?.into())
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, HookError> {
        match value {
            Value::Map(fields) => Ok(self.pack(&Record::from(fields.clone()))?),
            other => Err(format!("expected map, found {}", other.kind()).into()),
        }
    }
}
