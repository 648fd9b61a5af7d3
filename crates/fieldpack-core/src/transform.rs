//! Custom field transforms.
//!
//! Fields whose type is not a built-in primitive are decoded and encoded by
//! a [`Transform`]. Transforms are looked up by type tag in a
//! [`TransformRegistry`] when a text layout is compiled, or supplied per
//! field name through [`Hooks`] when a structured layout is compiled.
//!
//! ```
//! use fieldpack_core::transform::{ByteList, TransformRegistry};
//! use fieldpack_core::{Codec, Value};
//!
//! let registry = TransformRegistry::new().with("options", ByteList);
//! let codec = Codec::compile("options[3] options", &registry)?;
//!
//! let record = codec.unpack(&[1, 2, 3])?;
//! assert_eq!(
//!     record["options"],
//!     Value::List(vec![Value::Unsigned(1), Value::Unsigned(2), Value::Unsigned(3)])
//! );
//! # Ok::<(), fieldpack_core::Error>(())
//! ```

use crate::codec::Value;
use crate::error::HookError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Decoding half of a hook: raw field bytes to a value
pub type DecodeFn = Arc<dyn Fn(&[u8]) -> Result<Value, HookError> + Send + Sync>;

/// Encoding half of a hook: a value to raw field bytes
pub type EncodeFn = Arc<dyn Fn(&Value) -> Result<Vec<u8>, HookError> + Send + Sync>;

/// A `(decode, encode)` pair for a custom field type.
///
/// `encode` must return exactly as many bytes as the field occupies, and
/// should be the inverse of `decode` for records to round-trip.
pub trait Transform: Send + Sync {
    /// Convert the raw bytes of a field into a value
    fn decode(&self, raw: &[u8]) -> Result<Value, HookError>;

    /// Convert a value back into the raw bytes of a field
    fn encode(&self, value: &Value) -> Result<Vec<u8>, HookError>;
}

/// Passes bytes through unchanged in both directions
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Transform for Identity {
    fn decode(&self, raw: &[u8]) -> Result<Value, HookError> {
        Ok(Value::Bytes(raw.to_vec()))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, HookError> {
        value
            .as_bytes()
            .map(<[u8]>::to_vec)
            .ok_or_else(|| format!("expected bytes, found {}", value.kind()).into())
    }
}

/// Splits a field into one unsigned value per byte
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteList;

impl Transform for ByteList {
    fn decode(&self, raw: &[u8]) -> Result<Value, HookError> {
        Ok(Value::List(raw.iter().map(|&b| Value::Unsigned(b.into())).collect()))
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, HookError> {
        let items = value
            .as_list()
            .ok_or_else(|| format!("expected list, found {}", value.kind()))?;
        items
            .iter()
            .map(|item| {
                item.as_u64()
                    .and_then(|v| u8::try_from(v).ok())
                    .ok_or_else(|| format!("list element {} is not a byte", item).into())
            })
            .collect()
    }
}

/// A transform built from a pair of closures
pub struct FnTransform {
    decode: DecodeFn,
    encode: EncodeFn,
}

impl FnTransform {
    /// Creates a transform from a decode and an encode closure
    pub fn new<D, E>(decode: D, encode: E) -> Self
    where
        D: Fn(&[u8]) -> Result<Value, HookError> + Send + Sync + 'static,
        E: Fn(&Value) -> Result<Vec<u8>, HookError> + Send + Sync + 'static,
    {
        Self {
            decode: Arc::new(decode),
            encode: Arc::new(encode),
        }
    }
}

impl Transform for FnTransform {
    fn decode(&self, raw: &[u8]) -> Result<Value, HookError> {
        (self.decode)(raw)
    }

    fn encode(&self, value: &Value) -> Result<Vec<u8>, HookError> {
        (self.encode)(value)
    }
}

impl fmt::Debug for FnTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTransform").finish_non_exhaustive()
    }
}

/// Transforms keyed by custom type tag, consulted when compiling text layouts
#[derive(Clone, Default)]
pub struct TransformRegistry {
    by_type: HashMap<String, Arc<dyn Transform>>,
}

impl TransformRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transform for `type_tag`, replacing any previous one
    pub fn register(
        &mut self,
        type_tag: impl Into<String>,
        transform: impl Transform + 'static,
    ) {
        self.by_type.insert(type_tag.into(), Arc::new(transform));
    }

    /// Registers a transform built from two closures
    pub fn register_fn<D, E>(&mut self, type_tag: impl Into<String>, decode: D, encode: E)
    where
        D: Fn(&[u8]) -> Result<Value, HookError> + Send + Sync + 'static,
        E: Fn(&Value) -> Result<Vec<u8>, HookError> + Send + Sync + 'static,
    {
        self.register(type_tag, FnTransform::new(decode, encode));
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(
        mut self,
        type_tag: impl Into<String>,
        transform: impl Transform + 'static,
    ) -> Self {
        self.register(type_tag, transform);
        self
    }

    /// Looks up the transform for `type_tag`
    pub fn get(&self, type_tag: &str) -> Option<Arc<dyn Transform>> {
        self.by_type.get(type_tag).cloned()
    }

    /// Returns true if a transform is registered for `type_tag`
    pub fn contains(&self, type_tag: &str) -> bool {
        self.by_type.contains_key(type_tag)
    }

    /// Number of registered type tags
    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.by_type.keys().collect();
        tags.sort();
        f.debug_struct("TransformRegistry").field("types", &tags).finish()
    }
}

/// Per-field hooks for structured layouts.
///
/// Decode and encode hooks are registered independently; a field with only
/// one of them keeps its primitive behaviour in the other direction.
#[derive(Clone, Default)]
pub struct Hooks {
    pub(crate) decode: HashMap<String, DecodeFn>,
    pub(crate) encode: HashMap<String, EncodeFn>,
}

impl Hooks {
    /// Creates an empty hook set
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a decode hook for `field`
    pub fn decode<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&[u8]) -> Result<Value, HookError> + Send + Sync + 'static,
    {
        self.decode.insert(field.into(), Arc::new(hook));
        self
    }

    /// Adds an encode hook for `field`
    pub fn encode<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(&Value) -> Result<Vec<u8>, HookError> + Send + Sync + 'static,
    {
        self.encode.insert(field.into(), Arc::new(hook));
        self
    }

    /// Adds both directions of `transform` for `field`
    pub fn transform(
        mut self,
        field: impl Into<String>,
        transform: impl Transform + 'static,
    ) -> Self {
        let field = field.into();
        let (decode, encode) = split(Arc::new(transform));
        self.decode.insert(field.clone(), decode);
        self.encode.insert(field, encode);
        self
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("decode", &self.decode.keys().collect::<Vec<_>>())
            .field("encode", &self.encode.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Splits a transform object into independent decode and encode hooks
pub(crate) fn split(transform: Arc<dyn Transform>) -> (DecodeFn, EncodeFn) {
    let encoder = Arc::clone(&transform);
    (
        Arc::new(move |raw: &[u8]| transform.decode(raw)),
        Arc::new(move |value: &Value| encoder.encode(value)),
    )
}
