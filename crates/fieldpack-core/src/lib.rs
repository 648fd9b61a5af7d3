//! # fieldpack-core
//!
//! A schema-driven codec for fixed-layout binary records, such as the save
//! files, high score tables and resource headers of classic games.
//!
//! This crate provides the core functionality for:
//! - Compiling a record layout (sequential, offset-placed or structured)
//!   into an immutable [`Schema`]
//! - Unpacking a byte buffer into a named-field [`Record`] and packing it back
//! - Plugging custom field encodings in through [`Transform`]s
//! - Identifying a set of files by size and content hash
//!
//! ## Architecture
//!
//! - [`schema`]: Layout parsing and field descriptors
//! - [`codec`]: Pack/unpack over compiled schemas
//! - [`transform`]: Custom type hooks and the transform registry
//! - [`verify`]: File identification helpers
//! - [`error`]: Error types and handling
//!
//! ## Example
//!
//! ```
//! use fieldpack_core::{Codec, Record, TransformRegistry, Value};
//!
//! let codec = Codec::compile(
//!     "
//!     >               # big-endian
//!     Uint32  score
//!     Uint8   level
//!     ",
//!     &TransformRegistry::new(),
//! )?;
//!
//! let record = codec.unpack(&[0x00, 0x00, 0x01, 0x00, 0x03])?;
//! assert_eq!(record["score"], Value::Unsigned(256));
//!
//! let packed = codec.pack(&Record::new().with("score", 256u32).with("level", 3u8))?;
//! assert_eq!(packed, vec![0x00, 0x00, 0x01, 0x00, 0x03]);
//! # Ok::<(), fieldpack_core::Error>(())
//! ```
//!
//! ## Extensibility
//!
//! Any type tag that is not a built-in primitive names a custom type. Register
//! a [`Transform`] for it in a [`TransformRegistry`]; without one the field's
//! bytes pass through unchanged. A [`Codec`] is itself a transform, so one
//! layout can embed another as a nested record.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod codec;
pub mod error;
pub mod schema;
pub mod transform;
pub mod verify;

// Re-export primary types for convenience
pub use codec::{Codec, Record, Value};
pub use error::{CodecError, Error, HookError, Result, SchemaError};
pub use schema::{
    ByteOrder, FieldDescriptor, FieldSpec, Primitive, Schema, SchemaConfig, StringMode, TypeTag,
};
pub use transform::{ByteList, FnTransform, Hooks, Identity, Transform, TransformRegistry};
pub use verify::{verify, ExpectedFile, Manifest};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
