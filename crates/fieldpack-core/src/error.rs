//! Error types for the fieldpack-core library.
//!
//! Failures are split by the phase that produces them: [`SchemaError`] for
//! layout compilation, [`CodecError`] for pack/unpack, and [`Error`] as the
//! crate-level umbrella that also covers the I/O performed by the
//! verification helpers.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fieldpack operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error returned by user-supplied transform hooks
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while compiling a layout description into a schema
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SchemaError {
    /// A layout line could not be parsed
    #[error("syntax error on line {line}: {details}")]
    Syntax {
        /// 1-based line number in the layout text
        line: usize,
        /// Description of the problem
        details: String,
    },

    /// The byte order was set more than once
    #[error("duplicate byte order directive on line {line}")]
    DuplicateByteOrder {
        /// 1-based line number of the second directive
        line: usize,
    },

    /// A byte order directive appeared after the first field
    #[error("byte order directive on line {line} must precede all fields")]
    ByteOrderAfterField {
        /// 1-based line number of the directive
        line: usize,
    },

    /// Two fields share a name
    #[error("duplicate field name '{name}'")]
    DuplicateField {
        /// The repeated name
        name: String,
    },

    /// A field declared a zero count
    #[error("field '{name}' has non-positive count {count}")]
    InvalidCount {
        /// Field name
        name: String,
        /// The offending count
        count: usize,
    },

    /// A struct-style format string was not understood
    #[error("field '{name}' has unknown format '{format}'")]
    UnknownFormat {
        /// Field name
        name: String,
        /// The format string as given
        format: String,
    },

    /// A hook was supplied for a field that the layout does not declare
    #[error("hook supplied for undeclared field '{name}'")]
    OrphanHook {
        /// Name the hook was registered under
        name: String,
    },

    /// A field's byte length, or the running record length, exceeds `usize`
    #[error("field '{name}' makes the record length overflow")]
    LengthOverflow {
        /// Field whose size or offset overflowed
        name: String,
    },

    /// Two fields of an offset layout cover the same bytes
    #[error("field '{name}' at offset {offset:#x} overlaps the field ending at {end:#x}")]
    Overlap {
        /// Field that starts too early
        name: String,
        /// Declared offset of the field
        offset: usize,
        /// End (exclusive) of the preceding field
        end: usize,
    },

    /// An offset layout declares an end of record inside its fields
    #[error("EOF at {length:#x} falls before the end of the last field at {end:#x}")]
    EofInsideFields {
        /// Declared record length
        length: usize,
        /// End (exclusive) of the last field
        end: usize,
    },

    /// Strict mode: a custom type has no registered transform
    #[error("field '{name}' uses custom type '{type_tag}' with no registered transform")]
    UnresolvedTransform {
        /// Field name
        name: String,
        /// The unresolved type tag
        type_tag: String,
    },
}

impl SchemaError {
    /// Creates a new syntax error
    pub fn syntax(line: usize, details: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            details: details.into(),
        }
    }

    /// Creates a new duplicate field error
    pub fn duplicate_field(name: impl Into<String>) -> Self {
        Self::DuplicateField { name: name.into() }
    }

    /// Creates a new unknown format error
    pub fn unknown_format(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self::UnknownFormat {
            name: name.into(),
            format: format.into(),
        }
    }
}

/// Errors raised by [`crate::Codec::pack`] and [`crate::Codec::unpack`]
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CodecError {
    /// Buffer length differs from the schema's fixed length
    #[error("buffer is {actual} bytes but the schema requires exactly {expected}")]
    LengthMismatch {
        /// Schema total length
        expected: usize,
        /// Length of the buffer provided
        actual: usize,
    },

    /// Record lacks a value for a schema field
    #[error("record is missing field '{name}'")]
    MissingField {
        /// Name of the absent field
        name: String,
    },

    /// Record holds a key the schema does not declare
    #[error("record contains unknown field '{name}'")]
    UnexpectedField {
        /// The unexpected key
        name: String,
    },

    /// An encode hook produced the wrong number of bytes
    #[error("encoder for field '{name}' produced {actual} bytes, expected {expected}")]
    EncodeLengthMismatch {
        /// Field name
        name: String,
        /// Declared byte length of the field
        expected: usize,
        /// Bytes actually produced
        actual: usize,
    },

    /// Value variant does not fit the field's primitive type
    #[error("field '{name}' expects {expected}, found {found}")]
    TypeMismatch {
        /// Field name
        name: String,
        /// Description of the accepted shape
        expected: &'static str,
        /// Variant that was supplied
        found: &'static str,
    },

    /// Repeated field was given the wrong number of elements
    #[error("field '{name}' expects {expected} elements, found {actual}")]
    CountMismatch {
        /// Field name
        name: String,
        /// Declared repeat count
        expected: usize,
        /// Elements supplied
        actual: usize,
    },

    /// Integer does not fit the declared width
    #[error("value {value} does not fit field '{name}' ({width} bytes)")]
    OutOfRange {
        /// Field name
        name: String,
        /// Rendered value
        value: String,
        /// Field element width in bytes
        width: usize,
    },

    /// A user-supplied transform hook failed
    #[error("transform for field '{name}' failed: {source}")]
    Transform {
        /// Field name
        name: String,
        /// Error returned by the hook
        #[source]
        source: HookError,
    },
}

impl CodecError {
    /// Creates a new missing field error
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingField { name: name.into() }
    }

    /// Creates a new type mismatch error
    pub fn type_mismatch(
        name: impl Into<String>,
        expected: &'static str,
        found: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
            found,
        }
    }

    /// Creates a new out-of-range error
    pub fn out_of_range(name: impl Into<String>, value: impl ToString, width: usize) -> Self {
        Self::OutOfRange {
            name: name.into(),
            value: value.to_string(),
            width,
        }
    }

    /// Creates a new transform error
    pub fn transform(name: impl Into<String>, source: HookError) -> Self {
        Self::Transform {
            name: name.into(),
            source,
        }
    }
}

/// Comprehensive error type for all fieldpack operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Layout compilation failed
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Pack or unpack failed
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Failed to read a file or directory
    #[error("failed to read '{path}': {source}")]
    FileRead {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A verification manifest line was malformed
    #[error("invalid manifest line {line}: {details}")]
    InvalidManifest {
        /// 1-based line number
        line: usize,
        /// Description of the problem
        details: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new manifest error
    pub fn invalid_manifest(line: usize, details: impl Into<String>) -> Self {
        Self::InvalidManifest {
            line,
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CodecError::LengthMismatch {
            expected: 9,
            actual: 10,
        };
        assert!(err.to_string().contains("exactly 9"));

        let err = SchemaError::duplicate_field("score");
        assert!(err.to_string().contains("'score'"));

        let err = SchemaError::Overlap {
            name: "name".to_string(),
            offset: 0x02,
            end: 0x04,
        };
        assert_eq!(
            err.to_string(),
            "field 'name' at offset 0x2 overlaps the field ending at 0x4"
        );
    }

    #[test]
    fn test_umbrella_is_transparent() {
        let err: Error = CodecError::missing_field("name").into();
        assert_eq!(err.to_string(), "record is missing field 'name'");
        assert!(matches!(err, Error::Codec(CodecError::MissingField { .. })));
    }
}
