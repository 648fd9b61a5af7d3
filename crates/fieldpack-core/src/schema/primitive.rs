//! Built-in primitive field types.
//!
//! Every primitive has a DSL tag (`Uint32`, `string`, ...) and a struct-style
//! format code (`I`, `s`, ...). Widths are the standard, unaligned sizes.

use std::fmt;

/// A built-in fixed-width encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Unsigned 8-bit integer
    U8,
    /// Signed 8-bit integer
    I8,
    /// Unsigned 16-bit integer
    U16,
    /// Signed 16-bit integer
    I16,
    /// Unsigned 32-bit integer
    U32,
    /// Signed 32-bit integer
    I32,
    /// Unsigned 64-bit integer
    U64,
    /// Signed 64-bit integer
    I64,
    /// IEEE 754 single precision
    F32,
    /// IEEE 754 double precision
    F64,
    /// One byte, non-zero is true
    Bool,
    /// A single raw byte
    Char,
    /// Fixed-length string, subject to the schema's trim mode
    String,
    /// Fixed-length opaque bytes, never trimmed
    Bytes,
    /// Length-prefixed string inside a fixed-length slot
    PascalString,
    /// Skipped bytes, absent from records
    Padding,
}

/// DSL tag → primitive, in lexer order
const DSL_TAGS: &[(&str, Primitive)] = &[
    ("unknown", Primitive::Bytes),
    ("padding", Primitive::Padding),
    ("Uint8", Primitive::U8),
    ("int8", Primitive::I8),
    ("Uint16", Primitive::U16),
    ("int16", Primitive::I16),
    ("Uint32", Primitive::U32),
    ("int32", Primitive::I32),
    ("Uint64", Primitive::U64),
    ("int64", Primitive::I64),
    ("float", Primitive::F32),
    ("double", Primitive::F64),
    ("bool", Primitive::Bool),
    ("char", Primitive::Char),
    ("string", Primitive::String),
    ("pascal_string", Primitive::PascalString),
];

impl Primitive {
    /// Resolves a DSL type tag; `None` means the tag names a custom type
    pub fn from_tag(tag: &str) -> Option<Self> {
        DSL_TAGS
            .iter()
            .find(|(name, _)| *name == tag)
            .map(|&(_, primitive)| primitive)
    }

    /// Resolves a struct-style format code.
    ///
    /// `L`/`l` are accepted as the 4-byte aliases of `I`/`i`.
    pub fn from_code(code: char) -> Option<Self> {
        Some(match code {
            'B' => Primitive::U8,
            'b' => Primitive::I8,
            'H' => Primitive::U16,
            'h' => Primitive::I16,
            'I' | 'L' => Primitive::U32,
            'i' | 'l' => Primitive::I32,
            'Q' => Primitive::U64,
            'q' => Primitive::I64,
            'f' => Primitive::F32,
            'd' => Primitive::F64,
            '?' => Primitive::Bool,
            'c' => Primitive::Char,
            's' => Primitive::String,
            'p' => Primitive::PascalString,
            'x' => Primitive::Padding,
            _ => return None,
        })
    }

    /// Parses a struct-style format string such as `"I"`, `"4H"` or `"16s"`
    ///
    /// Returns the primitive and its count.
    pub fn parse_format(format: &str) -> Option<(Self, usize)> {
        let format = format.trim();
        let code = format.chars().last()?;
        let digits = &format[..format.len() - code.len_utf8()];
        let count = if digits.is_empty() {
            1
        } else if digits.bytes().all(|b| b.is_ascii_digit()) {
            digits.parse().ok()?
        } else {
            return None;
        };
        Some((Self::from_code(code)?, count))
    }

    /// The canonical DSL tag
    pub fn tag(&self) -> &'static str {
        DSL_TAGS
            .iter()
            .find(|(_, primitive)| primitive == self)
            .map(|&(name, _)| name)
            .unwrap_or("unknown")
    }

    /// The struct-style format code
    pub fn code(&self) -> char {
        match self {
            Primitive::U8 => 'B',
            Primitive::I8 => 'b',
            Primitive::U16 => 'H',
            Primitive::I16 => 'h',
            Primitive::U32 => 'I',
            Primitive::I32 => 'i',
            Primitive::U64 => 'Q',
            Primitive::I64 => 'q',
            Primitive::F32 => 'f',
            Primitive::F64 => 'd',
            Primitive::Bool => '?',
            Primitive::Char => 'c',
            Primitive::String | Primitive::Bytes => 's',
            Primitive::PascalString => 'p',
            Primitive::Padding => 'x',
        }
    }

    /// Width in bytes of one element
    pub fn width(&self) -> usize {
        match self {
            Primitive::U16 | Primitive::I16 => 2,
            Primitive::U32 | Primitive::I32 | Primitive::F32 => 4,
            Primitive::U64 | Primitive::I64 | Primitive::F64 => 8,
            _ => 1,
        }
    }

    /// True if `count` repeats the element; false if `count` is a byte length
    pub fn is_repeated(&self) -> bool {
        !matches!(
            self,
            Primitive::String | Primitive::Bytes | Primitive::PascalString | Primitive::Padding
        )
    }

    /// True for types whose byte order matters
    pub fn is_multibyte(&self) -> bool {
        self.width() > 1
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_resolution() {
        assert_eq!(Primitive::from_tag("Uint32"), Some(Primitive::U32));
        assert_eq!(Primitive::from_tag("Uint64").map(|p| p.width()), Some(8));
        assert_eq!(Primitive::from_tag("pascal_string"), Some(Primitive::PascalString));
        assert_eq!(Primitive::from_tag("options"), None);
        assert_eq!(Primitive::from_tag("uint32"), None);
    }

    #[test]
    fn test_tag_code_agree() {
        for &(tag, primitive) in DSL_TAGS {
            if primitive != Primitive::Bytes {
                assert_eq!(primitive.tag(), tag);
                assert_eq!(Primitive::from_code(primitive.code()), Some(primitive));
            }
        }
    }

    #[test]
    fn test_parse_format() {
        assert_eq!(Primitive::parse_format("I"), Some((Primitive::U32, 1)));
        assert_eq!(Primitive::parse_format("4H"), Some((Primitive::U16, 4)));
        assert_eq!(Primitive::parse_format("16s"), Some((Primitive::String, 16)));
        assert_eq!(Primitive::parse_format("0x"), Some((Primitive::Padding, 0)));
        assert_eq!(Primitive::parse_format(""), None);
        assert_eq!(Primitive::parse_format("4z"), None);
        assert_eq!(Primitive::parse_format("-4B"), None);
    }

    #[test]
    fn test_repeat_semantics() {
        assert!(Primitive::U32.is_repeated());
        assert!(Primitive::Char.is_repeated());
        assert!(!Primitive::String.is_repeated());
        assert!(!Primitive::Padding.is_repeated());
        assert!(Primitive::F64.is_multibyte());
        assert!(!Primitive::Bool.is_multibyte());
    }
}
