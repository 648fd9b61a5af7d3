//! Schema compilation.
//!
//! A [`Schema`] is the compiled, immutable form of a record layout: an
//! ordered list of [`FieldDescriptor`]s and the fixed total byte length they
//! span. Two layout forms are accepted:
//!
//! - A text layout, one `TYPE[COUNT] NAME` per line, compiled with
//!   [`Schema::compile`]. Custom types resolve their transforms from a
//!   [`TransformRegistry`] keyed by type tag.
//! - A structured list of `(name, format)` pairs with struct-style format
//!   strings, compiled with [`Schema::from_fields`]. Transforms are supplied
//!   per field name through [`Hooks`].
//! - An offset layout, one `0xOFFSET TYPE[COUNT] NAME` per line in any order,
//!   compiled with [`Schema::from_offsets`]. Undeclared byte ranges become
//!   `unknown` fields named `unk1`, `unk2`, ...
//!
//! ```
//! use fieldpack_core::{Schema, TransformRegistry};
//!
//! let schema = Schema::compile(
//!     "
//!     <
//!     Uint32      score    # score comes before the name
//!     string[16]  name
//!     options[6]  options  # six bytes, custom encoding
//!     ",
//!     &TransformRegistry::new(),
//! )?;
//!
//! assert_eq!(schema.len(), 3);
//! assert_eq!(schema.total_length(), 26);
//! # Ok::<(), fieldpack_core::SchemaError>(())
//! ```

mod dsl;
mod primitive;

use crate::error::SchemaError;
use crate::transform::{self, DecodeFn, EncodeFn, Hooks, TransformRegistry};
use dsl::{FieldDecl, OffsetStatement, Statement};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

pub use primitive::Primitive;

/// Byte order applied to every multi-byte numeric field of a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least significant byte first
    #[default]
    Little,
    /// Most significant byte first
    Big,
}

impl ByteOrder {
    /// The byte order of the host
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }

    /// Resolves a struct-style byte order character.
    ///
    /// `@` and `=` select the host order; no alignment is applied.
    pub fn from_directive(c: char) -> Option<Self> {
        match c {
            '<' => Some(ByteOrder::Little),
            '>' | '!' => Some(ByteOrder::Big),
            '@' | '=' => Some(ByteOrder::native()),
            _ => None,
        }
    }

    /// The canonical directive character
    pub fn directive(&self) -> char {
        match self {
            ByteOrder::Little => '<',
            ByteOrder::Big => '>',
        }
    }
}

/// How fixed-length `string` fields treat trailing padding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringMode {
    /// Decode to the raw bytes; pack pads with NUL
    #[default]
    Raw,
    /// Strip trailing NUL bytes on decode; pack pads with NUL
    TrimNul,
    /// Strip trailing spaces on decode; pack pads with spaces
    TrimSpace,
}

impl StringMode {
    /// The byte trimmed on decode and used to pad on encode
    pub fn pad_byte(&self) -> u8 {
        match self {
            StringMode::Raw | StringMode::TrimNul => 0,
            StringMode::TrimSpace => b' ',
        }
    }
}

/// Configuration for schema compilation
#[derive(Debug, Clone, Default)]
pub struct SchemaConfig {
    /// Byte order for structured layouts, and for text layouts that do not
    /// declare one
    pub byte_order: ByteOrder,
    /// Default trim mode for `string` fields
    pub string_mode: StringMode,
    /// Reject custom types that have no registered transform
    pub strict_transforms: bool,
}

impl SchemaConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default byte order
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Sets the string trim mode
    pub fn string_mode(mut self, mode: StringMode) -> Self {
        self.string_mode = mode;
        self
    }

    /// Sets whether unresolved custom types are an error
    pub fn strict_transforms(mut self, strict: bool) -> Self {
        self.strict_transforms = strict;
        self
    }
}

/// The declared type of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// A built-in primitive
    Primitive(Primitive),
    /// A user-defined type; the field is `count` opaque bytes
    Custom(String),
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Primitive(p) => write!(f, "{}", p),
            TypeTag::Custom(name) => f.write_str(name),
        }
    }
}

/// One entry of a structured layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Struct-style format string, e.g. `"I"` or `"16s"`
    pub format: String,
    /// Per-field override of the schema's string trim mode
    pub string_mode: Option<StringMode>,
}

impl FieldSpec {
    /// Creates a spec with the schema's default trim mode
    pub fn new(name: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: format.into(),
            string_mode: None,
        }
    }

    /// Overrides the trim mode of this field
    pub fn string_mode(mut self, mode: StringMode) -> Self {
        self.string_mode = Some(mode);
        self
    }
}

impl<N: Into<String>, F: Into<String>> From<(N, F)> for FieldSpec {
    fn from((name, format): (N, F)) -> Self {
        Self::new(name, format)
    }
}

/// A compiled field: everything needed to slice, decode and encode it
#[derive(Clone)]
pub struct FieldDescriptor {
    name: String,
    type_tag: TypeTag,
    primitive: Primitive,
    count: usize,
    offset: usize,
    byte_order: ByteOrder,
    string_mode: StringMode,
    pub(crate) decode: Option<DecodeFn>,
    pub(crate) encode: Option<EncodeFn>,
}

impl FieldDescriptor {
    /// Field name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn type_tag(&self) -> &TypeTag {
        &self.type_tag
    }

    /// Primitive layout used for raw handling; custom types use [`Primitive::Bytes`]
    pub fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// Repeat count for repeated primitives, byte length otherwise
    pub fn count(&self) -> usize {
        self.count
    }

    /// Byte offset of the field within a record
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Bytes occupied by the field
    pub fn byte_length(&self) -> usize {
        self.count * self.primitive.width()
    }

    /// Byte order of numeric elements
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Trim mode for string fields
    pub fn string_mode(&self) -> StringMode {
        self.string_mode
    }

    /// True for custom-typed fields
    pub fn is_custom(&self) -> bool {
        matches!(self.type_tag, TypeTag::Custom(_))
    }

    /// True for padding, which never appears in records
    pub fn is_padding(&self) -> bool {
        self.primitive == Primitive::Padding
    }

    /// True if a decode or encode hook is attached
    pub fn has_transform(&self) -> bool {
        self.decode.is_some() || self.encode.is_some()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("type_tag", &self.type_tag)
            .field("count", &self.count)
            .field("offset", &self.offset)
            .field("byte_order", &self.byte_order)
            .field("string_mode", &self.string_mode)
            .field("decode", &self.decode.is_some())
            .field("encode", &self.encode.is_some())
            .finish()
    }
}

/// A compiled record layout
#[derive(Clone, Debug)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    total_length: usize,
    byte_order: ByteOrder,
}

impl Schema {
    /// Compiles a text layout with the default configuration
    pub fn compile(layout: &str, registry: &TransformRegistry) -> Result<Self, SchemaError> {
        Self::compile_with_config(layout, registry, &SchemaConfig::default())
    }

    /// Compiles a text layout.
    ///
    /// Custom types are resolved against `registry` by type tag. A custom
    /// type with no entry passes its bytes through unchanged unless
    /// [`SchemaConfig::strict_transforms`] is set.
    pub fn compile_with_config(
        layout: &str,
        registry: &TransformRegistry,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let mut builder = Builder::new(config);
        let mut declared_order: Option<ByteOrder> = None;

        for (idx, text) in layout.lines().enumerate() {
            let line = idx + 1;
            let Some(statement) = dsl::parse_line(text, line)? else {
                continue;
            };

            match statement {
                Statement::ByteOrder(order) => {
                    if declared_order.is_some() {
                        return Err(SchemaError::DuplicateByteOrder { line });
                    }
                    if !builder.pending.is_empty() {
                        return Err(SchemaError::ByteOrderAfterField { line });
                    }
                    trace!("Byte order '{}' set on line {}", order.directive(), line);
                    declared_order = Some(order);
                    builder.byte_order = order;
                }
                Statement::Field(decl) => {
                    let (type_tag, hooks) = resolve(&decl, registry, config)?;
                    builder.push(decl.name, type_tag, decl.count, None, hooks)?;
                }
            }
        }

        Ok(builder.finish())
    }

    /// Compiles an offset layout.
    ///
    /// Each line places a field at an absolute hex offset; lines may come in
    /// any order. A `0xLENGTH EOF` line fixes the record length, otherwise the
    /// record ends with the last field. Gaps between fields, and between the
    /// last field and `EOF`, are filled with `unknown` fields named `unk1`,
    /// `unk2`, ... in offset order.
    ///
    /// ```
    /// use fieldpack_core::{Schema, SchemaConfig, TransformRegistry};
    ///
    /// let schema = Schema::from_offsets(
    ///     "
    ///     0x24 options[6]  options
    ///     0x00 Uint32      score
    ///     0x04 string[16]  name
    ///     0x50 EOF
    ///     ",
    ///     &TransformRegistry::new(),
    ///     &SchemaConfig::default(),
    /// )?;
    ///
    /// let names: Vec<_> = schema.fields().iter().map(|f| f.name()).collect();
    /// assert_eq!(names, ["score", "name", "unk1", "options", "unk2"]);
    /// assert_eq!(schema.total_length(), 0x50);
    /// # Ok::<(), fieldpack_core::SchemaError>(())
    /// ```
    pub fn from_offsets(
        layout: &str,
        registry: &TransformRegistry,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError> {
        let mut builder = Builder::new(config);
        let mut declared_order: Option<ByteOrder> = None;
        let mut eof: Option<usize> = None;
        let mut placed: Vec<(usize, FieldDecl<'_>)> = Vec::new();

        for (idx, text) in layout.lines().enumerate() {
            let line = idx + 1;
            let Some(statement) = dsl::parse_offset_line(text, line)? else {
                continue;
            };

            match statement {
                OffsetStatement::ByteOrder(order) => {
                    if declared_order.replace(order).is_some() {
                        return Err(SchemaError::DuplicateByteOrder { line });
                    }
                    builder.byte_order = order;
                }
                OffsetStatement::Eof(length) => {
                    if eof.replace(length).is_some() {
                        return Err(SchemaError::syntax(line, "EOF declared more than once"));
                    }
                }
                OffsetStatement::Field { offset, field } => placed.push((offset, field)),
            }
        }

        // stable, so fields sharing an offset keep line order and overlap
        placed.sort_by_key(|&(offset, _)| offset);

        let mut gaps = 0;
        for (offset, decl) in placed {
            if offset < builder.offset {
                return Err(SchemaError::Overlap {
                    name: decl.name.to_string(),
                    offset,
                    end: builder.offset,
                });
            }
            builder.fill_gap(offset, &mut gaps)?;

            let (type_tag, hooks) = resolve(&decl, registry, config)?;
            builder.push(decl.name, type_tag, decl.count, None, hooks)?;
        }

        if let Some(length) = eof {
            if length < builder.offset {
                return Err(SchemaError::EofInsideFields {
                    length,
                    end: builder.offset,
                });
            }
            builder.fill_gap(length, &mut gaps)?;
        }

        Ok(builder.finish())
    }

    /// Compiles a structured layout of `(name, format)` pairs.
    ///
    /// Hooks are matched by field name; a hook naming a field that is not
    /// declared (or is padding) is rejected.
    pub fn from_fields<I, S>(
        fields: I,
        hooks: Hooks,
        config: &SchemaConfig,
    ) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: Into<FieldSpec>,
    {
        let mut builder = Builder::new(config);
        let Hooks {
            mut decode,
            mut encode,
        } = hooks;

        for spec in fields {
            let spec: FieldSpec = spec.into();
            let (primitive, count) = Primitive::parse_format(&spec.format)
                .ok_or_else(|| SchemaError::unknown_format(&spec.name, &spec.format))?;

            let field_hooks = if primitive == Primitive::Padding {
                (None, None)
            } else {
                (decode.remove(&spec.name), encode.remove(&spec.name))
            };
            builder.push(
                &spec.name,
                TypeTag::Primitive(primitive),
                count,
                spec.string_mode,
                field_hooks,
            )?;
        }

        if let Some(name) = decode.keys().chain(encode.keys()).min() {
            return Err(SchemaError::OrphanHook { name: name.clone() });
        }

        Ok(builder.finish())
    }

    /// Compiled fields in layout order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Looks up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.index.get(name).map(|&idx| &self.fields[idx])
    }

    /// Fields that appear in records, in layout order
    pub fn record_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_padding())
    }

    /// Number of declared fields, padding included
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the layout declares no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Exact byte length of every record
    pub fn total_length(&self) -> usize {
        self.total_length
    }

    /// Byte order shared by all numeric fields
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

/// Resolves the type tag of a text declaration, looking custom types up in
/// `registry`
fn resolve(
    decl: &FieldDecl<'_>,
    registry: &TransformRegistry,
    config: &SchemaConfig,
) -> Result<(TypeTag, (Option<DecodeFn>, Option<EncodeFn>)), SchemaError> {
    if let Some(primitive) = Primitive::from_tag(decl.type_tag) {
        return Ok((TypeTag::Primitive(primitive), (None, None)));
    }

    let hooks = match registry.get(decl.type_tag) {
        Some(found) => {
            let (decode, encode) = transform::split(found);
            (Some(decode), Some(encode))
        }
        None if config.strict_transforms => {
            return Err(SchemaError::UnresolvedTransform {
                name: decl.name.to_string(),
                type_tag: decl.type_tag.to_string(),
            });
        }
        None => {
            debug!(
                "No transform for type '{}' (field '{}'), passing bytes through",
                decl.type_tag, decl.name
            );
            (None, None)
        }
    };
    Ok((TypeTag::Custom(decl.type_tag.to_string()), hooks))
}

/// Accumulates descriptors, enforcing name uniqueness and positive counts
struct Builder<'c> {
    config: &'c SchemaConfig,
    byte_order: ByteOrder,
    pending: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
    offset: usize,
}

impl<'c> Builder<'c> {
    fn new(config: &'c SchemaConfig) -> Self {
        Self {
            config,
            byte_order: config.byte_order,
            pending: Vec::new(),
            index: HashMap::new(),
            offset: 0,
        }
    }

    fn push(
        &mut self,
        name: &str,
        type_tag: TypeTag,
        count: usize,
        string_mode: Option<StringMode>,
        (decode, encode): (Option<DecodeFn>, Option<EncodeFn>),
    ) -> Result<(), SchemaError> {
        if count == 0 {
            return Err(SchemaError::InvalidCount {
                name: name.to_string(),
                count,
            });
        }
        if self.index.contains_key(name) {
            return Err(SchemaError::duplicate_field(name));
        }

        let primitive = match &type_tag {
            TypeTag::Primitive(p) => *p,
            TypeTag::Custom(_) => Primitive::Bytes,
        };
        let end = count
            .checked_mul(primitive.width())
            .and_then(|length| self.offset.checked_add(length))
            .ok_or_else(|| SchemaError::LengthOverflow {
                name: name.to_string(),
            })?;

        let descriptor = FieldDescriptor {
            name: name.to_string(),
            type_tag,
            primitive,
            count,
            offset: self.offset,
            byte_order: self.byte_order,
            string_mode: string_mode.unwrap_or(self.config.string_mode),
            decode,
            encode,
        };

        trace!(
            "Field '{}': {}[{}] at offset {} ({} bytes)",
            descriptor.name,
            descriptor.type_tag,
            descriptor.count,
            descriptor.offset,
            descriptor.byte_length()
        );

        self.offset = end;
        self.index.insert(descriptor.name.clone(), self.pending.len());
        self.pending.push(descriptor);
        Ok(())
    }

    /// Pads up to `offset` with an `unknown` field, if there is a gap
    fn fill_gap(&mut self, offset: usize, gaps: &mut usize) -> Result<(), SchemaError> {
        if offset <= self.offset {
            return Ok(());
        }

        *gaps += 1;
        let name = format!("unk{}", gaps);
        let length = offset - self.offset;
        debug!("Filling {:#x}..{:#x} with unknown[{}] {}", self.offset, offset, length, name);
        self.push(&name, TypeTag::Primitive(Primitive::Bytes), length, None, (None, None))
    }

    fn finish(self) -> Schema {
        debug!(
            "Compiled schema: {} fields, {} bytes, byte order '{}'",
            self.pending.len(),
            self.offset,
            self.byte_order.directive()
        );
        Schema {
            fields: self.pending,
            index: self.index,
            total_length: self.offset,
            byte_order: self.byte_order,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Value;
    use crate::transform::ByteList;
    use pretty_assertions::assert_eq;

    const HIGH_SCORES: &str = "
        <
        Uint32      score    # Score at index 0x00, before name
        string[16]  name
        options[6]  options  # A six byte field with a custom data format
    ";

    fn layout(schema: &Schema) -> Vec<(String, String, usize, usize)> {
        schema
            .fields()
            .iter()
            .map(|f| {
                (
                    f.name().to_string(),
                    f.type_tag().to_string(),
                    f.offset(),
                    f.byte_length(),
                )
            })
            .collect()
    }

    #[test]
    fn test_compile_text_layout() {
        let schema = Schema::compile(HIGH_SCORES, &TransformRegistry::new()).unwrap();

        assert_eq!(
            layout(&schema),
            vec![
                ("score".to_string(), "Uint32".to_string(), 0, 4),
                ("name".to_string(), "string".to_string(), 4, 16),
                ("options".to_string(), "options".to_string(), 20, 6),
            ]
        );
        assert_eq!(schema.total_length(), 26);
        assert_eq!(schema.byte_order(), ByteOrder::Little);
    }

    #[test]
    fn test_repeat_count_multiplies_width() {
        let schema = Schema::compile("Uint32[4] values\nint16[3] deltas", &TransformRegistry::new())
            .unwrap();
        assert_eq!(schema.field("values").unwrap().byte_length(), 16);
        assert_eq!(schema.field("deltas").unwrap().offset(), 16);
        assert_eq!(schema.total_length(), 22);
    }

    #[test]
    fn test_custom_type_resolution() {
        let registry = TransformRegistry::new().with("options", ByteList);
        let schema = Schema::compile(HIGH_SCORES, &registry).unwrap();

        let options = schema.field("options").unwrap();
        assert!(options.is_custom());
        assert!(options.has_transform());
        assert_eq!(options.primitive(), Primitive::Bytes);
        assert!(!schema.field("name").unwrap().has_transform());
    }

    #[test]
    fn test_unresolved_custom_type() {
        let registry = TransformRegistry::new();
        let schema = Schema::compile("blob[3] data", &registry).unwrap();
        assert!(!schema.field("data").unwrap().has_transform());

        let strict = SchemaConfig::new().strict_transforms(true);
        let err = Schema::compile_with_config("blob[3] data", &registry, &strict).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnresolvedTransform {
                name: "data".to_string(),
                type_tag: "blob".to_string(),
            }
        );
    }

    #[test]
    fn test_byte_order_directive_rules() {
        let registry = TransformRegistry::new();

        let schema = Schema::compile(">\nUint32 score", &registry).unwrap();
        assert_eq!(schema.field("score").unwrap().byte_order(), ByteOrder::Big);

        let err = Schema::compile("<\n>\nUint8 x", &registry).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateByteOrder { line: 2 });

        let err = Schema::compile("Uint8 x\n>", &registry).unwrap_err();
        assert_eq!(err, SchemaError::ByteOrderAfterField { line: 2 });
    }

    #[test]
    fn test_duplicate_field_name() {
        let err = Schema::compile("Uint8 x\nUint16 x", &TransformRegistry::new()).unwrap_err();
        assert_eq!(err, SchemaError::duplicate_field("x"));
    }

    #[test]
    fn test_zero_count() {
        let err = Schema::compile("string[0] name", &TransformRegistry::new()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidCount { count: 0, .. }));
    }

    #[test]
    fn test_syntax_error_reports_line() {
        let err = Schema::compile("Uint8 a\n\nUint8 b c", &TransformRegistry::new()).unwrap_err();
        assert!(matches!(err, SchemaError::Syntax { line: 3, .. }));
    }

    #[test]
    fn test_structured_layout() {
        let config = SchemaConfig::new().byte_order(ByteOrder::Big);
        let schema = Schema::from_fields(
            [("flag", "B"), ("pad", "3x"), ("name", "8s"), ("scores", "2H")],
            Hooks::new(),
            &config,
        )
        .unwrap();

        assert_eq!(
            layout(&schema),
            vec![
                ("flag".to_string(), "Uint8".to_string(), 0, 1),
                ("pad".to_string(), "padding".to_string(), 1, 3),
                ("name".to_string(), "string".to_string(), 4, 8),
                ("scores".to_string(), "Uint16".to_string(), 12, 4),
            ]
        );
        assert_eq!(schema.byte_order(), ByteOrder::Big);
        assert_eq!(
            schema.record_fields().map(FieldDescriptor::name).collect::<Vec<_>>(),
            vec!["flag", "name", "scores"]
        );
    }

    #[test]
    fn test_structured_layout_errors() {
        let config = SchemaConfig::default();

        let err =
            Schema::from_fields([("a", "B"), ("b", "7z")], Hooks::new(), &config).unwrap_err();
        assert_eq!(err, SchemaError::unknown_format("b", "7z"));

        let hooks = Hooks::new().decode("ghost", |raw| Ok(Value::Bytes(raw.to_vec())));
        let err = Schema::from_fields([("a", "B")], hooks, &config).unwrap_err();
        assert_eq!(err, SchemaError::OrphanHook { name: "ghost".to_string() });

        let err = Schema::from_fields([("a", "0B")], Hooks::new(), &config).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidCount { .. }));
    }

    #[test]
    fn test_per_field_string_mode() {
        let config = SchemaConfig::new().string_mode(StringMode::TrimNul);
        let schema = Schema::from_fields(
            vec![
                FieldSpec::new("title", "8s"),
                FieldSpec::new("raw", "8s").string_mode(StringMode::Raw),
            ],
            Hooks::new(),
            &config,
        )
        .unwrap();

        assert_eq!(schema.field("title").unwrap().string_mode(), StringMode::TrimNul);
        assert_eq!(schema.field("raw").unwrap().string_mode(), StringMode::Raw);
    }

    #[test]
    fn test_field_length_overflow() {
        let registry = TransformRegistry::new();

        let err = Schema::compile("Uint64[2305843009213693952] a", &registry).unwrap_err();
        assert_eq!(err, SchemaError::LengthOverflow { name: "a".to_string() });

        let err = Schema::compile("string[18446744073709551615] a\nUint8 b", &registry)
            .unwrap_err();
        assert_eq!(err, SchemaError::LengthOverflow { name: "b".to_string() });
    }

    #[test]
    fn test_offsets_fill_gaps() {
        let schema = Schema::from_offsets(
            "
            <
            0x00 Uint32      score    # Score at index 0x00, before name
            0x04 string[16]  name
            0x24 options[6]  options  # A six byte field with a custom data format
            0x50 EOF
            ",
            &TransformRegistry::new().with("options", ByteList),
            &SchemaConfig::default(),
        )
        .unwrap();

        assert_eq!(
            layout(&schema),
            vec![
                ("score".to_string(), "Uint32".to_string(), 0x00, 4),
                ("name".to_string(), "string".to_string(), 0x04, 16),
                ("unk1".to_string(), "unknown".to_string(), 0x14, 16),
                ("options".to_string(), "options".to_string(), 0x24, 6),
                ("unk2".to_string(), "unknown".to_string(), 0x2a, 38),
            ]
        );
        assert_eq!(schema.total_length(), 0x50);
        assert!(schema.field("options").unwrap().has_transform());
    }

    #[test]
    fn test_offsets_in_any_order() {
        let registry = TransformRegistry::new();
        let config = SchemaConfig::default();

        let unordered = Schema::from_offsets(
            "0x06 Uint16 c\n0x1A EOF\n>\n0x02 Uint32 b\n0x01 Uint8 a",
            &registry,
            &config,
        )
        .unwrap();
        let ordered = Schema::compile(
            ">\nunknown[1] unk1\nUint8 a\nUint32 b\nUint16 c\nunknown[18] unk2",
            &registry,
        )
        .unwrap();

        assert_eq!(layout(&unordered), layout(&ordered));
        assert_eq!(unordered.byte_order(), ByteOrder::Big);
    }

    #[test]
    fn test_offsets_without_eof_end_at_last_field() {
        let schema = Schema::from_offsets(
            "0x10 Uint16[2] pair\n0x00 Uint8 first",
            &TransformRegistry::new(),
            &SchemaConfig::default(),
        )
        .unwrap();

        assert_eq!(schema.total_length(), 0x14);
        assert_eq!(schema.field("unk1").unwrap().byte_length(), 15);
    }

    #[test]
    fn test_offsets_errors() {
        let registry = TransformRegistry::new();
        let config = SchemaConfig::default();

        let err = Schema::from_offsets("0x00 Uint32 a\n0x02 Uint8 b", &registry, &config)
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::Overlap {
                name: "b".to_string(),
                offset: 2,
                end: 4,
            }
        );

        let err = Schema::from_offsets("0x00 Uint32 a\n0x03 EOF", &registry, &config)
            .unwrap_err();
        assert_eq!(err, SchemaError::EofInsideFields { length: 3, end: 4 });

        let err = Schema::from_offsets("0x04 EOF\n0x08 EOF", &registry, &config).unwrap_err();
        assert!(matches!(err, SchemaError::Syntax { line: 2, .. }));

        let err = Schema::from_offsets("Uint8 a", &registry, &config).unwrap_err();
        assert!(matches!(err, SchemaError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_schema_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
