//! Common utilities shared across the schema model.
//!
//! Holds the primitive-type table, the default min/max/null value tables
//! (single source of truth for every consumer), numeric literal parsing and
//! formatting, and scope/path composition helpers.

use crate::error::{Result, SchemaError};

/// Member name of dimension composites holding the root-block size.
pub const BLOCK_LENGTH: &str = "blockLength";
/// Member name of dimension composites holding the entry count.
pub const NUM_IN_GROUP: &str = "numInGroup";
/// Message-header member replaced by the message-id enum.
pub const TEMPLATE_ID: &str = "templateId";
/// Message-header member carrying the schema id.
pub const SCHEMA_ID: &str = "schemaId";
/// Message-header member carrying the schema version.
pub const VERSION: &str = "version";
/// Name given to the synthesized null member of optional enums.
pub const ENUM_NULL_VALUE: &str = "NullValue";
/// Name prefix of synthesized padding types and members.
pub const PAD_PREFIX: &str = "pad";
/// Namespace prefix of generated field definitions.
pub const FIELD_NAMESPACE: &str = "field::";
/// Namespace prefix of generated message definitions.
pub const MESSAGE_NAMESPACE: &str = "message::";
/// Suffix of the member-scope struct generated for composites and groups.
pub const MEMBERS_SUFFIX: &str = "Members";
/// Suffix of the inner field of a comms-optional-wrapped definition.
pub const OPT_FIELD_SUFFIX: &str = "Field";
/// Suffix of the element type generated for list fields.
pub const ELEMENT_SUFFIX: &str = "Element";
/// Header defining the common field base class.
pub const FIELD_BASE_HEADER: &str = "FieldBase.h";
/// Header providing the optional field wrapper.
pub const OPTIONAL_HEADER: &str = "comms/field/Optional.h";
/// Namespace the generated builtin helpers live in.
pub const BUILTIN_NAMESPACE_NAME: &str = "sbeforge";
/// Prefix of extra-option template parameters threaded into definitions.
pub const OPT_PARAM_PREFIX: &str = "typename TOpt::";
/// Header providing the version propagation helper used by bundles.
pub const VERSION_SETTER_HEADER: &str = "VersionSetter.h";

/// SBE primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    /// Single character (1 byte).
    Char,
    /// Signed 8-bit integer.
    Int8,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    Uint64,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
}

impl Primitive {
    /// Parses a primitive from its SBE name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "char" => Some(Self::Char),
            "int8" => Some(Self::Int8),
            "uint8" => Some(Self::Uint8),
            "int16" => Some(Self::Int16),
            "uint16" => Some(Self::Uint16),
            "int32" => Some(Self::Int32),
            "uint32" => Some(Self::Uint32),
            "int64" => Some(Self::Int64),
            "uint64" => Some(Self::Uint64),
            "float" => Some(Self::Float),
            "double" => Some(Self::Double),
            _ => None,
        }
    }

    /// Returns the SBE name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Char => "char",
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Returns the serialized size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Char | Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float => 4,
            Self::Int64 | Self::Uint64 | Self::Double => 8,
        }
    }

    /// Returns true for signed integer primitives.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    /// Returns true for unsigned integer primitives.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        matches!(
            self,
            Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64
        )
    }

    /// Returns true for any integer primitive, `char` included.
    #[must_use]
    pub const fn is_int(&self) -> bool {
        !self.is_float()
    }

    /// Returns true for floating point primitives.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::Float | Self::Double)
    }
}

/// Default minimum valid value per primitive.
///
/// Signed minimums are shifted up by one to reserve the null encoding,
/// `char` spans printable ASCII.
#[must_use]
pub const fn default_int_min(p: Primitive) -> i64 {
    match p {
        Primitive::Char => 0x20,
        Primitive::Int8 => i8::MIN as i64 + 1,
        Primitive::Int16 => i16::MIN as i64 + 1,
        Primitive::Int32 => i32::MIN as i64 + 1,
        Primitive::Int64 => i64::MIN + 1,
        Primitive::Uint8 | Primitive::Uint16 | Primitive::Uint32 | Primitive::Uint64 => 0,
        Primitive::Float | Primitive::Double => 0,
    }
}

/// Default maximum valid value per primitive.
///
/// Unsigned maximums are shifted down by one to reserve the null encoding.
/// `uint64` has no entry in the signed table; its bounds come from the
/// big-unsigned path.
#[must_use]
pub const fn default_int_max(p: Primitive) -> Option<i64> {
    match p {
        Primitive::Char => Some(0x7e),
        Primitive::Int8 => Some(i8::MAX as i64),
        Primitive::Int16 => Some(i16::MAX as i64),
        Primitive::Int32 => Some(i32::MAX as i64),
        Primitive::Int64 => Some(i64::MAX),
        Primitive::Uint8 => Some(u8::MAX as i64 - 1),
        Primitive::Uint16 => Some(u16::MAX as i64 - 1),
        Primitive::Uint32 => Some(u32::MAX as i64 - 1),
        Primitive::Uint64 | Primitive::Float | Primitive::Double => None,
    }
}

/// Builtin null encoding per integer primitive: one below the default
/// minimum for signed types, one above the default maximum for unsigned,
/// zero for `char`.
#[must_use]
pub const fn builtin_int_null(p: Primitive) -> i64 {
    match p {
        Primitive::Char => 0,
        Primitive::Int8 => i8::MIN as i64,
        Primitive::Int16 => i16::MIN as i64,
        Primitive::Int32 => i32::MIN as i64,
        Primitive::Int64 => i64::MIN,
        Primitive::Uint8 => u8::MAX as i64,
        Primitive::Uint16 => u16::MAX as i64,
        Primitive::Uint32 => u32::MAX as i64,
        // uint64 null lives outside the signed domain, see
        // `default_big_unsigned_null`.
        Primitive::Uint64 | Primitive::Float | Primitive::Double => 0,
    }
}

/// Default null encoding of the big-unsigned (`uint64`) path.
#[must_use]
pub const fn default_big_unsigned_null() -> u64 {
    u64::MAX
}

/// Default maximum of the big-unsigned (`uint64`) path.
#[must_use]
pub const fn default_big_unsigned_max() -> u64 {
    u64::MAX - 1
}

/// Parses a signed 64-bit literal.
pub fn parse_i64(value: &str, context: &str) -> Result<i64> {
    value
        .trim()
        .parse()
        .map_err(|_| SchemaError::numeric(context, value))
}

/// Parses an unsigned 64-bit literal.
pub fn parse_u64(value: &str, context: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| SchemaError::numeric(context, value))
}

/// Resolves the effective minimum valid value of an integer type.
///
/// Absent attribute falls back to the default table; a single-character
/// `char` literal is taken by character code. Returns `None` when the value
/// does not fit the signed 64-bit domain (the `uint64` big-unsigned case).
pub fn int_min_value(p: Primitive, attr: Option<&str>, context: &str) -> Result<Option<i64>> {
    match attr {
        None => Ok(Some(default_int_min(p))),
        Some(v) if p == Primitive::Char && v.len() == 1 => {
            Ok(Some(i64::from(v.as_bytes()[0])))
        }
        Some(v) if p == Primitive::Uint64 => {
            let val = parse_u64(v, context)?;
            Ok(i64::try_from(val).ok())
        }
        Some(v) => parse_i64(v, context).map(Some),
    }
}

/// Resolves the effective maximum valid value of an integer type.
///
/// Same rules as [`int_min_value`]; additionally `uint64` has no default in
/// the signed table, so an absent attribute yields `None` there.
pub fn int_max_value(p: Primitive, attr: Option<&str>, context: &str) -> Result<Option<i64>> {
    match attr {
        None => Ok(default_int_max(p)),
        Some(v) if p == Primitive::Char && v.len() == 1 => {
            Ok(Some(i64::from(v.as_bytes()[0])))
        }
        Some(v) if p == Primitive::Uint64 => {
            let val = parse_u64(v, context)?;
            Ok(i64::try_from(val).ok())
        }
        Some(v) => parse_i64(v, context).map(Some),
    }
}

/// Resolves a bound on the big-unsigned path, defaulting to the reserved-null
/// maximum.
pub fn big_unsigned_value(attr: Option<&str>, context: &str) -> Result<u64> {
    match attr {
        None => Ok(default_big_unsigned_max()),
        Some(v) => parse_u64(v, context),
    }
}

/// Formats a signed value as a target-language numeric literal.
///
/// Values above the 32-bit range are rendered in hex with a long-long
/// suffix; the 64-bit minimum and its close neighborhood are spelled through
/// `std::numeric_limits` because the plain literal does not round-trip.
#[must_use]
pub fn format_num(val: i64) -> String {
    if i64::from(i32::MAX) < val {
        return format!("0x{val:x}LL");
    }

    const MIN_LIMIT_STR: &str = "std::numeric_limits<std::int64_t>::min()";
    if val == i64::MIN {
        return MIN_LIMIT_STR.to_string();
    }
    if val < i64::MIN + 0xfff {
        return format!("{MIN_LIMIT_STR} + {}", val - i64::MIN);
    }

    if val < i64::from(i32::MIN) {
        return format!("{val}LL");
    }
    if i64::from(i16::MAX) < val || val < i64::from(i16::MIN) {
        return format!("{val}L");
    }
    val.to_string()
}

/// Formats an unsigned value as a target-language numeric literal.
#[must_use]
pub fn format_unsigned(val: u64) -> String {
    match i64::try_from(val) {
        Ok(v) => format_num(v),
        Err(_) => format!("0x{val:x}LL"),
    }
}

/// Joins a namespace and an identifier into a `::`-scoped path.
#[must_use]
pub fn scope_for(ns: &str, name: &str) -> String {
    if ns.is_empty() {
        name.to_string()
    } else {
        format!("{ns}::{name}")
    }
}

/// Joins a namespace and a relative path into an include path.
#[must_use]
pub fn path_to(ns: &str, path: &str) -> String {
    if ns.is_empty() {
        path.to_string()
    } else {
        format!("{ns}/{path}")
    }
}

/// Composes a quoted include token for a header local to the generated
/// protocol tree.
#[must_use]
pub fn local_header(ns: &str, local_ns: &str, path: &str) -> String {
    let local_path = path_to(local_ns, path);
    format!("\"{}\"", path_to(ns, &local_path))
}
