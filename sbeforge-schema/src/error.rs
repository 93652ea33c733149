//! Error types for schema parsing and validation.

use thiserror::Error;

/// Result alias used across the schema crate.
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Error type for schema parsing and validation operations.
///
/// Every failure is fatal; the first error aborts the parse phase and
/// propagates to [`parse_schema`](crate::parse_schema).
#[derive(Debug, Error)]
pub enum SchemaError {
    /// XML document could not be parsed.
    #[error("invalid schema XML: {0}")]
    Xml(#[from] xmltree::ParseError),

    /// IO error while reading the schema file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Structurally invalid schema (missing root, empty composite, etc.).
    #[error("invalid schema structure: {message}")]
    InvalidStructure {
        /// Error message.
        message: String,
    },

    /// Missing required attribute.
    #[error("missing required attribute '{attribute}' on element '{element}'")]
    MissingAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
    },

    /// Invalid attribute value.
    #[error("invalid value '{value}' for attribute '{attribute}' on element '{element}'")]
    InvalidAttribute {
        /// Element name.
        element: String,
        /// Attribute name.
        attribute: String,
        /// Invalid value.
        value: String,
    },

    /// Unknown type reference.
    #[error("unknown type '{type_name}' referenced by '{referrer}'")]
    UnknownType {
        /// Name of the unresolved type.
        type_name: String,
        /// Referencing element.
        referrer: String,
    },

    /// Required/Optional/Constant presence conflict.
    #[error("presence conflict for '{name}': {message}")]
    Presence {
        /// Offending element.
        name: String,
        /// Error message.
        message: String,
    },

    /// Declared offset would overlap the previous member.
    #[error(
        "invalid offset {offset} of member '{member}' in '{owner}', \
         expected at least {expected}"
    )]
    LayoutConflict {
        /// Containing composite/group.
        owner: String,
        /// Offending member.
        member: String,
        /// Declared offset.
        offset: usize,
        /// Minimal allowed offset.
        expected: usize,
    },

    /// Data, dimension, or message-header composite failed its shape check.
    #[error("'{name}' is not of the expected shape: {message}")]
    ShapeMismatch {
        /// Offending element.
        name: String,
        /// Error message.
        message: String,
    },

    /// Duplicate definition (type, message, enum value name, set choice name).
    #[error("duplicate {kind} definition: '{name}'")]
    DuplicateDefinition {
        /// Kind of definition.
        kind: String,
        /// Name of the duplicate.
        name: String,
    },

    /// Two active messages share a numeric id.
    #[error("message '{name}' doesn't have a unique id ({id})")]
    DuplicateMessageId {
        /// Message name.
        name: String,
        /// Duplicated id.
        id: u32,
    },

    /// Two enum values share a numeric encoding.
    #[error("duplicate numeric value {value} in enum '{name}', already taken by '{taken_by}'")]
    DuplicateEnumValue {
        /// Enum name.
        name: String,
        /// Duplicated numeric value.
        value: i64,
        /// Name of the value that already owns the encoding.
        taken_by: String,
    },

    /// Two set choices share a bit index.
    #[error("duplicate bit index {bit} in set '{name}'")]
    DuplicateBitIndex {
        /// Set name.
        name: String,
        /// Duplicated bit index.
        bit: u32,
    },

    /// `sinceVersion`/`deprecated`/forced-version inconsistency.
    #[error("versioning error for '{name}': {message}")]
    Versioning {
        /// Offending element.
        name: String,
        /// Error message.
        message: String,
    },

    /// Cycle detected while resolving type dependencies.
    #[error("recursive type dependency involving '{name}'")]
    RecursiveDependency {
        /// Type on which the cycle was detected.
        name: String,
    },

    /// Malformed literal where a 64-bit integer is required.
    #[error("malformed numeric value '{value}' for {context}")]
    NumericConversion {
        /// What the value was parsed for.
        context: String,
        /// The malformed text.
        value: String,
    },
}

impl SchemaError {
    /// Creates an invalid structure error.
    pub fn structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure {
            message: message.into(),
        }
    }

    /// Creates a missing attribute error.
    pub fn missing_attr(element: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            element: element.into(),
            attribute: attribute.into(),
        }
    }

    /// Creates an invalid attribute error.
    pub fn invalid_attr(
        element: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            element: element.into(),
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    /// Creates an unknown type reference error.
    pub fn unknown_type(type_name: impl Into<String>, referrer: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
            referrer: referrer.into(),
        }
    }

    /// Creates a presence conflict error.
    pub fn presence(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Presence {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a shape mismatch error.
    pub fn shape(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::DuplicateDefinition {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Creates a versioning error.
    pub fn versioning(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Versioning {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a numeric conversion error.
    pub fn numeric(context: impl Into<String>, value: impl Into<String>) -> Self {
        Self::NumericConversion {
            context: context.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SchemaError::missing_attr("type", "name");
        assert_eq!(
            err.to_string(),
            "missing required attribute 'name' on element 'type'"
        );

        let err = SchemaError::invalid_attr("enum", "encodingType", "uint128");
        assert!(err.to_string().contains("uint128"));

        let err = SchemaError::RecursiveDependency {
            name: "Loop".to_string(),
        };
        assert!(err.to_string().contains("Loop"));
    }

    #[test]
    fn test_helper_constructors() {
        assert!(matches!(
            SchemaError::duplicate("type", "Qty"),
            SchemaError::DuplicateDefinition { .. }
        ));
        assert!(matches!(
            SchemaError::presence("f", "required field references optional type"),
            SchemaError::Presence { .. }
        ));
        assert!(matches!(
            SchemaError::numeric("nullValue of 'x'", "abc"),
            SchemaError::NumericConversion { .. }
        ));
    }
}
