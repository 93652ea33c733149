//! Top-level `messageSchema` metadata.

use xmltree::Element;

use crate::error::Result;
use crate::props;

/// Byte order for the encoded protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    /// Little-endian byte order (SBE default).
    #[default]
    LittleEndian,
    /// Big-endian byte order.
    BigEndian,
}

impl ByteOrder {
    /// Resolves a `byteOrder` attribute value; anything but `bigEndian`
    /// falls back to little-endian.
    #[must_use]
    pub fn from_attr(value: &str) -> Self {
        if value == "bigEndian" {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }

    /// Returns the comms endian option emitted into the field base.
    #[must_use]
    pub const fn comms_option(&self) -> &'static str {
        match self {
            Self::LittleEndian => "comms::option::LittleEndian",
            Self::BigEndian => "comms::option::BigEndian",
        }
    }
}

/// Properties of the schema root element.
#[derive(Debug, Clone)]
pub struct MessageSchema {
    /// Package name, becomes the protocol namespace.
    pub package: String,
    /// Numeric schema id.
    pub id: u32,
    /// Declared schema version.
    pub version: u32,
    /// Semantic version string, informational only.
    pub semantic_version: Option<String>,
    /// Schema description.
    pub description: Option<String>,
    /// Encoded byte order.
    pub byte_order: ByteOrder,
    /// Name of the message-header composite.
    pub header_type: String,
}

impl MessageSchema {
    /// Extracts schema metadata from the root element.
    ///
    /// # Errors
    /// Returns an error when a numeric attribute is malformed.
    pub fn from_root(root: &Element) -> Result<Self> {
        Ok(Self {
            package: props::package(root).to_string(),
            id: props::id(root)?,
            version: props::version(root)?,
            semantic_version: props::semantic_version(root),
            description: props::description(root),
            byte_order: ByteOrder::from_attr(props::byte_order(root)),
            header_type: props::header_type(root).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    #[test]
    fn test_from_root() {
        let root = parse_document(
            r#"<sbe:messageSchema xmlns:sbe="http://fixprotocol.io/2016/sbe"
                   package="my proto" id="5" version="3"
                   byteOrder="bigEndian" headerType="hdr"/>"#,
        )
        .unwrap();

        let schema = MessageSchema::from_root(&root).unwrap();
        assert_eq!(schema.package, "my proto");
        assert_eq!(schema.id, 5);
        assert_eq!(schema.version, 3);
        assert_eq!(schema.byte_order, ByteOrder::BigEndian);
        assert_eq!(schema.header_type, "hdr");
    }

    #[test]
    fn test_defaults() {
        let root = parse_document(r#"<messageSchema package="p"/>"#).unwrap();
        let schema = MessageSchema::from_root(&root).unwrap();
        assert_eq!(schema.version, 0);
        assert_eq!(schema.byte_order, ByteOrder::LittleEndian);
        assert_eq!(schema.header_type, "messageHeader");
    }

    #[test]
    fn test_byte_order_options() {
        assert_eq!(
            ByteOrder::LittleEndian.comms_option(),
            "comms::option::LittleEndian"
        );
        assert_eq!(
            ByteOrder::BigEndian.comms_option(),
            "comms::option::BigEndian"
        );
    }
}
