//! Message model.
//!
//! A message is an ordered field list with the same three-section layout
//! rule groups have: root-block basic fields first, then groups, then data
//! fields. Inactive fields are discarded while parsing.

use std::collections::BTreeSet;

use xmltree::Element;

use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::fields::{FieldKind, FieldNode};
use crate::props;
use crate::xml::ElementExt;

/// A single message declaration.
#[derive(Debug, Clone)]
pub struct MessageNode {
    node: Element,
    name: String,
    id: u32,
    description: Option<String>,
    since_version: u32,
    block_length: usize,
    fields: Vec<FieldNode>,
}

impl MessageNode {
    /// Creates a message node from its XML declaration, recording identity
    /// attributes. Fields are created during `parse()`.
    pub(crate) fn create(node: &Element) -> Result<Self> {
        Ok(Self {
            name: props::name(node).to_string(),
            id: props::id(node)?,
            description: props::description(node),
            since_version: props::since_version(node)?,
            block_length: props::block_length(node)?,
            fields: Vec::new(),
            node: node.clone(),
        })
    }

    /// Parses the message fields in declaration order.
    pub(crate) fn parse(&mut self, db: &mut Database) -> Result<()> {
        debug_assert!(self.fields.is_empty());

        let node = self.node.clone();
        let mut root_block = true;
        let mut data_members = false;

        for child in node.element_children() {
            let mut field = FieldNode::create(child, &self.name)?;
            field.parse(db)?;

            if !field.does_exist(db) {
                continue;
            }

            if !root_block && field.kind() == FieldKind::Basic {
                return Err(SchemaError::shape(
                    field.name(),
                    format!(
                        "basic member of \"{}\" message cannot follow other group or data",
                        self.name
                    ),
                ));
            }

            if data_members && field.kind() != FieldKind::Data {
                return Err(SchemaError::shape(
                    field.name(),
                    format!("member of \"{}\" message cannot follow data", self.name),
                ));
            }

            match field.kind() {
                FieldKind::Basic => {}
                FieldKind::Group => root_block = false,
                FieldKind::Data => {
                    root_block = false;
                    data_members = true;
                }
            }

            self.fields.push(field);
        }

        Ok(())
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the numeric message id, unique across active messages.
    #[must_use]
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Returns the declared description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the version this message was introduced in.
    #[must_use]
    pub fn since_version(&self) -> u32 {
        self.since_version
    }

    /// Returns the declared root-block length, 0 when unspecified.
    #[must_use]
    pub fn declared_block_length(&self) -> usize {
        self.block_length
    }

    /// Returns the fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldNode] {
        &self.fields
    }

    /// Returns the summed wire size of the root-block fields.
    #[must_use]
    pub fn root_block_length(&self, db: &Database) -> usize {
        self.fields
            .iter()
            .take_while(|f| f.kind() == FieldKind::Basic)
            .map(|f| f.serialization_length(db))
            .sum()
    }

    /// Aggregates the header dependencies of all fields.
    #[must_use]
    pub fn extra_headers(&self) -> BTreeSet<String> {
        let mut headers = BTreeSet::new();
        for f in &self.fields {
            headers.extend(f.extra_headers().iter().cloned());
        }
        headers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::TypeNode;
    use crate::xml::parse_document;

    fn test_db() -> Database {
        let mut db = Database::for_tests(&Config::default(), 5);
        for xml in [
            r#"<composite name="groupSizeEncoding">
                 <type name="blockLength" primitiveType="uint16"/>
                 <type name="numInGroup" primitiveType="uint16"/>
               </composite>"#,
            r#"<composite name="varData">
                 <type name="length" primitiveType="uint16"/>
                 <type name="varData" primitiveType="uint8" length="0"/>
               </composite>"#,
        ] {
            let node = parse_document(xml).unwrap();
            db.insert_type_for_tests(TypeNode::create(&node).unwrap());
        }
        db.parse_recorded_types_for_tests().unwrap();
        db
    }

    fn parse_message(db: &mut Database, xml: &str) -> Result<MessageNode> {
        let node = parse_document(xml).unwrap();
        let mut msg = MessageNode::create(&node)?;
        msg.parse(db)?;
        Ok(msg)
    }

    #[test]
    fn test_ordered_fields() {
        let mut db = test_db();
        let msg = parse_message(
            &mut db,
            r#"<message name="Order" id="1">
                 <field name="qty" type="uint32"/>
                 <field name="px" type="double"/>
                 <group name="legs" dimensionType="groupSizeEncoding">
                   <field name="leg" type="uint8"/>
                 </group>
                 <data name="note" type="varData"/>
               </message>"#,
        )
        .unwrap();

        assert_eq!(msg.name(), "Order");
        assert_eq!(msg.id(), 1);
        let names: Vec<_> = msg.fields().iter().map(FieldNode::name).collect();
        assert_eq!(names, vec!["qty", "px", "legs", "note"]);
        assert_eq!(msg.root_block_length(&db), 12);
    }

    #[test]
    fn test_basic_after_group_rejected() {
        let mut db = test_db();
        let err = parse_message(
            &mut db,
            r#"<message name="M" id="1">
                 <field name="a" type="uint32"/>
                 <group name="g" dimensionType="groupSizeEncoding">
                   <field name="x" type="uint8"/>
                 </group>
                 <field name="b" type="uint32"/>
               </message>"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_group_after_data_rejected() {
        let mut db = test_db();
        let err = parse_message(
            &mut db,
            r#"<message name="M" id="1">
                 <data name="note" type="varData"/>
                 <group name="g" dimensionType="groupSizeEncoding">
                   <field name="x" type="uint8"/>
                 </group>
               </message>"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_inactive_fields_discarded() {
        let mut db = test_db();
        let msg = parse_message(
            &mut db,
            r#"<message name="M" id="1">
                 <field name="a" type="uint32"/>
                 <field name="b" type="uint32" sinceVersion="9"/>
               </message>"#,
        )
        .unwrap();
        assert_eq!(msg.fields().len(), 1);
    }

    #[test]
    fn test_deprecated_before_introduced_rejected() {
        let mut db = test_db();
        assert!(parse_message(
            &mut db,
            r#"<message name="M" id="1">
                 <field name="a" type="uint32" sinceVersion="3" deprecated="2"/>
               </message>"#,
        )
        .is_err());
    }

    #[test]
    fn test_extra_headers_aggregated() {
        let mut db = test_db();
        let msg = parse_message(
            &mut db,
            r#"<message name="M" id="1">
                 <field name="a" type="uint32"/>
               </message>"#,
        )
        .unwrap();
        assert!(!msg.extra_headers().is_empty());
    }
}
