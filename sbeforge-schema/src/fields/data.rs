//! Data field parsing.

use super::FieldNode;
use crate::common;
use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::props;
use crate::types::TypeKind;

/// Payload of a parsed data field.
#[derive(Debug, Clone)]
pub struct DataField {
    type_name: String,
}

impl DataField {
    /// Returns the name of the data-shaped composite encoding this field.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }
}

pub(super) fn parse(field: &mut FieldNode, db: &mut Database) -> Result<DataField> {
    let type_name = props::type_name(field.xml_node()).to_string();
    if type_name.is_empty() {
        return Err(SchemaError::missing_attr(
            field.xml_node().name.clone(),
            "type",
        ));
    }

    let Some(ty) = db.find_type(&type_name) else {
        return Err(SchemaError::unknown_type(&type_name, field.name()));
    };

    if ty.kind() != TypeKind::Composite {
        return Err(SchemaError::shape(
            field.name(),
            format!("type \"{type_name}\" referenced by a data field must be composite"),
        ));
    }

    ty.as_composite()
        .expect("checked above")
        .check_data_shape(&type_name)?;

    db.record_data_use(&type_name);

    let header = format!(
        "\"{}\"",
        common::path_to(db.protocol_namespace(), &format!("field/{type_name}.h"))
    );
    field.record_extra_header(header);

    Ok(DataField { type_name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::TypeNode;
    use crate::xml::parse_document;

    fn db_with_var_data() -> Database {
        let mut db = Database::for_tests(&Config::default(), 5);
        let node = parse_document(
            r#"<composite name="varData">
                 <type name="length" primitiveType="uint16"/>
                 <type name="varData" primitiveType="uint8" length="0"/>
               </composite>"#,
        )
        .unwrap();
        db.insert_type_for_tests(TypeNode::create(&node).unwrap());
        db.parse_recorded_types_for_tests().unwrap();
        db
    }

    fn parse_data(db: &mut Database, xml: &str) -> Result<FieldNode> {
        let node = parse_document(xml).unwrap();
        let mut field = FieldNode::create(&node, "Msg")?;
        field.parse(db)?;
        Ok(field)
    }

    #[test]
    fn test_data_field_records_use() {
        let mut db = db_with_var_data();
        let field = parse_data(&mut db, r#"<data name="blob" type="varData"/>"#).unwrap();

        assert_eq!(field.as_data().unwrap().type_name(), "varData");
        let composite = db.find_type("varData").unwrap().as_composite().unwrap();
        assert!(composite.data_use_recorded());
        assert!(!composite.is_bundle());
    }

    #[test]
    fn test_data_field_requires_type() {
        let mut db = db_with_var_data();
        assert!(matches!(
            parse_data(&mut db, r#"<data name="blob"/>"#),
            Err(SchemaError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_data_field_unknown_type() {
        let mut db = db_with_var_data();
        assert!(matches!(
            parse_data(&mut db, r#"<data name="blob" type="nope"/>"#),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_data_field_rejects_non_composite() {
        let mut db = db_with_var_data();
        let node = parse_document(r#"<type name="Qty" primitiveType="uint32"/>"#).unwrap();
        db.insert_type_for_tests(TypeNode::create(&node).unwrap());
        db.parse_recorded_types_for_tests().unwrap();

        assert!(matches!(
            parse_data(&mut db, r#"<data name="blob" type="Qty"/>"#),
            Err(SchemaError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_data_field_rejects_wrong_shape() {
        let mut db = db_with_var_data();
        let node = parse_document(
            r#"<composite name="notData">
                 <type name="a" primitiveType="uint16"/>
                 <type name="b" primitiveType="uint16"/>
               </composite>"#,
        )
        .unwrap();
        db.insert_type_for_tests(TypeNode::create(&node).unwrap());
        db.parse_recorded_types_for_tests().unwrap();

        assert!(parse_data(&mut db, r#"<data name="blob" type="notData"/>"#).is_err());
    }

    #[test]
    fn test_basic_field_cannot_use_data_composite() {
        let mut db = db_with_var_data();
        parse_data(&mut db, r#"<data name="blob" type="varData"/>"#).unwrap();

        // Once recorded for data use the composite is off-limits for plain
        // fields.
        let node = parse_document(r#"<field name="f" type="varData"/>"#).unwrap();
        let mut f = FieldNode::create(&node, "Msg").unwrap();
        assert!(f.parse(&mut db).is_err());
    }
}
