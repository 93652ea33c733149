//! Basic field parsing.

use super::FieldNode;
use crate::common::{self, Primitive};
use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::props;
use crate::types::{BasicType, CompositeType, TypeKind, TypeNode};

/// Source a basic field resolved its type from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    /// Explicitly declared type.
    Declared(String),
    /// Synthesized padding type, only for generated padding fields.
    Padding(String),
    /// Lazily instantiated builtin primitive.
    Builtin(String),
}

impl TypeRef {
    /// Returns the referenced type name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Declared(n) | Self::Padding(n) | Self::Builtin(n) => n,
        }
    }
}

/// Payload of a parsed basic field.
#[derive(Debug, Clone)]
pub struct BasicField {
    type_ref: TypeRef,
    value_ref: Option<String>,
    simple_alias: bool,
}

/// Lowered form of a basic field on top of its referent.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldLowering {
    /// Plain alias of the referenced type.
    SimpleAlias,
    /// Constant taking its value from an enum member; serialization is
    /// empty.
    ConstantValueRef {
        /// Enum type name.
        enum_name: String,
        /// Enum value name.
        value_name: String,
        /// Numeric encoding of the referenced value.
        value: i64,
    },
    /// Optional over a required integer type, with a synthesized null.
    OptionalInt {
        /// Reserved null encoding.
        null: i64,
    },
    /// Optional over a required `uint64` type on the big-unsigned path.
    OptionalBigUint {
        /// Reserved null encoding.
        null: u64,
    },
    /// Optional over a required floating point type, NaN-null semantics.
    OptionalFloat,
    /// Optional over a required enum, referencing the enum's `NullValue`.
    OptionalEnum {
        /// Numeric encoding of the enum null.
        null: i64,
    },
}

impl BasicField {
    /// Returns how the referenced type was resolved.
    #[must_use]
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Returns the `valueRef` attribute when present.
    #[must_use]
    pub fn value_ref(&self) -> Option<&str> {
        self.value_ref.as_deref()
    }

    /// Returns true when the field is a plain alias of its type, with no
    /// extensions of its own.
    #[must_use]
    pub fn is_simple_alias(&self) -> bool {
        self.simple_alias
    }

    /// Returns the referenced type.
    #[must_use]
    pub fn referenced_type<'a>(&self, db: &'a Database) -> &'a TypeNode {
        let found = match &self.type_ref {
            TypeRef::Declared(n) => db.find_type(n),
            TypeRef::Padding(n) => db.find_padding_type(n),
            TypeRef::Builtin(n) => db.find_builtin_type(n),
        };
        found.expect("field type resolved at parse time")
    }

    /// Computes the field's lowering over its referent.
    #[must_use]
    pub fn lowering(&self, field: &FieldNode, db: &Database) -> FieldLowering {
        if self.simple_alias {
            return FieldLowering::SimpleAlias;
        }

        if field.is_constant() {
            let value_ref = self.value_ref.as_deref().expect("validated at parse time");
            let (enum_name, value_name) = split_value_ref(value_ref).expect("validated");
            let enum_type = db
                .find_type(enum_name)
                .and_then(TypeNode::as_enum)
                .expect("validated at parse time");
            return FieldLowering::ConstantValueRef {
                enum_name: enum_name.to_string(),
                value_name: value_name.to_string(),
                value: enum_type
                    .numeric_value(value_name)
                    .expect("validated at parse time"),
            };
        }

        debug_assert!(field.is_optional());
        let referent = self.referenced_type(db);
        if let Some(e) = referent.as_enum() {
            return FieldLowering::OptionalEnum {
                null: e.default_null_value(),
            };
        }

        let basic = referent.as_basic().expect("optional referent is basic or enum");
        if basic.is_fp_type() {
            return FieldLowering::OptionalFloat;
        }

        if basic.primitive == Primitive::Uint64 {
            return FieldLowering::OptionalBigUint {
                null: common::default_big_unsigned_null(),
            };
        }

        FieldLowering::OptionalInt {
            null: basic.default_int_null(),
        }
    }
}

fn split_value_ref(value_ref: &str) -> Option<(&str, &str)> {
    let (enum_name, value_name) = value_ref.split_once('.')?;
    if enum_name.is_empty() || value_name.is_empty() {
        return None;
    }
    Some((enum_name, value_name))
}

fn type_header(db: &Database, dir: &str, type_name: &str) -> String {
    format!(
        "\"{}\"",
        common::path_to(db.protocol_namespace(), &format!("{dir}/{type_name}.h"))
    )
}

fn resolve_type(field: &mut FieldNode, db: &mut Database) -> Result<TypeRef> {
    let type_name = props::type_name(field.xml_node()).to_string();
    if type_name.is_empty() {
        if field.is_constant() {
            let value_ref = props::value_ref(field.xml_node()).to_string();
            if !value_ref.is_empty() {
                let (enum_name, _) = split_value_ref(&value_ref).ok_or_else(|| {
                    SchemaError::structure(format!(
                        "failed to split valueRef of \"{}\" into <type.value> pair",
                        field.name()
                    ))
                })?;
                let ty = db
                    .find_type(enum_name)
                    .ok_or_else(|| SchemaError::unknown_type(enum_name, field.name()))?;
                if ty.kind() != TypeKind::Enum {
                    return Err(SchemaError::shape(
                        field.name(),
                        format!("type \"{enum_name}\" referenced via valueRef is not an enum"),
                    ));
                }
                let header = type_header(db, "field", enum_name);
                field.record_extra_header(header);
                return Ok(TypeRef::Declared(enum_name.to_string()));
            }
        }

        return Err(SchemaError::missing_attr(
            field.xml_node().name.clone(),
            "type",
        ));
    }

    if field.is_generated_padding() {
        if db.find_padding_type(&type_name).is_none() {
            return Err(SchemaError::unknown_type(&type_name, field.name()));
        }
        let header = type_header(db, common::BUILTIN_NAMESPACE_NAME, common::PAD_PREFIX);
        field.record_extra_header(header);
        return Ok(TypeRef::Padding(type_name));
    }

    if db.find_type(&type_name).is_some() {
        let header = type_header(db, "field", &type_name);
        field.record_extra_header(header);
        return Ok(TypeRef::Declared(type_name));
    }

    if db.builtin_type(&type_name)?.is_some() {
        let base_header = type_header(db, "field", "FieldBase");
        field.record_extra_header(base_header);
        let header = type_header(db, common::BUILTIN_NAMESPACE_NAME, &type_name);
        field.record_extra_header(header);
        return Ok(TypeRef::Builtin(type_name));
    }

    Err(SchemaError::unknown_type(&type_name, field.name()))
}

pub(super) fn parse(field: &mut FieldNode, db: &mut Database) -> Result<BasicField> {
    let type_ref = resolve_type(field, db)?;
    db.record_normal_use(type_ref.name());
    let value_ref = {
        let v = props::value_ref(field.xml_node());
        (!v.is_empty()).then(|| v.to_string())
    };

    let referent = match &type_ref {
        TypeRef::Declared(n) => db.find_type(n),
        TypeRef::Padding(n) => db.find_padding_type(n),
        TypeRef::Builtin(n) => db.find_builtin_type(n),
    }
    .expect("resolved above");

    if !referent.has_fixed_length() {
        return Err(SchemaError::shape(
            field.name(),
            format!(
                "references type \"{}\" which doesn't have fixed length",
                referent.name()
            ),
        ));
    }

    if referent.as_composite().is_some_and(CompositeType::data_use_recorded) {
        return Err(SchemaError::shape(
            field.name(),
            format!(
                "cannot use type \"{}\" referenced by data element(s)",
                referent.name()
            ),
        ));
    }

    if field.has_presence() {
        if field.is_required() {
            check_required(field, referent)?;
        } else if field.is_optional() {
            check_optional(field, referent)?;
            if referent.as_basic().is_some_and(BasicType::is_fp_type) {
                field.record_extra_header("<cmath>");
                field.record_extra_header("<limits>");
            }
        } else {
            debug_assert!(field.is_constant());
            check_constant(field, referent, value_ref.as_deref(), db)?;
        }
    }

    let simple_alias = compute_simple_alias(field, referent, value_ref.as_deref());

    Ok(BasicField {
        type_ref,
        value_ref,
        simple_alias,
    })
}

fn compute_simple_alias(
    field: &FieldNode,
    referent: &TypeNode,
    value_ref: Option<&str>,
) -> bool {
    if !field.has_presence() || field.is_required() {
        return true;
    }

    if field.is_optional() && referent.is_optional() {
        return true;
    }

    field.is_constant() && referent.is_constant() && value_ref.is_none()
}

fn check_required(field: &FieldNode, referent: &TypeNode) -> Result<()> {
    if !referent.is_required() {
        return Err(SchemaError::presence(
            field.name(),
            format!(
                "required field references optional/constant type \"{}\"",
                referent.name()
            ),
        ));
    }
    Ok(())
}

fn check_optional(field: &FieldNode, referent: &TypeNode) -> Result<()> {
    if referent.is_constant() {
        return Err(SchemaError::presence(
            field.name(),
            format!(
                "optional field references constant type \"{}\"",
                referent.name()
            ),
        ));
    }

    if !referent.can_be_extended_as_optional() {
        return Err(SchemaError::presence(
            field.name(),
            format!(
                "type \"{}\" cannot be extended as optional",
                referent.name()
            ),
        ));
    }

    if !matches!(referent.kind(), TypeKind::Basic | TypeKind::Enum) {
        return Err(SchemaError::presence(
            field.name(),
            "optional field can reference only basic or enum type",
        ));
    }

    Ok(())
}

fn check_constant(
    field: &FieldNode,
    referent: &TypeNode,
    value_ref: Option<&str>,
    db: &Database,
) -> Result<()> {
    if referent.kind() == TypeKind::Composite {
        return Err(SchemaError::presence(
            field.name(),
            format!(
                "field references composite type \"{}\", it cannot have constant presence",
                referent.name()
            ),
        ));
    }

    if referent.is_constant() {
        if value_ref.is_some() {
            return Err(SchemaError::presence(
                field.name(),
                "constant field references constant type while providing valueRef",
            ));
        }
        return Ok(());
    }

    if referent.is_optional() {
        return Err(SchemaError::presence(
            field.name(),
            "referencing optional type in a constant field is not supported",
        ));
    }

    let Some(value_ref) = value_ref else {
        return Err(SchemaError::presence(
            field.name(),
            "constant field must specify valueRef property",
        ));
    };

    let Some((enum_name, value_name)) = split_value_ref(value_ref) else {
        return Err(SchemaError::structure(format!(
            "failed to split valueRef of \"{}\" into <type.value> pair",
            field.name()
        )));
    };

    let enum_type = db
        .find_type(enum_name)
        .ok_or_else(|| SchemaError::unknown_type(enum_name, field.name()))?;
    let Some(e) = enum_type.as_enum() else {
        return Err(SchemaError::shape(
            field.name(),
            "valueRef property of a constant field must specify an enum type",
        ));
    };

    if !e.has_value(value_name) {
        return Err(SchemaError::unknown_type(
            value_ref,
            field.name(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::types::TypeNode;
    use crate::xml::parse_document;

    fn db_with_types(xmls: &[&str]) -> Database {
        let mut db = Database::for_tests(&Config::default(), 5);
        for xml in xmls {
            let node = parse_document(xml).unwrap();
            db.insert_type_for_tests(TypeNode::create(&node).unwrap());
        }
        db.parse_recorded_types_for_tests().unwrap();
        db
    }

    fn parse_field(db: &mut Database, xml: &str) -> Result<FieldNode> {
        let node = parse_document(xml).unwrap();
        let mut field = FieldNode::create(&node, "Msg")?;
        field.parse(db)?;
        Ok(field)
    }

    #[test]
    fn test_declared_type_resolution() {
        let mut db = db_with_types(&[r#"<type name="Qty" primitiveType="uint32"/>"#]);
        let field = parse_field(&mut db, r#"<field name="qty" type="Qty"/>"#).unwrap();

        let b = field.as_basic_field().unwrap();
        assert_eq!(b.type_ref(), &TypeRef::Declared("Qty".to_string()));
        assert!(b.is_simple_alias());
        assert_eq!(field.serialization_length(&db), 4);
        assert_eq!(b.lowering(&field, &db), FieldLowering::SimpleAlias);
        assert!(db.find_type("Qty").unwrap().normal_use_recorded());
    }

    #[test]
    fn test_builtin_auto_creation() {
        let mut db = db_with_types(&[]);
        let field = parse_field(&mut db, r#"<field name="qty" type="uint16"/>"#).unwrap();

        let b = field.as_basic_field().unwrap();
        assert_eq!(b.type_ref(), &TypeRef::Builtin("uint16".to_string()));
        assert!(db.find_builtin_type("uint16").is_some());
        assert_eq!(field.serialization_length(&db), 2);
    }

    #[test]
    fn test_unknown_type_rejected() {
        let mut db = db_with_types(&[]);
        assert!(matches!(
            parse_field(&mut db, r#"<field name="qty" type="Mystery"/>"#),
            Err(SchemaError::UnknownType { .. })
        ));
    }

    #[test]
    fn test_missing_type_rejected() {
        let mut db = db_with_types(&[]);
        assert!(matches!(
            parse_field(&mut db, r#"<field name="qty"/>"#),
            Err(SchemaError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_required_field_needs_required_type() {
        let mut db = db_with_types(&[
            r#"<type name="OptQty" primitiveType="uint32" presence="optional"/>"#,
        ]);
        assert!(matches!(
            parse_field(
                &mut db,
                r#"<field name="qty" type="OptQty" presence="required"/>"#
            ),
            Err(SchemaError::Presence { .. })
        ));
    }

    #[test]
    fn test_optional_over_required_int_synthesizes_null() {
        let mut db = db_with_types(&[r#"<type name="Qty" primitiveType="int16"/>"#]);
        let field =
            parse_field(&mut db, r#"<field name="qty" type="Qty" presence="optional"/>"#).unwrap();

        let b = field.as_basic_field().unwrap();
        assert!(!b.is_simple_alias());
        assert_eq!(
            b.lowering(&field, &db),
            FieldLowering::OptionalInt {
                null: i64::from(i16::MIN)
            }
        );
    }

    #[test]
    fn test_optional_over_optional_is_alias() {
        let mut db = db_with_types(&[
            r#"<type name="Qty" primitiveType="int16" presence="optional"/>"#,
        ]);
        let field =
            parse_field(&mut db, r#"<field name="qty" type="Qty" presence="optional"/>"#).unwrap();
        assert!(field.as_basic_field().unwrap().is_simple_alias());
    }

    #[test]
    fn test_optional_uint64_uses_big_null() {
        let mut db = db_with_types(&[r#"<type name="Big" primitiveType="uint64"/>"#]);
        let field =
            parse_field(&mut db, r#"<field name="b" type="Big" presence="optional"/>"#).unwrap();
        assert_eq!(
            field.as_basic_field().unwrap().lowering(&field, &db),
            FieldLowering::OptionalBigUint { null: u64::MAX }
        );
    }

    #[test]
    fn test_optional_float_and_extra_headers() {
        let mut db = db_with_types(&[r#"<type name="Px" primitiveType="double"/>"#]);
        let field =
            parse_field(&mut db, r#"<field name="px" type="Px" presence="optional"/>"#).unwrap();
        assert_eq!(
            field.as_basic_field().unwrap().lowering(&field, &db),
            FieldLowering::OptionalFloat
        );
        assert!(field.extra_headers().contains("<cmath>"));
        assert!(field.extra_headers().contains("<limits>"));
    }

    #[test]
    fn test_optional_enum_null() {
        let mut db = db_with_types(&[
            r#"<enum name="Side" encodingType="uint8">
                 <validValue name="Buy">1</validValue>
               </enum>"#,
        ]);
        let field =
            parse_field(&mut db, r#"<field name="side" type="Side" presence="optional"/>"#)
                .unwrap();
        assert_eq!(
            field.as_basic_field().unwrap().lowering(&field, &db),
            FieldLowering::OptionalEnum { null: 255 }
        );
    }

    #[test]
    fn test_optional_rejects_composite() {
        let mut db = db_with_types(&[
            r#"<composite name="Decimal">
                 <type name="mantissa" primitiveType="int64"/>
                 <type name="exponent" primitiveType="int8"/>
               </composite>"#,
        ]);
        assert!(parse_field(
            &mut db,
            r#"<field name="px" type="Decimal" presence="optional"/>"#
        )
        .is_err());
    }

    #[test]
    fn test_constant_value_ref() {
        let mut db = db_with_types(&[
            r#"<enum name="Color" encodingType="uint8">
                 <validValue name="RED">1</validValue>
                 <validValue name="BLUE">2</validValue>
               </enum>"#,
        ]);
        let field = parse_field(
            &mut db,
            r#"<field name="color" presence="constant" valueRef="Color.RED"/>"#,
        )
        .unwrap();

        let b = field.as_basic_field().unwrap();
        assert_eq!(b.type_ref().name(), "Color");
        assert!(!b.is_simple_alias());
        assert_eq!(field.serialization_length(&db), 0);
        assert_eq!(
            b.lowering(&field, &db),
            FieldLowering::ConstantValueRef {
                enum_name: "Color".to_string(),
                value_name: "RED".to_string(),
                value: 1
            }
        );
    }

    #[test]
    fn test_constant_value_ref_bad_value() {
        let mut db = db_with_types(&[
            r#"<enum name="Color" encodingType="uint8">
                 <validValue name="RED">1</validValue>
               </enum>"#,
        ]);
        assert!(parse_field(
            &mut db,
            r#"<field name="color" type="Color" presence="constant" valueRef="Color.GREEN"/>"#
        )
        .is_err());
    }

    #[test]
    fn test_constant_value_ref_malformed() {
        let mut db = db_with_types(&[]);
        assert!(parse_field(
            &mut db,
            r#"<field name="color" presence="constant" valueRef="ColorRED"/>"#
        )
        .is_err());
        assert!(parse_field(
            &mut db,
            r#"<field name="color" presence="constant" valueRef=".RED"/>"#
        )
        .is_err());
    }

    #[test]
    fn test_var_length_referent_rejected() {
        let mut db = db_with_types(&[
            r#"<type name="Blob" primitiveType="uint8" length="0"/>"#,
        ]);
        assert!(parse_field(&mut db, r#"<field name="b" type="Blob"/>"#).is_err());
    }
}
