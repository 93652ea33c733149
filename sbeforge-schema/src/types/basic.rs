//! Basic (primitive-backed) type parsing and lowering.

use xmltree::Element;

use super::{ParsedKind, Presence};
use crate::common::{self, Primitive};
use crate::error::{Result, SchemaError};
use crate::props;
use crate::xml::ElementExt;

/// Payload of a parsed basic type.
#[derive(Debug, Clone)]
pub struct BasicType {
    /// Underlying primitive.
    pub primitive: Primitive,
    /// Declared element count: 1 scalar, 0 variable, >1 fixed sequence.
    pub count: usize,
    /// Constant literal from the element text.
    pub constant_text: Option<String>,
    /// Lowered field form.
    pub lowering: BasicLowering,
}

impl BasicType {
    /// Returns true for integer primitives, `char` included.
    #[must_use]
    pub fn is_int_type(&self) -> bool {
        self.primitive.is_int()
    }

    /// Returns true for floating point primitives.
    #[must_use]
    pub fn is_fp_type(&self) -> bool {
        self.primitive.is_float()
    }

    /// Returns true when the type lowers to a string field.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self.lowering, BasicLowering::String(_))
    }

    /// Returns the builtin null encoding of the underlying primitive.
    #[must_use]
    pub fn default_int_null(&self) -> i64 {
        common::builtin_int_null(self.primitive)
    }

    pub(crate) fn can_be_extended_as_optional(&self) -> bool {
        self.count == 1 && self.constant_text.is_none()
    }
}

/// Lowered form of a basic type in the target field algebra.
#[derive(Debug, Clone, PartialEq)]
pub enum BasicLowering {
    /// Bounded integer field.
    Int(IntLowering),
    /// Bounded `uint64` field, outside the signed 64-bit domain.
    BigUint(BigUintLowering),
    /// Floating point field.
    Float(FloatLowering),
    /// String field, variable or fixed or constant.
    String(StringLowering),
    /// Raw-data or element-list field, variable or fixed.
    Array(ArrayLowering),
}

/// Bounded integer lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntLowering {
    /// Minimum valid value.
    pub min: i64,
    /// Maximum valid value.
    pub max: i64,
    /// Reserved null encoding, also a valid value, for optional types.
    pub null: Option<i64>,
    /// Constant value; serialization is empty when set.
    pub constant: Option<i64>,
}

/// `uint64` lowering on the big-unsigned path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigUintLowering {
    /// Minimum valid value.
    pub min: u64,
    /// Maximum valid value.
    pub max: u64,
    /// Reserved null encoding for optional types.
    pub null: Option<u64>,
    /// Constant value; serialization is empty when set.
    pub constant: Option<u64>,
}

/// Floating point lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatLowering {
    /// Optional form defaults to NaN with NaN-null semantics.
    pub nan_null: bool,
    /// Constant literal, compared with epsilon tolerance.
    pub constant: Option<String>,
}

/// String lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringLowering {
    /// Fixed sequence size, `None` for variable length.
    pub fixed_length: Option<usize>,
    /// Constant text pre-populating the sequence; serialization is empty.
    pub constant: Option<String>,
}

/// Raw-data / element-list lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayLowering {
    /// Fixed sequence size, `None` for variable length.
    pub fixed_length: Option<usize>,
    /// True for single-byte raw data, false for an element list.
    pub raw: bool,
}

fn is_raw_data(primitive: Primitive, presence: Presence) -> bool {
    if presence == Presence::Optional {
        return false;
    }

    matches!(
        primitive,
        Primitive::Char | Primitive::Int8 | Primitive::Uint8
    )
}

fn is_string(node: &Element, primitive: Primitive, presence: Presence) -> bool {
    if !is_raw_data(primitive, presence) {
        return false;
    }

    if props::semantic_type(node).eq_ignore_ascii_case("string") {
        return true;
    }

    if !props::character_encoding(node).is_empty() {
        return true;
    }

    primitive == Primitive::Char
}

pub(super) fn parse(
    node: &Element,
    name: &str,
    presence: Presence,
) -> Result<ParsedKind<BasicType>> {
    let prim_name = props::primitive_type(node);
    if prim_name.is_empty() {
        return Err(SchemaError::missing_attr(node.name.clone(), "primitiveType"));
    }
    let primitive = Primitive::from_name(prim_name)
        .ok_or_else(|| SchemaError::invalid_attr(node.name.clone(), "primitiveType", prim_name))?;

    let count = props::length(node)?;
    let constant = presence == Presence::Constant;
    let optional = presence == Presence::Optional;

    let mut constant_text = None;
    if constant {
        let text = node.text_content();
        if text.is_empty() {
            return Err(SchemaError::structure(format!(
                "no constant value provided for type \"{name}\""
            )));
        }
        if count != 1 {
            return Err(SchemaError::presence(
                name,
                "constant type cannot have a non-default length property",
            ));
        }
        constant_text = Some(text);
    }

    if optional && count != 1 {
        return Err(SchemaError::presence(
            name,
            "only single-length types can be optional",
        ));
    }

    let string = is_string(node, primitive, presence);
    let raw = is_raw_data(primitive, presence);
    let const_string = constant && string;

    let lowering = if count == 1 && !const_string {
        if primitive.is_int() {
            lower_int(node, name, primitive, presence)?
        } else {
            lower_float(presence, constant_text.clone())
        }
    } else if const_string {
        BasicLowering::String(StringLowering {
            fixed_length: None,
            constant: constant_text.clone(),
        })
    } else if string {
        BasicLowering::String(StringLowering {
            fixed_length: (count > 1).then_some(count),
            constant: None,
        })
    } else {
        BasicLowering::Array(ArrayLowering {
            fixed_length: (count > 1).then_some(count),
            raw,
        })
    };

    let mut includes = Vec::new();
    let list = count != 1;
    if (list && string) || const_string {
        includes.push("\"comms/field/String.h\"".to_string());
    } else {
        if list {
            includes.push("\"comms/field/ArrayList.h\"".to_string());
        }
        if primitive.is_int() {
            includes.push("<cstdint>".to_string());
            if !list || !raw {
                includes.push("\"comms/field/IntValue.h\"".to_string());
            }
        } else {
            includes.push("<limits>".to_string());
            includes.push("<cmath>".to_string());
            includes.push("\"comms/field/FloatValue.h\"".to_string());
        }
    }

    let length = if constant { 0 } else { primitive.size() * count };

    let payload = BasicType {
        primitive,
        count,
        constant_text,
        lowering,
    };

    Ok(ParsedKind::new(payload, length, count != 0).with_includes(includes))
}

fn lower_int(
    node: &Element,
    name: &str,
    primitive: Primitive,
    presence: Presence,
) -> Result<BasicLowering> {
    let min_ctx = format!("minValue of \"{name}\"");
    let max_ctx = format!("maxValue of \"{name}\"");
    let min = common::int_min_value(primitive, props::min_value(node), &min_ctx)?;
    let max = common::int_max_value(primitive, props::max_value(node), &max_ctx)?;

    if primitive == Primitive::Uint64 && (min.is_none() || max.is_none()) {
        return lower_big_uint(node, name, presence, min, max);
    }

    let (Some(mut min), Some(mut max)) = (min, max) else {
        // Non-uint64 primitives always resolve from the default tables.
        return Err(SchemaError::structure(format!(
            "failed to resolve min/max values for type \"{name}\""
        )));
    };

    if max < min {
        return Err(SchemaError::structure(format!(
            "min/max values range error for type \"{name}\""
        )));
    }

    let mut null = None;
    let mut constant = None;
    match presence {
        Presence::Required => {}
        Presence::Constant => {
            let text = node.text_content();
            let value = common::parse_i64(&text, &format!("constant value of \"{name}\""))?;
            min = value;
            max = value;
            constant = Some(value);
        }
        Presence::Optional => {
            let null_str = props::null_value(node);
            let value = if null_str.is_empty() {
                common::builtin_int_null(primitive)
            } else if primitive == Primitive::Char && null_str.len() == 1 {
                i64::from(null_str.as_bytes()[0])
            } else {
                common::parse_i64(null_str, &format!("nullValue of \"{name}\""))?
            };
            null = Some(value);
        }
    }

    Ok(BasicLowering::Int(IntLowering {
        min,
        max,
        null,
        constant,
    }))
}

fn lower_big_uint(
    node: &Element,
    name: &str,
    presence: Presence,
    signed_min: Option<i64>,
    signed_max: Option<i64>,
) -> Result<BasicLowering> {
    let mut min = match signed_min {
        Some(v) => v as u64,
        None => common::parse_u64(
            props::min_value(node).unwrap_or_default(),
            &format!("minValue of \"{name}\""),
        )?,
    };
    let mut max = match signed_max {
        Some(v) => v as u64,
        None => common::big_unsigned_value(
            props::max_value(node),
            &format!("maxValue of \"{name}\""),
        )?,
    };

    if max < min {
        return Err(SchemaError::structure(format!(
            "min/max values range error for type \"{name}\""
        )));
    }

    let mut null = None;
    let mut constant = None;
    match presence {
        Presence::Required => {}
        Presence::Constant => {
            let text = node.text_content();
            let value = common::parse_u64(&text, &format!("constant value of \"{name}\""))?;
            min = value;
            max = value;
            constant = Some(value);
        }
        Presence::Optional => {
            let null_str = props::null_value(node);
            let value = if null_str.is_empty() {
                common::default_big_unsigned_null()
            } else {
                common::parse_u64(null_str, &format!("nullValue of \"{name}\""))?
            };
            null = Some(value);
        }
    }

    Ok(BasicLowering::BigUint(BigUintLowering {
        min,
        max,
        null,
        constant,
    }))
}

fn lower_float(presence: Presence, constant_text: Option<String>) -> BasicLowering {
    BasicLowering::Float(FloatLowering {
        nan_null: presence == Presence::Optional,
        constant: constant_text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_document;

    fn parse_basic(xml: &str) -> Result<ParsedKind<BasicType>> {
        let node = parse_document(xml).unwrap();
        let presence = Presence::from_token(props::presence(&node)).unwrap();
        parse(&node, props::name(&node), presence)
    }

    #[test]
    fn test_simple_int_defaults() {
        let parsed = parse_basic(r#"<type name="Qty" primitiveType="int16"/>"#).unwrap();
        assert_eq!(parsed.length, 2);
        assert!(parsed.fixed_length);

        let BasicLowering::Int(int) = &parsed.payload.lowering else {
            panic!("expected int lowering");
        };
        assert_eq!(int.min, i64::from(i16::MIN) + 1);
        assert_eq!(int.max, i64::from(i16::MAX));
        assert_eq!(int.null, None);
    }

    #[test]
    fn test_optional_int_reserves_null() {
        let parsed =
            parse_basic(r#"<type name="Qty" primitiveType="int16" presence="optional"/>"#)
                .unwrap();
        let BasicLowering::Int(int) = &parsed.payload.lowering else {
            panic!("expected int lowering");
        };
        assert_eq!(int.null, Some(i64::from(i16::MIN)));
        assert_eq!(int.min, i64::from(i16::MIN) + 1);
        assert_eq!(int.max, i64::from(i16::MAX));
    }

    #[test]
    fn test_optional_char_null() {
        let parsed =
            parse_basic(r#"<type name="C" primitiveType="char" presence="optional" nullValue="A"/>"#)
                .unwrap();
        let BasicLowering::Int(int) = &parsed.payload.lowering else {
            panic!("expected int lowering");
        };
        assert_eq!(int.null, Some(65));
        assert_eq!(int.min, 0x20);
        assert_eq!(int.max, 0x7e);
    }

    #[test]
    fn test_uint64_big_unsigned_path() {
        let parsed = parse_basic(r#"<type name="U" primitiveType="uint64"/>"#).unwrap();
        let BasicLowering::BigUint(big) = &parsed.payload.lowering else {
            panic!("expected big unsigned lowering");
        };
        assert_eq!(big.min, 0);
        assert_eq!(big.max, u64::MAX - 1);

        let parsed =
            parse_basic(r#"<type name="U" primitiveType="uint64" presence="optional"/>"#).unwrap();
        let BasicLowering::BigUint(big) = &parsed.payload.lowering else {
            panic!("expected big unsigned lowering");
        };
        assert_eq!(big.null, Some(u64::MAX));
    }

    #[test]
    fn test_uint64_small_bounds_stay_signed() {
        let parsed =
            parse_basic(r#"<type name="U" primitiveType="uint64" minValue="1" maxValue="10"/>"#)
                .unwrap();
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::Int(IntLowering { min: 1, max: 10, .. })
        ));
    }

    #[test]
    fn test_constant_int() {
        let parsed =
            parse_basic(r#"<type name="One" primitiveType="uint8" presence="constant">1</type>"#)
                .unwrap();
        assert_eq!(parsed.length, 0);
        let BasicLowering::Int(int) = &parsed.payload.lowering else {
            panic!("expected int lowering");
        };
        assert_eq!(int.constant, Some(1));
        assert_eq!(int.min, 1);
        assert_eq!(int.max, 1);
    }

    #[test]
    fn test_constant_requires_text() {
        assert!(
            parse_basic(r#"<type name="One" primitiveType="uint8" presence="constant"/>"#).is_err()
        );
    }

    #[test]
    fn test_constant_rejects_length() {
        assert!(parse_basic(
            r#"<type name="One" primitiveType="uint8" length="4" presence="constant">1</type>"#
        )
        .is_err());
    }

    #[test]
    fn test_float_forms() {
        let parsed = parse_basic(r#"<type name="Px" primitiveType="double"/>"#).unwrap();
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::Float(FloatLowering {
                nan_null: false,
                constant: None
            })
        ));
        assert_eq!(parsed.length, 8);

        let parsed =
            parse_basic(r#"<type name="Px" primitiveType="float" presence="optional"/>"#).unwrap();
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::Float(FloatLowering { nan_null: true, .. })
        ));
    }

    #[test]
    fn test_var_length_string() {
        let parsed =
            parse_basic(r#"<type name="Sym" primitiveType="char" length="0"/>"#).unwrap();
        assert_eq!(parsed.length, 0);
        assert!(!parsed.fixed_length);
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::String(StringLowering {
                fixed_length: None,
                constant: None
            })
        ));
    }

    #[test]
    fn test_fixed_length_string() {
        let parsed =
            parse_basic(r#"<type name="Sym" primitiveType="char" length="8"/>"#).unwrap();
        assert_eq!(parsed.length, 8);
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::String(StringLowering {
                fixed_length: Some(8),
                ..
            })
        ));
    }

    #[test]
    fn test_var_length_raw_data() {
        let parsed =
            parse_basic(r#"<type name="Blob" primitiveType="uint8" length="0"/>"#).unwrap();
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::Array(ArrayLowering {
                fixed_length: None,
                raw: true
            })
        ));
    }

    #[test]
    fn test_semantic_type_makes_string() {
        let parsed = parse_basic(
            r#"<type name="Sym" primitiveType="uint8" length="0" semanticType="String"/>"#,
        )
        .unwrap();
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::String(_)
        ));
    }

    #[test]
    fn test_fixed_element_list() {
        let parsed =
            parse_basic(r#"<type name="Prices" primitiveType="int32" length="4"/>"#).unwrap();
        assert_eq!(parsed.length, 16);
        assert!(matches!(
            parsed.payload.lowering,
            BasicLowering::Array(ArrayLowering {
                fixed_length: Some(4),
                raw: false
            })
        ));
    }

    #[test]
    fn test_optional_var_length_rejected() {
        assert!(parse_basic(
            r#"<type name="Sym" primitiveType="char" length="0" presence="optional"/>"#
        )
        .is_err());
    }

    #[test]
    fn test_const_string() {
        let parsed = parse_basic(
            r#"<type name="Ver" primitiveType="char" presence="constant">1.0</type>"#,
        )
        .unwrap();
        assert_eq!(parsed.length, 0);
        let BasicLowering::String(s) = &parsed.payload.lowering else {
            panic!("expected string lowering");
        };
        assert_eq!(s.constant.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_includes() {
        let parsed = parse_basic(r#"<type name="Qty" primitiveType="int32"/>"#).unwrap();
        assert!(parsed.includes.contains(&"<cstdint>".to_string()));
        assert!(parsed
            .includes
            .contains(&"\"comms/field/IntValue.h\"".to_string()));

        let parsed = parse_basic(r#"<type name="Px" primitiveType="double"/>"#).unwrap();
        assert!(parsed.includes.contains(&"<cmath>".to_string()));
    }

    #[test]
    fn test_bad_min_value() {
        assert!(
            parse_basic(r#"<type name="Qty" primitiveType="int32" minValue="abc"/>"#).is_err()
        );
    }

    #[test]
    fn test_min_max_range_error() {
        assert!(parse_basic(
            r#"<type name="Qty" primitiveType="int32" minValue="10" maxValue="5"/>"#
        )
        .is_err());
    }
}
