//! Enum type parsing.

use std::collections::{BTreeMap, HashSet};

use xmltree::Element;

use super::{ParsedKind, Presence, TypeKind};
use crate::common::{self, Primitive};
use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::props;
use crate::xml::ElementExt;

const MAX_RANGES_COUNT: usize = 10;

/// Payload of a parsed enum type.
#[derive(Debug, Clone)]
pub struct EnumType {
    /// Underlying integer primitive.
    pub underlying: Primitive,
    /// Numeric value to name, in ascending value order.
    pub values: BTreeMap<i64, String>,
    /// Value descriptions, keyed by value name.
    pub descriptions: BTreeMap<String, String>,
    /// True for the enum synthesized from message ids.
    pub msg_id: bool,
}

impl EnumType {
    /// Returns true when a value with the given name exists.
    #[must_use]
    pub fn has_value(&self, name: &str) -> bool {
        self.values.values().any(|v| v == name)
    }

    /// Returns the numeric encoding of a named value.
    #[must_use]
    pub fn numeric_value(&self, name: &str) -> Option<i64> {
        self.values
            .iter()
            .find(|(_, v)| *v == name)
            .map(|(k, _)| *k)
    }

    /// Returns the default null encoding of the underlying primitive.
    #[must_use]
    pub fn default_null_value(&self) -> i64 {
        common::builtin_int_null(self.underlying)
    }

    /// Coalesces the declared values into contiguous valid ranges, in
    /// ascending order.
    #[must_use]
    pub fn valid_ranges(&self) -> Vec<(i64, i64)> {
        let mut result: Vec<(i64, i64)> = Vec::new();
        for &value in self.values.keys() {
            if let Some(last) = result.last_mut() {
                if value == last.1 + 1 {
                    last.1 = value;
                    continue;
                }
            }
            result.push((value, value));
        }
        result
    }
}

/// Resolves the underlying primitive and width of an `encodingType`, which
/// is either a declared basic type or a builtin primitive name.
pub(super) fn parse_encoding(
    node: &Element,
    name: &str,
    kind: &str,
    db: &mut Database,
) -> Result<(Primitive, usize)> {
    let enc = props::encoding_type(node);
    if enc.is_empty() {
        return Err(SchemaError::missing_attr(node.name.clone(), "encodingType"));
    }

    if db.type_parse_in_progress(enc) {
        return Err(SchemaError::RecursiveDependency {
            name: enc.to_string(),
        });
    }

    if db.find_type(enc).is_some() {
        db.ensure_type_parsed(enc)?;
        let ty = db.find_type(enc).expect("declared type present");
        if ty.kind() != TypeKind::Basic {
            return Err(SchemaError::shape(
                name,
                format!("only basic type can be used as encodingType for {kind}"),
            ));
        }
        let basic = ty.as_basic().expect("basic payload");
        return Ok((basic.primitive, ty.serialization_length()));
    }

    let Some(primitive) = Primitive::from_name(enc) else {
        return Err(SchemaError::unknown_type(enc, name));
    };
    Ok((primitive, primitive.size()))
}

pub(super) fn parse(
    node: &Element,
    name: &str,
    presence: Presence,
    db: &mut Database,
) -> Result<ParsedKind<EnumType>> {
    if presence == Presence::Constant {
        return Err(SchemaError::presence(
            name,
            "constant enum types are not supported",
        ));
    }

    let optional = presence == Presence::Optional;
    if optional && props::null_value(node).is_empty() {
        return Err(SchemaError::presence(
            name,
            "optional enum doesn't specify nullValue",
        ));
    }

    let (underlying, enc_len) = parse_encoding(node, name, "enum", db)?;
    if underlying == Primitive::Uint64 {
        return Err(SchemaError::shape(
            name,
            "support for uint64 as underlying enum type is not implemented",
        ));
    }

    let is_char = underlying == Primitive::Char;
    let mut values: BTreeMap<i64, String> = BTreeMap::new();
    let mut descriptions = BTreeMap::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    if node.children_named("validValue").next().is_none() {
        return Err(SchemaError::structure(format!(
            "no validValue has been specified for enum \"{name}\""
        )));
    }

    for v in node.children_named("validValue") {
        let v_name = props::name(v);
        if v_name.is_empty() {
            return Err(SchemaError::missing_attr("validValue", "name"));
        }

        if seen_names.contains(v_name) {
            return Err(SchemaError::duplicate(
                format!("validValue of enum \"{name}\""),
                v_name,
            ));
        }

        let text = v.text_content();
        if text.is_empty() {
            return Err(SchemaError::structure(format!(
                "the validValue \"{v_name}\" of enum \"{name}\" doesn't specify the numeric value"
            )));
        }

        if !db.does_element_exist(props::since_version(v)?) {
            continue;
        }

        let num = if is_char {
            if text.len() != 1 {
                return Err(SchemaError::structure(format!(
                    "only single character values are supported for char enum \"{name}\""
                )));
            }
            i64::from(text.as_bytes()[0] as i8)
        } else {
            common::parse_i64(&text, &format!("validValue \"{v_name}\" of enum \"{name}\""))?
        };

        if let Some(taken_by) = values.get(&num) {
            return Err(SchemaError::DuplicateEnumValue {
                name: name.to_string(),
                value: num,
                taken_by: taken_by.clone(),
            });
        }

        values.insert(num, v_name.to_string());
        seen_names.insert(v_name.to_string());
        if let Some(desc) = props::description(v) {
            descriptions.insert(v_name.to_string(), desc);
        }
    }

    if optional {
        if seen_names.contains(common::ENUM_NULL_VALUE) {
            return Err(SchemaError::duplicate(
                format!("validValue of enum \"{name}\""),
                common::ENUM_NULL_VALUE,
            ));
        }

        let null_str = props::null_value(node);
        let null = if is_char {
            if null_str.len() != 1 {
                return Err(SchemaError::structure(format!(
                    "only single character nullValue is supported for char enum \"{name}\""
                )));
            }
            i64::from(null_str.as_bytes()[0] as i8)
        } else {
            common::parse_i64(null_str, &format!("nullValue of enum \"{name}\""))?
        };

        values.insert(null, common::ENUM_NULL_VALUE.to_string());
        descriptions.insert(
            common::ENUM_NULL_VALUE.to_string(),
            "NULL value of optional field.".to_string(),
        );
    }

    if values.is_empty() {
        return Err(SchemaError::structure(format!(
            "no active validValue remains for enum \"{name}\""
        )));
    }

    if props::length(node)? != 1 {
        tracing::warn!("ignoring \"length\" property of \"{name}\" type");
    }

    let payload = EnumType {
        underlying,
        values,
        descriptions,
        msg_id: false,
    };

    let mut includes = vec!["\"comms/field/EnumValue.h\"".to_string()];
    if MAX_RANGES_COUNT < payload.valid_ranges().len() {
        includes.push("<algorithm>".to_string());
    }

    Ok(ParsedKind::new(payload, enc_len, true).with_includes(includes))
}
