//! Typed property accessors.
//!
//! Thin typed lookups over an element's attribute dictionary. String
//! accessors default to an empty value when the attribute is absent; numeric
//! accessors carry the defaults the wire format implies (`sinceVersion` 0,
//! `deprecated` unbounded, `length` 1, `offset` 0) and fail on
//! present-but-malformed values.

use xmltree::Element;

use crate::error::{Result, SchemaError};
use crate::xml::ElementExt;

fn str_prop<'a>(e: &'a Element, name: &str) -> &'a str {
    e.attr(name).unwrap_or_default()
}

fn opt_prop(e: &Element, name: &str) -> Option<String> {
    e.attr(name).map(str::to_string)
}

fn uint_prop(e: &Element, name: &str, default: u64) -> Result<u64> {
    match e.attr(name) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| SchemaError::invalid_attr(e.name.clone(), name, v)),
    }
}

/// Returns the `name` attribute, empty when absent.
#[must_use]
pub fn name(e: &Element) -> &str {
    str_prop(e, "name")
}

/// Returns the `type` attribute, empty when absent.
#[must_use]
pub fn type_name(e: &Element) -> &str {
    str_prop(e, "type")
}

/// Returns the `description` attribute.
#[must_use]
pub fn description(e: &Element) -> Option<String> {
    opt_prop(e, "description")
}

/// Returns the raw `presence` attribute, empty when absent.
#[must_use]
pub fn presence(e: &Element) -> &str {
    str_prop(e, "presence")
}

/// Returns true when a `presence` attribute is present.
#[must_use]
pub fn has_presence(e: &Element) -> bool {
    e.attr("presence").is_some()
}

/// Returns true for `presence="required"` or no presence at all.
#[must_use]
pub fn is_required(e: &Element) -> bool {
    let p = presence(e);
    p.is_empty() || p == "required"
}

/// Returns true for `presence="optional"`.
#[must_use]
pub fn is_optional(e: &Element) -> bool {
    presence(e) == "optional"
}

/// Returns true for `presence="constant"`.
#[must_use]
pub fn is_constant(e: &Element) -> bool {
    presence(e) == "constant"
}

/// Returns the `sinceVersion` attribute, 0 when absent.
pub fn since_version(e: &Element) -> Result<u32> {
    Ok(uint_prop(e, "sinceVersion", 0)? as u32)
}

/// Returns the `deprecated` attribute, unbounded when absent.
pub fn deprecated(e: &Element) -> Result<u32> {
    Ok(uint_prop(e, "deprecated", u64::from(u32::MAX))? as u32)
}

/// Returns the `version` attribute, 0 when absent.
pub fn version(e: &Element) -> Result<u32> {
    Ok(uint_prop(e, "version", 0)? as u32)
}

/// Returns the `id` attribute, 0 when absent.
pub fn id(e: &Element) -> Result<u32> {
    Ok(uint_prop(e, "id", 0)? as u32)
}

/// Returns the `length` attribute, 1 when absent.
pub fn length(e: &Element) -> Result<usize> {
    Ok(uint_prop(e, "length", 1)? as usize)
}

/// Returns the `offset` attribute, 0 when absent.
pub fn offset(e: &Element) -> Result<usize> {
    Ok(uint_prop(e, "offset", 0)? as usize)
}

/// Returns the `blockLength` attribute, 0 when absent.
pub fn block_length(e: &Element) -> Result<usize> {
    Ok(uint_prop(e, "blockLength", 0)? as usize)
}

/// Returns the `primitiveType` attribute, empty when absent.
#[must_use]
pub fn primitive_type(e: &Element) -> &str {
    str_prop(e, "primitiveType")
}

/// Returns the `semanticType` attribute, empty when absent.
#[must_use]
pub fn semantic_type(e: &Element) -> &str {
    str_prop(e, "semanticType")
}

/// Returns the `characterEncoding` attribute, empty when absent.
#[must_use]
pub fn character_encoding(e: &Element) -> &str {
    str_prop(e, "characterEncoding")
}

/// Returns the `encodingType` attribute, empty when absent.
#[must_use]
pub fn encoding_type(e: &Element) -> &str {
    str_prop(e, "encodingType")
}

/// Returns the `minValue` attribute.
#[must_use]
pub fn min_value(e: &Element) -> Option<&str> {
    e.attr("minValue")
}

/// Returns the `maxValue` attribute.
#[must_use]
pub fn max_value(e: &Element) -> Option<&str> {
    e.attr("maxValue")
}

/// Returns the `nullValue` attribute, empty when absent.
#[must_use]
pub fn null_value(e: &Element) -> &str {
    str_prop(e, "nullValue")
}

/// Returns the `valueRef` attribute, empty when absent.
#[must_use]
pub fn value_ref(e: &Element) -> &str {
    str_prop(e, "valueRef")
}

/// Returns the `dimensionType` attribute, empty when absent.
#[must_use]
pub fn dimension_type(e: &Element) -> &str {
    str_prop(e, "dimensionType")
}

/// Returns the `byteOrder` attribute, empty when absent.
#[must_use]
pub fn byte_order(e: &Element) -> &str {
    str_prop(e, "byteOrder")
}

/// Returns the `headerType` attribute, `messageHeader` when absent.
#[must_use]
pub fn header_type(e: &Element) -> &str {
    e.attr("headerType").unwrap_or("messageHeader")
}

/// Returns the `package` attribute, empty when absent.
#[must_use]
pub fn package(e: &Element) -> &str {
    str_prop(e, "package")
}

/// Returns the `semanticVersion` attribute.
#[must_use]
pub fn semantic_version(e: &Element) -> Option<String> {
    opt_prop(e, "semanticVersion")
}
