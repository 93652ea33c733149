//! Set (bitmask) type parsing.

use std::collections::{BTreeMap, HashSet};

use xmltree::Element;

use super::enumeration::parse_encoding;
use super::{ParsedKind, Presence};
use crate::common;
use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::props;
use crate::xml::ElementExt;

/// Payload of a parsed set type.
#[derive(Debug, Clone)]
pub struct SetType {
    /// Serialized width in bytes, at most 8.
    pub width: usize,
    /// Declared bit index to choice name, in ascending bit order.
    pub bits: BTreeMap<u32, String>,
}

impl SetType {
    /// Mask covering the full serialized width.
    #[must_use]
    pub fn width_mask(&self) -> u64 {
        if self.width >= 8 {
            u64::MAX
        } else {
            (1u64 << (self.width * 8)) - 1
        }
    }

    /// Mask of the reserved bits: the complement of the declared bits
    /// within the serialized width.
    #[must_use]
    pub fn reserved_mask(&self) -> u64 {
        let mut mask = self.width_mask();
        for &bit in self.bits.keys() {
            mask &= !(1u64 << bit);
        }
        mask
    }

    /// Returns true when the declared bits form a contiguous low prefix,
    /// allowing the compact sequential emission.
    #[must_use]
    pub fn is_sequential(&self) -> bool {
        let declared = self.width_mask() & !self.reserved_mask();
        (declared + 1) & declared == 0
    }
}

pub(super) fn parse(
    node: &Element,
    name: &str,
    presence: Presence,
    db: &mut Database,
) -> Result<ParsedKind<SetType>> {
    if presence != Presence::Required {
        return Err(SchemaError::presence(
            name,
            "the set cannot be optional or constant",
        ));
    }

    let (_, width) = parse_encoding(node, name, "set", db)?;
    if width == 0 {
        return Err(SchemaError::structure(format!(
            "failed to identify length of the set \"{name}\", please check encoding type"
        )));
    }

    let bits_count = width * 8;
    if bits_count > 64 {
        return Err(SchemaError::structure(format!(
            "maximum allowed amount of bits for \"{name}\" set is 64"
        )));
    }

    if node.children_named("choice").next().is_none() {
        return Err(SchemaError::structure(format!(
            "no choice has been specified for set \"{name}\""
        )));
    }

    let mut bits: BTreeMap<u32, String> = BTreeMap::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    for c in node.children_named("choice") {
        let c_name = props::name(c);
        if c_name.is_empty() {
            return Err(SchemaError::missing_attr("choice", "name"));
        }

        if seen_names.contains(c_name) {
            return Err(SchemaError::duplicate(
                format!("choice of set \"{name}\""),
                c_name,
            ));
        }

        let text = c.text_content();
        if text.is_empty() {
            return Err(SchemaError::structure(format!(
                "the choice \"{c_name}\" of set \"{name}\" doesn't specify the bit number"
            )));
        }

        let bit = common::parse_i64(&text, &format!("choice \"{c_name}\" of set \"{name}\""))?;
        if bit < 0 {
            return Err(SchemaError::structure(format!(
                "the choice \"{c_name}\" of set \"{name}\" specifies negative bit number"
            )));
        }

        let bit = bit as u64;
        if bits_count as u64 <= bit {
            return Err(SchemaError::structure(format!(
                "the choice \"{c_name}\" of set \"{name}\" specifies bit number which is too high"
            )));
        }

        let bit = bit as u32;
        if bits.contains_key(&bit) {
            return Err(SchemaError::DuplicateBitIndex {
                name: name.to_string(),
                bit,
            });
        }

        if db.does_element_exist(props::since_version(c)?) {
            bits.insert(bit, c_name.to_string());
            seen_names.insert(c_name.to_string());
        }
    }

    if props::length(node)? != 1 {
        tracing::warn!("ignoring \"length\" property of \"{name}\" type");
    }

    let payload = SetType { width, bits };
    let includes = vec!["\"comms/field/BitmaskValue.h\"".to_string()];
    Ok(ParsedKind::new(payload, width, true).with_includes(includes))
}
