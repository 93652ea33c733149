//! Group field parsing.
//!
//! A group owns an ordered member list split into three sections: a root
//! block of basic fields, nested groups, and a trailing run of data fields.
//! Root-block offset gaps are filled with padding fields backed by
//! synthesized padding types.

use super::{FieldKind, FieldNode};
use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::props;
use crate::types::{TypeKind, TypeNode};
use crate::xml;
use crate::xml::ElementExt;

/// Payload of a parsed group field.
#[derive(Debug, Clone)]
pub struct GroupField {
    members: Vec<FieldNode>,
    dimension_type: String,
}

impl GroupField {
    /// Returns the members in declaration order, synthesized padding
    /// included.
    #[must_use]
    pub fn members(&self) -> &[FieldNode] {
        &self.members
    }

    /// Returns the name of the dimension composite.
    #[must_use]
    pub fn dimension_type_name(&self) -> &str {
        &self.dimension_type
    }

    /// Returns the dimension composite.
    #[must_use]
    pub fn dimension<'a>(&self, db: &'a Database) -> &'a TypeNode {
        db.find_type(&self.dimension_type)
            .expect("dimension type resolved at parse time")
    }

    /// Returns the root-block members: the basic-field prefix whose
    /// serialized size is the dimension's `blockLength`.
    pub fn root_block(&self) -> impl Iterator<Item = &FieldNode> {
        self.members
            .iter()
            .take_while(|m| m.kind() == FieldKind::Basic)
    }

    /// Returns the summed wire size of the root block.
    #[must_use]
    pub fn root_block_length(&self, db: &Database) -> usize {
        self.root_block().map(|m| m.serialization_length(db)).sum()
    }
}

pub(super) fn parse(field: &mut FieldNode, db: &mut Database) -> Result<GroupField> {
    let members = prepare_members(field, db)?;

    let dimension_type = props::dimension_type(field.xml_node()).to_string();
    if dimension_type.is_empty() {
        return Err(SchemaError::missing_attr(
            field.xml_node().name.clone(),
            "dimensionType",
        ));
    }

    let Some(dim) = db.find_type(&dimension_type) else {
        return Err(SchemaError::unknown_type(&dimension_type, field.name()));
    };

    if dim.kind() != TypeKind::Composite {
        return Err(SchemaError::shape(
            field.name(),
            format!("the dimensionType \"{dimension_type}\" must be composite"),
        ));
    }

    dim.as_composite()
        .expect("checked above")
        .check_dimension_shape(&dimension_type)?;

    db.record_group_size_use(&dimension_type);
    db.record_group_list_usage();

    Ok(GroupField {
        members,
        dimension_type,
    })
}

fn prepare_members(field: &mut FieldNode, db: &mut Database) -> Result<Vec<FieldNode>> {
    let group_name = field.name().to_string();
    let block_length = props::block_length(field.xml_node())?;
    let node = field.xml_node().clone();

    let mut members: Vec<FieldNode> = Vec::new();
    let mut exp_offset = 0usize;
    let mut pad_count = 0u32;
    let mut root_block = true;
    let mut data_members = false;

    for child in node.element_children() {
        let mut mem = FieldNode::create(child, "")?;
        mem.parse(db)?;

        if !mem.does_exist(db) {
            continue;
        }

        if !root_block && mem.kind() == FieldKind::Basic {
            return Err(SchemaError::shape(
                mem.name(),
                format!(
                    "basic member of \"{group_name}\" group cannot follow other group or data"
                ),
            ));
        }

        if data_members && mem.kind() != FieldKind::Data {
            return Err(SchemaError::shape(
                mem.name(),
                format!("member of \"{group_name}\" group cannot follow data"),
            ));
        }

        if mem.kind() == FieldKind::Data {
            root_block = false;
            data_members = true;
        }

        if root_block {
            let mut offset = props::offset(child)?;
            if mem.kind() != FieldKind::Basic {
                root_block = false;
                offset = offset.max(block_length);
            }

            if offset != 0 && offset != exp_offset {
                if offset < exp_offset {
                    return Err(SchemaError::LayoutConflict {
                        owner: group_name.clone(),
                        member: mem.name().to_string(),
                        offset,
                        expected: exp_offset,
                    });
                }

                let gap = offset - exp_offset;
                pad_count += 1;
                let pad_type_name = db.padding_type(gap)?.name().to_string();
                let pad_node = xml::padding_field_node(pad_count, &pad_type_name);
                let mut pad = FieldNode::create(&pad_node, "")?;
                pad.set_generated_padding();
                pad.parse(db)?;
                debug_assert_eq!(pad.serialization_length(db), gap);
                exp_offset += gap;
                members.push(pad);
            }

            if root_block {
                exp_offset += mem.serialization_length(db);
            }
        }

        members.push(mem);
    }

    if members.is_empty() {
        return Err(SchemaError::structure(format!(
            "the group \"{group_name}\" doesn't define any members"
        )));
    }

    Ok(members)
}
