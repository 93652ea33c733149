//! Composite type parsing.
//!
//! Members are parsed in declaration order, inactive ones discarded, and
//! offset gaps filled with synthesized padding members. A composite named as
//! the schema message header is additionally shape-checked and has its
//! `templateId` member transmuted into the message-id enum.

use xmltree::Element;

use super::{ExtraOptInfo, ParsedKind, TypeKind, TypeNode};
use crate::common;
use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::props;
use crate::xml;
use crate::xml::ElementExt;

/// Payload of a parsed composite type.
#[derive(Debug, Clone)]
pub struct CompositeType {
    members: Vec<TypeNode>,
    data_use: bool,
}

impl CompositeType {
    /// Returns the members in declaration order, synthesized padding
    /// included.
    #[must_use]
    pub fn members(&self) -> &[TypeNode] {
        &self.members
    }

    /// Returns true while no data field recorded its use of this composite.
    #[must_use]
    pub fn is_bundle(&self) -> bool {
        !self.data_use
    }

    /// Returns true once a data field recorded its use of this composite.
    #[must_use]
    pub fn data_use_recorded(&self) -> bool {
        self.data_use
    }

    pub(crate) fn record_data_use(&mut self) {
        self.data_use = true;
    }

    /// Returns true when the first member transitively resolves to an
    /// optional value.
    #[must_use]
    pub fn is_bundle_optional(&self, db: &Database) -> bool {
        match self.members.first() {
            Some(first) => first.is_optional_like(db),
            None => false,
        }
    }

    /// Validates the dimension shape required from a group `dimensionType`:
    /// exactly two required single-length basic members named `blockLength`
    /// and `numInGroup`.
    pub fn check_dimension_shape(&self, name: &str) -> Result<()> {
        let valid_member = |m: &TypeNode| -> bool {
            m.kind() == TypeKind::Basic
                && m.as_basic().is_some_and(|b| b.count == 1)
                && m.is_required()
        };

        if self.members.len() != 2 {
            return Err(SchemaError::shape(
                name,
                "dimension composite must have exactly 2 members",
            ));
        }

        for m in &self.members {
            if !valid_member(m) {
                return Err(SchemaError::shape(
                    name,
                    format!("the member \"{}\" is of invalid format", m.name()),
                ));
            }
        }

        for expected in [common::BLOCK_LENGTH, common::NUM_IN_GROUP] {
            if !self.members.iter().any(|m| m.name() == expected) {
                return Err(SchemaError::shape(
                    name,
                    format!("no member has name \"{expected}\""),
                ));
            }
        }

        Ok(())
    }

    /// Validates the data shape required from a data field referent: a
    /// required single-length basic length member followed by a required
    /// variable-length basic data member.
    pub fn check_data_shape(&self, name: &str) -> Result<()> {
        if self.members.len() != 2 {
            return Err(SchemaError::shape(
                name,
                format!(
                    "composite used to encode data fields must have 2 members \
                     describing length and data, has {}",
                    self.members.len()
                ),
            ));
        }

        let length_member = &self.members[0];
        let data_member = &self.members[1];

        let length_ok = length_member.kind() == TypeKind::Basic
            && length_member.as_basic().is_some_and(|b| b.count == 1)
            && length_member.is_required();
        if !length_ok {
            return Err(SchemaError::shape(
                name,
                "data composite must have a required single-length basic length member",
            ));
        }

        let data_ok = data_member.kind() == TypeKind::Basic
            && data_member.as_basic().is_some_and(|b| b.count == 0)
            && data_member.is_required();
        if !data_ok {
            return Err(SchemaError::shape(
                name,
                "data composite must have a required variable-length basic data member",
            ));
        }

        Ok(())
    }

    pub(super) fn extra_opt_infos(&self, comp_name: &str) -> Vec<ExtraOptInfo> {
        let mut list = Vec::new();
        for m in &self.members {
            for info in m.extra_opt_infos() {
                let path = if info.path.starts_with(common::FIELD_NAMESPACE) {
                    info.path
                } else {
                    format!("{comp_name}{}::{}", common::MEMBERS_SUFFIX, info.path)
                };
                list.push(ExtraOptInfo::new(
                    format!("{comp_name}_{}", info.name),
                    path,
                ));
            }
        }
        list
    }
}

pub(super) fn parse(
    node: &Element,
    name: &str,
    since_version: u32,
    db: &mut Database,
) -> Result<ParsedKind<CompositeType>> {
    let members = prepare_members(node, name, since_version, db)?;

    let mut composite = CompositeType {
        members,
        data_use: false,
    };

    if name == db.message_header_type() {
        check_message_header(&mut composite, name, since_version, db)?;
    }

    let mut includes = Vec::new();
    for m in &composite.members {
        includes.extend(m.extra_includes().iter().cloned());
    }

    includes.push("\"comms/util/Tuple.h\"".to_string());
    includes.push("\"comms/field/Bundle.h\"".to_string());
    includes.push(common::local_header(
        db.protocol_namespace(),
        common::BUILTIN_NAMESPACE_NAME,
        common::VERSION_SETTER_HEADER,
    ));

    let length = composite
        .members
        .iter()
        .map(TypeNode::serialization_length)
        .sum();
    let fixed_length = composite.members.iter().all(TypeNode::has_fixed_length);

    Ok(ParsedKind::new(composite, length, fixed_length).with_includes(includes))
}

fn prepare_members(
    node: &Element,
    name: &str,
    since_version: u32,
    db: &mut Database,
) -> Result<Vec<TypeNode>> {
    let mut members: Vec<TypeNode> = Vec::new();
    let mut exp_offset = 0usize;
    let mut pad_count = 0u32;

    for child in node.element_children() {
        let mut mem = TypeNode::create(child)?;
        mem.set_containing_composite_version(since_version);
        mem.parse(db)?;

        if !mem.does_exist(db) {
            continue;
        }

        if mem.since_version() < since_version {
            return Err(SchemaError::versioning(
                mem.name(),
                format!(
                    "member of composite \"{name}\" expects sinceVersion \
                     greater or equal to the version of the containing composite"
                ),
            ));
        }

        let offset = props::offset(child)?;
        if offset != 0 && offset != exp_offset {
            if offset < exp_offset {
                return Err(SchemaError::LayoutConflict {
                    owner: name.to_string(),
                    member: mem.name().to_string(),
                    offset,
                    expected: exp_offset,
                });
            }

            let gap = offset - exp_offset;
            pad_count += 1;
            let pad_node = xml::padding_member_node(pad_count, gap);
            let mut pad = TypeNode::create(&pad_node)?;
            pad.set_containing_composite_version(since_version);
            pad.parse(db)?;
            debug_assert_eq!(pad.serialization_length(), gap);
            exp_offset += gap;
            members.push(pad);
        }

        exp_offset += mem.serialization_length();
        members.push(mem);
    }

    if members.is_empty() {
        return Err(SchemaError::structure(format!(
            "the composite \"{name}\" doesn't define any member types"
        )));
    }

    Ok(members)
}

fn find_member(members: &[TypeNode], name: &str) -> Option<usize> {
    members.iter().position(|m| m.name() == name)
}

fn check_message_header(
    composite: &mut CompositeType,
    name: &str,
    since_version: u32,
    db: &mut Database,
) -> Result<()> {
    let members = &mut composite.members;
    if members.len() != 4 {
        return Err(SchemaError::shape(
            name,
            "message header composite is expected to have 4 members",
        ));
    }

    for expected in [
        common::BLOCK_LENGTH,
        common::TEMPLATE_ID,
        common::SCHEMA_ID,
        common::VERSION,
    ] {
        if find_member(members, expected).is_none() {
            return Err(SchemaError::shape(
                name,
                format!("message header composite doesn't have member called \"{expected}\""),
            ));
        }
    }

    for m in members.iter() {
        let basic = m.as_basic().filter(|b| b.count == 1 && b.is_int_type());
        if basic.is_none() {
            return Err(SchemaError::shape(
                name,
                format!(
                    "the member \"{}\" must be a single-length basic integer",
                    m.name()
                ),
            ));
        }
    }

    let schema_id_idx = find_member(members, common::SCHEMA_ID).expect("checked above");
    members[schema_id_idx].add_extra_option(format!(
        "comms::option::DefaultNumValue<{}>",
        common::format_num(i64::from(db.schema_id()))
    ));
    members[schema_id_idx]
        .add_extra_option("comms::option::FailOnInvalid<comms::ErrorStatus::ProtocolError>".into());

    let version_idx = find_member(members, common::VERSION).expect("checked above");
    members[version_idx].add_extra_option(format!(
        "comms::option::DefaultNumValue<{}>",
        common::format_num(i64::from(db.schema_version()))
    ));

    let template_id_idx = find_member(members, common::TEMPLATE_ID).expect("checked above");
    let encoding = members[template_id_idx]
        .as_basic()
        .expect("checked above")
        .primitive
        .name();
    let enum_node = db.create_msg_id_enum_node(common::TEMPLATE_ID, encoding)?;
    let mut new_member = TypeNode::create(&enum_node)?;
    new_member.set_containing_composite_version(since_version);
    new_member.parse(db)?;
    new_member
        .enum_mut()
        .expect("synthesized node is an enum")
        .msg_id = true;
    members[template_id_idx] = new_member;

    Ok(())
}
