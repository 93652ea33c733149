//! Field model.
//!
//! Fields live inside messages and groups. Each `<field|group|data>` element
//! becomes a [`FieldNode`] bound to a referenced type and a containing
//! message; parsing resolves the type, validates presence compatibility, and
//! records use-effects (data use, group-list use) on the database.

mod basic;
mod data;
mod group;

pub use basic::{BasicField, FieldLowering, TypeRef};
pub use data::DataField;
pub use group::GroupField;

use std::collections::BTreeSet;

use xmltree::Element;

use crate::common;
use crate::database::Database;
use crate::emit;
use crate::error::{Result, SchemaError};
use crate::props;
use crate::types::{OptMode, Presence, TypeNode};

/// Field kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// `<field>` wrapping a single type.
    Basic,
    /// `<group>` with its own member list and dimension type.
    Group,
    /// `<data>` referencing a data-shaped composite.
    Data,
}

#[derive(Debug, Clone)]
enum FieldPayload {
    Unparsed,
    Basic(BasicField),
    Group(GroupField),
    Data(DataField),
}

/// A single field declaration inside a message or group.
#[derive(Debug, Clone)]
pub struct FieldNode {
    node: Element,
    name: String,
    msg_name: String,
    description: Option<String>,
    has_presence: bool,
    presence: Option<Presence>,
    since_version: u32,
    deprecated: u32,
    extra_headers: BTreeSet<String>,
    generated_padding: bool,
    opt_mode: OptMode,
    kind: FieldKind,
    payload: FieldPayload,
}

impl FieldNode {
    /// Creates a field node from its XML declaration. Unknown element kinds
    /// are rejected.
    pub(crate) fn create(node: &Element, msg_name: &str) -> Result<Self> {
        let kind = match node.name.as_str() {
            "field" => FieldKind::Basic,
            "group" => FieldKind::Group,
            "data" => FieldKind::Data,
            other => {
                return Err(SchemaError::structure(format!(
                    "unknown field kind \"{other}\""
                )));
            }
        };

        Ok(Self {
            name: props::name(node).to_string(),
            msg_name: msg_name.to_string(),
            description: props::description(node),
            has_presence: props::has_presence(node),
            presence: Presence::from_token(props::presence(node)),
            since_version: props::since_version(node)?,
            deprecated: props::deprecated(node)?,
            extra_headers: BTreeSet::new(),
            generated_padding: false,
            opt_mode: OptMode::None,
            kind,
            payload: FieldPayload::Unparsed,
            node: node.clone(),
        })
    }

    /// Parses the field, resolving its referenced type against the database.
    pub(crate) fn parse(&mut self, db: &mut Database) -> Result<()> {
        if self.name.is_empty() {
            return Err(SchemaError::missing_attr(self.node.name.clone(), "name"));
        }

        if self.deprecated <= self.since_version {
            return Err(SchemaError::versioning(
                self.name.clone(),
                "the field has been deprecated before introduced",
            ));
        }

        if self.has_presence && self.presence.is_none() {
            return Err(SchemaError::presence(
                self.name.clone(),
                format!(
                    "unknown presence token \"{}\"",
                    props::presence(&self.node)
                ),
            ));
        }

        self.opt_mode = self.compute_opt_mode(db);

        let payload = match self.kind {
            FieldKind::Basic => FieldPayload::Basic(basic::parse(self, db)?),
            FieldKind::Group => FieldPayload::Group(group::parse(self, db)?),
            FieldKind::Data => FieldPayload::Data(data::parse(self, db)?),
        };
        self.payload = payload;
        Ok(())
    }

    fn compute_opt_mode(&self, db: &Database) -> OptMode {
        if self.deprecated <= db.schema_version() {
            return OptMode::Missing;
        }

        if db.min_remote_version() < self.since_version {
            return OptMode::Exists;
        }

        OptMode::None
    }

    /// Returns true when the declaration is active under the effective
    /// schema version.
    #[must_use]
    pub fn does_exist(&self, db: &Database) -> bool {
        db.does_element_exist(self.since_version)
    }

    /// Returns the field kind.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Returns the declared name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the identifier spelling with keyword renaming applied.
    #[must_use]
    pub fn reference_name(&self) -> String {
        emit::rename_keyword(&self.name)
    }

    /// Returns the declared description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the name of the containing message, empty for group members.
    #[must_use]
    pub fn containing_message(&self) -> &str {
        &self.msg_name
    }

    /// Returns true when the declaration carries a `presence` attribute.
    #[must_use]
    pub fn has_presence(&self) -> bool {
        self.has_presence
    }

    /// Returns the effective presence (required when unspecified).
    #[must_use]
    pub fn presence(&self) -> Presence {
        self.presence.unwrap_or_default()
    }

    /// Returns true for required presence.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.presence() == Presence::Required
    }

    /// Returns true for optional presence.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.presence() == Presence::Optional
    }

    /// Returns true for constant presence.
    #[must_use]
    pub fn is_constant(&self) -> bool {
        self.presence() == Presence::Constant
    }

    /// Returns the version this field was introduced in.
    #[must_use]
    pub fn since_version(&self) -> u32 {
        self.since_version
    }

    /// Returns the version this field was deprecated in.
    #[must_use]
    pub fn deprecated(&self) -> u32 {
        self.deprecated
    }

    /// Returns true for padding fields synthesized during group layout.
    #[must_use]
    pub fn is_generated_padding(&self) -> bool {
        self.generated_padding
    }

    pub(crate) fn set_generated_padding(&mut self) {
        self.generated_padding = true;
    }

    /// Returns the wire length this field contributes to the root block.
    /// Constant and variable-sized fields contribute nothing.
    #[must_use]
    pub fn serialization_length(&self, db: &Database) -> usize {
        match &self.payload {
            FieldPayload::Basic(b) => {
                if self.is_constant() {
                    0
                } else {
                    b.referenced_type(db).serialization_length()
                }
            }
            _ => 0,
        }
    }

    /// Returns the type this field references: the wrapped type of a basic
    /// field, the dimension type of a group, the data composite of a data
    /// field.
    #[must_use]
    pub fn referenced_type<'a>(&self, db: &'a Database) -> Option<&'a TypeNode> {
        match &self.payload {
            FieldPayload::Basic(b) => Some(b.referenced_type(db)),
            FieldPayload::Group(g) => db.find_type(g.dimension_type_name()),
            FieldPayload::Data(d) => db.find_type(d.type_name()),
            FieldPayload::Unparsed => None,
        }
    }

    /// Returns the default optional mode of the field.
    #[must_use]
    pub fn default_opt_mode(&self) -> OptMode {
        self.opt_mode
    }

    /// Returns true when the field's representation is an outer optional
    /// transitioning between Missing and Exists by live wire version.
    #[must_use]
    pub fn is_comms_optional_wrapped(&self) -> bool {
        self.opt_mode.is_wrapped()
    }

    /// Returns the accumulated header dependencies.
    #[must_use]
    pub fn extra_headers(&self) -> &BTreeSet<String> {
        &self.extra_headers
    }

    pub(crate) fn record_extra_header(&mut self, header: impl Into<String>) {
        self.extra_headers.insert(header.into());
    }

    /// Returns the basic payload when this is a parsed basic field.
    #[must_use]
    pub fn as_basic_field(&self) -> Option<&BasicField> {
        match &self.payload {
            FieldPayload::Basic(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the group payload when this is a parsed group.
    #[must_use]
    pub fn as_group(&self) -> Option<&GroupField> {
        match &self.payload {
            FieldPayload::Group(g) => Some(g),
            _ => None,
        }
    }

    /// Returns the data payload when this is a parsed data field.
    #[must_use]
    pub fn as_data(&self) -> Option<&DataField> {
        match &self.payload {
            FieldPayload::Data(d) => Some(d),
            _ => None,
        }
    }

    /// Option path configuring the field itself within the message options
    /// subtree.
    #[must_use]
    pub fn field_opt_arg(&self) -> String {
        let scope = if self.msg_name.is_empty() {
            String::new()
        } else {
            format!("{}Fields::", self.msg_name)
        };
        format!(
            "{}{}{}{}",
            common::OPT_PARAM_PREFIX,
            common::MESSAGE_NAMESPACE,
            scope,
            self.reference_name()
        )
    }

    /// Option path configuring the referenced type.
    #[must_use]
    pub fn type_opt_arg(&self, db: &Database) -> Option<String> {
        let ty = self.referenced_type(db)?;
        let info = ty.extra_opt_infos().into_iter().next()?;
        let path = if info.path.starts_with(common::FIELD_NAMESPACE) {
            info.path
        } else {
            format!("{}{}", common::FIELD_NAMESPACE, info.path)
        };
        Some(format!("{}{}", common::OPT_PARAM_PREFIX, path))
    }

    pub(crate) fn xml_node(&self) -> &Element {
        &self.node
    }
}
