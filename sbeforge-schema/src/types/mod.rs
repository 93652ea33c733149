//! Type model.
//!
//! Every `<type|composite|enum|set|ref>` declaration becomes a [`TypeNode`]:
//! shared identity/presence/versioning state plus a tagged per-kind payload.
//! Nodes are created when a declaration is recorded and parsed exactly once
//! in a later pass; parsing resolves names against the database, validates
//! invariants, computes layout, and lowers the type to the target field
//! algebra. After parsing the node is read-only.

mod basic;
mod composite;
mod enumeration;
mod reference;
mod set;

pub use basic::{
    ArrayLowering, BasicLowering, BasicType, BigUintLowering, FloatLowering, IntLowering,
    StringLowering,
};
pub use composite::CompositeType;
pub use enumeration::EnumType;
pub use reference::RefType;
pub use set::SetType;

use std::collections::BTreeSet;

use xmltree::Element;

use crate::common;
use crate::database::Database;
use crate::emit;
use crate::error::{Result, SchemaError};
use crate::props;

/// Declared presence of a type or field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Presence {
    /// Value must always be present on the wire.
    #[default]
    Required,
    /// Value may be the reserved null encoding.
    Optional,
    /// Value is fixed by the schema and never serialized.
    Constant,
}

impl Presence {
    /// Resolves a presence token; empty means required, anything
    /// unrecognized is `None`.
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "" | "required" => Some(Self::Required),
            "optional" => Some(Self::Optional),
            "constant" => Some(Self::Constant),
            _ => None,
        }
    }
}

/// Default optional mode of a comms-optional-wrapped entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OptMode {
    /// Not wrapped.
    #[default]
    None,
    /// Wrapped, defaults to existing (introduced after the minimal remote
    /// version).
    Exists,
    /// Wrapped, defaults to missing (deprecated within the supported range).
    Missing,
}

impl OptMode {
    /// Returns true when the entity is comms-optional-wrapped.
    #[must_use]
    pub const fn is_wrapped(&self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns the comms optional-mode spelling, `None` when not wrapped.
    #[must_use]
    pub const fn comms_mode(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Exists => Some("comms::field::OptionalMode::Exists"),
            Self::Missing => Some("comms::field::OptionalMode::Missing"),
        }
    }
}

/// Extra-option template parameter threaded through generated definitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraOptInfo {
    /// Option parameter name.
    pub name: String,
    /// Path of the definition the option configures.
    pub path: String,
}

impl ExtraOptInfo {
    pub(crate) fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

/// Type kind discriminant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Primitive-backed `<type>`.
    Basic,
    /// `<composite>` bundle.
    Composite,
    /// `<enum>`.
    Enum,
    /// `<set>` bitmask.
    Set,
    /// `<ref>` alias.
    Ref,
}

/// Per-kind payload, populated by `parse()`.
#[derive(Debug, Clone)]
enum TypePayload {
    /// Node recorded but not yet parsed.
    Unparsed,
    Basic(BasicType),
    Composite(CompositeType),
    Enum(EnumType),
    Set(SetType),
    Ref(RefType),
}

/// A single type declaration.
#[derive(Debug, Clone)]
pub struct TypeNode {
    node: Element,
    name: String,
    description: Option<String>,
    presence: Option<Presence>,
    since_version: u32,
    deprecated: u32,
    containing_composite_version: u32,
    opt_mode: OptMode,
    extra_options: Vec<String>,
    extra_includes: BTreeSet<String>,
    parsed: bool,
    normal_uses: u32,
    group_size_uses: u32,
    length: usize,
    fixed_length: bool,
    kind: TypeKind,
    payload: TypePayload,
}

impl TypeNode {
    /// Creates a type node from its XML declaration, recording identity and
    /// versioning attributes. Unknown element kinds are rejected.
    pub(crate) fn create(node: &Element) -> Result<Self> {
        let kind = match node.name.as_str() {
            "type" => TypeKind::Basic,
            "composite" => TypeKind::Composite,
            "enum" => TypeKind::Enum,
            "set" => TypeKind::Set,
            "ref" => TypeKind::Ref,
            other => {
                return Err(SchemaError::structure(format!(
                    "unknown type kind \"{other}\""
                )));
            }
        };

        Ok(Self {
            name: props::name(node).to_string(),
            description: props::description(node),
            presence: Presence::from_token(props::presence(node)),
            since_version: props::since_version(node)?,
            deprecated: props::deprecated(node)?,
            containing_composite_version: 0,
            opt_mode: OptMode::None,
            extra_options: Vec::new(),
            extra_includes: BTreeSet::new(),
            parsed: false,
            normal_uses: 0,
            group_size_uses: 0,
            length: 0,
            fixed_length: true,
            kind,
            payload: TypePayload::Unparsed,
            node: node.clone(),
        })
    }

    /// Parses the declaration. Strictly one-shot: the second call on the
    /// same node reports a recursive dependency.
    pub(crate) fn parse(&mut self, db: &mut Database) -> Result<()> {
        if self.parsed {
            return Err(SchemaError::RecursiveDependency {
                name: self.name.clone(),
            });
        }

        if self.name.is_empty() {
            return Err(SchemaError::missing_attr(self.node.name.clone(), "name"));
        }

        let Some(presence) = self.presence else {
            return Err(SchemaError::presence(
                self.name.clone(),
                format!(
                    "unknown presence token \"{}\"",
                    props::presence(&self.node)
                ),
            ));
        };

        self.opt_mode = self.compute_opt_mode(db);
        if self.opt_mode.is_wrapped() {
            self.add_extra_include(format!("\"{}\"", common::OPTIONAL_HEADER));
        }

        if self.deprecated <= self.since_version {
            tracing::warn!(
                "the type \"{}\" has been deprecated before introduced",
                self.name
            );
        }

        self.add_extra_include(format!("\"{}\"", common::FIELD_BASE_HEADER));

        let outcome = match self.kind {
            TypeKind::Basic => {
                let parsed = basic::parse(&self.node, &self.name, presence)?;
                self.length = parsed.length;
                self.fixed_length = parsed.fixed_length;
                for inc in parsed.includes {
                    self.add_extra_include(inc);
                }
                TypePayload::Basic(parsed.payload)
            }
            TypeKind::Composite => {
                let parsed = composite::parse(
                    &self.node,
                    &self.name,
                    self.since_version,
                    db,
                )?;
                self.length = parsed.length;
                self.fixed_length = parsed.fixed_length;
                for inc in parsed.includes {
                    self.add_extra_include(inc);
                }
                TypePayload::Composite(parsed.payload)
            }
            TypeKind::Enum => {
                let parsed = enumeration::parse(&self.node, &self.name, presence, db)?;
                self.length = parsed.length;
                self.fixed_length = true;
                for inc in parsed.includes {
                    self.add_extra_include(inc);
                }
                TypePayload::Enum(parsed.payload)
            }
            TypeKind::Set => {
                let parsed = set::parse(&self.node, &self.name, presence, db)?;
                self.length = parsed.length;
                self.fixed_length = true;
                for inc in parsed.includes {
                    self.add_extra_include(inc);
                }
                TypePayload::Set(parsed.payload)
            }
            TypeKind::Ref => {
                let parsed = reference::parse(&self.node, &self.name, db)?;
                self.length = parsed.length;
                self.fixed_length = parsed.fixed_length;
                for inc in parsed.includes {
                    self.add_extra_include(inc);
                }
                TypePayload::Ref(parsed.payload)
            }
        };

        self.payload = outcome;
        self.parsed = true;
        Ok(())
    }

    fn compute_opt_mode(&self, db: &Database) -> OptMode {
        if self.containing_composite_version == self.since_version {
            return OptMode::None;
        }

        if db.min_remote_version() < self.since_version {
            return OptMode::Exists;
        }

        OptMode::None
    }

    /// Marks the version of the enclosing composite, which gates optional
    /// wrapping. Must happen before `parse()`.
    pub(crate) fn set_containing_composite_version(&mut self, version: u32) {
        self.containing_composite_version = version;
    }

    /// Returns true when the declaration is active under the effective
    /// schema version.
    #[must_use]
    pub fn does_exist(&self, db: &Database) -> bool {
        db.does_element_exist(self.since_version)
    }

    /// Returns true once `parse()` completed.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Returns true when some basic field references this type.
    #[must_use]
    pub fn normal_use_recorded(&self) -> bool {
        self.normal_uses > 0
    }

    /// Returns true when some group uses this type as its dimension.
    #[must_use]
    pub fn group_size_use_recorded(&self) -> bool {
        self.group_size_uses > 0
    }

    /// Returns true when some data field uses this (composite) type as its
    /// encoding.
    #[must_use]
    pub fn data_use_recorded(&self) -> bool {
        match &self.payload {
            TypePayload::Composite(c) => c.data_use_recorded(),
            _ => false,
        }
    }

    pub(crate) fn record_normal_use(&mut self) {
        self.normal_uses += 1;
    }

    pub(crate) fn record_group_size_use(&mut self) {
        self.group_size_uses += 1;
    }

    /// Returns the type kind.
    #[must_use]
    pub fn kind(&self) -> TypeKind {
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

    /// Returns the declared presence.
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

    /// Returns the version this declaration was introduced in.
    #[must_use]
    pub fn since_version(&self) -> u32 {
        self.since_version
    }

    /// Returns the version this declaration was deprecated in.
    #[must_use]
    pub fn deprecated(&self) -> u32 {
        self.deprecated
    }

    /// Returns the serialized length in bytes, padding included.
    #[must_use]
    pub fn serialization_length(&self) -> usize {
        self.length
    }

    /// Returns false only for variable-length basics and composites
    /// containing one.
    #[must_use]
    pub fn has_fixed_length(&self) -> bool {
        self.fixed_length
    }

    /// Returns true when an optional field may reference this type.
    #[must_use]
    pub fn can_be_extended_as_optional(&self) -> bool {
        match &self.payload {
            TypePayload::Basic(b) => b.can_be_extended_as_optional(),
            TypePayload::Enum(_) => true,
            _ => false,
        }
    }

    /// Returns the extra-option parameters this type threads through
    /// generated definitions, in declaration order.
    #[must_use]
    pub fn extra_opt_infos(&self) -> Vec<ExtraOptInfo> {
        match &self.payload {
            TypePayload::Composite(c) => c.extra_opt_infos(&self.name),
            TypePayload::Ref(r) => r.extra_opt_infos(),
            _ => vec![ExtraOptInfo::new(self.name.clone(), self.reference_name())],
        }
    }

    /// Returns the accumulated include requirements.
    #[must_use]
    pub fn extra_includes(&self) -> &BTreeSet<String> {
        &self.extra_includes
    }

    /// Returns the extra comms options accumulated during parsing, to be
    /// emitted verbatim.
    #[must_use]
    pub fn extra_options(&self) -> &[String] {
        &self.extra_options
    }

    pub(crate) fn add_extra_option(&mut self, option: String) {
        self.extra_options.push(option);
    }

    pub(crate) fn add_extra_include(&mut self, include: impl Into<String>) {
        self.extra_includes.insert(include.into());
    }

    /// Returns the default optional mode; non-none means the definition is
    /// wrapped in an outer optional selecting Missing/Exists by live
    /// version.
    #[must_use]
    pub fn default_opt_mode(&self) -> OptMode {
        self.opt_mode
    }

    /// Returns true when the effective representation carries the outer
    /// optional wrapper.
    #[must_use]
    pub fn is_comms_optional_wrapped(&self) -> bool {
        self.opt_mode.is_wrapped()
    }

    /// Returns the basic payload when this is a parsed basic type.
    #[must_use]
    pub fn as_basic(&self) -> Option<&BasicType> {
        match &self.payload {
            TypePayload::Basic(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the composite payload when this is a parsed composite.
    #[must_use]
    pub fn as_composite(&self) -> Option<&CompositeType> {
        match &self.payload {
            TypePayload::Composite(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the enum payload when this is a parsed enum.
    #[must_use]
    pub fn as_enum(&self) -> Option<&EnumType> {
        match &self.payload {
            TypePayload::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the set payload when this is a parsed set.
    #[must_use]
    pub fn as_set(&self) -> Option<&SetType> {
        match &self.payload {
            TypePayload::Set(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the ref payload when this is a parsed ref.
    #[must_use]
    pub fn as_ref_type(&self) -> Option<&RefType> {
        match &self.payload {
            TypePayload::Ref(r) => Some(r),
            _ => None,
        }
    }

    pub(crate) fn composite_mut(&mut self) -> Option<&mut CompositeType> {
        match &mut self.payload {
            TypePayload::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn enum_mut(&mut self) -> Option<&mut EnumType> {
        match &mut self.payload {
            TypePayload::Enum(e) => Some(e),
            _ => None,
        }
    }

    /// Returns true when this type resolves to something optional-like: an
    /// optional basic/enum, a ref to one, or a composite whose first member
    /// is.
    #[must_use]
    pub fn is_optional_like(&self, db: &Database) -> bool {
        match &self.payload {
            TypePayload::Composite(c) => c.is_bundle_optional(db),
            TypePayload::Ref(r) => r.is_referred_optional(db),
            _ => self.is_optional(),
        }
    }

}

/// Result of a per-kind parse: payload plus layout and include effects.
#[derive(Debug)]
struct ParsedKind<T> {
    payload: T,
    length: usize,
    fixed_length: bool,
    includes: Vec<String>,
}

impl<T> ParsedKind<T> {
    fn new(payload: T, length: usize, fixed_length: bool) -> Self {
        Self {
            payload,
            length,
            fixed_length,
            includes: Vec::new(),
        }
    }

    fn with_includes(mut self, includes: Vec<String>) -> Self {
        self.includes = includes;
        self
    }
}
