//! Ref type parsing.

use xmltree::Element;

use super::{ExtraOptInfo, ParsedKind, TypeKind};
use crate::common;
use crate::database::Database;
use crate::error::{Result, SchemaError};
use crate::props;

/// Payload of a parsed ref type: an alias to another declared type.
#[derive(Debug, Clone)]
pub struct RefType {
    /// Name of the referred type.
    pub target: String,
    infos: Vec<ExtraOptInfo>,
}

impl RefType {
    /// Returns the referred type.
    ///
    /// The reference cannot dangle: resolution was checked at parse time and
    /// nodes are never destroyed before the database.
    #[must_use]
    pub fn referred<'a>(&self, db: &'a Database) -> &'a super::TypeNode {
        db.find_type(&self.target).expect("ref target resolved at parse time")
    }

    /// Returns true when the referred type is a composite bundle.
    #[must_use]
    pub fn is_bundle_like(&self, db: &Database) -> bool {
        let target = self.referred(db);
        match target.as_composite() {
            Some(c) => c.is_bundle(),
            None => false,
        }
    }

    /// Returns true when the referred type is optional-like (composite
    /// first-member rule applies).
    #[must_use]
    pub fn is_referred_optional(&self, db: &Database) -> bool {
        self.referred(db).is_optional_like(db)
    }

    pub(super) fn extra_opt_infos(&self) -> Vec<ExtraOptInfo> {
        self.infos.clone()
    }
}

pub(super) fn parse(node: &Element, name: &str, db: &mut Database) -> Result<ParsedKind<RefType>> {
    let target = props::type_name(node);
    if target.is_empty() {
        return Err(SchemaError::missing_attr(node.name.clone(), "type"));
    }

    if db.type_parse_in_progress(target) {
        return Err(SchemaError::RecursiveDependency {
            name: target.to_string(),
        });
    }
    if db.find_type(target).is_none() {
        return Err(SchemaError::unknown_type(target, name));
    }
    db.ensure_type_parsed(target)?;

    let referred = db.find_type(target).expect("target present");
    debug_assert!(referred.kind() != TypeKind::Ref || referred.is_parsed());

    let length = referred.serialization_length();
    let fixed_length = referred.has_fixed_length();

    let infos = referred
        .extra_opt_infos()
        .into_iter()
        .map(|mut info| {
            if !info.path.starts_with(common::FIELD_NAMESPACE) {
                info.path = format!("{}{}", common::FIELD_NAMESPACE, info.path);
            }
            info
        })
        .collect();

    let includes = vec![format!("\"{}.h\"", referred.name())];

    let payload = RefType {
        target: target.to_string(),
        infos,
    };

    Ok(ParsedKind::new(payload, length, fixed_length).with_includes(includes))
}
