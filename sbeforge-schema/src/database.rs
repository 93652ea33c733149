//! Schema database.
//!
//! Central owner of the schema model: declared types and messages, lazily
//! instantiated builtins and padding types, the synthesized message-id enum
//! node, and the global settings derived from schema metadata and program
//! options. Parsing runs in phases: record declarations, parse types, parse
//! messages. Once `parse_schema` returns, the database is read-only.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use xmltree::Element;

use crate::common;
use crate::config::Config;
use crate::error::{Result, SchemaError};
use crate::messages::MessageNode;
use crate::props;
use crate::schema::{ByteOrder, MessageSchema};
use crate::types::{TypeKind, TypeNode};
use crate::xml::{self, ElementExt};

const BUILTIN_TYPES: &[&str] = &[
    "char", "int8", "uint8", "int16", "uint16", "int32", "uint32", "int64", "uint64", "float",
    "double",
];

/// Parses a schema file into a [`Database`].
///
/// # Errors
/// Returns the first error encountered in any phase; nothing is recovered
/// locally.
pub fn parse_schema(path: impl AsRef<Path>, config: &Config) -> Result<Database> {
    let xml = std::fs::read_to_string(path)?;
    parse_schema_str(&xml, config)
}

/// Parses schema XML content into a [`Database`].
///
/// # Errors
/// Returns the first error encountered in any phase.
pub fn parse_schema_str(xml: &str, config: &Config) -> Result<Database> {
    let root = xml::parse_document(xml)?;
    if !root.name.ends_with("messageSchema") {
        return Err(SchemaError::structure(format!(
            "root element is not messageSchema, found \"{}\"",
            root.name
        )));
    }

    let schema = MessageSchema::from_root(&root)?;
    let mut db = Database::new(schema, config)?;
    tracing::info!("generating files in {}", db.root_dir().display());

    db.walk_top_level(&root)?;
    db.parse_all_types()?;
    db.validate_open_framing_header()?;
    db.parse_all_messages()?;

    Ok(db)
}

/// The parsed schema model.
#[derive(Debug)]
pub struct Database {
    schema: MessageSchema,
    root_dir: PathBuf,
    namespace: String,
    schema_version: u32,
    min_remote_version: u32,
    cc_tag: String,
    sofh_name: Option<String>,
    types: HashMap<String, TypeNode>,
    type_order: Vec<String>,
    parsing: HashSet<String>,
    builtins: BTreeMap<String, TypeNode>,
    paddings: BTreeMap<String, TypeNode>,
    msg_id_enum: Option<Element>,
    messages: Vec<MessageNode>,
    message_index: HashMap<String, usize>,
    messages_by_id: BTreeMap<u32, usize>,
    group_list_used: bool,
}

impl Database {
    fn new(schema: MessageSchema, config: &Config) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let root_dir = match &config.output_dir {
            None => cwd,
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => cwd.join(dir),
        };

        let mut namespace = config
            .namespace
            .clone()
            .unwrap_or_else(|| schema.package.clone());
        namespace = namespace.replace(' ', "_");

        let mut schema_version = schema.version;
        if let Some(forced) = config.force_version {
            if schema_version < forced {
                return Err(SchemaError::versioning(
                    "schema",
                    "forced schema version is greater than specified in the schema file",
                ));
            }
            if forced < schema_version {
                tracing::info!("forcing schema version to {forced}");
            }
            schema_version = forced;
        }

        let min_remote_version = config.min_remote_version.min(schema_version);

        Ok(Self {
            schema,
            root_dir,
            namespace,
            schema_version,
            min_remote_version,
            cc_tag: config.cc_tag.clone(),
            sofh_name: config.sofh_name.clone(),
            types: HashMap::new(),
            type_order: Vec::new(),
            parsing: HashSet::new(),
            builtins: BTreeMap::new(),
            paddings: BTreeMap::new(),
            msg_id_enum: None,
            messages: Vec::new(),
            message_index: HashMap::new(),
            messages_by_id: BTreeMap::new(),
            group_list_used: false,
        })
    }

    fn walk_top_level(&mut self, root: &Element) -> Result<()> {
        for child in root.element_children() {
            match child.name.as_str() {
                "types" => {
                    for ty in child.element_children() {
                        self.record_type_ref(ty)?;
                    }
                }
                "message" => self.record_message(child)?,
                other => {
                    tracing::warn!("unexpected element \"{other}\", ignored");
                }
            }
        }
        Ok(())
    }

    fn record_type_ref(&mut self, node: &Element) -> Result<()> {
        let name = props::name(node);
        if name.is_empty() {
            return Err(SchemaError::missing_attr(node.name.clone(), "name"));
        }

        if self.types.contains_key(name) {
            return Err(SchemaError::duplicate("type", name));
        }

        let ty = TypeNode::create(node)?;
        if self.does_element_exist(ty.since_version()) {
            self.type_order.push(name.to_string());
            self.types.insert(name.to_string(), ty);
        }

        Ok(())
    }

    fn record_message(&mut self, node: &Element) -> Result<()> {
        let name = props::name(node);
        if name.is_empty() {
            return Err(SchemaError::missing_attr(node.name.clone(), "name"));
        }

        if self.message_index.contains_key(name) {
            return Err(SchemaError::duplicate("message", name));
        }

        if !self.does_element_exist(props::since_version(node)?) {
            return Ok(());
        }

        let msg = MessageNode::create(node)?;
        if self.messages_by_id.contains_key(&msg.id()) {
            return Err(SchemaError::DuplicateMessageId {
                name: name.to_string(),
                id: msg.id(),
            });
        }

        let index = self.messages.len();
        self.messages_by_id.insert(msg.id(), index);
        self.message_index.insert(name.to_string(), index);
        self.messages.push(msg);
        Ok(())
    }

    fn parse_all_types(&mut self) -> Result<()> {
        for name in self.type_order.clone() {
            self.ensure_type_parsed(&name)?;
        }
        Ok(())
    }

    fn parse_all_messages(&mut self) -> Result<()> {
        let mut messages = std::mem::take(&mut self.messages);
        let mut outcome = Ok(());
        for msg in &mut messages {
            outcome = msg.parse(self);
            if outcome.is_err() {
                break;
            }
        }
        self.messages = messages;
        outcome
    }

    fn validate_open_framing_header(&self) -> Result<()> {
        let Some(name) = &self.sofh_name else {
            return Ok(());
        };

        match self.find_type(name) {
            Some(ty) if ty.kind() == TypeKind::Composite => Ok(()),
            Some(_) => Err(SchemaError::shape(
                name.clone(),
                "open framing header type must be a composite",
            )),
            None => Err(SchemaError::unknown_type(name.clone(), "open framing header")),
        }
    }

    /// Parses a declared type on demand. Re-entry through a dependency
    /// cycle is reported as [`SchemaError::RecursiveDependency`]; an
    /// undeclared name is not an error here, the caller resolves it.
    pub(crate) fn ensure_type_parsed(&mut self, name: &str) -> Result<()> {
        if self.parsing.contains(name) {
            return Err(SchemaError::RecursiveDependency {
                name: name.to_string(),
            });
        }

        match self.types.get(name) {
            None => return Ok(()),
            Some(ty) if ty.is_parsed() => return Ok(()),
            Some(_) => {}
        }

        let mut ty = self.types.remove(name).expect("checked above");
        self.parsing.insert(name.to_string());
        let outcome = ty.parse(self);
        self.parsing.remove(name);
        self.types.insert(name.to_string(), ty);
        outcome
    }

    /// Looks up a declared type.
    #[must_use]
    pub fn find_type(&self, name: &str) -> Option<&TypeNode> {
        self.types.get(name)
    }

    /// Returns true while the named type is being parsed. A lookup hitting
    /// an in-progress type is a dependency cycle.
    pub(crate) fn type_parse_in_progress(&self, name: &str) -> bool {
        self.parsing.contains(name)
    }

    /// Returns true when a type with the given name has been declared.
    #[must_use]
    pub fn is_introduced_type(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Looks up an instantiated builtin type.
    #[must_use]
    pub fn find_builtin_type(&self, name: &str) -> Option<&TypeNode> {
        self.builtins.get(name)
    }

    /// Instantiates a builtin primitive type on first demand, parsing it
    /// immediately. Returns `None` for names that are not builtins.
    pub(crate) fn builtin_type(&mut self, name: &str) -> Result<Option<&TypeNode>> {
        if !BUILTIN_TYPES.contains(&name) {
            return Ok(None);
        }

        if !self.builtins.contains_key(name) {
            let node = xml::builtin_type_node(name);
            let mut ty = TypeNode::create(&node)?;
            ty.parse(self)?;
            self.builtins.insert(name.to_string(), ty);
        }

        Ok(self.builtins.get(name))
    }

    /// Looks up an instantiated padding type.
    #[must_use]
    pub fn find_padding_type(&self, name: &str) -> Option<&TypeNode> {
        self.paddings.get(name)
    }

    /// Instantiates the raw-byte padding type of the given length on first
    /// demand, parsing it immediately.
    pub(crate) fn padding_type(&mut self, len: usize) -> Result<&TypeNode> {
        let name = format!("{}{len}", common::PAD_PREFIX);
        if !self.paddings.contains_key(&name) {
            let node = xml::raw_data_type_node(&name, len);
            let mut ty = TypeNode::create(&node)?;
            ty.parse(self)?;
            self.paddings.insert(name.clone(), ty);
        }

        Ok(self.paddings.get(&name).expect("inserted above"))
    }

    /// Synthesizes the message-id enum node with one value per active
    /// message, in ascending id order.
    pub(crate) fn create_msg_id_enum_node(
        &mut self,
        name: &str,
        encoding_type: &str,
    ) -> Result<Element> {
        if self.msg_id_enum.is_some() {
            return Err(SchemaError::structure(
                "message id enum has already been created",
            ));
        }

        let values: Vec<(String, String)> = self
            .messages_by_id
            .iter()
            .map(|(id, idx)| (self.messages[*idx].name().to_string(), id.to_string()))
            .collect();

        let node = xml::enum_node(name, encoding_type, &values);
        self.msg_id_enum = Some(node.clone());
        Ok(node)
    }

    /// Returns the synthesized message-id enum node, available once the
    /// message-header composite has been validated.
    #[must_use]
    pub fn msg_id_enum_node(&self) -> Option<&Element> {
        self.msg_id_enum.as_ref()
    }

    fn type_node_mut(&mut self, name: &str) -> Option<&mut TypeNode> {
        if let Some(ty) = self.types.get_mut(name) {
            return Some(ty);
        }
        if let Some(ty) = self.builtins.get_mut(name) {
            return Some(ty);
        }
        self.paddings.get_mut(name)
    }

    pub(crate) fn record_data_use(&mut self, name: &str) {
        if let Some(c) = self.types.get_mut(name).and_then(TypeNode::composite_mut) {
            c.record_data_use();
        }
    }

    pub(crate) fn record_normal_use(&mut self, name: &str) {
        if let Some(ty) = self.type_node_mut(name) {
            ty.record_normal_use();
        }
    }

    pub(crate) fn record_group_size_use(&mut self, name: &str) {
        if let Some(ty) = self.type_node_mut(name) {
            ty.record_group_size_use();
        }
    }

    /// Records that some group requires the group-list helper.
    pub(crate) fn record_group_list_usage(&mut self) {
        self.group_list_used = true;
    }

    /// Returns true when any group recorded its use of the group-list
    /// helper.
    #[must_use]
    pub fn is_group_list_recorded(&self) -> bool {
        self.group_list_used
    }

    /// Returns true when any padding type was synthesized.
    #[must_use]
    pub fn is_padding_recorded(&self) -> bool {
        !self.paddings.is_empty()
    }

    /// Returns true when the element introduced at `since_version` is
    /// active under the effective schema version.
    #[must_use]
    pub fn does_element_exist(&self, since_version: u32) -> bool {
        since_version <= self.schema_version
    }

    /// Returns the schema metadata.
    #[must_use]
    pub fn schema(&self) -> &MessageSchema {
        &self.schema
    }

    /// Returns the numeric schema id.
    #[must_use]
    pub fn schema_id(&self) -> u32 {
        self.schema.id
    }

    /// Returns the effective schema version (declared, possibly lowered by
    /// the forced-version option).
    #[must_use]
    pub fn schema_version(&self) -> u32 {
        self.schema_version
    }

    /// Returns the minimal supported remote version.
    #[must_use]
    pub fn min_remote_version(&self) -> u32 {
        self.min_remote_version
    }

    /// Returns the encoded byte order.
    #[must_use]
    pub fn endian(&self) -> ByteOrder {
        self.schema.byte_order
    }

    /// Returns the protocol namespace (package name or override, spaces
    /// replaced with underscores).
    #[must_use]
    pub fn protocol_namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the output directory for emitters.
    #[must_use]
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Returns the comms library tag forwarded to build metadata.
    #[must_use]
    pub fn cc_tag(&self) -> &str {
        &self.cc_tag
    }

    /// Returns the name of the user-defined open-framing-header composite.
    #[must_use]
    pub fn open_framing_header_name(&self) -> Option<&str> {
        self.sofh_name.as_deref()
    }

    /// Returns the name of the message-header composite.
    #[must_use]
    pub fn message_header_type(&self) -> &str {
        &self.schema.header_type
    }

    /// Iterates over declared types in declaration order.
    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.type_order.iter().filter_map(|n| self.types.get(n))
    }

    /// Returns the messages in declaration order.
    #[must_use]
    pub fn messages(&self) -> &[MessageNode] {
        &self.messages
    }

    /// Iterates over messages in ascending id order.
    pub fn messages_by_id(&self) -> impl Iterator<Item = &MessageNode> {
        self.messages_by_id.values().map(|idx| &self.messages[*idx])
    }

    /// Looks up a message by name.
    #[must_use]
    pub fn message_by_name(&self, name: &str) -> Option<&MessageNode> {
        self.message_index.get(name).map(|idx| &self.messages[*idx])
    }

    /// Returns the names of all builtins instantiated during parsing, in
    /// name order.
    #[must_use]
    pub fn used_builtin_types(&self) -> Vec<&str> {
        self.builtins.keys().map(String::as_str).collect()
    }

    /// Iterates over synthesized padding types in name order.
    pub fn padding_types(&self) -> impl Iterator<Item = &TypeNode> {
        self.paddings.values()
    }
}

#[cfg(test)]
impl Database {
    pub(crate) fn for_tests(config: &Config, version: u32) -> Self {
        let schema = MessageSchema {
            package: "test".to_string(),
            id: 1,
            version,
            semantic_version: None,
            description: None,
            byte_order: ByteOrder::LittleEndian,
            header_type: "messageHeader".to_string(),
        };
        Self::new(schema, config).expect("test database")
    }

    pub(crate) fn insert_type_for_tests(&mut self, ty: TypeNode) {
        let name = ty.name().to_string();
        self.type_order.push(name.clone());
        self.types.insert(name, ty);
    }

    pub(crate) fn parse_recorded_types_for_tests(&mut self) -> Result<()> {
        self.parse_all_types()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldKind;

    const SIMPLE_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbe:messageSchema xmlns:sbe="http://fixprotocol.io/2016/sbe"
                   package="test proto" id="7" version="2" byteOrder="littleEndian">
    <types>
        <type name="Qty" primitiveType="uint32"/>
        <composite name="groupSizeEncoding">
            <type name="blockLength" primitiveType="uint16"/>
            <type name="numInGroup" primitiveType="uint16"/>
        </composite>
        <composite name="varData">
            <type name="length" primitiveType="uint16"/>
            <type name="varData" primitiveType="uint8" length="0"/>
        </composite>
        <enum name="Side" encodingType="uint8">
            <validValue name="Buy">1</validValue>
            <validValue name="Sell">2</validValue>
        </enum>
    </types>
    <message name="Order" id="1">
        <field name="qty" type="Qty"/>
        <field name="side" type="Side"/>
        <group name="legs" dimensionType="groupSizeEncoding">
            <field name="legQty" type="uint32"/>
        </group>
        <data name="note" type="varData"/>
    </message>
    <message name="Cancel" id="2">
        <field name="qty" type="Qty"/>
    </message>
</sbe:messageSchema>"#;

    #[test]
    fn test_parse_simple_schema() {
        let db = parse_schema_str(SIMPLE_SCHEMA, &Config::default()).unwrap();

        assert_eq!(db.schema_id(), 7);
        assert_eq!(db.schema_version(), 2);
        assert_eq!(db.protocol_namespace(), "test_proto");
        assert_eq!(db.endian(), ByteOrder::LittleEndian);

        assert!(db.find_type("Qty").is_some());
        assert!(db.find_type("Side").is_some());
        assert_eq!(db.messages().len(), 2);
        assert!(db.is_group_list_recorded());

        let order = db.message_by_name("Order").unwrap();
        assert_eq!(order.fields().len(), 4);
        assert_eq!(order.fields()[2].kind(), FieldKind::Group);
    }

    #[test]
    fn test_types_in_declaration_order() {
        let db = parse_schema_str(SIMPLE_SCHEMA, &Config::default()).unwrap();
        let names: Vec<_> = db.types().map(TypeNode::name).collect();
        assert_eq!(names, vec!["Qty", "groupSizeEncoding", "varData", "Side"]);
    }

    #[test]
    fn test_messages_by_id_order() {
        let db = parse_schema_str(SIMPLE_SCHEMA, &Config::default()).unwrap();
        let ids: Vec<_> = db.messages_by_id().map(MessageNode::id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_parse_twice_is_structurally_identical() {
        let db1 = parse_schema_str(SIMPLE_SCHEMA, &Config::default()).unwrap();
        let db2 = parse_schema_str(SIMPLE_SCHEMA, &Config::default()).unwrap();

        let names1: Vec<_> = db1.types().map(TypeNode::name).collect();
        let names2: Vec<_> = db2.types().map(TypeNode::name).collect();
        assert_eq!(names1, names2);

        let lens1: Vec<_> = db1.types().map(TypeNode::serialization_length).collect();
        let lens2: Vec<_> = db2.types().map(TypeNode::serialization_length).collect();
        assert_eq!(lens1, lens2);

        assert_eq!(
            db1.used_builtin_types(),
            db2.used_builtin_types()
        );
    }

    #[test]
    fn test_missing_root_rejected() {
        let err = parse_schema_str("<foo/>", &Config::default()).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidStructure { .. }));
    }

    #[test]
    fn test_malformed_xml_rejected() {
        assert!(matches!(
            parse_schema_str("<not xml", &Config::default()),
            Err(SchemaError::Xml(_))
        ));
    }

    #[test]
    fn test_duplicate_type_rejected() {
        let xml = r#"<messageSchema package="p" id="1" version="1">
            <types>
                <type name="Qty" primitiveType="uint32"/>
                <type name="Qty" primitiveType="uint16"/>
            </types>
        </messageSchema>"#;
        assert!(matches!(
            parse_schema_str(xml, &Config::default()),
            Err(SchemaError::DuplicateDefinition { .. })
        ));
    }

    #[test]
    fn test_duplicate_message_id_rejected() {
        let xml = r#"<messageSchema package="p" id="1" version="1">
            <types>
                <type name="Qty" primitiveType="uint32"/>
            </types>
            <message name="A" id="1"><field name="q" type="Qty"/></message>
            <message name="B" id="1"><field name="q" type="Qty"/></message>
        </messageSchema>"#;
        assert!(matches!(
            parse_schema_str(xml, &Config::default()),
            Err(SchemaError::DuplicateMessageId { .. })
        ));
    }

    #[test]
    fn test_forced_version_filters_declarations() {
        let xml = r#"<messageSchema package="p" id="1" version="3">
            <types>
                <type name="A" primitiveType="uint32"/>
                <type name="B" primitiveType="uint32" sinceVersion="2"/>
                <type name="C" primitiveType="uint32" sinceVersion="3"/>
            </types>
            <message name="M" id="1">
                <field name="a" type="A"/>
            </message>
            <message name="N" id="2" sinceVersion="2">
                <field name="a" type="A"/>
            </message>
        </messageSchema>"#;

        let config = Config {
            force_version: Some(1),
            min_remote_version: 5,
            ..Config::default()
        };
        let db = parse_schema_str(xml, &config).unwrap();

        assert_eq!(db.schema_version(), 1);
        assert!(db.find_type("A").is_some());
        assert!(db.find_type("B").is_none());
        assert!(db.find_type("C").is_none());
        assert!(db.message_by_name("N").is_none());
        // Clamped by the effective schema version.
        assert_eq!(db.min_remote_version(), 1);
    }

    #[test]
    fn test_forced_version_above_declared_rejected() {
        let xml = r#"<messageSchema package="p" id="1" version="1"><types/></messageSchema>"#;
        let config = Config {
            force_version: Some(2),
            ..Config::default()
        };
        assert!(matches!(
            parse_schema_str(xml, &config),
            Err(SchemaError::Versioning { .. })
        ));
    }

    #[test]
    fn test_namespace_override() {
        let xml = r#"<messageSchema package="some pkg" id="1" version="1"><types/></messageSchema>"#;

        let db = parse_schema_str(xml, &Config::default()).unwrap();
        assert_eq!(db.protocol_namespace(), "some_pkg");

        let config = Config {
            namespace: Some("custom".to_string()),
            ..Config::default()
        };
        let db = parse_schema_str(xml, &config).unwrap();
        assert_eq!(db.protocol_namespace(), "custom");
    }

    #[test]
    fn test_message_header_transmutation() {
        let xml = r#"<messageSchema package="p" id="42" version="3" headerType="messageHeader">
            <types>
                <type name="Qty" primitiveType="uint32"/>
                <composite name="messageHeader">
                    <type name="blockLength" primitiveType="uint16"/>
                    <type name="templateId" primitiveType="uint16"/>
                    <type name="schemaId" primitiveType="uint16"/>
                    <type name="version" primitiveType="uint16"/>
                </composite>
            </types>
            <message name="M1" id="1"><field name="q" type="Qty"/></message>
            <message name="M2" id="2"><field name="q" type="Qty"/></message>
        </messageSchema>"#;

        let db = parse_schema_str(xml, &Config::default()).unwrap();

        let header = db.find_type("messageHeader").unwrap();
        let c = header.as_composite().unwrap();
        assert_eq!(c.members().len(), 4);

        let template_id = c
            .members()
            .iter()
            .find(|m| m.name() == "templateId")
            .unwrap();
        let e = template_id.as_enum().unwrap();
        assert!(e.msg_id);
        assert_eq!(e.numeric_value("M1"), Some(1));
        assert_eq!(e.numeric_value("M2"), Some(2));

        let schema_id = c.members().iter().find(|m| m.name() == "schemaId").unwrap();
        assert!(schema_id
            .extra_options()
            .iter()
            .any(|o| o == "comms::option::DefaultNumValue<42>"));
        assert!(schema_id
            .extra_options()
            .iter()
            .any(|o| o.contains("FailOnInvalid")));

        let version = c.members().iter().find(|m| m.name() == "version").unwrap();
        assert!(version
            .extra_options()
            .iter()
            .any(|o| o == "comms::option::DefaultNumValue<3>"));

        assert!(db.msg_id_enum_node().is_some());
    }

    #[test]
    fn test_message_header_wrong_shape_rejected() {
        let xml = r#"<messageSchema package="p" id="42" version="1" headerType="messageHeader">
            <types>
                <composite name="messageHeader">
                    <type name="blockLength" primitiveType="uint16"/>
                    <type name="templateId" primitiveType="uint16"/>
                </composite>
            </types>
        </messageSchema>"#;
        assert!(matches!(
            parse_schema_str(xml, &Config::default()),
            Err(SchemaError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_recursive_refs_rejected() {
        let xml = r#"<messageSchema package="p" id="1" version="1">
            <types>
                <ref name="A" type="B"/>
                <ref name="B" type="A"/>
            </types>
        </messageSchema>"#;
        assert!(matches!(
            parse_schema_str(xml, &Config::default()),
            Err(SchemaError::RecursiveDependency { .. })
        ));
    }

    #[test]
    fn test_ref_to_later_declaration_resolves() {
        let xml = r#"<messageSchema package="p" id="1" version="1">
            <types>
                <ref name="QtyRef" type="Qty"/>
                <type name="Qty" primitiveType="uint32"/>
            </types>
        </messageSchema>"#;
        let db = parse_schema_str(xml, &Config::default()).unwrap();
        assert_eq!(
            db.find_type("QtyRef").unwrap().serialization_length(),
            db.find_type("Qty").unwrap().serialization_length()
        );
    }

    #[test]
    fn test_sofh_name_validated() {
        let xml = r#"<messageSchema package="p" id="1" version="1">
            <types>
                <composite name="sofh">
                    <type name="length" primitiveType="uint32"/>
                    <type name="encoding" primitiveType="uint16"/>
                </composite>
            </types>
        </messageSchema>"#;

        let config = Config {
            sofh_name: Some("sofh".to_string()),
            ..Config::default()
        };
        assert!(parse_schema_str(xml, &config).is_ok());

        let config = Config {
            sofh_name: Some("missing".to_string()),
            ..Config::default()
        };
        assert!(parse_schema_str(xml, &config).is_err());
    }

    #[test]
    fn test_builtins_recorded_on_demand() {
        let xml = r#"<messageSchema package="p" id="1" version="1">
            <types/>
            <message name="M" id="1">
                <field name="a" type="uint8"/>
                <field name="b" type="double"/>
            </message>
        </messageSchema>"#;
        let db = parse_schema_str(xml, &Config::default()).unwrap();
        assert_eq!(db.used_builtin_types(), vec!["double", "uint8"]);
    }

    #[test]
    fn test_unexpected_top_level_element_ignored() {
        let xml = r#"<messageSchema package="p" id="1" version="1">
            <types/>
            <banana/>
        </messageSchema>"#;
        assert!(parse_schema_str(xml, &Config::default()).is_ok());
    }
}
