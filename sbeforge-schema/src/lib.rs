//! # sbeforge-schema
//!
//! SBE XML schema compiler front end for sbeforge.
//!
//! This crate provides:
//! - XML schema parsing into a central schema database
//! - A polymorphic type model (basic, composite, enum, set, ref) with
//!   validation, layout computation, and padding synthesis
//! - A field model (basic, group, data) bound to messages
//! - Lowering queries and the read-only interface consumed by code emitters
//!
//! The entry point is [`parse_schema`] (or [`parse_schema_str`] for
//! in-memory content), which runs the record/parse phases and returns the
//! immutable [`Database`].

pub mod common;
pub mod config;
pub mod database;
pub mod emit;
pub mod error;
pub mod fields;
pub mod messages;
pub mod props;
pub mod schema;
pub mod types;
pub mod xml;

pub use config::Config;
pub use database::{Database, parse_schema, parse_schema_str};
pub use error::{Result, SchemaError};
pub use fields::{BasicField, DataField, FieldKind, FieldLowering, FieldNode, GroupField, TypeRef};
pub use messages::MessageNode;
pub use schema::{ByteOrder, MessageSchema};
pub use types::{
    BasicLowering, BasicType, CompositeType, EnumType, ExtraOptInfo, OptMode, Presence, RefType,
    SetType, TypeKind, TypeNode,
};
