//! SPARQL UPDATE handling for the dual-write path.
//!
//! Queries are not interpreted here: SELECT/CONSTRUCT/ASK go to the index
//! verbatim through the [`crate::index::IndexClient`]. This module only
//! turns UPDATE strings into typed operations the coordinator can apply
//! to both backends.

pub mod update;

pub use update::{
    ParsedUpdate, UpdateOperation, UpdateParseError, UpdateParseResult, UpdateParser,
};
