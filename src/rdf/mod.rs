//! RDF data model for the hybrid store.
//!
//! Terms wrap the oxrdf primitives; quads always carry a named graph; the
//! wire module owns every conversion between typed terms and their SPARQL
//! serializations.

pub mod term;
pub mod vocab;
pub mod wire;

pub use term::{
    escape_literal, BlankNode, Literal, NamedNode, Quad, RdfError, RdfObject, RdfPredicate,
    RdfResult, RdfSubject, TermKind, Triple,
};
pub use wire::TermInfo;
