//! SPARQL UPDATE parsing for the dual-write path.
//!
//! An update string is classified into exactly one typed operation whose
//! quad lists are fully concrete, ready to apply to the primary store.
//! Pattern-based deletes are resolved against the index at parse time and
//! frozen, so a retried operation always deletes the same quads.

use crate::index::{IndexClient, IndexError, SelectBinding};
use crate::rdf::{BlankNode, Literal, NamedNode, Quad, RdfObject, RdfPredicate, RdfSubject};
use spargebra::algebra::{GraphPattern, GraphTarget};
use spargebra::term::{
    GraphName, GraphNamePattern, GroundQuad, GroundQuadPattern, GroundSubject, GroundTerm,
    GroundTermPattern, NamedNodePattern, QuadPattern, Subject, Term, TermPattern, TriplePattern,
    Variable,
};
use spargebra::{GraphUpdateOperation, Query, Update};
use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Update parsing errors. All of these are fatal to the operation and are
/// never retried.
#[derive(Error, Debug)]
pub enum UpdateParseError {
    /// Not valid SPARQL UPDATE syntax
    #[error("SPARQL syntax error: {0}")]
    Syntax(String),

    /// `DELETE WHERE { ... }` shorthand
    #[error("DELETE WHERE is not supported; use DELETE {{ ... }} WHERE {{ ... }}")]
    DeleteWhere,

    /// The request contained zero or more than one operation
    #[error("Expected exactly one update operation, found {0}")]
    OperationCount(usize),

    /// An operation kind outside the supported set (LOAD, DROP ALL, ...)
    #[error("Unsupported update operation: {0}")]
    Unsupported(String),

    /// A quad addressed the default graph
    #[error("Every quad must name a graph; the default graph is not writable")]
    DefaultGraph,

    /// A Modify INSERT template contained variables or blank nodes
    #[error("INSERT template must be ground: {0}")]
    NonGroundInsert(String),

    /// A DELETE-template variable was not bound by the WHERE solution
    #[error("Variable ?{0} is not bound by the WHERE clause")]
    UnboundVariable(String),

    /// RDF-star terms are not part of the data model
    #[error("RDF-star terms are not supported")]
    RdfStar,

    /// A resolved binding put a literal in subject or graph position
    #[error("Invalid term for position: {0}")]
    InvalidTerm(String),

    /// Pattern resolution against the index failed
    #[error("Pattern resolution failed: {0}")]
    Resolution(#[from] IndexError),
}

pub type UpdateParseResult<T> = Result<T, UpdateParseError>;

/// A typed, fully-resolved update operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOperation {
    /// `INSERT DATA`
    InsertData { quads: Vec<Quad> },
    /// `DELETE DATA`
    DeleteData { quads: Vec<Quad> },
    /// `DELETE { } INSERT { } WHERE { }` with both sides concrete
    Modify {
        delete_quads: Vec<Quad>,
        insert_quads: Vec<Quad>,
    },
    /// `DROP GRAPH <g>`
    DropGraph { graph: NamedNode },
    /// `CLEAR GRAPH <g>`
    ClearGraph { graph: NamedNode },
    /// `CREATE GRAPH <g>`
    CreateGraph { graph: NamedNode },
}

impl UpdateOperation {
    /// Short operation tag for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateOperation::InsertData { .. } => "insert_data",
            UpdateOperation::DeleteData { .. } => "delete_data",
            UpdateOperation::Modify { .. } => "modify",
            UpdateOperation::DropGraph { .. } => "drop_graph",
            UpdateOperation::ClearGraph { .. } => "clear_graph",
            UpdateOperation::CreateGraph { .. } => "create_graph",
        }
    }

    /// Quads this operation inserts.
    pub fn insert_quads(&self) -> &[Quad] {
        match self {
            UpdateOperation::InsertData { quads } => quads,
            UpdateOperation::Modify { insert_quads, .. } => insert_quads,
            _ => &[],
        }
    }

    /// Quads this operation deletes.
    pub fn delete_quads(&self) -> &[Quad] {
        match self {
            UpdateOperation::DeleteData { quads } => quads,
            UpdateOperation::Modify { delete_quads, .. } => delete_quads,
            _ => &[],
        }
    }

    /// Distinct graph URIs referenced by the INSERT side, for
    /// auto-registration before the write.
    pub fn insert_graph_uris(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut uris = Vec::new();
        for quad in self.insert_quads() {
            let uri = quad.graph.as_str().to_string();
            if seen.insert(uri.clone()) {
                uris.push(uri);
            }
        }
        uris
    }
}

/// A parsed update together with the raw text it came from.
#[derive(Debug, Clone)]
pub struct ParsedUpdate {
    pub operation: UpdateOperation,
    pub raw_update: String,
}

/// SPARQL UPDATE parser.
///
/// Holds an index client because Modify operations resolve their DELETE
/// templates by querying the target space's current state.
pub struct UpdateParser {
    index: Arc<IndexClient>,
}

impl UpdateParser {
    pub fn new(index: Arc<IndexClient>) -> Self {
        Self { index }
    }

    /// Parse one SPARQL UPDATE into a typed operation with concrete quads.
    pub async fn parse(&self, space_id: &str, raw_update: &str) -> UpdateParseResult<ParsedUpdate> {
        let raw_update = raw_update.trim();
        if has_delete_where_form(raw_update) {
            return Err(UpdateParseError::DeleteWhere);
        }

        let parsed = Update::parse(raw_update, None)
            .map_err(|e| UpdateParseError::Syntax(e.to_string()))?;
        if parsed.operations.len() != 1 {
            return Err(UpdateParseError::OperationCount(parsed.operations.len()));
        }

        let operation = match &parsed.operations[0] {
            GraphUpdateOperation::InsertData { data } => UpdateOperation::InsertData {
                quads: data.iter().map(convert_quad).collect::<Result<_, _>>()?,
            },
            GraphUpdateOperation::DeleteData { data } => UpdateOperation::DeleteData {
                quads: data
                    .iter()
                    .map(convert_ground_quad)
                    .collect::<Result<_, _>>()?,
            },
            GraphUpdateOperation::DeleteInsert {
                delete,
                insert,
                pattern,
                ..
            } => {
                let insert_quads = insert
                    .iter()
                    .map(convert_ground_template)
                    .collect::<Result<_, _>>()?;
                let delete_quads = self
                    .resolve_delete_templates(space_id, delete, pattern)
                    .await?;
                UpdateOperation::Modify {
                    delete_quads,
                    insert_quads,
                }
            }
            GraphUpdateOperation::Drop { graph, .. } => UpdateOperation::DropGraph {
                graph: graph_target_iri(graph)?,
            },
            GraphUpdateOperation::Clear { graph, .. } => UpdateOperation::ClearGraph {
                graph: graph_target_iri(graph)?,
            },
            GraphUpdateOperation::Create { graph, .. } => UpdateOperation::CreateGraph {
                graph: NamedNode::from(graph.clone()),
            },
            GraphUpdateOperation::Load { .. } => {
                return Err(UpdateParseError::Unsupported("LOAD".into()))
            }
        };

        debug!(
            space_id,
            kind = operation.kind(),
            inserts = operation.insert_quads().len(),
            deletes = operation.delete_quads().len(),
            "SPARQL UPDATE parsed"
        );
        Ok(ParsedUpdate {
            operation,
            raw_update: raw_update.to_string(),
        })
    }

    /// Resolve a Modify's DELETE templates into concrete quads.
    ///
    /// A SELECT binding every variable that appears in the DELETE or WHERE
    /// clauses runs against the index; each solution is substituted into
    /// the templates. A fully-ground template degenerates to an ASK on the
    /// WHERE pattern. The result is deduplicated and frozen.
    async fn resolve_delete_templates(
        &self,
        space_id: &str,
        delete: &[GroundQuadPattern],
        pattern: &GraphPattern,
    ) -> UpdateParseResult<Vec<Quad>> {
        if delete.is_empty() {
            return Ok(Vec::new());
        }

        let mut variables = BTreeSet::new();
        for template in delete {
            collect_template_variables(template, &mut variables);
        }
        collect_pattern_variables(pattern, &mut variables);

        if variables.is_empty() {
            // Ground template: deletes apply iff the WHERE pattern matches.
            let ask = Query::Ask {
                dataset: None,
                pattern: pattern.clone(),
                base_iri: None,
            };
            if self.index.ask(space_id, &ask.to_string()).await? {
                return delete.iter().map(|t| substitute(t, None)).collect();
            }
            return Ok(Vec::new());
        }

        let select = build_resolution_select(&variables, pattern);
        debug!(space_id, query = %select, "Resolving DELETE templates");
        let bindings = self.index.select(space_id, &select).await?;

        let mut seen = HashSet::new();
        let mut resolved = Vec::new();
        for binding in &bindings {
            for template in delete {
                let quad = substitute(template, Some(binding))?;
                if seen.insert(quad.clone()) {
                    resolved.push(quad);
                }
            }
        }
        debug!(
            space_id,
            solutions = bindings.len(),
            quads = resolved.len(),
            "DELETE templates resolved"
        );
        Ok(resolved)
    }
}

/// Serialize the SELECT used for template resolution.
fn build_resolution_select(variables: &BTreeSet<Variable>, pattern: &GraphPattern) -> String {
    let query = Query::Select {
        dataset: None,
        pattern: GraphPattern::Project {
            inner: Box::new(pattern.clone()),
            variables: variables.iter().cloned().collect(),
        },
        base_iri: None,
    };
    query.to_string()
}

/// Lexical scan for the unsupported `DELETE WHERE { ... }` shorthand.
///
/// The algebra normalizes the shorthand into the same shape as an explicit
/// DELETE/WHERE, so the raw token stream is inspected instead: a `DELETE`
/// keyword immediately followed by `WHERE`. Comments, string literals, and
/// IRIs are skipped so their contents cannot trigger a false match.
fn has_delete_where_form(raw: &str) -> bool {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '#' => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        break;
                    }
                }
            }
            '"' | '\'' => {
                let quote = c;
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == quote {
                        break;
                    }
                }
            }
            '<' => {
                for c in chars.by_ref() {
                    if c == '>' {
                        break;
                    }
                }
            }
            c if c.is_alphanumeric() || c == '_' => current.push(c),
            _ => {
                if !current.is_empty() {
                    words.push(current.to_uppercase());
                    current.clear();
                }
            }
        }
    }
    if !current.is_empty() {
        words.push(current.to_uppercase());
    }
    words
        .windows(2)
        .any(|pair| pair[0] == "DELETE" && pair[1] == "WHERE")
}

// --- term conversions ---

fn convert_subject(subject: &Subject) -> UpdateParseResult<RdfSubject> {
    match subject {
        Subject::NamedNode(n) => Ok(NamedNode::from(n.clone()).into()),
        Subject::BlankNode(b) => Ok(BlankNode::from(b.clone()).into()),
        #[allow(unreachable_patterns)]
        _ => Err(UpdateParseError::RdfStar),
    }
}

fn convert_term(term: &Term) -> UpdateParseResult<RdfObject> {
    match term {
        Term::NamedNode(n) => Ok(NamedNode::from(n.clone()).into()),
        Term::BlankNode(b) => Ok(BlankNode::from(b.clone()).into()),
        Term::Literal(l) => Ok(Literal::from(l.clone()).into()),
        #[allow(unreachable_patterns)]
        _ => Err(UpdateParseError::RdfStar),
    }
}

fn convert_graph_name(graph: &GraphName) -> UpdateParseResult<NamedNode> {
    match graph {
        GraphName::NamedNode(n) => Ok(NamedNode::from(n.clone())),
        GraphName::DefaultGraph => Err(UpdateParseError::DefaultGraph),
        #[allow(unreachable_patterns)]
        other => Err(UpdateParseError::InvalidTerm(format!(
            "graph name {other:?}"
        ))),
    }
}

fn convert_quad(quad: &spargebra::term::Quad) -> UpdateParseResult<Quad> {
    Ok(Quad::new(
        convert_subject(&quad.subject)?,
        RdfPredicate::from(NamedNode::from(quad.predicate.clone())),
        convert_term(&quad.object)?,
        convert_graph_name(&quad.graph_name)?,
    ))
}

fn convert_ground_quad(quad: &GroundQuad) -> UpdateParseResult<Quad> {
    let subject = match &quad.subject {
        GroundSubject::NamedNode(n) => RdfSubject::from(NamedNode::from(n.clone())),
        #[allow(unreachable_patterns)]
        _ => return Err(UpdateParseError::RdfStar),
    };
    let object = match &quad.object {
        GroundTerm::NamedNode(n) => RdfObject::from(NamedNode::from(n.clone())),
        GroundTerm::Literal(l) => RdfObject::from(Literal::from(l.clone())),
        #[allow(unreachable_patterns)]
        _ => return Err(UpdateParseError::RdfStar),
    };
    Ok(Quad::new(
        subject,
        RdfPredicate::from(NamedNode::from(quad.predicate.clone())),
        object,
        convert_graph_name(&quad.graph_name)?,
    ))
}

/// Convert a Modify INSERT template, which must be fully ground.
fn convert_ground_template(pattern: &QuadPattern) -> UpdateParseResult<Quad> {
    let subject = match &pattern.subject {
        TermPattern::NamedNode(n) => RdfSubject::from(NamedNode::from(n.clone())),
        TermPattern::BlankNode(b) => RdfSubject::from(BlankNode::from(b.clone())),
        TermPattern::Variable(v) => {
            return Err(UpdateParseError::NonGroundInsert(format!("?{}", v.as_str())))
        }
        #[allow(unreachable_patterns)]
        _ => return Err(UpdateParseError::RdfStar),
    };
    let predicate = match &pattern.predicate {
        NamedNodePattern::NamedNode(n) => RdfPredicate::from(NamedNode::from(n.clone())),
        NamedNodePattern::Variable(v) => {
            return Err(UpdateParseError::NonGroundInsert(format!("?{}", v.as_str())))
        }
    };
    let object = match &pattern.object {
        TermPattern::NamedNode(n) => RdfObject::from(NamedNode::from(n.clone())),
        TermPattern::BlankNode(b) => RdfObject::from(BlankNode::from(b.clone())),
        TermPattern::Literal(l) => RdfObject::from(Literal::from(l.clone())),
        TermPattern::Variable(v) => {
            return Err(UpdateParseError::NonGroundInsert(format!("?{}", v.as_str())))
        }
        #[allow(unreachable_patterns)]
        _ => return Err(UpdateParseError::RdfStar),
    };
    let graph = match &pattern.graph_name {
        GraphNamePattern::NamedNode(n) => NamedNode::from(n.clone()),
        GraphNamePattern::DefaultGraph => return Err(UpdateParseError::DefaultGraph),
        GraphNamePattern::Variable(v) => {
            return Err(UpdateParseError::NonGroundInsert(format!("?{}", v.as_str())))
        }
    };
    Ok(Quad::new(subject, predicate, object, graph))
}

fn graph_target_iri(target: &GraphTarget) -> UpdateParseResult<NamedNode> {
    match target {
        GraphTarget::NamedNode(n) => Ok(NamedNode::from(n.clone())),
        GraphTarget::DefaultGraph => Err(UpdateParseError::DefaultGraph),
        other => Err(UpdateParseError::Unsupported(format!(
            "graph target {other:?}"
        ))),
    }
}

// --- variable collection ---

fn collect_template_variables(template: &GroundQuadPattern, vars: &mut BTreeSet<Variable>) {
    for position in [&template.subject, &template.object] {
        if let GroundTermPattern::Variable(v) = position {
            vars.insert(v.clone());
        }
    }
    if let NamedNodePattern::Variable(v) = &template.predicate {
        vars.insert(v.clone());
    }
    if let GraphNamePattern::Variable(v) = &template.graph_name {
        vars.insert(v.clone());
    }
}

fn collect_triple_pattern_variables(pattern: &TriplePattern, vars: &mut BTreeSet<Variable>) {
    for position in [&pattern.subject, &pattern.object] {
        if let TermPattern::Variable(v) = position {
            vars.insert(v.clone());
        }
    }
    if let NamedNodePattern::Variable(v) = &pattern.predicate {
        vars.insert(v.clone());
    }
}

/// Walk a WHERE pattern and collect every variable it can bind.
fn collect_pattern_variables(pattern: &GraphPattern, vars: &mut BTreeSet<Variable>) {
    match pattern {
        GraphPattern::Bgp { patterns } => {
            for tp in patterns {
                collect_triple_pattern_variables(tp, vars);
            }
        }
        GraphPattern::Path {
            subject, object, ..
        } => {
            for position in [subject, object] {
                if let TermPattern::Variable(v) = position {
                    vars.insert(v.clone());
                }
            }
        }
        GraphPattern::Join { left, right }
        | GraphPattern::Union { left, right }
        | GraphPattern::Minus { left, right } => {
            collect_pattern_variables(left, vars);
            collect_pattern_variables(right, vars);
        }
        GraphPattern::LeftJoin { left, right, .. } => {
            collect_pattern_variables(left, vars);
            collect_pattern_variables(right, vars);
        }
        GraphPattern::Filter { inner, .. }
        | GraphPattern::Distinct { inner }
        | GraphPattern::Reduced { inner }
        | GraphPattern::Slice { inner, .. } => collect_pattern_variables(inner, vars),
        GraphPattern::OrderBy { inner, .. } => collect_pattern_variables(inner, vars),
        GraphPattern::Graph { name, inner } => {
            if let NamedNodePattern::Variable(v) = name {
                vars.insert(v.clone());
            }
            collect_pattern_variables(inner, vars);
        }
        GraphPattern::Extend {
            inner, variable, ..
        } => {
            vars.insert(variable.clone());
            collect_pattern_variables(inner, vars);
        }
        GraphPattern::Values { variables, .. } => {
            vars.extend(variables.iter().cloned());
        }
        GraphPattern::Project { inner, variables } => {
            vars.extend(variables.iter().cloned());
            collect_pattern_variables(inner, vars);
        }
        GraphPattern::Group {
            inner, variables, ..
        } => {
            vars.extend(variables.iter().cloned());
            collect_pattern_variables(inner, vars);
        }
        GraphPattern::Service { inner, name, .. } => {
            if let NamedNodePattern::Variable(v) = name {
                vars.insert(v.clone());
            }
            collect_pattern_variables(inner, vars);
        }
        #[allow(unreachable_patterns)]
        _ => {}
    }
}

// --- template substitution ---

fn bound_object(
    variable: &Variable,
    binding: Option<&SelectBinding>,
) -> UpdateParseResult<RdfObject> {
    binding
        .and_then(|b| b.get(variable.as_str()))
        .cloned()
        .ok_or_else(|| UpdateParseError::UnboundVariable(variable.as_str().to_string()))
}

fn substitute(
    template: &GroundQuadPattern,
    binding: Option<&SelectBinding>,
) -> UpdateParseResult<Quad> {
    let subject_term = match &template.subject {
        GroundTermPattern::NamedNode(n) => RdfObject::from(NamedNode::from(n.clone())),
        GroundTermPattern::Literal(l) => RdfObject::from(Literal::from(l.clone())),
        GroundTermPattern::Variable(v) => bound_object(v, binding)?,
        #[allow(unreachable_patterns)]
        _ => return Err(UpdateParseError::RdfStar),
    };
    let subject = match subject_term {
        RdfObject::NamedNode(n) => RdfSubject::from(n),
        RdfObject::BlankNode(b) => RdfSubject::from(b),
        RdfObject::Literal(l) => {
            return Err(UpdateParseError::InvalidTerm(format!(
                "literal subject {l}"
            )))
        }
    };

    let predicate = match &template.predicate {
        NamedNodePattern::NamedNode(n) => RdfPredicate::from(NamedNode::from(n.clone())),
        NamedNodePattern::Variable(v) => match bound_object(v, binding)? {
            RdfObject::NamedNode(n) => RdfPredicate::from(n),
            other => {
                return Err(UpdateParseError::InvalidTerm(format!(
                    "predicate {other}"
                )))
            }
        },
    };

    let object = match &template.object {
        GroundTermPattern::NamedNode(n) => RdfObject::from(NamedNode::from(n.clone())),
        GroundTermPattern::Literal(l) => RdfObject::from(Literal::from(l.clone())),
        GroundTermPattern::Variable(v) => bound_object(v, binding)?,
        #[allow(unreachable_patterns)]
        _ => return Err(UpdateParseError::RdfStar),
    };

    let graph = match &template.graph_name {
        GraphNamePattern::NamedNode(n) => NamedNode::from(n.clone()),
        GraphNamePattern::DefaultGraph => return Err(UpdateParseError::DefaultGraph),
        GraphNamePattern::Variable(v) => match bound_object(v, binding)? {
            RdfObject::NamedNode(n) => n,
            other => {
                return Err(UpdateParseError::InvalidTerm(format!("graph {other}")))
            }
        },
    };

    Ok(Quad::new(subject, predicate, object, graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delete_where_detection() {
        assert!(has_delete_where_form(
            "DELETE WHERE { GRAPH <urn:g> { ?s ?p ?o } }"
        ));
        assert!(has_delete_where_form("delete where { ?s ?p ?o }"));
        assert!(!has_delete_where_form(
            "DELETE { GRAPH <urn:g> { ?s ?p ?o } } WHERE { GRAPH <urn:g> { ?s ?p ?o } }"
        ));
        assert!(!has_delete_where_form(
            "INSERT DATA { GRAPH <urn:g> { <urn:a> <urn:p> \"DELETE WHERE\" } }"
        ));
        assert!(!has_delete_where_form(
            "# DELETE WHERE in a comment\nINSERT DATA { GRAPH <urn:g> { <urn:a> <urn:p> <urn:b> } }"
        ));
    }

    #[test]
    fn test_variable_collection_from_bgp() {
        let update = Update::parse(
            "DELETE { GRAPH <urn:g> { ?s <urn:p> ?o } } WHERE { GRAPH <urn:g> { ?s <urn:p> ?o . ?s <urn:q> ?x } }",
            None,
        )
        .unwrap();
        let GraphUpdateOperation::DeleteInsert {
            delete, pattern, ..
        } = &update.operations[0]
        else {
            panic!("expected DeleteInsert");
        };
        let mut vars = BTreeSet::new();
        for template in delete {
            collect_template_variables(template, &mut vars);
        }
        collect_pattern_variables(pattern, &mut vars);
        let names: Vec<&str> = vars.iter().map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["o", "s", "x"]);
    }

    #[test]
    fn test_resolution_select_binds_all_variables() {
        let update = Update::parse(
            "DELETE { GRAPH <urn:g> { ?s <urn:p> ?o } } WHERE { GRAPH <urn:g> { ?s <urn:p> ?o } }",
            None,
        )
        .unwrap();
        let GraphUpdateOperation::DeleteInsert {
            delete, pattern, ..
        } = &update.operations[0]
        else {
            panic!("expected DeleteInsert");
        };
        let mut vars = BTreeSet::new();
        for template in delete {
            collect_template_variables(template, &mut vars);
        }
        collect_pattern_variables(pattern, &mut vars);
        let select = build_resolution_select(&vars, pattern);
        assert!(select.starts_with("SELECT"));
        assert!(select.contains("?s"));
        assert!(select.contains("?o"));
        assert!(select.contains("GRAPH"));
    }

    #[test]
    fn test_substitute_binds_variables() {
        let update = Update::parse(
            "DELETE { GRAPH <urn:g> { ?s <urn:p> ?o } } WHERE { GRAPH <urn:g> { ?s <urn:p> ?o } }",
            None,
        )
        .unwrap();
        let GraphUpdateOperation::DeleteInsert { delete, .. } = &update.operations[0] else {
            panic!("expected DeleteInsert");
        };
        let mut binding = SelectBinding::new();
        binding.insert(
            "s".to_string(),
            RdfObject::from(NamedNode::new("urn:subject").unwrap()),
        );
        binding.insert(
            "o".to_string(),
            RdfObject::from(Literal::new_simple_literal("value")),
        );
        let quad = substitute(&delete[0], Some(&binding)).unwrap();
        assert_eq!(quad.subject.value(), "urn:subject");
        assert_eq!(quad.predicate.as_str(), "urn:p");
        assert_eq!(quad.object.value(), "value");
        assert_eq!(quad.graph.as_str(), "urn:g");
    }

    #[test]
    fn test_substitute_rejects_unbound_variable() {
        let update = Update::parse(
            "DELETE { GRAPH <urn:g> { ?s <urn:p> ?o } } WHERE { GRAPH <urn:g> { ?s <urn:p> ?o } }",
            None,
        )
        .unwrap();
        let GraphUpdateOperation::DeleteInsert { delete, .. } = &update.operations[0] else {
            panic!("expected DeleteInsert");
        };
        let binding = SelectBinding::new();
        assert!(matches!(
            substitute(&delete[0], Some(&binding)),
            Err(UpdateParseError::UnboundVariable(_))
        ));
    }
}
