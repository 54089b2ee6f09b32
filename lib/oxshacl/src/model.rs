use crate::constraint::{Constraint, NodeKind};
use crate::error::ShapeDefinitionError;
use crate::vocab::shacl;
use oxrdf::vocab::rdf;
use oxrdf::{BlankNode, Graph, Literal, NamedNode, NamedNodeRef, Subject, SubjectRef, Term, TermRef};
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::BTreeMap;
use std::fmt;

/// The identifier of a shape: a named node or a blank node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShapeId {
    /// A shape identified by an IRI.
    Named(NamedNode),
    /// A shape identified by a blank node.
    Blank(BlankNode),
}

impl ShapeId {
    /// Builds a shape identifier from a graph subject.
    ///
    /// Returns `None` for subjects that cannot identify a shape.
    pub fn from_subject(subject: SubjectRef<'_>) -> Option<Self> {
        if let SubjectRef::NamedNode(node) = subject {
            Some(Self::Named(node.into_owned()))
        } else if let SubjectRef::BlankNode(node) = subject {
            Some(Self::Blank(node.into_owned()))
        } else {
            None
        }
    }

    /// Returns this identifier as a term.
    pub fn to_term(&self) -> Term {
        match self {
            Self::Named(node) => node.clone().into(),
            Self::Blank(node) => node.clone().into(),
        }
    }

    /// Returns this identifier as a borrowed graph subject.
    pub fn as_subject_ref(&self) -> SubjectRef<'_> {
        match self {
            Self::Named(node) => node.as_ref().into(),
            Self::Blank(node) => node.as_ref().into(),
        }
    }
}

impl From<NamedNode> for ShapeId {
    fn from(node: NamedNode) -> Self {
        Self::Named(node)
    }
}

impl From<BlankNode> for ShapeId {
    fn from(node: BlankNode) -> Self {
        Self::Blank(node)
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(node) => node.fmt(f),
            Self::Blank(node) => node.fmt(f),
        }
    }
}

/// A target declaration selecting the focus subjects of a node shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// `sh:targetClass` — every subject with a direct `rdf:type` fact for the class.
    Class(NamedNode),
    /// `sh:targetNode` — the node itself, present in the data graph or not.
    Node(Subject),
    /// Every subject of the data graph.
    ///
    /// Used when a shape declares no explicit target.
    All,
}

impl Target {
    /// Collects the focus subjects this target selects from a data graph.
    pub fn focus_subjects(&self, graph: &Graph) -> Vec<Subject> {
        match self {
            Self::Class(class) => graph
                .subjects_for_predicate_object(rdf::TYPE, class.as_ref())
                .map(SubjectRef::into_owned)
                .collect(),
            Self::Node(node) => vec![node.clone()],
            Self::All => all_subjects(graph),
        }
    }
}

/// A node shape: targets plus the property shapes its focus subjects are
/// validated against.
#[derive(Debug, Clone)]
pub struct NodeShape {
    id: ShapeId,
    targets: Vec<Target>,
    property_shapes: Vec<PropertyShape>,
    labels: BTreeMap<String, String>,
    messages: BTreeMap<String, String>,
}

impl NodeShape {
    /// Returns the identifier of this shape.
    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    /// Returns the target declarations of this shape.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Returns the property shapes of this shape in deterministic order.
    pub fn property_shapes(&self) -> &[PropertyShape] {
        &self.property_shapes
    }

    /// Returns the `sh:name` label for a language, falling back to the untagged label.
    pub fn label(&self, language: &str) -> Option<&str> {
        lookup_language(&self.labels, language)
    }

    /// Returns the `sh:message` text for a language, falling back to the untagged message.
    pub fn message(&self, language: &str) -> Option<&str> {
        lookup_language(&self.messages, language)
    }

    /// Returns all `sh:message` texts of this shape keyed by language tag.
    pub fn messages(&self) -> &BTreeMap<String, String> {
        &self.messages
    }
}

/// A property shape: constraints on the values reachable from the focus
/// subject through a single predicate.
#[derive(Debug, Clone)]
pub struct PropertyShape {
    id: ShapeId,
    node_shape: ShapeId,
    path: NamedNode,
    constraints: Vec<Constraint>,
    labels: BTreeMap<String, String>,
    messages: BTreeMap<String, String>,
}

impl PropertyShape {
    /// Returns the identifier of this property shape.
    pub fn id(&self) -> &ShapeId {
        &self.id
    }

    /// Returns the identifier of the node shape declaring this property shape.
    pub fn node_shape(&self) -> &ShapeId {
        &self.node_shape
    }

    /// Returns the predicate whose values this property shape constrains.
    pub fn path(&self) -> &NamedNode {
        &self.path
    }

    /// Returns the constraints of this property shape in deterministic order.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// Returns the `sh:name` label for a language, falling back to the untagged label.
    pub fn label(&self, language: &str) -> Option<&str> {
        lookup_language(&self.labels, language)
    }

    /// Returns the `sh:message` text for a language, falling back to the untagged message.
    pub fn message(&self, language: &str) -> Option<&str> {
        lookup_language(&self.messages, language)
    }

    /// Returns all `sh:message` texts of this shape keyed by language tag.
    pub fn messages(&self) -> &BTreeMap<String, String> {
        &self.messages
    }
}

/// A non-fatal condition noticed while parsing a shapes graph.
///
/// Skipped declarations are reported here instead of failing the parse, so
/// embedders can log them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDiagnostic {
    /// A property shape was skipped because `sh:deactivated` is true.
    DeactivatedPropertyShape {
        /// The declaring node shape.
        node_shape: ShapeId,
        /// The skipped property shape.
        property_shape: ShapeId,
    },
    /// A property shape was skipped because it has no IRI value for `sh:path`.
    MissingPath {
        /// The declaring node shape.
        node_shape: ShapeId,
        /// The skipped property shape.
        property_shape: ShapeId,
    },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeactivatedPropertyShape {
                node_shape,
                property_shape,
            } => write!(
                f,
                "Property shape {property_shape} of {node_shape} is deactivated and was skipped"
            ),
            Self::MissingPath {
                node_shape,
                property_shape,
            } => write!(
                f,
                "Property shape {property_shape} of {node_shape} has no IRI value for sh:path and was skipped"
            ),
        }
    }
}

/// A parsed shapes graph: the node shapes a data graph is validated against.
///
/// Parsing is strict about shape definitions (see [`ShapeDefinitionError`])
/// but skips deactivated and path-less property shapes, surfacing them as
/// [`ParseDiagnostic`]s. Node shapes are kept in a deterministic order so
/// validation reports are reproducible.
#[derive(Debug, Clone, Default)]
pub struct ShapesGraph {
    shapes: Vec<NodeShape>,
    shape_ids: FxHashMap<ShapeId, usize>,
    diagnostics: Vec<ParseDiagnostic>,
}

impl ShapesGraph {
    /// Creates an empty shapes graph against which everything conforms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the shape declarations of a graph.
    ///
    /// Every subject with an `rdf:type` of `sh:NodeShape` becomes a node
    /// shape. Shapes are parsed and stored sorted by identifier.
    pub fn from_graph(graph: &Graph) -> Result<Self, ShapeDefinitionError> {
        let mut shape_subjects: Vec<ShapeId> = graph
            .subjects_for_predicate_object(rdf::TYPE, shacl::NODE_SHAPE)
            .filter_map(ShapeId::from_subject)
            .collect();
        shape_subjects.sort_unstable_by(|a, b| shape_order_key(a).cmp(&shape_order_key(b)));

        let mut diagnostics = Vec::new();
        let mut shapes = Vec::with_capacity(shape_subjects.len());
        for id in shape_subjects {
            shapes.push(parse_node_shape(graph, id, &mut diagnostics)?);
        }
        let shape_ids = shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| (shape.id.clone(), i))
            .collect::<FxHashMap<_, _>>();

        // sh:node references must resolve now so validation cannot fail later
        for shape in &shapes {
            for property_shape in &shape.property_shapes {
                for constraint in &property_shape.constraints {
                    if let Constraint::Node(reference) = constraint {
                        if !shape_ids.contains_key(reference) {
                            return Err(ShapeDefinitionError::undefined_shape_reference(
                                property_shape.id.to_term(),
                                reference.to_term(),
                            ));
                        }
                    }
                }
            }
        }

        Ok(Self {
            shapes,
            shape_ids,
            diagnostics,
        })
    }

    /// Returns the node shapes in deterministic order.
    pub fn node_shapes(&self) -> impl Iterator<Item = &NodeShape> {
        self.shapes.iter()
    }

    /// Returns the node shape with the given identifier.
    pub fn node_shape(&self, id: &ShapeId) -> Option<&NodeShape> {
        self.shape_ids.get(id).and_then(|i| self.shapes.get(*i))
    }

    /// Returns the number of node shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    /// Checks if this shapes graph contains no node shape.
    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Returns the non-fatal conditions noticed while parsing.
    pub fn diagnostics(&self) -> &[ParseDiagnostic] {
        &self.diagnostics
    }
}

fn shape_order_key(id: &ShapeId) -> (u8, &str) {
    match id {
        ShapeId::Named(node) => (0, node.as_str()),
        ShapeId::Blank(node) => (1, node.as_str()),
    }
}

fn parse_node_shape(
    graph: &Graph,
    id: ShapeId,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> Result<NodeShape, ShapeDefinitionError> {
    let targets = parse_targets(graph, &id)?;
    let property_shapes = parse_property_shapes(graph, &id, diagnostics)?;
    let (labels, messages) = parse_metadata(graph, &id);
    Ok(NodeShape {
        id,
        targets,
        property_shapes,
        labels,
        messages,
    })
}

fn parse_targets(graph: &Graph, id: &ShapeId) -> Result<Vec<Target>, ShapeDefinitionError> {
    let mut targets = Vec::new();
    for object in graph.objects_for_subject_predicate(id.as_subject_ref(), shacl::TARGET_CLASS) {
        if let TermRef::NamedNode(class) = object {
            targets.push(Target::Class(class.into_owned()));
        } else {
            return Err(ShapeDefinitionError::invalid_shape(
                id.to_term(),
                format!("sh:targetClass must be an IRI, found {object}"),
            ));
        }
    }
    for object in graph.objects_for_subject_predicate(id.as_subject_ref(), shacl::TARGET_NODE) {
        if let TermRef::NamedNode(node) = object {
            targets.push(Target::Node(node.into_owned().into()));
        } else if let TermRef::BlankNode(node) = object {
            targets.push(Target::Node(node.into_owned().into()));
        } else {
            return Err(ShapeDefinitionError::invalid_shape(
                id.to_term(),
                format!("sh:targetNode must be an IRI or a blank node, found {object}"),
            ));
        }
    }
    if targets.is_empty() {
        targets.push(Target::All);
    }
    Ok(targets)
}

fn parse_property_shapes(
    graph: &Graph,
    node_shape: &ShapeId,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> Result<Vec<PropertyShape>, ShapeDefinitionError> {
    let mut candidates = Vec::new();
    for object in graph.objects_for_subject_predicate(node_shape.as_subject_ref(), shacl::PROPERTY)
    {
        candidates.push(term_to_shape_id(node_shape, object)?);
    }
    candidates.sort_unstable_by(|a, b| shape_order_key(a).cmp(&shape_order_key(b)));

    let mut property_shapes = Vec::new();
    for id in candidates {
        if let Some(shape) = parse_property_shape(graph, node_shape, id, diagnostics)? {
            property_shapes.push(shape);
        }
    }
    Ok(property_shapes)
}

fn parse_property_shape(
    graph: &Graph,
    node_shape: &ShapeId,
    id: ShapeId,
    diagnostics: &mut Vec<ParseDiagnostic>,
) -> Result<Option<PropertyShape>, ShapeDefinitionError> {
    if get_boolean(graph, &id, shacl::DEACTIVATED)?.unwrap_or(false) {
        diagnostics.push(ParseDiagnostic::DeactivatedPropertyShape {
            node_shape: node_shape.clone(),
            property_shape: id,
        });
        return Ok(None);
    }
    let Some(path) = get_path(graph, &id) else {
        diagnostics.push(ParseDiagnostic::MissingPath {
            node_shape: node_shape.clone(),
            property_shape: id,
        });
        return Ok(None);
    };
    let constraints = parse_constraints(graph, &id)?;
    let (labels, messages) = parse_metadata(graph, &id);
    Ok(Some(PropertyShape {
        id,
        node_shape: node_shape.clone(),
        path,
        constraints,
        labels,
        messages,
    }))
}

fn parse_constraints(graph: &Graph, id: &ShapeId) -> Result<Vec<Constraint>, ShapeDefinitionError> {
    let mut constraints = Vec::new();
    if let Some(constraint) = parse_class_constraint(graph, id) {
        constraints.push(constraint);
    }
    if let Some(constraint) = parse_count_constraint(graph, id)? {
        constraints.push(constraint);
    }
    if let Some(constraint) = parse_node_kind_constraint(graph, id)? {
        constraints.push(constraint);
    }
    if let Some(constraint) = parse_node_constraint(graph, id)? {
        constraints.push(constraint);
    }
    if let Some(constraint) = parse_string_constraint(graph, id)? {
        constraints.push(constraint);
    }
    if let Some(constraint) = parse_language_constraint(graph, id)? {
        constraints.push(constraint);
    }
    if let Some(constraint) = parse_datatype_constraint(graph, id) {
        constraints.push(constraint);
    }
    if let Some(constraint) = parse_has_value_constraint(graph, id) {
        constraints.push(constraint);
    }
    Ok(constraints)
}

fn parse_class_constraint(graph: &Graph, id: &ShapeId) -> Option<Constraint> {
    get_named_node(graph, id, shacl::CLASS).map(Constraint::Class)
}

fn parse_count_constraint(
    graph: &Graph,
    id: &ShapeId,
) -> Result<Option<Constraint>, ShapeDefinitionError> {
    let min = get_integer(graph, id, shacl::MIN_COUNT)?;
    let max = get_integer(graph, id, shacl::MAX_COUNT)?;
    if min.is_none() && max.is_none() {
        return Ok(None);
    }
    Ok(Some(Constraint::PropertyCount {
        min: min.unwrap_or(0),
        max,
    }))
}

fn parse_node_kind_constraint(
    graph: &Graph,
    id: &ShapeId,
) -> Result<Option<Constraint>, ShapeDefinitionError> {
    let Some(object) = get_object(graph, id, shacl::NODE_KIND) else {
        return Ok(None);
    };
    if let TermRef::NamedNode(iri) = object {
        if let Some(kind) = NodeKind::from_iri(iri) {
            return Ok(Some(Constraint::NodeKind(kind)));
        }
    }
    Err(ShapeDefinitionError::unknown_node_kind(id.to_term(), object.into_owned()))
}

fn parse_node_constraint(
    graph: &Graph,
    id: &ShapeId,
) -> Result<Option<Constraint>, ShapeDefinitionError> {
    let Some(object) = get_object(graph, id, shacl::NODE) else {
        return Ok(None);
    };
    Ok(Some(Constraint::Node(term_to_shape_id(id, object)?)))
}

fn parse_string_constraint(
    graph: &Graph,
    id: &ShapeId,
) -> Result<Option<Constraint>, ShapeDefinitionError> {
    let min = get_integer(graph, id, shacl::MIN_LENGTH)?;
    let max = get_integer(graph, id, shacl::MAX_LENGTH)?;
    let pattern = match get_string(graph, id, shacl::PATTERN) {
        Some(pattern) => Some(compile_pattern(&pattern)?),
        None => None,
    };
    if min.is_none() && max.is_none() && pattern.is_none() {
        return Ok(None);
    }
    Ok(Some(Constraint::StringShape {
        min: min.unwrap_or(0),
        max,
        pattern,
    }))
}

fn parse_language_constraint(
    graph: &Graph,
    id: &ShapeId,
) -> Result<Option<Constraint>, ShapeDefinitionError> {
    let langs = match get_object(graph, id, shacl::LANGUAGE_IN) {
        Some(head) => resolve_string_list(graph, head)?,
        None => Vec::new(),
    };
    let unique = get_boolean(graph, id, shacl::UNIQUE_LANG)?.unwrap_or(false);
    if !unique && langs.is_empty() {
        return Ok(None);
    }
    Ok(Some(Constraint::LanguageIn { langs, unique }))
}

fn parse_datatype_constraint(graph: &Graph, id: &ShapeId) -> Option<Constraint> {
    get_named_node(graph, id, shacl::DATATYPE).map(Constraint::Datatype)
}

fn parse_has_value_constraint(graph: &Graph, id: &ShapeId) -> Option<Constraint> {
    get_object(graph, id, shacl::HAS_VALUE)
        .map(TermRef::into_owned)
        .map(Constraint::HasValue)
}

fn parse_metadata(
    graph: &Graph,
    id: &ShapeId,
) -> (BTreeMap<String, String>, BTreeMap<String, String>) {
    (
        collect_language_map(graph, id, shacl::NAME),
        collect_language_map(graph, id, shacl::MESSAGE),
    )
}

fn collect_language_map(
    graph: &Graph,
    id: &ShapeId,
    predicate: NamedNodeRef<'_>,
) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for object in graph.objects_for_subject_predicate(id.as_subject_ref(), predicate) {
        if let TermRef::Literal(literal) = object {
            map.insert(
                literal.language().unwrap_or_default().to_owned(),
                literal.value().to_owned(),
            );
        }
    }
    map
}

pub(crate) fn lookup_language<'a>(
    map: &'a BTreeMap<String, String>,
    language: &str,
) -> Option<&'a str> {
    map.get(language).or_else(|| map.get("")).map(String::as_str)
}

fn term_to_shape_id(shape: &ShapeId, term: TermRef<'_>) -> Result<ShapeId, ShapeDefinitionError> {
    if let TermRef::NamedNode(node) = term {
        Ok(ShapeId::Named(node.into_owned()))
    } else if let TermRef::BlankNode(node) = term {
        Ok(ShapeId::Blank(node.into_owned()))
    } else {
        Err(ShapeDefinitionError::invalid_shape(
            shape.to_term(),
            format!("{term} is not a valid shape reference"),
        ))
    }
}

fn get_path(graph: &Graph, id: &ShapeId) -> Option<NamedNode> {
    graph
        .objects_for_subject_predicate(id.as_subject_ref(), shacl::PATH)
        .find_map(|object| {
            if let TermRef::NamedNode(path) = object {
                Some(path.into_owned())
            } else {
                None
            }
        })
}

fn get_object<'a>(
    graph: &'a Graph,
    id: &ShapeId,
    predicate: NamedNodeRef<'_>,
) -> Option<TermRef<'a>> {
    graph
        .objects_for_subject_predicate(id.as_subject_ref(), predicate)
        .next()
}

fn get_named_node(graph: &Graph, id: &ShapeId, predicate: NamedNodeRef<'_>) -> Option<NamedNode> {
    graph
        .objects_for_subject_predicate(id.as_subject_ref(), predicate)
        .find_map(|object| {
            if let TermRef::NamedNode(node) = object {
                Some(node.into_owned())
            } else {
                None
            }
        })
}

fn get_literal(graph: &Graph, id: &ShapeId, predicate: NamedNodeRef<'_>) -> Option<Literal> {
    graph
        .objects_for_subject_predicate(id.as_subject_ref(), predicate)
        .find_map(|object| {
            if let TermRef::Literal(literal) = object {
                Some(literal.into_owned())
            } else {
                None
            }
        })
}

fn get_string(graph: &Graph, id: &ShapeId, predicate: NamedNodeRef<'_>) -> Option<String> {
    get_literal(graph, id, predicate).map(|literal| literal.value().to_owned())
}

fn get_integer(
    graph: &Graph,
    id: &ShapeId,
    predicate: NamedNodeRef<'_>,
) -> Result<Option<i64>, ShapeDefinitionError> {
    let Some(literal) = get_literal(graph, id, predicate) else {
        return Ok(None);
    };
    literal.value().parse().map(Some).map_err(|_| {
        ShapeDefinitionError::invalid_property_value(
            id.to_term(),
            predicate.into_owned(),
            format!("expected an integer, found \"{}\"", literal.value()),
        )
    })
}

fn get_boolean(
    graph: &Graph,
    id: &ShapeId,
    predicate: NamedNodeRef<'_>,
) -> Result<Option<bool>, ShapeDefinitionError> {
    let Some(literal) = get_literal(graph, id, predicate) else {
        return Ok(None);
    };
    match literal.value() {
        "true" | "1" => Ok(Some(true)),
        "false" | "0" => Ok(Some(false)),
        value => Err(ShapeDefinitionError::invalid_property_value(
            id.to_term(),
            predicate.into_owned(),
            format!("expected a boolean, found \"{value}\""),
        )),
    }
}

fn compile_pattern(pattern: &str) -> Result<Regex, ShapeDefinitionError> {
    // values must match the whole pattern, not just contain a match
    Regex::new(&format!("^(?:{pattern})$"))
        .map_err(|e| ShapeDefinitionError::invalid_regex(pattern, e.to_string()))
}

fn resolve_string_list(
    graph: &Graph,
    head: TermRef<'_>,
) -> Result<Vec<String>, ShapeDefinitionError> {
    let head = head.into_owned();
    let mut items = Vec::new();
    let mut visited = FxHashSet::default();
    let mut current = head.clone();
    loop {
        if let Term::NamedNode(node) = &current {
            if node.as_ref() == rdf::NIL {
                return Ok(items);
            }
        }
        if !visited.insert(current.clone()) {
            return Err(ShapeDefinitionError::invalid_rdf_list(head, "the list is cyclic"));
        }
        let node = if let Term::NamedNode(node) = &current {
            SubjectRef::from(node.as_ref())
        } else if let Term::BlankNode(node) = &current {
            SubjectRef::from(node.as_ref())
        } else {
            return Err(ShapeDefinitionError::invalid_rdf_list(
                head,
                format!("{current} cannot be a list node"),
            ));
        };
        let Some(first) = graph.object_for_subject_predicate(node, rdf::FIRST) else {
            return Err(ShapeDefinitionError::invalid_rdf_list(head, "missing rdf:first"));
        };
        if let TermRef::Literal(literal) = first {
            items.push(literal.value().to_owned());
        } else {
            return Err(ShapeDefinitionError::invalid_rdf_list(
                head,
                format!("{first} is not a literal list member"),
            ));
        }
        let Some(rest) = graph.object_for_subject_predicate(node, rdf::REST) else {
            return Err(ShapeDefinitionError::invalid_rdf_list(head, "missing rdf:rest"));
        };
        current = rest.into_owned();
    }
}

fn all_subjects(graph: &Graph) -> Vec<Subject> {
    let mut seen = FxHashSet::default();
    let mut subjects = Vec::new();
    for triple in graph {
        if seen.insert(triple.subject) {
            subjects.push(triple.subject.into_owned());
        }
    }
    subjects
}
