use crate::constraint::{Constraint, ConstraintComponent, NodeKind};
use crate::model::{NodeShape, PropertyShape, ShapeId, ShapesGraph};
use crate::report::{ValidationReport, Violation};
use oxiri::IriRef;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{Graph, LiteralRef, NamedNode, Subject, SubjectRef, Term, TermRef, TripleRef};
use oxsdatatypes::{Boolean, Date, DateTime, Integer};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

/// Validates data graphs against a parsed shapes graph.
///
/// Validation is a pure function of the shapes and the data: no state is
/// mutated, the same inputs always produce the same report, and a single
/// validator can be shared to check any number of graphs.
#[derive(Debug, Clone)]
pub struct ShaclValidator {
    shapes: ShapesGraph,
}

impl ShaclValidator {
    /// Builds a validator for a parsed shapes graph.
    pub fn new(shapes: ShapesGraph) -> Self {
        Self { shapes }
    }

    /// Returns the shapes graph this validator checks against.
    pub fn shapes(&self) -> &ShapesGraph {
        &self.shapes
    }

    /// Validates a data graph, collecting every constraint violation.
    ///
    /// Shapes are processed in model order and their focus subjects in sorted
    /// order, so violations land in the report in a reproducible order. Shapes
    /// whose targets select nothing are recorded as skipped.
    pub fn validate(&self, data: &Graph) -> ValidationReport {
        let mut report = ValidationReport::new();
        for shape in self.shapes.node_shapes() {
            let focus = resolve_targets(shape, data);
            if focus.is_empty() {
                report.add_skipped_shape(shape.id().clone());
                continue;
            }
            for property_shape in shape.property_shapes() {
                let messages = effective_messages(shape, property_shape);
                for constraint in property_shape.constraints() {
                    self.check_constraint(
                        data,
                        property_shape,
                        constraint,
                        &focus,
                        &messages,
                        &mut report,
                    );
                }
            }
        }
        report
    }

    fn check_constraint(
        &self,
        data: &Graph,
        property_shape: &PropertyShape,
        constraint: &Constraint,
        focus: &[Subject],
        messages: &BTreeMap<String, String>,
        report: &mut ValidationReport,
    ) {
        match constraint {
            Constraint::PropertyCount { min, max } => {
                check_property_count(data, property_shape, *min, *max, focus, messages, report);
            }
            Constraint::Datatype(datatype) => {
                check_datatype(data, property_shape, datatype, focus, messages, report);
            }
            Constraint::Class(class) => {
                check_class(data, property_shape, class, focus, messages, report);
            }
            Constraint::NodeKind(kind) => {
                check_node_kind(data, property_shape, *kind, focus, messages, report);
            }
            Constraint::Node(shape_id) => {
                self.check_node(data, property_shape, shape_id, focus, messages, report);
            }
            Constraint::StringShape { min, max, pattern } => {
                check_string_shape(
                    data,
                    property_shape,
                    *min,
                    *max,
                    pattern.as_ref(),
                    focus,
                    messages,
                    report,
                );
            }
            Constraint::LanguageIn { langs, unique } => {
                check_language_in(data, property_shape, langs, *unique, focus, messages, report);
            }
            Constraint::HasValue(value) => {
                check_has_value(data, property_shape, value, focus, messages, report);
            }
        }
    }

    fn check_node(
        &self,
        data: &Graph,
        property_shape: &PropertyShape,
        shape_id: &ShapeId,
        focus: &[Subject],
        messages: &BTreeMap<String, String>,
        report: &mut ValidationReport,
    ) {
        // references are resolved when the shapes graph is parsed
        let Some(shape) = self.shapes.node_shape(shape_id) else {
            return;
        };
        for subject in focus {
            for object in data.objects_for_subject_predicate(subject, property_shape.path()) {
                let mut visiting = FxHashSet::default();
                if !self.conforms_to_shape(data, shape, object, &mut visiting) {
                    report.add_violation(value_violation(
                        subject,
                        property_shape,
                        ConstraintComponent::Node,
                        object,
                        messages,
                    ));
                }
            }
        }
    }

    /// Checks a single value against a node shape without reporting nested
    /// violations.
    ///
    /// A `(shape, value)` pair already under check higher up the recursion is
    /// conformant, which makes cyclic shape references terminate.
    fn conforms_to_shape(
        &self,
        data: &Graph,
        shape: &NodeShape,
        value: TermRef<'_>,
        visiting: &mut FxHashSet<(ShapeId, Term)>,
    ) -> bool {
        if !visiting.insert((shape.id().clone(), value.into_owned())) {
            return true;
        }
        for property_shape in shape.property_shapes() {
            for constraint in property_shape.constraints() {
                if !self.value_satisfies_constraint(
                    data,
                    property_shape,
                    constraint,
                    value,
                    visiting,
                ) {
                    return false;
                }
            }
        }
        true
    }

    fn value_satisfies_constraint(
        &self,
        data: &Graph,
        property_shape: &PropertyShape,
        constraint: &Constraint,
        value: TermRef<'_>,
        visiting: &mut FxHashSet<(ShapeId, Term)>,
    ) -> bool {
        let objects = value_objects(data, value, property_shape.path());
        match constraint {
            Constraint::PropertyCount { min, max } => {
                let count = i64::try_from(objects.len()).unwrap_or(i64::MAX);
                count >= *min && max.is_none_or(|max| count <= max)
            }
            Constraint::Datatype(datatype) => objects
                .iter()
                .all(|object| datatype_value_ok(*object, datatype)),
            Constraint::Class(class) => objects
                .iter()
                .all(|object| is_instance_of(data, *object, class)),
            Constraint::NodeKind(kind) => objects.iter().all(|object| kind.matches(*object)),
            Constraint::Node(shape_id) => {
                let Some(shape) = self.shapes.node_shape(shape_id) else {
                    return true;
                };
                objects
                    .iter()
                    .all(|object| self.conforms_to_shape(data, shape, *object, visiting))
            }
            Constraint::StringShape { min, max, pattern } => objects
                .iter()
                .all(|object| string_value_ok(*object, *min, *max, pattern.as_ref())),
            Constraint::LanguageIn { langs, unique } => {
                let mut seen = FxHashSet::default();
                objects.iter().all(|object| {
                    let TermRef::Literal(literal) = *object else {
                        return false;
                    };
                    if literal.datatype() != xsd::STRING && literal.datatype() != rdf::LANG_STRING {
                        return false;
                    }
                    let tag = literal.language().unwrap_or_default();
                    (langs.is_empty() || langs.iter().any(|allowed| allowed.as_str() == tag))
                        && (!*unique || seen.insert(tag.to_owned()))
                })
            }
            Constraint::HasValue(value_needed) => objects
                .iter()
                .any(|object| *object == value_needed.as_ref()),
        }
    }
}

fn resolve_targets(shape: &NodeShape, data: &Graph) -> Vec<Subject> {
    let mut seen = FxHashSet::default();
    let mut focus = Vec::new();
    for target in shape.targets() {
        for subject in target.focus_subjects(data) {
            if seen.insert(subject.clone()) {
                focus.push(subject);
            }
        }
    }
    focus.sort_unstable_by(|a, b| subject_order_key(a).cmp(&subject_order_key(b)));
    focus
}

fn subject_order_key(subject: &Subject) -> (u8, &str) {
    if let Subject::NamedNode(node) = subject {
        (0, node.as_str())
    } else if let Subject::BlankNode(node) = subject {
        (1, node.as_str())
    } else {
        (2, "")
    }
}

fn effective_messages(
    shape: &NodeShape,
    property_shape: &PropertyShape,
) -> BTreeMap<String, String> {
    let mut messages = shape.messages().clone();
    messages.extend(property_shape.messages().clone());
    messages
}

fn check_property_count(
    data: &Graph,
    property_shape: &PropertyShape,
    min: i64,
    max: Option<i64>,
    focus: &[Subject],
    messages: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for subject in focus {
        let count = i64::try_from(
            data.objects_for_subject_predicate(subject, property_shape.path())
                .count(),
        )
        .unwrap_or(i64::MAX);
        let component = if count < min {
            Some(ConstraintComponent::MinCount)
        } else if max.is_some_and(|max| count > max) {
            Some(ConstraintComponent::MaxCount)
        } else {
            None
        };
        if let Some(component) = component {
            report.add_violation(path_violation(subject, property_shape, component, messages));
        }
    }
}

fn check_datatype(
    data: &Graph,
    property_shape: &PropertyShape,
    datatype: &NamedNode,
    focus: &[Subject],
    messages: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for subject in focus {
        for object in data.objects_for_subject_predicate(subject, property_shape.path()) {
            if !datatype_value_ok(object, datatype) {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::Datatype,
                    object,
                    messages,
                ));
            }
        }
    }
}

fn check_class(
    data: &Graph,
    property_shape: &PropertyShape,
    class: &NamedNode,
    focus: &[Subject],
    messages: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for subject in focus {
        for object in data.objects_for_subject_predicate(subject, property_shape.path()) {
            if !is_instance_of(data, object, class) {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::Class,
                    object,
                    messages,
                ));
            }
        }
    }
}

fn check_node_kind(
    data: &Graph,
    property_shape: &PropertyShape,
    kind: NodeKind,
    focus: &[Subject],
    messages: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for subject in focus {
        for object in data.objects_for_subject_predicate(subject, property_shape.path()) {
            if !kind.matches(object) {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::NodeKind,
                    object,
                    messages,
                ));
            }
        }
    }
}

#[expect(clippy::too_many_arguments)]
fn check_string_shape(
    data: &Graph,
    property_shape: &PropertyShape,
    min: i64,
    max: Option<i64>,
    pattern: Option<&Regex>,
    focus: &[Subject],
    messages: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for subject in focus {
        for object in data.objects_for_subject_predicate(subject, property_shape.path()) {
            let TermRef::Literal(literal) = object else {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::Datatype,
                    object,
                    messages,
                ));
                continue;
            };
            // a wrong datatype is reported but the facets still apply to the
            // lexical form
            if literal.datatype() != xsd::STRING {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::Datatype,
                    object,
                    messages,
                ));
            }
            let length = string_length(literal.value());
            if length < min {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::MinLength,
                    object,
                    messages,
                ));
            } else if max.is_some_and(|max| length > max) {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::MaxLength,
                    object,
                    messages,
                ));
            } else if let Some(pattern) = pattern {
                if !pattern.is_match(literal.value()) {
                    report.add_violation(value_violation(
                        subject,
                        property_shape,
                        ConstraintComponent::Pattern,
                        object,
                        messages,
                    ));
                }
            }
        }
    }
}

fn check_language_in(
    data: &Graph,
    property_shape: &PropertyShape,
    langs: &[String],
    unique: bool,
    focus: &[Subject],
    messages: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for subject in focus {
        let mut seen = FxHashSet::default();
        for object in data.objects_for_subject_predicate(subject, property_shape.path()) {
            let TermRef::Literal(literal) = object else {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::LanguageIn,
                    object,
                    messages,
                ));
                continue;
            };
            if literal.datatype() != xsd::STRING && literal.datatype() != rdf::LANG_STRING {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::LanguageIn,
                    object,
                    messages,
                ));
                continue;
            }
            let tag = literal.language().unwrap_or_default();
            if !langs.is_empty() && !langs.iter().any(|allowed| allowed.as_str() == tag) {
                report.add_violation(value_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::LanguageIn,
                    object,
                    messages,
                ));
            }
            // a repeated tag violates uniqueness even when the tag is allowed
            if unique && !seen.insert(tag.to_owned()) {
                report.add_violation(path_violation(
                    subject,
                    property_shape,
                    ConstraintComponent::UniqueLang,
                    messages,
                ));
            }
        }
    }
}

fn check_has_value(
    data: &Graph,
    property_shape: &PropertyShape,
    value: &Term,
    focus: &[Subject],
    messages: &BTreeMap<String, String>,
    report: &mut ValidationReport,
) {
    for subject in focus {
        let found = data
            .objects_for_subject_predicate(subject, property_shape.path())
            .any(|object| object == value.as_ref());
        if !found {
            report.add_violation(
                Violation::new(
                    subject.clone(),
                    property_shape.id().clone(),
                    ConstraintComponent::HasValue,
                )
                .with_messages(messages.clone()),
            );
        }
    }
}

fn value_violation(
    subject: &Subject,
    property_shape: &PropertyShape,
    component: ConstraintComponent,
    object: TermRef<'_>,
    messages: &BTreeMap<String, String>,
) -> Violation {
    Violation::new(subject.clone(), property_shape.id().clone(), component)
        .with_path(property_shape.path().clone())
        .with_value(object.into_owned())
        .with_messages(messages.clone())
}

fn path_violation(
    subject: &Subject,
    property_shape: &PropertyShape,
    component: ConstraintComponent,
    messages: &BTreeMap<String, String>,
) -> Violation {
    Violation::new(subject.clone(), property_shape.id().clone(), component)
        .with_path(property_shape.path().clone())
        .with_messages(messages.clone())
}

fn value_objects<'a>(data: &'a Graph, value: TermRef<'_>, path: &NamedNode) -> Vec<TermRef<'a>> {
    let subject = if let TermRef::NamedNode(node) = value {
        SubjectRef::from(node)
    } else if let TermRef::BlankNode(node) = value {
        SubjectRef::from(node)
    } else {
        // literals have no outgoing facts
        return Vec::new();
    };
    data.objects_for_subject_predicate(subject, path).collect()
}

fn is_instance_of(data: &Graph, term: TermRef<'_>, class: &NamedNode) -> bool {
    let subject = if let TermRef::NamedNode(node) = term {
        SubjectRef::from(node)
    } else if let TermRef::BlankNode(node) = term {
        SubjectRef::from(node)
    } else {
        return false;
    };
    data.contains(TripleRef::new(subject, rdf::TYPE, class.as_ref()))
}

fn datatype_value_ok(object: TermRef<'_>, datatype: &NamedNode) -> bool {
    let TermRef::Literal(literal) = object else {
        return false;
    };
    literal.datatype() == datatype.as_ref() && lexical_form_is_valid(literal)
}

/// Checks the lexical form of the datatypes the engine knows; every other
/// datatype is accepted on the datatype IRI alone.
fn lexical_form_is_valid(literal: LiteralRef<'_>) -> bool {
    let datatype = literal.datatype();
    let value = literal.value();
    if datatype == xsd::BOOLEAN {
        value.parse::<Boolean>().is_ok()
    } else if datatype == xsd::INTEGER {
        value.parse::<Integer>().is_ok()
    } else if datatype == xsd::INT {
        value
            .parse::<Integer>()
            .is_ok_and(|i| i32::try_from(i64::from(i)).is_ok())
    } else if datatype == xsd::DATE {
        value.parse::<Date>().is_ok()
    } else if datatype == xsd::DATE_TIME {
        value.parse::<DateTime>().is_ok()
    } else if datatype == xsd::ANY_URI {
        IriRef::parse(value).is_ok()
    } else {
        true
    }
}

fn string_value_ok(
    object: TermRef<'_>,
    min: i64,
    max: Option<i64>,
    pattern: Option<&Regex>,
) -> bool {
    let TermRef::Literal(literal) = object else {
        return false;
    };
    if literal.datatype() != xsd::STRING {
        return false;
    }
    let length = string_length(literal.value());
    if length < min || max.is_some_and(|max| length > max) {
        return false;
    }
    pattern.is_none_or(|pattern| pattern.is_match(literal.value()))
}

fn string_length(value: &str) -> i64 {
    i64::try_from(value.chars().count()).unwrap_or(i64::MAX)
}
