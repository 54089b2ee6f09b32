use crate::constraint::ConstraintComponent;
use crate::model::{ShapeId, lookup_language};
use crate::vocab::shacl;
use oxrdf::vocab::{rdf, xsd};
use oxrdf::{BlankNode, Graph, Literal, NamedNode, Subject, Term, Triple};
use std::collections::BTreeMap;
use std::fmt;

/// A single constraint violation found while validating a data graph.
///
/// A violation names the offending focus subject, optionally the predicate and
/// value involved, the source property shape and the constraint component that
/// rejected the value. Violations are plain data: finding one never aborts
/// validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    focus: Subject,
    path: Option<NamedNode>,
    value: Option<Term>,
    source_shape: ShapeId,
    component: ConstraintComponent,
    messages: BTreeMap<String, String>,
}

impl Violation {
    /// Builds a new violation for a focus subject.
    pub fn new(
        focus: impl Into<Subject>,
        source_shape: impl Into<ShapeId>,
        component: ConstraintComponent,
    ) -> Self {
        Self {
            focus: focus.into(),
            path: None,
            value: None,
            source_shape: source_shape.into(),
            component,
            messages: BTreeMap::new(),
        }
    }

    /// Sets the predicate whose values violated the constraint.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<NamedNode>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Sets the offending value.
    #[must_use]
    pub fn with_value(mut self, value: impl Into<Term>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Sets the shape messages of this violation, keyed by language tag.
    ///
    /// Non-empty keys must be valid language tags; the empty key holds the
    /// untagged message.
    #[must_use]
    pub fn with_messages(mut self, messages: BTreeMap<String, String>) -> Self {
        self.messages = messages;
        self
    }

    /// Returns the offending focus subject.
    pub fn focus(&self) -> &Subject {
        &self.focus
    }

    /// Returns the predicate whose values violated the constraint, if any.
    pub fn path(&self) -> Option<&NamedNode> {
        self.path.as_ref()
    }

    /// Returns the offending value, if any.
    pub fn value(&self) -> Option<&Term> {
        self.value.as_ref()
    }

    /// Returns the property shape the violated constraint belongs to.
    pub fn source_shape(&self) -> &ShapeId {
        &self.source_shape
    }

    /// Returns the constraint component that rejected the value.
    pub fn component(&self) -> ConstraintComponent {
        self.component
    }

    /// Returns the shape message for a language, falling back to the untagged message.
    pub fn message(&self, language: &str) -> Option<&str> {
        lookup_language(&self.messages, language)
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.component, self.focus)?;
        if let Some(path) = &self.path {
            write!(f, " {path}")?;
        }
        if let Some(value) = &self.value {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

/// The outcome of validating a data graph against a shapes graph.
///
/// The report is an ordered list of [`Violation`]s plus the shapes that were
/// skipped because they selected no focus subject. Two validations of the same
/// inputs produce equal reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
    skipped_shapes: Vec<ShapeId>,
}

impl ValidationReport {
    /// Builds an empty, conforming report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks whether the data graph conforms: no violation was found.
    pub fn conforms(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns the violations in the order they were found.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Checks whether this report contains no violation.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Appends a violation to this report.
    pub fn add_violation(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Records a shape that selected no focus subject.
    pub fn add_skipped_shape(&mut self, shape: ShapeId) {
        self.skipped_shapes.push(shape);
    }

    /// Returns the shapes whose target selection was empty, in validation order.
    pub fn skipped_shapes(&self) -> &[ShapeId] {
        &self.skipped_shapes
    }

    /// Serializes this report with the SHACL validation report vocabulary.
    pub fn to_graph(&self) -> Graph {
        let mut graph = Graph::new();
        let report = BlankNode::default();
        graph.insert(&Triple::new(report.clone(), rdf::TYPE, shacl::VALIDATION_REPORT));
        graph.insert(&Triple::new(
            report.clone(),
            shacl::CONFORMS,
            Literal::new_typed_literal(
                if self.conforms() { "true" } else { "false" },
                xsd::BOOLEAN,
            ),
        ));
        for violation in &self.violations {
            let result = BlankNode::default();
            graph.insert(&Triple::new(report.clone(), shacl::RESULT, result.clone()));
            graph.insert(&Triple::new(result.clone(), rdf::TYPE, shacl::VALIDATION_RESULT));
            graph.insert(&Triple::new(result.clone(), shacl::FOCUS_NODE, violation.focus.clone()));
            if let Some(path) = &violation.path {
                graph.insert(&Triple::new(result.clone(), shacl::RESULT_PATH, path.clone()));
            }
            if let Some(value) = &violation.value {
                graph.insert(&Triple::new(result.clone(), shacl::VALUE, value.clone()));
            }
            graph.insert(&Triple::new(
                result.clone(),
                shacl::SOURCE_SHAPE,
                violation.source_shape.to_term(),
            ));
            graph.insert(&Triple::new(
                result.clone(),
                shacl::SOURCE_CONSTRAINT_COMPONENT,
                violation.component.iri(),
            ));
            graph.insert(&Triple::new(result.clone(), shacl::RESULT_SEVERITY, shacl::VIOLATION));
            for (language, text) in &violation.messages {
                let message = if language.is_empty() {
                    Literal::new_simple_literal(text)
                } else {
                    Literal::new_language_tagged_literal_unchecked(text, language)
                };
                graph.insert(&Triple::new(result.clone(), shacl::RESULT_MESSAGE, message));
            }
        }
        graph
    }
}
