use oxrdf::{NamedNode, Term};
use thiserror::Error;

/// An error raised while parsing a SHACL shapes graph.
///
/// Problems in the shapes graph are fatal and reported through this type.
/// Validation itself never fails: constraint violations in the data graph are
/// data, collected in a [`ValidationReport`](crate::ValidationReport).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ShapeDefinitionError {
    /// A shape declaration uses a term where it is not allowed.
    #[error("Invalid shape {shape}: {message}")]
    InvalidShape {
        /// The shape with the invalid declaration.
        shape: Term,
        /// Human readable description of the problem.
        message: String,
    },
    /// A constraint parameter value has the wrong form.
    #[error("Invalid value for {property} on shape {shape}: {message}")]
    InvalidPropertyValue {
        /// The shape carrying the parameter.
        shape: Term,
        /// The constraint parameter predicate.
        property: NamedNode,
        /// Human readable description of the problem.
        message: String,
    },
    /// An `sh:pattern` regular expression failed to compile.
    #[error("Invalid regular expression `{pattern}`: {message}")]
    InvalidRegex {
        /// The pattern as written in the shapes graph.
        pattern: String,
        /// The regex engine's error message.
        message: String,
    },
    /// An RDF list in the shapes graph is malformed.
    #[error("Invalid RDF list starting at {head}: {message}")]
    InvalidRdfList {
        /// The first node of the list.
        head: Term,
        /// Human readable description of the problem.
        message: String,
    },
    /// An `sh:nodeKind` value is not one of the six SHACL node kinds.
    #[error("Unknown node kind {kind} on shape {shape}")]
    UnknownNodeKind {
        /// The shape carrying the `sh:nodeKind` parameter.
        shape: Term,
        /// The unrecognized node kind term.
        kind: Term,
    },
    /// An `sh:node` reference points to a shape that is not declared.
    #[error("Shape {shape} references undefined shape {reference}")]
    UndefinedShapeReference {
        /// The shape carrying the `sh:node` parameter.
        shape: Term,
        /// The reference that does not resolve to a declared node shape.
        reference: Term,
    },
}

impl ShapeDefinitionError {
    /// Builds a [`ShapeDefinitionError::InvalidShape`] error.
    pub fn invalid_shape(shape: impl Into<Term>, message: impl Into<String>) -> Self {
        Self::InvalidShape {
            shape: shape.into(),
            message: message.into(),
        }
    }

    /// Builds a [`ShapeDefinitionError::InvalidPropertyValue`] error.
    pub fn invalid_property_value(
        shape: impl Into<Term>,
        property: impl Into<NamedNode>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidPropertyValue {
            shape: shape.into(),
            property: property.into(),
            message: message.into(),
        }
    }

    /// Builds a [`ShapeDefinitionError::InvalidRegex`] error.
    pub fn invalid_regex(pattern: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Builds a [`ShapeDefinitionError::InvalidRdfList`] error.
    pub fn invalid_rdf_list(head: impl Into<Term>, message: impl Into<String>) -> Self {
        Self::InvalidRdfList {
            head: head.into(),
            message: message.into(),
        }
    }

    /// Builds a [`ShapeDefinitionError::UnknownNodeKind`] error.
    pub fn unknown_node_kind(shape: impl Into<Term>, kind: impl Into<Term>) -> Self {
        Self::UnknownNodeKind {
            shape: shape.into(),
            kind: kind.into(),
        }
    }

    /// Builds a [`ShapeDefinitionError::UndefinedShapeReference`] error.
    pub fn undefined_shape_reference(shape: impl Into<Term>, reference: impl Into<Term>) -> Self {
        Self::UndefinedShapeReference {
            shape: shape.into(),
            reference: reference.into(),
        }
    }
}
