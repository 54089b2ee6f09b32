use crate::model::ShapeId;
use crate::vocab::shacl;
use oxrdf::{NamedNode, NamedNodeRef, Term, TermRef};
use regex::Regex;
use std::fmt;

/// A constraint of a property shape.
///
/// The set of constraint kinds is closed: the validator dispatches on it with
/// an exhaustive `match`, so adding a kind is a compile-time visible change.
#[derive(Debug, Clone)]
pub enum Constraint {
    /// `sh:minCount` / `sh:maxCount` — bounds on the number of values for the path.
    ///
    /// A missing `sh:maxCount` leaves the upper bound open. `min > max` is
    /// accepted and simply never satisfiable.
    PropertyCount {
        /// Lower bound, `0` when not declared.
        min: i64,
        /// Upper bound, unbounded when not declared.
        max: Option<i64>,
    },
    /// `sh:datatype` — values must be literals of the datatype with a valid lexical form.
    Datatype(NamedNode),
    /// `sh:class` — values must carry a direct `rdf:type` fact for the class.
    Class(NamedNode),
    /// `sh:nodeKind` — values must be of the structural kind.
    NodeKind(NodeKind),
    /// `sh:node` — values must conform to the referenced node shape.
    Node(ShapeId),
    /// `sh:minLength` / `sh:maxLength` / `sh:pattern` — string facet checks.
    ///
    /// The pattern is compiled when the shapes graph is parsed and must match
    /// the entire string value.
    StringShape {
        /// Minimum length in characters, `0` when not declared.
        min: i64,
        /// Maximum length in characters, unbounded when not declared.
        max: Option<i64>,
        /// Anchored regular expression values must match.
        pattern: Option<Regex>,
    },
    /// `sh:languageIn` / `sh:uniqueLang` — language tag checks.
    LanguageIn {
        /// Allowed language tags, the empty string standing for "no tag".
        ///
        /// An empty list allows every tag.
        langs: Vec<String>,
        /// Whether each tag may appear at most once per focus node.
        unique: bool,
    },
    /// `sh:hasValue` — the value must be present among the values of the path.
    HasValue(Term),
}

/// The structural kind of an RDF term, as used by `sh:nodeKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// `sh:IRI`
    Iri,
    /// `sh:BlankNode`
    BlankNode,
    /// `sh:Literal`
    Literal,
    /// `sh:BlankNodeOrIRI`
    BlankNodeOrIri,
    /// `sh:BlankNodeOrLiteral`
    BlankNodeOrLiteral,
    /// `sh:IRIOrLiteral`
    IriOrLiteral,
}

impl NodeKind {
    /// Looks up the node kind named by a SHACL term.
    pub fn from_iri(iri: NamedNodeRef<'_>) -> Option<Self> {
        if iri == shacl::IRI {
            Some(Self::Iri)
        } else if iri == shacl::BLANK_NODE {
            Some(Self::BlankNode)
        } else if iri == shacl::LITERAL {
            Some(Self::Literal)
        } else if iri == shacl::BLANK_NODE_OR_IRI {
            Some(Self::BlankNodeOrIri)
        } else if iri == shacl::BLANK_NODE_OR_LITERAL {
            Some(Self::BlankNodeOrLiteral)
        } else if iri == shacl::IRI_OR_LITERAL {
            Some(Self::IriOrLiteral)
        } else {
            None
        }
    }

    /// Returns the SHACL term naming this node kind.
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::Iri => shacl::IRI,
            Self::BlankNode => shacl::BLANK_NODE,
            Self::Literal => shacl::LITERAL,
            Self::BlankNodeOrIri => shacl::BLANK_NODE_OR_IRI,
            Self::BlankNodeOrLiteral => shacl::BLANK_NODE_OR_LITERAL,
            Self::IriOrLiteral => shacl::IRI_OR_LITERAL,
        }
    }

    /// Checks whether a term is of this structural kind.
    pub fn matches(self, term: TermRef<'_>) -> bool {
        match self {
            Self::Iri => matches!(term, TermRef::NamedNode(_)),
            Self::BlankNode => matches!(term, TermRef::BlankNode(_)),
            Self::Literal => matches!(term, TermRef::Literal(_)),
            Self::BlankNodeOrIri => {
                matches!(term, TermRef::NamedNode(_) | TermRef::BlankNode(_))
            }
            Self::BlankNodeOrLiteral => {
                matches!(term, TermRef::BlankNode(_) | TermRef::Literal(_))
            }
            Self::IriOrLiteral => matches!(term, TermRef::NamedNode(_) | TermRef::Literal(_)),
        }
    }
}

/// Identifies the SHACL constraint component a validation result originates from.
///
/// Constraint kinds that bundle several parameters map to several components:
/// a [`Constraint::PropertyCount`] violation is reported as `MinCount` or
/// `MaxCount` depending on the failed bound, and a [`Constraint::StringShape`]
/// violation as `MinLength`, `MaxLength`, `Pattern` or, for values that are
/// not string literals, `Datatype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintComponent {
    /// `sh:MinCountConstraintComponent`
    MinCount,
    /// `sh:MaxCountConstraintComponent`
    MaxCount,
    /// `sh:DatatypeConstraintComponent`
    Datatype,
    /// `sh:ClassConstraintComponent`
    Class,
    /// `sh:NodeKindConstraintComponent`
    NodeKind,
    /// `sh:NodeConstraintComponent`
    Node,
    /// `sh:MinLengthConstraintComponent`
    MinLength,
    /// `sh:MaxLengthConstraintComponent`
    MaxLength,
    /// `sh:PatternConstraintComponent`
    Pattern,
    /// `sh:LanguageInConstraintComponent`
    LanguageIn,
    /// `sh:UniqueLangConstraintComponent`
    UniqueLang,
    /// `sh:HasValueConstraintComponent`
    HasValue,
}

impl ConstraintComponent {
    /// Returns the IRI identifying this component.
    pub fn iri(self) -> NamedNodeRef<'static> {
        match self {
            Self::MinCount => shacl::MIN_COUNT_CONSTRAINT_COMPONENT,
            Self::MaxCount => shacl::MAX_COUNT_CONSTRAINT_COMPONENT,
            Self::Datatype => shacl::DATATYPE_CONSTRAINT_COMPONENT,
            Self::Class => shacl::CLASS_CONSTRAINT_COMPONENT,
            Self::NodeKind => shacl::NODE_KIND_CONSTRAINT_COMPONENT,
            Self::Node => shacl::NODE_CONSTRAINT_COMPONENT,
            Self::MinLength => shacl::MIN_LENGTH_CONSTRAINT_COMPONENT,
            Self::MaxLength => shacl::MAX_LENGTH_CONSTRAINT_COMPONENT,
            Self::Pattern => shacl::PATTERN_CONSTRAINT_COMPONENT,
            Self::LanguageIn => shacl::LANGUAGE_IN_CONSTRAINT_COMPONENT,
            Self::UniqueLang => shacl::UNIQUE_LANG_CONSTRAINT_COMPONENT,
            Self::HasValue => shacl::HAS_VALUE_CONSTRAINT_COMPONENT,
        }
    }

    /// Returns the camel case parameter name of this component.
    pub fn name(self) -> &'static str {
        match self {
            Self::MinCount => "minCount",
            Self::MaxCount => "maxCount",
            Self::Datatype => "datatype",
            Self::Class => "class",
            Self::NodeKind => "nodeKind",
            Self::Node => "node",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Pattern => "pattern",
            Self::LanguageIn => "languageIn",
            Self::UniqueLang => "uniqueLang",
            Self::HasValue => "hasValue",
        }
    }
}

impl fmt::Display for ConstraintComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
