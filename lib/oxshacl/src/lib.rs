#![doc = include_str!("../README.md")]
#![doc(test(attr(deny(warnings))))]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod constraint;
mod error;
mod model;
mod report;
mod validator;
pub mod vocab;

pub use constraint::{Constraint, ConstraintComponent, NodeKind};
pub use error::ShapeDefinitionError;
pub use model::{NodeShape, ParseDiagnostic, PropertyShape, ShapeId, ShapesGraph, Target};
pub use report::{ValidationReport, Violation};
pub use validator::ShaclValidator;
