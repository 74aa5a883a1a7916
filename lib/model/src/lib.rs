mod binding;
mod error;

pub use binding::*;
pub use error::*;

// Re-export some oxrdf types.
pub use oxiri::Iri;
pub use oxrdf::vocab;
pub use oxrdf::{
    BlankNode, BlankNodeRef, GraphName, GraphNameRef, IriParseError, Literal, LiteralRef,
    NamedNode, NamedNodeRef, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Subject,
    SubjectRef, Term, TermRef, Triple, TripleRef, Variable, VariableNameParseError, VariableRef,
};

// Re-export the algebra vocabulary of spargebra that is shared between the crates.
pub use spargebra::algebra::{
    AggregateExpression, AggregateFunction, Expression, Function, GraphPattern, OrderExpression,
    PropertyPathExpression, QueryDataset,
};
pub use spargebra::term::{GroundTerm, NamedNodePattern, TermPattern, TriplePattern};

// Re-export the XSD value types used for numeric evaluation.
pub use oxsdatatypes::{Boolean, Decimal, Double, Float, Integer};

// Re-export the query type of spargebra. Parsing queries is delegated to spargebra.
pub use spargebra::{Query, SparqlSyntaxError};
