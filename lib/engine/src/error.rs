use rdf_cursor_algebra::AlgebraError;
use rdf_cursor_common::error::StorageError;
use rdf_cursor_model::{NamedNode, SparqlSyntaxError, Term, ThinError};
use std::convert::Infallible;
use std::error::Error;
use tracing::error;

pub type QueryResult<T> = Result<T, QueryEvaluationError>;

/// A query evaluation error.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryEvaluationError {
    /// An error in SPARQL parsing.
    #[error(transparent)]
    Parsing(#[from] SparqlSyntaxError),
    /// An error from the storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An error while translating the query into the algebra.
    #[error(transparent)]
    Algebra(#[from] AlgebraError),
    /// Error during `SERVICE` evaluation
    #[error("{0}")]
    Service(#[source] Box<dyn Error + Send + Sync + 'static>),
    /// The variable storing the `SERVICE` name is unbound
    #[error("The variable encoding the service name is unbound")]
    UnboundService,
    /// The given `SERVICE` is not supported
    #[error("The service {0} is not supported")]
    UnsupportedService(NamedNode),
    /// The `SERVICE` name is not an IRI
    #[error("{0} is not a valid service name")]
    InvalidServiceName(Term),
    /// The query has been cancelled.
    #[error("The query has been cancelled")]
    Cancelled,
    #[error("A feature has not yet been implemented: {0}")]
    NotImplemented(String),
    #[error("An internal error that likely indicates towards a bug in RdfCursor: {0}")]
    InternalError(String),
}

impl QueryEvaluationError {
    /// Logs and returns an [QueryEvaluationError::InternalError].
    pub fn internal<T>(cause: String) -> Result<T, Self> {
        error!(cause, "Internal error during query evaluation");
        Err(QueryEvaluationError::InternalError(cause))
    }

    pub fn not_implemented<T>(feature: impl Into<String>) -> Result<T, Self> {
        Err(QueryEvaluationError::NotImplemented(feature.into()))
    }
}

impl From<Infallible> for QueryEvaluationError {
    #[inline]
    fn from(error: Infallible) -> Self {
        match error {}
    }
}

/// The error of evaluating an expression.
///
/// A [ThinError] is an expected outcome of SPARQL expression evaluation (e.g., a type error) and
/// is handled by the operator that evaluates the expression. A [QueryEvaluationError] aborts
/// the query.
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    #[error(transparent)]
    Thin(#[from] ThinError),
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
}

pub type ExpressionResult<T> = Result<T, ExpressionError>;

impl ExpressionError {
    /// Turns an expected error into [None] and propagates fatal errors.
    pub fn recover<T>(result: ExpressionResult<T>) -> QueryResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(ExpressionError::Thin(_)) => Ok(None),
            Err(ExpressionError::Evaluation(error)) => Err(error),
        }
    }
}
