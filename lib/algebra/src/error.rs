use rdf_cursor_model::BindingConflictError;

/// An error that occurs while translating a query into the algebra.
#[derive(Debug, thiserror::Error)]
pub enum AlgebraError {
    #[error("The construct is not supported: {0}")]
    Unsupported(String),
    #[error(transparent)]
    BindingConflict(#[from] BindingConflictError),
}
