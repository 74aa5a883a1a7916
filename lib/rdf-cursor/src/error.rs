use oxrdfio::{RdfFormat, RdfParseError};
use rdf_cursor_common::error::StorageError;
use rdf_cursor_engine::error::QueryEvaluationError;
use std::io;

/// An error raised while loading a file into a [`Store`](crate::store::Store).
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// An error raised while reading the file.
    #[error(transparent)]
    Parsing(#[from] RdfParseError),
    /// An error raised during the insertion in the store.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<LoaderError> for io::Error {
    #[inline]
    fn from(error: LoaderError) -> Self {
        match error {
            LoaderError::Storage(error) => error.into(),
            LoaderError::Parsing(error) => error.into(),
        }
    }
}

/// An error raised while writing a file or query results.
#[derive(Debug, thiserror::Error)]
pub enum SerializerError {
    /// An error raised while writing the content.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// An error raised while reading the quads from the store.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An error raised while evaluating the query whose results are written.
    #[error(transparent)]
    Evaluation(#[from] QueryEvaluationError),
    /// A format compatible with [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) is required.
    #[error("A RDF format supporting datasets was expected, {0} found")]
    DatasetFormatExpected(RdfFormat),
    /// Boolean and solution results can not be written as a graph and vice versa.
    #[error("Cannot write {0} results in the requested format")]
    UnsupportedResultKind(&'static str),
}
