use crate::error::StorageError;
use crate::ActiveGraph;
use rdf_cursor_model::{
    GraphNameRef, NamedNode, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Subject, Term,
    Triple,
};

/// Read and write access to a set of quads.
///
/// # Consistency
///
/// A query evaluates many triple patterns against the same storage. Implementations do not
/// provide snapshot isolation; concurrent writes may become visible in the middle of a query.
#[allow(clippy::len_without_is_empty, reason = "Emptiness is checked via len")]
pub trait QuadStorage: Send + Sync {
    /// Inserts the given quad. Returns whether the quad was new.
    fn insert(&self, quad: QuadRef<'_>) -> Result<bool, StorageError>;

    /// Loads the given quads into the storage. Returns the number of inserted quads.
    fn extend(&self, quads: Vec<Quad>) -> Result<usize, StorageError> {
        let mut count = 0;
        for quad in &quads {
            if self.insert(quad.as_ref())? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Removes the given quad from the storage. Returns whether the quad was present.
    fn remove(&self, quad: QuadRef<'_>) -> Result<bool, StorageError>;

    /// Returns the triples of the `active_graph` that match the given pattern. A [None] in any
    /// position acts as a wildcard.
    ///
    /// The result is a set: a triple that is contained in multiple graphs of the active graph is
    /// returned only once.
    fn triples_for_pattern(
        &self,
        active_graph: &ActiveGraph,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> Result<Vec<Triple>, StorageError>;

    /// Returns the list of named graphs in the storage.
    fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError>;

    /// Returns whether `graph_name` is a named graph in the storage.
    fn contains_named_graph(
        &self,
        graph_name: NamedOrBlankNodeRef<'_>,
    ) -> Result<bool, StorageError>;

    /// Returns the number of quads in the storage.
    fn len(&self) -> Result<usize, StorageError>;

    /// Returns all quads of the given graph.
    fn quads_for_graph(&self, graph_name: GraphNameRef<'_>) -> Result<Vec<Quad>, StorageError>;
}
