use crate::memory::index::{GraphFilter, QuadIndex};
use crate::memory::object_id::{EncodedObjectId, EncodedPattern, DEFAULT_GRAPH_ID};
use crate::memory::object_id_mapping::MemObjectIdMapping;
use dashmap::DashSet;
use rdf_cursor_common::error::StorageError;
use rdf_cursor_common::{ActiveGraph, QuadStorage};
use rdf_cursor_model::{
    GraphNameRef, NamedNode, NamedOrBlankNode, NamedOrBlankNodeRef, Quad, QuadRef, Subject, Term,
    Triple,
};
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::BuildHasherDefault;
use tracing::debug;

/// A [QuadStorage] that keeps all quads in memory.
///
/// Terms are mapped to object ids and the encoded quads are indexed by each position. Triple
/// patterns are answered from the smallest matching index entry and return their triples in
/// insertion order.
///
/// Named graphs exist as long as they have not been removed explicitly, even if they contain no
/// quads.
#[derive(Debug, Default)]
pub struct MemQuadStorage {
    mapping: MemObjectIdMapping,
    index: QuadIndex,
    named_graphs: DashSet<EncodedObjectId, BuildHasherDefault<FxHasher>>,
}

impl MemQuadStorage {
    /// Creates a new empty [MemQuadStorage].
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `quad`. Returns whether it was new.
    pub fn insert_quad(&self, quad: QuadRef<'_>) -> bool {
        let encoded = self.mapping.encode_quad(quad);
        if encoded.graph_name != DEFAULT_GRAPH_ID {
            self.named_graphs.insert(encoded.graph_name);
        }
        self.index.insert(encoded)
    }

    /// Removes `quad`. Returns whether it was present.
    pub fn remove_quad(&self, quad: QuadRef<'_>) -> bool {
        self.mapping
            .try_encode_quad(quad)
            .is_some_and(|encoded| self.index.remove(&encoded))
    }

    /// Registers an empty named graph. Returns whether the graph was new.
    pub fn insert_named_graph(&self, graph_name: NamedOrBlankNodeRef<'_>) -> bool {
        let id = self.mapping.encode_graph_name(graph_name.into());
        self.named_graphs.insert(id)
    }

    /// Removes all quads of `graph_name` and the graph itself. Returns whether the graph existed.
    pub fn remove_named_graph(&self, graph_name: NamedOrBlankNodeRef<'_>) -> bool {
        let Some(id) = self.mapping.try_encode_graph_name(graph_name.into()) else {
            return false;
        };
        self.clear_encoded_graph(id);
        self.named_graphs.remove(&id).is_some()
    }

    /// Removes all quads of `graph_name`. The graph itself is kept.
    pub fn clear_graph(&self, graph_name: GraphNameRef<'_>) {
        if let Some(id) = self.mapping.try_encode_graph_name(graph_name) {
            self.clear_encoded_graph(id);
        }
    }

    /// Removes all quads and named graphs.
    pub fn clear(&self) {
        self.index.clear();
        self.named_graphs.clear();
    }

    fn clear_encoded_graph(&self, id: EncodedObjectId) {
        let quads = self.index.graph(id);
        debug!(graph = %id, quads = quads.len(), "Clearing graph");
        for quad in &quads {
            self.index.remove(quad);
        }
    }

    fn graph_filter(&self, active_graph: &ActiveGraph) -> GraphFilter {
        match active_graph {
            ActiveGraph::DefaultGraph => {
                GraphFilter::Only([DEFAULT_GRAPH_ID].into_iter().collect())
            }
            ActiveGraph::AllGraphs => GraphFilter::All,
            ActiveGraph::Union(graphs) => GraphFilter::Only(
                graphs
                    .iter()
                    .filter_map(|graph| self.mapping.try_encode_graph_name(graph.as_ref()))
                    .collect(),
            ),
        }
    }

    /// Encodes a triple pattern. Returns [None] if a bound term is unknown, in which case no
    /// triple can match.
    fn encode_pattern(
        &self,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> Option<EncodedPattern> {
        let encode = |term: Option<Term>| match term {
            Some(term) => self.mapping.try_encode_term(&term).map(Some),
            None => Some(None),
        };
        Some(EncodedPattern {
            subject: encode(subject.cloned().map(Term::from))?,
            predicate: encode(predicate.cloned().map(Term::from))?,
            object: encode(object.cloned())?,
        })
    }
}

impl FromIterator<Quad> for MemQuadStorage {
    fn from_iter<T: IntoIterator<Item = Quad>>(iter: T) -> Self {
        let storage = Self::new();
        for quad in iter {
            storage.insert_quad(quad.as_ref());
        }
        storage
    }
}

impl QuadStorage for MemQuadStorage {
    fn insert(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        Ok(self.insert_quad(quad))
    }

    fn remove(&self, quad: QuadRef<'_>) -> Result<bool, StorageError> {
        Ok(self.remove_quad(quad))
    }

    fn triples_for_pattern(
        &self,
        active_graph: &ActiveGraph,
        subject: Option<&Subject>,
        predicate: Option<&NamedNode>,
        object: Option<&Term>,
    ) -> Result<Vec<Triple>, StorageError> {
        let Some(pattern) = self.encode_pattern(subject, predicate, object) else {
            return Ok(Vec::new());
        };
        let graphs = self.graph_filter(active_graph);

        let mut seen = FxHashSet::default();
        self.index
            .scan(&pattern, &graphs)
            .iter()
            .filter(|quad| seen.insert(quad.triple()))
            .map(|quad| self.mapping.decode_triple(quad))
            .collect()
    }

    fn named_graphs(&self) -> Result<Vec<NamedOrBlankNode>, StorageError> {
        let mut ids = self.named_graphs.iter().map(|id| *id).collect::<Vec<_>>();
        ids.sort_unstable();
        ids.into_iter()
            .map(|id| self.mapping.decode_named_graph(id))
            .collect()
    }

    fn contains_named_graph(
        &self,
        graph_name: NamedOrBlankNodeRef<'_>,
    ) -> Result<bool, StorageError> {
        Ok(self
            .mapping
            .try_encode_graph_name(graph_name.into())
            .is_some_and(|id| self.named_graphs.contains(&id)))
    }

    fn len(&self) -> Result<usize, StorageError> {
        Ok(self.index.len())
    }

    fn quads_for_graph(&self, graph_name: GraphNameRef<'_>) -> Result<Vec<Quad>, StorageError> {
        let Some(id) = self.mapping.try_encode_graph_name(graph_name) else {
            return Ok(Vec::new());
        };
        self.index
            .graph(id)
            .iter()
            .map(|quad| self.mapping.decode_quad(quad))
            .collect()
    }
}
