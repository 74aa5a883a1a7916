use crate::memory::object_id::{EncodedObjectId, EncodedQuad, DEFAULT_GRAPH_ID};
use dashmap::DashMap;
use rdf_cursor_common::error::{CorruptionError, StorageError};
use rdf_cursor_model::{
    GraphName, GraphNameRef, NamedNode, NamedOrBlankNode, Quad, QuadRef, Subject, Term, TermRef,
    Triple,
};
use rustc_hash::FxHasher;
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU32, Ordering};

/// Maintains a mapping between RDF terms and object IDs in memory.
///
/// # Object IDs
///
/// The encoded Object ID is a 32-bit unsigned integer used to uniquely identify RDF terms.
/// Currently, we simply use a counter to allocate new object IDs. Ids are never reused, even if
/// the last quad that refers to a term is removed.
#[derive(Debug)]
pub(super) struct MemObjectIdMapping {
    /// Contains the next free object id.
    next_id: AtomicU32,
    /// Maps object ids to their terms.
    id2term: DashMap<EncodedObjectId, Term, BuildHasherDefault<FxHasher>>,
    /// Maps terms to their object id.
    term2id: DashMap<Term, EncodedObjectId, BuildHasherDefault<FxHasher>>,
}

impl Default for MemObjectIdMapping {
    fn default() -> Self {
        Self::new()
    }
}

impl MemObjectIdMapping {
    pub(super) fn new() -> Self {
        Self {
            next_id: AtomicU32::new(1), // Start at 1 to account for Default Graph.
            id2term: DashMap::with_hasher(BuildHasherDefault::default()),
            term2id: DashMap::with_hasher(BuildHasherDefault::default()),
        }
    }

    /// Returns the object id of `term`, allocating a new one if the term is unknown.
    pub(super) fn encode_term(&self, term: TermRef<'_>) -> EncodedObjectId {
        let term = term.into_owned();
        if let Some(id) = self.term2id.get(&term) {
            return *id;
        }

        *self.term2id.entry(term.clone()).or_insert_with(|| {
            let id = EncodedObjectId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
            self.id2term.insert(id, term);
            id
        })
    }

    /// Returns the object id of `term` if the term is known.
    pub(super) fn try_encode_term(&self, term: &Term) -> Option<EncodedObjectId> {
        self.term2id.get(term).map(|id| *id)
    }

    pub(super) fn encode_graph_name(&self, graph_name: GraphNameRef<'_>) -> EncodedObjectId {
        match graph_name {
            GraphNameRef::NamedNode(node) => self.encode_term(node.into()),
            GraphNameRef::BlankNode(node) => self.encode_term(node.into()),
            GraphNameRef::DefaultGraph => DEFAULT_GRAPH_ID,
        }
    }

    pub(super) fn try_encode_graph_name(
        &self,
        graph_name: GraphNameRef<'_>,
    ) -> Option<EncodedObjectId> {
        match graph_name {
            GraphNameRef::NamedNode(node) => self.try_encode_term(&node.into_owned().into()),
            GraphNameRef::BlankNode(node) => self.try_encode_term(&node.into_owned().into()),
            GraphNameRef::DefaultGraph => Some(DEFAULT_GRAPH_ID),
        }
    }

    /// Encodes the entire `quad`.
    pub(super) fn encode_quad(&self, quad: QuadRef<'_>) -> EncodedQuad {
        EncodedQuad {
            graph_name: self.encode_graph_name(quad.graph_name),
            subject: self.encode_term(quad.subject.into()),
            predicate: self.encode_term(quad.predicate.into()),
            object: self.encode_term(quad.object),
        }
    }

    /// Encodes `quad` without allocating new ids. Returns [None] if any of its terms is unknown,
    /// in which case the quad cannot be stored.
    pub(super) fn try_encode_quad(&self, quad: QuadRef<'_>) -> Option<EncodedQuad> {
        Some(EncodedQuad {
            graph_name: self.try_encode_graph_name(quad.graph_name)?,
            subject: self.try_encode_term(&quad.subject.into_owned().into())?,
            predicate: self.try_encode_term(&quad.predicate.into_owned().into())?,
            object: self.try_encode_term(&quad.object.into_owned())?,
        })
    }

    /// Decodes the given `object_id`.
    ///
    /// # Error
    ///
    /// Returns an error if the object id is unknown.
    pub(super) fn decode_term(&self, object_id: EncodedObjectId) -> Result<Term, StorageError> {
        self.id2term
            .get(&object_id)
            .map(|term| term.clone())
            .ok_or_else(|| CorruptionError::msg(format!("Unknown object id {object_id}")).into())
    }

    /// Decodes the given `object_id` as the name of a named graph.
    pub(super) fn decode_named_graph(
        &self,
        object_id: EncodedObjectId,
    ) -> Result<NamedOrBlankNode, StorageError> {
        match self.decode_term(object_id)? {
            Term::NamedNode(node) => Ok(node.into()),
            Term::BlankNode(node) => Ok(node.into()),
            term => Err(CorruptionError::msg(format!("{term} is not a graph name")).into()),
        }
    }

    pub(super) fn decode_triple(&self, quad: &EncodedQuad) -> Result<Triple, StorageError> {
        Ok(Triple::new(
            self.decode_subject(quad.subject)?,
            self.decode_named_node(quad.predicate)?,
            self.decode_term(quad.object)?,
        ))
    }

    pub(super) fn decode_quad(&self, quad: &EncodedQuad) -> Result<Quad, StorageError> {
        let graph_name = if quad.graph_name == DEFAULT_GRAPH_ID {
            GraphName::DefaultGraph
        } else {
            self.decode_named_graph(quad.graph_name)?.into()
        };
        Ok(Quad::new(
            self.decode_subject(quad.subject)?,
            self.decode_named_node(quad.predicate)?,
            self.decode_term(quad.object)?,
            graph_name,
        ))
    }

    fn decode_subject(&self, object_id: EncodedObjectId) -> Result<Subject, StorageError> {
        match self.decode_term(object_id)? {
            Term::NamedNode(node) => Ok(node.into()),
            Term::BlankNode(node) => Ok(node.into()),
            term => Err(CorruptionError::msg(format!("{term} is not a subject")).into()),
        }
    }

    fn decode_named_node(&self, object_id: EncodedObjectId) -> Result<NamedNode, StorageError> {
        match self.decode_term(object_id)? {
            Term::NamedNode(node) => Ok(node),
            term => Err(CorruptionError::msg(format!("{term} is not a predicate")).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_cursor_model::{Literal, NamedNodeRef};

    #[test]
    fn equal_terms_share_an_id() {
        let mapping = MemObjectIdMapping::new();
        let ex = NamedNodeRef::new_unchecked("http://example.com/a");

        let first = mapping.encode_term(ex.into());
        let second = mapping.encode_term(ex.into());

        assert_eq!(first, second);
        assert_ne!(first, DEFAULT_GRAPH_ID);
        assert_eq!(mapping.decode_term(first).unwrap(), Term::from(ex.into_owned()));
    }

    #[test]
    fn unknown_terms_are_not_allocated() {
        let mapping = MemObjectIdMapping::new();
        let literal = Term::from(Literal::new_simple_literal("x"));

        assert_eq!(mapping.try_encode_term(&literal), None);
        assert!(mapping.decode_term(EncodedObjectId::new(42)).is_err());
    }
}
