use crate::memory::object_id::{EncodedObjectId, EncodedPattern, EncodedQuad};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rustc_hash::{FxHashSet, FxHasher};
use std::hash::BuildHasherDefault;
use std::sync::atomic::{AtomicU64, Ordering};

type FxBuildHasher = BuildHasherDefault<FxHasher>;
type QuadSet = FxHashSet<EncodedQuad>;
type PositionIndex = DashMap<EncodedObjectId, QuadSet, FxBuildHasher>;

/// Restricts a scan to a set of graphs.
#[derive(Debug, Clone)]
pub(super) enum GraphFilter {
    All,
    Only(FxHashSet<EncodedObjectId>),
}

impl GraphFilter {
    fn contains(&self, graph_name: EncodedObjectId) -> bool {
        match self {
            GraphFilter::All => true,
            GraphFilter::Only(graphs) => graphs.contains(&graph_name),
        }
    }

    fn single(&self) -> Option<EncodedObjectId> {
        match self {
            GraphFilter::Only(graphs) if graphs.len() == 1 => graphs.iter().next().copied(),
            _ => None,
        }
    }
}

/// Stores the encoded quads together with one index per position.
///
/// Every quad remembers its insertion sequence number such that scans can return quads in
/// insertion order.
#[derive(Debug, Default)]
pub(super) struct QuadIndex {
    next_sequence: AtomicU64,
    quads: DashMap<EncodedQuad, u64, FxBuildHasher>,
    by_graph: PositionIndex,
    by_subject: PositionIndex,
    by_predicate: PositionIndex,
    by_object: PositionIndex,
}

impl QuadIndex {
    pub(super) fn len(&self) -> usize {
        self.quads.len()
    }

    /// Inserts `quad`. Returns whether it was new.
    pub(super) fn insert(&self, quad: EncodedQuad) -> bool {
        match self.quads.entry(quad) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(entry) => {
                entry.insert(self.next_sequence.fetch_add(1, Ordering::Relaxed));
            }
        }
        for (index, key) in self.positions(&quad) {
            index.entry(key).or_default().insert(quad);
        }
        true
    }

    /// Removes `quad`. Returns whether it was present.
    pub(super) fn remove(&self, quad: &EncodedQuad) -> bool {
        if self.quads.remove(quad).is_none() {
            return false;
        }
        for (index, key) in self.positions(quad) {
            if let Some(mut quads) = index.get_mut(&key) {
                quads.remove(quad);
            }
            index.remove_if(&key, |_, quads| quads.is_empty());
        }
        true
    }

    pub(super) fn clear(&self) {
        self.quads.clear();
        self.by_graph.clear();
        self.by_subject.clear();
        self.by_predicate.clear();
        self.by_object.clear();
    }

    /// Returns the quads of `graph_name` in insertion order.
    pub(super) fn graph(&self, graph_name: EncodedObjectId) -> Vec<EncodedQuad> {
        let mut quads = match self.by_graph.get(&graph_name) {
            Some(quads) => quads
                .iter()
                .filter_map(|quad| self.sequenced(quad))
                .collect::<Vec<_>>(),
            None => Vec::new(),
        };
        quads.sort_unstable_by_key(|(sequence, _)| *sequence);
        quads.into_iter().map(|(_, quad)| quad).collect()
    }

    /// Returns the quads that match `pattern` within `graphs`, in insertion order.
    ///
    /// The scan starts from the smallest index entry among the bound positions. Without any
    /// bound position, all quads are scanned.
    pub(super) fn scan(&self, pattern: &EncodedPattern, graphs: &GraphFilter) -> Vec<EncodedQuad> {
        let bound = [
            (&self.by_subject, pattern.subject),
            (&self.by_predicate, pattern.predicate),
            (&self.by_object, pattern.object),
            (&self.by_graph, graphs.single()),
        ];

        let mut candidates = None;
        for (index, key) in bound {
            let Some(key) = key else {
                continue;
            };
            let Some(quads) = index.get(&key) else {
                return Vec::new();
            };
            let smaller = candidates
                .as_ref()
                .map_or(true, |current: &QuadSet| quads.len() < current.len());
            if smaller {
                candidates = Some(quads.value().clone());
            }
        }

        let selected = |quad: &EncodedQuad| pattern.matches(quad) && graphs.contains(quad.graph_name);
        let mut quads = match candidates {
            Some(candidates) => candidates
                .iter()
                .filter(|&quad| selected(quad))
                .filter_map(|quad| self.sequenced(quad))
                .collect::<Vec<_>>(),
            None => self
                .quads
                .iter()
                .filter(|entry| selected(entry.key()))
                .map(|entry| (*entry.value(), *entry.key()))
                .collect(),
        };
        quads.sort_unstable_by_key(|(sequence, _)| *sequence);
        quads.into_iter().map(|(_, quad)| quad).collect()
    }

    fn sequenced(&self, quad: &EncodedQuad) -> Option<(u64, EncodedQuad)> {
        self.quads.get(quad).map(|sequence| (*sequence, *quad))
    }

    fn positions(&self, quad: &EncodedQuad) -> [(&PositionIndex, EncodedObjectId); 4] {
        [
            (&self.by_graph, quad.graph_name),
            (&self.by_subject, quad.subject),
            (&self.by_predicate, quad.predicate),
            (&self.by_object, quad.object),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::object_id::DEFAULT_GRAPH_ID;

    fn quad(subject: u32, predicate: u32, object: u32) -> EncodedQuad {
        EncodedQuad {
            graph_name: DEFAULT_GRAPH_ID,
            subject: EncodedObjectId::new(subject),
            predicate: EncodedObjectId::new(predicate),
            object: EncodedObjectId::new(object),
        }
    }

    #[test]
    fn scan_returns_insertion_order() {
        let index = QuadIndex::default();
        index.insert(quad(3, 10, 1));
        index.insert(quad(1, 10, 2));
        index.insert(quad(2, 11, 3));

        let pattern = EncodedPattern {
            predicate: Some(EncodedObjectId::new(10)),
            ..EncodedPattern::default()
        };
        let result = index.scan(&pattern, &GraphFilter::All);

        assert_eq!(result, vec![quad(3, 10, 1), quad(1, 10, 2)]);
    }

    #[test]
    fn remove_cleans_up_positions() {
        let index = QuadIndex::default();
        let first = quad(1, 10, 2);
        assert!(index.insert(first));
        assert!(!index.insert(first));
        assert!(index.remove(&first));
        assert!(!index.remove(&first));

        assert_eq!(index.len(), 0);
        assert!(index.by_subject.is_empty());
        assert!(index.graph(DEFAULT_GRAPH_ID).is_empty());
    }
}
