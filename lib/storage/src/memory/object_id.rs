use std::fmt::{Display, Formatter};

/// Identifies a term within a [MemObjectIdMapping](super::object_id_mapping::MemObjectIdMapping).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(super) struct EncodedObjectId(u32);

/// The object id of the default graph. No term is ever mapped to it.
pub(super) const DEFAULT_GRAPH_ID: EncodedObjectId = EncodedObjectId(0);

impl EncodedObjectId {
    pub(super) const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl Display for EncodedObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A quad whose terms have been replaced by their object ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) struct EncodedQuad {
    pub(super) graph_name: EncodedObjectId,
    pub(super) subject: EncodedObjectId,
    pub(super) predicate: EncodedObjectId,
    pub(super) object: EncodedObjectId,
}

impl EncodedQuad {
    /// The same triple can be stored in multiple graphs.
    pub(super) fn triple(&self) -> (EncodedObjectId, EncodedObjectId, EncodedObjectId) {
        (self.subject, self.predicate, self.object)
    }
}

/// A triple pattern over object ids. [None] matches any term.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct EncodedPattern {
    pub(super) subject: Option<EncodedObjectId>,
    pub(super) predicate: Option<EncodedObjectId>,
    pub(super) object: Option<EncodedObjectId>,
}

impl EncodedPattern {
    pub(super) fn matches(&self, quad: &EncodedQuad) -> bool {
        self.subject.map_or(true, |id| id == quad.subject)
            && self.predicate.map_or(true, |id| id == quad.predicate)
            && self.object.map_or(true, |id| id == quad.object)
    }
}
