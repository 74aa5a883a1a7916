//! The pull-based iterators that evaluate a compiled query.
//!
//! Every iterator exclusively owns its upstream iterators. Closing an iterator closes its
//! upstream iterators, and closing an iterator twice has no effect.

mod apply;
mod assign;
mod basic;
mod distinct;
mod filter;
mod group;
mod join;
mod minus;
mod optional;
mod project;
mod slice;
mod sort;

use crate::error::QueryResult;
use rdf_cursor_model::Binding;

pub use apply::{ConcatIter, RepeatApplyIter};
pub use assign::AssignIter;
pub use basic::{NullIter, PlainIter, RootIter, SingletonIter};
pub use distinct::{DistinctIter, ReducedIter};
pub use filter::FilterIter;
pub use group::{GroupIter, GroupSpec};
pub use join::{JoinIter, LeftJoinIter};
pub use minus::{DiffIter, MinusIter};
pub use optional::OptionalIndexIter;
pub use project::{ProjectIter, ProjectMergeIter};
pub use slice::SliceIter;
pub use sort::{SortCondition, SortIter};

/// A cursor over a sequence of [Binding]s.
///
/// Errors are reported through [Iterator::next]. An iterator that has reported an error does not
/// produce further results.
pub trait QueryIterator: Iterator<Item = QueryResult<Binding>> {
    /// Releases the resources of this iterator and closes its upstream iterators. Closing an
    /// iterator that has not been exhausted is legal.
    fn close(&mut self);

    /// Returns whether this iterator produces exactly one empty binding, the identity of the
    /// join.
    fn is_root(&self) -> bool {
        false
    }
}

pub type BoxedQueryIter = Box<dyn QueryIterator>;

/// Pulls all bindings from `iter` and closes it.
pub fn materialize(mut iter: BoxedQueryIter) -> QueryResult<Vec<Binding>> {
    let result = iter.by_ref().collect::<QueryResult<Vec<_>>>();
    iter.close();
    result
}
