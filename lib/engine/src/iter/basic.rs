use crate::error::QueryResult;
use crate::iter::QueryIterator;
use rdf_cursor_model::Binding;
use std::sync::Arc;

/// Produces a single empty binding.
#[derive(Debug, Default)]
pub struct RootIter {
    done: bool,
}

impl RootIter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Iterator for RootIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(Ok(Binding::root()))
    }
}

impl QueryIterator for RootIter {
    fn close(&mut self) {
        self.done = true;
    }

    fn is_root(&self) -> bool {
        !self.done
    }
}

/// Produces a single binding.
#[derive(Debug)]
pub struct SingletonIter {
    binding: Option<Binding>,
}

impl SingletonIter {
    pub fn new(binding: Binding) -> Self {
        Self {
            binding: Some(binding),
        }
    }
}

impl Iterator for SingletonIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.binding.take().map(Ok)
    }
}

impl QueryIterator for SingletonIter {
    fn close(&mut self) {
        self.binding = None;
    }

    fn is_root(&self) -> bool {
        self.binding.as_ref().is_some_and(Binding::is_empty)
    }
}

/// Produces the bindings of a shared slice, for example the rows of a table.
#[derive(Debug)]
pub struct PlainIter {
    rows: Arc<[Binding]>,
    position: usize,
}

impl PlainIter {
    pub fn new(rows: Arc<[Binding]>) -> Self {
        Self { rows, position: 0 }
    }

    pub fn from_vec(rows: Vec<Binding>) -> Self {
        Self::new(rows.into())
    }
}

impl Iterator for PlainIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        let binding = self.rows.get(self.position)?.clone();
        self.position += 1;
        Some(Ok(binding))
    }
}

impl QueryIterator for PlainIter {
    fn close(&mut self) {
        self.position = self.rows.len();
    }
}

/// Produces no bindings.
#[derive(Debug, Default)]
pub struct NullIter;

impl Iterator for NullIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

impl QueryIterator for NullIter {
    fn close(&mut self) {}
}
