use crate::error::{QueryEvaluationError, QueryResult};
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_algebra::is_non_distinguished;
use rdf_cursor_model::{Binding, Variable};

/// Restricts every binding to a set of variables.
pub struct ProjectIter {
    input: BoxedQueryIter,
    projection: Projection,
}

enum Projection {
    Variables(Vec<Variable>),
    HideNonDistinguished,
}

impl ProjectIter {
    pub fn new(input: BoxedQueryIter, variables: Vec<Variable>) -> Self {
        Self {
            input,
            projection: Projection::Variables(variables),
        }
    }

    /// Removes the variables that have been introduced for blank nodes of the query.
    pub fn hide_non_distinguished(input: BoxedQueryIter) -> Self {
        Self {
            input,
            projection: Projection::HideNonDistinguished,
        }
    }
}

impl Iterator for ProjectIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        let binding = match self.input.next()? {
            Ok(binding) => binding,
            Err(error) => return Some(Err(error)),
        };
        Some(Ok(match &self.projection {
            Projection::Variables(variables) => binding.project(variables),
            Projection::HideNonDistinguished => binding.retain(|v| !is_non_distinguished(v)),
        }))
    }
}

impl QueryIterator for ProjectIter {
    fn close(&mut self) {
        self.input.close();
    }
}

/// A projection that is evaluated below another operator.
///
/// For every outer binding, the inner pattern is evaluated with the outer values of the
/// projected variables as input. The results are restricted to the projected variables and
/// merged back into the outer binding, such that the variables the outer operator correlates on
/// are kept.
pub struct ProjectMergeIter<F> {
    input: BoxedQueryIter,
    variables: Vec<Variable>,
    substitute: F,
    current: Option<(Binding, BoxedQueryIter)>,
    done: bool,
}

impl<F> ProjectMergeIter<F>
where
    F: FnMut(Binding) -> QueryResult<BoxedQueryIter>,
{
    pub fn new(input: BoxedQueryIter, variables: Vec<Variable>, substitute: F) -> Self {
        Self {
            input,
            variables,
            substitute,
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, error: QueryEvaluationError) -> Option<QueryResult<Binding>> {
        self.close();
        Some(Err(error))
    }
}

impl<F> Iterator for ProjectMergeIter<F>
where
    F: FnMut(Binding) -> QueryResult<BoxedQueryIter>,
{
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if let Some((outer, inner)) = &mut self.current {
                match inner.next() {
                    Some(Ok(binding)) => {
                        // The inner result extends the projected outer binding.
                        if let Some(merged) = outer.merge(&binding.project(&self.variables)) {
                            return Some(Ok(merged));
                        }
                        continue;
                    }
                    Some(Err(error)) => return self.fail(error),
                    None => {
                        inner.close();
                        self.current = None;
                    }
                }
            }

            match self.input.next() {
                Some(Ok(outer)) => {
                    let seed = outer.project(&self.variables);
                    match (self.substitute)(seed) {
                        Ok(inner) => self.current = Some((outer, inner)),
                        Err(error) => return self.fail(error),
                    }
                }
                Some(Err(error)) => return self.fail(error),
                None => {
                    self.close();
                    return None;
                }
            }
        }
    }
}

impl<F> QueryIterator for ProjectMergeIter<F>
where
    F: FnMut(Binding) -> QueryResult<BoxedQueryIter>,
{
    fn close(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Some((_, mut inner)) = self.current.take() {
            inner.close();
        }
        self.input.close();
    }
}
