use crate::context::ExecutionContext;
use crate::error::{QueryEvaluationError, QueryResult};
use crate::expr::Expr;
use crate::iter::join::satisfies_guards;
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::Binding;
use std::sync::Arc;

/// A left join evaluated by substitution.
///
/// For every left binding, `substitute` creates the right side with the left binding as its
/// input. The right results that satisfy all `guards` are produced. If there is none, the left
/// binding is produced unchanged.
pub struct OptionalIndexIter<F> {
    input: BoxedQueryIter,
    substitute: F,
    guards: Vec<Expr>,
    context: Arc<ExecutionContext>,
    current: Option<CurrentLeft>,
    done: bool,
}

struct CurrentLeft {
    binding: Binding,
    right: BoxedQueryIter,
    matched: bool,
}

impl<F> OptionalIndexIter<F>
where
    F: FnMut(&Binding) -> QueryResult<BoxedQueryIter>,
{
    pub fn new(
        input: BoxedQueryIter,
        substitute: F,
        guards: Vec<Expr>,
        context: Arc<ExecutionContext>,
    ) -> Self {
        Self {
            input,
            substitute,
            guards,
            context,
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, error: QueryEvaluationError) -> Option<QueryResult<Binding>> {
        self.close();
        Some(Err(error))
    }
}

impl<F> Iterator for OptionalIndexIter<F>
where
    F: FnMut(&Binding) -> QueryResult<BoxedQueryIter>,
{
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if let Some(current) = &mut self.current {
                match current.right.next() {
                    Some(Ok(binding)) => {
                        match satisfies_guards(&self.guards, &binding, &self.context) {
                            Ok(true) => {
                                current.matched = true;
                                return Some(Ok(binding));
                            }
                            Ok(false) => continue,
                            Err(error) => return self.fail(error),
                        }
                    }
                    Some(Err(error)) => return self.fail(error),
                    None => {
                        current.right.close();
                        let finished = self.current.take();
                        if let Some(finished) = finished {
                            if !finished.matched {
                                return Some(Ok(finished.binding));
                            }
                        }
                    }
                }
                continue;
            }

            match self.input.next() {
                Some(Ok(binding)) => match (self.substitute)(&binding) {
                    Ok(right) => {
                        self.current = Some(CurrentLeft {
                            binding,
                            right,
                            matched: false,
                        });
                    }
                    Err(error) => return self.fail(error),
                },
                Some(Err(error)) => return self.fail(error),
                None => {
                    self.close();
                    return None;
                }
            }
        }
    }
}

impl<F> QueryIterator for OptionalIndexIter<F>
where
    F: FnMut(&Binding) -> QueryResult<BoxedQueryIter>,
{
    fn close(&mut self) {
        if self.done {
            return;
        }
        self.done = true;
        if let Some(mut current) = self.current.take() {
            current.right.close();
        }
        self.input.close();
    }
}
