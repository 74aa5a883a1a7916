use crate::context::ExecutionContext;
use crate::error::{QueryEvaluationError, QueryResult};
use crate::expr::{Accumulator, AggregateSpec};
use crate::iter::{BoxedQueryIter, QueryIterator};
use rdf_cursor_model::{Binding, BindingConflictError, Term, Variable};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// The keys and aggregates of a `GROUP BY`.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    pub variables: Vec<Variable>,
    pub aggregates: Vec<AggregateSpec>,
}

/// Groups its input by the key variables and computes the aggregates of every group.
///
/// Groups are produced in the order of their first binding. Without key variables, an empty
/// input still forms one group. An aggregate that fails leaves its variable unbound.
pub struct GroupIter {
    input: Option<BoxedQueryIter>,
    spec: GroupSpec,
    context: Arc<ExecutionContext>,
    output: std::vec::IntoIter<Binding>,
}

type GroupKey = Vec<Option<Term>>;
type Groups = (Vec<GroupKey>, FxHashMap<GroupKey, Vec<Accumulator>>);

impl GroupIter {
    pub fn new(input: BoxedQueryIter, spec: GroupSpec, context: Arc<ExecutionContext>) -> Self {
        Self {
            input: Some(input),
            spec,
            context,
            output: Vec::new().into_iter(),
        }
    }

    fn group(&self, mut input: BoxedQueryIter) -> QueryResult<Vec<Binding>> {
        let result = self.accumulate(&mut input);
        input.close();
        let (order, mut groups) = result?;

        if order.is_empty() && self.spec.variables.is_empty() {
            return Ok(vec![self.finish_group(&[], self.accumulators())?]);
        }

        let mut output = Vec::with_capacity(order.len());
        for key in order {
            if let Some(accumulators) = groups.remove(&key) {
                output.push(self.finish_group(&key, accumulators)?);
            }
        }
        Ok(output)
    }

    fn accumulate(&self, input: &mut BoxedQueryIter) -> QueryResult<Groups> {
        self.context.cancellation().check()?;
        let mut order = Vec::new();
        let mut groups = FxHashMap::<GroupKey, Vec<Accumulator>>::default();
        for binding in input.by_ref() {
            let binding = binding?;
            let key = self
                .spec
                .variables
                .iter()
                .map(|variable| binding.get(variable).cloned())
                .collect::<GroupKey>();
            let accumulators = groups.entry(key).or_insert_with_key(|key| {
                order.push(key.clone());
                self.accumulators()
            });
            for (aggregate, accumulator) in self.spec.aggregates.iter().zip(accumulators) {
                aggregate.update(accumulator, &binding, &self.context)?;
            }
        }
        self.context.cancellation().check()?;
        Ok((order, groups))
    }

    fn accumulators(&self) -> Vec<Accumulator> {
        self.spec
            .aggregates
            .iter()
            .map(AggregateSpec::accumulator)
            .collect()
    }

    fn finish_group(
        &self,
        key: &[Option<Term>],
        accumulators: Vec<Accumulator>,
    ) -> QueryResult<Binding> {
        let mut builder = Binding::builder();
        for (variable, value) in self.spec.variables.iter().zip(key) {
            if let Some(value) = value {
                builder
                    .add(variable.clone(), value.clone())
                    .map_err(conflict)?;
            }
        }
        for (aggregate, accumulator) in self.spec.aggregates.iter().zip(accumulators) {
            if let Some(value) = accumulator.finish() {
                builder
                    .add(aggregate.variable().clone(), value)
                    .map_err(conflict)?;
            }
        }
        Ok(builder.build())
    }
}

fn conflict(error: BindingConflictError) -> QueryEvaluationError {
    QueryEvaluationError::InternalError(format!("Group output binds a variable twice: {error}"))
}

impl Iterator for GroupIter {
    type Item = QueryResult<Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(input) = self.input.take() {
            match self.group(input) {
                Ok(output) => self.output = output.into_iter(),
                Err(error) => return Some(Err(error)),
            }
        }
        self.output.next().map(Ok)
    }
}

impl QueryIterator for GroupIter {
    fn close(&mut self) {
        if let Some(mut input) = self.input.take() {
            input.close();
        }
        self.output = Vec::new().into_iter();
    }
}
