use crate::context::ExecutionContext;
use crate::error::{ExpressionError, QueryEvaluationError, QueryResult};
use crate::expr::value::{order_cmp, Numeric, TypedValueRef};
use crate::expr::Expr;
use rdf_cursor_model::{
    AggregateExpression, AggregateFunction, Binding, Integer, Literal, Term, ThinError,
    ThinResult, Variable,
};
use rustc_hash::FxHashSet;
use std::cmp::Ordering;
use std::sync::Arc;

/// A compiled aggregate that binds its result to `variable`.
#[derive(Debug, Clone)]
pub struct AggregateSpec {
    variable: Variable,
    kind: AggregateKind,
    argument: Option<Expr>,
    distinct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum AggregateKind {
    CountSolutions,
    Count,
    Sum,
    Avg,
    Min,
    Max,
    Sample,
    GroupConcat { separator: String },
}

impl AggregateSpec {
    pub fn compile(variable: &Variable, aggregate: &AggregateExpression) -> QueryResult<Self> {
        let (kind, argument, distinct) = match aggregate {
            AggregateExpression::CountSolutions { distinct } => {
                (AggregateKind::CountSolutions, None, *distinct)
            }
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => {
                let kind = match name {
                    AggregateFunction::Count => AggregateKind::Count,
                    AggregateFunction::Sum => AggregateKind::Sum,
                    AggregateFunction::Avg => AggregateKind::Avg,
                    AggregateFunction::Min => AggregateKind::Min,
                    AggregateFunction::Max => AggregateKind::Max,
                    AggregateFunction::Sample => AggregateKind::Sample,
                    AggregateFunction::GroupConcat { separator } => AggregateKind::GroupConcat {
                        separator: separator.clone().unwrap_or_else(|| " ".to_owned()),
                    },
                    AggregateFunction::Custom(name) => {
                        return QueryEvaluationError::not_implemented(format!(
                            "Custom aggregate {name}"
                        ))
                    }
                };
                (kind, Some(Expr::compile(expr)?), *distinct)
            }
        };
        Ok(Self {
            variable: variable.clone(),
            kind,
            argument,
            distinct,
        })
    }

    pub fn variable(&self) -> &Variable {
        &self.variable
    }

    /// Creates the state for one group.
    pub fn accumulator(&self) -> Accumulator {
        let state = match &self.kind {
            AggregateKind::CountSolutions | AggregateKind::Count => AccumulatorState::Count(0),
            AggregateKind::Sum => AccumulatorState::Sum(Ok(zero())),
            AggregateKind::Avg => AccumulatorState::Avg {
                sum: Ok(zero()),
                count: 0,
            },
            AggregateKind::Min => AccumulatorState::Min(None),
            AggregateKind::Max => AccumulatorState::Max(None),
            AggregateKind::Sample => AccumulatorState::Sample(None),
            AggregateKind::GroupConcat { separator } => AccumulatorState::GroupConcat {
                separator: separator.clone(),
                value: Ok(String::new()),
                language: None,
                empty: true,
            },
        };
        Accumulator {
            state,
            seen_terms: FxHashSet::default(),
            seen_solutions: FxHashSet::default(),
        }
    }

    /// Feeds `binding` into `accumulator`.
    pub fn update(
        &self,
        accumulator: &mut Accumulator,
        binding: &Binding,
        context: &Arc<ExecutionContext>,
    ) -> QueryResult<()> {
        let Some(argument) = &self.argument else {
            if self.distinct && !accumulator.seen_solutions.insert(binding.clone()) {
                return Ok(());
            }
            accumulator.state.add(None);
            return Ok(());
        };

        let value = match argument.evaluate(binding, context) {
            Ok(value) => Ok(value),
            Err(ExpressionError::Thin(error)) => Err(error),
            Err(ExpressionError::Evaluation(error)) => return Err(error),
        };
        if let Ok(value) = &value {
            if self.distinct && !accumulator.seen_terms.insert(value.clone()) {
                return Ok(());
            }
        }
        accumulator.state.add(Some(value));
        Ok(())
    }
}

/// The state of an aggregate for one group.
#[derive(Debug)]
pub struct Accumulator {
    state: AccumulatorState,
    seen_terms: FxHashSet<Term>,
    seen_solutions: FxHashSet<Binding>,
}

impl Accumulator {
    /// Returns the value of the aggregate, or [None] if the aggregate produced an error.
    pub fn finish(self) -> Option<Term> {
        self.state.finish()
    }
}

#[derive(Debug)]
enum AccumulatorState {
    Count(u64),
    Sum(ThinResult<Numeric>),
    Avg {
        sum: ThinResult<Numeric>,
        count: u64,
    },
    Min(Option<Term>),
    Max(Option<Term>),
    Sample(Option<Term>),
    GroupConcat {
        separator: String,
        value: ThinResult<String>,
        /// The common language of all values, [None] before the first value.
        language: Option<Option<String>>,
        empty: bool,
    },
}

impl AccumulatorState {
    /// Adds a value. `None` stands for a solution of `COUNT(*)`.
    fn add(&mut self, value: Option<ThinResult<Term>>) {
        match self {
            AccumulatorState::Count(count) => {
                // COUNT(expr) only counts the solutions where `expr` could be evaluated.
                if value.as_ref().map_or(true, Result::is_ok) {
                    *count += 1;
                }
            }
            AccumulatorState::Sum(sum) => {
                *sum = add_numeric(*sum, value);
            }
            AccumulatorState::Avg { sum, count } => {
                *sum = add_numeric(*sum, value);
                *count += 1;
            }
            AccumulatorState::Min(current) => {
                if let Some(Ok(value)) = value {
                    let smaller = current.as_ref().map_or(true, |current| {
                        order_cmp(Some(&value), Some(current)) == Ordering::Less
                    });
                    if smaller {
                        *current = Some(value);
                    }
                }
            }
            AccumulatorState::Max(current) => {
                if let Some(Ok(value)) = value {
                    let greater = current.as_ref().map_or(true, |current| {
                        order_cmp(Some(&value), Some(current)) == Ordering::Greater
                    });
                    if greater {
                        *current = Some(value);
                    }
                }
            }
            AccumulatorState::Sample(current) => {
                if current.is_none() {
                    if let Some(Ok(value)) = value {
                        *current = Some(value);
                    }
                }
            }
            AccumulatorState::GroupConcat {
                separator,
                value: concatenated,
                language,
                empty,
            } => {
                let Some(Ok(term)) = value else {
                    *concatenated = ThinError::expected();
                    return;
                };
                let Ok((string, term_language)) = TypedValueRef::from_term(&term).string_literal()
                else {
                    *concatenated = ThinError::expected();
                    return;
                };
                let Ok(result) = concatenated.as_mut() else {
                    return;
                };

                if !*empty {
                    result.push_str(separator);
                }
                result.push_str(string);
                *empty = false;
                *language = match language.take() {
                    None => Some(term_language.map(str::to_owned)),
                    Some(current) if current.as_deref() == term_language => Some(current),
                    Some(_) => Some(None),
                };
            }
        }
    }

    fn finish(self) -> Option<Term> {
        match self {
            AccumulatorState::Count(count) => {
                let count = i64::try_from(count).ok()?;
                Some(Literal::from(count).into())
            }
            AccumulatorState::Sum(sum) => sum.ok().map(|sum| sum.into_literal().into()),
            AccumulatorState::Avg { sum, count } => {
                if count == 0 {
                    return Some(zero().into_literal().into());
                }
                let count = Numeric::Integer(Integer::from(i64::try_from(count).ok()?));
                sum.and_then(|sum| sum.divide(count))
                    .ok()
                    .map(|avg| avg.into_literal().into())
            }
            AccumulatorState::Min(value)
            | AccumulatorState::Max(value)
            | AccumulatorState::Sample(value) => value,
            AccumulatorState::GroupConcat {
                value, language, ..
            } => {
                let value = value.ok()?;
                match language.flatten() {
                    Some(language) => Literal::new_language_tagged_literal(value, language)
                        .ok()
                        .map(Into::into),
                    None => Some(Literal::new_simple_literal(value).into()),
                }
            }
        }
    }
}

fn zero() -> Numeric {
    Numeric::Integer(Integer::from(0))
}

fn add_numeric(sum: ThinResult<Numeric>, value: Option<ThinResult<Term>>) -> ThinResult<Numeric> {
    let sum = sum?;
    let value = value.ok_or(ThinError::default())??;
    match TypedValueRef::from_term(&value) {
        TypedValueRef::NumericLiteral(value) => sum.add(value),
        _ => ThinError::expected(),
    }
}
