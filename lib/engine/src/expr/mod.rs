//! Evaluation of SPARQL expressions against a single [Binding].
//!
//! Expressions are compiled once, when the iterator pipeline is built. Compilation fails fast
//! for functions that are not supported, such that a query never starts evaluating with an
//! expression it cannot evaluate.

mod aggregate;
mod functions;
mod value;

use crate::compiler::OpCompiler;
use crate::context::ExecutionContext;
use crate::error::{ExpressionError, ExpressionResult, QueryEvaluationError, QueryResult};
use crate::iter::SingletonIter;
use functions::BuiltIn;
use rdf_cursor_algebra::{AlgebraGenerator, Op};
use rdf_cursor_model::{
    Binding, Expression, Function, Literal, OrderExpression, Term, ThinError, Variable,
};
use regex::Regex;
use std::cmp::Ordering;
use std::sync::Arc;

pub use aggregate::{Accumulator, AggregateSpec};
pub(crate) use value::order_cmp;

/// A compiled SPARQL expression.
#[derive(Debug, Clone)]
pub enum Expr {
    Constant(Term),
    Variable(Variable),
    Or(Box<Expr>, Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Equal(Box<Expr>, Box<Expr>),
    SameTerm(Box<Expr>, Box<Expr>),
    Compare(CompareOp, Box<Expr>, Box<Expr>),
    In(Box<Expr>, Vec<Expr>),
    Arithmetic(ArithmeticOp, Box<Expr>, Box<Expr>),
    UnaryPlus(Box<Expr>),
    UnaryMinus(Box<Expr>),
    /// `EXISTS { pattern }`, evaluated against the current binding.
    Exists(Arc<Op>),
    Bound(Variable),
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    Coalesce(Vec<Expr>),
    Call(BuiltIn, Vec<Expr>),
    Regex {
        text: Box<Expr>,
        pattern: RegexPattern,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

/// The pattern of a `REGEX` call. Constant patterns are compiled once.
#[derive(Debug, Clone)]
pub enum RegexPattern {
    Static(Regex),
    Dynamic {
        pattern: Box<Expr>,
        flags: Option<Box<Expr>>,
    },
}

impl Expr {
    /// Compiles `expression`. Returns [QueryEvaluationError::NotImplemented] for functions that
    /// cannot be evaluated.
    pub fn compile(expression: &Expression) -> QueryResult<Self> {
        let compile_box = |e: &Expression| Self::compile(e).map(Box::new);
        Ok(match expression {
            Expression::NamedNode(node) => Expr::Constant(node.clone().into()),
            Expression::Literal(literal) => Expr::Constant(literal.clone().into()),
            Expression::Variable(variable) => Expr::Variable(variable.clone()),
            Expression::Or(lhs, rhs) => Expr::Or(compile_box(lhs)?, compile_box(rhs)?),
            Expression::And(lhs, rhs) => Expr::And(compile_box(lhs)?, compile_box(rhs)?),
            Expression::Not(inner) => Expr::Not(compile_box(inner)?),
            Expression::Equal(lhs, rhs) => Expr::Equal(compile_box(lhs)?, compile_box(rhs)?),
            Expression::SameTerm(lhs, rhs) => {
                Expr::SameTerm(compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::Greater(lhs, rhs) => {
                Expr::Compare(CompareOp::Greater, compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::GreaterOrEqual(lhs, rhs) => Expr::Compare(
                CompareOp::GreaterOrEqual,
                compile_box(lhs)?,
                compile_box(rhs)?,
            ),
            Expression::Less(lhs, rhs) => {
                Expr::Compare(CompareOp::Less, compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::LessOrEqual(lhs, rhs) => {
                Expr::Compare(CompareOp::LessOrEqual, compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::In(lhs, rhs) => Expr::In(
                compile_box(lhs)?,
                rhs.iter().map(Self::compile).collect::<QueryResult<_>>()?,
            ),
            Expression::Add(lhs, rhs) => {
                Expr::Arithmetic(ArithmeticOp::Add, compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::Subtract(lhs, rhs) => {
                Expr::Arithmetic(ArithmeticOp::Subtract, compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::Multiply(lhs, rhs) => {
                Expr::Arithmetic(ArithmeticOp::Multiply, compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::Divide(lhs, rhs) => {
                Expr::Arithmetic(ArithmeticOp::Divide, compile_box(lhs)?, compile_box(rhs)?)
            }
            Expression::UnaryPlus(inner) => Expr::UnaryPlus(compile_box(inner)?),
            Expression::UnaryMinus(inner) => Expr::UnaryMinus(compile_box(inner)?),
            Expression::Exists(pattern) => {
                Expr::Exists(Arc::new(AlgebraGenerator::new().translate(pattern)?))
            }
            Expression::Bound(variable) => Expr::Bound(variable.clone()),
            Expression::If(test, if_true, if_false) => Expr::If(
                compile_box(test)?,
                compile_box(if_true)?,
                compile_box(if_false)?,
            ),
            Expression::Coalesce(args) => {
                Expr::Coalesce(args.iter().map(Self::compile).collect::<QueryResult<_>>()?)
            }
            Expression::FunctionCall(function, args) => Self::compile_function(function, args)?,
        })
    }

    fn compile_function(function: &Function, args: &[Expression]) -> QueryResult<Self> {
        if matches!(function, Function::Regex) {
            return Self::compile_regex(args);
        }

        let Some(builtin) = BuiltIn::from_function(function) else {
            return QueryEvaluationError::not_implemented(format!("Function {function}"));
        };
        if !builtin.accepts_arity(args.len()) {
            return QueryEvaluationError::internal(format!(
                "Function {function} called with {} arguments",
                args.len()
            ));
        }

        let args = args.iter().map(Self::compile).collect::<QueryResult<_>>()?;
        Ok(Expr::Call(builtin, args))
    }

    fn compile_regex(args: &[Expression]) -> QueryResult<Self> {
        let (text, pattern, flags) = match args {
            [text, pattern] => (text, pattern, None),
            [text, pattern, flags] => (text, pattern, Some(flags)),
            _ => {
                return QueryEvaluationError::internal(format!(
                    "REGEX called with {} arguments",
                    args.len()
                ))
            }
        };

        let static_pattern = match (pattern, flags) {
            (Expression::Literal(pattern), None) => Some((pattern, None)),
            (Expression::Literal(pattern), Some(Expression::Literal(flags))) => {
                Some((pattern, Some(flags)))
            }
            _ => None,
        };

        let pattern = match static_pattern {
            Some((pattern, flags)) if is_simple(pattern) && flags.map_or(true, is_simple) => {
                match functions::compile_pattern(pattern.value(), flags.map(Literal::value)) {
                    Ok(regex) => RegexPattern::Static(regex),
                    // An invalid constant pattern stays dynamic and fails for every row.
                    Err(_) => RegexPattern::Dynamic {
                        pattern: Box::new(Expr::Constant(pattern.clone().into())),
                        flags: flags.map(|flags| Box::new(Expr::Constant(flags.clone().into()))),
                    },
                }
            }
            _ => RegexPattern::Dynamic {
                pattern: Box::new(Self::compile(pattern)?),
                flags: flags.map(Self::compile).transpose()?.map(Box::new),
            },
        };

        Ok(Expr::Regex {
            text: Box::new(Self::compile(text)?),
            pattern,
        })
    }

    /// Evaluates the expression against `binding`.
    pub fn evaluate(
        &self,
        binding: &Binding,
        context: &Arc<ExecutionContext>,
    ) -> ExpressionResult<Term> {
        match self {
            Expr::Constant(term) => Ok(term.clone()),
            Expr::Variable(variable) => binding
                .get(variable)
                .cloned()
                .ok_or(ExpressionError::Thin(ThinError::default())),
            Expr::Or(lhs, rhs) => match lhs.effective_boolean_value(binding, context) {
                Ok(true) => Ok(boolean(true)),
                Ok(false) => Ok(boolean(rhs.effective_boolean_value(binding, context)?)),
                Err(ExpressionError::Thin(error)) => {
                    if rhs.effective_boolean_value(binding, context)? {
                        Ok(boolean(true))
                    } else {
                        Err(error.into())
                    }
                }
                Err(error) => Err(error),
            },
            Expr::And(lhs, rhs) => match lhs.effective_boolean_value(binding, context) {
                Ok(true) => Ok(boolean(rhs.effective_boolean_value(binding, context)?)),
                Ok(false) => Ok(boolean(false)),
                Err(ExpressionError::Thin(error)) => {
                    if rhs.effective_boolean_value(binding, context)? {
                        Err(error.into())
                    } else {
                        Ok(boolean(false))
                    }
                }
                Err(error) => Err(error),
            },
            Expr::Not(inner) => Ok(boolean(!inner.effective_boolean_value(binding, context)?)),
            Expr::Equal(lhs, rhs) => {
                let lhs = lhs.evaluate(binding, context)?;
                let rhs = rhs.evaluate(binding, context)?;
                Ok(boolean(value::equal(&lhs, &rhs)?))
            }
            Expr::SameTerm(lhs, rhs) => {
                let lhs = lhs.evaluate(binding, context)?;
                let rhs = rhs.evaluate(binding, context)?;
                Ok(boolean(lhs == rhs))
            }
            Expr::Compare(op, lhs, rhs) => {
                let lhs = lhs.evaluate(binding, context)?;
                let rhs = rhs.evaluate(binding, context)?;
                let ordering = value::compare(&lhs, &rhs)?;
                Ok(boolean(match op {
                    CompareOp::Greater => ordering == Ordering::Greater,
                    CompareOp::GreaterOrEqual => ordering != Ordering::Less,
                    CompareOp::Less => ordering == Ordering::Less,
                    CompareOp::LessOrEqual => ordering != Ordering::Greater,
                }))
            }
            Expr::In(needle, haystack) => Self::evaluate_in(needle, haystack, binding, context),
            Expr::Arithmetic(op, lhs, rhs) => {
                let lhs = lhs.evaluate(binding, context)?;
                let rhs = rhs.evaluate(binding, context)?;
                let lhs = functions::numeric(&lhs)?;
                let rhs = functions::numeric(&rhs)?;
                let result = match op {
                    ArithmeticOp::Add => lhs.add(rhs),
                    ArithmeticOp::Subtract => lhs.subtract(rhs),
                    ArithmeticOp::Multiply => lhs.multiply(rhs),
                    ArithmeticOp::Divide => lhs.divide(rhs),
                }?;
                Ok(result.into_literal().into())
            }
            Expr::UnaryPlus(inner) => {
                let value = inner.evaluate(binding, context)?;
                Ok(functions::numeric(&value)?.into_literal().into())
            }
            Expr::UnaryMinus(inner) => {
                let value = inner.evaluate(binding, context)?;
                Ok(functions::numeric(&value)?.negate()?.into_literal().into())
            }
            Expr::Exists(pattern) => Ok(boolean(Self::exists(pattern, binding, context)?)),
            Expr::Bound(variable) => Ok(boolean(binding.contains(variable))),
            Expr::If(test, if_true, if_false) => {
                if test.effective_boolean_value(binding, context)? {
                    if_true.evaluate(binding, context)
                } else {
                    if_false.evaluate(binding, context)
                }
            }
            Expr::Coalesce(args) => {
                for arg in args {
                    match arg.evaluate(binding, context) {
                        Ok(value) => return Ok(value),
                        Err(ExpressionError::Thin(_)) => {}
                        Err(error) => return Err(error),
                    }
                }
                Err(ThinError::default().into())
            }
            Expr::Call(builtin, args) => {
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate(binding, context))
                    .collect::<ExpressionResult<Vec<_>>>()?;
                Ok(builtin.evaluate(&args)?)
            }
            Expr::Regex { text, pattern } => {
                let text = text.evaluate(binding, context)?;
                let matches = match pattern {
                    RegexPattern::Static(regex) => functions::regex_matches(&text, regex)?,
                    RegexPattern::Dynamic { pattern, flags } => {
                        let pattern = pattern.evaluate(binding, context)?;
                        let flags = flags
                            .as_ref()
                            .map(|flags| flags.evaluate(binding, context))
                            .transpose()?;
                        let regex = functions::dynamic_pattern(&pattern, flags.as_ref())?;
                        functions::regex_matches(&text, &regex)?
                    }
                };
                Ok(boolean(matches))
            }
        }
    }

    /// Evaluates the expression and computes its effective boolean value.
    pub fn effective_boolean_value(
        &self,
        binding: &Binding,
        context: &Arc<ExecutionContext>,
    ) -> ExpressionResult<bool> {
        let term = self.evaluate(binding, context)?;
        Ok(value::TypedValueRef::from_term(&term).effective_boolean_value()?)
    }

    fn evaluate_in(
        needle: &Expr,
        haystack: &[Expr],
        binding: &Binding,
        context: &Arc<ExecutionContext>,
    ) -> ExpressionResult<Term> {
        let needle = needle.evaluate(binding, context)?;
        let mut error = None;
        for candidate in haystack {
            let result = candidate
                .evaluate(binding, context)
                .and_then(|candidate| Ok(value::equal(&needle, &candidate)?));
            match result {
                Ok(true) => return Ok(boolean(true)),
                Ok(false) => {}
                Err(ExpressionError::Thin(thin)) => error = Some(thin),
                Err(fatal) => return Err(fatal),
            }
        }
        match error {
            Some(error) => Err(error.into()),
            None => Ok(boolean(false)),
        }
    }

    fn exists(
        pattern: &Arc<Op>,
        binding: &Binding,
        context: &Arc<ExecutionContext>,
    ) -> QueryResult<bool> {
        let input = Box::new(SingletonIter::new(binding.clone()));
        let mut iter = OpCompiler::new(Arc::clone(context)).compile_op(pattern, input)?;
        let first = iter.next().transpose();
        iter.close();
        Ok(first?.is_some())
    }

    /// Returns the variables this expression reads from the binding. `EXISTS` patterns are not
    /// inspected.
    pub fn variables(&self) -> Vec<&Variable> {
        let mut result = Vec::new();
        self.collect_variables(&mut result);
        result
    }

    fn collect_variables<'expr>(&'expr self, result: &mut Vec<&'expr Variable>) {
        match self {
            Expr::Constant(_) | Expr::Exists(_) => {}
            Expr::Variable(variable) | Expr::Bound(variable) => result.push(variable),
            Expr::Or(lhs, rhs)
            | Expr::And(lhs, rhs)
            | Expr::Equal(lhs, rhs)
            | Expr::SameTerm(lhs, rhs)
            | Expr::Compare(_, lhs, rhs)
            | Expr::Arithmetic(_, lhs, rhs) => {
                lhs.collect_variables(result);
                rhs.collect_variables(result);
            }
            Expr::Not(inner) | Expr::UnaryPlus(inner) | Expr::UnaryMinus(inner) => {
                inner.collect_variables(result);
            }
            Expr::In(needle, haystack) => {
                needle.collect_variables(result);
                haystack.iter().for_each(|e| e.collect_variables(result));
            }
            Expr::If(a, b, c) => {
                a.collect_variables(result);
                b.collect_variables(result);
                c.collect_variables(result);
            }
            Expr::Coalesce(args) | Expr::Call(_, args) => {
                args.iter().for_each(|e| e.collect_variables(result));
            }
            Expr::Regex { text, pattern } => {
                text.collect_variables(result);
                if let RegexPattern::Dynamic { pattern, flags } = pattern {
                    pattern.collect_variables(result);
                    if let Some(flags) = flags {
                        flags.collect_variables(result);
                    }
                }
            }
        }
    }
}

/// Compiles an `ORDER BY` condition into the expression and whether it sorts ascending.
pub fn compile_order(condition: &OrderExpression) -> QueryResult<(Expr, bool)> {
    match condition {
        OrderExpression::Asc(expression) => Ok((Expr::compile(expression)?, true)),
        OrderExpression::Desc(expression) => Ok((Expr::compile(expression)?, false)),
    }
}

fn boolean(value: bool) -> Term {
    Literal::from(value).into()
}

fn is_simple(literal: &Literal) -> bool {
    literal.language().is_none()
        && literal.datatype() == rdf_cursor_model::vocab::xsd::STRING
}
