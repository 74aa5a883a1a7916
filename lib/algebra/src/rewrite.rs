use crate::vars::non_distinguished_variable;
use crate::{AlgebraError, Op, Table};
use rdf_cursor_model::{
    Binding, Expression, GraphPattern, GroundTerm, NamedNodePattern, PropertyPathExpression, Term,
    TermPattern, TriplePattern, Variable,
};
use std::sync::Arc;

/// Translates a parsed SPARQL graph pattern into an [Op] tree.
///
/// Blank nodes of the query are replaced by non-distinguished variables such that the rest of the
/// engine only has to deal with variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlgebraGenerator;

impl AlgebraGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn translate(&self, pattern: &GraphPattern) -> Result<Op, AlgebraError> {
        match pattern {
            GraphPattern::Bgp { patterns } => {
                if patterns.is_empty() {
                    return Ok(Op::Table(Table::unit()));
                }
                Ok(Op::bgp(patterns.iter().map(rename_blank_nodes)))
            }
            GraphPattern::Path {
                subject,
                path,
                object,
            } => Ok(self.translate_path(subject, path, object)),
            GraphPattern::Join { left, right } => {
                Ok(Op::join(self.translate(left)?, self.translate(right)?))
            }
            GraphPattern::LeftJoin {
                left,
                right,
                expression,
            } => {
                let expressions = expression
                    .as_ref()
                    .map(split_conjunction)
                    .unwrap_or_default();
                Ok(Op::left_join(
                    self.translate(left)?,
                    self.translate(right)?,
                    expressions,
                ))
            }
            GraphPattern::Filter { expr, inner } => {
                Ok(Op::filter(split_conjunction(expr), self.translate(inner)?))
            }
            GraphPattern::Union { left, right } => {
                Ok(Op::union(self.translate(left)?, self.translate(right)?))
            }
            GraphPattern::Graph { name, inner } => Ok(Op::Graph {
                name: name.clone(),
                inner: Arc::new(self.translate(inner)?),
            }),
            GraphPattern::Extend {
                inner,
                variable,
                expression,
            } => Ok(Op::extend(
                self.translate(inner)?,
                variable.clone(),
                expression.clone(),
            )),
            GraphPattern::Minus { left, right } => {
                Ok(Op::minus(self.translate(left)?, self.translate(right)?))
            }
            GraphPattern::Values {
                variables,
                bindings,
            } => Ok(Op::Table(translate_values(variables, bindings)?)),
            GraphPattern::OrderBy { inner, expression } => {
                Ok(Op::order(self.translate(inner)?, expression.clone()))
            }
            GraphPattern::Project { inner, variables } => {
                Ok(Op::project(self.translate(inner)?, variables.clone()))
            }
            GraphPattern::Distinct { inner } => Ok(Op::Distinct(Arc::new(self.translate(inner)?))),
            GraphPattern::Reduced { inner } => Ok(Op::Reduced(Arc::new(self.translate(inner)?))),
            GraphPattern::Slice {
                inner,
                start,
                length,
            } => Ok(Op::Slice {
                inner: Arc::new(self.translate(inner)?),
                start: *start,
                length: *length,
            }),
            GraphPattern::Group {
                inner,
                variables,
                aggregates,
            } => Ok(Op::Group {
                inner: Arc::new(self.translate(inner)?),
                variables: variables.clone(),
                aggregates: aggregates.clone(),
            }),
            GraphPattern::Service {
                name,
                inner,
                silent,
            } => Ok(Op::Service {
                name: name.clone(),
                inner: Arc::new(self.translate(inner)?),
                silent: *silent,
            }),
            #[allow(unreachable_patterns, reason = "Only reachable with optional spargebra features")]
            _ => Err(AlgebraError::Unsupported(format!("{pattern}"))),
        }
    }

    fn translate_path(
        &self,
        subject: &TermPattern,
        path: &PropertyPathExpression,
        object: &TermPattern,
    ) -> Op {
        let subject = rename_term_pattern(subject);
        let object = rename_term_pattern(object);
        match path {
            PropertyPathExpression::NamedNode(predicate) => Op::bgp([TriplePattern {
                subject,
                predicate: NamedNodePattern::NamedNode(predicate.clone()),
                object,
            }]),
            PropertyPathExpression::Reverse(inner) => match inner.as_ref() {
                PropertyPathExpression::NamedNode(predicate) => Op::bgp([TriplePattern {
                    subject: object,
                    predicate: NamedNodePattern::NamedNode(predicate.clone()),
                    object: subject,
                }]),
                _ => Op::Path {
                    subject,
                    path: path.clone(),
                    object,
                },
            },
            _ => Op::Path {
                subject,
                path: path.clone(),
                object,
            },
        }
    }
}

/// Splits a conjunction into its conjuncts.
fn split_conjunction(expression: &Expression) -> Vec<Expression> {
    let mut result = Vec::new();
    let mut stack = vec![expression];
    while let Some(expression) = stack.pop() {
        match expression {
            Expression::And(lhs, rhs) => {
                stack.push(rhs);
                stack.push(lhs);
            }
            _ => result.push(expression.clone()),
        }
    }
    result
}

fn rename_blank_nodes(pattern: &TriplePattern) -> TriplePattern {
    TriplePattern {
        subject: rename_term_pattern(&pattern.subject),
        predicate: pattern.predicate.clone(),
        object: rename_term_pattern(&pattern.object),
    }
}

fn rename_term_pattern(pattern: &TermPattern) -> TermPattern {
    match pattern {
        TermPattern::BlankNode(blank_node) => {
            TermPattern::Variable(non_distinguished_variable(blank_node))
        }
        _ => pattern.clone(),
    }
}

fn translate_values(
    variables: &[Variable],
    rows: &[Vec<Option<GroundTerm>>],
) -> Result<Table, AlgebraError> {
    let mut result = Vec::with_capacity(rows.len());
    for row in rows {
        let mut builder = Binding::builder();
        for (variable, value) in variables.iter().zip(row) {
            if let Some(value) = value {
                builder.add(variable.clone(), ground_term_to_term(value)?)?;
            }
        }
        result.push(builder.build());
    }
    Ok(Table::new(variables.to_vec(), result))
}

fn ground_term_to_term(term: &GroundTerm) -> Result<Term, AlgebraError> {
    match term {
        GroundTerm::NamedNode(node) => Ok(node.clone().into()),
        GroundTerm::Literal(literal) => Ok(literal.clone().into()),
        #[allow(unreachable_patterns, reason = "Only reachable with RDF-star terms")]
        _ => Err(AlgebraError::Unsupported(format!("VALUES term {term}"))),
    }
}
