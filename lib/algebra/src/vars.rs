use rdf_cursor_model::{
    BlankNode, Expression, NamedNodePattern, OrderExpression, TermPattern, TriplePattern, Variable,
};
use rustc_hash::FxHashSet;

pub type VarSet = FxHashSet<Variable>;

/// Returns whether the variable was allocated by the engine, for example for a blank node of
/// the query. The names of these variables start with `?`.
pub fn is_non_distinguished(variable: &Variable) -> bool {
    variable.as_str().starts_with('?')
}

/// Allocates the non-distinguished variable that stands for `blank_node`.
pub fn non_distinguished_variable(blank_node: &BlankNode) -> Variable {
    Variable::new_unchecked(format!("?{}", blank_node.as_str()))
}

/// Adds the variables of a triple pattern to `vars`.
pub fn triple_pattern_vars(pattern: &TriplePattern, vars: &mut VarSet) {
    term_pattern_vars(&pattern.subject, vars);
    if let NamedNodePattern::Variable(variable) = &pattern.predicate {
        vars.insert(variable.clone());
    }
    term_pattern_vars(&pattern.object, vars);
}

pub(crate) fn term_pattern_vars(pattern: &TermPattern, vars: &mut VarSet) {
    if let TermPattern::Variable(variable) = pattern {
        vars.insert(variable.clone());
    }
}

/// Adds the variables mentioned by `expression` to `vars`. For `EXISTS` the in-scope variables
/// of the pattern are mentioned.
pub fn expression_vars(expression: &Expression, vars: &mut VarSet) {
    match expression {
        Expression::NamedNode(_) | Expression::Literal(_) => {}
        Expression::Variable(variable) | Expression::Bound(variable) => {
            vars.insert(variable.clone());
        }
        Expression::Or(a, b)
        | Expression::And(a, b)
        | Expression::Equal(a, b)
        | Expression::SameTerm(a, b)
        | Expression::Greater(a, b)
        | Expression::GreaterOrEqual(a, b)
        | Expression::Less(a, b)
        | Expression::LessOrEqual(a, b)
        | Expression::Add(a, b)
        | Expression::Subtract(a, b)
        | Expression::Multiply(a, b)
        | Expression::Divide(a, b) => {
            expression_vars(a, vars);
            expression_vars(b, vars);
        }
        Expression::In(a, list) => {
            expression_vars(a, vars);
            for e in list {
                expression_vars(e, vars);
            }
        }
        Expression::UnaryPlus(a) | Expression::UnaryMinus(a) | Expression::Not(a) => {
            expression_vars(a, vars);
        }
        Expression::Exists(pattern) => pattern.on_in_scope_variable(|v| {
            vars.insert(v.clone());
        }),
        Expression::If(a, b, c) => {
            expression_vars(a, vars);
            expression_vars(b, vars);
            expression_vars(c, vars);
        }
        Expression::Coalesce(list) | Expression::FunctionCall(_, list) => {
            for e in list {
                expression_vars(e, vars);
            }
        }
    }
}

pub(crate) fn order_expression_vars(expression: &OrderExpression, vars: &mut VarSet) {
    match expression {
        OrderExpression::Asc(e) | OrderExpression::Desc(e) => expression_vars(e, vars),
    }
}
