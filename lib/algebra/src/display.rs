use crate::{BasicPattern, Op};
use itertools::Itertools;
use rdf_cursor_model::{
    AggregateExpression, AggregateFunction, Expression, OrderExpression, PropertyPathExpression,
};
use std::fmt::{self, Display, Formatter, Write};

/// Writes the operator tree in an S-expression syntax. Every operator starts on its own line
/// and children are indented by two spaces.
impl Display for Op {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_op(self, f, 0)
    }
}

impl Display for BasicPattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(bgp")?;
        for triple in self {
            write!(
                f,
                " ({} {} {})",
                triple.subject, triple.predicate, triple.object
            )?;
        }
        f.write_char(')')
    }
}

fn write_op(op: &Op, f: &mut Formatter<'_>, indent: usize) -> fmt::Result {
    write!(f, "{:indent$}", "")?;
    match op {
        Op::Bgp(pattern) => write!(f, "{pattern}"),
        Op::Join { left, right }
        | Op::Union { left, right }
        | Op::Diff { left, right }
        | Op::Minus { left, right }
        | Op::Conditional { left, right } => {
            write!(f, "({}", op.name())?;
            write_children(f, [left.as_ref(), right.as_ref()], indent)
        }
        Op::LeftJoin {
            left,
            right,
            expressions,
        } => {
            f.write_str("(leftjoin")?;
            if !expressions.is_empty() {
                write!(f, " {}", ExprList(expressions))?;
            }
            write_children(f, [left.as_ref(), right.as_ref()], indent)
        }
        Op::Filter { expressions, inner } => {
            write!(f, "(filter {}", ExprList(expressions))?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Graph { name, inner } => {
            write!(f, "(graph {name}")?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Service {
            name,
            inner,
            silent,
        } => {
            f.write_str("(service ")?;
            if *silent {
                f.write_str("silent ")?;
            }
            write!(f, "{name}")?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::DatasetNames(name) => write!(f, "(datasetnames {name})"),
        Op::Table(table) => {
            if table.is_unit() {
                return f.write_str("(table unit)");
            }
            write!(
                f,
                "(table (vars {})",
                table.variables().iter().format(" ")
            )?;
            for row in table.rows().iter() {
                write!(f, " (row {row})")?;
            }
            f.write_char(')')
        }
        Op::Null => f.write_str("(null)"),
        Op::List(inner) | Op::Distinct(inner) | Op::Reduced(inner) => {
            write!(f, "({}", op.name())?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Order { inner, conditions } => {
            write!(
                f,
                "(order ({})",
                conditions.iter().map(SseOrder).format(" ")
            )?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Project { inner, variables } => {
            write!(f, "(project ({})", variables.iter().format(" "))?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Slice {
            inner,
            start,
            length,
        } => {
            match length {
                Some(length) => write!(f, "(slice {start} {length}")?,
                None => write!(f, "(slice {start} _")?,
            }
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Group {
            inner,
            variables,
            aggregates,
        } => {
            write!(f, "(group ({})", variables.iter().format(" "))?;
            write!(
                f,
                " ({})",
                aggregates
                    .iter()
                    .map(|(v, a)| format!("({v} {})", SseAggregate(a)))
                    .format(" ")
            )?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Assign { inner, assignments } | Op::Extend { inner, assignments } => {
            write!(
                f,
                "({} ({})",
                op.name(),
                assignments
                    .iter()
                    .map(|(v, e)| format!("({v} {})", SseExpr(e)))
                    .format(" ")
            )?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Path {
            subject,
            path,
            object,
        } => write!(f, "(path {subject} {} {object})", SsePath(path)),
        Op::Sequence(elements) | Op::Disjunction(elements) => {
            write!(f, "({}", op.name())?;
            write_children(f, elements.iter().map(|e| e.as_ref()), indent)
        }
        Op::Label { label, inner } => {
            write!(f, "(label {label:?}")?;
            write_children(f, [inner.as_ref()], indent)
        }
        Op::Ext(ext) => match ext.effective_op() {
            Some(inner) => {
                write!(f, "(ext {}", ext.name())?;
                write_children(f, [inner], indent)
            }
            None => write!(f, "(ext {})", ext.name()),
        },
    }
}

fn write_children<'a>(
    f: &mut Formatter<'_>,
    children: impl IntoIterator<Item = &'a Op>,
    indent: usize,
) -> fmt::Result {
    for child in children {
        f.write_char('\n')?;
        write_op(child, f, indent + 2)?;
    }
    f.write_char(')')
}

/// A list of expressions. A single expression is written as is.
struct ExprList<'a>(&'a [Expression]);

impl Display for ExprList<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            [single] => write!(f, "{}", SseExpr(single)),
            list => write!(f, "(exprlist {})", list.iter().map(SseExpr).format(" ")),
        }
    }
}

struct SseExpr<'a>(&'a Expression);

impl Display for SseExpr<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let binary = |f: &mut Formatter<'_>, name: &str, a: &Expression, b: &Expression| {
            write!(f, "({name} {} {})", SseExpr(a), SseExpr(b))
        };
        match self.0 {
            Expression::NamedNode(node) => write!(f, "{node}"),
            Expression::Literal(literal) => write!(f, "{literal}"),
            Expression::Variable(variable) => write!(f, "{variable}"),
            Expression::Or(a, b) => binary(f, "||", a, b),
            Expression::And(a, b) => binary(f, "&&", a, b),
            Expression::Equal(a, b) => binary(f, "=", a, b),
            Expression::SameTerm(a, b) => binary(f, "sameTerm", a, b),
            Expression::Greater(a, b) => binary(f, ">", a, b),
            Expression::GreaterOrEqual(a, b) => binary(f, ">=", a, b),
            Expression::Less(a, b) => binary(f, "<", a, b),
            Expression::LessOrEqual(a, b) => binary(f, "<=", a, b),
            Expression::Add(a, b) => binary(f, "+", a, b),
            Expression::Subtract(a, b) => binary(f, "-", a, b),
            Expression::Multiply(a, b) => binary(f, "*", a, b),
            Expression::Divide(a, b) => binary(f, "/", a, b),
            Expression::In(a, list) => write!(
                f,
                "(in {} {})",
                SseExpr(a),
                list.iter().map(SseExpr).format(" ")
            ),
            Expression::UnaryPlus(a) => write!(f, "(+ {})", SseExpr(a)),
            Expression::UnaryMinus(a) => write!(f, "(- {})", SseExpr(a)),
            Expression::Not(a) => write!(f, "(! {})", SseExpr(a)),
            Expression::Exists(pattern) => write!(f, "(exists {pattern})"),
            Expression::Bound(variable) => write!(f, "(bound {variable})"),
            Expression::If(a, b, c) => write!(
                f,
                "(if {} {} {})",
                SseExpr(a),
                SseExpr(b),
                SseExpr(c)
            ),
            Expression::Coalesce(list) => {
                write!(f, "(coalesce {})", list.iter().map(SseExpr).format(" "))
            }
            Expression::FunctionCall(function, args) => {
                write!(f, "({function}")?;
                for arg in args {
                    write!(f, " {}", SseExpr(arg))?;
                }
                f.write_char(')')
            }
        }
    }
}

struct SseOrder<'a>(&'a OrderExpression);

impl Display for SseOrder<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            OrderExpression::Asc(e) => write!(f, "{}", SseExpr(e)),
            OrderExpression::Desc(e) => write!(f, "(desc {})", SseExpr(e)),
        }
    }
}

struct SseAggregate<'a>(&'a AggregateExpression);

impl Display for SseAggregate<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            AggregateExpression::CountSolutions { distinct } => {
                f.write_str(if *distinct { "(count distinct)" } else { "(count)" })
            }
            AggregateExpression::FunctionCall {
                name,
                expr,
                distinct,
            } => {
                let name = match name {
                    AggregateFunction::Count => "count".to_owned(),
                    AggregateFunction::Sum => "sum".to_owned(),
                    AggregateFunction::Avg => "avg".to_owned(),
                    AggregateFunction::Min => "min".to_owned(),
                    AggregateFunction::Max => "max".to_owned(),
                    AggregateFunction::Sample => "sample".to_owned(),
                    AggregateFunction::GroupConcat { .. } => "group_concat".to_owned(),
                    AggregateFunction::Custom(name) => name.to_string(),
                };
                let distinct = if *distinct { " distinct" } else { "" };
                write!(f, "({name}{distinct} {})", SseExpr(expr))
            }
        }
    }
}

struct SsePath<'a>(&'a PropertyPathExpression);

impl Display for SsePath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            PropertyPathExpression::NamedNode(node) => write!(f, "{node}"),
            PropertyPathExpression::Reverse(p) => write!(f, "(reverse {})", SsePath(p)),
            PropertyPathExpression::Sequence(a, b) => {
                write!(f, "(seq {} {})", SsePath(a), SsePath(b))
            }
            PropertyPathExpression::Alternative(a, b) => {
                write!(f, "(alt {} {})", SsePath(a), SsePath(b))
            }
            PropertyPathExpression::ZeroOrMore(p) => write!(f, "(path* {})", SsePath(p)),
            PropertyPathExpression::OneOrMore(p) => write!(f, "(path+ {})", SsePath(p)),
            PropertyPathExpression::ZeroOrOne(p) => write!(f, "(path? {})", SsePath(p)),
            PropertyPathExpression::NegatedPropertySet(nodes) => {
                write!(f, "(notoneof {})", nodes.iter().format(" "))
            }
        }
    }
}
