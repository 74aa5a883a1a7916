use rdf_cursor_model::vocab::{rdf, xsd};
use rdf_cursor_model::{
    BlankNodeRef, Boolean, Decimal, Double, Float, Integer, Literal, LiteralRef, NamedNodeRef, Term,
    ThinError, ThinResult,
};
use std::cmp::Ordering;
use std::str::FromStr;

/// The value of an RDF term as seen by the expression evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum TypedValueRef<'value> {
    NamedNode(NamedNodeRef<'value>),
    BlankNode(BlankNodeRef<'value>),
    BooleanLiteral(Boolean),
    NumericLiteral(Numeric),
    SimpleLiteral(&'value str),
    LanguageStringLiteral {
        value: &'value str,
        language: &'value str,
    },
    /// A literal with an unsupported datatype or an invalid lexical form.
    OtherLiteral(LiteralRef<'value>),
}

impl<'value> TypedValueRef<'value> {
    pub fn from_term(term: &'value Term) -> Self {
        match term {
            Term::NamedNode(node) => TypedValueRef::NamedNode(node.as_ref()),
            Term::BlankNode(node) => TypedValueRef::BlankNode(node.as_ref()),
            Term::Literal(literal) => Self::from_literal(literal.as_ref()),
            #[allow(unreachable_patterns, reason = "Only reachable with RDF-star terms")]
            _ => TypedValueRef::OtherLiteral(LiteralRef::new_simple_literal("")),
        }
    }

    pub fn from_literal(literal: LiteralRef<'value>) -> Self {
        let value = literal.value();
        if let Some(language) = literal.language() {
            return TypedValueRef::LanguageStringLiteral { value, language };
        }

        let datatype = literal.datatype();
        let decoded = if datatype == xsd::STRING {
            Some(TypedValueRef::SimpleLiteral(value))
        } else if datatype == xsd::BOOLEAN {
            Boolean::from_str(value)
                .ok()
                .map(TypedValueRef::BooleanLiteral)
        } else {
            Numeric::parse(value, datatype).map(TypedValueRef::NumericLiteral)
        };
        decoded.unwrap_or(TypedValueRef::OtherLiteral(literal))
    }

    /// Returns the lexical value and language of a string literal.
    pub fn string_literal(self) -> ThinResult<(&'value str, Option<&'value str>)> {
        match self {
            TypedValueRef::SimpleLiteral(value) => Ok((value, None)),
            TypedValueRef::LanguageStringLiteral { value, language } => Ok((value, Some(language))),
            _ => ThinError::expected(),
        }
    }

    /// Returns the lexical value of a simple literal.
    pub fn simple_literal(self) -> ThinResult<&'value str> {
        match self {
            TypedValueRef::SimpleLiteral(value) => Ok(value),
            _ => ThinError::expected(),
        }
    }

    /// The [effective boolean value](https://www.w3.org/TR/sparql11-query/#ebv).
    pub fn effective_boolean_value(self) -> ThinResult<bool> {
        match self {
            TypedValueRef::BooleanLiteral(value) => Ok(value.into()),
            TypedValueRef::NumericLiteral(value) => Ok(!value.is_zero_or_nan()),
            TypedValueRef::SimpleLiteral(value) => Ok(!value.is_empty()),
            _ => ThinError::expected(),
        }
    }
}

/// Compares two values with the SPARQL operator semantics. Returns [None] if the values are not
/// comparable.
impl PartialOrd for TypedValueRef<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (TypedValueRef::NumericLiteral(a), TypedValueRef::NumericLiteral(b)) => {
                a.partial_cmp(b)
            }
            (TypedValueRef::SimpleLiteral(a), TypedValueRef::SimpleLiteral(b)) => a.partial_cmp(b),
            (TypedValueRef::BooleanLiteral(a), TypedValueRef::BooleanLiteral(b)) => {
                a.partial_cmp(b)
            }
            (
                TypedValueRef::LanguageStringLiteral {
                    value: a,
                    language: la,
                },
                TypedValueRef::LanguageStringLiteral {
                    value: b,
                    language: lb,
                },
            ) if la.eq_ignore_ascii_case(lb) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// The [RDFterm-equal](https://www.w3.org/TR/sparql11-query/#func-RDFterm-equal) semantics of
/// the `=` operator.
pub(crate) fn equal(lhs: &Term, rhs: &Term) -> ThinResult<bool> {
    let lhs_value = TypedValueRef::from_term(lhs);
    let rhs_value = TypedValueRef::from_term(rhs);
    match (lhs_value, rhs_value) {
        (TypedValueRef::OtherLiteral(_), TypedValueRef::OtherLiteral(_)) => {
            if lhs == rhs {
                Ok(true)
            } else {
                // Two literals of unknown datatypes may still denote the same value.
                ThinError::expected()
            }
        }
        (TypedValueRef::NumericLiteral(a), TypedValueRef::NumericLiteral(b)) => {
            Ok(a.partial_cmp(&b) == Some(Ordering::Equal))
        }
        (TypedValueRef::SimpleLiteral(_), TypedValueRef::SimpleLiteral(_))
        | (TypedValueRef::BooleanLiteral(_), TypedValueRef::BooleanLiteral(_))
        | (TypedValueRef::LanguageStringLiteral { .. }, TypedValueRef::LanguageStringLiteral { .. }) => {
            Ok(lhs_value.partial_cmp(&rhs_value) == Some(Ordering::Equal))
        }
        (TypedValueRef::OtherLiteral(_), rhs) | (rhs, TypedValueRef::OtherLiteral(_))
            if is_literal(rhs) =>
        {
            ThinError::expected()
        }
        _ => Ok(lhs == rhs),
    }
}

/// The ordering of the `<`, `<=`, `>` and `>=` operators.
pub(crate) fn compare(lhs: &Term, rhs: &Term) -> ThinResult<Ordering> {
    TypedValueRef::from_term(lhs)
        .partial_cmp(&TypedValueRef::from_term(rhs))
        .ok_or(ThinError::default())
}

/// The total order used by `ORDER BY`: unbound values first, then blank nodes, IRIs and literals.
/// Numeric literals are ordered by value, other literals by lexical form, datatype and language.
pub(crate) fn order_cmp(lhs: Option<&Term>, rhs: Option<&Term>) -> Ordering {
    let (lhs, rhs) = match (lhs, rhs) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Less,
        (Some(_), None) => return Ordering::Greater,
        (Some(lhs), Some(rhs)) => (lhs, rhs),
    };

    match (lhs, rhs) {
        (Term::BlankNode(a), Term::BlankNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::NamedNode(a), Term::NamedNode(b)) => a.as_str().cmp(b.as_str()),
        (Term::Literal(a), Term::Literal(b)) => {
            let by_value = match (
                TypedValueRef::from_literal(a.as_ref()),
                TypedValueRef::from_literal(b.as_ref()),
            ) {
                (TypedValueRef::NumericLiteral(a), TypedValueRef::NumericLiteral(b)) => {
                    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
                }
                _ => Ordering::Equal,
            };
            by_value
                .then_with(|| a.value().cmp(b.value()))
                .then_with(|| a.datatype().as_str().cmp(b.datatype().as_str()))
                .then_with(|| a.language().cmp(&b.language()))
        }
        _ => term_kind_rank(lhs).cmp(&term_kind_rank(rhs)),
    }
}

fn term_kind_rank(term: &Term) -> u8 {
    match term {
        Term::BlankNode(_) => 0,
        Term::NamedNode(_) => 1,
        Term::Literal(_) => 2,
        #[allow(unreachable_patterns, reason = "Only reachable with RDF-star terms")]
        _ => 3,
    }
}

fn is_literal(value: TypedValueRef<'_>) -> bool {
    !matches!(
        value,
        TypedValueRef::NamedNode(_) | TypedValueRef::BlankNode(_)
    )
}

/// A value of one of the numeric XSD datatypes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Numeric {
    Integer(Integer),
    Decimal(Decimal),
    Float(Float),
    Double(Double),
}

/// The datatypes derived from `xsd:integer`.
const INTEGER_DATATYPES: [NamedNodeRef<'static>; 13] = [
    xsd::INTEGER,
    xsd::INT,
    xsd::LONG,
    xsd::SHORT,
    xsd::BYTE,
    xsd::NON_NEGATIVE_INTEGER,
    xsd::NON_POSITIVE_INTEGER,
    xsd::NEGATIVE_INTEGER,
    xsd::POSITIVE_INTEGER,
    xsd::UNSIGNED_INT,
    xsd::UNSIGNED_LONG,
    xsd::UNSIGNED_SHORT,
    xsd::UNSIGNED_BYTE,
];

impl Numeric {
    fn parse(value: &str, datatype: NamedNodeRef<'_>) -> Option<Self> {
        if INTEGER_DATATYPES.contains(&datatype) {
            Integer::from_str(value).ok().map(Numeric::Integer)
        } else if datatype == xsd::DECIMAL {
            Decimal::from_str(value).ok().map(Numeric::Decimal)
        } else if datatype == xsd::FLOAT {
            Float::from_str(value).ok().map(Numeric::Float)
        } else if datatype == xsd::DOUBLE {
            Double::from_str(value).ok().map(Numeric::Double)
        } else {
            None
        }
    }

    fn is_zero_or_nan(self) -> bool {
        match self {
            Numeric::Integer(v) => v == Integer::from(0),
            Numeric::Decimal(v) => v == Decimal::from(0),
            Numeric::Float(v) => {
                let v = f32::from(v);
                v == 0.0 || v.is_nan()
            }
            Numeric::Double(v) => {
                let v = f64::from(v);
                v == 0.0 || v.is_nan()
            }
        }
    }

    pub fn add(self, rhs: Self) -> ThinResult<Self> {
        match promote(self, rhs) {
            Promoted::Integer(a, b) => a.checked_add(b).map(Numeric::Integer),
            Promoted::Decimal(a, b) => a.checked_add(b).map(Numeric::Decimal),
            Promoted::Float(a, b) => Some(Numeric::Float(a + b)),
            Promoted::Double(a, b) => Some(Numeric::Double(a + b)),
        }
        .ok_or(ThinError::default())
    }

    pub fn subtract(self, rhs: Self) -> ThinResult<Self> {
        match promote(self, rhs) {
            Promoted::Integer(a, b) => a.checked_sub(b).map(Numeric::Integer),
            Promoted::Decimal(a, b) => a.checked_sub(b).map(Numeric::Decimal),
            Promoted::Float(a, b) => Some(Numeric::Float(a - b)),
            Promoted::Double(a, b) => Some(Numeric::Double(a - b)),
        }
        .ok_or(ThinError::default())
    }

    pub fn multiply(self, rhs: Self) -> ThinResult<Self> {
        match promote(self, rhs) {
            Promoted::Integer(a, b) => a.checked_mul(b).map(Numeric::Integer),
            Promoted::Decimal(a, b) => a.checked_mul(b).map(Numeric::Decimal),
            Promoted::Float(a, b) => Some(Numeric::Float(a * b)),
            Promoted::Double(a, b) => Some(Numeric::Double(a * b)),
        }
        .ok_or(ThinError::default())
    }

    /// Division of two integers yields a decimal.
    pub fn divide(self, rhs: Self) -> ThinResult<Self> {
        match promote(self, rhs) {
            Promoted::Integer(a, b) => Decimal::from(a)
                .checked_div(Decimal::from(b))
                .map(Numeric::Decimal),
            Promoted::Decimal(a, b) => a.checked_div(b).map(Numeric::Decimal),
            Promoted::Float(a, b) => Some(Numeric::Float(a / b)),
            Promoted::Double(a, b) => Some(Numeric::Double(a / b)),
        }
        .ok_or(ThinError::default())
    }

    pub fn negate(self) -> ThinResult<Self> {
        match self {
            Numeric::Integer(v) => v.checked_neg().map(Numeric::Integer),
            Numeric::Decimal(v) => v.checked_neg().map(Numeric::Decimal),
            Numeric::Float(v) => Some(Numeric::Float(-v)),
            Numeric::Double(v) => Some(Numeric::Double(-v)),
        }
        .ok_or(ThinError::default())
    }

    pub fn into_literal(self) -> Literal {
        match self {
            Numeric::Integer(v) => Literal::new_typed_literal(v.to_string(), xsd::INTEGER),
            Numeric::Decimal(v) => Literal::new_typed_literal(v.to_string(), xsd::DECIMAL),
            Numeric::Float(v) => Literal::new_typed_literal(v.to_string(), xsd::FLOAT),
            Numeric::Double(v) => Literal::new_typed_literal(v.to_string(), xsd::DOUBLE),
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match promote(*self, *other) {
            Promoted::Integer(a, b) => a.partial_cmp(&b),
            Promoted::Decimal(a, b) => a.partial_cmp(&b),
            Promoted::Float(a, b) => a.partial_cmp(&b),
            Promoted::Double(a, b) => a.partial_cmp(&b),
        }
    }
}

enum Promoted {
    Integer(Integer, Integer),
    Decimal(Decimal, Decimal),
    Float(Float, Float),
    Double(Double, Double),
}

/// Applies the [numeric type promotion](https://www.w3.org/TR/xpath20/#promotion) to both
/// operands.
fn promote(lhs: Numeric, rhs: Numeric) -> Promoted {
    match (lhs, rhs) {
        (Numeric::Integer(a), Numeric::Integer(b)) => Promoted::Integer(a, b),
        (Numeric::Double(_), _) | (_, Numeric::Double(_)) => {
            Promoted::Double(to_double(lhs), to_double(rhs))
        }
        (Numeric::Float(_), _) | (_, Numeric::Float(_)) => {
            Promoted::Float(to_float(lhs), to_float(rhs))
        }
        _ => Promoted::Decimal(to_decimal(lhs), to_decimal(rhs)),
    }
}

fn to_double(value: Numeric) -> Double {
    match value {
        Numeric::Integer(v) => v.into(),
        Numeric::Decimal(v) => v.into(),
        Numeric::Float(v) => v.into(),
        Numeric::Double(v) => v,
    }
}

fn to_float(value: Numeric) -> Float {
    match value {
        Numeric::Integer(v) => v.into(),
        Numeric::Decimal(v) => v.into(),
        Numeric::Float(v) => v,
        #[allow(clippy::cast_possible_truncation, reason = "Casting to xsd:float narrows")]
        Numeric::Double(v) => Float::from(f64::from(v) as f32),
    }
}

fn to_decimal(value: Numeric) -> Decimal {
    match value {
        Numeric::Integer(v) => v.into(),
        Numeric::Decimal(v) => v,
        // Only reachable for integer and decimal operands.
        Numeric::Float(v) => Decimal::try_from(v).unwrap_or_default(),
        Numeric::Double(v) => Decimal::try_from(v).unwrap_or_default(),
    }
}

/// Returns the datatype of a literal term, using `rdf:langString` for language-tagged strings.
pub(crate) fn datatype(term: &Term) -> ThinResult<NamedNodeRef<'_>> {
    match term {
        Term::Literal(literal) if literal.language().is_some() => Ok(rdf::LANG_STRING),
        Term::Literal(literal) => Ok(literal.datatype()),
        _ => ThinError::expected(),
    }
}
