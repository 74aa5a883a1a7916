use crate::expr::value::{datatype, Numeric, TypedValueRef};
use itertools::{EitherOrBoth, Itertools};
use rdf_cursor_model::{Function, Literal, NamedNode, Term, ThinError, ThinResult};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;

/// The built-in functions that are evaluated by [BuiltIn::evaluate]. `REGEX` is handled
/// separately, as its pattern may be compiled ahead of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltIn {
    Str,
    Lang,
    LangMatches,
    Datatype,
    Iri,
    IsIri,
    IsBlank,
    IsLiteral,
    IsNumeric,
    StrLen,
    UCase,
    LCase,
    Contains,
    StrStarts,
    StrEnds,
    Concat,
}

impl BuiltIn {
    pub fn from_function(function: &Function) -> Option<Self> {
        Some(match function {
            Function::Str => BuiltIn::Str,
            Function::Lang => BuiltIn::Lang,
            Function::LangMatches => BuiltIn::LangMatches,
            Function::Datatype => BuiltIn::Datatype,
            Function::Iri => BuiltIn::Iri,
            Function::IsIri => BuiltIn::IsIri,
            Function::IsBlank => BuiltIn::IsBlank,
            Function::IsLiteral => BuiltIn::IsLiteral,
            Function::IsNumeric => BuiltIn::IsNumeric,
            Function::StrLen => BuiltIn::StrLen,
            Function::UCase => BuiltIn::UCase,
            Function::LCase => BuiltIn::LCase,
            Function::Contains => BuiltIn::Contains,
            Function::StrStarts => BuiltIn::StrStarts,
            Function::StrEnds => BuiltIn::StrEnds,
            Function::Concat => BuiltIn::Concat,
            _ => return None,
        })
    }

    pub fn accepts_arity(self, arity: usize) -> bool {
        match self {
            BuiltIn::Concat => true,
            BuiltIn::LangMatches | BuiltIn::Contains | BuiltIn::StrStarts | BuiltIn::StrEnds => {
                arity == 2
            }
            _ => arity == 1,
        }
    }

    /// Evaluates the function. The number of arguments has been checked during compilation.
    pub fn evaluate(self, args: &[Term]) -> ThinResult<Term> {
        match (self, args) {
            (BuiltIn::Str, [arg]) => string_value(arg),
            (BuiltIn::Lang, [arg]) => lang(arg),
            (BuiltIn::LangMatches, [tag, range]) => lang_matches(tag, range),
            (BuiltIn::Datatype, [arg]) => Ok(datatype(arg)?.into_owned().into()),
            (BuiltIn::Iri, [arg]) => iri(arg),
            (BuiltIn::IsIri, [arg]) => Ok(boolean(matches!(arg, Term::NamedNode(_)))),
            (BuiltIn::IsBlank, [arg]) => Ok(boolean(matches!(arg, Term::BlankNode(_)))),
            (BuiltIn::IsLiteral, [arg]) => Ok(boolean(matches!(arg, Term::Literal(_)))),
            (BuiltIn::IsNumeric, [arg]) => Ok(boolean(matches!(
                TypedValueRef::from_term(arg),
                TypedValueRef::NumericLiteral(_)
            ))),
            (BuiltIn::StrLen, [arg]) => {
                let (value, _) = TypedValueRef::from_term(arg).string_literal()?;
                let length = i64::try_from(value.chars().count()).map_err(|_| ThinError::default())?;
                Ok(Literal::from(length).into())
            }
            (BuiltIn::UCase, [arg]) => map_string(arg, str::to_uppercase),
            (BuiltIn::LCase, [arg]) => map_string(arg, str::to_lowercase),
            (BuiltIn::Contains, [lhs, rhs]) => {
                string_predicate(lhs, rhs, |lhs, rhs| lhs.contains(rhs))
            }
            (BuiltIn::StrStarts, [lhs, rhs]) => {
                string_predicate(lhs, rhs, |lhs, rhs| lhs.starts_with(rhs))
            }
            (BuiltIn::StrEnds, [lhs, rhs]) => {
                string_predicate(lhs, rhs, |lhs, rhs| lhs.ends_with(rhs))
            }
            (BuiltIn::Concat, args) => concat(args),
            _ => ThinError::expected(),
        }
    }
}

/// Decodes a numeric literal.
pub fn numeric(term: &Term) -> ThinResult<Numeric> {
    match TypedValueRef::from_term(term) {
        TypedValueRef::NumericLiteral(value) => Ok(value),
        _ => ThinError::expected(),
    }
}

fn boolean(value: bool) -> Term {
    Literal::from(value).into()
}

fn string_value(term: &Term) -> ThinResult<Term> {
    match term {
        Term::NamedNode(node) => Ok(Literal::new_simple_literal(node.as_str()).into()),
        Term::Literal(literal) => Ok(Literal::new_simple_literal(literal.value()).into()),
        _ => ThinError::expected(),
    }
}

fn lang(term: &Term) -> ThinResult<Term> {
    match term {
        Term::Literal(literal) => {
            Ok(Literal::new_simple_literal(literal.language().unwrap_or_default()).into())
        }
        _ => ThinError::expected(),
    }
}

/// [Basic filtering](https://www.rfc-editor.org/rfc/rfc4647#section-3.3.1) of a language tag.
fn lang_matches(tag: &Term, range: &Term) -> ThinResult<Term> {
    let tag = TypedValueRef::from_term(tag).simple_literal()?;
    let range = TypedValueRef::from_term(range).simple_literal()?;

    let matches = if range == "*" {
        !tag.is_empty()
    } else {
        range
            .split('-')
            .zip_longest(tag.split('-'))
            .all(|parts| match parts {
                EitherOrBoth::Both(range_subtag, tag_subtag) => {
                    range_subtag.eq_ignore_ascii_case(tag_subtag)
                }
                EitherOrBoth::Left(_) => false,
                EitherOrBoth::Right(_) => true,
            })
    };
    Ok(boolean(matches))
}

fn iri(term: &Term) -> ThinResult<Term> {
    match term {
        Term::NamedNode(_) => Ok(term.clone()),
        _ => {
            let value = TypedValueRef::from_term(term).simple_literal()?;
            Ok(NamedNode::new(value)?.into())
        }
    }
}

fn map_string(term: &Term, map: impl Fn(&str) -> String) -> ThinResult<Term> {
    let (value, language) = TypedValueRef::from_term(term).string_literal()?;
    string_literal(map(value), language)
}

fn string_literal(value: String, language: Option<&str>) -> ThinResult<Term> {
    match language {
        None => Ok(Literal::new_simple_literal(value).into()),
        Some(language) => Ok(Literal::new_language_tagged_literal(value, language)
            .map_err(|_| ThinError::default())?
            .into()),
    }
}

/// Evaluates a function on two [argument-compatible](https://www.w3.org/TR/sparql11-query/#func-arg-compatibility)
/// string literals.
fn string_predicate(
    lhs: &Term,
    rhs: &Term,
    predicate: impl Fn(&str, &str) -> bool,
) -> ThinResult<Term> {
    let (lhs_value, lhs_language) = TypedValueRef::from_term(lhs).string_literal()?;
    let (rhs_value, rhs_language) = TypedValueRef::from_term(rhs).string_literal()?;
    if rhs_language.is_some() && lhs_language != rhs_language {
        return ThinError::expected();
    }
    Ok(boolean(predicate(lhs_value, rhs_value)))
}

/// The result keeps the language tag only if all arguments share it.
fn concat(args: &[Term]) -> ThinResult<Term> {
    let mut result = String::new();
    let mut language: Option<Option<&str>> = None;
    for arg in args {
        let (value, arg_language) = TypedValueRef::from_term(arg).string_literal()?;
        result.push_str(value);
        language = match language {
            None => Some(arg_language),
            Some(current) if current == arg_language => Some(current),
            Some(_) => Some(None),
        };
    }
    string_literal(result, language.flatten())
}

/// Compiles a SPARQL regular expression with its flags.
pub fn compile_pattern(pattern: &str, flags: Option<&str>) -> ThinResult<Regex> {
    const REGEX_SIZE_LIMIT: usize = 1_000_000;

    let mut pattern = Cow::Borrowed(pattern);
    let flags = flags.unwrap_or_default();
    if flags.contains('q') {
        pattern = regex::escape(&pattern).into();
    }
    let mut regex_builder = RegexBuilder::new(&pattern);
    regex_builder.size_limit(REGEX_SIZE_LIMIT);
    for flag in flags.chars() {
        match flag {
            's' => {
                regex_builder.dot_matches_new_line(true);
            }
            'm' => {
                regex_builder.multi_line(true);
            }
            'i' => {
                regex_builder.case_insensitive(true);
            }
            'x' => {
                regex_builder.ignore_whitespace(true);
            }
            'q' => (),
            _ => return ThinError::expected(),
        }
    }
    regex_builder.build().map_err(|_| ThinError::default())
}

/// Compiles a pattern that is only known at evaluation time.
pub fn dynamic_pattern(pattern: &Term, flags: Option<&Term>) -> ThinResult<Regex> {
    let pattern = TypedValueRef::from_term(pattern).simple_literal()?;
    let flags = flags
        .map(|flags| TypedValueRef::from_term(flags).simple_literal())
        .transpose()?;
    compile_pattern(pattern, flags)
}

pub fn regex_matches(text: &Term, regex: &Regex) -> ThinResult<bool> {
    let (text, _) = TypedValueRef::from_term(text).string_literal()?;
    Ok(regex.is_match(text))
}
