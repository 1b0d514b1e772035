//! Token grammars for expression categories, written with nom.
//!
//! Every recognizer here works on a prefix of its input; callers that need a
//! whole-token match go through [`full`].

use nom::{
    IResult,
    branch::alt,
    bytes::complete::{is_not, tag, take_while1, take_while_m_n},
    character::complete::{alpha1, alphanumeric1, anychar, char, digit1, one_of},
    combinator::{all_consuming, map, opt, recognize, rest, value},
    error::{Error, ErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded, separated_pair, tuple},
};

/// Built-in SPARQL 1.1 function and aggregate names that may open a function
/// expression.
pub const BUILTIN_FUNCTIONS: &[&str] = &[
    // Aggregates
    "COUNT", "SUM", "MIN", "MAX", "AVG", "SAMPLE", "GROUP_CONCAT",
    // Terms
    "STR", "LANG", "LANGMATCHES", "DATATYPE", "BOUND", "IRI", "URI", "BNODE", "RAND",
    "STRLANG", "STRDT", "sameTerm", "isIRI", "isURI", "isBLANK", "isLITERAL", "isNUMERIC",
    // Numerics
    "ABS", "CEIL", "FLOOR", "ROUND",
    // Strings
    "CONCAT", "STRLEN", "UCASE", "LCASE", "ENCODE_FOR_URI", "CONTAINS", "STRSTARTS",
    "STRENDS", "STRBEFORE", "STRAFTER", "REGEX", "SUBSTR", "REPLACE",
    // Dates and times
    "YEAR", "MONTH", "DAY", "HOURS", "MINUTES", "SECONDS", "TIMEZONE", "TZ", "NOW",
    // Identifiers and hashes
    "UUID", "STRUUID", "MD5", "SHA1", "SHA256", "SHA384", "SHA512",
    // Control
    "COALESCE", "IF", "NOT EXISTS", "EXISTS", "DISTINCT",
];

pub(crate) fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_label_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Run `parser` and require it to consume the whole input.
pub(crate) fn full<'a, O, P>(parser: P, input: &'a str) -> Option<O>
where
    P: FnMut(&'a str) -> IResult<&'a str, O>,
{
    all_consuming(parser)(input).ok().map(|(_, out)| out)
}

pub(crate) fn word(input: &str) -> IResult<&str, &str> {
    take_while1(is_word_char)(input)
}

/// Prefix label: letters and underscores only.
pub(crate) fn label(input: &str) -> IResult<&str, &str> {
    take_while1(is_label_char)(input)
}

/// `?name` or `$name`, yielding the name without its sigil.
pub(crate) fn variable(input: &str) -> IResult<&str, &str> {
    preceded(one_of("?$"), word)(input)
}

/// `a` or `<...>` where the body may hold backslash escapes but no bare angle
/// brackets.
pub(crate) fn iri(input: &str) -> IResult<&str, &str> {
    alt((
        tag("a"),
        recognize(delimited(
            char('<'),
            many0(alt((recognize(pair(char('\\'), anychar)), is_not("<>\\")))),
            char('>'),
        )),
    ))(input)
}

/// `label:local`, yielding the label.
pub(crate) fn prefixed_iri(input: &str) -> IResult<&str, &str> {
    map(separated_pair(label, char(':'), word), |(label, _)| label)(input)
}

fn builtin(input: &str) -> IResult<&str, &str> {
    BUILTIN_FUNCTIONS
        .iter()
        .find(|name| input.starts_with(**name))
        .map(|name| (&input[name.len()..], &input[..name.len()]))
        .ok_or_else(|| nom::Err::Error(Error::new(input, ErrorKind::Tag)))
}

/// The opening of a function expression. Whatever follows is not inspected.
pub(crate) fn function_head(input: &str) -> IResult<&str, &str> {
    alt((
        builtin,
        recognize(variable),
        take_while_m_n(1, 1, is_word_char),
    ))(input)
}

pub(crate) fn is_function(input: &str) -> bool {
    function_head(input).is_ok()
}

/// Split `<function> AS ?target` into the function text and the target name.
pub(crate) fn split_binding(input: &str) -> Option<(&str, &str)> {
    input.rmatch_indices(" AS ").find_map(|(idx, sep)| {
        let (head, tail) = (&input[..idx], &input[idx + sep.len()..]);
        let target = full(variable, tail)?;
        is_function(head).then_some((head, target))
    })
}

fn quoted<'a>(quote: char) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    move |input: &'a str| {
        recognize(delimited(
            char(quote),
            many0(alt((
                recognize(pair(char('\\'), anychar)),
                take_while1(move |c: char| c != quote && c != '\\'),
            ))),
            char(quote),
        ))(input)
    }
}

pub(crate) fn string_literal(input: &str) -> IResult<&str, &str> {
    alt((quoted('"'), quoted('\'')))(input)
}

/// `<...>` without whitespace, as it appears inside a function expression.
pub(crate) fn embedded_iri(input: &str) -> IResult<&str, &str> {
    recognize(delimited(char('<'), is_not("<> \t\r\n"), char('>')))(input)
}

fn number(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        digit1,
        opt(pair(char('.'), digit1)),
    )))(input)
}

fn language_tag(input: &str) -> IResult<&str, &str> {
    recognize(pair(alpha1, many0(pair(char('-'), alphanumeric1))))(input)
}

/// An RDF literal: a quoted string with an optional language tag or datatype,
/// a number, or a boolean. Yields the datatype text when one is present.
pub(crate) fn rdf_literal(input: &str) -> IResult<&str, Option<&str>> {
    alt((
        map(
            pair(
                string_literal,
                opt(alt((
                    value(None, preceded(char('@'), language_tag)),
                    map(preceded(tag("^^"), rest), Some),
                ))),
            ),
            |(_, datatype)| datatype.flatten(),
        ),
        value(None, number),
        value(None, alt((tag("true"), tag("false")))),
    ))(input)
}

/// Names mentioned by a function expression.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Mentions<'a> {
    pub variables: Vec<&'a str>,
    pub prefixes: Vec<&'a str>,
}

/// Collect every variable not introduced by `AS ` and every `label:` in a
/// function expression. String literals and `<...>` IRIs are skipped.
pub(crate) fn mentions(input: &str) -> Mentions<'_> {
    let mut found = Mentions::default();
    let mut pos = 0;

    while pos < input.len() {
        let tail = &input[pos..];

        if let Ok((after, name)) = variable(tail) {
            if !input[..pos].ends_with("AS ") {
                found.variables.push(name);
            }
            pos = input.len() - after.len();
        } else if let Ok((after, _)) = alt((string_literal, embedded_iri))(tail) {
            pos = input.len() - after.len();
        } else if let Ok((after, run)) = word(tail) {
            if after.starts_with(':') && run.chars().all(is_label_char) {
                found.prefixes.push(run);
            }
            pos = input.len() - after.len();
        } else {
            pos += tail.chars().next().map_or(1, char::len_utf8);
        }
    }

    found
}
