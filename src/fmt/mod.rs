//! Pretty printer for rendered query text.
//!
//! Only whitespace changes: tokens come out in the order they went in.

use nom::{
    IResult,
    branch::alt,
    error::{Error, ErrorKind},
};

use crate::validator::{embedded_iri, iri, string_literal};


/// Keywords that start a new line at the current depth.
const LINE_STARTERS: &[&str] = &["PREFIX", "SELECT", "FILTER", "GROUP", "HAVING", "ORDER", "LIMIT", "OFFSET"];

pub struct Formatter {
    indent_width: usize,
    indent_level: usize,
    continuation: bool,
    parens: usize,
    line: String,
    buffer: Vec<String>,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

impl Formatter {
    pub fn new() -> Self {
        Self {
            indent_width: 2,
            indent_level: 0,
            continuation: false,
            parens: 0,
            line: String::new(),
            buffer: Vec::new(),
        }
    }

    /// Use `width` spaces per indentation level.
    pub fn with_indent(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    pub fn format(mut self, sparql: &str) -> String {
        let mut input = sparql;
        while let Ok((rest, token)) = next_token(input, self.parens == 0) {
            self.visit(token);
            self.parens = self.parens.saturating_add_signed(paren_balance(token));
            input = rest;
        }
        self.flush();
        self.buffer.join("\n")
    }

    fn visit(&mut self, token: &str) {
        match token {
            "{" => {
                self.push(token);
                self.flush();
                self.indent_level += 1;
                self.continuation = false;
            }
            "}" => {
                self.flush();
                self.indent_level = self.indent_level.saturating_sub(1);
                self.continuation = false;
                self.push(token);
                self.flush();
            }
            "." => {
                self.push(token);
                self.flush();
                self.continuation = false;
            }
            ";" => {
                self.push(token);
                self.flush();
                self.continuation = true;
            }
            keyword if LINE_STARTERS.contains(&keyword) => {
                self.flush();
                self.push(keyword);
            }
            _ => self.push(token),
        }
    }

    fn push(&mut self, token: &str) {
        if self.line.is_empty() {
            let depth = self.indent_level + usize::from(self.continuation);
            self.line.push_str(&" ".repeat(depth * self.indent_width));
        } else {
            self.line.push(' ');
        }
        self.line.push_str(token);
    }

    fn flush(&mut self) {
        if !self.line.is_empty() {
            self.buffer.push(std::mem::take(&mut self.line));
        }
    }
}

/// A whitespace separated word. Quoted strings and IRIs stay whole, together
/// with anything glued to them.
fn word(input: &str) -> IResult<&str, &str> {
    let mut rest = input;
    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            break;
        }
        rest = match alt((string_literal, embedded_iri))(rest) {
            Ok((after, _)) => after,
            Err(_) => &rest[c.len_utf8()..],
        };
    }
    let consumed = input.len() - rest.len();
    Ok((rest, &input[..consumed]))
}

/// Outside parentheses a `<` can only open an IRI, which may hold whitespace.
/// Inside function text it may be a comparison.
fn next_token(input: &str, terms: bool) -> IResult<&str, &str> {
    let input = input.trim_start();
    if input.is_empty() {
        return Err(nom::Err::Error(Error::new(input, ErrorKind::Eof)));
    }
    if terms && input.starts_with('<') {
        if let Ok(found) = iri(input) {
            return Ok(found);
        }
    }
    word(input)
}

/// Opened minus closed parentheses, ignoring those in strings and IRIs.
fn paren_balance(token: &str) -> isize {
    let mut balance = 0;
    let mut rest = token;
    while let Some(c) = rest.chars().next() {
        rest = match alt((string_literal, embedded_iri))(rest) {
            Ok((after, _)) => after,
            Err(_) => {
                match c {
                    '(' => balance += 1,
                    ')' => balance -= 1,
                    _ => {}
                }
                &rest[c.len_utf8()..]
            }
        };
    }
    balance
}
