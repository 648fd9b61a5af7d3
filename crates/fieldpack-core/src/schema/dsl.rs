//! Line parsers for the text layout languages, built on nom.
//!
//! ## Grammar
//!
//! ```text
//! line        := [statement] [comment]
//! statement   := byte_order | field
//! byte_order  := '@' | '=' | '<' | '>' | '!'
//! field       := TYPE [ '[' DIGITS ']' ] NAME
//! comment     := '#' anything
//!
//! offset_line := [offset_stmt] [comment]
//! offset_stmt := byte_order | OFFSET (field | 'EOF')
//! OFFSET      := '0x' HEXDIGITS
//! ```
//!
//! `TYPE` and `NAME` are identifiers (`[A-Za-z_][A-Za-z0-9_]*`). Spaces and
//! tabs may separate any two tokens.

use super::ByteOrder;
use crate::error::SchemaError;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, hex_digit1, one_of, satisfy},
    combinator::{all_consuming, cut, map, map_opt, map_res, opt, recognize, rest},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// A `TYPE[COUNT] NAME` declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldDecl<'a> {
    pub(crate) type_tag: &'a str,
    pub(crate) count: usize,
    pub(crate) name: &'a str,
}

/// One parsed line of a sequential layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Statement<'a> {
    /// Schema-wide byte order directive
    ByteOrder(ByteOrder),
    /// A field declaration
    Field(FieldDecl<'a>),
}

/// One parsed line of an offset layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OffsetStatement<'a> {
    /// Schema-wide byte order directive
    ByteOrder(ByteOrder),
    /// A field placed at an absolute offset
    Field { offset: usize, field: FieldDecl<'a> },
    /// Total record length
    Eof(usize),
}

/// Parses a single sequential layout line. Returns `None` for blank and
/// comment-only lines.
pub(crate) fn parse_line(text: &str, line: usize) -> Result<Option<Statement<'_>>, SchemaError> {
    let statement = alt((
        map(byte_order, Statement::ByteOrder),
        map(field, Statement::Field),
    ));
    finish(text, line, statement)
}

/// Parses a single offset layout line. Returns `None` for blank and
/// comment-only lines.
pub(crate) fn parse_offset_line(
    text: &str,
    line: usize,
) -> Result<Option<OffsetStatement<'_>>, SchemaError> {
    let placed = map(
        pair(
            terminated(offset, blank1),
            alt((map(field, Some), map(tag("EOF"), |_| None))),
        ),
        |(offset, field)| match field {
            Some(field) => OffsetStatement::Field { offset, field },
            None => OffsetStatement::Eof(offset),
        },
    );
    let statement = alt((map(byte_order, OffsetStatement::ByteOrder), placed));
    finish(text, line, statement)
}

/// Runs `statement` over a whole line, allowing surrounding blanks and a
/// trailing comment, and maps nom failures to line-numbered syntax errors
fn finish<'a, O, F>(text: &'a str, line: usize, statement: F) -> Result<Option<O>, SchemaError>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    let parsed = all_consuming(delimited(
        blank,
        opt(statement),
        pair(blank, opt(comment)),
    ))(text);

    match parsed {
        Ok((_, statement)) => Ok(statement),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            let column = text.len() - e.input.len() + 1;
            let details = match e.input.chars().next() {
                Some(c) => format!("unexpected '{}' at column {}", c, column),
                None => "unexpected end of line".to_string(),
            };
            Err(SchemaError::syntax(line, details))
        }
        Err(nom::Err::Incomplete(_)) => Err(SchemaError::syntax(line, "incomplete statement")),
    }
}

fn blank(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| matches!(c, ' ' | '\t' | '\r'))(input)
}

fn blank1(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| matches!(c, ' ' | '\t' | '\r'))(input)
}

fn comment(input: &str) -> IResult<&str, &str> {
    preceded(char('#'), rest)(input)
}

fn byte_order(input: &str) -> IResult<&str, ByteOrder> {
    map_opt(one_of("@=<>!"), ByteOrder::from_directive)(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// `[DIGITS]`; once the bracket is seen the count must be well formed
fn count(input: &str) -> IResult<&str, usize> {
    preceded(
        char('['),
        cut(terminated(map_res(digit1, str::parse::<usize>), char(']'))),
    )(input)
}

fn field(input: &str) -> IResult<&str, FieldDecl<'_>> {
    map(
        tuple((identifier, blank, opt(terminated(count, blank)), identifier)),
        |(type_tag, _, count, name)| FieldDecl {
            type_tag,
            count: count.unwrap_or(1),
            name,
        },
    )(input)
}

fn offset(input: &str) -> IResult<&str, usize> {
    preceded(
        tag("0x"),
        cut(map_res(hex_digit1, |hex: &str| usize::from_str_radix(hex, 16))),
    )(input)
}
