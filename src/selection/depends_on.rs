//! Parser for the selection sets attached to computed fields, e.g.
//! `{ firstName lastName agent { name } }`.
//!
//! Commas are insignificant, aliases are `alias: field`, and argument values
//! follow GraphQL literal syntax (strings, numbers, booleans, null, enums,
//! lists and objects).

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{alpha1, char, digit1},
    combinator::{map, map_res, opt, recognize},
    multi::many0,
    sequence::{delimited, pair, preceded, separated_pair, terminated},
    IResult, Parser,
};
use serde_json::{Map, Number, Value};

use super::errors::SelectionError;

/// A field in a parsed selection set, before type names are attached
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionField {
    pub name: String,
    pub alias: Option<String>,
    pub args: Map<String, Value>,
    pub selection: Vec<SelectionField>,
}

impl SelectionField {
    pub fn response_key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Whitespace and commas
fn ignored(input: &str) -> IResult<&str, &str> {
    take_while(|c: char| c.is_whitespace() || c == ',').parse(input)
}

fn tok<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>
where
    F: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    delimited(ignored, inner, ignored)
}

fn name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn string_value(input: &str) -> IResult<&str, Value> {
    map(
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        |s: &str| Value::String(s.to_string()),
    )
    .parse(input)
}

fn number_value(input: &str) -> IResult<&str, Value> {
    map_res(
        recognize((opt(char('-')), digit1, opt(pair(char('.'), digit1)))),
        |text: &str| -> Result<Value, String> {
            if let Ok(int) = text.parse::<i64>() {
                return Ok(Value::Number(int.into()));
            }
            text.parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(|| format!("invalid number {}", text))
        },
    )
    .parse(input)
}

fn keyword_value(input: &str) -> IResult<&str, Value> {
    let (rest, word) = name(input)?;
    let parsed = match word {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        other => Value::String(other.to_string()),
    };
    Ok((rest, parsed))
}

fn list_value(input: &str) -> IResult<&str, Value> {
    map(
        delimited(tok(char('[')), many0(tok(literal)), char(']')),
        Value::Array,
    )
    .parse(input)
}

fn object_entry(input: &str) -> IResult<&str, (String, Value)> {
    map(
        separated_pair(tok(name), char(':'), tok(literal)),
        |(key, val)| (key.to_string(), val),
    )
    .parse(input)
}

fn object_value(input: &str) -> IResult<&str, Value> {
    map(
        delimited(tok(char('{')), many0(object_entry), char('}')),
        |entries| Value::Object(entries.into_iter().collect()),
    )
    .parse(input)
}

fn literal(input: &str) -> IResult<&str, Value> {
    alt((
        string_value,
        number_value,
        list_value,
        object_value,
        keyword_value,
    ))
    .parse(input)
}

fn arguments(input: &str) -> IResult<&str, Map<String, Value>> {
    map(
        delimited(tok(char('(')), many0(object_entry), char(')')),
        |entries| entries.into_iter().collect(),
    )
    .parse(input)
}

fn field(input: &str) -> IResult<&str, SelectionField> {
    let (input, first) = tok(name).parse(input)?;
    let (input, second) = opt(preceded(char(':'), tok(name))).parse(input)?;
    let (input, args) = opt(tok(arguments)).parse(input)?;
    let (input, selection) = opt(tok(selection_set)).parse(input)?;

    let (name, alias) = match second {
        Some(field_name) => (field_name, Some(first.to_string())),
        None => (first, None),
    };
    Ok((
        input,
        SelectionField {
            name: name.to_string(),
            alias,
            args: args.unwrap_or_default(),
            selection: selection.unwrap_or_default(),
        },
    ))
}

fn selection_set(input: &str) -> IResult<&str, Vec<SelectionField>> {
    delimited(tok(char('{')), many0(field), char('}')).parse(input)
}

/// Parse a complete selection set; trailing input is an error
pub fn parse_selection_set(input: &str) -> Result<Vec<SelectionField>, SelectionError> {
    let invalid = |message: String| SelectionError::InvalidDependsOn {
        selection: input.to_string(),
        message,
    };
    match terminated(selection_set, ignored).parse(input) {
        Ok(("", fields)) => Ok(fields),
        Ok((rest, _)) => Err(invalid(format!("unexpected input at `{}`", rest))),
        Err(e) => Err(invalid(e.to_string())),
    }
}
