// Lexical helpers shared by the path grammar

use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1, multispace0},
    combinator::map_res,
    sequence::delimited,
    IResult,
};

/// Wrap a parser so surrounding whitespace is ignored
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Field identifier: letters, digits, `_`, `-` and `$`
pub fn identifier(input: &str) -> IResult<&str, String> {
    let (input, name) =
        take_while1(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '$')(input)?;
    Ok((input, name.to_string()))
}

/// Single or double quoted text without escapes
pub fn string_literal(input: &str) -> IResult<&str, String> {
    let (input, text) = alt((
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
    ))(input)?;
    Ok((input, text.to_string()))
}

/// Unsigned array index
pub fn index_literal(input: &str) -> IResult<&str, usize> {
    map_res(digit1, |d: &str| d.parse::<usize>())(input)
}
