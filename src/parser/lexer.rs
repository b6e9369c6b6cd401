// Shared token parsers for temporal fragments

use nom::{
    branch::alt,
    bytes::complete::take_while_m_n,
    character::complete::{multispace0, one_of, space0, space1},
    combinator::{map_res, recognize},
    sequence::{delimited, tuple},
    IResult,
};

/// Wrap a parser so it tolerates surrounding whitespace
pub fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Exactly `count` ASCII digits, parsed as an integer
pub fn fixed_digits<'a>(count: usize) -> impl FnMut(&'a str) -> IResult<&'a str, i32> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<i32>(),
    )
}

/// Between `min` and `max` ASCII digits, parsed as an integer
pub fn digits_between<'a>(min: usize, max: usize) -> impl FnMut(&'a str) -> IResult<&'a str, u32> {
    map_res(
        take_while_m_n(min, max, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u32>(),
    )
}

/// Date-part separator: `-`, `/` or `.` with optional padding, or plain whitespace
pub fn separator(input: &str) -> IResult<&str, &str> {
    alt((recognize(tuple((space0, one_of("-/."), space0))), space1))(input)
}
