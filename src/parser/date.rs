// Parsers for textual date fragments found in category labels
//
// Recognized shapes:
//   Mar-2024, Mar 2024, March 2024, Mar-24      -> MonthYear
//   2024-03, 2024/3                             -> MonthYear
//   Q1, Qtr 1, Quarter 1, Q1 2024, 2024 Q1      -> Quarter
//   January, Jan, Sept                          -> Month
//   2020, -3000, 3000 BC, 500 AD                -> Year

use super::lexer::{digits_between, fixed_digits, separator, ws};
use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while_m_n},
    character::complete::{alpha1, char, one_of, space0, space1},
    combinator::{all_consuming, map, map_opt, map_res, opt},
    sequence::{pair, preceded, separated_pair, tuple},
    IResult,
};

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Two-digit years at or below this pivot land in the 2000s, the rest in the 1900s.
pub const TWO_DIGIT_YEAR_PIVOT: i32 = 79;

/// A parsed temporal label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemporalFragment {
    MonthYear { year: i32, month: u32 },
    Quarter { quarter: u32, year: Option<i32> },
    Month(u32),
    Year(i32),
}

/// Month number (1-12) for a full or abbreviated (3+ letters) English month name
pub fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|m| m.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

pub fn expand_two_digit_year(yy: i32) -> i32 {
    if yy <= TWO_DIGIT_YEAR_PIVOT {
        2000 + yy
    } else {
        1900 + yy
    }
}

fn month_name(input: &str) -> IResult<&str, u32> {
    map_opt(alpha1, month_number)(input)
}

fn month_digits(input: &str) -> IResult<&str, u32> {
    map_opt(digits_between(1, 2), |m| (1..=12).contains(&m).then_some(m))(input)
}

fn year_four(input: &str) -> IResult<&str, i32> {
    fixed_digits(4)(input)
}

fn year_two_or_four(input: &str) -> IResult<&str, i32> {
    alt((year_four, map(fixed_digits(2), expand_two_digit_year)))(input)
}

/// Mar-2024, March 2024, Mar-24
fn month_year(input: &str) -> IResult<&str, TemporalFragment> {
    map(
        separated_pair(month_name, separator, year_two_or_four),
        |(month, year)| TemporalFragment::MonthYear { year, month },
    )(input)
}

/// 2024-03, 2024/3
fn year_month(input: &str) -> IResult<&str, TemporalFragment> {
    map(
        separated_pair(year_four, one_of("-/"), month_digits),
        |(year, month)| TemporalFragment::MonthYear { year, month },
    )(input)
}

fn quarter_number(input: &str) -> IResult<&str, u32> {
    preceded(
        pair(
            alt((tag_no_case("quarter"), tag_no_case("qtr"), tag_no_case("q"))),
            space0,
        ),
        map_opt(one_of("1234"), |c| c.to_digit(10)),
    )(input)
}

/// Q1, Qtr 1, Q1 2024, 2024-Q1
fn quarter_label(input: &str) -> IResult<&str, TemporalFragment> {
    alt((
        map(
            pair(quarter_number, opt(preceded(separator, year_four))),
            |(quarter, year)| TemporalFragment::Quarter { quarter, year },
        ),
        map(
            separated_pair(year_four, separator, quarter_number),
            |(year, quarter)| TemporalFragment::Quarter { quarter, year: Some(year) },
        ),
    ))(input)
}

fn era(input: &str) -> IResult<&str, i32> {
    alt((
        map(alt((tag_no_case("bce"), tag_no_case("bc"))), |_| -1),
        map(alt((tag_no_case("ad"), tag_no_case("ce"))), |_| 1),
    ))(input)
}

/// 2020, -3000, 3000 BC
fn year_with_era(input: &str) -> IResult<&str, TemporalFragment> {
    map(
        tuple((
            opt(char('-')),
            map_res(take_while_m_n(1, 4, |c: char| c.is_ascii_digit()), |s: &str| {
                s.parse::<i32>()
            }),
            opt(preceded(space1, era)),
        )),
        |(minus, year, era_sign)| {
            let sign = if minus.is_some() { -1 } else { 1 };
            TemporalFragment::Year(sign * era_sign.unwrap_or(1) * year)
        },
    )(input)
}

fn fragment(input: &str) -> IResult<&str, TemporalFragment> {
    alt((
        month_year,
        year_month,
        quarter_label,
        map(month_name, TemporalFragment::Month),
        year_with_era,
    ))(input)
}

/// Parse a whole label as a temporal fragment. Trailing text rejects the label.
pub fn parse_temporal_fragment(input: &str) -> Option<TemporalFragment> {
    all_consuming(ws(fragment))(input).ok().map(|(_, f)| f)
}
