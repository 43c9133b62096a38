use chrono::NaiveDate;
use nom::branch::alt;
use nom::bytes::complete::{is_not, tag, take_while1, take_while_m_n};
use nom::character::complete::{char, digit0, digit1, one_of, space0};
use nom::combinator::{map, map_res, opt, recognize};
use nom::multi::many1;
use nom::sequence::{delimited, preceded, tuple};
use nom::IResult;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::model::*;
use crate::syntax::LineSyntax;

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_commodity_char(c: char) -> bool {
    (c != '-') && !is_digit(c) && !is_white_char(c) && is_not_eol_or_comment_char(c)
}

pub(crate) fn is_white_char(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_not_eol_or_comment_char(c: char) -> bool {
    c != '\r' && c != '\n' && c != ';'
}

fn date_separator(input: &str) -> IResult<&str, char> {
    one_of("-/.")(input)
}

/// `YYYY-MM-DD` with `-`, `/` or `.` separators and one or two digit month and day.
pub(crate) fn date_token(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        take_while_m_n(4, 4, is_digit),
        date_separator,
        take_while_m_n(1, 2, is_digit),
        date_separator,
        take_while_m_n(1, 2, is_digit),
    )))(input)
}

/// `=DATE` directly following a header date.
pub(crate) fn effective_date_suffix(input: &str) -> IResult<&str, &str> {
    preceded(char('='), date_token)(input)
}

/// `[=DATE]`, with optional blanks around the date, yielding the date.
pub(crate) fn date_annotation(input: &str) -> IResult<&str, &str> {
    delimited(tag("[="), delimited(space0, date_token, space0), char(']'))(input)
}

pub(crate) fn status_marker(input: &str) -> IResult<&str, TransactionStatus> {
    map(one_of("*!"), |status| {
        if status == '*' {
            TransactionStatus::Cleared
        } else {
            TransactionStatus::Pending
        }
    })(input)
}

pub(crate) fn parse_date(text: &str) -> Option<NaiveDate> {
    let (rest, token) = date_token(text.trim()).ok()?;
    if !rest.is_empty() {
        return None;
    }
    let mut parts = token.split(['-', '/', '.']);
    let year = parts.next()?.parse().ok()?;
    let month = parts.next()?.parse().ok()?;
    let day = parts.next()?.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Length of the account name at the start of `text`.
///
/// The name ends at a tab, two consecutive spaces, a comment lead or the end
/// of the line, with trailing spaces dropped.
pub(crate) fn account_len(text: &str, syntax: &LineSyntax) -> usize {
    let mut second_space = false;
    for (pos, c) in text.char_indices() {
        if c == '\t' || c == '\r' || c == '\n' || syntax.is_comment_lead(c) {
            return text[..pos].trim_end_matches(is_white_char).len();
        }

        if c == ' ' {
            if second_space {
                return pos - 1;
            }
            second_space = true;
        } else {
            second_space = false;
        }
    }

    text.trim_end_matches(is_white_char).len()
}

pub(crate) fn quantity(input: &str) -> IResult<&str, Decimal> {
    map_res(
        tuple((
            opt(char('-')),
            take_while_m_n(1, 3, is_digit),
            alt((
                map(
                    many1(preceded(char(','), take_while_m_n(3, 3, is_digit))),
                    |groups: Vec<&str>| groups.concat(),
                ),
                map(digit0, |d: &str| d.to_string()),
            )),
            opt(recognize(preceded(char('.'), digit1))),
        )),
        |(sign, leading, rest, fractional): (Option<char>, &str, String, Option<&str>)| {
            Decimal::from_str(&format!(
                "{}{}{}{}",
                if sign.is_some() { "-" } else { "" },
                leading,
                rest,
                fractional.unwrap_or("")
            ))
        },
    )(input)
}

fn string_between_quotes(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), is_not("\""), char('"'))(input)
}

fn commodity_without_quotes(input: &str) -> IResult<&str, &str> {
    take_while1(is_commodity_char)(input)
}

pub(crate) fn commodity(input: &str) -> IResult<&str, &str> {
    alt((string_between_quotes, commodity_without_quotes))(input)
}

pub(crate) fn amount(input: &str) -> IResult<&str, Amount> {
    alt((
        map(
            tuple((opt(char('-')), space0, commodity, space0, quantity)),
            |(negative, _, name, _, quantity)| Amount {
                quantity: if negative.is_some() {
                    -quantity
                } else {
                    quantity
                },
                commodity: Commodity {
                    name: name.to_string(),
                    position: CommodityPosition::Left,
                },
            },
        ),
        map(tuple((quantity, space0, commodity)), |(quantity, _, name)| {
            Amount {
                quantity,
                commodity: Commodity {
                    name: name.to_string(),
                    position: CommodityPosition::Right,
                },
            }
        }),
    ))(input)
}
