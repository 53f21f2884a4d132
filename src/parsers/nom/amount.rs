use nom::{
    IResult, Parser,
    character::complete::{char, digit1, one_of},
    combinator::{eof, opt},
    sequence::{preceded, terminated},
};
use num_bigint::BigInt;

use crate::common::{amount::Amount, error::ParseAmountError};

fn amount_parts(input: &str) -> IResult<&str, (Option<char>, &str, Option<&str>)> {
    (
        opt(one_of("+-")),
        digit1,
        opt(preceded(char('.'), digit1)),
    )
        .parse(input)
}

/// nom parser for [`Amount`]
///
/// Accepts an optional sign, integer digits and an optional fraction. A fraction longer
/// than [`Amount::FRACTION_DIGITS`] is a failure, never a silent truncation.
pub fn parse_amount(initial_input: &str) -> IResult<&str, Amount> {
    let (input, (sign, integer, fraction)) = amount_parts(initial_input)?;

    let fraction = fraction.unwrap_or("");
    if fraction.len() > Amount::FRACTION_DIGITS {
        return Err(nom::Err::Failure(nom::error::Error::new(
            initial_input,
            nom::error::ErrorKind::TooLarge,
        )));
    }

    let digits = format!("{integer}{fraction:0<width$}", width = Amount::FRACTION_DIGITS);
    let Some(mut units) = BigInt::parse_bytes(digits.as_bytes(), 10) else {
        return Err(nom::Err::Failure(nom::error::Error::new(
            initial_input,
            nom::error::ErrorKind::Digit,
        )));
    };
    if let Some('-') = sign {
        units = -units;
    }

    Ok((input, Amount::from_units(units)))
}

/// Parses a whole CSV field as an [`Amount`].
pub fn parse_amount_field(field: &str) -> Result<Amount, ParseAmountError> {
    match terminated(parse_amount, eof).parse(field.trim()) {
        Ok((_, amount)) => Ok(amount),
        Err(nom::Err::Failure(err)) if err.code == nom::error::ErrorKind::TooLarge => {
            Err(ParseAmountError::TooPrecise {
                max: Amount::FRACTION_DIGITS,
            })
        }
        Err(_) => Err(ParseAmountError::Malformed),
    }
}
