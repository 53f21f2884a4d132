use std::{
    fmt::Display,
    ops::{Add, AddAssign, Neg, Sub},
    str::FromStr,
};

use fake::Faker;
use num_bigint::{BigInt, Sign};
use serde::Serialize;

use crate::common::error::ParseAmountError;

/// An exact signed decimal with up to [`Amount::FRACTION_DIGITS`] digits after the point.
///
/// The value is kept as a single integer count of 10^-12 units, so sums of cash and share
/// quantities never lose precision and `-0.5` and `0.50` compare the way one would expect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount {
    units: BigInt,
}

const SCALE: u64 = 1_000_000_000_000;

impl Amount {
    pub const FRACTION_DIGITS: usize = 12;

    pub fn zero() -> Self {
        Self {
            units: BigInt::from(0),
        }
    }

    /// Builds an amount from a count of 10^-12 units.
    pub fn from_units(units: BigInt) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &BigInt {
        &self.units
    }

    pub fn is_zero(&self) -> bool {
        self.units.sign() == Sign::NoSign
    }

    pub fn is_negative(&self) -> bool {
        self.units.sign() == Sign::Minus
    }
}

impl From<i64> for Amount {
    fn from(value: i64) -> Self {
        Self {
            units: BigInt::from(value) * SCALE,
        }
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parses locale-neutral decimal text such as `-3456.78`. Surrounding whitespace is
    /// ignored; anything else that is not part of the number is an error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parsers::nom::amount::parse_amount_field(s)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            units: self.units + rhs.units,
        }
    }
}

impl AddAssign<&Amount> for Amount {
    fn add_assign(&mut self, rhs: &Amount) {
        self.units += &rhs.units;
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            units: self.units - rhs.units,
        }
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Self::Output {
        Self { units: -self.units }
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let magnitude = self.units.magnitude();
        let integer = magnitude / SCALE;
        let fraction = (magnitude % SCALE).to_string();
        let sign = if self.is_negative() { "-" } else { "" };

        let fraction = format!("{fraction:0>width$}", width = Amount::FRACTION_DIGITS);
        let fraction = fraction.trim_end_matches('0');
        if fraction.is_empty() {
            write!(f, "{sign}{integer}")
        } else {
            write!(f, "{sign}{integer}.{fraction}")
        }
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl fake::Dummy<Faker> for Amount {
    fn dummy_with_rng<R: fake::Rng + ?Sized>(_config: &Faker, rng: &mut R) -> Self {
        let units: i64 = rng.random();

        Self {
            units: units.into(),
        }
    }
}
