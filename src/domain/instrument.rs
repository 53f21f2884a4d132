use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, IntoDiscriminant};

use crate::{common::error::ModelError, domain::cash::Currency};

/// A tradable security
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumDiscriminants)]
#[strum_discriminants(
    name(InstrumentKind),
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Instrument {
    Stock(Stock),
    Bond(Bond),
}

serde_plain::derive_display_from_serialize!(InstrumentKind);

impl Instrument {
    pub fn symbol(&self) -> &str {
        match self {
            Instrument::Stock(stock) => &stock.symbol,
            Instrument::Bond(bond) => &bond.symbol,
        }
    }

    pub fn currency(&self) -> Currency {
        match self {
            Instrument::Stock(stock) => stock.currency,
            Instrument::Bond(bond) => bond.currency,
        }
    }
}

impl From<Stock> for Instrument {
    fn from(stock: Stock) -> Self {
        Instrument::Stock(stock)
    }
}

impl From<Bond> for Instrument {
    fn from(bond: Bond) -> Self {
        Instrument::Bond(bond)
    }
}

impl std::fmt::Display for Instrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.discriminant(), self.symbol())
    }
}

/// Equity or fund, identified by its ticker (or by name when no ticker is known)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stock {
    symbol: String,
    currency: Currency,
}

impl Stock {
    pub fn new(symbol: impl Into<String>, currency: Currency) -> Result<Self, ModelError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ModelError::EmptySymbol);
        }

        Ok(Self { symbol, currency })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Bond {
    symbol: String,
    currency: Currency,
}

impl Bond {
    /// With `validate_symbol`, the symbol must be a CUSIP with a correct check digit.
    /// Statements that only carry a bond's description pass `false`.
    pub fn new(
        symbol: impl Into<String>,
        currency: Currency,
        validate_symbol: bool,
    ) -> Result<Self, ModelError> {
        let symbol = symbol.into();
        if symbol.trim().is_empty() {
            return Err(ModelError::EmptySymbol);
        }
        if validate_symbol && !is_valid_cusip(&symbol) {
            return Err(ModelError::InvalidCusip(symbol));
        }

        Ok(Self { symbol, currency })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }
}

fn is_valid_cusip(cusip: &str) -> bool {
    let chars: Vec<char> = cusip.chars().collect();
    if chars.len() != 9 {
        return false;
    }

    let mut sum = 0;
    for (i, c) in chars[..8].iter().enumerate() {
        let value = match c {
            '0'..='9' | 'A'..='Z' => c.to_digit(36).unwrap_or_default(),
            '*' => 36,
            '@' => 37,
            '#' => 38,
            _ => return false,
        };
        let value = if i % 2 == 1 { value * 2 } else { value };
        sum += value / 10 + value % 10;
    }

    chars[8].to_digit(10) == Some((10 - sum % 10) % 10)
}
