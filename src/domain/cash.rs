use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::common::{amount::Amount, error::ModelError};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
pub enum Currency {
    USD,
}

/// An amount of money in a single currency
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cash {
    pub currency: Currency,
    pub quantity: Amount,
}

impl Cash {
    pub fn new(currency: Currency, quantity: Amount) -> Self {
        Self { currency, quantity }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::new(currency, Amount::zero())
    }

    /// Adds two amounts of the same currency
    pub fn checked_add(&self, other: &Cash) -> Result<Cash, ModelError> {
        self.ensure_currency(other.currency)?;

        let mut quantity = self.quantity.clone();
        quantity += &other.quantity;
        Ok(Cash::new(self.currency, quantity))
    }

    pub(crate) fn ensure_currency(&self, expected: Currency) -> Result<(), ModelError> {
        if self.currency == expected {
            Ok(())
        } else {
            Err(ModelError::CurrencyMismatch {
                expected,
                found: self.currency,
            })
        }
    }
}

impl std::ops::Neg for Cash {
    type Output = Cash;

    fn neg(self) -> Self::Output {
        Cash::new(self.currency, -self.quantity)
    }
}

impl std::fmt::Display for Cash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.quantity, self.currency)
    }
}
