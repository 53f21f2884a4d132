use serde::Serialize;
use strum::IntoDiscriminant;

use crate::{
    common::{amount::Amount, error::ModelError},
    domain::{
        cash::{Cash, Currency},
        instrument::{Instrument, InstrumentKind},
    },
};

/// A holding of an instrument together with what was paid for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    instrument: Instrument,
    quantity: Amount,
    cost_basis: Cash,
}

impl Position {
    pub fn new(instrument: Instrument, quantity: Amount, cost_basis: Cash) -> Result<Self, ModelError> {
        cost_basis.ensure_currency(instrument.currency())?;

        Ok(Self {
            instrument,
            quantity,
            cost_basis,
        })
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn quantity(&self) -> &Amount {
        &self.quantity
    }

    pub fn cost_basis(&self) -> &Cash {
        &self.cost_basis
    }
}

/// Flat view of a [`Position`] for CSV output
#[derive(Debug, Serialize)]
pub struct PositionCsvRow<'a> {
    instrument: InstrumentKind,
    symbol: &'a str,
    quantity: &'a Amount,
    cost_basis: &'a Amount,
    currency: Currency,
}

impl<'a> From<&'a Position> for PositionCsvRow<'a> {
    fn from(position: &'a Position) -> Self {
        Self {
            instrument: position.instrument.discriminant(),
            symbol: position.instrument.symbol(),
            quantity: &position.quantity,
            cost_basis: &position.cost_basis.quantity,
            currency: position.cost_basis.currency,
        }
    }
}
