use std::sync::LazyLock;

use serde::Deserialize;

use crate::{
    common::error::RowError,
    domain::{activity::Activity, basis::realized_basis_for_symbol, position::Position},
    vanguard::{format::StatementFormat, parse_decimal},
};

/// One row of the positions section, narrowed to the columns after the account number
#[derive(Debug, Deserialize)]
pub struct VanguardPosition<'a> {
    pub investment_name: &'a str,
    pub symbol: &'a str,
    pub shares: &'a str,
    pub share_price: &'a str,
    pub total_value: &'a str,
}

pub(crate) static HEADERS_RECORD: LazyLock<csv::StringRecord> = LazyLock::new(|| {
    csv::StringRecord::from(vec![
        "investment_name",
        "symbol",
        "shares",
        "share_price",
        "total_value",
    ])
});

impl VanguardPosition<'_> {
    /// Builds the position, taking its cost basis from the trades of the same symbol in
    /// `activity`.
    ///
    /// # Errors
    ///
    /// Malformed share count, unusable instrument, or no trade to derive the basis from
    pub fn to_position(
        &self,
        format: &StatementFormat,
        activity: &[Activity],
    ) -> Result<Position, RowError> {
        let instrument = format.resolve_instrument(self.symbol, self.investment_name)?;
        let quantity = parse_decimal("shares", self.shares)?;

        let Some(cost_basis) = realized_basis_for_symbol(instrument.symbol(), activity) else {
            return Err(RowError::MissingBasis {
                symbol: instrument.symbol().to_string(),
            });
        };

        Ok(Position::new(instrument, quantity, cost_basis)?)
    }
}
