use std::sync::LazyLock;

use serde::Deserialize;
use tracing::debug;

use crate::{
    common::error::RowError,
    domain::{
        activity::{Activity, DividendPayment, Trade, TradeFlags},
        cash::Cash,
        instrument::Stock,
    },
    parsers::lenient::RowOutcome,
    vanguard::{format::StatementFormat, parse_decimal},
};

/// One row of the transactions section, after the account number and the trailing empty
/// column have been dropped
#[derive(Debug, Deserialize)]
pub struct VanguardTransaction<'a> {
    pub trade_date: &'a str,
    pub settlement_date: &'a str,
    pub transaction_type: &'a str,
    pub transaction_description: &'a str,
    pub investment_name: &'a str,
    pub symbol: &'a str,
    pub shares: &'a str,
    pub share_price: &'a str,
    pub principal_amount: &'a str,
    pub commission_fees: &'a str,
    pub net_amount: &'a str,
    pub accrued_interest: &'a str,
    pub account_type: &'a str,
}

pub(crate) static HEADERS_RECORD: LazyLock<csv::StringRecord> = LazyLock::new(|| {
    csv::StringRecord::from(vec![
        "trade_date",
        "settlement_date",
        "transaction_type",
        "transaction_description",
        "investment_name",
        "symbol",
        "shares",
        "share_price",
        "principal_amount",
        "commission_fees",
        "net_amount",
        "accrued_interest",
        "account_type",
    ])
});

impl VanguardTransaction<'_> {
    /// Converts the row into an activity.
    ///
    /// Dividends become payments, transaction types from the format's flag table become
    /// trades and every other type is skipped.
    pub fn to_activity(&self, format: &StatementFormat) -> RowOutcome<Activity, RowError> {
        if self.transaction_type == format.dividend_type {
            return self.to_dividend_payment(format).map(Activity::from).into();
        }

        let Some(flags) = format.flags_for(self.transaction_type) else {
            debug!(
                transaction_type = self.transaction_type,
                trade_date = self.trade_date,
                "skipping transaction"
            );
            return RowOutcome::Skipped;
        };

        self.to_trade(format, flags).map(Activity::from).into()
    }

    fn to_dividend_payment(&self, format: &StatementFormat) -> Result<DividendPayment, RowError> {
        let symbol = if self.symbol.is_empty() {
            self.investment_name
        } else {
            self.symbol
        };
        let proceeds = parse_decimal("net amount", self.net_amount)?;

        Ok(DividendPayment::new(
            format.parse_date(self.trade_date)?,
            Stock::new(symbol, format.currency)?.into(),
            Cash::new(format.currency, proceeds),
        )?)
    }

    fn to_trade(&self, format: &StatementFormat, flags: TradeFlags) -> Result<Trade, RowError> {
        let instrument = format.resolve_instrument(self.symbol, self.investment_name)?;

        let fees = parse_decimal("commission/fees", self.commission_fees)?;
        let amount = parse_decimal("principal amount", self.principal_amount)?;
        let shares = parse_decimal("shares", self.shares)?;
        let shares = if self.transaction_description == format.redemption_description {
            -shares
        } else {
            shares
        };

        Ok(Trade::new(
            format.parse_date(self.trade_date)?,
            instrument,
            shares,
            Cash::new(format.currency, amount),
            Cash::new(format.currency, fees),
            flags,
        )?)
    }
}
