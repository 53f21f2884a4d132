use std::{
    ops::{BitOr, BitOrAssign},
    str::FromStr,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{EnumDiscriminants, IntoDiscriminant};

use crate::{
    common::{amount::Amount, error::ModelError},
    domain::{
        cash::{Cash, Currency},
        instrument::{Instrument, InstrumentKind},
    },
};

/// Describes what a trade did to a position. Flags combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TradeFlags(u8);

impl TradeFlags {
    pub const OPEN: Self = Self(1 << 0);
    pub const CLOSE: Self = Self(1 << 1);
    pub const EXPIRED: Self = Self(1 << 2);
    pub const ASSIGNED_OR_EXERCISED: Self = Self(1 << 3);
    pub const DRIP: Self = Self(1 << 4);
    pub const LIQUIDATED: Self = Self(1 << 5);

    const NAMES: [(Self, &'static str); 6] = [
        (Self::OPEN, "OPEN"),
        (Self::CLOSE, "CLOSE"),
        (Self::EXPIRED, "EXPIRED"),
        (Self::ASSIGNED_OR_EXERCISED, "ASSIGNED_OR_EXERCISED"),
        (Self::DRIP, "DRIP"),
        (Self::LIQUIDATED, "LIQUIDATED"),
    ];

    pub fn empty() -> Self {
        Self(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for TradeFlags {
    type Output = TradeFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TradeFlags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Display for TradeFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// Parses `OPEN|DRIP` style text
impl FromStr for TradeFlags {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut flags = Self::empty();
        for name in s.split('|').map(str::trim) {
            let (flag, _) = Self::NAMES
                .iter()
                .find(|(_, known)| *known == name)
                .ok_or_else(|| ModelError::UnknownTradeFlag(name.to_string()))?;
            flags |= *flag;
        }

        Ok(flags)
    }
}

impl Serialize for TradeFlags {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A purchase or sale of an instrument
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trade {
    date: NaiveDate,
    instrument: Instrument,
    quantity: Amount,
    amount: Cash,
    fees: Cash,
    flags: TradeFlags,
}

impl Trade {
    /// `amount` is the cash that moved because of the trade (negative when buying) and
    /// `fees` the commissions paid on top of it.
    pub fn new(
        date: NaiveDate,
        instrument: Instrument,
        quantity: Amount,
        amount: Cash,
        fees: Cash,
        flags: TradeFlags,
    ) -> Result<Self, ModelError> {
        if quantity.is_zero() {
            return Err(ModelError::ZeroQuantity);
        }
        if flags.is_empty() {
            return Err(ModelError::EmptyFlags);
        }
        amount.ensure_currency(instrument.currency())?;
        fees.ensure_currency(instrument.currency())?;

        Ok(Self {
            date,
            instrument,
            quantity,
            amount,
            fees,
            flags,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn quantity(&self) -> &Amount {
        &self.quantity
    }

    pub fn amount(&self) -> &Cash {
        &self.amount
    }

    pub fn fees(&self) -> &Cash {
        &self.fees
    }

    pub fn flags(&self) -> TradeFlags {
        self.flags
    }
}

/// Cash paid out by an instrument, e.g. a fund's dividend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DividendPayment {
    date: NaiveDate,
    instrument: Instrument,
    proceeds: Cash,
}

impl DividendPayment {
    pub fn new(date: NaiveDate, instrument: Instrument, proceeds: Cash) -> Result<Self, ModelError> {
        proceeds.ensure_currency(instrument.currency())?;

        Ok(Self {
            date,
            instrument,
            proceeds,
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    pub fn proceeds(&self) -> &Cash {
        &self.proceeds
    }
}

/// Something that happened in an account
#[derive(Debug, Clone, PartialEq, Eq, EnumDiscriminants)]
#[strum_discriminants(
    name(ActivityKind),
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Activity {
    Trade(Trade),
    DividendPayment(DividendPayment),
}

serde_plain::derive_display_from_serialize!(ActivityKind);

impl Activity {
    pub fn date(&self) -> NaiveDate {
        match self {
            Activity::Trade(trade) => trade.date(),
            Activity::DividendPayment(payment) => payment.date(),
        }
    }

    pub fn instrument(&self) -> &Instrument {
        match self {
            Activity::Trade(trade) => trade.instrument(),
            Activity::DividendPayment(payment) => payment.instrument(),
        }
    }

    pub fn as_trade(&self) -> Option<&Trade> {
        match self {
            Activity::Trade(trade) => Some(trade),
            Activity::DividendPayment(_) => None,
        }
    }
}

impl From<Trade> for Activity {
    fn from(trade: Trade) -> Self {
        Activity::Trade(trade)
    }
}

impl From<DividendPayment> for Activity {
    fn from(payment: DividendPayment) -> Self {
        Activity::DividendPayment(payment)
    }
}

/// Flat view of an [`Activity`] for CSV output
#[derive(Debug, Serialize)]
pub struct ActivityCsvRow<'a> {
    date: NaiveDate,
    kind: ActivityKind,
    instrument: InstrumentKind,
    symbol: &'a str,
    quantity: Option<&'a Amount>,
    amount: &'a Amount,
    fees: Option<&'a Amount>,
    currency: Currency,
    flags: Option<TradeFlags>,
}

impl<'a> From<&'a Activity> for ActivityCsvRow<'a> {
    fn from(activity: &'a Activity) -> Self {
        let instrument = activity.instrument();
        let (quantity, amount, fees, flags) = match activity {
            Activity::Trade(trade) => (
                Some(trade.quantity()),
                trade.amount(),
                Some(&trade.fees().quantity),
                Some(trade.flags()),
            ),
            Activity::DividendPayment(payment) => (None, payment.proceeds(), None, None),
        };

        Self {
            date: activity.date(),
            kind: activity.discriminant(),
            instrument: instrument.discriminant(),
            symbol: instrument.symbol(),
            quantity,
            amount: &amount.quantity,
            fees,
            currency: amount.currency,
            flags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::instrument::Stock;

    fn make_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2016, 4, 20).unwrap()
    }

    fn make_stock(symbol: &str) -> Instrument {
        Stock::new(symbol, Currency::USD).unwrap().into()
    }

    fn usd(s: &str) -> Cash {
        Cash::new(Currency::USD, s.parse().unwrap())
    }

    #[test]
    fn test_flags_compose() {
        let flags = TradeFlags::OPEN | TradeFlags::DRIP;
        assert!(flags.contains(TradeFlags::OPEN));
        assert!(flags.contains(TradeFlags::DRIP));
        assert!(!flags.contains(TradeFlags::CLOSE));
        assert_eq!(flags.to_string(), "OPEN|DRIP");
        assert_eq!(TradeFlags::empty().to_string(), "");
    }

    #[test]
    fn test_flags_from_str() {
        assert_eq!(
            "OPEN | DRIP".parse::<TradeFlags>().unwrap(),
            TradeFlags::OPEN | TradeFlags::DRIP
        );
        assert_eq!("CLOSE".parse::<TradeFlags>().unwrap(), TradeFlags::CLOSE);
        assert_eq!(
            "OPEN|SHORT".parse::<TradeFlags>(),
            Err(ModelError::UnknownTradeFlag("SHORT".to_string()))
        );
    }

    #[test]
    fn test_trade_rejects_zero_quantity() {
        let res = Trade::new(
            make_date(),
            make_stock("VTI"),
            Amount::zero(),
            usd("-10"),
            usd("0"),
            TradeFlags::OPEN,
        );
        assert_eq!(res, Err(ModelError::ZeroQuantity));
    }

    #[test]
    fn test_trade_rejects_empty_flags() {
        let res = Trade::new(
            make_date(),
            make_stock("VTI"),
            Amount::from(1),
            usd("-10"),
            usd("0"),
            TradeFlags::empty(),
        );
        assert_eq!(res, Err(ModelError::EmptyFlags));
    }

    #[test]
    fn test_activity_csv_row() {
        let trade: Activity = Trade::new(
            make_date(),
            make_stock("VTI"),
            "12".parse().unwrap(),
            usd("-3456.78"),
            usd("0.00"),
            TradeFlags::OPEN,
        )
        .unwrap()
        .into();
        let dividend: Activity =
            DividendPayment::new(make_date(), make_stock("VWO"), usd("29.35"))
                .unwrap()
                .into();

        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);
        wtr.serialize(ActivityCsvRow::from(&trade)).unwrap();
        wtr.serialize(ActivityCsvRow::from(&dividend)).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();

        assert_eq!(
            out,
            "date,kind,instrument,symbol,quantity,amount,fees,currency,flags\n\
             2016-04-20,trade,stock,VTI,12,-3456.78,0,USD,OPEN\n\
             2016-04-20,dividend-payment,stock,VWO,,29.35,,USD,\n"
        );
    }
}
