use tracing::debug;

use crate::domain::{activity::Activity, cash::Cash};

/// Sums the cash put into `symbol` across every trade of it in `activity`.
///
/// Each trade contributes `fees - amount`: a purchase (negative amount) adds what was paid
/// plus commissions, a sale takes its proceeds back out. Dividends do not count. Returns
/// `None` when no trade matches, or when trades of the symbol disagree on currency.
pub fn realized_basis_for_symbol(symbol: &str, activity: &[Activity]) -> Option<Cash> {
    let mut basis: Option<Cash> = None;

    for trade in activity
        .iter()
        .filter_map(Activity::as_trade)
        .filter(|trade| trade.instrument().symbol() == symbol)
    {
        let contribution = trade.fees().checked_add(&-trade.amount().clone()).ok()?;
        basis = Some(match basis {
            Some(basis) => basis.checked_add(&contribution).ok()?,
            None => contribution,
        });
    }

    debug!(symbol, basis = ?basis.as_ref().map(ToString::to_string), "realized basis");
    basis
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        activity::{DividendPayment, Trade, TradeFlags},
        cash::Currency,
        instrument::Stock,
    };
    use chrono::NaiveDate;

    fn usd(s: &str) -> Cash {
        Cash::new(Currency::USD, s.parse().unwrap())
    }

    fn make_trade(symbol: &str, quantity: &str, amount: &str, fees: &str) -> Activity {
        Trade::new(
            NaiveDate::from_ymd_opt(2017, 2, 4).unwrap(),
            Stock::new(symbol, Currency::USD).unwrap().into(),
            quantity.parse().unwrap(),
            usd(amount),
            usd(fees),
            TradeFlags::OPEN,
        )
        .unwrap()
        .into()
    }

    #[test]
    fn test_single_buy_is_amount_paid_plus_fees() {
        let activity = [make_trade("VTI", "10", "-1500.00", "7.50")];
        assert_eq!(
            realized_basis_for_symbol("VTI", &activity),
            Some(usd("1507.50"))
        );
    }

    #[test]
    fn test_sums_only_matching_trades() {
        let activity = [
            make_trade("VWO", "0.123", "-20.15", "0"),
            make_trade("VTI", "12", "-3456.78", "0"),
            make_trade("VWO", "-4", "1234.56", "0"),
            make_trade("VWO", "24", "-840.00", "0"),
        ];
        assert_eq!(
            realized_basis_for_symbol("VWO", &activity),
            Some(usd("-374.41"))
        );
    }

    #[test]
    fn test_no_matching_trade_is_none() {
        let dividend: Activity = DividendPayment::new(
            NaiveDate::from_ymd_opt(2017, 2, 4).unwrap(),
            Stock::new("VMFXX", Currency::USD).unwrap().into(),
            usd("1.23"),
        )
        .unwrap()
        .into();
        let activity = [make_trade("VTI", "12", "-3456.78", "0"), dividend];

        assert_eq!(realized_basis_for_symbol("VMFXX", &activity), None);
        assert_eq!(realized_basis_for_symbol("vti", &activity), None);
    }
}
