use std::{collections::BTreeMap, sync::LazyLock};

use chrono::NaiveDate;
use regex::Regex;

use crate::{
    common::error::{ModelError, RowError},
    domain::{
        activity::TradeFlags,
        cash::Currency,
        instrument::{Bond, Instrument, Stock},
    },
    parsers::section_slicer::SectionCriterion,
};

static BOND_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+\s%\s.+$").expect("bond name pattern is a valid regex"));

/// Columns of a raw row that belong to a section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnWindow {
    /// Drops `leading` columns from the front and `trailing` from the back
    Trim { leading: usize, trailing: usize },
    /// Keeps columns `start..end`
    Range { start: usize, end: usize },
}

impl ColumnWindow {
    /// Slices `row`, clamping to its length so short rows give short (possibly empty) output
    pub fn apply(self, row: &[String]) -> Vec<String> {
        let len = row.len();
        let (start, end) = match self {
            ColumnWindow::Trim { leading, trailing } => {
                (leading.min(len), len.saturating_sub(trailing))
            }
            ColumnWindow::Range { start, end } => (start.min(len), end.min(len)),
        };

        row.get(start..end.max(start)).map(<[String]>::to_vec).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLayout {
    pub start: Vec<String>,
    pub end: Vec<String>,
    pub columns: ColumnWindow,
}

impl SectionLayout {
    fn new(start: &[&str], end: &[&str], columns: ColumnWindow) -> Self {
        Self {
            start: start.iter().map(|s| s.to_string()).collect(),
            end: end.iter().map(|s| s.to_string()).collect(),
            columns,
        }
    }

    pub fn criterion(&self) -> SectionCriterion {
        let columns = self.columns;
        SectionCriterion::new(self.start.clone(), self.end.clone(), move |row: &[String]| {
            columns.apply(row)
        })
    }
}

/// Layout and vocabulary of a statement export.
///
/// Everything institution specific lives here so the parsing code only deals with shapes.
#[derive(Debug, Clone)]
pub struct StatementFormat {
    pub transactions: SectionLayout,
    pub positions: SectionLayout,
    /// Transaction types that become trades; any other type (except dividends) is skipped
    pub trade_flags: BTreeMap<String, TradeFlags>,
    pub dividend_type: String,
    /// Description whose share count has to be negated
    pub redemption_description: String,
    /// Investment names matching this are bonds, the rest are stocks
    pub bond_name_pattern: Regex,
    pub date_format: String,
    pub currency: Currency,
}

impl StatementFormat {
    /// Layout of the Vanguard "Download your account information" CSV.
    ///
    /// The positions header (`Account Number,Investment Name,...`) is a prefix match for the
    /// transactions header too, so each section ends where the other one starts.
    pub fn vanguard() -> Self {
        let trade_flags = [
            ("Buy", TradeFlags::OPEN),
            ("Sell", TradeFlags::CLOSE),
            ("Reinvestment", TradeFlags::OPEN | TradeFlags::DRIP),
            ("Corp Action (Redemption)", TradeFlags::CLOSE),
            ("Transfer (outgoing)", TradeFlags::CLOSE),
        ]
        .into_iter()
        .map(|(kind, flags)| (kind.to_string(), flags))
        .collect();

        Self {
            transactions: SectionLayout::new(
                &["Account Number", "Trade Date"],
                &["Account Number"],
                ColumnWindow::Trim {
                    leading: 1,
                    trailing: 1,
                },
            ),
            positions: SectionLayout::new(
                &["Account Number"],
                &["Account Number", "Trade Date"],
                ColumnWindow::Range { start: 1, end: 6 },
            ),
            trade_flags,
            dividend_type: "Dividend".to_string(),
            redemption_description: "Redemption".to_string(),
            bond_name_pattern: BOND_NAME_PATTERN.clone(),
            date_format: "%m/%d/%Y".to_string(),
            currency: Currency::USD,
        }
    }

    pub fn flags_for(&self, transaction_type: &str) -> Option<TradeFlags> {
        self.trade_flags.get(transaction_type).copied()
    }

    pub fn guess_instrument_for_investment_name(&self, name: &str) -> Result<Instrument, ModelError> {
        if self.bond_name_pattern.is_match(name) {
            // Statements carry the bond's description, not its CUSIP
            Ok(Bond::new(name, self.currency, false)?.into())
        } else {
            Ok(Stock::new(name, self.currency)?.into())
        }
    }

    /// A ticker means a stock; without one the investment name decides
    pub fn resolve_instrument(&self, symbol: &str, investment_name: &str) -> Result<Instrument, ModelError> {
        if symbol.is_empty() {
            self.guess_instrument_for_investment_name(investment_name)
        } else {
            Ok(Stock::new(symbol, self.currency)?.into())
        }
    }

    pub fn parse_date(&self, value: &str) -> Result<NaiveDate, RowError> {
        NaiveDate::parse_from_str(value, &self.date_format).map_err(|source| RowError::Date {
            value: value.to_string(),
            source,
        })
    }
}

impl Default for StatementFormat {
    fn default() -> Self {
        Self::vanguard()
    }
}
