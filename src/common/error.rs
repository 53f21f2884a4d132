use std::path::PathBuf;

use thiserror::Error;

use crate::domain::cash::Currency;

/// Section of a statement a row came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SectionKind {
    Transactions,
    Positions,
}

/// Failure of a whole statement parse.
///
/// `Io`, `Csv` and `UnterminatedQuote` are stream-level failures and always propagate. `Row`
/// only reaches the caller in strict mode; lenient parsing drops the row instead.
#[derive(Debug, Error)]
pub enum StatementError {
    #[error("cannot read statement {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed CSV: quoted field starting on line {line} is never closed")]
    UnterminatedQuote { line: u64 },
    #[error("{section} row {row}: {source}")]
    Row {
        section: SectionKind,
        /// 1-based index of the row inside its section
        row: usize,
        #[source]
        source: RowError,
    },
    #[error("cannot write CSV output: {0}")]
    Write(#[source] csv::Error),
}

/// A single row could not be converted into a record.
#[derive(Debug, Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    Arity { expected: usize, found: usize },
    #[error("cannot read row: {0}")]
    Record(#[source] csv::Error),
    #[error("invalid date {value:?}: {source}")]
    Date {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("invalid {field} {value:?}: {source}")]
    Decimal {
        field: &'static str,
        value: String,
        #[source]
        source: ParseAmountError,
    },
    #[error("no realized basis for {symbol:?}")]
    MissingBasis { symbol: String },
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Rejected by one of the domain constructors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("instrument symbol must not be empty")]
    EmptySymbol,
    #[error("invalid CUSIP {0:?}")]
    InvalidCusip(String),
    #[error("trade quantity must not be zero")]
    ZeroQuantity,
    #[error("trade flags must not be empty")]
    EmptyFlags,
    #[error("unknown trade flag {0:?}")]
    UnknownTradeFlag(String),
    #[error("currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseAmountError {
    #[error("not a decimal number")]
    Malformed,
    #[error("more than {max} fraction digits")]
    TooPrecise { max: usize },
}
