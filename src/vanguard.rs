pub mod account;
pub mod format;
pub mod position;
pub mod transaction;

use std::{fs::File, io::Read, path::Path};

use serde::Deserialize;
use tracing::info;

use crate::{
    ParseMode,
    common::{
        amount::Amount,
        error::{RowError, SectionKind, StatementError},
    },
    domain::{activity::Activity, position::Position},
    parsers::{
        lenient::{RowOutcome, collect_records, lenient_parse},
        nom::amount::parse_amount_field,
        section_slicer::parse_sections_for_csv,
    },
    vanguard::{format::StatementFormat, position::VanguardPosition, transaction::VanguardTransaction},
};

/// Everything a statement describes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionsAndActivity {
    pub positions: Vec<Position>,
    /// Newest first, in statement order
    pub activity: Vec<Activity>,
}

pub(crate) fn parse_decimal(field: &'static str, value: &str) -> Result<Amount, RowError> {
    parse_amount_field(value).map_err(|source| RowError::Decimal {
        field,
        value: value.to_string(),
        source,
    })
}

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|field| field.trim().is_empty())
}

/// Deserializes a section row by position into `T`, whose fields are named by `headers`
fn deserialize_row<'de, T: Deserialize<'de>>(
    record: &'de csv::StringRecord,
    headers: &'de csv::StringRecord,
) -> Result<T, RowError> {
    if record.len() != headers.len() {
        return Err(RowError::Arity {
            expected: headers.len(),
            found: record.len(),
        });
    }

    record.deserialize(Some(headers)).map_err(RowError::Record)
}

/// Slices one section out of `reader` and converts its rows with `convert`. Blank rows are
/// skipped before conversion.
fn parse_section<R: Read, T>(
    reader: R,
    format: &StatementFormat,
    section: SectionKind,
    mode: ParseMode,
    mut convert: impl FnMut(&csv::StringRecord) -> RowOutcome<T, RowError>,
) -> Result<Vec<T>, StatementError> {
    let layout = match section {
        SectionKind::Transactions => &format.transactions,
        SectionKind::Positions => &format.positions,
    };
    let rows: Vec<csv::StringRecord> = parse_sections_for_csv(reader, &[layout.criterion()])?
        .into_iter()
        .flat_map(|result| result.rows)
        .map(|row| row.iter().collect())
        .collect();

    let parse = lenient_parse(
        rows.iter().enumerate(),
        |(index, record)| {
            if is_blank(record) {
                return RowOutcome::Skipped;
            }
            convert(record).map_err(|source| StatementError::Row {
                section,
                row: index + 1,
                source,
            })
        },
        mode,
    );
    let records = collect_records(parse)?;

    info!(%section, rows = rows.len(), records = records.len(), %mode, "parsed section");
    Ok(records)
}

/// Parses the transactions section of a statement.
///
/// # Errors
///
/// Unreadable CSV, or in strict mode the first row that could not be converted
pub fn parse_transactions<R: Read>(
    reader: R,
    format: &StatementFormat,
    mode: ParseMode,
) -> Result<Vec<Activity>, StatementError> {
    parse_section(reader, format, SectionKind::Transactions, mode, |record| {
        match deserialize_row::<VanguardTransaction<'_>>(record, &transaction::HEADERS_RECORD) {
            Ok(transaction) => transaction.to_activity(format),
            Err(err) => RowOutcome::Failed(err),
        }
    })
}

/// Parses the positions section of a statement. Cost bases are derived from `activity`,
/// which must already hold the statement's transactions.
///
/// # Errors
///
/// Unreadable CSV, or in strict mode the first row that could not be converted
pub fn parse_positions<R: Read>(
    reader: R,
    format: &StatementFormat,
    activity: &[Activity],
    mode: ParseMode,
) -> Result<Vec<Position>, StatementError> {
    parse_section(reader, format, SectionKind::Positions, mode, |record| {
        deserialize_row::<VanguardPosition<'_>>(record, &position::HEADERS_RECORD)
            .and_then(|position| position.to_position(format, activity))
            .into()
    })
}

/// Parses a whole statement file.
///
/// This is two passes over the file: transactions come first because the positions take
/// their cost basis from them.
///
/// # Errors
///
/// The file cannot be opened, its CSV is unreadable, or in strict mode a row could not be
/// converted
pub fn parse_positions_and_activity(
    path: &Path,
    format: &StatementFormat,
    mode: ParseMode,
) -> Result<PositionsAndActivity, StatementError> {
    let open = || {
        File::open(path).map_err(|source| StatementError::Io {
            path: path.to_path_buf(),
            source,
        })
    };

    let activity = parse_transactions(open()?, format, mode)?;
    let positions = parse_positions(open()?, format, &activity, mode)?;

    Ok(PositionsAndActivity {
        positions,
        activity,
    })
}
