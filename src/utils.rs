use serde::Serialize;

use crate::common::error::StatementError;

/// Writes `records` as CSV to the writer (W), with a header row taken from the first
/// record's field names. Nothing is written when there are no records.
///
/// # Errors
///
/// Failed to write the csv
pub fn write_csv_records<Input, W, S>(records: Input, w: W) -> Result<(), StatementError>
where
    S: Serialize,
    Input: IntoIterator<Item = S>,
    W: std::io::Write,
{
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(w);

    for record in records {
        wtr.serialize(record).map_err(StatementError::Write)?;
    }
    wtr.flush()
        .map_err(|err| StatementError::Write(err.into()))?;

    Ok(())
}
