use std::io::Read;

use tracing::debug;

use crate::common::error::StatementError;

type RowFilter = Box<dyn Fn(&[String]) -> Vec<String>>;

/// Describes how to find one table embedded in a larger CSV file.
///
/// A section starts after the first row whose leading fields equal `start_section_row_match`
/// and runs until a row whose leading fields equal `end_section_row_match`, or to the end of
/// the file when that pattern is empty. Neither boundary row is part of the section.
pub struct SectionCriterion {
    start_section_row_match: Vec<String>,
    end_section_row_match: Vec<String>,
    row_filter: RowFilter,
}

impl SectionCriterion {
    pub fn new<S, E>(
        start_section_row_match: impl IntoIterator<Item = S>,
        end_section_row_match: impl IntoIterator<Item = E>,
        row_filter: impl Fn(&[String]) -> Vec<String> + 'static,
    ) -> Self
    where
        S: Into<String>,
        E: Into<String>,
    {
        Self {
            start_section_row_match: start_section_row_match.into_iter().map(Into::into).collect(),
            end_section_row_match: end_section_row_match.into_iter().map(Into::into).collect(),
            row_filter: Box::new(row_filter),
        }
    }

    /// A criterion that keeps every column of the section's rows
    pub fn unfiltered<S, E>(
        start_section_row_match: impl IntoIterator<Item = S>,
        end_section_row_match: impl IntoIterator<Item = E>,
    ) -> Self
    where
        S: Into<String>,
        E: Into<String>,
    {
        Self::new(start_section_row_match, end_section_row_match, <[String]>::to_vec)
    }

    pub fn start_section_row_match(&self) -> &[String] {
        &self.start_section_row_match
    }

    pub fn end_section_row_match(&self) -> &[String] {
        &self.end_section_row_match
    }

    fn starts_at(&self, row: &[String]) -> bool {
        row_has_prefix(row, &self.start_section_row_match)
    }

    fn ends_at(&self, row: &[String]) -> bool {
        !self.end_section_row_match.is_empty() && row_has_prefix(row, &self.end_section_row_match)
    }
}

impl std::fmt::Debug for SectionCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SectionCriterion")
            .field("start_section_row_match", &self.start_section_row_match)
            .field("end_section_row_match", &self.end_section_row_match)
            .finish_non_exhaustive()
    }
}

/// Rows of one section, already passed through the criterion's row filter, in file order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionResult {
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SectionState {
    NotStarted,
    InSection,
    Ended,
}

fn row_has_prefix(row: &[String], pattern: &[String]) -> bool {
    row.len() >= pattern.len() && row.iter().zip(pattern).all(|(field, expected)| field == expected)
}

/// Whether `raw` leaves a quoted field open. A quote only opens a field at its start, and
/// `""` inside a quoted field is an escaped quote.
fn ends_inside_quotes(raw: &[u8]) -> bool {
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut bytes = raw.iter().peekable();

    while let Some(&byte) = bytes.next() {
        if in_quotes {
            if byte == b'"' && bytes.next_if_eq(&&b'"').is_none() {
                in_quotes = false;
            }
            continue;
        }

        match byte {
            b'"' if at_field_start => {
                in_quotes = true;
                at_field_start = false;
            }
            b',' | b'\n' | b'\r' => at_field_start = true,
            _ => at_field_start = false,
        }
    }

    in_quotes
}

/// Extracts the sections described by `criteria` from a CSV stream in a single pass.
///
/// Returns one [`SectionResult`] per criterion, in the order of `criteria`. A criterion
/// whose start row never shows up yields an empty result. Every criterion tracks its own
/// window, so sections may overlap and one row can open several of them.
///
/// # Errors
///
/// The stream could not be read as CSV (I/O failure or invalid UTF-8), or it ends inside a
/// quoted field
pub fn parse_sections_for_csv<R: Read>(
    mut reader: R,
    criteria: &[SectionCriterion],
) -> Result<Vec<SectionResult>, StatementError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|err| StatementError::Csv(err.into()))?;

    let mut csvr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let mut states = vec![SectionState::NotStarted; criteria.len()];
    let mut results = vec![SectionResult::default(); criteria.len()];
    let mut record = csv::StringRecord::new();
    // Start of the most recent record. Only the last one can run into EOF inside quotes.
    let mut last_start = (0, 1);

    while csvr.read_record(&mut record)? {
        let row: Vec<String> = record.iter().map(str::to_owned).collect();
        let (byte, line) = record
            .position()
            .map(|pos| (pos.byte(), pos.line()))
            .unwrap_or(last_start);
        last_start = (byte, line);

        for ((criterion, state), result) in criteria.iter().zip(&mut states).zip(&mut results) {
            match *state {
                SectionState::NotStarted => {
                    if criterion.starts_at(&row) {
                        debug!(line, start = ?criterion.start_section_row_match, "section started");
                        *state = SectionState::InSection;
                    }
                }
                SectionState::InSection => {
                    if criterion.ends_at(&row) {
                        debug!(line, rows = result.rows.len(), "section ended");
                        *state = SectionState::Ended;
                    } else {
                        result.rows.push((criterion.row_filter)(&row));
                    }
                }
                SectionState::Ended => {}
            }
        }
    }

    let (byte, line) = last_start;
    let tail = usize::try_from(byte)
        .ok()
        .and_then(|byte| bytes.get(byte..))
        .unwrap_or_default();
    if ends_inside_quotes(tail) {
        return Err(StatementError::UnterminatedQuote { line });
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    const EMPTY: [&str; 0] = [];

    #[test]
    fn test_missing_section_is_empty() {
        let csv = "a,b\nc,d\n";
        let sections =
            parse_sections_for_csv(csv.as_bytes(), &[SectionCriterion::unfiltered(["x"], EMPTY)])
                .unwrap();

        assert_eq!(sections, vec![SectionResult::default()]);
    }

    #[test]
    fn test_header_is_consumed_and_rows_run_to_eof() {
        let csv = "preamble\nHeader,One\n1,2\n3,4\n";
        let sections = parse_sections_for_csv(
            csv.as_bytes(),
            &[SectionCriterion::unfiltered(["Header", "One"], EMPTY)],
        )
        .unwrap();

        assert_eq!(sections[0].rows, rows(&[&["1", "2"], &["3", "4"]]));
    }

    #[test]
    fn test_end_row_is_not_emitted() {
        let csv = "Start\n1\n2\nStop,here\n3\n";
        let sections = parse_sections_for_csv(
            csv.as_bytes(),
            &[SectionCriterion::unfiltered(["Start"], ["Stop"])],
        )
        .unwrap();

        assert_eq!(sections[0].rows, rows(&[&["1"], &["2"]]));
    }

    #[test]
    fn test_only_first_window_is_used() {
        let csv = "Start\n1\nStop\nStart\n2\n";
        let sections = parse_sections_for_csv(
            csv.as_bytes(),
            &[SectionCriterion::unfiltered(["Start"], ["Stop"])],
        )
        .unwrap();

        assert_eq!(sections[0].rows, rows(&[&["1"]]));
    }

    #[test]
    fn test_matching_is_exact_prefix() {
        let csv = "account number\nAccount Number \nAccount\nAccount Number,x\n1\n";
        let sections = parse_sections_for_csv(
            csv.as_bytes(),
            &[SectionCriterion::unfiltered(["Account Number"], EMPTY)],
        )
        .unwrap();

        assert_eq!(sections[0].rows, rows(&[&["1"]]));
    }

    #[test]
    fn test_row_filter_is_applied() {
        let csv = "H\n0,1,2,3\n0,1\n";
        let criterion = SectionCriterion::new(["H"], EMPTY, |row: &[String]| {
            row.iter().skip(1).take(2).cloned().collect()
        });
        let sections = parse_sections_for_csv(csv.as_bytes(), &[criterion]).unwrap();

        assert_eq!(sections[0].rows, rows(&[&["1", "2"], &["1"]]));
    }

    #[test]
    fn test_identity_filter_preserves_rows_and_order() {
        let csv = "H\n\"quoted, field\",b\nc,\"multi\nline\"\ne\n";
        let sections =
            parse_sections_for_csv(csv.as_bytes(), &[SectionCriterion::unfiltered(["H"], EMPTY)])
                .unwrap();

        assert_eq!(
            sections[0].rows,
            rows(&[&["quoted, field", "b"], &["c", "multi\nline"], &["e"]])
        );
    }

    #[test]
    fn test_criteria_are_independent_and_results_keep_their_order() {
        let csv = "Account Number,Trade Date\nt1\nAccount Number,Name\np1\n";
        let criteria = [
            SectionCriterion::unfiltered(["Account Number"], EMPTY),
            SectionCriterion::unfiltered(["Account Number", "Trade Date"], ["Account Number"]),
        ];
        let sections = parse_sections_for_csv(csv.as_bytes(), &criteria).unwrap();

        // The shared header row opens both sections
        assert_eq!(
            sections[0].rows,
            rows(&[&["t1"], &["Account Number", "Name"], &["p1"]])
        );
        assert_eq!(sections[1].rows, rows(&[&["t1"]]));
    }

    #[test]
    fn test_later_start_for_second_criterion() {
        let csv = "A\n1\nB\n2\n";
        let criteria = [
            SectionCriterion::unfiltered(["B"], EMPTY),
            SectionCriterion::unfiltered(["A"], EMPTY),
        ];
        let sections = parse_sections_for_csv(csv.as_bytes(), &criteria).unwrap();

        assert_eq!(sections[0].rows, rows(&[&["2"]]));
        assert_eq!(sections[1].rows, rows(&[&["1"], &["B"], &["2"]]));
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let csv: &[u8] = b"H\n\xff\xfe,1\n";
        let res = parse_sections_for_csv(csv, &[SectionCriterion::unfiltered(["H"], EMPTY)]);

        assert!(matches!(res, Err(StatementError::Csv(_))));
    }

    #[test]
    fn test_unterminated_quote_is_an_error() {
        let csv = "H\na,\"b\nc,d\n";
        let res =
            parse_sections_for_csv(csv.as_bytes(), &[SectionCriterion::unfiltered(["H"], EMPTY)]);

        assert!(matches!(res, Err(StatementError::UnterminatedQuote { .. })), "{res:?}");
    }

    #[test]
    fn test_unterminated_quote_outside_any_section_is_an_error() {
        let csv = "H\n1\nStop\n\"never closed,2\n";
        let res =
            parse_sections_for_csv(csv.as_bytes(), &[SectionCriterion::unfiltered(["H"], ["Stop"])]);

        assert!(matches!(res, Err(StatementError::UnterminatedQuote { .. })), "{res:?}");
    }

    #[test]
    fn test_closed_quotes_at_eof_are_accepted() {
        let csv = "H\n\"say \"\"hi\"\"\",x\"y\nc,\"multi\nline\"";
        let sections =
            parse_sections_for_csv(csv.as_bytes(), &[SectionCriterion::unfiltered(["H"], EMPTY)])
                .unwrap();

        assert_eq!(
            sections[0].rows,
            rows(&[&["say \"hi\"", "x\"y"], &["c", "multi\nline"]])
        );
    }

    #[test]
    fn test_quote_scan() {
        assert!(!ends_inside_quotes(b"a,b\n"));
        assert!(!ends_inside_quotes(b"a,\"b,\"\"c\"\"\"\n"));
        assert!(!ends_inside_quotes(b"ab\"c,d"));
        assert!(ends_inside_quotes(b"a,\"b\nc,d\n"));
        assert!(ends_inside_quotes(b"\"a\"\""));
    }
}
