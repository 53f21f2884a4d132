use std::{fmt::Display, iter::FusedIterator};

use tracing::warn;

use crate::ParseMode;

/// What converting one item produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome<T, E> {
    /// The item became a record
    Parsed(T),
    /// The item is valid but intentionally produces no record
    Skipped,
    /// The item could not be converted
    Failed(E),
}

impl<T, E> RowOutcome<T, E> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RowOutcome<U, E> {
        match self {
            RowOutcome::Parsed(record) => RowOutcome::Parsed(f(record)),
            RowOutcome::Skipped => RowOutcome::Skipped,
            RowOutcome::Failed(err) => RowOutcome::Failed(err),
        }
    }

    pub fn map_err<F>(self, f: impl FnOnce(E) -> F) -> RowOutcome<T, F> {
        match self {
            RowOutcome::Parsed(record) => RowOutcome::Parsed(record),
            RowOutcome::Skipped => RowOutcome::Skipped,
            RowOutcome::Failed(err) => RowOutcome::Failed(f(err)),
        }
    }
}

impl<T, E> From<Result<T, E>> for RowOutcome<T, E> {
    fn from(res: Result<T, E>) -> Self {
        match res {
            Ok(record) => RowOutcome::Parsed(record),
            Err(err) => RowOutcome::Failed(err),
        }
    }
}

/// Lazy conversion of items into records, see [`lenient_parse`]
#[derive(Debug)]
pub struct LenientParse<I, F> {
    items: I,
    transform: F,
    mode: ParseMode,
    failed: bool,
}

impl<I, F, T, E> Iterator for LenientParse<I, F>
where
    I: Iterator,
    F: FnMut(I::Item) -> RowOutcome<T, E>,
    E: Display,
{
    type Item = Result<Option<T>, E>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        for item in self.items.by_ref() {
            match (self.transform)(item) {
                RowOutcome::Parsed(record) => return Some(Ok(Some(record))),
                RowOutcome::Skipped => return Some(Ok(None)),
                RowOutcome::Failed(err) => match self.mode {
                    ParseMode::Strict => {
                        self.failed = true;
                        return Some(Err(err));
                    }
                    ParseMode::Lenient => warn!(error = %err, "dropping unparseable row"),
                },
            }
        }

        None
    }
}

impl<I, F, T, E> FusedIterator for LenientParse<I, F>
where
    I: FusedIterator,
    F: FnMut(I::Item) -> RowOutcome<T, E>,
    E: Display,
{
}

/// Applies `transform` to every item, lazily.
///
/// `Skipped` items come out as `Ok(None)` whatever the mode. A `Failed` item ends the
/// sequence with `Err` in strict mode; in lenient mode it is logged and left out, so the
/// output keeps the relative order of the successful items.
pub fn lenient_parse<I, F, T, E>(items: I, transform: F, mode: ParseMode) -> LenientParse<I::IntoIter, F>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> RowOutcome<T, E>,
{
    LenientParse {
        items: items.into_iter(),
        transform,
        mode,
        failed: false,
    }
}

/// Collects the records of a [`lenient_parse`], leaving out skipped items.
///
/// # Errors
///
/// The first failure surfaced by the parse (strict mode only)
pub fn collect_records<T, E>(parse: impl Iterator<Item = Result<Option<T>, E>>) -> Result<Vec<T>, E> {
    parse.filter_map(Result::transpose).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::Fake;

    fn parse_even(n: i64) -> RowOutcome<i64, String> {
        if n < 0 {
            RowOutcome::Skipped
        } else if n % 2 == 0 {
            RowOutcome::Parsed(n)
        } else {
            RowOutcome::Failed(format!("{n} is odd"))
        }
    }

    #[test]
    fn test_strict_without_failures_yields_everything() {
        let res = collect_records(lenient_parse([0, 2, 4], parse_even, ParseMode::Strict));
        assert_eq!(res, Ok(vec![0, 2, 4]));
    }

    #[test]
    fn test_strict_stops_at_first_failure() {
        let mut parse = lenient_parse([0, 1, 2, 3], parse_even, ParseMode::Strict);

        assert_eq!(parse.next(), Some(Ok(Some(0))));
        assert_eq!(parse.next(), Some(Err("1 is odd".to_string())));
        assert_eq!(parse.next(), None);
        assert_eq!(parse.next(), None);
    }

    #[test]
    fn test_strict_collect_surfaces_first_failure() {
        let res = collect_records(lenient_parse([0, 3, 2, 1], parse_even, ParseMode::Strict));
        assert_eq!(res, Err("3 is odd".to_string()));
    }

    #[test]
    fn test_lenient_drops_failures() {
        let res = collect_records(lenient_parse([1, 0, 3, 2, 5], parse_even, ParseMode::Lenient));
        assert_eq!(res, Ok(vec![0, 2]));
    }

    #[test]
    fn test_skipped_passes_through_in_both_modes() {
        for mode in [ParseMode::Strict, ParseMode::Lenient] {
            let out: Vec<_> = lenient_parse([-1, 2, -3], parse_even, mode).collect();
            assert_eq!(out, vec![Ok(None), Ok(Some(2)), Ok(None)]);
        }
    }

    #[test]
    fn test_lenient_drop_law_on_random_input() {
        for _ in 0..50 {
            let len = (0..40).fake::<usize>();
            let items: Vec<i64> = (0..len).map(|_| (0..1000i64).fake()).collect();
            let failures = items.iter().filter(|n| *n % 2 == 1).count();

            let kept = collect_records(lenient_parse(items.clone(), parse_even, ParseMode::Lenient))
                .unwrap();
            assert_eq!(kept.len(), items.len() - failures);
            let expected: Vec<i64> = items.iter().copied().filter(|n| n % 2 == 0).collect();
            assert_eq!(kept, expected);

            let strict = collect_records(lenient_parse(items.clone(), parse_even, ParseMode::Strict));
            match items.iter().find(|n| *n % 2 == 1) {
                Some(first) => assert_eq!(strict, Err(format!("{first} is odd"))),
                None => assert_eq!(strict, Ok(items)),
            }
        }
    }

    #[test]
    fn test_row_outcome_from_result() {
        let ok: RowOutcome<i32, String> = Ok(1).into();
        assert_eq!(ok.map(|n| n + 1), RowOutcome::Parsed(2));

        let err: RowOutcome<i32, &str> = Err("bad").into();
        assert_eq!(err.map_err(str::len), RowOutcome::Failed(3));
    }
}
