use std::{cell::OnceCell, collections::BTreeMap, path::PathBuf};

use strum::{Display, EnumIter, EnumString};
use tracing::debug;

use crate::{
    ParseMode,
    common::error::StatementError,
    domain::{account::AccountBalance, activity::Activity, position::Position},
    vanguard::{PositionsAndActivity, format::StatementFormat, parse_positions_and_activity},
};

/// Configuration keys understood by [`VanguardAccount`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter)]
pub enum Setting {
    Statement,
}

impl Setting {
    pub const SECTION_NAME: &'static str = "Vanguard";

    pub fn help(self) -> &'static str {
        match self {
            Setting::Statement => {
                "A local path to an exported statement CSV of Vanguard positions and trades."
            }
        }
    }
}

pub type Settings = BTreeMap<Setting, String>;

/// Positions and activity of a Vanguard account, read from an exported statement.
///
/// The statement is parsed on first use and the result kept for later calls.
#[derive(Debug)]
pub struct VanguardAccount {
    statement: Option<PathBuf>,
    mode: ParseMode,
    format: StatementFormat,
    parsed: OnceCell<PositionsAndActivity>,
}

impl VanguardAccount {
    pub fn new(statement: Option<PathBuf>, mode: ParseMode) -> Self {
        Self {
            statement,
            mode,
            format: StatementFormat::vanguard(),
            parsed: OnceCell::new(),
        }
    }

    pub fn from_settings(settings: &Settings, mode: ParseMode) -> Self {
        let statement = settings
            .get(&Setting::Statement)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Self::new(statement, mode)
    }

    pub fn statement(&self) -> Option<&PathBuf> {
        self.statement.as_ref()
    }

    /// `None` when no statement is configured.
    ///
    /// # Errors
    ///
    /// See [`parse_positions_and_activity`]. A failed parse is not cached.
    pub fn positions_and_activity(&self) -> Result<Option<&PositionsAndActivity>, StatementError> {
        let Some(statement) = &self.statement else {
            return Ok(None);
        };

        if let Some(parsed) = self.parsed.get() {
            return Ok(Some(parsed));
        }

        debug!(statement = %statement.display(), mode = %self.mode, "parsing statement");
        let parsed = parse_positions_and_activity(statement, &self.format, self.mode)?;
        Ok(Some(self.parsed.get_or_init(|| parsed)))
    }

    pub fn positions(&self) -> Result<&[Position], StatementError> {
        Ok(self
            .positions_and_activity()?
            .map(|parsed| parsed.positions.as_slice())
            .unwrap_or_default())
    }

    pub fn activity(&self) -> Result<&[Activity], StatementError> {
        Ok(self
            .positions_and_activity()?
            .map(|parsed| parsed.activity.as_slice())
            .unwrap_or_default())
    }

    /// Always empty: Vanguard sweeps cash into money market funds, which are listed as
    /// positions.
    pub fn balance(&self) -> AccountBalance {
        AccountBalance::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_setting_names() {
        assert_eq!(Setting::Statement.to_string(), "Statement");
        assert_eq!("Statement".parse::<Setting>().unwrap(), Setting::Statement);
        assert_eq!(Setting::SECTION_NAME, "Vanguard");
        assert!(Setting::iter().all(|setting| !setting.help().is_empty()));
    }

    #[test]
    fn test_without_statement_everything_is_empty() {
        let account = VanguardAccount::from_settings(&Settings::new(), ParseMode::Strict);

        assert!(account.statement().is_none());
        assert!(account.positions_and_activity().unwrap().is_none());
        assert!(account.positions().unwrap().is_empty());
        assert!(account.activity().unwrap().is_empty());
        assert!(account.balance().cash.is_empty());
    }

    #[test]
    fn test_empty_statement_setting_is_ignored() {
        let settings = Settings::from([(Setting::Statement, String::new())]);
        let account = VanguardAccount::from_settings(&settings, ParseMode::Lenient);

        assert!(account.statement().is_none());
    }

    #[test]
    fn test_missing_file_is_reported_on_use() {
        let settings = Settings::from([(Setting::Statement, "does/not/exist.csv".to_string())]);
        let account = VanguardAccount::from_settings(&settings, ParseMode::Lenient);

        assert_eq!(account.statement(), Some(&PathBuf::from("does/not/exist.csv")));
        assert!(matches!(account.positions(), Err(StatementError::Io { .. })));
        assert!(account.balance().cash.is_empty());
    }
}
