pub mod common;
pub mod domain;
pub mod parsers;
pub mod utils;
pub mod vanguard;

use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::{io::Write, path::PathBuf};

use crate::{
    common::error::StatementError,
    domain::{activity::ActivityCsvRow, position::PositionCsvRow},
    utils::write_csv_records,
    vanguard::{format::StatementFormat, parse_positions_and_activity},
};

/// What to do with a row that cannot be converted into a record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ParseMode {
    /// Fails the whole parse on the first bad row
    #[default]
    Strict,
    /// Logs and drops bad rows
    Lenient,
}

impl ParseMode {
    pub fn lenient(&self) -> bool {
        matches!(self, Self::Lenient)
    }
}

/// The records written to the output
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OutputKind {
    /// Trades and dividend payments, newest first
    #[default]
    Activity,
    /// Holdings with their cost basis
    Positions,
}

serde_plain::derive_display_from_serialize!(ParseMode);
serde_plain::derive_display_from_serialize!(OutputKind);

/// Input for the vanguard-statement program
#[derive(Debug, Parser)]
#[command(version, about = "Converts a Vanguard statement export into normalized CSV")]
pub struct StatementInput {
    /// The path of the exported statement CSV
    pub statement: PathBuf,
    /// How to handle rows that cannot be parsed
    #[arg(long, default_value_t = ParseMode::Strict)]
    pub mode: ParseMode,
    /// Which records to print
    #[arg(long, default_value_t = OutputKind::Activity)]
    pub output: OutputKind,
}

/// Parses the statement and writes the requested records as CSV to `w`
///
/// # Errors
///
/// The statement could not be parsed (see [`parse_positions_and_activity`]) or the output
/// could not be written
pub fn process_statement<W: Write>(input: &StatementInput, w: W) -> Result<(), StatementError> {
    let parsed =
        parse_positions_and_activity(&input.statement, &StatementFormat::vanguard(), input.mode)?;

    match input.output {
        OutputKind::Activity => {
            write_csv_records(parsed.activity.iter().map(ActivityCsvRow::from), w)
        }
        OutputKind::Positions => {
            write_csv_records(parsed.positions.iter().map(PositionCsvRow::from), w)
        }
    }
}
