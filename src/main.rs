use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vanguard_statement::{StatementInput, process_statement};

pub fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let input = StatementInput::parse();
    process_statement(&input, std::io::stdout().lock())
        .with_context(|| format!("failed to convert {}", input.statement.display()))
}
