//! Report export command.

use std::io::Write;
use std::path::Path;

use navdana_admin::services::{ReportTab, UnknownReport, report};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    UnknownTab(#[from] UnknownReport),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Write one report tab as CSV to `out`, or to stdout.
pub fn export(tab: &str, out: Option<&Path>) -> Result<(), ReportError> {
    let tab: ReportTab = tab.parse()?;
    let csv = report(tab).to_csv();

    match out {
        Some(path) => {
            std::fs::write(path, csv)?;
            info!("Wrote {} to {}", tab.label(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(csv.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
