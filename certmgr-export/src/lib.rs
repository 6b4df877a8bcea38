//! certmgr-export reads the CryptoPro CSP `certmgr -list` report, optionally keeps only the
//! certificates inside their expiration warning window, and writes the result as a JSON array
//! for a monitoring agent to pick up.
#![warn(clippy::pedantic)]

mod certmgr;
mod config;
mod error;
mod expiring;
mod output;

use std::path::Path;

use certmgr_report::CertificateRecord;
use chrono::NaiveDateTime;

pub use crate::certmgr::Certmgr;
pub use crate::config::Config;
pub use crate::error::ExportError;
pub use crate::expiring::ExpirationWindow;
pub use crate::output::{to_json, Materializer, OwnedFile, OUTPUT_MODE};

// type alias for convenience.
type Result<T> = core::result::Result<T, ExportError>;

/// Run certmgr, select the certificates to export and materialize them as JSON at the
/// configured output path. `now` is the local wall-clock time expiration windows are compared
/// against. Returns the number of exported certificates.
///
/// # Errors
///
/// Returns an error if certmgr fails, if its report can't be parsed, if any expiration date is
/// invalid while filtering, or if the output can't be written. Nothing is written unless every
/// earlier step succeeded.
pub fn export(
    config: &Config,
    materializer: &dyn Materializer,
    now: NaiveDateTime,
) -> Result<usize> {
    tracing::info!("reading certificate list from {}", config.certmgr.display());
    let report = Certmgr::new(&config.certmgr).list()?;
    export_report(&report, config, materializer, now)
}

/// Like [`export`], for a certmgr report that has already been read.
///
/// # Errors
///
/// Returns an error for the same conditions as [`export`], except running certmgr.
pub fn export_report(
    report: &str,
    config: &Config,
    materializer: &dyn Materializer,
    now: NaiveDateTime,
) -> Result<usize> {
    let records = select_records(report, config, now)?;
    write_records(&records, &config.output, materializer)?;
    Ok(records.len())
}

fn select_records(
    report: &str,
    config: &Config,
    now: NaiveDateTime,
) -> Result<Vec<CertificateRecord>> {
    let records = certmgr_report::read_report(report)?;
    tracing::info!("found {} certificates", records.len());

    if !config.expiring {
        return Ok(records);
    }

    let window = ExpirationWindow::new(config.expiring_days);
    let records = window.filter(records, now)?;
    tracing::info!(
        "{} certificates expire within {} days",
        records.len(),
        window.days()
    );
    Ok(records)
}

fn write_records(
    records: &[CertificateRecord],
    path: &Path,
    materializer: &dyn Materializer,
) -> Result<()> {
    let json = to_json(records)?;
    materializer.materialize(path, &json)?;
    tracing::info!("wrote {} certificates to {}", records.len(), path.display());
    Ok(())
}
