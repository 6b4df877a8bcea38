//! certmgr-report is a crate offering helpers for processing the textual certificate listing
//! produced by the CryptoPro CSP `certmgr -list` command.
//!
//! The listing is an ad-hoc, locale dependent report: a preamble, a border line of `=`
//! characters, then one numbered entry per certificate made of `Label : value` lines. The types
//! in this crate are thin wrappers around that content, preserving values unprocessed and in
//! String form. Consumers that wish to interpret values (e.g. expiration dates) will likely want
//! to layer their own processing on top, see the companion certmgr-export crate.
//!
//! Both the English and the Russian report locales are understood. See [`LABELS`] for the
//! recognized field labels.
#![warn(clippy::pedantic)]

use std::error::Error;
use std::str::FromStr;
use std::sync::LazyLock;
use std::{fmt, result};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Convenience type for functions that return a `T` on success or a [`ReportError`] otherwise.
pub type Result<T> = result::Result<T, ReportError>;

#[derive(Debug, Clone, Eq, PartialEq)]
#[non_exhaustive]
/// An error that can occur while parsing a certmgr listing report.
pub enum ReportError {
    #[non_exhaustive]
    /// The report has no border line, so there is no certificate listing to select.
    MissingListing,

    #[non_exhaustive]
    /// A line of a certificate entry has no `:` separating its label from its value.
    MalformedLine { line: String },
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::MissingListing => {
                write!(f, "certmgr report has no certificate listing border")
            }
            ReportError::MalformedLine { line } => {
                write!(f, "can't split certificate line {line:?}")
            }
        }
    }
}

impl Error for ReportError {}

/// Border line separating the report preamble from the certificate listing.
static BORDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n={5,}\n").unwrap());

/// Entry number line opening each certificate in the listing, e.g. `2-------`.
static ENTRY_NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\d+-{5,}").unwrap());

/// The certificate fields captured from an entry.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Field {
    Subject,
    Serial,
    Expire,
}

/// Entry labels recognized for each [`Field`], across report locales. Labels are matched
/// exactly after trimming. Support for a new locale is added here.
pub const LABELS: &[(&str, Field)] = &[
    ("Subject", Field::Subject),
    ("Субъект", Field::Subject),
    ("Serial", Field::Serial),
    ("Серийный номер", Field::Serial),
    ("Not valid after", Field::Expire),
    ("Истекает", Field::Expire),
];

impl Field {
    /// Returns the field a report label is captured into, if it is a recognized label.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Field> {
        LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, field)| *field)
    }
}

#[derive(Debug, Default, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
/// Metadata for one certificate entry of a certmgr listing report.
///
/// Fields hold the raw, trimmed report values. A field stays empty when the entry has no
/// line with a matching label.
pub struct CertificateRecord {
    #[serde(rename = "subject")]
    pub subject: String,

    #[serde(rename = "serial")]
    pub serial: String,

    /// Raw expiration value, e.g. `12/04/2024  07:59:18 UTC`. The leading token is a
    /// `DD/MM/YYYY` date.
    #[serde(rename = "expire")]
    pub expire: String,
}

impl CertificateRecord {
    /// Build a record from the text of one certificate entry.
    ///
    /// Each non-blank line is split on its first `:` into a label and a value. Unrecognized
    /// labels are ignored, and when a label repeats the last value wins.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::MalformedLine`] if a non-blank line has no `:` separator.
    pub fn from_chunk(chunk: &str) -> Result<Self> {
        let mut record = CertificateRecord::default();
        for line in chunk.split('\n') {
            if line.trim().is_empty() {
                continue;
            }
            let (label, value) = line
                .split_once(':')
                .ok_or_else(|| ReportError::MalformedLine {
                    line: line.to_owned(),
                })?;
            if let Some(field) = Field::from_label(label.trim()) {
                record.set(field, value.trim());
            }
        }
        Ok(record)
    }

    fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::Subject => &mut self.subject,
            Field::Serial => &mut self.serial,
            Field::Expire => &mut self.expire,
        };
        value.clone_into(slot);
    }
}

impl TryFrom<&str> for CertificateRecord {
    type Error = ReportError;

    fn try_from(chunk: &str) -> result::Result<Self, Self::Error> {
        CertificateRecord::from_chunk(chunk)
    }
}

impl FromStr for CertificateRecord {
    type Err = ReportError;

    fn from_str(chunk: &str) -> result::Result<Self, Self::Err> {
        CertificateRecord::from_chunk(chunk)
    }
}

/// Split a certmgr listing report into the raw text of each certificate entry, in report order.
///
/// The listing following the first border line is divided at each entry number line, text
/// ahead of the first entry is dropped, and surrounding newlines are trimmed from each entry.
/// A listing without entries produces an empty vector.
///
/// # Errors
///
/// Returns [`ReportError::MissingListing`] if the report has no border line.
pub fn split_report(report: &str) -> Result<Vec<&str>> {
    let listing = BORDER
        .split(report)
        .nth(1)
        .ok_or(ReportError::MissingListing)?;

    Ok(ENTRY_NUMBER
        .split(listing)
        .skip(1)
        .map(|chunk| chunk.trim_matches(|c| c == '\n' || c == '\r'))
        .collect())
}

/// Read the provided certmgr listing report, producing a [`CertificateRecord`] for each
/// certificate entry, in report order.
///
/// # Errors
///
/// Returns an error if the report can't be split into entries, or if any entry contains a
/// malformed line. No records are returned in that case.
pub fn read_report(report: &str) -> Result<Vec<CertificateRecord>> {
    split_report(report)?
        .into_iter()
        .map(CertificateRecord::from_chunk)
        .collect()
}
