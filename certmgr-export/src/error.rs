use certmgr_report::ReportError;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::{fmt, io};

#[derive(Debug)]
#[non_exhaustive]
/// An error that may occur while exporting certmgr certificate metadata.
pub enum ExportError {
    #[non_exhaustive]
    /// The certmgr executable could not be run.
    Invocation { program: String, source: io::Error },
    #[non_exhaustive]
    /// The certmgr executable ran but reported failure.
    CommandFailed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[non_exhaustive]
    /// The certmgr listing report could not be parsed.
    Report { source: ReportError },
    #[non_exhaustive]
    /// A certificate expiration value could not be parsed as a `DD/MM/YYYY` date.
    InvalidExpiration {
        serial: String,
        value: String,
        source: chrono::ParseError,
    },
    #[non_exhaustive]
    /// The account that should own the output file does not exist.
    UnknownOwner { name: String },
    #[non_exhaustive]
    /// The account that should own the output file could not be looked up.
    OwnerLookup { name: String, source: nix::Error },
    #[non_exhaustive]
    /// Creating, setting permissions on, or writing the output file failed.
    Io { path: PathBuf, source: io::Error },
    #[non_exhaustive]
    /// Changing the output file owner failed.
    Chown {
        path: PathBuf,
        owner: String,
        source: nix::Error,
    },
    #[non_exhaustive]
    /// Encoding the certificate records as JSON failed.
    Json { source: serde_json::Error },
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Invocation { program, source } => {
                write!(f, "can't exec certmgr command {program:?}: {source}")
            }
            ExportError::CommandFailed {
                program,
                status,
                stderr,
            } => {
                write!(f, "certmgr command {program:?} failed: {status}")?;
                match stderr.trim() {
                    "" => Ok(()),
                    stderr => write!(f, ": {stderr}"),
                }
            }
            ExportError::Report { source } => {
                write!(f, "can't parse certs: {source}")
            }
            ExportError::InvalidExpiration { serial, value, .. } => {
                write!(
                    f,
                    "can't check cert is expiring: serial {serial:?}: invalid expiration date {value:?}"
                )
            }
            ExportError::UnknownOwner { name } => {
                write!(f, "unknown output file owner: {name:?}")
            }
            ExportError::OwnerLookup { name, source } => {
                write!(f, "looking up output file owner {name:?}: {source}")
            }
            ExportError::Io { path, source } => {
                write!(f, "can't write to file {}: {source}", path.display())
            }
            ExportError::Chown {
                path,
                owner,
                source,
            } => {
                write!(
                    f,
                    "can't change owner of {} to {owner:?}: {source}",
                    path.display()
                )
            }
            ExportError::Json { source } => {
                write!(f, "encoding certs as JSON: {source}")
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExportError::Invocation { source, .. } | ExportError::Io { source, .. } => Some(source),
            ExportError::Report { source } => Some(source),
            ExportError::InvalidExpiration { source, .. } => Some(source),
            ExportError::OwnerLookup { source, .. } | ExportError::Chown { source, .. } => {
                Some(source)
            }
            ExportError::Json { source } => Some(source),
            ExportError::CommandFailed { .. } | ExportError::UnknownOwner { .. } => None,
        }
    }
}

impl From<ReportError> for ExportError {
    fn from(source: ReportError) -> Self {
        ExportError::Report { source }
    }
}

impl From<serde_json::Error> for ExportError {
    fn from(source: serde_json::Error) -> Self {
        ExportError::Json { source }
    }
}
