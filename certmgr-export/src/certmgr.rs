use std::path::PathBuf;
use std::process::Command;

use super::Result;
use crate::error::ExportError;

/// Argument asking certmgr to print its certificate listing report.
const LIST_ARG: &str = "-list";

/// Certmgr runs the CryptoPro CSP `certmgr` executable to read its certificate listing.
#[derive(Debug, Clone)]
pub struct Certmgr {
    path: PathBuf,
}

impl Certmgr {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Run `certmgr -list`, blocking until it exits, and return its standard output.
    ///
    /// The report encoding follows the system locale, so output that is not valid UTF-8 is
    /// decoded lossily rather than rejected.
    ///
    /// # Errors
    ///
    /// Returns an error if the executable can't be started or exits unsuccessfully.
    pub fn list(&self) -> Result<String> {
        let program = self.path.display().to_string();
        tracing::debug!("running {program} {LIST_ARG}");

        let output = Command::new(&self.path)
            .arg(LIST_ARG)
            .output()
            .map_err(|e| ExportError::Invocation {
                program: program.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(ExportError::CommandFailed {
                program,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_captures_stdout() {
        let report = Certmgr::new("/bin/echo").list().unwrap();

        assert_eq!(report, "-list\n");
    }

    #[test]
    fn test_list_command_failed() {
        let err = Certmgr::new("/bin/false").list().unwrap_err();

        match err {
            ExportError::CommandFailed { program, status, .. } => {
                assert_eq!(program, "/bin/false");
                assert!(!status.success());
            }
            err => panic!("unexpected error: {err:?}"),
        }
    }

    #[test]
    fn test_list_command_failed_reports_stderr() {
        // cat rejects the unknown -l option.
        let err = Certmgr::new("/bin/cat").list().unwrap_err();

        assert!(matches!(
            err,
            ExportError::CommandFailed { ref stderr, .. } if !stderr.trim().is_empty()
        ));
    }

    #[test]
    fn test_list_missing_executable() {
        let dir = tempfile::tempdir().unwrap();

        let err = Certmgr::new(dir.path().join("certmgr")).list().unwrap_err();
        assert!(matches!(err, ExportError::Invocation { .. }));
        assert!(err.to_string().starts_with("can't exec certmgr command"));
    }
}
