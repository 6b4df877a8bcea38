use std::fs::{File, Permissions};
use std::io::{self, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use certmgr_report::CertificateRecord;
use nix::unistd::{fchown, User};

use super::Result;
use crate::error::ExportError;

/// Permission bits of the exported file: read/write for owner and group only.
pub const OUTPUT_MODE: u32 = 0o660;

/// `Materializer` writes export content to its final location, applying whatever ownership and
/// permissions the deployment requires.
pub trait Materializer {
    /// Create (or truncate) the file at `path` and fill it with `contents`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be created, prepared, or written.
    fn materialize(&self, path: &Path, contents: &[u8]) -> Result<()>;
}

/// `OwnedFile` materializes the export as a file with [`OUTPUT_MODE`] permissions, owned by a
/// named local account and that account's primary group.
#[derive(Debug, Clone)]
pub struct OwnedFile {
    owner: String,
}

impl OwnedFile {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
        }
    }

    fn lookup_owner(&self) -> Result<User> {
        User::from_name(&self.owner)
            .map_err(|e| ExportError::OwnerLookup {
                name: self.owner.clone(),
                source: e,
            })?
            .ok_or_else(|| ExportError::UnknownOwner {
                name: self.owner.clone(),
            })
    }
}

impl Materializer for OwnedFile {
    /// The file is created before the owner is resolved, so a failed lookup or chown leaves
    /// an empty file behind.
    fn materialize(&self, path: &Path, contents: &[u8]) -> Result<()> {
        let io_err = |source: io::Error| ExportError::Io {
            path: path.to_owned(),
            source,
        };

        // Permissions and owner are applied through the open handle, never by path again.
        let mut file = File::create(path).map_err(io_err)?;
        file.set_permissions(Permissions::from_mode(OUTPUT_MODE)).map_err(io_err)?;

        let user = self.lookup_owner()?;
        fchown(file.as_raw_fd(), Some(user.uid), Some(user.gid)).map_err(|e| {
            ExportError::Chown {
                path: path.to_owned(),
                owner: self.owner.clone(),
                source: e,
            }
        })?;

        file.write_all(contents).map_err(io_err)?;
        file.flush().map_err(io_err)
    }
}

/// Encode the records as a compact JSON array of `{"subject", "serial", "expire"}` objects.
///
/// # Errors
///
/// Returns an error if JSON encoding fails.
pub fn to_json(records: &[CertificateRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(records)?)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::os::unix::fs::MetadataExt;

    use nix::unistd::getuid;

    use super::*;

    fn current_user() -> User {
        User::from_uid(getuid()).unwrap().expect("current user has no passwd entry")
    }

    fn records() -> Vec<CertificateRecord> {
        vec![
            CertificateRecord {
                subject: "CN=Иван Петров".to_string(),
                serial: "0x01".to_string(),
                expire: "12/04/2024  07:59:18 UTC".to_string(),
            },
            CertificateRecord {
                subject: "CN=gateway".to_string(),
                serial: "0x02".to_string(),
                expire: String::default(),
            },
        ]
    }

    #[test]
    fn test_to_json_round_trip() {
        let records = records();

        let json = to_json(&records).unwrap();
        let decoded: Vec<CertificateRecord> = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn test_to_json_empty() {
        assert_eq!(to_json(&[]).unwrap(), b"[]");
    }

    #[test]
    fn test_owned_file() {
        let user = current_user();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certs-info.json");
        fs::write(&path, "previous content that is longer than the export").unwrap();

        OwnedFile::new(user.name.clone())
            .materialize(&path, b"[]")
            .unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"[]");
        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, OUTPUT_MODE);
        assert_eq!(metadata.uid(), user.uid.as_raw());
        assert_eq!(metadata.gid(), user.gid.as_raw());
    }

    #[test]
    fn test_owned_file_resets_existing_mode() {
        let user = current_user();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certs-info.json");
        fs::write(&path, "old").unwrap();
        fs::set_permissions(&path, Permissions::from_mode(0o604)).unwrap();

        OwnedFile::new(user.name.clone())
            .materialize(&path, b"[]")
            .unwrap();

        let metadata = File::open(&path).unwrap().metadata().unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, OUTPUT_MODE);
        assert_eq!(metadata.uid(), user.uid.as_raw());
        assert_eq!(metadata.len(), 2);
    }

    #[test]
    fn test_owned_file_unknown_owner() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("certs-info.json");

        let err = OwnedFile::new("no-such-certmgr-export-user")
            .materialize(&path, b"[]")
            .unwrap_err();

        assert!(matches!(err, ExportError::UnknownOwner { ref name } if name == "no-such-certmgr-export-user"));
        // The file was already created when the lookup failed.
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_owned_file_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("certs-info.json");

        let err = OwnedFile::new(current_user().name)
            .materialize(&path, b"[]")
            .unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }
}
