//! Durable on-disk cache for the fetched registry.
//!
//! The cache artifact is a directory with exactly two named entries: a
//! headers entry holding the HTTP validators as `key=value` lines, and a
//! data entry holding the raw decompressed registry text. The artifact is
//! replaced wholesale on every successful fetch by staging a new directory
//! next to it and renaming it into place, so a reader never observes a
//! half-written artifact.

use std::{
    fs::{self, File},
    io::{self, Read},
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{
    error::{ErrorContext, OuigenError, Result},
    validators::Validators,
};

/// Name of the artifact directory under the storage root.
pub const ARTIFACT_DIR: &str = "oui-cache";

/// Artifact entry holding the validators as `key=value` lines.
pub const HEADERS_ENTRY: &str = "headers.txt";

/// Artifact entry holding the raw registry payload.
pub const DATA_ENTRY: &str = "oui.txt";

/// Owns the single cache artifact for one remote source.
///
/// The storage root is injected so the store is not tied to any particular
/// directory convention of the surrounding build tooling.
#[derive(Debug, Clone)]
pub struct CacheStore {
    artifact: PathBuf,
}

impl CacheStore {
    /// Creates a store rooted at `root`. The artifact itself lives at
    /// `<root>/oui-cache` and is only created on the first successful write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            artifact: root.into().join(ARTIFACT_DIR),
        }
    }

    /// Canonical path of the cache artifact.
    pub fn artifact_path(&self) -> &Path {
        &self.artifact
    }

    /// Whether a cache artifact currently exists.
    pub fn exists(&self) -> bool {
        self.artifact.exists()
    }

    /// Reads the stored validators.
    ///
    /// Returns an empty set if no artifact exists. If the artifact exists
    /// but its headers entry cannot be read, the artifact is destroyed and
    /// an empty set is returned: the cache self-heals on the next fetch
    /// instead of wedging on a bad artifact.
    pub fn read_validators(&self) -> Validators {
        if !self.artifact.exists() {
            return Validators::new();
        }
        match fs::read_to_string(self.artifact.join(HEADERS_ENTRY)) {
            Ok(text) => Validators::from_lines(&text),
            Err(err) => {
                warn!(
                    "Bad cache artifact '{}': {err}. Destroying cache.",
                    self.artifact.display()
                );
                self.destroy();
                Validators::new()
            }
        }
    }

    /// Writes a new artifact holding `validators` and the bytes of
    /// `payload`, then atomically publishes it.
    ///
    /// The new artifact is staged under a uniquely-named temporary directory
    /// next to the canonical path, so the existing artifact stays intact
    /// until the payload has been received in full. Publication removes the
    /// prior artifact and renames the staged one into place; a failed rename
    /// is a [`OuigenError::PublishFailed`] and leaves nothing half-written
    /// under the canonical name.
    pub fn write<R: Read>(&self, validators: &Validators, mut payload: R) -> Result<PathBuf> {
        let parent = self
            .artifact
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        fs::create_dir_all(&parent).map_err(|err| {
            OuigenError::DirectoryCreation {
                path: parent.clone(),
                source: err,
            }
        })?;

        // The guard removes the staging directory on every failure path;
        // once the rename has happened its cleanup is a no-op.
        let staging = tempfile::Builder::new()
            .prefix("oui-cache.tmp-")
            .tempdir_in(&parent)
            .with_context(|| format!("creating staging directory in {}", parent.display()))?;

        fs::write(staging.path().join(HEADERS_ENTRY), validators.to_lines())
            .with_context(|| format!("writing {HEADERS_ENTRY}"))?;

        let mut data = File::create(staging.path().join(DATA_ENTRY))
            .with_context(|| format!("creating {DATA_ENTRY}"))?;
        io::copy(&mut payload, &mut data).with_context(|| format!("writing {DATA_ENTRY}"))?;
        drop(data);

        if self.artifact.exists() {
            fs::remove_dir_all(&self.artifact)
                .with_context(|| format!("removing old artifact {}", self.artifact.display()))?;
        }
        fs::rename(staging.path(), &self.artifact).map_err(|err| {
            OuigenError::PublishFailed {
                from: staging.path().to_path_buf(),
                to: self.artifact.clone(),
                source: err,
            }
        })?;

        Ok(self.artifact.clone())
    }

    /// Opens the payload entry of the current artifact for reading.
    ///
    /// Returns [`OuigenError::NoDataAvailable`] if no artifact exists at
    /// all. If the artifact exists but its data entry is missing, the
    /// artifact is destroyed and [`OuigenError::CacheCorrupt`] is returned;
    /// unlike [`read_validators`] this is surfaced to the caller, because a
    /// missing payload at conversion time means there is nothing to convert.
    ///
    /// [`read_validators`]: CacheStore::read_validators
    pub fn read_payload(&self) -> Result<File> {
        if !self.artifact.exists() {
            return Err(OuigenError::NoDataAvailable {
                path: self.artifact.clone(),
            });
        }
        match File::open(self.artifact.join(DATA_ENTRY)) {
            Ok(file) => Ok(file),
            Err(err) => {
                self.destroy();
                Err(OuigenError::CacheCorrupt {
                    path: self.artifact.clone(),
                    reason: format!("no data in cache artifact ({err}); destroyed cache"),
                })
            }
        }
    }

    /// Best-effort removal of the artifact, used by the self-healing
    /// corruption branches. Failure to remove is logged, not fatal.
    fn destroy(&self) {
        let result = if self.artifact.is_dir() {
            fs::remove_dir_all(&self.artifact)
        } else {
            fs::remove_file(&self.artifact)
        };
        if let Err(err) = result {
            warn!(
                "Unable to destroy cache artifact '{}': {err}",
                self.artifact.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    use tempfile::tempdir;

    fn sample_validators() -> Validators {
        let mut v = Validators::new();
        v.insert("etag", "\"abc123\"");
        v.insert("last-modified", "Tue, 01 Jan 2030 00:00:00 GMT");
        v
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());
        let payload = b"00-50-C2   (hex)\t\tIEEE REGISTRATION AUTHORITY\n";

        let artifact = store.write(&sample_validators(), payload.as_slice()).unwrap();
        assert_eq!(artifact, store.artifact_path());

        assert_eq!(store.read_validators(), sample_validators());

        let mut bytes = Vec::new();
        store.read_payload().unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, payload);
    }

    #[test]
    fn test_read_validators_absent_artifact() {
        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());

        assert!(store.read_validators().is_empty());
        // Reading must not create anything on disk.
        assert!(!store.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_read_validators_missing_headers_destroys_artifact() {
        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());
        store
            .write(&sample_validators(), b"payload".as_slice())
            .unwrap();

        fs::remove_file(store.artifact_path().join(HEADERS_ENTRY)).unwrap();

        assert!(store.read_validators().is_empty());
        assert!(!store.exists());

        // A subsequent write proceeds as a fresh cache population.
        store
            .write(&sample_validators(), b"fresh".as_slice())
            .unwrap();
        assert_eq!(store.read_validators(), sample_validators());
    }

    #[test]
    fn test_read_payload_absent_artifact_is_no_data() {
        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());

        let err = store.read_payload().unwrap_err();
        assert!(matches!(err, OuigenError::NoDataAvailable { .. }));
    }

    #[test]
    fn test_read_payload_missing_data_entry_is_corrupt() {
        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());
        store
            .write(&sample_validators(), b"payload".as_slice())
            .unwrap();

        fs::remove_file(store.artifact_path().join(DATA_ENTRY)).unwrap();

        let err = store.read_payload().unwrap_err();
        assert!(matches!(err, OuigenError::CacheCorrupt { .. }));
        assert!(!store.exists());
    }

    #[test]
    fn test_write_replaces_prior_artifact_wholesale() {
        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());

        store
            .write(&sample_validators(), b"first".as_slice())
            .unwrap();

        let mut fresh = Validators::new();
        fresh.insert("etag", "\"def456\"");
        store.write(&fresh, b"second".as_slice()).unwrap();

        assert_eq!(store.read_validators(), fresh);
        let mut bytes = Vec::new();
        store.read_payload().unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"second");
    }

    #[test]
    fn test_write_leaves_no_staging_directory_behind() {
        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());
        store
            .write(&sample_validators(), b"payload".as_slice())
            .unwrap();

        let entries: Vec<_> = fs::read_dir(root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from(ARTIFACT_DIR)]);
    }

    #[test]
    fn test_failed_payload_read_cleans_up_staging() {
        struct FailingReader;
        impl Read for FailingReader {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("connection reset"))
            }
        }

        let root = tempdir().unwrap();
        let store = CacheStore::new(root.path());
        store
            .write(&sample_validators(), b"intact".as_slice())
            .unwrap();

        let err = store.write(&sample_validators(), FailingReader).unwrap_err();
        assert!(matches!(err, OuigenError::IoError { .. }));

        // The prior artifact is untouched and no staging dir remains.
        let mut bytes = Vec::new();
        store.read_payload().unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"intact");
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 1);
    }
}
