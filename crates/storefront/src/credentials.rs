//! Persistent credential storage.
//!
//! The store is the single source of truth for "is there a credential right
//! now". The API client reads it on every request and never caches the
//! token, because a 401 on one request may purge it while another flow is
//! already under way.
//!
//! Token and user summary are written and cleared together: [`FileCredentialStore`]
//! keeps both in one JSON document replaced via rename, and
//! [`MemoryCredentialStore`] keeps both behind one lock.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::models::{Credential, PersistedCredential};

/// Errors raised by a credential store.
#[derive(Debug, Error)]
pub enum CredentialStoreError {
    /// Reading or writing the backing file failed.
    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The backing file exists but is not a valid credential document.
    #[error("credential file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable storage for the session credential.
///
/// Implementations must make `save` and `clear` atomic with respect to
/// `load`: a reader sees either the whole pair or nothing.
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError>;

    /// Replace the stored credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError>;

    /// Remove the stored credential. Clearing an empty store is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), CredentialStoreError>;

    /// Whether a credential is currently stored.
    ///
    /// A store that cannot be read counts as empty.
    fn has_credential(&self) -> bool {
        matches!(self.load(), Ok(Some(_)))
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Credential store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding a credential.
    #[must_use]
    pub fn with_credential(credential: Credential) -> Self {
        Self {
            slot: Mutex::new(Some(credential)),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Credential>> {
        // The slot holds plain data; a panic elsewhere cannot leave it half-written.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        Ok(self.slot().clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        *self.slot() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        *self.slot() = None;
        Ok(())
    }
}

// =============================================================================
// File store
// =============================================================================

/// Credential store backed by a JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target, so a crash mid-write leaves either the old pair or the new one.
#[derive(Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    /// Create a store for the given file path. The file need not exist yet.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn io_error(&self, source: io::Error) -> CredentialStoreError {
        CredentialStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<(), CredentialStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(|e| self.io_error(e))?;
        file.write_all(bytes).map_err(|e| self.io_error(e))?;
        file.sync_all().map_err(|e| self.io_error(e))?;
        drop(file);

        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        let _guard = self.guard();

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let persisted: PersistedCredential =
            serde_json::from_slice(&bytes).map_err(|source| CredentialStoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        Ok(Some(Credential::from(persisted)))
    }

    fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let _guard = self.guard();

        let bytes = serde_json::to_vec_pretty(&PersistedCredential::from(credential)).map_err(
            |source| CredentialStoreError::Corrupt {
                path: self.path.clone(),
                source,
            },
        )?;

        self.write_atomically(&bytes)?;
        tracing::debug!(path = %self.path.display(), "Credential saved");
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialStoreError> {
        let _guard = self.guard();

        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Credential cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
