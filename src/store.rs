//! Credential store: a single-slot register holding the bearer token.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session manager is the only regular writer. The HTTP client reads the
//! slot before every request and clears it when the server answers 401.
//! Nothing else inspects the token; it is opaque and never parsed.
//!
//! TRADE-OFFS
//! ==========
//! No expiry is tracked locally. A stale token is only discovered when the
//! server rejects it, which keeps the store free of clock assumptions.

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Failure reading or writing persisted credential state.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("credential file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Storage contract for the bearer token.
///
/// At most one credential is held at a time; `save` overwrites.
pub trait CredentialStore: Send + Sync {
    /// Persist `token`, replacing any previous credential.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, token: &str) -> Result<(), StoreError>;

    /// Current credential, or `None` when logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage exists but cannot be read.
    fn read(&self) -> Result<Option<String>, StoreError>;

    /// Delete the credential. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be removed.
    fn clear(&self) -> Result<(), StoreError>;
}

// =============================================================================
// MEMORY
// =============================================================================

/// In-process store. Lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<String>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `token`, as if a previous run had logged in.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        Self { slot: Mutex::new(Some(token.into())) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.to_owned());
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

// =============================================================================
// FILE
// =============================================================================

/// Store backed by one file holding the token as a plain string.
///
/// Survives process restarts, so a later run can restore the session.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io { path: self.path.clone(), source }
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&self.path).map_err(|e| self.io_error(e))?;
        file.write_all(token.as_bytes()).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    fn read(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let token = raw.trim();
                Ok((!token.is_empty()).then(|| token.to_owned()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}
