//! Session storage for the EcoSwap client.
//!
//! This crate provides the string key-value backends the session is
//! persisted to, plus the credential store that mirrors the in-memory
//! session into them:
//! - **MemoryStorage**: process lifetime only
//! - **FileStorage**: a JSON file, rewritten atomically on every change

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::{CredentialStore, SessionCredentials, UserProfile};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::KeyValueStorage;

use std::path::Path;
use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Open the file-backed credential store at `path`.
pub fn open_credential_store(path: &Path) -> StorageResult<CredentialStore> {
    let storage = FileStorage::open(path)?;
    CredentialStore::new(storage)
}
