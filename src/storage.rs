//! Secure Storage Module
//!
//! Key-value persistence for the bearer token. On Windows values are
//! protected with DPAPI before they touch the disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, info};

/// Key under which the bearer token is persisted
pub const TOKEN_KEY: &str = "token";

/// Minimal string key-value store
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// File-per-key storage, encrypted with DPAPI on Windows
pub struct SecureStorage {
    storage_path: PathBuf,
}

impl SecureStorage {
    /// Open (and create if needed) storage rooted at `storage_path`
    pub fn open(storage_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage_path = storage_path.into();
        std::fs::create_dir_all(&storage_path).map_err(|e| StorageError::Io(e.to_string()))?;

        debug!("Secure storage initialized at: {:?}", storage_path);

        Ok(Self { storage_path })
    }

    /// Platform data directory used when none is configured
    pub fn default_location() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("StorefrontSession")
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    fn file_for(&self, key: &str) -> PathBuf {
        self.storage_path.join(format!("{}.dat", key))
    }
}

impl KeyValueStore for SecureStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let file_path = self.file_for(key);
        let encrypted = match std::fs::read(&file_path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Io(e.to_string())),
        };

        let decrypted = protect::unseal(&encrypted)?;
        String::from_utf8(decrypted)
            .map(Some)
            .map_err(|e| StorageError::Encoding(e.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let encrypted = protect::seal(value.as_bytes())?;
        std::fs::write(self.file_for(key), encrypted).map_err(|e| StorageError::Io(e.to_string()))?;

        debug!("Saved encrypted data for key: {}", key);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.file_for(key)) {
            Ok(()) => {
                info!("Deleted stored data for key: {}", key);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::Io(e.to_string())),
        }
    }
}

/// Process-local storage, used by tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

/// The single persisted bearer token
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Stored token, treating an empty value as absent
    pub fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.backend.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    pub fn save(&self, token: &str) -> Result<(), StorageError> {
        self.backend.set(TOKEN_KEY, token)
    }

    pub fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove(TOKEN_KEY)
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

#[cfg(windows)]
mod protect {
    use super::StorageError;
    use windows::Win32::Foundation::{LocalFree, HLOCAL};
    use windows::Win32::Security::Cryptography::{
        CryptProtectData, CryptUnprotectData, CRYPTPROTECT_UI_FORBIDDEN, CRYPT_INTEGER_BLOB,
    };

    pub fn seal(data: &[u8]) -> Result<Vec<u8>, StorageError> {
        transform(data, |input, output| unsafe {
            CryptProtectData(input, None, None, None, None, CRYPTPROTECT_UI_FORBIDDEN, output)
                .is_ok()
        })
        .ok_or_else(|| StorageError::Encryption("DPAPI encryption failed".into()))
    }

    pub fn unseal(data: &[u8]) -> Result<Vec<u8>, StorageError> {
        transform(data, |input, output| unsafe {
            CryptUnprotectData(input, None, None, None, None, CRYPTPROTECT_UI_FORBIDDEN, output)
                .is_ok()
        })
        .ok_or_else(|| StorageError::Decryption("DPAPI decryption failed".into()))
    }

    /// Run a DPAPI call and copy its LocalAlloc'd output into a Vec
    fn transform<F>(data: &[u8], call: F) -> Option<Vec<u8>>
    where
        F: FnOnce(*const CRYPT_INTEGER_BLOB, *mut CRYPT_INTEGER_BLOB) -> bool,
    {
        let input = CRYPT_INTEGER_BLOB {
            cbData: data.len() as u32,
            pbData: data.as_ptr() as *mut u8,
        };
        let mut output = CRYPT_INTEGER_BLOB {
            cbData: 0,
            pbData: std::ptr::null_mut(),
        };

        if !call(&input, &mut output) {
            return None;
        }

        unsafe {
            let bytes = std::slice::from_raw_parts(output.pbData, output.cbData as usize).to_vec();
            LocalFree(HLOCAL(output.pbData as *mut std::ffi::c_void));
            Some(bytes)
        }
    }
}

#[cfg(not(windows))]
mod protect {
    use super::StorageError;

    // No OS keystore outside Windows; bytes are stored as-is
    pub fn seal(data: &[u8]) -> Result<Vec<u8>, StorageError> {
        Ok(data.to_vec())
    }

    pub fn unseal(data: &[u8]) -> Result<Vec<u8>, StorageError> {
        Ok(data.to_vec())
    }
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),
}
